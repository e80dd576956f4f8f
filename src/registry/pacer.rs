//! Request pacing for registry traffic
//!
//! The registry asks clients to stay below ten requests per second. Rather than a
//! token bucket, every request waits a fixed delay first. The wait happens while the
//! pacer is held, so all clones of one pacer form a single queue: sharing a pacer
//! across clients caps the aggregate request rate for the whole process.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Fixed-delay request pacer
///
/// Cloning is cheap and shares state: every clone waits in the same queue.
///
/// # Examples
///
/// ```
/// use filing_dl::registry::RequestPacer;
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() {
/// let pacer = RequestPacer::new(Duration::from_millis(100));
/// let shared = pacer.clone();
///
/// // Both acquisitions are serialized: together they take at least 200ms
/// tokio::join!(pacer.acquire(), shared.acquire());
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct RequestPacer {
    delay: Duration,
    gate: Arc<Mutex<()>>,
}

impl RequestPacer {
    /// Create a pacer that delays every request by `delay`
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            gate: Arc::new(Mutex::new(())),
        }
    }

    /// The fixed delay applied before each request
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait for permission to issue one request
    ///
    /// Returns after the configured delay has elapsed and no other holder of this
    /// pacer is mid-delay. A zero delay returns immediately.
    pub async fn acquire(&self) {
        if self.delay.is_zero() {
            return;
        }

        let _slot = self.gate.lock().await;
        tokio::time::sleep(self.delay).await;
    }

    /// Whether two pacers share the same queue
    pub fn shares_queue_with(&self, other: &RequestPacer) -> bool {
        Arc::ptr_eq(&self.gate, &other.gate)
    }
}

impl Default for RequestPacer {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}
