//! Application state for the API server

use crate::Config;
use crate::jobs::JobTracker;
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request; every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    /// Job table and the pipeline jobs run through
    pub tracker: JobTracker,

    /// Configuration (read-only)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(tracker: JobTracker, config: Arc<Config>) -> Self {
        Self { tracker, config }
    }
}
