//! # filing-dl
//!
//! Fetches the most recent annual report (form 10-K by default) of listed companies
//! from the SEC EDGAR registry and converts it to PDF.
//!
//! For each company the pipeline:
//! 1. downloads the submissions metadata,
//! 2. selects the latest original filing of the configured form type,
//! 3. downloads the primary document and the images it references,
//! 4. renders it to `<TICKER>_<accession>_<date>.pdf`.
//!
//! Companies are processed one at a time and every registry request is paced. Batches
//! can run directly, as background jobs through [`JobTracker`], or behind the REST API
//! in [`api`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use filing_dl::{Config, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.registry.user_agent = "Example Corp ops@example.com".into();
//!
//!     let pipeline = Pipeline::from_config(&config)?;
//!     let report = pipeline
//!         .run_tickers(&["AAPL", "GS"], &config.output.output_dir)
//!         .await?;
//!
//!     for result in &report.results {
//!         println!("{}: {}", result.company.identifier, result.artifact_path.display());
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// PDF conversion and renderers
pub mod convert;
/// Error types
pub mod error;
/// Primary document and asset download
pub mod fetcher;
/// Background job tracking
pub mod jobs;
/// Per-company pipeline and batch runs
pub mod pipeline;
/// Registry HTTP client and request pacing
pub mod registry;
/// Filing selection
pub mod selector;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::{CompanyMap, Config};
pub use convert::{CliRenderer, DocumentRenderer, FormatConverter, NoOpRenderer};
pub use error::{ApiError, ConversionError, Error, ErrorDetail, RegistryError, Result, ToHttpStatus};
pub use fetcher::DocumentFetcher;
pub use jobs::{JobSubmission, JobTracker};
pub use pipeline::Pipeline;
pub use registry::{RegistryClient, RequestPacer};
pub use selector::select_latest_original_filing;
pub use types::{
    BatchReport, CompanyOutcome, CompanyRef, ConversionResult, FilingRecord, Job, JobId,
    JobStatus, Stage,
};

/// Resolve when the process receives a termination signal
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
#[cfg(unix)]
pub async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

/// Resolve when the process receives Ctrl+C
#[cfg(not(unix))]
pub async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
