//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`reports`]: fetch jobs, job listing, status, artifact download
//! - [`companies`]: supported companies
//! - [`system`]: health, OpenAPI

use serde::{Deserialize, Serialize};

mod companies;
mod reports;
mod system;

pub use companies::*;
pub use reports::*;
pub use system::*;

/// Request body for POST /api/v1/reports/fetch
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct FetchReportsRequest {
    /// Ticker symbols, case-insensitive (e.g. `["AAPL", "meta"]`)
    pub tickers: Vec<String>,
    /// Output directory for the PDFs; the configured default when omitted
    #[serde(default)]
    pub output_dir: Option<String>,
}

/// Response for GET /health
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// Always "healthy"
    pub status: String,
    /// Server time
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Service name
    pub service: String,
}

/// One supported company
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CompanyInfo {
    /// Ticker symbol
    pub ticker: String,
    /// Registry key (CIK)
    pub cik: String,
}

/// Response for GET /api/v1/companies
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CompaniesResponse {
    /// Companies sorted by ticker
    pub companies: Vec<CompanyInfo>,
    /// Number of companies
    pub total: usize,
}

/// Response for GET /api/v1/reports/jobs
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct JobsResponse {
    /// Known jobs, oldest first
    pub jobs: Vec<crate::types::Job>,
    /// Number of jobs
    pub total: usize,
}
