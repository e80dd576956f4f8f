//! Core types for filing-dl

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use utoipa::ToSchema;

/// A company resolved against the configured ticker mapping
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct CompanyRef {
    /// Upper-cased ticker symbol (e.g., "AAPL")
    pub identifier: String,
    /// Zero-padded 10-digit registry key (CIK)
    pub registry_key: String,
}

impl CompanyRef {
    /// Create a new company reference
    pub fn new(identifier: impl Into<String>, registry_key: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            registry_key: registry_key.into(),
        }
    }
}

impl std::fmt::Display for CompanyRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (CIK {})", self.identifier, self.registry_key)
    }
}

/// Raw submissions metadata returned by the registry for one company
///
/// Only the fields the pipeline needs are modeled; everything else in the
/// response is ignored.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SubmissionMetadata {
    /// Registry key echoed back by the registry
    #[serde(default)]
    pub cik: Option<String>,
    /// Company name
    #[serde(default)]
    pub name: Option<String>,
    /// Filing history
    #[serde(default)]
    pub filings: Filings,
}

/// Filing history container
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Filings {
    /// Most recent filings as parallel arrays
    #[serde(default)]
    pub recent: RecentFilings,
}

/// Parallel arrays describing recent filings, indexed positionally
///
/// All four sequences are expected to share one length; a response where they
/// don't is treated as malformed by the selector.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentFilings {
    /// Form type per filing (e.g., "10-K", "10-K/A", "8-K")
    #[serde(default)]
    pub form: Vec<String>,
    /// Accession number per filing (e.g., "0000320193-25-000079")
    #[serde(default)]
    pub accession_number: Vec<String>,
    /// Filing date per filing, `YYYY-MM-DD`
    #[serde(default)]
    pub filing_date: Vec<String>,
    /// Primary document file name per filing
    #[serde(default)]
    pub primary_document: Vec<String>,
}

/// One selected filing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FilingRecord {
    /// Form type, always equal to the requested type
    pub form_type: String,
    /// Accession number with hyphens
    pub accession_id: String,
    /// Filing date
    pub filing_date: NaiveDate,
    /// Primary document file name
    pub primary_document: String,
}

impl FilingRecord {
    /// File name of the converted artifact for a company
    pub fn artifact_name(&self, identifier: &str) -> String {
        format!(
            "{}_{}_{}.pdf",
            identifier,
            self.accession_id,
            self.filing_date.format("%Y-%m-%d")
        )
    }
}

/// The primary document of a filing materialized on disk, plus the assets written next to it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchedDocument {
    /// Local path of the primary document
    pub path: PathBuf,
    /// File names of assets written into the same directory during this run
    pub assets: BTreeSet<String>,
}

/// Terminal output of one successful company run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversionResult {
    /// The company that was processed
    pub company: CompanyRef,
    /// The filing that produced the artifact
    pub filing: FilingRecord,
    /// Path of the converted PDF
    pub artifact_path: PathBuf,
}

/// Pipeline stage at which a company run stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Fetching submissions metadata
    Metadata,
    /// Selecting the latest qualifying filing
    Selection,
    /// Downloading the primary document
    Download,
    /// Converting to PDF
    Conversion,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Metadata => "metadata",
            Stage::Selection => "selection",
            Stage::Download => "download",
            Stage::Conversion => "conversion",
        };
        f.write_str(name)
    }
}

/// Per-company result of a pipeline run
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompanyOutcome {
    /// The filing was fetched and converted
    Converted(ConversionResult),
    /// The run stopped at `stage`
    Failed {
        /// The company that failed
        company: CompanyRef,
        /// Where it stopped
        stage: Stage,
        /// Human-readable cause
        reason: String,
    },
}

impl CompanyOutcome {
    /// The successful result, if any
    pub fn converted(self) -> Option<ConversionResult> {
        match self {
            CompanyOutcome::Converted(result) => Some(result),
            CompanyOutcome::Failed { .. } => None,
        }
    }
}

/// Report row for one converted company, as exposed by the API
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReportResult {
    /// Ticker symbol
    pub ticker: String,
    /// Registry key
    pub cik: String,
    /// Form type of the filing
    pub form_type: String,
    /// Filing date, `YYYY-MM-DD`
    pub filing_date: String,
    /// Accession number
    pub accession_number: String,
    /// Path of the converted PDF
    pub pdf_path: String,
    /// Always "success"
    pub status: String,
}

impl From<&ConversionResult> for ReportResult {
    fn from(result: &ConversionResult) -> Self {
        Self {
            ticker: result.company.identifier.clone(),
            cik: result.company.registry_key.clone(),
            form_type: result.filing.form_type.clone(),
            filing_date: result.filing.filing_date.format("%Y-%m-%d").to_string(),
            accession_number: result.filing.accession_id.clone(),
            pdf_path: result.artifact_path.display().to_string(),
            status: "success".into(),
        }
    }
}

/// Report row for one failed company, as exposed by the API
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReportFailure {
    /// Ticker symbol
    pub ticker: String,
    /// Stage at which processing stopped
    pub stage: Stage,
    /// Logged cause
    pub reason: String,
}

/// Results of one sequential batch run, in input order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Successful conversions in input order
    pub results: Vec<ConversionResult>,
    /// Failed companies in input order
    pub failures: Vec<ReportFailure>,
    /// Identifiers with no registry key, excluded before any request
    pub unknown: Vec<String>,
}

impl BatchReport {
    /// Number of companies attempted
    pub fn processed(&self) -> usize {
        self.results.len() + self.failures.len()
    }
}

/// Unique identifier for a background job
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct JobId(pub uuid::Uuid);

impl JobId {
    /// Generate a fresh random job ID
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Job status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Submitted, batch still running
    Started,
    /// Batch finished (individual companies may still have failed)
    Completed,
    /// The batch itself could not run to completion
    Failed,
}

impl JobStatus {
    /// Whether the job has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Started)
    }
}

/// Snapshot of a background fetch job
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Job {
    /// Job identifier
    pub job_id: JobId,
    /// Current status
    pub status: JobStatus,
    /// Submission time
    pub created_at: DateTime<Utc>,
    /// Time the job reached a terminal state
    pub completed_at: Option<DateTime<Utc>>,
    /// Number of valid companies submitted
    pub total_companies: usize,
    /// Companies processed so far
    pub processed: usize,
    /// Companies converted successfully
    pub successful: usize,
    /// Companies that failed
    pub failed: usize,
    /// Successful conversions in input order
    pub results: Vec<ReportResult>,
    /// Per-company failure causes in input order
    pub failures: Vec<ReportFailure>,
    /// Cause of a whole-job failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Job {
    /// A freshly submitted job
    pub fn started(job_id: JobId, total_companies: usize) -> Self {
        Self {
            job_id,
            status: JobStatus::Started,
            created_at: Utc::now(),
            completed_at: None,
            total_companies,
            processed: 0,
            successful: 0,
            failed: 0,
            results: Vec::new(),
            failures: Vec::new(),
            error: None,
        }
    }
}
