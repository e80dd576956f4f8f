//! Background fetch jobs
//!
//! A submitted job runs one batch on the tokio runtime and is recorded in an in-memory
//! table. The record is written twice: once as `started` at submission, and once when
//! the batch reaches a terminal state. All jobs share one [`Pipeline`], so every batch
//! is throttled by the same request pacer.
//!
//! Batches run one at a time. Jobs writing to the same output directory share its
//! `temp/` scratch space, so a later job waits until the running one has finished.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::pipeline::{Pipeline, resolve_companies};
use crate::types::{BatchReport, Job, JobId, JobStatus, ReportResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info};
use utoipa::ToSchema;

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Response to a job submission
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct JobSubmission {
    /// Identifier to poll
    pub job_id: JobId,
    /// Always `started`
    pub status: JobStatus,
    /// Human-readable summary
    pub message: String,
    /// Number of valid companies queued
    pub total_companies: usize,
    /// Submitted tickers that were not recognized
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invalid_tickers: Vec<String>,
}

/// Tracks background batch runs
#[derive(Clone)]
pub struct JobTracker {
    pipeline: Pipeline,
    jobs: Arc<RwLock<HashMap<JobId, Job>>>,
    batch_gate: Arc<Mutex<()>>,
    default_output_dir: PathBuf,
    retention: Option<Duration>,
}

impl JobTracker {
    /// Create a tracker that runs batches through `pipeline`
    pub fn new(pipeline: Pipeline, default_output_dir: impl Into<PathBuf>) -> Self {
        Self {
            pipeline,
            jobs: Arc::new(RwLock::new(HashMap::new())),
            batch_gate: Arc::new(Mutex::new(())),
            default_output_dir: default_output_dir.into(),
            retention: None,
        }
    }

    /// Build the pipeline and tracker from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let pipeline = Pipeline::from_config(config)?;
        Ok(Self::new(pipeline, config.output.output_dir.clone())
            .with_retention(config.jobs.job_retention))
    }

    /// Evict finished jobs older than `retention` on every submission
    #[must_use]
    pub fn with_retention(mut self, retention: Option<Duration>) -> Self {
        self.retention = retention;
        self
    }

    /// The pipeline every job runs through
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Output directory used when a submission names none
    pub fn default_output_dir(&self) -> &Path {
        &self.default_output_dir
    }

    /// Validate tickers, record a `started` job and launch its batch
    ///
    /// Returns immediately; poll [`JobTracker::get`] or [`JobTracker::wait`] for the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when none of the tickers is known.
    pub async fn submit<S: AsRef<str>>(
        &self,
        tickers: &[S],
        output_dir: Option<PathBuf>,
    ) -> Result<JobSubmission> {
        if let Some(retention) = self.retention {
            self.prune_finished(retention).await;
        }

        let (companies, invalid_tickers) = resolve_companies(tickers, self.pipeline.companies());
        if companies.is_empty() {
            return Err(Error::Validation(format!(
                "No valid tickers provided. Invalid: [{}]",
                invalid_tickers.join(", ")
            )));
        }

        let job_id = JobId::new();
        let total = companies.len();
        let output_dir = output_dir.unwrap_or_else(|| self.default_output_dir.clone());

        self.jobs
            .write()
            .await
            .insert(job_id, Job::started(job_id, total));
        info!(job_id = %job_id, companies = total, output_dir = %output_dir.display(), "Job started");

        let tracker = self.clone();
        tokio::spawn(async move {
            let pipeline = tracker.pipeline.clone();
            let gate = tracker.batch_gate.clone();
            let batch = tokio::spawn(async move {
                let _running = gate.lock().await;
                pipeline.run_batch(&companies, &output_dir).await
            });

            let outcome = match batch.await {
                Ok(Ok(report)) => Ok(report),
                Ok(Err(e)) => Err(Error::JobFailed(e.to_string())),
                Err(e) => Err(Error::JobFailed(format!("batch task aborted: {}", e))),
            };
            tracker.finish(job_id, outcome).await;
        });

        Ok(JobSubmission {
            job_id,
            status: JobStatus::Started,
            message: format!("Started processing {} companies", total),
            total_companies: total,
            invalid_tickers,
        })
    }

    /// Record the terminal state of a job; later calls for the same job are ignored
    async fn finish(&self, job_id: JobId, outcome: Result<BatchReport>) {
        let mut jobs = self.jobs.write().await;
        let Some(job) = jobs.get_mut(&job_id) else {
            return;
        };
        if job.status.is_terminal() {
            return;
        }

        match outcome {
            Ok(report) => {
                job.status = JobStatus::Completed;
                job.processed = job.total_companies;
                job.successful = report.results.len();
                job.failed = job.total_companies.saturating_sub(job.successful);
                job.results = report.results.iter().map(ReportResult::from).collect();
                job.failures = report.failures;
                info!(
                    job_id = %job_id,
                    successful = job.successful,
                    failed = job.failed,
                    "Job completed"
                );
            }
            Err(e) => {
                error!(job_id = %job_id, error = %e, "Job failed");
                job.status = JobStatus::Failed;
                job.error = Some(e.to_string());
            }
        }
        job.completed_at = Some(Utc::now());
    }

    /// Snapshot of one job
    pub async fn get(&self, job_id: JobId) -> Option<Job> {
        self.jobs.read().await.get(&job_id).cloned()
    }

    /// Snapshots of all jobs, oldest first
    pub async fn list(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by_key(|job| job.created_at);
        jobs
    }

    /// Poll until the job is terminal; `None` if the job is unknown
    pub async fn wait(&self, job_id: JobId) -> Option<Job> {
        loop {
            match self.get(job_id).await {
                Some(job) if job.status.is_terminal() => return Some(job),
                Some(_) => tokio::time::sleep(WAIT_POLL_INTERVAL).await,
                None => return None,
            }
        }
    }

    /// Drop terminal jobs that completed more than `older_than` ago
    ///
    /// Running jobs are never evicted. Returns the number of jobs removed.
    pub async fn prune_finished(&self, older_than: Duration) -> usize {
        let Ok(age) = chrono::Duration::from_std(older_than) else {
            return 0;
        };
        let cutoff = Utc::now() - age;

        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| {
            !(job.status.is_terminal() && job.completed_at.is_some_and(|done| done < cutoff))
        });
        let removed = before - jobs.len();
        if removed > 0 {
            info!(removed, "Pruned finished jobs");
        }
        removed
    }
}
