//! Report job handlers.

use super::{FetchReportsRequest, JobsResponse};
use crate::api::AppState;
use crate::error::{Error, Result};
use crate::jobs::JobSubmission;
use crate::types::{Job, JobId};
use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::path::PathBuf;
use tokio_util::io::ReaderStream;

fn parse_job_id(raw: &str) -> Result<JobId> {
    raw.parse()
        .map_err(|_| Error::NotFound(format!("Job {} not found", raw)))
}

/// POST /api/v1/reports/fetch - Start a background fetch job
#[utoipa::path(
    post,
    path = "/api/v1/reports/fetch",
    tag = "reports",
    request_body = FetchReportsRequest,
    responses(
        (status = 202, description = "Job started", body = JobSubmission),
        (status = 400, description = "No valid tickers", body = crate::error::ApiError)
    )
)]
pub async fn fetch_reports(
    State(state): State<AppState>,
    Json(request): Json<FetchReportsRequest>,
) -> Result<(StatusCode, Json<JobSubmission>)> {
    let output_dir = request.output_dir.map(PathBuf::from);
    let submission = state.tracker.submit(&request.tickers, output_dir).await?;

    Ok((StatusCode::ACCEPTED, Json(submission)))
}

/// GET /api/v1/reports/jobs - All tracked jobs
#[utoipa::path(
    get,
    path = "/api/v1/reports/jobs",
    tag = "reports",
    responses(
        (status = 200, description = "Tracked jobs, oldest first", body = JobsResponse)
    )
)]
pub async fn list_jobs(State(state): State<AppState>) -> Json<JobsResponse> {
    let jobs = state.tracker.list().await;
    Json(JobsResponse {
        total: jobs.len(),
        jobs,
    })
}

/// GET /api/v1/reports/status/:job_id - Job status
#[utoipa::path(
    get,
    path = "/api/v1/reports/status/{job_id}",
    tag = "reports",
    params(
        ("job_id" = String, Path, description = "Job ID returned by the fetch endpoint")
    ),
    responses(
        (status = 200, description = "Job snapshot", body = Job),
        (status = 404, description = "Job not found", body = crate::error::ApiError)
    )
)]
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<Job>> {
    let id = parse_job_id(&job_id)?;
    state
        .tracker
        .get(id)
        .await
        .map(Json)
        .ok_or_else(|| Error::NotFound(format!("Job {} not found", job_id)))
}

/// GET /api/v1/reports/download/:job_id/:ticker - Download a converted PDF
#[utoipa::path(
    get,
    path = "/api/v1/reports/download/{job_id}/{ticker}",
    tag = "reports",
    params(
        ("job_id" = String, Path, description = "Job ID"),
        ("ticker" = String, Path, description = "Ticker symbol, case-insensitive")
    ),
    responses(
        (status = 200, description = "PDF file", content_type = "application/pdf"),
        (status = 404, description = "Job, report or file not found", body = crate::error::ApiError)
    )
)]
pub async fn download_report(
    State(state): State<AppState>,
    Path((job_id, ticker)): Path<(String, String)>,
) -> Result<Response> {
    let id = parse_job_id(&job_id)?;
    let job = state
        .tracker
        .get(id)
        .await
        .ok_or_else(|| Error::NotFound(format!("Job {} not found", job_id)))?;

    let report = job
        .results
        .iter()
        .find(|r| r.ticker.eq_ignore_ascii_case(&ticker))
        .ok_or_else(|| {
            Error::NotFound(format!(
                "Report for ticker {} not found in job {}",
                ticker, job_id
            ))
        })?;

    let path = PathBuf::from(&report.pdf_path);
    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::NotFound(format!("PDF file not found: {}", report.pdf_path)));
        }
        Err(e) => return Err(Error::Io(e)),
    };

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{}.pdf", report.ticker));

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}
