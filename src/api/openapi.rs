//! OpenAPI documentation and schema generation

use utoipa::OpenApi;

/// OpenAPI documentation for the filing-dl REST API
///
/// Served at `/api/v1/openapi.json`, and by Swagger UI under `/api/docs` when enabled.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "filing-dl REST API",
        version = "0.1.0",
        description = "Fetch the latest annual filings of listed companies from SEC EDGAR and convert them to PDF",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    paths(
        // Reports
        crate::api::routes::fetch_reports,
        crate::api::routes::list_jobs,
        crate::api::routes::get_job_status,
        crate::api::routes::download_report,

        // Companies
        crate::api::routes::list_companies,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(
        schemas(
            crate::api::routes::FetchReportsRequest,
            crate::api::routes::HealthResponse,
            crate::api::routes::CompanyInfo,
            crate::api::routes::CompaniesResponse,
            crate::api::routes::JobsResponse,
            crate::jobs::JobSubmission,
            crate::types::Job,
            crate::types::JobId,
            crate::types::JobStatus,
            crate::types::ReportResult,
            crate::types::ReportFailure,
            crate::types::Stage,
            crate::error::ApiError,
            crate::error::ErrorDetail,
        )
    ),
    tags(
        (name = "reports", description = "Background report fetching"),
        (name = "companies", description = "Supported companies"),
        (name = "system", description = "Health and API description")
    )
)]
pub struct ApiDoc;
