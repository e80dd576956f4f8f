//! REST API server module
//!
//! Exposes background report jobs, artifact downloads and the supported company list
//! over JSON, with an OpenAPI description generated by utoipa.

use crate::jobs::JobTracker;
use crate::{Config, Result};
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Reports
/// - `POST /api/v1/reports/fetch` - Start a background fetch job
/// - `GET /api/v1/reports/jobs` - All tracked jobs
/// - `GET /api/v1/reports/status/:job_id` - Job status and results
/// - `GET /api/v1/reports/download/:job_id/:ticker` - Download a converted PDF
///
/// ## Companies
/// - `GET /api/v1/companies` - Supported tickers and their CIKs
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /api/v1/openapi.json` - OpenAPI specification
/// - `GET /api/docs` - Swagger UI (if enabled)
pub fn create_router(tracker: JobTracker, config: Arc<Config>) -> Router {
    let state = AppState::new(tracker, config.clone());

    let router = Router::new()
        // Reports
        .route("/api/v1/reports/fetch", post(routes::fetch_reports))
        .route("/api/v1/reports/jobs", get(routes::list_jobs))
        .route("/api/v1/reports/status/:job_id", get(routes::get_job_status))
        .route(
            "/api/v1/reports/download/:job_id/:ticker",
            get(routes::download_report),
        )
        // Companies
        .route("/api/v1/companies", get(routes::list_companies))
        // System
        .route("/health", get(routes::health_check))
        .route("/api/v1/openapi.json", get(routes::openapi_spec));

    // Swagger UI serves its own copy of the OpenAPI document under /api/docs
    let router = if config.api.swagger_ui {
        router.merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.api.cors_enabled {
        router.layer(build_cors_layer(&config.api.cors_origins))
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// `"*"` or an empty list allows any origin.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address
///
/// Runs until SIGINT or SIGTERM, then stops accepting connections and lets in-flight
/// requests finish. Background jobs still running at that point are abandoned.
///
/// # Example
///
/// ```no_run
/// use filing_dl::{Config, JobTracker};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let tracker = JobTracker::from_config(&config)?;
///
/// filing_dl::api::start_api_server(tracker, config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(tracker: JobTracker, config: Arc<Config>) -> Result<()> {
    let bind_address = config.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    serve(listener, create_router(tracker, config), crate::wait_for_signal()).await
}

/// Serve `app` on an already bound listener until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(address) = listener.local_addr() {
        tracing::info!(address = %address, "API server listening");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
