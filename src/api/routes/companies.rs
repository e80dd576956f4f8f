//! Supported company listing.

use super::{CompaniesResponse, CompanyInfo};
use crate::api::AppState;
use axum::{Json, extract::State};

/// GET /api/v1/companies - Supported tickers
#[utoipa::path(
    get,
    path = "/api/v1/companies",
    tag = "companies",
    responses(
        (status = 200, description = "Supported companies sorted by ticker", body = CompaniesResponse)
    )
)]
pub async fn list_companies(State(state): State<AppState>) -> Json<CompaniesResponse> {
    let companies: Vec<CompanyInfo> = state
        .tracker
        .pipeline()
        .companies()
        .iter()
        .map(|(ticker, cik)| CompanyInfo {
            ticker: ticker.to_string(),
            cik: cik.to_string(),
        })
        .collect();

    Json(CompaniesResponse {
        total: companies.len(),
        companies,
    })
}
