//! Trend-search proxy endpoints backed by the Naver open APIs.
//!
//! Credentials stay server-side; these handlers validate the request,
//! forward it through the shared client, and wrap the upstream payload in
//! the standard response envelope.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::AppState;
use super::error::{ApiError, ApiResult};
use super::types::ApiResponse;
use crate::clients::naver::{BlogSearchResponse, DatalabRequest, DatalabResponse, LocalSearchResponse};

const BLOG_MAX_DISPLAY: u8 = 100;
const LOCAL_MAX_DISPLAY: u8 = 5;

#[derive(Deserialize)]
pub struct SearchParams {
    pub query: String,
    pub display: Option<u8>,
    pub sort: Option<String>,
}

fn validate_query(query: &str) -> Result<&str, ApiError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ApiError::validation("Search query must not be empty"));
    }
    Ok(query)
}

fn validate_display(display: Option<u8>, default: u8, max: u8) -> Result<u8, ApiError> {
    let display = display.unwrap_or(default);
    if display == 0 || display > max {
        return Err(ApiError::validation(format!(
            "display must be between 1 and {max}"
        )));
    }
    Ok(display)
}

/// GET /api/trends/blog?query=<q>&display=<n>&sort=<sim|date>
pub async fn search_blog(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<ApiResponse<BlogSearchResponse>>> {
    let query = validate_query(&params.query)?;
    let display = validate_display(params.display, 10, BLOG_MAX_DISPLAY)?;
    let sort = params.sort.as_deref().unwrap_or("sim");

    let response = state
        .naver()
        .search_blog(query, display, sort)
        .await
        .map_err(|e| ApiError::naver_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(response)))
}

/// GET /api/trends/local?query=<q>&display=<n>&sort=<random|comment>
pub async fn search_local(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<ApiResponse<LocalSearchResponse>>> {
    let query = validate_query(&params.query)?;
    let display = validate_display(params.display, 5, LOCAL_MAX_DISPLAY)?;
    let sort = params.sort.as_deref().unwrap_or("random");

    let response = state
        .naver()
        .search_local(query, display, sort)
        .await
        .map_err(|e| ApiError::naver_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(response)))
}

/// POST /api/trends/datalab
pub async fn search_datalab(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DatalabRequest>,
) -> ApiResult<Json<ApiResponse<DatalabResponse>>> {
    if request.keyword_groups.is_empty() {
        return Err(ApiError::validation(
            "At least one keyword group is required",
        ));
    }

    let response = state
        .naver()
        .search_datalab(&request)
        .await
        .map_err(|e| ApiError::naver_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(response)))
}
