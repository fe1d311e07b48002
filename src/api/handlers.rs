use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::{CandidateItem, ContentType, CulturalContext};
use crate::services::recommendations::{ServiceStats, SimilarOptions};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct SimilarQuery {
    pub limit: Option<usize>,
    pub min_score: Option<f64>,
    pub page: Option<u32>,
    #[serde(default)]
    pub force_refresh: bool,
    #[serde(default)]
    pub fast: bool,
    /// Viewer's preferred language (ISO 639-1), from the profile service
    pub language: Option<String>,
    /// Viewer's region (ISO 3166-1), from the profile service
    pub region: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SimilarResponse {
    pub reference_id: u64,
    pub content_type: ContentType,
    pub count: usize,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub results: Vec<CandidateItem>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Similar-content lookup
pub async fn get_similar(
    State(state): State<AppState>,
    Path((content_type, id)): Path<(String, u64)>,
    Query(query): Query<SimilarQuery>,
) -> AppResult<Json<SimilarResponse>> {
    let content_type: ContentType = content_type
        .parse()
        .map_err(AppError::InvalidInput)?;

    let defaults = SimilarOptions::default();
    let options = SimilarOptions {
        limit: query.limit.unwrap_or(defaults.limit),
        min_score: query.min_score.unwrap_or(defaults.min_score),
        force_refresh: query.force_refresh,
        page: query.page.unwrap_or(defaults.page),
        fast: query.fast,
        context: CulturalContext::new(query.language, query.region),
        token: defaults.token,
    };

    let results = state
        .service
        .get_similar_content(id, content_type, options)
        .await?;

    Ok(Json(SimilarResponse {
        reference_id: id,
        content_type,
        count: results.len(),
        generated_at: chrono::Utc::now(),
        results,
    }))
}

/// Cache statistics for operational tooling
pub async fn cache_stats(State(state): State<AppState>) -> Json<ServiceStats> {
    Json(state.service.stats())
}

/// Removes a single cache entry by key
pub async fn clear_cache_entry(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<StatusCode> {
    if state.service.clear_cache(&key) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("no cache entry for '{}'", key)))
    }
}

/// Clears all caches
pub async fn clear_cache_all(State(state): State<AppState>) -> StatusCode {
    state.service.clear_all();
    StatusCode::NO_CONTENT
}
