//! POST /api/v1/analyze — the batch-analysis entry point.
//!
//! Callers hand over a profile and a list of postings; tiers, validation,
//! and caching stay invisible behind this surface. An on-demand single-job
//! request is just a batch of one.

use std::time::Duration;

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::analysis::CompatibilityAnalysis;
use crate::models::posting::JobPosting;
use crate::models::profile::CandidateProfile;
use crate::state::AppState;

const DEFAULT_DEADLINE_MS: u64 = 60_000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeBatchRequest {
    pub profile: CandidateProfile,
    pub postings: Vec<JobPosting>,
    #[serde(default)]
    pub concurrency_limit: Option<usize>,
    #[serde(default)]
    pub deadline_ms: Option<u64>,
}

pub async fn handle_analyze_batch(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeBatchRequest>,
) -> Result<Json<Vec<CompatibilityAnalysis>>, AppError> {
    if request.concurrency_limit == Some(0) {
        return Err(AppError::Validation(
            "concurrencyLimit must be at least 1".to_string(),
        ));
    }
    if request.deadline_ms == Some(0) {
        return Err(AppError::Validation(
            "deadlineMs must be positive".to_string(),
        ));
    }

    let deadline = Duration::from_millis(request.deadline_ms.unwrap_or(DEFAULT_DEADLINE_MS));
    let results = state
        .coordinator
        .run(
            &request.profile,
            &request.postings,
            request.concurrency_limit,
            deadline,
        )
        .await;

    Ok(Json(results))
}
