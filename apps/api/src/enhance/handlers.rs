//! Axum route handlers for the enhancement API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enhance::orchestrator::{adapt_cv, enhance_experience, enhance_summary};
use crate::errors::AppError;
use crate::models::{ensure_ids, parse_cv, parse_section, CvData, ExperienceItem};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    #[serde(default)]
    pub summary: String,
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceRequest {
    pub experience: Value,
    pub job_description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ExperienceResponse {
    pub experience: ExperienceItem,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptRequest {
    pub cv: Value,
    #[serde(default)]
    pub job_description: String,
}

#[derive(Debug, Serialize)]
pub struct CvResponse {
    pub cv: CvData,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/ai/summary
pub async fn handle_enhance_summary(
    State(state): State<AppState>,
    Json(request): Json<SummaryRequest>,
) -> Result<Json<SummaryResponse>, AppError> {
    let summary = enhance_summary(
        state.llm.as_ref(),
        &request.summary,
        request.context.as_deref(),
    )
    .await?;

    Ok(Json(SummaryResponse { summary }))
}

/// POST /api/v1/ai/experience
///
/// Rewrites one role's highlights. Caller-supplied keywords take precedence over
/// keywords derived from the job description.
pub async fn handle_enhance_experience(
    State(state): State<AppState>,
    Json(request): Json<ExperienceRequest>,
) -> Result<Json<ExperienceResponse>, AppError> {
    let experience: ExperienceItem = parse_section(request.experience)?;

    let experience = enhance_experience(
        state.llm.as_ref(),
        &experience,
        request.job_description.as_deref(),
        &request.keywords,
    )
    .await?;

    Ok(Json(ExperienceResponse { experience }))
}

/// POST /api/v1/ai/adapt
///
/// Tailors a whole CV to a job description. Invalid input and a missing credential
/// fail; other model problems degrade to local fallbacks.
pub async fn handle_adapt_cv(
    State(state): State<AppState>,
    Json(request): Json<AdaptRequest>,
) -> Result<Json<CvResponse>, AppError> {
    if request.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "jobDescription cannot be empty".to_string(),
        ));
    }

    let cv = ensure_ids(parse_cv(request.cv)?);
    let cv = adapt_cv(state.llm.as_ref(), cv, &request.job_description).await?;

    Ok(Json(CvResponse { cv }))
}
