use axum::{extract::State, Extension};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::extract::{Json, Query};
use crate::models::assessment::{
    AssessmentListQuery, AssessmentQuestion, AssessmentResult, SubmitAssessmentRequest,
    ASSESSMENT_QUESTIONS,
};
use crate::services::scoring::{max_score, total_score};
use crate::AppState;

const DEFAULT_LIST_LIMIT: i64 = 12;
const MAX_LIST_LIMIT: i64 = 120;

#[derive(Debug, Serialize)]
pub struct QuestionnaireResponse {
    pub questions: &'static [AssessmentQuestion],
    pub max_score: i32,
}

/// First day of the current UTC month.
fn current_month() -> AppResult<NaiveDate> {
    let today = Utc::now().date_naive();
    today
        .with_day(1)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("no first day for {}", today)))
}

pub async fn questions() -> Json<QuestionnaireResponse> {
    Json(QuestionnaireResponse {
        questions: ASSESSMENT_QUESTIONS,
        max_score: max_score(ASSESSMENT_QUESTIONS),
    })
}

pub async fn list_assessments(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<AssessmentListQuery>,
) -> AppResult<Json<Vec<AssessmentResult>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
    let max = max_score(ASSESSMENT_QUESTIONS);

    let results = state
        .store
        .list_assessments(auth_user.id, limit)
        .await?
        .into_iter()
        .map(|a| AssessmentResult::new(a, max))
        .collect();
    Ok(Json(results))
}

pub async fn current_assessment(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<AssessmentResult>> {
    let assessment = state
        .store
        .get_assessment(auth_user.id, current_month()?)
        .await?
        .ok_or_else(|| AppError::NotFound("No assessment for this month".into()))?;

    Ok(Json(AssessmentResult::new(
        assessment,
        max_score(ASSESSMENT_QUESTIONS),
    )))
}

/// Score the answers and save them as this month's assessment, replacing any earlier one.
pub async fn submit_assessment(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<SubmitAssessmentRequest>,
) -> AppResult<Json<AssessmentResult>> {
    let score = total_score(ASSESSMENT_QUESTIONS, &body.answers)?;
    let month = current_month()?;

    let assessment = state
        .store
        .upsert_assessment(auth_user.id, month, score, &body.answers)
        .await?;

    tracing::info!(
        user_id = %auth_user.id,
        %month,
        total_score = score,
        "Monthly assessment saved"
    );
    Ok(Json(AssessmentResult::new(
        assessment,
        max_score(ASSESSMENT_QUESTIONS),
    )))
}
