use axum::{extract::State, Extension};
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;

use crate::auth::middleware::AuthUser;
use crate::db::RecordFilter;
use crate::error::{AppError, AppResult};
use crate::extract::{Json, Query};
use crate::services::aggregation::{lookback_start, monthly_stats, MonthlyStats};
use crate::services::trend::{points_from_records, segment, TrendSeries};
use crate::AppState;

const MAX_LOOKBACK_MONTHS: u32 = 120;
/// Widest trend window, inclusive of both ends.
pub const MAX_TREND_DAYS: i64 = 366;

#[derive(Debug, Deserialize)]
pub struct MonthlyStatsQuery {
    pub months: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub async fn monthly(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<MonthlyStatsQuery>,
) -> AppResult<Json<Vec<MonthlyStats>>> {
    let months = query
        .months
        .unwrap_or(state.config.stats_lookback_months)
        .min(MAX_LOOKBACK_MONTHS);
    let today = Utc::now().date_naive();

    let records = state
        .store
        .list_records(
            auth_user.id,
            RecordFilter::between(lookback_start(today, months), today),
        )
        .await?;

    let stats = monthly_stats(&records);
    tracing::debug!(
        user_id = %auth_user.id,
        records = records.len(),
        months = stats.len(),
        "Monthly stats computed"
    );
    Ok(Json(stats))
}

pub async fn trend(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<TrendQuery>,
) -> AppResult<Json<TrendSeries>> {
    let end = query.end_date.unwrap_or_else(|| Utc::now().date_naive());
    let start = query.start_date.unwrap_or_else(|| {
        end.checked_sub_signed(Duration::days(state.config.trend_window_days.clamp(1, MAX_TREND_DAYS) - 1))
            .unwrap_or(NaiveDate::MIN)
    });
    if start > end {
        return Err(AppError::Validation("start_date must not be after end_date".into()));
    }
    if (end - start).num_days() >= MAX_TREND_DAYS {
        return Err(AppError::Validation(format!(
            "trend window must be at most {} days",
            MAX_TREND_DAYS
        )));
    }

    let records = state
        .store
        .list_records(auth_user.id, RecordFilter::between(start, end).ascending())
        .await?;

    Ok(Json(segment(&points_from_records(&records))))
}
