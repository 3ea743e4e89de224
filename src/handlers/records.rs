use axum::{extract::State, http::StatusCode, Extension};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::db::RecordFilter;
use crate::dto::DeleteResponse;
use crate::error::{AppError, AppResult};
use crate::extract::{Json, Path, Query};
use crate::models::daily_record::{
    CalendarEntry, CalendarQuery, CreateRecordRequest, DailyRecord, ImportRecordsRequest,
    ImportRecordsResponse, RecordEntry, RecordForm, RecordQuery,
};
use crate::services::aggregation::lookback_start;
use crate::AppState;

const MAX_HISTORY_LIMIT: i64 = 1000;

/// Validate a create/update form. A saved day must carry at least one mood.
fn entry_from_form(form: RecordForm) -> AppResult<RecordEntry> {
    form.validate()?;
    let entry = form.into_entry()?;
    if entry.mood.is_none() {
        return Err(AppError::Validation("Select at least one mood".into()));
    }
    Ok(entry)
}

fn record_not_found() -> AppError {
    AppError::NotFound("Record not found".into())
}

pub async fn list_records(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<RecordQuery>,
) -> AppResult<Json<Vec<DailyRecord>>> {
    if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        if start > end {
            return Err(AppError::Validation("start_date must not be after end_date".into()));
        }
    }

    let filter = RecordFilter {
        start: query.start_date,
        end: query.end_date,
        ..RecordFilter::default()
    }
    .limit(
        query
            .limit
            .unwrap_or(state.config.history_limit)
            .clamp(1, MAX_HISTORY_LIMIT),
    );

    let records = state.store.list_records(auth_user.id, filter).await?;
    Ok(Json(records))
}

pub async fn create_record(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateRecordRequest>,
) -> AppResult<(StatusCode, Json<DailyRecord>)> {
    let record_date = body.record_date.unwrap_or_else(|| Utc::now().date_naive());
    let entry = entry_from_form(body.form)?;

    let record = state
        .store
        .insert_record(auth_user.id, record_date, &entry)
        .await?;

    tracing::info!(
        user_id = %auth_user.id,
        record_id = %record.id,
        %record_date,
        "Daily record created"
    );
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn get_record(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DailyRecord>> {
    let record = state
        .store
        .get_record(auth_user.id, id)
        .await?
        .ok_or_else(record_not_found)?;
    Ok(Json(record))
}

pub async fn update_record(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<RecordForm>,
) -> AppResult<Json<DailyRecord>> {
    let entry = entry_from_form(body)?;

    let record = state
        .store
        .update_record(auth_user.id, id, &entry)
        .await?
        .ok_or_else(record_not_found)?;

    tracing::info!(user_id = %auth_user.id, record_id = %id, "Daily record updated");
    Ok(Json(record))
}

pub async fn delete_record(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeleteResponse>> {
    if !state.store.delete_record(auth_user.id, id).await? {
        return Err(record_not_found());
    }

    tracing::info!(user_id = %auth_user.id, record_id = %id, "Daily record deleted");
    Ok(Json(DeleteResponse { deleted: true, id }))
}

/// Recorded days of the trailing window, oldest first, for the calendar view.
pub async fn calendar(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<CalendarQuery>,
) -> AppResult<Json<Vec<CalendarEntry>>> {
    let today = Utc::now().date_naive();
    let months = query.months.unwrap_or(state.config.calendar_lookback_months);
    let filter = RecordFilter::between(lookback_start(today, months), today).ascending();

    let entries = state
        .store
        .list_records(auth_user.id, filter)
        .await?
        .into_iter()
        .map(|r| CalendarEntry {
            record_date: r.record_date,
            id: r.id,
            mood: r.entry.mood,
        })
        .collect();
    Ok(Json(entries))
}

/// Import rows exported on the `0..=8` scale.
///
/// The whole batch is converted and checked before anything is written, and
/// the store writes it all or nothing. Dates that already have a record are skipped.
pub async fn import_records(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<ImportRecordsRequest>,
) -> AppResult<Json<ImportRecordsResponse>> {
    body.validate()?;

    let rows = body
        .records
        .into_iter()
        .map(|row| {
            let date = row.record_date;
            row.into_entry()
                .map_err(|e| AppError::Validation(format!("{}: {}", date, e)))
        })
        .collect::<AppResult<Vec<_>>>()?;

    let skipped = state.store.import_records(auth_user.id, &rows).await?;
    let imported = rows.len() - skipped.len();

    tracing::info!(
        user_id = %auth_user.id,
        imported,
        skipped = skipped.len(),
        "Legacy records imported"
    );
    Ok(Json(ImportRecordsResponse { imported, skipped }))
}
