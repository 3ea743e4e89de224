use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::assessment::MonthlyAssessment;
use crate::models::daily_record::{DailyRecord, RecordEntry};
use crate::models::user::{NewRefreshToken, NewUser, RefreshToken, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Date-range read over one user's records. Bounds are inclusive.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub order: SortOrder,
    pub limit: Option<i64>,
}

impl RecordFilter {
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            ..Self::default()
        }
    }

    pub fn ascending(mut self) -> Self {
        self.order = SortOrder::Ascending;
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

/// Persistence for users, sessions, daily records and monthly assessments.
///
/// Every record and assessment operation takes the owning user id and never
/// touches another user's rows.
#[async_trait]
pub trait MoodStore: Send + Sync + 'static {
    /// Cheap round trip used by readiness checks.
    async fn ping(&self) -> AppResult<()>;

    /// Fails with `Conflict` when the email is taken.
    async fn create_user(&self, user: NewUser) -> AppResult<User>;
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn store_refresh_token(&self, token: NewRefreshToken) -> AppResult<RefreshToken>;
    async fn find_refresh_token(&self, token_hash: &str) -> AppResult<Option<RefreshToken>>;
    async fn revoke_refresh_token(&self, id: Uuid) -> AppResult<()>;
    async fn revoke_user_refresh_tokens(&self, user_id: Uuid) -> AppResult<()>;

    async fn list_records(&self, user_id: Uuid, filter: RecordFilter) -> AppResult<Vec<DailyRecord>>;
    async fn get_record(&self, user_id: Uuid, id: Uuid) -> AppResult<Option<DailyRecord>>;
    /// Fails with `Conflict` when the user already has a record for `date`.
    async fn insert_record(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        entry: &RecordEntry,
    ) -> AppResult<DailyRecord>;
    /// Insert every row, or nothing if any insert fails. Dates the user
    /// already has a record for are left untouched and returned.
    async fn import_records(
        &self,
        user_id: Uuid,
        rows: &[(NaiveDate, RecordEntry)],
    ) -> AppResult<Vec<NaiveDate>>;
    /// `None` when no such record belongs to the user.
    async fn update_record(
        &self,
        user_id: Uuid,
        id: Uuid,
        entry: &RecordEntry,
    ) -> AppResult<Option<DailyRecord>>;
    async fn delete_record(&self, user_id: Uuid, id: Uuid) -> AppResult<bool>;

    /// Insert, or overwrite score and answers of the existing row for the month.
    async fn upsert_assessment(
        &self,
        user_id: Uuid,
        month: NaiveDate,
        total_score: i32,
        answers: &BTreeMap<String, String>,
    ) -> AppResult<MonthlyAssessment>;
    async fn get_assessment(
        &self,
        user_id: Uuid,
        month: NaiveDate,
    ) -> AppResult<Option<MonthlyAssessment>>;
    /// Newest month first.
    async fn list_assessments(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<MonthlyAssessment>>;
}
