use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::store::{MoodStore, RecordFilter, SortOrder};
use crate::error::{AppError, AppResult};
use crate::models::assessment::MonthlyAssessment;
use crate::models::daily_record::{DailyRecord, RecordEntry};
use crate::models::user::{NewRefreshToken, NewUser, RefreshToken, User};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    refresh_tokens: HashMap<Uuid, RefreshToken>,
    records: HashMap<Uuid, DailyRecord>,
    assessments: HashMap<Uuid, MonthlyAssessment>,
}

/// Process-local store. Used when no `DATABASE_URL` is configured and in tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MoodStore for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("Email already registered".into()));
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn store_refresh_token(&self, token: NewRefreshToken) -> AppResult<RefreshToken> {
        let stored = RefreshToken {
            id: Uuid::new_v4(),
            user_id: token.user_id,
            token_hash: token.token_hash,
            expires_at: token.expires_at,
            revoked: false,
            parent_token_id: token.parent_token_id,
            created_at: Utc::now(),
        };
        self.tables
            .write()
            .await
            .refresh_tokens
            .insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_refresh_token(&self, token_hash: &str) -> AppResult<Option<RefreshToken>> {
        let tables = self.tables.read().await;
        Ok(tables
            .refresh_tokens
            .values()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    async fn revoke_refresh_token(&self, id: Uuid) -> AppResult<()> {
        if let Some(token) = self.tables.write().await.refresh_tokens.get_mut(&id) {
            token.revoked = true;
        }
        Ok(())
    }

    async fn revoke_user_refresh_tokens(&self, user_id: Uuid) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .refresh_tokens
            .values_mut()
            .filter(|t| t.user_id == user_id)
            .for_each(|t| t.revoked = true);
        Ok(())
    }

    async fn list_records(&self, user_id: Uuid, filter: RecordFilter) -> AppResult<Vec<DailyRecord>> {
        let tables = self.tables.read().await;
        let mut records: Vec<DailyRecord> = tables
            .records
            .values()
            .filter(|r| r.user_id == user_id && filter.matches(r.record_date))
            .cloned()
            .collect();

        match filter.order {
            SortOrder::Ascending => records.sort_by_key(|r| r.record_date),
            SortOrder::Descending => records.sort_by(|a, b| b.record_date.cmp(&a.record_date)),
        }
        if let Some(limit) = filter.limit {
            records.truncate(limit.max(0) as usize);
        }
        Ok(records)
    }

    async fn get_record(&self, user_id: Uuid, id: Uuid) -> AppResult<Option<DailyRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .records
            .get(&id)
            .filter(|r| r.user_id == user_id)
            .cloned())
    }

    async fn insert_record(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        entry: &RecordEntry,
    ) -> AppResult<DailyRecord> {
        let mut tables = self.tables.write().await;
        if tables
            .records
            .values()
            .any(|r| r.user_id == user_id && r.record_date == date)
        {
            return Err(AppError::Conflict(format!("A record for {} already exists", date)));
        }

        let now = Utc::now();
        let record = DailyRecord {
            id: Uuid::new_v4(),
            user_id,
            record_date: date,
            entry: entry.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn import_records(
        &self,
        user_id: Uuid,
        rows: &[(NaiveDate, RecordEntry)],
    ) -> AppResult<Vec<NaiveDate>> {
        let mut tables = self.tables.write().await;
        let mut taken: HashSet<NaiveDate> = tables
            .records
            .values()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.record_date)
            .collect();

        let now = Utc::now();
        let mut skipped = Vec::new();
        for (date, entry) in rows {
            if !taken.insert(*date) {
                skipped.push(*date);
                continue;
            }
            let record = DailyRecord {
                id: Uuid::new_v4(),
                user_id,
                record_date: *date,
                entry: entry.clone(),
                created_at: now,
                updated_at: now,
            };
            tables.records.insert(record.id, record);
        }
        Ok(skipped)
    }

    async fn update_record(
        &self,
        user_id: Uuid,
        id: Uuid,
        entry: &RecordEntry,
    ) -> AppResult<Option<DailyRecord>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .records
            .get_mut(&id)
            .filter(|r| r.user_id == user_id)
            .map(|r| {
                r.entry = entry.clone();
                r.updated_at = Utc::now();
                r.clone()
            }))
    }

    async fn delete_record(&self, user_id: Uuid, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let owned = tables.records.get(&id).is_some_and(|r| r.user_id == user_id);
        if owned {
            tables.records.remove(&id);
        }
        Ok(owned)
    }

    async fn upsert_assessment(
        &self,
        user_id: Uuid,
        month: NaiveDate,
        total_score: i32,
        answers: &BTreeMap<String, String>,
    ) -> AppResult<MonthlyAssessment> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        if let Some(existing) = tables
            .assessments
            .values_mut()
            .find(|a| a.user_id == user_id && a.assessment_month == month)
        {
            existing.total_score = total_score;
            existing.answers = answers.clone();
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let created = MonthlyAssessment {
            id: Uuid::new_v4(),
            user_id,
            assessment_month: month,
            total_score,
            answers: answers.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.assessments.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_assessment(
        &self,
        user_id: Uuid,
        month: NaiveDate,
    ) -> AppResult<Option<MonthlyAssessment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .assessments
            .values()
            .find(|a| a.user_id == user_id && a.assessment_month == month)
            .cloned())
    }

    async fn list_assessments(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<MonthlyAssessment>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<MonthlyAssessment> = tables
            .assessments
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.assessment_month.cmp(&a.assessment_month));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::mood::MoodPair;
    use crate::models::score::Score;

    fn entry(mood: MoodPair) -> RecordEntry {
        RecordEntry {
            mood,
            anxiety: Score::NEUTRAL,
            tension: Score::NEUTRAL,
            anger: Score::NEUTRAL,
            interest: Score::NEUTRAL,
            activity: Score::NEUTRAL,
            thought_speed: Score::NEUTRAL,
            thought_content: Score::NEUTRAL,
            sleep_hours: 7.5,
            weight: None,
            has_menstruation: false,
            has_binge_eating: false,
            has_physical_pain: false,
            has_panic_attack: false,
            has_exercise: true,
            has_crying: false,
            alcohol_units: 0.0,
            notes: None,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
    }

    #[tokio::test]
    async fn test_one_record_per_user_and_date() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        store.insert_record(alice, day(1), &entry(MoodPair::Elevated(1))).await.unwrap();
        let dup = store.insert_record(alice, day(1), &entry(MoodPair::None)).await;
        assert!(matches!(dup, Err(AppError::Conflict(_))));

        store.insert_record(bob, day(1), &entry(MoodPair::None)).await.unwrap();
    }

    #[tokio::test]
    async fn test_import_skips_taken_dates() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store.insert_record(user, day(5), &entry(MoodPair::Elevated(2))).await.unwrap();

        let rows = vec![
            (day(4), entry(MoodPair::None)),
            (day(5), entry(MoodPair::Depressed(-1))),
            (day(4), entry(MoodPair::Elevated(3))),
        ];
        let skipped = store.import_records(user, &rows).await.unwrap();
        assert_eq!(skipped, vec![day(5), day(4)]);

        let stored = store.list_records(user, RecordFilter::default()).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].entry.mood, MoodPair::Elevated(2));
        assert_eq!(stored[1].entry.mood, MoodPair::None);
    }

    #[tokio::test]
    async fn test_records_are_scoped_to_owner() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let record = store
            .insert_record(alice, day(2), &entry(MoodPair::Depressed(-2)))
            .await
            .unwrap();

        assert!(store.get_record(bob, record.id).await.unwrap().is_none());
        assert!(store
            .update_record(bob, record.id, &entry(MoodPair::None))
            .await
            .unwrap()
            .is_none());
        assert!(!store.delete_record(bob, record.id).await.unwrap());
        assert!(store.delete_record(alice, record.id).await.unwrap());
        assert!(store.get_record(alice, record.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_records_filters_and_orders() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        for d in [3, 1, 2, 10] {
            store.insert_record(user, day(d), &entry(MoodPair::None)).await.unwrap();
        }

        let newest = store
            .list_records(user, RecordFilter::between(day(1), day(3)))
            .await
            .unwrap();
        let dates: Vec<NaiveDate> = newest.iter().map(|r| r.record_date).collect();
        assert_eq!(dates, vec![day(3), day(2), day(1)]);

        let oldest_two = store
            .list_records(user, RecordFilter::default().ascending().limit(2))
            .await
            .unwrap();
        assert_eq!(oldest_two.len(), 2);
        assert_eq!(oldest_two[0].record_date, day(1));
    }

    #[tokio::test]
    async fn test_assessment_upsert_keeps_one_row_per_month() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let month = day(1);
        let mut answers = BTreeMap::new();
        answers.insert("q1".to_string(), "q1_a1".to_string());

        let first = store.upsert_assessment(user, month, 40, &answers).await.unwrap();
        answers.insert("q1".to_string(), "q1_a4".to_string());
        let second = store.upsert_assessment(user, month, 0, &answers).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.total_score, 0);
        assert_eq!(store.list_assessments(user, 12).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_revoke_user_tokens() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        for hash in ["a", "b"] {
            store
                .store_refresh_token(NewRefreshToken {
                    user_id: user,
                    token_hash: hash.to_string(),
                    expires_at: Utc::now(),
                    parent_token_id: None,
                })
                .await
                .unwrap();
        }

        store.revoke_user_refresh_tokens(user).await.unwrap();
        assert!(store.find_refresh_token("a").await.unwrap().unwrap().revoked);
        assert!(store.find_refresh_token("b").await.unwrap().unwrap().revoked);
    }
}
