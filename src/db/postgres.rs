use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::QueryAs;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres};
use uuid::Uuid;

use crate::db::store::{MoodStore, RecordFilter, SortOrder};
use crate::error::{AppError, AppResult};
use crate::models::assessment::MonthlyAssessment;
use crate::models::daily_record::{DailyRecord, RecordEntry};
use crate::models::mood::MoodPair;
use crate::models::score::Score;
use crate::models::user::{NewRefreshToken, NewUser, RefreshToken, User};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RecordRow {
    id: Uuid,
    user_id: Uuid,
    record_date: NaiveDate,
    mood_up: Option<i16>,
    mood_down: Option<i16>,
    anxiety: i16,
    tension: i16,
    anger: i16,
    interest: i16,
    activity: i16,
    thought_speed: i16,
    thought_content: i16,
    sleep_hours: f64,
    weight: Option<f64>,
    has_menstruation: bool,
    has_binge_eating: bool,
    has_physical_pain: bool,
    has_panic_attack: bool,
    has_exercise: bool,
    has_crying: bool,
    alcohol_units: f64,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RecordRow> for DailyRecord {
    type Error = AppError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        let corrupt = |e: &dyn std::fmt::Display| {
            AppError::Internal(anyhow::anyhow!("daily_records row {} is invalid: {}", row.id, e))
        };
        let score = |v: i16| Score::new(v).map_err(|e| corrupt(&e));

        Ok(DailyRecord {
            id: row.id,
            user_id: row.user_id,
            record_date: row.record_date,
            entry: RecordEntry {
                mood: MoodPair::from_parts(row.mood_up, row.mood_down).map_err(|e| corrupt(&e))?,
                anxiety: score(row.anxiety)?,
                tension: score(row.tension)?,
                anger: score(row.anger)?,
                interest: score(row.interest)?,
                activity: score(row.activity)?,
                thought_speed: score(row.thought_speed)?,
                thought_content: score(row.thought_content)?,
                sleep_hours: row.sleep_hours,
                weight: row.weight,
                has_menstruation: row.has_menstruation,
                has_binge_eating: row.has_binge_eating,
                has_physical_pain: row.has_physical_pain,
                has_panic_attack: row.has_panic_attack,
                has_exercise: row.has_exercise,
                has_crying: row.has_crying,
                alcohol_units: row.alcohol_units,
                notes: row.notes,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct AssessmentRow {
    id: Uuid,
    user_id: Uuid,
    assessment_month: NaiveDate,
    total_score: i32,
    answers: Json<BTreeMap<String, String>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AssessmentRow> for MonthlyAssessment {
    fn from(row: AssessmentRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            assessment_month: row.assessment_month,
            total_score: row.total_score,
            answers: row.answers.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn conflict_on_unique(message: String) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                return AppError::Conflict(message);
            }
        }
        AppError::Database(e)
    }
}

const INSERT_RECORD_COLUMNS: &str = r#"
    INSERT INTO daily_records (
        id, user_id, record_date, mood_up, mood_down,
        anxiety, tension, anger, interest, activity, thought_speed, thought_content,
        sleep_hours, weight,
        has_menstruation, has_binge_eating, has_physical_pain,
        has_panic_attack, has_exercise, has_crying,
        alcohol_units, notes
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
            $15, $16, $17, $18, $19, $20, $21, $22)
"#;

/// Bind a new record to an insert built on `INSERT_RECORD_COLUMNS`.
fn insert_record_query<'q, O>(
    sql: &'q str,
    user_id: Uuid,
    date: NaiveDate,
    entry: &'q RecordEntry,
) -> QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    sqlx::query_as::<_, O>(sql)
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(date)
        .bind(entry.mood.up())
        .bind(entry.mood.down())
        .bind(i16::from(entry.anxiety))
        .bind(i16::from(entry.tension))
        .bind(i16::from(entry.anger))
        .bind(i16::from(entry.interest))
        .bind(i16::from(entry.activity))
        .bind(i16::from(entry.thought_speed))
        .bind(i16::from(entry.thought_content))
        .bind(entry.sleep_hours)
        .bind(entry.weight)
        .bind(entry.has_menstruation)
        .bind(entry.has_binge_eating)
        .bind(entry.has_physical_pain)
        .bind(entry.has_panic_attack)
        .bind(entry.has_exercise)
        .bind(entry.has_crying)
        .bind(entry.alcohol_units)
        .bind(&entry.notes)
}

fn to_records(rows: Vec<RecordRow>) -> AppResult<Vec<DailyRecord>> {
    rows.into_iter().map(DailyRecord::try_from).collect()
}

#[async_trait]
impl MoodStore for PgStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, name)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_on_unique("Email already registered".into()))
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn store_refresh_token(&self, token: NewRefreshToken) -> AppResult<RefreshToken> {
        Ok(sqlx::query_as::<_, RefreshToken>(
            r#"
            INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, parent_token_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, token_hash, expires_at, revoked, parent_token_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(token.user_id)
        .bind(&token.token_hash)
        .bind(token.expires_at)
        .bind(token.parent_token_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_refresh_token(&self, token_hash: &str) -> AppResult<Option<RefreshToken>> {
        Ok(sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT id, user_id, token_hash, expires_at, revoked, parent_token_id, created_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn revoke_refresh_token(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE refresh_tokens SET revoked = true, revoked_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn revoke_user_refresh_tokens(&self, user_id: Uuid) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = true, revoked_at = NOW()
            WHERE user_id = $1 AND revoked = false
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_records(&self, user_id: Uuid, filter: RecordFilter) -> AppResult<Vec<DailyRecord>> {
        let direction = match filter.order {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        };
        let sql = format!(
            r#"
            SELECT * FROM daily_records
            WHERE user_id = $1
              AND ($2::date IS NULL OR record_date >= $2)
              AND ($3::date IS NULL OR record_date <= $3)
            ORDER BY record_date {}
            LIMIT $4
            "#,
            direction
        );

        let rows = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(user_id)
            .bind(filter.start)
            .bind(filter.end)
            .bind(filter.limit)
            .fetch_all(&self.pool)
            .await?;
        to_records(rows)
    }

    async fn get_record(&self, user_id: Uuid, id: Uuid) -> AppResult<Option<DailyRecord>> {
        sqlx::query_as::<_, RecordRow>("SELECT * FROM daily_records WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .map(DailyRecord::try_from)
            .transpose()
    }

    async fn insert_record(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        entry: &RecordEntry,
    ) -> AppResult<DailyRecord> {
        let sql = format!("{} RETURNING *", INSERT_RECORD_COLUMNS);
        let row: RecordRow = insert_record_query(&sql, user_id, date, entry)
            .fetch_one(&self.pool)
            .await
            .map_err(conflict_on_unique(format!("A record for {} already exists", date)))?;

        row.try_into()
    }

    async fn import_records(
        &self,
        user_id: Uuid,
        rows: &[(NaiveDate, RecordEntry)],
    ) -> AppResult<Vec<NaiveDate>> {
        let sql = format!(
            "{} ON CONFLICT (user_id, record_date) DO NOTHING RETURNING id",
            INSERT_RECORD_COLUMNS
        );
        let mut tx = self.pool.begin().await?;
        let mut skipped = Vec::new();

        for (date, entry) in rows {
            let inserted: Option<(Uuid,)> = insert_record_query(&sql, user_id, *date, entry)
                .fetch_optional(&mut *tx)
                .await?;
            if inserted.is_none() {
                skipped.push(*date);
            }
        }

        tx.commit().await?;
        Ok(skipped)
    }

    async fn update_record(
        &self,
        user_id: Uuid,
        id: Uuid,
        entry: &RecordEntry,
    ) -> AppResult<Option<DailyRecord>> {
        sqlx::query_as::<_, RecordRow>(
            r#"
            UPDATE daily_records SET
                mood_up = $3,
                mood_down = $4,
                anxiety = $5,
                tension = $6,
                anger = $7,
                interest = $8,
                activity = $9,
                thought_speed = $10,
                thought_content = $11,
                sleep_hours = $12,
                weight = $13,
                has_menstruation = $14,
                has_binge_eating = $15,
                has_physical_pain = $16,
                has_panic_attack = $17,
                has_exercise = $18,
                has_crying = $19,
                alcohol_units = $20,
                notes = $21,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(entry.mood.up())
        .bind(entry.mood.down())
        .bind(i16::from(entry.anxiety))
        .bind(i16::from(entry.tension))
        .bind(i16::from(entry.anger))
        .bind(i16::from(entry.interest))
        .bind(i16::from(entry.activity))
        .bind(i16::from(entry.thought_speed))
        .bind(i16::from(entry.thought_content))
        .bind(entry.sleep_hours)
        .bind(entry.weight)
        .bind(entry.has_menstruation)
        .bind(entry.has_binge_eating)
        .bind(entry.has_physical_pain)
        .bind(entry.has_panic_attack)
        .bind(entry.has_exercise)
        .bind(entry.has_crying)
        .bind(entry.alcohol_units)
        .bind(&entry.notes)
        .fetch_optional(&self.pool)
        .await?
        .map(DailyRecord::try_from)
        .transpose()
    }

    async fn delete_record(&self, user_id: Uuid, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM daily_records WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn upsert_assessment(
        &self,
        user_id: Uuid,
        month: NaiveDate,
        total_score: i32,
        answers: &BTreeMap<String, String>,
    ) -> AppResult<MonthlyAssessment> {
        let row = sqlx::query_as::<_, AssessmentRow>(
            r#"
            INSERT INTO monthly_assessments (id, user_id, assessment_month, total_score, answers)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, assessment_month) DO UPDATE SET
                total_score = EXCLUDED.total_score,
                answers = EXCLUDED.answers,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(month)
        .bind(total_score)
        .bind(Json(answers))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn get_assessment(
        &self,
        user_id: Uuid,
        month: NaiveDate,
    ) -> AppResult<Option<MonthlyAssessment>> {
        let row = sqlx::query_as::<_, AssessmentRow>(
            "SELECT * FROM monthly_assessments WHERE user_id = $1 AND assessment_month = $2",
        )
        .bind(user_id)
        .bind(month)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn list_assessments(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<MonthlyAssessment>> {
        let rows = sqlx::query_as::<_, AssessmentRow>(
            r#"
            SELECT * FROM monthly_assessments
            WHERE user_id = $1
            ORDER BY assessment_month DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
