use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::mood::{MoodError, MoodPair};
use crate::models::score::{Score, ScoreError};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error(transparent)]
    Mood(#[from] MoodError),

    #[error(transparent)]
    Score(#[from] ScoreError),

    #[error("sleep hours must be between {MIN_SLEEP_HOURS} and {MAX_SLEEP_HOURS}, got {0}")]
    SleepHours(f64),

    #[error("weight must be between {MIN_WEIGHT} and {MAX_WEIGHT}, got {0}")]
    Weight(f64),

    #[error("alcohol units must be between 0 and {MAX_ALCOHOL_UNITS}, got {0}")]
    AlcoholUnits(f64),

    #[error("notes must be at most {MAX_NOTES_CHARS} characters, got {0}")]
    NotesTooLong(usize),
}

// Mirrored by the `validate` attributes on `RecordForm`.
pub const MIN_SLEEP_HOURS: f64 = 0.5;
pub const MAX_SLEEP_HOURS: f64 = 24.0;
pub const MIN_WEIGHT: f64 = 1.0;
pub const MAX_WEIGHT: f64 = 500.0;
pub const MAX_ALCOHOL_UNITS: f64 = 100.0;
pub const MAX_NOTES_CHARS: usize = 2000;

/// The editable part of a daily record. Dimension scores are on the `-4..=4` scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEntry {
    pub mood: MoodPair,
    pub anxiety: Score,
    pub tension: Score,
    pub anger: Score,
    pub interest: Score,
    pub activity: Score,
    pub thought_speed: Score,
    pub thought_content: Score,
    pub sleep_hours: f64,
    pub weight: Option<f64>,
    pub has_menstruation: bool,
    pub has_binge_eating: bool,
    pub has_physical_pain: bool,
    pub has_panic_attack: bool,
    pub has_exercise: bool,
    pub has_crying: bool,
    pub alcohol_units: f64,
    pub notes: Option<String>,
}

impl RecordEntry {
    /// Range and length limits shared by every way a record gets written.
    pub fn check_limits(&self) -> Result<(), RecordError> {
        if !(MIN_SLEEP_HOURS..=MAX_SLEEP_HOURS).contains(&self.sleep_hours) {
            return Err(RecordError::SleepHours(self.sleep_hours));
        }
        if let Some(weight) = self.weight {
            if !(MIN_WEIGHT..=MAX_WEIGHT).contains(&weight) {
                return Err(RecordError::Weight(weight));
            }
        }
        if !(0.0..=MAX_ALCOHOL_UNITS).contains(&self.alcohol_units) {
            return Err(RecordError::AlcoholUnits(self.alcohol_units));
        }
        if let Some(notes) = &self.notes {
            let chars = notes.chars().count();
            if chars > MAX_NOTES_CHARS {
                return Err(RecordError::NotesTooLong(chars));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub record_date: NaiveDate,
    #[serde(flatten)]
    pub entry: RecordEntry,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Form fields shared by create and update.
#[derive(Debug, Deserialize, Validate)]
pub struct RecordForm {
    /// Picker selection, up to one elevated (`0..=4`) and one depressed (`-4..=-1`) value.
    #[serde(default)]
    pub moods: Vec<i16>,
    #[serde(default)]
    pub anxiety: Score,
    #[serde(default)]
    pub tension: Score,
    #[serde(default)]
    pub anger: Score,
    #[serde(default)]
    pub interest: Score,
    #[serde(default)]
    pub activity: Score,
    #[serde(default)]
    pub thought_speed: Score,
    #[serde(default)]
    pub thought_content: Score,
    #[validate(range(min = 0.5, max = 24.0, message = "Sleep hours must be between 0.5 and 24"))]
    pub sleep_hours: f64,
    #[validate(range(min = 1.0, max = 500.0, message = "Weight must be between 1 and 500"))]
    pub weight: Option<f64>,
    #[serde(default)]
    pub has_menstruation: bool,
    #[serde(default)]
    pub has_binge_eating: bool,
    #[serde(default)]
    pub has_physical_pain: bool,
    #[serde(default)]
    pub has_panic_attack: bool,
    #[serde(default)]
    pub has_exercise: bool,
    #[serde(default)]
    pub has_crying: bool,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0, message = "Alcohol units must be between 0 and 100"))]
    pub alcohol_units: f64,
    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

impl RecordForm {
    pub fn into_entry(self) -> Result<RecordEntry, RecordError> {
        let mood = MoodPair::from_selection(&self.moods)?;
        Ok(RecordEntry {
            mood,
            anxiety: self.anxiety,
            tension: self.tension,
            anger: self.anger,
            interest: self.interest,
            activity: self.activity,
            thought_speed: self.thought_speed,
            thought_content: self.thought_content,
            sleep_hours: self.sleep_hours,
            weight: self.weight,
            has_menstruation: self.has_menstruation,
            has_binge_eating: self.has_binge_eating,
            has_physical_pain: self.has_physical_pain,
            has_panic_attack: self.has_panic_attack,
            has_exercise: self.has_exercise,
            has_crying: self.has_crying,
            alcohol_units: self.alcohol_units,
            notes: normalize_notes(self.notes),
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRecordRequest {
    /// Defaults to today (UTC).
    pub record_date: Option<NaiveDate>,
    #[serde(flatten)]
    #[validate]
    pub form: RecordForm,
}

#[derive(Debug, Deserialize)]
pub struct RecordQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub months: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct CalendarEntry {
    pub record_date: NaiveDate,
    pub id: Uuid,
    pub mood: MoodPair,
}

/// A row exported from the earlier mobile client, scores on the `0..=8` scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyRecord {
    pub record_date: NaiveDate,
    pub mood_up_score: Option<i16>,
    pub mood_down_score: Option<i16>,
    pub anxiety_score: i16,
    pub tension_score: i16,
    pub anger_score: i16,
    pub interest_score: i16,
    pub activity_score: i16,
    pub thought_speed_score: i16,
    pub thought_content_score: i16,
    pub sleep_hours: f64,
    pub weight: Option<f64>,
    #[serde(default)]
    pub has_menstruation: bool,
    #[serde(default)]
    pub has_binge_eating: bool,
    #[serde(default)]
    pub has_physical_pain: bool,
    #[serde(default)]
    pub has_panic_attack: bool,
    #[serde(default)]
    pub has_exercise: bool,
    #[serde(default)]
    pub has_crying: bool,
    /// Drinks that day, despite the name.
    #[serde(default)]
    pub has_alcohol: f64,
    pub notes: Option<String>,
}

impl LegacyRecord {
    pub fn into_entry(self) -> Result<(NaiveDate, RecordEntry), RecordError> {
        let entry = RecordEntry {
            mood: MoodPair::from_parts(self.mood_up_score, self.mood_down_score)?,
            anxiety: Score::from_internal(self.anxiety_score)?,
            tension: Score::from_internal(self.tension_score)?,
            anger: Score::from_internal(self.anger_score)?,
            interest: Score::from_internal(self.interest_score)?,
            activity: Score::from_internal(self.activity_score)?,
            thought_speed: Score::from_internal(self.thought_speed_score)?,
            thought_content: Score::from_internal(self.thought_content_score)?,
            sleep_hours: self.sleep_hours,
            weight: self.weight.filter(|w| *w > 0.0),
            has_menstruation: self.has_menstruation,
            has_binge_eating: self.has_binge_eating,
            has_physical_pain: self.has_physical_pain,
            has_panic_attack: self.has_panic_attack,
            has_exercise: self.has_exercise,
            has_crying: self.has_crying,
            alcohol_units: self.has_alcohol,
            notes: normalize_notes(self.notes),
        };
        entry.check_limits()?;
        Ok((self.record_date, entry))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ImportRecordsRequest {
    #[validate(length(min = 1, max = 1000, message = "Import between 1 and 1000 records at a time"))]
    pub records: Vec<LegacyRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportRecordsResponse {
    pub imported: usize,
    /// Dates that already had a record and were left untouched.
    pub skipped: Vec<NaiveDate>,
}

fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}
