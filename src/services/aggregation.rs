//! Per-month summaries of daily records.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Serialize, Serializer};

use crate::models::daily_record::DailyRecord;
use crate::models::score::Score;

/// Calendar month, ordered chronologically and rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Number of days in the month with each flag set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlagDays {
    pub menstruation: usize,
    pub binge_eating: usize,
    pub physical_pain: usize,
    pub panic_attack: usize,
    pub exercise: usize,
    pub crying: usize,
}

/// Averages for one month. Dimension averages are on the `-4..=4` scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyStats {
    pub month: MonthKey,
    pub record_count: usize,
    pub mixed_days: usize,
    pub avg_mood_up: Option<f64>,
    pub avg_mood_down: Option<f64>,
    pub avg_anxiety: f64,
    pub avg_tension: f64,
    pub avg_anger: f64,
    pub avg_interest: f64,
    pub avg_activity: f64,
    pub avg_thought_speed: f64,
    pub avg_thought_content: f64,
    pub avg_sleep_hours: f64,
    pub avg_weight: Option<f64>,
    pub avg_alcohol_units: f64,
    pub flag_days: FlagDays,
}

/// First day of the trailing lookback window ending at `today`.
pub fn lookback_start(today: NaiveDate, months: u32) -> NaiveDate {
    today
        .checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN)
}

/// Group records by month and summarise each group, most recent month first.
pub fn monthly_stats(records: &[DailyRecord]) -> Vec<MonthlyStats> {
    let mut by_month: BTreeMap<MonthKey, Vec<&DailyRecord>> = BTreeMap::new();
    for record in records {
        by_month
            .entry(MonthKey::of(record.record_date))
            .or_default()
            .push(record);
    }

    by_month
        .into_iter()
        .rev()
        .map(|(month, group)| summarize(month, &group))
        .collect()
}

fn summarize(month: MonthKey, records: &[&DailyRecord]) -> MonthlyStats {
    let score_mean = |pick: fn(&DailyRecord) -> Score| {
        mean_all(records.iter().map(|r| f64::from(pick(r).value())))
    };
    let count_flag = |pick: fn(&DailyRecord) -> bool| records.iter().filter(|r| pick(r)).count();

    MonthlyStats {
        month,
        record_count: records.len(),
        mixed_days: records.iter().filter(|r| r.entry.mood.is_mixed()).count(),
        avg_mood_up: mean(records.iter().filter_map(|r| r.entry.mood.up().map(f64::from))),
        avg_mood_down: mean(records.iter().filter_map(|r| r.entry.mood.down().map(f64::from))),
        avg_anxiety: score_mean(|r| r.entry.anxiety),
        avg_tension: score_mean(|r| r.entry.tension),
        avg_anger: score_mean(|r| r.entry.anger),
        avg_interest: score_mean(|r| r.entry.interest),
        avg_activity: score_mean(|r| r.entry.activity),
        avg_thought_speed: score_mean(|r| r.entry.thought_speed),
        avg_thought_content: score_mean(|r| r.entry.thought_content),
        avg_sleep_hours: mean_all(records.iter().map(|r| r.entry.sleep_hours)),
        avg_weight: mean(records.iter().filter_map(|r| r.entry.weight)),
        avg_alcohol_units: mean_all(records.iter().map(|r| r.entry.alcohol_units)),
        flag_days: FlagDays {
            menstruation: count_flag(|r| r.entry.has_menstruation),
            binge_eating: count_flag(|r| r.entry.has_binge_eating),
            physical_pain: count_flag(|r| r.entry.has_physical_pain),
            panic_attack: count_flag(|r| r.entry.has_panic_attack),
            exercise: count_flag(|r| r.entry.has_exercise),
            crying: count_flag(|r| r.entry.has_crying),
        },
    }
}

/// Mean over the values present; `None` when there are none.
fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Mean of a field every record carries. Groups are never empty.
fn mean_all(values: impl Iterator<Item = f64>) -> f64 {
    mean(values).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::daily_record::RecordEntry;
    use crate::models::mood::MoodPair;
    use crate::models::score::mean_to_display;
    use chrono::Utc;
    use uuid::Uuid;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn record(day: &str) -> DailyRecord {
        DailyRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            record_date: date(day),
            entry: RecordEntry {
                mood: MoodPair::None,
                anxiety: Score::NEUTRAL,
                tension: Score::NEUTRAL,
                anger: Score::NEUTRAL,
                interest: Score::NEUTRAL,
                activity: Score::NEUTRAL,
                thought_speed: Score::NEUTRAL,
                thought_content: Score::NEUTRAL,
                sleep_hours: 7.0,
                weight: None,
                has_menstruation: false,
                has_binge_eating: false,
                has_physical_pain: false,
                has_panic_attack: false,
                has_exercise: false,
                has_crying: false,
                alcohol_units: 0.0,
                notes: None,
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_missing_weight_is_none_not_zero() {
        let stats = monthly_stats(&[record("2025-01-02"), record("2025-01-03")]);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].avg_weight, None);
        assert_eq!(stats[0].avg_mood_up, None);
        assert_eq!(stats[0].avg_mood_down, None);
    }

    #[test]
    fn test_anxiety_mean_matches_legacy_scale() {
        let records: Vec<DailyRecord> = [2, 4, 6]
            .into_iter()
            .enumerate()
            .map(|(i, legacy)| {
                let mut r = record(&format!("2025-03-0{}", i + 1));
                r.entry.anxiety = Score::from_internal(legacy).unwrap();
                r
            })
            .collect();

        let stats = monthly_stats(&records);
        assert_eq!(stats[0].avg_anxiety, 0.0);
        assert_eq!(stats[0].avg_anxiety, mean_to_display(4.0));
    }

    #[test]
    fn test_optional_fields_divide_by_present_count() {
        let mut a = record("2025-01-01");
        a.entry.weight = Some(60.0);
        a.entry.mood = MoodPair::Elevated(3);
        let mut b = record("2025-01-02");
        b.entry.mood = MoodPair::Mixed { up: 1, down: -2 };
        let mut c = record("2025-01-03");
        c.entry.weight = Some(62.0);
        c.entry.mood = MoodPair::Depressed(-4);

        let stats = &monthly_stats(&[a, b, c])[0];
        assert_eq!(stats.record_count, 3);
        assert_eq!(stats.avg_weight, Some(61.0));
        assert_eq!(stats.avg_mood_up, Some(2.0));
        assert_eq!(stats.avg_mood_down, Some(-3.0));
        assert_eq!(stats.mixed_days, 1);
    }

    #[test]
    fn test_groups_by_calendar_month() {
        let stats = monthly_stats(&[
            record("2025-01-15"),
            record("2025-01-31"),
            record("2025-02-01"),
        ]);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].month.to_string(), "2025-02");
        assert_eq!(stats[0].record_count, 1);
        assert_eq!(stats[1].month.to_string(), "2025-01");
        assert_eq!(stats[1].record_count, 2);
    }

    #[test]
    fn test_most_recent_month_first() {
        let stats = monthly_stats(&[
            record("2025-01-10"),
            record("2025-03-10"),
            record("2025-02-10"),
        ]);
        let months: Vec<String> = stats.iter().map(|s| s.month.to_string()).collect();
        assert_eq!(months, ["2025-03", "2025-02", "2025-01"]);
    }

    #[test]
    fn test_year_boundary_ordering() {
        let stats = monthly_stats(&[record("2024-12-31"), record("2025-01-01")]);
        assert_eq!(stats[0].month, MonthKey { year: 2025, month: 1 });
        assert_eq!(stats[1].month, MonthKey { year: 2024, month: 12 });
    }

    #[test]
    fn test_flag_days_and_sleep() {
        let mut a = record("2025-05-01");
        a.entry.has_panic_attack = true;
        a.entry.has_crying = true;
        a.entry.sleep_hours = 4.0;
        a.entry.alcohol_units = 3.0;
        let mut b = record("2025-05-02");
        b.entry.has_crying = true;
        b.entry.sleep_hours = 9.0;

        let stats = &monthly_stats(&[a, b])[0];
        assert_eq!(stats.flag_days.crying, 2);
        assert_eq!(stats.flag_days.panic_attack, 1);
        assert_eq!(stats.flag_days.exercise, 0);
        assert_eq!(stats.avg_sleep_hours, 6.5);
        assert_eq!(stats.avg_alcohol_units, 1.5);
    }

    #[test]
    fn test_empty_input() {
        assert!(monthly_stats(&[]).is_empty());
    }

    #[test]
    fn test_lookback_start() {
        assert_eq!(lookback_start(date("2025-08-31"), 6), date("2025-02-28"));
        assert_eq!(lookback_start(date("2025-03-15"), 3), date("2024-12-15"));
    }

    #[test]
    fn test_month_key_serializes_as_string() {
        let json = serde_json::to_value(MonthKey { year: 2025, month: 3 }).unwrap();
        assert_eq!(json, "2025-03");
    }
}
