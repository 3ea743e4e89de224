//! Splits a daily mood series into same-sign runs so a chart can draw
//! elevated and depressed stretches in different colours.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::daily_record::DailyRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodCategory {
    Elevated,
    Depressed,
}

impl MoodCategory {
    /// Zero counts as elevated.
    pub fn of(value: f64) -> Self {
        if value >= 0.0 {
            Self::Elevated
        } else {
            Self::Depressed
        }
    }
}

/// One day of input. `value` is `None` when the day carries no mood.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendLine {
    pub category: MoodCategory,
    pub points: Vec<ChartPoint>,
    /// Last point of the preceding opposite-sign line, when the two touch.
    pub joined_from: Option<ChartPoint>,
}

impl TrendLine {
    fn start(category: MoodCategory, point: ChartPoint, joined_from: Option<ChartPoint>) -> Self {
        Self {
            category,
            points: vec![point],
            joined_from,
        }
    }

    /// Points to draw, starting at the joining point if there is one.
    pub fn polyline(&self) -> Vec<ChartPoint> {
        self.joined_from
            .iter()
            .chain(self.points.iter())
            .copied()
            .collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TrendSegment {
    Line(TrendLine),
    /// Consecutive days without a mood. Never interpolated.
    Gap {
        start: NaiveDate,
        end: NaiveDate,
        days: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrendSeries {
    pub segments: Vec<TrendSegment>,
    pub has_elevated: bool,
    pub has_depressed: bool,
}

/// Per-day trend input for records, oldest first.
pub fn points_from_records(records: &[DailyRecord]) -> Vec<TrendPoint> {
    let mut points: Vec<TrendPoint> = records
        .iter()
        .map(|r| TrendPoint {
            date: r.record_date,
            value: r.entry.mood.trend_value(),
        })
        .collect();
    points.sort_by_key(|p| p.date);
    points
}

/// Segment an ordered series into maximal same-sign runs separated by gaps.
pub fn segment(points: &[TrendPoint]) -> TrendSeries {
    let mut segments = Vec::new();
    let mut line: Option<TrendLine> = None;
    let mut gap: Option<(NaiveDate, NaiveDate, usize)> = None;

    for p in points {
        let value = match p.value {
            Some(v) if v.is_finite() => v,
            _ => {
                if let Some(done) = line.take() {
                    segments.push(TrendSegment::Line(done));
                }
                gap = Some(match gap {
                    Some((start, _, days)) => (start, p.date, days + 1),
                    None => (p.date, p.date, 1),
                });
                continue;
            }
        };

        if let Some((start, end, days)) = gap.take() {
            segments.push(TrendSegment::Gap { start, end, days });
        }

        let category = MoodCategory::of(value);
        let point = ChartPoint {
            date: p.date,
            value,
        };
        line = Some(match line.take() {
            Some(mut current) if current.category == category => {
                current.points.push(point);
                current
            }
            Some(previous) => {
                let joined_from = previous.points.last().copied();
                segments.push(TrendSegment::Line(previous));
                TrendLine::start(category, point, joined_from)
            }
            None => TrendLine::start(category, point, None),
        });
    }

    if let Some(done) = line {
        segments.push(TrendSegment::Line(done));
    }
    if let Some((start, end, days)) = gap {
        segments.push(TrendSegment::Gap { start, end, days });
    }

    let has = |category| {
        segments
            .iter()
            .any(|s| matches!(s, TrendSegment::Line(l) if l.category == category))
    };
    let has_elevated = has(MoodCategory::Elevated);
    let has_depressed = has(MoodCategory::Depressed);

    TrendSeries {
        segments,
        has_elevated,
        has_depressed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn series(values: &[Option<f64>]) -> Vec<TrendPoint> {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| TrendPoint {
                date: start + Duration::days(i as i64),
                value: *v,
            })
            .collect()
    }

    fn line(segment: &TrendSegment) -> &TrendLine {
        match segment {
            TrendSegment::Line(l) => l,
            TrendSegment::Gap { .. } => panic!("expected a line, got {:?}", segment),
        }
    }

    #[test]
    fn test_sign_runs_with_shared_boundaries() {
        let out = segment(&series(&[
            Some(2.0),
            Some(3.0),
            Some(-1.0),
            Some(-2.0),
            Some(0.0),
            None,
            Some(1.0),
        ]));
        assert_eq!(out.segments.len(), 5);

        let first = line(&out.segments[0]);
        assert_eq!(first.category, MoodCategory::Elevated);
        assert_eq!(first.values(), vec![2.0, 3.0]);
        assert_eq!(first.joined_from, None);

        let second = line(&out.segments[1]);
        assert_eq!(second.category, MoodCategory::Depressed);
        assert_eq!(second.values(), vec![-1.0, -2.0]);
        assert_eq!(second.polyline().first(), first.points.last());

        let third = line(&out.segments[2]);
        assert_eq!(third.category, MoodCategory::Elevated);
        assert_eq!(third.values(), vec![0.0]);
        assert_eq!(third.polyline().first(), second.points.last());

        assert!(matches!(out.segments[3], TrendSegment::Gap { days: 1, .. }));

        let last = line(&out.segments[4]);
        assert_eq!(last.values(), vec![1.0]);
        assert_eq!(last.joined_from, None);

        assert!(out.has_elevated);
        assert!(out.has_depressed);
    }

    #[test]
    fn test_non_negative_only_has_no_depressed() {
        let out = segment(&series(&[Some(0.0), Some(1.0), Some(4.0)]));
        assert_eq!(out.segments.len(), 1);
        assert!(out.has_elevated);
        assert!(!out.has_depressed);
    }

    #[test]
    fn test_consecutive_gaps_collapse() {
        let out = segment(&series(&[Some(-1.0), None, None, None, Some(-2.0)]));
        assert_eq!(out.segments.len(), 3);
        match &out.segments[1] {
            TrendSegment::Gap { start, end, days } => {
                assert_eq!(*days, 3);
                assert_eq!(*start, NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
                assert_eq!(*end, NaiveDate::from_ymd_opt(2025, 1, 4).unwrap());
            }
            other => panic!("expected gap, got {:?}", other),
        }
        assert_eq!(line(&out.segments[2]).joined_from, None);
        assert!(!out.has_elevated);
    }

    #[test]
    fn test_leading_and_trailing_gaps() {
        let out = segment(&series(&[None, Some(1.0), None]));
        assert_eq!(out.segments.len(), 3);
        assert!(matches!(out.segments[0], TrendSegment::Gap { .. }));
        assert!(matches!(out.segments[2], TrendSegment::Gap { .. }));
    }

    #[test]
    fn test_empty_and_all_gaps() {
        assert_eq!(segment(&[]), TrendSeries::default());

        let out = segment(&series(&[None, None]));
        assert_eq!(out.segments.len(), 1);
        assert!(!out.has_elevated && !out.has_depressed);
    }

    #[test]
    fn test_serialized_shape() {
        let out = segment(&series(&[Some(-1.0), None]));
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["segments"][0]["kind"], "line");
        assert_eq!(json["segments"][0]["category"], "depressed");
        assert_eq!(json["segments"][1]["kind"], "gap");
        assert_eq!(json["has_depressed"], true);
    }
}
