use serde::{Deserialize, Serialize};

pub const MAX_MOOD_UP: i16 = 4;
pub const MIN_MOOD_DOWN: i16 = -4;

/// At most two moods can be selected for one day: one elevated, one depressed.
pub const MAX_SELECTED_MOODS: usize = 2;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MoodError {
    #[error("at most {MAX_SELECTED_MOODS} moods can be selected, got {0}")]
    TooMany(usize),

    #[error("mood {0} was selected twice")]
    Duplicate(i16),

    #[error("mood up must be between 0 and 4, got {0}")]
    UpOutOfRange(i16),

    #[error("mood down must be between -4 and -1, got {0}")]
    DownOutOfRange(i16),

    #[error("only one elevated and one depressed mood can be selected")]
    SameSign,
}

/// Elevated/depressed mood of one day.
///
/// `Mixed` carries both halves and represents concurrent manic and depressive
/// symptoms. The serialized form is `{"up": 0..=4 | null, "down": -4..=-1 | null}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MoodParts", into = "MoodParts")]
pub enum MoodPair {
    #[default]
    None,
    Elevated(i16),
    Depressed(i16),
    Mixed { up: i16, down: i16 },
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MoodParts {
    #[serde(default)]
    pub up: Option<i16>,
    #[serde(default)]
    pub down: Option<i16>,
}

impl MoodPair {
    pub fn from_parts(up: Option<i16>, down: Option<i16>) -> Result<Self, MoodError> {
        if let Some(up) = up {
            if !(0..=MAX_MOOD_UP).contains(&up) {
                return Err(MoodError::UpOutOfRange(up));
            }
        }
        if let Some(down) = down {
            if !(MIN_MOOD_DOWN..=-1).contains(&down) {
                return Err(MoodError::DownOutOfRange(down));
            }
        }

        Ok(match (up, down) {
            (None, None) => Self::None,
            (Some(up), None) => Self::Elevated(up),
            (None, Some(down)) => Self::Depressed(down),
            (Some(up), Some(down)) => Self::Mixed { up, down },
        })
    }

    /// Partition a picker selection by sign: `>= 0` is elevated, `< 0` is depressed.
    pub fn from_selection(values: &[i16]) -> Result<Self, MoodError> {
        if values.len() > MAX_SELECTED_MOODS {
            return Err(MoodError::TooMany(values.len()));
        }
        if let [a, b] = values {
            if a == b {
                return Err(MoodError::Duplicate(*a));
            }
        }

        let mut up = None;
        let mut down = None;
        for &value in values {
            let slot = if value >= 0 { &mut up } else { &mut down };
            if slot.replace(value).is_some() {
                return Err(MoodError::SameSign);
            }
        }

        Self::from_parts(up, down)
    }

    pub fn up(&self) -> Option<i16> {
        match *self {
            Self::Elevated(up) | Self::Mixed { up, .. } => Some(up),
            _ => None,
        }
    }

    pub fn down(&self) -> Option<i16> {
        match *self {
            Self::Depressed(down) | Self::Mixed { down, .. } => Some(down),
            _ => None,
        }
    }

    pub fn is_mixed(&self) -> bool {
        matches!(self, Self::Mixed { .. })
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Single signed value used when charting a day. Mixed days chart their net affect.
    pub fn trend_value(&self) -> Option<f64> {
        match *self {
            Self::None => None,
            Self::Elevated(up) => Some(f64::from(up)),
            Self::Depressed(down) => Some(f64::from(down)),
            Self::Mixed { up, down } => Some(f64::from(up + down)),
        }
    }
}

impl TryFrom<MoodParts> for MoodPair {
    type Error = MoodError;

    fn try_from(parts: MoodParts) -> Result<Self, Self::Error> {
        Self::from_parts(parts.up, parts.down)
    }
}

impl From<MoodPair> for MoodParts {
    fn from(mood: MoodPair) -> Self {
        Self {
            up: mood.up(),
            down: mood.down(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_partitions_by_sign() {
        assert_eq!(
            MoodPair::from_selection(&[-3, 2]).unwrap(),
            MoodPair::Mixed { up: 2, down: -3 }
        );
        assert_eq!(MoodPair::from_selection(&[0]).unwrap(), MoodPair::Elevated(0));
        assert_eq!(MoodPair::from_selection(&[-1]).unwrap(), MoodPair::Depressed(-1));
        assert_eq!(MoodPair::from_selection(&[]).unwrap(), MoodPair::None);
    }

    #[test]
    fn test_selection_rejects_invalid() {
        assert_eq!(MoodPair::from_selection(&[1, 2]), Err(MoodError::SameSign));
        assert_eq!(MoodPair::from_selection(&[-1, -2]), Err(MoodError::SameSign));
        assert_eq!(MoodPair::from_selection(&[1, -1, 2]), Err(MoodError::TooMany(3)));
        assert_eq!(MoodPair::from_selection(&[3, 3]), Err(MoodError::Duplicate(3)));
        assert_eq!(MoodPair::from_selection(&[5]), Err(MoodError::UpOutOfRange(5)));
        assert_eq!(MoodPair::from_selection(&[-5]), Err(MoodError::DownOutOfRange(-5)));
    }

    #[test]
    fn test_from_parts_rejects_zero_down() {
        assert_eq!(
            MoodPair::from_parts(None, Some(0)),
            Err(MoodError::DownOutOfRange(0))
        );
    }

    #[test]
    fn test_trend_value() {
        assert_eq!(MoodPair::None.trend_value(), None);
        assert_eq!(MoodPair::Elevated(3).trend_value(), Some(3.0));
        assert_eq!(MoodPair::Depressed(-2).trend_value(), Some(-2.0));
        assert_eq!(MoodPair::Mixed { up: 1, down: -3 }.trend_value(), Some(-2.0));
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(MoodPair::Mixed { up: 2, down: -1 }).unwrap();
        assert_eq!(json, serde_json::json!({ "up": 2, "down": -1 }));

        let mood: MoodPair = serde_json::from_str(r#"{"up": null, "down": -4}"#).unwrap();
        assert_eq!(mood, MoodPair::Depressed(-4));

        assert!(serde_json::from_str::<MoodPair>(r#"{"up": -1}"#).is_err());
    }
}
