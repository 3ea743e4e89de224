use serde::{Deserialize, Serialize};

/// Offset between the legacy storage scale (`0..=8`) and the displayed scale (`-4..=4`).
pub const SCALE_OFFSET: i8 = 4;

pub const MIN_SCORE: i8 = -4;
pub const MAX_SCORE: i8 = 4;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoreError {
    #[error("score {0} is outside -4..=4")]
    OutOfRange(i16),

    #[error("legacy score {0} is outside 0..=8")]
    LegacyOutOfRange(i16),
}

/// Legacy `0..=8` value to the displayed `-4..=4` value.
pub fn to_display(internal: i8) -> i8 {
    internal - SCALE_OFFSET
}

/// Displayed `-4..=4` value to the legacy `0..=8` value.
pub fn from_display(display: i8) -> i8 {
    display + SCALE_OFFSET
}

/// Same as [`to_display`] for averaged values.
pub fn mean_to_display(internal: f64) -> f64 {
    internal - f64::from(SCALE_OFFSET)
}

/// A symmetric dimension rating on the displayed `-4..=4` scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub struct Score(i8);

impl Score {
    pub const NEUTRAL: Score = Score(0);

    pub fn new(value: i16) -> Result<Self, ScoreError> {
        if (i16::from(MIN_SCORE)..=i16::from(MAX_SCORE)).contains(&value) {
            Ok(Self(value as i8))
        } else {
            Err(ScoreError::OutOfRange(value))
        }
    }

    /// Build from a legacy `0..=8` value.
    pub fn from_internal(value: i16) -> Result<Self, ScoreError> {
        if !(0..=i16::from(MAX_SCORE - MIN_SCORE)).contains(&value) {
            return Err(ScoreError::LegacyOutOfRange(value));
        }
        Ok(Self(to_display(value as i8)))
    }

    pub fn to_internal(self) -> i8 {
        from_display(self.0)
    }

    pub fn value(self) -> i8 {
        self.0
    }
}

impl TryFrom<i16> for Score {
    type Error = ScoreError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Score> for i16 {
    fn from(score: Score) -> Self {
        i16::from(score.0)
    }
}
