use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct AssessmentOption {
    pub id: &'static str,
    pub text: &'static str,
    pub score: i32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct AssessmentQuestion {
    pub id: &'static str,
    pub question: &'static str,
    pub options: &'static [AssessmentOption],
}

impl AssessmentQuestion {
    pub fn option(&self, option_id: &str) -> Option<&AssessmentOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    pub fn max_score(&self) -> i32 {
        self.options.iter().map(|o| o.score).max().unwrap_or(0)
    }
}

macro_rules! option {
    ($id:literal, $text:literal, $score:literal) => {
        AssessmentOption {
            id: $id,
            text: $text,
            score: $score,
        }
    };
}

/// Monthly self-care questionnaire. Option scores sum to at most 100.
pub static ASSESSMENT_QUESTIONS: &[AssessmentQuestion] = &[
    AssessmentQuestion {
        id: "q1",
        question: "Taking medication consistently",
        options: &[
            option!("q1_a1", "Took all medication as prescribed.", 40),
            option!("q1_a2", "Missed one or two doses unavoidably but took the rest.", 20),
            option!("q1_a3", "Missed about a week of medication but took the rest.", 10),
            option!("q1_a4", "Did not take medication for more than a week.", 0),
        ],
    },
    AssessmentQuestion {
        id: "q2",
        question: "Regular sleep",
        options: &[
            option!("q2_a1", "Got up at a consistent time every morning, weekdays and weekends, and started the day.", 20),
            option!("q2_a2", "Mostly got up at a consistent time, but slept late or napped for about a week.", 10),
            option!("q2_a3", "Got up regularly for about half the month but not for the other half.", 5),
            option!("q2_a4", "Wake-up times were erratic on most days.", 0),
        ],
    },
    AssessmentQuestion {
        id: "q3",
        question: "Regular exercise (walking, hiking, strolling, gym, yoga, etc.)",
        options: &[
            option!("q3_a1", "Exercised for an hour or more almost every day.", 10),
            option!("q3_a2", "Exercised for 30 minutes or more almost every day.", 5),
            option!("q3_a3", "There were more days without exercise than with it.", 2),
            option!("q3_a4", "Hardly exercised at all.", 0),
        ],
    },
    AssessmentQuestion {
        id: "q4",
        question: "Getting sunlight",
        options: &[
            option!("q4_a1", "Went outside every day and got at least 30 minutes of sunlight.", 5),
            option!("q4_a2", "Got sunlight outdoors, or at least indoors, on more than half the days of the month.", 3),
            option!("q4_a3", "Got sunlight outdoors or indoors on fewer than half the days of the month.", 1),
            option!("q4_a4", "On most days did not go out during the day or see sunlight indoors.", 0),
        ],
    },
    AssessmentQuestion {
        id: "q5",
        question: "Avoiding alcohol",
        options: &[
            option!("q5_a1", "Did not drink at all.", 5),
            option!("q5_a2", "Had about one drink on a single day.", 3),
            option!("q5_a3", "Had up to three or four drinks at a time on about seven days.", 1),
            option!("q5_a4", "Drank on seven or more days, or had days of heavy drinking.", 0),
        ],
    },
    AssessmentQuestion {
        id: "q6",
        question: "Managing relationships",
        options: &[
            option!("q6_a1", "Was not much bothered by other people's reactions.", 5),
            option!("q6_a2", "Was affected by other people's reactions but did not dwell on them.", 3),
            option!("q6_a3", "Was affected by other people's reactions and often dwelt on them.", 1),
            option!("q6_a4", "Was strongly affected by other people's reactions and dwelt on them all day.", 0),
        ],
    },
    AssessmentQuestion {
        id: "q7",
        question: "Avoiding overexertion, haste and overstimulation\n(overspending, gambling, excessive activity, overcommitting, binge eating, substance misuse, unrealistic plans or fantasies)",
        options: &[
            option!("q7_a1", "Trusted in steady improvement and did what was needed without overdoing it or rushing.", 5),
            option!("q7_a2", "Thought about risky, hasty or stimulating things but mostly kept a steady routine.", 3),
            option!("q7_a3", "Sometimes planned or tried risky, hasty or stimulating things to feel better quickly.", 1),
            option!("q7_a4", "Planned or tried risky, hasty or stimulating things almost every day.", 0),
        ],
    },
    AssessmentQuestion {
        id: "q8",
        question: "Observing my own mood",
        options: &[
            option!("q8_a1", "Filled in the mood log every day and observed my mood.", 5),
            option!("q8_a2", "Filled in the mood log on more than half the days and caught up on missed days later.", 3),
            option!("q8_a3", "Rarely filled in the mood log and only occasionally reflected on my mood.", 1),
            option!("q8_a4", "Did not think about my mood at all.", 0),
        ],
    },
    AssessmentQuestion {
        id: "q9",
        question: "Being kind to myself",
        options: &[
            option!("q9_a1", "Was not harsh or self-blaming and encouraged myself even when things went badly.", 5),
            option!("q9_a2", "Sometimes blamed myself but soon tried to be forgiving.", 3),
            option!("q9_a3", "Spent many days blaming myself and regretting things out of perfectionism.", 1),
            option!("q9_a4", "Spent most days criticising myself and could not think positively about myself.", 0),
        ],
    },
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAssessment {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Always the first day of the month.
    pub assessment_month: NaiveDate,
    pub total_score: i32,
    pub answers: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAssessmentRequest {
    /// question id -> option id
    pub answers: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct AssessmentListQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackBand {
    Excellent,
    Good,
    Fair,
    NeedsAttention,
}

impl FeedbackBand {
    pub fn for_score(score: i32) -> Self {
        match score {
            s if s >= 80 => Self::Excellent,
            s if s >= 60 => Self::Good,
            s if s >= 40 => Self::Fair,
            _ => Self::NeedsAttention,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent! You are managing things very well.",
            Self::Good => "You are doing well. A little more attention will make it even better.",
            Self::Fair => "Not bad. It looks like a bit more effort is needed.",
            Self::NeedsAttention => "It looks like your self-care needs more attention.",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AssessmentResult {
    #[serde(flatten)]
    pub assessment: MonthlyAssessment,
    pub max_score: i32,
    pub feedback: FeedbackBand,
    pub feedback_message: &'static str,
}

impl AssessmentResult {
    pub fn new(assessment: MonthlyAssessment, max_score: i32) -> Self {
        let feedback = FeedbackBand::for_score(assessment.total_score);
        Self {
            assessment,
            max_score,
            feedback,
            feedback_message: feedback.message(),
        }
    }
}
