use std::collections::BTreeMap;

use crate::models::assessment::AssessmentQuestion;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("Please answer every question ({answered} of {expected} answered)")]
    Incomplete { answered: usize, expected: usize },

    #[error("Unknown question: {0}")]
    UnknownQuestion(String),

    #[error("Option {option} does not belong to question {question}")]
    UnknownOption { question: String, option: String },
}

/// Sum the score of the selected option for every question.
///
/// Every question must be answered, and every answer must name a question
/// and one of its options.
pub fn total_score(
    questions: &[AssessmentQuestion],
    answers: &BTreeMap<String, String>,
) -> Result<i32, ScoringError> {
    if let Some(unknown) = answers
        .keys()
        .find(|id| !questions.iter().any(|q| q.id == id.as_str()))
    {
        return Err(ScoringError::UnknownQuestion(unknown.clone()));
    }

    if answers.len() < questions.len() {
        return Err(ScoringError::Incomplete {
            answered: answers.len(),
            expected: questions.len(),
        });
    }

    questions.iter().try_fold(0, |total, question| -> Result<i32, ScoringError> {
        let option_id = answers.get(question.id).ok_or(ScoringError::Incomplete {
            answered: answers.len(),
            expected: questions.len(),
        })?;
        let option = question
            .option(option_id)
            .ok_or_else(|| ScoringError::UnknownOption {
                question: question.id.to_string(),
                option: option_id.clone(),
            })?;
        Ok(total + option.score)
    })
}

pub fn max_score(questions: &[AssessmentQuestion]) -> i32 {
    questions.iter().map(|q| q.max_score()).sum()
}
