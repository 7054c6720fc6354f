use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Tone;

pub const SURVEY_QUESTION_COUNT: usize = 8;
pub const LIKERT_MIN: u8 = 1;
pub const LIKERT_MAX: u8 = 5;

const SURVEY_TEMPLATE: [&str; SURVEY_QUESTION_COUNT] = [
    "The AI's {tone} tone felt genuine.",
    "When the AI spoke in the {tone} tone, I felt motivated to keep going.",
    "The AI's hints were clear and carried the intended emotion.",
    "The {tone} style made the puzzle more engaging.",
    "The {tone} tone distracted me from the puzzle.",
    "I felt comfortable relying on an AI that spoke in this tone.",
    "Regardless of its tone, the AI's hints were helpful.",
    "Given the choice, I would pick this tone for future puzzles.",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurveyQuestion {
    pub id: String,
    pub text: String,
}

pub fn question_id(index: usize) -> String {
    format!("Q{}", index + 1)
}

/// Survey statements for one puzzle, with the tone name substituted.
pub fn questions_for(tone: Tone) -> Vec<SurveyQuestion> {
    SURVEY_TEMPLATE
        .iter()
        .enumerate()
        .map(|(index, template)| SurveyQuestion {
            id: question_id(index),
            text: template.replace("{tone}", tone.as_str()),
        })
        .collect()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SurveyError {
    #[error("unanswered questions: {}", .0.join(", "))]
    Incomplete(Vec<String>),
    #[error("answer to {question} must be between 1 and 5, got {value}")]
    OutOfRange { question: String, value: u8 },
}

/// Likert answers keyed Q1..Q8, in question order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyResponse {
    values: Vec<u8>,
}

impl SurveyResponse {
    /// Checks that every question is answered on the Likert scale. `0` marks
    /// an unanswered question.
    pub fn from_answers(values: &[u8]) -> Result<Self, SurveyError> {
        let missing: Vec<String> = values
            .iter()
            .enumerate()
            .filter(|(_, value)| **value == 0)
            .map(|(index, _)| question_id(index))
            .collect();
        if !missing.is_empty() {
            return Err(SurveyError::Incomplete(missing));
        }

        if let Some((index, value)) = values
            .iter()
            .enumerate()
            .find(|(_, value)| !(LIKERT_MIN..=LIKERT_MAX).contains(*value))
        {
            return Err(SurveyError::OutOfRange {
                question: question_id(index),
                value: *value,
            });
        }

        Ok(Self {
            values: values.to_vec(),
        })
    }

    pub fn values(&self) -> &[u8] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn questions_mention_the_tone() {
        let questions = questions_for(Tone::Frustrated);
        assert_eq!(questions.len(), SURVEY_QUESTION_COUNT);
        assert_eq!(questions[0].id, "Q1");
        assert!(questions[0].text.contains("Frustrated"));
        assert!(!questions.iter().any(|q| q.text.contains("{tone}")));
    }

    #[test]
    fn complete_sheet_is_accepted() {
        let survey = SurveyResponse::from_answers(&[5, 4, 3, 2, 1, 2, 3, 4]).unwrap();
        assert_eq!(survey.values(), &[5, 4, 3, 2, 1, 2, 3, 4]);
    }

    #[test]
    fn unanswered_questions_are_listed() {
        let err = SurveyResponse::from_answers(&[5, 0, 3, 2, 1, 0, 3, 4]).unwrap_err();
        assert_eq!(err, SurveyError::Incomplete(vec!["Q2".into(), "Q6".into()]));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(matches!(
            SurveyResponse::from_answers(&[1, 2, 3, 4, 5, 6, 1, 1]),
            Err(SurveyError::OutOfRange { value: 6, .. })
        ));
    }
}
