use serde::Serialize;

use super::{AttemptOutcome, Block, ParticipantInfo, SurveyResponse, Tone};

pub const LIST_DELIMITER: &str = ";";

pub const RECORD_COLUMNS: [&str; 19] = [
    "ParticipantID",
    "Age",
    "Gender",
    "Tone",
    "TargetAnswer",
    "Solved",
    "AttemptCount",
    "ElapsedSeconds",
    "Guesses",
    "HintsCount",
    "HintTimestamps",
    "Survey_Q1",
    "Survey_Q2",
    "Survey_Q3",
    "Survey_Q4",
    "Survey_Q5",
    "Survey_Q6",
    "Survey_Q7",
    "Survey_Q8",
];

/// One finished puzzle plus its survey, flattened for storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PuzzleRecord {
    pub participant: ParticipantInfo,
    pub block: Block,
    pub tone: Tone,
    pub answer: String,
    pub outcome: AttemptOutcome,
    pub guesses: Vec<String>,
    pub hint_timestamps: Vec<f64>,
    pub elapsed_seconds: f64,
    pub survey: SurveyResponse,
}

impl PuzzleRecord {
    pub fn solved(&self) -> bool {
        self.outcome == AttemptOutcome::Solved
    }

    pub fn attempt_count(&self) -> usize {
        self.guesses.len()
    }

    pub fn hint_count(&self) -> usize {
        self.hint_timestamps.len()
    }

    /// Unescaped cell values in `RECORD_COLUMNS` order.
    pub fn columns(&self) -> Vec<String> {
        let mut cells = vec![
            self.participant.id.clone(),
            self.participant.age.as_str().to_string(),
            self.participant.gender.as_str().to_string(),
            self.tone.as_str().to_string(),
            self.answer.clone(),
            if self.solved() { "True" } else { "False" }.to_string(),
            self.attempt_count().to_string(),
            format_seconds(self.elapsed_seconds),
            self.guesses.join(LIST_DELIMITER),
            self.hint_count().to_string(),
            self.hint_timestamps
                .iter()
                .map(|t| format_seconds(*t))
                .collect::<Vec<_>>()
                .join(LIST_DELIMITER),
        ];
        cells.extend(self.survey.values().iter().map(|v| v.to_string()));
        cells
    }
}

fn format_seconds(value: f64) -> String {
    format!("{:.2}", value)
}
