use serde::{Deserialize, Serialize};

use super::Tone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Catalog entry before a tone has been assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleSpec {
    pub answer: String,
    #[serde(default)]
    pub clue: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

impl PuzzleSpec {
    pub fn word(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            clue: None,
            difficulty: None,
        }
    }

    pub fn with_clue(answer: &str, clue: &str, difficulty: Difficulty) -> Self {
        Self {
            answer: answer.to_string(),
            clue: Some(clue.to_string()),
            difficulty: Some(difficulty),
        }
    }
}

/// A puzzle as presented to a participant. Immutable once the block is planned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleDefinition {
    pub answer: String,
    pub clue: Option<String>,
    pub tone: Tone,
    pub difficulty: Option<Difficulty>,
}

impl PuzzleDefinition {
    pub fn from_spec(spec: &PuzzleSpec, tone: Tone) -> Self {
        Self {
            answer: spec.answer.trim().to_string(),
            clue: spec.clue.clone(),
            tone,
            difficulty: spec.difficulty,
        }
    }

    pub fn letter_count(&self) -> usize {
        self.answer.chars().count()
    }

    pub fn is_answer(&self, guess: &str) -> bool {
        guess.trim().eq_ignore_ascii_case(&self.answer)
    }
}
