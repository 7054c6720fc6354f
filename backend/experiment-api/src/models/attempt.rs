use serde::{Deserialize, Serialize};

/// Per-letter grading outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Exact,
    Misplaced,
    Absent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Pending,
    Solved,
    Exhausted,
    GaveUp,
}

impl AttemptOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AttemptOutcome::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptOutcome::Pending => "pending",
            AttemptOutcome::Solved => "solved",
            AttemptOutcome::Exhausted => "exhausted",
            AttemptOutcome::GaveUp => "gave_up",
        }
    }
}

/// Requested amount of detail in a generated hint. Advisory only: nothing
/// checks that the returned text honours it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum HintLevel {
    Subtle = 1,
    Moderate = 2,
    Detailed = 3,
}

impl HintLevel {
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    pub fn label(&self) -> &'static str {
        match self {
            HintLevel::Subtle => "1",
            HintLevel::Moderate => "2",
            HintLevel::Detailed => "3",
        }
    }
}

impl From<HintLevel> for u8 {
    fn from(level: HintLevel) -> Self {
        level.as_u8()
    }
}

impl TryFrom<u8> for HintLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(HintLevel::Subtle),
            2 => Ok(HintLevel::Moderate),
            3 => Ok(HintLevel::Detailed),
            other => Err(format!("hint level must be 1, 2 or 3, got {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuessEntry {
    pub text: String,
    /// Letter verdicts; absent for whole-word puzzles.
    pub verdicts: Option<Vec<Verdict>>,
    pub correct: bool,
    pub elapsed_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HintEntry {
    pub text: String,
    pub level: HintLevel,
    pub elapsed_seconds: f64,
}
