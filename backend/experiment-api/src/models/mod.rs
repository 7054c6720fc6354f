use serde::{Deserialize, Serialize};
use std::fmt;

pub mod attempt;
pub mod participant;
pub mod puzzle;
pub mod record;
pub mod session;
pub mod survey;

pub use attempt::{AttemptOutcome, GuessEntry, HintEntry, HintLevel, Verdict};
pub use participant::{AgeBracket, Gender, ParticipantInfo};
pub use puzzle::{Difficulty, PuzzleDefinition, PuzzleSpec};
pub use record::PuzzleRecord;
pub use session::{PuzzleStage, SessionPhase};
pub use survey::{SurveyError, SurveyQuestion, SurveyResponse};

/// Persona used by the hint-giver for one puzzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tone {
    Enthusiastic,
    Neutral,
    Frustrated,
}

impl Tone {
    pub const ALL: [Tone; 3] = [Tone::Enthusiastic, Tone::Neutral, Tone::Frustrated];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Enthusiastic => "Enthusiastic",
            Tone::Neutral => "Neutral",
            Tone::Frustrated => "Frustrated",
        }
    }

    /// Background color the GUI uses for hint dialogs in this tone.
    pub fn color(&self) -> &'static str {
        match self {
            Tone::Enthusiastic => "#4a90e2",
            Tone::Neutral => "#3a3f51",
            Tone::Frustrated => "#e24a4a",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two puzzle sets a participant plays through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Block {
    /// Fixed-length words graded letter by letter.
    A,
    /// Variable-length answers with a free-form clue.
    B,
}

impl Block {
    pub fn as_str(&self) -> &'static str {
        match self {
            Block::A => "A",
            Block::B => "B",
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
