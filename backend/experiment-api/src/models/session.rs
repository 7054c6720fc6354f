use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::participant::validate_participant_id;
use super::{
    AgeBracket, AttemptOutcome, Block, Difficulty, Gender, GuessEntry, HintEntry, HintLevel,
    SurveyQuestion, Tone,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    BlockAInProgress,
    BlockADone,
    BlockBInProgress,
    BlockBDone,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::BlockAInProgress => "block_a_in_progress",
            SessionPhase::BlockADone => "block_a_done",
            SessionPhase::BlockBInProgress => "block_b_in_progress",
            SessionPhase::BlockBDone => "block_b_done",
        }
    }

    pub fn in_progress(block: Block) -> Self {
        match block {
            Block::A => SessionPhase::BlockAInProgress,
            Block::B => SessionPhase::BlockBInProgress,
        }
    }

    pub fn done(block: Block) -> Self {
        match block {
            Block::A => SessionPhase::BlockADone,
            Block::B => SessionPhase::BlockBDone,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PuzzleStage {
    Playing,
    AwaitingSurvey,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSessionRequest {
    #[validate(
        length(min = 1, message = "participant id is required"),
        custom(function = "validate_participant_id")
    )]
    pub participant_id: String,
    pub age: AgeBracket,
    pub gender: Gender,
}

#[derive(Debug, Deserialize)]
pub struct SubmitGuessRequest {
    pub guess: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitSurveyRequest {
    /// One Likert value per question, `0` for unanswered.
    #[validate(length(equal = 8, message = "expected one answer per survey question"))]
    pub answers: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptSnapshot {
    pub tone: Tone,
    pub tone_color: &'static str,
    pub clue: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub word_length: Option<usize>,
    pub attempt_limit: Option<u32>,
    pub outcome: AttemptOutcome,
    pub guesses: Vec<GuessEntry>,
    pub hints: Vec<HintEntry>,
    pub farewell: Option<String>,
    /// Only revealed once the attempt is over.
    pub answer: Option<String>,
    pub elapsed_seconds: f64,
    pub can_guess: bool,
    pub can_request_hint: bool,
    pub can_give_up: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub participant_id: String,
    pub phase: SessionPhase,
    pub block: Block,
    pub puzzle_number: usize,
    pub puzzle_total: usize,
    pub stage: Option<PuzzleStage>,
    pub attempt: Option<AttemptSnapshot>,
    pub records_buffered: usize,
    pub flush_pending: bool,
}

#[derive(Debug, Serialize)]
pub struct GuessResponse {
    pub guess: GuessEntry,
    pub outcome: AttemptOutcome,
    pub hint: Option<HintEntry>,
    pub farewell: Option<String>,
    pub session: SessionSnapshot,
}

#[derive(Debug, Serialize)]
pub struct HintResponse {
    pub hint: HintEntry,
    pub level: HintLevel,
    pub hints_used: usize,
}

#[derive(Debug, Serialize)]
pub struct GiveUpResponse {
    pub farewell: String,
    pub session: SessionSnapshot,
}

#[derive(Debug, Serialize)]
pub struct SurveyQuestionsResponse {
    pub tone: Tone,
    pub questions: Vec<SurveyQuestion>,
}
