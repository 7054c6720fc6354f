use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::session::{AttemptSnapshot, SessionSnapshot};
use crate::models::survey::questions_for;
use crate::models::{
    AttemptOutcome, Block, GuessEntry, HintEntry, ParticipantInfo, PuzzleDefinition,
    PuzzleRecord, PuzzleSpec, PuzzleStage, SessionPhase, SurveyError, SurveyQuestion,
    SurveyResponse, Tone,
};
use crate::services::catalog::PuzzleCatalog;
use crate::services::lexicon::Lexicon;
use crate::services::puzzle_attempt::{
    AttemptError, AttemptRules, GuessResult, HintTicket, PuzzleAttempt,
};
use crate::services::tone::ToneRotation;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    Survey(#[from] SurveyError),
    #[error("'{0}' is not in the word list")]
    NotInLexicon(String),
    #[error("cannot {action} while the session is {}", .phase.as_str())]
    InvalidPhase {
        action: &'static str,
        phase: SessionPhase,
    },
    #[error("the survey opens once the puzzle has ended")]
    SurveyNotAvailable,
    #[error("giving up is not allowed in block {0}")]
    GiveUpNotAllowed(Block),
    #[error("block {0} results have not been saved yet")]
    FlushPending(Block),
    #[error("the session has finished")]
    Finished,
}

/// Puzzles of one block with tones already bound.
#[derive(Debug, Clone)]
pub struct BlockPlan {
    pub block: Block,
    pub puzzles: Vec<Arc<PuzzleDefinition>>,
    pub rules: AttemptRules,
    /// Request a hint after every wrong guess.
    pub auto_hint: bool,
    pub allow_give_up: bool,
}

impl BlockPlan {
    pub fn new(block: Block, specs: &[PuzzleSpec], rotation: &ToneRotation, rules: AttemptRules) -> Self {
        let puzzles = specs
            .iter()
            .enumerate()
            .map(|(index, spec)| Arc::new(PuzzleDefinition::from_spec(spec, rotation.assign(index))))
            .collect();
        let free_form = block == Block::B;
        Self {
            block,
            puzzles,
            rules,
            auto_hint: free_form,
            allow_give_up: free_form,
        }
    }

    pub fn len(&self) -> usize {
        self.puzzles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.puzzles.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ExperimentPlan {
    pub block_a: BlockPlan,
    pub block_b: BlockPlan,
}

impl ExperimentPlan {
    pub fn new(
        catalog: &PuzzleCatalog,
        attempt_limit: u32,
        rotation_a: &ToneRotation,
        rotation_b: &ToneRotation,
    ) -> Self {
        Self {
            block_a: BlockPlan::new(
                Block::A,
                &catalog.block_a,
                rotation_a,
                AttemptRules::graded(attempt_limit),
            ),
            block_b: BlockPlan::new(
                Block::B,
                &catalog.block_b,
                rotation_b,
                AttemptRules::free_form(),
            ),
        }
    }

    pub fn block(&self, block: Block) -> &BlockPlan {
        match block {
            Block::A => &self.block_a,
            Block::B => &self.block_b,
        }
    }
}

/// Position within the experiment plus the active block's finished records.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub block: Block,
    pub puzzle_index: usize,
    pub records: Vec<PuzzleRecord>,
    pub flush_pending: bool,
}

/// Hint work handed out under the session lock and applied after generation.
#[derive(Debug, Clone)]
pub struct PendingHint {
    pub attempt_seq: u64,
    pub ticket: HintTicket,
}

#[derive(Debug, Clone)]
pub struct PendingFarewell {
    pub attempt_seq: u64,
    pub block: Block,
    pub prompt: String,
}

#[derive(Debug, Clone)]
pub struct GuessOutcome {
    pub entry: GuessEntry,
    pub result: GuessResult,
    pub outcome: AttemptOutcome,
    pub hint: Option<PendingHint>,
    pub farewell: Option<PendingFarewell>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurveyOutcome {
    /// The next puzzle of the same block is now active.
    NextPuzzle,
    /// The block is over and its records are waiting to be flushed.
    BlockComplete(Block),
}

/// One participant's run through both blocks.
#[derive(Debug)]
pub struct ExperimentSession {
    id: Uuid,
    participant: ParticipantInfo,
    plan: ExperimentPlan,
    phase: SessionPhase,
    state: SessionState,
    attempt: Option<PuzzleAttempt>,
    attempt_seq: u64,
}

impl ExperimentSession {
    pub fn new(
        id: Uuid,
        participant: ParticipantInfo,
        plan: ExperimentPlan,
        now: DateTime<Utc>,
    ) -> Self {
        let mut session = Self {
            id,
            participant,
            plan,
            phase: SessionPhase::in_progress(Block::A),
            state: SessionState {
                block: Block::A,
                puzzle_index: 0,
                records: Vec::new(),
                flush_pending: false,
            },
            attempt: None,
            attempt_seq: 0,
        };
        session.start_puzzle(now);
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn attempt(&self) -> Option<&PuzzleAttempt> {
        self.attempt.as_ref()
    }

    pub fn current_tone(&self) -> Option<Tone> {
        self.attempt.as_ref().map(|a| a.definition().tone)
    }

    pub fn stage(&self) -> Option<PuzzleStage> {
        self.attempt.as_ref().map(|attempt| {
            if attempt.is_active() {
                PuzzleStage::Playing
            } else {
                PuzzleStage::AwaitingSurvey
            }
        })
    }

    /// Both blocks done and nothing left to write.
    pub fn is_finished(&self) -> bool {
        self.phase == SessionPhase::BlockBDone && !self.state.flush_pending
    }

    fn block_plan(&self) -> &BlockPlan {
        self.plan.block(self.state.block)
    }

    fn start_puzzle(&mut self, now: DateTime<Utc>) {
        let plan = self.plan.block(self.state.block);
        let definition = Arc::clone(&plan.puzzles[self.state.puzzle_index]);
        self.attempt = Some(PuzzleAttempt::new(definition, plan.rules, now));
        self.attempt_seq += 1;
    }

    fn playing_attempt(&mut self, action: &'static str) -> Result<&mut PuzzleAttempt, SessionError> {
        let phase = self.phase;
        match self.attempt.as_mut() {
            Some(attempt) => Ok(attempt),
            None => Err(SessionError::InvalidPhase { action, phase }),
        }
    }

    pub fn submit_guess(
        &mut self,
        text: &str,
        at: DateTime<Utc>,
        lexicon: Option<&Lexicon>,
    ) -> Result<GuessOutcome, SessionError> {
        let seq = self.attempt_seq;
        let block = self.state.block;
        let auto_hint = self.block_plan().auto_hint;
        let attempt = self.playing_attempt("submit a guess")?;

        let normalized = attempt.validate_guess(text)?;
        if attempt.rules().grade_letters {
            if let Some(lexicon) = lexicon {
                if !lexicon.contains(&normalized) {
                    return Err(SessionError::NotInLexicon(normalized));
                }
            }
        }

        let result = attempt.submit_guess(&normalized, at)?;
        let entry = attempt
            .guesses()
            .last()
            .cloned()
            .ok_or(AttemptError::EmptyGuess)?;

        let hint = match result {
            GuessResult::Wrong { .. } if auto_hint => Some(PendingHint {
                attempt_seq: seq,
                ticket: attempt.request_hint(at)?,
            }),
            _ => None,
        };
        let farewell = match result {
            GuessResult::Exhausted => Some(PendingFarewell {
                attempt_seq: seq,
                block,
                prompt: attempt.farewell_prompt()?,
            }),
            _ => None,
        };

        Ok(GuessOutcome {
            entry,
            result,
            outcome: attempt.outcome(),
            hint,
            farewell,
        })
    }

    pub fn request_hint(&mut self, at: DateTime<Utc>) -> Result<PendingHint, SessionError> {
        let seq = self.attempt_seq;
        let ticket = self.playing_attempt("request a hint")?.request_hint(at)?;
        Ok(PendingHint {
            attempt_seq: seq,
            ticket,
        })
    }

    /// Stores generated hint text unless the attempt moved on meanwhile.
    pub fn apply_hint(&mut self, pending: &PendingHint, text: String) -> Option<HintEntry> {
        if pending.attempt_seq != self.attempt_seq {
            return None;
        }
        self.attempt
            .as_mut()
            .and_then(|attempt| attempt.record_hint(&pending.ticket, text).cloned())
    }

    pub fn give_up(&mut self, at: DateTime<Utc>) -> Result<PendingFarewell, SessionError> {
        let plan = self.block_plan();
        if !plan.allow_give_up {
            return Err(SessionError::GiveUpNotAllowed(plan.block));
        }
        let block = plan.block;
        let seq = self.attempt_seq;
        let attempt = self.playing_attempt("give up")?;
        attempt.give_up(at)?;
        Ok(PendingFarewell {
            attempt_seq: seq,
            block,
            prompt: attempt.farewell_prompt()?,
        })
    }

    pub fn apply_farewell(&mut self, pending: &PendingFarewell, text: String) -> bool {
        if pending.attempt_seq != self.attempt_seq {
            return false;
        }
        match self.attempt.as_mut() {
            Some(attempt) => attempt.record_farewell(text).is_ok(),
            None => false,
        }
    }

    pub fn survey_questions(&self) -> Result<(Tone, Vec<SurveyQuestion>), SessionError> {
        match &self.attempt {
            Some(attempt) if !attempt.is_active() => {
                let tone = attempt.definition().tone;
                Ok((tone, questions_for(tone)))
            }
            _ => Err(SessionError::SurveyNotAvailable),
        }
    }

    /// Accepts the survey for the ended puzzle, folds it into a record and
    /// moves on. Nothing changes if the answers are incomplete.
    pub fn submit_survey(
        &mut self,
        answers: &[u8],
        at: DateTime<Utc>,
    ) -> Result<SurveyOutcome, SessionError> {
        let attempt = match &self.attempt {
            Some(attempt) if !attempt.is_active() => attempt,
            _ => return Err(SessionError::SurveyNotAvailable),
        };
        let survey = SurveyResponse::from_answers(answers)?;

        let definition = attempt.definition();
        let record = PuzzleRecord {
            participant: self.participant.clone(),
            block: self.state.block,
            tone: definition.tone,
            answer: definition.answer.clone(),
            outcome: attempt.outcome(),
            guesses: attempt.guesses().iter().map(|g| g.text.clone()).collect(),
            hint_timestamps: attempt.hints().iter().map(|h| h.elapsed_seconds).collect(),
            elapsed_seconds: attempt.elapsed_seconds(at),
            survey,
        };
        self.state.records.push(record);
        self.state.puzzle_index += 1;

        if self.state.puzzle_index < self.block_plan().len() {
            self.start_puzzle(at);
            return Ok(SurveyOutcome::NextPuzzle);
        }

        let block = self.state.block;
        self.attempt = None;
        self.attempt_seq += 1;
        self.phase = SessionPhase::done(block);
        self.state.flush_pending = true;
        Ok(SurveyOutcome::BlockComplete(block))
    }

    /// Records of a completed block that still need writing.
    pub fn pending_flush(&self) -> Option<(Block, Vec<PuzzleRecord>)> {
        if self.state.flush_pending {
            Some((self.state.block, self.state.records.clone()))
        } else {
            None
        }
    }

    pub fn mark_flushed(&mut self, block: Block) {
        if self.state.flush_pending && self.state.block == block {
            self.state.records.clear();
            self.state.flush_pending = false;
        }
    }

    /// Moves from a saved Block A into Block B.
    pub fn advance(&mut self, at: DateTime<Utc>) -> Result<(), SessionError> {
        if self.state.flush_pending {
            return Err(SessionError::FlushPending(self.state.block));
        }
        match self.phase {
            SessionPhase::BlockADone => {
                self.phase = SessionPhase::in_progress(Block::B);
                self.state.block = Block::B;
                self.state.puzzle_index = 0;
                self.start_puzzle(at);
                Ok(())
            }
            SessionPhase::BlockBDone => Err(SessionError::Finished),
            phase => Err(SessionError::InvalidPhase {
                action: "advance to the next block",
                phase,
            }),
        }
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> SessionSnapshot {
        let plan = self.block_plan();
        let attempt = self.attempt.as_ref().map(|attempt| {
            let definition = attempt.definition();
            let rules = attempt.rules();
            let active = attempt.is_active();
            AttemptSnapshot {
                tone: definition.tone,
                tone_color: definition.tone.color(),
                clue: definition.clue.clone(),
                difficulty: definition.difficulty,
                word_length: rules.enforce_length.then(|| definition.letter_count()),
                attempt_limit: rules.attempt_limit,
                outcome: attempt.outcome(),
                guesses: attempt.guesses().to_vec(),
                hints: attempt.hints().to_vec(),
                farewell: attempt.farewell().map(str::to_string),
                answer: (!active).then(|| definition.answer.clone()),
                elapsed_seconds: attempt.elapsed_seconds(now),
                can_guess: active,
                can_request_hint: active && !attempt.guesses().is_empty(),
                can_give_up: active && plan.allow_give_up,
            }
        });

        SessionSnapshot {
            session_id: self.id,
            participant_id: self.participant.id.clone(),
            phase: self.phase,
            block: self.state.block,
            puzzle_number: (self.state.puzzle_index + 1).min(plan.len()),
            puzzle_total: plan.len(),
            stage: self.stage(),
            attempt,
            records_buffered: self.state.records.len(),
            flush_pending: self.state.flush_pending,
        }
    }
}
