use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

use crate::models::{
    AttemptOutcome, GuessEntry, HintEntry, HintLevel, PuzzleDefinition, Verdict,
};
use crate::services::grader::{self, GradeError};
use crate::services::hint_controller::{build_farewell, build_request, select_level};
use crate::utils::time::elapsed_seconds;

/// How a block plays: attempt limit, length precondition and grading mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptRules {
    pub attempt_limit: Option<u32>,
    /// Guesses must match the answer length when set.
    pub enforce_length: bool,
    pub grade_letters: bool,
}

impl AttemptRules {
    /// Fixed-length words graded per letter.
    pub fn graded(attempt_limit: u32) -> Self {
        Self {
            attempt_limit: Some(attempt_limit),
            enforce_length: true,
            grade_letters: true,
        }
    }

    /// Whole-word answers, unlimited guesses.
    pub fn free_form() -> Self {
        Self {
            attempt_limit: None,
            enforce_length: false,
            grade_letters: false,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttemptError {
    #[error("attempt is already {}", .0.as_str())]
    NotActive(AttemptOutcome),
    #[error("guess is empty")]
    EmptyGuess,
    #[error("guess must be {expected} letters, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("make at least one guess before asking for a hint")]
    NoGuessesYet,
    #[error("the closing remark has already been recorded")]
    FarewellRecorded,
}

impl From<GradeError> for AttemptError {
    fn from(err: GradeError) -> Self {
        match err {
            GradeError::LengthMismatch { expected, actual } => {
                AttemptError::WrongLength { expected, actual }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessResult {
    Solved,
    Wrong { remaining: Option<u32> },
    /// Attempt limit reached; exactly one closing remark is now due.
    Exhausted,
}

/// Everything needed to generate a hint outside the session lock.
#[derive(Debug, Clone, PartialEq)]
pub struct HintTicket {
    pub level: HintLevel,
    pub prompt: String,
    pub elapsed_seconds: f64,
}

/// One puzzle from presentation until it is folded into a record.
#[derive(Debug, Clone)]
pub struct PuzzleAttempt {
    definition: Arc<PuzzleDefinition>,
    rules: AttemptRules,
    guesses: Vec<GuessEntry>,
    hints: Vec<HintEntry>,
    acknowledged_last_guess: bool,
    outcome: AttemptOutcome,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    farewell: Option<String>,
    farewell_requested: bool,
}

impl PuzzleAttempt {
    pub fn new(definition: Arc<PuzzleDefinition>, rules: AttemptRules, started_at: DateTime<Utc>) -> Self {
        Self {
            definition,
            rules,
            guesses: Vec::new(),
            hints: Vec::new(),
            acknowledged_last_guess: false,
            outcome: AttemptOutcome::Pending,
            started_at,
            ended_at: None,
            farewell: None,
            farewell_requested: false,
        }
    }

    pub fn definition(&self) -> &PuzzleDefinition {
        &self.definition
    }

    pub fn rules(&self) -> AttemptRules {
        self.rules
    }

    pub fn outcome(&self) -> AttemptOutcome {
        self.outcome
    }

    pub fn is_active(&self) -> bool {
        !self.outcome.is_terminal()
    }

    pub fn guesses(&self) -> &[GuessEntry] {
        &self.guesses
    }

    pub fn hints(&self) -> &[HintEntry] {
        &self.hints
    }

    pub fn farewell(&self) -> Option<&str> {
        self.farewell.as_deref()
    }

    pub fn acknowledged_last_guess(&self) -> bool {
        self.acknowledged_last_guess
    }

    pub fn wrong_guess_count(&self) -> usize {
        self.guesses.iter().filter(|g| !g.correct).count()
    }

    /// Seconds from presentation to the terminal state, or to `now` while active.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> f64 {
        elapsed_seconds(self.started_at, self.ended_at.unwrap_or(now))
    }

    fn ensure_active(&self) -> Result<(), AttemptError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(AttemptError::NotActive(self.outcome))
        }
    }

    /// Normalizes a guess and checks it against the block's preconditions
    /// without touching the attempt. Letter-graded guesses are upper-cased.
    pub fn validate_guess(&self, text: &str) -> Result<String, AttemptError> {
        self.ensure_active()?;

        let text = text.trim();
        if text.is_empty() {
            return Err(AttemptError::EmptyGuess);
        }

        if self.rules.enforce_length {
            let expected = self.definition.letter_count();
            let actual = text.chars().count();
            if expected != actual {
                return Err(AttemptError::WrongLength { expected, actual });
            }
        }

        if self.rules.grade_letters {
            Ok(text.to_ascii_uppercase())
        } else {
            Ok(text.to_string())
        }
    }

    pub fn submit_guess(&mut self, text: &str, at: DateTime<Utc>) -> Result<GuessResult, AttemptError> {
        let text = self.validate_guess(text)?;
        let text = text.as_str();

        let verdicts: Option<Vec<Verdict>> = if self.rules.grade_letters {
            Some(grader::grade(&self.definition.answer, text)?)
        } else {
            None
        };

        let correct = match &verdicts {
            Some(verdicts) => grader::all_exact(verdicts),
            None => self.definition.is_answer(text),
        };
        self.guesses.push(GuessEntry {
            text: text.to_string(),
            verdicts,
            correct,
            elapsed_seconds: elapsed_seconds(self.started_at, at),
        });

        if correct {
            self.finish(AttemptOutcome::Solved, at);
            return Ok(GuessResult::Solved);
        }

        let wrong = self.wrong_guess_count() as u32;
        match self.rules.attempt_limit {
            Some(limit) if wrong >= limit => {
                self.finish(AttemptOutcome::Exhausted, at);
                Ok(GuessResult::Exhausted)
            }
            Some(limit) => Ok(GuessResult::Wrong {
                remaining: Some(limit - wrong),
            }),
            None => Ok(GuessResult::Wrong { remaining: None }),
        }
    }

    /// Prepares a hint prompt. Consumes the acknowledgment flag on first use.
    pub fn request_hint(&mut self, at: DateTime<Utc>) -> Result<HintTicket, AttemptError> {
        self.ensure_active()?;
        if self.guesses.is_empty() {
            return Err(AttemptError::NoGuessesYet);
        }

        let elapsed = elapsed_seconds(self.started_at, at);
        let level = select_level(self.wrong_guess_count(), elapsed);
        let prior: Vec<String> = self.guesses.iter().map(|g| g.text.clone()).collect();
        let prompt = build_request(
            self.definition.tone,
            level,
            &self.definition.answer,
            &prior,
            !self.acknowledged_last_guess,
        );
        self.acknowledged_last_guess = true;

        Ok(HintTicket {
            level,
            prompt,
            elapsed_seconds: elapsed,
        })
    }

    /// Appends generated hint text. Ignored once the attempt has ended.
    pub fn record_hint(&mut self, ticket: &HintTicket, text: String) -> Option<&HintEntry> {
        if !self.is_active() {
            return None;
        }
        self.hints.push(HintEntry {
            text,
            level: ticket.level,
            elapsed_seconds: ticket.elapsed_seconds,
        });
        self.hints.last()
    }

    pub fn give_up(&mut self, at: DateTime<Utc>) -> Result<(), AttemptError> {
        self.ensure_active()?;
        self.finish(AttemptOutcome::GaveUp, at);
        Ok(())
    }

    /// The closing-remark prompt, handed out once per unsolved attempt.
    pub fn farewell_prompt(&mut self) -> Result<String, AttemptError> {
        match self.outcome {
            AttemptOutcome::Exhausted | AttemptOutcome::GaveUp => {}
            other => return Err(AttemptError::NotActive(other)),
        }
        if self.farewell_requested {
            return Err(AttemptError::FarewellRecorded);
        }
        self.farewell_requested = true;
        Ok(build_farewell(self.definition.tone, &self.definition.answer))
    }

    pub fn record_farewell(&mut self, text: String) -> Result<(), AttemptError> {
        if self.farewell.is_some() {
            return Err(AttemptError::FarewellRecorded);
        }
        self.farewell = Some(text);
        Ok(())
    }

    fn finish(&mut self, outcome: AttemptOutcome, at: DateTime<Utc>) {
        self.outcome = outcome;
        self.ended_at = Some(at.max(self.started_at));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Difficulty, PuzzleSpec, Tone};
    use chrono::Duration;

    fn wordle(answer: &str) -> (PuzzleAttempt, DateTime<Utc>) {
        let start = Utc::now();
        let definition = PuzzleDefinition::from_spec(&PuzzleSpec::word(answer), Tone::Neutral);
        (
            PuzzleAttempt::new(Arc::new(definition), AttemptRules::graded(6), start),
            start,
        )
    }

    fn riddle() -> (PuzzleAttempt, DateTime<Utc>) {
        let start = Utc::now();
        let spec = PuzzleSpec::with_clue("Zebra", "Striped animal.", Difficulty::Easy);
        let definition = PuzzleDefinition::from_spec(&spec, Tone::Enthusiastic);
        (
            PuzzleAttempt::new(Arc::new(definition), AttemptRules::free_form(), start),
            start,
        )
    }

    #[test]
    fn solving_records_guesses_and_end_time() {
        let (mut attempt, start) = wordle("CRANE");
        let first = attempt
            .submit_guess("APPLE", start + Duration::seconds(3))
            .unwrap();
        assert_eq!(first, GuessResult::Wrong { remaining: Some(5) });

        let second = attempt
            .submit_guess("crane", start + Duration::seconds(8))
            .unwrap();
        assert_eq!(second, GuessResult::Solved);
        assert_eq!(attempt.outcome(), AttemptOutcome::Solved);
        assert_eq!(attempt.guesses().len(), 2);
        assert_eq!(attempt.guesses()[0].elapsed_seconds, 3.0);
        assert_eq!(attempt.elapsed_seconds(start + Duration::seconds(99)), 8.0);
    }

    #[test]
    fn guess_after_terminal_is_rejected_without_change() {
        let (mut attempt, start) = wordle("CRANE");
        attempt.submit_guess("CRANE", start).unwrap();

        let err = attempt.submit_guess("APPLE", start).unwrap_err();
        assert_eq!(err, AttemptError::NotActive(AttemptOutcome::Solved));
        assert_eq!(attempt.guesses().len(), 1);
    }

    #[test]
    fn wrong_length_is_rejected_without_change() {
        let (mut attempt, start) = wordle("CRANE");
        let err = attempt.submit_guess("CRANES", start).unwrap_err();
        assert_eq!(err, AttemptError::WrongLength { expected: 5, actual: 6 });
        assert!(attempt.guesses().is_empty());
    }

    #[test]
    fn limit_exhausts_and_farewell_is_handed_out_once() {
        let (mut attempt, start) = wordle("LEMON");
        for word in ["APPLE", "GRAPE", "BERRY", "MONEY", "WATER"] {
            assert!(matches!(
                attempt.submit_guess(word, start).unwrap(),
                GuessResult::Wrong { .. }
            ));
        }
        assert_eq!(attempt.submit_guess("PLANT", start).unwrap(), GuessResult::Exhausted);
        assert_eq!(attempt.outcome(), AttemptOutcome::Exhausted);

        let prompt = attempt.farewell_prompt().unwrap();
        assert!(prompt.contains("LEMON"));
        assert_eq!(attempt.farewell_prompt(), Err(AttemptError::FarewellRecorded));

        attempt.record_farewell("It was LEMON.".into()).unwrap();
        assert_eq!(
            attempt.record_farewell("again".into()),
            Err(AttemptError::FarewellRecorded)
        );
        assert_eq!(attempt.farewell(), Some("It was LEMON."));
    }

    #[test]
    fn hint_requires_a_guess() {
        let (mut attempt, start) = wordle("CRANE");
        assert_eq!(attempt.request_hint(start), Err(AttemptError::NoGuessesYet));
        assert!(attempt.hints().is_empty());
        assert!(!attempt.acknowledged_last_guess());
    }

    #[test]
    fn acknowledgment_is_consumed_by_first_hint() {
        let (mut attempt, start) = wordle("CRANE");
        attempt.submit_guess("APPLE", start).unwrap();

        let first = attempt.request_hint(start + Duration::seconds(5)).unwrap();
        assert!(first.prompt.contains("'APPLE' was incorrect"));
        assert!(attempt.acknowledged_last_guess());

        attempt.submit_guess("GRAPE", start).unwrap();
        let second = attempt.request_hint(start + Duration::seconds(40)).unwrap();
        assert!(!second.prompt.contains("was incorrect"));
        assert_eq!(second.level, HintLevel::Moderate);

        attempt.record_hint(&first, "Think birds.".into());
        attempt.record_hint(&second, "It lifts things.".into());
        assert_eq!(attempt.hints().len(), 2);
        assert_eq!(attempt.hints()[0].elapsed_seconds, 5.0);
    }

    #[test]
    fn hint_text_arriving_after_end_is_dropped() {
        let (mut attempt, start) = wordle("CRANE");
        attempt.submit_guess("APPLE", start).unwrap();
        let ticket = attempt.request_hint(start).unwrap();
        attempt.submit_guess("CRANE", start).unwrap();

        assert!(attempt.record_hint(&ticket, "late".into()).is_none());
        assert!(attempt.hints().is_empty());
    }

    #[test]
    fn free_form_compares_whole_word_without_limit() {
        let (mut attempt, start) = riddle();
        for _ in 0..10 {
            assert_eq!(
                attempt.submit_guess("Horse", start).unwrap(),
                GuessResult::Wrong { remaining: None }
            );
        }
        assert!(attempt.guesses()[0].verdicts.is_none());
        assert_eq!(attempt.submit_guess(" zebra ", start).unwrap(), GuessResult::Solved);
    }

    #[test]
    fn give_up_ends_attempt() {
        let (mut attempt, start) = riddle();
        attempt.give_up(start + Duration::seconds(12)).unwrap();
        assert_eq!(attempt.outcome(), AttemptOutcome::GaveUp);
        assert_eq!(
            attempt.give_up(start),
            Err(AttemptError::NotActive(AttemptOutcome::GaveUp))
        );
        assert!(attempt.farewell_prompt().unwrap().contains("Zebra"));
    }

    #[test]
    fn solved_attempt_has_no_farewell() {
        let (mut attempt, start) = riddle();
        attempt.submit_guess("Zebra", start).unwrap();
        assert_eq!(
            attempt.farewell_prompt(),
            Err(AttemptError::NotActive(AttemptOutcome::Solved))
        );
    }
}
