use thiserror::Error;

use crate::models::Verdict;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GradeError {
    #[error("guess has {actual} letters, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Grades `guess` against `secret` position by position, ASCII case-insensitive.
///
/// Exact matches are claimed first so that a letter is never reported as
/// misplaced more often than it remains unmatched in the secret:
///
/// 1. every position where the letters agree is `Exact` and consumes that
///    letter of the secret;
/// 2. each remaining guess letter is `Misplaced` if an unconsumed copy is
///    left anywhere in the secret (consuming it), otherwise `Absent`.
pub fn grade(secret: &str, guess: &str) -> Result<Vec<Verdict>, GradeError> {
    let secret: Vec<char> = secret.chars().map(|c| c.to_ascii_uppercase()).collect();
    let guess: Vec<char> = guess.chars().map(|c| c.to_ascii_uppercase()).collect();

    if guess.len() != secret.len() {
        return Err(GradeError::LengthMismatch {
            expected: secret.len(),
            actual: guess.len(),
        });
    }

    let mut verdicts = vec![Verdict::Absent; guess.len()];
    let mut unmatched: Vec<Option<char>> = secret.iter().copied().map(Some).collect();

    for (i, (g, s)) in guess.iter().zip(&secret).enumerate() {
        if g == s {
            verdicts[i] = Verdict::Exact;
            unmatched[i] = None;
        }
    }

    for (i, g) in guess.iter().enumerate() {
        if verdicts[i] == Verdict::Exact {
            continue;
        }
        if let Some(slot) = unmatched.iter_mut().find(|slot| **slot == Some(*g)) {
            *slot = None;
            verdicts[i] = Verdict::Misplaced;
        }
    }

    Ok(verdicts)
}

pub fn all_exact(verdicts: &[Verdict]) -> bool {
    !verdicts.is_empty() && verdicts.iter().all(|v| *v == Verdict::Exact)
}
