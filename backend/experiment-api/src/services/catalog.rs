use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::models::{Block, Difficulty, PuzzleSpec};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read puzzle catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse puzzle catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("block {0} has no puzzles")]
    EmptyBlock(Block),
    #[error("block {block} answer '{answer}' is invalid: {reason}")]
    InvalidAnswer {
        block: Block,
        answer: String,
        reason: String,
    },
}

const BLOCK_A_WORDS: [&str; 10] = [
    "APPLE", "CRANE", "GRAPE", "LEMON", "BERRY", "MONEY", "WATER", "PLANT", "ROBOT", "HONEY",
];

const BLOCK_B_PUZZLES: [(&str, &str, Difficulty); 9] = [
    ("Zebra", "A four-legged animal covered in black and white stripes.", Difficulty::Easy),
    ("Apple", "A common fruit said to keep the doctor away.", Difficulty::Easy),
    ("Car", "An everyday vehicle that usually runs on gasoline.", Difficulty::Easy),
    ("Mercury", "A liquid metal named after the Roman messenger god.", Difficulty::Medium),
    ("Neptune", "A planet known for its deep blue color.", Difficulty::Medium),
    ("Pythagoras", "An ancient Greek mathematician with a famous theorem.", Difficulty::Medium),
    ("Photosynthesis", "How plants turn light into chemical energy.", Difficulty::Hard),
    ("Einstein", "A physicist famous for the theory of relativity.", Difficulty::Hard),
    ("Metamorphosis", "The transformation a caterpillar goes through.", Difficulty::Hard),
];

/// Puzzles for both blocks, before tones are assigned.
#[derive(Debug, Clone, Deserialize)]
pub struct PuzzleCatalog {
    pub block_a: Vec<PuzzleSpec>,
    pub block_b: Vec<PuzzleSpec>,
}

impl PuzzleCatalog {
    pub fn builtin() -> Self {
        let block_a = BLOCK_A_WORDS.iter().map(|w| PuzzleSpec::word(w)).collect();
        let block_b = BLOCK_B_PUZZLES
            .iter()
            .map(|(answer, clue, difficulty)| PuzzleSpec::with_clue(answer, clue, *difficulty))
            .collect();
        Self { block_a, block_b }
    }

    pub async fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let raw = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn block(&self, block: Block) -> &[PuzzleSpec] {
        match block {
            Block::A => &self.block_a,
            Block::B => &self.block_b,
        }
    }

    /// Block A answers must be alphabetic and exactly `word_length` long;
    /// Block B answers must be non-blank.
    pub fn validate(&self, word_length: usize) -> Result<(), CatalogError> {
        for block in [Block::A, Block::B] {
            if self.block(block).is_empty() {
                return Err(CatalogError::EmptyBlock(block));
            }
        }

        for spec in &self.block_a {
            let answer = spec.answer.trim();
            if !answer.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(CatalogError::InvalidAnswer {
                    block: Block::A,
                    answer: spec.answer.clone(),
                    reason: "letters only".into(),
                });
            }
            if answer.chars().count() != word_length {
                return Err(CatalogError::InvalidAnswer {
                    block: Block::A,
                    answer: spec.answer.clone(),
                    reason: format!("must be {word_length} letters"),
                });
            }
        }

        if let Some(spec) = self.block_b.iter().find(|s| s.answer.trim().is_empty()) {
            return Err(CatalogError::InvalidAnswer {
                block: Block::B,
                answer: spec.answer.clone(),
                reason: "answer is blank".into(),
            });
        }

        Ok(())
    }

    pub fn block_a_answers(&self) -> impl Iterator<Item = &str> {
        self.block_a.iter().map(|s| s.answer.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = PuzzleCatalog::builtin();
        assert_eq!(catalog.block_a.len(), 10);
        assert_eq!(catalog.block_b.len(), 9);
        catalog.validate(5).unwrap();
        assert_eq!(catalog.block_b[6].difficulty, Some(Difficulty::Hard));
    }

    #[test]
    fn wrong_length_word_is_rejected() {
        let catalog = PuzzleCatalog {
            block_a: vec![PuzzleSpec::word("APPLES")],
            block_b: vec![PuzzleSpec::word("Car")],
        };
        assert!(matches!(
            catalog.validate(5),
            Err(CatalogError::InvalidAnswer { block: Block::A, .. })
        ));
    }

    #[test]
    fn empty_block_is_rejected() {
        let catalog = PuzzleCatalog {
            block_a: vec![PuzzleSpec::word("CRANE")],
            block_b: vec![],
        };
        assert!(matches!(
            catalog.validate(5),
            Err(CatalogError::EmptyBlock(Block::B))
        ));
    }

    #[test]
    fn catalog_parses_from_json() {
        let raw = r#"{
            "block_a": [{"answer": "CRANE"}],
            "block_b": [{"answer": "Neptune", "clue": "Blue planet.", "difficulty": "Medium"}]
        }"#;
        let catalog: PuzzleCatalog = serde_json::from_str(raw).unwrap();
        assert_eq!(catalog.block_b[0].clue.as_deref(), Some("Blue planet."));
        catalog.validate(5).unwrap();
    }
}
