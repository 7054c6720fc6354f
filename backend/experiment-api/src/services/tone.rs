use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::Tone;

/// Tone order for one block. Never empty, never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToneRotation {
    tones: Vec<Tone>,
}

impl ToneRotation {
    /// Enthusiastic, Neutral, Frustrated.
    pub fn standard() -> Self {
        Self {
            tones: Tone::ALL.to_vec(),
        }
    }

    /// The standard rotation in a random order, drawn once per participant.
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut tones = Tone::ALL.to_vec();
        tones.shuffle(rng);
        Self { tones }
    }

    pub fn assign(&self, puzzle_index: usize) -> Tone {
        assign(puzzle_index, self)
    }
}

pub fn assign(puzzle_index: usize, rotation: &ToneRotation) -> Tone {
    rotation.tones[puzzle_index % rotation.tones.len()]
}

/// Wraps text for the speech synthesizer.
pub fn ssml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    format!("<speak>{}</speak>", escaped)
}
