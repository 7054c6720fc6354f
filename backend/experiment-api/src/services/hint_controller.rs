use std::sync::Arc;

use crate::metrics::EXTERNAL_SERVICE_FAILURES_TOTAL;
use crate::models::{Block, HintLevel, Tone};
use crate::services::hint_generator::{HintGenerator, Prompt};

const FAREWELL_TEMPERATURE: f32 = 0.5;

/// Block A remarks are one short line; Block B allows a little more room.
pub fn farewell_max_tokens(block: Block) -> u32 {
    match block {
        Block::A => 50,
        Block::B => 100,
    }
}

/// Picks hint detail from play history. Level 3 once the participant has
/// missed four times or spent over a minute, level 2 after two misses or
/// thirty seconds, otherwise level 1.
pub fn select_level(wrong_guesses: usize, elapsed_seconds: f64) -> HintLevel {
    if wrong_guesses >= 4 || elapsed_seconds > 60.0 {
        HintLevel::Detailed
    } else if wrong_guesses >= 2 || elapsed_seconds > 30.0 {
        HintLevel::Moderate
    } else {
        HintLevel::Subtle
    }
}

fn acknowledgment(tone: Tone, last_guess: &str) -> String {
    match tone {
        Tone::Enthusiastic => format!("Great effort on '{last_guess}', but it isn't the word. "),
        Tone::Neutral => format!("The previous guess '{last_guess}' was incorrect. "),
        Tone::Frustrated => format!("Well, '{last_guess}' was wrong. "),
    }
}

fn persona(tone: Tone, secret: &str, word_length: usize) -> String {
    let task = format!(
        "You are helping a player guess a secret {word_length}-letter word. The secret word is \
         '{secret}'. Never say the word itself. Give a fresh hint each time, skip filler phrases \
         and do not repeat earlier hints."
    );
    let style = match tone {
        Tone::Enthusiastic => {
            "Sound upbeat and encouraging. Cheer the player on and point them toward the \
             word's meaning or associations."
        }
        Tone::Neutral => {
            "Stay factual and concise. Describe one defining feature of the word without \
             any emotion."
        }
        Tone::Frustrated => {
            "Sound impatient and mildly sarcastic. You are unimpressed by the player, but the \
             hint itself must still be useful."
        }
    };
    format!("{task} {style}")
}

/// Composes the hint prompt: optional acknowledgment of the latest miss,
/// the tone persona, prior guesses and the detail directive.
pub fn build_request(
    tone: Tone,
    level: HintLevel,
    secret: &str,
    prior_guesses: &[String],
    acknowledge_last_wrong: bool,
) -> String {
    let mut prompt = String::new();

    if acknowledge_last_wrong {
        if let Some(last) = prior_guesses.last() {
            prompt.push_str(&acknowledgment(tone, last));
        }
    }

    prompt.push_str(&persona(tone, secret, secret.chars().count()));

    if !prior_guesses.is_empty() {
        prompt.push_str(" Previous guesses: ");
        prompt.push_str(&prior_guesses.join(", "));
        prompt.push('.');
    }

    prompt.push_str(&format!(" Now give a level-{} hint.", level.label()));
    prompt
}

/// Prompt for the single remark that reveals the answer after the attempt
/// ends unsolved.
pub fn build_farewell(tone: Tone, secret: &str) -> String {
    let style = match tone {
        Tone::Enthusiastic => "Reveal it in a warm, upbeat closing remark.",
        Tone::Neutral => "State the answer plainly in one sentence.",
        Tone::Frustrated => "Reveal it with a final sarcastic remark.",
    };
    format!("The player did not find the word '{secret}'. {style}")
}

pub fn hint_placeholder(reason: &str) -> String {
    format!("[Hint error: {reason}]")
}

pub fn farewell_placeholder(reason: &str) -> String {
    format!("[Error revealing answer: {reason}]")
}

/// Sends composed prompts to the generator. Failures never propagate; they
/// come back as inline placeholder text.
#[derive(Clone)]
pub struct HintController {
    generator: Arc<dyn HintGenerator>,
}

impl HintController {
    pub fn new(generator: Arc<dyn HintGenerator>) -> Self {
        Self { generator }
    }

    pub async fn generate_hint(&self, prompt: &str) -> String {
        tracing::debug!("Requesting hint: {}", prompt);
        match self.generator.generate(&Prompt::new(prompt)).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Hint generation failed: {}", e);
                EXTERNAL_SERVICE_FAILURES_TOTAL
                    .with_label_values(&["hint"])
                    .inc();
                hint_placeholder(&e.to_string())
            }
        }
    }

    pub async fn generate_farewell(&self, prompt: &str, block: Block) -> String {
        tracing::debug!("Requesting farewell remark: {}", prompt);
        let request = Prompt::new(prompt)
            .with_sampling(farewell_max_tokens(block), FAREWELL_TEMPERATURE);
        match self.generator.generate(&request).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Farewell generation failed: {}", e);
                EXTERNAL_SERVICE_FAILURES_TOTAL
                    .with_label_values(&["hint"])
                    .inc();
                farewell_placeholder(&e.to_string())
            }
        }
    }
}
