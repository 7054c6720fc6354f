use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::config::Config;
use catalog::PuzzleCatalog;
use experiment::ExperimentSession;
use hint_controller::HintController;
use hint_generator::{ChatCompletionClient, HintGenerator};
use lexicon::Lexicon;
use result_writer::ResultWriter;
use speech_service::{DisabledSpeech, HttpSpeechSynthesizer, SpeechSynthesizer, VoiceChannel};

pub mod catalog;
pub mod experiment;
pub mod grader;
pub mod hint_controller;
pub mod hint_generator;
pub mod lexicon;
pub mod puzzle_attempt;
pub mod result_writer;
pub mod session_service;
pub mod speech_service;
pub mod tone;

/// A live session plus its playback slot. The mutex is the only way to
/// mutate the session.
pub struct SessionHandle {
    pub session: Mutex<ExperimentSession>,
    pub voice: VoiceChannel,
}

pub struct AppState {
    pub config: Config,
    pub catalog: PuzzleCatalog,
    pub lexicon: Option<Lexicon>,
    pub hints: HintController,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub writer: ResultWriter,
    pub sessions: RwLock<HashMap<Uuid, Arc<SessionHandle>>>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let catalog = match config.experiment.puzzles_path.as_deref() {
            Some(path) => {
                tracing::info!("Loading puzzle catalog from {}", path);
                PuzzleCatalog::from_path(Path::new(path)).await?
            }
            None => PuzzleCatalog::builtin(),
        };

        let lexicon = match config.experiment.wordlist_path.as_deref() {
            Some(path) => {
                let lexicon = Lexicon::load(Path::new(path))
                    .await
                    .map_err(|e| anyhow::anyhow!("Failed to read word list {}: {}", path, e))?;
                tracing::info!("Loaded {} words from {}", lexicon.len(), path);
                Some(lexicon)
            }
            None => None,
        };

        let generator: Arc<dyn HintGenerator> = Arc::new(ChatCompletionClient::new(&config.hints)?);
        let speech: Arc<dyn SpeechSynthesizer> = if config.speech.enabled {
            Arc::new(HttpSpeechSynthesizer::new(&config.speech)?)
        } else {
            tracing::info!("Speech synthesis disabled");
            Arc::new(DisabledSpeech)
        };

        Self::with_collaborators(config, catalog, lexicon, generator, speech)
    }

    /// Builds state around injected collaborators. Puzzle answers are always
    /// accepted by the word list.
    pub fn with_collaborators(
        config: Config,
        catalog: PuzzleCatalog,
        lexicon: Option<Lexicon>,
        generator: Arc<dyn HintGenerator>,
        speech: Arc<dyn SpeechSynthesizer>,
    ) -> anyhow::Result<Self> {
        catalog.validate(config.experiment.word_length)?;

        let lexicon = lexicon.map(|mut lexicon| {
            lexicon.extend(catalog.block_a_answers());
            lexicon
        });
        let writer = ResultWriter::new(&config.storage);

        Ok(Self {
            config,
            catalog,
            lexicon,
            hints: HintController::new(generator),
            speech,
            writer,
            sessions: RwLock::new(HashMap::new()),
        })
    }
}
