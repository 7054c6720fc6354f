#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tone_experiment_api::{
    config::Config,
    create_router,
    models::{Difficulty, PuzzleSpec},
    services::{
        catalog::PuzzleCatalog,
        hint_generator::{HintGenerator, Prompt, ServiceError},
        lexicon::Lexicon,
        speech_service::SpeechSynthesizer,
        AppState,
    },
};
use tower::ServiceExt;
use uuid::Uuid;

pub const SURVEY: [u8; 8] = [4, 5, 3, 4, 2, 4, 5, 3];

/// Answers every prompt with a numbered hint and remembers what it was asked.
#[derive(Default)]
pub struct ScriptedHints {
    pub prompts: Mutex<Vec<Prompt>>,
    pub fail: bool,
}

impl ScriptedHints {
    pub fn failing() -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl HintGenerator for ScriptedHints {
    async fn generate(&self, prompt: &Prompt) -> Result<String, ServiceError> {
        let mut prompts = self.prompts.lock().unwrap();
        prompts.push(prompt.clone());
        if self.fail {
            return Err(ServiceError::Status {
                status: 503,
                body: "overloaded".into(),
            });
        }
        Ok(format!("hint #{}", prompts.len()))
    }
}

#[derive(Default)]
pub struct CountingSpeech {
    pub calls: AtomicUsize,
}

#[async_trait]
impl SpeechSynthesizer for CountingSpeech {
    async fn synthesize(&self, ssml: &str) -> Result<Vec<u8>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ssml.as_bytes().to_vec())
    }
}

pub struct TestApp {
    pub router: Router,
    pub hints: Arc<ScriptedHints>,
    pub speech: Arc<CountingSpeech>,
    pub data_dir: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}

/// Block A: CRANE, LEMON. Block B: Zebra.
pub fn small_catalog() -> PuzzleCatalog {
    PuzzleCatalog {
        block_a: vec![PuzzleSpec::word("CRANE"), PuzzleSpec::word("LEMON")],
        block_b: vec![PuzzleSpec::with_clue(
            "Zebra",
            "A striped animal.",
            Difficulty::Easy,
        )],
    }
}

pub fn test_config(data_dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.storage.data_dir = data_dir.to_string_lossy().into_owned();
    config
}

pub fn create_test_app() -> TestApp {
    create_test_app_with(ScriptedHints::default(), None)
}

pub fn create_test_app_with(hints: ScriptedHints, lexicon: Option<Lexicon>) -> TestApp {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let data_dir = std::env::temp_dir().join(format!("tone-experiment-{}", Uuid::new_v4()));
    let hints = Arc::new(hints);
    let speech = Arc::new(CountingSpeech::default());

    let state = AppState::with_collaborators(
        test_config(&data_dir),
        small_catalog(),
        lexicon,
        hints.clone(),
        speech.clone(),
    )
    .expect("Failed to initialize test app state");

    TestApp {
        router: create_router(Arc::new(state)),
        hints,
        speech,
        data_dir,
    }
}

impl TestApp {
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }

    pub async fn create_session(&self) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/v1/sessions",
                Some(json!({
                    "participant_id": "1001",
                    "age": "25-34",
                    "gender": "Prefer not to say"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
        body["session_id"].as_str().unwrap().to_string()
    }

    pub async fn guess(&self, session_id: &str, guess: &str) -> (StatusCode, Value) {
        self.send(
            "POST",
            &format!("/api/v1/sessions/{session_id}/guesses"),
            Some(json!({ "guess": guess })),
        )
        .await
    }

    pub async fn survey(&self, session_id: &str, answers: &[u8]) -> (StatusCode, Value) {
        self.send(
            "POST",
            &format!("/api/v1/sessions/{session_id}/survey"),
            Some(json!({ "answers": answers })),
        )
        .await
    }

    pub async fn advance(&self, session_id: &str) -> (StatusCode, Value) {
        self.send("POST", &format!("/api/v1/sessions/{session_id}/advance"), None)
            .await
    }

    /// Solves both Block A puzzles on the first try and moves into Block B.
    pub async fn finish_block_a(&self, session_id: &str) {
        for word in ["CRANE", "LEMON"] {
            let (status, _) = self.guess(session_id, word).await;
            assert_eq!(status, StatusCode::OK);
            let (status, _) = self.survey(session_id, &SURVEY).await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, body) = self.advance(session_id).await;
        assert_eq!(status, StatusCode::OK, "advance failed: {body}");
        assert_eq!(body["phase"], "block_b_in_progress");
    }

    pub fn block_file(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }
}
