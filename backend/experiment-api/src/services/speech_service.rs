use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::config::SpeechConfig;
use crate::metrics::EXTERNAL_SERVICE_FAILURES_TOTAL;
use crate::services::hint_generator::ServiceError;
use crate::services::tone::ssml;

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, ssml: &str) -> Result<Vec<u8>, ServiceError>;
}

/// Used when speech is switched off in config.
pub struct DisabledSpeech;

#[async_trait]
impl SpeechSynthesizer for DisabledSpeech {
    async fn synthesize(&self, _ssml: &str) -> Result<Vec<u8>, ServiceError> {
        Err(ServiceError::Disabled)
    }
}

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    text_type: &'static str,
    voice: &'a str,
    output_format: &'static str,
}

/// Posts SSML to a text-to-speech endpoint that answers with raw mp3 bytes.
pub struct HttpSpeechSynthesizer {
    client: Client,
    url: String,
    voice: String,
}

impl HttpSpeechSynthesizer {
    pub fn new(config: &SpeechConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: config.api_url.clone(),
            voice: config.voice.clone(),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSpeechSynthesizer {
    async fn synthesize(&self, ssml: &str) -> Result<Vec<u8>, ServiceError> {
        let response = self
            .client
            .post(&self.url)
            .json(&SynthesisRequest {
                text: ssml,
                text_type: "ssml",
                voice: &self.voice,
                output_format: "mp3",
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ServiceError::Status { status, body });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub sequence: u64,
    pub text: String,
    pub bytes: Vec<u8>,
}

#[derive(Default)]
struct Slot {
    sequence: u64,
    task: Option<JoinHandle<()>>,
    clip: Option<Arc<AudioClip>>,
}

/// Single-slot playback for one session. Starting new speech aborts the
/// in-flight synthesis and replaces the current clip.
pub struct VoiceChannel {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    slot: Arc<Mutex<Slot>>,
}

impl VoiceChannel {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self {
            synthesizer,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    /// Starts synthesis for `text` in the background and returns its sequence.
    pub fn speak(&self, text: &str) -> u64 {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(task) = slot.task.take() {
            task.abort();
        }
        slot.sequence += 1;
        slot.clip = None;
        let sequence = slot.sequence;

        let synthesizer = Arc::clone(&self.synthesizer);
        let shared = Arc::clone(&self.slot);
        let text = text.to_string();
        slot.task = Some(tokio::spawn(async move {
            match synthesizer.synthesize(&ssml(&text)).await {
                Ok(bytes) => {
                    let mut slot = shared.lock().unwrap_or_else(|e| e.into_inner());
                    if slot.sequence == sequence {
                        slot.clip = Some(Arc::new(AudioClip {
                            sequence,
                            text,
                            bytes,
                        }));
                        slot.task = None;
                    }
                }
                Err(ServiceError::Disabled) => {}
                Err(e) => {
                    tracing::warn!("Speech synthesis failed: {}", e);
                    EXTERNAL_SERVICE_FAILURES_TOTAL
                        .with_label_values(&["speech"])
                        .inc();
                }
            }
        }));

        sequence
    }

    /// Aborts pending synthesis and drops the current clip. Safe to call
    /// repeatedly.
    pub fn stop(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(task) = slot.task.take() {
            task.abort();
        }
        slot.clip = None;
    }

    pub fn current_clip(&self) -> Option<Arc<AudioClip>> {
        self.slot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clip
            .clone()
    }

}

impl Drop for VoiceChannel {
    fn drop(&mut self) {
        self.stop();
    }
}
