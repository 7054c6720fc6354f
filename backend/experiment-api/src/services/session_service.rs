use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::metrics::{
    GUESSES_SUBMITTED_TOTAL, HINTS_REQUESTED_TOTAL, RECORDS_FLUSHED_TOTAL, SESSIONS_ACTIVE,
    SESSIONS_TOTAL,
};
use crate::models::session::{
    CreateSessionRequest, GiveUpResponse, GuessResponse, HintResponse, SessionSnapshot,
    SurveyQuestionsResponse,
};
use crate::models::{HintEntry, ParticipantInfo, SessionPhase};
use crate::services::experiment::{
    ExperimentPlan, ExperimentSession, PendingFarewell, PendingHint, SessionError, SurveyOutcome,
};
use crate::services::puzzle_attempt::GuessResult;
use crate::services::result_writer::PersistenceError;
use crate::services::speech_service::{AudioClip, VoiceChannel};
use crate::services::tone::ToneRotation;
use crate::services::{AppState, SessionHandle};

#[derive(Debug, Error)]
pub enum SessionServiceError {
    #[error("session {0} not found")]
    NotFound(Uuid),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("hint arrived after the puzzle changed and was discarded")]
    HintDiscarded,
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub type Result<T> = std::result::Result<T, SessionServiceError>;

/// Drives experiment sessions held in `AppState`.
pub struct SessionService {
    state: Arc<AppState>,
}

impl SessionService {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    fn plan(&self) -> ExperimentPlan {
        let experiment = &self.state.config.experiment;
        let (rotation_a, rotation_b) = if experiment.shuffle_tones {
            let mut rng = rand::rng();
            (
                ToneRotation::shuffled(&mut rng),
                ToneRotation::shuffled(&mut rng),
            )
        } else {
            (ToneRotation::standard(), ToneRotation::standard())
        };
        ExperimentPlan::new(
            &self.state.catalog,
            experiment.attempt_limit,
            &rotation_a,
            &rotation_b,
        )
    }

    pub async fn create_session(&self, req: CreateSessionRequest) -> Result<SessionSnapshot> {
        let participant = ParticipantInfo::new(&req.participant_id, req.age, req.gender);
        let session_id = Uuid::new_v4();
        let now = Utc::now();

        let session = ExperimentSession::new(session_id, participant, self.plan(), now);
        let snapshot = session.snapshot(now);

        let handle = Arc::new(SessionHandle {
            session: Mutex::new(session),
            voice: VoiceChannel::new(Arc::clone(&self.state.speech)),
        });
        self.state.sessions.write().await.insert(session_id, handle);

        SESSIONS_TOTAL.with_label_values(&["created"]).inc();
        SESSIONS_ACTIVE.inc();
        tracing::info!(
            "Session created: session={}, participant={}",
            session_id,
            snapshot.participant_id
        );

        Ok(snapshot)
    }

    async fn handle(&self, session_id: Uuid) -> Result<Arc<SessionHandle>> {
        self.state
            .sessions
            .read()
            .await
            .get(&session_id)
            .cloned()
            .ok_or(SessionServiceError::NotFound(session_id))
    }

    pub async fn get_session(&self, session_id: Uuid) -> Result<SessionSnapshot> {
        let handle = self.handle(session_id).await?;
        let session = handle.session.lock().await;
        Ok(session.snapshot(Utc::now()))
    }

    pub async fn submit_guess(&self, session_id: Uuid, guess: &str) -> Result<GuessResponse> {
        let handle = self.handle(session_id).await?;

        let outcome = {
            let mut session = handle.session.lock().await;
            session
                .submit_guess(guess, Utc::now(), self.state.lexicon.as_ref())
                .inspect_err(|e| {
                    tracing::warn!("Guess rejected: session={}, reason={}", session_id, e)
                })?
        };

        let result_label = match outcome.result {
            GuessResult::Solved => "solved",
            GuessResult::Wrong { .. } => "wrong",
            GuessResult::Exhausted => "exhausted",
        };
        GUESSES_SUBMITTED_TOTAL
            .with_label_values(&[result_label])
            .inc();
        tracing::info!(
            "Guess submitted: session={}, guess={}, result={}",
            session_id,
            outcome.entry.text,
            result_label
        );

        let hint = match &outcome.hint {
            Some(pending) => self.fulfil_hint(&handle, pending).await,
            None => None,
        };
        let farewell = match &outcome.farewell {
            Some(pending) => Some(self.fulfil_farewell(&handle, pending).await),
            None => None,
        };

        let session = handle.session.lock().await;
        Ok(GuessResponse {
            guess: outcome.entry,
            outcome: outcome.outcome,
            hint,
            farewell,
            session: session.snapshot(Utc::now()),
        })
    }

    pub async fn request_hint(&self, session_id: Uuid) -> Result<HintResponse> {
        let handle = self.handle(session_id).await?;

        let pending = {
            let mut session = handle.session.lock().await;
            session.request_hint(Utc::now()).inspect_err(|e| {
                tracing::warn!("Hint rejected: session={}, reason={}", session_id, e)
            })?
        };

        let hint = self
            .fulfil_hint(&handle, &pending)
            .await
            .ok_or(SessionServiceError::HintDiscarded)?;

        let session = handle.session.lock().await;
        let hints_used = session.attempt().map(|a| a.hints().len()).unwrap_or(0);
        Ok(HintResponse {
            level: hint.level,
            hint,
            hints_used,
        })
    }

    /// Generates hint text outside the lock, then applies it and starts speech.
    async fn fulfil_hint(
        &self,
        handle: &SessionHandle,
        pending: &PendingHint,
    ) -> Option<HintEntry> {
        HINTS_REQUESTED_TOTAL
            .with_label_values(&[pending.ticket.level.label()])
            .inc();

        let text = self.state.hints.generate_hint(&pending.ticket.prompt).await;

        let entry = handle.session.lock().await.apply_hint(pending, text);
        match &entry {
            Some(entry) => {
                handle.voice.speak(&entry.text);
            }
            None => tracing::debug!("Discarded hint for a finished attempt"),
        }
        entry
    }

    async fn fulfil_farewell(&self, handle: &SessionHandle, pending: &PendingFarewell) -> String {
        let text = self
            .state
            .hints
            .generate_farewell(&pending.prompt, pending.block)
            .await;
        if handle
            .session
            .lock()
            .await
            .apply_farewell(pending, text.clone())
        {
            handle.voice.speak(&text);
        }
        text
    }

    pub async fn give_up(&self, session_id: Uuid) -> Result<GiveUpResponse> {
        let handle = self.handle(session_id).await?;

        let pending = {
            let mut session = handle.session.lock().await;
            session.give_up(Utc::now()).inspect_err(|e| {
                tracing::warn!("Give up rejected: session={}, reason={}", session_id, e)
            })?
        };
        tracing::info!("Participant gave up: session={}", session_id);

        let farewell = self.fulfil_farewell(&handle, &pending).await;

        let session = handle.session.lock().await;
        Ok(GiveUpResponse {
            farewell,
            session: session.snapshot(Utc::now()),
        })
    }

    pub async fn survey_questions(&self, session_id: Uuid) -> Result<SurveyQuestionsResponse> {
        let handle = self.handle(session_id).await?;
        let session = handle.session.lock().await;
        let (tone, questions) = session.survey_questions()?;
        Ok(SurveyQuestionsResponse { tone, questions })
    }

    pub async fn submit_survey(&self, session_id: Uuid, answers: &[u8]) -> Result<SessionSnapshot> {
        let handle = self.handle(session_id).await?;
        let mut session = handle.session.lock().await;

        let outcome = session.submit_survey(answers, Utc::now()).inspect_err(|e| {
            tracing::warn!("Survey rejected: session={}, reason={}", session_id, e)
        })?;
        handle.voice.stop();

        if let Some(record) = session.state().records.last() {
            tracing::info!(
                "Puzzle recorded: session={}, block={}, answer={}, outcome={}",
                session_id,
                record.block,
                record.answer,
                record.outcome.as_str()
            );
        }

        if let SurveyOutcome::BlockComplete(block) = outcome {
            tracing::info!("Block {} complete: session={}", block, session_id);
            // The survey is already accepted; a failed save shows up as
            // `flush_pending` and is retried by `advance`.
            if self.flush(&mut session).await.is_err() {
                tracing::warn!(
                    "Block {} results kept in memory: session={}",
                    block,
                    session_id
                );
            }
        }

        let snapshot = session.snapshot(Utc::now());
        let finished = session.is_finished();
        drop(session);
        if finished {
            self.finish(session_id).await;
        }
        Ok(snapshot)
    }

    /// Retries a failed flush, then moves into the next block.
    pub async fn advance(&self, session_id: Uuid) -> Result<SessionSnapshot> {
        let handle = self.handle(session_id).await?;
        let mut session = handle.session.lock().await;

        self.flush(&mut session).await?;

        if session.phase() != SessionPhase::BlockBDone {
            session.advance(Utc::now()).inspect_err(|e| {
                tracing::warn!("Advance rejected: session={}, reason={}", session_id, e)
            })?;
            tracing::info!("Session advanced to block B: session={}", session_id);
        }

        let snapshot = session.snapshot(Utc::now());
        let finished = session.is_finished();
        drop(session);
        if finished {
            self.finish(session_id).await;
        }
        Ok(snapshot)
    }

    /// Writes a completed block if one is buffered. Records stay buffered on failure.
    async fn flush(&self, session: &mut ExperimentSession) -> Result<()> {
        let Some((block, records)) = session.pending_flush() else {
            return Ok(());
        };

        match self.state.writer.flush_block(block, &records).await {
            Ok(path) => {
                session.mark_flushed(block);
                RECORDS_FLUSHED_TOTAL
                    .with_label_values(&[block.as_str()])
                    .inc_by(records.len() as u64);
                tracing::info!(
                    "Block {} results saved: session={}, records={}, path={}",
                    block,
                    session.id(),
                    records.len(),
                    path.display()
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    "Failed to save block {} results: session={}, error={}",
                    block,
                    session.id(),
                    e
                );
                Err(e.into())
            }
        }
    }

    async fn finish(&self, session_id: Uuid) {
        if self.state.sessions.write().await.remove(&session_id).is_some() {
            SESSIONS_TOTAL.with_label_values(&["completed"]).inc();
            SESSIONS_ACTIVE.dec();
            tracing::info!("Session completed: session={}", session_id);
        }
    }

    pub async fn current_audio(&self, session_id: Uuid) -> Result<Option<Arc<AudioClip>>> {
        let handle = self.handle(session_id).await?;
        Ok(handle.voice.current_clip())
    }

    pub async fn stop_audio(&self, session_id: Uuid) -> Result<()> {
        let handle = self.handle(session_id).await?;
        handle.voice.stop();
        Ok(())
    }
}
