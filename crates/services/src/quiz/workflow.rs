use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info};
use trivia_core::model::{QuizResult, QuizSettings};
use trivia_core::{
    Clock, HistoryTracker, LoadOutcome, QuizSession, QuizSnapshot, QuizStatus, SessionError,
};

use super::progress::QuizProgress;
use crate::config::{DEFAULT_REQUEST_TIMEOUT, DEFAULT_TOPIC_HINTS};
use crate::error::ProviderError;
use crate::question_source::{QuestionRequest, QuestionSource};

struct QuizState {
    session: QuizSession,
    history: HistoryTracker,
}

/// Orchestrates quiz loading and answering for a single live session.
///
/// The session and its history are shared behind a mutex that is never held
/// across the provider call. Cloning the service shares the same session.
#[derive(Clone)]
pub struct QuizLoopService {
    source: Arc<dyn QuestionSource>,
    state: Arc<Mutex<QuizState>>,
    topic_hints: String,
    timeout: Duration,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(source: Arc<dyn QuestionSource>, settings: QuizSettings) -> Self {
        Self {
            source,
            state: Arc::new(Mutex::new(QuizState {
                session: QuizSession::new(settings),
                history: HistoryTracker::with_capacity(settings.history_capacity()),
            })),
            topic_hints: DEFAULT_TOPIC_HINTS.to_owned(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_topic_hints(mut self, topic_hints: impl Into<String>) -> Self {
        self.topic_hints = topic_hints.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_clock(self, clock: Clock) -> Self {
        {
            let mut state = self.lock();
            let session = std::mem::take(&mut state.session);
            state.session = session.with_clock(clock);
        }
        self
    }

    fn lock(&self) -> MutexGuard<'_, QuizState> {
        // Session transitions never panic mid-update, so a poisoned guard is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load a fresh quiz, superseding any load still in flight.
    ///
    /// Provider failures and timeouts end in `QuizStatus::Failed`; they are not
    /// returned as errors. If a newer call started while this one was waiting,
    /// its batch is discarded and the snapshot reflects the newer load.
    pub async fn start_new_quiz(&self) -> QuizSnapshot {
        let (ticket, request) = {
            let mut state = self.lock();
            let ticket = state.session.begin_load();
            let settings = *state.session.settings();
            let request = QuestionRequest {
                topic_hints: self.topic_hints.clone(),
                exclude_texts: state.history.recent_sample(settings.exclusion_sample()),
                count: settings.batch_size(),
            };
            (ticket, request)
        };

        info!(
            generation = ticket.generation(),
            excluded = request.exclude_texts.len(),
            "requesting questions"
        );
        let fetched = match tokio::time::timeout(self.timeout, self.source.fetch(&request)).await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.timeout)),
        };

        let mut state = self.lock();
        let QuizState { session, history } = &mut *state;
        match session.finish_load(ticket, fetched, history) {
            LoadOutcome::Stale => info!(
                generation = ticket.generation(),
                "ignored questions from a superseded request"
            ),
            LoadOutcome::Loaded {
                accepted,
                duplicates,
            } => info!(accepted, duplicates, "quiz ready"),
            LoadOutcome::Failed(_) => {}
        }
        session.snapshot()
    }

    /// Answer the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if no question is active, the question was
    /// already answered, or `key` is not one of its options.
    pub fn submit_answer(&self, key: char) -> Result<bool, SessionError> {
        let result = self.lock().session.submit_answer(key);
        if let Err(err) = &result {
            debug!(%key, error = %err, "answer rejected");
        }
        result
    }

    /// Move to the next question or finish the quiz.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` when there is no quiz in progress.
    pub fn advance(&self) -> Result<QuizStatus, SessionError> {
        let result = self.lock().session.advance();
        if let Err(err) = &result {
            debug!(error = %err, "advance rejected");
        }
        result
    }

    #[must_use]
    pub fn snapshot(&self) -> QuizSnapshot {
        self.lock().session.snapshot()
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        QuizProgress::from_snapshot(&self.snapshot())
    }

    #[must_use]
    pub fn result(&self) -> Option<QuizResult> {
        self.lock().session.result()
    }

    /// Number of question texts remembered for duplicate suppression.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    #[must_use]
    pub fn recent_history(&self, n: usize) -> Vec<String> {
        self.lock().history.recent_sample(n)
    }
}
