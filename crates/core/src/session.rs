use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::history::HistoryTracker;
use crate::model::{Question, QuizResult, QuizSettings};
use crate::time::Clock;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Rejected quiz operations. State is left untouched whenever one is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no active question (quiz is {status})")]
    NotActive { status: QuizStatus },

    #[error("current question has already been answered")]
    AlreadyAnswered,

    #[error("option {key:?} is not offered by the current question")]
    UnknownOption { key: char },
}

/// Why a load ended in `QuizStatus::Failed`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LoadFailure {
    #[error("{0}")]
    Provider(String),

    #[error("no new questions available ({received} received, {duplicates} already seen)")]
    InsufficientQuestions { received: usize, duplicates: usize },
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizStatus {
    Empty,
    Loading,
    Active,
    Completed,
    Failed,
}

impl fmt::Display for QuizStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Empty => "empty",
            Self::Loading => "loading",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Empty,
    Loading,
    Active {
        current: usize,
        selected: Option<char>,
    },
    Completed {
        completed_at: DateTime<Utc>,
    },
    Failed {
        detail: String,
    },
}

impl Phase {
    fn status(&self) -> QuizStatus {
        match self {
            Self::Empty => QuizStatus::Empty,
            Self::Loading => QuizStatus::Loading,
            Self::Active { .. } => QuizStatus::Active,
            Self::Completed { .. } => QuizStatus::Completed,
            Self::Failed { .. } => QuizStatus::Failed,
        }
    }
}

//
// ─── LOADING ───────────────────────────────────────────────────────────────────
//

/// Identifies one load request. Only the ticket from the most recent
/// `begin_load` can complete a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What `finish_load` did with a fetched batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { accepted: usize, duplicates: usize },
    Failed(LoadFailure),
    /// A newer load superseded this one; the batch was ignored.
    Stale,
}

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

/// Read-only copy of the session for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSnapshot {
    pub status: QuizStatus,
    pub questions: Vec<Question>,
    /// Position of the current question; equals `questions.len()` once completed.
    pub current_index: usize,
    pub score: usize,
    pub error_detail: Option<String>,
    /// Key chosen for the current question, if it has been answered.
    pub selected_key: Option<char>,
}

impl QuizSnapshot {
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.status == QuizStatus::Active {
            self.questions.get(self.current_index)
        } else {
            None
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory quiz state machine.
///
/// `Empty → Loading → {Active | Failed}`, `Active → Active | Completed` on
/// advance, and any state back to `Loading` on a new load. Loading is split
/// into `begin_load` / `finish_load` so the provider call can happen outside
/// the session; results carrying an outdated ticket are dropped.
#[derive(Debug, Clone)]
pub struct QuizSession {
    settings: QuizSettings,
    clock: Clock,
    phase: Phase,
    questions: Vec<Question>,
    score: usize,
    generation: u64,
    started_at: Option<DateTime<Utc>>,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new(QuizSettings::default())
    }
}

impl QuizSession {
    #[must_use]
    pub fn new(settings: QuizSettings) -> Self {
        Self {
            settings,
            clock: Clock::default(),
            phase: Phase::Empty,
            questions: Vec::new(),
            score: 0,
            generation: 0,
            started_at: None,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn status(&self) -> QuizStatus {
        self.phase.status()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.score
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        match &self.phase {
            Phase::Active { current, .. } => *current,
            Phase::Completed { .. } => self.questions.len(),
            _ => 0,
        }
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        match &self.phase {
            Phase::Active { current, .. } => self.questions.get(*current),
            _ => None,
        }
    }

    #[must_use]
    pub fn selected_key(&self) -> Option<char> {
        match &self.phase {
            Phase::Active { selected, .. } => *selected,
            _ => None,
        }
    }

    #[must_use]
    pub fn error_detail(&self) -> Option<&str> {
        match &self.phase {
            Phase::Failed { detail } => Some(detail),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self.phase, Phase::Completed { .. })
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        match &self.phase {
            Phase::Completed { completed_at } => Some(*completed_at),
            _ => None,
        }
    }

    /// Enter `Loading`, clearing questions, score, and error detail.
    ///
    /// Valid from every state. Any ticket handed out earlier becomes stale.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation = self.generation.wrapping_add(1);
        self.phase = Phase::Loading;
        self.questions.clear();
        self.score = 0;
        self.started_at = None;
        debug!(generation = self.generation, "quiz load started");
        LoadTicket {
            generation: self.generation,
        }
    }

    /// Apply the provider's answer to the load identified by `ticket`.
    ///
    /// Duplicates of `history` (and repeats within the batch) are dropped, the
    /// first `batch_size` survivors are committed and recorded in `history`.
    /// A batch with no survivors, or a provider error, moves the session to
    /// `Failed`. Stale tickets leave both the session and `history` untouched.
    pub fn finish_load<E: fmt::Display>(
        &mut self,
        ticket: LoadTicket,
        fetched: Result<Vec<Question>, E>,
        history: &mut HistoryTracker,
    ) -> LoadOutcome {
        if ticket.generation != self.generation || self.phase != Phase::Loading {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding superseded question batch"
            );
            return LoadOutcome::Stale;
        }

        let batch = match fetched {
            Ok(batch) => batch,
            Err(err) => return self.fail(LoadFailure::Provider(err.to_string())),
        };

        let limit = self.settings.batch_size();
        let received = batch.len();
        let mut accepted: Vec<Question> = Vec::with_capacity(limit.min(received));
        let mut duplicates = 0_usize;
        for question in batch {
            if accepted.len() == limit {
                break;
            }
            let identity = question.identity();
            let repeated = accepted.iter().any(|q| q.identity() == identity);
            if repeated || history.is_duplicate(&question) {
                duplicates += 1;
                continue;
            }
            accepted.push(question);
        }

        if accepted.is_empty() {
            return self.fail(LoadFailure::InsufficientQuestions {
                received,
                duplicates,
            });
        }
        if accepted.len() < limit {
            warn!(
                accepted = accepted.len(),
                requested = limit,
                duplicates,
                "accepting a partial quiz"
            );
        }

        history.record(&accepted);
        let count = accepted.len();
        self.questions = accepted;
        self.score = 0;
        self.started_at = Some(self.clock.now());
        self.phase = Phase::Active {
            current: 0,
            selected: None,
        };
        debug!(generation = self.generation, count, duplicates, "quiz loaded");

        LoadOutcome::Loaded {
            accepted: count,
            duplicates,
        }
    }

    fn fail(&mut self, failure: LoadFailure) -> LoadOutcome {
        warn!(generation = self.generation, error = %failure, "quiz load failed");
        self.questions.clear();
        self.score = 0;
        self.phase = Phase::Failed {
            detail: format!("Failed to load questions. Please try again. ({failure})"),
        };
        LoadOutcome::Failed(failure)
    }

    /// Answer the current question, returning whether `key` is correct.
    ///
    /// Each question accepts one answer; the score moves by at most one per question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` outside `Active`,
    /// `SessionError::AlreadyAnswered` on a repeat answer, and
    /// `SessionError::UnknownOption` if `key` is not one of the options.
    pub fn submit_answer(&mut self, key: char) -> Result<bool, SessionError> {
        let status = self.status();
        let Phase::Active { current, selected } = &mut self.phase else {
            return Err(SessionError::NotActive { status });
        };
        if selected.is_some() {
            return Err(SessionError::AlreadyAnswered);
        }
        let Some(question) = self.questions.get(*current) else {
            return Err(SessionError::NotActive { status });
        };
        if !question.has_option(key) {
            return Err(SessionError::UnknownOption { key });
        }

        *selected = Some(key);
        let correct = question.is_correct(key);
        if correct {
            self.score = (self.score + 1).min(self.questions.len());
        }
        Ok(correct)
    }

    /// Move to the next question, or to `Completed` from the last one.
    ///
    /// Calling it again once completed is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` in `Empty`, `Loading`, or `Failed`.
    pub fn advance(&mut self) -> Result<QuizStatus, SessionError> {
        let status = self.status();
        let len = self.questions.len();
        match &mut self.phase {
            Phase::Completed { .. } => return Ok(QuizStatus::Completed),
            Phase::Active { current, selected } if *current + 1 < len => {
                *current += 1;
                *selected = None;
                return Ok(QuizStatus::Active);
            }
            Phase::Active { .. } => {}
            _ => return Err(SessionError::NotActive { status }),
        }

        self.phase = Phase::Completed {
            completed_at: self.clock.now(),
        };
        debug!(score = self.score, total = len, "quiz completed");
        Ok(QuizStatus::Completed)
    }

    #[must_use]
    pub fn snapshot(&self) -> QuizSnapshot {
        QuizSnapshot {
            status: self.status(),
            questions: self.questions.clone(),
            current_index: self.current_index(),
            score: self.score,
            error_detail: self.error_detail().map(str::to_owned),
            selected_key: self.selected_key(),
        }
    }

    /// Final tally, available once the quiz is completed.
    #[must_use]
    pub fn result(&self) -> Option<QuizResult> {
        let completed_at = self.completed_at()?;
        Some(QuizResult::new(
            self.score,
            self.questions.len(),
            self.started_at,
            completed_at,
        ))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResultTier;
    use crate::model::question::tests::question;
    use crate::time::{fixed_clock, fixed_now};

    fn batch(prefix: &str, count: usize) -> Vec<Question> {
        (0..count)
            .map(|idx| question(&format!("{prefix} {idx}")))
            .collect()
    }

    fn loaded(count: usize) -> (QuizSession, HistoryTracker) {
        let mut session = QuizSession::default().with_clock(fixed_clock());
        let mut history = HistoryTracker::new();
        let ticket = session.begin_load();
        let outcome = session.finish_load::<String>(ticket, Ok(batch("Q", count)), &mut history);
        assert!(matches!(outcome, LoadOutcome::Loaded { .. }));
        (session, history)
    }

    fn assert_invariants(session: &QuizSession) {
        assert!(session.score() <= session.questions().len());
        if session.status() == QuizStatus::Active {
            assert!(session.current_index() < session.questions().len());
        }
    }

    #[test]
    fn new_session_is_empty() {
        let session = QuizSession::default();
        assert_eq!(session.status(), QuizStatus::Empty);
        assert!(session.questions().is_empty());
        assert_eq!(session.score(), 0);
        assert!(session.error_detail().is_none());
    }

    #[test]
    fn full_unique_batch_becomes_active() {
        let (session, history) = loaded(10);
        assert_eq!(session.status(), QuizStatus::Active);
        assert_eq!(session.questions().len(), 10);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.score(), 0);
        assert_eq!(session.started_at(), Some(fixed_now()));
        assert_eq!(history.len(), 10);
    }

    #[test]
    fn oversized_batch_is_truncated_to_batch_size() {
        let mut session = QuizSession::default();
        let mut history = HistoryTracker::new();
        let ticket = session.begin_load();
        session.finish_load::<String>(ticket, Ok(batch("Q", 14)), &mut history);

        assert_eq!(session.questions().len(), 10);
        assert_eq!(session.questions()[9].text(), "Q 9");
        assert_eq!(history.len(), 10);
    }

    #[test]
    fn history_duplicates_are_dropped() {
        let mut history = HistoryTracker::new();
        history.record(&batch("Q", 4));

        let mut session = QuizSession::default();
        let ticket = session.begin_load();
        let mut incoming = batch("q", 4);
        incoming.extend(batch("New", 6));
        let outcome = session.finish_load::<String>(ticket, Ok(incoming), &mut history);

        assert_eq!(
            outcome,
            LoadOutcome::Loaded {
                accepted: 6,
                duplicates: 4
            }
        );
        assert_eq!(session.status(), QuizStatus::Active);
        assert_eq!(session.questions().len(), 6);
        assert_eq!(history.len(), 10);
    }

    #[test]
    fn repeats_within_a_batch_are_dropped() {
        let mut session = QuizSession::default();
        let mut history = HistoryTracker::new();
        let ticket = session.begin_load();
        let incoming = vec![question("Same"), question("SAME"), question("Other")];
        session.finish_load::<String>(ticket, Ok(incoming), &mut history);

        assert_eq!(session.questions().len(), 2);
    }

    #[test]
    fn all_duplicates_fail_the_load() {
        let mut history = HistoryTracker::new();
        history.record(&batch("Q", 10));

        let mut session = QuizSession::default();
        let ticket = session.begin_load();
        let outcome = session.finish_load::<String>(ticket, Ok(batch("Q", 10)), &mut history);

        assert_eq!(
            outcome,
            LoadOutcome::Failed(LoadFailure::InsufficientQuestions {
                received: 10,
                duplicates: 10
            })
        );
        assert_eq!(session.status(), QuizStatus::Failed);
        assert!(session.questions().is_empty());
        assert!(!session.error_detail().unwrap_or_default().is_empty());
        assert_eq!(history.len(), 10);
    }

    #[test]
    fn provider_error_fails_with_detail() {
        let mut session = QuizSession::default();
        let mut history = HistoryTracker::new();
        let ticket = session.begin_load();
        let outcome = session.finish_load(
            ticket,
            Err::<Vec<Question>, _>("connection refused"),
            &mut history,
        );

        assert!(matches!(outcome, LoadOutcome::Failed(LoadFailure::Provider(_))));
        assert_eq!(session.status(), QuizStatus::Failed);
        assert!(session.questions().is_empty());
        let detail = session.error_detail().unwrap();
        assert!(detail.contains("connection refused"));
        assert!(history.is_empty());
    }

    #[test]
    fn stale_ticket_is_ignored() {
        let mut session = QuizSession::default();
        let mut history = HistoryTracker::new();
        let first = session.begin_load();
        let second = session.begin_load();
        assert_eq!(second.generation(), first.generation() + 1);
        assert_eq!(session.generation(), second.generation());

        let outcome = session.finish_load::<String>(second, Ok(batch("Second", 3)), &mut history);
        assert!(matches!(outcome, LoadOutcome::Loaded { accepted: 3, .. }));

        let outcome = session.finish_load::<String>(first, Ok(batch("First", 10)), &mut history);
        assert_eq!(outcome, LoadOutcome::Stale);
        assert_eq!(session.questions().len(), 3);
        assert_eq!(session.questions()[0].text(), "Second 0");
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn stale_failure_does_not_overwrite_active_session() {
        let mut session = QuizSession::default();
        let mut history = HistoryTracker::new();
        let first = session.begin_load();
        let second = session.begin_load();
        session.finish_load::<String>(second, Ok(batch("Q", 2)), &mut history);

        let outcome = session.finish_load(first, Err::<Vec<Question>, _>("timeout"), &mut history);
        assert_eq!(outcome, LoadOutcome::Stale);
        assert_eq!(session.status(), QuizStatus::Active);
    }

    #[test]
    fn ticket_cannot_be_applied_twice() {
        let mut session = QuizSession::default();
        let mut history = HistoryTracker::new();
        let ticket = session.begin_load();
        session.finish_load::<String>(ticket, Ok(batch("Q", 2)), &mut history);
        let outcome = session.finish_load::<String>(ticket, Ok(batch("R", 2)), &mut history);

        assert_eq!(outcome, LoadOutcome::Stale);
        assert_eq!(session.questions()[0].text(), "Q 0");
    }

    #[test]
    fn correct_answer_scores_once() {
        let (mut session, _) = loaded(3);
        assert_eq!(session.submit_answer('C'), Ok(true));
        assert_eq!(session.score(), 1);

        assert_eq!(
            session.submit_answer('C'),
            Err(SessionError::AlreadyAnswered)
        );
        assert_eq!(session.score(), 1);
        assert_eq!(session.selected_key(), Some('C'));
    }

    #[test]
    fn wrong_answer_then_right_answer_does_not_score() {
        let (mut session, _) = loaded(3);
        assert_eq!(session.submit_answer('A'), Ok(false));
        assert_eq!(
            session.submit_answer('C'),
            Err(SessionError::AlreadyAnswered)
        );
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn unknown_option_is_rejected_without_consuming_the_answer() {
        let (mut session, _) = loaded(1);
        assert_eq!(
            session.submit_answer('Z'),
            Err(SessionError::UnknownOption { key: 'Z' })
        );
        assert_eq!(session.selected_key(), None);
        assert_eq!(session.submit_answer('C'), Ok(true));
    }

    #[test]
    fn advance_walks_to_completion_and_stays_there() {
        let (mut session, _) = loaded(2);
        session.submit_answer('C').unwrap();
        assert_eq!(session.advance(), Ok(QuizStatus::Active));
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.selected_key(), None);

        session.submit_answer('A').unwrap();
        assert_eq!(session.advance(), Ok(QuizStatus::Completed));
        assert!(session.is_complete());
        assert_eq!(session.current_index(), 2);

        assert_eq!(session.advance(), Ok(QuizStatus::Completed));
        assert_eq!(session.score(), 1);
        assert_eq!(session.completed_at(), Some(fixed_now()));
    }

    #[test]
    fn operations_outside_active_are_rejected() {
        let mut session = QuizSession::default();
        assert_eq!(
            session.advance(),
            Err(SessionError::NotActive {
                status: QuizStatus::Empty
            })
        );
        session.begin_load();
        assert!(session.submit_answer('A').is_err());

        let mut history = HistoryTracker::new();
        let ticket = session.begin_load();
        session.finish_load(ticket, Err::<Vec<Question>, _>("boom"), &mut history);
        assert_eq!(
            session.advance(),
            Err(SessionError::NotActive {
                status: QuizStatus::Failed
            })
        );
        assert!(session.submit_answer('A').is_err());
        assert_eq!(session.status(), QuizStatus::Failed);
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn answering_after_completion_is_rejected() {
        let (mut session, _) = loaded(1);
        session.submit_answer('C').unwrap();
        session.advance().unwrap();
        assert_eq!(
            session.submit_answer('C'),
            Err(SessionError::NotActive {
                status: QuizStatus::Completed
            })
        );
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn restart_clears_progress_but_keeps_history() {
        let (mut session, mut history) = loaded(3);
        session.submit_answer('C').unwrap();

        let ticket = session.begin_load();
        assert_eq!(session.status(), QuizStatus::Loading);
        assert!(session.questions().is_empty());
        assert_eq!(session.score(), 0);

        session.finish_load::<String>(ticket, Ok(batch("Next", 4)), &mut history);
        assert_eq!(session.questions().len(), 4);
        assert_eq!(history.len(), 7);
    }

    #[test]
    fn score_stays_in_bounds_for_mixed_operation_sequences() {
        let keys = ['C', 'A', 'C', 'Z', 'B', 'C'];
        for seed in 0..keys.len() {
            let (mut session, _) = loaded(3);
            for step in 0..12 {
                let key = keys[(seed + step) % keys.len()];
                if (seed + step) % 3 == 0 {
                    let _ = session.advance();
                } else {
                    let _ = session.submit_answer(key);
                }
                assert_invariants(&session);
            }
        }
    }

    #[test]
    fn result_reports_tier_after_completion() {
        let (mut session, _) = loaded(2);
        assert!(session.result().is_none());
        session.submit_answer('C').unwrap();
        session.advance().unwrap();
        session.submit_answer('C').unwrap();
        session.advance().unwrap();

        let result = session.result().unwrap();
        assert_eq!(result.score(), 2);
        assert_eq!(result.total(), 2);
        assert_eq!(result.tier(), ResultTier::Perfect);
        assert_eq!(result.started_at(), Some(fixed_now()));
    }

    #[test]
    fn snapshot_mirrors_session() {
        let (mut session, _) = loaded(2);
        session.submit_answer('B').unwrap();
        let snapshot = session.snapshot();

        assert_eq!(snapshot.status, QuizStatus::Active);
        assert_eq!(snapshot.total(), 2);
        assert_eq!(snapshot.selected_key, Some('B'));
        assert_eq!(
            snapshot.current_question().map(Question::text),
            Some("Q 0")
        );
        assert!(snapshot.error_detail.is_none());
    }
}
