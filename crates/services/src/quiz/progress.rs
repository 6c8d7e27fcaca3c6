use trivia_core::{QuizSnapshot, QuizStatus};

/// Aggregated view of quiz progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

impl QuizProgress {
    #[must_use]
    pub fn from_snapshot(snapshot: &QuizSnapshot) -> Self {
        let total = snapshot.total();
        let answered = match snapshot.status {
            QuizStatus::Active => {
                snapshot.current_index + usize::from(snapshot.selected_key.is_some())
            }
            QuizStatus::Completed => total,
            _ => 0,
        };
        Self {
            total,
            answered,
            remaining: total.saturating_sub(answered),
            is_complete: snapshot.status == QuizStatus::Completed,
        }
    }
}
