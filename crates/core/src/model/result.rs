use chrono::{DateTime, Utc};

/// Encouragement band for a finished quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultTier {
    /// Every question correct.
    Perfect,
    /// At least 70%.
    Great,
    /// At least 40%.
    Good,
    KeepTrying,
}

impl ResultTier {
    #[must_use]
    pub fn from_score(score: usize, total: usize) -> Self {
        if total == 0 {
            return Self::KeepTrying;
        }
        // Integer comparisons avoid float rounding at the 70% / 40% edges.
        if score >= total {
            Self::Perfect
        } else if score * 10 >= total * 7 {
            Self::Great
        } else if score * 10 >= total * 4 {
            Self::Good
        } else {
            Self::KeepTrying
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Perfect => "Amazing! You're a trivia superstar!",
            Self::Great => "Great job! You've got a super brain!",
            Self::Good => "Good effort! Keep practicing, you'll get even better!",
            Self::KeepTrying => {
                "You tried your best! Every day is a chance to learn something new!"
            }
        }
    }
}

/// Final tally of a completed quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResult {
    score: usize,
    total: usize,
    tier: ResultTier,
    started_at: Option<DateTime<Utc>>,
    completed_at: DateTime<Utc>,
}

impl QuizResult {
    #[must_use]
    pub fn new(
        score: usize,
        total: usize,
        started_at: Option<DateTime<Utc>>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        let score = score.min(total);
        Self {
            score,
            total,
            tier: ResultTier::from_score(score, total),
            started_at,
            completed_at,
        }
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn tier(&self) -> ResultTier {
        self.tier
    }

    /// Whole-number percentage, rounded down.
    #[must_use]
    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        u32::try_from(self.score * 100 / self.total).unwrap_or(100)
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}
