use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("batch size must be > 0")]
    InvalidBatchSize,

    #[error("history capacity must be > 0")]
    InvalidHistoryCapacity,

    #[error("exclusion sample must be > 0")]
    InvalidExclusionSample,

    #[error("exclusion sample ({sample}) cannot exceed history capacity ({capacity})")]
    SampleExceedsCapacity { sample: usize, capacity: usize },
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Sizing knobs for a quiz run and its duplicate-suppression history.
///
/// Defaults:
/// - 10 questions per quiz
/// - 50 remembered question texts
/// - the 20 most recent texts sent to the provider as exclusions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizSettings {
    batch_size: usize,
    history_capacity: usize,
    exclusion_sample: usize,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            history_capacity: 50,
            exclusion_sample: 20,
        }
    }
}

impl QuizSettings {
    /// Creates custom quiz settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if any value is zero or the exclusion sample
    /// is larger than the history it samples from.
    pub fn new(
        batch_size: usize,
        history_capacity: usize,
        exclusion_sample: usize,
    ) -> Result<Self, SettingsError> {
        if batch_size == 0 {
            return Err(SettingsError::InvalidBatchSize);
        }
        if history_capacity == 0 {
            return Err(SettingsError::InvalidHistoryCapacity);
        }
        if exclusion_sample == 0 {
            return Err(SettingsError::InvalidExclusionSample);
        }
        if exclusion_sample > history_capacity {
            return Err(SettingsError::SampleExceedsCapacity {
                sample: exclusion_sample,
                capacity: history_capacity,
            });
        }

        Ok(Self {
            batch_size,
            history_capacity,
            exclusion_sample,
        })
    }

    /// Maximum number of questions in one quiz.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    #[must_use]
    pub fn history_capacity(&self) -> usize {
        self.history_capacity
    }

    /// How many recent history entries are offered to the provider as exclusions.
    #[must_use]
    pub fn exclusion_sample(&self) -> usize {
        self.exclusion_sample
    }
}
