//! Bounded record of question texts already served in this process.

use std::collections::VecDeque;

use crate::model::Question;

/// Default number of remembered question texts.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
struct HistoryEntry {
    text: String,
    folded: String,
}

/// Order-preserving, capacity-bounded log of served questions.
///
/// Entries are evicted oldest-first once the capacity is exceeded. Identity is
/// the lowercased question text; the log is only used to suppress repeats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTracker {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for HistoryTracker {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A tracker remembering at most `capacity` texts (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append every question, then drop the oldest entries beyond capacity.
    pub fn record<'a, I>(&mut self, questions: I)
    where
        I: IntoIterator<Item = &'a Question>,
    {
        for question in questions {
            self.entries.push_back(HistoryEntry {
                text: question.text().to_owned(),
                folded: question.identity(),
            });
        }
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Texts of the last `n` entries in chronological order.
    #[must_use]
    pub fn recent_sample(&self, n: usize) -> Vec<String> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries
            .iter()
            .skip(skip)
            .map(|entry| entry.text.clone())
            .collect()
    }

    /// True if a logged text equals `question`'s text, ignoring case.
    #[must_use]
    pub fn is_duplicate(&self, question: &Question) -> bool {
        let folded = question.identity();
        self.entries.iter().any(|entry| entry.folded == folded)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
