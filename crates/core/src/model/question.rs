use thiserror::Error;

/// Number of options every question carries.
pub const OPTION_COUNT: usize = 4;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("expected 4 options, got {count}")]
    WrongOptionCount { count: usize },

    #[error("option key {key:?} appears more than once")]
    DuplicateKey { key: char },

    #[error("option {key:?} has empty text")]
    EmptyOptionText { key: char },

    #[error("correct key {key:?} does not match any option")]
    UnknownCorrectKey { key: char },
}

//
// ─── OPTION ────────────────────────────────────────────────────────────────────
//

/// One labelled choice of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOption {
    key: char,
    text: String,
}

impl AnswerOption {
    #[must_use]
    pub fn new(key: char, text: impl Into<String>) -> Self {
        Self {
            key,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn key(&self) -> char {
        self.key
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A validated multiple-choice trivia question.
///
/// Always has exactly four options with unique keys, and `correct_key`
/// names exactly one of them. There are no setters; a question is
/// immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    text: String,
    options: Vec<AnswerOption>,
    correct_key: char,
}

impl Question {
    /// Build a question, validating the option layout.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the text is blank, the option count is not four,
    /// keys repeat, an option is blank, or `correct_key` names no option.
    pub fn new(
        text: impl Into<String>,
        options: Vec<AnswerOption>,
        correct_key: char,
    ) -> Result<Self, QuestionError> {
        let text = text.into().trim().to_owned();
        if text.is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if options.len() != OPTION_COUNT {
            return Err(QuestionError::WrongOptionCount {
                count: options.len(),
            });
        }
        for (idx, option) in options.iter().enumerate() {
            if options[..idx].iter().any(|prev| prev.key == option.key) {
                return Err(QuestionError::DuplicateKey { key: option.key });
            }
            if option.text.trim().is_empty() {
                return Err(QuestionError::EmptyOptionText { key: option.key });
            }
        }
        if !options.iter().any(|option| option.key == correct_key) {
            return Err(QuestionError::UnknownCorrectKey { key: correct_key });
        }

        Ok(Self {
            text,
            options,
            correct_key,
        })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[AnswerOption] {
        &self.options
    }

    #[must_use]
    pub fn correct_key(&self) -> char {
        self.correct_key
    }

    /// The option marked as correct.
    #[must_use]
    pub fn correct_option(&self) -> &AnswerOption {
        // `new` guarantees the key is present; fall back to the first option regardless.
        self.option(self.correct_key)
            .unwrap_or(&self.options[0])
    }

    #[must_use]
    pub fn option(&self, key: char) -> Option<&AnswerOption> {
        self.options.iter().find(|option| option.key == key)
    }

    #[must_use]
    pub fn has_option(&self, key: char) -> bool {
        self.option(key).is_some()
    }

    #[must_use]
    pub fn is_correct(&self, key: char) -> bool {
        key == self.correct_key
    }

    /// Lowercased text used for identity comparisons.
    #[must_use]
    pub fn identity(&self) -> String {
        self.text.to_lowercase()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
