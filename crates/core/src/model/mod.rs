pub(crate) mod question;
mod result;
mod settings;

pub use question::{AnswerOption, OPTION_COUNT, Question, QuestionError};
pub use result::{QuizResult, ResultTier};
pub use settings::{QuizSettings, SettingsError};
