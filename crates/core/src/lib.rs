#![forbid(unsafe_code)]

pub mod history;
pub mod model;
pub mod session;
pub mod time;

pub use history::HistoryTracker;
pub use session::{
    LoadFailure, LoadOutcome, LoadTicket, QuizSession, QuizSnapshot, QuizStatus, SessionError,
};
pub use time::Clock;
