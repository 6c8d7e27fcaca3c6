#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod generator_service;
pub mod prompt;
pub mod question_source;
pub mod quiz;

pub use trivia_core::Clock;

pub use config::GeneratorConfig;
pub use error::ProviderError;
pub use generator_service::GeneratorService;
pub use question_source::{QuestionRequest, QuestionSource};
pub use quiz::{QuizLoopService, QuizProgress};
