mod progress;
mod workflow;

// Public API of the quiz subsystem.
pub use progress::QuizProgress;
pub use workflow::QuizLoopService;
