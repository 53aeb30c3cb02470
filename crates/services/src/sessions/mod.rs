mod plan;
mod progress;
mod service;
mod view;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use plan::{sample_questions, start_session};
pub use progress::QuizProgress;
pub use service::QuizService;
pub use view::{QuestionView, QuizStep, SubmitResult};
