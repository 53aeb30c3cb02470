#![forbid(unsafe_code)]

pub mod error;
pub mod sessions;

pub use quiz_core::Clock;

pub use error::SessionError;
pub use sessions::{
    QuestionView, QuizProgress, QuizService, QuizStep, SubmitResult, sample_questions,
    start_session,
};
