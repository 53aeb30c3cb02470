use quiz_core::model::SessionState;
use serde::Serialize;

/// Aggregated view of session progress, useful for a shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub score: usize,
}

impl QuizProgress {
    #[must_use]
    pub fn of(state: &SessionState) -> Self {
        Self {
            total: state.total(),
            answered: state.current_index(),
            remaining: state.total().saturating_sub(state.current_index()),
            score: state.score(),
        }
    }
}
