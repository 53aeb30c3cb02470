use thiserror::Error;

use crate::model::{QuestionError, SessionStateError, SettingsError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    SessionState(#[from] SessionStateError),
}
