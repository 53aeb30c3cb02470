mod catalog;
mod ids;
mod question;
mod session;
mod settings;

pub use catalog::Catalog;
pub use ids::{ParseIdError, SessionId};
pub use question::{FALSE_TOKEN, QuestionError, QuestionKind, QuestionRecord, TRUE_TOKEN};
pub(crate) use question::option_label;
pub use session::{AnswerOutcome, FinalScore, SessionState, SessionStateError};
pub use settings::{QuizSettings, SettingsError};
