use chrono::{DateTime, Utc};
use serde::Serialize;

use quiz_core::model::{AnswerOutcome, FinalScore, QuestionRecord, QuizSettings, SessionState};

use super::progress::QuizProgress;

/// Everything a shell needs to render the current question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    /// Zero-based index; send it back with the answer.
    pub index: usize,
    pub question: QuestionRecord,
    pub choices: Vec<String>,
    pub progress: QuizProgress,
    pub remaining_total_secs: i64,
    /// `None` when the per-question budget is not enforced.
    pub remaining_question_secs: Option<i64>,
}

impl QuestionView {
    pub(crate) fn build(
        state: &SessionState,
        settings: &QuizSettings,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let question = state.current_question()?.clone();
        let remaining_question_secs = settings.enforce_question_time().then(|| {
            state
                .remaining_question(now, settings.question_time_budget())
                .num_seconds()
        });

        Some(Self {
            index: state.current_index(),
            choices: question.choices(),
            question,
            progress: QuizProgress::of(state),
            remaining_total_secs: state
                .remaining_total(now, settings.total_time_budget())
                .num_seconds(),
            remaining_question_secs,
        })
    }

    /// One-based position for display.
    #[must_use]
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

/// Where a session stands after a read or a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum QuizStep {
    Question(QuestionView),
    /// Reported once; the session is cleared afterwards.
    Finished(FinalScore),
}

/// Result of submitting an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitResult {
    pub outcome: AnswerOutcome,
    pub next: QuizStep,
}
