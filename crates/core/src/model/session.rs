use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::{QuestionRecord, QuizSettings};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionStateError {
    #[error("current index {index} is past the {total} selected questions")]
    IndexOutOfRange { index: usize, total: usize },

    #[error("score {score} exceeds answered count {answered}")]
    ScoreOutOfRange { score: usize, answered: usize },

    #[error("question_started_at is before started_at")]
    InvalidTimeRange,
}

/// What happened to a submitted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerOutcome {
    Correct,
    Incorrect,
    /// Arrived after the per-question budget; counted as unanswered.
    TimedOut,
    /// The session had already run past its total budget; nothing changed.
    Expired,
    /// Every selected question was already answered; nothing changed.
    Ignored,
    /// Aimed at a question other than the current one (replay or double post);
    /// nothing changed.
    Stale,
}

impl AnswerOutcome {
    /// Returns true when the submission advanced the session.
    #[must_use]
    pub fn advanced(self) -> bool {
        matches!(self, Self::Correct | Self::Incorrect | Self::TimedOut)
    }
}

/// Score reported once a session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalScore {
    pub score: usize,
    pub total: usize,
}

impl fmt::Display for FinalScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.score, self.total)
    }
}

/// Progress of one quiz-taker through a fixed sample of questions.
///
/// The sample is chosen once at creation and never reordered. Each accepted
/// submission moves `current_index` forward by one; `score` counts the correct ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    started_at: DateTime<Utc>,
    question_started_at: DateTime<Utc>,
    selected: Vec<QuestionRecord>,
    current_index: usize,
    score: usize,
}

impl SessionState {
    /// Starts a session over an already sampled, ordered set of questions.
    #[must_use]
    pub fn new(selected: Vec<QuestionRecord>, started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            question_started_at: started_at,
            selected,
            current_index: 0,
            score: 0,
        }
    }

    /// Rehydrate a session from stored state.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError` if the counters or timestamps are inconsistent.
    pub fn from_persisted(
        started_at: DateTime<Utc>,
        question_started_at: DateTime<Utc>,
        selected: Vec<QuestionRecord>,
        current_index: usize,
        score: usize,
    ) -> Result<Self, SessionStateError> {
        if current_index > selected.len() {
            return Err(SessionStateError::IndexOutOfRange {
                index: current_index,
                total: selected.len(),
            });
        }
        if score > current_index {
            return Err(SessionStateError::ScoreOutOfRange {
                score,
                answered: current_index,
            });
        }
        if question_started_at < started_at {
            return Err(SessionStateError::InvalidTimeRange);
        }

        Ok(Self {
            started_at,
            question_started_at,
            selected,
            current_index,
            score,
        })
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When the current question was first served.
    #[must_use]
    pub fn question_started_at(&self) -> DateTime<Utc> {
        self.question_started_at
    }

    #[must_use]
    pub fn selected(&self) -> &[QuestionRecord] {
        &self.selected
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.selected.len()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&QuestionRecord> {
        self.selected.get(self.current_index)
    }

    /// True once every selected question has been answered.
    #[must_use]
    pub fn all_answered(&self) -> bool {
        self.current_index >= self.selected.len()
    }

    /// Score the current question and advance.
    ///
    /// A no-op returning `AnswerOutcome::Ignored` once all questions are answered.
    pub fn submit_answer(&mut self, raw_answer: &str, now: DateTime<Utc>) -> AnswerOutcome {
        let Some(question) = self.current_question() else {
            return AnswerOutcome::Ignored;
        };

        let outcome = if question.accepts(raw_answer) {
            self.score += 1;
            AnswerOutcome::Correct
        } else {
            AnswerOutcome::Incorrect
        };
        self.advance(now);
        outcome
    }

    /// Like [`submit_answer`](Self::submit_answer), but honours the time budgets.
    ///
    /// An expired session is left untouched. A submission later than the per-question
    /// budget (when enforced) advances without scoring.
    pub fn submit_answer_within(
        &mut self,
        raw_answer: &str,
        now: DateTime<Utc>,
        settings: &QuizSettings,
    ) -> AnswerOutcome {
        if self.all_answered() {
            return AnswerOutcome::Ignored;
        }
        if self.is_expired(now, settings.total_time_budget()) {
            return AnswerOutcome::Expired;
        }
        if settings.enforce_question_time()
            && now - self.question_started_at > settings.question_time_budget()
        {
            self.advance(now);
            return AnswerOutcome::TimedOut;
        }
        self.submit_answer(raw_answer, now)
    }

    fn advance(&mut self, now: DateTime<Utc>) {
        self.current_index += 1;
        self.question_started_at = now.max(self.started_at);
    }

    /// True once `now - started_at` reaches the total budget.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, total_budget: Duration) -> bool {
        now - self.started_at >= total_budget
    }

    /// True when every question is answered or the total budget is spent.
    #[must_use]
    pub fn is_complete(&self, now: DateTime<Utc>, total_budget: Duration) -> bool {
        self.all_answered() || self.is_expired(now, total_budget)
    }

    #[must_use]
    pub fn final_score(&self) -> FinalScore {
        FinalScore {
            score: self.score,
            total: self.selected.len(),
        }
    }

    /// Time left before the whole session expires, floored at zero.
    #[must_use]
    pub fn remaining_total(&self, now: DateTime<Utc>, total_budget: Duration) -> Duration {
        (self.started_at + total_budget - now).max(Duration::zero())
    }

    /// Time left on the current question, floored at zero.
    #[must_use]
    pub fn remaining_question(&self, now: DateTime<Utc>, question_budget: Duration) -> Duration {
        (self.question_started_at + question_budget - now).max(Duration::zero())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
