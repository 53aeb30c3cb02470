use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("question count must be > 0")]
    InvalidQuestionCount,

    #[error("total time budget must be > 0 seconds")]
    InvalidTotalTime,

    #[error("question time budget must be between 5 and 3600 seconds")]
    InvalidQuestionTime,
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Knobs for one placement test.
///
/// Deserialization applies the same range checks as [`QuizSettings::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSettings")]
pub struct QuizSettings {
    question_count: u32,
    total_time_secs: u32,
    question_time_secs: u32,
    enforce_question_time: bool,
}

impl QuizSettings {
    pub const DEFAULT_QUESTION_COUNT: u32 = 40;
    pub const DEFAULT_TOTAL_TIME_SECS: u32 = 5_400;
    pub const DEFAULT_QUESTION_TIME_SECS: u32 = 120;

    /// Placement test defaults:
    /// - 40 questions
    /// - 90 minutes overall
    /// - 2 minutes per question, enforced on submission
    #[must_use]
    pub fn placement_defaults() -> Self {
        Self {
            question_count: Self::DEFAULT_QUESTION_COUNT,
            total_time_secs: Self::DEFAULT_TOTAL_TIME_SECS,
            question_time_secs: Self::DEFAULT_QUESTION_TIME_SECS,
            enforce_question_time: true,
        }
    }

    /// Creates custom settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if a count or budget is out of range.
    pub fn new(
        question_count: u32,
        total_time_secs: u32,
        question_time_secs: u32,
        enforce_question_time: bool,
    ) -> Result<Self, SettingsError> {
        if question_count == 0 {
            return Err(SettingsError::InvalidQuestionCount);
        }
        if total_time_secs == 0 {
            return Err(SettingsError::InvalidTotalTime);
        }
        if !(5..=3_600).contains(&question_time_secs) {
            return Err(SettingsError::InvalidQuestionTime);
        }

        Ok(Self {
            question_count,
            total_time_secs,
            question_time_secs,
            enforce_question_time,
        })
    }

    /// Returns a copy with a different question count.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidQuestionCount` for zero.
    pub fn with_question_count(self, question_count: u32) -> Result<Self, SettingsError> {
        Self::new(
            question_count,
            self.total_time_secs,
            self.question_time_secs,
            self.enforce_question_time,
        )
    }

    #[must_use]
    pub fn with_enforce_question_time(mut self, enforce: bool) -> Self {
        self.enforce_question_time = enforce;
        self
    }

    #[must_use]
    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    #[must_use]
    pub fn total_time_secs(&self) -> u32 {
        self.total_time_secs
    }

    #[must_use]
    pub fn question_time_secs(&self) -> u32 {
        self.question_time_secs
    }

    #[must_use]
    pub fn enforce_question_time(&self) -> bool {
        self.enforce_question_time
    }

    #[must_use]
    pub fn total_time_budget(&self) -> Duration {
        Duration::seconds(i64::from(self.total_time_secs))
    }

    #[must_use]
    pub fn question_time_budget(&self) -> Duration {
        Duration::seconds(i64::from(self.question_time_secs))
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self::placement_defaults()
    }
}

#[derive(Deserialize)]
struct RawSettings {
    question_count: u32,
    total_time_secs: u32,
    question_time_secs: u32,
    enforce_question_time: bool,
}

impl TryFrom<RawSettings> for QuizSettings {
    type Error = SettingsError;

    fn try_from(raw: RawSettings) -> Result<Self, Self::Error> {
        Self::new(
            raw.question_count,
            raw.total_time_secs,
            raw.question_time_secs,
            raw.enforce_question_time,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_placement_test() {
        let settings = QuizSettings::default();
        assert_eq!(settings.question_count(), 40);
        assert_eq!(settings.total_time_budget(), Duration::minutes(90));
        assert_eq!(settings.question_time_budget(), Duration::seconds(120));
        assert!(settings.enforce_question_time());
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert_eq!(
            QuizSettings::new(0, 5_400, 120, true).unwrap_err(),
            SettingsError::InvalidQuestionCount
        );
        assert_eq!(
            QuizSettings::new(40, 0, 120, true).unwrap_err(),
            SettingsError::InvalidTotalTime
        );
        assert_eq!(
            QuizSettings::new(40, 5_400, 4, true).unwrap_err(),
            SettingsError::InvalidQuestionTime
        );
    }

    #[test]
    fn with_question_count_keeps_budgets() {
        let settings = QuizSettings::default().with_question_count(10).unwrap();
        assert_eq!(settings.question_count(), 10);
        assert_eq!(settings.total_time_secs(), 5_400);
        assert!(QuizSettings::default().with_question_count(0).is_err());
    }

    #[test]
    fn deserialization_applies_range_checks() {
        let zero = r#"{"question_count":0,"total_time_secs":5400,"question_time_secs":120,"enforce_question_time":true}"#;
        let err = serde_json::from_str::<QuizSettings>(zero).unwrap_err();
        assert!(err.to_string().contains("question count must be > 0"));

        let json = serde_json::to_string(&QuizSettings::default()).unwrap();
        let back: QuizSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, QuizSettings::default());
    }
}
