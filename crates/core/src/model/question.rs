use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Accepted answer for a true statement.
pub const TRUE_TOKEN: &str = "Vrai";
/// Accepted answer for a false statement.
pub const FALSE_TOKEN: &str = "Faux";

/// Option labels recognised at the start of a line, in display order.
pub(crate) const OPTION_LABELS: [char; 4] = ['A', 'B', 'C', 'D'];

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Reasons a candidate record is refused admission to the catalog.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("level is missing or empty")]
    MissingLevel,

    #[error("type is missing or empty")]
    MissingKind,

    #[error("question text is missing or empty")]
    MissingPrompt,

    #[error("answer is missing or empty")]
    MissingAnswer,

    #[error("answer {answer:?} does not match any option label")]
    NoMatchingOption { answer: String },
}

//
// ─── KIND ──────────────────────────────────────────────────────────────────────
//

/// Determines which answers a question accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionKind {
    MultipleChoice,
    TrueFalse,
}

impl QuestionKind {
    /// Normalizes a `Type:` token.
    ///
    /// `"MCQ"` maps to `MultipleChoice`, any other non-empty token to `TrueFalse`.
    /// Returns `None` for an empty token.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "" => None,
            "MCQ" => Some(Self::MultipleChoice),
            _ => Some(Self::TrueFalse),
        }
    }
}

//
// ─── RECORD ────────────────────────────────────────────────────────────────────
//

/// One validated question from the bank.
///
/// Construction goes through [`QuestionRecord::new`], so every value of this type
/// satisfies the catalog admission rules. Deserialization validates the same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawQuestion")]
pub struct QuestionRecord {
    level: String,
    kind: QuestionKind,
    prompt: String,
    options: Vec<String>,
    correct_answer: String,
}

impl QuestionRecord {
    /// Validates the fields and builds a record.
    ///
    /// Text fields are trimmed. Options are kept as given for multiple choice and
    /// dropped for true/false.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if a required field is empty, or if a multiple-choice
    /// answer has no option carrying its label.
    pub fn new(
        level: impl Into<String>,
        kind: QuestionKind,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let level = level.into().trim().to_owned();
        let prompt = prompt.into().trim().to_owned();
        let correct_answer = correct_answer.into().trim().to_owned();

        if level.is_empty() {
            return Err(QuestionError::MissingLevel);
        }
        if prompt.is_empty() {
            return Err(QuestionError::MissingPrompt);
        }
        if correct_answer.is_empty() {
            return Err(QuestionError::MissingAnswer);
        }

        let options = match kind {
            QuestionKind::MultipleChoice => {
                let wanted = label_of(&correct_answer);
                if !options.iter().any(|opt| option_label(opt) == wanted) {
                    return Err(QuestionError::NoMatchingOption {
                        answer: correct_answer,
                    });
                }
                options
            }
            QuestionKind::TrueFalse => Vec::new(),
        };

        Ok(Self {
            level,
            kind,
            prompt,
            options,
            correct_answer,
        })
    }

    #[must_use]
    pub fn level(&self) -> &str {
        &self.level
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Option lines with their label prefix, e.g. `"A) Paris"`.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    /// Answers a shell should offer for this question.
    ///
    /// Option labels for multiple choice, the two verdict tokens otherwise.
    #[must_use]
    pub fn choices(&self) -> Vec<String> {
        match self.kind {
            QuestionKind::MultipleChoice => self
                .options
                .iter()
                .filter_map(|opt| option_label(opt))
                .map(String::from)
                .collect(),
            QuestionKind::TrueFalse => vec![TRUE_TOKEN.to_owned(), FALSE_TOKEN.to_owned()],
        }
    }

    /// Scores a raw answer against this question.
    ///
    /// Multiple choice compares the uppercased first character of both trimmed values,
    /// so `"a"` matches `"A"`. True/false compares verbatim.
    #[must_use]
    pub fn accepts(&self, raw_answer: &str) -> bool {
        match self.kind {
            QuestionKind::MultipleChoice => {
                let given = label_of(raw_answer);
                given.is_some() && given == label_of(&self.correct_answer)
            }
            QuestionKind::TrueFalse => raw_answer == self.correct_answer,
        }
    }
}

#[derive(Deserialize)]
struct RawQuestion {
    level: String,
    kind: QuestionKind,
    prompt: String,
    options: Vec<String>,
    correct_answer: String,
}

impl TryFrom<RawQuestion> for QuestionRecord {
    type Error = QuestionError;

    fn try_from(raw: RawQuestion) -> Result<Self, Self::Error> {
        Self::new(raw.level, raw.kind, raw.prompt, raw.options, raw.correct_answer)
    }
}

/// Uppercased first character of a trimmed value.
fn label_of(value: &str) -> Option<char> {
    value
        .trim()
        .chars()
        .next()
        .map(|c| c.to_ascii_uppercase())
}

/// Label of an option line such as `"B) Lyon"`.
pub(crate) fn option_label(line: &str) -> Option<char> {
    let mut chars = line.trim_start().chars();
    let label = chars.next()?;
    (OPTION_LABELS.contains(&label) && chars.next() == Some(')')).then_some(label)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn mcq(answer: &str) -> Result<QuestionRecord, QuestionError> {
        QuestionRecord::new(
            "Beginner",
            QuestionKind::MultipleChoice,
            "Capitale de la France ?",
            vec!["A) Paris".into(), "B) Lyon".into()],
            answer,
        )
    }

    #[test]
    fn kind_token_normalization() {
        assert_eq!(QuestionKind::from_token("MCQ"), Some(QuestionKind::MultipleChoice));
        assert_eq!(QuestionKind::from_token(" MCQ "), Some(QuestionKind::MultipleChoice));
        assert_eq!(QuestionKind::from_token("TF"), Some(QuestionKind::TrueFalse));
        assert_eq!(QuestionKind::from_token("mcq"), Some(QuestionKind::TrueFalse));
        assert_eq!(QuestionKind::from_token("  "), None);
    }

    #[test]
    fn multiple_choice_requires_matching_option() {
        assert!(mcq("A").is_ok());
        assert!(mcq("b").is_ok());
        let err = mcq("C").unwrap_err();
        assert_eq!(
            err,
            QuestionError::NoMatchingOption {
                answer: "C".into()
            }
        );
    }

    #[test]
    fn empty_fields_are_refused() {
        let err = QuestionRecord::new("", QuestionKind::TrueFalse, "Q", vec![], "Vrai").unwrap_err();
        assert_eq!(err, QuestionError::MissingLevel);

        let err =
            QuestionRecord::new("B1", QuestionKind::TrueFalse, "  ", vec![], "Vrai").unwrap_err();
        assert_eq!(err, QuestionError::MissingPrompt);

        let err = mcq(" ").unwrap_err();
        assert_eq!(err, QuestionError::MissingAnswer);
    }

    #[test]
    fn multiple_choice_scoring_is_case_insensitive() {
        let q = mcq("A").unwrap();
        assert!(q.accepts("A"));
        assert!(q.accepts("a"));
        assert!(q.accepts(" a "));
        assert!(q.accepts("A) Paris"));
        assert!(!q.accepts("B"));
        assert!(!q.accepts(""));
    }

    #[test]
    fn true_false_scoring_is_verbatim() {
        let q = QuestionRecord::new("A2", QuestionKind::TrueFalse, "Le ciel est bleu.", vec![], "Vrai")
            .unwrap();
        assert!(q.accepts("Vrai"));
        assert!(!q.accepts("Faux"));
        assert!(!q.accepts("vrai"));
    }

    #[test]
    fn true_false_drops_options() {
        let q = QuestionRecord::new(
            "A2",
            QuestionKind::TrueFalse,
            "Q",
            vec!["A) stray".into()],
            "Faux",
        )
        .unwrap();
        assert!(q.options().is_empty());
        assert_eq!(q.choices(), vec!["Vrai".to_string(), "Faux".to_string()]);
    }

    #[test]
    fn choices_lists_option_labels() {
        let q = mcq("A").unwrap();
        assert_eq!(q.choices(), vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn option_label_detection() {
        assert_eq!(option_label("A) Paris"), Some('A'));
        assert_eq!(option_label("  D) fin"), Some('D'));
        assert_eq!(option_label("E) nope"), None);
        assert_eq!(option_label("A Paris"), None);
        assert_eq!(option_label(""), None);
    }
}
