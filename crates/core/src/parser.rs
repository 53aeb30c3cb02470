//! Question-bank text parser.
//!
//! A bank is a sequence of record blocks. Each block opens at a line starting with
//! `Level:` and runs until the next such line or the end of input. Inside a block,
//! fields are recognised by their leading marker in any order:
//!
//! ```text
//! Level: Beginner
//! Type: MCQ
//! Question: Quelle est la capitale de la France ?
//! A) Paris
//! B) Lyon
//! Answer: A
//! ```
//!
//! Markers are case-sensitive. A repeated field marker overwrites the earlier value.
//! Blocks that fail validation are dropped; parsing itself never fails.

use log::{debug, warn};

use crate::model::{
    FALSE_TOKEN, QuestionError, QuestionKind, QuestionRecord, TRUE_TOKEN, option_label,
};

const LEVEL: &str = "Level:";
const TYPE: &str = "Type:";
const QUESTION: &str = "Question:";
const ANSWER: &str = "Answer:";

/// A block that was refused, with the line its `Level:` marker sits on (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedBlock {
    pub line: usize,
    pub reason: QuestionError,
}

/// Admitted records plus the blocks that were dropped along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub records: Vec<QuestionRecord>,
    pub dropped: Vec<DroppedBlock>,
}

impl ParseReport {
    #[must_use]
    pub fn admitted_count(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }
}

/// Parse bank text into the records that pass validation, in input order.
#[must_use]
pub fn parse(raw_text: &str) -> Vec<QuestionRecord> {
    parse_with_report(raw_text).records
}

/// Parse bank text, keeping track of every dropped block.
#[must_use]
pub fn parse_with_report(raw_text: &str) -> ParseReport {
    let text = raw_text.strip_prefix('\u{feff}').unwrap_or(raw_text);
    let mut report = ParseReport::default();
    let mut block: Option<BlockDraft> = None;

    for (idx, line) in text.lines().enumerate() {
        let line = line.trim_start();

        if let Some(level) = line.strip_prefix(LEVEL) {
            if let Some(done) = block.take() {
                done.finish_into(&mut report);
            }
            block = Some(BlockDraft::open(idx + 1, level));
            continue;
        }

        // Text before the first block is preamble.
        let Some(draft) = block.as_mut() else {
            continue;
        };
        draft.scan(line);
    }

    if let Some(done) = block.take() {
        done.finish_into(&mut report);
    }
    report
}

/// Fields collected for one block before validation.
#[derive(Debug, Default)]
struct BlockDraft {
    line: usize,
    level: String,
    kind: Option<String>,
    prompt: Option<String>,
    options: Vec<String>,
    answer: Option<String>,
}

impl BlockDraft {
    fn open(line: usize, level: &str) -> Self {
        Self {
            line,
            level: level.trim().to_owned(),
            ..Self::default()
        }
    }

    fn scan(&mut self, line: &str) {
        if let Some(value) = line.strip_prefix(TYPE) {
            self.kind = Some(value.trim().to_owned());
        } else if let Some(value) = line.strip_prefix(QUESTION) {
            self.prompt = Some(value.trim().to_owned());
        } else if let Some(value) = line.strip_prefix(ANSWER) {
            self.answer = Some(value.trim().to_owned());
        } else if option_label(line).is_some() {
            self.options.push(line.trim_end().to_owned());
        }
    }

    fn finish(self) -> Result<QuestionRecord, QuestionError> {
        if self.level.is_empty() {
            return Err(QuestionError::MissingLevel);
        }
        let kind = self
            .kind
            .as_deref()
            .and_then(QuestionKind::from_token)
            .ok_or(QuestionError::MissingKind)?;
        let prompt = self.prompt.ok_or(QuestionError::MissingPrompt)?;
        let answer = self.answer.ok_or(QuestionError::MissingAnswer)?;

        QuestionRecord::new(self.level, kind, prompt, self.options, answer)
    }

    fn finish_into(self, report: &mut ParseReport) {
        let line = self.line;
        match self.finish() {
            Ok(record) => {
                if record.kind() == QuestionKind::TrueFalse
                    && ![TRUE_TOKEN, FALSE_TOKEN].contains(&record.correct_answer())
                {
                    warn!(
                        "true/false question at line {line} expects {:?}, which no answer can match",
                        record.correct_answer()
                    );
                }
                report.records.push(record);
            }
            Err(reason) => {
                debug!("dropping question block at line {line}: {reason}");
                report.dropped.push(DroppedBlock { line, reason });
            }
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
