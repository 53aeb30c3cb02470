//! Line-oriented terminal shell for one quiz-taker.

use std::error::Error;
use std::io::{self, Write};

use quiz_core::model::{AnswerOutcome, FALSE_TOKEN, FinalScore, QuestionKind, TRUE_TOKEN};
use services::{QuestionView, QuizService, QuizStep};
use tokio::io::{AsyncBufReadExt, BufReader};

const QUIT: &str = ":q";

/// Walk one session from first question to final score.
///
/// End of input or `:q` ends the test early with the score so far.
pub(crate) async fn administer(service: &QuizService) -> Result<(), Box<dyn Error>> {
    let id = service.start().await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut step = service.current(id).await?;

    loop {
        let view = match step {
            QuizStep::Finished(score) => {
                print_result(score);
                return Ok(());
            }
            QuizStep::Question(view) => view,
        };
        render(&mut io::stdout().lock(), &view)?;

        let line = lines.next_line().await?;
        let input = line.as_deref().map(str::trim);
        if matches!(input, None | Some(QUIT)) {
            print_result(service.finish(id).await?);
            return Ok(());
        }

        let Some(answer) = input.and_then(|raw| normalize_input(&view, raw)) else {
            println!("Please answer with one of: {}", view.choices.join(", "));
            step = service.current(id).await?;
            continue;
        };

        let result = service.submit(id, view.index, &answer).await?;
        match result.outcome {
            AnswerOutcome::TimedOut => println!("Time was up for that question; no point awarded."),
            AnswerOutcome::Expired => println!("The total time is up."),
            _ => {}
        }
        step = result.next;
    }
}

/// Header, prompt, and options, leaving the cursor after the `> ` prompt.
fn render(out: &mut impl Write, view: &QuestionView) -> io::Result<()> {
    writeln!(out)?;
    let question_timer = view
        .remaining_question_secs
        .map(|secs| format!("  question: {secs}s"))
        .unwrap_or_default();
    writeln!(
        out,
        "Question {} / {}  [{}]{question_timer}  total: {}s",
        view.number(),
        view.progress.total,
        view.question.level(),
        view.remaining_total_secs
    )?;
    writeln!(out, "{}", view.question.prompt())?;
    match view.question.kind() {
        QuestionKind::MultipleChoice => {
            for option in view.question.options() {
                writeln!(out, "  {option}")?;
            }
        }
        QuestionKind::TrueFalse => writeln!(out, "  {TRUE_TOKEN} / {FALSE_TOKEN}")?,
    }
    write!(out, "> ")?;
    out.flush()
}

fn print_result(score: FinalScore) {
    println!();
    println!("Test finished");
    println!("Your score: {score}");
}

/// Map what was typed onto an answer the question offers.
fn normalize_input(view: &QuestionView, raw: &str) -> Option<String> {
    let raw = raw.trim();
    match view.question.kind() {
        QuestionKind::MultipleChoice => {
            let label = raw.chars().next()?.to_ascii_uppercase().to_string();
            view.choices.contains(&label).then_some(label)
        }
        QuestionKind::TrueFalse => match raw.to_lowercase().as_str() {
            "v" | "vrai" => Some(TRUE_TOKEN.to_owned()),
            "f" | "faux" => Some(FALSE_TOKEN.to_owned()),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{QuestionRecord, QuizSettings, SessionState};
    use quiz_core::time::fixed_now;
    use services::QuizProgress;

    fn view_of(question: QuestionRecord) -> QuestionView {
        let state = SessionState::new(vec![question.clone()], fixed_now());
        QuestionView {
            index: 0,
            choices: question.choices(),
            question,
            progress: QuizProgress::of(&state),
            remaining_total_secs: i64::from(QuizSettings::DEFAULT_TOTAL_TIME_SECS),
            remaining_question_secs: None,
        }
    }

    #[test]
    fn multiple_choice_input_is_a_known_label() {
        let view = view_of(
            QuestionRecord::new(
                "A1",
                QuestionKind::MultipleChoice,
                "?",
                vec!["A) oui".into(), "B) non".into()],
                "B",
            )
            .unwrap(),
        );
        assert_eq!(normalize_input(&view, "b"), Some("B".to_string()));
        assert_eq!(normalize_input(&view, " A) oui"), Some("A".to_string()));
        assert_eq!(normalize_input(&view, "C"), None);
        assert_eq!(normalize_input(&view, ""), None);
    }

    #[test]
    fn true_false_input_maps_to_tokens() {
        let view = view_of(
            QuestionRecord::new("A1", QuestionKind::TrueFalse, "?", vec![], "Faux").unwrap(),
        );
        assert_eq!(normalize_input(&view, "v"), Some("Vrai".to_string()));
        assert_eq!(normalize_input(&view, "FAUX"), Some("Faux".to_string()));
        assert_eq!(normalize_input(&view, "peut-être"), None);
    }

    #[test]
    fn prompt_stays_on_the_answer_line() {
        let mut view = view_of(
            QuestionRecord::new(
                "B2",
                QuestionKind::MultipleChoice,
                "Il faut que tu ___ là.",
                vec!["A) es".into(), "B) sois".into()],
                "B",
            )
            .unwrap(),
        );
        view.remaining_question_secs = Some(120);

        let mut out = Vec::new();
        render(&mut out, &view).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Question 1 / 1  [B2]  question: 120s  total: 5400s\n"));
        assert!(text.contains("  A) es\n  B) sois\n"));
        assert!(text.ends_with("\n> "));
    }
}
