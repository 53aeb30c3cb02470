use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;
use quiz_core::model::QuizSettings;
use services::{Clock, QuizService};
use storage::{BankLoad, InMemorySessionStore, load_catalog};

mod shell;

const DEFAULT_BANK: &str = "french_placement_1000_questions.txt";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidQuestionCount { raw: String },
    InvalidBankPath { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidQuestionCount { raw } => {
                write!(f, "invalid --questions value: {raw}")
            }
            ArgsError::InvalidBankPath { raw } => write!(f, "invalid --bank value: {raw:?}"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug)]
struct NoQuestions {
    bank: PathBuf,
}

impl fmt::Display for NoQuestions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no questions available in {}", self.bank.display())
    }
}

impl std::error::Error for NoQuestions {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- run   [--bank <path>] [--questions <n>] [--no-question-timer]");
    eprintln!("  cargo run -p app -- check [--bank <path>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --bank {DEFAULT_BANK}");
    eprintln!("  --questions 40");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PLACEMENT_BANK, PLACEMENT_QUESTIONS, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run,
    Check,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "run" => Some(Self::Run),
            "check" => Some(Self::Check),
            _ => None,
        }
    }
}

struct Args {
    bank: PathBuf,
    questions: Option<u32>,
    question_timer: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut bank = std::env::var("PLACEMENT_BANK")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_BANK), PathBuf::from);
        let mut questions = std::env::var("PLACEMENT_QUESTIONS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok());
        let mut question_timer = true;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--bank" => {
                    let value = require_value(args, "--bank")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidBankPath { raw: value });
                    }
                    bank = PathBuf::from(value);
                }
                "--questions" => {
                    let value = require_value(args, "--questions")?;
                    let parsed: u32 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidQuestionCount { raw: value.clone() })?;
                    questions = Some(parsed);
                }
                "--no-question-timer" => question_timer = false,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            bank,
            questions,
            question_timer,
        })
    }

    fn settings(&self) -> Result<QuizSettings, quiz_core::Error> {
        let mut settings =
            QuizSettings::placement_defaults().with_enforce_question_time(self.question_timer);
        if let Some(count) = self.questions {
            settings = settings.with_question_count(count)?;
        }
        Ok(settings)
    }
}

/// Admitted and dropped counts, then one line per dropped block.
fn write_check_report(out: &mut impl Write, bank: &Path, load: &BankLoad) -> io::Result<()> {
    writeln!(
        out,
        "{}: {} questions admitted, {} blocks dropped",
        bank.display(),
        load.catalog.len(),
        load.dropped.len()
    )?;
    for dropped in &load.dropped {
        writeln!(out, "  line {}: {}", dropped.line, dropped.reason)?;
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand means "run".
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Run,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Run,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::parse(&mut argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let settings = parsed.settings()?;

    // The bank is parsed once; every session samples from this catalog.
    let load = load_catalog(&parsed.bank);
    if cmd == Command::Check {
        write_check_report(&mut io::stdout().lock(), &parsed.bank, &load)?;
    }
    if load.catalog.is_empty() {
        return Err(NoQuestions { bank: parsed.bank }.into());
    }

    match cmd {
        Command::Check => Ok(()),
        Command::Run => {
            let service = QuizService::new(
                Clock::system(),
                settings,
                Arc::new(load.catalog),
                Arc::new(InMemorySessionStore::new()),
            );
            info!("starting placement test from {}", parsed.bank.display());
            shell::administer(&service).await
        }
    }
}

#[tokio::main]
async fn main() {
    pretty_env_logger::init();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::Catalog;

    fn load_of(text: &str) -> BankLoad {
        let (catalog, report) = Catalog::parse_with_report(text);
        BankLoad {
            catalog,
            dropped: report.dropped,
        }
    }

    fn report_of(text: &str) -> String {
        let mut out = Vec::new();
        write_check_report(&mut out, Path::new("bank.txt"), &load_of(text)).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn check_report_lists_drops_even_when_nothing_is_admitted() {
        let report = report_of("Level: A1\nType: MCQ\n");
        assert!(report.starts_with("bank.txt: 0 questions admitted, 1 blocks dropped\n"));
        assert!(report.contains("  line 1: "));
    }

    #[test]
    fn check_report_counts_admitted_questions() {
        let report = report_of("Level: A1\nType: TF\nQuestion: Oui ?\nAnswer: Vrai\n");
        assert_eq!(report, "bank.txt: 1 questions admitted, 0 blocks dropped\n");
    }

    #[test]
    fn subcommands_are_recognized() {
        assert_eq!(Command::from_arg("check"), Some(Command::Check));
        assert_eq!(Command::from_arg("run"), Some(Command::Run));
        assert_eq!(Command::from_arg("serve"), None);
    }
}
