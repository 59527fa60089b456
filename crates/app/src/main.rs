use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use lingo_core::SessionConfig;
use lingo_core::config::ConfigError;
use lingo_core::model::{CategoryId, QuizFlow, SessionContext, UserId};
use services::{Clock, SessionLoopService, SilentAudioPlayer};
use storage::repository::Storage;
use storage::sqlite::SqliteSettings;
use tracing_subscriber::EnvFilter;

mod terminal;

const DEFAULT_DB_URL: &str = "sqlite:dev.sqlite3?mode=rwc";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidFlow { raw: String },
    InvalidDbUrl { raw: String },
    InvalidConfig(ConfigError),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidFlow { raw } => {
                write!(f, "invalid --flow value: {raw} (vocabulary, grammar, review)")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidConfig(err) => write!(f, "invalid session config: {err}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn require_number<T: FromStr>(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<T, ArgsError> {
    let value = require_value(args, flag)?;
    value
        .trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw: value })
}

fn env_number<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
}

fn parse_flow(raw: &str) -> Result<QuizFlow, ArgsError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "vocabulary" | "vocab" => Ok(QuizFlow::Vocabulary),
        "grammar" => Ok(QuizFlow::Grammar),
        "review" => Ok(QuizFlow::Review),
        _ => Err(ArgsError::InvalidFlow {
            raw: raw.to_owned(),
        }),
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- quiz       [options]");
    eprintln!("  cargo run -p app -- categories [--db <sqlite_url>] [--user-id <id>]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>        SQLite URL (default: {DEFAULT_DB_URL})");
    eprintln!("  --category-id <id>       Category to quiz (default: 1)");
    eprintln!("  --user-id <id>           Learner id (default: 1)");
    eprintln!("  --count <n>              Items per session (default: 10)");
    eprintln!("  --flow <flow>            vocabulary | grammar | review (default: vocabulary)");
    eprintln!("  --shuffle                Shuffle items before the session starts");
    eprintln!("  --correct-secs <n>       Auto-advance after a correct answer (default: 4)");
    eprintln!("  --incorrect-secs <n>     Auto-advance after a miss or reveal (default: 30)");
    eprintln!();
    eprintln!("Environment (flags win):");
    eprintln!("  LINGO_DB_URL, LINGO_CATEGORY_ID, LINGO_USER_ID, LINGO_ITEM_COUNT,");
    eprintln!("  LINGO_CORRECT_ADVANCE_SECS, LINGO_INCORRECT_ADVANCE_SECS,");
    eprintln!("  LINGO_DB_MAX_CONNECTIONS, LINGO_DB_BUSY_TIMEOUT_MS, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Quiz,
    Categories,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "quiz" => Some(Self::Quiz),
            "categories" => Some(Self::Categories),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    db_url: String,
    category_id: CategoryId,
    user_id: UserId,
    flow: QuizFlow,
    config: SessionConfig,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let defaults = SessionConfig::default();
        let mut db_url = std::env::var("LINGO_DB_URL").unwrap_or_else(|_| DEFAULT_DB_URL.into());
        let mut category_id =
            env_number("LINGO_CATEGORY_ID").unwrap_or_else(|| CategoryId::new(1));
        let mut user_id = env_number("LINGO_USER_ID").unwrap_or_else(|| UserId::new(1));
        let mut item_count = env_number("LINGO_ITEM_COUNT").unwrap_or(defaults.item_count());
        let mut correct_secs = env_number("LINGO_CORRECT_ADVANCE_SECS")
            .unwrap_or_else(|| secs(defaults.correct_advance()));
        let mut incorrect_secs = env_number("LINGO_INCORRECT_ADVANCE_SECS")
            .unwrap_or_else(|| secs(defaults.incorrect_advance()));
        let mut flow = QuizFlow::default();
        let mut shuffle = defaults.shuffle_items();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--category-id" => category_id = require_number(args, "--category-id")?,
                "--user-id" => user_id = require_number(args, "--user-id")?,
                "--count" => item_count = require_number(args, "--count")?,
                "--correct-secs" => correct_secs = require_number(args, "--correct-secs")?,
                "--incorrect-secs" => incorrect_secs = require_number(args, "--incorrect-secs")?,
                "--flow" => flow = parse_flow(&require_value(args, "--flow")?)?,
                "--shuffle" => shuffle = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let config = SessionConfig::new(correct_secs, incorrect_secs, item_count, shuffle)
            .map_err(ArgsError::InvalidConfig)?;

        Ok(Self {
            db_url,
            category_id,
            user_id,
            flow,
            config,
        })
    }
}

fn secs(duration: std::time::Duration) -> u32 {
    u32::try_from(duration.as_secs()).unwrap_or(u32::MAX)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand means a quiz.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Quiz,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Quiz,
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

    let storage = Storage::sqlite(&parsed.db_url, SqliteSettings::from_env()).await?;
    tracing::info!(db_url = %parsed.db_url, "storage ready");

    match cmd {
        Command::Categories => {
            let categories = storage.content.list_categories().await?;
            if categories.is_empty() {
                println!("No categories yet. Seed some with `cargo run -p storage --bin seed`.");
            }
            for category in categories {
                let mastery = storage.progress.mastery(parsed.user_id, category.id).await?;
                println!(
                    "{:>4}  {:<28} {:>4} items  {:>3}% mastered",
                    category.id, category.name, category.item_count, mastery
                );
            }
            Ok(())
        }
        Command::Quiz => {
            let service = SessionLoopService::new(
                Clock::system(),
                parsed.config,
                Arc::clone(&storage.content),
                Arc::clone(&storage.progress),
                Arc::new(SilentAudioPlayer),
            );
            let context = SessionContext {
                user_id: parsed.user_id,
                category_id: parsed.category_id,
                flow: parsed.flow,
            };
            let driver = service.start_session(context).await?;
            let outcome = terminal::run_quiz(driver).await?;

            let total = storage.progress.total_experience(parsed.user_id).await?;
            let mastery = storage
                .progress
                .mastery(parsed.user_id, parsed.category_id)
                .await?;
            println!("{}", terminal::format_outcome(&outcome, total, mastery));
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        Args::parse(&mut args.iter().map(|s| (*s).to_owned()))
    }

    #[test]
    fn flags_build_session_config() {
        let args = parse(&[
            "--db",
            "sqlite::memory:",
            "--category-id",
            "3",
            "--count",
            "5",
            "--flow",
            "Grammar",
            "--correct-secs",
            "2",
            "--shuffle",
        ])
        .unwrap();
        assert_eq!(args.db_url, "sqlite::memory:");
        assert_eq!(args.category_id, CategoryId::new(3));
        assert_eq!(args.flow, QuizFlow::Grammar);
        assert_eq!(args.config.item_count(), 5);
        assert_eq!(args.config.correct_advance().as_secs(), 2);
        assert!(args.config.shuffle_items());
    }

    #[test]
    fn bad_values_are_reported() {
        assert!(matches!(
            parse(&["--count"]),
            Err(ArgsError::MissingValue { flag: "--count" })
        ));
        assert!(matches!(
            parse(&["--user-id", "abc"]),
            Err(ArgsError::InvalidNumber { flag: "--user-id", .. })
        ));
        assert!(matches!(
            parse(&["--flow", "poetry"]),
            Err(ArgsError::InvalidFlow { .. })
        ));
        assert!(matches!(
            parse(&["--count", "0"]),
            Err(ArgsError::InvalidConfig(ConfigError::InvalidItemCount))
        ));
        assert!(matches!(
            parse(&["--verbose"]),
            Err(ArgsError::UnknownArg(_))
        ));
    }
}
