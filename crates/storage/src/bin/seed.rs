use std::fmt;
use std::path::PathBuf;

use lingo_core::model::{CategoryId, ItemDraft};
use serde::Deserialize;
use storage::repository::Storage;
use storage::sqlite::SqliteSettings;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    file: Option<PathBuf>,
    category_id: CategoryId,
    category_name: String,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidCategoryId { raw: String },
    CategoryIdTooLarge { id: CategoryId },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidCategoryId { raw } => {
                write!(f, "invalid --category-id value: {raw}")
            }
            ArgsError::CategoryIdTooLarge { id } => {
                write!(f, "--category-id {id} is too large for built-in sample ids")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("LINGO_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3?mode=rwc".into());
        let mut file = None;
        let mut category_id = std::env::var("LINGO_CATEGORY_ID")
            .ok()
            .and_then(|value| value.parse::<CategoryId>().ok())
            .unwrap_or_else(|| CategoryId::new(1));
        let mut category_name = "German Basics".to_owned();

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--file" => {
                    file = Some(PathBuf::from(require_value(&mut args, "--file")?));
                }
                "--category-id" => {
                    let value = require_value(&mut args, "--category-id")?;
                    category_id = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidCategoryId { raw: value.clone() })?;
                }
                "--category-name" => {
                    category_name = require_value(&mut args, "--category-name")?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            file,
            category_id,
            category_name,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3?mode=rwc)");
    eprintln!("  --file <path>             JSON seed file (categories + items)");
    eprintln!("  --category-id <id>        Category for built-in samples (default: 1)");
    eprintln!("  --category-name <name>    Name for built-in samples (default: German Basics)");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  LINGO_DB_URL, LINGO_CATEGORY_ID, LINGO_DB_MAX_CONNECTIONS, LINGO_DB_BUSY_TIMEOUT_MS");
}

/// Shape of a `--file` seed document.
#[derive(Debug, Deserialize)]
struct SeedFile {
    categories: Vec<SeedCategory>,
    items: Vec<ItemDraft>,
}

#[derive(Debug, Deserialize)]
struct SeedCategory {
    id: u64,
    name: String,
}

/// Built-in samples of category `c` get ids `c * 1000 + 1..`.
const SAMPLE_ID_STRIDE: u64 = 1000;

fn sample_id_base(category_id: CategoryId) -> Result<u64, ArgsError> {
    category_id
        .value()
        .checked_mul(SAMPLE_ID_STRIDE)
        .filter(|base| {
            base.checked_add(SAMPLE_ID_STRIDE)
                .is_some_and(|last| i64::try_from(last).is_ok())
        })
        .ok_or(ArgsError::CategoryIdTooLarge { id: category_id })
}

fn builtin_seed(category_id: CategoryId, category_name: &str) -> Result<SeedFile, ArgsError> {
    let samples = [
        ("Hallo", "Hello", "Hallo, wie geht's? ____!"),
        ("Danke", "Thank you", "____ für die Hilfe."),
        ("Bitte", "Please / You are welcome", "____ schön."),
        ("Tschüss", "Bye", "____, bis morgen!"),
        ("Guten Morgen", "Good morning", "____, Anna!"),
        ("Wasser", "Water", "Ein Glas ____, bitte."),
    ];
    let base = sample_id_base(category_id)?;
    Ok(SeedFile {
        categories: vec![SeedCategory {
            id: category_id.value(),
            name: category_name.to_owned(),
        }],
        items: samples
            .iter()
            .zip(1_u64..)
            .map(|((term, definition, example), n)| ItemDraft {
                id: base + n,
                category_id: category_id.value(),
                term: (*term).to_owned(),
                definition: (*definition).to_owned(),
                example_sentence: Some((*example).to_owned()),
                ..ItemDraft::default()
            })
            .collect(),
    })
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let seed = match &args.file {
        Some(path) => serde_json::from_str::<SeedFile>(&std::fs::read_to_string(path)?)?,
        None => builtin_seed(args.category_id, &args.category_name)?,
    };

    let storage = Storage::sqlite(&args.db_url, SqliteSettings::from_env()).await?;

    for category in &seed.categories {
        storage
            .catalog
            .upsert_category(CategoryId::new(category.id), &category.name)
            .await?;
    }
    let count = seed.items.len();
    for draft in seed.items {
        let item = draft.validate().map_err(lingo_core::Error::from)?;
        storage.catalog.upsert_item(&item).await?;
    }

    println!(
        "Seeded {} categories and {} items into {}",
        seed.categories.len(),
        count,
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
