use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use lesson_core::Catalog;
use lesson_core::catalog::LessonFilter;
use lesson_core::model::{AttemptReport, Difficulty, LessonId, TestOutcome, UserDraft};
use log::info;
use services::{Clock, LessonSession, ProgressStore};

const DEFAULT_DB_URL: &str = "sqlite://codelearn.sqlite3";
const DEFAULT_CATALOG: &str = "crates/app/data/lessons.json";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArg { name: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidDifficulty { raw: String },
    InvalidLevel { raw: String },
    InvalidResult { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArg { name } => write!(f, "missing <{name}>"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidDifficulty { raw } => {
                write!(f, "invalid difficulty: {raw} (beginner|intermediate|advanced)")
            }
            ArgsError::InvalidLevel { raw } => write!(f, "invalid hint level: {raw}"),
            ArgsError::InvalidResult { raw } => write!(f, "invalid test result: {raw} (pass|fail)"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- lessons  [--search <text>] [--skill <name>]... [--min <difficulty>] [--max <difficulty>]");
    eprintln!("  cargo run -p app -- onboard  --name <name> --email <email>");
    eprintln!("  cargo run -p app -- open     <lesson-id>");
    eprintln!("  cargo run -p app -- hint     <lesson-id> <level>");
    eprintln!("  cargo run -p app -- complete <lesson-id> --results <pass|fail,...>");
    eprintln!("  cargo run -p app -- profile  [--json]");
    eprintln!("  cargo run -p app -- logout");
    eprintln!();
    eprintln!("Common options:");
    eprintln!("  --db <sqlite_url>      (default {DEFAULT_DB_URL})");
    eprintln!("  --catalog <path>       (default {DEFAULT_CATALOG})");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  CODELEARN_DB_URL, CODELEARN_CATALOG, RUST_LOG");
}

#[derive(Debug)]
enum Command {
    Lessons(LessonFilter),
    Onboard { name: String, email: String },
    Open(LessonId),
    Hint { lesson: LessonId, level: u32 },
    Complete { lesson: LessonId, results: Vec<bool> },
    Profile { json: bool },
    Logout,
}

#[derive(Debug)]
struct Args {
    db_url: String,
    catalog_path: PathBuf,
    command: Command,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("CODELEARN_DB_URL")
            .ok()
            .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);
        let mut catalog_path = std::env::var("CODELEARN_CATALOG")
            .ok()
            .map_or_else(|| PathBuf::from(DEFAULT_CATALOG), PathBuf::from);

        let mut name = None;
        let mut email = None;
        let mut results = None;
        let mut json = false;
        let mut filter = LessonFilter::default();
        let mut positional = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--catalog" => catalog_path = require_value(&mut args, "--catalog")?.into(),
                "--name" => name = Some(require_value(&mut args, "--name")?),
                "--email" => email = Some(require_value(&mut args, "--email")?),
                "--results" => results = Some(parse_results(&require_value(&mut args, "--results")?)?),
                "--json" => json = true,
                "--search" => filter.query = require_value(&mut args, "--search")?,
                "--skill" => filter.skills.push(require_value(&mut args, "--skill")?),
                "--min" => {
                    let min = parse_difficulty(require_value(&mut args, "--min")?)?;
                    filter.difficulty = min..=*filter.difficulty.end();
                }
                "--max" => {
                    let max = parse_difficulty(require_value(&mut args, "--max")?)?;
                    filter.difficulty = *filter.difficulty.start()..=max;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if arg.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => positional.push(arg),
            }
        }

        let mut positional = positional.into_iter();
        let command = match positional.next().as_deref() {
            None | Some("profile") => Command::Profile { json },
            Some("lessons") => Command::Lessons(filter),
            Some("onboard") => Command::Onboard {
                name: name.ok_or(ArgsError::MissingValue { flag: "--name" })?,
                email: email.ok_or(ArgsError::MissingValue { flag: "--email" })?,
            },
            Some("open") => Command::Open(lesson_arg(positional.next())?),
            Some("hint") => {
                let lesson = lesson_arg(positional.next())?;
                let raw = positional
                    .next()
                    .ok_or(ArgsError::MissingArg { name: "level" })?;
                let level = raw
                    .parse()
                    .map_err(|_| ArgsError::InvalidLevel { raw: raw.clone() })?;
                Command::Hint { lesson, level }
            }
            Some("complete") => Command::Complete {
                lesson: lesson_arg(positional.next())?,
                results: results.ok_or(ArgsError::MissingValue { flag: "--results" })?,
            },
            Some("logout") => Command::Logout,
            Some(other) => return Err(ArgsError::UnknownCommand(other.to_string())),
        };
        if let Some(extra) = positional.next() {
            return Err(ArgsError::UnknownArg(extra));
        }

        Ok(Self {
            db_url,
            catalog_path,
            command,
        })
    }
}

fn lesson_arg(raw: Option<String>) -> Result<LessonId, ArgsError> {
    raw.map(LessonId::new)
        .ok_or(ArgsError::MissingArg { name: "lesson-id" })
}

fn parse_difficulty(raw: String) -> Result<Difficulty, ArgsError> {
    Difficulty::parse(&raw).ok_or(ArgsError::InvalidDifficulty { raw })
}

fn parse_results(raw: &str) -> Result<Vec<bool>, ArgsError> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| match item.to_ascii_lowercase().as_str() {
            "pass" | "p" | "ok" => Ok(true),
            "fail" | "f" => Ok(false),
            _ => Err(ArgsError::InvalidResult {
                raw: item.to_string(),
            }),
        })
        .collect()
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn load_catalog(path: &std::path::Path) -> Result<Catalog, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| format!("cannot read catalog {}: {err}", path.display()))?;
    let catalog = Catalog::from_json(&raw)?;
    info!("Loaded {} lessons from {}", catalog.len(), path.display());
    Ok(catalog)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = Args::parse(std::env::args().skip(1)).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let catalog = Arc::new(load_catalog(&parsed.catalog_path)?);

    // Binary glue owns the database file; services only see the URL.
    prepare_sqlite_file(&parsed.db_url)?;
    let mut store =
        ProgressStore::open_sqlite(&parsed.db_url, Clock::default(), Arc::clone(&catalog)).await?;

    match parsed.command {
        Command::Lessons(filter) => {
            for lesson in catalog.filter(&filter) {
                let mark = if store.state().is_completed(&lesson.id) {
                    "x"
                } else {
                    " "
                };
                println!(
                    "[{mark}] {:<20} {} ({}, {}, {} XP, ~{} min)",
                    lesson.id.as_str(),
                    lesson.title,
                    lesson.skill,
                    lesson.difficulty,
                    lesson.xp,
                    lesson.estimated_time
                );
            }
        }
        Command::Onboard { name, email } => {
            let user = store.sign_in(UserDraft::new(name, email)).await?;
            println!("Welcome, {} ({})", user.name, user.id);
        }
        Command::Open(lesson_id) => {
            let session = LessonSession::start(&mut store, &lesson_id).await?;
            let lesson = session.lesson();
            println!("{} [{}]", lesson.title, lesson.difficulty);
            println!();
            println!("{}", lesson.content);
            println!();
            println!("Challenge: {}", lesson.challenge.description);
            for hint in session.revealed_hints() {
                println!("Hint {}: {}", hint.level, hint.text);
            }
            println!(
                "Hints used: {}/{}  Potential XP: {}",
                session.hints_used(),
                lesson.hint_count(),
                session.potential_xp()
            );
        }
        Command::Hint { lesson, level } => {
            let mut session = LessonSession::start(&mut store, &lesson).await?;
            let reveal = session.reveal_hint(&mut store, level).await?;
            if let Some(hint) = session.lesson().hint(level) {
                println!("Hint {}: {}", hint.level, hint.text);
            }
            if !reveal.is_new() {
                println!("(already revealed)");
            }
            println!("Potential XP: {}", session.potential_xp());
        }
        Command::Complete { lesson, results } => {
            let mut session = LessonSession::start(&mut store, &lesson).await?;
            let outcomes = session
                .lesson()
                .challenge
                .tests
                .iter()
                .enumerate()
                .map(|(i, test)| {
                    // Tests without a reported result count as failed.
                    let passed = results.get(i).copied().unwrap_or(false);
                    TestOutcome::new(passed, test.description.clone())
                })
                .collect();
            let report = AttemptReport::new(outcomes);
            for failure in report.failures() {
                println!("FAIL {}", failure.message);
            }
            session.record_attempt(report);
            let completion = session.complete(&mut store).await?;
            println!(
                "Completed {} for {} XP (score {})",
                lesson,
                completion.earned_xp,
                completion.progress.score.unwrap_or_default()
            );
        }
        Command::Profile { json: true } => {
            let summary = store.profile().summary();
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Profile { json: false } => {
            let summary = store.profile().summary();
            match &summary.user {
                Some(user) => println!("{} <{}>", user.name, user.email),
                None => println!("Not signed in"),
            }
            println!(
                "Level {}  XP {}  Streak {} day(s)",
                summary.level, summary.total_xp, summary.streak
            );
            println!(
                "Completed {}/{} lessons",
                summary.completed, summary.total_lessons
            );
            for (skill, progress) in &summary.skills {
                println!("  {skill}: {}/{}", progress.completed, progress.total);
            }
        }
        Command::Logout => {
            store.logout().await?;
            println!("Signed out; local progress cleared.");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

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
        Args::parse(args.iter().map(|s| (*s).to_string()))
    }

    #[test]
    fn no_subcommand_shows_profile() {
        let args = parse(&[]).unwrap();
        assert!(matches!(args.command, Command::Profile { json: false }));
    }

    #[test]
    fn hint_requires_numeric_level() {
        let args = parse(&["hint", "js-basics-1", "2"]).unwrap();
        match args.command {
            Command::Hint { lesson, level } => {
                assert_eq!(lesson.as_str(), "js-basics-1");
                assert_eq!(level, 2);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(matches!(
            parse(&["hint", "js-basics-1", "two"]),
            Err(ArgsError::InvalidLevel { .. })
        ));
    }

    #[test]
    fn results_accept_pass_and_fail() {
        assert_eq!(parse_results("pass, fail,P").unwrap(), vec![true, false, true]);
        assert!(parse_results("maybe").is_err());
    }

    #[test]
    fn lessons_filter_flags_build_range() {
        let args = parse(&["lessons", "--skill", "React", "--min", "intermediate"]).unwrap();
        let Command::Lessons(filter) = args.command else {
            panic!("expected lessons command");
        };
        assert_eq!(filter.skills, vec!["React".to_string()]);
        assert_eq!(
            filter.difficulty,
            Difficulty::Intermediate..=Difficulty::Advanced
        );
    }

    #[test]
    fn onboard_requires_name_and_email() {
        assert!(matches!(
            parse(&["onboard", "--name", "Ada"]),
            Err(ArgsError::MissingValue { flag: "--email" })
        ));
    }

    #[test]
    fn memory_url_passes_through() {
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:".into()),
            "sqlite::memory:"
        );
        let args = parse(&["--db", "sqlite::memory:", "logout"]).unwrap();
        assert_eq!(args.db_url, "sqlite::memory:");
        assert!(prepare_sqlite_file(&args.db_url).is_ok());
    }

    #[test]
    fn bundled_catalog_is_valid() {
        let raw = include_str!("../data/lessons.json");
        let catalog = Catalog::from_json(raw).unwrap();
        assert_eq!(catalog.len(), 6);
        assert_eq!(catalog.skills(), vec!["JavaScript", "React", "CSS"]);
    }
}
