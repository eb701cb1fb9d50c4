use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use services::DEFAULT_DEBOUNCE;

#[derive(Debug, PartialEq, Eq)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { name: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidDebounce { raw: String },
    InvalidCycle { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { name } => write!(f, "missing <{name}>"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidDebounce { raw } => write!(f, "invalid --debounce-ms value: {raw}"),
            ArgsError::InvalidCycle { raw } => {
                write!(f, "invalid cycle number (expected 1 or more): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Add { name: String, cycles: String },
    /// `cycle` is one-based, as shown to the user.
    Toggle { id: String, cycle: usize },
    Clear { id: String },
    Delete { id: String },
    Export { out_dir: PathBuf },
    Import { file: PathBuf },
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub db_url: String,
    pub debounce: Duration,
    pub assume_yes: bool,
    pub command: Command,
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  study [--db <sqlite_url>] [--debounce-ms <ms>] [--yes] <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  list                      show subjects and progress (default)");
    eprintln!("  add <name> <cycles>       add a subject");
    eprintln!("  toggle <id> <cycle>       flip one cycle (1-based)");
    eprintln!("  clear <id>                reset all cycles of a subject");
    eprintln!("  delete <id>               remove a subject (asks first)");
    eprintln!("  export [--out <dir>]      write materias-<timestamp>.json");
    eprintln!("  import <file>             replace subjects from a file (asks first)");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://study.sqlite3");
    eprintln!("  --debounce-ms 300");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  STUDY_DB_URL, STUDY_DEBOUNCE_MS, STUDY_LOG");
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_debounce(raw: String) -> Result<Duration, ArgsError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ArgsError::InvalidDebounce { raw })
}

impl Args {
    /// Parse `argv` (without the program name), starting from environment defaults.
    pub fn parse(
        argv: impl IntoIterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut db_url = env("STUDY_DB_URL")
            .map_or_else(|| "sqlite://study.sqlite3".into(), normalize_sqlite_url);
        let mut debounce = match env("STUDY_DEBOUNCE_MS") {
            Some(raw) => parse_debounce(raw)?,
            None => DEFAULT_DEBOUNCE,
        };
        let mut assume_yes = false;
        let mut out_dir = None;
        let mut positional = Vec::new();

        let mut args = argv.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--debounce-ms" => {
                    debounce = parse_debounce(require_value(&mut args, "--debounce-ms")?)?;
                }
                "--out" => {
                    out_dir = Some(PathBuf::from(require_value(&mut args, "--out")?));
                }
                "--yes" | "-y" => assume_yes = true,
                "--help" | "-h" => positional = vec!["help".to_owned()],
                _ if arg.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => positional.push(arg),
            }
        }

        let command = command_from(positional, out_dir)?;
        Ok(Self {
            db_url,
            debounce,
            assume_yes,
            command,
        })
    }
}

fn command_from(positional: Vec<String>, out_dir: Option<PathBuf>) -> Result<Command, ArgsError> {
    let mut words = positional.into_iter();
    let Some(cmd) = words.next() else {
        return Ok(Command::List);
    };
    let mut next = |name: &'static str| words.next().ok_or(ArgsError::MissingArgument { name });

    let command = match cmd.as_str() {
        "list" => Command::List,
        "help" => Command::Help,
        "add" => Command::Add {
            name: next("name")?,
            cycles: next("cycles")?,
        },
        "toggle" => {
            let id = next("id")?;
            let raw = next("cycle")?;
            let cycle = raw
                .parse::<usize>()
                .ok()
                .filter(|c| *c >= 1)
                .ok_or(ArgsError::InvalidCycle { raw })?;
            Command::Toggle { id, cycle }
        }
        "clear" => Command::Clear { id: next("id")? },
        "delete" => Command::Delete { id: next("id")? },
        "export" => Command::Export {
            out_dir: out_dir.unwrap_or_else(|| PathBuf::from(".")),
        },
        "import" => Command::Import {
            file: PathBuf::from(next("file")?),
        },
        _ => return Err(ArgsError::UnknownCommand(cmd)),
    };

    if let Some(extra) = words.next() {
        return Err(ArgsError::UnknownArg(extra));
    }
    Ok(command)
}

pub fn normalize_sqlite_url(raw: String) -> String {
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
