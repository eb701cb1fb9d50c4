mod args;
mod console;

use std::path::Path;
use std::sync::Arc;

use services::{
    Clock, ImportInput, ImportOutcome, ImportSource, PersistenceConfig, PersistenceGateway,
    StoreError, SubjectStore, UserPrompt, export, import, parse_subject_form,
};
use storage::repository::Storage;
use study_core::SubjectId;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::args::{Args, ArgsError, Command, print_usage};
use crate::console::{TerminalPrompt, render_subject};

/// Logs go to stderr so command output on stdout stays clean.
fn init_tracing() {
    let filter = EnvFilter::new(
        std::env::var("STUDY_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "warn".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse(std::env::args().skip(1), |key| std::env::var(key).ok()).map_err(
        |e| {
            eprintln!("{e}");
            print_usage();
            e
        },
    )?;

    if args.command == Command::Help {
        print_usage();
        return Ok(());
    }

    prepare_sqlite_file(&args.db_url)?;
    let storage = Storage::sqlite(&args.db_url).await?;
    let config = PersistenceConfig {
        debounce: args.debounce,
        ..PersistenceConfig::default()
    };
    let mut store = SubjectStore::open(PersistenceGateway::new(Arc::clone(&storage.kv), config)).await;
    let prompt = TerminalPrompt::new(args.assume_yes);

    let result = execute(&mut store, args.command, &prompt).await;

    // A debounced write may still be pending; it has to land before exit.
    if !store.flush().await {
        warn_unsaved();
    }
    result
}

fn warn_unsaved() {
    eprintln!("warning: changes could not be saved; see log for details");
}

async fn execute(
    store: &mut SubjectStore,
    command: Command,
    prompt: &dyn UserPrompt,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Help => print_usage(),
        Command::List => {
            if store.is_empty() {
                println!("No subjects yet. Add one with: study add <name> <cycles>");
            }
            for subject in store.subjects() {
                println!("{}", render_subject(subject));
            }
        }
        Command::Add { name, cycles } => {
            let draft = parse_subject_form(&name, &cycles)?;
            let created = store.create(draft);
            if let Some(warning) = created.clamp_warning() {
                prompt.warn(&warning);
            }
            println!("{}", render_subject(&created.subject));
        }
        Command::Toggle { id, cycle } => {
            let id: SubjectId = id.parse()?;
            store.toggle_mark(&id, cycle - 1)?;
            if let Some(subject) = store.get(&id) {
                println!("{}", render_subject(subject));
            }
        }
        Command::Clear { id } => {
            let id: SubjectId = id.parse()?;
            if !store.clear_marks(&id).await? {
                warn_unsaved();
            }
            if let Some(subject) = store.get(&id) {
                println!("{}", render_subject(subject));
            }
        }
        Command::Delete { id } => {
            let id: SubjectId = id.parse()?;
            let title = store
                .get(&id)
                .map(|s| s.title().to_owned())
                .ok_or_else(|| StoreError::SubjectNotFound { id: id.clone() })?;
            if prompt.confirm(&format!("Are you sure you want to delete \"{title}\"?")) {
                if !store.delete(&id).await? {
                    warn_unsaved();
                }
                println!("Deleted \"{title}\".");
            } else {
                println!("Nothing deleted.");
            }
        }
        Command::Export { out_dir } => {
            let artifact = export(store.subjects(), &Clock::default_clock());
            tokio::fs::create_dir_all(&out_dir).await?;
            let path = out_dir.join(&artifact.file_name);
            tokio::fs::write(&path, artifact.contents.as_bytes()).await?;
            println!("Exported {} subjects to {}", store.len(), path.display());
        }
        Command::Import { file } => {
            let mut input = ImportInput::new();
            input.select(ImportSource::File(file));
            match import(store, &mut input, prompt)
                .await
                .map_err(|e| format!("error importing file: {e}"))?
            {
                ImportOutcome::Declined => println!("Import cancelled; subjects unchanged."),
                ImportOutcome::NothingSelected => println!("No file selected."),
                ImportOutcome::Imported(report) => {
                    tracing::debug!(imported = report.imported, "import applied");
                    if !report.persisted {
                        warn_unsaved();
                    }
                }
            }
        }
    }
    Ok(())
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

    let path = Path::new(path);
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

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
