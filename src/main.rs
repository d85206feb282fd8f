use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Context, Result};
use std::fs;
use std::path::PathBuf;
use todostore::{
    Backend, ClearOutcome, Config, DeleteOutcome, FilterKind, ImportMode, JsonFileAdapter,
    PersistenceAdapter, Priority, SqliteAdapter, Task, TaskId, TaskStore,
};

#[derive(Parser)]
#[command(name = "todostore")]
#[command(about = "Task list manager with local persistence")]
#[command(version)]
struct Cli {
    /// Directory holding saved tasks (default: config file, then the platform data dir)
    #[arg(short, long)]
    store_path: Option<PathBuf>,

    /// Storage backend: json or sqlite
    #[arg(short, long)]
    backend: Option<Backend>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        text: String,
        /// low, medium or high
        #[arg(short, long, default_value = "medium")]
        priority: Priority,
    },

    /// List tasks under the saved filter (or a one-off override)
    List {
        #[arg(short, long)]
        filter: Option<FilterKind>,
    },

    /// Toggle a task between active and completed
    Toggle { id: TaskId },

    /// Rewrite a task's text
    Edit { id: TaskId, text: String },

    /// Delete a task
    Delete {
        id: TaskId,
        /// Confirm deleting a high-priority active task
        #[arg(short, long)]
        yes: bool,
    },

    /// Remove all completed tasks
    Clear {
        /// Confirm the removal
        #[arg(short, long)]
        yes: bool,
    },

    /// Set the saved filter
    Filter { kind: FilterKind },

    /// Show task counts
    Stats,

    /// Write the collection to a JSON export file
    Export { path: PathBuf },

    /// Load tasks from a JSON export file
    Import {
        path: PathBuf,
        /// merge prepends imported tasks; replace discards existing ones
        #[arg(short, long, default_value = "merge")]
        mode: ImportMode,
    },
}

fn main() -> Result<()> {
    // Setup tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::load();

    let store_path = cli
        .store_path
        .or_else(|| config.store_path.clone())
        .unwrap_or_else(Config::default_store_path);
    let backend = cli.backend.unwrap_or(config.backend);

    let adapter: Box<dyn PersistenceAdapter> = match backend {
        Backend::Json => Box::new(
            JsonFileAdapter::open(&store_path)
                .with_context(|| format!("Failed to open store at {}", store_path.display()))?,
        ),
        Backend::Sqlite => {
            let db_path = store_path.join("todostore.db");
            Box::new(
                SqliteAdapter::open(&db_path)
                    .with_context(|| format!("Failed to open database at {}", db_path.display()))?,
            )
        }
    };
    let mut store = TaskStore::open(adapter);

    match cli.command {
        Commands::Add { text, priority } => {
            let task = store.add(&text, priority)?;
            println!("{} #{} {}", "added".green().bold(), task.id, task.text);
        }

        Commands::List { filter } => {
            let kind = filter.unwrap_or_else(|| store.filter());
            let tasks: Vec<&Task> = store.view(kind).collect();
            if tasks.is_empty() {
                println!("no tasks ({})", kind);
            } else {
                for task in tasks {
                    println!("{}", render_task(task));
                }
            }
        }

        Commands::Toggle { id } => {
            let task = store.toggle_complete(id)?;
            if task.completed {
                println!("{} #{} {}", "completed".green().bold(), task.id, task.text);
            } else {
                println!("{} #{} {}", "reopened".cyan().bold(), task.id, task.text);
            }
        }

        Commands::Edit { id, text } => {
            let task = store.edit(id, &text)?;
            println!("{} #{} {}", "edited".green().bold(), task.id, task.text);
        }

        Commands::Delete { id, yes } => match store.delete(id, yes)? {
            DeleteOutcome::Deleted(task) => {
                println!("{} #{} {}", "deleted".green().bold(), task.id, task.text);
            }
            DeleteOutcome::ConfirmationRequired => {
                println!(
                    "{} task #{} is high-priority and still active; re-run with --yes to delete it",
                    "not deleted:".yellow().bold(),
                    id
                );
            }
        },

        Commands::Clear { yes } => match store.clear_completed(yes) {
            ClearOutcome::Cleared(count) => {
                println!("{} {} completed task(s)", "cleared".green().bold(), count);
            }
            ClearOutcome::ConfirmationRequired(count) => {
                println!(
                    "{} this removes {} completed task(s); re-run with --yes to confirm",
                    "not cleared:".yellow().bold(),
                    count
                );
            }
            ClearOutcome::NothingToClear => println!("nothing to clear"),
        },

        Commands::Filter { kind } => {
            store.set_filter(kind);
            println!("filter set to {}", kind);
        }

        Commands::Stats => {
            let stats = store.stats();
            println!(
                "total: {}  active: {}  completed: {}",
                stats.total, stats.active, stats.completed
            );
        }

        Commands::Export { path } => {
            let envelope = store.export()?;
            let json = serde_json::to_string_pretty(&envelope)?;
            fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{} {} task(s) to {}",
                "exported".green().bold(),
                envelope.tasks.len(),
                path.display()
            );
        }

        Commands::Import { path, mode } => {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let count = store.import(&raw, mode)?;
            println!("{} {} task(s) ({})", "imported".green().bold(), count, mode);
        }
    }

    if let Some(err) = store.save_warning() {
        eprintln!(
            "{} changes were not saved: {}",
            "warning:".yellow().bold(),
            err
        );
    }

    Ok(())
}

fn render_task(task: &Task) -> String {
    let marker = if task.completed {
        "[x]".green()
    } else {
        "[ ]".normal()
    };
    let priority = match task.priority {
        Priority::High => "high  ".red().bold(),
        Priority::Medium => "medium".yellow(),
        Priority::Low => "low   ".dimmed(),
    };
    let text = if task.completed {
        task.text.dimmed().strikethrough()
    } else {
        task.text.normal()
    };
    format!(
        "{} #{:<4} {} {} {}",
        marker,
        task.id,
        priority,
        format_date(task.created_at).dimmed(),
        text
    )
}

fn format_date(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}
