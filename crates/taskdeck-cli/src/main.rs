mod editor;
mod render;
mod setup;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use taskdeck_core::config::{default_config_path, load_settings};
use taskdeck_core::intent::{execute, Intent, Outcome};
use taskdeck_core::query::{Scope, StatusFilter};
use taskdeck_core::repository::TaskField;
use taskdeck_core::task::{TaskId, TaskStatus};
use taskdeck_core::workspace::Workspace;

#[derive(Parser)]
#[command(name = "taskdeck", version, about = "Personal task manager with environments")]
struct Cli {
    /// Config file to use (default: $TASKDECK_HOME/taskdeck.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Initial setup of the storage directory and config
    Setup {
        #[arg(long)]
        storage_path: Option<PathBuf>,
        #[arg(long)]
        editor: Option<String>,
    },
    /// Open the config file in the preferred editor
    Config,
    /// Create a task in the current environment
    New {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
        /// Task importance (1-10)
        #[arg(short, long, value_parser = clap::value_parser!(i64).range(1..=10))]
        importance: Option<i64>,
        /// Text for the task note
        #[arg(short, long)]
        message: Option<String>,
        /// Open the note in the editor once created
        #[arg(long)]
        edit: bool,
    },
    /// Open a task note in the preferred editor
    Open { id: TaskId },
    /// Mark a task complete
    Complete { id: TaskId },
    /// Mark a task deleted
    Delete { id: TaskId },
    /// Rename a task
    Rename {
        id: TaskId,
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// Change a task's importance
    Importance {
        id: TaskId,
        #[arg(value_parser = clap::value_parser!(i64).range(1..=10))]
        importance: i64,
    },
    /// List tasks: `current`, `all`, or a task id
    #[command(alias = "ls")]
    List {
        #[arg(default_value = "current")]
        scope: Scope,
        /// Include completed tasks
        #[arg(long)]
        completed: bool,
        /// Include deleted tasks
        #[arg(long)]
        deleted: bool,
        /// Sort by id, importance or status
        #[arg(long, default_value = "id")]
        sort: String,
        #[arg(long)]
        json: bool,
    },
    /// Show the current environment, or `all` environments
    Env {
        #[arg(default_value = "current", value_parser = ["current", "all"])]
        which: String,
        #[arg(long)]
        json: bool,
    },
    /// Change the current environment
    Switch { name: String },
    /// Print version information
    Version,
}

#[derive(Default, Clone, Copy)]
struct Output {
    json: bool,
    edit: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };
    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };

    match command {
        Command::Version => {
            println!("taskdeck {}", taskdeck_core::version());
        }
        Command::Setup {
            storage_path,
            editor,
        } => {
            if setup::run_setup(&config_path, storage_path, editor)?.is_some() {
                println!("Setup complete.");
            }
        }
        Command::Config => {
            let configured = load_settings(&config_path).ok().map(|settings| settings.editor);
            editor::open_in_editor(configured.as_deref(), &config_path)?;
        }
        Command::New {
            name,
            importance,
            message,
            edit,
        } => dispatch(
            &config_path,
            Intent::CreateTask {
                name: name.join(" "),
                importance,
                message,
            },
            Output {
                edit,
                ..Output::default()
            },
        )?,
        Command::Open { id } => dispatch(&config_path, Intent::OpenTask { id }, Output::default())?,
        Command::Complete { id } => dispatch(
            &config_path,
            Intent::UpdateStatus {
                id,
                status: TaskStatus::Complete,
            },
            Output::default(),
        )?,
        Command::Delete { id } => dispatch(
            &config_path,
            Intent::UpdateStatus {
                id,
                status: TaskStatus::Deleted,
            },
            Output::default(),
        )?,
        Command::Rename { id, name } => dispatch(
            &config_path,
            Intent::Rename {
                id,
                name: name.join(" "),
            },
            Output::default(),
        )?,
        Command::Importance { id, importance } => dispatch(
            &config_path,
            Intent::ChangeImportance { id, importance },
            Output::default(),
        )?,
        Command::List {
            scope,
            completed,
            deleted,
            sort,
            json,
        } => dispatch(
            &config_path,
            Intent::ListTasks {
                scope,
                filter: StatusFilter {
                    include_completed: completed,
                    include_deleted: deleted,
                },
                sort,
            },
            Output {
                json,
                ..Output::default()
            },
        )?,
        Command::Env { which, json } => dispatch(
            &config_path,
            Intent::GetEnvironment { all: which == "all" },
            Output {
                json,
                ..Output::default()
            },
        )?,
        Command::Switch { name } => dispatch(
            &config_path,
            Intent::ChangeEnvironment { name },
            Output::default(),
        )?,
    }
    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("TASKDECK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn dispatch(config_path: &Path, intent: Intent, output: Output) -> Result<()> {
    let mut ws = Workspace::open(config_path)?;
    let outcome = execute(&mut ws, intent)?;
    report(&ws, outcome, output)
}

fn report(ws: &Workspace, outcome: Outcome, output: Output) -> Result<()> {
    match outcome {
        Outcome::Created {
            id,
            name,
            environment,
            note_path,
        } => {
            println!(
                "Task \"ID: {} - {}\" has been created in the {} environment!",
                id, name, environment
            );
            if output.edit {
                editor::open_in_editor(Some(ws.editor()), &note_path)?;
            }
        }
        Outcome::Located(task) => {
            println!(
                "Opening task {} in {}: {}",
                task.record.task_id, task.environment, task.record.task_path
            );
            editor::open_in_editor(Some(ws.editor()), task.note_path())?;
        }
        Outcome::Updated { id, field } => println!("{}", describe_update(id, &field)),
        Outcome::NotFound { id } => println!("No task found with ID {}.", id),
        Outcome::Tasks(tasks) => {
            if output.json {
                print_json(&tasks)?;
            } else if tasks.is_empty() {
                println!("No tasks to show.");
            } else {
                println!("{}", render::render_task_table(&tasks));
            }
        }
        Outcome::EnvironmentChanged { name } => {
            println!("Switched to the {} environment.", name);
        }
        Outcome::CurrentEnvironment { name } => {
            if output.json {
                print_json(&serde_json::json!({ "current_environment": name }))?;
            } else {
                println!("{}", name);
            }
        }
        Outcome::Environments(environments) => {
            if output.json {
                print_json(&environments)?;
            } else if environments.is_empty() {
                println!("No environments yet.");
            } else {
                println!("{}", render::render_environments(&environments));
            }
        }
    }
    Ok(())
}

fn describe_update(id: TaskId, field: &TaskField) -> String {
    match field {
        TaskField::Name(name) => format!("Task {} renamed to {}.", id, name),
        TaskField::Importance(value) => format!("Task {} importance updated to {}.", id, value),
        TaskField::Status(TaskStatus::Complete) => format!("Task {} is now completed!", id),
        TaskField::Status(TaskStatus::Deleted) => format!("Task {} marked as deleted.", id),
        TaskField::Status(TaskStatus::Pending) => format!("Task {} is pending again.", id),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let body = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{}", body);
    Ok(())
}
