//! Command-line interface for taskboard
//!
//! One-shot commands over the same data directory the terminal UI uses.
//! Running without a subcommand opens the UI.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::debug;

use crate::auth::{Credential, CredentialStore};
use crate::config::{self, Config, CONFIG_FILE, DATA_DIR_ENV};
use crate::error::{Error, Result};
use crate::export;
use crate::kanban_board::{DateField, DateFilter, KanbanBoard, SortOption, TaskFilter};
use crate::route::Route;
use crate::storage::FileStore;
use crate::task::{Priority, Status, Task};
use crate::ui;

/// taskboard - a three-column task board for the terminal
#[derive(Parser, Debug)]
#[command(name = "taskboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding users, session and tasks
    #[arg(long, global = true, env = DATA_DIR_ENV)]
    pub data_dir: Option<PathBuf>,

    /// Config file (defaults to taskboard.toml in the data directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory and a default config file
    Init,

    /// Add a user (duplicates are allowed)
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Start a session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// End the session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Open the terminal UI
    Tui,

    #[command(flatten)]
    Board(BoardCommand),
}

/// Commands that act on the task board and require a session.
#[derive(Subcommand, Debug)]
pub enum BoardCommand {
    /// Add a task to the todo column
    Add {
        title: String,
        /// Low, Medium or High (defaults to the configured priority)
        #[arg(long, short)]
        priority: Option<Priority>,
        /// Due date, YYYY-MM-DD
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(long, short)]
        description: Option<String>,
    },

    /// Print the three columns
    List {
        #[arg(long, short)]
        priority: Option<Priority>,
        /// Only tasks created on this day
        #[arg(long, conflicts_with = "due_on")]
        created: Option<NaiveDate>,
        /// Only tasks due on this day
        #[arg(long)]
        due_on: Option<NaiveDate>,
        /// none, created or due (defaults to the configured sort)
        #[arg(long)]
        sort: Option<SortOption>,
        #[arg(long)]
        json: bool,
    },

    /// Move a task to another column
    Move { id: String, status: Status },

    /// Delete a task
    Delete { id: String },

    /// Change a task's fields
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, short)]
        priority: Option<Priority>,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<NaiveDate>,
        #[arg(long)]
        clear_due: bool,
        #[arg(long, short)]
        description: Option<String>,
    },

    /// Count tasks per column
    Stats,

    /// Write all tasks to a CSV file
    Export { path: PathBuf },
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let data_dir = self.data_dir.clone().unwrap_or_else(config::default_data_dir);
        let config_path = self
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join(CONFIG_FILE));
        debug!(data_dir = %data_dir.display(), config = %config_path.display(), "starting");

        let config = Config::load_or_default(&config_path)?;
        let store = FileStore::open(&data_dir)?;
        let auth = CredentialStore::new(&store);

        match self.command.unwrap_or(Commands::Tui) {
            Commands::Init => init(&data_dir, &config_path)?,
            Commands::Register { email, password } => {
                auth.register(Credential::new(email.clone(), password))?;
                println!("Registered {email}");
            }
            Commands::Login { email, password } => {
                auth.submit_login(&email, &password)?;
                println!("Logged in as {email}");
            }
            Commands::Logout => {
                auth.logout()?;
                println!("Logged out");
            }
            Commands::Whoami => match auth.current_user()? {
                Some(user) => println!("{}", user.email),
                None => return Err(Error::NotLoggedIn),
            },
            Commands::Tui => {
                let mut app = ui::App::new(&store, config)?;
                ui::run(&mut app)?;
            }
            Commands::Board(board_command) => {
                if auth.guard_dashboard()? == Route::Login {
                    return Err(Error::NotLoggedIn);
                }
                let mut board = KanbanBoard::open(&store)?;
                run_board_command(&mut board, &config, board_command)?;
            }
        }
        Ok(())
    }
}

fn init(data_dir: &Path, config_path: &Path) -> Result<()> {
    FileStore::open(data_dir)?;
    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
    } else {
        Config::default().save(config_path)?;
        println!("Initialized taskboard in {}", data_dir.display());
    }
    Ok(())
}

fn run_board_command(
    board: &mut KanbanBoard<&FileStore>,
    config: &Config,
    command: BoardCommand,
) -> Result<()> {
    match command {
        BoardCommand::Add {
            title,
            priority,
            due,
            description,
        } => {
            let priority = priority.unwrap_or(config.default_priority);
            match board.add_task(&title, priority, due, description)? {
                Some(id) => println!("Added {} {}", id.short(), title.trim()),
                None => println!("Nothing added: title is empty"),
            }
        }
        BoardCommand::List {
            priority,
            created,
            due_on,
            sort,
            json,
        } => {
            let date = created
                .map(|date| DateFilter {
                    field: DateField::CreatedAt,
                    date,
                })
                .or(due_on.map(|date| DateFilter {
                    field: DateField::DueDate,
                    date,
                }));
            board.set_filter(TaskFilter { priority, date });
            board.set_sort(sort.unwrap_or(config.default_sort));
            if json {
                print_json(board)?;
            } else {
                print_columns(board);
            }
        }
        BoardCommand::Move { id, status } => {
            let id = board.find_by_prefix(&id)?;
            board.change_status(id, status)?;
            println!("Moved {} to {}", id.short(), status);
        }
        BoardCommand::Delete { id } => {
            let id = board.find_by_prefix(&id)?;
            board.delete_task(id)?;
            println!("Deleted {}", id.short());
        }
        BoardCommand::Edit {
            id,
            title,
            priority,
            due,
            clear_due,
            description,
        } => {
            let id = board.find_by_prefix(&id)?;
            let mut edit = board
                .edit_task(id)
                .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
            if let Some(title) = title {
                edit.title = title;
            }
            if let Some(priority) = priority {
                edit.priority = priority;
            }
            if due.is_some() || clear_due {
                edit.due_date = due;
            }
            if let Some(description) = description {
                edit.description = Some(description);
            }
            if board.save_edit(id, edit)? {
                println!("Saved {}", id.short());
            } else {
                board.cancel_edit(id)?;
                return Err(Error::InvalidArgument("title cannot be empty".to_string()));
            }
        }
        BoardCommand::Stats => {
            for (status, count) in board.stats() {
                println!("{}: {}", status.label(), count);
            }
        }
        BoardCommand::Export { path } => {
            export::save_to_csv(board.tasks(), &path)?;
            println!("Exported {} tasks to {}", board.tasks().len(), path.display());
        }
    }
    Ok(())
}

fn task_line(task: &Task) -> String {
    let mut line = format!("  {} [{}] {}", task.id.short(), task.priority, task.title);
    if let Some(due) = task.due_date {
        line.push_str(&format!(" (Due: {due})"));
    }
    line
}

fn print_columns(board: &KanbanBoard<&FileStore>) {
    for (status, tasks) in board.partitions() {
        println!("{} ({})", status.label(), tasks.len());
        for task in tasks {
            println!("{}", task_line(task));
        }
    }
}

fn print_json(board: &KanbanBoard<&FileStore>) -> Result<()> {
    let value = json!({
        "todo": board.partition(Status::Todo),
        "inProgress": board.partition(Status::InProgress),
        "done": board.partition(Status::Done),
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
