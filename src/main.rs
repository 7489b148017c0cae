mod ui;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, path::PathBuf, process};

use taskboard::config::{Config, ConfigOverrides};
use taskboard::csv_import;
use taskboard::logging;
use taskboard::storage::FileStorage;
use taskboard::task::next_sunday;
use taskboard::view::{self, View};
use taskboard::{Error, Result, Status, Task, TaskInput, TaskPatch, TaskStore};

#[derive(Parser)]
#[command(name = "taskboard", version, about = "Task list and kanban board in the terminal")]
struct Cli {
    /// Directory holding the task collection (env: TASKBOARD_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file to read instead of the default location
    #[arg(long, global = true, env = "TASKBOARD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive board (default)
    Tui,
    /// Print every task in stored order
    List,
    /// Print the kanban columns
    Board,
    /// Create a task
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// YYYY-MM-DD, defaults to the coming Sunday
        #[arg(long)]
        due: Option<NaiveDate>,
        /// Hours
        #[arg(long)]
        estimate: Option<f64>,
        #[arg(long, default_value = "To Do")]
        status: Status,
    },
    /// Change fields of a task; omitted fields are kept
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        /// An empty string clears the description
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(long)]
        estimate: Option<f64>,
        #[arg(long)]
        status: Option<Status>,
    },
    /// Delete a task and its comments
    Delete { id: String },
    /// Move a task to another column
    Move { id: String, status: Status },
    /// Work with a task's comments
    #[command(subcommand)]
    Comment(CommentCommands),
    /// Import tasks from a CSV file with a header row
    Import { file: PathBuf },
    /// Show or set the view the TUI opens on
    View { view: Option<View> },
}

#[derive(Subcommand)]
enum CommentCommands {
    Add { id: String, text: String },
    /// Replace the text of the comment at INDEX (0-based)
    Edit { id: String, index: usize, text: String },
    List { id: String },
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let overrides = ConfigOverrides::from_env().merge(ConfigOverrides {
        config_path: cli.config,
        data_dir: cli.data_dir,
        log_level: None,
    });
    let config = Config::resolve(overrides)?;
    let mut store = TaskStore::new(FileStorage::open(&config.data_dir)?);

    let command = cli.command.unwrap_or(Commands::Tui);
    if !matches!(command, Commands::Tui) {
        logging::init_stderr(&config.log_level);
    }

    match command {
        Commands::Tui => {
            let _guard = logging::init_file(&config.log_level, store.storage().dir());
            return run_tui(store);
        }
        Commands::List => {
            let tasks = store.list();
            if tasks.is_empty() {
                println!("No tasks yet. Add a new task to get started!");
            }
            for task in &tasks {
                println!("{}", list_line(task));
            }
        }
        Commands::Board => {
            for status in Status::ALL {
                let tasks = store.by_status(status);
                println!("{} ({})", status, tasks.len());
                for task in &tasks {
                    println!("  - {} [{}]", task.title, task.id);
                }
            }
        }
        Commands::Add {
            title,
            description,
            due,
            estimate,
            status,
        } => {
            let mut input = TaskInput::new(title)
                .with_status(status)
                .with_due_date(due.unwrap_or_else(|| next_sunday(Local::now().date_naive())));
            if let Some(description) = description {
                input = input.with_description(description);
            }
            if let Some(hours) = estimate {
                input = input.with_time_estimate(hours);
            }
            let task = store.create(input)?;
            println!("{}", task.id);
        }
        Commands::Edit {
            id,
            title,
            description,
            due,
            estimate,
            status,
        } => {
            let mut patch = TaskPatch::new(id.clone());
            patch.title = title;
            patch.description = description.map(Some);
            patch.due_date = due.map(Some);
            patch.time_estimate = estimate.map(Some);
            patch.status = status;
            if patch.is_empty() {
                return Err(Error::InvalidInput("nothing to change".to_string()));
            }
            if !store.update(patch)? {
                return Err(Error::NotFound(format!("task {id}")));
            }
            println!("Updated {id}");
        }
        Commands::Delete { id } => {
            if !store.delete(&id)? {
                return Err(Error::NotFound(format!("task {id}")));
            }
            println!("Deleted {id}");
        }
        Commands::Move { id, status } => {
            if !store.update(TaskPatch::new(id.clone()).with_status(status))? {
                return Err(Error::NotFound(format!("task {id}")));
            }
            println!("Moved {id} to {status}");
        }
        Commands::Comment(CommentCommands::Add { id, text }) => {
            if store.add_comment(&id, &text)?.is_none() {
                return Err(Error::NotFound(format!("task {id}")));
            }
            println!("Comment added");
        }
        Commands::Comment(CommentCommands::Edit { id, index, text }) => {
            store.edit_comment(&id, index, &text)?;
            println!("Comment updated");
        }
        Commands::Comment(CommentCommands::List { id }) => {
            let comments = store
                .comments(&id)
                .ok_or_else(|| Error::NotFound(format!("task {id}")))?;
            if comments.is_empty() {
                println!("No comments yet.");
            }
            for (index, comment) in comments.iter().enumerate() {
                println!(
                    "{index}. [{}] {}",
                    comment.date.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                    comment.text
                );
            }
        }
        Commands::Import { file } => {
            let summary = csv_import::import_file(&mut store, &file)?;
            println!("CSV imported successfully! {summary}");
        }
        Commands::View { view: Some(view) } => {
            view::save_active_view(store.storage_mut(), view)?;
            println!("{view}");
        }
        Commands::View { view: None } => {
            println!("{}", view::load_active_view(store.storage()));
        }
    }
    Ok(())
}

fn run_tui(store: TaskStore<FileStorage>) -> Result<()> {
    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = ui::App::new(store);
    let result = ui::run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn list_line(task: &Task) -> String {
    let due = task
        .due_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "No due date".to_string());
    let estimate = task
        .time_estimate
        .map(|h| format!("{h}h"))
        .unwrap_or_else(|| "No estimate".to_string());
    format!("{}  {}  {}  [{}]  {}", task.id, task.title, due, task.status, estimate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
