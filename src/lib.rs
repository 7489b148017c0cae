//! Taskboard - a task list and kanban board over one local task collection.
//!
//! The library holds the core: the persisted [`store::TaskStore`], comment
//! threads, CSV import, and the drag-and-drop engine behind the kanban view.
//! The `taskboard` binary wraps it in a terminal UI and a command line.

pub mod comments;
pub mod config;
pub mod csv_import;
pub mod kanban_board;
pub mod logging;
pub mod storage;
pub mod store;
pub mod task;
pub mod view;

pub use store::TaskStore;
pub use task::{Comment, Status, Task, TaskInput, TaskPatch};

/// Library-level error type for taskboard operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error reports a missing task or comment.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

/// Result type alias for taskboard operations.
pub type Result<T> = std::result::Result<T, Error>;
