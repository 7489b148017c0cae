//! Which of the two views was open last.

use std::fmt;
use tracing::debug;

use crate::storage::{Storage, ACTIVE_VIEW_KEY};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    TaskList,
    KanbanBoard,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::TaskList => "task-list",
            View::KanbanBoard => "kanban-board",
        }
    }

    /// Heading shown above the view.
    pub fn title(&self) -> &'static str {
        match self {
            View::TaskList => "Detailed View",
            View::KanbanBoard => "Dashboard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "task-list" | "list" => Some(View::TaskList),
            "kanban-board" | "board" | "kanban" => Some(View::KanbanBoard),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            View::TaskList => View::KanbanBoard,
            View::KanbanBoard => View::TaskList,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for View {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        View::parse(s).ok_or_else(|| {
            Error::InvalidInput(format!("unknown view '{s}' (expected task-list or kanban-board)"))
        })
    }
}

/// The stored view, or the task list when none is stored or it is unreadable.
pub fn load_active_view<S: Storage>(storage: &S) -> View {
    match storage.get_item(ACTIVE_VIEW_KEY) {
        Ok(Some(value)) => View::parse(&value).unwrap_or_else(|| {
            debug!(value = %value, "unknown stored view, using task list");
            View::default()
        }),
        Ok(None) => View::default(),
        Err(err) => {
            debug!(error = %err, "could not read stored view");
            View::default()
        }
    }
}

pub fn save_active_view<S: Storage>(storage: &mut S, view: View) -> Result<()> {
    storage.set_item(ACTIVE_VIEW_KEY, view.as_str())
}
