//! Drag-and-drop engine behind the kanban view.
//!
//! The UI records where it drew each column and card in a [`BoardLayout`]
//! every frame. Pointer events are fed to [`KanbanBoard`], which tracks the
//! gesture (idle, dragging, hovering over a column) and commits a drop as a
//! status change through the [`TaskStore`]. Only the status is persisted;
//! the insertion point shown while hovering is a preview and is gone after
//! the next redraw.

use ratatui::layout::Rect;
use std::mem;
use tracing::debug;

use crate::storage::Storage;
use crate::store::TaskStore;
use crate::task::{Status, Task, TaskPatch};
use crate::Result;

/// Where one card was drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardLayout {
    pub task_id: String,
    pub area: Rect,
}

/// Where one column was drawn, with its cards in visual order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    pub status: Status,
    pub area: Rect,
    pub cards: Vec<CardLayout>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardLayout {
    pub columns: Vec<ColumnLayout>,
}

impl BoardLayout {
    pub fn column_at(&self, x: u16, y: u16) -> Option<&ColumnLayout> {
        self.columns.iter().find(|c| hit(c.area, x, y))
    }

    pub fn card_at(&self, x: u16, y: u16) -> Option<(&ColumnLayout, &CardLayout)> {
        self.columns.iter().find_map(|column| {
            column
                .cards
                .iter()
                .find(|card| hit(card.area, x, y))
                .map(|card| (column, card))
        })
    }
}

fn hit(area: Rect, x: u16, y: u16) -> bool {
    let (x, y) = (u32::from(x), u32::from(y));
    x >= u32::from(area.x)
        && x < u32::from(area.x) + u32::from(area.width)
        && y >= u32::from(area.y)
        && y < u32::from(area.y) + u32::from(area.height)
}

/// The card the dragged card should be inserted before when the pointer is
/// at row `y`, or `None` to append at the end of the column.
///
/// Picks the card whose vertical midpoint is closest below the pointer. On a
/// tie the card that comes first in visual order wins.
pub fn drag_after_card<'a>(column: &'a ColumnLayout, y: u16, dragged_id: &str) -> Option<&'a str> {
    let mut closest: Option<(i32, &str)> = None;
    for card in column.cards.iter().filter(|c| c.task_id != dragged_id) {
        // Doubled so the midpoint stays integral.
        let offset = 2 * i32::from(y) - 2 * i32::from(card.area.y) - i32::from(card.area.height);
        if offset < 0 && closest.map_or(true, |(best, _)| offset > best) {
            closest = Some((offset, card.task_id.as_str()));
        }
    }
    closest.map(|(_, id)| id)
}

/// Gesture state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    /// Pointer pressed on a card, not over any column.
    Dragging { task_id: String, origin: Status },
    /// Over `column`; the placeholder sits before `before`, or at the end.
    Hovering {
        task_id: String,
        origin: Status,
        column: Status,
        before: Option<String>,
    },
}

impl DragState {
    pub fn task_id(&self) -> Option<&str> {
        match self {
            DragState::Idle => None,
            DragState::Dragging { task_id, .. } | DragState::Hovering { task_id, .. } => {
                Some(task_id.as_str())
            }
        }
    }
}

/// How a pointer release ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// No gesture was in progress.
    Idle,
    /// Released outside every column.
    Cancelled { task_id: String },
    /// The dragged task no longer exists in the store.
    Missing { task_id: String },
    Moved { task_id: String, from: Status, to: Status },
}

/// Kanban interaction state: the drag gesture plus keyboard selection.
#[derive(Debug, Default)]
pub struct KanbanBoard {
    state: DragState,
    pub selected_status: usize,
    pub selected_task: usize,
}

impl KanbanBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.state != DragState::Idle
    }

    /// Start a gesture if the pointer is on a card.
    pub fn pointer_down(&mut self, layout: &BoardLayout, x: u16, y: u16) -> bool {
        let Some((column, card)) = layout.card_at(x, y) else {
            return false;
        };
        debug!(task_id = %card.task_id, "drag started");
        self.selected_status = column.status.index();
        self.state = DragState::Dragging {
            task_id: card.task_id.clone(),
            origin: column.status,
        };
        true
    }

    /// Recompute the hovered column and insertion point.
    pub fn pointer_move(&mut self, layout: &BoardLayout, x: u16, y: u16) {
        let (task_id, origin) = match &self.state {
            DragState::Idle => return,
            DragState::Dragging { task_id, origin }
            | DragState::Hovering {
                task_id, origin, ..
            } => (task_id.clone(), *origin),
        };

        self.state = match layout.column_at(x, y) {
            Some(column) => DragState::Hovering {
                before: drag_after_card(column, y, &task_id).map(str::to_string),
                column: column.status,
                task_id,
                origin,
            },
            None => DragState::Dragging { task_id, origin },
        };
    }

    /// Finish the gesture. A release over a column sets the task's status to
    /// that column's, even when it is unchanged.
    pub fn pointer_up<S: Storage>(
        &mut self,
        store: &mut TaskStore<S>,
        layout: &BoardLayout,
        x: u16,
        y: u16,
    ) -> Result<DropOutcome> {
        let (task_id, origin) = match mem::take(&mut self.state) {
            DragState::Idle => return Ok(DropOutcome::Idle),
            DragState::Dragging { task_id, origin }
            | DragState::Hovering {
                task_id, origin, ..
            } => (task_id, origin),
        };

        let Some(column) = layout.column_at(x, y) else {
            debug!(%task_id, "drop outside the board");
            return Ok(DropOutcome::Cancelled { task_id });
        };
        let to = column.status;

        let patch = TaskPatch::new(task_id.clone()).with_status(to);
        if !store.update(patch)? {
            debug!(%task_id, "dropped task no longer exists");
            return Ok(DropOutcome::Missing { task_id });
        }

        debug!(%task_id, from = %origin, %to, "task dropped");
        self.selected_status = to.index();
        Ok(DropOutcome::Moved {
            task_id,
            from: origin,
            to,
        })
    }

    /// Abandon the gesture without touching the store.
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }

    /// Tasks per column in display order. While hovering, the dragged task is
    /// shown at the pending insertion point.
    pub fn preview(&self, tasks: &[Task]) -> Vec<(Status, Vec<Task>)> {
        let mut columns: Vec<(Status, Vec<Task>)> = Status::ALL
            .iter()
            .map(|status| {
                let in_column: Vec<Task> = tasks
                    .iter()
                    .filter(|t| t.status == *status)
                    .cloned()
                    .collect();
                (*status, in_column)
            })
            .collect();

        let DragState::Hovering { task_id, column, before, .. } = &self.state else {
            return columns;
        };
        let Some(dragged) = tasks.iter().find(|t| &t.id == task_id) else {
            return columns;
        };

        for (_, cards) in columns.iter_mut() {
            cards.retain(|t| &t.id != task_id);
        }
        let cards = &mut columns[column.index()].1;
        let at = before
            .as_ref()
            .and_then(|id| cards.iter().position(|t| &t.id == id))
            .unwrap_or(cards.len());
        cards.insert(at, dragged.clone());
        columns
    }

    pub fn selected_column(&self) -> Status {
        Status::ALL[self.selected_status.min(Status::ALL.len() - 1)]
    }

    /// The task under the keyboard cursor, if the column has one.
    pub fn selected_task_id<S: Storage>(&self, store: &TaskStore<S>) -> Option<String> {
        store
            .by_status(self.selected_column())
            .into_iter()
            .nth(self.selected_task)
            .map(|t| t.id)
    }

    pub fn select_column(&mut self, direction: isize) {
        self.selected_status = self.selected_column().shifted(direction).index();
        self.selected_task = 0;
    }

    pub fn select_task(&mut self, direction: isize, column_len: usize) {
        if column_len == 0 {
            self.selected_task = 0;
            return;
        }
        let next = (self.selected_task as isize + direction).clamp(0, column_len as isize - 1);
        self.selected_task = next as usize;
    }

    /// Keyboard equivalent of a drop: move the selected task one column
    /// left or right.
    pub fn move_selected<S: Storage>(
        &mut self,
        store: &mut TaskStore<S>,
        direction: isize,
    ) -> Result<bool> {
        let Some(task_id) = self.selected_task_id(store) else {
            return Ok(false);
        };
        let to = self.selected_column().shifted(direction);
        if to == self.selected_column() {
            return Ok(false);
        }
        let moved = store.update(TaskPatch::new(task_id).with_status(to))?;
        if moved {
            self.selected_status = to.index();
            self.selected_task = store.by_status(to).len().saturating_sub(1);
        }
        Ok(moved)
    }
}
