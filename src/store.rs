//! The task store: sole owner of the persisted task collection.
//!
//! Every mutation reads the whole collection, changes it, and writes it back
//! under [`TASKS_KEY`]. Reads never fail: a missing or unreadable slot is an
//! empty collection, and a single record that cannot be read as a task is
//! skipped without hiding its neighbours.

use chrono::Utc;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::storage::{Storage, TASKS_KEY};
use crate::task::{new_id, Status, Task, TaskInput, TaskPatch};
use crate::Result;

#[derive(Debug)]
pub struct TaskStore<S: Storage> {
    storage: S,
}

impl<S: Storage> TaskStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// All tasks in persisted order.
    pub fn list(&self) -> Vec<Task> {
        let data = match self.storage.get_item(TASKS_KEY) {
            Ok(Some(data)) => data,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(error = %err, "failed to read task collection, treating as empty");
                return Vec::new();
            }
        };
        let records: Vec<serde_json::Value> = match serde_json::from_str(&data) {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, "malformed task collection, treating as empty");
                return Vec::new();
            }
        };
        records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match serde_json::from_value(record) {
                Ok(task) => Some(task),
                Err(err) => {
                    warn!(index, error = %err, "skipping unreadable task record");
                    None
                }
            })
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<Task> {
        self.list().into_iter().find(|t| t.id == id)
    }

    /// Tasks in one status column, in persisted order.
    pub fn by_status(&self, status: Status) -> Vec<Task> {
        self.list()
            .into_iter()
            .filter(|t| t.status == status)
            .collect()
    }

    pub fn create(&mut self, input: TaskInput) -> Result<Task> {
        let mut tasks = self.list();
        let taken: HashSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        let mut id = new_id();
        while taken.contains(id.as_str()) {
            id = new_id();
        }

        let task = input.into_task(id, Utc::now());
        tasks.push(task.clone());
        self.save(&tasks)?;
        debug!(id = %task.id, title = %task.title, "task created");
        Ok(task)
    }

    /// Merge `patch` onto the task with the same id. Returns `false` without
    /// writing anything when no such task exists.
    pub fn update(&mut self, patch: TaskPatch) -> Result<bool> {
        self.modify(&patch.id, |task| patch.apply(task))
            .map(|updated| updated.is_some())
    }

    pub fn delete(&mut self, id: &str) -> Result<bool> {
        let mut tasks = self.list();
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Ok(false);
        }
        self.save(&tasks)?;
        debug!(id, "task deleted");
        Ok(true)
    }

    /// Apply `f` to the task with `id` and persist. `Ok(None)` when the task
    /// is missing; nothing is written in that case.
    pub(crate) fn modify<T>(
        &mut self,
        id: &str,
        f: impl FnOnce(&mut Task) -> T,
    ) -> Result<Option<T>> {
        let mut tasks = self.list();
        let Some(task) = tasks.iter_mut().find(|t| t.id == id) else {
            debug!(id, "no task with this id");
            return Ok(None);
        };
        let out = f(task);
        self.save(&tasks)?;
        debug!(id, "task updated");
        Ok(Some(out))
    }

    fn save(&mut self, tasks: &[Task]) -> Result<()> {
        let data = serde_json::to_string(tasks)?;
        self.storage.set_item(TASKS_KEY, &data)
    }
}
