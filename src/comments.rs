//! Comment threads, mutated through the [`TaskStore`].

use chrono::Utc;
use tracing::debug;

use crate::storage::Storage;
use crate::store::TaskStore;
use crate::task::Comment;
use crate::{Error, Result};

impl<S: Storage> TaskStore<S> {
    /// The comment thread of a task, oldest first.
    pub fn comments(&self, task_id: &str) -> Option<Vec<Comment>> {
        self.get(task_id).map(|t| t.comments)
    }

    /// Append a comment. `Ok(None)` when the task does not exist.
    pub fn add_comment(&mut self, task_id: &str, text: &str) -> Result<Option<Comment>> {
        let comment = Comment::new(text);
        let added = self.modify(task_id, |task| {
            task.comments.push(comment.clone());
        })?;
        if added.is_some() {
            debug!(task_id, comment_id = %comment.id, "comment added");
        }
        Ok(added.map(|()| comment))
    }

    /// Replace the text of the comment at `index` and refresh its timestamp.
    pub fn edit_comment(&mut self, task_id: &str, index: usize, text: &str) -> Result<Comment> {
        self.edit_comment_where(task_id, text, |comments| {
            comments
                .get(index)
                .map(|_| index)
                .ok_or_else(|| Error::NotFound(format!("comment #{index} on task {task_id}")))
        })
    }

    /// Same as [`TaskStore::edit_comment`], addressed by comment id.
    pub fn edit_comment_by_id(
        &mut self,
        task_id: &str,
        comment_id: &str,
        text: &str,
    ) -> Result<Comment> {
        self.edit_comment_where(task_id, text, |comments| {
            comments
                .iter()
                .position(|c| c.id == comment_id)
                .ok_or_else(|| Error::NotFound(format!("comment {comment_id} on task {task_id}")))
        })
    }

    fn edit_comment_where(
        &mut self,
        task_id: &str,
        text: &str,
        locate: impl FnOnce(&[Comment]) -> Result<usize>,
    ) -> Result<Comment> {
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("comment text cannot be empty".to_string()));
        }

        // Locate before writing so a miss never touches storage.
        let task = self
            .get(task_id)
            .ok_or_else(|| Error::NotFound(format!("task {task_id}")))?;
        let index = locate(&task.comments)?;

        let edited = self.modify(task_id, |task| {
            let comment = &mut task.comments[index];
            comment.text = text.to_string();
            comment.date = Utc::now();
            comment.clone()
        })?;
        edited.ok_or_else(|| Error::NotFound(format!("task {task_id}")))
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::{MemoryStorage, Storage, TASKS_KEY};
    use crate::task::TaskInput;
    use crate::TaskStore;

    fn store_with_task() -> (TaskStore<MemoryStorage>, String) {
        let mut store = TaskStore::new(MemoryStorage::new());
        let id = store.create(TaskInput::new("commented")).unwrap().id;
        (store, id)
    }

    #[test]
    fn test_add_comment_appends_in_order() {
        let (mut store, id) = store_with_task();
        store.add_comment(&id, "first").unwrap().unwrap();
        store.add_comment(&id, "second").unwrap().unwrap();

        let texts: Vec<_> = store
            .comments(&id)
            .unwrap()
            .into_iter()
            .map(|c| c.text)
            .collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn test_add_comment_to_missing_task_is_noop() {
        let (mut store, _) = store_with_task();
        let before = store.storage().get_item(TASKS_KEY).unwrap();
        assert!(store.add_comment("missing", "hello").unwrap().is_none());
        assert_eq!(store.storage().get_item(TASKS_KEY).unwrap(), before);
    }

    #[test]
    fn test_edit_comment_replaces_text_and_refreshes_date() {
        let (mut store, id) = store_with_task();
        let original = store.add_comment(&id, "draft").unwrap().unwrap();

        let edited = store.edit_comment(&id, 0, "final").unwrap();
        assert_eq!(edited.id, original.id);
        assert_eq!(edited.text, "final");
        assert!(edited.date >= original.date);
        assert_eq!(store.comments(&id).unwrap()[0].text, "final");
    }

    #[test]
    fn test_edit_comment_out_of_range_is_not_found() {
        let (mut store, id) = store_with_task();
        store.add_comment(&id, "only").unwrap();
        let before = store.list();

        let err = store.edit_comment(&id, 1, "nope").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.list(), before);
    }

    #[test]
    fn test_edit_comment_on_missing_task_is_not_found() {
        let (mut store, _) = store_with_task();
        assert!(store.edit_comment("missing", 0, "x").unwrap_err().is_not_found());
    }

    #[test]
    fn test_edit_comment_rejects_blank_text() {
        let (mut store, id) = store_with_task();
        store.add_comment(&id, "keep").unwrap();
        assert!(store.edit_comment(&id, 0, "   ").is_err());
        assert_eq!(store.comments(&id).unwrap()[0].text, "keep");
    }

    #[test]
    fn test_edit_comment_by_id_survives_reordering_neighbours() {
        let (mut store, id) = store_with_task();
        store.add_comment(&id, "a").unwrap();
        let b = store.add_comment(&id, "b").unwrap().unwrap();

        let edited = store.edit_comment_by_id(&id, &b.id, "b2").unwrap();
        assert_eq!(edited.id, b.id);
        let texts: Vec<_> = store
            .comments(&id)
            .unwrap()
            .into_iter()
            .map(|c| c.text)
            .collect();
        assert_eq!(texts, vec!["a", "b2"]);

        assert!(store
            .edit_comment_by_id(&id, "no-such-comment", "x")
            .unwrap_err()
            .is_not_found());
    }
}
