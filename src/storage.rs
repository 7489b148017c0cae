//! Named storage slots.
//!
//! A slot is a string value stored under a key. [`FileStorage`] keeps one file
//! per slot in a data directory; [`MemoryStorage`] keeps them in a map.

use crate::Result;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Slot holding the serialized task collection.
pub const TASKS_KEY: &str = "tasks";

/// Slot holding the last active view.
pub const ACTIVE_VIEW_KEY: &str = "activeView";

/// Read/write access to named string slots.
pub trait Storage {
    /// Read a slot. `Ok(None)` when it has never been written.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Replace the contents of a slot.
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;
}

/// One file per slot inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open storage rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.slot_path(key)) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        // Slot files are replaced atomically.
        let path = self.slot_path(key);
        let tmp = self.dir.join(format!(".{key}.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// In-memory slots, used by tests and throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
