//! Key-value storage interface
//!
//! The persistence contract mirrors the browser's local storage: string keys,
//! string values, three operations. `FileStorage` maps each key to one JSON
//! file under the app data directory (~/.taskdock by default); `MemoryStorage`
//! backs tests.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Storage key for the task collection.
pub const TASKS_KEY: &str = "taskdock-tasks";
/// Storage key for user settings.
pub const SETTINGS_KEY: &str = "taskdock-settings";

/// Durable string key-value store.
pub trait Storage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), String>;
    fn remove_item(&self, key: &str) -> Result<(), String>;
}

/// File-backed storage: each key becomes `<dir>/<key>.json`.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open storage rooted at `dir`, creating it if needed.
    pub fn open(dir: PathBuf) -> Result<Self, String> {
        fs::create_dir_all(&dir)
            .map_err(|e| format!("Failed to create data dir {}: {}", dir.display(), e))?;
        Ok(FileStorage { dir })
    }

    /// Open storage at the default data directory (~/.taskdock).
    pub fn open_default() -> Result<Self, String> {
        let home = dirs::home_dir().ok_or("Could not find home directory")?;
        Self::open(home.join(".taskdock"))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), String> {
        crate::util::atomic_write_str(&self.path_for(key), value)
    }

    fn remove_item(&self, key: &str) -> Result<(), String> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(());
        }
        fs::remove_file(&path).map_err(|e| format!("Failed to remove {}: {}", path.display(), e))
    }
}

/// In-memory storage for tests.
#[derive(Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.lock().ok()?.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), String> {
        self.items
            .lock()
            .map_err(|_| "Lock poisoned".to_string())?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), String> {
        self.items
            .lock()
            .map_err(|_| "Lock poisoned".to_string())?
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_set_get_remove() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = FileStorage::open(dir.path().to_path_buf()).unwrap();

        assert_eq!(storage.get_item("missing"), None);

        storage.set_item("k", "{\"a\":1}").unwrap();
        assert_eq!(storage.get_item("k").as_deref(), Some("{\"a\":1}"));

        storage.remove_item("k").unwrap();
        assert_eq!(storage.get_item("k"), None);

        // removing a missing key is fine
        storage.remove_item("k").unwrap();
    }

    #[test]
    fn test_file_storage_keys_are_separate_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = FileStorage::open(dir.path().to_path_buf()).unwrap();

        storage.set_item(TASKS_KEY, "[]").unwrap();
        storage.set_item(SETTINGS_KEY, "{}").unwrap();

        assert!(dir.path().join("taskdock-tasks.json").exists());
        assert!(dir.path().join("taskdock-settings.json").exists());
    }

    #[test]
    fn test_memory_storage_overwrites() {
        let storage = MemoryStorage::new();
        storage.set_item("k", "one").unwrap();
        storage.set_item("k", "two").unwrap();
        assert_eq!(storage.get_item("k").as_deref(), Some("two"));
    }
}
