//! Persistence adapter
//!
//! Serializes whole collections to pretty-printed JSON under fixed storage
//! keys. Reads fall back to seed/default data when the key is absent or the
//! payload does not parse; a corrupt store must never crash the app, so parse
//! failures are logged and swallowed here (the previous file is left in place
//! for manual recovery).

use crate::storage::{Storage, SETTINGS_KEY, TASKS_KEY};
use crate::types::{Settings, Task};

/// Load the task collection, falling back to the embedded seed.
pub fn load_tasks(storage: &dyn Storage) -> Vec<Task> {
    let raw = match storage.get_item(TASKS_KEY) {
        Some(raw) => raw,
        None => {
            log::info!("No stored tasks under {}; starting from seed data", TASKS_KEY);
            return crate::seed::seed_tasks();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(tasks) => tasks,
        Err(e) => {
            log::warn!("Stored tasks failed to parse ({}); using seed data", e);
            crate::seed::seed_tasks()
        }
    }
}

/// Write the task collection. Failures are logged, not returned: save is a
/// side effect of every mutation and a full disk must not take the app down.
pub fn save_tasks(storage: &dyn Storage, tasks: &[Task]) {
    let content = match serde_json::to_string_pretty(tasks) {
        Ok(c) => c,
        Err(e) => {
            log::error!("Failed to serialize tasks: {}", e);
            return;
        }
    };
    if let Err(e) = storage.set_item(TASKS_KEY, &content) {
        log::error!("Failed to write tasks: {}", e);
    }
}

/// Load settings, falling back to defaults on absence or parse failure.
pub fn load_settings(storage: &dyn Storage) -> Settings {
    let raw = match storage.get_item(SETTINGS_KEY) {
        Some(raw) => raw,
        None => return Settings::default(),
    };

    match serde_json::from_str(&raw) {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!("Stored settings failed to parse ({}); using defaults", e);
            Settings::default()
        }
    }
}

/// Write settings under their own key.
pub fn save_settings(storage: &dyn Storage, settings: &Settings) {
    let content = match serde_json::to_string_pretty(settings) {
        Ok(c) => c,
        Err(e) => {
            log::error!("Failed to serialize settings: {}", e);
            return;
        }
    };
    if let Err(e) = storage.set_item(SETTINGS_KEY, &content) {
        log::error!("Failed to write settings: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::types::{Priority, TaskStatus};

    fn task(id: &str, title: &str) -> Task {
        Task {
            id: id.to_string(),
            title: title.to_string(),
            notes: None,
            tags: Vec::new(),
            priority: Priority::Medium,
            status: TaskStatus::Todo,
            due_date: None,
            parent_id: None,
            created_at: "2025-02-01T12:00:00+00:00".to_string(),
            updated_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn test_missing_key_returns_seed() {
        let storage = MemoryStorage::new();
        let tasks = load_tasks(&storage);
        assert_eq!(tasks, crate::seed::seed_tasks());
    }

    #[test]
    fn test_invalid_json_returns_seed_without_panic() {
        let storage = MemoryStorage::new();
        storage.set_item(TASKS_KEY, "{not json at all").unwrap();
        let tasks = load_tasks(&storage);
        assert_eq!(tasks, crate::seed::seed_tasks());
    }

    #[test]
    fn test_save_load_round_trip() {
        let storage = MemoryStorage::new();
        let tasks = vec![task("a", "First"), task("b", "Second")];

        save_tasks(&storage, &tasks);
        let loaded = load_tasks(&storage);

        assert_eq!(loaded, tasks);
    }

    #[test]
    fn test_settings_round_trip_and_default() {
        let storage = MemoryStorage::new();
        assert_eq!(load_settings(&storage), Settings::default());

        let mut settings = Settings::default();
        settings.theme = "dark".to_string();
        settings.default_priority = Priority::High;
        save_settings(&storage, &settings);

        assert_eq!(load_settings(&storage), settings);
    }

    #[test]
    fn test_settings_and_tasks_use_separate_keys() {
        let storage = MemoryStorage::new();
        save_tasks(&storage, &[task("a", "First")]);
        save_settings(&storage, &Settings::default());

        assert!(storage.get_item(TASKS_KEY).is_some());
        assert!(storage.get_item(SETTINGS_KEY).is_some());

        // wiping settings leaves tasks untouched (independent lifecycles)
        storage.remove_item(SETTINGS_KEY).unwrap();
        assert!(storage.get_item(TASKS_KEY).is_some());
    }
}
