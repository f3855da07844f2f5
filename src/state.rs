//! Shared application state
//!
//! One `AppState` per process. Mutation paths lock, mutate, persist, and
//! return before the next command runs; a poisoned lock degrades to an
//! error message instead of taking the process down.

use std::sync::{Arc, Mutex};

use crate::assistant::RequestGate;
use crate::forms::FormController;
use crate::persist;
use crate::storage::{FileStorage, Storage};
use crate::store::TaskStore;
use crate::types::Settings;

pub struct AppState {
    storage: Arc<dyn Storage>,
    pub store: Mutex<TaskStore>,
    pub settings: Mutex<Settings>,
    pub form: Mutex<FormController>,
    pub assistant_gate: RequestGate,
}

impl AppState {
    /// Load state from the given storage backend.
    pub fn open(storage: Arc<dyn Storage>) -> Self {
        let store = TaskStore::open(storage.clone());
        let settings = persist::load_settings(storage.as_ref());

        AppState {
            storage,
            store: Mutex::new(store),
            settings: Mutex::new(settings),
            form: Mutex::new(FormController::new()),
            assistant_gate: RequestGate::new(),
        }
    }

    /// Load state from the default on-disk location (~/.taskdock).
    pub fn open_default() -> Result<Self, String> {
        let storage: Arc<dyn Storage> = Arc::new(FileStorage::open_default()?);
        Ok(Self::open(storage))
    }

    /// Read a snapshot of the current settings.
    pub fn current_settings(&self) -> Settings {
        self.settings
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Apply a mutation to settings and persist the result.
    pub fn update_settings(
        &self,
        mutator: impl FnOnce(&mut Settings),
    ) -> Result<Settings, String> {
        let mut guard = self.settings.lock().map_err(|_| "Lock poisoned")?;
        mutator(&mut guard);
        persist::save_settings(self.storage.as_ref(), &guard);
        Ok(guard.clone())
    }
}
