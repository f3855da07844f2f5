//! Embedded seed collection
//!
//! Shown on first run and whenever the stored collection is missing or
//! unreadable. The JSON ships inside the binary so a fresh install never
//! depends on files being in place.

use crate::types::Task;

const SEED_TASKS: &str = include_str!("../seeds/tasks.json");

/// The example task collection.
///
/// The embedded JSON is validated by tests; if it ever fails to parse at
/// runtime anyway, an empty collection is the safe fallback.
pub fn seed_tasks() -> Vec<Task> {
    match serde_json::from_str(SEED_TASKS) {
        Ok(tasks) => tasks,
        Err(e) => {
            log::error!("Embedded seed data failed to parse: {}", e);
            Vec::new()
        }
    }
}
