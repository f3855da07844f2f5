//! Task store
//!
//! Owns the in-memory collection and the storage handle. Every mutation
//! persists the whole collection before returning, so the on-disk state
//! always matches what the caller just observed. Operations on ids that no
//! longer exist are silent no-ops.

use std::sync::Arc;

use crate::persist;
use crate::storage::Storage;
use crate::types::{Priority, Task, TaskStatus};
use crate::util;

/// Validated input for a new task. Callers (form controller, importers)
/// validate before constructing one.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub priority: Priority,
    pub due_date: Option<String>,
    pub parent_id: Option<String>,
}

/// Field-level patch for `update`. `None` leaves a field alone; the `clear_*`
/// flags distinguish "unset this optional field" from "no change".
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub clear_notes: bool,
    pub tags: Option<Vec<String>>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<String>,
    pub clear_due_date: bool,
    pub parent_id: Option<String>,
    pub clear_parent: bool,
}

/// Outcome of a delete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The id did not exist; nothing changed.
    NotFound,
    /// The task has subtasks and `cascade` was false; nothing changed.
    Blocked { dependents: usize },
    /// The task (and, when cascading, its subtree) was removed.
    Deleted { removed: usize },
}

pub struct TaskStore {
    tasks: Vec<Task>,
    storage: Arc<dyn Storage>,
}

impl TaskStore {
    /// Load the collection from storage (seed fallback applies).
    pub fn open(storage: Arc<dyn Storage>) -> Self {
        let tasks = persist::load_tasks(storage.as_ref());
        TaskStore { tasks, storage }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Create a task from validated input. Newest tasks go first; views
    /// re-sort for display anyway.
    pub fn create(&mut self, new: NewTask) -> Task {
        let task = Task {
            id: util::new_id(),
            title: new.title,
            notes: new.notes,
            tags: new.tags,
            priority: new.priority,
            status: TaskStatus::Todo,
            due_date: new.due_date,
            parent_id: new.parent_id,
            created_at: util::now_rfc3339(),
            updated_at: None,
            completed_at: None,
        };
        self.tasks.insert(0, task.clone());
        self.save();
        task
    }

    /// Merge a patch into an existing task. Returns the updated task, or
    /// `None` (no-op) when the id does not exist.
    ///
    /// The first transition into `Completed` stamps `completed_at`; it is
    /// never re-stamped or cleared afterwards, even across a reopen.
    pub fn update(&mut self, id: &str, patch: TaskPatch) -> Option<Task> {
        let task = self.tasks.iter_mut().find(|t| t.id == id)?;

        if let Some(title) = patch.title {
            task.title = title;
        }
        if patch.clear_notes {
            task.notes = None;
        } else if let Some(notes) = patch.notes {
            task.notes = Some(notes);
        }
        if let Some(tags) = patch.tags {
            task.tags = tags;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(status) = patch.status {
            if status == TaskStatus::Completed && task.completed_at.is_none() {
                task.completed_at = Some(util::now_rfc3339());
            }
            task.status = status;
        }
        if patch.clear_due_date {
            task.due_date = None;
        } else if let Some(due) = patch.due_date {
            task.due_date = Some(due);
        }
        if patch.clear_parent {
            task.parent_id = None;
        } else if let Some(parent) = patch.parent_id {
            task.parent_id = Some(parent);
        }

        task.updated_at = Some(util::now_rfc3339());
        let updated = task.clone();
        self.save();
        Some(updated)
    }

    /// Remove a task. Tasks with subtasks are only removed when `cascade`
    /// is true, in which case the whole subtree goes with them.
    pub fn delete(&mut self, id: &str, cascade: bool) -> DeleteOutcome {
        if !self.tasks.iter().any(|t| t.id == id) {
            return DeleteOutcome::NotFound;
        }

        let subtree = self.subtree_ids(id);
        let dependents = subtree.len() - 1;
        if dependents > 0 && !cascade {
            return DeleteOutcome::Blocked { dependents };
        }

        self.tasks.retain(|t| !subtree.contains(&t.id));
        self.save();
        DeleteOutcome::Deleted { removed: subtree.len() }
    }

    /// Advance a task's status to the next entry of `states`, wrapping at
    /// the end. A status not present in the cycle restarts at the first
    /// entry. Routed through `update` so completion stamping applies.
    pub fn toggle_cycle(&mut self, id: &str, states: &[TaskStatus]) -> Option<Task> {
        if states.is_empty() {
            return self.get(id).cloned();
        }
        let current = self.get(id)?.status;
        let next = match states.iter().position(|s| *s == current) {
            Some(i) => states[(i + 1) % states.len()],
            None => states[0],
        };
        self.update(
            id,
            TaskPatch {
                status: Some(next),
                ..TaskPatch::default()
            },
        )
    }

    /// Append already-built tasks (CSV import path; ids are freshly
    /// generated by the importer). Persists once.
    pub fn append_many(&mut self, tasks: Vec<Task>) {
        self.tasks.extend(tasks);
        self.save();
    }

    /// Replace the whole collection (JSON restore path). Colliding ids are
    /// deduplicated first-wins to preserve the uniqueness invariant.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        let mut seen = std::collections::HashSet::new();
        self.tasks = tasks
            .into_iter()
            .filter(|t| seen.insert(t.id.clone()))
            .collect();
        self.save();
    }

    /// Ids of `id` and every transitive subtask.
    fn subtree_ids(&self, id: &str) -> Vec<String> {
        let mut result = vec![id.to_string()];
        let mut frontier = vec![id.to_string()];
        while let Some(current) = frontier.pop() {
            for task in &self.tasks {
                if task.parent_id.as_deref() == Some(current.as_str())
                    && !result.contains(&task.id)
                {
                    result.push(task.id.clone());
                    frontier.push(task.id.clone());
                }
            }
        }
        result
    }

    fn save(&self) {
        persist::save_tasks(self.storage.as_ref(), &self.tasks);
    }
}
