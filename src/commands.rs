//! Command layer
//!
//! The surface a UI (here, the CLI) talks to. Commands lock the shared
//! state, run one synchronous operation, and return plain data or a
//! display-ready message. Errors at this boundary are strings: every
//! failure in this system is something to show the user, not a crash.

use serde::Serialize;

use crate::assistant::{run_gated, Assistant, AssistantReply, AssistantRequest};
use crate::backup;
use crate::forms::{FormOutcome, TaskDraft};
use crate::state::AppState;
use crate::store::DeleteOutcome;
use crate::types::{
    Dashboard, FilterState, Priority, Task, TaskStatus, DEFAULT_STATUS_CYCLE,
};
use crate::views;

/// Result shape for task listings.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TasksResult {
    Success { data: Vec<Task> },
    Empty { message: String },
    Error { message: String },
}

/// What a form submit resolved to.
#[derive(Debug, PartialEq)]
pub enum FormSubmission {
    Created(Task),
    Updated(Task),
    /// The edited task disappeared between open and submit; nothing changed.
    Vanished,
    Deleted { removed: usize },
    /// Delete needs cascade confirmation before anything is removed.
    DeleteBlocked { id: String, dependents: usize },
}

/// Counts reported after an import.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// Counts reported after a JSON restore.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreSummary {
    pub tasks: usize,
    pub settings_applied: bool,
}

/// Resolve user-typed id input: exact match first, then a unique id prefix.
/// An ambiguous prefix is an error, never a guess.
pub fn resolve_task_id(state: &AppState, input: &str) -> Result<String, String> {
    let store = state.store.lock().map_err(|_| "Lock poisoned")?;

    if store.get(input).is_some() {
        return Ok(input.to_string());
    }

    let matches: Vec<&str> = store
        .tasks()
        .iter()
        .filter(|t| t.id.starts_with(input))
        .map(|t| t.id.as_str())
        .collect();

    match matches.as_slice() {
        [] => Err(format!("No task with id {}", input)),
        [id] => Ok(id.to_string()),
        _ => Err(format!("Id prefix {} is ambiguous ({} matches)", input, matches.len())),
    }
}

// =============================================================================
// Views
// =============================================================================

/// Project the collection through the given filter state.
pub fn list_tasks(state: &AppState, filter: &FilterState) -> TasksResult {
    let store = match state.store.lock() {
        Ok(guard) => guard,
        Err(_) => {
            return TasksResult::Error {
                message: "Internal error: store lock poisoned".to_string(),
            }
        }
    };

    let data = views::project(store.tasks(), filter);
    if data.is_empty() {
        TasksResult::Empty {
            message: "No tasks match. Add one or loosen the filters.".to_string(),
        }
    } else {
        TasksResult::Success { data }
    }
}

/// Aggregate summaries for the dashboard header.
pub fn dashboard(state: &AppState) -> Result<Dashboard, String> {
    let store = state.store.lock().map_err(|_| "Lock poisoned")?;
    let tasks = store.tasks();
    Ok(Dashboard {
        status: views::status_summary(tasks),
        schedule: views::schedule_summary(tasks, chrono::Local::now().date_naive()),
        priorities: views::priority_breakdown(tasks),
    })
}

// =============================================================================
// Form flow
// =============================================================================

/// Open a blank task form.
pub fn open_new_task(state: &AppState) -> Result<(), String> {
    let settings = state.current_settings();
    let mut form = state.form.lock().map_err(|_| "Lock poisoned")?;
    form.open_new(&settings)
}

/// Open an edit form for an existing task.
pub fn open_edit_task(state: &AppState, id: &str) -> Result<(), String> {
    let store = state.store.lock().map_err(|_| "Lock poisoned")?;
    let task = store
        .get(id)
        .ok_or_else(|| format!("Task not found: {}", id))?
        .clone();
    drop(store);

    let mut form = state.form.lock().map_err(|_| "Lock poisoned")?;
    form.open_edit(&task)
}

/// Open the delete confirmation dialog for a task.
pub fn begin_delete(state: &AppState, id: &str) -> Result<(), String> {
    let store = state.store.lock().map_err(|_| "Lock poisoned")?;
    let task = store
        .get(id)
        .ok_or_else(|| format!("Task not found: {}", id))?
        .clone();
    drop(store);

    let mut form = state.form.lock().map_err(|_| "Lock poisoned")?;
    form.request_delete(&task)
}

/// Edit the open draft in place.
pub fn with_draft(
    state: &AppState,
    edit: impl FnOnce(&mut TaskDraft),
) -> Result<(), String> {
    let mut form = state.form.lock().map_err(|_| "Lock poisoned")?;
    let draft = form.draft_mut().ok_or("No editable form is open")?;
    edit(draft);
    Ok(())
}

/// Discard the open dialog.
pub fn cancel_form(state: &AppState) -> Result<(), String> {
    let mut form = state.form.lock().map_err(|_| "Lock poisoned")?;
    form.cancel();
    Ok(())
}

/// Submit the open dialog and apply its outcome to the store.
///
/// Validation failures come back as one joined message and leave the form
/// open with the draft intact.
pub fn submit_form(state: &AppState) -> Result<FormSubmission, String> {
    let outcome = {
        let mut form = state.form.lock().map_err(|_| "Lock poisoned")?;
        form.submit().map_err(|errors| {
            errors
                .iter()
                .map(|(field, msg)| format!("{}: {}", field, msg))
                .collect::<Vec<_>>()
                .join("; ")
        })?
    };

    let mut store = state.store.lock().map_err(|_| "Lock poisoned")?;
    match outcome {
        FormOutcome::Create(fields) => {
            if let Some(parent) = &fields.parent_id {
                if store.get(parent).is_none() {
                    return Err(format!("Parent task not found: {}", parent));
                }
            }
            Ok(FormSubmission::Created(store.create(fields.into())))
        }
        FormOutcome::Update { id, patch } => match store.update(&id, patch.into()) {
            Some(task) => Ok(FormSubmission::Updated(task)),
            None => Ok(FormSubmission::Vanished),
        },
        FormOutcome::Delete { id } => match store.delete(&id, false) {
            DeleteOutcome::Deleted { removed } => Ok(FormSubmission::Deleted { removed }),
            DeleteOutcome::Blocked { dependents } => {
                Ok(FormSubmission::DeleteBlocked { id, dependents })
            }
            DeleteOutcome::NotFound => Ok(FormSubmission::Vanished),
        },
    }
}

/// Cascade a delete that came back `DeleteBlocked`, after the user
/// confirmed taking the subtasks with it.
pub fn confirm_cascade_delete(state: &AppState, id: &str) -> Result<usize, String> {
    let mut store = state.store.lock().map_err(|_| "Lock poisoned")?;
    match store.delete(id, true) {
        DeleteOutcome::Deleted { removed } => Ok(removed),
        DeleteOutcome::NotFound => Ok(0),
        DeleteOutcome::Blocked { .. } => Err("Delete was unexpectedly blocked".to_string()),
    }
}

// =============================================================================
// Quick status changes (no dialog)
// =============================================================================

/// Mark a task completed. `Ok(None)` = unknown id, nothing changed.
pub fn complete_task(state: &AppState, id: &str) -> Result<Option<Task>, String> {
    set_status(state, id, TaskStatus::Completed)
}

/// Put a completed task back to todo.
pub fn reopen_task(state: &AppState, id: &str) -> Result<Option<Task>, String> {
    set_status(state, id, TaskStatus::Todo)
}

/// Advance a task one step around the status cycle.
pub fn cycle_task(state: &AppState, id: &str) -> Result<Option<Task>, String> {
    let mut store = state.store.lock().map_err(|_| "Lock poisoned")?;
    Ok(store.toggle_cycle(id, DEFAULT_STATUS_CYCLE))
}

fn set_status(state: &AppState, id: &str, status: TaskStatus) -> Result<Option<Task>, String> {
    let mut store = state.store.lock().map_err(|_| "Lock poisoned")?;
    Ok(store.update(
        id,
        crate::store::TaskPatch {
            status: Some(status),
            ..crate::store::TaskPatch::default()
        },
    ))
}

// =============================================================================
// Import / export
// =============================================================================

pub fn export_tasks_csv(state: &AppState) -> Result<String, String> {
    let store = state.store.lock().map_err(|_| "Lock poisoned")?;
    Ok(backup::export_csv(store.tasks()))
}

pub fn export_backup_json(state: &AppState) -> Result<String, String> {
    let settings = state.current_settings();
    let store = state.store.lock().map_err(|_| "Lock poisoned")?;
    Ok(backup::export_json(store.tasks(), &settings))
}

/// Import CSV rows as new tasks (appended, fresh ids).
pub fn import_tasks_csv(state: &AppState, text: &str) -> Result<ImportSummary, String> {
    let parsed = backup::import_csv(text).map_err(|e| e.to_string())?;
    let summary = ImportSummary {
        imported: parsed.tasks.len(),
        skipped: parsed.skipped,
    };

    let mut store = state.store.lock().map_err(|_| "Lock poisoned")?;
    store.append_many(parsed.tasks);
    log::info!(
        "CSV import: {} tasks added, {} rows skipped",
        summary.imported,
        summary.skipped
    );
    Ok(summary)
}

/// Restore a JSON backup. All-or-nothing: a parse failure changes nothing.
pub fn import_backup_json(state: &AppState, text: &str) -> Result<RestoreSummary, String> {
    let parsed = backup::import_json(text)
        .map_err(|e| format!("{} {}", e, e.user_message()))?;

    let settings_applied = parsed.settings.is_some();
    if let Some(settings) = parsed.settings {
        state.update_settings(|s| *s = settings)?;
    }

    let mut store = state.store.lock().map_err(|_| "Lock poisoned")?;
    let count = parsed.tasks.len();
    store.replace_all(parsed.tasks);
    log::info!("Backup restored: {} tasks", count);
    Ok(RestoreSummary {
        tasks: store.len(),
        settings_applied,
    })
}

// =============================================================================
// Settings
// =============================================================================

pub fn set_theme(state: &AppState, theme: &str) -> Result<(), String> {
    const THEMES: &[&str] = &["system", "light", "dark"];
    if !THEMES.contains(&theme) {
        return Err(format!("theme must be one of {}", THEMES.join(", ")));
    }
    state.update_settings(|s| s.theme = theme.to_string())?;
    Ok(())
}

pub fn set_default_priority(state: &AppState, priority: Priority) -> Result<(), String> {
    state.update_settings(|s| s.default_priority = priority)?;
    Ok(())
}

// =============================================================================
// Assistant
// =============================================================================

/// One gated assistant round-trip. `Ok(None)` means the reply was dropped
/// as stale; errors are the collaborator's own words.
pub fn ask_assistant(
    state: &AppState,
    assistant: &dyn Assistant,
    prompt: &str,
) -> Result<Option<AssistantReply>, String> {
    run_gated(
        assistant,
        &state.assistant_gate,
        AssistantRequest::text(prompt),
    )
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, Storage, TASKS_KEY};
    use std::sync::Arc;

    fn empty_state() -> AppState {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        storage.set_item(TASKS_KEY, "[]").unwrap();
        AppState::open(storage)
    }

    fn add_task(state: &AppState, title: &str) -> Task {
        open_new_task(state).unwrap();
        with_draft(state, |d| d.title = title.to_string()).unwrap();
        match submit_form(state).unwrap() {
            FormSubmission::Created(task) => task,
            other => panic!("unexpected submission {:?}", other),
        }
    }

    #[test]
    fn test_add_task_through_form_flow() {
        let state = empty_state();
        let task = add_task(&state, "Ship release");

        assert_eq!(task.title, "Ship release");
        match list_tasks(&state, &FilterState::default()) {
            TasksResult::Success { data } => assert_eq!(data.len(), 1),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_submit_with_invalid_draft_reports_fields() {
        let state = empty_state();
        open_new_task(&state).unwrap();
        with_draft(&state, |d| d.due_date = "tomorrow-ish".to_string()).unwrap();

        let err = submit_form(&state).unwrap_err();

        assert!(err.contains("title"));
        assert!(err.contains("dueDate"));
        // form is still open, fix and resubmit
        with_draft(&state, |d| {
            d.title = "Fixed".to_string();
            d.due_date = "2025-06-01".to_string();
        })
        .unwrap();
        assert!(matches!(
            submit_form(&state).unwrap(),
            FormSubmission::Created(_)
        ));
    }

    #[test]
    fn test_edit_flow_updates_task() {
        let state = empty_state();
        let task = add_task(&state, "Draft title");

        open_edit_task(&state, &task.id).unwrap();
        with_draft(&state, |d| d.title = "Final title".to_string()).unwrap();

        match submit_form(&state).unwrap() {
            FormSubmission::Updated(updated) => {
                assert_eq!(updated.title, "Final title");
                assert!(updated.updated_at.is_some());
            }
            other => panic!("unexpected submission {:?}", other),
        }
    }

    #[test]
    fn test_delete_flow_blocks_then_cascades() {
        let state = empty_state();
        let parent = add_task(&state, "Parent");
        open_new_task(&state).unwrap();
        with_draft(&state, |d| {
            d.title = "Child".to_string();
            d.parent_id = Some(parent.id.clone());
        })
        .unwrap();
        submit_form(&state).unwrap();

        begin_delete(&state, &parent.id).unwrap();
        match submit_form(&state).unwrap() {
            FormSubmission::DeleteBlocked { id, dependents } => {
                assert_eq!(id, parent.id);
                assert_eq!(dependents, 1);
            }
            other => panic!("unexpected submission {:?}", other),
        }

        let removed = confirm_cascade_delete(&state, &parent.id).unwrap();
        assert_eq!(removed, 2);
        let store = state.store.lock().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_complete_unknown_id_is_noop() {
        let state = empty_state();
        assert_eq!(complete_task(&state, "ghost").unwrap(), None);
    }

    #[test]
    fn test_csv_export_import_cycle_adds_tasks() {
        let state = empty_state();
        add_task(&state, "Original");

        let exported = export_tasks_csv(&state).unwrap();
        let summary = import_tasks_csv(&state, &exported).unwrap();

        assert_eq!(summary, ImportSummary { imported: 1, skipped: 0 });
        let store = state.store.lock().unwrap();
        assert_eq!(store.len(), 2, "import appends, never replaces");
    }

    #[test]
    fn test_backup_restore_is_atomic_on_bad_input() {
        let state = empty_state();
        add_task(&state, "Survivor");

        let err = import_backup_json(&state, "{ not json").unwrap_err();

        assert!(err.contains("Nothing was changed"));
        let store = state.store.lock().unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_backup_restore_replaces_collection() {
        let state = empty_state();
        add_task(&state, "Old task");
        let backup_text = export_backup_json(&state).unwrap();

        add_task(&state, "Added after backup");
        let summary = import_backup_json(&state, &backup_text).unwrap();

        assert_eq!(summary.tasks, 1);
        assert!(summary.settings_applied);
        let store = state.store.lock().unwrap();
        assert_eq!(store.tasks()[0].title, "Old task");
    }

    #[test]
    fn test_dashboard_counts() {
        let state = empty_state();
        let a = add_task(&state, "one");
        add_task(&state, "two");
        complete_task(&state, &a.id).unwrap();

        let dashboard = dashboard(&state).unwrap();

        assert_eq!(dashboard.status.total, 2);
        assert_eq!(dashboard.status.completed, 1);
        assert_eq!(dashboard.status.completed_pct, 50);
    }

    #[test]
    fn test_resolve_task_id_prefix() {
        let state = empty_state();
        let task = add_task(&state, "findable");

        let prefix = &task.id[..8];
        assert_eq!(resolve_task_id(&state, &task.id).unwrap(), task.id);
        assert_eq!(resolve_task_id(&state, prefix).unwrap(), task.id);
        assert!(resolve_task_id(&state, "zzz").is_err());
    }

    #[test]
    fn test_set_theme_validates() {
        let state = empty_state();
        assert!(set_theme(&state, "dark").is_ok());
        assert!(set_theme(&state, "solarized").is_err());
        assert_eq!(state.current_settings().theme, "dark");
    }

    #[test]
    fn test_ask_assistant_round_trip_and_busy_gate() {
        struct CannedAssistant;
        impl Assistant for CannedAssistant {
            fn complete(
                &self,
                request: crate::assistant::AssistantRequest,
            ) -> Result<AssistantReply, String> {
                Ok(AssistantReply::Text(format!("re: {}", request.prompt)))
            }
        }

        let state = empty_state();
        let reply = ask_assistant(&state, &CannedAssistant, "plan my day")
            .unwrap()
            .unwrap();
        assert_eq!(reply, AssistantReply::Text("re: plan my day".to_string()));

        // a held ticket blocks the next submission
        let _ticket = state.assistant_gate.try_begin().unwrap();
        let err = ask_assistant(&state, &CannedAssistant, "again").unwrap_err();
        assert!(err.contains("already in progress"));
    }
}
