//! Form controller
//!
//! One explicit state machine instead of per-modal boolean flags, so two
//! dialogs can never be open at once. Drafts hold raw user input; submit
//! validates synchronously and either returns the store operation to run
//! (transitioning back to Closed) or keeps the form open with per-field
//! error messages.

use std::collections::BTreeMap;

use crate::store::{NewTask, TaskPatch};
use crate::types::{Priority, Settings, Task};
use crate::util;

/// Raw form input. Optional fields are empty strings until the user types.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub notes: String,
    pub tags: Vec<String>,
    pub priority: Priority,
    pub due_date: String,
    pub parent_id: Option<String>,
}

impl TaskDraft {
    fn from_task(task: &Task) -> Self {
        TaskDraft {
            title: task.title.clone(),
            notes: task.notes.clone().unwrap_or_default(),
            tags: task.tags.clone(),
            priority: task.priority,
            due_date: task.due_date.clone().unwrap_or_default(),
            parent_id: task.parent_id.clone(),
        }
    }
}

/// Where the form UI is right now.
#[derive(Debug, Clone, PartialEq)]
pub enum FormState {
    Closed,
    EditingNew { draft: TaskDraft },
    EditingExisting { id: String, draft: TaskDraft },
    ConfirmingDelete { id: String, title: String },
}

/// The store operation a successful submit resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum FormOutcome {
    Create(NewTaskFields),
    Update { id: String, patch: PatchFields },
    Delete { id: String },
}

/// Validated create payload (mirrors `store::NewTask`).
#[derive(Debug, Clone, PartialEq)]
pub struct NewTaskFields {
    pub title: String,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub priority: Priority,
    pub due_date: Option<String>,
    pub parent_id: Option<String>,
}

impl From<NewTaskFields> for NewTask {
    fn from(f: NewTaskFields) -> Self {
        NewTask {
            title: f.title,
            notes: f.notes,
            tags: f.tags,
            priority: f.priority,
            due_date: f.due_date,
            parent_id: f.parent_id,
        }
    }
}

/// Validated edit payload. The form always rewrites every editable field.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchFields {
    pub title: String,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub priority: Priority,
    pub due_date: Option<String>,
}

impl From<PatchFields> for TaskPatch {
    fn from(f: PatchFields) -> Self {
        TaskPatch {
            title: Some(f.title),
            clear_notes: f.notes.is_none(),
            notes: f.notes,
            tags: Some(f.tags),
            priority: Some(f.priority),
            clear_due_date: f.due_date.is_none(),
            due_date: f.due_date,
            ..TaskPatch::default()
        }
    }
}

/// Per-field validation messages, keyed by field name. BTreeMap keeps the
/// display order stable.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Default)]
pub struct FormController {
    state: FormState,
}

impl Default for FormState {
    fn default() -> Self {
        FormState::Closed
    }
}

impl FormController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != FormState::Closed
    }

    /// Open a blank form seeded from settings defaults. Rejected while
    /// another dialog is open.
    pub fn open_new(&mut self, settings: &Settings) -> Result<(), String> {
        self.ensure_closed()?;
        self.state = FormState::EditingNew {
            draft: TaskDraft {
                priority: settings.default_priority,
                ..TaskDraft::default()
            },
        };
        Ok(())
    }

    /// Open an edit form pre-filled from an existing task.
    pub fn open_edit(&mut self, task: &Task) -> Result<(), String> {
        self.ensure_closed()?;
        self.state = FormState::EditingExisting {
            id: task.id.clone(),
            draft: TaskDraft::from_task(task),
        };
        Ok(())
    }

    /// Open the delete confirmation dialog.
    pub fn request_delete(&mut self, task: &Task) -> Result<(), String> {
        self.ensure_closed()?;
        self.state = FormState::ConfirmingDelete {
            id: task.id.clone(),
            title: task.title.clone(),
        };
        Ok(())
    }

    /// Mutable access to the open draft (the UI binds inputs here).
    pub fn draft_mut(&mut self) -> Option<&mut TaskDraft> {
        match &mut self.state {
            FormState::EditingNew { draft } => Some(draft),
            FormState::EditingExisting { draft, .. } => Some(draft),
            _ => None,
        }
    }

    /// Discard the dialog and return to Closed. Always allowed.
    pub fn cancel(&mut self) {
        self.state = FormState::Closed;
    }

    /// Validate and resolve the open dialog. On success the form closes and
    /// the caller runs the returned store operation; on failure the form
    /// stays open with its draft intact.
    pub fn submit(&mut self) -> Result<FormOutcome, FieldErrors> {
        let outcome = match &self.state {
            FormState::Closed => {
                let mut errors = FieldErrors::new();
                errors.insert("form".to_string(), "No form is open".to_string());
                return Err(errors);
            }
            FormState::EditingNew { draft } => {
                let fields = validate_draft(draft)?;
                FormOutcome::Create(NewTaskFields {
                    title: fields.title,
                    notes: fields.notes,
                    tags: fields.tags,
                    priority: fields.priority,
                    due_date: fields.due_date,
                    parent_id: draft.parent_id.clone(),
                })
            }
            FormState::EditingExisting { id, draft } => {
                let fields = validate_draft(draft)?;
                FormOutcome::Update {
                    id: id.clone(),
                    patch: fields,
                }
            }
            FormState::ConfirmingDelete { id, .. } => FormOutcome::Delete { id: id.clone() },
        };

        self.state = FormState::Closed;
        Ok(outcome)
    }

    fn ensure_closed(&self) -> Result<(), String> {
        if self.is_open() {
            return Err("Another dialog is already open".to_string());
        }
        Ok(())
    }
}

/// Field-local synchronous validation. Collects every failing field rather
/// than stopping at the first.
fn validate_draft(draft: &TaskDraft) -> Result<PatchFields, FieldErrors> {
    let mut errors = FieldErrors::new();

    let title = match util::validate_bounded_string(&draft.title, "title", 1, 280) {
        Ok(t) => t,
        Err(msg) => {
            errors.insert("title".to_string(), msg);
            String::new()
        }
    };

    let notes = {
        let trimmed = draft.notes.trim();
        if trimmed.is_empty() {
            None
        } else {
            match util::validate_bounded_string(trimmed, "notes", 1, 2000) {
                Ok(n) => Some(n),
                Err(msg) => {
                    errors.insert("notes".to_string(), msg);
                    None
                }
            }
        }
    };

    let due_date = {
        let trimmed = draft.due_date.trim();
        if trimmed.is_empty() {
            None
        } else {
            match util::validate_yyyy_mm_dd(trimmed, "dueDate") {
                Ok(()) => Some(trimmed.to_string()),
                Err(msg) => {
                    errors.insert("dueDate".to_string(), msg);
                    None
                }
            }
        }
    };

    // tags normalize silently: trim, drop empties, dedupe preserving order
    let mut tags: Vec<String> = Vec::new();
    for tag in &draft.tags {
        let trimmed = tag.trim();
        if !trimmed.is_empty() && !tags.iter().any(|t| t == trimmed) {
            tags.push(trimmed.to_string());
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(PatchFields {
        title,
        notes,
        tags,
        priority: draft.priority,
        due_date,
    })
}
