//! Import and export
//!
//! CSV for spreadsheets, JSON for full backups. Imports validate and coerce
//! external rows into the strict Task shape at this boundary; the rest of
//! the system never sees loose data. CSV import always generates fresh ids
//! (file ids are untrusted); JSON restore is the opposite, an atomic
//! all-or-nothing replacement that keeps our own exported ids.

use serde::{Deserialize, Serialize};

use crate::csv;
use crate::error::AppError;
use crate::types::{Priority, Settings, Task, TaskStatus};
use crate::util;

/// Export column order. Import matches columns by header name, so files
/// with reordered or extra columns still load.
pub const EXPORT_HEADER: &[&str] = &[
    "Title",
    "Notes",
    "Tags",
    "Priority",
    "Status",
    "Due Date",
    "Created At",
    "Completed At",
];

/// Delimiter for array-valued fields inside one CSV cell.
const TAG_JOIN: &str = "; ";

/// Full-backup payload: `{ "tasks": [...], "settings": {...} }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupFile {
    pub tasks: Vec<Task>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
}

/// Result of a CSV import: coerced tasks plus how many lines were dropped.
#[derive(Debug, Clone)]
pub struct CsvImport {
    pub tasks: Vec<Task>,
    pub skipped: usize,
}

/// Render the collection as CSV.
pub fn export_csv(tasks: &[Task]) -> String {
    let mut out = String::new();
    out.push_str(&csv::to_line(
        &EXPORT_HEADER.iter().map(|h| h.to_string()).collect::<Vec<_>>(),
    ));
    out.push('\n');

    for task in tasks {
        let fields = vec![
            task.title.clone(),
            task.notes.clone().unwrap_or_default(),
            task.tags.join(TAG_JOIN),
            task.priority.as_str().to_string(),
            task.status.as_str().to_string(),
            task.due_date.clone().unwrap_or_default(),
            task.created_at.clone(),
            task.completed_at.clone().unwrap_or_default(),
        ];
        out.push_str(&csv::to_line(&fields));
        out.push('\n');
    }

    out
}

/// Parse CSV text into tasks.
///
/// Columns are matched by header name (a few aliases are accepted so files
/// from other tools load). A title column must exist; rows without a title
/// are skipped, as are structurally malformed lines. Timestamps and ids are
/// always regenerated here, never taken from the file.
pub fn import_csv(text: &str) -> Result<CsvImport, AppError> {
    let doc = csv::parse_document(text).map_err(AppError::ImportRejected)?;

    let col = |names: &[&str]| -> Option<usize> {
        doc.header.iter().position(|h| {
            let key = h.trim().to_lowercase();
            names.iter().any(|n| *n == key)
        })
    };

    let title_col = col(&["title", "name"])
        .ok_or_else(|| AppError::ImportRejected("No title column in header".to_string()))?;
    let notes_col = col(&["notes", "description"]);
    let tags_col = col(&["tags", "category"]);
    let priority_col = col(&["priority"]);
    let status_col = col(&["status"]);
    let due_col = col(&["due date", "duedate", "due"]);

    let mut tasks = Vec::new();
    let mut skipped = doc.skipped;

    for row in &doc.rows {
        let get = |i: Option<usize>| -> &str {
            i.and_then(|i| row.get(i)).map(|s| s.trim()).unwrap_or("")
        };

        let title = get(Some(title_col));
        if title.is_empty() {
            skipped += 1;
            continue;
        }

        let notes = get(notes_col);
        let tags: Vec<String> = get(tags_col)
            .split(';')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        let status = TaskStatus::parse_lenient(get(status_col));
        // invalid dates are dropped, not fatal for the row
        let due_date = Some(get(due_col))
            .filter(|d| !d.is_empty())
            .filter(|d| util::validate_yyyy_mm_dd(d, "dueDate").is_ok())
            .map(|d| d.to_string());

        let now = util::now_rfc3339();
        tasks.push(Task {
            id: util::new_id(),
            title: title.to_string(),
            notes: if notes.is_empty() { None } else { Some(notes.to_string()) },
            tags,
            priority: Priority::parse_lenient(get(priority_col)),
            status,
            due_date,
            parent_id: None,
            created_at: now.clone(),
            updated_at: None,
            completed_at: if status == TaskStatus::Completed { Some(now) } else { None },
        });
    }

    Ok(CsvImport { tasks, skipped })
}

/// Render the full backup (collection plus settings) as pretty JSON.
pub fn export_json(tasks: &[Task], settings: &Settings) -> String {
    let backup = BackupFile {
        tasks: tasks.to_vec(),
        settings: Some(settings.clone()),
    };
    // Task/Settings contain no non-serializable values, so this cannot fail
    serde_json::to_string_pretty(&backup).unwrap_or_else(|_| "{}".to_string())
}

/// Parse a JSON backup. All-or-nothing: any parse failure rejects the whole
/// file and the caller changes nothing. A bare task array (old export
/// format) is accepted too.
pub fn import_json(text: &str) -> Result<BackupFile, AppError> {
    if let Ok(backup) = serde_json::from_str::<BackupFile>(text) {
        return Ok(backup);
    }
    match serde_json::from_str::<Vec<Task>>(text) {
        Ok(tasks) => Ok(BackupFile { tasks, settings: None }),
        Err(e) => Err(AppError::ImportRejected(format!("Not a valid backup file: {}", e))),
    }
}
