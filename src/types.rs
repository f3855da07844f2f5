use serde::{Deserialize, Serialize};

// =============================================================================
// Task entity
// =============================================================================

/// A single task record.
///
/// `id` and `created_at` are set once at creation and never change. Every
/// mutation through the store refreshes `updated_at`. `completed_at` is
/// stamped on the first transition into `Completed` and kept forever after,
/// even if the task is later reopened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// Parent task id for subtasks. Deleting a parent cascades only after
    /// explicit confirmation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

/// Task priority. Ordering for display is High > Medium > Low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl Priority {
    /// Numeric rank for sorting. Higher means more urgent.
    pub fn rank(&self) -> i32 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }

    /// Lenient parse for imported data. Unknown values fall back to Medium.
    pub fn parse_lenient(value: &str) -> Priority {
        match value.trim().to_lowercase().as_str() {
            "high" | "p1" => Priority::High,
            "low" | "p3" => Priority::Low,
            _ => Priority::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

/// Task status. `DEFAULT_STATUS_CYCLE` defines the toggle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Completed,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}

/// The cyclic order used when toggling a task's status.
pub const DEFAULT_STATUS_CYCLE: &[TaskStatus] = &[
    TaskStatus::Todo,
    TaskStatus::InProgress,
    TaskStatus::Completed,
];

impl TaskStatus {
    /// Lenient parse for imported data. Unknown values fall back to Todo.
    pub fn parse_lenient(value: &str) -> TaskStatus {
        match value.trim().to_lowercase().as_str() {
            "completed" | "done" => TaskStatus::Completed,
            "in-progress" | "in progress" | "doing" => TaskStatus::InProgress,
            _ => TaskStatus::Todo,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }
}

// =============================================================================
// Settings
// =============================================================================

/// User preferences, persisted under their own storage key with a lifecycle
/// independent from the task collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub default_priority: Priority,
    #[serde(default = "default_upcoming_window")]
    pub upcoming_window_days: i64,
}

fn default_theme() -> String {
    "system".to_string()
}

fn default_upcoming_window() -> i64 {
    7
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            theme: default_theme(),
            default_priority: Priority::default(),
            upcoming_window_days: default_upcoming_window(),
        }
    }
}

// =============================================================================
// Filter state
// =============================================================================

/// Which statuses a view includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Is(TaskStatus),
}

/// Due-window filter. `Upcoming` is the half-open interval
/// (today, today + window] and excludes completed tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueFilter {
    Any,
    Today,
    Upcoming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Priority,
    DueDate,
    CreatedAt,
    Title,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Transient view state. Never persisted; every session starts from
/// `FilterState::default()`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub search: String,
    pub status: StatusFilter,
    pub tag: Option<String>,
    pub due: DueFilter,
    pub sort: SortKey,
    pub direction: SortDirection,
}

impl Default for FilterState {
    fn default() -> Self {
        FilterState {
            search: String::new(),
            status: StatusFilter::All,
            tag: None,
            due: DueFilter::Any,
            sort: SortKey::Priority,
            direction: SortDirection::Descending,
        }
    }
}

// =============================================================================
// Derived summaries
// =============================================================================

/// Counts and whole-number percentages per status. Percentages of an empty
/// collection are 0 across the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub total: usize,
    pub todo: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub todo_pct: u32,
    pub in_progress_pct: u32,
    pub completed_pct: u32,
}

/// Due-date pressure counts for the dashboard header.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSummary {
    pub overdue: usize,
    pub due_today: usize,
    pub due_this_week: usize,
}

/// Count and percentage for one priority bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityBucket {
    pub priority: Priority,
    pub count: usize,
    pub pct: u32,
}

/// Everything the dashboard header shows, derived fresh on each request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub status: StatusSummary,
    pub schedule: ScheduleSummary,
    pub priorities: Vec<PriorityBucket>,
}
