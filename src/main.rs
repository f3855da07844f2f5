//! taskdock CLI
//!
//! Thin surface over the command layer: parse arguments, run one command
//! against the shared state, print the result.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use taskdock::commands::{self, FormSubmission, TasksResult};
use taskdock::state::AppState;
use taskdock::types::{
    DueFilter, FilterState, Priority, SortDirection, SortKey, StatusFilter, Task, TaskStatus,
};

#[derive(Parser)]
#[command(name = "taskdock", version, about = "Local-first task organizer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tasks, filtered and sorted
    List {
        /// Case-insensitive text search over title, notes, and tags
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        /// Only tasks carrying this exact tag
        #[arg(long)]
        tag: Option<String>,
        #[arg(long, value_enum)]
        due: Option<DueArg>,
        #[arg(long, value_enum, default_value = "priority")]
        sort: SortArg,
        /// Sort ascending instead of descending
        #[arg(long)]
        asc: bool,
    },
    /// Add a new task
    Add {
        title: String,
        #[arg(long)]
        notes: Option<String>,
        /// May be given multiple times
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long, value_enum)]
        priority: Option<PriorityArg>,
        /// Due date, YYYY-MM-DD
        #[arg(long)]
        due: Option<String>,
        /// Parent task id (makes this a subtask)
        #[arg(long)]
        parent: Option<String>,
    },
    /// Edit an existing task
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        clear_notes: bool,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long, value_enum)]
        priority: Option<PriorityArg>,
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        clear_due: bool,
    },
    /// Mark a task completed
    Done { id: String },
    /// Put a completed task back to todo
    Reopen { id: String },
    /// Advance a task around todo -> in-progress -> completed
    Cycle { id: String },
    /// Delete a task (subtasks require --cascade)
    Rm {
        id: String,
        /// Also delete all subtasks
        #[arg(long)]
        cascade: bool,
    },
    /// Import tasks from a .csv or .json file
    Import { file: PathBuf },
    /// Export tasks to stdout or a file
    Export {
        #[arg(long, value_enum, default_value = "json")]
        format: FormatArg,
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Show collection statistics
    Stats,
    /// Show or change preferences
    Config {
        #[arg(long)]
        theme: Option<String>,
        #[arg(long, value_enum)]
        default_priority: Option<PriorityArg>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Todo,
    InProgress,
    Completed,
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum DueArg {
    Today,
    Upcoming,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Priority,
    Due,
    Created,
    Title,
}

#[derive(Clone, Copy, ValueEnum)]
enum PriorityArg {
    High,
    Medium,
    Low,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Json,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::High => Priority::High,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::Low => Priority::Low,
        }
    }
}

fn main() {
    env_logger::init();

    if let Err(message) = run() {
        eprintln!("Error: {}", message);
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let cli = Cli::parse();
    let state = AppState::open_default()?;

    match cli.command {
        Commands::List { search, status, tag, due, sort, asc } => {
            let filter = FilterState {
                search: search.unwrap_or_default(),
                status: match status {
                    Some(StatusArg::Todo) => StatusFilter::Is(TaskStatus::Todo),
                    Some(StatusArg::InProgress) => StatusFilter::Is(TaskStatus::InProgress),
                    Some(StatusArg::Completed) => StatusFilter::Is(TaskStatus::Completed),
                    Some(StatusArg::All) | None => StatusFilter::All,
                },
                tag,
                due: match due {
                    Some(DueArg::Today) => DueFilter::Today,
                    Some(DueArg::Upcoming) => DueFilter::Upcoming,
                    None => DueFilter::Any,
                },
                sort: match sort {
                    SortArg::Priority => SortKey::Priority,
                    SortArg::Due => SortKey::DueDate,
                    SortArg::Created => SortKey::CreatedAt,
                    SortArg::Title => SortKey::Title,
                },
                direction: if asc {
                    SortDirection::Ascending
                } else {
                    SortDirection::Descending
                },
            };

            match commands::list_tasks(&state, &filter) {
                TasksResult::Success { data } => {
                    for task in &data {
                        println!("{}", format_task_line(task));
                    }
                }
                TasksResult::Empty { message } => println!("{}", message),
                TasksResult::Error { message } => return Err(message),
            }
        }

        Commands::Add { title, notes, tags, priority, due, parent } => {
            commands::open_new_task(&state)?;
            commands::with_draft(&state, |draft| {
                draft.title = title;
                draft.notes = notes.unwrap_or_default();
                draft.tags = tags;
                if let Some(p) = priority {
                    draft.priority = p.into();
                }
                draft.due_date = due.unwrap_or_default();
                draft.parent_id = parent;
            })?;
            match commands::submit_form(&state)? {
                FormSubmission::Created(task) => {
                    println!("Added {}  {}", short_id(&task.id), task.title)
                }
                other => return Err(format!("Unexpected submission result: {:?}", other)),
            }
        }

        Commands::Edit { id, title, notes, clear_notes, tags, priority, due, clear_due } => {
            let id = commands::resolve_task_id(&state, &id)?;
            commands::open_edit_task(&state, &id)?;
            commands::with_draft(&state, |draft| {
                if let Some(t) = title {
                    draft.title = t;
                }
                if clear_notes {
                    draft.notes = String::new();
                } else if let Some(n) = notes {
                    draft.notes = n;
                }
                if !tags.is_empty() {
                    draft.tags = tags;
                }
                if let Some(p) = priority {
                    draft.priority = p.into();
                }
                if clear_due {
                    draft.due_date = String::new();
                } else if let Some(d) = due {
                    draft.due_date = d;
                }
            })?;
            match commands::submit_form(&state)? {
                FormSubmission::Updated(task) => {
                    println!("Updated {}  {}", short_id(&task.id), task.title)
                }
                FormSubmission::Vanished => println!("Task no longer exists; nothing changed."),
                other => return Err(format!("Unexpected submission result: {:?}", other)),
            }
        }

        Commands::Done { id } => {
            let id = commands::resolve_task_id(&state, &id)?;
            match commands::complete_task(&state, &id)? {
                Some(task) => println!("Completed {}  {}", short_id(&task.id), task.title),
                None => println!("No task with id {}", id),
            }
        }

        Commands::Reopen { id } => {
            let id = commands::resolve_task_id(&state, &id)?;
            match commands::reopen_task(&state, &id)? {
                Some(task) => println!("Reopened {}  {}", short_id(&task.id), task.title),
                None => println!("No task with id {}", id),
            }
        }

        Commands::Cycle { id } => {
            let id = commands::resolve_task_id(&state, &id)?;
            match commands::cycle_task(&state, &id)? {
                Some(task) => println!(
                    "{}  {} is now {}",
                    short_id(&task.id),
                    task.title,
                    task.status.as_str()
                ),
                None => println!("No task with id {}", id),
            }
        }

        Commands::Rm { id, cascade } => {
            let id = commands::resolve_task_id(&state, &id)?;
            if cascade {
                let removed = commands::confirm_cascade_delete(&state, &id)?;
                match removed {
                    0 => println!("No task with id {}", id),
                    n => println!("Deleted {} task(s)", n),
                }
            } else {
                commands::begin_delete(&state, &id)?;
                match commands::submit_form(&state)? {
                    FormSubmission::Deleted { removed } => println!("Deleted {} task(s)", removed),
                    FormSubmission::DeleteBlocked { dependents, .. } => {
                        return Err(format!(
                            "Task has {} subtask(s). Re-run with --cascade to delete them too.",
                            dependents
                        ));
                    }
                    FormSubmission::Vanished => println!("No task with id {}", id),
                    other => return Err(format!("Unexpected submission result: {:?}", other)),
                }
            }
        }

        Commands::Import { file } => {
            let text = std::fs::read_to_string(&file)
                .map_err(|e| format!("Failed to read {}: {}", file.display(), e))?;
            let is_csv = file
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("csv"))
                .unwrap_or(false);

            if is_csv {
                let summary = commands::import_tasks_csv(&state, &text)?;
                println!(
                    "Imported {} task(s), skipped {} row(s)",
                    summary.imported, summary.skipped
                );
            } else {
                let summary = commands::import_backup_json(&state, &text)?;
                println!(
                    "Restored {} task(s){}",
                    summary.tasks,
                    if summary.settings_applied { " and settings" } else { "" }
                );
            }
        }

        Commands::Export { format, out } => {
            let content = match format {
                FormatArg::Csv => commands::export_tasks_csv(&state)?,
                FormatArg::Json => commands::export_backup_json(&state)?,
            };
            match out {
                Some(path) => {
                    std::fs::write(&path, &content)
                        .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
                    println!("Wrote {}", path.display());
                }
                None => print!("{}", content),
            }
        }

        Commands::Stats => {
            let dashboard = commands::dashboard(&state)?;
            println!(
                "Tasks: {} total | {} todo ({}%) | {} in progress ({}%) | {} completed ({}%)",
                dashboard.status.total,
                dashboard.status.todo,
                dashboard.status.todo_pct,
                dashboard.status.in_progress,
                dashboard.status.in_progress_pct,
                dashboard.status.completed,
                dashboard.status.completed_pct,
            );
            println!(
                "Due: {} overdue | {} today | {} this week",
                dashboard.schedule.overdue,
                dashboard.schedule.due_today,
                dashboard.schedule.due_this_week,
            );
            for bucket in &dashboard.priorities {
                println!(
                    "  {:<6} {} ({}%)",
                    bucket.priority.as_str(),
                    bucket.count,
                    bucket.pct
                );
            }
        }

        Commands::Config { theme, default_priority } => {
            let mut changed = false;
            if let Some(theme) = theme {
                commands::set_theme(&state, &theme)?;
                changed = true;
            }
            if let Some(priority) = default_priority {
                commands::set_default_priority(&state, priority.into())?;
                changed = true;
            }

            let settings = state.current_settings();
            if changed {
                println!("Settings updated.");
            }
            println!(
                "theme = {} | defaultPriority = {} | upcomingWindowDays = {}",
                settings.theme,
                settings.default_priority.as_str(),
                settings.upcoming_window_days,
            );
        }
    }

    Ok(())
}

fn short_id(id: &str) -> &str {
    // uuids are unwieldy on a terminal; commands accept any unique prefix
    id.get(..8).unwrap_or(id)
}

fn format_task_line(task: &Task) -> String {
    let marker = match task.status.as_str() {
        "completed" => "x",
        "in-progress" => ">",
        _ => " ",
    };
    let mut line = format!(
        "[{}] {}  {:<6}  {}",
        marker,
        short_id(&task.id),
        task.priority.as_str(),
        task.title
    );
    if let Some(due) = &task.due_date {
        line.push_str(&format!("  (due {})", due));
    }
    if !task.tags.is_empty() {
        line.push_str(&format!("  #{}", task.tags.join(" #")));
    }
    line
}
