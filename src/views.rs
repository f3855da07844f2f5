//! Derived views
//!
//! Pure functions from (collection, filter state) to display-ready data.
//! Nothing here caches or mutates; views are recomputed on every render and
//! the same inputs always produce the same ordered output.

use std::cmp::Ordering;

use chrono::{Local, NaiveDate};

use crate::types::{
    DueFilter, FilterState, Priority, PriorityBucket, ScheduleSummary, SortDirection, SortKey,
    StatusFilter, StatusSummary, Task, TaskStatus,
};

/// Default width of the "upcoming" due window, in days.
pub const DEFAULT_UPCOMING_WINDOW_DAYS: i64 = 7;

/// Filter and sort the collection for display, evaluated against the
/// current calendar day.
pub fn project(tasks: &[Task], filter: &FilterState) -> Vec<Task> {
    project_on(tasks, filter, Local::now().date_naive(), DEFAULT_UPCOMING_WINDOW_DAYS)
}

/// Deterministic core of `project`: the reference day and the upcoming
/// window are explicit so callers (and tests) control time.
pub fn project_on(
    tasks: &[Task],
    filter: &FilterState,
    today: NaiveDate,
    upcoming_window_days: i64,
) -> Vec<Task> {
    let mut out: Vec<Task> = tasks
        .iter()
        .filter(|t| matches(t, filter, today, upcoming_window_days))
        .cloned()
        .collect();

    // Stable sort: ties keep their original collection order.
    out.sort_by(|a, b| {
        let primary = match filter.sort {
            SortKey::Priority => a.priority.rank().cmp(&b.priority.rank()),
            SortKey::DueDate => compare_due_date(a.due_date.as_deref(), b.due_date.as_deref()),
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        };
        let primary = match filter.direction {
            SortDirection::Ascending => primary,
            SortDirection::Descending => primary.reverse(),
        };
        primary.then_with(|| {
            if filter.sort == SortKey::DueDate {
                Ordering::Equal
            } else {
                compare_due_date(a.due_date.as_deref(), b.due_date.as_deref())
            }
        })
    });

    out
}

fn matches(task: &Task, filter: &FilterState, today: NaiveDate, window: i64) -> bool {
    if let StatusFilter::Is(status) = filter.status {
        if task.status != status {
            return false;
        }
    }

    if let Some(tag) = &filter.tag {
        if !task.tags.iter().any(|t| t == tag) {
            return false;
        }
    }

    match filter.due {
        DueFilter::Any => {}
        DueFilter::Today => {
            let due = parse_due(task.due_date.as_deref());
            if due != Some(today) {
                return false;
            }
        }
        DueFilter::Upcoming => {
            // (today, today + window], completed tasks excluded
            if task.status == TaskStatus::Completed {
                return false;
            }
            match parse_due(task.due_date.as_deref()) {
                Some(due) => {
                    let delta = (due - today).num_days();
                    if delta <= 0 || delta > window {
                        return false;
                    }
                }
                None => return false,
            }
        }
    }

    if !filter.search.is_empty() {
        let needle = filter.search.to_lowercase();
        let in_title = task.title.to_lowercase().contains(&needle);
        let in_notes = task
            .notes
            .as_deref()
            .map(|n| n.to_lowercase().contains(&needle))
            .unwrap_or(false);
        let in_tags = task.tags.iter().any(|t| t.to_lowercase().contains(&needle));
        if !(in_title || in_notes || in_tags) {
            return false;
        }
    }

    true
}

fn parse_due(value: Option<&str>) -> Option<NaiveDate> {
    value.and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok())
}

/// Earlier dates rank higher. Missing or unparsable dates rank last.
fn compare_due_date(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (parse_due(a), parse_due(b)) {
        (Some(da), Some(db)) => da.cmp(&db),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn pct(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((count as f64 * 100.0) / total as f64).round() as u32
}

/// Counts and percentages per status. An empty collection reports 0 for
/// every percentage.
pub fn status_summary(tasks: &[Task]) -> StatusSummary {
    let total = tasks.len();
    let todo = tasks.iter().filter(|t| t.status == TaskStatus::Todo).count();
    let in_progress = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::InProgress)
        .count();
    let completed = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .count();

    StatusSummary {
        total,
        todo,
        in_progress,
        completed,
        todo_pct: pct(todo, total),
        in_progress_pct: pct(in_progress, total),
        completed_pct: pct(completed, total),
    }
}

/// Due-date pressure: overdue / due today / due within the next week.
/// Completed tasks are not pressure and are excluded from all three.
pub fn schedule_summary(tasks: &[Task], today: NaiveDate) -> ScheduleSummary {
    let mut summary = ScheduleSummary {
        overdue: 0,
        due_today: 0,
        due_this_week: 0,
    };

    for task in tasks {
        if task.status == TaskStatus::Completed {
            continue;
        }
        let due = match parse_due(task.due_date.as_deref()) {
            Some(d) => d,
            None => continue,
        };
        let delta = (due - today).num_days();
        if delta < 0 {
            summary.overdue += 1;
        } else if delta == 0 {
            summary.due_today += 1;
        } else if delta <= DEFAULT_UPCOMING_WINDOW_DAYS {
            summary.due_this_week += 1;
        }
    }

    summary
}

/// Buckets in display order High, Medium, Low.
pub fn priority_breakdown(tasks: &[Task]) -> Vec<PriorityBucket> {
    let total = tasks.len();
    [Priority::High, Priority::Medium, Priority::Low]
        .iter()
        .map(|p| {
            let count = tasks.iter().filter(|t| t.priority == *p).count();
            PriorityBucket {
                priority: *p,
                count,
                pct: pct(count, total),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

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
            created_at: "2025-03-01T09:00:00+00:00".to_string(),
            updated_at: None,
            completed_at: None,
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_priority_desc_then_due_asc_scenario() {
        // [low, high, medium] with equal due dates must come back high first
        let mut low = task("a", "low one");
        low.priority = Priority::Low;
        low.due_date = Some("2025-03-10".to_string());
        let mut high = task("b", "high one");
        high.priority = Priority::High;
        high.due_date = Some("2025-03-10".to_string());
        let mut medium = task("c", "medium one");
        medium.priority = Priority::Medium;
        medium.due_date = Some("2025-03-10".to_string());

        let out = project_on(
            &[low, high, medium],
            &FilterState::default(),
            day("2025-03-01"),
            7,
        );

        let ids: Vec<&str> = out.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_secondary_due_date_ascending() {
        let mut later = task("a", "later");
        later.due_date = Some("2025-03-20".to_string());
        let mut sooner = task("b", "sooner");
        sooner.due_date = Some("2025-03-05".to_string());
        let none = task("c", "undated");

        let out = project_on(
            &[later.clone(), none.clone(), sooner.clone()],
            &FilterState::default(),
            day("2025-03-01"),
            7,
        );

        // equal priority, so due date decides; missing dates go last
        let ids: Vec<&str> = out.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_ties_keep_original_order() {
        let first = task("a", "same");
        let second = task("b", "same");
        let third = task("c", "same");

        let out = project_on(
            &[first, second, third],
            &FilterState::default(),
            day("2025-03-01"),
            7,
        );

        let ids: Vec<&str> = out.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_search_matches_title_notes_or_tags() {
        let mut by_title = task("a", "Renew passport");
        by_title.tags = vec!["errand".to_string()];
        let mut by_notes = task("b", "Call office");
        by_notes.notes = Some("ask about the passport form".to_string());
        let mut by_tag = task("c", "Book flight");
        by_tag.tags = vec!["passport".to_string()];
        let unrelated = task("d", "Water plants");

        let mut filter = FilterState::default();
        filter.search = "PASSPORT".to_string();

        let out = project_on(
            &[by_title, by_notes, by_tag, unrelated],
            &filter,
            day("2025-03-01"),
            7,
        );

        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|t| t.id != "d"));
    }

    #[test]
    fn test_status_filter_all_sentinel() {
        let mut done = task("a", "done");
        done.status = TaskStatus::Completed;
        let open = task("b", "open");

        let all = project_on(
            &[done.clone(), open.clone()],
            &FilterState::default(),
            day("2025-03-01"),
            7,
        );
        assert_eq!(all.len(), 2);

        let mut filter = FilterState::default();
        filter.status = StatusFilter::Is(TaskStatus::Completed);
        let only_done = project_on(&[done, open], &filter, day("2025-03-01"), 7);
        assert_eq!(only_done.len(), 1);
        assert_eq!(only_done[0].id, "a");
    }

    #[test]
    fn test_due_today_is_exact_day_match() {
        let mut today_task = task("a", "today");
        today_task.due_date = Some("2025-03-01".to_string());
        let mut tomorrow_task = task("b", "tomorrow");
        tomorrow_task.due_date = Some("2025-03-02".to_string());
        let undated = task("c", "undated");

        let mut filter = FilterState::default();
        filter.due = DueFilter::Today;

        let out = project_on(
            &[today_task, tomorrow_task, undated],
            &filter,
            day("2025-03-01"),
            7,
        );

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "a");
    }

    #[test]
    fn test_upcoming_is_half_open_and_skips_completed() {
        let mut due_today = task("a", "today");
        due_today.due_date = Some("2025-03-01".to_string());
        let mut in_window = task("b", "in window");
        in_window.due_date = Some("2025-03-08".to_string()); // exactly today + 7
        let mut past_window = task("c", "past window");
        past_window.due_date = Some("2025-03-09".to_string());
        let mut completed = task("d", "done already");
        completed.due_date = Some("2025-03-05".to_string());
        completed.status = TaskStatus::Completed;

        let mut filter = FilterState::default();
        filter.due = DueFilter::Upcoming;

        let out = project_on(
            &[due_today, in_window, past_window, completed],
            &filter,
            day("2025-03-01"),
            7,
        );

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "b");
    }

    #[test]
    fn test_project_is_idempotent() {
        let mut a = task("a", "one");
        a.priority = Priority::High;
        let b = task("b", "two");
        let tasks = vec![a, b];
        let filter = FilterState::default();

        let first = project_on(&tasks, &filter, day("2025-03-01"), 7);
        let second = project_on(&tasks, &filter, day("2025-03-01"), 7);

        assert_eq!(first, second);
    }

    #[test]
    fn test_status_summary_percentages() {
        let mut done = task("a", "done");
        done.status = TaskStatus::Completed;
        let open = task("b", "open");
        let mut doing = task("c", "doing");
        doing.status = TaskStatus::InProgress;
        let open2 = task("d", "open too");

        let summary = status_summary(&[done, open, doing, open2]);

        assert_eq!(summary.total, 4);
        assert_eq!(summary.todo, 2);
        assert_eq!(summary.todo_pct, 50);
        assert_eq!(summary.completed_pct, 25);
        assert_eq!(summary.in_progress_pct, 25);
    }

    #[test]
    fn test_empty_collection_percentages_are_zero() {
        let summary = status_summary(&[]);
        assert_eq!(summary.todo_pct, 0);
        assert_eq!(summary.in_progress_pct, 0);
        assert_eq!(summary.completed_pct, 0);

        for bucket in priority_breakdown(&[]) {
            assert_eq!(bucket.pct, 0);
        }
    }

    #[test]
    fn test_schedule_summary_buckets() {
        let mut overdue = task("a", "late");
        overdue.due_date = Some("2025-02-20".to_string());
        let mut today_task = task("b", "today");
        today_task.due_date = Some("2025-03-01".to_string());
        let mut this_week = task("c", "soon");
        this_week.due_date = Some("2025-03-06".to_string());
        let mut done_late = task("d", "finished late");
        done_late.due_date = Some("2025-02-01".to_string());
        done_late.status = TaskStatus::Completed;

        let summary = schedule_summary(
            &[overdue, today_task, this_week, done_late],
            day("2025-03-01"),
        );

        assert_eq!(summary.overdue, 1);
        assert_eq!(summary.due_today, 1);
        assert_eq!(summary.due_this_week, 1);
    }
}
