//! Pure selection, grouping and ordering over task lists.
//!
//! Nothing here touches the cache or the remote store; views recompute these
//! from the current list and filter on every render.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::task::{Level, Priority, Task, TaskStatus, Urgency};

/// Minutes assumed for a task without an estimate.
pub const DEFAULT_DURATION_MINUTES: u32 = 60;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub label: Option<String>,
}

impl Filter {
    /// A task passes when every field that is set matches.
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(completed) = self.completed {
            if task.completed != completed {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }
        if let Some(ref label) = self.label {
            if !task.has_label(label) {
                return false;
            }
        }
        true
    }
}

/// Calendar-day equality; the time of day is ignored.
pub fn is_same_day(a: NaiveDateTime, b: NaiveDate) -> bool {
    a.date() == b
}

pub fn apply_filter(tasks: &[Task], filter: &Filter) -> Vec<Task> {
    tasks.iter().filter(|t| filter.matches(t)).cloned().collect()
}

pub fn tasks_for_date(tasks: &[Task], date: NaiveDate, filter: &Filter) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| is_same_day(t.date, date) && filter.matches(t))
        .cloned()
        .collect()
}

/// Tasks dated within `days` days starting at `start`, sorted by date.
pub fn tasks_in_window(tasks: &[Task], start: NaiveDate, days: i64) -> Vec<Task> {
    let end = start + Duration::days(days - 1);
    let in_window: Vec<Task> = tasks
        .iter()
        .filter(|t| t.date.date() >= start && t.date.date() <= end)
        .cloned()
        .collect();
    sort_by_date(&in_window)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Quadrant {
    UrgentImportant,
    NotUrgentImportant,
    UrgentNotImportant,
    NotUrgentNotImportant,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Self::UrgentImportant,
        Self::NotUrgentImportant,
        Self::UrgentNotImportant,
        Self::NotUrgentNotImportant,
    ];

    pub fn classify(urgency: Urgency, priority: Priority) -> Self {
        let urgent = urgency == Level::High;
        let important = priority == Level::High;
        match (urgent, important) {
            (true, true) => Self::UrgentImportant,
            (false, true) => Self::NotUrgentImportant,
            (true, false) => Self::UrgentNotImportant,
            (false, false) => Self::NotUrgentNotImportant,
        }
    }

    /// `(priority, urgency)` a task takes when dropped into this quadrant.
    pub fn levels(&self) -> (Priority, Urgency) {
        match self {
            Self::UrgentImportant => (Level::High, Level::High),
            Self::NotUrgentImportant => (Level::High, Level::Low),
            Self::UrgentNotImportant => (Level::Low, Level::High),
            Self::NotUrgentNotImportant => (Level::Low, Level::Low),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UrgentImportant => "urgent-important",
            Self::NotUrgentImportant => "not-urgent-important",
            Self::UrgentNotImportant => "urgent-not-important",
            Self::NotUrgentNotImportant => "not-urgent-not-important",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.as_str() == s)
    }
}

pub fn quadrant_of(task: &Task) -> Quadrant {
    Quadrant::classify(task.urgency, task.priority)
}

/// Eisenhower matrix buckets. Every task lands in exactly one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matrix {
    pub urgent_important: Vec<Task>,
    pub not_urgent_important: Vec<Task>,
    pub urgent_not_important: Vec<Task>,
    pub not_urgent_not_important: Vec<Task>,
}

impl Matrix {
    pub fn build(tasks: &[Task]) -> Self {
        let mut matrix = Self::default();
        for task in tasks {
            matrix.bucket_mut(quadrant_of(task)).push(task.clone());
        }
        matrix
    }

    pub fn bucket(&self, quadrant: Quadrant) -> &[Task] {
        match quadrant {
            Quadrant::UrgentImportant => &self.urgent_important,
            Quadrant::NotUrgentImportant => &self.not_urgent_important,
            Quadrant::UrgentNotImportant => &self.urgent_not_important,
            Quadrant::NotUrgentNotImportant => &self.not_urgent_not_important,
        }
    }

    fn bucket_mut(&mut self, quadrant: Quadrant) -> &mut Vec<Task> {
        match quadrant {
            Quadrant::UrgentImportant => &mut self.urgent_important,
            Quadrant::NotUrgentImportant => &mut self.not_urgent_important,
            Quadrant::UrgentNotImportant => &mut self.urgent_not_important,
            Quadrant::NotUrgentNotImportant => &mut self.not_urgent_not_important,
        }
    }

    pub fn total_count(&self) -> usize {
        self.urgent_important.len()
            + self.not_urgent_important.len()
            + self.urgent_not_important.len()
            + self.not_urgent_not_important.len()
    }
}

pub fn categorize_by_matrix(tasks: &[Task]) -> Matrix {
    Matrix::build(tasks)
}

pub fn group_by_status(tasks: &[Task]) -> BTreeMap<TaskStatus, Vec<Task>> {
    let mut groups: BTreeMap<TaskStatus, Vec<Task>> = BTreeMap::new();
    for task in tasks {
        groups.entry(task.status).or_default().push(task.clone());
    }
    groups
}

pub fn group_by_priority(tasks: &[Task]) -> BTreeMap<Priority, Vec<Task>> {
    let mut groups: BTreeMap<Priority, Vec<Task>> = BTreeMap::new();
    for task in tasks {
        groups.entry(task.priority).or_default().push(task.clone());
    }
    groups
}

/// Kanban board columns: incomplete tasks only, one column per status.
pub fn kanban_columns(tasks: &[Task]) -> BTreeMap<TaskStatus, Vec<Task>> {
    let mut columns: BTreeMap<TaskStatus, Vec<Task>> =
        TaskStatus::ALL.into_iter().map(|s| (s, Vec::new())).collect();
    for task in tasks.iter().filter(|t| !t.completed) {
        columns.entry(task.status).or_default().push(task.clone());
    }
    columns
}

pub fn sort_by_date(tasks: &[Task]) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by_key(|t| t.date);
    sorted
}

pub fn sort_by_priority(tasks: &[Task]) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by_key(|t| std::cmp::Reverse(t.priority.rank()));
    sorted
}

pub fn duration_minutes(task: &Task) -> u32 {
    task.estimated_duration.unwrap_or(DEFAULT_DURATION_MINUTES)
}

/// Placeholder progress metric, not derived from elapsed time.
pub fn progress(task: &Task) -> u8 {
    if task.completed {
        100
    } else if task.status == TaskStatus::InProgress {
        50
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::task::NewTask;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn task(id: &str, d: u32, hour: u32) -> Task {
        let date = day(d).and_hms_opt(hour, 30, 0).unwrap();
        Task::from_draft(NewTask::new(id, date), id.to_string())
    }

    fn fixture() -> Vec<Task> {
        let mut a = task("a", 1, 0);
        a.priority = Level::High;
        a.urgency = Level::High;
        a.labels = vec!["work".into()];
        let mut b = task("b", 1, 23);
        b.completed = true;
        b.status = TaskStatus::Done;
        b.priority = Level::High;
        let mut c = task("c", 2, 8);
        c.urgency = Level::High;
        c.labels = vec!["home".into(), "work".into()];
        let mut d = task("d", 30, 12);
        d.status = TaskStatus::InProgress;
        vec![a, b, c, d]
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn date_match_ignores_time_of_day() {
        let tasks = fixture();
        let found = tasks_for_date(&tasks, day(1), &Filter::default());
        assert_eq!(ids(&found), vec!["a", "b"]);
        assert!(tasks_for_date(&tasks, day(3), &Filter::default()).is_empty());
    }

    #[test]
    fn date_match_combines_with_filter() {
        let tasks = fixture();
        let filter = Filter {
            completed: Some(false),
            ..Filter::default()
        };
        assert_eq!(ids(&tasks_for_date(&tasks, day(1), &filter)), vec!["a"]);
    }

    #[test]
    fn unset_fields_impose_nothing() {
        let tasks = fixture();
        assert_eq!(apply_filter(&tasks, &Filter::default()).len(), tasks.len());
    }

    #[test]
    fn label_filter_requires_membership() {
        let tasks = fixture();
        let filter = Filter {
            label: Some("work".into()),
            ..Filter::default()
        };
        assert_eq!(ids(&apply_filter(&tasks, &filter)), vec!["a", "c"]);
    }

    #[test]
    fn filter_is_idempotent() {
        let tasks = fixture();
        let filter = Filter {
            completed: Some(false),
            priority: Some(Level::Medium),
            label: None,
        };
        let once = apply_filter(&tasks, &filter);
        let twice = apply_filter(&once, &filter);
        assert_eq!(once, twice);
        assert_eq!(ids(&once), vec!["c", "d"]);
    }

    #[test]
    fn matrix_partitions_tasks() {
        let tasks = fixture();
        let matrix = categorize_by_matrix(&tasks);
        assert_eq!(matrix.total_count(), tasks.len());
        assert_eq!(ids(matrix.bucket(Quadrant::UrgentImportant)), vec!["a"]);
        assert_eq!(ids(matrix.bucket(Quadrant::NotUrgentImportant)), vec!["b"]);
        assert_eq!(ids(matrix.bucket(Quadrant::UrgentNotImportant)), vec!["c"]);
        assert_eq!(ids(matrix.bucket(Quadrant::NotUrgentNotImportant)), vec!["d"]);
    }

    #[test]
    fn quadrant_levels_round_trip() {
        for quadrant in Quadrant::ALL {
            let (priority, urgency) = quadrant.levels();
            assert_eq!(Quadrant::classify(urgency, priority), quadrant);
            assert_eq!(Quadrant::parse(quadrant.as_str()), Some(quadrant));
        }
    }

    #[test]
    fn sort_by_date_is_stable() {
        let mut tasks = fixture();
        let mut twin = task("a2", 1, 0);
        twin.date = tasks[0].date;
        tasks.insert(0, tasks[3].clone());
        tasks.push(twin);
        let sorted = sort_by_date(&tasks);
        assert_eq!(ids(&sorted), vec!["a", "a2", "b", "c", "d", "d"]);
    }

    #[test]
    fn sort_by_priority_puts_high_first() {
        let sorted = sort_by_priority(&fixture());
        assert_eq!(ids(&sorted), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn kanban_skips_completed() {
        let columns = kanban_columns(&fixture());
        assert_eq!(ids(&columns[&TaskStatus::Todo]), vec!["a", "c"]);
        assert_eq!(ids(&columns[&TaskStatus::InProgress]), vec!["d"]);
        assert!(columns[&TaskStatus::Done].is_empty());
    }

    #[test]
    fn progress_and_duration() {
        let tasks = fixture();
        assert_eq!(progress(&tasks[0]), 0);
        assert_eq!(progress(&tasks[1]), 100);
        assert_eq!(progress(&tasks[3]), 50);
        assert_eq!(duration_minutes(&tasks[0]), DEFAULT_DURATION_MINUTES);
    }

    #[test]
    fn window_selects_and_sorts() {
        let tasks = fixture();
        let window = tasks_in_window(&tasks, day(1), 2);
        assert_eq!(ids(&window), vec!["a", "b", "c"]);
    }

    #[test]
    fn groups_cover_every_task() {
        let tasks = fixture();
        let by_status: usize = group_by_status(&tasks).values().map(Vec::len).sum();
        let by_priority = group_by_priority(&tasks);
        assert_eq!(by_status, tasks.len());
        assert_eq!(ids(&by_priority[&Level::High]), vec!["a", "b"]);
    }
}
