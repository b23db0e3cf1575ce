use std::collections::{HashMap, HashSet};

use crate::core::task::Task;
use crate::remote::TaskRow;

/// Rebuild a task pulled from the remote table, restoring the fields the
/// table has no columns for from the locally cached copy.
///
/// The row wins for every column it carries. Status is kept from the local
/// copy only while it still agrees with the row's `completed` flag, so a
/// completion toggled elsewhere is never masked by a stale local status.
pub fn carry_local_fields(pulled: Task, local: Option<&Task>) -> Task {
    let Some(local) = local else {
        return pulled;
    };
    let mut merged = pulled;

    merged.urgency = local.urgency;
    merged.estimated_duration = local.estimated_duration;
    merged.actual_duration = local.actual_duration;
    merged.started_at = local.started_at;

    if local.status.is_done() == merged.completed {
        merged.status = local.status;
    }
    if merged.completed {
        merged.completed_at = local.completed_at;
    }

    merged
}

/// Convert remote rows into tasks, carrying local-only fields over by id.
/// Rows that cannot be decoded are skipped and counted.
pub fn reconcile(rows: &[TaskRow], local: &[Task]) -> (Vec<Task>, usize) {
    let local_by_id: HashMap<&str, &Task> = local.iter().map(|t| (t.id.as_str(), t)).collect();
    let mut skipped = 0;
    let mut tasks = Vec::with_capacity(rows.len());

    for row in rows {
        match row.to_task() {
            Ok(pulled) => {
                let local = local_by_id.get(row.id.as_str()).copied();
                tasks.push(carry_local_fields(pulled, local));
            }
            Err(e) => {
                log::debug!("Skipping remote row: {}", e);
                skipped += 1;
            }
        }
    }

    (tasks, skipped)
}

/// A difference between the local list and the remote table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Divergence {
    FieldMismatch {
        id: String,
        title: String,
        fields: Vec<&'static str>,
    },
    RemoteOnly {
        row: TaskRow,
    },
    LocalOnly {
        id: String,
        title: String,
    },
}

/// Compare local tasks with remote rows on the columns the table carries.
pub fn compare(local: &[Task], rows: &[TaskRow]) -> Vec<Divergence> {
    let mut divergences = Vec::new();
    let local_by_id: HashMap<&str, &Task> = local.iter().map(|t| (t.id.as_str(), t)).collect();
    let mut remote_ids: HashSet<&str> = HashSet::new();

    for row in rows {
        remote_ids.insert(row.id.as_str());
        let Some(&task) = local_by_id.get(row.id.as_str()) else {
            divergences.push(Divergence::RemoteOnly { row: row.clone() });
            continue;
        };
        let fields = mismatched_fields(task, row);
        if !fields.is_empty() {
            divergences.push(Divergence::FieldMismatch {
                id: task.id.clone(),
                title: task.title.clone(),
                fields,
            });
        }
    }

    for task in local {
        if !remote_ids.contains(task.id.as_str()) {
            divergences.push(Divergence::LocalOnly {
                id: task.id.clone(),
                title: task.title.clone(),
            });
        }
    }

    divergences
}

fn mismatched_fields(task: &Task, row: &TaskRow) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if task.title != row.title {
        fields.push("title");
    }
    if task.description != row.description {
        fields.push("description");
    }
    match row.to_task() {
        Ok(remote) if remote.date == task.date => {}
        _ => fields.push("date"),
    }
    if task.completed != row.completed {
        fields.push("completed");
    }
    if task.priority != row.priority {
        fields.push("priority");
    }
    if task.labels != row.labels.clone().unwrap_or_default() {
        fields.push("labels");
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::task::{Level, NewTask, TaskStatus};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap().and_hms_opt(9, 0, 0).unwrap()
    }

    fn local_task() -> Task {
        let mut task = Task::from_draft(
            NewTask::new("Plan trip", at(1)).urgency(Level::High).estimated_duration(45),
            "t-1".into(),
        );
        task.set_status(TaskStatus::InProgress, at(2));
        task
    }

    #[test]
    fn keeps_local_only_fields() {
        let local = local_task();
        let row = TaskRow::from_task(&local, at(3));
        let merged = carry_local_fields(row.to_task().unwrap(), Some(&local));
        assert_eq!(merged, local);
    }

    #[test]
    fn remote_completion_overrides_stale_status() {
        let local = local_task();
        let mut row = TaskRow::from_task(&local, at(3));
        row.completed = true;
        row.title = "Plan holiday".into();

        let merged = carry_local_fields(row.to_task().unwrap(), Some(&local));
        assert!(merged.completed);
        assert_eq!(merged.status, TaskStatus::Done);
        assert_eq!(merged.title, "Plan holiday");
        assert_eq!(merged.urgency, Level::High);
    }

    #[test]
    fn without_local_copy_row_defaults_stand() {
        let row = TaskRow::from_task(&local_task(), at(3));
        let pulled = row.to_task().unwrap();
        assert_eq!(carry_local_fields(pulled.clone(), None), pulled);
    }

    #[test]
    fn reconcile_skips_undecodable_rows() {
        let local = local_task();
        let good = TaskRow::from_task(&local, at(3));
        let mut bad = good.clone();
        bad.id = "t-2".into();
        bad.date = "never".into();

        let (tasks, skipped) = reconcile(&[good, bad], std::slice::from_ref(&local));
        assert_eq!(skipped, 1);
        assert_eq!(tasks, vec![local]);
    }

    #[test]
    fn compare_reports_each_kind() {
        let local = local_task();
        let mut renamed = TaskRow::from_task(&local, at(3));
        renamed.title = "Other".into();
        renamed.priority = Level::Low;

        let mut stranger = renamed.clone();
        stranger.id = "t-9".into();

        let mut unsynced = local_task();
        unsynced.id = "t-5".into();

        let divergences = compare(&[local, unsynced], &[renamed, stranger.clone()]);
        assert_eq!(divergences.len(), 3);
        assert_eq!(
            divergences[0],
            Divergence::FieldMismatch {
                id: "t-1".into(),
                title: "Plan trip".into(),
                fields: vec!["title", "priority"],
            }
        );
        assert_eq!(divergences[1], Divergence::RemoteOnly { row: stranger });
        assert!(matches!(&divergences[2], Divergence::LocalOnly { id, .. } if id == "t-5"));
    }
}
