pub mod keyring;
pub mod memory;
pub mod rest;

use std::future::Future;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

use crate::cache::codec::parse_iso;
use crate::core::task::{Priority, Task, TaskStatus};
use crate::error::RemoteError;

const ROW_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// One row of the remote `tasks` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRow {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: Priority,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Nullable columns read `null` as their default (`false`, low priority).
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode a `SELECT` response body row by row. Rows that do not fit the
/// table shape are logged and left out; only a body that is not a JSON
/// array is an error.
pub fn decode_rows(body: &str) -> Result<Vec<TaskRow>, RemoteError> {
    let values: Vec<serde_json::Value> =
        serde_json::from_str(body).map_err(|e| RemoteError::Decode(e.to_string()))?;
    let mut rows = Vec::with_capacity(values.len());
    for value in values {
        let id = value.get("id").and_then(|v| v.as_str()).unwrap_or("?").to_string();
        match serde_json::from_value::<TaskRow>(value) {
            Ok(row) => rows.push(row),
            Err(e) => log::warn!("Skipping remote row {}: {}", id, e),
        }
    }
    Ok(rows)
}

impl TaskRow {
    pub fn from_task(task: &Task, updated_at: NaiveDateTime) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            date: task.date.format(ROW_DATE_FORMAT).to_string(),
            completed: task.completed,
            priority: task.priority,
            labels: (!task.labels.is_empty()).then(|| task.labels.clone()),
            updated_at: Some(updated_at.format(ROW_DATE_FORMAT).to_string()),
        }
    }

    /// Columns the table does not carry get their defaults here; the sync
    /// layer restores them from the cached copy where it has one.
    pub fn to_task(&self) -> Result<Task, RemoteError> {
        let date = parse_iso(&self.date)
            .ok_or_else(|| RemoteError::Decode(format!("row {} has invalid date {:?}", self.id, self.date)))?;
        Ok(Task {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            date,
            completed: self.completed,
            priority: self.priority,
            labels: self.labels.clone().unwrap_or_default(),
            status: if self.completed { TaskStatus::Done } else { TaskStatus::Todo },
            urgency: Default::default(),
            estimated_duration: None,
            actual_duration: None,
            started_at: None,
            completed_at: None,
        })
    }

    pub fn updated(&self) -> Option<NaiveDateTime> {
        self.updated_at.as_deref().and_then(parse_iso)
    }
}

/// CRUD over the remote task table. Only the sync layer calls this.
pub trait RemoteStore: Send + Sync {
    /// All rows, most recently updated first.
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<TaskRow>, RemoteError>> + Send;

    fn insert(&self, row: &TaskRow) -> impl Future<Output = Result<(), RemoteError>> + Send;

    fn update(&self, row: &TaskRow) -> impl Future<Output = Result<(), RemoteError>> + Send;

    fn delete(&self, id: &str) -> impl Future<Output = Result<(), RemoteError>> + Send;
}

/// Stand-in used when no remote is configured; every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

impl RemoteStore for Offline {
    async fn fetch_all(&self) -> Result<Vec<TaskRow>, RemoteError> {
        Err(RemoteError::NotConfigured)
    }

    async fn insert(&self, _row: &TaskRow) -> Result<(), RemoteError> {
        Err(RemoteError::NotConfigured)
    }

    async fn update(&self, _row: &TaskRow) -> Result<(), RemoteError> {
        Err(RemoteError::NotConfigured)
    }

    async fn delete(&self, _id: &str) -> Result<(), RemoteError> {
        Err(RemoteError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::task::{Level, NewTask};
    use chrono::NaiveDate;

    #[test]
    fn row_keeps_table_columns() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let mut task = Task::from_draft(
            NewTask::new("Buy milk", date).label("errand").urgency(Level::High),
            "t-1".into(),
        );
        task.toggle_completion(date);

        let row = TaskRow::from_task(&task, date);
        assert_eq!(row.date, "2024-05-01T09:00:00");
        assert_eq!(row.labels, Some(vec!["errand".to_string()]));
        assert_eq!(row.updated(), Some(date));

        let back = row.to_task().unwrap();
        assert_eq!(back.date, task.date);
        assert_eq!(back.labels, task.labels);
        assert_eq!(back.status, TaskStatus::Done);
        assert_eq!(back.urgency, Level::Low);
    }

    #[test]
    fn row_with_bad_date_is_rejected() {
        let row = TaskRow {
            id: "x".into(),
            title: "t".into(),
            description: None,
            date: "soon".into(),
            completed: false,
            priority: Priority::Low,
            labels: None,
            updated_at: None,
        };
        assert!(matches!(row.to_task(), Err(RemoteError::Decode(_))));
    }

    #[test]
    fn null_columns_take_defaults() {
        let row: TaskRow = serde_json::from_str(
            r#"{"id":"n","title":"Nulls","description":null,"date":"2024-05-01T00:00:00","completed":null,"priority":null,"labels":null,"updated_at":null}"#,
        )
        .unwrap();
        assert_eq!(row.priority, Priority::Low);
        assert!(!row.completed);
        assert_eq!(row.to_task().unwrap().labels, Vec::<String>::new());
    }

    #[test]
    fn body_decodes_row_by_row() {
        let body = r#"[
            {"id":"a","title":"Good","description":null,"date":"2024-05-01T09:00:00","completed":false,"priority":"high","labels":["work"],"updated_at":"2024-05-02T10:00:00"},
            {"id":"b","title":"Null priority","description":null,"date":"2024-05-01T09:00:00","completed":true,"priority":null,"labels":null,"updated_at":null},
            {"id":"c","title":null,"date":"2024-05-01T09:00:00","priority":"low"},
            {"id":"d","title":"No date","date":null,"priority":"low"}
        ]"#;
        let rows = decode_rows(body).unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(rows[0].priority, Priority::High);
        assert_eq!(rows[1].priority, Priority::Low);
        assert!(rows[1].completed);

        assert!(matches!(decode_rows(r#"{"message":"oops"}"#), Err(RemoteError::Decode(_))));
    }

    #[tokio::test]
    async fn offline_always_fails() {
        assert_eq!(Offline.fetch_all().await, Err(RemoteError::NotConfigured));
        assert_eq!(Offline.delete("x").await, Err(RemoteError::NotConfigured));
    }
}
