//! Schema-aware encoding of cached collections.
//!
//! Date fields are written as `{"__type": "Date", "value": "<ISO-8601>"}` so a
//! generic string store keeps enough type information to rebuild them. The
//! decoder also accepts bare ISO-8601 strings written by older caches.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::core::fitness::{ActivityKind, FitnessActivity};
use crate::core::task::{Level, Priority, Task, TaskStatus, Urgency};

const DATE_TAG: &str = "Date";
const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredDate {
    Tagged {
        #[serde(rename = "__type")]
        tag: String,
        value: String,
    },
    Plain(String),
}

impl StoredDate {
    fn encode(dt: NaiveDateTime) -> Self {
        Self::Tagged {
            tag: DATE_TAG.to_string(),
            value: dt.format(ISO_FORMAT).to_string(),
        }
    }

    fn decode(&self) -> Result<NaiveDateTime, String> {
        let raw = match self {
            Self::Tagged { tag, value } if tag == DATE_TAG => value,
            Self::Tagged { tag, .. } => return Err(format!("unknown type tag {:?}", tag)),
            Self::Plain(value) => value,
        };
        parse_iso(raw).ok_or_else(|| format!("invalid date {:?}", raw))
    }
}

/// Parse a naive ISO-8601 timestamp, an RFC 3339 timestamp (converted to
/// local time), or a bare date (midnight).
pub fn parse_iso(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = raw.parse::<NaiveDateTime>() {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    raw.parse::<NaiveDate>()
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn decode_opt(date: &Option<StoredDate>) -> Result<Option<NaiveDateTime>, String> {
    date.as_ref().map(StoredDate::decode).transpose()
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredTask {
    id: String,
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    date: StoredDate,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    labels: Option<Vec<String>>,
    #[serde(default)]
    status: Option<TaskStatus>,
    #[serde(default)]
    urgency: Option<Urgency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    estimated_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    actual_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    started_at: Option<StoredDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed_at: Option<StoredDate>,
}

impl From<&Task> for StoredTask {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            date: StoredDate::encode(task.date),
            completed: task.completed,
            priority: Some(task.priority),
            labels: (!task.labels.is_empty()).then(|| task.labels.clone()),
            status: Some(task.status),
            urgency: Some(task.urgency),
            estimated_duration: task.estimated_duration,
            actual_duration: task.actual_duration,
            started_at: task.started_at.map(StoredDate::encode),
            completed_at: task.completed_at.map(StoredDate::encode),
        }
    }
}

impl TryFrom<StoredTask> for Task {
    type Error = String;

    fn try_from(stored: StoredTask) -> Result<Self, String> {
        let date = stored.date.decode()?;
        let started_at = decode_opt(&stored.started_at)?;
        let completed_at = decode_opt(&stored.completed_at)?;
        // Entries written before status existed derive it from `completed`.
        let status = stored.status.unwrap_or(if stored.completed {
            TaskStatus::Done
        } else {
            TaskStatus::Todo
        });
        Ok(Task {
            id: stored.id,
            title: stored.title,
            description: stored.description,
            date,
            completed: stored.completed,
            priority: stored.priority.unwrap_or(Level::Low),
            labels: stored.labels.unwrap_or_default(),
            status,
            urgency: stored.urgency.unwrap_or(Level::Low),
            estimated_duration: stored.estimated_duration,
            actual_duration: stored.actual_duration,
            started_at,
            completed_at,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredActivity {
    id: String,
    title: String,
    #[serde(rename = "type")]
    kind: ActivityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    intensity: Option<Level>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    calories: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    date: StoredDate,
    #[serde(default)]
    completed: bool,
    created_at: StoredDate,
    updated_at: StoredDate,
}

impl From<&FitnessActivity> for StoredActivity {
    fn from(a: &FitnessActivity) -> Self {
        Self {
            id: a.id.clone(),
            title: a.title.clone(),
            kind: a.kind,
            duration: a.duration,
            intensity: a.intensity,
            calories: a.calories,
            notes: a.notes.clone(),
            date: StoredDate::encode(a.date),
            completed: a.completed,
            created_at: StoredDate::encode(a.created_at),
            updated_at: StoredDate::encode(a.updated_at),
        }
    }
}

impl TryFrom<StoredActivity> for FitnessActivity {
    type Error = String;

    fn try_from(stored: StoredActivity) -> Result<Self, String> {
        Ok(FitnessActivity {
            date: stored.date.decode()?,
            created_at: stored.created_at.decode()?,
            updated_at: stored.updated_at.decode()?,
            id: stored.id,
            title: stored.title,
            kind: stored.kind,
            duration: stored.duration,
            intensity: stored.intensity,
            calories: stored.calories,
            notes: stored.notes,
            completed: stored.completed,
        })
    }
}

pub fn encode_tasks(tasks: &[Task]) -> Result<String, String> {
    let stored: Vec<StoredTask> = tasks.iter().map(StoredTask::from).collect();
    serde_json::to_string(&stored).map_err(|e| e.to_string())
}

/// Decode a cached task list. Only a blob that is not a JSON array fails;
/// individual entries that cannot be read are logged and dropped.
pub fn decode_tasks(json: &str) -> Result<Vec<Task>, String> {
    decode_each::<StoredTask, Task>(json, "task")
}

pub fn encode_activities(activities: &[FitnessActivity]) -> Result<String, String> {
    let stored: Vec<StoredActivity> = activities.iter().map(StoredActivity::from).collect();
    serde_json::to_string(&stored).map_err(|e| e.to_string())
}

pub fn decode_activities(json: &str) -> Result<Vec<FitnessActivity>, String> {
    decode_each::<StoredActivity, FitnessActivity>(json, "activity")
}

fn decode_each<S, T>(json: &str, what: &str) -> Result<Vec<T>, String>
where
    S: serde::de::DeserializeOwned,
    T: TryFrom<S, Error = String>,
{
    let entries: Vec<serde_json::Value> = serde_json::from_str(json).map_err(|e| e.to_string())?;
    let mut decoded = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let item = serde_json::from_value::<S>(entry)
            .map_err(|e| e.to_string())
            .and_then(T::try_from);
        match item {
            Ok(item) => decoded.push(item),
            Err(e) => log::warn!("Dropping unreadable cached {} at index {}: {}", what, index, e),
        }
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::task::NewTask;

    fn at(d: u32, h: u32, nanos: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, d)
            .unwrap()
            .and_hms_nano_opt(h, 15, 42, nanos)
            .unwrap()
    }

    fn full_task() -> Task {
        let mut task = Task::from_draft(
            NewTask::new("Write report", at(1, 9, 0))
                .description("Quarterly numbers")
                .label("work")
                .label("q2")
                .priority(Level::High)
                .urgency(Level::Medium)
                .estimated_duration(90),
            "t-1".into(),
        );
        task.actual_duration = Some(75);
        task.set_status(TaskStatus::InProgress, at(2, 10, 123_456_789));
        task
    }

    #[test]
    fn tasks_round_trip_exactly() {
        let plain = Task::from_draft(NewTask::new("Buy milk", at(3, 0, 500)), "t-2".into());
        let tasks = vec![full_task(), plain];
        let json = encode_tasks(&tasks).unwrap();
        assert_eq!(decode_tasks(&json).unwrap(), tasks);
    }

    #[test]
    fn dates_are_tagged() {
        let json = encode_tasks(&[full_task()]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["date"]["__type"], "Date");
        assert_eq!(value[0]["date"]["value"], "2024-05-01T09:15:42");
        assert_eq!(value[0]["started_at"]["value"], "2024-05-02T10:15:42.123456789");
        assert_eq!(value[0]["status"], "in_progress");
    }

    #[test]
    fn activities_round_trip_exactly() {
        let activity = FitnessActivity {
            id: "a-1".into(),
            title: "Evening run".into(),
            kind: ActivityKind::Running,
            duration: Some(40),
            intensity: Some(Level::High),
            calories: Some(420),
            notes: Some("intervals".into()),
            date: at(4, 18, 0),
            completed: true,
            created_at: at(4, 19, 1),
            updated_at: at(5, 7, 2),
        };
        let json = encode_activities(std::slice::from_ref(&activity)).unwrap();
        assert!(json.contains("\"type\":\"running\""));
        assert_eq!(decode_activities(&json).unwrap(), vec![activity]);
    }

    #[test]
    fn legacy_entries_fill_defaults() {
        let json = r#"[{"id":"x","title":"Old","date":"2024-05-01T08:00:00","completed":true,"priority":"low"}]"#;
        let tasks = decode_tasks(json).unwrap();
        assert_eq!(tasks[0].status, TaskStatus::Done);
        assert_eq!(tasks[0].urgency, Level::Low);
        assert!(tasks[0].labels.is_empty());
        assert_eq!(tasks[0].date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(8, 0, 0).unwrap());
    }

    #[test]
    fn missing_priority_falls_to_low() {
        let json = r#"[{"id":"x","title":"Old","date":"2024-05-01T08:00:00"}]"#;
        let tasks = decode_tasks(json).unwrap();
        assert_eq!(tasks[0].priority, Level::Low);
        assert!(!tasks[0].completed);
    }

    #[test]
    fn unreadable_entries_are_dropped_individually() {
        let json = r#"[
            {"id":"keep","title":"Tax return","date":{"__type":"Date","value":"2024-05-01T09:00:00"},"priority":"high"},
            {"id":"tag","title":"t","date":{"__type":"Map","value":"x"},"priority":"low"},
            {"id":"when","title":"t","date":{"__type":"Date","value":"yesterday"},"priority":"low"},
            {"id":"prio","title":"t","date":"2024-05-01","priority":"urgent"},
            {"title":"no id","date":"2024-05-01"}
        ]"#;
        let tasks = decode_tasks(json).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, "keep");
        assert_eq!(tasks[0].priority, Level::High);
    }

    #[test]
    fn rejects_blob_that_is_not_a_list() {
        assert!(decode_tasks("not json").is_err());
        assert!(decode_tasks(r#"{"id":"x"}"#).is_err());
        assert!(decode_activities("[{]").is_err());
    }

    #[test]
    fn parse_iso_accepts_common_shapes() {
        assert!(parse_iso("2024-05-01").is_some());
        assert!(parse_iso("2024-05-01T10:00:00.000Z").is_some());
        assert!(parse_iso("2024-05-01T10:00:00").is_some());
        assert!(parse_iso("May 1").is_none());
    }
}
