use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TaskError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [Self::Todo, Self::InProgress, Self::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(Self::Todo),
            "in_progress" | "in-progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Three-step level shared by task priority, task urgency and activity intensity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Low,
    Medium,
    High,
}

pub type Priority = Level;
pub type Urgency = Level;

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    /// Ordering weight used by priority sorts (high first).
    pub fn rank(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub date: NaiveDateTime,
    pub completed: bool,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<NaiveDateTime>,
}

/// Everything a form submits for a new task; the id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDateTime,
    pub completed: bool,
    pub priority: Priority,
    pub labels: Vec<String>,
    pub status: TaskStatus,
    pub urgency: Urgency,
    pub estimated_duration: Option<u32>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, date: NaiveDateTime) -> Self {
        Self {
            title: title.into(),
            description: None,
            date,
            completed: false,
            priority: Priority::Medium,
            labels: Vec::new(),
            status: TaskStatus::Todo,
            urgency: Urgency::Low,
            estimated_duration: None,
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self.completed = status.is_done();
        self
    }

    pub fn estimated_duration(mut self, minutes: u32) -> Self {
        self.estimated_duration = Some(minutes);
        self
    }
}

impl Task {
    pub fn from_draft(draft: NewTask, id: String) -> Self {
        Self {
            id,
            title: draft.title.trim().to_string(),
            description: draft.description.filter(|d| !d.trim().is_empty()),
            date: draft.date,
            completed: draft.completed,
            priority: draft.priority,
            labels: draft.labels,
            status: draft.status,
            urgency: draft.urgency,
            estimated_duration: draft.estimated_duration,
            actual_duration: None,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Reject payloads the store must never persist.
    pub fn validate(&self) -> Result<(), TaskError> {
        if self.title.trim().is_empty() {
            return Err(TaskError::TitleEmpty);
        }
        if self.estimated_duration == Some(0) || self.actual_duration == Some(0) {
            return Err(TaskError::InvalidDuration);
        }
        Ok(())
    }

    /// Flip completion and keep `status` and `completed_at` aligned with it.
    ///
    /// Reopening a task returns it to `in_progress` when it had been started
    /// (`started_at` is set) and to `todo` otherwise, so a toggle pair
    /// restores the column a Kanban move put it in.
    pub fn toggle_completion(&mut self, now: NaiveDateTime) {
        if self.completed {
            self.completed = false;
            self.status = if self.started_at.is_some() {
                TaskStatus::InProgress
            } else {
                TaskStatus::Todo
            };
            self.completed_at = None;
        } else {
            self.completed = true;
            self.status = TaskStatus::Done;
            self.completed_at = Some(now);
        }
    }

    /// Move to a Kanban column.
    pub fn set_status(&mut self, status: TaskStatus, now: NaiveDateTime) {
        self.status = status;
        self.completed = status.is_done();
        if status == TaskStatus::InProgress && self.started_at.is_none() {
            self.started_at = Some(now);
        }
        self.completed_at = if status.is_done() { Some(now) } else { None };
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}
