use chrono::{Duration, NaiveDateTime};

use super::task::{Level, Task, TaskStatus};

/// Starter tasks shown when neither the cache nor the remote store has data.
pub fn sample_tasks(now: NaiveDateTime) -> Vec<Task> {
    let today = now;
    let tomorrow = now + Duration::days(1);
    let yesterday = now - Duration::days(1);

    vec![
        sample(
            "Complete project proposal",
            "Finalize the project proposal document",
            today,
            Level::High,
            &["work", "urgent"],
            TaskStatus::Todo,
            Level::High,
        ),
        sample(
            "Schedule team meeting",
            "Set up weekly sync for project status updates",
            tomorrow,
            Level::Medium,
            &["work"],
            TaskStatus::InProgress,
            Level::Medium,
        ),
        sample(
            "Grocery shopping",
            "Buy fruits, vegetables, and milk",
            yesterday,
            Level::Low,
            &["personal"],
            TaskStatus::Done,
            Level::Low,
        ),
        sample(
            "Morning workout",
            "30-minute cardio session",
            today,
            Level::Medium,
            &["health"],
            TaskStatus::Done,
            Level::Medium,
        ),
        sample(
            "Call mom",
            "Check in and catch up",
            tomorrow,
            Level::Medium,
            &["personal"],
            TaskStatus::Todo,
            Level::Medium,
        ),
    ]
}

fn sample(
    title: &str,
    description: &str,
    date: NaiveDateTime,
    priority: Level,
    labels: &[&str],
    status: TaskStatus,
    urgency: Level,
) -> Task {
    Task {
        id: Task::generate_id(),
        title: title.to_string(),
        description: Some(description.to_string()),
        date,
        completed: status.is_done(),
        priority,
        labels: labels.iter().map(|l| l.to_string()).collect(),
        status,
        urgency,
        estimated_duration: None,
        actual_duration: None,
        started_at: None,
        completed_at: None,
    }
}
