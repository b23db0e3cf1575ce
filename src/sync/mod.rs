//! Task synchronization between the in-memory list, the local cache and the
//! remote task table.
//!
//! [`TaskStore`] is the only owner of the task list. Every mutation is applied
//! and cached synchronously, then handed back to the caller as a
//! [`PendingSync`] describing the remote write. The caller runs it (directly,
//! or on a [`runtime::SyncRuntime`]) and feeds the resulting [`SyncEvent`]
//! back through [`TaskStore::apply`], one event at a time.
//!
//! A failed remote write is not rolled back and not retried: the local change
//! stays visible with [`SyncStatus::Error`] until the next full fetch, which
//! replaces the list with whatever the remote holds.

pub mod activities;
pub mod merge;
pub mod runtime;

use std::sync::Arc;

use chrono::{Local, NaiveDate, NaiveDateTime, Utc};

use crate::cache::{self, CacheStore};
use crate::core::query::{self, Filter, Quadrant};
use crate::core::sample::sample_tasks;
use crate::core::task::{NewTask, Task, TaskStatus};
use crate::error::{RemoteError, TaskError};
use crate::remote::{RemoteStore, TaskRow};

/// Agreement between the local list and the remote table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Synced,
    Syncing,
    Error,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Synced => "synced",
            Self::Syncing => "syncing",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// Transient, non-blocking message for the UI to show once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

/// A remote operation the store wants performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOp {
    FetchAll,
    Insert(TaskRow),
    Update(TaskRow),
    Delete(String),
}

impl RemoteOp {
    pub fn task_id(&self) -> Option<&str> {
        match self {
            Self::FetchAll => None,
            Self::Insert(row) | Self::Update(row) => Some(&row.id),
            Self::Delete(id) => Some(id),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Self::FetchAll => "fetch",
            Self::Insert(_) => "insert",
            Self::Update(_) => "update",
            Self::Delete(_) => "delete",
        }
    }
}

/// Outcome of a [`PendingSync`], to be passed to [`TaskStore::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Fetched(Result<Vec<TaskRow>, RemoteError>),
    Written {
        op: RemoteOp,
        result: Result<(), RemoteError>,
    },
}

/// A remote operation detached from the store, holding its own handle to
/// the remote so it can run on any task.
#[derive(Debug)]
pub struct PendingSync<R> {
    remote: Arc<R>,
    op: RemoteOp,
}

impl<R: RemoteStore> PendingSync<R> {
    pub fn op(&self) -> &RemoteOp {
        &self.op
    }

    pub fn task_id(&self) -> Option<&str> {
        self.op.task_id()
    }

    pub async fn run(self) -> SyncEvent {
        let remote = self.remote;
        match self.op {
            RemoteOp::FetchAll => SyncEvent::Fetched(remote.fetch_all().await),
            op => {
                let result = match &op {
                    RemoteOp::Insert(row) => remote.insert(row).await,
                    RemoteOp::Update(row) => remote.update(row).await,
                    RemoteOp::Delete(id) => remote.delete(id).await,
                    RemoteOp::FetchAll => Ok(()),
                };
                SyncEvent::Written { op, result }
            }
        }
    }
}

/// Owner of the task list, its cache mirror and the remote sync state.
pub struct TaskStore<C, R> {
    cache: C,
    remote: Arc<R>,
    tasks: Vec<Task>,
    filter: Filter,
    status: SyncStatus,
    loading: bool,
    has_data: bool,
    fetch_in_flight: bool,
    notices: Vec<Notice>,
}

impl<C: CacheStore, R: RemoteStore> TaskStore<C, R> {
    pub fn new(cache: C, remote: R) -> Self {
        Self::with_shared_remote(cache, Arc::new(remote))
    }

    pub fn with_shared_remote(cache: C, remote: Arc<R>) -> Self {
        Self {
            cache,
            remote,
            tasks: Vec::new(),
            filter: Filter::default(),
            status: SyncStatus::Syncing,
            loading: true,
            has_data: false,
            fetch_in_flight: false,
            notices: Vec::new(),
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    pub fn filtered_tasks(&self) -> Vec<Task> {
        query::apply_filter(&self.tasks, &self.filter)
    }

    /// Tasks on the same calendar day as `date` that pass the current filter.
    pub fn tasks_for_date(&self, date: NaiveDate) -> Vec<Task> {
        query::tasks_for_date(&self.tasks, date, &self.filter)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.status
    }

    pub fn last_synced(&self) -> Option<chrono::DateTime<Utc>> {
        cache::last_synced(&self.cache)
    }

    /// Drain queued notices, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Start the session: publish the cached list right away and return the
    /// full remote fetch to run.
    pub fn begin_load(&mut self) -> PendingSync<R> {
        self.status = SyncStatus::Syncing;
        self.loading = true;
        self.fetch_in_flight = true;

        if let Some(cached) = cache::load_tasks(&self.cache) {
            log::info!("Loaded {} tasks from cache", cached.len());
            self.tasks = cached;
            self.has_data = true;
        }

        self.pending(RemoteOp::FetchAll)
    }

    /// Run a pending operation to completion and apply its outcome.
    pub async fn complete(&mut self, pending: PendingSync<R>) {
        let event = pending.run().await;
        self.apply(event);
    }

    pub fn apply(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::Fetched(Ok(rows)) => self.apply_fetch(&rows),
            SyncEvent::Fetched(Err(e)) => self.apply_fetch_failure(&e),
            SyncEvent::Written { op, result: Ok(()) } => {
                log::debug!("Remote {} confirmed for {:?}", op.describe(), op.task_id());
                cache::touch_timestamp(&self.cache, Utc::now());
                if !self.fetch_in_flight {
                    self.status = SyncStatus::Synced;
                }
            }
            SyncEvent::Written { op, result: Err(e) } => {
                log::warn!("Remote {} failed for {:?}: {}", op.describe(), op.task_id(), e);
                self.status = SyncStatus::Error;
                self.notices.push(Notice::warning(
                    "Could not reach the server; the change was saved locally only",
                ));
            }
        }
    }

    fn apply_fetch(&mut self, rows: &[TaskRow]) {
        let (tasks, skipped) = merge::reconcile(rows, &self.tasks);
        if skipped > 0 {
            log::warn!("Skipped {} remote rows that could not be decoded", skipped);
        }
        log::info!("Fetched {} tasks from remote", tasks.len());

        self.tasks = tasks;
        cache::save_tasks(&self.cache, &self.tasks);
        cache::touch_timestamp(&self.cache, Utc::now());
        self.has_data = true;
        self.fetch_in_flight = false;
        self.loading = false;
        self.status = SyncStatus::Synced;
    }

    fn apply_fetch_failure(&mut self, e: &RemoteError) {
        log::warn!("Remote fetch failed: {}", e);
        self.fetch_in_flight = false;
        self.loading = false;
        self.status = SyncStatus::Error;

        if self.has_data {
            self.notices
                .push(Notice::warning("Could not reach the server; showing cached tasks"));
        } else {
            self.tasks = sample_tasks(now());
            cache::save_tasks(&self.cache, &self.tasks);
            self.has_data = true;
            self.notices
                .push(Notice::warning("Could not reach the server; using sample tasks"));
        }
    }

    pub fn add_task(&mut self, draft: NewTask) -> Result<PendingSync<R>, TaskError> {
        let task = Task::from_draft(draft, Task::generate_id());
        task.validate()?;

        let row = TaskRow::from_task(&task, now());
        log::info!("Adding task {}: {}", task.id, task.title);
        self.tasks.push(task);
        self.publish("Task added");
        Ok(self.pending(RemoteOp::Insert(row)))
    }

    /// Replace the stored task with the same id. The caller's fields are
    /// stored as given; `completed` and `status` are not reconciled here.
    pub fn update_task(&mut self, task: Task) -> Result<PendingSync<R>, TaskError> {
        task.validate()?;
        let slot = self
            .tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or_else(|| TaskError::NotFound(task.id.clone()))?;

        let row = TaskRow::from_task(&task, now());
        *slot = task;
        self.publish("Task updated");
        Ok(self.pending(RemoteOp::Update(row)))
    }

    pub fn delete_task(&mut self, id: &str) -> Result<PendingSync<R>, TaskError> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;

        let removed = self.tasks.remove(index);
        log::info!("Deleted task {}: {}", removed.id, removed.title);
        self.publish("Task deleted");
        Ok(self.pending(RemoteOp::Delete(removed.id)))
    }

    pub fn toggle_task_completion(&mut self, id: &str) -> Result<PendingSync<R>, TaskError> {
        let stamp = now();
        self.modify(id, |task| task.toggle_completion(stamp))
    }

    /// Kanban move.
    pub fn set_task_status(
        &mut self,
        id: &str,
        status: TaskStatus,
    ) -> Result<PendingSync<R>, TaskError> {
        let stamp = now();
        self.modify(id, |task| task.set_status(status, stamp))
    }

    /// Matrix drop: take the priority and urgency of `quadrant`.
    pub fn move_to_quadrant(
        &mut self,
        id: &str,
        quadrant: Quadrant,
    ) -> Result<PendingSync<R>, TaskError> {
        let (priority, urgency) = quadrant.levels();
        self.modify(id, |task| {
            task.priority = priority;
            task.urgency = urgency;
        })
    }

    /// Timeline drop: move to another day, keeping the time of day.
    pub fn reschedule(&mut self, id: &str, date: NaiveDate) -> Result<PendingSync<R>, TaskError> {
        self.modify(id, |task| task.date = date.and_time(task.date.time()))
    }

    fn modify(
        &mut self,
        id: &str,
        change: impl FnOnce(&mut Task),
    ) -> Result<PendingSync<R>, TaskError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        change(task);
        let row = TaskRow::from_task(task, now());
        self.publish_quietly();
        Ok(self.pending(RemoteOp::Update(row)))
    }

    fn publish(&mut self, message: &str) {
        self.publish_quietly();
        self.notices.push(Notice::info(message));
    }

    fn publish_quietly(&mut self) {
        self.has_data = true;
        cache::save_tasks(&self.cache, &self.tasks);
    }

    fn pending(&self, op: RemoteOp) -> PendingSync<R> {
        PendingSync {
            remote: Arc::clone(&self.remote),
            op,
        }
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}
