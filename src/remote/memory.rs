use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{RemoteStore, TaskRow};
use crate::error::RemoteError;

/// In-process remote table. Clones share rows, so a test can keep a handle
/// while the store owns another.
#[derive(Debug, Clone)]
pub struct MemoryRemote {
    rows: Arc<Mutex<Vec<TaskRow>>>,
    reachable: Arc<AtomicBool>,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self {
            rows: Arc::new(Mutex::new(Vec::new())),
            reachable: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<TaskRow>) -> Self {
        let remote = Self::default();
        *remote.lock() = rows;
        remote
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn rows(&self) -> Vec<TaskRow> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TaskRow>> {
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check(&self) -> Result<(), RemoteError> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RemoteError::Unreachable("connection refused".into()))
        }
    }
}

impl RemoteStore for MemoryRemote {
    async fn fetch_all(&self) -> Result<Vec<TaskRow>, RemoteError> {
        self.check()?;
        let mut rows = self.rows();
        // Rows without a timestamp sort last.
        rows.sort_by(|a, b| b.updated().cmp(&a.updated()));
        Ok(rows)
    }

    async fn insert(&self, row: &TaskRow) -> Result<(), RemoteError> {
        self.check()?;
        let mut rows = self.lock();
        if rows.iter().any(|r| r.id == row.id) {
            return Err(RemoteError::Status {
                status: 409,
                body: format!("duplicate key {}", row.id),
            });
        }
        rows.push(row.clone());
        Ok(())
    }

    async fn update(&self, row: &TaskRow) -> Result<(), RemoteError> {
        self.check()?;
        let mut rows = self.lock();
        for existing in rows.iter_mut().filter(|r| r.id == row.id) {
            *existing = row.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        self.check()?;
        self.lock().retain(|r| r.id != id);
        Ok(())
    }
}
