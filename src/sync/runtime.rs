use tokio::task::JoinSet;

use super::{PendingSync, SyncEvent, TaskStore};
use crate::cache::CacheStore;
use crate::remote::RemoteStore;

/// Runs pending remote operations concurrently while their outcomes are
/// applied to the store one at a time by its owner.
pub struct SyncRuntime {
    in_flight: JoinSet<SyncEvent>,
}

impl Default for SyncRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncRuntime {
    pub fn new() -> Self {
        Self {
            in_flight: JoinSet::new(),
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn spawn<R: RemoteStore + 'static>(&mut self, pending: PendingSync<R>) {
        self.in_flight.spawn(pending.run());
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Next finished operation, in completion order. `None` once idle.
    pub async fn next_event(&mut self) -> Option<SyncEvent> {
        while let Some(joined) = self.in_flight.join_next().await {
            match joined {
                Ok(event) => return Some(event),
                Err(e) if e.is_cancelled() => log::debug!("Remote operation cancelled"),
                Err(e) => log::error!("Remote operation panicked: {}", e),
            }
        }
        None
    }

    /// Apply every outstanding outcome to `store`.
    pub async fn drain_into<C: CacheStore, R: RemoteStore>(&mut self, store: &mut TaskStore<C, R>) {
        while let Some(event) = self.next_event().await {
            store.apply(event);
        }
    }

    /// Session teardown: abandon in-flight requests without applying them.
    pub async fn shutdown(&mut self) {
        let abandoned = self.in_flight.len();
        self.in_flight.abort_all();
        while self.in_flight.join_next().await.is_some() {}
        if abandoned > 0 {
            log::info!("Abandoned {} in-flight remote operations", abandoned);
        }
    }
}
