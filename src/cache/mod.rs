pub mod codec;

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::core::fitness::FitnessActivity;
use crate::core::task::Task;
use crate::error::CacheError;

pub const TASKS_KEY: &str = "todo_calendar_tasks";
pub const CACHE_TIMESTAMP_KEY: &str = "todo_calendar_cache_timestamp";
pub const ACTIVITIES_KEY: &str = "fitness_activities";

/// String-keyed blob store backing the local cache.
pub trait CacheStore {
    /// `Ok(None)` when nothing was ever stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;
    fn remove(&self, key: &str) -> Result<(), CacheError>;
}

/// One file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl CacheStore for FileCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CacheError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let io = |source| CacheError::Io {
            key: key.to_string(),
            source,
        };
        std::fs::create_dir_all(&self.dir).map_err(io)?;
        std::fs::write(self.path_for(key), value).map_err(io)
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CacheError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

/// In-process store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}

fn load_with<T>(
    cache: &impl CacheStore,
    key: &str,
    decode: impl FnOnce(&str) -> Result<Vec<T>, String>,
) -> Option<Vec<T>> {
    let raw = match cache.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            log::error!("Failed to read cache: {}", e);
            return None;
        }
    };
    match decode(&raw) {
        Ok(items) => Some(items),
        Err(reason) => {
            let e = CacheError::Decode {
                key: key.to_string(),
                reason,
            };
            log::warn!("Ignoring cached data: {}", e);
            None
        }
    }
}

fn save_with(cache: &impl CacheStore, key: &str, encoded: Result<String, String>) {
    let result = encoded
        .map_err(|reason| CacheError::Encode {
            key: key.to_string(),
            reason,
        })
        .and_then(|json| cache.set(key, &json));
    if let Err(e) = result {
        log::error!("Failed to save cache: {}", e);
    }
}

/// Cached task list, or `None` on a miss or an unreadable entry.
pub fn load_tasks(cache: &impl CacheStore) -> Option<Vec<Task>> {
    load_with(cache, TASKS_KEY, codec::decode_tasks)
}

pub fn save_tasks(cache: &impl CacheStore, tasks: &[Task]) {
    save_with(cache, TASKS_KEY, codec::encode_tasks(tasks));
}

pub fn load_activities(cache: &impl CacheStore) -> Option<Vec<FitnessActivity>> {
    load_with(cache, ACTIVITIES_KEY, codec::decode_activities)
}

pub fn save_activities(cache: &impl CacheStore, activities: &[FitnessActivity]) {
    save_with(cache, ACTIVITIES_KEY, codec::encode_activities(activities));
}

/// Record the wall-clock time of the last successful remote sync.
pub fn touch_timestamp(cache: &impl CacheStore, now: DateTime<Utc>) {
    if let Err(e) = cache.set(CACHE_TIMESTAMP_KEY, &now.to_rfc3339()) {
        log::warn!("Failed to record sync timestamp: {}", e);
    }
}

pub fn last_synced(cache: &impl CacheStore) -> Option<DateTime<Utc>> {
    let raw = cache.get(CACHE_TIMESTAMP_KEY).ok().flatten()?;
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::task::NewTask;
    use chrono::{NaiveDate, TimeZone};
    use tempfile::TempDir;

    fn sample() -> Vec<Task> {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(7, 0, 0).unwrap();
        vec![Task::from_draft(NewTask::new("Buy milk", date), "t-1".into())]
    }

    #[test]
    fn missing_key_is_a_miss() {
        let cache = MemoryCache::new();
        assert!(load_tasks(&cache).is_none());
        assert!(load_activities(&cache).is_none());
        assert!(last_synced(&cache).is_none());
    }

    #[test]
    fn corrupted_entry_is_a_miss() {
        let cache = MemoryCache::new();
        cache.set(TASKS_KEY, "{\"broken\":").unwrap();
        assert!(load_tasks(&cache).is_none());
    }

    #[test]
    fn memory_round_trip() {
        let cache = MemoryCache::new();
        save_tasks(&cache, &sample());
        assert_eq!(load_tasks(&cache), Some(sample()));

        let shared = cache.clone();
        shared.remove(TASKS_KEY).unwrap();
        assert!(load_tasks(&cache).is_none());
    }

    #[test]
    fn file_round_trip_and_remove() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("cache");
        let cache = FileCache::new(&dir);
        assert!(load_tasks(&cache).is_none());

        save_tasks(&cache, &sample());
        assert!(dir.join("todo_calendar_tasks.json").exists());
        assert_eq!(load_tasks(&cache), Some(sample()));

        cache.remove(TASKS_KEY).unwrap();
        cache.remove(TASKS_KEY).unwrap();
        assert!(load_tasks(&cache).is_none());
    }

    #[test]
    fn timestamp_round_trip() {
        let cache = MemoryCache::new();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        touch_timestamp(&cache, now);
        assert_eq!(last_synced(&cache), Some(now));
    }
}
