use chrono::{Local, NaiveDate};

use crate::cache::{self, CacheStore};
use crate::core::calendar;
use crate::core::fitness::{FitnessActivity, NewActivity};
use crate::error::TaskError;

/// Fitness activities. Local only: persisted under their own cache key and
/// never sent to the remote table.
pub struct ActivityLog<C> {
    cache: C,
    activities: Vec<FitnessActivity>,
}

impl<C: CacheStore> ActivityLog<C> {
    /// Load from the cache; a miss or an unreadable entry starts empty.
    pub fn load(cache: C) -> Self {
        let activities = cache::load_activities(&cache).unwrap_or_default();
        log::debug!("Loaded {} fitness activities", activities.len());
        Self { cache, activities }
    }

    pub fn activities(&self) -> &[FitnessActivity] {
        &self.activities
    }

    pub fn add(&mut self, draft: NewActivity) -> Result<FitnessActivity, TaskError> {
        if draft.title.trim().is_empty() {
            return Err(TaskError::TitleEmpty);
        }
        let activity = FitnessActivity::from_draft(draft, Local::now().naive_local());
        self.activities.push(activity.clone());
        self.persist();
        Ok(activity)
    }

    pub fn update(&mut self, mut activity: FitnessActivity) -> Result<(), TaskError> {
        if activity.title.trim().is_empty() {
            return Err(TaskError::TitleEmpty);
        }
        let slot = self
            .activities
            .iter_mut()
            .find(|a| a.id == activity.id)
            .ok_or_else(|| TaskError::NotFound(activity.id.clone()))?;
        activity.updated_at = Local::now().naive_local();
        *slot = activity;
        self.persist();
        Ok(())
    }

    pub fn toggle_completed(&mut self, id: &str) -> Result<(), TaskError> {
        let activity = self
            .activities
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        activity.completed = !activity.completed;
        activity.updated_at = Local::now().naive_local();
        self.persist();
        Ok(())
    }

    pub fn delete(&mut self, id: &str) -> Result<(), TaskError> {
        let before = self.activities.len();
        self.activities.retain(|a| a.id != id);
        if self.activities.len() == before {
            return Err(TaskError::NotFound(id.to_string()));
        }
        self.persist();
        Ok(())
    }

    pub fn activities_for_date(&self, date: NaiveDate) -> Vec<FitnessActivity> {
        self.activities
            .iter()
            .filter(|a| a.date.date() == date)
            .cloned()
            .collect()
    }

    /// Seven day buckets, Sunday first, for the week containing `date`.
    pub fn week(&self, date: NaiveDate) -> Vec<(NaiveDate, Vec<FitnessActivity>)> {
        calendar::week_days(date)
            .into_iter()
            .map(|day| (day, self.activities_for_date(day)))
            .collect()
    }

    fn persist(&self) {
        cache::save_activities(&self.cache, &self.activities);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ACTIVITIES_KEY, MemoryCache};
    use crate::core::fitness::ActivityKind;

    fn run_on(day: u32) -> NewActivity {
        let date = NaiveDate::from_ymd_opt(2024, 5, day).unwrap().and_hms_opt(18, 0, 0).unwrap();
        let mut draft = NewActivity::new("Run", ActivityKind::Running, date);
        draft.duration = Some(30);
        draft.calories = Some(0);
        draft
    }

    #[test]
    fn add_persists_under_own_key() {
        let cache = MemoryCache::new();
        let mut log = ActivityLog::load(cache.clone());
        let added = log.add(run_on(1)).unwrap();
        assert_eq!(added.calories, None);
        assert!(cache.get(ACTIVITIES_KEY).unwrap().is_some());
        assert!(cache.get(cache::TASKS_KEY).unwrap().is_none());

        let reloaded = ActivityLog::load(cache);
        assert_eq!(reloaded.activities(), &[added]);
    }

    #[test]
    fn corrupted_cache_starts_empty() {
        let cache = MemoryCache::new();
        cache.set(ACTIVITIES_KEY, "[{]").unwrap();
        assert!(ActivityLog::load(cache).activities().is_empty());
    }

    #[test]
    fn update_toggle_delete() {
        let mut log = ActivityLog::load(MemoryCache::new());
        let mut added = log.add(run_on(1)).unwrap();
        added.title = "Long run".into();
        log.update(added.clone()).unwrap();
        assert_eq!(log.activities()[0].title, "Long run");

        log.toggle_completed(&added.id).unwrap();
        assert!(log.activities()[0].completed);

        log.delete(&added.id).unwrap();
        assert!(log.activities().is_empty());
        assert!(matches!(log.delete(&added.id), Err(TaskError::NotFound(_))));
    }

    #[test]
    fn week_buckets_by_day() {
        let mut log = ActivityLog::load(MemoryCache::new());
        log.add(run_on(1)).unwrap();
        log.add(run_on(1)).unwrap();
        log.add(run_on(4)).unwrap();
        log.add(run_on(5)).unwrap();

        let week = log.week(NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert_eq!(week.len(), 7);
        let counts: Vec<usize> = week.iter().map(|(_, a)| a.len()).collect();
        // Sunday 2024-04-28 .. Saturday 2024-05-04
        assert_eq!(counts, vec![0, 0, 0, 2, 0, 0, 1]);
    }

    #[test]
    fn blank_title_is_rejected() {
        let mut log = ActivityLog::load(MemoryCache::new());
        let mut draft = run_on(1);
        draft.title = " ".into();
        assert_eq!(log.add(draft), Err(TaskError::TitleEmpty));
    }
}
