use chrono::{Datelike, Duration, NaiveDate};

/// Number of days shown by the Gantt timeline.
pub const GANTT_DAYS: i64 = 28;

/// First day (Sunday) of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

/// Sunday..=Saturday of the week containing `date`.
pub fn week_range(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = week_start(date);
    (start, start + Duration::days(6))
}

pub fn week_days(date: NaiveDate) -> Vec<NaiveDate> {
    let start = week_start(date);
    (0..7).map(|i| start + Duration::days(i)).collect()
}

/// Every day from `start` to `end` inclusive; empty when `end < start`.
pub fn days_in_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|d| *d <= end).collect()
}

pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// Horizontal position of `date` on a timeline starting at `start`, in percent.
pub fn timeline_position(date: NaiveDate, start: NaiveDate, total_days: i64) -> f64 {
    if total_days <= 0 {
        return 0.0;
    }
    days_between(start, date) as f64 / total_days as f64 * 100.0
}

/// Four-week window used by the Gantt view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GanttWindow {
    pub start: NaiveDate,
}

impl GanttWindow {
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            start: week_start(date),
        }
    }

    pub fn end(&self) -> NaiveDate {
        self.start + Duration::days(GANTT_DAYS - 1)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end()
    }

    pub fn previous(&self) -> Self {
        Self {
            start: self.start - Duration::days(GANTT_DAYS),
        }
    }

    pub fn next(&self) -> Self {
        Self {
            start: self.start + Duration::days(GANTT_DAYS),
        }
    }

    pub fn position(&self, date: NaiveDate) -> f64 {
        timeline_position(date, self.start, GANTT_DAYS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn week_starts_on_sunday() {
        // 2024-05-01 is a Wednesday
        assert_eq!(week_start(d(2024, 5, 1)), d(2024, 4, 28));
        assert_eq!(week_start(d(2024, 4, 28)), d(2024, 4, 28));
        assert_eq!(week_range(d(2024, 5, 4)), (d(2024, 4, 28), d(2024, 5, 4)));
    }

    #[test]
    fn week_days_are_seven_consecutive() {
        let days = week_days(d(2024, 12, 31));
        assert_eq!(days.len(), 7);
        assert_eq!(days[0], d(2024, 12, 29));
        assert_eq!(days[6], d(2025, 1, 4));
    }

    #[test]
    fn range_is_inclusive() {
        assert_eq!(days_in_range(d(2024, 2, 27), d(2024, 3, 1)).len(), 4);
        assert!(days_in_range(d(2024, 3, 2), d(2024, 3, 1)).is_empty());
    }

    #[test]
    fn gantt_window_navigation() {
        let w = GanttWindow::containing(d(2024, 5, 1));
        assert_eq!(w.start, d(2024, 4, 28));
        assert_eq!(w.end(), d(2024, 5, 25));
        assert!(w.contains(d(2024, 5, 25)));
        assert!(!w.contains(d(2024, 5, 26)));
        assert_eq!(w.next().start, d(2024, 5, 26));
        assert_eq!(w.previous().next(), w);
        assert_eq!(w.position(d(2024, 5, 12)), 50.0);
    }
}
