//! ISO week buckets used for calendar highlighting

use chrono::{Datelike, Duration, NaiveDate};

use super::DateRange;

/// ISO-week keys (`2025-W02`) covered by `[start, end]`, in order.
///
/// Reversed bounds give the same keys as the normalized range.
pub fn weeks_between(start: NaiveDate, end: NaiveDate) -> Vec<String> {
    let range = DateRange::new(start, end);
    let mut monday =
        range.start() - Duration::days(i64::from(range.start().weekday().num_days_from_monday()));

    let mut keys = Vec::new();
    while monday <= range.end() {
        let week = monday.iso_week();
        keys.push(format!("{}-W{:02}", week.year(), week.week()));
        monday += Duration::days(7);
    }
    keys
}
