//! Inclusive date ranges

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` calendar date
pub fn parse_date(value: &str, field: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| AppError::Validation(format!("Date invalide pour {}: {}", field, value)))
}

/// A closed interval of days, `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Build a range, swapping the bounds when they are reversed
    pub fn new(a: NaiveDate, b: NaiveDate) -> Self {
        if b < a {
            Self { start: b, end: a }
        } else {
            Self { start: a, end: b }
        }
    }

    pub fn parse(start: &str, end: &str) -> AppResult<Self> {
        Ok(Self::new(parse_date(start, "start")?, parse_date(end, "end")?))
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days covered, both bounds included
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        other.start <= self.end && other.end >= self.start
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// True when the range begins before `today`
    pub fn starts_before(&self, today: NaiveDate) -> bool {
        self.start < today
    }
}

/// `start <= today <= end` after normalizing a reversed range
pub fn period_is_current(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> bool {
    DateRange::new(start, end).contains(today)
}
