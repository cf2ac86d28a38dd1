//! Conflict resolution between maintenance windows and ordinary loans

use chrono::{Duration, NaiveDate};

use super::DateRange;
use crate::models::material::MaterialStatus;

/// An active booking on a material, as seen by the status derivation
#[derive(Debug, Clone, Copy)]
pub struct BookedPeriod {
    pub range: DateRange,
    pub maintenance: bool,
}

/// What happens to an ordinary loan hit by a new maintenance window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    /// The loan keeps its start and now ends on `new_end`
    Shorten { new_end: NaiveDate },
    /// The loan starts inside the blocked window and is removed
    Cancel,
}

/// Decide how to free `maintenance_start` onwards from `loan`.
///
/// The cutoff is the day before maintenance starts; a loan that begins on
/// or before it is shortened, any other is cancelled.
pub fn plan_adjustment(loan: &DateRange, maintenance_start: NaiveDate) -> Adjustment {
    let cutoff = maintenance_start - Duration::days(1);
    if loan.start() <= cutoff {
        Adjustment::Shorten { new_end: cutoff }
    } else {
        Adjustment::Cancel
    }
}

/// Status shown in the catalog for today
pub fn derive_status(periods: &[BookedPeriod], today: NaiveDate) -> MaterialStatus {
    let mut status = MaterialStatus::Disponible;
    for period in periods.iter().filter(|p| p.range.contains(today)) {
        if period.maintenance {
            return MaterialStatus::Maintenance;
        }
        status = MaterialStatus::Reserve;
    }
    status
}
