//! Date-range arithmetic behind reservations and maintenance windows.
//!
//! Everything here is pure: callers load loan rows from the database and
//! ask these helpers whether periods collide, which week buckets they
//! cover and what a material's status is today.

mod conflicts;
mod period;
mod weeks;

pub use conflicts::{derive_status, plan_adjustment, Adjustment, BookedPeriod};
pub use period::{parse_date, period_is_current, DateRange};
pub use weeks::weeks_between;
