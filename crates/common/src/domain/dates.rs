//! Date ranges shared by loans, exhibitions and loan requests

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Display format used in user-facing messages
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// A booking period from `start` to `end`.
///
/// Ranges are half-open for overlap purposes: two ranges that only touch at
/// an endpoint (one ends the day the other starts) do not overlap, which
/// allows a same-day handoff between consecutive loans or exhibitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// `end` may equal `start` but not precede it
    pub fn is_well_formed(&self) -> bool {
        self.end >= self.start
    }

    /// `max(startA, startB) < min(endA, endB)`
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start.max(other.start) < self.end.min(other.end)
    }

    /// Whether `day` falls inside `[start, end)`
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day < self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}
