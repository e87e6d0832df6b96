//! Virtual clock
//!
//! Every timestamp in the desk is read from a [`Clock`] rather than the wall
//! clock, so that time-sensitive behavior is reproducible. Timestamps are
//! whole milliseconds since the Unix epoch and are displayed with the fixed
//! pattern `M/d/yy H:mm` in the clock's zone.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use time::macros::format_description;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use crate::{Error, Result};

pub const MILLIS_PER_MINUTE: i64 = 60_000;

const NANOS_PER_MILLI: i128 = 1_000_000;
const MILLIS_PER_SECOND: i128 = 1_000;

/// Shared handle to a settable time source.
///
/// Clones observe and update the same instant.
#[derive(Debug, Clone)]
pub struct Clock {
    millis: Arc<AtomicI64>,
    offset: UtcOffset,
}

impl Clock {
    /// Clock at the epoch, displaying in UTC
    pub fn new() -> Self {
        Self::with_offset(UtcOffset::UTC)
    }

    /// Clock at the epoch, parsing and displaying in the given fixed zone
    pub fn with_offset(offset: UtcOffset) -> Self {
        Self {
            millis: Arc::new(AtomicI64::new(0)),
            offset,
        }
    }

    pub fn offset(&self) -> UtcOffset {
        self.offset
    }

    /// Current time in milliseconds since the epoch
    pub fn time(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }

    pub fn set_time(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    /// Set the clock from a `M/d/yy H:mm` timestamp
    pub fn set_time_str(&self, formatted: &str) -> Result<()> {
        let millis = self.parse(formatted)?;
        self.set_time(millis);
        Ok(())
    }

    /// Move the clock forward (or back, for negative values)
    pub fn advance(&self, millis: i64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn parse(&self, formatted: &str) -> Result<i64> {
        parse_millis(formatted, self.offset)
    }

    pub fn format(&self, millis: i64) -> String {
        format_millis(millis, self.offset)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `M/d/yy H:mm` in the given zone.
///
/// Month, day and hour take one or two digits; year and minute take exactly
/// two. Two-digit years fall in 2000..=2099.
pub fn parse_millis(formatted: &str, offset: UtcOffset) -> Result<i64> {
    let malformed = || {
        Error::InvalidArgument(format!(
            "Timestamp must match M/d/yy H:mm, was {formatted:?}"
        ))
    };

    let (date, clock_time) = formatted.split_once(' ').ok_or_else(malformed)?;
    let mut date_parts = date.split('/');
    let (Some(month), Some(day), Some(year), None) = (
        date_parts.next(),
        date_parts.next(),
        date_parts.next(),
        date_parts.next(),
    ) else {
        return Err(malformed());
    };
    let (hour, minute) = clock_time.split_once(':').ok_or_else(malformed)?;

    let month = numeric_field(month, 1, 2).ok_or_else(malformed)?;
    let day = numeric_field(day, 1, 2).ok_or_else(malformed)?;
    let year = numeric_field(year, 2, 2).ok_or_else(malformed)?;
    let hour = numeric_field(hour, 1, 2).ok_or_else(malformed)?;
    let minute = numeric_field(minute, 2, 2).ok_or_else(malformed)?;

    let out_of_range = |e: time::error::ComponentRange| {
        Error::InvalidArgument(format!("Timestamp {formatted:?} is out of range: {e}"))
    };
    let month = Month::try_from(month).map_err(out_of_range)?;
    let date = Date::from_calendar_date(2000 + i32::from(year), month, day).map_err(out_of_range)?;
    let clock_time = Time::from_hms(hour, minute, 0).map_err(out_of_range)?;

    // Read the fields as if they were UTC, then shift by the zone offset.
    let local = PrimitiveDateTime::new(date, clock_time).assume_utc();
    let local_millis = local.unix_timestamp_nanos() / NANOS_PER_MILLI;
    let utc_millis = local_millis - i128::from(offset.whole_seconds()) * MILLIS_PER_SECOND;
    i64::try_from(utc_millis).map_err(|_| malformed())
}

/// Format milliseconds as `M/d/yy H:mm` in the given zone.
///
/// Instants outside the calendar range fall back to the raw millisecond value.
pub fn format_millis(millis: i64, offset: UtcOffset) -> String {
    // Parsing stays hand-written: a `last_two` year can't be read back into a `Date`.
    let pattern = format_description!(
        "[month padding:none]/[day padding:none]/[year repr:last_two] [hour padding:none]:[minute]"
    );
    let local_nanos = (i128::from(millis)
        + i128::from(offset.whole_seconds()) * MILLIS_PER_SECOND)
        * NANOS_PER_MILLI;
    OffsetDateTime::from_unix_timestamp_nanos(local_nanos)
        .ok()
        .and_then(|local| local.format(pattern).ok())
        .unwrap_or_else(|| millis.to_string())
}

fn numeric_field(text: &str, min_digits: usize, max_digits: usize) -> Option<u8> {
    if text.len() < min_digits
        || text.len() > max_digits
        || !text.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    text.parse().ok()
}
