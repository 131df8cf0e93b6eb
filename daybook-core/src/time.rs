//! Clock utilities: stamping confirmed batches in the user's timezone.

use chrono::{DateTime, Local, NaiveDateTime, Timelike, Utc};
use chrono_tz::Tz;

use crate::error::{DaybookError, Result};
use crate::record::Stamp;

/// Resolve an optional IANA timezone name.
pub fn parse_timezone(tz: &str) -> Result<Tz> {
    tz.parse()
        .map_err(|_| DaybookError::Validation(format!("invalid timezone: {tz}")))
}

/// Stamp for a UTC instant, seen from `tz` (or the system's local zone).
pub fn stamp_at(now: DateTime<Utc>, tz: Option<Tz>) -> Stamp {
    let local: NaiveDateTime = match tz {
        Some(tz) => now.with_timezone(&tz).naive_local(),
        None => now.with_timezone(&Local).naive_local(),
    };
    let time = local.time().with_nanosecond(0).unwrap_or(local.time());
    Stamp::new(local.date(), time)
}

/// Stamp for the current instant.
pub fn stamp_now(tz: Option<Tz>) -> Stamp {
    stamp_at(Utc::now(), tz)
}
