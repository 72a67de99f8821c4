//! Instant handling shared by the ephemeris, scanner, and derived charts.
//!
//! Two distinct operations are kept explicit: adding a whole number of
//! calendar days (preserves wall-clock time-of-day, used by the transit
//! scanner and progressions) and adding a fixed duration (used by search
//! refinement only).

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::error::ChartError;

/// Seconds between the Unix epoch and JD 0.
const UNIX_EPOCH_JD: f64 = 2440587.5;

/// Julian Day for a UTC instant.
pub fn julian_day(instant: DateTime<Utc>) -> f64 {
    let secs = instant.timestamp() as f64 + f64::from(instant.timestamp_subsec_millis()) / 1000.0;
    UNIX_EPOCH_JD + secs / 86400.0
}

/// Julian centuries since J2000.0.
pub fn julian_centuries(instant: DateTime<Utc>) -> f64 {
    (julian_day(instant) - 2451545.0) / 36525.0
}

/// Add whole calendar days to an instant, keeping the wall-clock
/// time-of-day. Distinct from `instant + Duration::days(n)` only in intent
/// for UTC, but the scanner contract is calendar arithmetic, so it is
/// expressed as such.
pub fn add_calendar_days(instant: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>, ChartError> {
    let date = instant.date_naive();
    let time = instant.time();
    let shifted = if days >= 0 {
        date.checked_add_days(Days::new(days as u64))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }
    .ok_or_else(|| {
        ChartError::InvalidInput(format!("date out of range: {date} {days:+} days"))
    })?;
    Ok(Utc.from_utc_datetime(&shifted.and_time(time)))
}

/// Resolve a local date/time plus a fixed UTC offset into a UTC instant.
///
/// The offset is minutes east of Greenwich; it must already account for DST
/// at the given moment (the caller resolves the zone, we only validate).
pub fn resolve_local(
    date: NaiveDate,
    time: NaiveTime,
    offset_minutes: i32,
) -> Result<DateTime<Utc>, ChartError> {
    let offset = FixedOffset::east_opt(offset_minutes * 60).ok_or_else(|| {
        ChartError::InvalidInput(format!("unresolvable UTC offset: {offset_minutes} minutes"))
    })?;
    let local = offset
        .from_local_datetime(&date.and_time(time))
        .single()
        .ok_or_else(|| ChartError::InvalidInput(format!("ambiguous local time: {date} {time}")))?;
    Ok(local.with_timezone(&Utc))
}

/// The same calendar day in another year, clamping Feb 29 to Feb 28 when
/// the target year is not a leap year.
pub fn anniversary(date: NaiveDate, year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), date.day() - 1))
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, 1, 1).unwrap())
}
