//! Solar return: the instant the transiting Sun reaches the natal Sun
//! longitude again.
//!
//! There is no closed-form inverse from longitude to date, so the search
//! is a coarse daily scan around the birthday anniversary followed by
//! bisection. The Sun's longitude is monotonic over the scan window, and
//! anniversaries near the year boundary are handled by scanning instants
//! rather than clamping to the calendar year.

use chrono::{DateTime, Duration, Utc};
use log::debug;

use crate::angles::signed_delta;
use crate::chart::{self, ChartAssembler, ChartMoment, ChartSnapshot};
use crate::ephemeris::{EphemerisSource, GeoLocation, Planet};
use crate::error::ChartError;
use crate::timing::{add_calendar_days, anniversary};

/// Half-width of the coarse scan window around the anniversary, days.
const SCAN_HALF_WIDTH_DAYS: i64 = 6;

/// Bisection stops when the bracket is this narrow.
const BISECTION_TOLERANCE_SECS: i64 = 30;

/// Longitude agreement required of the converged result, degrees.
const CONVERGENCE_TOLERANCE_DEG: f64 = 0.01;

/// Find the instant in `target_year` (or within days of its boundary, for
/// year-end birthdays) when the Sun returns to `natal_sun_lon`.
pub fn solar_return_instant(
    source: &mut dyn EphemerisSource,
    location: &GeoLocation,
    natal_moment: &ChartMoment,
    natal_sun_lon: f64,
    target_year: i32,
) -> Result<DateTime<Utc>, ChartError> {
    let approx_date = anniversary(natal_moment.instant.date_naive(), target_year);
    let approx = chrono::TimeZone::from_utc_datetime(
        &Utc,
        &approx_date.and_time(natal_moment.instant.time()),
    );

    let sun_dev = |source: &mut dyn EphemerisSource, instant: DateTime<Utc>| {
        let batch = source.positions(instant, location)?;
        let lon = batch.longitude(Planet::Sun).ok_or_else(|| {
            ChartError::computation("solar_return", "ephemeris batch has no Sun")
        })?;
        Ok::<f64, ChartError>(signed_delta(lon, natal_sun_lon))
    };

    // Coarse daily scan for a sign change bracketing the return.
    let start = add_calendar_days(approx, -SCAN_HALF_WIDTH_DAYS)?;
    let mut prev_instant = start;
    let mut prev_dev = sun_dev(source, start)?;
    let mut bracket = None;
    for day in 1..=(2 * SCAN_HALF_WIDTH_DAYS) {
        let instant = add_calendar_days(start, day)?;
        let dev = sun_dev(source, instant)?;
        // The guard rejects the antipodal wrap, which also flips sign.
        if prev_dev * dev <= 0.0 && prev_dev.abs() < 90.0 && dev.abs() < 90.0 {
            bracket = Some((prev_instant, prev_dev, instant));
            break;
        }
        prev_instant = instant;
        prev_dev = dev;
    }

    let (mut lo, mut dev_lo, mut hi) = bracket.ok_or_else(|| {
        ChartError::computation(
            "solar_return",
            format!("no Sun return near {approx_date} for year {target_year}"),
        )
    })?;
    debug!("solar return bracketed between {lo} and {hi}");

    for _ in 0..64 {
        if (hi - lo).num_seconds() <= BISECTION_TOLERANCE_SECS {
            break;
        }
        let mid = lo + Duration::seconds((hi - lo).num_seconds() / 2);
        let dev_mid = sun_dev(source, mid)?;
        if dev_lo * dev_mid <= 0.0 {
            hi = mid;
        } else {
            lo = mid;
            dev_lo = dev_mid;
        }
    }

    let found = lo + Duration::seconds((hi - lo).num_seconds() / 2);
    let final_dev = sun_dev(source, found)?;
    if final_dev.abs() > CONVERGENCE_TOLERANCE_DEG {
        return Err(ChartError::computation(
            "solar_return",
            format!(
                "bisection did not converge: residual {final_dev:.4} deg at {found}"
            ),
        ));
    }
    Ok(found)
}

/// Full chart for the solar return of `target_year`, cast at the natal
/// location and house system.
pub fn solar_return_chart(
    source: &mut dyn EphemerisSource,
    assembler: &ChartAssembler,
    natal: &ChartSnapshot,
    target_year: i32,
) -> Result<ChartSnapshot, ChartError> {
    let natal_sun = natal
        .planet(Planet::Sun)
        .ok_or_else(|| ChartError::computation("solar_return", "natal chart has no Sun"))?
        .longitude;

    let instant = solar_return_instant(
        source,
        &natal.moment.location,
        &natal.moment,
        natal_sun,
        target_year,
    )?;

    chart::compute(
        source,
        assembler,
        ChartMoment {
            instant,
            utc_offset_minutes: natal.moment.utc_offset_minutes,
            location: natal.moment.location,
            house_system: natal.moment.house_system,
        },
    )
}
