//! Secondary progressions: one day of ephemeris motion after birth stands
//! for one year of life.

use chrono::{DateTime, Duration, Utc};

use crate::chart::{self, ChartAssembler, ChartMoment, ChartSnapshot};
use crate::ephemeris::EphemerisSource;
use crate::error::ChartError;
use crate::timing::add_calendar_days;

/// Instant whose ephemeris stands for the given age: birth plus one
/// calendar day per whole year, plus a fractional-day remainder.
pub fn progressed_instant(
    birth: DateTime<Utc>,
    age_years: f64,
) -> Result<DateTime<Utc>, ChartError> {
    if !age_years.is_finite() || age_years < 0.0 {
        return Err(ChartError::InvalidInput(format!(
            "age must be a non-negative number of years, got {age_years}"
        )));
    }
    let whole_days = age_years.floor() as i64;
    let fraction_secs = ((age_years - age_years.floor()) * 86_400.0).round() as i64;
    let shifted = add_calendar_days(birth, whole_days)?;
    Ok(shifted + Duration::seconds(fraction_secs))
}

/// Full progressed chart: assembler pass at the day-for-a-year instant,
/// natal location and house system.
pub fn progressed_chart(
    source: &mut dyn EphemerisSource,
    assembler: &ChartAssembler,
    natal: &ChartSnapshot,
    age_years: f64,
) -> Result<ChartSnapshot, ChartError> {
    let instant = progressed_instant(natal.moment.instant, age_years)?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn thirty_years_is_thirty_days() {
        let birth = Utc.with_ymd_and_hms(1990, 6, 15, 12, 30, 0).unwrap();
        let progressed = progressed_instant(birth, 30.0).unwrap();
        assert_eq!(
            progressed,
            Utc.with_ymd_and_hms(1990, 7, 15, 12, 30, 0).unwrap()
        );
    }

    #[test]
    fn fractional_age_adds_part_of_a_day() {
        let birth = Utc.with_ymd_and_hms(1990, 6, 15, 0, 0, 0).unwrap();
        let progressed = progressed_instant(birth, 10.5).unwrap();
        assert_eq!(
            progressed,
            Utc.with_ymd_and_hms(1990, 6, 25, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn negative_age_is_rejected() {
        let birth = Utc.with_ymd_and_hms(1990, 6, 15, 0, 0, 0).unwrap();
        assert!(progressed_instant(birth, -1.0).is_err());
    }
}
