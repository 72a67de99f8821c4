//! Day-stepping transit scan.
//!
//! Re-runs the ephemeris across a date range and records, per tracked
//! aspect, the signed deviation from exactness at every step. One step
//! failing only punches a hole in the series; the scan finishes. Exact
//! hits are reported as the bounding step pair, with optional bisection
//! refinement inside that pair.

use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use std::collections::BTreeMap;

use crate::angles::signed_delta;
use crate::ephemeris::{EphemerisSource, GeoLocation, Planet, RawPosition};
use crate::error::ChartError;
use crate::timing::add_calendar_days;
use crate::transit::types::{
    ExactCrossing, ScanConfig, TrackSeries, TrackedAspect, TransitSeries,
};

/// Signed deviation of a transiting longitude from an exact aspect to a
/// natal longitude. Zero at exactness, negative while short of the nearer
/// exact-angle instance, positive past it, so a perfecting aspect shows up
/// as a sign change.
pub fn signed_deviation(transit_lon: f64, natal_lon: f64, exact_angle: f64) -> f64 {
    let delta = signed_delta(transit_lon, natal_lon);
    let towards = signed_delta(delta, exact_angle);
    let away = signed_delta(delta, -exact_angle);
    if towards.abs() <= away.abs() {
        towards
    } else {
        away
    }
}

pub struct TransitScanner<'a> {
    source: &'a mut dyn EphemerisSource,
    config: ScanConfig,
}

impl<'a> TransitScanner<'a> {
    pub fn new(source: &'a mut dyn EphemerisSource, config: ScanConfig) -> Self {
        TransitScanner { source, config }
    }

    /// Scan `steps` instants starting at `start`, each `step_days` calendar
    /// days apart at the same wall-clock time.
    pub fn scan(
        &mut self,
        natal: &BTreeMap<Planet, RawPosition>,
        location: &GeoLocation,
        start: DateTime<Utc>,
        steps: usize,
        tracks: &[TrackedAspect],
    ) -> Result<TransitSeries, ChartError> {
        if self.config.step_days < 1 {
            return Err(ChartError::InvalidInput(format!(
                "step size must be at least one day, got {}",
                self.config.step_days
            )));
        }
        for track in tracks {
            if natal.get(&track.natal).is_none() {
                return Err(ChartError::InvalidInput(format!(
                    "natal chart has no position for {}",
                    track.natal
                )));
            }
        }

        let mut instants = Vec::with_capacity(steps);
        for i in 0..steps {
            instants.push(add_calendar_days(start, (i as i64) * self.config.step_days)?);
        }

        // Raw deviations per track, unclamped, used for crossing detection.
        let mut raw: Vec<Vec<Option<f64>>> = vec![Vec::with_capacity(steps); tracks.len()];

        for &instant in &instants {
            match self.source.positions(instant, location) {
                Ok(batch) => {
                    for (t, track) in tracks.iter().enumerate() {
                        let deviation = batch.longitude(track.transiting).map(|lon| {
                            // Natal presence was validated up front.
                            let natal_lon = natal[&track.natal].longitude;
                            signed_deviation(lon, natal_lon, track.kind.exact_angle())
                        });
                        raw[t].push(deviation);
                    }
                }
                Err(e) => {
                    debug!("transit step {instant} skipped: {e}");
                    for series in raw.iter_mut() {
                        series.push(None);
                    }
                }
            }
        }

        let mut result_tracks = Vec::with_capacity(tracks.len());
        for (t, track) in tracks.iter().enumerate() {
            // Crossings are detected on the ceiling-bounded samples: a
            // sign flip far from exact is the deviation jumping to the
            // aspect's other instance, not a perfection.
            let samples: Vec<Option<f64>> = raw[t]
                .iter()
                .map(|d| d.filter(|v| v.abs() <= self.config.ceiling))
                .collect();
            let crossings = self.find_crossings(&samples, &instants, track, natal, location);
            result_tracks.push(TrackSeries {
                track: *track,
                samples,
                crossings,
            });
        }

        Ok(TransitSeries {
            instants,
            step_days: self.config.step_days,
            ceiling: self.config.ceiling,
            tracks: result_tracks,
        })
    }

    /// Sign changes between consecutive present samples. The bounding step
    /// pair is always reported; a sub-day instant only when refinement is
    /// on.
    fn find_crossings(
        &mut self,
        deviations: &[Option<f64>],
        instants: &[DateTime<Utc>],
        track: &TrackedAspect,
        natal: &BTreeMap<Planet, RawPosition>,
        location: &GeoLocation,
    ) -> Vec<ExactCrossing> {
        let mut crossings = Vec::new();
        for i in 1..deviations.len() {
            let (prev, cur) = match (deviations[i - 1], deviations[i]) {
                (Some(p), Some(c)) => (p, c),
                _ => continue,
            };
            if prev * cur < 0.0 {
                let refined = if self.config.refine_exact {
                    self.refine(instants[i - 1], instants[i], track, natal, location)
                } else {
                    None
                };
                crossings.push(ExactCrossing {
                    step_before: i - 1,
                    step_after: i,
                    refined,
                });
            }
        }
        crossings
    }

    /// Bisect the bounding interval until it is narrower than the
    /// configured tolerance. A source failure abandons refinement for this
    /// hit; the bounding pair already stands on its own.
    fn refine(
        &mut self,
        mut lo: DateTime<Utc>,
        mut hi: DateTime<Utc>,
        track: &TrackedAspect,
        natal: &BTreeMap<Planet, RawPosition>,
        location: &GeoLocation,
    ) -> Option<DateTime<Utc>> {
        let natal_lon = natal.get(&track.natal)?.longitude;
        let mut dev_lo = self.deviation_at(lo, track, natal_lon, location)?;

        let tolerance_secs = (self.config.refine_tolerance_days * 86_400.0).max(1.0) as i64;
        for _ in 0..64 {
            if (hi - lo).num_seconds() <= tolerance_secs {
                break;
            }
            let mid = lo + Duration::seconds((hi - lo).num_seconds() / 2);
            let dev_mid = self.deviation_at(mid, track, natal_lon, location)?;
            if dev_lo * dev_mid <= 0.0 {
                hi = mid;
            } else {
                lo = mid;
                dev_lo = dev_mid;
            }
        }
        Some(lo + Duration::seconds((hi - lo).num_seconds() / 2))
    }

    fn deviation_at(
        &mut self,
        instant: DateTime<Utc>,
        track: &TrackedAspect,
        natal_lon: f64,
        location: &GeoLocation,
    ) -> Option<f64> {
        match self.source.positions(instant, location) {
            Ok(batch) => batch
                .longitude(track.transiting)
                .map(|lon| signed_deviation(lon, natal_lon, track.kind.exact_angle())),
            Err(e) => {
                warn!("refinement query failed at {instant}: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angles::separation;

    #[test]
    fn deviation_zero_at_exact_trine() {
        assert!(signed_deviation(130.0, 10.0, 120.0).abs() < 1e-12);
    }

    #[test]
    fn deviation_sign_flips_through_exactness() {
        let before = signed_deviation(118.5, 0.0, 120.0);
        let after = signed_deviation(121.5, 0.0, 120.0);
        assert!(before < 0.0 && after > 0.0, "{before} {after}");
    }

    #[test]
    fn deviation_magnitude_matches_separation() {
        for (t, n, angle) in [
            (95.0, 100.0, 0.0),
            (340.0, 20.0, 60.0),
            (271.0, 100.0, 180.0),
            (50.0, 290.0, 120.0),
        ] {
            let dev = signed_deviation(t, n, angle);
            let expected = (separation(t, n) - angle).abs();
            assert!(
                (dev.abs() - expected).abs() < 1e-9,
                "t={t} n={n} angle={angle}: {dev} vs {expected}"
            );
        }
    }

    #[test]
    fn deviation_through_opposition() {
        let before = signed_deviation(178.0, 0.0, 180.0);
        let after = signed_deviation(182.0, 0.0, 180.0);
        assert!(before < 0.0 && after > 0.0, "{before} {after}");
    }
}
