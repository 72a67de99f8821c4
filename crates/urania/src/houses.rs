//! House cusp computation.
//!
//! The house system is a strategy selected by identifier. Placidus is the
//! default; Koch shares its semi-arc machinery; whole-sign, equal, and
//! Porphyry are pure divisions of the ecliptic. Time-based systems
//! degenerate at polar latitudes, so they refuse latitudes beyond 66.5 deg
//! and report non-convergence instead of emitting a broken partition.
//!
//! Angle formulas are the standard spherical-astronomy ones (Meeus ch. 13):
//! ascendant and midheaven from local sidereal time, cusp projections from
//! equatorial right ascension back to ecliptic longitude.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

use crate::angles::{arc_forward, normalize_deg};
use crate::ephemeris::fallback::obliquity_deg;
use crate::ephemeris::GeoLocation;
use crate::error::ChartError;
use crate::timing::julian_day;

/// Latitude limit for the time-based systems (Placidus, Koch).
const MAX_TIME_BASED_LATITUDE_DEG: f64 = 66.5;

/// Iteration cap for the Placidus semi-arc refinement.
const PLACIDUS_MAX_ITER: usize = 50;

/// House division strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HouseSystem {
    #[default]
    Placidus,
    WholeSign,
    Equal,
    Porphyry,
    Koch,
}

impl HouseSystem {
    pub const VALID_IDENTIFIERS: [&'static str; 5] =
        ["placidus", "whole_sign", "equal", "porphyry", "koch"];

    pub fn from_identifier(id: &str) -> Result<HouseSystem, ChartError> {
        match id {
            "placidus" => Ok(HouseSystem::Placidus),
            "whole_sign" => Ok(HouseSystem::WholeSign),
            "equal" => Ok(HouseSystem::Equal),
            "porphyry" => Ok(HouseSystem::Porphyry),
            "koch" => Ok(HouseSystem::Koch),
            other => Err(ChartError::UnsupportedHouseSystem {
                requested: other.to_string(),
                valid: HouseSystem::VALID_IDENTIFIERS.to_vec(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HouseSystem::Placidus => "placidus",
            HouseSystem::WholeSign => "whole_sign",
            HouseSystem::Equal => "equal",
            HouseSystem::Porphyry => "porphyry",
            HouseSystem::Koch => "koch",
        }
    }
}

/// Chart angles derived from instant + location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Angles {
    pub ascendant: f64,
    pub midheaven: f64,
}

/// Greenwich mean sidereal time in degrees.
fn gmst_deg(instant: DateTime<Utc>) -> f64 {
    let d = julian_day(instant) - 2451545.0;
    let t = d / 36525.0;
    normalize_deg(280.460_618_37 + 360.985_647_366_29 * d + 0.000_387_933 * t * t)
}

/// Ascendant and midheaven longitudes for an instant and location.
pub fn compute_angles(instant: DateTime<Utc>, location: &GeoLocation) -> Angles {
    let lst = (gmst_deg(instant) + location.longitude).to_radians().rem_euclid(TAU);
    let eps = obliquity_deg().to_radians();
    let phi = location.latitude.to_radians();

    // Meeus ch. 13: Asc = atan2(-cos LST, sin LST cos eps + tan phi sin eps)
    let asc = f64::atan2(-lst.cos(), lst.sin() * eps.cos() + phi.tan() * eps.sin());
    let mc = f64::atan2(lst.sin(), lst.cos() * eps.cos());

    Angles {
        ascendant: normalize_deg(asc.to_degrees()),
        midheaven: normalize_deg(mc.to_degrees()),
    }
}

/// Compute the 12 cusp longitudes for a house system.
///
/// For quadrant systems cusp 1 is the ascendant and cusp 10 the midheaven
/// by definition; intermediate cusps are computed. The result is validated
/// as a monotone partition of the circle before it leaves this module.
pub fn cusps(
    ascendant: f64,
    midheaven: f64,
    latitude_deg: f64,
    system: HouseSystem,
) -> Result<[f64; 12], ChartError> {
    let asc = normalize_deg(ascendant);
    let mc = normalize_deg(midheaven);

    let raw = match system {
        HouseSystem::WholeSign => whole_sign_cusps(asc),
        HouseSystem::Equal => equal_cusps(asc),
        HouseSystem::Porphyry => porphyry_cusps(asc, mc),
        HouseSystem::Placidus => {
            check_latitude(latitude_deg, system)?;
            placidus_cusps(asc, mc, latitude_deg)?
        }
        HouseSystem::Koch => {
            check_latitude(latitude_deg, system)?;
            koch_cusps(asc, mc, latitude_deg)?
        }
    };

    validate_partition(&raw, system)?;
    Ok(raw)
}

fn check_latitude(latitude_deg: f64, system: HouseSystem) -> Result<(), ChartError> {
    if latitude_deg.abs() > MAX_TIME_BASED_LATITUDE_DEG {
        return Err(ChartError::computation(
            "houses",
            format!(
                "{} division is degenerate at latitude {latitude_deg:.2} \
                 (limit {MAX_TIME_BASED_LATITUDE_DEG})",
                system.as_str()
            ),
        ));
    }
    Ok(())
}

/// Every cusp partition must walk the circle exactly once: strictly
/// positive arcs summing to 360. Violations fail loudly, never silently.
fn validate_partition(cusps: &[f64; 12], system: HouseSystem) -> Result<(), ChartError> {
    let mut total = 0.0;
    for i in 0..12 {
        let arc = arc_forward(cusps[i], cusps[(i + 1) % 12]);
        if arc <= 0.0 || arc >= 360.0 {
            return Err(ChartError::computation(
                "houses",
                format!(
                    "{} produced a degenerate arc of {arc:.4} deg at cusp {}",
                    system.as_str(),
                    i + 1
                ),
            ));
        }
        total += arc;
    }
    if (total - 360.0).abs() > 1e-6 {
        return Err(ChartError::computation(
            "houses",
            format!("{} cusps do not close the circle: {total:.6}", system.as_str()),
        ));
    }
    Ok(())
}

/// Whole-sign: the 12 cusps are the sign boundaries starting at the
/// ascendant's sign.
fn whole_sign_cusps(asc: f64) -> [f64; 12] {
    let start = (asc / 30.0).floor() * 30.0;
    let mut cusps = [0.0; 12];
    for (i, cusp) in cusps.iter_mut().enumerate() {
        *cusp = normalize_deg(start + (i as f64) * 30.0);
    }
    cusps
}

/// Equal: 30-degree houses measured from the ascendant itself.
fn equal_cusps(asc: f64) -> [f64; 12] {
    let mut cusps = [0.0; 12];
    for (i, cusp) in cusps.iter_mut().enumerate() {
        *cusp = normalize_deg(asc + (i as f64) * 30.0);
    }
    cusps
}

/// Porphyry: trisect the four quadrant arcs between the angles.
fn porphyry_cusps(asc: f64, mc: f64) -> [f64; 12] {
    let desc = normalize_deg(asc + 180.0);
    let ic = normalize_deg(mc + 180.0);

    let mut cusps = [0.0; 12];
    cusps[0] = asc;
    cusps[3] = ic;
    cusps[6] = desc;
    cusps[9] = mc;

    let q1 = arc_forward(asc, ic);
    cusps[1] = normalize_deg(asc + q1 / 3.0);
    cusps[2] = normalize_deg(asc + 2.0 * q1 / 3.0);

    let q2 = arc_forward(ic, desc);
    cusps[4] = normalize_deg(ic + q2 / 3.0);
    cusps[5] = normalize_deg(ic + 2.0 * q2 / 3.0);

    let q3 = arc_forward(desc, mc);
    cusps[7] = normalize_deg(desc + q3 / 3.0);
    cusps[8] = normalize_deg(desc + 2.0 * q3 / 3.0);

    let q4 = arc_forward(mc, asc);
    cusps[10] = normalize_deg(mc + q4 / 3.0);
    cusps[11] = normalize_deg(mc + 2.0 * q4 / 3.0);

    cusps
}

/// Placidus: trisect the diurnal and nocturnal semi-arcs in time.
/// The intermediate cusps need an iterative refinement that can fail to
/// converge near the polar circles.
fn placidus_cusps(asc: f64, mc: f64, latitude_deg: f64) -> Result<[f64; 12], ChartError> {
    let eps = obliquity_deg().to_radians();
    let lat = latitude_deg.to_radians();
    let ramc = ramc_from_mc(mc, eps);

    let desc = normalize_deg(asc + 180.0);
    let ic = normalize_deg(mc + 180.0);

    let mut cusps = [0.0; 12];
    cusps[0] = asc;
    cusps[3] = ic;
    cusps[6] = desc;
    cusps[9] = mc;

    // Houses 11, 12: fractions of the diurnal semi-arc past the MC.
    cusps[10] = placidus_cusp(ramc, lat, eps, 1.0 / 3.0, true)?;
    cusps[11] = placidus_cusp(ramc, lat, eps, 2.0 / 3.0, true)?;

    // Houses 2, 3: fractions of the nocturnal semi-arc short of the IC.
    cusps[1] = placidus_cusp(ramc, lat, eps, 2.0 / 3.0, false)?;
    cusps[2] = placidus_cusp(ramc, lat, eps, 1.0 / 3.0, false)?;

    // Opposite cusps.
    cusps[4] = normalize_deg(cusps[10] + 180.0);
    cusps[5] = normalize_deg(cusps[11] + 180.0);
    cusps[7] = normalize_deg(cusps[1] + 180.0);
    cusps[8] = normalize_deg(cusps[2] + 180.0);

    Ok(cusps)
}

/// One intermediate Placidus cusp via fixed-point iteration on the
/// semi-arc fraction. Non-convergence is an error, not a best guess.
///
/// Diurnal cusps sit at `RAMC + fraction * SA_d` past the MC; nocturnal
/// cusps at `RAMC + 180 - fraction * SA_n` short of the IC. At the equator
/// both reduce to equal 30-degree divisions of right ascension.
fn placidus_cusp(
    ramc: f64,
    lat: f64,
    eps: f64,
    fraction: f64,
    above_horizon: bool,
) -> Result<f64, ChartError> {
    let mut ra = if above_horizon {
        ramc + fraction * PI / 2.0
    } else {
        ramc + PI - fraction * PI / 2.0
    };

    let mut converged = false;
    for _ in 0..PLACIDUS_MAX_ITER {
        let dec = (eps.sin() * ra.sin()).asin();
        let semi_arc = semi_arc_rad(dec, lat, above_horizon)?;
        let new_ra = if above_horizon {
            ramc + fraction * semi_arc
        } else {
            ramc + PI - fraction * semi_arc
        };

        if (new_ra - ra).abs() < 1e-10 {
            ra = new_ra;
            converged = true;
            break;
        }
        ra = new_ra;
    }

    if !converged {
        return Err(ChartError::computation(
            "houses",
            format!(
                "placidus cusp iteration did not converge at latitude {:.2}",
                lat.to_degrees()
            ),
        ));
    }

    Ok(normalize_deg(
        equator_to_ecliptic_lon_rad(ra, eps).to_degrees(),
    ))
}

/// Koch: divide the MC degree's semi-arc, closed form.
fn koch_cusps(asc: f64, mc: f64, latitude_deg: f64) -> Result<[f64; 12], ChartError> {
    let eps = obliquity_deg().to_radians();
    let lat = latitude_deg.to_radians();
    let ramc = ramc_from_mc(mc, eps);

    let desc = normalize_deg(asc + 180.0);
    let ic = normalize_deg(mc + 180.0);

    let dec_mc = (eps.sin() * ramc.sin()).asin();
    let sa = semi_arc_rad(dec_mc, lat, true)?;

    let mut cusps = [0.0; 12];
    cusps[0] = asc;
    cusps[3] = ic;
    cusps[6] = desc;
    cusps[9] = mc;

    let sa_nocturnal = PI - sa;
    cusps[10] = normalize_deg(equator_to_ecliptic_lon_rad(ramc + sa / 3.0, eps).to_degrees());
    cusps[11] = normalize_deg(equator_to_ecliptic_lon_rad(ramc + 2.0 * sa / 3.0, eps).to_degrees());
    cusps[1] = normalize_deg(
        equator_to_ecliptic_lon_rad(ramc + PI - 2.0 * sa_nocturnal / 3.0, eps).to_degrees(),
    );
    cusps[2] = normalize_deg(
        equator_to_ecliptic_lon_rad(ramc + PI - sa_nocturnal / 3.0, eps).to_degrees(),
    );

    cusps[4] = normalize_deg(cusps[10] + 180.0);
    cusps[5] = normalize_deg(cusps[11] + 180.0);
    cusps[7] = normalize_deg(cusps[1] + 180.0);
    cusps[8] = normalize_deg(cusps[2] + 180.0);

    Ok(cusps)
}

/// Right ascension of the MC from its ecliptic longitude (the MC lies on
/// the ecliptic, so declination drops out).
fn ramc_from_mc(mc_deg: f64, eps: f64) -> f64 {
    let mc = mc_deg.to_radians();
    f64::atan2(mc.sin() * eps.cos(), mc.cos()).rem_euclid(TAU)
}

/// Diurnal or nocturnal semi-arc. Circumpolar declinations have no
/// horizon crossing and are reported as degenerate.
fn semi_arc_rad(dec: f64, lat: f64, diurnal: bool) -> Result<f64, ChartError> {
    let cos_ha = -(dec.tan() * lat.tan());
    if !(-1.0..=1.0).contains(&cos_ha) {
        return Err(ChartError::computation(
            "houses",
            format!(
                "semi-arc is degenerate (circumpolar) at latitude {:.2}",
                lat.to_degrees()
            ),
        ));
    }
    let ha = cos_ha.acos();
    Ok(if diurnal { ha } else { PI - ha })
}

/// Project an equatorial right ascension back to ecliptic longitude for
/// points whose declination derives from the RA itself.
fn equator_to_ecliptic_lon_rad(ra: f64, eps: f64) -> f64 {
    let dec = (eps.sin() * ra.sin()).asin();
    let sin_lon = ra.sin() * eps.cos() + dec.tan() * eps.sin();
    let cos_lon = ra.cos();
    f64::atan2(sin_lon, cos_lon).rem_euclid(TAU)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn identifier_round_trip() {
        for id in HouseSystem::VALID_IDENTIFIERS {
            let system = HouseSystem::from_identifier(id).unwrap();
            assert_eq!(system.as_str(), id);
        }
    }

    #[test]
    fn unknown_identifier_is_rejected() {
        let err = HouseSystem::from_identifier("meridian").unwrap_err();
        assert!(matches!(err, ChartError::UnsupportedHouseSystem { .. }));
    }

    #[test]
    fn equal_cusps_step_thirty_degrees() {
        let cusps = cusps(95.5, 5.5, 40.0, HouseSystem::Equal).unwrap();
        for i in 0..12 {
            let expected = normalize_deg(95.5 + (i as f64) * 30.0);
            assert!((cusps[i] - expected).abs() < 1e-10, "cusp {i}");
        }
    }

    #[test]
    fn whole_sign_starts_at_sign_boundary() {
        let cusps = cusps(95.5, 5.5, 40.0, HouseSystem::WholeSign).unwrap();
        assert!((cusps[0] - 90.0).abs() < 1e-10, "cusp 1 {}", cusps[0]);
        assert!((cusps[11] - 60.0).abs() < 1e-10, "cusp 12 {}", cusps[11]);
    }

    #[test]
    fn porphyry_keeps_the_angles() {
        let cusps = cusps(90.0, 0.0, 40.0, HouseSystem::Porphyry).unwrap();
        assert!((cusps[0] - 90.0).abs() < 1e-10);
        assert!(cusps[9].abs() < 1e-10 || (cusps[9] - 360.0).abs() < 1e-10);
        assert!((cusps[3] - 180.0).abs() < 1e-10);
        assert!((cusps[6] - 270.0).abs() < 1e-10);
    }

    #[test]
    fn placidus_mid_latitude_partitions_the_circle() {
        let angles = compute_angles(
            Utc.with_ymd_and_hms(1990, 6, 15, 12, 30, 0).unwrap(),
            &GeoLocation {
                latitude: 48.8566,
                longitude: 2.3522,
            },
        );
        let cusps = cusps(angles.ascendant, angles.midheaven, 48.8566, HouseSystem::Placidus)
            .unwrap();
        assert!((cusps[0] - angles.ascendant).abs() < 1e-9);
        assert!((cusps[9] - angles.midheaven).abs() < 1e-9);
        let total: f64 = (0..12)
            .map(|i| arc_forward(cusps[i], cusps[(i + 1) % 12]))
            .sum();
        assert!((total - 360.0).abs() < 1e-6, "total {total}");
    }

    #[test]
    fn placidus_polar_latitude_fails_loudly() {
        let err = cusps(100.0, 10.0, 80.0, HouseSystem::Placidus).unwrap_err();
        assert!(matches!(err, ChartError::ComputationError { component: "houses", .. }));
    }

    #[test]
    fn koch_polar_latitude_fails_loudly() {
        assert!(cusps(100.0, 10.0, 75.0, HouseSystem::Koch).is_err());
    }

    #[test]
    fn opposite_cusps_face_each_other() {
        let angles = compute_angles(
            Utc.with_ymd_and_hms(1985, 11, 2, 4, 45, 0).unwrap(),
            &GeoLocation {
                latitude: 34.05,
                longitude: -118.24,
            },
        );
        let cusps = cusps(angles.ascendant, angles.midheaven, 34.05, HouseSystem::Placidus)
            .unwrap();
        for i in 0..6 {
            let gap = crate::angles::separation(cusps[i], cusps[i + 6]);
            assert!((gap - 180.0).abs() < 1e-9, "cusp {} gap {gap}", i + 1);
        }
    }

    #[test]
    fn angles_are_in_range() {
        let angles = compute_angles(
            Utc.with_ymd_and_hms(2024, 3, 20, 3, 6, 0).unwrap(),
            &GeoLocation {
                latitude: -33.87,
                longitude: 151.21,
            },
        );
        assert!((0.0..360.0).contains(&angles.ascendant));
        assert!((0.0..360.0).contains(&angles.midheaven));
    }
}
