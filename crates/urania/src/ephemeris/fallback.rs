//! Low-precision analytical ephemeris.
//!
//! Stands in when the external engine is unavailable. Solar and lunar
//! longitudes come from truncated trigonometric series; the planets use
//! mean Keplerian elements with linear rates and a Newton solve of
//! Kepler's equation; the lunar node uses its mean longitude. Accuracy is
//! on the order of arcminutes for the Sun and a fraction of a degree for
//! the rest, which is why every batch produced here is tagged
//! [`PositionSource::Analytic`] by the adapter.
//!
//! Longitude speeds are obtained by symmetric finite difference over a
//! one-day window, so retrograde flags remain meaningful on this path.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

use crate::angles::{normalize_deg, signed_delta};
use crate::ephemeris::types::{Planet, RawPosition};
use crate::timing::julian_centuries;

/// Mean obliquity of the ecliptic at J2000, degrees.
const OBLIQUITY_DEG: f64 = 23.439291;

/// Mean Keplerian elements at J2000 with per-century rates:
/// `(a, a_dot, e, e_dot, i, i_dot, L, L_dot, peri, peri_dot, node, node_dot)`.
/// a in AU, angles in degrees. Earth is represented by the Earth-Moon
/// barycenter, which is adequate at this precision.
type Elements = (f64, f64, f64, f64, f64, f64, f64, f64, f64, f64, f64, f64);

const EARTH: Elements = (
    1.000_002_61, 0.000_005_62,
    0.016_711_23, -0.000_043_92,
    -0.000_015_31, -0.012_946_68,
    100.464_571_66, 35_999.372_449_81,
    102.937_681_93, 0.323_273_64,
    0.0, 0.0,
);

const PLANET_ELEMENTS: &[(Planet, Elements)] = &[
    (Planet::Mercury, (
        0.387_099_27, 0.000_000_37,
        0.205_635_93, 0.000_019_06,
        7.004_979_02, -0.005_947_49,
        252.250_323_50, 149_472.674_111_75,
        77.457_796_28, 0.160_476_89,
        48.330_765_93, -0.125_340_81,
    )),
    (Planet::Venus, (
        0.723_335_66, 0.000_003_90,
        0.006_776_72, -0.000_041_07,
        3.394_676_05, -0.000_788_90,
        181.979_099_50, 58_517.815_387_29,
        131.602_467_18, 0.002_683_29,
        76.679_842_55, -0.277_694_18,
    )),
    (Planet::Mars, (
        1.523_710_34, 0.000_018_47,
        0.093_394_10, 0.000_078_82,
        1.849_691_42, -0.008_131_31,
        -4.553_432_05, 19_140.302_684_99,
        -23.943_629_59, 0.444_410_88,
        49.559_538_91, -0.292_573_43,
    )),
    (Planet::Jupiter, (
        5.202_887_00, -0.000_116_07,
        0.048_386_24, -0.000_132_53,
        1.304_396_95, -0.001_837_14,
        34.396_440_51, 3_034.746_127_75,
        14.728_479_83, 0.212_526_68,
        100.473_909_09, 0.204_691_06,
    )),
    (Planet::Saturn, (
        9.536_675_94, -0.001_250_60,
        0.053_861_79, -0.000_509_91,
        2.485_991_87, 0.001_936_09,
        49.954_244_23, 1_222.493_622_01,
        92.598_878_31, -0.418_972_16,
        113.662_424_48, -0.288_677_94,
    )),
    (Planet::Uranus, (
        19.189_164_64, -0.001_961_76,
        0.047_257_44, -0.000_043_97,
        0.772_637_83, -0.002_429_39,
        313.238_104_51, 428.482_027_85,
        170.954_276_30, 0.408_052_81,
        74.016_925_03, 0.042_405_89,
    )),
    (Planet::Neptune, (
        30.069_922_76, 0.000_262_91,
        0.008_590_48, 0.000_051_05,
        1.770_043_47, 0.000_353_72,
        -55.120_029_69, 218.459_453_25,
        44.964_762_27, -0.322_414_64,
        131.784_225_74, -0.005_086_64,
    )),
    (Planet::Pluto, (
        39.482_116_75, -0.000_315_96,
        0.248_827_30, 0.000_051_70,
        17.140_012_06, 0.000_048_18,
        238.929_038_33, 145.207_805_15,
        224.068_916_29, -0.040_629_42,
        110.303_936_84, -0.011_834_82,
    )),
    // Approximate osculating elements near J2000; Chiron has no mean-element
    // theory at this level of simplicity.
    (Planet::Chiron, (
        13.648_1, 0.0,
        0.381_06, 0.0,
        6.935_2, 0.0,
        203.2, 714.0,
        188.9, 0.0,
        209.36, 0.0,
    )),
];

/// Compute positions for the requested bodies at one instant.
///
/// Pure math, no I/O; geocentric ecliptic-of-date-ish coordinates good to
/// the documented low precision.
pub fn positions(instant: DateTime<Utc>, bodies: &[Planet]) -> BTreeMap<Planet, RawPosition> {
    let before = instant - Duration::hours(12);
    let after = instant + Duration::hours(12);

    let mut out = BTreeMap::new();
    for &planet in bodies {
        if planet == Planet::SouthNode {
            continue;
        }
        let (lon, lat, dist) = body_position(planet, instant);
        let (lon_before, _, _) = body_position(planet, before);
        let (lon_after, _, _) = body_position(planet, after);
        let speed = signed_delta(lon_after, lon_before);
        out.insert(
            planet,
            RawPosition {
                longitude: lon,
                latitude: lat,
                distance: dist,
                speed: Some(speed),
            },
        );
    }
    out
}

/// Geocentric ecliptic `(longitude, latitude, distance_au)` for one body.
fn body_position(planet: Planet, instant: DateTime<Utc>) -> (f64, f64, f64) {
    let t = julian_centuries(instant);
    match planet {
        Planet::Sun => sun_position(t),
        Planet::Moon => moon_position(t),
        Planet::NorthNode => {
            let node = 125.044_547_9 - 1_934.136_289_1 * t + 0.002_075_4 * t * t;
            (normalize_deg(node), 0.0, 0.002_57)
        }
        Planet::SouthNode => {
            let (lon, lat, dist) = body_position(Planet::NorthNode, instant);
            (normalize_deg(lon + 180.0), -lat, dist)
        }
        _ => planet_position(planet, t),
    }
}

/// Solar geocentric longitude from the low-precision series
/// (mean longitude + equation of center).
fn sun_position(t: f64) -> (f64, f64, f64) {
    let l0 = 280.466_46 + 36_000.769_83 * t + 0.000_303_2 * t * t;
    let m = (357.529_11 + 35_999.050_29 * t - 0.000_153_7 * t * t).to_radians();
    let e = 0.016_708_634 - 0.000_042_037 * t;

    let c = (1.914_602 - 0.004_817 * t - 0.000_014 * t * t) * m.sin()
        + (0.019_993 - 0.000_101 * t) * (2.0 * m).sin()
        + 0.000_289 * (3.0 * m).sin();

    let true_lon = normalize_deg(l0 + c);
    let nu = m + c.to_radians();
    let dist = 1.000_001_018 * (1.0 - e * e) / (1.0 + e * nu.cos());
    (true_lon, 0.0, dist)
}

/// Lunar position from the principal terms of the lunar theory.
fn moon_position(t: f64) -> (f64, f64, f64) {
    // Fundamental arguments, degrees.
    let lp = 218.316_447_7 + 481_267.881_234_21 * t;
    let d = (297.850_192_1 + 445_267.111_403_4 * t).to_radians();
    let m = (357.529_109_2 + 35_999.050_290_9 * t).to_radians();
    let mp = (134.963_396_4 + 477_198.867_505_5 * t).to_radians();
    let f = (93.272_095_0 + 483_202.017_523_3 * t).to_radians();

    let lon = lp
        + 6.288_774 * mp.sin()
        + 1.274_027 * (2.0 * d - mp).sin()
        + 0.658_314 * (2.0 * d).sin()
        + 0.213_618 * (2.0 * mp).sin()
        - 0.185_116 * m.sin()
        - 0.114_332 * (2.0 * f).sin()
        + 0.058_793 * (2.0 * d - 2.0 * mp).sin()
        + 0.057_066 * (2.0 * d - m - mp).sin();

    let lat = 5.128_122 * f.sin()
        + 0.280_602 * (mp + f).sin()
        + 0.277_693 * (mp - f).sin();

    let dist_km = 385_000.56 - 20_905.355 * mp.cos();
    (normalize_deg(lon), lat, dist_km / 149_597_870.7)
}

/// Geocentric position of a planet from heliocentric Keplerian elements.
fn planet_position(planet: Planet, t: f64) -> (f64, f64, f64) {
    let elements = PLANET_ELEMENTS
        .iter()
        .find(|(p, _)| *p == planet)
        .map(|(_, e)| e)
        // Every non-special body has an entry; Planet is a closed enum.
        .unwrap_or(&EARTH);

    let planet_helio = heliocentric(elements, t);
    let earth_helio = heliocentric(&EARTH, t);

    let x = planet_helio[0] - earth_helio[0];
    let y = planet_helio[1] - earth_helio[1];
    let z = planet_helio[2] - earth_helio[2];

    let lon = normalize_deg(y.atan2(x).to_degrees());
    let dist = (x * x + y * y + z * z).sqrt();
    let lat = (z / dist).asin().to_degrees();
    (lon, lat, dist)
}

/// Heliocentric ecliptic rectangular coordinates `[x, y, z]` in AU.
fn heliocentric(el: &Elements, t: f64) -> [f64; 3] {
    let (a0, a_dot, e0, e_dot, i0, i_dot, l0, l_dot, w0, w_dot, o0, o_dot) = *el;
    let a = a0 + a_dot * t;
    let e = e0 + e_dot * t;
    let i = (i0 + i_dot * t).to_radians();
    let l = l0 + l_dot * t;
    let peri = w0 + w_dot * t;
    let node = o0 + o_dot * t;

    let m = normalize_deg(l - peri);
    let e_anom = solve_kepler(m.to_radians(), e);

    // Position in the orbital plane.
    let xp = a * (e_anom.cos() - e);
    let yp = a * (1.0 - e * e).sqrt() * e_anom.sin();

    let w = (peri - node).to_radians();
    let o = node.to_radians();

    // Rotate by argument of perihelion, inclination, ascending node.
    let x = (w.cos() * o.cos() - w.sin() * o.sin() * i.cos()) * xp
        + (-w.sin() * o.cos() - w.cos() * o.sin() * i.cos()) * yp;
    let y = (w.cos() * o.sin() + w.sin() * o.cos() * i.cos()) * xp
        + (-w.sin() * o.sin() + w.cos() * o.cos() * i.cos()) * yp;
    let z = (w.sin() * i.sin()) * xp + (w.cos() * i.sin()) * yp;
    [x, y, z]
}

/// Newton iteration on Kepler's equation `E - e sin E = M` (radians).
fn solve_kepler(m: f64, e: f64) -> f64 {
    let mut e_anom = m + e * m.sin();
    for _ in 0..30 {
        let delta = (e_anom - e * e_anom.sin() - m) / (1.0 - e * e_anom.cos());
        e_anom -= delta;
        if delta.abs() < 1e-12 {
            break;
        }
    }
    e_anom
}

/// Mean obliquity, exposed for the house calculator.
pub fn obliquity_deg() -> f64 {
    OBLIQUITY_DEG
}
