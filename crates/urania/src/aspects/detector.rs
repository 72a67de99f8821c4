//! Aspect detection over sets of body positions.
//!
//! Works on longitudes alone; speeds, when present, only refine the
//! applying/separating flag. Output ordering is fully deterministic:
//! ascending orb, ties broken by the planet priority order.

use std::collections::BTreeMap;

use crate::angles::{separation, signed_delta};
use crate::aspects::types::{AngleAspect, AngleKind, Aspect, AspectConfig, AspectType};
use crate::ephemeris::{Planet, RawPosition};

/// Projection step, in days, used to decide applying vs separating.
const APPLYING_PROBE_DAYS: f64 = 0.1;

/// Orb below which an aspect counts as exact.
const EXACT_ORB: f64 = 0.1;

/// Aspects within one position set. Each unordered pair is considered
/// exactly once; a body never aspects itself.
pub fn detect_natal(
    bodies: &BTreeMap<Planet, RawPosition>,
    config: &AspectConfig,
) -> Vec<Aspect> {
    let ids: Vec<Planet> = bodies.keys().copied().collect();
    let mut aspects = Vec::new();
    for i in 0..ids.len() {
        for j in (i + 1)..ids.len() {
            let a = &bodies[&ids[i]];
            let b = &bodies[&ids[j]];
            if let Some(aspect) = between(ids[i], ids[j], a, b, config) {
                aspects.push(aspect);
            }
        }
    }
    order(&mut aspects);
    aspects
}

/// Aspects from a moving set against a reference set (transit-to-natal).
///
/// The same body may appear on both sides: a transiting Sun conjunct the
/// natal Sun is a return, not a self-pair. `first` is always the moving
/// body, `second` the reference body.
pub fn detect_between(
    moving: &BTreeMap<Planet, RawPosition>,
    reference: &BTreeMap<Planet, RawPosition>,
    config: &AspectConfig,
) -> Vec<Aspect> {
    let mut aspects = Vec::new();
    for (&mover, a) in moving {
        for (&target, b) in reference {
            if let Some(aspect) = between(mover, target, a, b, config) {
                aspects.push(aspect);
            }
        }
    }
    order(&mut aspects);
    aspects
}

/// The single tightest aspect between two points, if any type matches
/// within its orb.
pub fn between(
    first: Planet,
    second: Planet,
    a: &RawPosition,
    b: &RawPosition,
    config: &AspectConfig,
) -> Option<Aspect> {
    let sep = separation(a.longitude, b.longitude);

    let mut best: Option<(AspectType, f64)> = None;
    for kind in config.enabled_types() {
        let max_orb = match config.max_orb(kind) {
            Some(orb) => orb,
            None => continue,
        };
        let orb = (sep - kind.exact_angle()).abs();
        if orb <= max_orb && best.map(|(_, b_orb)| orb < b_orb).unwrap_or(true) {
            best = Some((kind, orb));
        }
    }

    let (kind, orb) = best?;
    Some(Aspect {
        first,
        second,
        kind,
        orb,
        applying: applying_flag(a, b, kind.exact_angle()),
        exact: orb < EXACT_ORB,
    })
}

/// Applying when the projected separation moves toward the exact angle.
/// Requires both speeds; the flag is omitted, never guessed, otherwise.
fn applying_flag(a: &RawPosition, b: &RawPosition, exact_angle: f64) -> Option<bool> {
    let speed_a = a.speed?;
    let speed_b = b.speed?;

    let current = (separation(a.longitude, b.longitude) - exact_angle).abs();

    let future_delta =
        signed_delta(a.longitude, b.longitude) + (speed_a - speed_b) * APPLYING_PROBE_DAYS;
    let future_sep = future_delta.abs().min(360.0 - future_delta.abs());
    let future = (future_sep - exact_angle).abs();

    Some(future < current)
}

/// Aspects from a set of bodies to the two chart angles. The angles are
/// static derived points, so they enter the comparison with zero speed.
pub fn detect_to_angles(
    bodies: &BTreeMap<Planet, RawPosition>,
    ascendant: f64,
    midheaven: f64,
    config: &AspectConfig,
) -> Vec<AngleAspect> {
    let angle_points = [
        (AngleKind::Ascendant, ascendant),
        (AngleKind::Midheaven, midheaven),
    ];

    let mut aspects = Vec::new();
    for (&planet, position) in bodies {
        for (angle, angle_lon) in angle_points {
            let point = RawPosition {
                longitude: angle_lon,
                latitude: 0.0,
                distance: 0.0,
                speed: Some(0.0),
            };
            if let Some(aspect) = between(planet, planet, position, &point, config) {
                aspects.push(AngleAspect {
                    planet,
                    angle,
                    kind: aspect.kind,
                    orb: aspect.orb,
                    applying: aspect.applying,
                    exact: aspect.exact,
                });
            }
        }
    }
    aspects.sort_by(|x, y| {
        x.orb
            .total_cmp(&y.orb)
            .then_with(|| x.planet.cmp(&y.planet))
            .then_with(|| x.angle.cmp(&y.angle))
    });
    aspects
}

/// Ascending orb, then planet priority. Stable for identical inputs.
fn order(aspects: &mut [Aspect]) {
    aspects.sort_by(|x, y| {
        x.orb
            .total_cmp(&y.orb)
            .then_with(|| x.first.cmp(&y.first))
            .then_with(|| x.second.cmp(&y.second))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(longitude: f64, speed: Option<f64>) -> RawPosition {
        RawPosition {
            longitude,
            latitude: 0.0,
            distance: 1.0,
            speed,
        }
    }

    #[test]
    fn exact_trine_has_zero_orb() {
        let config = AspectConfig::default();
        let aspect = between(
            Planet::Sun,
            Planet::Mars,
            &pos(10.0, Some(1.0)),
            &pos(130.0, Some(0.5)),
            &config,
        )
        .unwrap();
        assert_eq!(aspect.kind, AspectType::Trine);
        assert!(aspect.orb < 1e-12);
        assert!(aspect.exact);
    }

    #[test]
    fn conjunction_across_the_aries_point() {
        let config = AspectConfig::default();
        let aspect = between(
            Planet::Sun,
            Planet::Moon,
            &pos(358.0, Some(1.0)),
            &pos(3.0, Some(13.0)),
            &config,
        )
        .unwrap();
        assert_eq!(aspect.kind, AspectType::Conjunction);
        assert!((aspect.orb - 5.0).abs() < 1e-9);
    }

    #[test]
    fn no_aspect_outside_orb() {
        let config = AspectConfig::default();
        assert!(between(
            Planet::Sun,
            Planet::Moon,
            &pos(0.0, None),
            &pos(40.0, None),
            &config,
        )
        .is_none());
    }

    #[test]
    fn applying_omitted_without_speed() {
        let config = AspectConfig::default();
        let aspect = between(
            Planet::Sun,
            Planet::Moon,
            &pos(10.0, Some(1.0)),
            &pos(12.0, None),
            &config,
        )
        .unwrap();
        assert_eq!(aspect.applying, None);
    }

    #[test]
    fn faster_body_closing_is_applying() {
        let config = AspectConfig::default();
        // Moon at 5 deg behind the Sun, moving much faster: the gap closes.
        let aspect = between(
            Planet::Moon,
            Planet::Sun,
            &pos(95.0, Some(13.0)),
            &pos(100.0, Some(1.0)),
            &config,
        )
        .unwrap();
        assert_eq!(aspect.kind, AspectType::Conjunction);
        assert_eq!(aspect.applying, Some(true));
    }

    #[test]
    fn faster_body_past_exact_is_separating() {
        let config = AspectConfig::default();
        let aspect = between(
            Planet::Moon,
            Planet::Sun,
            &pos(105.0, Some(13.0)),
            &pos(100.0, Some(1.0)),
            &config,
        )
        .unwrap();
        assert_eq!(aspect.applying, Some(false));
    }

    #[test]
    fn minor_aspects_only_when_enabled() {
        let quincunx_pair = (pos(10.0, None), pos(160.0, None));

        let majors_only = AspectConfig::default();
        assert!(between(
            Planet::Sun,
            Planet::Moon,
            &quincunx_pair.0,
            &quincunx_pair.1,
            &majors_only
        )
        .is_none());

        let with_minor = AspectConfig {
            include_minor: true,
            ..AspectConfig::default()
        };
        let aspect = between(
            Planet::Sun,
            Planet::Moon,
            &quincunx_pair.0,
            &quincunx_pair.1,
            &with_minor,
        )
        .unwrap();
        assert_eq!(aspect.kind, AspectType::Quincunx);
    }

    #[test]
    fn natal_detection_emits_each_pair_once() {
        let mut bodies = BTreeMap::new();
        bodies.insert(Planet::Sun, pos(0.0, Some(1.0)));
        bodies.insert(Planet::Moon, pos(60.0, Some(13.0)));
        bodies.insert(Planet::Mars, pos(120.0, Some(0.5)));
        let config = AspectConfig::default();

        let aspects = detect_natal(&bodies, &config);
        // sun-moon sextile, moon-mars sextile, sun-mars trine; no mirrors.
        assert_eq!(aspects.len(), 3);
        for aspect in &aspects {
            assert!(aspect.first < aspect.second);
        }
    }

    #[test]
    fn detection_is_idempotent() {
        let mut bodies = BTreeMap::new();
        bodies.insert(Planet::Sun, pos(11.25, Some(1.0)));
        bodies.insert(Planet::Moon, pos(70.5, Some(13.0)));
        bodies.insert(Planet::Venus, pos(101.0, Some(1.2)));
        bodies.insert(Planet::Mars, pos(131.5, Some(0.5)));
        let config = AspectConfig::default();

        let first = detect_natal(&bodies, &config);
        let second = detect_natal(&bodies, &config);
        assert_eq!(first, second);
    }

    #[test]
    fn ordering_is_tightest_first() {
        let mut bodies = BTreeMap::new();
        bodies.insert(Planet::Sun, pos(0.0, Some(1.0)));
        bodies.insert(Planet::Moon, pos(62.5, Some(13.0))); // sextile, orb 2.5
        bodies.insert(Planet::Mars, pos(120.5, Some(0.5))); // trine, orb 0.5
        let config = AspectConfig::default();

        let aspects = detect_natal(&bodies, &config);
        assert!(aspects.len() >= 2);
        assert_eq!(aspects[0].second, Planet::Mars);
        assert!(aspects[0].orb <= aspects[1].orb);
    }

    #[test]
    fn angle_aspects_follow_the_planet_speed() {
        let mut bodies = BTreeMap::new();
        // Two degrees short of a square to the ascendant, moving direct.
        bodies.insert(Planet::Mars, pos(98.0, Some(0.6)));
        let config = AspectConfig::default();

        let aspects = detect_to_angles(&bodies, 10.0, 280.0, &config);
        let square = aspects
            .iter()
            .find(|a| a.angle == AngleKind::Ascendant)
            .unwrap();
        assert_eq!(square.kind, AspectType::Square);
        assert!((square.orb - 2.0).abs() < 1e-9);
        assert_eq!(square.applying, Some(true));
    }

    #[test]
    fn cross_set_allows_same_body_returns() {
        let mut transiting = BTreeMap::new();
        transiting.insert(Planet::Sun, pos(280.0, Some(1.0)));
        let mut natal = BTreeMap::new();
        natal.insert(Planet::Sun, pos(280.0, Some(0.0)));
        let config = AspectConfig::default();

        let aspects = detect_between(&transiting, &natal, &config);
        assert_eq!(aspects.len(), 1);
        assert_eq!(aspects[0].kind, AspectType::Conjunction);
        assert!(aspects[0].exact);
    }
}
