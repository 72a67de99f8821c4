use chrono::{TimeZone, Utc};
use std::path::PathBuf;
use std::time::Duration;

use urania::angles::arc_forward;
use urania::chart::{self, degree_in_sign, ChartAssembler, ChartMoment, ZodiacSign};
use urania::ephemeris::{EphemerisAdapter, GeoLocation, PositionSource};
use urania::houses::HouseSystem;
use urania::{AspectConfig, EngineConfig};

/// Adapter that always takes the analytical path (no engine binary).
fn analytic_adapter() -> EphemerisAdapter {
    EphemerisAdapter::new(EngineConfig {
        program: PathBuf::from("/nonexistent/ephemeris-engine"),
        extra_args: Vec::new(),
        timeout: Duration::from_millis(200),
        allow_fallback: true,
    })
}

fn paris_moment(house_system: HouseSystem) -> ChartMoment {
    ChartMoment {
        instant: Utc.with_ymd_and_hms(1990, 6, 15, 12, 30, 0).unwrap(),
        utc_offset_minutes: 120,
        location: GeoLocation {
            latitude: 48.8566,
            longitude: 2.3522,
        },
        house_system,
    }
}

#[test]
fn full_chart_satisfies_sign_and_degree_laws() {
    let mut adapter = analytic_adapter();
    let assembler = ChartAssembler::new(AspectConfig::default());
    let snapshot =
        chart::compute(&mut adapter, &assembler, paris_moment(HouseSystem::Placidus)).unwrap();

    for planet in &snapshot.planets {
        assert!(
            (0.0..360.0).contains(&planet.longitude),
            "{} longitude {}",
            planet.planet,
            planet.longitude
        );
        let expected_sign = ZodiacSign::from_longitude(planet.longitude);
        assert_eq!(planet.sign, expected_sign, "{}", planet.planet);
        assert!(
            (planet.degree - degree_in_sign(planet.longitude)).abs() < 1e-12,
            "{} degree",
            planet.planet
        );
        assert!((1..=12).contains(&planet.house), "{}", planet.planet);
    }

    for cusp in &snapshot.cusps {
        assert_eq!(cusp.sign, ZodiacSign::from_longitude(cusp.longitude));
        assert!((cusp.degree - degree_in_sign(cusp.longitude)).abs() < 1e-12);
    }
}

#[test]
fn cusps_partition_the_circle_exactly_once() {
    let mut adapter = analytic_adapter();
    let assembler = ChartAssembler::new(AspectConfig::default());

    for system in [
        HouseSystem::Placidus,
        HouseSystem::WholeSign,
        HouseSystem::Equal,
        HouseSystem::Porphyry,
        HouseSystem::Koch,
    ] {
        let snapshot = chart::compute(&mut adapter, &assembler, paris_moment(system)).unwrap();
        assert_eq!(snapshot.cusps.len(), 12);

        let mut total = 0.0;
        for i in 0..12 {
            let arc = arc_forward(
                snapshot.cusps[i].longitude,
                snapshot.cusps[(i + 1) % 12].longitude,
            );
            assert!(arc > 0.0, "{}: empty arc at cusp {}", system.as_str(), i + 1);
            total += arc;
        }
        assert!(
            (total - 360.0).abs() < 1e-6,
            "{}: arcs sum to {total}",
            system.as_str()
        );
    }
}

#[test]
fn planets_sit_inside_their_assigned_houses() {
    let mut adapter = analytic_adapter();
    let assembler = ChartAssembler::new(AspectConfig::default());
    let snapshot =
        chart::compute(&mut adapter, &assembler, paris_moment(HouseSystem::Placidus)).unwrap();

    for planet in &snapshot.planets {
        let house = planet.house as usize;
        let cusp = snapshot.cusps[house - 1].longitude;
        let next = snapshot.cusps[house % 12].longitude;
        let width = arc_forward(cusp, next);
        let offset = arc_forward(cusp, planet.longitude);
        assert!(
            offset < width,
            "{} at {} not in house {house} [{cusp}, {next})",
            planet.planet,
            planet.longitude
        );
    }
}

#[test]
fn ascendant_is_first_cusp_for_quadrant_systems() {
    let mut adapter = analytic_adapter();
    let assembler = ChartAssembler::new(AspectConfig::default());

    for system in [HouseSystem::Placidus, HouseSystem::Porphyry, HouseSystem::Koch] {
        let snapshot = chart::compute(&mut adapter, &assembler, paris_moment(system)).unwrap();
        assert!(
            (snapshot.cusps[0].longitude - snapshot.angles.ascendant).abs() < 1e-9,
            "{}",
            system.as_str()
        );
        assert!(
            (snapshot.cusps[9].longitude - snapshot.angles.midheaven).abs() < 1e-9,
            "{}",
            system.as_str()
        );
    }
}

#[test]
fn polar_placidus_fails_without_a_chart() {
    let mut adapter = analytic_adapter();
    let assembler = ChartAssembler::new(AspectConfig::default());
    let mut moment = paris_moment(HouseSystem::Placidus);
    moment.location = GeoLocation {
        latitude: 80.0,
        longitude: 20.0,
    };

    let err = chart::compute(&mut adapter, &assembler, moment).unwrap_err();
    assert!(
        matches!(
            err,
            urania::ChartError::ComputationError {
                component: "houses",
                ..
            }
        ),
        "{err}"
    );

    // Whole-sign at the same latitude is fine.
    moment.house_system = HouseSystem::WholeSign;
    assert!(chart::compute(&mut adapter, &assembler, moment).is_ok());
}

#[test]
fn fallback_path_is_visible_on_the_snapshot() {
    let mut adapter = analytic_adapter();
    let assembler = ChartAssembler::new(AspectConfig::default());
    let snapshot =
        chart::compute(&mut adapter, &assembler, paris_moment(HouseSystem::Equal)).unwrap();
    assert_eq!(snapshot.source, PositionSource::Analytic);
}

#[test]
fn natal_aspects_respect_their_orb_limits() {
    let mut adapter = analytic_adapter();
    let assembler = ChartAssembler::new(AspectConfig::default());
    let config = AspectConfig::default();
    let snapshot =
        chart::compute(&mut adapter, &assembler, paris_moment(HouseSystem::Equal)).unwrap();

    for aspect in &snapshot.aspects {
        assert!(aspect.orb >= 0.0);
        let max = config.max_orb(aspect.kind).unwrap();
        assert!(
            aspect.orb <= max,
            "{aspect} exceeds max orb {max}"
        );
    }
    // Ordering: tightest first.
    for pair in snapshot.aspects.windows(2) {
        assert!(pair[0].orb <= pair[1].orb);
    }
}
