use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

use urania::aspects::AspectType;
use urania::ephemeris::{EphemerisAdapter, Planet};
use urania::error::ChartError;
use urania::transit::TrackedAspect;
use urania::{AspectConfig, EngineConfig};
use urania_service::{decode_snapshot, encode_snapshot, BirthInput, ChartService, InMemoryChartStore};

fn analytic_adapter() -> EphemerisAdapter {
    EphemerisAdapter::new(EngineConfig {
        program: PathBuf::from("/nonexistent/ephemeris-engine"),
        extra_args: Vec::new(),
        timeout: Duration::from_millis(200),
        allow_fallback: true,
    })
}

fn service() -> ChartService<EphemerisAdapter, InMemoryChartStore> {
    ChartService::new(
        analytic_adapter(),
        InMemoryChartStore::new(),
        AspectConfig::default(),
    )
}

fn birth() -> BirthInput {
    BirthInput {
        date: NaiveDate::from_ymd_opt(1990, 6, 15).unwrap(),
        time: NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
        utc_offset_minutes: 120,
        latitude: 48.8566,
        longitude: 2.3522,
        house_system: "placidus".to_string(),
    }
}

#[test]
fn created_chart_round_trips_through_the_store() {
    let mut service = service();
    let stored = service.create_chart(&birth()).unwrap();

    let loaded = service.chart(stored.id).unwrap();
    assert_eq!(loaded, stored.snapshot);
}

#[test]
fn encode_decode_preserves_every_value() {
    let mut service = service();
    let stored = service.create_chart(&birth()).unwrap();

    let record = encode_snapshot(Uuid::new_v4(), &stored.snapshot).unwrap();
    let decoded = decode_snapshot(&record).unwrap();

    assert_eq!(decoded.planets, stored.snapshot.planets);
    assert_eq!(decoded.cusps, stored.snapshot.cusps);
    assert_eq!(decoded.aspects, stored.snapshot.aspects);
    assert_eq!(decoded.angle_aspects, stored.snapshot.angle_aspects);
    assert_eq!(decoded.angles, stored.snapshot.angles);

    // The persisted structures are keyed, not positional.
    assert!(record.positions.get("sun").is_some());
    assert!(record.cusps.get("10").is_some());
    assert!(record.aspects.get("pairs").is_some());
}

#[test]
fn missing_chart_is_not_found() {
    let service = service();
    let err = service.chart(Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, ChartError::NotFound(_)));
}

#[test]
fn out_of_range_latitude_is_rejected_before_computation() {
    let mut service = service();
    let mut input = birth();
    input.latitude = 91.0;
    assert!(matches!(
        service.create_chart(&input).unwrap_err(),
        ChartError::InvalidInput(_)
    ));
}

#[test]
fn unresolvable_offset_is_rejected() {
    let mut service = service();
    let mut input = birth();
    input.utc_offset_minutes = 30_000;
    assert!(matches!(
        service.create_chart(&input).unwrap_err(),
        ChartError::InvalidInput(_)
    ));
}

#[test]
fn unknown_house_system_is_rejected() {
    let mut service = service();
    let mut input = birth();
    input.house_system = "topocentric".to_string();
    assert!(matches!(
        service.create_chart(&input).unwrap_err(),
        ChartError::UnsupportedHouseSystem { .. }
    ));
}

#[test]
fn empty_house_system_selects_the_default() {
    let mut service = service();
    let mut input = birth();
    input.house_system = String::new();
    let stored = service.create_chart(&input).unwrap();
    assert_eq!(
        stored.snapshot.moment.house_system,
        urania::HouseSystem::Placidus
    );
}

#[test]
fn point_in_time_transits_are_ordered_and_bounded() {
    let mut service = service();
    let stored = service.create_chart(&birth()).unwrap();

    let when = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
    let aspects = service.transits_at(stored.id, when).unwrap();
    assert!(!aspects.is_empty());

    let config = AspectConfig::default();
    for pair in aspects.windows(2) {
        assert!(pair[0].orb <= pair[1].orb);
    }
    for aspect in &aspects {
        assert!(aspect.orb <= config.max_orb(aspect.kind).unwrap());
    }
}

#[test]
fn ranged_scan_returns_one_sample_per_step() {
    let mut service = service();
    let stored = service.create_chart(&birth()).unwrap();

    let start = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let tracks = [
        TrackedAspect {
            transiting: Planet::Sun,
            natal: Planet::Sun,
            kind: AspectType::Conjunction,
        },
        TrackedAspect {
            transiting: Planet::Mars,
            natal: Planet::Moon,
            kind: AspectType::Square,
        },
    ];
    let series = service.scan_transits(stored.id, start, 30, &tracks).unwrap();

    assert_eq!(series.instants.len(), 30);
    assert_eq!(series.tracks.len(), 2);
    for track in &series.tracks {
        assert_eq!(track.samples.len(), 30);
    }

    // The transiting Sun perfects its return within the scan window.
    let return_track = &series.tracks[0];
    assert!(
        !return_track.crossings.is_empty(),
        "no Sun return found in the scan window"
    );
}
