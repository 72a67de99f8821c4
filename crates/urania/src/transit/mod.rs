pub mod scanner;
pub mod types;

pub use scanner::{signed_deviation, TransitScanner};
pub use types::{ExactCrossing, ScanConfig, TrackSeries, TrackedAspect, TransitSeries};

use std::collections::BTreeMap;

use crate::chart::ChartSnapshot;
use crate::ephemeris::{Planet, RawPosition};

/// Natal positions as a static reference set for transit work: the points
/// do not move, so their speed is zero by definition (not unknown).
pub fn natal_reference(chart: &ChartSnapshot) -> BTreeMap<Planet, RawPosition> {
    chart
        .planets
        .iter()
        .map(|p| {
            (
                p.planet,
                RawPosition {
                    longitude: p.longitude,
                    latitude: p.latitude,
                    distance: 0.0,
                    speed: Some(0.0),
                },
            )
        })
        .collect()
}
