use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ChartError;

/// Bodies tracked by the chart core.
///
/// Declaration order doubles as the deterministic priority order used for
/// aspect tie-breaking: luminaries first, then inner planets outward.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Planet {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
    NorthNode,
    SouthNode,
    Chiron,
}

impl Planet {
    /// All bodies in priority order.
    pub const ALL: [Planet; 13] = [
        Planet::Sun,
        Planet::Moon,
        Planet::Mercury,
        Planet::Venus,
        Planet::Mars,
        Planet::Jupiter,
        Planet::Saturn,
        Planet::Uranus,
        Planet::Neptune,
        Planet::Pluto,
        Planet::NorthNode,
        Planet::SouthNode,
        Planet::Chiron,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Planet::Sun => "sun",
            Planet::Moon => "moon",
            Planet::Mercury => "mercury",
            Planet::Venus => "venus",
            Planet::Mars => "mars",
            Planet::Jupiter => "jupiter",
            Planet::Saturn => "saturn",
            Planet::Uranus => "uranus",
            Planet::Neptune => "neptune",
            Planet::Pluto => "pluto",
            Planet::NorthNode => "north_node",
            Planet::SouthNode => "south_node",
            Planet::Chiron => "chiron",
        }
    }

    pub fn from_identifier(id: &str) -> Option<Planet> {
        Planet::ALL.iter().copied().find(|p| p.as_str() == id)
    }

    /// Bodies the engine is asked for. The south node is always derived from
    /// the north node, never queried.
    pub fn queried() -> impl Iterator<Item = Planet> {
        Planet::ALL
            .iter()
            .copied()
            .filter(|p| *p != Planet::SouthNode)
    }
}

impl fmt::Display for Planet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geographic observer location in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoLocation {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ChartError> {
        let loc = GeoLocation { latitude, longitude };
        loc.validate()?;
        Ok(loc)
    }

    pub fn validate(&self) -> Result<(), ChartError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ChartError::InvalidInput(format!(
                "latitude out of range [-90, 90]: {}",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ChartError::InvalidInput(format!(
                "longitude out of range [-180, 180]: {}",
                self.longitude
            )));
        }
        Ok(())
    }
}

/// Raw body position as delivered by an ephemeris source.
///
/// `speed` is ecliptic longitude motion in degrees/day and is genuinely
/// optional: engine output may omit it, and derived points never carry one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPosition {
    /// Ecliptic longitude in degrees, [0, 360).
    pub longitude: f64,
    /// Ecliptic latitude in degrees.
    pub latitude: f64,
    /// Distance from Earth in AU.
    pub distance: f64,
    /// Daily motion in longitude (degrees/day); negative means retrograde.
    pub speed: Option<f64>,
}

/// Which computation path produced a batch of positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSource {
    /// Full-precision external engine.
    Engine,
    /// Low-precision analytical approximation. Callers must be able to tell
    /// the two apart, so the tag travels with the data.
    Analytic,
}

/// One batch of body positions for a single instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyPositions {
    pub source: PositionSource,
    /// Planet -> raw position, iterated in priority order.
    pub bodies: BTreeMap<Planet, RawPosition>,
}

impl BodyPositions {
    pub fn get(&self, planet: Planet) -> Option<&RawPosition> {
        self.bodies.get(&planet)
    }

    pub fn longitude(&self, planet: Planet) -> Option<f64> {
        self.bodies.get(&planet).map(|p| p.longitude)
    }
}
