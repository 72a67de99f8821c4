//! Persistence boundary.
//!
//! A chart is handed to storage as three self-describing keyed JSON
//! structures: positions keyed by planet, cusps keyed by house number,
//! aspects as an array of keyed objects. The core never performs storage
//! I/O itself; implementors of [`ChartStore`] do.

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use serde::{Deserialize, Serialize};

use urania::aspects::{AngleAspect, Aspect};
use urania::chart::{ChartAngles, ChartMoment, ChartSnapshot, HouseCusp, PlanetPosition};
use urania::error::ChartError;
use urania::PositionSource;

/// A chart as persisted: metadata plus the three keyed payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartRecord {
    pub id: Uuid,
    pub moment: ChartMoment,
    pub angles: ChartAngles,
    pub source: PositionSource,
    /// `{ "sun": { ... }, "moon": { ... } }`
    pub positions: Value,
    /// `{ "1": { ... }, ..., "12": { ... } }`
    pub cusps: Value,
    /// `{ "pairs": [ ... ], "to_angles": [ ... ] }`
    pub aspects: Value,
}

/// Shape of the aspects payload.
#[derive(Debug, Serialize, Deserialize)]
struct AspectPayload {
    pairs: Vec<Aspect>,
    to_angles: Vec<AngleAspect>,
}

/// Storage collaborator for chart records.
pub trait ChartStore {
    fn save(&mut self, record: ChartRecord) -> Result<(), ChartError>;
    fn load(&self, id: Uuid) -> Result<Option<ChartRecord>, ChartError>;
}

/// Reference store; also what the tests run against.
#[derive(Debug, Default)]
pub struct InMemoryChartStore {
    records: HashMap<Uuid, ChartRecord>,
}

impl InMemoryChartStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ChartStore for InMemoryChartStore {
    fn save(&mut self, record: ChartRecord) -> Result<(), ChartError> {
        self.records.insert(record.id, record);
        Ok(())
    }

    fn load(&self, id: Uuid) -> Result<Option<ChartRecord>, ChartError> {
        Ok(self.records.get(&id).cloned())
    }
}

fn store_error(e: serde_json::Error) -> ChartError {
    ChartError::computation("store", e.to_string())
}

/// Snapshot -> record. Values are serialized at full precision, so the
/// round trip through [`decode_snapshot`] is lossless.
pub fn encode_snapshot(id: Uuid, snapshot: &ChartSnapshot) -> Result<ChartRecord, ChartError> {
    let positions: BTreeMap<&str, &PlanetPosition> = snapshot
        .planets
        .iter()
        .map(|p| (p.planet.as_str(), p))
        .collect();
    let cusps: BTreeMap<String, &HouseCusp> = snapshot
        .cusps
        .iter()
        .map(|c| (c.number.to_string(), c))
        .collect();

    let aspects = AspectPayload {
        pairs: snapshot.aspects.clone(),
        to_angles: snapshot.angle_aspects.clone(),
    };

    Ok(ChartRecord {
        id,
        moment: snapshot.moment,
        angles: snapshot.angles,
        source: snapshot.source,
        positions: serde_json::to_value(&positions).map_err(store_error)?,
        cusps: serde_json::to_value(&cusps).map_err(store_error)?,
        aspects: serde_json::to_value(&aspects).map_err(store_error)?,
    })
}

/// Record -> snapshot. The keyed structures carry everything; ordering is
/// restored from the values themselves, not from key positions.
pub fn decode_snapshot(record: &ChartRecord) -> Result<ChartSnapshot, ChartError> {
    let positions: BTreeMap<String, PlanetPosition> =
        serde_json::from_value(record.positions.clone()).map_err(store_error)?;
    let mut planets: Vec<PlanetPosition> = positions.into_values().collect();
    planets.sort_by_key(|p| p.planet);

    let cusp_map: BTreeMap<String, HouseCusp> =
        serde_json::from_value(record.cusps.clone()).map_err(store_error)?;
    let mut cusps: Vec<HouseCusp> = cusp_map.into_values().collect();
    cusps.sort_by_key(|c| c.number);
    if cusps.len() != 12 {
        return Err(ChartError::computation(
            "store",
            format!("chart record has {} cusps, expected 12", cusps.len()),
        ));
    }

    let aspects: AspectPayload =
        serde_json::from_value(record.aspects.clone()).map_err(store_error)?;

    Ok(ChartSnapshot {
        moment: record.moment,
        planets,
        cusps,
        angles: record.angles,
        aspects: aspects.pairs,
        angle_aspects: aspects.to_angles,
        source: record.source,
    })
}
