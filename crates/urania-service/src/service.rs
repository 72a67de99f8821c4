//! Consumer boundary: chart creation, retrieval, and the two forecasting
//! operations (point-in-time transits and ranged transit scans).
//!
//! All input validation happens here, before anything reaches the core:
//! coordinate ranges, a resolvable fixed UTC offset, a recognized house
//! system identifier.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use log::info;
use serde::Deserialize;
use uuid::Uuid;

use urania::aspects::{detect_between, Aspect, AspectConfig};
use urania::chart::{self, ChartAssembler, ChartMoment, ChartSnapshot};
use urania::ephemeris::{EphemerisSource, GeoLocation};
use urania::error::ChartError;
use urania::houses::HouseSystem;
use urania::timing::resolve_local;
use urania::transit::{
    natal_reference, ScanConfig, TrackedAspect, TransitScanner, TransitSeries,
};

use crate::store::{decode_snapshot, encode_snapshot, ChartRecord, ChartStore};

/// Birth data as supplied by the consumer.
#[derive(Debug, Clone, Deserialize)]
pub struct BirthInput {
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// Fixed offset, minutes east of Greenwich, already resolved for DST.
    pub utc_offset_minutes: i32,
    pub latitude: f64,
    pub longitude: f64,
    /// House system identifier; empty string selects the default.
    #[serde(default)]
    pub house_system: String,
}

/// A created chart: its storage id plus the computed snapshot.
#[derive(Debug, Clone)]
pub struct StoredChart {
    pub id: Uuid,
    pub snapshot: ChartSnapshot,
}

pub struct ChartService<S: EphemerisSource, T: ChartStore> {
    source: S,
    store: T,
    assembler: ChartAssembler,
    scan_config: ScanConfig,
}

impl<S: EphemerisSource, T: ChartStore> ChartService<S, T> {
    pub fn new(source: S, store: T, aspect_config: AspectConfig) -> Self {
        ChartService {
            source,
            store,
            assembler: ChartAssembler::new(aspect_config),
            scan_config: ScanConfig::default(),
        }
    }

    pub fn with_scan_config(mut self, scan_config: ScanConfig) -> Self {
        self.scan_config = scan_config;
        self
    }

    /// Validate birth input, compute the natal chart, persist it.
    pub fn create_chart(&mut self, input: &BirthInput) -> Result<StoredChart, ChartError> {
        let moment = self.resolve_moment(input)?;
        let snapshot = chart::compute(&mut self.source, &self.assembler, moment)?;

        let id = Uuid::new_v4();
        let record = encode_snapshot(id, &snapshot)?;
        self.store.save(record)?;
        info!(
            "chart {id} created for {} ({} planets, {} aspects)",
            moment.instant,
            snapshot.planets.len(),
            snapshot.aspects.len()
        );
        Ok(StoredChart { id, snapshot })
    }

    /// Load a stored chart.
    pub fn chart(&self, id: Uuid) -> Result<ChartSnapshot, ChartError> {
        let record = self
            .store
            .load(id)?
            .ok_or_else(|| ChartError::NotFound(format!("chart {id}")))?;
        decode_snapshot(&record)
    }

    /// Transiting aspects against a stored natal chart at one instant.
    pub fn transits_at(
        &mut self,
        id: Uuid,
        instant: DateTime<Utc>,
    ) -> Result<Vec<Aspect>, ChartError> {
        let natal = self.chart(id)?;
        let transiting = self
            .source
            .positions(instant, &natal.moment.location)?;
        Ok(detect_between(
            &transiting.bodies,
            &natal_reference(&natal),
            self.assembler.aspect_config(),
        ))
    }

    /// Ranged transit scan against a stored natal chart.
    pub fn scan_transits(
        &mut self,
        id: Uuid,
        start: DateTime<Utc>,
        steps: usize,
        tracks: &[TrackedAspect],
    ) -> Result<TransitSeries, ChartError> {
        let natal = self.chart(id)?;
        let reference = natal_reference(&natal);
        let mut scanner = TransitScanner::new(&mut self.source, self.scan_config.clone());
        scanner.scan(
            &reference,
            &natal.moment.location,
            start,
            steps,
            tracks,
        )
    }

    fn resolve_moment(&self, input: &BirthInput) -> Result<ChartMoment, ChartError> {
        let location = GeoLocation::new(input.latitude, input.longitude)?;
        let instant = resolve_local(input.date, input.time, input.utc_offset_minutes)?;
        let house_system = if input.house_system.is_empty() {
            HouseSystem::default()
        } else {
            HouseSystem::from_identifier(&input.house_system)?
        };
        Ok(ChartMoment {
            instant,
            utc_offset_minutes: input.utc_offset_minutes,
            location,
            house_system,
        })
    }
}
