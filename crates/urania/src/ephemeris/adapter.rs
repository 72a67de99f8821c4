//! Ephemeris adapter: one configured entry point for body positions.
//!
//! Tries the external engine first; when the engine is unavailable (missing
//! binary, non-zero exit, timeout) and the configuration allows it, the
//! analytical fallback stands in, logged and tagged on the returned batch
//! so downstream consumers can always tell the paths apart. Malformed
//! engine output is NOT papered over by the fallback: that is a
//! computation error and it propagates.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};

use crate::config::EngineConfig;
use crate::ephemeris::types::{BodyPositions, GeoLocation, Planet, PositionSource, RawPosition};
use crate::ephemeris::{engine, fallback};
use crate::error::ChartError;

/// Anything that can produce body positions for an instant. The seam that
/// lets the scanner and derived-chart calculators run against test doubles.
pub trait EphemerisSource {
    fn positions(
        &mut self,
        instant: DateTime<Utc>,
        location: &GeoLocation,
    ) -> Result<BodyPositions, ChartError>;
}

/// Cache key: instant to the second, coordinates to the microdegree.
/// Results are pure functions of these, so reuse across a scan is safe.
type CacheKey = (i64, i64, i64);

pub struct EphemerisAdapter {
    config: EngineConfig,
    cache: HashMap<CacheKey, BodyPositions>,
}

impl EphemerisAdapter {
    pub fn new(config: EngineConfig) -> Self {
        EphemerisAdapter {
            config,
            cache: HashMap::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn cache_key(instant: DateTime<Utc>, location: &GeoLocation) -> CacheKey {
        (
            instant.timestamp(),
            (location.latitude * 1e6).round() as i64,
            (location.longitude * 1e6).round() as i64,
        )
    }

    fn compute(
        &self,
        instant: DateTime<Utc>,
        location: &GeoLocation,
    ) -> Result<BodyPositions, ChartError> {
        let requested: Vec<Planet> = Planet::queried().collect();

        let (source, mut bodies) = match engine::query(&self.config, instant, location, &requested)
        {
            Ok(bodies) => (PositionSource::Engine, bodies),
            Err(ChartError::EphemerisUnavailable(reason)) if self.config.allow_fallback => {
                warn!(
                    "ephemeris engine unavailable ({reason}); using analytical fallback \
                     (reduced precision)"
                );
                (
                    PositionSource::Analytic,
                    fallback::positions(instant, &requested),
                )
            }
            Err(e) => return Err(e),
        };

        derive_south_node(&mut bodies);
        Ok(BodyPositions { source, bodies })
    }
}

impl EphemerisSource for EphemerisAdapter {
    fn positions(
        &mut self,
        instant: DateTime<Utc>,
        location: &GeoLocation,
    ) -> Result<BodyPositions, ChartError> {
        location.validate()?;

        let key = Self::cache_key(instant, location);
        if let Some(hit) = self.cache.get(&key) {
            debug!("ephemeris cache hit for {instant}");
            return Ok(hit.clone());
        }

        let batch = self.compute(instant, location)?;
        self.cache.insert(key, batch.clone());
        Ok(batch)
    }
}

/// The south node is the antipode of the north node: same speed, mirrored
/// latitude. It is always derived, never queried.
fn derive_south_node(bodies: &mut BTreeMap<Planet, RawPosition>) {
    if let Some(north) = bodies.get(&Planet::NorthNode).copied() {
        bodies.insert(
            Planet::SouthNode,
            RawPosition {
                longitude: (north.longitude + 180.0).rem_euclid(360.0),
                latitude: -north.latitude,
                distance: north.distance,
                speed: north.speed,
            },
        );
    }
}
