//! Chart assembly: raw positions + cusps -> immutable snapshot.
//!
//! Pure and deterministic. Identical raw inputs always produce an
//! identical snapshot; no clock or random state is consulted.

use crate::angles::arc_forward;
use crate::aspects::{detector, AspectConfig};
use crate::chart::types::{
    degree_in_sign, ChartAngles, ChartMoment, ChartSnapshot, HouseCusp, PlanetPosition, ZodiacSign,
};
use crate::ephemeris::BodyPositions;
use crate::error::ChartError;

/// Assembles snapshots; carries the aspect configuration so natal aspects
/// come out of the same pass.
#[derive(Debug, Clone, Default)]
pub struct ChartAssembler {
    aspect_config: AspectConfig,
}

impl ChartAssembler {
    pub fn new(aspect_config: AspectConfig) -> Self {
        ChartAssembler { aspect_config }
    }

    pub fn aspect_config(&self) -> &AspectConfig {
        &self.aspect_config
    }

    /// Combine positions, cusps, and angles into a complete snapshot.
    pub fn assemble(
        &self,
        moment: ChartMoment,
        positions: &BodyPositions,
        cusp_longitudes: &[f64; 12],
        angles: ChartAngles,
    ) -> Result<ChartSnapshot, ChartError> {
        let cusps: Vec<HouseCusp> = cusp_longitudes
            .iter()
            .enumerate()
            .map(|(i, &longitude)| HouseCusp {
                number: (i + 1) as u8,
                longitude,
                sign: ZodiacSign::from_longitude(longitude),
                degree: degree_in_sign(longitude),
            })
            .collect();

        let mut planets = Vec::with_capacity(positions.bodies.len());
        for (&planet, raw) in &positions.bodies {
            planets.push(PlanetPosition {
                planet,
                longitude: raw.longitude,
                latitude: raw.latitude,
                sign: ZodiacSign::from_longitude(raw.longitude),
                degree: degree_in_sign(raw.longitude),
                house: house_of(raw.longitude, cusp_longitudes),
                speed: raw.speed,
                retrograde: raw.speed.map(|s| s < 0.0).unwrap_or(false),
            });
        }

        let aspects = detector::detect_natal(&positions.bodies, &self.aspect_config);
        let angle_aspects = detector::detect_to_angles(
            &positions.bodies,
            angles.ascendant,
            angles.midheaven,
            &self.aspect_config,
        );

        Ok(ChartSnapshot {
            moment,
            planets,
            cusps,
            angles,
            aspects,
            angle_aspects,
            source: positions.source,
        })
    }
}

/// House containing a longitude: the half-open arc `[cusp[n], cusp[n+1])`.
/// A point exactly on a cusp belongs to the house that begins there.
pub fn house_of(longitude: f64, cusps: &[f64; 12]) -> u8 {
    for i in 0..12 {
        let next = (i + 1) % 12;
        let width = arc_forward(cusps[i], cusps[next]);
        let offset = arc_forward(cusps[i], longitude);
        if offset < width {
            return (i + 1) as u8;
        }
    }
    // Unreachable for a valid partition; the cusp module validates those.
    12
}
