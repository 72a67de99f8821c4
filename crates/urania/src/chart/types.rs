use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::angles::normalize_deg;
use crate::aspects::{AngleAspect, Aspect};
use crate::ephemeris::{GeoLocation, Planet, PositionSource};
use crate::houses::HouseSystem;

/// The twelve zodiac signs, Aries first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZodiacSign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

impl ZodiacSign {
    pub const ALL: [ZodiacSign; 12] = [
        ZodiacSign::Aries,
        ZodiacSign::Taurus,
        ZodiacSign::Gemini,
        ZodiacSign::Cancer,
        ZodiacSign::Leo,
        ZodiacSign::Virgo,
        ZodiacSign::Libra,
        ZodiacSign::Scorpio,
        ZodiacSign::Sagittarius,
        ZodiacSign::Capricorn,
        ZodiacSign::Aquarius,
        ZodiacSign::Pisces,
    ];

    /// Sign containing a longitude: `floor(lon / 30) mod 12`.
    pub fn from_longitude(longitude: f64) -> ZodiacSign {
        let idx = (normalize_deg(longitude) / 30.0).floor() as usize % 12;
        ZodiacSign::ALL[idx]
    }

    /// Traditional ruler, used as the profection year lord.
    pub fn traditional_ruler(&self) -> Planet {
        match self {
            ZodiacSign::Aries | ZodiacSign::Scorpio => Planet::Mars,
            ZodiacSign::Taurus | ZodiacSign::Libra => Planet::Venus,
            ZodiacSign::Gemini | ZodiacSign::Virgo => Planet::Mercury,
            ZodiacSign::Cancer => Planet::Moon,
            ZodiacSign::Leo => Planet::Sun,
            ZodiacSign::Sagittarius | ZodiacSign::Pisces => Planet::Jupiter,
            ZodiacSign::Capricorn | ZodiacSign::Aquarius => Planet::Saturn,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ZodiacSign::Aries => "aries",
            ZodiacSign::Taurus => "taurus",
            ZodiacSign::Gemini => "gemini",
            ZodiacSign::Cancer => "cancer",
            ZodiacSign::Leo => "leo",
            ZodiacSign::Virgo => "virgo",
            ZodiacSign::Libra => "libra",
            ZodiacSign::Scorpio => "scorpio",
            ZodiacSign::Sagittarius => "sagittarius",
            ZodiacSign::Capricorn => "capricorn",
            ZodiacSign::Aquarius => "aquarius",
            ZodiacSign::Pisces => "pisces",
        }
    }
}

impl fmt::Display for ZodiacSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Degree within a sign: `lon mod 30`.
pub fn degree_in_sign(longitude: f64) -> f64 {
    normalize_deg(longitude) % 30.0
}

/// A planet placed in the chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetPosition {
    pub planet: Planet,
    /// Ecliptic longitude, [0, 360).
    pub longitude: f64,
    /// Ecliptic latitude in degrees.
    pub latitude: f64,
    pub sign: ZodiacSign,
    /// Degrees into the sign, [0, 30).
    pub degree: f64,
    /// House 1-12, located within the cusp partition.
    pub house: u8,
    /// Daily motion; None when the source could not provide one.
    pub speed: Option<f64>,
    /// True only when a known speed is negative.
    pub retrograde: bool,
}

/// One house cusp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseCusp {
    /// House number 1-12.
    pub number: u8,
    pub longitude: f64,
    pub sign: ZodiacSign,
    pub degree: f64,
}

/// The four chart angles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartAngles {
    pub ascendant: f64,
    pub midheaven: f64,
    pub descendant: f64,
    pub imum_coeli: f64,
}

impl ChartAngles {
    pub fn from_asc_mc(ascendant: f64, midheaven: f64) -> ChartAngles {
        ChartAngles {
            ascendant: normalize_deg(ascendant),
            midheaven: normalize_deg(midheaven),
            descendant: normalize_deg(ascendant + 180.0),
            imum_coeli: normalize_deg(midheaven + 180.0),
        }
    }
}

/// Everything that identifies one calculation moment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartMoment {
    /// The resolved UT instant.
    pub instant: DateTime<Utc>,
    /// Original local offset, minutes east of Greenwich. Display metadata
    /// only; all computation runs on `instant`.
    pub utc_offset_minutes: i32,
    pub location: GeoLocation,
    pub house_system: HouseSystem,
}

/// Immutable result of one chart calculation.
///
/// Created once, then read-only; derived calculations produce new
/// snapshots rather than mutating this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSnapshot {
    pub moment: ChartMoment,
    /// Positions in planet priority order.
    pub planets: Vec<PlanetPosition>,
    /// Exactly 12 cusps, house 1 first.
    pub cusps: Vec<HouseCusp>,
    pub angles: ChartAngles,
    /// Natal aspects ordered tightest-first.
    pub aspects: Vec<Aspect>,
    /// Planet-to-angle aspects (ascendant, midheaven).
    pub angle_aspects: Vec<AngleAspect>,
    /// Which ephemeris path produced the underlying positions.
    pub source: PositionSource,
}

impl ChartSnapshot {
    pub fn planet(&self, planet: Planet) -> Option<&PlanetPosition> {
        self.planets.iter().find(|p| p.planet == planet)
    }

    pub fn cusp(&self, number: u8) -> Option<&HouseCusp> {
        self.cusps.iter().find(|c| c.number == number)
    }
}
