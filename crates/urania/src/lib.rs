//! Astrological chart computation core.
//!
//! Converts a moment and a location into planetary positions, house cusps,
//! and aspects; scans transits across date ranges; derives solar returns,
//! secondary progressions, and annual profections from a natal chart.
//! Raw positions come from an external ephemeris engine with a documented
//! low-precision analytical fallback.

pub mod angles;
pub mod aspects;
pub mod chart;
pub mod config;
pub mod derived;
pub mod ephemeris;
pub mod error;
pub mod houses;
pub mod timing;
pub mod transit;

pub use aspects::{AngleAspect, AngleKind, Aspect, AspectConfig, AspectType};
pub use chart::{ChartAssembler, ChartMoment, ChartSnapshot, ZodiacSign};
pub use config::{CoreConfig, EngineConfig};
pub use ephemeris::{
    BodyPositions, EphemerisAdapter, EphemerisSource, GeoLocation, Planet, PositionSource,
    RawPosition,
};
pub use error::ChartError;
pub use houses::HouseSystem;
pub use transit::{ScanConfig, TrackedAspect, TransitScanner, TransitSeries};
