pub mod adapter;
pub mod engine;
pub mod fallback;
pub mod types;

pub use adapter::{EphemerisAdapter, EphemerisSource};
pub use types::{BodyPositions, GeoLocation, Planet, PositionSource, RawPosition};
