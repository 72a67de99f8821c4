pub mod detector;
pub mod types;

pub use detector::{between, detect_between, detect_natal, detect_to_angles};
pub use types::{AngleAspect, AngleKind, Aspect, AspectConfig, AspectType};
