use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::ephemeris::Planet;

/// Aspect types, majors first. Minor aspects are only considered when the
/// configuration enables them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AspectType {
    Conjunction,
    Sextile,
    Square,
    Trine,
    Opposition,
    SemiSextile,
    SemiSquare,
    Quincunx,
}

impl AspectType {
    pub const MAJOR: [AspectType; 5] = [
        AspectType::Conjunction,
        AspectType::Sextile,
        AspectType::Square,
        AspectType::Trine,
        AspectType::Opposition,
    ];

    pub const MINOR: [AspectType; 3] = [
        AspectType::SemiSextile,
        AspectType::SemiSquare,
        AspectType::Quincunx,
    ];

    /// Exact angle in degrees.
    pub fn exact_angle(&self) -> f64 {
        match self {
            AspectType::Conjunction => 0.0,
            AspectType::SemiSextile => 30.0,
            AspectType::SemiSquare => 45.0,
            AspectType::Sextile => 60.0,
            AspectType::Square => 90.0,
            AspectType::Trine => 120.0,
            AspectType::Quincunx => 150.0,
            AspectType::Opposition => 180.0,
        }
    }

    /// Default maximum orb in degrees.
    pub fn default_orb(&self) -> f64 {
        match self {
            AspectType::Conjunction | AspectType::Opposition => 8.0,
            AspectType::Trine => 7.0,
            AspectType::Square => 6.0,
            AspectType::Sextile => 4.0,
            AspectType::SemiSextile | AspectType::SemiSquare | AspectType::Quincunx => 2.0,
        }
    }

    pub fn is_minor(&self) -> bool {
        AspectType::MINOR.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectType::Conjunction => "conjunction",
            AspectType::SemiSextile => "semi_sextile",
            AspectType::SemiSquare => "semi_square",
            AspectType::Sextile => "sextile",
            AspectType::Square => "square",
            AspectType::Trine => "trine",
            AspectType::Quincunx => "quincunx",
            AspectType::Opposition => "opposition",
        }
    }

    pub fn from_identifier(id: &str) -> Option<AspectType> {
        AspectType::MAJOR
            .iter()
            .chain(AspectType::MINOR.iter())
            .copied()
            .find(|t| t.as_str() == id)
    }
}

impl fmt::Display for AspectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orb table and aspect-type selection for the detector.
///
/// External configuration, not a hardcoded constant: per-type orbs can be
/// overridden and minor aspects toggled without touching the detector.
#[derive(Debug, Clone)]
pub struct AspectConfig {
    /// Per-type max orb overrides; anything absent falls back to the
    /// type default.
    pub orb_overrides: HashMap<AspectType, f64>,
    pub include_minor: bool,
}

impl Default for AspectConfig {
    fn default() -> Self {
        AspectConfig {
            orb_overrides: HashMap::new(),
            include_minor: false,
        }
    }
}

impl AspectConfig {
    /// Max orb for a type, or None when the type is not in play.
    pub fn max_orb(&self, kind: AspectType) -> Option<f64> {
        if kind.is_minor() && !self.include_minor {
            return None;
        }
        Some(
            self.orb_overrides
                .get(&kind)
                .copied()
                .unwrap_or_else(|| kind.default_orb()),
        )
    }

    /// Aspect types in play, majors first.
    pub fn enabled_types(&self) -> Vec<AspectType> {
        let mut types: Vec<AspectType> = AspectType::MAJOR.to_vec();
        if self.include_minor {
            types.extend(AspectType::MINOR);
        }
        types
    }

    /// Largest configured orb, used by the scanner as its series ceiling.
    pub fn widest_orb(&self) -> f64 {
        self.enabled_types()
            .into_iter()
            .filter_map(|t| self.max_orb(t))
            .fold(0.0, f64::max)
    }
}

/// A detected aspect between two bodies.
///
/// The pair is unordered; it is stored with the higher-priority body first
/// so identical inputs always produce identical output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aspect {
    pub first: Planet,
    pub second: Planet,
    pub kind: AspectType,
    /// Absolute deviation from the exact angle, shortest arc, in degrees.
    pub orb: f64,
    /// Whether the pair is closing on the exact angle. None when either
    /// body's speed is unavailable; the flag is never guessed.
    pub applying: Option<bool>,
    /// Within 0.1 degrees of exact.
    pub exact: bool,
}

impl fmt::Display for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} (orb {:.2})",
            self.first, self.kind, self.second, self.orb
        )
    }
}

/// The two aspectable chart angles.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AngleKind {
    Ascendant,
    Midheaven,
}

impl AngleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AngleKind::Ascendant => "ascendant",
            AngleKind::Midheaven => "midheaven",
        }
    }
}

impl fmt::Display for AngleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An aspect between a planet and a chart angle. Angles are derived
/// points with no motion of their own, so the applying flag follows the
/// planet's speed alone (absent when that speed is unknown).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngleAspect {
    pub planet: Planet,
    pub angle: AngleKind,
    pub kind: AspectType,
    pub orb: f64,
    pub applying: Option<bool>,
    pub exact: bool,
}

impl fmt::Display for AngleAspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} (orb {:.2})",
            self.planet, self.kind, self.angle, self.orb
        )
    }
}
