use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aspects::AspectType;
use crate::ephemeris::Planet;

/// One (transiting planet, natal planet, aspect type) combination to
/// follow through a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedAspect {
    pub transiting: Planet,
    pub natal: Planet,
    pub kind: AspectType,
}

impl TrackedAspect {
    pub fn label(&self) -> String {
        format!("{}_{}_{}", self.transiting, self.kind, self.natal)
    }
}

/// An exact-aspect hit: the deviation changed sign between two steps.
/// `refined` is only present when bisection refinement was requested.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExactCrossing {
    pub step_before: usize,
    pub step_after: usize,
    pub refined: Option<DateTime<Utc>>,
}

/// Samples for one tracked combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSeries {
    pub track: TrackedAspect,
    /// One signed orb deviation per step; None marks an ephemeris gap or a
    /// deviation beyond the plotting ceiling.
    pub samples: Vec<Option<f64>>,
    pub crossings: Vec<ExactCrossing>,
}

/// Result of a ranged transit scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitSeries {
    /// Step instants, calendar days apart at a fixed wall-clock time.
    pub instants: Vec<DateTime<Utc>>,
    pub step_days: i64,
    /// Ceiling applied to every track so series plot on one scale.
    pub ceiling: f64,
    pub tracks: Vec<TrackSeries>,
}

/// Scanner knobs.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Calendar days per step.
    pub step_days: i64,
    /// Deviations beyond this many degrees are recorded as absent.
    pub ceiling: f64,
    /// Bisect sign changes down to `refine_tolerance_days`.
    pub refine_exact: bool,
    pub refine_tolerance_days: f64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            step_days: 1,
            ceiling: 10.0,
            refine_exact: false,
            refine_tolerance_days: 1.0 / 1440.0,
        }
    }
}
