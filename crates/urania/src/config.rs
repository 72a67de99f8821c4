//! Engine and aspect configuration.
//!
//! Everything here is an explicitly passed object: the adapter, detector,
//! and scanner all take their configuration as arguments so tests can
//! substitute doubles. A TOML file can override the defaults.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::aspects::{AspectConfig, AspectType};

/// External ephemeris engine invocation settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Program to invoke for positions.
    pub program: PathBuf,
    /// Extra arguments prepended before the computed ones.
    pub extra_args: Vec<String>,
    /// Hard ceiling on a single engine invocation.
    pub timeout: Duration,
    /// Whether the analytical fallback may stand in for a failed engine.
    pub allow_fallback: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            program: PathBuf::from("swetest"),
            extra_args: Vec::new(),
            timeout: Duration::from_millis(3000),
            allow_fallback: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct EngineToml {
    #[serde(default)]
    program: Option<PathBuf>,
    #[serde(default)]
    extra_args: Vec<String>,
    #[serde(default = "default_timeout_ms")]
    timeout_ms: u64,
    #[serde(default = "default_true")]
    allow_fallback: bool,
}

fn default_timeout_ms() -> u64 {
    3000
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
struct RootToml {
    #[serde(default)]
    engine: Option<EngineToml>,
    /// Per-aspect orb overrides keyed by identifier ("trine" -> 7.0).
    #[serde(default)]
    orbs: HashMap<String, f64>,
    #[serde(default)]
    include_minor_aspects: bool,
}

/// Full core configuration: engine + detector settings.
#[derive(Debug, Clone, Default)]
pub struct CoreConfig {
    pub engine: EngineConfig,
    pub aspects: AspectConfig,
}

impl CoreConfig {
    /// Load from a TOML file. Unknown orb identifiers are rejected rather
    /// than silently ignored.
    pub fn load(path: &Path) -> anyhow::Result<CoreConfig> {
        let text = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("could not read config {}: {e}", path.display()))?;
        CoreConfig::parse(&text)
    }

    pub fn parse(text: &str) -> anyhow::Result<CoreConfig> {
        let root: RootToml =
            toml::from_str(text).map_err(|e| anyhow::anyhow!("bad config: {e}"))?;

        let mut engine = EngineConfig::default();
        if let Some(e) = root.engine {
            if let Some(program) = e.program {
                engine.program = program;
            }
            engine.extra_args = e.extra_args;
            engine.timeout = Duration::from_millis(e.timeout_ms);
            engine.allow_fallback = e.allow_fallback;
        }

        let mut orb_overrides = HashMap::new();
        for (key, orb) in root.orbs {
            let kind = AspectType::from_identifier(&key)
                .ok_or_else(|| anyhow::anyhow!("unknown aspect type in [orbs]: {key}"))?;
            if !orb.is_finite() || orb < 0.0 {
                anyhow::bail!("bad orb for {key}: {orb}");
            }
            orb_overrides.insert(kind, orb);
        }

        Ok(CoreConfig {
            engine,
            aspects: AspectConfig {
                orb_overrides,
                include_minor: root.include_minor_aspects,
            },
        })
    }
}
