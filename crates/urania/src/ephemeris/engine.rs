//! External ephemeris engine invocation.
//!
//! The engine is a separate program spoken to over a command/argument
//! contract: UT instant, geographic coordinates, and the requested bodies
//! go in; one line of `name longitude latitude distance [speed]` per body
//! comes out on stdout. Non-zero exit, timeout, and short or garbled
//! output are all hard errors here; the adapter decides whether the
//! analytical fallback may stand in.

use chrono::{DateTime, SecondsFormat, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::ephemeris::types::{GeoLocation, Planet, RawPosition};
use crate::error::ChartError;

/// Poll interval while waiting for the child to exit.
const WAIT_POLL: Duration = Duration::from_millis(10);

lazy_static! {
    /// `name lon lat dist [speed]`, whitespace separated.
    static ref OUTPUT_LINE: Regex = Regex::new(
        r"^\s*([a-z_]+)\s+(-?\d+(?:\.\d+)?)\s+(-?\d+(?:\.\d+)?)\s+(-?\d+(?:\.\d+)?)(?:\s+(-?\d+(?:\.\d+)?))?\s*$"
    )
    .expect("engine output regex");
}

/// Run the configured engine for one instant and parse its output.
pub fn query(
    config: &EngineConfig,
    instant: DateTime<Utc>,
    location: &GeoLocation,
    bodies: &[Planet],
) -> Result<BTreeMap<Planet, RawPosition>, ChartError> {
    let body_list = bodies
        .iter()
        .map(Planet::as_str)
        .collect::<Vec<_>>()
        .join(",");

    let mut command = Command::new(&config.program);
    command
        .args(&config.extra_args)
        .arg("--ut")
        .arg(instant.to_rfc3339_opts(SecondsFormat::Secs, true))
        .arg("--lat")
        .arg(format!("{:.6}", location.latitude))
        .arg("--lon")
        .arg(format!("{:.6}", location.longitude))
        .arg("--bodies")
        .arg(&body_list)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command.spawn().map_err(|e| {
        ChartError::EphemerisUnavailable(format!(
            "could not launch {}: {e}",
            config.program.display()
        ))
    })?;

    let status = wait_with_timeout(&mut child, config.timeout)?;

    let mut stdout = String::new();
    if let Some(mut out) = child.stdout.take() {
        out.read_to_string(&mut stdout).map_err(|e| {
            ChartError::EphemerisUnavailable(format!("could not read engine output: {e}"))
        })?;
    }

    if !status.success() {
        let mut stderr = String::new();
        if let Some(mut err) = child.stderr.take() {
            let _ = err.read_to_string(&mut stderr);
        }
        return Err(ChartError::EphemerisUnavailable(format!(
            "engine exited with {status}: {}",
            stderr.trim()
        )));
    }

    parse_output(&stdout, bodies)
}

/// Wait for the child, killing it when the deadline passes. A timeout is an
/// error, never a hang.
fn wait_with_timeout(
    child: &mut std::process::Child,
    timeout: Duration,
) -> Result<std::process::ExitStatus, ChartError> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ChartError::EphemerisUnavailable(format!(
                        "engine timed out after {} ms",
                        timeout.as_millis()
                    )));
                }
                std::thread::sleep(WAIT_POLL);
            }
            Err(e) => {
                return Err(ChartError::EphemerisUnavailable(format!(
                    "could not wait on engine: {e}"
                )))
            }
        }
    }
}

/// Parse line-oriented engine output into typed positions.
///
/// Every requested body must appear; an unparseable line or a missing body
/// is a `ComputationError` naming the offender.
pub fn parse_output(
    stdout: &str,
    requested: &[Planet],
) -> Result<BTreeMap<Planet, RawPosition>, ChartError> {
    if stdout.trim().is_empty() {
        return Err(ChartError::EphemerisUnavailable(
            "engine produced no output".to_string(),
        ));
    }

    let mut positions = BTreeMap::new();
    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let caps = OUTPUT_LINE.captures(line).ok_or_else(|| {
            ChartError::computation("ephemeris", format!("malformed engine line: {line:?}"))
        })?;
        let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let planet = match Planet::from_identifier(name) {
            Some(p) => p,
            // Engines may report more bodies than we asked for.
            None => continue,
        };
        let longitude = parse_field(&caps, 2, planet, "longitude")?;
        let latitude = parse_field(&caps, 3, planet, "latitude")?;
        let distance = parse_field(&caps, 4, planet, "distance")?;
        let speed = match caps.get(5) {
            Some(m) => Some(m.as_str().parse::<f64>().map_err(|_| {
                ChartError::computation(
                    "ephemeris",
                    format!("bad speed for {planet}: {:?}", m.as_str()),
                )
            })?),
            None => None,
        };
        positions.insert(
            planet,
            RawPosition {
                longitude: longitude.rem_euclid(360.0),
                latitude,
                distance,
                speed,
            },
        );
    }

    for planet in requested {
        if !positions.contains_key(planet) {
            return Err(ChartError::computation(
                "ephemeris",
                format!("engine output is missing {planet}"),
            ));
        }
    }

    Ok(positions)
}

fn parse_field(
    caps: &regex::Captures<'_>,
    index: usize,
    planet: Planet,
    field: &str,
) -> Result<f64, ChartError> {
    let text = caps.get(index).map(|m| m.as_str()).unwrap_or_default();
    text.parse::<f64>().map_err(|_| {
        ChartError::computation("ephemeris", format!("bad {field} for {planet}: {text:?}"))
    })
}
