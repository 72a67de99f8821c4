use thiserror::Error;

/// Errors surfaced by chart computation.
#[derive(Error, Debug)]
pub enum ChartError {
    /// Caller supplied bad coordinates, an unresolvable timezone offset, or
    /// otherwise invalid input. Never retried.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The external ephemeris engine is missing, exited non-zero, or timed
    /// out, and the analytical fallback was not available.
    #[error("ephemeris engine unavailable: {0}")]
    EphemerisUnavailable(String),

    /// A computation produced output we cannot accept: malformed engine
    /// output, a non-converging house iteration, a broken cusp partition.
    #[error("{component}: {message}")]
    ComputationError {
        component: &'static str,
        message: String,
    },

    /// Unknown house system identifier.
    #[error("unsupported house system: {requested}. Valid systems: {valid:?}")]
    UnsupportedHouseSystem {
        requested: String,
        valid: Vec<&'static str>,
    },

    /// A referenced chart or entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

impl ChartError {
    pub fn computation(component: &'static str, message: impl Into<String>) -> Self {
        ChartError::ComputationError {
            component,
            message: message.into(),
        }
    }
}
