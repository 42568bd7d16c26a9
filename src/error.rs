//! Error types for the property-scout pipeline.
//!
//! Only [`ScoutError::Configuration`] and [`ScoutError::Cancelled`] end a
//! run early. Everything else is recovered at the narrowest scope: per
//! strategy, per record or per signal. [`ScoutError::Output`] comes from
//! report sinks once the run is over.

/// Errors raised while searching, enriching or reporting listings.
#[derive(Debug, thiserror::Error)]
pub enum ScoutError {
    /// No region identifier could be resolved for a location.
    #[error("region resolution failed: {0}")]
    Resolution(String),

    /// An upstream provider failed (network, timeout, unparsable payload).
    #[error("provider failure: {0}")]
    Provider(String),

    /// A single listing record could not be mapped.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// Invalid criteria or pipeline configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The run was interrupted before it could produce results.
    #[error("run cancelled")]
    Cancelled,

    /// A report sink could not write its output.
    #[error("report output failed: {0}")]
    Output(String),
}

impl ScoutError {
    /// Whether the pipeline may continue after this error by moving on to
    /// the next strategy, record or signal.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ScoutError::Resolution(_) | ScoutError::Provider(_) | ScoutError::MalformedRecord(_)
        )
    }
}

impl From<reqwest::Error> for ScoutError {
    fn from(err: reqwest::Error) -> Self {
        ScoutError::Provider(err.to_string())
    }
}

impl From<serde_json::Error> for ScoutError {
    fn from(err: serde_json::Error) -> Self {
        ScoutError::Provider(format!("invalid JSON payload: {err}"))
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ScoutError>;
