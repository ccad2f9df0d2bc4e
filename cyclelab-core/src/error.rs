//! Engine error type.
//!
//! Decision calls never surface these to their caller; they are logged and
//! replaced by a safe default. Construction paths (history, config) return them.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("candle timestamp {next} is not after the last candle ({last}) for {pair}")]
    NonMonotonicTimestamp {
        pair: String,
        last: DateTime<Utc>,
        next: DateTime<Utc>,
    },

    #[error("unknown pair: {0}")]
    UnknownPair(String),

    #[error("no indicator rows published for {0}")]
    EmptyFrame(String),

    #[error("non-finite input for {field}: {value}")]
    NonFiniteInput { field: &'static str, value: f64 },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid timeframe: {0}")]
    InvalidTimeframe(String),

    #[error("informative data unavailable for {pair}: {reason}")]
    Informative { pair: String, reason: String },

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reject NaN/inf before it reaches a ratio.
pub fn ensure_finite(field: &'static str, value: f64) -> Result<f64, EngineError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EngineError::NonFiniteInput { field, value })
    }
}
