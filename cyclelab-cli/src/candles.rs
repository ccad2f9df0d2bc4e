//! Candle CSV loading.
//!
//! Expected header: `timestamp,open,high,low,close,volume`. Timestamps are
//! RFC 3339 (`2024-03-04T00:05:00Z`) or integer Unix milliseconds.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use cyclelab_core::domain::{Candle, CandleHistory, Timeframe};
use cyclelab_core::{EngineError, InformativeSource};

#[derive(Debug, Deserialize)]
struct CandleRecord {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ms) = raw.parse::<i64>() {
        return Utc
            .timestamp_millis_opt(ms)
            .single()
            .with_context(|| format!("timestamp out of range: {raw}"));
    }
    let parsed = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("invalid timestamp: {raw}"))?;
    Ok(parsed.with_timezone(&Utc))
}

pub fn read_candles(path: &Path) -> Result<Vec<Candle>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut candles = Vec::new();
    for (line, record) in reader.deserialize::<CandleRecord>().enumerate() {
        let record = record.with_context(|| format!("{}: bad row {}", path.display(), line + 2))?;
        candles.push(Candle {
            timestamp: parse_timestamp(&record.timestamp)?,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
        });
    }
    Ok(candles)
}

/// Load a candle file into an append-only history.
pub fn load_history(path: &Path, pair: &str, timeframe: Timeframe) -> Result<CandleHistory> {
    let candles = read_candles(path)?;
    tracing::info!(pair, path = %path.display(), candles = candles.len(), "loaded candles");
    CandleHistory::from_candles(pair, timeframe, candles)
        .with_context(|| format!("{} is not a valid candle history", path.display()))
}

/// Higher-timeframe candles read from a file on every fetch.
pub struct CsvInformative {
    path: PathBuf,
}

impl CsvInformative {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl InformativeSource for CsvInformative {
    fn informative(&self, pair: &str, _timeframe: Timeframe) -> Result<Vec<Candle>, EngineError> {
        read_candles(&self.path).map_err(|e| EngineError::Informative {
            pair: pair.to_string(),
            reason: format!("{e:#}"),
        })
    }
}
