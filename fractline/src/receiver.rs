//! Bar input for a `FractalContext`.
//!
//! This module is responsible for:
//! - feeding bars one at a time or in batches through `DataReceiver`;
//! - loading bars from CSV files, dropping rows that do not advance in time;
//! - parsing the datetime layouts found in exported bar files.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use crate::bar::{Bar, BarSeries};
use crate::config::FractalOptions;
use crate::constant::Timeframe;
use crate::context::FractalContext;
use crate::error::{DataError, DetectorError, IngestError, RegisterError};

/// Drives a `FractalContext` with stored or streamed bars.
pub struct DataReceiver {
    context: FractalContext,
}

impl DataReceiver {
    pub fn new(context: FractalContext) -> Self {
        Self { context }
    }

    pub fn register_timeframe(&mut self, timeframe: Timeframe, options: FractalOptions) -> Result<(), DataError> {
        self.context.register(timeframe, options)
    }

    /// Feeds one newly opened bar. Returns the number of fractals confirmed.
    pub fn ingest_bar(&mut self, timeframe: Timeframe, bar: Bar) -> Result<usize, DetectorError> {
        self.context.append(timeframe, bar)
    }

    pub fn ingest_batch(&mut self, timeframe: Timeframe, bars: Vec<Bar>) -> Result<usize, DetectorError> {
        let mut found = 0usize;
        for bar in bars {
            found += self.ingest_bar(timeframe, bar)?;
        }
        Ok(found)
    }

    /// Streams every row of a CSV file through the detector, bar by bar.
    /// Returns the number of fractals confirmed, like `ingest_batch`.
    pub fn ingest_csv(&mut self, file_path: impl AsRef<Path>, timeframe: Timeframe) -> Result<usize, IngestError> {
        let bars = load_bars(file_path)?;
        let count = bars.len();
        let found = self.ingest_batch(timeframe, bars)?;
        info!(timeframe = timeframe.as_str(), bars = count, fractals = found, "csv ingested");
        Ok(found)
    }

    /// Registers `timeframe` over the whole CSV history in one replay.
    pub fn register_csv_history(
        &mut self,
        file_path: impl AsRef<Path>,
        timeframe: Timeframe,
        options: FractalOptions,
    ) -> Result<usize, RegisterError> {
        let bars = load_bars(file_path)?;
        self.context
            .register_with_history(timeframe, options, BarSeries::from_bars(bars))
    }

    pub fn context(&self) -> &FractalContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut FractalContext {
        &mut self.context
    }

    pub fn into_context(self) -> FractalContext {
        self.context
    }
}

#[derive(Debug, Deserialize)]
struct CsvBarRow {
    #[serde(alias = "time", alias = "open_time")]
    datetime: String,
    #[serde(alias = "open")]
    open_price: f64,
    #[serde(alias = "high")]
    high_price: f64,
    #[serde(alias = "low")]
    low_price: f64,
    #[serde(alias = "close")]
    close_price: f64,
    #[serde(default)]
    volume: f64,
}

/// Reads bars from a CSV file with a header row. Rows whose open time does not
/// advance past the previous row are dropped.
pub fn load_bars(file_path: impl AsRef<Path>) -> Result<Vec<Bar>, DataError> {
    let mut reader = csv::Reader::from_path(file_path)?;
    let mut out: Vec<Bar> = Vec::new();

    for row in reader.deserialize::<CsvBarRow>() {
        let row = row?;
        let datetime = parse_datetime(&row.datetime)?;
        if let Some(last) = out.last() {
            if datetime <= last.datetime {
                warn!(datetime = %datetime, previous = %last.datetime, "skipping out-of-order bar");
                continue;
            }
        }
        out.push(Bar {
            datetime,
            open_price: row.open_price,
            high_price: row.high_price,
            low_price: row.low_price,
            close_price: row.close_price,
            volume: row.volume,
        });
    }

    Ok(out)
}

pub fn parse_datetime(value: &str) -> Result<DateTime<Utc>, DataError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    let patterns = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y/%m/%d %H:%M:%S%.f",
        "%d.%m.%Y %H:%M:%S%.f",
        "%Y%m%d%H%M%S%.f",
    ];

    for pattern in patterns {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, pattern) {
            return Ok(DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc));
        }
    }

    Err(DataError::InvalidDatetime(value.to_string()))
}
