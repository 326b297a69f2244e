//! Per-timeframe fractal detectors for one symbol.
//!
//! This module is responsible for:
//! - exposing the `FractalContext` API, one independent detector per timeframe;
//! - registering detectors empty, over existing history, or from a profile;
//! - forwarding new bars, subscriptions and last-fractal queries;
//! - writing parquet snapshots of a timeframe's chain.

use std::collections::BTreeMap;
use std::fs::{File, create_dir_all};
use std::path::Path;

use polars::prelude::ParquetWriter;
use tracing::info;

use crate::bar::{Bar, BarSeries};
use crate::chain::FractalChain;
use crate::config::{FractalOptions, FractalProfileConfig};
use crate::constant::Timeframe;
use crate::detector::FractalDetector;
use crate::error::{DataError, DetectorError, ListenerError, RegisterError};
use crate::events::{FractalEvent, SubscriptionId};
use crate::fractal::{Fractal, FractalId};

pub struct FractalContext {
    symbol: String,
    detectors: BTreeMap<Timeframe, FractalDetector<BarSeries>>,
}

impl FractalContext {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            detectors: BTreeMap::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Registers an empty detector; a timeframe already registered is kept as is.
    pub fn register(&mut self, timeframe: Timeframe, options: FractalOptions) -> Result<(), DataError> {
        if self.detectors.contains_key(&timeframe) {
            return Ok(());
        }
        let detector = FractalDetector::new(BarSeries::new(), options, timeframe.as_str())?;
        self.detectors.insert(timeframe, detector);
        Ok(())
    }

    /// Registers a detector over existing history and replays it. Returns the
    /// number of fractals found in the history. A timeframe that is already
    /// registered is left untouched and reported as `AlreadyRegistered`.
    pub fn register_with_history(
        &mut self,
        timeframe: Timeframe,
        options: FractalOptions,
        history: BarSeries,
    ) -> Result<usize, RegisterError> {
        if self.detectors.contains_key(&timeframe) {
            return Err(RegisterError::AlreadyRegistered(timeframe));
        }
        let mut detector = FractalDetector::new(history, options, timeframe.as_str())?;
        let found = detector.replay()?;
        info!(
            symbol = %self.symbol,
            timeframe = timeframe.as_str(),
            period = detector.options().period,
            fractals = found,
            "fractal detector registered"
        );
        self.detectors.insert(timeframe, detector);
        Ok(found)
    }

    /// Registers every timeframe with options resolved from `profile`.
    pub fn register_profile(
        &mut self,
        timeframes: &[Timeframe],
        profile: &FractalProfileConfig,
    ) -> Result<(), DataError> {
        for timeframe in timeframes {
            self.register(*timeframe, profile.resolve_for(*timeframe)?)?;
        }
        Ok(())
    }

    pub fn timeframes(&self) -> Vec<Timeframe> {
        self.detectors.keys().copied().collect()
    }

    /// Feeds a newly opened bar to the timeframe's detector. Unregistered
    /// timeframes are ignored.
    pub fn append(&mut self, timeframe: Timeframe, bar: Bar) -> Result<usize, DetectorError> {
        match self.detectors.get_mut(&timeframe) {
            Some(detector) => detector.push_bar(bar),
            None => Ok(0),
        }
    }

    pub fn subscribe<F>(&mut self, timeframe: Timeframe, listener: F) -> Option<SubscriptionId>
    where
        F: Fn(&FractalEvent, &FractalChain) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.detectors
            .get_mut(&timeframe)
            .map(|detector| detector.on_fractal(listener))
    }

    pub fn unsubscribe(&mut self, timeframe: Timeframe, id: SubscriptionId) -> bool {
        self.detectors
            .get_mut(&timeframe)
            .is_some_and(|detector| detector.remove_listener(id))
    }

    pub fn detector(&self, timeframe: Timeframe) -> Option<&FractalDetector<BarSeries>> {
        self.detectors.get(&timeframe)
    }

    pub fn detector_mut(&mut self, timeframe: Timeframe) -> Option<&mut FractalDetector<BarSeries>> {
        self.detectors.get_mut(&timeframe)
    }

    pub fn count(&self, timeframe: Timeframe) -> usize {
        self.detectors
            .get(&timeframe)
            .map(|d| d.source().all_rows().len())
            .unwrap_or(0)
    }

    pub fn get_fractal_window(&self, timeframe: Timeframe, length: usize) -> Vec<Fractal> {
        self.detectors
            .get(&timeframe)
            .map(|d| d.chain().last_n(length).to_vec())
            .unwrap_or_default()
    }

    pub fn get_last_high_fractal(&self, timeframe: Timeframe, best: bool) -> Option<&Fractal> {
        let detector = self.detectors.get(&timeframe)?;
        detector.last_high_fractal(best).and_then(|id| detector.fractal(id))
    }

    pub fn get_last_low_fractal(&self, timeframe: Timeframe, best: bool) -> Option<&Fractal> {
        let detector = self.detectors.get(&timeframe)?;
        detector.last_low_fractal(best).and_then(|id| detector.fractal(id))
    }

    pub fn get_last_fractal(&self, timeframe: Timeframe, best: bool) -> Option<(FractalId, &Fractal)> {
        let detector = self.detectors.get(&timeframe)?;
        let id = detector.last_fractal(best)?;
        detector.fractal(id).map(|f| (id, f))
    }

    pub fn write_parquet_snapshot(
        &self,
        timeframe: Timeframe,
        output_dir: impl AsRef<Path>,
    ) -> Result<(), DataError> {
        let Some(detector) = self.detectors.get(&timeframe) else {
            return Ok(());
        };
        let output_dir = output_dir.as_ref();
        create_dir_all(output_dir)?;

        let path = output_dir.join(format!("fractal_{}.parquet", timeframe.as_str()));
        let mut file = File::create(&path)?;
        let mut frame = detector.chain().dataframe()?;
        ParquetWriter::new(&mut file).finish(&mut frame)?;
        info!(path = %path.display(), rows = frame.height(), "fractal snapshot written");
        Ok(())
    }
}
