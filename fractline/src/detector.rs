//! Sliding-window fractal detection over one bar source.
//!
//! A bar is a high fractal when no bar within `period / 2` bars on either side
//! has a strictly greater high, and a low fractal when none has a strictly
//! lower low. Both may hold for the same bar.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::bar::{Bar, BarSeries, BarSource, ensure_history};
use crate::chain::FractalChain;
use crate::config::FractalOptions;
use crate::constant::Side;
use crate::error::{DataError, DetectorError, ListenerError};
use crate::events::{FractalEvent, Listener, Listeners, SubscriptionId};
use crate::fractal::{Fractal, FractalId};

pub struct FractalDetector<S: BarSource> {
    source: S,
    options: FractalOptions,
    prefix: Arc<str>,
    chain: FractalChain,
    listeners: Listeners,
}

impl<S: BarSource> FractalDetector<S> {
    pub fn new(source: S, options: FractalOptions, prefix: impl Into<Arc<str>>) -> Result<Self, DataError> {
        options.validate()?;
        Ok(Self {
            source,
            options,
            prefix: prefix.into(),
            chain: FractalChain::new(),
            listeners: Listeners::default(),
        })
    }

    pub fn options(&self) -> &FractalOptions {
        &self.options
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn chain(&self) -> &FractalChain {
        &self.chain
    }

    pub fn fractal(&self, id: FractalId) -> Option<&Fractal> {
        self.chain.get(id)
    }

    /// Bar the detection window is centred on when scanning `index`.
    /// Saturates at 0 for indices inside the first half window.
    pub fn middle_index(&self, index: usize) -> usize {
        index.saturating_sub(self.options.half_period())
    }

    /// Tests the window ending at `index` for a low and then a high fractal,
    /// appending and announcing each hit. Returns the number of fractals found.
    ///
    /// Indices below `period` are skipped. Callers scan every index once, in
    /// increasing order; listener failures abort the scan and propagate.
    pub fn process_index(&mut self, index: usize) -> Result<usize, DetectorError> {
        if index < self.options.period {
            return Ok(0);
        }
        let len = self.source.len();
        if index >= len {
            return Err(DetectorError::IndexOutOfRange { index, len });
        }

        let middle = self.middle_index(index);
        let mut found = 0usize;
        for side in [Side::Low, Side::High] {
            if self.is_fractal(middle, side) {
                self.emit(index, middle, side)?;
                found += 1;
            }
        }
        Ok(found)
    }

    fn is_fractal(&self, middle: usize, side: Side) -> bool {
        let half = self.options.half_period();
        let Some(candidate) = self.source.get(middle).map(|bar| side_value(bar, side)) else {
            return false;
        };
        (middle - half..=middle + half).all(|i| {
            self.source
                .get(i)
                .is_some_and(|bar| side.not_worse(candidate, side_value(bar, side)))
        })
    }

    fn emit(&mut self, scan_index: usize, middle: usize, side: Side) -> Result<(), DetectorError> {
        let len = self.source.len();
        let bar = self
            .source
            .get(middle)
            .ok_or(DetectorError::IndexOutOfRange { index: middle, len })?;
        let fractal = Fractal::new(
            middle,
            bar.datetime,
            side_value(bar, side),
            side,
            Arc::clone(&self.prefix),
        );
        let fractal_id = self.chain.append(fractal);
        let Some(fractal) = self.chain.get(fractal_id).cloned() else {
            return Ok(());
        };

        debug!(
            prefix = %self.prefix,
            scan_index,
            index = fractal.index,
            side = side.as_str(),
            value = fractal.value,
            kind = self.chain.kind(fractal_id).as_str(),
            "fractal detected"
        );

        let event = FractalEvent {
            scan_index,
            fractal_id,
            fractal,
        };
        self.listeners.notify(&event, &self.chain)?;
        Ok(())
    }

    /// Host hook for a newly opened bar: `count` bars are loaded and the last one
    /// is still forming, so the last closed bar (`count - 2`) is scanned.
    pub fn on_bar_opened(&mut self, count: usize) -> Result<usize, DetectorError> {
        match count.checked_sub(2) {
            Some(index) => self.process_index(index),
            None => Ok(0),
        }
    }

    /// Rebuilds the chain from scratch by replaying every loaded bar.
    pub fn replay(&mut self) -> Result<usize, DetectorError> {
        self.chain.clear();
        let len = self.source.len();
        let mut found = 0usize;
        for count in 1..=len {
            found += self.on_bar_opened(count)?;
        }
        info!(prefix = %self.prefix, bars = len, fractals = found, "fractal replay finished");
        Ok(found)
    }

    /// Loads older bars until the history reaches `since`, replaying if any
    /// were added. Returns the number of bars added.
    pub fn load_history_since(&mut self, since: DateTime<Utc>) -> Result<usize, DetectorError> {
        let added = ensure_history(&mut self.source, since);
        if added > 0 {
            self.reload()?;
        }
        Ok(added)
    }

    /// Prepending history shifts every bar index, so the chain is rebuilt.
    pub fn reload(&mut self) -> Result<usize, DetectorError> {
        info!(prefix = %self.prefix, "reloading fractals");
        self.replay()
    }

    pub fn last_high_fractal(&self, best: bool) -> Option<FractalId> {
        self.chain.last_of_side(Side::High, best)
    }

    pub fn last_low_fractal(&self, best: bool) -> Option<FractalId> {
        self.chain.last_of_side(Side::Low, best)
    }

    pub fn last_fractal(&self, best: bool) -> Option<FractalId> {
        self.chain.head(best)
    }

    pub fn on_fractal<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&FractalEvent, &FractalChain) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn on_fractal_shared(&mut self, listener: Listener) -> SubscriptionId {
        self.listeners.subscribe_shared(listener)
    }

    /// Removes exactly the listener registered under `id`; `false` if already gone.
    pub fn remove_listener(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl FractalDetector<BarSeries> {
    /// Appends a newly opened bar and scans the bar it closed.
    pub fn push_bar(&mut self, bar: Bar) -> Result<usize, DetectorError> {
        let count = self.source.push(bar);
        self.on_bar_opened(count)
    }
}

fn side_value(bar: &Bar, side: Side) -> f64 {
    match side {
        Side::High => bar.high_price,
        Side::Low => bar.low_price,
    }
}
