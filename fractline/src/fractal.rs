use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::constant::Side;

/// Position of a fractal inside its owning chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FractalId(pub(crate) usize);

impl FractalId {
    pub fn position(self) -> usize {
        self.0
    }
}

/// A confirmed local extremum. Immutable once appended to a chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Fractal {
    /// Bar index of the extremum (middle bar of the detection window).
    pub index: usize,
    pub datetime: DateTime<Utc>,
    /// High of the bar for a high fractal, low for a low fractal.
    pub value: f64,
    pub side: Side,
    /// Identifier of the detector that produced the fractal, used for naming.
    pub prefix: Arc<str>,
    /// Fractal appended immediately before this one, whatever its side.
    pub previous: Option<FractalId>,
}

impl Fractal {
    pub fn new(index: usize, datetime: DateTime<Utc>, value: f64, side: Side, prefix: Arc<str>) -> Self {
        Self {
            index,
            datetime,
            value,
            side,
            prefix,
            previous: None,
        }
    }

    /// Stable object name for renderers, e.g. `h1-42-high`.
    pub fn label(&self) -> String {
        format!("{}-{}-{}", self.prefix, self.index, self.side.as_str())
    }
}
