use std::fmt::{Display, Formatter};

use crate::constant::Timeframe;

#[derive(Debug)]
pub enum DataError {
    InvalidTimeframe(String),
    InvalidDatetime(String),
    InvalidPeriod(usize),
    UnsupportedFormat(String),
    Io(std::io::Error),
    Csv(csv::Error),
    Yaml(serde_yaml::Error),
    Json(serde_json::Error),
    Polars(polars::error::PolarsError),
}

impl Display for DataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimeframe(v) => write!(f, "invalid timeframe: {v}"),
            Self::InvalidDatetime(v) => write!(f, "invalid datetime: {v}"),
            Self::InvalidPeriod(v) => write!(f, "invalid period: {v} (must be >= 5)"),
            Self::UnsupportedFormat(v) => write!(f, "unsupported file format: {v}"),
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::Csv(e) => write!(f, "csv error: {e}"),
            Self::Yaml(e) => write!(f, "yaml error: {e}"),
            Self::Json(e) => write!(f, "json error: {e}"),
            Self::Polars(e) => write!(f, "polars error: {e}"),
        }
    }
}

impl std::error::Error for DataError {}

impl From<std::io::Error> for DataError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for DataError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<serde_yaml::Error> for DataError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Yaml(value)
    }
}

impl From<serde_json::Error> for DataError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<polars::error::PolarsError> for DataError {
    fn from(value: polars::error::PolarsError) -> Self {
        Self::Polars(value)
    }
}

/// Error raised by a fractal listener. Carries a message only; listeners wrap
/// their own failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerError(pub String);

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl Display for ListenerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "listener failed: {}", self.0)
    }
}

impl std::error::Error for ListenerError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectorError {
    /// The detection window reaches past the bars loaded in the source.
    IndexOutOfRange { index: usize, len: usize },
    Listener(ListenerError),
}

impl Display for DetectorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IndexOutOfRange { index, len } => {
                write!(f, "bar index {index} out of range (loaded bars: {len})")
            }
            Self::Listener(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for DetectorError {}

impl From<ListenerError> for DetectorError {
    fn from(value: ListenerError) -> Self {
        Self::Listener(value)
    }
}

/// Failure while registering a detector over existing history.
#[derive(Debug)]
pub enum RegisterError {
    /// The timeframe already has a detector; its bars and chain are kept.
    AlreadyRegistered(Timeframe),
    Data(DataError),
    Detector(DetectorError),
}

impl Display for RegisterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyRegistered(tf) => write!(f, "timeframe already registered: {tf}"),
            Self::Data(e) => write!(f, "{e}"),
            Self::Detector(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for RegisterError {}

impl From<DataError> for RegisterError {
    fn from(value: DataError) -> Self {
        Self::Data(value)
    }
}

impl From<DetectorError> for RegisterError {
    fn from(value: DetectorError) -> Self {
        Self::Detector(value)
    }
}

/// Failure while streaming stored bars through a detector.
#[derive(Debug)]
pub enum IngestError {
    Data(DataError),
    Detector(DetectorError),
}

impl Display for IngestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Data(e) => write!(f, "{e}"),
            Self::Detector(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for IngestError {}

impl From<DataError> for IngestError {
    fn from(value: DataError) -> Self {
        Self::Data(value)
    }
}

impl From<DetectorError> for IngestError {
    fn from(value: DetectorError) -> Self {
        Self::Detector(value)
    }
}
