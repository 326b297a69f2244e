use chrono::{DateTime, Utc};
use tracing::debug;

pub const DEFAULT_HISTORY_CHUNK: usize = 500;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub datetime: DateTime<Utc>,
    pub open_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub close_price: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(datetime: DateTime<Utc>, high_price: f64, low_price: f64) -> Self {
        let mid = (high_price + low_price) / 2.0;
        Self {
            datetime,
            open_price: mid,
            high_price,
            low_price,
            close_price: mid,
            volume: 0.0,
        }
    }
}

/// Read-only, index-addressed view over an ordered bar history.
///
/// Index 0 is the oldest loaded bar. `load_more_history` may prepend older bars,
/// which shifts every index; callers replay their analysis afterwards.
pub trait BarSource {
    fn len(&self) -> usize;

    fn get(&self, index: usize) -> Option<&Bar>;

    /// Prepends older bars if any are available, returning how many were added.
    fn load_more_history(&mut self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn first_open_time(&self) -> Option<DateTime<Utc>> {
        self.get(0).map(|bar| bar.datetime)
    }
}

/// In-memory bar source with an optional backlog of older bars that is
/// released chunk by chunk through `load_more_history`.
#[derive(Debug, Clone, Default)]
pub struct BarSeries {
    rows: Vec<Bar>,
    backlog: Vec<Bar>,
    history_chunk: usize,
}

impl BarSeries {
    pub fn new() -> Self {
        Self::from_bars(Vec::new())
    }

    pub fn from_bars(rows: Vec<Bar>) -> Self {
        Self {
            rows,
            backlog: Vec::new(),
            history_chunk: DEFAULT_HISTORY_CHUNK,
        }
    }

    /// `backlog` holds bars older than `rows`, oldest first.
    pub fn with_backlog(rows: Vec<Bar>, backlog: Vec<Bar>, history_chunk: usize) -> Self {
        Self {
            rows,
            backlog,
            history_chunk: history_chunk.max(1),
        }
    }

    /// Appends a newly opened bar and returns the new bar count.
    pub fn push(&mut self, bar: Bar) -> usize {
        self.rows.push(bar);
        self.rows.len()
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    pub fn all_rows(&self) -> &[Bar] {
        &self.rows
    }
}

impl BarSource for BarSeries {
    fn len(&self) -> usize {
        self.rows.len()
    }

    fn get(&self, index: usize) -> Option<&Bar> {
        self.rows.get(index)
    }

    fn load_more_history(&mut self) -> usize {
        if self.backlog.is_empty() {
            return 0;
        }
        let take = self.history_chunk.max(1).min(self.backlog.len());
        let split_at = self.backlog.len() - take;
        let mut older = self.backlog.split_off(split_at);
        older.append(&mut self.rows);
        self.rows = older;
        take
    }
}

/// Loads older history until the first bar opens at or before `since`, or the
/// source stops making progress. Returns the number of bars added.
pub fn ensure_history(source: &mut impl BarSource, since: DateTime<Utc>) -> usize {
    let mut added = 0usize;
    let mut last_count = usize::MAX;
    while source.len() != last_count
        && source
            .first_open_time()
            .is_none_or(|first| first > since)
    {
        last_count = source.len();
        let loaded = source.load_more_history();
        debug!(loaded, total = source.len(), "load more history");
        added += loaded;
    }
    added
}
