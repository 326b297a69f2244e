use std::path::{Path, PathBuf};

use fractline::{FractalChain, FractalId, FractalKind, ScanConfig, Side, Timeframe};
use serde::Serialize;

/// One fractal as printed or exported by the replay tools.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FractalRecord {
    pub label: String,
    pub timeframe: String,
    pub index: usize,
    pub time: i64,
    pub price: f64,
    pub side: &'static str,
    pub kind: &'static str,
    pub best: bool,
    pub fake: bool,
    pub previous_index: Option<usize>,
}

impl FractalRecord {
    /// Record for a single fractal; `fake` scans the later rows of the chain.
    pub fn from_chain(chain: &FractalChain, id: FractalId) -> Option<Self> {
        Self::build(chain, id, chain.is_fake(id))
    }

    /// Records for the whole chain, computing fake flags in one pass.
    pub fn all_from_chain(chain: &FractalChain) -> Vec<Self> {
        let fake_flags = chain.fake_flags();
        chain
            .iter()
            .filter_map(|(id, _)| Self::build(chain, id, fake_flags[id.position()]))
            .collect()
    }

    fn build(chain: &FractalChain, id: FractalId, fake: bool) -> Option<Self> {
        let fractal = chain.get(id)?;
        let previous_index = fractal
            .previous
            .and_then(|prev| chain.get(prev))
            .map(|prev| prev.index);
        Some(Self {
            label: fractal.label(),
            timeframe: fractal.prefix.to_string(),
            index: fractal.index,
            time: fractal.datetime.timestamp(),
            price: fractal.value,
            side: fractal.side.as_str(),
            kind: chain.kind(id).code(),
            best: chain.best_of_side(id) == id,
            fake,
            previous_index,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanSummary {
    pub fractals: usize,
    pub highs: usize,
    pub lows: usize,
    pub higher_highs: usize,
    pub lower_lows: usize,
    pub fakes: usize,
}

impl ScanSummary {
    pub fn from_chain(chain: &FractalChain) -> Self {
        let mut summary = Self {
            fractals: chain.len(),
            fakes: chain.fake_flags().iter().filter(|x| **x).count(),
            ..Self::default()
        };
        for (id, fractal) in chain.iter() {
            match fractal.side {
                Side::High => summary.highs += 1,
                Side::Low => summary.lows += 1,
            }
            match chain.kind(id) {
                FractalKind::HigherHigh => summary.higher_highs += 1,
                FractalKind::LowerLow => summary.lower_lows += 1,
                _ => {}
            }
        }
        summary
    }
}

/// Loads a scan config file, or builds a default one for `symbol` and `timeframe`.
pub fn load_scan_config(
    config_path: Option<&str>,
    symbol: &str,
    timeframe: Timeframe,
) -> Result<ScanConfig, Box<dyn std::error::Error>> {
    match config_path {
        Some(path) => Ok(ScanConfig::from_file(path)?),
        None => Ok(ScanConfig {
            symbol: symbol.to_string(),
            timeframes: timeframe.as_str().to_string(),
            chart_timeframe: timeframe.as_str().to_string(),
            profile: Default::default(),
        }),
    }
}

/// CSV input for `timeframe`, laid out as `<dir>/<symbol>_<tf>.csv`.
pub fn timeframe_csv_path(csv_dir: impl AsRef<Path>, symbol: &str, timeframe: Timeframe) -> PathBuf {
    csv_dir
        .as_ref()
        .join(format!("{}_{}.csv", symbol, timeframe.as_str()))
}
