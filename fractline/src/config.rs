use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::constant::Timeframe;
use crate::error::DataError;

pub const MIN_PERIOD: usize = 5;

/// Detection settings for one detector. Only `period` drives detection; the
/// remaining switches are carried for renderers that consume the events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FractalOptions {
    pub period: usize,
    pub show_horizontal_lines: bool,
    pub show_vertical_lines: bool,
    pub link_high_low: bool,
    pub mark_fakes: bool,
    pub plot_value_markers: bool,
}

impl Default for FractalOptions {
    fn default() -> Self {
        Self {
            period: MIN_PERIOD,
            show_horizontal_lines: true,
            show_vertical_lines: true,
            link_high_low: true,
            mark_fakes: true,
            plot_value_markers: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FractalOptionsPatch {
    pub period: Option<usize>,
    pub show_horizontal_lines: Option<bool>,
    pub show_vertical_lines: Option<bool>,
    pub link_high_low: Option<bool>,
    pub mark_fakes: Option<bool>,
    pub plot_value_markers: Option<bool>,
}

impl FractalOptions {
    pub fn new(period: usize) -> Result<Self, DataError> {
        let options = Self {
            period,
            ..Self::default()
        };
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), DataError> {
        if self.period < MIN_PERIOD {
            return Err(DataError::InvalidPeriod(self.period));
        }
        Ok(())
    }

    /// Window radius around the detection midpoint.
    pub fn half_period(&self) -> usize {
        self.period / 2
    }

    pub fn apply_patch(mut self, patch: FractalOptionsPatch) -> Self {
        if let Some(v) = patch.period {
            self.period = v;
        }
        if let Some(v) = patch.show_horizontal_lines {
            self.show_horizontal_lines = v;
        }
        if let Some(v) = patch.show_vertical_lines {
            self.show_vertical_lines = v;
        }
        if let Some(v) = patch.link_high_low {
            self.link_high_low = v;
        }
        if let Some(v) = patch.mark_fakes {
            self.mark_fakes = v;
        }
        if let Some(v) = patch.plot_value_markers {
            self.plot_value_markers = v;
        }
        self
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, DataError> {
        let patch: FractalOptionsPatch = serde_yaml::from_str(yaml)?;
        let options = Self::default().apply_patch(patch);
        options.validate()?;
        Ok(options)
    }
}

/// Default options plus per-timeframe overrides.
///
/// ```yaml
/// default:
///   period: 5
/// timeframe:
///   1h:
///     period: 7
///     link_high_low: false
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FractalProfileConfig {
    #[serde(default)]
    pub default: FractalOptionsPatch,
    #[serde(default)]
    pub timeframe: HashMap<String, FractalOptionsPatch>,
}

impl FractalProfileConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, DataError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn resolve_for(&self, timeframe: Timeframe) -> Result<FractalOptions, DataError> {
        let mut options = FractalOptions::default().apply_patch(self.default.clone());
        // keys may use either spelling, e.g. `h1` or `1h`
        let patch = self
            .timeframe
            .iter()
            .find(|(key, _)| Timeframe::parse(key).is_ok_and(|tf| tf == timeframe))
            .map(|(_, patch)| patch.clone());
        if let Some(patch) = patch {
            options = options.apply_patch(patch);
        }
        options.validate()?;
        Ok(options)
    }
}

/// Settings for a replay run over stored bars.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    pub symbol: String,
    /// Comma separated timeframe list, e.g. `"m5, h1"`. Empty means the chart timeframe.
    #[serde(default)]
    pub timeframes: String,
    #[serde(default = "default_chart_timeframe")]
    pub chart_timeframe: String,
    #[serde(default)]
    pub profile: FractalProfileConfig,
}

fn default_chart_timeframe() -> String {
    Timeframe::H1.as_str().to_string()
}

impl ScanConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, DataError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads `.yaml`/`.yml` or `.json` by file extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        match path.extension().and_then(|x| x.to_str()) {
            Some("json") => Ok(serde_json::from_str(&text)?),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text),
            other => Err(DataError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    pub fn timeframe_list(&self) -> Result<Vec<Timeframe>, DataError> {
        let fallback = Timeframe::parse(&self.chart_timeframe)?;
        Timeframe::parse_list(&self.timeframes, fallback)
    }
}
