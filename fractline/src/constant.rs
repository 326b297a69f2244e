use crate::error::DataError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    High,
    Low,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Self::High => Self::Low,
            Self::Low => Self::High,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Low => "low",
        }
    }

    /// `true` when `candidate` is at least as extreme as `reference` on this side.
    pub fn not_worse(self, candidate: f64, reference: f64) -> bool {
        match self {
            Self::High => candidate >= reference,
            Self::Low => candidate <= reference,
        }
    }
}

/// Trend-continuation class of a fractal relative to the previous one on its side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FractalKind {
    HigherHigh,
    LowerHigh,
    HigherLow,
    LowerLow,
}

impl FractalKind {
    pub fn side(self) -> Side {
        match self {
            Self::HigherHigh | Self::LowerHigh => Side::High,
            Self::HigherLow | Self::LowerLow => Side::Low,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::HigherHigh => "higher high",
            Self::LowerHigh => "lower high",
            Self::HigherLow => "higher low",
            Self::LowerLow => "lower low",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::HigherHigh => "HH",
            Self::LowerHigh => "LH",
            Self::HigherLow => "HL",
            Self::LowerLow => "LL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Timeframe {
    M1,
    M2,
    M3,
    M4,
    M5,
    M6,
    M7,
    M8,
    M9,
    M10,
    M15,
    M20,
    M30,
    M45,
    H1,
    H2,
    H3,
    H4,
    H6,
    H8,
    H12,
    D1,
    D2,
    D3,
    W1,
    Mn1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 26] = [
        Self::M1,
        Self::M2,
        Self::M3,
        Self::M4,
        Self::M5,
        Self::M6,
        Self::M7,
        Self::M8,
        Self::M9,
        Self::M10,
        Self::M15,
        Self::M20,
        Self::M30,
        Self::M45,
        Self::H1,
        Self::H2,
        Self::H3,
        Self::H4,
        Self::H6,
        Self::H8,
        Self::H12,
        Self::D1,
        Self::D2,
        Self::D3,
        Self::W1,
        Self::Mn1,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::M1 => "1m",
            Self::M2 => "2m",
            Self::M3 => "3m",
            Self::M4 => "4m",
            Self::M5 => "5m",
            Self::M6 => "6m",
            Self::M7 => "7m",
            Self::M8 => "8m",
            Self::M9 => "9m",
            Self::M10 => "10m",
            Self::M15 => "15m",
            Self::M20 => "20m",
            Self::M30 => "30m",
            Self::M45 => "45m",
            Self::H1 => "1h",
            Self::H2 => "2h",
            Self::H3 => "3h",
            Self::H4 => "4h",
            Self::H6 => "6h",
            Self::H8 => "8h",
            Self::H12 => "12h",
            Self::D1 => "1d",
            Self::D2 => "2d",
            Self::D3 => "3d",
            Self::W1 => "1w",
            Self::Mn1 => "1mo",
        }
    }

    pub fn minutes(self) -> u32 {
        match self {
            Self::M1 => 1,
            Self::M2 => 2,
            Self::M3 => 3,
            Self::M4 => 4,
            Self::M5 => 5,
            Self::M6 => 6,
            Self::M7 => 7,
            Self::M8 => 8,
            Self::M9 => 9,
            Self::M10 => 10,
            Self::M15 => 15,
            Self::M20 => 20,
            Self::M30 => 30,
            Self::M45 => 45,
            Self::H1 => 60,
            Self::H2 => 120,
            Self::H3 => 180,
            Self::H4 => 240,
            Self::H6 => 360,
            Self::H8 => 480,
            Self::H12 => 720,
            Self::D1 => 1_440,
            Self::D2 => 2_880,
            Self::D3 => 4_320,
            Self::W1 => 10_080,
            Self::Mn1 => 43_200,
        }
    }

    /// Accepts `1m`, `m1`, `1h`, `h1`, `D1`, `mn1`, `1mo`, ...
    pub fn parse(value: &str) -> Result<Self, DataError> {
        let norm = value.trim().to_ascii_lowercase();
        if matches!(norm.as_str(), "mn1" | "1mo" | "1mn" | "monthly") {
            return Ok(Self::Mn1);
        }

        let (unit, amount) = if let Some(rest) = norm.strip_prefix(|c: char| c.is_ascii_alphabetic()) {
            (&norm[..1], rest)
        } else if let Some(rest) = norm.strip_suffix(|c: char| c.is_ascii_alphabetic()) {
            (&norm[norm.len() - 1..], rest)
        } else {
            return Err(DataError::InvalidTimeframe(value.to_string()));
        };

        let canonical = format!("{amount}{unit}");
        Self::ALL
            .iter()
            .copied()
            .find(|tf| tf.as_str() == canonical)
            .ok_or_else(|| DataError::InvalidTimeframe(value.to_string()))
    }

    /// Parses a comma separated list such as `"m1, h1,D1"`. Duplicates keep their
    /// first position; an empty list yields `fallback`.
    pub fn parse_list(value: &str, fallback: Timeframe) -> Result<Vec<Self>, DataError> {
        let mut out: Vec<Self> = Vec::new();
        for item in value.split(',').map(str::trim).filter(|x| !x.is_empty()) {
            let timeframe = Self::parse(item)?;
            if !out.contains(&timeframe) {
                out.push(timeframe);
            }
        }

        if out.is_empty() {
            out.push(fallback);
        }
        Ok(out)
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
