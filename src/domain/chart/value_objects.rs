use derive_more::Display;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString};

/// How candles are drawn on the surface.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Display,
    EnumIter,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ChartType {
    #[default]
    #[display(fmt = "Candlestick")]
    #[strum(serialize = "candlestick")]
    Candlestick,
    #[display(fmt = "Bar")]
    #[strum(serialize = "bar")]
    Bar,
    #[display(fmt = "Hollow Candlestick")]
    #[strum(serialize = "hollow-candlestick")]
    HollowCandlestick,
    #[display(fmt = "Line")]
    #[strum(serialize = "line")]
    Line,
    #[display(fmt = "Area")]
    #[strum(serialize = "area")]
    Area,
    #[display(fmt = "Baseline")]
    #[strum(serialize = "baseline")]
    Baseline,
    #[display(fmt = "Heikin Ashi")]
    #[strum(serialize = "heikin-ashi")]
    HeikinAshi,
}

impl ChartType {
    /// Line-like series only carry a single value per bar.
    pub fn is_single_value(&self) -> bool {
        matches!(self, ChartType::Line | ChartType::Area | ChartType::Baseline)
    }
}

/// One point handed to the chart surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeriesPoint {
    Bar { time: u64, open: f64, high: f64, low: f64, close: f64 },
    Value { time: u64, value: f64 },
}

impl SeriesPoint {
    pub fn time(&self) -> u64 {
        match self {
            SeriesPoint::Bar { time, .. } | SeriesPoint::Value { time, .. } => *time,
        }
    }
}

/// Visible window in bar indices. Fractional and out-of-data values are legal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogicalRange {
    pub from: f64,
    pub to: f64,
}

impl LogicalRange {
    pub fn new(from: f64, to: f64) -> Self {
        Self { from, to }
    }

    pub fn width(&self) -> f64 {
        self.to - self.from
    }
}

/// Visible window in candle times (seconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: u64,
    pub to: u64,
}

impl TimeRange {
    pub fn new(from: u64, to: u64) -> Self {
        Self { from, to }
    }

    pub fn width(&self) -> u64 {
        self.to.saturating_sub(self.from)
    }
}
