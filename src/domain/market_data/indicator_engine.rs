//! SMA and EMA over candle closes.
//!
//! Full recomputation is O(n). Incremental updates touch only the last bar:
//! SMA re-sums the trailing window (O(window)), EMA continues from the exact
//! smoothed value of the previous closed bar (O(1)).

use super::Candle;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display as StrumDisplay, EnumIter, IntoEnumIterator};

pub const DEFAULT_WINDOW: usize = 20;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, EnumIter, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum IndicatorKind {
    Sma,
    Ema,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    pub time: u64,
    pub value: f64,
}

/// Which indicators are switched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSettings {
    pub sma: bool,
    pub ema: bool,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self { sma: true, ema: true }
    }
}

impl IndicatorSettings {
    pub fn is_enabled(&self, kind: IndicatorKind) -> bool {
        match kind {
            IndicatorKind::Sma => self.sma,
            IndicatorKind::Ema => self.ema,
        }
    }
}

/// Result of an incremental update for one indicator.
#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorUpdate {
    /// The series had to be rebuilt; replace it wholesale.
    Full(Vec<IndicatorPoint>),
    /// Only the last point changed or was appended.
    Point(IndicatorPoint),
}

fn smoothing(window: usize) -> f64 {
    2.0 / (window as f64 + 1.0)
}

fn ema_step(close: f64, previous: f64, k: f64) -> f64 {
    (close - previous) * k + previous
}

/// Simple moving average; one point per complete window.
pub fn sma_series(candles: &[Candle], window: usize) -> Vec<IndicatorPoint> {
    if window == 0 || candles.len() < window {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(candles.len() - window + 1);
    let mut sum: f64 = candles[..window].iter().map(Candle::close).sum();
    out.push(IndicatorPoint { time: candles[window - 1].time.value(), value: sum / window as f64 });

    for i in window..candles.len() {
        sum += candles[i].close() - candles[i - window].close();
        out.push(IndicatorPoint { time: candles[i].time.value(), value: sum / window as f64 });
    }
    out
}

/// Exponential moving average seeded with the SMA of the first `window` closes.
pub fn ema_series(candles: &[Candle], window: usize) -> Vec<IndicatorPoint> {
    if window == 0 || candles.len() < window {
        return Vec::new();
    }

    let k = smoothing(window);
    let seed = candles[..window].iter().map(Candle::close).sum::<f64>() / window as f64;
    let mut out = Vec::with_capacity(candles.len() - window + 1);
    out.push(IndicatorPoint { time: candles[window - 1].time.value(), value: seed });

    let mut previous = seed;
    for candle in &candles[window..] {
        previous = ema_step(candle.close(), previous, k);
        out.push(IndicatorPoint { time: candle.time.value(), value: previous });
    }
    out
}

pub fn recompute(kind: IndicatorKind, candles: &[Candle], window: usize) -> Vec<IndicatorPoint> {
    match kind {
        IndicatorKind::Sma => sma_series(candles, window),
        IndicatorKind::Ema => ema_series(candles, window),
    }
}

/// Trailing-window SMA for the last bar. `None` below the window threshold.
pub fn sma_update_last(candles: &[Candle], window: usize) -> Option<IndicatorPoint> {
    if window == 0 || candles.len() < window {
        return None;
    }
    let last = candles.last()?;
    let sum: f64 = candles[candles.len() - window..].iter().map(Candle::close).sum();
    Some(IndicatorPoint { time: last.time.value(), value: sum / window as f64 })
}

/// EMA for the last bar continuing from `previous`, the smoothed value of the
/// bar before it.
pub fn ema_update_last(candles: &[Candle], previous: f64, window: usize) -> Option<IndicatorPoint> {
    if window == 0 || candles.len() <= window {
        return None;
    }
    let last = candles.last()?;
    Some(IndicatorPoint {
        time: last.time.value(),
        value: ema_step(last.close(), previous, smoothing(window)),
    })
}

/// EMA continuation state for the sequence it was last computed over.
#[derive(Debug, Clone, Copy, PartialEq)]
struct EmaContinuation {
    len: usize,
    last_time: u64,
    /// Smoothed value at the second-to-last bar; `None` when the last bar is the seed.
    prev_closed: Option<f64>,
    last: f64,
}

impl EmaContinuation {
    fn from_series(len: usize, series: &[IndicatorPoint]) -> Option<Self> {
        let last = series.last()?;
        let prev_closed = series.len().checked_sub(2).map(|i| series[i].value);
        Some(Self { len, last_time: last.time, prev_closed, last: last.value })
    }
}

/// Stateful front for the live view: keeps the EMA continuation and decides
/// between incremental and full updates.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    window: usize,
    settings: IndicatorSettings,
    ema: Option<EmaContinuation>,
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl IndicatorEngine {
    pub fn new(window: usize) -> Self {
        Self { window, settings: IndicatorSettings::default(), ema: None }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn settings(&self) -> IndicatorSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: IndicatorSettings) {
        self.settings = settings;
        self.reset();
    }

    /// Drops the EMA continuation. Called whenever the source sequence is
    /// replaced wholesale.
    pub fn reset(&mut self) {
        self.ema = None;
    }

    pub fn has_continuation(&self) -> bool {
        self.ema.is_some()
    }

    pub fn enabled_kinds(&self) -> impl Iterator<Item = IndicatorKind> + '_ {
        IndicatorKind::iter().filter(|kind| self.settings.is_enabled(*kind))
    }

    /// Full recomputation of every enabled indicator.
    pub fn recompute_all(&mut self, candles: &[Candle]) -> Vec<(IndicatorKind, Vec<IndicatorPoint>)> {
        let kinds: Vec<IndicatorKind> = self.enabled_kinds().collect();
        kinds.into_iter().map(|kind| (kind, self.recompute_one(kind, candles))).collect()
    }

    /// Incremental update after the last bar was replaced or one bar appended.
    pub fn update_last(&mut self, candles: &[Candle]) -> Vec<(IndicatorKind, IndicatorUpdate)> {
        let kinds: Vec<IndicatorKind> = self.enabled_kinds().collect();
        kinds
            .into_iter()
            .map(|kind| {
                let update = match kind {
                    IndicatorKind::Sma => match sma_update_last(candles, self.window) {
                        Some(point) => IndicatorUpdate::Point(point),
                        None => IndicatorUpdate::Full(sma_series(candles, self.window)),
                    },
                    IndicatorKind::Ema => self.ema_update(candles),
                };
                (kind, update)
            })
            .collect()
    }

    fn recompute_one(&mut self, kind: IndicatorKind, candles: &[Candle]) -> Vec<IndicatorPoint> {
        let series = recompute(kind, candles, self.window);
        if kind == IndicatorKind::Ema {
            self.ema = EmaContinuation::from_series(candles.len(), &series);
        }
        series
    }

    fn ema_update(&mut self, candles: &[Candle]) -> IndicatorUpdate {
        let Some(last) = candles.last() else {
            self.ema = None;
            return IndicatorUpdate::Full(Vec::new());
        };
        let len = candles.len();
        let time = last.time.value();

        let continued = match self.ema {
            // Same bar rewritten: continue from the bar before it.
            Some(cache) if cache.len == len && cache.last_time == time => match cache.prev_closed {
                Some(prev) => ema_update_last(candles, prev, self.window)
                    .map(|point| (Some(prev), point)),
                None => None,
            },
            // New bar: the cached last value is now closed.
            Some(cache) if cache.len + 1 == len && cache.last_time < time => {
                ema_update_last(candles, cache.last, self.window)
                    .map(|point| (Some(cache.last), point))
            }
            _ => None,
        };

        match continued {
            Some((prev_closed, point)) => {
                self.ema =
                    Some(EmaContinuation { len, last_time: time, prev_closed, last: point.value });
                IndicatorUpdate::Point(point)
            }
            None => IndicatorUpdate::Full(self.recompute_one(IndicatorKind::Ema, candles)),
        }
    }
}
