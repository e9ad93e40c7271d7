pub use super::value_objects::{OHLC, Price, Timestamp};
use super::value_objects::TimeInterval;
use crate::domain::logging::LogComponent;
use crate::log_debug;
use serde::{Deserialize, Serialize};

/// One OHLC bar, keyed by its bucket start time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: Timestamp,
    pub ohlc: OHLC,
}

impl Candle {
    pub fn new(time: Timestamp, ohlc: OHLC) -> Self {
        Self { time, ohlc }
    }

    pub fn close(&self) -> f64 {
        self.ohlc.close.value()
    }

    pub fn is_bullish(&self) -> bool {
        self.ohlc.close > self.ohlc.open
    }
}

/// Raw streaming update as delivered by the live source, not yet bucketed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveTick {
    pub time: u64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl LiveTick {
    pub fn is_finite(&self) -> bool {
        self.open.is_finite() && self.high.is_finite() && self.low.is_finite() && self.close.is_finite()
    }

    fn into_candle(self, time: Timestamp) -> Candle {
        Candle::new(
            time,
            OHLC::new(
                Price::from(self.open),
                Price::from(self.high),
                Price::from(self.low),
                Price::from(self.close),
            ),
        )
    }
}

/// Why a tick was dropped at the merge boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickRejection {
    NonFinite,
    OutOfOrder { bucket: u64, last: u64 },
}

/// What `merge_live_tick` did to the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The open bar was updated in place.
    Replaced,
    Appended,
    Rejected(TickRejection),
}

impl MergeOutcome {
    pub fn is_applied(&self) -> bool {
        !matches!(self, MergeOutcome::Rejected(_))
    }
}

/// Canonical ordered candle sequence for the active symbol and interval.
///
/// Times are strictly increasing; only the last bar is ever rewritten.
#[derive(Debug, Clone, Default)]
pub struct CandleStore {
    candles: Vec<Candle>,
}

impl CandleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole sequence.
    ///
    /// Entries that would break time ordering are dropped so the invariant
    /// holds even for a sloppy source.
    pub fn load(&mut self, candles: Vec<Candle>) {
        let received = candles.len();
        let mut ordered: Vec<Candle> = Vec::with_capacity(received);
        for candle in candles {
            if !candle.ohlc.is_finite() {
                continue;
            }
            match ordered.last() {
                Some(last) if candle.time <= last.time => continue,
                _ => ordered.push(candle),
            }
        }

        if ordered.len() != received {
            log_debug!(
                LogComponent::Domain("CandleStore"),
                "dropped {} unordered or non-finite candles on load",
                received - ordered.len()
            );
        }
        self.candles = ordered;
    }

    pub fn merge_live_tick(&mut self, tick: LiveTick, interval: TimeInterval) -> MergeOutcome {
        if !tick.is_finite() {
            log_debug!(LogComponent::Domain("CandleStore"), "rejected non-finite tick {:?}", tick);
            return MergeOutcome::Rejected(TickRejection::NonFinite);
        }

        let bucket = Timestamp::new(tick.time).bucket_start(interval);
        let candle = tick.into_candle(bucket);

        match self.candles.last_mut() {
            Some(last) if last.time == bucket => {
                *last = candle;
                MergeOutcome::Replaced
            }
            Some(last) if bucket < last.time => {
                let rejection =
                    TickRejection::OutOfOrder { bucket: bucket.value(), last: last.time.value() };
                log_debug!(
                    LogComponent::Domain("CandleStore"),
                    "rejected out-of-order tick: bucket {} before last {}",
                    bucket.value(),
                    last.time.value()
                );
                MergeOutcome::Rejected(rejection)
            }
            _ => {
                self.candles.push(candle);
                MergeOutcome::Appended
            }
        }
    }

    pub fn current(&self) -> &[Candle] {
        &self.candles
    }

    /// Close of the last bar, `None` while the store is empty.
    pub fn current_price(&self) -> Option<Price> {
        self.candles.last().map(|c| c.ohlc.close)
    }

    pub fn latest(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn clear(&mut self) {
        self.candles.clear();
    }

    /// Lowest low and highest high over the sequence.
    pub fn price_range(&self) -> Option<(Price, Price)> {
        let first = self.candles.first()?;
        let init = (first.ohlc.low.value(), first.ohlc.high.value());
        let (low, high) = self.candles.iter().fold(init, |(low, high), c| {
            (low.min(c.ohlc.low.value()), high.max(c.ohlc.high.value()))
        });
        Some((Price::from(low), Price::from(high)))
    }
}
