use super::value_objects::{ChartType, SeriesPoint};
use crate::domain::market_data::Candle;

/// Converts candles into the point shape the given chart type draws.
pub fn series_for(chart_type: ChartType, candles: &[Candle]) -> Vec<SeriesPoint> {
    match chart_type {
        ChartType::HeikinAshi => heikin_ashi(candles),
        kind if kind.is_single_value() => candles.iter().map(value_point).collect(),
        _ => candles.iter().map(bar_point).collect(),
    }
}

/// Point for the last candle only.
///
/// Heikin-Ashi bars depend on every earlier bar, so that case walks the whole
/// sequence.
pub fn last_point_for(chart_type: ChartType, candles: &[Candle]) -> Option<SeriesPoint> {
    match chart_type {
        ChartType::HeikinAshi => heikin_ashi(candles).pop(),
        kind if kind.is_single_value() => candles.last().map(value_point),
        _ => candles.last().map(bar_point),
    }
}

fn bar_point(candle: &Candle) -> SeriesPoint {
    SeriesPoint::Bar {
        time: candle.time.value(),
        open: candle.ohlc.open.value(),
        high: candle.ohlc.high.value(),
        low: candle.ohlc.low.value(),
        close: candle.ohlc.close.value(),
    }
}

fn value_point(candle: &Candle) -> SeriesPoint {
    SeriesPoint::Value { time: candle.time.value(), value: candle.close() }
}

pub fn heikin_ashi(candles: &[Candle]) -> Vec<SeriesPoint> {
    let mut out = Vec::with_capacity(candles.len());
    let mut previous: Option<(f64, f64)> = None;

    for candle in candles {
        let (open, high, low, close) = (
            candle.ohlc.open.value(),
            candle.ohlc.high.value(),
            candle.ohlc.low.value(),
            candle.ohlc.close.value(),
        );
        let ha_close = (open + high + low + close) / 4.0;
        let ha_open = match previous {
            Some((prev_open, prev_close)) => (prev_open + prev_close) / 2.0,
            None => (open + close) / 2.0,
        };
        out.push(SeriesPoint::Bar {
            time: candle.time.value(),
            open: ha_open,
            high: high.max(ha_open).max(ha_close),
            low: low.min(ha_open).min(ha_close),
            close: ha_close,
        });
        previous = Some((ha_open, ha_close));
    }
    out
}
