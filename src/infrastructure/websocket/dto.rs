use crate::domain::errors::InfrastructureError;
use crate::domain::market_data::{Candle, LiveTick, OHLC, Price, Symbol, TimeInterval, Timestamp};
use serde::Deserialize;
use serde::de::IgnoredAny;

/// Kline stream event from Binance.
#[derive(Debug, Deserialize)]
pub struct BinanceKlineEvent {
    #[serde(rename = "k")]
    pub kline: BinanceKline,
}

#[derive(Debug, Deserialize)]
pub struct BinanceKline {
    /// Bar open time in milliseconds.
    #[serde(rename = "t")]
    pub start_time: u64,
    #[serde(rename = "o")]
    pub open: String,
    #[serde(rename = "h")]
    pub high: String,
    #[serde(rename = "l")]
    pub low: String,
    #[serde(rename = "c")]
    pub close: String,
    #[serde(rename = "x", default)]
    pub is_closed: bool,
}

impl BinanceKline {
    pub fn to_live_tick(&self) -> Result<LiveTick, InfrastructureError> {
        Ok(LiveTick {
            time: Timestamp::from_millis(self.start_time).value(),
            open: parse_price("open", &self.open)?,
            high: parse_price("high", &self.high)?,
            low: parse_price("low", &self.low)?,
            close: parse_price("close", &self.close)?,
        })
    }
}

/// Row of the REST `klines` endpoint. Only the leading OHLC columns are used.
#[derive(Debug, Deserialize)]
pub struct BinanceRestKline(
    pub u64,
    pub String,
    pub String,
    pub String,
    pub String,
    pub IgnoredAny,
    pub IgnoredAny,
    pub IgnoredAny,
    pub IgnoredAny,
    pub IgnoredAny,
    pub IgnoredAny,
    pub IgnoredAny,
);

impl BinanceRestKline {
    pub fn to_candle(&self) -> Result<Candle, InfrastructureError> {
        let ohlc = OHLC::new(
            Price::from(parse_price("open", &self.1)?),
            Price::from(parse_price("high", &self.2)?),
            Price::from(parse_price("low", &self.3)?),
            Price::from(parse_price("close", &self.4)?),
        );
        Ok(Candle::new(Timestamp::from_millis(self.0), ohlc))
    }
}

pub fn parse_kline_message(data: &str) -> Result<LiveTick, InfrastructureError> {
    let event: BinanceKlineEvent = serde_json::from_str(data)
        .map_err(|e| InfrastructureError::Parse(format!("kline message: {}", e)))?;
    event.kline.to_live_tick()
}

pub fn parse_rest_klines(body: &str) -> Result<Vec<Candle>, InfrastructureError> {
    let rows: Vec<BinanceRestKline> = serde_json::from_str(body)
        .map_err(|e| InfrastructureError::Parse(format!("klines response: {}", e)))?;
    rows.iter().map(BinanceRestKline::to_candle).collect()
}

/// Stream name, e.g. `btcusdt@kline_1m`.
pub fn kline_stream_name(symbol: &Symbol, interval: TimeInterval) -> String {
    format!("{}@kline_{}", symbol.value().to_lowercase(), interval)
}

fn parse_price(field: &str, raw: &str) -> Result<f64, InfrastructureError> {
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| InfrastructureError::Parse(format!("invalid {} price {:?}", field, raw)))
}
