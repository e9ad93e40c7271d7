use crate::domain::{
    errors::{InfrastructureError, NetworkError},
    logging::{LogComponent, get_logger},
    market_data::{Candle, HistoricalDataSource, Symbol, TimeInterval},
};
use crate::infrastructure::websocket::dto::parse_rest_klines;
use gloo_net::http::Request;

/// Historical bars from the Binance REST `klines` endpoint.
#[derive(Clone)]
pub struct BinanceHistoricalSource {
    base_url: String,
}

impl Default for BinanceHistoricalSource {
    fn default() -> Self {
        Self::new()
    }
}

impl BinanceHistoricalSource {
    pub fn new() -> Self {
        Self { base_url: "https://api.binance.com".to_string() }
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    fn klines_url(&self, symbol: &Symbol, interval: TimeInterval, limit: usize) -> String {
        format!(
            "{}/api/v3/klines?symbol={}&interval={}&limit={}",
            self.base_url,
            symbol.value(),
            interval,
            limit
        )
    }
}

impl HistoricalDataSource for BinanceHistoricalSource {
    async fn fetch_candles(
        &self,
        symbol: &Symbol,
        interval: TimeInterval,
        limit: usize,
    ) -> Result<Vec<Candle>, InfrastructureError> {
        let url = self.klines_url(symbol, interval, limit);
        get_logger().info(
            LogComponent::Infrastructure("BinanceHttp"),
            &format!("Fetching {} candles for {} {}", limit, symbol, interval),
        );

        let response = Request::get(&url).send().await.map_err(|e| {
            NetworkError::HttpRequestFailed(format!("failed to send request: {:?}", e))
        })?;
        if !response.ok() {
            return Err(NetworkError::HttpRequestFailed(format!(
                "HTTP error: {} - {}",
                response.status(),
                response.status_text()
            ))
            .into());
        }

        let body = response.text().await.map_err(|e| {
            NetworkError::HttpRequestFailed(format!("failed to read body: {:?}", e))
        })?;
        let candles = parse_rest_klines(&body)?;

        get_logger().info(
            LogComponent::Infrastructure("BinanceHttp"),
            &format!("Loaded {} candles for {}", candles.len(), symbol),
        );
        Ok(candles)
    }
}
