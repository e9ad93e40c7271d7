use crate::domain::errors::InfrastructureError;
use crate::domain::market_data::{Candle, LiveTick, Symbol, TimeInterval};

/// Source of historical bars.
///
/// Cancellation is the caller's job: the returned future is wrapped in
/// `futures::future::Abortable` and simply dropped when a newer load wins.
#[allow(async_fn_in_trait)]
pub trait HistoricalDataSource {
    async fn fetch_candles(
        &self,
        symbol: &Symbol,
        interval: TimeInterval,
        limit: usize,
    ) -> Result<Vec<Candle>, InfrastructureError>;
}

/// What a live subscription reports to its sink.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveSignal {
    Tick(LiveTick),
    /// The stream dropped; the transport keeps reconnecting on its own.
    Disconnected(String),
}

/// Callback receiving the signals of one subscription.
pub type TickSink = Box<dyn FnMut(LiveSignal)>;

/// Streaming feed of unbucketed ticks per symbol and interval.
pub trait LiveTickSource {
    fn subscribe(
        &self,
        symbol: &Symbol,
        interval: TimeInterval,
        sink: TickSink,
    ) -> Result<Box<dyn TickSubscription>, InfrastructureError>;
}

/// Handle to an open live subscription.
pub trait TickSubscription {
    /// Stops delivery. Calling it again is a no-op.
    fn unsubscribe(&mut self);

    fn is_active(&self) -> bool;
}
