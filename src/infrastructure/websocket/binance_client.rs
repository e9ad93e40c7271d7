use super::dto::{kline_stream_name, parse_kline_message};
use crate::domain::{
    errors::InfrastructureError,
    logging::{LogComponent, get_logger},
    market_data::{LiveSignal, LiveTickSource, Symbol, TickSink, TickSubscription, TimeInterval},
};
use futures::StreamExt;
use futures::future::{AbortHandle, Abortable};
use gloo_net::websocket::{Message, futures::WebSocket};
use gloo_timers::future::sleep;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen_futures::spawn_local;

const MAX_BACKOFF_SECS: u64 = 32;

/// Live kline ticks from the Binance stream endpoint, reconnecting with
/// exponential backoff until unsubscribed.
#[derive(Clone)]
pub struct BinanceTickSource {
    base_url: String,
}

impl Default for BinanceTickSource {
    fn default() -> Self {
        Self::new()
    }
}

impl BinanceTickSource {
    pub fn new() -> Self {
        Self { base_url: "wss://stream.binance.com:9443/ws".to_string() }
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }
}

pub struct BinanceTickSubscription {
    handle: AbortHandle,
    active: Rc<Cell<bool>>,
}

impl TickSubscription for BinanceTickSubscription {
    fn unsubscribe(&mut self) {
        if self.active.replace(false) {
            self.handle.abort();
        }
    }

    fn is_active(&self) -> bool {
        self.active.get()
    }
}

impl Drop for BinanceTickSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl LiveTickSource for BinanceTickSource {
    fn subscribe(
        &self,
        symbol: &Symbol,
        interval: TimeInterval,
        sink: TickSink,
    ) -> Result<Box<dyn TickSubscription>, InfrastructureError> {
        let url = format!("{}/{}", self.base_url, kline_stream_name(symbol, interval));
        let (handle, registration) = AbortHandle::new_pair();
        let active = Rc::new(Cell::new(true));

        let flag = Rc::clone(&active);
        spawn_local(async move {
            let _ = Abortable::new(run_stream(url, sink), registration).await;
            flag.set(false);
        });

        Ok(Box::new(BinanceTickSubscription { handle, active }))
    }
}

async fn run_stream(url: String, mut sink: TickSink) {
    let mut delay = 1u64;
    // Set once a drop has been reported; cleared by the next open socket.
    let mut reported = false;
    loop {
        let mut stream = match WebSocket::open(&url) {
            Ok(ws) => {
                get_logger().info(
                    LogComponent::Infrastructure("BinanceWS"),
                    &format!("Connected to {}", url),
                );
                delay = 1;
                reported = false;
                ws
            }
            Err(e) => {
                get_logger().error(
                    LogComponent::Infrastructure("BinanceWS"),
                    &format!("Connection error: {:?}", e),
                );
                if !reported {
                    reported = true;
                    sink(LiveSignal::Disconnected(format!("connection failed: {:?}", e)));
                }
                sleep(Duration::from_secs(delay)).await;
                delay = (delay * 2).min(MAX_BACKOFF_SECS);
                continue;
            }
        };

        let mut reason = "stream closed".to_string();
        while let Some(msg) = stream.next().await {
            match msg {
                Ok(Message::Text(data)) => match parse_kline_message(&data) {
                    Ok(tick) => sink(LiveSignal::Tick(tick)),
                    Err(e) => get_logger().warn(
                        LogComponent::Infrastructure("BinanceWS"),
                        &format!("Skipping message: {}", e),
                    ),
                },
                Ok(Message::Bytes(_)) => {}
                Err(e) => {
                    get_logger().error(
                        LogComponent::Infrastructure("BinanceWS"),
                        &format!("WebSocket error: {:?}", e),
                    );
                    reason = format!("{:?}", e);
                    break;
                }
            }
        }

        if !reported {
            reported = true;
            sink(LiveSignal::Disconnected(reason));
        }
        get_logger().warn(
            LogComponent::Infrastructure("BinanceWS"),
            &format!("Reconnecting in {}s", delay),
        );
        sleep(Duration::from_secs(delay)).await;
        delay = (delay * 2).min(MAX_BACKOFF_SECS);
    }
}
