//! Adapters to the outside world: Binance REST and stream sources, the
//! browser console logger and clock, and the playback timer.

#[cfg(target_arch = "wasm32")]
pub mod http;
pub mod services;
#[cfg(target_arch = "wasm32")]
pub mod timers;
pub mod websocket;
