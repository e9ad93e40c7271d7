//! Binance streaming client and the wire DTOs shared with the REST client.

#[cfg(target_arch = "wasm32")]
pub mod binance_client;
pub mod dto;

#[cfg(target_arch = "wasm32")]
pub use binance_client::*;
pub use dto::*;
