//! JavaScript bindings. Only built for the browser target.

#[cfg(target_arch = "wasm32")]
pub mod js_adapters;
#[cfg(target_arch = "wasm32")]
pub mod wasm_api;

#[cfg(target_arch = "wasm32")]
pub use wasm_api::ReplayEngineApi;
