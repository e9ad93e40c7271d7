//! Candle data and replay engine for browser price charts.
//!
//! Reconciles a historical candle series with a live tick stream, keeps SMA
//! and EMA overlays current, and drives a bar-by-bar replay of the loaded
//! history. Rendering, drawings and alerts belong to the host; the engine
//! reaches them through [`domain::chart::ChartSurface`] and
//! [`domain::annotations::DrawingToolSubsystem`].

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
pub mod time_utils;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn initialize() {
    console_error_panic_hook::set_once();
}

/// Installs the console logger and wall clock. The first call wins.
pub fn install_services(level: domain::logging::LogLevel) {
    use crate::domain::logging::{LogComponent, get_logger, init_logger, init_time_provider};
    use crate::infrastructure::services::{BrowserTimeProvider, ConsoleLogger};

    init_logger(Box::new(ConsoleLogger::new(level)));
    init_time_provider(Box::new(BrowserTimeProvider::new()));

    get_logger().info(LogComponent::Presentation("Initialize"), "replay engine initialized");
}
