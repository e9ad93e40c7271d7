use crate::domain::chart::{DEFAULT_CANDLE_WINDOW, DEFAULT_RIGHT_OFFSET};
use crate::domain::errors::ConfigurationError;
use crate::domain::logging::LogLevel;
use crate::domain::market_data::DEFAULT_WINDOW;
use crate::domain::replay::{BASE_TICK_MS, MAX_SPEED, MIN_SPEED, ScrubSettings};
use serde::{Deserialize, Serialize};

/// Tunables of the engine. Every field has a default, so hosts only pass what
/// they want to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub indicator_window: usize,
    /// Bars requested per historical load.
    pub history_limit: usize,
    pub default_candle_window: usize,
    pub right_offset: usize,
    pub drag_throttle_ms: u64,
    pub click_slop_px: f64,
    pub click_max_duration_ms: u64,
    pub click_follow_suppress_ms: u64,
    pub base_playback_interval_ms: u64,
    pub min_speed: f64,
    pub max_speed: f64,
    pub jump_fallback_window: usize,
    pub jump_min_width_ratio: f64,
    pub log_level: LogLevel,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            indicator_window: DEFAULT_WINDOW,
            history_limit: 1000,
            default_candle_window: DEFAULT_CANDLE_WINDOW,
            right_offset: DEFAULT_RIGHT_OFFSET,
            drag_throttle_ms: 50,
            click_slop_px: 5.0,
            click_max_duration_ms: 300,
            click_follow_suppress_ms: 150,
            base_playback_interval_ms: BASE_TICK_MS,
            min_speed: MIN_SPEED,
            max_speed: MAX_SPEED,
            jump_fallback_window: 300,
            jump_min_width_ratio: 0.3,
            log_level: LogLevel::Info,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigurationError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let positive = [
            ("indicator_window", self.indicator_window),
            ("history_limit", self.history_limit),
            ("default_candle_window", self.default_candle_window),
            ("jump_fallback_window", self.jump_fallback_window),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigurationError::InvalidParameter(format!("{} must be positive", name)));
        }
        if self.base_playback_interval_ms == 0 {
            return Err(ConfigurationError::InvalidParameter(
                "base_playback_interval_ms must be positive".to_string(),
            ));
        }
        let speeds_ok = self.min_speed.is_finite()
            && self.max_speed.is_finite()
            && self.min_speed > 0.0
            && self.min_speed <= self.max_speed;
        if !speeds_ok {
            return Err(ConfigurationError::InvalidParameter(format!(
                "speed range [{}, {}] is invalid",
                self.min_speed, self.max_speed
            )));
        }
        if !(self.jump_min_width_ratio > 0.0 && self.jump_min_width_ratio <= 1.0) {
            return Err(ConfigurationError::InvalidParameter(format!(
                "jump_min_width_ratio {} must be in (0, 1]",
                self.jump_min_width_ratio
            )));
        }
        if !(self.click_slop_px.is_finite() && self.click_slop_px >= 0.0) {
            return Err(ConfigurationError::InvalidParameter(
                "click_slop_px must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }

    pub fn scrub_settings(&self) -> ScrubSettings {
        ScrubSettings {
            drag_throttle_ms: self.drag_throttle_ms,
            click_slop_px: self.click_slop_px,
            click_max_duration_ms: self.click_max_duration_ms,
            follow_suppress_ms: self.click_follow_suppress_ms,
        }
    }
}
