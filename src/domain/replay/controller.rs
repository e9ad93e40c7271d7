use super::state::{ReplayMode, ReplayState};
use crate::domain::errors::{ReplayError, ValidationError};
use crate::domain::logging::LogComponent;
use crate::domain::market_data::Candle;
use crate::{log_debug, log_info};
use std::sync::Arc;
use std::time::Duration;

pub const BASE_TICK_MS: u64 = 1000;
pub const MIN_SPEED: f64 = 0.1;
pub const MAX_SPEED: f64 = 100.0;

/// Result of one playback timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStep {
    /// Not playing; the tick had no effect.
    Idle,
    Advanced(usize),
    /// The cursor sits on the last bar and playback paused itself.
    Finished(usize),
}

impl PlaybackStep {
    /// Whether the timer should keep firing.
    pub fn keeps_running(&self) -> bool {
        matches!(self, PlaybackStep::Advanced(_))
    }
}

/// Live/replay state machine over a frozen history snapshot.
///
/// Sole writer of [`ReplayState`]. Every other component issues requests
/// through the methods below, which are interpreted synchronously.
#[derive(Debug, Clone)]
pub struct ReplayController {
    state: ReplayState,
    history: Option<Arc<[Candle]>>,
    base_interval_ms: u64,
    min_speed: f64,
    max_speed: f64,
}

impl Default for ReplayController {
    fn default() -> Self {
        Self::new(BASE_TICK_MS, MIN_SPEED, MAX_SPEED)
    }
}

impl ReplayController {
    pub fn new(base_interval_ms: u64, min_speed: f64, max_speed: f64) -> Self {
        Self {
            state: ReplayState::default(),
            history: None,
            base_interval_ms,
            min_speed,
            max_speed,
        }
    }

    pub fn state(&self) -> &ReplayState {
        &self.state
    }

    pub fn mode(&self) -> ReplayMode {
        self.state.mode
    }

    pub fn is_active(&self) -> bool {
        self.state.is_replay()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.state.cursor_index
    }

    /// The frozen snapshot, empty in live mode.
    pub fn history(&self) -> &[Candle] {
        self.history.as_deref().unwrap_or(&[])
    }

    /// Bars up to and including the cursor.
    pub fn past(&self) -> &[Candle] {
        match (self.history.as_deref(), self.state.cursor_index) {
            (Some(history), Some(cursor)) => &history[..=cursor],
            _ => &[],
        }
    }

    /// What the surface may show right now.
    pub fn visible_candles(&self) -> &[Candle] {
        match self.state.mode {
            ReplayMode::Live => &[],
            ReplayMode::ReplaySeeking => self.history(),
            _ if self.state.future_hidden => self.past(),
            _ => self.history(),
        }
    }

    /// Input for indicator recomputation. Never includes bars after the
    /// cursor except while a jump target is being picked.
    pub fn indicator_candles(&self) -> &[Candle] {
        match self.state.mode {
            ReplayMode::ReplaySeeking => self.history(),
            _ => self.past(),
        }
    }

    /// `Live -> ReplayPaused`, cursor on the most recent bar.
    pub fn enter(&mut self, snapshot: Vec<Candle>) -> Result<usize, ReplayError> {
        if self.state.is_replay() {
            return Err(ReplayError::InvalidTransition { from: self.state.mode, action: "enter replay" });
        }
        if snapshot.is_empty() {
            log_debug!(LogComponent::Domain("ReplayController"), "refusing replay over empty history");
            return Err(ReplayError::NoData);
        }

        let cursor = snapshot.len() - 1;
        self.history = Some(Arc::from(snapshot));
        self.state = ReplayState {
            mode: ReplayMode::ReplayPaused,
            cursor_index: Some(cursor),
            seek_locked: false,
            future_hidden: true,
            ..self.state
        };
        log_info!(LogComponent::Domain("ReplayController"), "replay started at index {}", cursor);
        Ok(cursor)
    }

    /// Any state `-> Live`. Returns whether replay was active.
    pub fn exit(&mut self) -> bool {
        let was_active = self.state.is_replay();
        self.history = None;
        self.state = ReplayState { speed_multiplier: self.state.speed_multiplier, ..ReplayState::default() };
        if was_active {
            log_info!(LogComponent::Domain("ReplayController"), "replay stopped");
        }
        was_active
    }

    /// `ReplayPaused -> ReplayPlaying`. Hides the future and releases the seek lock.
    pub fn play(&mut self) -> Result<(), ReplayError> {
        match self.state.mode {
            ReplayMode::Live => Err(ReplayError::NotActive),
            ReplayMode::ReplaySeeking => {
                Err(ReplayError::InvalidTransition { from: self.state.mode, action: "play" })
            }
            ReplayMode::ReplayPlaying => Ok(()),
            ReplayMode::ReplayPaused => {
                self.state.mode = ReplayMode::ReplayPlaying;
                self.state.future_hidden = true;
                self.state.seek_locked = false;
                Ok(())
            }
        }
    }

    /// `ReplayPlaying -> ReplayPaused`; a no-op in any other state.
    pub fn pause(&mut self) {
        if self.state.mode == ReplayMode::ReplayPlaying {
            self.state.mode = ReplayMode::ReplayPaused;
        }
    }

    /// One playback timer tick.
    pub fn advance(&mut self) -> PlaybackStep {
        if self.state.mode != ReplayMode::ReplayPlaying {
            return PlaybackStep::Idle;
        }
        let (Some(cursor), Some(last)) = (self.state.cursor_index, self.last_index()) else {
            return PlaybackStep::Idle;
        };

        if cursor >= last {
            self.state.mode = ReplayMode::ReplayPaused;
            return PlaybackStep::Finished(last);
        }

        let next = cursor + 1;
        self.state.cursor_index = Some(next);
        if next == last {
            self.state.mode = ReplayMode::ReplayPaused;
            log_debug!(LogComponent::Domain("ReplayController"), "playback reached the last bar");
            PlaybackStep::Finished(next)
        } else {
            PlaybackStep::Advanced(next)
        }
    }

    /// Moves the cursor from a scrub commit. Stops playback first, saturates at
    /// both ends of the history.
    pub fn seek_to(&mut self, index: usize, reveal_future: bool) -> Result<usize, ReplayError> {
        match self.state.mode {
            ReplayMode::Live => return Err(ReplayError::NotActive),
            ReplayMode::ReplaySeeking => {
                return Err(ReplayError::InvalidTransition { from: self.state.mode, action: "seek" });
            }
            _ => {}
        }

        self.pause();
        let clamped = self.clamp(index);
        self.state.cursor_index = Some(clamped);
        self.state.future_hidden = !reveal_future;
        Ok(clamped)
    }

    /// One bar forward. `None` when the cursor is already on the last bar.
    pub fn step_forward(&mut self) -> Result<Option<usize>, ReplayError> {
        let cursor = self.state.cursor_index.ok_or(ReplayError::NotActive)?;
        if self.state.is_seeking() {
            return Err(ReplayError::InvalidTransition { from: self.state.mode, action: "step" });
        }

        self.pause();
        self.state.future_hidden = true;
        if Some(cursor) >= self.last_index() {
            return Ok(None);
        }
        self.state.cursor_index = Some(cursor + 1);
        Ok(Some(cursor + 1))
    }

    /// `ReplayPaused | ReplayPlaying -> ReplaySeeking`.
    pub fn begin_jump(&mut self) -> Result<(), ReplayError> {
        match self.state.mode {
            ReplayMode::Live => Err(ReplayError::NotActive),
            _ => {
                self.state.mode = ReplayMode::ReplaySeeking;
                self.state.seek_locked = false;
                Ok(())
            }
        }
    }

    /// `ReplaySeeking -> ReplayPaused` at the picked bar.
    pub fn confirm_jump(&mut self, index: usize) -> Result<usize, ReplayError> {
        if !self.state.is_seeking() {
            return Err(ReplayError::InvalidTransition { from: self.state.mode, action: "confirm jump" });
        }
        let clamped = self.clamp(index);
        self.state.mode = ReplayMode::ReplayPaused;
        self.state.cursor_index = Some(clamped);
        self.state.future_hidden = true;
        Ok(clamped)
    }

    pub fn set_seek_locked(&mut self, locked: bool) {
        self.state.seek_locked = locked && self.state.is_replay();
    }

    /// Accepts any finite positive multiplier, clamped to the configured bounds.
    pub fn set_speed(&mut self, multiplier: f64) -> Result<f64, ValidationError> {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(ValidationError::InvalidSpeed(multiplier));
        }
        let speed = multiplier.clamp(self.min_speed, self.max_speed);
        self.state.speed_multiplier = speed;
        Ok(speed)
    }

    pub fn tick_interval(&self) -> Duration {
        let millis = self.base_interval_ms as f64 / self.state.speed_multiplier;
        Duration::from_micros((millis * 1000.0).round() as u64)
    }

    fn last_index(&self) -> Option<usize> {
        self.history().len().checked_sub(1)
    }

    fn clamp(&self, index: usize) -> usize {
        self.last_index().map_or(0, |last| index.min(last))
    }
}
