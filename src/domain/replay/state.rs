use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayMode {
    #[default]
    #[display(fmt = "live")]
    Live,
    #[display(fmt = "replay-paused")]
    ReplayPaused,
    #[display(fmt = "replay-playing")]
    ReplayPlaying,
    /// Full history revealed while the user picks a point to jump to.
    #[display(fmt = "replay-seeking")]
    ReplaySeeking,
}

impl ReplayMode {
    pub fn is_replay(&self) -> bool {
        !matches!(self, ReplayMode::Live)
    }
}

/// Snapshot of the replay state machine, written only by `ReplayController`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplayState {
    pub mode: ReplayMode,
    pub speed_multiplier: f64,
    /// Always within `[0, len(history) - 1]` while replaying, `None` in live mode.
    pub cursor_index: Option<usize>,
    pub seek_locked: bool,
    /// Whether bars after the cursor are withheld from the surface.
    pub future_hidden: bool,
}

impl Default for ReplayState {
    fn default() -> Self {
        Self {
            mode: ReplayMode::Live,
            speed_multiplier: 1.0,
            cursor_index: None,
            seek_locked: false,
            future_hidden: false,
        }
    }
}

impl ReplayState {
    pub fn is_replay(&self) -> bool {
        self.mode.is_replay()
    }

    pub fn is_playing(&self) -> bool {
        self.mode == ReplayMode::ReplayPlaying
    }

    pub fn is_seeking(&self) -> bool {
        self.mode == ReplayMode::ReplaySeeking
    }
}
