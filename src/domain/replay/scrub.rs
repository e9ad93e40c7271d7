use super::state::ReplayState;
use crate::domain::market_data::Candle;

/// Interaction mode of the seek handle. Exactly one holds at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrubMode {
    Following,
    Locked,
    Dragging,
}

/// Cursor change requested by pointer input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrubCommit {
    pub index: usize,
    /// Keep bars after the cursor on screen (drag preview).
    pub reveal_future: bool,
    /// Freeze the handle at the committed index afterwards.
    pub lock: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrubAction {
    None,
    /// Only the handle moves; nothing is committed.
    Preview { x: f64 },
    Commit(ScrubCommit),
}

/// Where and how the seek handle is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekIndicator {
    pub visible: bool,
    /// Draw the fading preview band left of the handle.
    pub fade: bool,
    pub x: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrubSettings {
    pub drag_throttle_ms: u64,
    pub click_slop_px: f64,
    pub click_max_duration_ms: u64,
    pub follow_suppress_ms: u64,
}

impl Default for ScrubSettings {
    fn default() -> Self {
        Self {
            drag_throttle_ms: 50,
            click_slop_px: 5.0,
            click_max_duration_ms: 300,
            follow_suppress_ms: 150,
        }
    }
}

/// Read-only view of what the pointer maps onto.
#[derive(Debug, Clone, Copy)]
pub struct ScrubContext<'a> {
    pub history: &'a [Candle],
    pub state: &'a ReplayState,
    pub width: f64,
}

impl ScrubContext<'_> {
    fn contains(&self, x: f64) -> bool {
        (0.0..=self.width).contains(&x)
    }
}

/// Nearest bar to `time`: exact match first, else smallest absolute
/// difference, earlier bar on ties.
pub fn nearest_index(history: &[Candle], time: u64) -> Option<usize> {
    let last = history.len().checked_sub(1)?;
    match history.binary_search_by_key(&time, |c| c.time.value()) {
        Ok(i) => Some(i),
        Err(0) => Some(0),
        Err(i) if i > last => Some(last),
        Err(i) => {
            let before = time - history[i - 1].time.value();
            let after = history[i].time.value() - time;
            Some(if after < before { i } else { i - 1 })
        }
    }
}

/// Pointer position to bar index. Uses the surface's time mapping when it
/// has one, otherwise the proportional position across the plot width.
pub fn resolve_index(history: &[Candle], width: f64, x: f64, time_at_x: Option<u64>) -> Option<usize> {
    if let Some(time) = time_at_x {
        return nearest_index(history, time);
    }
    let last = history.len().checked_sub(1)?;
    if width <= 0.0 || !x.is_finite() {
        return Some(last);
    }
    let progress = (x / width).clamp(0.0, 1.0);
    Some(((progress * history.len() as f64).floor() as usize).min(last))
}

/// Pointer, click and drag handling for the replay seek handle.
///
/// Holds only interaction bookkeeping. The cursor itself lives in the replay
/// controller; this type emits [`ScrubAction`]s that the coordinator applies.
#[derive(Debug, Clone, Default)]
pub struct ScrubInput {
    settings: ScrubSettings,
    pointer_inside: bool,
    hover_x: Option<f64>,
    dragging: bool,
    press: Option<(f64, u64)>,
    last_drag_commit_ms: Option<u64>,
    suppress_follow_until_ms: Option<u64>,
}

impl ScrubInput {
    pub fn new(settings: ScrubSettings) -> Self {
        Self { settings, ..Self::default() }
    }

    pub fn settings(&self) -> &ScrubSettings {
        &self.settings
    }

    pub fn mode(&self, state: &ReplayState) -> ScrubMode {
        if self.dragging {
            ScrubMode::Dragging
        } else if state.seek_locked {
            ScrubMode::Locked
        } else {
            ScrubMode::Following
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Clears drag and click bookkeeping. Part of teardown.
    pub fn reset(&mut self) {
        *self = Self::new(self.settings);
    }

    pub fn indicator(&self, state: &ReplayState, history_len: usize, width: f64) -> SeekIndicator {
        if !state.is_replay() {
            return SeekIndicator { visible: false, fade: false, x: None };
        }
        let locked = state.seek_locked;
        let playing = state.is_playing();
        let following = self.pointer_inside && !locked && !playing;
        let visible = following || self.dragging || state.is_seeking();

        let x = if visible && self.hover_x.is_some() {
            self.hover_x
        } else {
            state.cursor_index.filter(|_| history_len > 0).map(|cursor| {
                (cursor + 1) as f64 / history_len as f64 * width
            })
        };

        SeekIndicator { visible, fade: visible && !locked && !playing, x }
    }

    pub fn pointer_enter(&mut self, x: f64, ctx: &ScrubContext<'_>) -> ScrubAction {
        self.pointer_inside = true;
        if !ctx.state.is_seeking() && (ctx.state.seek_locked || ctx.state.is_playing()) {
            return ScrubAction::None;
        }
        self.hover_x = Some(x);
        ScrubAction::Preview { x }
    }

    pub fn pointer_move(&mut self, x: f64, now_ms: u64, ctx: &ScrubContext<'_>) -> ScrubAction {
        if self.dragging {
            return ScrubAction::None;
        }
        if !ctx.contains(x) {
            self.pointer_inside = false;
            return ScrubAction::None;
        }
        self.pointer_inside = true;

        let frozen = ctx.state.seek_locked || ctx.state.is_playing() || self.follow_suppressed(now_ms);
        if frozen && !ctx.state.is_seeking() {
            return ScrubAction::None;
        }
        self.hover_x = Some(x);
        ScrubAction::Preview { x }
    }

    pub fn pointer_leave(&mut self) {
        self.pointer_inside = false;
        if !self.dragging {
            self.hover_x = None;
        }
    }

    /// Records a press so the following click can be told apart from a drag.
    pub fn pointer_down(&mut self, x: f64, now_ms: u64) {
        self.press = Some((x, now_ms));
    }

    /// Discrete click on the chart. Commits and locks the handle.
    ///
    /// Ignored while seeking; picks during a jump go through the replay
    /// controller directly.
    pub fn click(
        &mut self,
        x: f64,
        time_at_x: Option<u64>,
        now_ms: u64,
        ctx: &ScrubContext<'_>,
    ) -> ScrubAction {
        let press = self.press.take();
        if !ctx.state.is_replay() || ctx.state.is_seeking() || self.dragging {
            return ScrubAction::None;
        }
        if let Some((press_x, pressed_at)) = press {
            let moved = (x - press_x).abs() > self.settings.click_slop_px;
            let held = now_ms.saturating_sub(pressed_at) > self.settings.click_max_duration_ms;
            if moved || held {
                return ScrubAction::None;
            }
        }
        if !ctx.contains(x) {
            return ScrubAction::None;
        }
        let Some(index) = resolve_index(ctx.history, ctx.width, x, time_at_x) else {
            return ScrubAction::None;
        };

        self.hover_x = Some(x);
        self.suppress_follow_until_ms = Some(now_ms + self.settings.follow_suppress_ms);
        ScrubAction::Commit(ScrubCommit { index, reveal_future: false, lock: true })
    }

    /// Returns `false` when dragging is not possible in the current state.
    pub fn drag_start(&mut self, ctx: &ScrubContext<'_>) -> bool {
        if !ctx.state.is_replay() || ctx.state.is_seeking() || ctx.history.is_empty() {
            return false;
        }
        self.dragging = true;
        self.press = None;
        self.last_drag_commit_ms = None;
        true
    }

    /// Throttled preview commit; between commits only the handle moves.
    pub fn drag_move(
        &mut self,
        x: f64,
        time_at_x: Option<u64>,
        now_ms: u64,
        ctx: &ScrubContext<'_>,
    ) -> ScrubAction {
        if !self.dragging {
            return ScrubAction::None;
        }
        let x = x.clamp(0.0, ctx.width.max(0.0));
        self.hover_x = Some(x);

        let due = self
            .last_drag_commit_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= self.settings.drag_throttle_ms);
        if !due {
            return ScrubAction::Preview { x };
        }
        match resolve_index(ctx.history, ctx.width, x, time_at_x) {
            Some(index) => {
                self.last_drag_commit_ms = Some(now_ms);
                ScrubAction::Commit(ScrubCommit { index, reveal_future: true, lock: false })
            }
            None => ScrubAction::Preview { x },
        }
    }

    /// Final, unthrottled commit at the release position.
    pub fn drag_end(&mut self, x: f64, time_at_x: Option<u64>, ctx: &ScrubContext<'_>) -> ScrubAction {
        if !self.dragging {
            return ScrubAction::None;
        }
        self.dragging = false;
        self.last_drag_commit_ms = None;

        let x = x.clamp(0.0, ctx.width.max(0.0));
        self.hover_x = Some(x);
        match resolve_index(ctx.history, ctx.width, x, time_at_x) {
            Some(index) => ScrubAction::Commit(ScrubCommit { index, reveal_future: false, lock: true }),
            None => ScrubAction::None,
        }
    }

    /// Drops the post-click follow suppression, used when the lock is released.
    pub fn release_lock(&mut self) {
        self.suppress_follow_until_ms = None;
    }

    fn follow_suppressed(&self, now_ms: u64) -> bool {
        self.suppress_follow_until_ms.is_some_and(|until| now_ms < until)
    }
}
