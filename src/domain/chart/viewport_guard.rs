use super::surface::ChartSurface;
use super::value_objects::{LogicalRange, TimeRange};
use crate::domain::logging::LogComponent;
use crate::domain::market_data::Candle;
use crate::log_trace;

pub const DEFAULT_CANDLE_WINDOW: usize = 230;
pub const DEFAULT_RIGHT_OFFSET: usize = 10;

/// Range captured before a dataset replacement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeSnapshot {
    Logical(LogicalRange),
    Time(TimeRange),
}

/// Keeps the user's zoom and pan across operations that swap the rendered
/// dataset.
///
/// Usage is capture, replace data, restore. Without a capture the surface
/// keeps whatever it chose, which is only acceptable for explicit resets.
#[derive(Debug, Clone)]
pub struct ViewportGuard {
    default_window: usize,
    right_offset: usize,
    captured: Option<RangeSnapshot>,
}

impl Default for ViewportGuard {
    fn default() -> Self {
        Self::new(DEFAULT_CANDLE_WINDOW, DEFAULT_RIGHT_OFFSET)
    }
}

impl ViewportGuard {
    pub fn new(default_window: usize, right_offset: usize) -> Self {
        Self { default_window, right_offset, captured: None }
    }

    pub fn capture_logical(&mut self, surface: &dyn ChartSurface) {
        self.captured = surface.visible_logical_range().map(RangeSnapshot::Logical);
    }

    pub fn capture_time(&mut self, surface: &dyn ChartSurface) {
        self.captured = surface.visible_time_range().map(RangeSnapshot::Time);
    }

    pub fn captured(&self) -> Option<RangeSnapshot> {
        self.captured
    }

    /// Reapplies the captured range. Returns `false` when nothing was captured.
    pub fn restore(&mut self, surface: &mut dyn ChartSurface) -> bool {
        match self.captured.take() {
            Some(RangeSnapshot::Logical(range)) => {
                surface.set_visible_logical_range(range);
                true
            }
            Some(RangeSnapshot::Time(range)) => {
                surface.set_visible_time_range(range);
                true
            }
            None => false,
        }
    }

    pub fn discard(&mut self) {
        self.captured = None;
    }

    /// Most recent `default_window` bars plus `right_offset` empty slots.
    pub fn default_range(&self, len: usize) -> Option<LogicalRange> {
        if len == 0 {
            return None;
        }
        let to = (len - 1 + self.right_offset) as f64;
        Some(LogicalRange::new(to - self.default_window as f64, to))
    }

    pub fn apply_default(
        &mut self,
        surface: &mut dyn ChartSurface,
        len: usize,
    ) -> Option<LogicalRange> {
        self.captured = None;
        let range = self.default_range(len)?;
        log_trace!(
            LogComponent::Domain("ViewportGuard"),
            "default window {:.0}..{:.0} for {} candles",
            range.from,
            range.to,
            len
        );
        surface.set_visible_logical_range(range);
        Some(range)
    }
}

/// Time window to show after a replay point is picked.
///
/// Keeps the previous width centered on the selected bar, clipped to
/// `[first, selected]`. A clip that loses more than `min_ratio` of the width is
/// rejected in favor of the half `fallback_window` bars ending at the
/// selection.
pub fn jump_range(
    history: &[Candle],
    selected: usize,
    current: Option<TimeRange>,
    min_ratio: f64,
    fallback_window: usize,
) -> Option<TimeRange> {
    let selected_time = history.get(selected)?.time.value();
    let first_time = history.first()?.time.value();

    let centered = current.filter(|range| range.width() > 0).and_then(|range| {
        let width = range.width();
        let half = width / 2;
        let ideal_from = selected_time.saturating_sub(half);
        let ideal_to = selected_time.saturating_add(width - half);

        let mut from = first_time.max(ideal_from);
        let mut to = selected_time.min(ideal_to);
        if from == first_time && to < ideal_to {
            to = selected_time.min(from.saturating_add(width));
        } else if to == selected_time && from > ideal_from {
            from = first_time.max(to.saturating_sub(width));
        }

        let kept = (to.saturating_sub(from)) as f64;
        (to > from && kept >= width as f64 * min_ratio).then_some(TimeRange::new(from, to))
    });

    centered.or_else(|| {
        let start = selected.saturating_sub(fallback_window / 2);
        Some(TimeRange::new(history[start].time.value(), selected_time))
    })
}
