use super::value_objects::{LogicalRange, SeriesPoint, TimeRange};
use crate::domain::market_data::{IndicatorKind, IndicatorPoint, Symbol};

/// Rendering surface the engine draws into.
///
/// The host owns the actual chart; the engine only pushes series, reads the
/// coordinate mapping and moves the visible window. Pointer events flow the
/// other way, from the host into the coordinator.
pub trait ChartSurface {
    fn set_data(&mut self, series: &[SeriesPoint]);

    /// Replaces the last point when times match, appends otherwise.
    fn update(&mut self, point: SeriesPoint);

    fn set_indicator(&mut self, kind: IndicatorKind, series: &[IndicatorPoint]);

    fn update_indicator(&mut self, kind: IndicatorKind, point: IndicatorPoint);

    fn clear_indicator(&mut self, kind: IndicatorKind);

    /// Overlay line for a compared symbol, replacing any earlier one.
    fn set_comparison(&mut self, symbol: &Symbol, color: &str, series: &[SeriesPoint]);

    fn remove_comparison(&mut self, symbol: &Symbol);

    /// Candle time under a horizontal pixel position, if any.
    fn coordinate_to_time(&self, x: f64) -> Option<u64>;

    fn time_to_coordinate(&self, time: u64) -> Option<f64>;

    fn visible_logical_range(&self) -> Option<LogicalRange>;

    fn set_visible_logical_range(&mut self, range: LogicalRange);

    fn visible_time_range(&self) -> Option<TimeRange>;

    fn set_visible_time_range(&mut self, range: TimeRange);

    /// Plot width in pixels.
    fn width(&self) -> f64;

    /// Single visibility switch; the surface dims itself while loading.
    fn set_loading(&mut self, loading: bool);
}
