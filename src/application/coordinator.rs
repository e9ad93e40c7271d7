use crate::config::EngineConfig;
use crate::domain::{
    annotations::{AlertSummary, AlertTriggered, DrawingToolSubsystem, ToolKind, ToolRequest},
    chart::{
        ChartSurface, ChartType, SeriesPoint, ViewportGuard, jump_range, last_point_for,
        series_for,
    },
    errors::{ApplicationError, InfrastructureError, ReplayError, ValidationError},
    events::{EngineEvent, EventDispatcher, InMemoryEventDispatcher},
    logging::{LogComponent, LogLevel, get_logger},
    market_data::{
        Candle, CandleStore, IndicatorEngine, IndicatorKind, IndicatorSettings, IndicatorUpdate, LiveTick,
        MergeOutcome, Price, Symbol, TickRejection, TimeInterval,
    },
    replay::{
        PlaybackStep, ReplayController, ReplayMode, ReplayState, ScrubAction, ScrubCommit,
        ScrubContext, ScrubInput, SeekIndicator, resolve_index,
    },
};
use crate::time_utils;
use crate::{log_debug, log_info, log_warn};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use strum::IntoEnumIterator;

use super::annotation_bridge::AnnotationBridge;

/// Identifies one historical load. Results carrying an older generation are
/// discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    symbol: Symbol,
    interval: TimeInterval,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn interval(&self) -> TimeInterval {
        self.interval
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(usize),
    /// The source answered with no usable bars.
    Empty,
    /// The request failed; previous data stays on screen.
    Failed,
    /// Superseded by a newer symbol or interval selection.
    Stale,
    /// Aborted before the source answered.
    Cancelled,
}

/// Identifies one comparison overlay fetch. It goes stale when the main
/// symbol or interval changes or the overlay is toggled off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonTicket {
    id: u64,
    generation: u64,
    symbol: Symbol,
    interval: TimeInterval,
}

impl ComparisonTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn interval(&self) -> TimeInterval {
        self.interval
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonToggle {
    Fetch(ComparisonTicket),
    Removed,
    /// No main symbol has been selected yet.
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOutcome {
    Loaded(usize),
    Removed,
    Unavailable,
    Failed,
    Stale,
    Cancelled,
}

const COMPARISON_COLORS: [&str; 5] = ["#f57f17", "#e91e63", "#9c27b0", "#673ab7", "#3f51b5"];

#[derive(Debug)]
struct ComparisonOverlay {
    id: u64,
    symbol: Symbol,
    color: &'static str,
    shown: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Rendered(MergeOutcome),
    /// Merged into the store while replay holds the surface.
    Deferred(MergeOutcome),
    Rejected(TickRejection),
    Stale,
}

/// Owns every engine component and the rendering surface, and routes host
/// requests, data arrivals and pointer input between them.
///
/// Single-threaded: the host drives it from one event loop and every call
/// runs to completion. Events raised during a call are queued; shared owners
/// go through [`update_and_notify`] so handlers run after the borrow ends.
pub struct ChartCoordinator {
    config: EngineConfig,
    surface: Box<dyn ChartSurface>,
    store: CandleStore,
    indicators: IndicatorEngine,
    replay: ReplayController,
    scrub: ScrubInput,
    viewport: ViewportGuard,
    annotations: AnnotationBridge,
    events: Rc<InMemoryEventDispatcher>,
    outbox: Vec<EngineEvent>,
    comparisons: Vec<ComparisonOverlay>,
    next_comparison_id: u64,
    symbol: Option<Symbol>,
    /// Symbol whose bars are in the store.
    loaded_symbol: Option<Symbol>,
    interval: Option<TimeInterval>,
    chart_type: ChartType,
    generation: u64,
    loading: bool,
    connection_lost: bool,
}

impl ChartCoordinator {
    pub fn new(
        config: EngineConfig,
        surface: Box<dyn ChartSurface>,
        tools: Box<dyn DrawingToolSubsystem>,
    ) -> Self {
        get_logger().info(
            LogComponent::Application("ChartCoordinator"),
            "Creating chart coordinator",
        );
        Self {
            indicators: IndicatorEngine::new(config.indicator_window),
            replay: ReplayController::new(
                config.base_playback_interval_ms,
                config.min_speed,
                config.max_speed,
            ),
            scrub: ScrubInput::new(config.scrub_settings()),
            viewport: ViewportGuard::new(config.default_candle_window, config.right_offset),
            annotations: AnnotationBridge::new(tools),
            events: Rc::new(InMemoryEventDispatcher::new()),
            outbox: Vec::new(),
            comparisons: Vec::new(),
            next_comparison_id: 0,
            store: CandleStore::new(),
            surface,
            config,
            symbol: None,
            loaded_symbol: None,
            interval: None,
            chart_type: ChartType::default(),
            generation: 0,
            loading: false,
            connection_lost: false,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &CandleStore {
        &self.store
    }

    pub fn surface(&self) -> &dyn ChartSurface {
        self.surface.as_ref()
    }

    pub fn replay_state(&self) -> &ReplayState {
        self.replay.state()
    }

    pub fn replay_mode(&self) -> ReplayMode {
        self.replay.mode()
    }

    pub fn chart_type(&self) -> ChartType {
        self.chart_type
    }

    pub fn indicator_settings(&self) -> IndicatorSettings {
        self.indicators.settings()
    }

    pub fn symbol(&self) -> Option<&Symbol> {
        self.symbol.as_ref()
    }

    pub fn interval(&self) -> Option<TimeInterval> {
        self.interval
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Last close of the selected symbol. `None` while the store still holds
    /// another symbol's bars after a failed switch.
    pub fn current_price(&self) -> Option<Price> {
        if self.loaded_symbol.is_none() || self.loaded_symbol != self.symbol {
            return None;
        }
        self.store.current_price()
    }

    pub fn active_tool(&self) -> ToolKind {
        self.annotations.active_tool()
    }

    pub fn alerts(&self) -> &[AlertSummary] {
        self.annotations.alerts()
    }

    pub fn playback_interval(&self) -> Duration {
        self.replay.tick_interval()
    }

    pub fn comparison_symbols(&self) -> Vec<Symbol> {
        self.comparisons.iter().map(|overlay| overlay.symbol.clone()).collect()
    }

    pub fn subscribe<F>(&self, handler: F)
    where
        F: Fn(&EngineEvent) + 'static,
    {
        self.events.subscribe(handler);
    }

    pub fn dispatcher(&self) -> Rc<InMemoryEventDispatcher> {
        Rc::clone(&self.events)
    }

    /// Drains the events raised since the last call, oldest first.
    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.outbox)
    }

    // ---- data loading -------------------------------------------------

    /// Starts a symbol or interval switch. Tears down replay and interaction
    /// state and hides the surface until [`Self::complete_load`] runs.
    pub fn begin_load(&mut self, symbol: Symbol, interval: TimeInterval) -> LoadTicket {
        self.teardown();
        self.generation += 1;
        log_info!(
            LogComponent::Application("ChartCoordinator"),
            "loading {} {} (generation {})",
            symbol,
            interval,
            self.generation
        );

        self.annotations.set_symbol(&symbol);
        self.symbol = Some(symbol.clone());
        self.interval = Some(interval);
        self.set_loading(true);
        LoadTicket { generation: self.generation, symbol, interval }
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.generation == self.generation
    }

    pub fn complete_load(
        &mut self,
        ticket: &LoadTicket,
        result: Result<Vec<Candle>, InfrastructureError>,
    ) -> LoadOutcome {
        if !self.is_current(ticket) {
            log_debug!(
                LogComponent::Application("ChartCoordinator"),
                "discarding stale load for {} (generation {} < {})",
                ticket.symbol,
                ticket.generation,
                self.generation
            );
            return LoadOutcome::Stale;
        }
        self.set_loading(false);

        let candles = match result {
            Ok(candles) => candles,
            Err(error) => {
                get_logger().log_with_context(
                    LogLevel::Warn,
                    LogComponent::Application("ChartCoordinator"),
                    &format!("history load for {} failed: {}", ticket.symbol, error),
                    &format!("generation={} interval={}", ticket.generation, ticket.interval),
                );
                self.publish(EngineEvent::LoadFailed {
                    symbol: ticket.symbol.clone(),
                    reason: error.to_string(),
                });
                return LoadOutcome::Failed;
            }
        };

        self.store.load(candles);
        self.loaded_symbol = Some(ticket.symbol.clone());
        self.indicators.reset();
        self.render_live();
        self.viewport.apply_default(self.surface.as_mut(), self.store.len());

        let count = self.store.len();
        self.publish(EngineEvent::HistoricalDataLoaded {
            symbol: ticket.symbol.clone(),
            interval: ticket.interval,
            candle_count: count,
        });
        if count == 0 { LoadOutcome::Empty } else { LoadOutcome::Loaded(count) }
    }

    /// Streaming update from the live source subscribed under `generation`.
    pub fn on_live_tick(&mut self, generation: u64, tick: LiveTick) -> TickOutcome {
        if generation != self.generation {
            return TickOutcome::Stale;
        }
        let Some(interval) = self.interval else {
            return TickOutcome::Stale;
        };
        self.connection_lost = false;

        let outcome = self.store.merge_live_tick(tick, interval);
        if let MergeOutcome::Rejected(reason) = outcome {
            #[cfg(debug_assertions)]
            get_logger().log_with_context(
                LogLevel::Debug,
                LogComponent::Application("ChartCoordinator"),
                &format!("dropped live tick: {:?}", reason),
                &serde_json::to_string(&tick).unwrap_or_default(),
            );
            return TickOutcome::Rejected(reason);
        }
        if self.replay.is_active() {
            return TickOutcome::Deferred(outcome);
        }

        if let Some(point) = last_point_for(self.chart_type, self.store.current()) {
            self.surface.update(point);
        }
        for (kind, update) in self.indicators.update_last(self.store.current()) {
            match update {
                IndicatorUpdate::Point(point) => self.surface.update_indicator(kind, point),
                IndicatorUpdate::Full(series) => self.surface.set_indicator(kind, &series),
            }
        }
        TickOutcome::Rendered(outcome)
    }

    /// The live stream under `generation` dropped. Publishes one
    /// [`EngineEvent::ConnectionLost`] per drop; the next tick re-arms it.
    pub fn on_connection_lost(&mut self, generation: u64, reason: String) -> bool {
        if generation != self.generation || self.connection_lost {
            return false;
        }
        let Some(symbol) = self.symbol.clone() else {
            return false;
        };
        self.connection_lost = true;
        log_warn!(
            LogComponent::Application("ChartCoordinator"),
            "live stream for {} dropped: {}",
            symbol,
            reason
        );
        self.publish(EngineEvent::ConnectionLost { symbol, reason });
        true
    }

    /// Leaves replay, forgets interaction state and invalidates every pending
    /// load and subscription callback.
    pub fn teardown(&mut self) {
        let was_replaying = self.replay.exit();
        self.scrub.reset();
        self.indicators.reset();
        self.viewport.discard();
        self.clear_comparisons();
        self.connection_lost = false;
        self.generation += 1;
        if was_replaying {
            self.render_live();
            self.publish(EngineEvent::ReplayModeChanged { mode: ReplayMode::Live });
        }
    }

    // ---- replay -------------------------------------------------------

    pub fn toggle_replay(&mut self) -> Result<ReplayMode, ReplayError> {
        if self.replay.is_active() {
            self.exit_replay();
            Ok(ReplayMode::Live)
        } else {
            self.enter_replay()
        }
    }

    pub fn enter_replay(&mut self) -> Result<ReplayMode, ReplayError> {
        let cursor = self.replay.enter(self.store.current().to_vec())?;
        self.indicators.reset();
        self.render_replay();
        self.publish(EngineEvent::ReplayModeChanged { mode: self.replay.mode() });
        self.publish_cursor(cursor);
        Ok(self.replay.mode())
    }

    /// Back to live. Shows the store as it is now, including ticks merged
    /// while replay was active, without moving the viewport.
    pub fn exit_replay(&mut self) -> bool {
        if !self.replay.exit() {
            return false;
        }
        self.scrub.reset();
        self.indicators.reset();
        self.viewport.capture_logical(self.surface.as_ref());
        self.render_live();
        self.viewport.restore(self.surface.as_mut());
        self.publish(EngineEvent::ReplayModeChanged { mode: ReplayMode::Live });
        true
    }

    pub fn play(&mut self) -> Result<(), ReplayError> {
        let before = self.replay.mode();
        self.replay.play()?;
        self.scrub.release_lock();
        if before != self.replay.mode() {
            self.render_replay();
            self.publish(EngineEvent::ReplayModeChanged { mode: self.replay.mode() });
        }
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.replay.mode() == ReplayMode::ReplayPlaying {
            self.replay.pause();
            self.publish(EngineEvent::ReplayModeChanged { mode: self.replay.mode() });
        }
    }

    pub fn toggle_play(&mut self) -> Result<ReplayMode, ReplayError> {
        if self.replay.state().is_playing() {
            self.pause();
        } else {
            self.play()?;
        }
        Ok(self.replay.mode())
    }

    /// Takes effect on the next scheduled tick.
    pub fn set_speed(&mut self, multiplier: f64) -> Result<f64, ValidationError> {
        let speed = self.replay.set_speed(multiplier)?;
        log_debug!(LogComponent::Application("ChartCoordinator"), "playback speed {}x", speed);
        Ok(speed)
    }

    /// Handler for the playback timer.
    pub fn playback_tick(&mut self) -> PlaybackStep {
        let step = self.replay.advance();
        match step {
            PlaybackStep::Idle => {}
            PlaybackStep::Advanced(index) => {
                self.render_replay();
                self.publish_cursor(index);
            }
            PlaybackStep::Finished(index) => {
                self.render_replay();
                self.publish_cursor(index);
                self.publish(EngineEvent::ReplayModeChanged { mode: self.replay.mode() });
            }
        }
        step
    }

    pub fn step_forward(&mut self) -> Result<Option<usize>, ReplayError> {
        let was_playing = self.replay.state().is_playing();
        let moved = self.replay.step_forward()?;
        self.render_replay();
        if was_playing {
            self.publish(EngineEvent::ReplayModeChanged { mode: self.replay.mode() });
        }
        if let Some(index) = moved {
            self.publish_cursor(index);
        }
        Ok(moved)
    }

    /// Moves the cursor directly, as a committed scrub would.
    pub fn seek_to(&mut self, index: usize, reveal_future: bool) -> Result<usize, ReplayError> {
        let index = self.replay.seek_to(index, reveal_future)?;
        self.render_replay();
        self.publish_cursor(index);
        Ok(index)
    }

    /// Enters jump picking: playback stops and the whole history is shown
    /// until a point is picked.
    pub fn request_jump(&mut self) -> Result<(), ReplayError> {
        self.replay.begin_jump()?;
        self.scrub.release_lock();
        self.viewport.capture_time(self.surface.as_ref());
        self.render_visible();
        self.viewport.restore(self.surface.as_mut());
        self.publish(EngineEvent::ReplayModeChanged { mode: self.replay.mode() });
        Ok(())
    }

    /// Picks the jump target under `x` and frames the view around it.
    pub fn pick_jump_point(&mut self, x: f64) -> Result<usize, ReplayError> {
        if !self.replay.state().is_seeking() {
            return Err(ReplayError::InvalidTransition {
                from: self.replay.mode(),
                action: "pick a jump point",
            });
        }
        let time_at_x = self.surface.coordinate_to_time(x);
        let index = resolve_index(self.replay.history(), self.surface.width(), x, time_at_x)
            .ok_or(ReplayError::NoData)?;

        let current = self.surface.visible_time_range();
        let index = self.replay.confirm_jump(index)?;
        self.render_visible();
        let target = jump_range(
            self.replay.history(),
            index,
            current,
            self.config.jump_min_width_ratio,
            self.config.jump_fallback_window,
        );
        if let Some(range) = target {
            self.surface.set_visible_time_range(range);
        }

        self.publish(EngineEvent::ReplayModeChanged { mode: self.replay.mode() });
        self.publish_cursor(index);
        Ok(index)
    }

    // ---- pointer input ------------------------------------------------

    pub fn seek_indicator(&self) -> SeekIndicator {
        self.scrub.indicator(
            self.replay.state(),
            self.replay.history().len(),
            self.surface.width(),
        )
    }

    pub fn pointer_entered(&mut self, x: f64) -> SeekIndicator {
        let ctx = ScrubContext {
            history: self.replay.history(),
            state: self.replay.state(),
            width: self.surface.width(),
        };
        self.scrub.pointer_enter(x, &ctx);
        self.seek_indicator()
    }

    pub fn pointer_moved(&mut self, x: f64, now_ms: u64) -> SeekIndicator {
        let ctx = ScrubContext {
            history: self.replay.history(),
            state: self.replay.state(),
            width: self.surface.width(),
        };
        self.scrub.pointer_move(x, now_ms, &ctx);
        self.seek_indicator()
    }

    pub fn pointer_left(&mut self) -> SeekIndicator {
        self.scrub.pointer_leave();
        self.seek_indicator()
    }

    pub fn pointer_pressed(&mut self, x: f64, now_ms: u64) {
        self.scrub.pointer_down(x, now_ms);
    }

    /// A click either picks the jump target or commits and locks the cursor.
    pub fn clicked(&mut self, x: f64, now_ms: u64) -> Result<Option<usize>, ReplayError> {
        if self.replay.state().is_seeking() {
            return self.pick_jump_point(x).map(Some);
        }
        let time_at_x = self.surface.coordinate_to_time(x);
        let ctx = ScrubContext {
            history: self.replay.history(),
            state: self.replay.state(),
            width: self.surface.width(),
        };
        let action = self.scrub.click(x, time_at_x, now_ms, &ctx);
        Ok(self.apply_scrub(action))
    }

    pub fn drag_started(&mut self) -> bool {
        let ctx = ScrubContext {
            history: self.replay.history(),
            state: self.replay.state(),
            width: self.surface.width(),
        };
        let started = self.scrub.drag_start(&ctx);
        if started {
            self.replay.set_seek_locked(false);
        }
        started
    }

    pub fn dragged(&mut self, x: f64, now_ms: u64) -> Option<usize> {
        let time_at_x = self.surface.coordinate_to_time(x);
        let ctx = ScrubContext {
            history: self.replay.history(),
            state: self.replay.state(),
            width: self.surface.width(),
        };
        let action = self.scrub.drag_move(x, time_at_x, now_ms, &ctx);
        self.apply_scrub(action)
    }

    pub fn drag_released(&mut self, x: f64) -> Option<usize> {
        let time_at_x = self.surface.coordinate_to_time(x);
        let ctx = ScrubContext {
            history: self.replay.history(),
            state: self.replay.state(),
            width: self.surface.width(),
        };
        let action = self.scrub.drag_end(x, time_at_x, &ctx);
        self.apply_scrub(action)
    }

    fn apply_scrub(&mut self, action: ScrubAction) -> Option<usize> {
        match action {
            ScrubAction::Commit(commit) => self.commit(commit),
            ScrubAction::Preview { .. } | ScrubAction::None => None,
        }
    }

    fn commit(&mut self, commit: ScrubCommit) -> Option<usize> {
        let was_playing = self.replay.state().is_playing();
        let index = match self.replay.seek_to(commit.index, commit.reveal_future) {
            Ok(index) => index,
            Err(error) => {
                log_debug!(LogComponent::Application("ChartCoordinator"), "scrub ignored: {}", error);
                return None;
            }
        };
        if commit.lock {
            self.replay.set_seek_locked(true);
        }
        self.render_replay();
        if was_playing {
            self.publish(EngineEvent::ReplayModeChanged { mode: self.replay.mode() });
        }
        self.publish_cursor(index);
        Some(index)
    }

    // ---- comparison overlays ------------------------------------------

    /// Adds `symbol` as an overlay, or removes it when already shown.
    pub fn toggle_comparison(&mut self, symbol: Symbol) -> ComparisonToggle {
        if let Some(position) = self.comparisons.iter().position(|o| o.symbol == symbol) {
            let overlay = self.comparisons.remove(position);
            if overlay.shown {
                self.surface.remove_comparison(&overlay.symbol);
            }
            return ComparisonToggle::Removed;
        }
        let Some(interval) = self.interval else {
            return ComparisonToggle::Unavailable;
        };

        self.next_comparison_id += 1;
        let color = COMPARISON_COLORS[self.comparisons.len() % COMPARISON_COLORS.len()];
        self.comparisons.push(ComparisonOverlay {
            id: self.next_comparison_id,
            symbol: symbol.clone(),
            color,
            shown: false,
        });
        ComparisonToggle::Fetch(ComparisonTicket {
            id: self.next_comparison_id,
            generation: self.generation,
            symbol,
            interval,
        })
    }

    pub fn complete_comparison(
        &mut self,
        ticket: &ComparisonTicket,
        result: Result<Vec<Candle>, InfrastructureError>,
    ) -> ComparisonOutcome {
        let position = self.comparisons.iter().position(|o| o.id == ticket.id);
        let Some(position) = position.filter(|_| ticket.generation == self.generation) else {
            log_debug!(
                LogComponent::Application("ChartCoordinator"),
                "discarding stale comparison load for {}",
                ticket.symbol
            );
            return ComparisonOutcome::Stale;
        };

        let candles = match result {
            Ok(candles) => candles,
            Err(error) => {
                log_warn!(
                    LogComponent::Application("ChartCoordinator"),
                    "comparison load for {} failed: {}",
                    ticket.symbol,
                    error
                );
                self.comparisons.remove(position);
                return ComparisonOutcome::Failed;
            }
        };

        let points: Vec<SeriesPoint> = candles
            .iter()
            .map(|c| SeriesPoint::Value { time: c.time.value(), value: c.close() })
            .collect();
        let overlay = &mut self.comparisons[position];
        overlay.shown = true;
        self.surface.set_comparison(&overlay.symbol, overlay.color, &points);
        ComparisonOutcome::Loaded(points.len())
    }

    fn clear_comparisons(&mut self) {
        for overlay in self.comparisons.drain(..) {
            if overlay.shown {
                self.surface.remove_comparison(&overlay.symbol);
            }
        }
    }

    // ---- presentation -------------------------------------------------

    /// Redraws in the new style. Replay keeps the viewport; live mode resets
    /// to the default window.
    pub fn set_chart_type(&mut self, chart_type: ChartType) {
        if chart_type == self.chart_type {
            return;
        }
        self.chart_type = chart_type;
        self.indicators.reset();
        if self.replay.is_active() {
            self.render_replay();
        } else {
            self.render_live();
            self.viewport.apply_default(self.surface.as_mut(), self.store.len());
        }
    }

    pub fn set_indicator_settings(&mut self, settings: IndicatorSettings) {
        self.indicators.set_settings(settings);
        let candles = if self.replay.is_active() {
            self.replay.indicator_candles()
        } else {
            self.store.current()
        };
        render_indicators(self.surface.as_mut(), &mut self.indicators, candles);
    }

    pub fn reset_view(&mut self) {
        let len = if self.replay.is_active() {
            self.replay.visible_candles().len()
        } else {
            self.store.len()
        };
        self.viewport.apply_default(self.surface.as_mut(), len);
    }

    /// Time left in the forming bar. Not shown during replay.
    pub fn countdown(&self, now_secs: u64) -> Option<String> {
        if self.replay.is_active() {
            return None;
        }
        self.interval.map(|interval| time_utils::countdown_to_next_bar(now_secs, interval))
    }

    // ---- annotations --------------------------------------------------

    pub fn start_tool(&mut self, name: &str) -> Result<ToolKind, ValidationError> {
        self.annotations.start_tool_by_name(name)
    }

    pub fn start_tool_request(&mut self, request: ToolRequest) -> ToolKind {
        self.annotations.start_tool(request)
    }

    pub fn cancel_tool(&mut self) {
        self.annotations.cancel_tool();
    }

    pub fn clear_drawings(&mut self) {
        self.annotations.clear_all();
    }

    pub fn on_tool_finished(&mut self) {
        let event = self.annotations.tool_finished();
        self.publish(event);
    }

    pub fn on_alert_triggered(&mut self, alert: AlertTriggered) {
        let event = self.annotations.alert_triggered(alert);
        self.publish(event);
    }

    pub fn on_alert_list_changed(&mut self, alerts: Vec<AlertSummary>) {
        let event = self.annotations.alert_list_changed(alerts);
        self.publish(event);
    }

    pub fn create_alert_at_current_price(&mut self) -> Result<f64, ApplicationError> {
        let price = self.current_price();
        self.annotations.create_alert_at_current_price(price)
    }

    pub fn add_price_alert(&mut self, price: f64, condition: Option<&str>) -> Result<(), ValidationError> {
        self.annotations.add_price_alert(price, condition)
    }

    pub fn remove_price_alert(&mut self, id: &str) {
        self.annotations.remove_price_alert(id);
    }

    // ---- helpers ------------------------------------------------------

    fn set_loading(&mut self, loading: bool) {
        if self.loading != loading {
            self.loading = loading;
            self.surface.set_loading(loading);
        }
    }

    fn publish(&mut self, event: EngineEvent) {
        self.outbox.push(event);
    }

    fn publish_cursor(&mut self, index: usize) {
        let time = self.replay.history().get(index).map(|candle| candle.time.value());
        if let Some(time) = time {
            self.publish(EngineEvent::CursorMoved { index, time });
        }
    }

    fn render_live(&mut self) {
        render_series(self.surface.as_mut(), self.chart_type, self.store.current());
        render_indicators(self.surface.as_mut(), &mut self.indicators, self.store.current());
    }

    /// Replay rendering with the logical range preserved.
    fn render_replay(&mut self) {
        self.viewport.capture_logical(self.surface.as_ref());
        self.render_visible();
        self.viewport.restore(self.surface.as_mut());
    }

    fn render_visible(&mut self) {
        render_series(self.surface.as_mut(), self.chart_type, self.replay.visible_candles());
        render_indicators(
            self.surface.as_mut(),
            &mut self.indicators,
            self.replay.indicator_candles(),
        );
    }
}

/// Runs `action` on a shared coordinator, then delivers the events it raised
/// once the borrow is released. Handlers may call back into the coordinator.
pub fn update_and_notify<R>(
    coordinator: &RefCell<ChartCoordinator>,
    action: impl FnOnce(&mut ChartCoordinator) -> R,
) -> R {
    let (result, events, dispatcher) = {
        let mut guard = coordinator.borrow_mut();
        let result = action(&mut guard);
        (result, guard.take_events(), guard.dispatcher())
    };
    deliver(&dispatcher, events);
    result
}

/// [`update_and_notify`] for callbacks that may fire while the coordinator is
/// already borrowed. Returns `None` without running `action` in that case.
pub fn try_update_and_notify<R>(
    coordinator: &RefCell<ChartCoordinator>,
    action: impl FnOnce(&mut ChartCoordinator) -> R,
) -> Option<R> {
    let (result, events, dispatcher) = {
        let mut guard = coordinator.try_borrow_mut().ok()?;
        let result = action(&mut guard);
        (result, guard.take_events(), guard.dispatcher())
    };
    deliver(&dispatcher, events);
    Some(result)
}

fn deliver(dispatcher: &InMemoryEventDispatcher, events: Vec<EngineEvent>) {
    for event in events {
        dispatcher.publish(event);
    }
}

fn render_series(surface: &mut dyn ChartSurface, chart_type: ChartType, candles: &[Candle]) {
    surface.set_data(&series_for(chart_type, candles));
}

fn render_indicators(surface: &mut dyn ChartSurface, engine: &mut IndicatorEngine, candles: &[Candle]) {
    let enabled = engine.recompute_all(candles);
    for kind in IndicatorKind::iter() {
        match enabled.iter().find(|(k, _)| *k == kind) {
            Some((_, series)) => surface.set_indicator(kind, series),
            None => surface.clear_indicator(kind),
        }
    }
}
