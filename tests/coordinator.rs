mod support;

use candle_replay_engine::application::{
    ComparisonOutcome, ComparisonToggle, LoadOutcome, TickOutcome, update_and_notify,
};
use candle_replay_engine::domain::annotations::ToolKind;
use candle_replay_engine::domain::chart::{ChartType, LogicalRange, SeriesPoint, TimeRange};
use candle_replay_engine::domain::errors::{
    ApplicationError, InfrastructureError, NetworkError, ReplayError, ValidationError,
};
use candle_replay_engine::domain::events::EngineEvent;
use candle_replay_engine::domain::market_data::{
    IndicatorKind, IndicatorSettings, LiveTick, MergeOutcome,
};
use candle_replay_engine::domain::replay::{PlaybackStep, ReplayMode};
use std::cell::RefCell;
use std::rc::Rc;
use support::*;

fn tick(time: u64, close: f64) -> LiveTick {
    LiveTick { time, open: close, high: close, low: close, close }
}

/// Replay at bar 2 of 10 with the timer running and the event queue drained.
fn playing() -> Harness {
    let mut h = loaded(10);
    h.coordinator.enter_replay().unwrap();
    h.coordinator.seek_to(2, false).unwrap();
    h.coordinator.play().unwrap();
    assert_eq!(h.coordinator.replay_mode(), ReplayMode::ReplayPlaying);
    h.coordinator.take_events();
    h
}

#[test]
fn load_renders_history_and_default_window() {
    let h = loaded(30);
    let surface = h.surface.borrow();
    assert_eq!(surface.data.len(), 30);
    assert_eq!(surface.loading, vec![true, false]);
    assert_eq!(surface.indicators[&IndicatorKind::Sma].len(), 11);
    assert_eq!(surface.logical_range, Some(LogicalRange::new(-191.0, 39.0)));
    assert_eq!(h.tools.borrow().symbols, vec!["BTCUSDT".to_string()]);
}

#[test]
fn replay_round_trip_restores_the_live_rendering() {
    let mut h = loaded(30);
    let data_before = h.surface.borrow().data.clone();
    let sma_before = h.surface.borrow().indicators[&IndicatorKind::Sma].clone();

    assert_eq!(h.coordinator.toggle_replay(), Ok(ReplayMode::ReplayPaused));
    h.coordinator.seek_to(12, false).unwrap();
    assert_eq!(h.surface.borrow().data.len(), 13);

    assert_eq!(h.coordinator.toggle_replay(), Ok(ReplayMode::Live));
    let surface = h.surface.borrow();
    assert_eq!(surface.data, data_before);
    assert_eq!(surface.indicators[&IndicatorKind::Sma], sma_before);
}

#[test]
fn playback_renders_exactly_the_bars_up_to_the_cursor() {
    let mut h = loaded(12);
    h.coordinator.enter_replay().unwrap();
    h.coordinator.seek_to(8, false).unwrap();
    h.coordinator.play().unwrap();

    assert_eq!(h.coordinator.playback_tick(), PlaybackStep::Advanced(9));
    assert_eq!(h.surface.borrow().data.len(), 10);
    assert_eq!(h.coordinator.playback_tick(), PlaybackStep::Advanced(10));
    assert_eq!(h.surface.borrow().data.len(), 11);
    assert_eq!(h.coordinator.playback_tick(), PlaybackStep::Finished(11));
    assert_eq!(h.coordinator.replay_mode(), ReplayMode::ReplayPaused);
    assert_eq!(h.coordinator.playback_tick(), PlaybackStep::Idle);
    assert_eq!(closes(&h.surface.borrow().data).last(), Some(&12.0));
}

#[test]
fn live_tick_updates_only_the_last_point() {
    let mut h = loaded(30);
    let generation = h.coordinator.generation();

    let outcome = h.coordinator.on_live_tick(generation, tick(1_800 + 15, 50.0));
    assert_eq!(outcome, TickOutcome::Rendered(MergeOutcome::Appended));
    let surface = h.surface.borrow();
    assert_eq!(surface.set_data_calls, 1);
    assert_eq!(surface.updates, 1);
    assert_eq!(surface.data.len(), 31);
    assert_eq!(surface.data[30].time(), 1_800);
    assert_eq!(surface.indicators[&IndicatorKind::Sma].len(), 12);
}

#[test]
fn ticks_during_replay_are_merged_and_shown_on_exit() {
    let mut h = loaded(5);
    let generation = h.coordinator.generation();
    h.coordinator.enter_replay().unwrap();
    h.coordinator.seek_to(1, false).unwrap();

    let outcome = h.coordinator.on_live_tick(generation, tick(300, 99.0));
    assert_eq!(outcome, TickOutcome::Deferred(MergeOutcome::Appended));
    assert_eq!(h.surface.borrow().data.len(), 2);
    assert_eq!(h.coordinator.store().len(), 6);

    h.coordinator.exit_replay();
    let surface = h.surface.borrow();
    assert_eq!(surface.data.len(), 6);
    assert_eq!(closes(&surface.data).last(), Some(&99.0));
}

#[test]
fn ticks_from_an_old_subscription_are_ignored() {
    let mut h = loaded(5);
    let old = h.coordinator.generation();
    let ticket = h.coordinator.begin_load(symbol_of("ETHUSDT"), minute());
    h.coordinator.complete_load(&ticket, Ok(candles(3)));

    assert_eq!(h.coordinator.on_live_tick(old, tick(180, 1.0)), TickOutcome::Stale);
    assert_eq!(h.coordinator.store().len(), 3);
}

#[test]
fn stale_load_result_is_discarded() {
    let mut h = harness();
    let first = h.coordinator.begin_load(symbol_of("BTCUSDT"), minute());
    let second = h.coordinator.begin_load(symbol_of("ETHUSDT"), minute());
    assert!(!h.coordinator.is_current(&first));

    assert_eq!(h.coordinator.complete_load(&first, Ok(candles(50))), LoadOutcome::Stale);
    assert!(h.surface.borrow().data.is_empty());
    assert!(h.coordinator.is_loading());

    assert_eq!(h.coordinator.complete_load(&second, Ok(candles(3))), LoadOutcome::Loaded(3));
    assert_eq!(h.surface.borrow().data.len(), 3);
    assert_eq!(h.coordinator.symbol(), Some(&symbol_of("ETHUSDT")));
}

#[test]
fn failed_load_keeps_previous_data_and_notifies() {
    let mut h = loaded(5);
    h.coordinator.take_events();

    let ticket = h.coordinator.begin_load(symbol_of("ETHUSDT"), minute());
    let error = InfrastructureError::Network(NetworkError::HttpRequestFailed("503".to_string()));
    assert_eq!(h.coordinator.complete_load(&ticket, Err(error)), LoadOutcome::Failed);

    assert_eq!(h.surface.borrow().data.len(), 5);
    assert_eq!(h.surface.borrow().loading, vec![true, false, true, false]);
    assert!(h.coordinator.take_events().iter().any(|event| matches!(
        event,
        EngineEvent::LoadFailed { symbol, .. } if symbol == &symbol_of("ETHUSDT")
    )));
}

#[test]
fn failed_switch_out_of_replay_restores_live_bars_and_withholds_the_old_price() {
    let mut h = loaded(5);
    h.coordinator.enter_replay().unwrap();
    h.coordinator.seek_to(1, false).unwrap();
    assert_eq!(h.surface.borrow().data.len(), 2);

    let ticket = h.coordinator.begin_load(symbol_of("ETHUSDT"), minute());
    assert_eq!(h.coordinator.replay_mode(), ReplayMode::Live);
    assert_eq!(h.surface.borrow().data.len(), 5);

    let error = InfrastructureError::Network(NetworkError::HttpRequestFailed("503".to_string()));
    h.coordinator.complete_load(&ticket, Err(error));
    assert_eq!(h.surface.borrow().data.len(), 5);
    assert_eq!(h.coordinator.current_price(), None);
    assert_eq!(h.coordinator.create_alert_at_current_price(), Err(ApplicationError::NoPriceData));
    assert!(h.tools.borrow().alerts_added.is_empty());
}

#[test]
fn empty_history_is_a_valid_load() {
    let mut h = harness();
    let ticket = h.coordinator.begin_load(symbol_of("NEWUSDT"), minute());
    assert_eq!(h.coordinator.complete_load(&ticket, Ok(Vec::new())), LoadOutcome::Empty);
    assert_eq!(h.coordinator.enter_replay(), Err(ReplayError::NoData));
    assert_eq!(h.coordinator.replay_mode(), ReplayMode::Live);
}

#[test]
fn switching_symbols_leaves_replay() {
    let mut h = loaded(5);
    h.coordinator.enter_replay().unwrap();
    h.coordinator.begin_load(symbol_of("ETHUSDT"), minute());
    assert_eq!(h.coordinator.replay_mode(), ReplayMode::Live);
    assert_eq!(h.tools.borrow().symbols, vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()]);
}

#[test]
fn chart_type_switch_in_replay_keeps_the_viewport() {
    let mut h = loaded(30);
    h.coordinator.enter_replay().unwrap();
    h.coordinator.seek_to(20, false).unwrap();
    h.surface.borrow_mut().logical_range = Some(LogicalRange::new(3.0, 12.0));

    h.coordinator.set_chart_type(ChartType::Line);
    let surface = h.surface.borrow();
    assert_eq!(surface.logical_range, Some(LogicalRange::new(3.0, 12.0)));
    assert_eq!(surface.data.len(), 21);
    assert!(matches!(surface.data[0], SeriesPoint::Value { .. }));
}

#[test]
fn chart_type_switch_in_live_applies_the_default_window() {
    let mut h = loaded(30);
    h.surface.borrow_mut().logical_range = Some(LogicalRange::new(3.0, 12.0));
    h.coordinator.set_chart_type(ChartType::Bar);
    assert_eq!(h.surface.borrow().logical_range, Some(LogicalRange::new(-191.0, 39.0)));
}

#[test]
fn jump_pick_truncates_and_frames_the_selection() {
    let mut h = loaded(10);
    h.coordinator.enter_replay().unwrap();
    h.coordinator.request_jump().unwrap();
    assert_eq!(h.coordinator.replay_mode(), ReplayMode::ReplaySeeking);
    assert_eq!(h.surface.borrow().data.len(), 10);

    assert_eq!(h.coordinator.clicked(450.0, 0), Ok(Some(4)));
    assert_eq!(h.coordinator.replay_mode(), ReplayMode::ReplayPaused);
    let surface = h.surface.borrow();
    assert_eq!(surface.data.len(), 5);
    assert_eq!(surface.time_range, Some(TimeRange::new(0, 240)));
}

#[test]
fn click_commits_and_locks_then_drag_unlocks() {
    let mut h = loaded(10);
    h.coordinator.enter_replay().unwrap();

    h.coordinator.pointer_pressed(300.0, 0);
    assert_eq!(h.coordinator.clicked(302.0, 50), Ok(Some(3)));
    assert!(h.coordinator.replay_state().seek_locked);
    assert_eq!(h.surface.borrow().data.len(), 4);

    assert!(h.coordinator.drag_started());
    assert!(!h.coordinator.replay_state().seek_locked);
    assert_eq!(h.coordinator.dragged(500.0, 1_000), Some(5));
    assert_eq!(h.surface.borrow().data.len(), 10);
    assert_eq!(h.surface.borrow().indicators.get(&IndicatorKind::Sma), Some(&Vec::new()));

    assert_eq!(h.coordinator.drag_released(800.0), Some(8));
    assert!(h.coordinator.replay_state().seek_locked);
    assert_eq!(h.surface.borrow().data.len(), 9);
}

#[test]
fn countdown_is_hidden_during_replay() {
    let mut h = loaded(5);
    assert_eq!(h.coordinator.countdown(125), Some("00:00:55".to_string()));
    h.coordinator.enter_replay().unwrap();
    assert_eq!(h.coordinator.countdown(125), None);
}

#[test]
fn indicator_toggles_clear_the_series() {
    let mut h = loaded(30);
    h.coordinator.set_indicator_settings(IndicatorSettings { sma: false, ema: true });
    let surface = h.surface.borrow();
    assert!(!surface.indicators.contains_key(&IndicatorKind::Sma));
    assert_eq!(surface.indicators[&IndicatorKind::Ema].len(), 11);
}

#[test]
fn alert_at_current_price_needs_data() {
    let mut h = harness();
    assert_eq!(h.coordinator.create_alert_at_current_price(), Err(ApplicationError::NoPriceData));

    let mut h = loaded(3);
    assert_eq!(h.coordinator.create_alert_at_current_price(), Ok(3.0));
    assert_eq!(h.tools.borrow().alerts_added, vec![(3.0, "crossing".to_string())]);
    assert!(h.coordinator.add_price_alert(f64::INFINITY, None).is_err());
}

#[test]
fn tools_are_started_by_toolbar_name() {
    let mut h = harness();
    assert_eq!(h.coordinator.start_tool("trendline"), Ok(ToolKind::TrendLine));
    assert_eq!(h.coordinator.start_tool("fibonacci"), Ok(ToolKind::FibRetracement));
    assert_eq!(
        h.coordinator.start_tool("laser"),
        Err(ValidationError::UnknownTool("laser".to_string()))
    );
    assert_eq!(h.coordinator.active_tool(), ToolKind::FibRetracement);

    h.coordinator.on_tool_finished();
    assert_eq!(h.coordinator.active_tool(), ToolKind::None);
    assert_eq!(h.tools.borrow().started, vec![ToolKind::TrendLine, ToolKind::FibRetracement]);
}

#[test]
fn entering_replay_publishes_mode_and_cursor() {
    let mut h = loaded(10);
    h.coordinator.take_events();
    h.coordinator.enter_replay().unwrap();

    assert_eq!(
        h.coordinator.take_events(),
        vec![
            EngineEvent::ReplayModeChanged { mode: ReplayMode::ReplayPaused },
            EngineEvent::CursorMoved { index: 9, time: 540 },
        ]
    );
}

#[test]
fn handlers_may_read_and_drive_the_coordinator() {
    let shared = Rc::new(RefCell::new(loaded(10).coordinator));
    let seen = Rc::new(RefCell::new(Vec::new()));

    let weak = Rc::downgrade(&shared);
    let log = Rc::clone(&seen);
    shared.borrow().subscribe(move |event| {
        let Some(coordinator) = weak.upgrade() else {
            return;
        };
        let mode = coordinator.borrow().replay_mode();
        log.borrow_mut().push((event.clone(), mode));
        if matches!(event, EngineEvent::CursorMoved { .. }) {
            update_and_notify(&coordinator, |c| c.exit_replay());
        }
    });
    shared.borrow_mut().take_events();

    assert_eq!(update_and_notify(&shared, |c| c.toggle_replay()), Ok(ReplayMode::ReplayPaused));
    assert_eq!(shared.borrow().replay_mode(), ReplayMode::Live);
    assert_eq!(
        *seen.borrow(),
        vec![
            (EngineEvent::ReplayModeChanged { mode: ReplayMode::ReplayPaused }, ReplayMode::ReplayPaused),
            (EngineEvent::CursorMoved { index: 9, time: 540 }, ReplayMode::ReplayPaused),
            (EngineEvent::ReplayModeChanged { mode: ReplayMode::Live }, ReplayMode::Live),
        ]
    );
}

#[test]
fn click_during_playback_pauses_before_moving_the_cursor() {
    let mut h = playing();
    h.coordinator.pointer_pressed(500.0, 0);
    assert_eq!(h.coordinator.clicked(502.0, 40), Ok(Some(5)));

    assert_eq!(h.coordinator.replay_mode(), ReplayMode::ReplayPaused);
    assert_eq!(
        h.coordinator.take_events(),
        vec![
            EngineEvent::ReplayModeChanged { mode: ReplayMode::ReplayPaused },
            EngineEvent::CursorMoved { index: 5, time: 300 },
        ]
    );
    assert_eq!(h.coordinator.playback_tick(), PlaybackStep::Idle);
    assert_eq!(h.coordinator.replay_state().cursor_index, Some(5));
}

#[test]
fn drag_during_playback_pauses_before_moving_the_cursor() {
    let mut h = playing();
    assert!(h.coordinator.drag_started());
    assert_eq!(h.coordinator.dragged(700.0, 0), Some(7));

    assert_eq!(h.coordinator.replay_mode(), ReplayMode::ReplayPaused);
    assert_eq!(
        h.coordinator.take_events(),
        vec![
            EngineEvent::ReplayModeChanged { mode: ReplayMode::ReplayPaused },
            EngineEvent::CursorMoved { index: 7, time: 420 },
        ]
    );
    assert_eq!(h.coordinator.playback_tick(), PlaybackStep::Idle);
    assert_eq!(h.coordinator.drag_released(300.0), Some(3));
    assert_eq!(h.coordinator.playback_tick(), PlaybackStep::Idle);
}

#[test]
fn jump_request_during_playback_stops_the_timer_first() {
    let mut h = playing();
    h.coordinator.request_jump().unwrap();

    assert_eq!(h.coordinator.replay_mode(), ReplayMode::ReplaySeeking);
    assert_eq!(
        h.coordinator.take_events(),
        vec![EngineEvent::ReplayModeChanged { mode: ReplayMode::ReplaySeeking }]
    );
    assert_eq!(h.coordinator.playback_tick(), PlaybackStep::Idle);
    assert_eq!(h.coordinator.replay_state().cursor_index, Some(2));

    assert_eq!(h.coordinator.clicked(450.0, 0), Ok(Some(4)));
    assert_eq!(h.coordinator.playback_tick(), PlaybackStep::Idle);
}

#[test]
fn comparison_overlay_uses_close_values() {
    let mut h = loaded(5);
    let ComparisonToggle::Fetch(ticket) = h.coordinator.toggle_comparison(symbol_of("ETHUSDT")) else {
        panic!("expected a fetch");
    };
    assert_eq!(ticket.interval(), minute());
    assert_eq!(h.coordinator.complete_comparison(&ticket, Ok(candles(4))), ComparisonOutcome::Loaded(4));

    let surface = h.surface.borrow();
    let (color, points) = &surface.comparisons["ETHUSDT"];
    assert_eq!(color, "#f57f17");
    assert_eq!(points[3], SeriesPoint::Value { time: 180, value: 4.0 });
    drop(surface);

    assert_eq!(h.coordinator.toggle_comparison(symbol_of("ETHUSDT")), ComparisonToggle::Removed);
    assert!(h.surface.borrow().comparisons.is_empty());
}

#[test]
fn stale_comparison_response_is_discarded() {
    let mut h = loaded(5);
    let ComparisonToggle::Fetch(first) = h.coordinator.toggle_comparison(symbol_of("ETHUSDT")) else {
        panic!("expected a fetch");
    };
    assert_eq!(h.coordinator.toggle_comparison(symbol_of("ETHUSDT")), ComparisonToggle::Removed);
    let ComparisonToggle::Fetch(second) = h.coordinator.toggle_comparison(symbol_of("ETHUSDT")) else {
        panic!("expected a fetch");
    };

    assert_eq!(h.coordinator.complete_comparison(&first, Ok(candles(50))), ComparisonOutcome::Stale);
    assert!(h.surface.borrow().comparisons.is_empty());
    assert_eq!(h.coordinator.complete_comparison(&second, Ok(candles(4))), ComparisonOutcome::Loaded(4));

    let ComparisonToggle::Fetch(pending) = h.coordinator.toggle_comparison(symbol_of("SOLUSDT")) else {
        panic!("expected a fetch");
    };
    h.coordinator.begin_load(symbol_of("XRPUSDT"), minute());
    assert_eq!(h.coordinator.complete_comparison(&pending, Ok(candles(4))), ComparisonOutcome::Stale);
    assert!(h.surface.borrow().comparisons.is_empty());
    assert!(h.coordinator.comparison_symbols().is_empty());
}

#[test]
fn comparison_needs_a_chart() {
    let mut h = harness();
    assert_eq!(h.coordinator.toggle_comparison(symbol_of("ETHUSDT")), ComparisonToggle::Unavailable);
}

#[test]
fn dropped_stream_is_reported_once_until_ticks_resume() {
    let mut h = loaded(5);
    let generation = h.coordinator.generation();
    h.coordinator.take_events();

    assert!(h.coordinator.on_connection_lost(generation, "reset".to_string()));
    assert!(!h.coordinator.on_connection_lost(generation, "reset".to_string()));
    h.coordinator.on_live_tick(generation, tick(300, 6.0));
    assert!(h.coordinator.on_connection_lost(generation, "closed".to_string()));
    assert!(!h.coordinator.on_connection_lost(generation - 1, "old".to_string()));

    let lost: Vec<String> = h
        .coordinator
        .take_events()
        .into_iter()
        .filter_map(|event| match event {
            EngineEvent::ConnectionLost { symbol, reason } => Some(format!("{symbol}:{reason}")),
            _ => None,
        })
        .collect();
    assert_eq!(lost, vec!["BTCUSDT:reset".to_string(), "BTCUSDT:closed".to_string()]);
    assert_eq!(h.surface.borrow().data.len(), 6);
}
