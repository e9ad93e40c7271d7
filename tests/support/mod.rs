#![allow(dead_code)]

use candle_replay_engine::application::ChartCoordinator;
use candle_replay_engine::config::EngineConfig;
use candle_replay_engine::domain::annotations::{DrawingToolSubsystem, ToolKind};
use candle_replay_engine::domain::chart::{ChartSurface, LogicalRange, SeriesPoint, TimeRange};
use candle_replay_engine::domain::market_data::{
    Candle, IndicatorKind, IndicatorPoint, OHLC, Price, Symbol, TimeInterval, Timestamp,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub const WIDTH: f64 = 1000.0;

/// Everything the engine pushed to the surface.
#[derive(Debug, Default)]
pub struct SurfaceLog {
    pub data: Vec<SeriesPoint>,
    pub set_data_calls: usize,
    pub updates: usize,
    pub indicators: HashMap<IndicatorKind, Vec<IndicatorPoint>>,
    pub indicator_updates: usize,
    pub logical_range: Option<LogicalRange>,
    pub time_range: Option<TimeRange>,
    pub loading: Vec<bool>,
    pub width: f64,
    /// Comparison overlays by symbol: colour and points.
    pub comparisons: HashMap<String, (String, Vec<SeriesPoint>)>,
}

pub struct FakeSurface(pub Rc<RefCell<SurfaceLog>>);

impl ChartSurface for FakeSurface {
    fn set_data(&mut self, series: &[SeriesPoint]) {
        let mut log = self.0.borrow_mut();
        log.data = series.to_vec();
        log.set_data_calls += 1;
    }

    fn update(&mut self, point: SeriesPoint) {
        let mut log = self.0.borrow_mut();
        log.updates += 1;
        match log.data.last_mut() {
            Some(last) if last.time() == point.time() => *last = point,
            _ => log.data.push(point),
        }
    }

    fn set_indicator(&mut self, kind: IndicatorKind, series: &[IndicatorPoint]) {
        self.0.borrow_mut().indicators.insert(kind, series.to_vec());
    }

    fn update_indicator(&mut self, kind: IndicatorKind, point: IndicatorPoint) {
        let mut log = self.0.borrow_mut();
        log.indicator_updates += 1;
        let series = log.indicators.entry(kind).or_default();
        match series.last_mut() {
            Some(last) if last.time == point.time => *last = point,
            _ => series.push(point),
        }
    }

    fn clear_indicator(&mut self, kind: IndicatorKind) {
        self.0.borrow_mut().indicators.remove(&kind);
    }

    fn set_comparison(&mut self, symbol: &Symbol, color: &str, series: &[SeriesPoint]) {
        self.0
            .borrow_mut()
            .comparisons
            .insert(symbol.value().to_string(), (color.to_string(), series.to_vec()));
    }

    fn remove_comparison(&mut self, symbol: &Symbol) {
        self.0.borrow_mut().comparisons.remove(symbol.value());
    }

    fn coordinate_to_time(&self, _x: f64) -> Option<u64> {
        None
    }

    fn time_to_coordinate(&self, _time: u64) -> Option<f64> {
        None
    }

    fn visible_logical_range(&self) -> Option<LogicalRange> {
        self.0.borrow().logical_range
    }

    fn set_visible_logical_range(&mut self, range: LogicalRange) {
        self.0.borrow_mut().logical_range = Some(range);
    }

    fn visible_time_range(&self) -> Option<TimeRange> {
        self.0.borrow().time_range
    }

    fn set_visible_time_range(&mut self, range: TimeRange) {
        self.0.borrow_mut().time_range = Some(range);
    }

    fn width(&self) -> f64 {
        self.0.borrow().width
    }

    fn set_loading(&mut self, loading: bool) {
        self.0.borrow_mut().loading.push(loading);
    }
}

#[derive(Debug, Default)]
pub struct ToolLog {
    pub started: Vec<ToolKind>,
    pub cleared: usize,
    pub symbols: Vec<String>,
    pub alerts_added: Vec<(f64, String)>,
    pub alerts_removed: Vec<String>,
}

pub struct FakeTools(pub Rc<RefCell<ToolLog>>);

impl DrawingToolSubsystem for FakeTools {
    fn start_tool(&mut self, kind: ToolKind) {
        self.0.borrow_mut().started.push(kind);
    }

    fn clear_tools(&mut self) {
        self.0.borrow_mut().cleared += 1;
    }

    fn set_symbol(&mut self, symbol: &Symbol) {
        self.0.borrow_mut().symbols.push(symbol.value().to_string());
    }

    fn add_price_alert(&mut self, price: f64, condition: &str) {
        self.0.borrow_mut().alerts_added.push((price, condition.to_string()));
    }

    fn remove_price_alert(&mut self, id: &str) {
        self.0.borrow_mut().alerts_removed.push(id.to_string());
    }
}

pub fn candle(time: u64, close: f64) -> Candle {
    let p = Price::from(close);
    Candle::new(Timestamp::new(time), OHLC::new(p, Price::from(close + 1.0), Price::from(close - 1.0), p))
}

/// `n` one-minute bars with closes `1.0, 2.0, ...`.
pub fn candles(n: usize) -> Vec<Candle> {
    (0..n).map(|i| candle(i as u64 * 60, i as f64 + 1.0)).collect()
}

pub fn symbol_of(name: &str) -> Symbol {
    Symbol::new(name).unwrap()
}

pub fn minute() -> TimeInterval {
    "1m".parse().unwrap()
}

pub struct Harness {
    pub coordinator: ChartCoordinator,
    pub surface: Rc<RefCell<SurfaceLog>>,
    pub tools: Rc<RefCell<ToolLog>>,
}

pub fn harness() -> Harness {
    harness_with(EngineConfig::default())
}

pub fn harness_with(config: EngineConfig) -> Harness {
    let surface = Rc::new(RefCell::new(SurfaceLog { width: WIDTH, ..SurfaceLog::default() }));
    let tools = Rc::new(RefCell::new(ToolLog::default()));
    let coordinator = ChartCoordinator::new(
        config,
        Box::new(FakeSurface(Rc::clone(&surface))),
        Box::new(FakeTools(Rc::clone(&tools))),
    );
    Harness { coordinator, surface, tools }
}

/// Harness with `n` one-minute bars already loaded for BTCUSDT.
pub fn loaded(n: usize) -> Harness {
    let mut h = harness();
    let ticket = h.coordinator.begin_load(symbol_of("BTCUSDT"), minute());
    h.coordinator.complete_load(&ticket, Ok(candles(n)));
    h
}

pub fn closes(points: &[SeriesPoint]) -> Vec<f64> {
    points
        .iter()
        .map(|p| match p {
            SeriesPoint::Bar { close, .. } => *close,
            SeriesPoint::Value { value, .. } => *value,
        })
        .collect()
}

pub fn values(points: &[IndicatorPoint]) -> Vec<f64> {
    points.iter().map(|p| p.value).collect()
}
