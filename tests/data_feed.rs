mod support;

use candle_replay_engine::application::{ChartDataFeed, ComparisonOutcome, LoadOutcome};
use candle_replay_engine::domain::errors::{InfrastructureError, NetworkError};
use candle_replay_engine::domain::events::EngineEvent;
use candle_replay_engine::domain::market_data::{
    Candle, HistoricalDataSource, LiveSignal, LiveTick, LiveTickSource, Symbol, TickSink,
    TickSubscription, TimeInterval,
};
use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use support::*;

type FetchResult = Result<Vec<Candle>, InfrastructureError>;

/// History source whose fetches stay pending until the test answers them.
#[derive(Clone, Default)]
struct GatedHistory {
    gates: Rc<RefCell<HashMap<String, oneshot::Receiver<FetchResult>>>>,
    requests: Rc<RefCell<Vec<(String, usize)>>>,
}

impl GatedHistory {
    fn gate(&self, symbol: &str) -> oneshot::Sender<FetchResult> {
        let (tx, rx) = oneshot::channel();
        self.gates.borrow_mut().insert(symbol.to_string(), rx);
        tx
    }
}

impl HistoricalDataSource for GatedHistory {
    async fn fetch_candles(
        &self,
        symbol: &Symbol,
        _interval: TimeInterval,
        limit: usize,
    ) -> FetchResult {
        self.requests.borrow_mut().push((symbol.value().to_string(), limit));
        let gate = self.gates.borrow_mut().remove(symbol.value());
        match gate {
            Some(gate) => gate.await.unwrap_or_else(|_| {
                Err(InfrastructureError::Network(NetworkError::Aborted))
            }),
            None => Ok(candles(3)),
        }
    }
}

struct FakeSubscription(Rc<Cell<bool>>);

impl TickSubscription for FakeSubscription {
    fn unsubscribe(&mut self) {
        self.0.set(false);
    }

    fn is_active(&self) -> bool {
        self.0.get()
    }
}

type Subscriptions = Vec<(String, TickSink, Rc<Cell<bool>>)>;

#[derive(Clone, Default)]
struct FakeLive {
    subscriptions: Rc<RefCell<Subscriptions>>,
}

impl FakeLive {
    fn signal(&self, index: usize, signal: LiveSignal) {
        let mut subscriptions = self.subscriptions.borrow_mut();
        let (_, sink, active) = &mut subscriptions[index];
        if active.get() {
            sink(signal);
        }
    }

    fn push(&self, index: usize, tick: LiveTick) {
        self.signal(index, LiveSignal::Tick(tick));
    }

    fn drop_stream(&self, index: usize) {
        self.signal(index, LiveSignal::Disconnected("socket closed".to_string()));
    }
}

impl LiveTickSource for FakeLive {
    fn subscribe(
        &self,
        symbol: &Symbol,
        _interval: TimeInterval,
        sink: TickSink,
    ) -> Result<Box<dyn TickSubscription>, InfrastructureError> {
        let active = Rc::new(Cell::new(true));
        self.subscriptions
            .borrow_mut()
            .push((symbol.value().to_string(), sink, Rc::clone(&active)));
        Ok(Box::new(FakeSubscription(active)))
    }
}

struct Fixture {
    feed: Rc<ChartDataFeed<GatedHistory, FakeLive>>,
    history: GatedHistory,
    live: FakeLive,
    surface: Rc<RefCell<SurfaceLog>>,
    pool: LocalPool,
    outcomes: Rc<RefCell<Vec<(String, LoadOutcome)>>>,
    compared: Rc<RefCell<Vec<(String, ComparisonOutcome)>>>,
    events: Rc<RefCell<Vec<EngineEvent>>>,
}

impl Fixture {
    fn new() -> Self {
        let h = harness();
        let history = GatedHistory::default();
        let live = FakeLive::default();
        let coordinator = Rc::new(RefCell::new(h.coordinator));
        let events: Rc<RefCell<Vec<EngineEvent>>> = Rc::default();
        let sink = Rc::clone(&events);
        coordinator.borrow().subscribe(move |event| sink.borrow_mut().push(event.clone()));
        let feed = Rc::new(ChartDataFeed::new(coordinator, history.clone(), live.clone()));
        Self {
            feed,
            history,
            live,
            surface: h.surface,
            pool: LocalPool::new(),
            outcomes: Rc::default(),
            compared: Rc::default(),
            events,
        }
    }

    fn compare(&mut self, symbol: &str) {
        let feed = Rc::clone(&self.feed);
        let compared = Rc::clone(&self.compared);
        let symbol = symbol.to_string();
        self.pool
            .spawner()
            .spawn_local(async move {
                let outcome = feed.toggle_comparison(symbol_of(&symbol)).await;
                compared.borrow_mut().push((symbol, outcome));
            })
            .unwrap();
        self.pool.run_until_stalled();
    }

    fn compared(&self) -> Vec<(String, ComparisonOutcome)> {
        self.compared.borrow().clone()
    }

    fn connection_notices(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                EngineEvent::ConnectionLost { symbol, .. } => Some(symbol.value().to_string()),
                _ => None,
            })
            .collect()
    }

    fn switch(&mut self, symbol: &str) {
        let feed = Rc::clone(&self.feed);
        let outcomes = Rc::clone(&self.outcomes);
        let symbol = symbol.to_string();
        self.pool
            .spawner()
            .spawn_local(async move {
                let outcome = feed.switch_to(symbol_of(&symbol), minute()).await;
                outcomes.borrow_mut().push((symbol, outcome));
            })
            .unwrap();
        self.pool.run_until_stalled();
    }

    fn outcomes(&self) -> Vec<(String, LoadOutcome)> {
        self.outcomes.borrow().clone()
    }
}

fn tick(time: u64, close: f64) -> LiveTick {
    LiveTick { time, open: close, high: close, low: close, close }
}

#[test]
fn load_then_subscribe_and_stream() {
    let mut fx = Fixture::new();
    fx.switch("BTCUSDT");

    assert_eq!(fx.outcomes(), vec![("BTCUSDT".to_string(), LoadOutcome::Loaded(3))]);
    assert_eq!(*fx.history.requests.borrow(), vec![("BTCUSDT".to_string(), 1000)]);
    assert!(fx.feed.is_streaming());

    fx.live.push(0, tick(185, 42.0));
    let coordinator = fx.feed.coordinator().borrow();
    assert_eq!(coordinator.store().len(), 4);
    assert_eq!(coordinator.current_price().map(|p| p.value()), Some(42.0));
}

#[test]
fn rapid_switch_cancels_the_older_fetch() {
    let mut fx = Fixture::new();
    let btc = fx.history.gate("BTCUSDT");
    let eth = fx.history.gate("ETHUSDT");

    fx.switch("BTCUSDT");
    assert!(fx.outcomes().is_empty());
    assert!(fx.feed.coordinator().borrow().is_loading());

    fx.switch("ETHUSDT");
    assert_eq!(fx.outcomes(), vec![("BTCUSDT".to_string(), LoadOutcome::Cancelled)]);
    assert!(btc.send(Ok(candles(50))).is_err());

    eth.send(Ok(candles(4))).unwrap();
    fx.pool.run_until_stalled();

    assert_eq!(fx.outcomes()[1], ("ETHUSDT".to_string(), LoadOutcome::Loaded(4)));
    let coordinator = fx.feed.coordinator().borrow();
    assert_eq!(coordinator.store().len(), 4);
    assert_eq!(coordinator.symbol(), Some(&symbol_of("ETHUSDT")));
    let subscribed: Vec<String> =
        fx.live.subscriptions.borrow().iter().map(|(symbol, _, _)| symbol.clone()).collect();
    assert_eq!(subscribed, vec!["ETHUSDT".to_string()]);
}

#[test]
fn failed_load_does_not_subscribe() {
    let mut fx = Fixture::new();
    let gate = fx.history.gate("BTCUSDT");
    fx.switch("BTCUSDT");
    gate.send(Err(InfrastructureError::Network(NetworkError::HttpRequestFailed(
        "timeout".to_string(),
    ))))
    .unwrap();
    fx.pool.run_until_stalled();

    assert_eq!(fx.outcomes(), vec![("BTCUSDT".to_string(), LoadOutcome::Failed)]);
    assert!(fx.live.subscriptions.borrow().is_empty());
    assert!(!fx.feed.is_streaming());
    assert!(!fx.feed.coordinator().borrow().is_loading());
}

#[test]
fn switching_closes_the_previous_subscription() {
    let mut fx = Fixture::new();
    fx.switch("BTCUSDT");
    fx.switch("ETHUSDT");

    let subscriptions = fx.live.subscriptions.borrow();
    assert_eq!(subscriptions.len(), 2);
    assert!(!subscriptions[0].2.get());
    assert!(subscriptions[1].2.get());
}

#[test]
fn shutdown_unsubscribes_and_silences_late_ticks() {
    let mut fx = Fixture::new();
    fx.switch("BTCUSDT");
    let sink_active = Rc::clone(&fx.live.subscriptions.borrow()[0].2);

    fx.feed.shutdown();
    assert!(!sink_active.get());
    assert!(!fx.feed.is_streaming());

    // Deliver straight through the sink, as a racing socket callback would.
    let mut subscriptions = fx.live.subscriptions.borrow_mut();
    (subscriptions[0].1)(LiveSignal::Tick(tick(185, 9.0)));
    drop(subscriptions);
    assert_eq!(fx.feed.coordinator().borrow().store().len(), 3);
}

#[test]
fn events_reach_handlers_after_the_load_completes() {
    let mut fx = Fixture::new();
    let seen_loading = Rc::new(RefCell::new(Vec::new()));
    let weak = Rc::downgrade(fx.feed.coordinator());
    let log = Rc::clone(&seen_loading);
    fx.feed.coordinator().borrow().subscribe(move |event| {
        if let (EngineEvent::HistoricalDataLoaded { .. }, Some(coordinator)) = (event, weak.upgrade()) {
            log.borrow_mut().push(coordinator.borrow().is_loading());
        }
    });

    fx.switch("BTCUSDT");
    assert_eq!(*seen_loading.borrow(), vec![false]);
}

#[test]
fn dropped_stream_shows_one_notice_per_drop() {
    let mut fx = Fixture::new();
    fx.switch("BTCUSDT");

    fx.live.drop_stream(0);
    fx.live.drop_stream(0);
    assert_eq!(fx.connection_notices(), vec!["BTCUSDT".to_string()]);
    assert_eq!(fx.feed.coordinator().borrow().store().len(), 3);

    fx.live.push(0, tick(185, 42.0));
    fx.live.drop_stream(0);
    assert_eq!(fx.connection_notices(), vec!["BTCUSDT".to_string(), "BTCUSDT".to_string()]);
}

#[test]
fn drops_from_a_replaced_subscription_are_ignored() {
    let mut fx = Fixture::new();
    fx.switch("BTCUSDT");
    fx.switch("ETHUSDT");

    // Straight through the old sink, as a late socket callback would.
    let mut subscriptions = fx.live.subscriptions.borrow_mut();
    (subscriptions[0].1)(LiveSignal::Disconnected("late".to_string()));
    drop(subscriptions);
    assert!(fx.connection_notices().is_empty());
}

#[test]
fn comparison_loads_at_the_chart_interval() {
    let mut fx = Fixture::new();
    fx.switch("BTCUSDT");
    fx.compare("ETHUSDT");

    assert_eq!(fx.compared(), vec![("ETHUSDT".to_string(), ComparisonOutcome::Loaded(3))]);
    assert_eq!(fx.history.requests.borrow()[1], ("ETHUSDT".to_string(), 1000));
    assert_eq!(fx.surface.borrow().comparisons["ETHUSDT"].1.len(), 3);

    fx.compare("ETHUSDT");
    assert_eq!(fx.compared()[1], ("ETHUSDT".to_string(), ComparisonOutcome::Removed));
    assert!(fx.surface.borrow().comparisons.is_empty());
}

#[test]
fn removing_a_pending_comparison_cancels_its_fetch() {
    let mut fx = Fixture::new();
    fx.switch("BTCUSDT");
    let eth = fx.history.gate("ETHUSDT");
    fx.compare("ETHUSDT");
    assert!(fx.compared().is_empty());

    fx.compare("ETHUSDT");
    assert_eq!(
        fx.compared(),
        vec![
            ("ETHUSDT".to_string(), ComparisonOutcome::Removed),
            ("ETHUSDT".to_string(), ComparisonOutcome::Cancelled),
        ]
    );
    assert!(eth.send(Ok(candles(50))).is_err());
    assert!(fx.surface.borrow().comparisons.is_empty());
}

#[test]
fn switching_symbols_cancels_and_clears_comparisons() {
    let mut fx = Fixture::new();
    fx.switch("BTCUSDT");
    fx.compare("SOLUSDT");
    let eth = fx.history.gate("ETHUSDT");
    fx.compare("ETHUSDT");
    assert_eq!(fx.surface.borrow().comparisons.len(), 1);

    fx.switch("XRPUSDT");
    assert!(fx.compared().contains(&("ETHUSDT".to_string(), ComparisonOutcome::Cancelled)));
    assert!(eth.send(Ok(candles(50))).is_err());
    assert!(fx.surface.borrow().comparisons.is_empty());
    assert!(fx.feed.coordinator().borrow().comparison_symbols().is_empty());
}
