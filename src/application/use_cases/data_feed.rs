use crate::application::coordinator::{
    ChartCoordinator, ComparisonOutcome, ComparisonToggle, LoadOutcome, LoadTicket,
    try_update_and_notify, update_and_notify,
};
use crate::domain::{
    logging::{LogComponent, get_logger},
    market_data::{
        HistoricalDataSource, LiveSignal, LiveTickSource, Symbol, TickSink, TickSubscription,
        TimeInterval,
    },
};
use crate::{log_debug, log_warn};
use futures::future::{AbortHandle, Abortable};
use std::cell::RefCell;
use std::rc::Rc;

struct PendingComparison {
    id: u64,
    symbol: Symbol,
    handle: AbortHandle,
}

/// Drives symbol and interval switches: one historical fetch followed by a
/// live subscription, both bound to the generation of the switch that
/// started them. Comparison overlays are fetched the same way.
pub struct ChartDataFeed<H, L> {
    coordinator: Rc<RefCell<ChartCoordinator>>,
    history: H,
    live: L,
    pending: RefCell<Option<AbortHandle>>,
    comparisons: RefCell<Vec<PendingComparison>>,
    subscription: RefCell<Option<Box<dyn TickSubscription>>>,
}

impl<H, L> ChartDataFeed<H, L>
where
    H: HistoricalDataSource,
    L: LiveTickSource,
{
    pub fn new(coordinator: Rc<RefCell<ChartCoordinator>>, history: H, live: L) -> Self {
        Self {
            coordinator,
            history,
            live,
            pending: RefCell::new(None),
            comparisons: RefCell::new(Vec::new()),
            subscription: RefCell::new(None),
        }
    }

    pub fn coordinator(&self) -> &Rc<RefCell<ChartCoordinator>> {
        &self.coordinator
    }

    pub fn is_streaming(&self) -> bool {
        self.subscription.borrow().as_ref().is_some_and(|s| s.is_active())
    }

    /// Switches the chart to `symbol` at `interval`.
    ///
    /// A newer call aborts this one's fetch; if the fetch already finished,
    /// the generation check in the coordinator drops the result instead.
    pub async fn switch_to(&self, symbol: Symbol, interval: TimeInterval) -> LoadOutcome {
        self.stop_streams();

        let (ticket, limit) = update_and_notify(&self.coordinator, |coordinator| {
            let limit = coordinator.config().history_limit;
            (coordinator.begin_load(symbol, interval), limit)
        });

        let (handle, registration) = AbortHandle::new_pair();
        *self.pending.borrow_mut() = Some(handle);

        let fetch = self.history.fetch_candles(ticket.symbol(), ticket.interval(), limit);
        let result = match Abortable::new(fetch, registration).await {
            Ok(result) => result,
            Err(_) => {
                log_debug!(
                    LogComponent::Application("ChartDataFeed"),
                    "history fetch for {} aborted",
                    ticket.symbol()
                );
                return LoadOutcome::Cancelled;
            }
        };

        let outcome =
            update_and_notify(&self.coordinator, |coordinator| coordinator.complete_load(&ticket, result));
        if outcome != LoadOutcome::Stale {
            self.pending.borrow_mut().take();
        }
        if matches!(outcome, LoadOutcome::Loaded(_) | LoadOutcome::Empty) {
            self.subscribe_live(&ticket);
        }
        outcome
    }

    /// Overlays `symbol` at the chart's interval, or removes the overlay when
    /// it is already shown. Removing it aborts its fetch.
    pub async fn toggle_comparison(&self, symbol: Symbol) -> ComparisonOutcome {
        let (toggle, limit) = update_and_notify(&self.coordinator, |coordinator| {
            (coordinator.toggle_comparison(symbol.clone()), coordinator.config().history_limit)
        });
        let ticket = match toggle {
            ComparisonToggle::Fetch(ticket) => ticket,
            ComparisonToggle::Removed => {
                self.comparisons.borrow_mut().retain(|pending| {
                    if pending.symbol == symbol {
                        pending.handle.abort();
                        return false;
                    }
                    true
                });
                return ComparisonOutcome::Removed;
            }
            ComparisonToggle::Unavailable => return ComparisonOutcome::Unavailable,
        };

        let (handle, registration) = AbortHandle::new_pair();
        self.comparisons.borrow_mut().push(PendingComparison {
            id: ticket.id(),
            symbol: ticket.symbol().clone(),
            handle,
        });

        let fetch = self.history.fetch_candles(ticket.symbol(), ticket.interval(), limit);
        let result = Abortable::new(fetch, registration).await;
        self.comparisons.borrow_mut().retain(|pending| pending.id != ticket.id());
        match result {
            Ok(result) => update_and_notify(&self.coordinator, |coordinator| {
                coordinator.complete_comparison(&ticket, result)
            }),
            Err(_) => {
                log_debug!(
                    LogComponent::Application("ChartDataFeed"),
                    "comparison fetch for {} aborted",
                    ticket.symbol()
                );
                ComparisonOutcome::Cancelled
            }
        }
    }

    /// Stops every stream and leaves replay. Late callbacks become no-ops.
    pub fn shutdown(&self) {
        self.stop_streams();
        update_and_notify(&self.coordinator, |coordinator| coordinator.teardown());
        get_logger().info(LogComponent::Application("ChartDataFeed"), "data feed shut down");
    }

    fn stop_streams(&self) {
        if let Some(mut subscription) = self.subscription.borrow_mut().take() {
            subscription.unsubscribe();
        }
        if let Some(handle) = self.pending.borrow_mut().take() {
            handle.abort();
        }
        for pending in self.comparisons.borrow_mut().drain(..) {
            pending.handle.abort();
        }
    }

    fn subscribe_live(&self, ticket: &LoadTicket) {
        let generation = ticket.generation();
        let coordinator = Rc::downgrade(&self.coordinator);
        let sink: TickSink = Box::new(move |signal| {
            let Some(coordinator) = coordinator.upgrade() else {
                return;
            };
            // A signal delivered while the coordinator is busy is dropped; the
            // next tick carries the same bar.
            try_update_and_notify(&coordinator, |coordinator| match signal {
                LiveSignal::Tick(tick) => {
                    coordinator.on_live_tick(generation, tick);
                }
                LiveSignal::Disconnected(reason) => {
                    coordinator.on_connection_lost(generation, reason);
                }
            });
        });

        match self.live.subscribe(ticket.symbol(), ticket.interval(), sink) {
            Ok(subscription) => *self.subscription.borrow_mut() = Some(subscription),
            Err(error) => {
                log_warn!(
                    LogComponent::Application("ChartDataFeed"),
                    "live subscription for {} failed: {}",
                    ticket.symbol(),
                    error
                );
            }
        }
    }
}
