use crate::domain::annotations::{AlertSummary, AlertTriggered};
use crate::domain::market_data::{Symbol, TimeInterval};
use crate::domain::replay::ReplayMode;
use serde::Serialize;
use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

pub trait DomainEvent: Debug + Clone {
    fn event_type(&self) -> &'static str;
    fn timestamp(&self) -> u64 {
        use crate::domain::logging::get_time_provider;
        get_time_provider().current_timestamp()
    }
}

/// Notifications the engine relays to whoever hosts it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum EngineEvent {
    HistoricalDataLoaded {
        symbol: Symbol,
        interval: TimeInterval,
        candle_count: usize,
    },
    /// One-shot user notice; the previous data stays on screen.
    LoadFailed {
        symbol: Symbol,
        reason: String,
    },
    /// One-shot notice per dropped live stream; bars already shown stay.
    ConnectionLost {
        symbol: Symbol,
        reason: String,
    },
    ReplayModeChanged {
        mode: ReplayMode,
    },
    CursorMoved {
        index: usize,
        time: u64,
    },
    AlertTriggered(AlertTriggered),
    AlertListChanged(Vec<AlertSummary>),
    ToolFinished,
}

impl DomainEvent for EngineEvent {
    fn event_type(&self) -> &'static str {
        match self {
            EngineEvent::HistoricalDataLoaded { .. } => "HistoricalDataLoaded",
            EngineEvent::LoadFailed { .. } => "LoadFailed",
            EngineEvent::ConnectionLost { .. } => "ConnectionLost",
            EngineEvent::ReplayModeChanged { .. } => "ReplayModeChanged",
            EngineEvent::CursorMoved { .. } => "CursorMoved",
            EngineEvent::AlertTriggered(_) => "AlertTriggered",
            EngineEvent::AlertListChanged(_) => "AlertListChanged",
            EngineEvent::ToolFinished => "ToolFinished",
        }
    }
}

pub trait EventDispatcher {
    fn publish(&self, event: EngineEvent);
}

type Handler = Rc<dyn Fn(&EngineEvent)>;

/// Handlers run with no borrow held, so they may subscribe or publish again.
#[derive(Default)]
pub struct InMemoryEventDispatcher {
    handlers: RefCell<Vec<Handler>>,
}

impl InMemoryEventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, handler: F)
    where
        F: Fn(&EngineEvent) + 'static,
    {
        self.handlers.borrow_mut().push(Rc::new(handler));
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.borrow().len()
    }
}

impl EventDispatcher for InMemoryEventDispatcher {
    fn publish(&self, event: EngineEvent) {
        let handlers: Vec<Handler> = self.handlers.borrow().clone();
        for handler in handlers {
            handler(&event);
        }
    }
}
