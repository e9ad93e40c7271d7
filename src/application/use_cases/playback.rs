use crate::application::coordinator::{ChartCoordinator, try_update_and_notify};
use crate::domain::logging::LogComponent;
use crate::log_debug;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// Repeating timer used for replay playback.
///
/// `on_tick` returns `false` once playback has stopped; the scheduler must not
/// call it again after that. Dropping the guard cancels the timer.
pub trait PlaybackScheduler {
    type Guard;

    fn schedule(&self, period: Duration, on_tick: Box<dyn FnMut() -> bool>) -> Self::Guard;
}

struct RunningTimer<G> {
    period: Duration,
    alive: Rc<Cell<bool>>,
    _guard: G,
}

/// Keeps one playback timer in step with the coordinator's replay state.
///
/// Call [`PlaybackDriver::sync`] after every request that may start, stop or
/// re-speed playback.
pub struct PlaybackDriver<S: PlaybackScheduler> {
    coordinator: Rc<RefCell<ChartCoordinator>>,
    scheduler: S,
    running: RefCell<Option<RunningTimer<S::Guard>>>,
}

impl<S: PlaybackScheduler> PlaybackDriver<S> {
    pub fn new(coordinator: Rc<RefCell<ChartCoordinator>>, scheduler: S) -> Self {
        Self { coordinator, scheduler, running: RefCell::new(None) }
    }

    pub fn is_running(&self) -> bool {
        self.running.borrow().as_ref().is_some_and(|timer| timer.alive.get())
    }

    /// Starts, restarts or stops the timer. Returns whether it is running.
    pub fn sync(&self) -> bool {
        let (playing, period) = {
            let coordinator = self.coordinator.borrow();
            (coordinator.replay_state().is_playing(), coordinator.playback_interval())
        };

        let mut running = self.running.borrow_mut();
        if !playing {
            if running.take().is_some() {
                log_debug!(LogComponent::Application("PlaybackDriver"), "playback timer stopped");
            }
            return false;
        }
        if running.as_ref().is_some_and(|timer| timer.period == period && timer.alive.get()) {
            return true;
        }

        running.take();
        let alive = Rc::new(Cell::new(true));
        let flag = Rc::clone(&alive);
        let coordinator = Rc::downgrade(&self.coordinator);
        let on_tick = Box::new(move || {
            // A tick that lands while the coordinator is busy is skipped.
            let keep = match coordinator.upgrade() {
                Some(coordinator) => {
                    try_update_and_notify(&coordinator, |c| c.playback_tick().keeps_running())
                        .unwrap_or(true)
                }
                None => false,
            };
            flag.set(keep);
            keep
        });

        log_debug!(
            LogComponent::Application("PlaybackDriver"),
            "playback timer every {:?}",
            period
        );
        let guard = self.scheduler.schedule(period, on_tick);
        *running = Some(RunningTimer { period, alive, _guard: guard });
        true
    }

    pub fn stop(&self) {
        self.running.borrow_mut().take();
    }
}
