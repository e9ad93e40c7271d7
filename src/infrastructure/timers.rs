use crate::application::use_cases::PlaybackScheduler;
use gloo_timers::callback::Interval;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen_futures::spawn_local;

/// Playback timer backed by `setInterval`.
#[derive(Default, Clone, Copy)]
pub struct GlooIntervalScheduler;

/// Cancels the interval when dropped.
pub struct IntervalGuard {
    interval: Rc<RefCell<Option<Interval>>>,
}

impl Drop for IntervalGuard {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.interval.try_borrow_mut() {
            if let Some(interval) = slot.take() {
                interval.cancel();
            }
        }
    }
}

impl PlaybackScheduler for GlooIntervalScheduler {
    type Guard = IntervalGuard;

    fn schedule(&self, period: Duration, mut on_tick: Box<dyn FnMut() -> bool>) -> IntervalGuard {
        let slot: Rc<RefCell<Option<Interval>>> = Rc::new(RefCell::new(None));
        let weak = Rc::downgrade(&slot);
        let millis = period.as_millis().clamp(1, u32::MAX as u128) as u32;

        let interval = Interval::new(millis, move || {
            if on_tick() {
                return;
            }
            // The interval cannot be dropped from inside its own callback.
            if let Some(slot) = weak.upgrade() {
                spawn_local(async move {
                    slot.borrow_mut().take();
                });
            }
        });
        *slot.borrow_mut() = Some(interval);
        IntervalGuard { interval: slot }
    }
}
