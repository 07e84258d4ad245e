//! Poll-driven debouncer.
//!
//! A [`Debouncer`] holds at most one pending action. Scheduling again before
//! the quiet period elapses replaces the action and restarts the period, so
//! a burst of calls collapses into its last one. The host event loop calls
//! [`Debouncer::poll`] (typically from its timer tick); the action is handed
//! back exactly once, when its deadline has passed.
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use inkpad_core::clock::ManualClock;
//! use inkpad_core::scheduler::Debouncer;
//!
//! let clock = Arc::new(ManualClock::fixed());
//! let mut debouncer = Debouncer::new(Duration::from_millis(300), clock.clone());
//! debouncer.schedule("a");
//! clock.advance_ms(200);
//! debouncer.schedule("b");
//! clock.advance_ms(200);
//! assert_eq!(debouncer.poll(), None);
//! clock.advance_ms(100);
//! assert_eq!(debouncer.poll(), Some("b"));
//! assert_eq!(debouncer.poll(), None);
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::clock::Clock;

/// Identifies one call to [`Debouncer::schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DebounceHandle(u64);

struct Pending<T> {
    handle: DebounceHandle,
    deadline: DateTime<Utc>,
    action: T,
}

pub struct Debouncer<T> {
    delay: Duration,
    clock: Arc<dyn Clock>,
    pending: Option<Pending<T>>,
    next_handle: u64,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            delay,
            clock,
            pending: None,
            next_handle: 0,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `action` after the default quiet period, replacing any
    /// pending action.
    pub fn schedule(&mut self, action: T) -> DebounceHandle {
        self.schedule_in(action, self.delay)
    }

    /// Schedule `action` after `delay`, replacing any pending action.
    ///
    /// A replaced action is dropped without firing, even if its own deadline
    /// had already passed but it was never polled.
    pub fn schedule_in(&mut self, action: T, delay: Duration) -> DebounceHandle {
        self.next_handle += 1;
        let handle = DebounceHandle(self.next_handle);
        let delay = chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::MAX);
        let deadline = self
            .clock
            .now()
            .checked_add_signed(delay)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.pending = Some(Pending {
            handle,
            deadline,
            action,
        });
        handle
    }

    /// Cancel the scheduling identified by `handle`.
    ///
    /// Returns `false` when that scheduling already fired, was replaced, or
    /// was cancelled.
    pub fn cancel(&mut self, handle: DebounceHandle) -> bool {
        match &self.pending {
            Some(p) if p.handle == handle => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Drop whatever is pending.
    pub fn cancel_all(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Take the pending action if its quiet period has elapsed.
    pub fn poll(&mut self) -> Option<T> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|p| self.clock.now() >= p.deadline);
        if due {
            self.pending.take().map(|p| p.action)
        } else {
            None
        }
    }

    /// Take the pending action immediately, bypassing the quiet period.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::cell::Cell;
    use std::rc::Rc;

    fn debouncer<T>(ms: u64) -> (Debouncer<T>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::fixed());
        (
            Debouncer::new(Duration::from_millis(ms), clock.clone()),
            clock,
        )
    }

    #[test]
    fn burst_collapses_into_last_action() {
        let (mut d, clock) = debouncer(300);
        for i in 0..10 {
            d.schedule(i);
            clock.advance_ms(50);
        }
        assert_eq!(d.poll(), None);
        clock.advance_ms(250);
        assert_eq!(d.poll(), Some(9));
        assert_eq!(d.poll(), None);
        assert!(!d.is_pending());
    }

    #[test]
    fn does_not_fire_before_quiet_period() {
        let (mut d, clock) = debouncer(300);
        d.schedule(());
        clock.advance_ms(299);
        assert!(d.poll().is_none());
        clock.advance_ms(1);
        assert!(d.poll().is_some());
    }

    #[test]
    fn cancelled_action_never_fires_even_when_due() {
        let (mut d, clock) = debouncer(100);
        let handle = d.schedule(());
        clock.advance_ms(500);
        assert!(d.cancel(handle));
        assert!(d.poll().is_none());
        assert!(!d.cancel(handle));
    }

    #[test]
    fn stale_handle_does_not_cancel_newer_scheduling() {
        let (mut d, clock) = debouncer(100);
        let first = d.schedule(1);
        let _second = d.schedule(2);
        assert!(!d.cancel(first));
        clock.advance_ms(100);
        assert_eq!(d.poll(), Some(2));
    }

    #[test]
    fn flush_bypasses_the_deadline() {
        let (mut d, _clock) = debouncer(1_000);
        d.schedule("last");
        assert_eq!(d.flush(), Some("last"));
        assert_eq!(d.flush(), None);
    }

    #[test]
    fn callbacks_fire_once_per_quiet_period() {
        let (mut d, clock) = debouncer::<Box<dyn FnOnce()>>(300);
        let fired = Rc::new(Cell::new(0));
        for _ in 0..5 {
            let fired = fired.clone();
            d.schedule(Box::new(move || fired.set(fired.get() + 1)));
        }
        clock.advance_ms(300);
        while let Some(callback) = d.poll() {
            callback();
        }
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn custom_delay_overrides_default() {
        let (mut d, clock) = debouncer(1_000);
        d.schedule_in((), Duration::from_millis(10));
        clock.advance_ms(10);
        assert!(d.poll().is_some());
    }
}
