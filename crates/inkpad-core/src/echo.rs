//! Suppress-echo guard for two mutually observing values.
//!
//! When a change to A is propagated to B programmatically, B reports that
//! change back as if it were its own. [`SuppressEcho`] breaks the cycle: the
//! side that propagates engages the guard, every observer ignores events
//! while it is engaged, and the host releases it on the next frame.

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SuppressEcho {
    engaged: bool,
}

impl SuppressEcho {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    /// Run `propagate` unless an echo is in flight, then engage the guard.
    ///
    /// Returns `None` when the event was an echo and was dropped.
    pub fn propagate<R>(&mut self, propagate: impl FnOnce() -> R) -> Option<R> {
        if self.engaged {
            return None;
        }
        let result = propagate();
        self.engaged = true;
        Some(result)
    }

    /// Release the guard. Called once per animation frame.
    pub fn on_frame(&mut self) {
        self.engaged = false;
    }
}
