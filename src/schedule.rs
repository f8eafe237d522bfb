//! Deferred-work scheduling.
//!
//! Components that batch work (connection creation, most notably) expose
//! an explicit `flush()` and never run it themselves. When work is
//! queued they ask the host's [`FlushScheduler`] to call `flush()` at the
//! end of the current tick. What a tick maps to is the host's business,
//! typically a frame callback or a timer.

use std::cell::Cell;

/// Host hook that arranges for one later `flush()` call.
pub trait FlushScheduler {
    /// Ask the host to flush the requesting component soon. Called at
    /// most once per tick (see [`FlushGate`]); implementations need no
    /// dedup of their own.
    fn request_flush(&self);
}

/// Scheduler for hosts (and tests) that drive `flush()` themselves.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManualScheduler;

impl FlushScheduler for ManualScheduler {
    fn request_flush(&self) {}
}

/// Adapter wrapping a closure, for bridging to timers or frame
/// callbacks.
pub struct CallbackScheduler<F: Fn()> {
    callback: F,
}

impl<F: Fn()> CallbackScheduler<F> {
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F: Fn()> FlushScheduler for CallbackScheduler<F> {
    fn request_flush(&self) {
        (self.callback)();
    }
}

/// Once-per-tick latch in front of a [`FlushScheduler`].
///
/// A burst of queueing calls arms the gate once; the first caller gets
/// `true` (and forwards the request), the rest `false`. The flush itself
/// disarms the gate so the next tick starts fresh.
#[derive(Debug, Default)]
pub struct FlushGate {
    armed: Cell<bool>,
}

impl FlushGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the gate. True only for the first caller since the last
    /// [`disarm`](Self::disarm).
    pub fn arm(&self) -> bool {
        if self.armed.get() {
            false
        } else {
            self.armed.set(true);
            true
        }
    }

    /// Reset at the start of a flush.
    pub fn disarm(&self) {
        self.armed.set(false);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.get()
    }
}
