//! Inference throttling: minimum spacing between runs and no overlap.

use crate::pipeline::clock::Clock;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct GateState {
    last_run: Option<Instant>,
    in_flight: bool,
}

/// Admits at most one inference at a time, spaced at least `interval` after
/// the previous completion.
#[derive(Debug)]
pub struct ThrottleGate {
    interval: Duration,
    state: Mutex<GateState>,
}

impl ThrottleGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: Mutex::new(GateState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Succeeds iff nothing is in flight and the interval since the last
    /// completion has elapsed. On success the gate is marked in flight.
    pub fn try_acquire(&self, now: Instant) -> bool {
        let mut state = self.state();
        if state.in_flight {
            return false;
        }
        let ready = match state.last_run {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        };
        if ready {
            state.in_flight = true;
        }
        ready
    }

    /// Mark the in-flight run finished at `now`, successful or not.
    pub fn release(&self, now: Instant) {
        let mut state = self.state();
        state.in_flight = false;
        state.last_run = Some(now);
    }

    /// Clear the in-flight flag without recording a run.
    fn abandon(&self) {
        self.state().in_flight = false;
    }

    pub fn in_flight(&self) -> bool {
        self.state().in_flight
    }

    pub fn last_run(&self) -> Option<Instant> {
        self.state().last_run
    }

    /// Acquire a permit that releases the gate when dropped.
    pub fn acquire(gate: &Arc<Self>, clock: &Arc<dyn Clock>) -> Option<ThrottlePermit> {
        if gate.try_acquire(clock.now()) {
            Some(ThrottlePermit {
                gate: gate.clone(),
                clock: clock.clone(),
                completed: true,
            })
        } else {
            None
        }
    }
}

/// Holds the gate in flight; dropping it releases the gate at the clock's
/// current time, also on early return or panic.
pub struct ThrottlePermit {
    gate: Arc<ThrottleGate>,
    clock: Arc<dyn Clock>,
    completed: bool,
}

impl ThrottlePermit {
    /// Give the permit back without counting a run, e.g. when the session
    /// was disabled between acquisition and start.
    pub fn cancel(mut self) {
        self.completed = false;
    }
}

impl Drop for ThrottlePermit {
    fn drop(&mut self) {
        if self.completed {
            self.gate.release(self.clock.now());
        } else {
            self.gate.abandon();
        }
    }
}
