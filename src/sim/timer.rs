//! Cancellable one-shot timer driven by simulation time

use serde::{Deserialize, Serialize};

/// Identifies one scheduling of a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerHandle(u64);

/// A single pending deadline. Scheduling again replaces the old deadline,
/// so a handle from an earlier scheduling never fires.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timer {
    pending: Option<(TimerHandle, f32)>,
    next_id: u64,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire after `delay` seconds of simulation time
    pub fn schedule(&mut self, delay: f32) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.pending = Some((handle, delay.max(0.0)));
        handle
    }

    /// Drop the pending deadline. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Seconds until the pending deadline
    pub fn remaining(&self) -> Option<f32> {
        self.pending.map(|(_, r)| r)
    }

    /// Advance simulation time; returns the handle that fired, if any
    pub fn advance(&mut self, dt: f32) -> Option<TimerHandle> {
        let (handle, remaining) = self.pending.as_mut()?;
        *remaining -= dt;
        if *remaining <= 0.0 {
            let fired = *handle;
            self.pending = None;
            Some(fired)
        } else {
            None
        }
    }
}
