//! Global tick counter

use crate::process::WaitChannel;
use crate::sync::{IrqMutex, IrqMutexGuard};

/// Count of timer interrupts since boot, across all harts.
///
/// The counter's lock doubles as the lock for waiting on it: a timed wait
/// holds it while comparing and hands it to `Lifecycle::sleep`.
pub struct TickClock {
    ticks: IrqMutex<u64>,
}

impl TickClock {
    pub const fn new() -> Self {
        Self {
            ticks: IrqMutex::new(0),
        }
    }

    pub fn now(&self) -> u64 {
        *self.ticks.lock()
    }

    /// Increment and return the new count.
    pub fn advance(&self) -> u64 {
        let mut ticks = self.ticks.lock();
        *ticks += 1;
        *ticks
    }

    pub fn lock(&self) -> IrqMutexGuard<'_, u64> {
        self.ticks.lock()
    }

    pub fn mutex(&self) -> &IrqMutex<u64> {
        &self.ticks
    }

    /// Channel timed waiters sleep on; woken once per tick.
    pub fn channel(&self) -> WaitChannel {
        WaitChannel::of(&self.ticks)
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new()
    }
}
