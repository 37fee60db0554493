//! Per-hart tick state
//!
//! Written only by the owning hart from its timer interrupt. Other harts may
//! read the values for metrics; no cross-hart consistency is promised.

use core::sync::atomic::{AtomicU64, Ordering};

pub struct PerCpu {
    current_tick_interval: AtomicU64,
    timer_interrupts: AtomicU64,
}

impl PerCpu {
    pub const fn new() -> Self {
        Self {
            current_tick_interval: AtomicU64::new(0),
            timer_interrupts: AtomicU64::new(0),
        }
    }

    /// Interval this hart last programmed, in `time` cycles. Zero until the
    /// hart arms its first deadline.
    pub fn current_tick_interval(&self) -> u64 {
        self.current_tick_interval.load(Ordering::Relaxed)
    }

    /// Timer interrupts handled on this hart.
    pub fn timer_interrupts(&self) -> u64 {
        self.timer_interrupts.load(Ordering::Relaxed)
    }

    pub(crate) fn record_interval(&self, interval: u64) {
        self.current_tick_interval.store(interval, Ordering::Relaxed);
    }

    pub(crate) fn note_timer_interrupt(&self) {
        self.timer_interrupts.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for PerCpu {
    fn default() -> Self {
        Self::new()
    }
}
