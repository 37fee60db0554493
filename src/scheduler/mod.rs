//! Clock tick subsystem
//!
//! Drives the global tick counter and decides *when* the next timer
//! interrupt fires on each hart. Which process runs next is the core
//! scheduler loop's business and is reached only through
//! [`Lifecycle`](crate::process::Lifecycle).
//!
//! ## Tick modes
//!
//! - **Fixed**: every hart re-arms its timer with the configured default
//!   interval.
//! - **Dynamic**: each hart scans the process table after every tick and
//!   picks an interval from the observed mix of CPU-heavy and IO-heavy
//!   processes, bounded by the configured minimum and maximum.
//!
//! ## Lock Hierarchy
//!
//! The tick lock and the per-process locks are never nested:
//! 1. the tick lock is held only to increment the counter (or, in a timed
//!    wait, to compare against it);
//! 2. accounting and the interval scan take one process lock at a time,
//!    after the tick lock has been dropped.
//!
//! ## Module Organization
//!
//! - `clock`: the global tick counter and its wait channel
//! - `stats`: per-process time attribution and usage ratios
//! - `interval`: workload tally and interval selection
//! - `percpu`: per-hart interval and interrupt counters

pub mod clock;
pub mod interval;
pub mod percpu;
pub mod stats;

pub use clock::TickClock;
pub use interval::{choose_interval, tally, WorkloadTally};
pub use percpu::PerCpu;

use crate::arch::Hart;
use crate::process::Lifecycle;
use crate::state::KernelState;

/// How the next timer deadline is chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickMode {
    Fixed,
    Dynamic,
}

impl TickMode {
    /// Decode the `set_tick_mode` argument: zero is fixed, anything else
    /// dynamic.
    pub const fn from_raw(raw: u64) -> Self {
        if raw == 0 {
            TickMode::Fixed
        } else {
            TickMode::Dynamic
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            TickMode::Fixed => "fixed",
            TickMode::Dynamic => "dynamic",
        }
    }
}

/// Interval for the next tick under the current mode.
pub fn next_interval(state: &KernelState) -> u64 {
    let config = state.config();
    match state.tick_mode() {
        TickMode::Fixed => config.default_interval,
        TickMode::Dynamic => {
            let tally = interval::tally(state.procs(), config);
            interval::choose_interval(&tally, config, state.procs().capacity() as u64)
        }
    }
}

/// Timer interrupt on `hart`: advance time, account, wake timed waiters and
/// arm the next deadline. Returns the interval that was programmed, or 0
/// when the kernel has been halted and nothing was done.
pub fn clock_interrupt(state: &KernelState, hart: &dyn Hart, lifecycle: &dyn Lifecycle) -> u64 {
    if state.park_if_halted() {
        return 0;
    }
    let hart_id = hart.id();
    let Some(cpu) = state.cpu(hart_id) else {
        crate::kpanic!("clock_interrupt: hart {} has no per-cpu slot", hart_id);
    };

    let now = state.clock().advance();
    stats::update(state.procs(), now);
    lifecycle.wakeup(state.clock().channel());

    let interval = next_interval(state);
    cpu.record_interval(interval);
    cpu.note_timer_interrupt();
    crate::ktrace!("tick {} on hart {}: next in {} cycles", now, hart_id, interval);

    // Writing stimecmp also clears the pending timer interrupt.
    hart.set_timer(hart.time().wrapping_add(interval));
    interval
}
