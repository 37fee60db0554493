//! Workload-adaptive interval selection
//!
//! One pass over the process table produces a [`WorkloadTally`];
//! [`choose_interval`] maps it to a deadline delta with integer arithmetic
//! only, since this runs inside the timer interrupt.
//!
//! | condition                                   | interval                                  |
//! |---------------------------------------------|-------------------------------------------|
//! | `high_cpu > active/2` and `active > 1`      | default − (default−min) · high_cpu/active |
//! | `high_io > active/2` and `active > 1`       | default + (max−default) · high_io/active  |
//! | `active <= 1`                               | max                                       |
//! | otherwise                                   | default − (default−min) · active/capacity |
//!
//! The result is always clamped to `[min, max]`.

use crate::config::TickConfig;
use crate::process::{ProcState, ProcTable};

/// Process mix observed in one scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkloadTally {
    /// Records in any state but `Unused`.
    pub total: u64,
    /// Running or runnable.
    pub active: u64,
    /// Live records with `cpu_usage` above the CPU threshold.
    pub high_cpu: u64,
    /// Live records with `io_intensity` above the IO threshold.
    pub high_io: u64,
}

/// Count the process mix, locking one record at a time.
pub fn tally(procs: &ProcTable, config: &TickConfig) -> WorkloadTally {
    let mut tally = WorkloadTally::default();

    for slot in procs.slots() {
        let proc = slot.lock();
        if proc.state == ProcState::Unused {
            continue;
        }
        tally.total += 1;
        if proc.state.is_active() {
            tally.active += 1;
        }
        if proc.stats.cpu_usage > config.cpu_threshold {
            tally.high_cpu += 1;
        }
        if proc.stats.io_intensity > config.io_threshold {
            tally.high_io += 1;
        }
    }

    tally
}

/// Deadline delta for `tally`. `capacity` is the process-table size used
/// by the fairness branch.
pub fn choose_interval(tally: &WorkloadTally, config: &TickConfig, capacity: u64) -> u64 {
    let WorkloadTally {
        active,
        high_cpu,
        high_io,
        ..
    } = *tally;
    let shrink_span = config.default_interval.saturating_sub(config.min_interval);
    let grow_span = config.max_interval.saturating_sub(config.default_interval);

    let interval = if active > 1 && high_cpu > active / 2 {
        // high_cpu also counts sleeping records, so the ratio can pass 1.
        config
            .default_interval
            .saturating_sub(scale(shrink_span, high_cpu, active))
    } else if active > 1 && high_io > active / 2 {
        config
            .default_interval
            .saturating_add(scale(grow_span, high_io, active))
    } else if active <= 1 {
        config.max_interval
    } else {
        config
            .default_interval
            .saturating_sub(scale(shrink_span, active, capacity.max(1)))
    };

    interval.max(config.min_interval).min(config.max_interval)
}

/// `span * num / den` without intermediate overflow.
fn scale(span: u64, num: u64, den: u64) -> u64 {
    let scaled = (span as u128 * num as u128) / den as u128;
    u64::try_from(scaled).unwrap_or(u64::MAX)
}
