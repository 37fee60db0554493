//! Process accounting
//!
//! Attributes the ticks since each record's last update to the state the
//! record is in now, and refreshes the usage ratios the interval selection
//! reads whenever an update carries a record across a multiple of
//! [`STATS_SMOOTHING_PERIOD`].

use crate::config::{BASIS_POINTS, STATS_SMOOTHING_PERIOD};
use crate::process::{Pid, ProcState, ProcStats, ProcTable};

/// Bring every live record up to tick `now`.
///
/// Takes each record's own lock in turn and never two at once. Must not be
/// called with the tick lock held.
pub fn update(procs: &ProcTable, now: u64) {
    for slot in procs.slots() {
        let mut proc = slot.lock();
        let state = proc.state;
        account(&mut proc.stats, state, now);
    }
}

/// Charge one record for the time since `last_tick`.
///
/// Harts increment the counter concurrently, so a hart can arrive with a
/// `now` older than a record's `last_tick`; such a record is left as is.
/// The ratios are refreshed by whichever update first moves `last_tick`
/// past a smoothing boundary, so a boundary tick overtaken by a later one
/// still gets its refresh.
pub fn account(stats: &mut ProcStats, state: ProcState, now: u64) {
    let counter = match state {
        ProcState::Unused => return,
        ProcState::Running => Some(&mut stats.run_ticks),
        ProcState::Sleeping => Some(&mut stats.sleep_ticks),
        ProcState::Runnable => Some(&mut stats.runnable_ticks),
        ProcState::Used | ProcState::Zombie => None,
    };

    if now <= stats.last_tick {
        return;
    }
    let elapsed = now - stats.last_tick;
    let crossed = stats.last_tick / STATS_SMOOTHING_PERIOD < now / STATS_SMOOTHING_PERIOD;
    if let Some(counter) = counter {
        *counter += elapsed;
    }
    stats.last_tick = now;

    if matches!(state, ProcState::Used | ProcState::Zombie) {
        return;
    }
    if crossed {
        refresh_ratios(stats);
    }
}

/// Recompute `cpu_usage` and `io_intensity`; no-op while nothing has been
/// accounted yet.
pub fn refresh_ratios(stats: &mut ProcStats) {
    let total = stats.total();
    if total == 0 {
        return;
    }
    stats.cpu_usage = ratio(stats.run_ticks, total);
    stats.io_intensity = ratio(stats.sleep_ticks, total);
}

fn ratio(part: u64, total: u64) -> u64 {
    ((part as u128 * BASIS_POINTS as u128) / total as u128) as u64
}

/// Copy of the accounting for `pid`.
pub fn snapshot(procs: &ProcTable, pid: Pid) -> Option<ProcStats> {
    procs.slots().find_map(|slot| {
        let proc = slot.lock();
        (proc.state != ProcState::Unused && proc.pid == pid).then_some(proc.stats)
    })
}

/// Dump the accounting of every live process to the log.
pub fn list_processes(procs: &ProcTable) {
    crate::kinfo!("=== Process Tick Accounting ===");
    crate::kinfo!(
        "{:<5} {:<7} {:>10} {:>10} {:>10} {:>6} {:>6}",
        "PID", "State", "Run", "Sleep", "Runnable", "CPU%", "IO%"
    );

    for slot in procs.slots() {
        let proc = slot.lock();
        if proc.state == ProcState::Unused {
            continue;
        }
        crate::kinfo!(
            "{:<5} {:<7} {:>10} {:>10} {:>10} {:>3}.{:02} {:>3}.{:02}",
            proc.pid,
            proc.state.as_str(),
            proc.stats.run_ticks,
            proc.stats.sleep_ticks,
            proc.stats.runnable_ticks,
            proc.stats.cpu_usage / 100,
            proc.stats.cpu_usage % 100,
            proc.stats.io_intensity / 100,
            proc.stats.io_intensity % 100
        );
    }
}
