//! Tick control syscalls
//!
//! Implements: set_tick_mode, get_perf_metrics

use super::types::{PerfMetrics, SyscallError, SyscallResult};
use super::SyscallContext;
use crate::scheduler::TickMode;

/// Select fixed (0) or dynamic (anything else) tick intervals for every
/// hart, from the next timer interrupt on.
pub fn set_tick_mode(ctx: &SyscallContext<'_>, raw: u64) -> SyscallResult {
    let mode = TickMode::from_raw(raw);
    ctx.state.set_tick_mode(mode);
    crate::kdebug!("[set_tick_mode] pid {} selected {} ticks", ctx.pid(), mode.as_str());
    Ok(0)
}

/// Current metrics as seen from this hart.
pub fn perf_metrics(ctx: &SyscallContext<'_>) -> PerfMetrics {
    let state = ctx.state;
    PerfMetrics {
        total_ticks: state.clock().now(),
        context_switches: state.context_switches(),
        current_tick_interval: state
            .cpu(ctx.platform.hart.id())
            .map_or(0, |cpu| cpu.current_tick_interval()),
    }
}

/// Copy a [`PerfMetrics`] snapshot to user address `dest`. Nothing is
/// written unless the whole destination is valid.
pub fn get_perf_metrics(ctx: &SyscallContext<'_>, dest: u64) -> SyscallResult {
    let metrics = perf_metrics(ctx);
    let pagetable = ctx.pagetable();

    ctx.platform
        .memory
        .copy_out(pagetable, dest, &metrics.to_bytes())
        .map_err(|err| {
            crate::kdebug!("[get_perf_metrics] pid {}: {}", ctx.pid(), err);
            SyscallError::BadAddress
        })?;
    Ok(0)
}
