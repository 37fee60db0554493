//! Process management related syscalls
//!
//! Implements: exit, getpid, fork, wait, sbrk, sleep, kill, uptime

use super::types::{SyscallError, SyscallResult};
use super::SyscallContext;
use crate::process::Pid;

pub fn exit(ctx: &SyscallContext<'_>, status: i32) -> SyscallResult {
    crate::kdebug!("[exit] pid {} exiting with status {}", ctx.pid(), status);
    ctx.platform.lifecycle.exit(status);
    // Reached only when the lifecycle returns (hosted builds).
    Ok(0)
}

pub fn getpid(ctx: &SyscallContext<'_>) -> SyscallResult {
    Ok(ctx.pid())
}

pub fn fork(ctx: &SyscallContext<'_>) -> SyscallResult {
    ctx.platform
        .lifecycle
        .fork()
        .ok_or(SyscallError::NoProcessSlots)
}

pub fn wait(ctx: &SyscallContext<'_>, status_addr: u64) -> SyscallResult {
    ctx.platform
        .lifecycle
        .wait(status_addr)
        .ok_or(SyscallError::NoChild)
}

/// Grow (or with a negative `delta`, shrink) user memory. Returns the size
/// before the change.
pub fn sbrk(ctx: &SyscallContext<'_>, delta: i64) -> SyscallResult {
    let procs = ctx.state.procs();
    let (old_size, pagetable) = match procs.lock(ctx.slot) {
        Some(proc) => (proc.size, proc.pagetable),
        None => return Err(SyscallError::NoSuchProcess),
    };

    let new_size = ctx
        .platform
        .lifecycle
        .grow(pagetable, old_size, delta)
        .ok_or(SyscallError::OutOfMemory)?;

    // Only the process itself changes its size, so nothing moved meanwhile.
    if let Some(mut proc) = procs.lock(ctx.slot) {
        proc.size = new_size;
    }
    Ok(old_size)
}

/// Block for `n` ticks. A negative count sleeps for zero ticks.
///
/// The termination flag is checked on every wake; a killed caller gets
/// [`SyscallError::Killed`] instead of finishing the wait.
pub fn sleep(ctx: &SyscallContext<'_>, n: i64) -> SyscallResult {
    let n = n.max(0) as u64;
    let clock = ctx.state.clock();
    let procs = ctx.state.procs();

    let mut ticks = clock.lock();
    let start = *ticks;
    while ticks.wrapping_sub(start) < n {
        if procs.is_killed(ctx.slot) {
            return Err(SyscallError::Killed);
        }
        ticks = ctx
            .platform
            .lifecycle
            .sleep(clock.channel(), clock.mutex(), ticks);
    }
    Ok(0)
}

pub fn kill(ctx: &SyscallContext<'_>, pid: i64) -> SyscallResult {
    let Ok(pid) = Pid::try_from(pid) else {
        return Err(SyscallError::NoSuchProcess);
    };
    if ctx.state.procs().kill(pid) {
        crate::kdebug!("[kill] pid {} flagged pid {}", ctx.pid(), pid);
        Ok(0)
    } else {
        Err(SyscallError::NoSuchProcess)
    }
}

pub fn uptime(ctx: &SyscallContext<'_>) -> SyscallResult {
    Ok(ctx.state.clock().now())
}
