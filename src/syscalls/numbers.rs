//! System call numbers
//!
//! Passed in a7. The numbering follows the classic RISC-V teaching kernel
//! table; the file and device calls served elsewhere keep their slots.

// Process management
pub const SYS_FORK: u64 = 1;
pub const SYS_EXIT: u64 = 2;
pub const SYS_WAIT: u64 = 3;
pub const SYS_KILL: u64 = 6;
pub const SYS_GETPID: u64 = 11;
pub const SYS_SBRK: u64 = 12;

// Time
pub const SYS_SLEEP: u64 = 13;
pub const SYS_UPTIME: u64 = 14;

// Tick control
pub const SYS_SET_TICK_MODE: u64 = 22;
pub const SYS_GET_PERF_METRICS: u64 = 23;

/// Name for diagnostics.
pub const fn name(number: u64) -> Option<&'static str> {
    match number {
        SYS_FORK => Some("fork"),
        SYS_EXIT => Some("exit"),
        SYS_WAIT => Some("wait"),
        SYS_KILL => Some("kill"),
        SYS_GETPID => Some("getpid"),
        SYS_SBRK => Some("sbrk"),
        SYS_SLEEP => Some("sleep"),
        SYS_UPTIME => Some("uptime"),
        SYS_SET_TICK_MODE => Some("set_tick_mode"),
        SYS_GET_PERF_METRICS => Some("get_perf_metrics"),
        _ => None,
    }
}
