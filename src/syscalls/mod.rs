//! Syscall subsystem
//!
//! Dispatches the `ecall` traps taken from user mode. The call number is in
//! a7, arguments in a0..a5, and the result goes back in a0 (`-1` on any
//! failure). It is organized into submodules by functionality:
//!
//! - `numbers`: Syscall number constants
//! - `types`: Error type, result encoding and the perf-metrics layout
//! - `process`: exit, getpid, fork, wait, sbrk, sleep, kill, uptime
//! - `tick`: set_tick_mode, get_perf_metrics

mod numbers;
mod process;
mod tick;
mod types;

// Re-export syscall numbers for external use
pub use numbers::*;
pub use tick::perf_metrics;
pub use types::{to_user, PerfMetrics, SyscallError, SyscallResult, SYSCALL_FAILURE};

use crate::process::Pid;
use crate::state::{KernelState, Platform};

/// The calling process and the services a system call may use.
pub struct SyscallContext<'a> {
    pub state: &'a KernelState,
    pub platform: &'a Platform<'a>,
    /// Process-table slot of the caller.
    pub slot: usize,
}

impl SyscallContext<'_> {
    pub fn pid(&self) -> Pid {
        self.state.procs().lock(self.slot).map_or(0, |proc| proc.pid)
    }

    pub fn pagetable(&self) -> u64 {
        self.state
            .procs()
            .lock(self.slot)
            .map_or(0, |proc| proc.pagetable)
    }
}

/// Run the system call recorded in the caller's trapframe and store the
/// encoded result in its a0.
pub fn dispatch(state: &KernelState, platform: &Platform<'_>, slot: usize) {
    let Some((number, args)) = state
        .procs()
        .lock(slot)
        .map(|proc| (proc.trapframe.syscall_number(), proc.trapframe.syscall_args()))
    else {
        crate::kerror!("syscall: no process in slot {}", slot);
        return;
    };

    let ctx = SyscallContext {
        state,
        platform,
        slot,
    };
    let result = syscall(&ctx, number, args);

    if let Err(err) = result {
        crate::ktrace!(
            "[syscall] pid {} {} -> {}",
            ctx.pid(),
            numbers::name(number).unwrap_or("?"),
            err
        );
    }

    if let Some(mut proc) = state.procs().lock(slot) {
        proc.trapframe.a0 = to_user(result);
    }
}

/// Main syscall dispatcher
pub fn syscall(ctx: &SyscallContext<'_>, number: u64, args: [u64; 6]) -> SyscallResult {
    let [arg0, ..] = args;

    match number {
        SYS_FORK => process::fork(ctx),
        SYS_EXIT => process::exit(ctx, arg0 as i32),
        SYS_WAIT => process::wait(ctx, arg0),
        SYS_KILL => process::kill(ctx, arg0 as i32 as i64),
        SYS_GETPID => process::getpid(ctx),
        SYS_SBRK => process::sbrk(ctx, arg0 as i32 as i64),
        SYS_SLEEP => process::sleep(ctx, arg0 as i32 as i64),
        SYS_UPTIME => process::uptime(ctx),
        SYS_SET_TICK_MODE => tick::set_tick_mode(ctx, arg0 as i32 as u64),
        SYS_GET_PERF_METRICS => tick::get_perf_metrics(ctx, arg0),
        _ => {
            crate::kwarn!("{}: unknown sys call {}", ctx.pid(), number);
            Err(SyscallError::UnknownSyscall)
        }
    }
}
