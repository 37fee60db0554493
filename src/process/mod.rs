//! Process subsystem seams
//!
//! The trap path owns the process table's accounting fields and trapframes,
//! but process creation, teardown, context switching and page-table walks
//! belong to other parts of the kernel. They are reached through the two
//! traits below.
//!
//! ## Module Organization
//!
//! - `types`: `Proc`, `ProcState`, `ProcStats`, `Trapframe`, `Pid`
//! - `table`: the fixed-capacity `ProcTable` with per-slot locks

mod table;
mod types;

use core::fmt;

pub use table::{ProcSlot, ProcTable};
pub use types::{Pid, Proc, ProcState, ProcStats, Trapframe};

use crate::sync::{IrqMutex, IrqMutexGuard};

/// Address a sleeping process waits on. Wakeups are broadcast to every
/// sleeper on the same channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WaitChannel(usize);

impl WaitChannel {
    pub fn of<T>(object: &T) -> Self {
        WaitChannel(object as *const T as usize)
    }

    pub const fn addr(self) -> usize {
        self.0
    }
}

/// Process lifecycle and context-switch services of the core scheduler.
pub trait Lifecycle: Sync {
    /// Table slot of the process running on this hart, if any.
    fn current(&self) -> Option<usize>;

    /// Give up the hart; returns when this process is scheduled again.
    fn yield_cpu(&self);

    /// Atomically release `lock` and block on `chan`, then re-acquire the
    /// lock before returning. `guard` must be a guard of `lock`.
    fn sleep<'a>(
        &self,
        chan: WaitChannel,
        lock: &'a IrqMutex<u64>,
        guard: IrqMutexGuard<'a, u64>,
    ) -> IrqMutexGuard<'a, u64>;

    /// Make every process sleeping on `chan` runnable.
    fn wakeup(&self, chan: WaitChannel);

    /// Terminate the current process. Does not return on hardware.
    fn exit(&self, status: i32);

    fn fork(&self) -> Option<Pid>;

    /// Reap a child, storing its exit status at user address `status_addr`
    /// unless it is zero.
    fn wait(&self, status_addr: u64) -> Option<Pid>;

    /// Grow or shrink user memory from `old_size` by `delta` bytes. Returns
    /// the new size.
    fn grow(&self, pagetable: u64, old_size: u64, delta: i64) -> Option<u64>;
}

/// Page-table-aware copy into user space.
pub trait UserMemory: Sync {
    /// Copy `src` to user virtual address `dst` in `pagetable`. The whole
    /// destination range is validated before any byte is written.
    fn copy_out(&self, pagetable: u64, dst: u64, src: &[u8]) -> Result<(), CopyOutError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CopyOutError {
    /// Some page of the range is not mapped.
    Unmapped { va: u64 },
    /// Some page of the range is mapped without user write permission.
    NotWritable { va: u64 },
}

impl fmt::Display for CopyOutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CopyOutError::Unmapped { va } => write!(f, "user address {:#x} not mapped", va),
            CopyOutError::NotWritable { va } => {
                write!(f, "user address {:#x} not writable", va)
            }
        }
    }
}
