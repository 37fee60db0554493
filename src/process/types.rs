//! Process type definitions
//!
//! The process record as seen by the trap and tick code: identity, state,
//! the saved user context and the accounting counters the adaptive tick
//! reads.

use core::mem::{offset_of, size_of};

/// Process ID type
pub type Pid = u64;

/// Process state enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcState {
    /// Free table slot.
    Unused,
    /// Allocated but not yet runnable.
    Used,
    Sleeping,
    Runnable,
    Running,
    Zombie,
}

impl ProcState {
    pub const fn as_str(self) -> &'static str {
        match self {
            ProcState::Unused => "unused",
            ProcState::Used => "used",
            ProcState::Sleeping => "sleep",
            ProcState::Runnable => "runble",
            ProcState::Running => "run",
            ProcState::Zombie => "zombie",
        }
    }

    /// Running or waiting for a hart.
    pub const fn is_active(self) -> bool {
        matches!(self, ProcState::Running | ProcState::Runnable)
    }
}

/// Saved user context of one process.
///
/// `trampoline.S` addresses these fields by fixed offset through the
/// TRAPFRAME mapping, so the layout is part of the ABI. The first five words
/// are filled by `user_trap_return` for the next trip into the kernel; the
/// rest are the user registers saved by `uservec`.
///
/// On the bare-metal target the record is page-aligned so the address-space
/// code can map exactly this process's trapframe at TRAPFRAME.
#[cfg_attr(kernel_target, repr(C, align(4096)))]
#[cfg_attr(not(kernel_target), repr(C))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Trapframe {
    /// Kernel page table (`satp` value).
    pub kernel_satp: u64,
    /// Top of this process's kernel stack.
    pub kernel_sp: u64,
    /// Address of the user trap handler.
    pub kernel_trap: u64,
    /// Saved user program counter.
    pub epc: u64,
    /// Hart id, reloaded into `tp`.
    pub kernel_hartid: u64,
    pub ra: u64,
    pub sp: u64,
    pub gp: u64,
    pub tp: u64,
    pub t0: u64,
    pub t1: u64,
    pub t2: u64,
    pub s0: u64,
    pub s1: u64,
    pub a0: u64,
    pub a1: u64,
    pub a2: u64,
    pub a3: u64,
    pub a4: u64,
    pub a5: u64,
    pub a6: u64,
    pub a7: u64,
    pub s2: u64,
    pub s3: u64,
    pub s4: u64,
    pub s5: u64,
    pub s6: u64,
    pub s7: u64,
    pub s8: u64,
    pub s9: u64,
    pub s10: u64,
    pub s11: u64,
    pub t3: u64,
    pub t4: u64,
    pub t5: u64,
    pub t6: u64,
}

const _: () = {
    assert!(offset_of!(Trapframe, kernel_satp) == 0);
    assert!(offset_of!(Trapframe, kernel_sp) == 8);
    assert!(offset_of!(Trapframe, kernel_trap) == 16);
    assert!(offset_of!(Trapframe, epc) == 24);
    assert!(offset_of!(Trapframe, kernel_hartid) == 32);
    assert!(offset_of!(Trapframe, ra) == 40);
    assert!(offset_of!(Trapframe, a0) == 112);
    assert!(offset_of!(Trapframe, a7) == 168);
    assert!(offset_of!(Trapframe, s2) == 176);
    assert!(offset_of!(Trapframe, t6) == 280);
    assert!(size_of::<Trapframe>() <= crate::config::PGSIZE as usize);
};

impl Trapframe {
    pub const fn zero() -> Self {
        Self {
            kernel_satp: 0,
            kernel_sp: 0,
            kernel_trap: 0,
            epc: 0,
            kernel_hartid: 0,
            ra: 0,
            sp: 0,
            gp: 0,
            tp: 0,
            t0: 0,
            t1: 0,
            t2: 0,
            s0: 0,
            s1: 0,
            a0: 0,
            a1: 0,
            a2: 0,
            a3: 0,
            a4: 0,
            a5: 0,
            a6: 0,
            a7: 0,
            s2: 0,
            s3: 0,
            s4: 0,
            s5: 0,
            s6: 0,
            s7: 0,
            s8: 0,
            s9: 0,
            s10: 0,
            s11: 0,
            t3: 0,
            t4: 0,
            t5: 0,
            t6: 0,
        }
    }

    /// Zero every saved register in place.
    pub fn clear(&mut self) {
        // SAFETY: every field is a `u64`, for which all-zero bytes are valid,
        // and `self` is a unique reference to one whole record.
        unsafe { core::ptr::write_bytes(self as *mut Self, 0, 1) }
    }

    /// System call arguments as passed in a0..a5.
    pub const fn syscall_args(&self) -> [u64; 6] {
        [self.a0, self.a1, self.a2, self.a3, self.a4, self.a5]
    }

    /// System call number, passed in a7.
    pub const fn syscall_number(&self) -> u64 {
        self.a7
    }
}

/// Tick accounting for one process.
///
/// Counters only grow while the process is live. Ratios are in basis points
/// and change only when an update crosses a smoothing boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProcStats {
    pub run_ticks: u64,
    pub sleep_ticks: u64,
    pub runnable_ticks: u64,
    /// Tick at which the counters were last brought up to date.
    pub last_tick: u64,
    pub cpu_usage: u64,
    pub io_intensity: u64,
}

impl ProcStats {
    pub const fn starting_at(now: u64) -> Self {
        Self {
            run_ticks: 0,
            sleep_ticks: 0,
            runnable_ticks: 0,
            last_tick: now,
            cpu_usage: 0,
            io_intensity: 0,
        }
    }

    pub const fn total(&self) -> u64 {
        self.run_ticks + self.sleep_ticks + self.runnable_ticks
    }
}

/// Process record.
///
/// Not `Copy`: the page-aligned trapframe makes a by-value record large, so
/// slots are reset in place with [`Proc::clear`].
#[derive(Debug)]
pub struct Proc {
    pub pid: Pid,
    pub state: ProcState,
    /// Base of the kernel stack (one page).
    pub kstack: u64,
    /// Physical address of the root user page table.
    pub pagetable: u64,
    /// Size of user memory in bytes.
    pub size: u64,
    pub stats: ProcStats,
    pub trapframe: Trapframe,
}

impl Proc {
    pub const fn unused() -> Self {
        Self {
            pid: 0,
            state: ProcState::Unused,
            kstack: 0,
            pagetable: 0,
            size: 0,
            stats: ProcStats::starting_at(0),
            trapframe: Trapframe::zero(),
        }
    }

    /// Put the record back into its `unused()` state without building a
    /// temporary.
    pub fn clear(&mut self) {
        self.pid = 0;
        self.state = ProcState::Unused;
        self.kstack = 0;
        self.pagetable = 0;
        self.size = 0;
        self.stats = ProcStats::starting_at(0);
        self.trapframe.clear();
    }
}
