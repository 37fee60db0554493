//! Architecture layer
//!
//! The trap and tick code never touches a CSR directly. It goes through the
//! [`Hart`] trait, which the bare-metal build implements with real CSR
//! instructions ([`riscv::RiscvHart`]) and the test crate implements with
//! recorded registers.
//!
//! ## Interrupt nesting
//!
//! [`push_off`] / [`pop_off`] keep a per-hart nesting depth so that locks
//! taken from both thread and interrupt context can disable interrupts
//! without losing the caller's original enable state. Hosted builds have no
//! interrupts and the pair compiles to nothing.

pub mod riscv;

pub use riscv::csr::{make_satp, PrivilegeMode, Scause, Sstatus, SATP_SV39};

#[cfg(kernel_target)]
pub use riscv::{halt, RiscvHart};

/// Supervisor-mode view of one hart.
pub trait Hart: Sync {
    fn id(&self) -> usize;

    fn sstatus(&self) -> Sstatus;
    fn set_sstatus(&self, value: Sstatus);

    fn scause(&self) -> Scause;
    fn sepc(&self) -> u64;
    fn set_sepc(&self, value: u64);
    fn stval(&self) -> u64;

    fn set_stvec(&self, value: u64);
    fn satp(&self) -> u64;

    /// Current value of the `time` CSR.
    fn time(&self) -> u64;
    /// Program the next supervisor timer interrupt (`stimecmp`).
    fn set_timer(&self, deadline: u64);

    /// Jump to `userret` in the trampoline page with `satp` as its argument.
    /// On hardware this switches page table and privilege and never returns.
    fn enter_user(&self, userret_va: u64, satp: u64);

    fn intr_on(&self) {
        self.set_sstatus(self.sstatus() | Sstatus::SIE);
    }

    fn intr_off(&self) {
        self.set_sstatus(self.sstatus() - Sstatus::SIE);
    }

    fn intr_get(&self) -> bool {
        self.sstatus().interrupts_enabled()
    }
}

#[cfg(kernel_target)]
mod nesting {
    use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::riscv::{current_hart_id, hart};
    use super::Sstatus;
    use crate::config::NCPU;

    struct Nesting {
        depth: AtomicUsize,
        enabled_before: AtomicBool,
    }

    impl Nesting {
        const fn new() -> Self {
            Self {
                depth: AtomicUsize::new(0),
                enabled_before: AtomicBool::new(false),
            }
        }
    }

    static NESTING: [Nesting; NCPU] = {
        const EMPTY: Nesting = Nesting::new();
        [EMPTY; NCPU]
    };

    pub fn push_off() {
        let status = hart::read_sstatus();
        hart::write_sstatus(status - Sstatus::SIE);

        let Some(slot) = NESTING.get(current_hart_id()) else {
            return;
        };
        if slot.depth.fetch_add(1, Ordering::Relaxed) == 0 {
            slot.enabled_before
                .store(status.interrupts_enabled(), Ordering::Relaxed);
        }
    }

    pub fn pop_off() {
        let status = hart::read_sstatus();
        if status.interrupts_enabled() {
            crate::kpanic!("pop_off: interruptible");
        }

        let Some(slot) = NESTING.get(current_hart_id()) else {
            return;
        };
        let depth = slot.depth.load(Ordering::Relaxed);
        if depth == 0 {
            crate::kpanic!("pop_off: unbalanced");
        }
        slot.depth.store(depth - 1, Ordering::Relaxed);
        if depth == 1 && slot.enabled_before.load(Ordering::Relaxed) {
            hart::write_sstatus(status | Sstatus::SIE);
        }
    }
}

#[cfg(kernel_target)]
pub use nesting::{pop_off, push_off};

#[cfg(not(kernel_target))]
#[inline]
pub fn push_off() {}

#[cfg(not(kernel_target))]
#[inline]
pub fn pop_off() {}
