//! Trap entry and exit
//!
//! Every trap lands in one of two vectors:
//! - `uservec` (trampoline page) while the hart runs user code. It saves the
//!   user registers into the process trapframe, switches to the kernel page
//!   table and calls [`user_trap`].
//! - `kernelvec` while the hart runs kernel code. It saves caller-saved
//!   registers on the current kernel stack and calls [`kernel_trap`].
//!
//! [`user_trap_return`] is the only way back to user mode: it re-points
//! `stvec` at the trampoline, refreshes the trapframe's kernel fields and
//! jumps to `userret`, which switches page table and privilege together.
//!
//! A bad trap cause from user code costs that process its life; the same
//! from kernel code stops the machine.

use crate::arch::{make_satp, PrivilegeMode};
use crate::config::{ECALL_WIDTH, PGSIZE};
use crate::interrupts::{self, DevIntr};
use crate::state::{self, KernelState, Platform};
use crate::{kerror, kinfo, kpanic, kwarn, syscalls};

/// Publish the kernel state for the trap entry points and report the tick
/// configuration. Called once, on the boot hart.
pub fn init(kernel: &'static KernelState) -> &'static KernelState {
    let kernel = state::install(kernel);

    #[cfg(kernel_target)]
    crate::logger::set_clock(entry::uptime_us);

    let config = kernel.config();
    kinfo!(
        "trap: {} ticks, interval {} cycles (min {}, max {})",
        kernel.tick_mode().as_str(),
        config.default_interval,
        config.min_interval,
        config.max_interval
    );
    kernel
}

/// Per-hart setup: take kernel traps through `kernelvec` and arm the first
/// timer deadline at the default interval.
pub fn init_hart(kernel: &KernelState, platform: &Platform<'_>) {
    let hart = platform.hart;
    hart.set_stvec(platform.vectors.kernelvec);

    let hart_id = hart.id();
    let Some(cpu) = kernel.cpu(hart_id) else {
        kpanic!("init_hart: hart {} has no per-cpu slot", hart_id);
    };
    let interval = kernel.config().default_interval;
    cpu.record_interval(interval);
    hart.set_timer(hart.time().wrapping_add(interval));
}

/// Interrupt, exception or system call from user mode.
///
/// Returns only when the process did not go back to user mode: on hardware
/// that never happens, since both [`user_trap_return`] and `exit` leave for
/// good.
pub fn user_trap(kernel: &KernelState, platform: &Platform<'_>) {
    if kernel.park_if_halted() {
        return;
    }
    let hart = platform.hart;
    let lifecycle = platform.lifecycle;

    if hart.sstatus().previous_privilege() != PrivilegeMode::User {
        kpanic!("user_trap: not from user mode");
    }

    // From here on traps are kernel traps.
    hart.set_stvec(platform.vectors.kernelvec);

    let Some(slot) = lifecycle.current() else {
        kpanic!("user_trap: no process on hart {}", hart.id());
    };
    let procs = kernel.procs();
    let pid = match procs.lock(slot) {
        Some(mut proc) => {
            proc.trapframe.epc = hart.sepc();
            proc.pid
        }
        None => kpanic!("user_trap: bad process slot {}", slot),
    };

    let scause = hart.scause();
    let mut which = DevIntr::NotRecognized;

    if scause.is_user_ecall() {
        if procs.is_killed(slot) {
            lifecycle.exit(-1);
            return;
        }

        // Resume after the ecall, not on it.
        if let Some(mut proc) = procs.lock(slot) {
            proc.trapframe.epc += ECALL_WIDTH;
        }

        // sepc, scause and sstatus are consumed; interrupts may clobber them now.
        hart.intr_on();

        syscalls::dispatch(kernel, platform, slot);
    } else {
        which = interrupts::dev_intr(kernel, platform, scause);
        if which == DevIntr::NotRecognized {
            kwarn!("user_trap: unexpected scause {:#x} pid={}", scause.bits(), pid);
            kwarn!("           sepc={:#x} stval={:#x}", hart.sepc(), hart.stval());
            procs.set_killed(slot);
        }
    }

    if procs.is_killed(slot) {
        lifecycle.exit(-1);
        return;
    }

    if which == DevIntr::Timer {
        lifecycle.yield_cpu();
    }

    user_trap_return(kernel, platform);
}

/// Return to user mode in the current process.
pub fn user_trap_return(kernel: &KernelState, platform: &Platform<'_>) {
    let hart = platform.hart;
    let vectors = &platform.vectors;

    let Some(slot) = platform.lifecycle.current() else {
        kpanic!("user_trap_return: no process on hart {}", hart.id());
    };

    // stvec is about to point at uservec, which is wrong for kernel traps;
    // stay uninterruptible until sret.
    hart.intr_off();

    hart.set_stvec(vectors.uservec_va());

    let (epc, satp) = match kernel.procs().lock(slot) {
        Some(mut proc) => {
            let kstack = proc.kstack;
            let pagetable = proc.pagetable;
            let tf = &mut proc.trapframe;
            tf.kernel_satp = hart.satp();
            tf.kernel_sp = kstack + PGSIZE;
            tf.kernel_trap = vectors.user_trap;
            tf.kernel_hartid = hart.id() as u64;
            (tf.epc, make_satp(pagetable))
        }
        None => kpanic!("user_trap_return: bad process slot {}", slot),
    };

    hart.set_sstatus(hart.sstatus().prepare_user_return());
    hart.set_sepc(epc);

    hart.enter_user(vectors.userret_va(), satp);
}

/// Interrupt or exception taken while in supervisor mode, on whatever
/// kernel stack was current.
pub fn kernel_trap(kernel: &KernelState, platform: &Platform<'_>) {
    if kernel.park_if_halted() {
        return;
    }
    let hart = platform.hart;
    let sepc = hart.sepc();
    let sstatus = hart.sstatus();
    let scause = hart.scause();

    if sstatus.previous_privilege() != PrivilegeMode::Supervisor {
        kpanic!("kernel_trap: not from supervisor mode");
    }
    if hart.intr_get() {
        kpanic!("kernel_trap: interrupts enabled");
    }

    let which = interrupts::dev_intr(kernel, platform, scause);
    if which == DevIntr::NotRecognized {
        kerror!(
            "scause={:#x} sepc={:#x} stval={:#x}",
            scause.bits(),
            hart.sepc(),
            hart.stval()
        );
        kpanic!("kernel_trap");
    }

    if which == DevIntr::Timer && platform.lifecycle.current().is_some() {
        platform.lifecycle.yield_cpu();
    }

    // yield_cpu may have taken traps of its own; kernelvec's sret needs ours.
    hart.set_sepc(sepc);
    hart.set_sstatus(sstatus);
}

#[cfg(kernel_target)]
pub use entry::{boot_vectors, usertrapret};

/// Symbols called from assembly and from the scheduler's first return to
/// user space.
#[cfg(kernel_target)]
mod entry {
    use super::{kernel_trap, user_trap, user_trap_return};
    use crate::arch::{Hart, RiscvHart};
    use crate::config::TIME_BASE_HZ;
    use crate::kpanic;
    use crate::state::{self, KernelState, Platform, TrapVectors};

    fn installed() -> (&'static KernelState, &'static Platform<'static>) {
        match (state::kernel(), state::platform()) {
            (Some(kernel), Some(platform)) => (kernel, platform),
            _ => kpanic!("trap taken before trap::init"),
        }
    }

    pub(super) fn uptime_us() -> u64 {
        RiscvHart.time() / (TIME_BASE_HZ / 1_000_000)
    }

    /// Vector addresses for [`state::install_platform`].
    pub fn boot_vectors() -> TrapVectors {
        TrapVectors::linked(usertrap)
    }

    /// Jumped to by `uservec` through `trapframe.kernel_trap`.
    #[no_mangle]
    pub extern "C" fn usertrap() {
        let (kernel, platform) = installed();
        user_trap(kernel, platform);
    }

    /// Called by `kernelvec`.
    #[no_mangle]
    pub extern "C" fn kerneltrap() {
        let (kernel, platform) = installed();
        kernel_trap(kernel, platform);
    }

    /// First return to user space of a freshly created process.
    #[no_mangle]
    pub extern "C" fn usertrapret() {
        let (kernel, platform) = installed();
        user_trap_return(kernel, platform);
    }
}
