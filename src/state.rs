//! Kernel-wide trap and tick state
//!
//! [`KernelState`] gathers everything the trap path shares between harts:
//! the tick counter, the tick mode, the per-hart interval slots, the
//! context-switch counter, the process table and the flag that stops every
//! hart after a fatal error. It is built once at boot
//! (it is `const`-constructible, so it can live in a `static`) and is never
//! torn down.
//!
//! [`Platform`] is the other half: the hardware and lifecycle services the
//! trap code calls out to. The bare-metal build installs a `'static` pair
//! through [`install`] and [`install_platform`] for the assembly entry
//! points; hosted callers pass both explicitly.

use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use spin::Once;

use crate::arch::Hart;
use crate::config::{TickConfig, NCPU, TRAMPOLINE};
use crate::interrupts::{DeviceHandlers, InterruptController};
use crate::process::{Lifecycle, ProcTable, UserMemory};
use crate::scheduler::{PerCpu, TickClock, TickMode};

pub struct KernelState {
    config: TickConfig,
    clock: TickClock,
    dynamic_ticks: AtomicBool,
    cpus: [PerCpu; NCPU],
    context_switches: AtomicU64,
    procs: ProcTable,
    halted: AtomicBool,
}

impl KernelState {
    pub const fn new(config: TickConfig, mode: TickMode) -> Self {
        const IDLE: PerCpu = PerCpu::new();
        Self {
            config,
            clock: TickClock::new(),
            dynamic_ticks: AtomicBool::new(matches!(mode, TickMode::Dynamic)),
            cpus: [IDLE; NCPU],
            context_switches: AtomicU64::new(0),
            procs: ProcTable::new(),
            halted: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &TickConfig {
        &self.config
    }

    pub fn clock(&self) -> &TickClock {
        &self.clock
    }

    pub fn procs(&self) -> &ProcTable {
        &self.procs
    }

    pub fn tick_mode(&self) -> TickMode {
        if self.dynamic_ticks.load(Ordering::Relaxed) {
            TickMode::Dynamic
        } else {
            TickMode::Fixed
        }
    }

    /// Takes effect at the next timer interrupt on each hart.
    pub fn set_tick_mode(&self, mode: TickMode) {
        self.dynamic_ticks
            .store(matches!(mode, TickMode::Dynamic), Ordering::Relaxed);
    }

    pub fn cpu(&self, hart: usize) -> Option<&PerCpu> {
        self.cpus.get(hart)
    }

    /// Called by the scheduler loop on every switch to a process.
    pub fn note_context_switch(&self) {
        self.context_switches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn context_switches(&self) -> u64 {
        self.context_switches.load(Ordering::Relaxed)
    }

    /// Mark the kernel as stopped. Every hart parks at its next trap or tick.
    pub fn halt_all(&self) {
        self.halted.store(true, Ordering::Release);
    }

    pub fn halted(&self) -> bool {
        self.halted.load(Ordering::Acquire)
    }

    /// Park this hart if the kernel has been stopped.
    ///
    /// Never returns once stopped on the bare-metal build; hosted builds
    /// return `true` and the caller leaves its handler untouched.
    pub fn park_if_halted(&self) -> bool {
        #[cfg(kernel_target)]
        if self.halted() {
            crate::arch::halt();
        }
        self.halted()
    }
}

/// Link-time addresses of the trap vectors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrapVectors {
    /// Supervisor-mode vector (`kernelvec`).
    pub kernelvec: u64,
    /// Start of the trampoline page in the kernel image.
    pub trampoline: u64,
    pub uservec: u64,
    pub userret: u64,
    /// Handler `uservec` jumps to, stored in each trapframe.
    pub user_trap: u64,
}

impl TrapVectors {
    /// `uservec` as seen through the TRAMPOLINE mapping.
    pub const fn uservec_va(&self) -> u64 {
        TRAMPOLINE.wrapping_add(self.uservec.wrapping_sub(self.trampoline))
    }

    /// `userret` as seen through the TRAMPOLINE mapping.
    pub const fn userret_va(&self) -> u64 {
        TRAMPOLINE.wrapping_add(self.userret.wrapping_sub(self.trampoline))
    }
}

/// Services the trap path depends on.
#[derive(Clone, Copy)]
pub struct Platform<'a> {
    pub hart: &'a dyn Hart,
    pub plic: &'a dyn InterruptController,
    pub devices: &'a dyn DeviceHandlers,
    pub lifecycle: &'a dyn Lifecycle,
    pub memory: &'a dyn UserMemory,
    pub vectors: TrapVectors,
}

static KERNEL: Once<&'static KernelState> = Once::new();
static PLATFORM: Once<Platform<'static>> = Once::new();

/// Publish the boot-time state. The first call wins; later calls return the
/// state that is already installed.
pub fn install(state: &'static KernelState) -> &'static KernelState {
    let installed = *KERNEL.call_once(|| state);
    if !core::ptr::eq(installed, state) {
        crate::kwarn!("state::install: kernel state already installed, ignoring");
    }
    installed
}

pub fn kernel() -> Option<&'static KernelState> {
    KERNEL.get().copied()
}

/// Publish the platform services used by the assembly trap entry points.
pub fn install_platform(platform: Platform<'static>) -> &'static Platform<'static> {
    PLATFORM.call_once(|| platform)
}

pub fn platform() -> Option<&'static Platform<'static>> {
    PLATFORM.get()
}
