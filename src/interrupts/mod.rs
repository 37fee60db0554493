//! Interrupt classification and device dispatch
//!
//! Turns a trap cause into one of three outcomes and does the work for the
//! two it recognizes:
//! - supervisor external interrupt: claim the source from the interrupt
//!   controller, run the matching device handler, signal completion;
//! - supervisor timer interrupt: run the clock tick and ask the caller to
//!   yield;
//! - anything else: report it unhandled and let the caller decide.
//!
//! # Module Organization
//!
//! - `plic`: the QEMU `virt` platform-level interrupt controller

pub mod plic;

pub use plic::Plic;

use crate::arch::Scause;
use crate::config::{UART0_IRQ, VIRTIO0_IRQ};
use crate::scheduler;
use crate::state::{KernelState, Platform};

/// Claim/complete handshake of the platform interrupt controller.
pub trait InterruptController: Sync {
    /// Highest-priority pending source for `hart`'s S-mode context, if any.
    fn claim(&self, hart: usize) -> Option<u32>;
    /// Allow `irq` to interrupt again.
    fn complete(&self, hart: usize, irq: u32);
}

/// Interrupt entry points of the device drivers.
pub trait DeviceHandlers: Sync {
    /// UART receive/transmit.
    fn console_interrupt(&self);
    /// virtio block request completion.
    fn block_interrupt(&self);
}

/// What a trap cause turned out to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrapKind {
    External,
    Timer,
    Unrecognized,
}

impl TrapKind {
    pub const fn of(scause: Scause) -> Self {
        if scause.bits() == Scause::SUPERVISOR_EXTERNAL.bits() {
            TrapKind::External
        } else if scause.bits() == Scause::SUPERVISOR_TIMER.bits() {
            TrapKind::Timer
        } else {
            TrapKind::Unrecognized
        }
    }
}

/// Result of [`dev_intr`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DevIntr {
    /// Not a device or timer interrupt.
    NotRecognized,
    /// A device interrupt, handled.
    Device,
    /// The timer fired; the interrupted thread should yield.
    Timer,
}

/// Handle the interrupt described by `scause`, if it is one.
pub fn dev_intr(state: &KernelState, platform: &Platform<'_>, scause: Scause) -> DevIntr {
    match TrapKind::of(scause) {
        TrapKind::External => {
            external_interrupt(platform);
            DevIntr::Device
        }
        TrapKind::Timer => {
            scheduler::clock_interrupt(state, platform.hart, platform.lifecycle);
            DevIntr::Timer
        }
        TrapKind::Unrecognized => DevIntr::NotRecognized,
    }
}

fn external_interrupt(platform: &Platform<'_>) {
    let hart = platform.hart.id();
    let Some(irq) = platform.plic.claim(hart) else {
        return;
    };

    match irq {
        UART0_IRQ => platform.devices.console_interrupt(),
        VIRTIO0_IRQ => platform.devices.block_interrupt(),
        _ => crate::kwarn!("unexpected interrupt irq={}", irq),
    }

    // Each source can raise one interrupt at a time until completed.
    platform.plic.complete(hart, irq);
}
