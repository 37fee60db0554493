//! Platform-level interrupt controller (QEMU `virt`)
//!
//! Each hart has a supervisor-mode context with its own enable bitmap,
//! priority threshold and claim/complete register. Sources are enabled for
//! every hart; whichever hart claims first services the interrupt.

use core::ptr;

use super::InterruptController;
use crate::config::{UART0_IRQ, VIRTIO0_IRQ};

const PRIORITY_BASE: usize = 0x0;
const SENABLE_BASE: usize = 0x2080;
const SENABLE_STRIDE: usize = 0x100;
const SPRIORITY_BASE: usize = 0x20_1000;
const SCLAIM_BASE: usize = 0x20_1004;
const SCONTEXT_STRIDE: usize = 0x2000;

/// Sources this kernel services.
const SOURCES: [u32; 2] = [UART0_IRQ, VIRTIO0_IRQ];

pub struct Plic {
    base: usize,
}

impl Plic {
    /// # Safety
    /// `base` must point at a PLIC register block (or a buffer standing in
    /// for one) that stays mapped for the lifetime of the value, large
    /// enough for the context registers of every hart that will use it.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    pub const fn base(&self) -> usize {
        self.base
    }

    /// Give every serviced source a non-zero priority; priority 0 disables a
    /// source.
    pub fn init(&self) {
        for irq in SOURCES {
            self.write(Self::priority(irq), 1);
        }
    }

    /// Enable the serviced sources for `hart`'s S-mode context and accept
    /// every priority.
    pub fn init_hart(&self, hart: usize) {
        let mask = SOURCES.iter().fold(0u32, |mask, irq| mask | (1 << irq));
        self.write(Self::senable(hart), mask);
        self.write(Self::spriority(hart), 0);
    }

    pub const fn priority(irq: u32) -> usize {
        PRIORITY_BASE + irq as usize * 4
    }

    pub const fn senable(hart: usize) -> usize {
        SENABLE_BASE + hart * SENABLE_STRIDE
    }

    pub const fn spriority(hart: usize) -> usize {
        SPRIORITY_BASE + hart * SCONTEXT_STRIDE
    }

    pub const fn sclaim(hart: usize) -> usize {
        SCLAIM_BASE + hart * SCONTEXT_STRIDE
    }

    fn read(&self, offset: usize) -> u32 {
        // SAFETY: `new` requires `base` to cover the register block.
        unsafe { ptr::read_volatile((self.base + offset) as *const u32) }
    }

    fn write(&self, offset: usize, value: u32) {
        // SAFETY: as for `read`.
        unsafe { ptr::write_volatile((self.base + offset) as *mut u32, value) }
    }
}

impl InterruptController for Plic {
    fn claim(&self, hart: usize) -> Option<u32> {
        match self.read(Self::sclaim(hart)) {
            0 => None,
            irq => Some(irq),
        }
    }

    fn complete(&self, hart: usize, irq: u32) {
        self.write(Self::sclaim(hart), irq);
    }
}

