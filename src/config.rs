//! Kernel parameters
//!
//! Compile-time layout constants for the QEMU `virt` board and the tunables of
//! the adaptive tick. Everything here is fixed at build time; the only
//! runtime switch is the tick mode flipped by `set_tick_mode`.

use core::fmt;

use crate::logger::LogLevel;
use crate::scheduler::TickMode;

/// Capacity of the process table.
pub const NPROC: usize = 64;
/// Maximum number of harts the kernel brings up.
pub const NCPU: usize = 8;

/// Page size in bytes.
pub const PGSIZE: u64 = 4096;
/// One beyond the highest Sv39 virtual address the kernel uses.
pub const MAXVA: u64 = 1 << (9 + 9 + 9 + 12 - 1);
/// Trampoline page, mapped at the same VA in every address space.
pub const TRAMPOLINE: u64 = MAXVA - PGSIZE;
/// Per-process trapframe page, just below the trampoline.
pub const TRAPFRAME: u64 = TRAMPOLINE - PGSIZE;

/// Width of the `ecall` instruction.
pub const ECALL_WIDTH: u64 = 4;

/// 16550 UART MMIO base.
pub const UART0: usize = 0x1000_0000;
/// UART interrupt source number at the PLIC.
pub const UART0_IRQ: u32 = 10;
/// virtio-mmio block device interrupt source number.
pub const VIRTIO0_IRQ: u32 = 1;
/// Platform-level interrupt controller MMIO base.
pub const PLIC: usize = 0x0c00_0000;

/// Frequency of the `time` CSR on QEMU virt.
pub const TIME_BASE_HZ: u64 = 10_000_000;

/// Ratio scale: 10000 basis points is 100%.
pub const BASIS_POINTS: u64 = 10_000;
/// Usage ratios are recomputed on ticks that are multiples of this.
pub const STATS_SMOOTHING_PERIOD: u64 = 10;

/// Tick mode the kernel boots with.
pub const BOOT_TICK_MODE: TickMode = if cfg!(feature = "dynamic_ticks") {
    TickMode::Dynamic
} else {
    TickMode::Fixed
};

/// Log level the kernel boots with.
pub const BOOT_LOG_LEVEL: LogLevel = if cfg!(feature = "debug_verbose") {
    LogLevel::DEBUG
} else {
    LogLevel::INFO
};

/// Tunables of the adaptive tick. Intervals are in `time` CSR cycles,
/// thresholds in basis points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickConfig {
    /// Interval used in fixed mode and as the pivot of the dynamic formulas.
    pub default_interval: u64,
    /// Shortest interval the dynamic mode may choose.
    pub min_interval: u64,
    /// Longest interval the dynamic mode may choose.
    pub max_interval: u64,
    /// A process is CPU-heavy when its `cpu_usage` is above this.
    pub cpu_threshold: u64,
    /// A process is IO-heavy when its `io_intensity` is above this.
    pub io_threshold: u64,
}

impl TickConfig {
    /// About a tenth of a second per tick at the default interval.
    pub const DEFAULT: TickConfig = TickConfig {
        default_interval: 1_000_000,
        min_interval: 250_000,
        max_interval: 2_000_000,
        cpu_threshold: 7_000,
        io_threshold: 5_000,
    };

    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.min_interval == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.min_interval > self.default_interval || self.default_interval > self.max_interval {
            return Err(ConfigError::IntervalOrder);
        }
        if self.cpu_threshold > BASIS_POINTS || self.io_threshold > BASIS_POINTS {
            return Err(ConfigError::ThresholdRange);
        }
        Ok(())
    }
}

impl Default for TickConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Tick configuration compiled into the kernel image.
pub const BOOT_TICK_CONFIG: TickConfig = TickConfig::DEFAULT;

const _: () = assert!(BOOT_TICK_CONFIG.validate().is_ok());

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    ZeroInterval,
    IntervalOrder,
    ThresholdRange,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroInterval => write!(f, "minimum tick interval must be non-zero"),
            ConfigError::IntervalOrder => {
                write!(f, "tick intervals must satisfy min <= default <= max")
            }
            ConfigError::ThresholdRange => {
                write!(f, "usage thresholds must not exceed {} basis points", BASIS_POINTS)
            }
        }
    }
}
