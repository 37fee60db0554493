//! tickos kernel core
//!
//! Trap entry/exit, interrupt classification and the workload-adaptive clock
//! tick for a multi-hart RISC-V (Sv39, S-mode) kernel.
//!
//! The crate builds in two shapes:
//! - on `riscv64*-none-elf` (`cfg(kernel_target)`, set by `build.rs`) it links
//!   the trap vectors and talks to real CSRs, the PLIC and the UART;
//! - on a hosted target it contains the same trap logic with every hardware
//!   and process-lifecycle seam behind a trait, so the `tests/` crate can drive
//!   it with mocks.

#![no_std]

pub mod arch;
pub mod config;
pub mod interrupts;
pub mod logger;
pub mod process;
pub mod scheduler;
pub mod serial;
pub mod state;
pub mod sync;
pub mod syscalls;
pub mod trap;

pub use state::{KernelState, Platform};

#[macro_export]
macro_rules! klog {
    ($level:expr, $($arg:tt)*) => {{
        $crate::logger::log($level, format_args!($($arg)*));
    }};
}

/// Log a banner and stop the machine. Never returns.
///
/// Hosted builds turn this into a Rust panic so fatal paths are testable.
#[macro_export]
macro_rules! kpanic {
    ($($arg:tt)*) => {{
        $crate::logger::fatal(format_args!($($arg)*))
    }};
}

#[macro_export]
macro_rules! kfatal {
    ($($arg:tt)*) => {{
        $crate::klog!($crate::logger::LogLevel::FATAL, $($arg)*);
    }};
}

#[macro_export]
macro_rules! kerror {
    ($($arg:tt)*) => {{
        $crate::klog!($crate::logger::LogLevel::ERROR, $($arg)*);
    }};
}

#[macro_export]
macro_rules! kwarn {
    ($($arg:tt)*) => {{
        $crate::klog!($crate::logger::LogLevel::WARN, $($arg)*);
    }};
}

#[macro_export]
macro_rules! kinfo {
    ($($arg:tt)*) => {{
        $crate::klog!($crate::logger::LogLevel::INFO, $($arg)*);
    }};
}

#[macro_export]
macro_rules! kdebug {
    ($($arg:tt)*) => {{
        $crate::klog!($crate::logger::LogLevel::DEBUG, $($arg)*);
    }};
}

#[macro_export]
macro_rules! ktrace {
    ($($arg:tt)*) => {{
        $crate::klog!($crate::logger::LogLevel::TRACE, $($arg)*);
    }};
}
