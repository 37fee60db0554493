//! Shared type definitions for syscalls

use core::fmt;
use core::mem::size_of;

/// Value placed in a0 for a failed call (-1 as seen by user code).
pub const SYSCALL_FAILURE: u64 = u64::MAX;

pub type SyscallResult = Result<u64, SyscallError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyscallError {
    /// User pointer outside the caller's writable address space.
    BadAddress,
    /// The caller was flagged for termination while blocked.
    Killed,
    NoSuchProcess,
    NoChild,
    /// fork found no free process slot or memory.
    NoProcessSlots,
    OutOfMemory,
    UnknownSyscall,
}

impl fmt::Display for SyscallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SyscallError::BadAddress => "bad user address",
            SyscallError::Killed => "killed",
            SyscallError::NoSuchProcess => "no such process",
            SyscallError::NoChild => "no child processes",
            SyscallError::NoProcessSlots => "process table full",
            SyscallError::OutOfMemory => "out of memory",
            SyscallError::UnknownSyscall => "unknown system call",
        };
        f.write_str(text)
    }
}

/// Encode a result for a0.
pub const fn to_user(result: SyscallResult) -> u64 {
    match result {
        Ok(value) => value,
        Err(_) => SYSCALL_FAILURE,
    }
}

/// Snapshot returned by `get_perf_metrics`, three little-endian u64s in
/// this order.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PerfMetrics {
    pub total_ticks: u64,
    pub context_switches: u64,
    pub current_tick_interval: u64,
}

impl PerfMetrics {
    pub const SIZE: usize = size_of::<PerfMetrics>();

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        let fields = [
            self.total_ticks,
            self.context_switches,
            self.current_tick_interval,
        ];
        for (chunk, field) in bytes.chunks_exact_mut(8).zip(fields) {
            chunk.copy_from_slice(&field.to_le_bytes());
        }
        bytes
    }

    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Self {
        let mut fields = [0u64; 3];
        for (field, chunk) in fields.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            *field = u64::from_le_bytes(word);
        }
        Self {
            total_ticks: fields[0],
            context_switches: fields[1],
            current_tick_interval: fields[2],
        }
    }
}

const _: () = assert!(PerfMetrics::SIZE == 24);
