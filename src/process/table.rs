//! Fixed-capacity process table
//!
//! Each slot pairs the process record, behind its own lock, with a lock-free
//! termination flag. The flag can be read from paths that already hold the
//! tick lock (the timed wait) without nesting a process lock under it.

use core::sync::atomic::{AtomicBool, Ordering};

use super::types::{Pid, Proc, ProcState, ProcStats};
use crate::config::NPROC;
use crate::sync::{IrqMutex, IrqMutexGuard};

pub struct ProcSlot {
    proc: IrqMutex<Proc>,
    killed: AtomicBool,
}

impl ProcSlot {
    const fn new() -> Self {
        Self {
            proc: IrqMutex::new(Proc::unused()),
            killed: AtomicBool::new(false),
        }
    }

    pub fn lock(&self) -> IrqMutexGuard<'_, Proc> {
        self.proc.lock()
    }

    pub fn is_killed(&self) -> bool {
        self.killed.load(Ordering::Acquire)
    }
}

pub struct ProcTable {
    slots: [ProcSlot; NPROC],
}

impl ProcTable {
    pub const fn new() -> Self {
        const EMPTY: ProcSlot = ProcSlot::new();
        Self {
            slots: [EMPTY; NPROC],
        }
    }

    pub const fn capacity(&self) -> usize {
        NPROC
    }

    pub fn slot(&self, index: usize) -> Option<&ProcSlot> {
        self.slots.get(index)
    }

    pub fn slots(&self) -> impl Iterator<Item = &ProcSlot> {
        self.slots.iter()
    }

    pub fn lock(&self, index: usize) -> Option<IrqMutexGuard<'_, Proc>> {
        self.slot(index).map(ProcSlot::lock)
    }

    /// Claim a free slot for `pid`, state `Used`, accounting from `now`.
    pub fn allocate(&self, pid: Pid, now: u64) -> Option<usize> {
        for (index, slot) in self.slots.iter().enumerate() {
            let mut proc = slot.lock();
            if proc.state != ProcState::Unused {
                continue;
            }
            proc.clear();
            proc.pid = pid;
            proc.state = ProcState::Used;
            proc.stats = ProcStats::starting_at(now);
            slot.killed.store(false, Ordering::Release);
            return Some(index);
        }
        None
    }

    /// Return a slot to the free pool.
    pub fn release(&self, index: usize) {
        if let Some(slot) = self.slot(index) {
            slot.lock().clear();
            slot.killed.store(false, Ordering::Release);
        }
    }

    pub fn find(&self, pid: Pid) -> Option<usize> {
        self.slots.iter().position(|slot| {
            let proc = slot.lock();
            proc.state != ProcState::Unused && proc.pid == pid
        })
    }

    pub fn is_killed(&self, index: usize) -> bool {
        self.slot(index).is_some_and(ProcSlot::is_killed)
    }

    pub fn set_killed(&self, index: usize) {
        if let Some(slot) = self.slot(index) {
            slot.killed.store(true, Ordering::Release);
        }
    }

    /// Flag `pid` for termination. A sleeping target is made runnable so it
    /// notices the flag; one blocked in a timed wait notices on the next tick.
    pub fn kill(&self, pid: Pid) -> bool {
        for slot in self.slots.iter() {
            let mut proc = slot.lock();
            if proc.state == ProcState::Unused || proc.pid != pid {
                continue;
            }
            slot.killed.store(true, Ordering::Release);
            if proc.state == ProcState::Sleeping {
                proc.state = ProcState::Runnable;
            }
            return true;
        }
        false
    }
}

impl Default for ProcTable {
    fn default() -> Self {
        Self::new()
    }
}
