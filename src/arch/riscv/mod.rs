//! RISC-V (RV64, S-mode) support
//!
//! `csr` holds the value types and builds everywhere. Everything that
//! executes CSR instructions, and the symbols exported by `trampoline.S` and
//! `kernelvec.S`, exists only on the bare-metal target.

pub mod csr;

#[cfg(kernel_target)]
pub use hart::{current_hart_id, halt, RiscvHart};

#[cfg(kernel_target)]
pub(crate) mod hart {
    use core::arch::asm;

    use super::csr::{Scause, Sstatus};
    use crate::arch::Hart;
    use crate::state::TrapVectors;

    macro_rules! csr_read {
        ($csr:literal) => {{
            let value: u64;
            unsafe {
                asm!(concat!("csrr {0}, ", $csr), out(reg) value, options(nomem, nostack));
            }
            value
        }};
    }

    macro_rules! csr_write {
        ($csr:literal, $value:expr) => {{
            let value: u64 = $value;
            unsafe {
                asm!(concat!("csrw ", $csr, ", {0}"), in(reg) value, options(nostack));
            }
        }};
    }

    extern "C" {
        fn kernelvec();
        fn trampoline();
        fn uservec();
        fn userret();
    }

    /// The hart id is kept in `tp` from boot onwards.
    #[inline]
    pub fn current_hart_id() -> usize {
        let id: usize;
        unsafe {
            asm!("mv {0}, tp", out(reg) id, options(nomem, nostack));
        }
        id
    }

    pub(crate) fn read_sstatus() -> Sstatus {
        Sstatus::from_bits_retain(csr_read!("sstatus"))
    }

    pub(crate) fn write_sstatus(value: Sstatus) {
        csr_write!("sstatus", value.bits());
    }

    /// Park this hart with interrupts off.
    pub fn halt() -> ! {
        write_sstatus(read_sstatus() - Sstatus::SIE);
        loop {
            unsafe {
                asm!("wfi", options(nomem, nostack));
            }
        }
    }

    /// The hart executing the caller.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct RiscvHart;

    impl Hart for RiscvHart {
        fn id(&self) -> usize {
            current_hart_id()
        }

        fn sstatus(&self) -> Sstatus {
            read_sstatus()
        }

        fn set_sstatus(&self, value: Sstatus) {
            write_sstatus(value);
        }

        fn scause(&self) -> Scause {
            Scause(csr_read!("scause"))
        }

        fn sepc(&self) -> u64 {
            csr_read!("sepc")
        }

        fn set_sepc(&self, value: u64) {
            csr_write!("sepc", value);
        }

        fn stval(&self) -> u64 {
            csr_read!("stval")
        }

        fn set_stvec(&self, value: u64) {
            csr_write!("stvec", value);
        }

        fn satp(&self) -> u64 {
            csr_read!("satp")
        }

        fn time(&self) -> u64 {
            csr_read!("time")
        }

        fn set_timer(&self, deadline: u64) {
            // stimecmp (Sstc)
            csr_write!("0x14d", deadline);
        }

        fn enter_user(&self, userret_va: u64, satp: u64) {
            // userret(satp) lives in the trampoline page, which is mapped at
            // the same address in both page tables.
            unsafe {
                asm!(
                    "jr {entry}",
                    entry = in(reg) userret_va,
                    in("a0") satp,
                    options(noreturn)
                );
            }
        }
    }

    impl TrapVectors {
        /// Addresses of the assembled trap vectors in this image.
        pub fn linked(user_trap: extern "C" fn()) -> Self {
            TrapVectors {
                kernelvec: kernelvec as usize as u64,
                trampoline: trampoline as usize as u64,
                uservec: uservec as usize as u64,
                userret: userret as usize as u64,
                user_trap: user_trap as usize as u64,
            }
        }
    }
}
