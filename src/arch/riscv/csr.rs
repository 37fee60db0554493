//! Supervisor CSR values
//!
//! Typed views of the CSR words the trap path inspects. Reading and writing
//! the registers themselves lives in the `arch::riscv` hart implementation;
//! these types are plain values so the decode logic runs on any host.

use bitflags::bitflags;

/// Sv39 mode field of `satp`.
pub const SATP_SV39: u64 = 8 << 60;

/// `satp` value selecting Sv39 translation rooted at `pagetable`.
pub const fn make_satp(pagetable: u64) -> u64 {
    SATP_SV39 | (pagetable >> 12)
}

/// Privilege level the hart was at when it took a trap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrivilegeMode {
    User,
    Supervisor,
}

bitflags! {
    /// Supervisor status register.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Sstatus: u64 {
        /// Supervisor interrupt enable.
        const SIE = 1 << 1;
        /// Interrupt enable to restore on `sret`.
        const SPIE = 1 << 5;
        /// Previous privilege: set for supervisor, clear for user.
        const SPP = 1 << 8;
        /// Permit supervisor access to user pages.
        const SUM = 1 << 18;

        const _ = !0;
    }
}

impl Sstatus {
    pub const fn previous_privilege(self) -> PrivilegeMode {
        if self.contains(Sstatus::SPP) {
            PrivilegeMode::Supervisor
        } else {
            PrivilegeMode::User
        }
    }

    pub fn with_previous_privilege(self, mode: PrivilegeMode) -> Self {
        match mode {
            PrivilegeMode::Supervisor => self | Sstatus::SPP,
            PrivilegeMode::User => self - Sstatus::SPP,
        }
    }

    pub const fn interrupts_enabled(self) -> bool {
        self.contains(Sstatus::SIE)
    }

    /// Status to load before `sret` into user mode: previous privilege user,
    /// interrupts enabled once there.
    pub fn prepare_user_return(self) -> Self {
        self.with_previous_privilege(PrivilegeMode::User) | Sstatus::SPIE
    }
}

/// Supervisor trap cause register.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Scause(pub u64);

impl Scause {
    const INTERRUPT: u64 = 1 << 63;

    /// Environment call from U-mode.
    pub const USER_ECALL: Scause = Scause(8);
    /// Supervisor timer interrupt.
    pub const SUPERVISOR_TIMER: Scause = Scause(Self::INTERRUPT | 5);
    /// Supervisor external interrupt, routed through the PLIC.
    pub const SUPERVISOR_EXTERNAL: Scause = Scause(Self::INTERRUPT | 9);

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub const fn is_interrupt(self) -> bool {
        self.0 & Self::INTERRUPT != 0
    }

    pub const fn code(self) -> u64 {
        self.0 & !Self::INTERRUPT
    }

    pub const fn is_user_ecall(self) -> bool {
        self.0 == Self::USER_ECALL.0
    }
}
