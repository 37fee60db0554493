//! System call tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use serial_test::serial;

use tickos::config::{TickConfig, PGSIZE};
use tickos::process::ProcState;
use tickos::scheduler::{clock_interrupt, TickMode};
use tickos::serial as console;
use tickos::syscalls::{
    dispatch, perf_metrics, syscall, to_user, PerfMetrics, SyscallContext, SyscallError,
    SYSCALL_FAILURE, SYS_EXIT, SYS_FORK, SYS_GETPID, SYS_GET_PERF_METRICS, SYS_KILL, SYS_SBRK,
    SYS_SET_TICK_MODE, SYS_SLEEP, SYS_UPTIME, SYS_WAIT,
};
use tickos::{KernelState, Platform};

use crate::mock::{kernel_state, spawn, Machine, TEST_PAGETABLE};

const USER_BUF: u64 = 0x4000;

fn call(kernel: &KernelState, platform: &Platform<'_>, slot: usize, number: u64, arg0: u64) -> u64 {
    let ctx = SyscallContext {
        state: kernel,
        platform,
        slot,
    };
    to_user(syscall(&ctx, number, [arg0, 0, 0, 0, 0, 0]))
}

/// Tick on `machine` every millisecond until `done` is set.
fn run_ticker(kernel: &KernelState, machine: &Machine, done: &AtomicBool) {
    while !done.load(Ordering::SeqCst) {
        clock_interrupt(kernel, &machine.hart, &machine.lifecycle);
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn perf_metrics_are_copied_out() {
    let kernel = kernel_state(TickMode::Fixed);
    let machine = Machine::new(1);
    let slot = spawn(&kernel, 1, ProcState::Running);
    machine.memory.map(USER_BUF, true);

    for _ in 0..3 {
        clock_interrupt(&kernel, &machine.hart, &machine.lifecycle);
    }
    kernel.note_context_switch();
    kernel.note_context_switch();

    let ret = call(&kernel, &machine.platform(), slot, SYS_GET_PERF_METRICS, USER_BUF);
    assert_eq!(ret, 0);

    let bytes: [u8; PerfMetrics::SIZE] = machine
        .memory
        .read(USER_BUF, PerfMetrics::SIZE)
        .unwrap()
        .try_into()
        .unwrap();
    assert_eq!(
        PerfMetrics::from_bytes(&bytes),
        PerfMetrics {
            total_ticks: 3,
            context_switches: 2,
            current_tick_interval: TickConfig::DEFAULT.default_interval,
        }
    );
    // Little-endian words in declaration order.
    assert_eq!(bytes[0], 3);
    assert_eq!(bytes[8], 2);
    assert_eq!(machine.memory.pagetables(), vec![TEST_PAGETABLE]);
}

#[test]
fn perf_metrics_report_this_harts_interval() {
    let kernel = kernel_state(TickMode::Dynamic);
    let busy = Machine::new(0);
    let idle = Machine::new(1);
    let slot = spawn(&kernel, 1, ProcState::Running);

    clock_interrupt(&kernel, &busy.hart, &busy.lifecycle);

    let platform = idle.platform();
    let ctx = SyscallContext {
        state: &kernel,
        platform: &platform,
        slot,
    };
    // Hart 1 has not armed a deadline yet.
    assert_eq!(perf_metrics(&ctx).current_tick_interval, 0);
    assert_eq!(perf_metrics(&ctx).total_ticks, 1);
}

#[test]
fn perf_metrics_to_unmapped_address_fails() {
    let kernel = kernel_state(TickMode::Fixed);
    let machine = Machine::new(0);
    let slot = spawn(&kernel, 1, ProcState::Running);

    let ret = call(&kernel, &machine.platform(), slot, SYS_GET_PERF_METRICS, 0xdead_0000);
    assert_eq!(ret, SYSCALL_FAILURE);
}

#[test]
fn perf_metrics_to_read_only_page_writes_nothing() {
    let kernel = kernel_state(TickMode::Fixed);
    let machine = Machine::new(0);
    let slot = spawn(&kernel, 1, ProcState::Running);
    machine.memory.map(USER_BUF, false);
    machine.memory.fill(USER_BUF, PerfMetrics::SIZE, 0xaa);
    clock_interrupt(&kernel, &machine.hart, &machine.lifecycle);

    let ret = call(&kernel, &machine.platform(), slot, SYS_GET_PERF_METRICS, USER_BUF);

    assert_eq!(ret, SYSCALL_FAILURE);
    assert_eq!(
        machine.memory.read(USER_BUF, PerfMetrics::SIZE),
        Some(vec![0xaa; PerfMetrics::SIZE])
    );
}

#[test]
fn perf_metrics_straddling_into_unmapped_page_writes_nothing() {
    let kernel = kernel_state(TickMode::Fixed);
    let machine = Machine::new(0);
    let slot = spawn(&kernel, 1, ProcState::Running);
    machine.memory.map(USER_BUF, true);
    let dest = USER_BUF + PGSIZE - 8;
    machine.memory.fill(dest, 8, 0x55);

    let ret = call(&kernel, &machine.platform(), slot, SYS_GET_PERF_METRICS, dest);

    assert_eq!(ret, SYSCALL_FAILURE);
    assert_eq!(machine.memory.read(dest, 8), Some(vec![0x55; 8]));
}

#[test]
fn set_tick_mode_selects_mode() {
    let kernel = kernel_state(TickMode::Dynamic);
    let machine = Machine::new(0);
    let slot = spawn(&kernel, 1, ProcState::Running);
    let platform = machine.platform();

    assert_eq!(call(&kernel, &platform, slot, SYS_SET_TICK_MODE, 0), 0);
    assert_eq!(kernel.tick_mode(), TickMode::Fixed);

    assert_eq!(call(&kernel, &platform, slot, SYS_SET_TICK_MODE, 1), 0);
    assert_eq!(kernel.tick_mode(), TickMode::Dynamic);

    assert_eq!(call(&kernel, &platform, slot, SYS_SET_TICK_MODE, 0), 0);
    // Any non-zero value, negative included, selects dynamic.
    assert_eq!(call(&kernel, &platform, slot, SYS_SET_TICK_MODE, u64::MAX), 0);
    assert_eq!(kernel.tick_mode(), TickMode::Dynamic);
}

#[test]
fn sleep_waits_for_the_requested_ticks() {
    let kernel = kernel_state(TickMode::Fixed);
    let machine = Machine::new(0);
    let slot = spawn(&kernel, 1, ProcState::Running);
    let done = AtomicBool::new(false);

    let ret = thread::scope(|scope| {
        scope.spawn(|| run_ticker(&kernel, &machine, &done));
        let start = kernel.clock().now();
        let ret = call(&kernel, &machine.platform(), slot, SYS_SLEEP, 5);
        assert!(kernel.clock().now() - start >= 5);
        done.store(true, Ordering::SeqCst);
        ret
    });

    assert_eq!(ret, 0);
    assert!(machine.lifecycle.sleeps() >= 1);
}

#[test]
fn sleep_zero_or_negative_returns_at_once() {
    let kernel = kernel_state(TickMode::Fixed);
    let machine = Machine::new(0);
    let slot = spawn(&kernel, 1, ProcState::Running);
    let platform = machine.platform();

    assert_eq!(call(&kernel, &platform, slot, SYS_SLEEP, 0), 0);
    assert_eq!(call(&kernel, &platform, slot, SYS_SLEEP, (-3i64) as u64), 0);
    assert_eq!(machine.lifecycle.sleeps(), 0);
}

#[test]
fn killed_sleeper_returns_failure() {
    let kernel = kernel_state(TickMode::Fixed);
    let machine = Machine::new(0);
    let sleeper = spawn(&kernel, 1, ProcState::Running);
    let killer = spawn(&kernel, 2, ProcState::Running);
    let done = AtomicBool::new(false);

    let ret = thread::scope(|scope| {
        scope.spawn(|| run_ticker(&kernel, &machine, &done));
        scope.spawn(|| {
            while machine.lifecycle.sleeps() == 0 {
                thread::sleep(Duration::from_millis(1));
            }
            assert_eq!(call(&kernel, &machine.platform(), killer, SYS_KILL, 1), 0);
        });
        let ret = call(&kernel, &machine.platform(), sleeper, SYS_SLEEP, 1_000_000);
        done.store(true, Ordering::SeqCst);
        ret
    });

    assert_eq!(ret, SYSCALL_FAILURE);
    assert!(kernel.procs().is_killed(sleeper));
    assert!(kernel.clock().now() < 1_000_000);
}

#[test]
fn sleep_after_kill_fails_without_blocking() {
    let kernel = kernel_state(TickMode::Fixed);
    let machine = Machine::new(0);
    let slot = spawn(&kernel, 1, ProcState::Running);
    kernel.procs().set_killed(slot);

    let platform = machine.platform();
    let ctx = SyscallContext {
        state: &kernel,
        platform: &platform,
        slot,
    };
    assert_eq!(
        syscall(&ctx, SYS_SLEEP, [10, 0, 0, 0, 0, 0]),
        Err(SyscallError::Killed)
    );
    assert_eq!(machine.lifecycle.sleeps(), 0);
}

#[test]
fn kill_wakes_a_sleeping_target() {
    let kernel = kernel_state(TickMode::Fixed);
    let machine = Machine::new(0);
    let caller = spawn(&kernel, 1, ProcState::Running);
    let target = spawn(&kernel, 2, ProcState::Sleeping);

    assert_eq!(call(&kernel, &machine.platform(), caller, SYS_KILL, 2), 0);

    assert!(kernel.procs().is_killed(target));
    assert_eq!(kernel.procs().lock(target).unwrap().state, ProcState::Runnable);
    assert!(!kernel.procs().is_killed(caller));
}

#[test]
fn kill_unknown_pid_fails() {
    let kernel = kernel_state(TickMode::Fixed);
    let machine = Machine::new(0);
    let slot = spawn(&kernel, 1, ProcState::Running);
    let platform = machine.platform();

    assert_eq!(call(&kernel, &platform, slot, SYS_KILL, 77), SYSCALL_FAILURE);
    assert_eq!(call(&kernel, &platform, slot, SYS_KILL, (-1i64) as u64), SYSCALL_FAILURE);
    // Free slots carry pid 0.
    assert_eq!(call(&kernel, &platform, slot, SYS_KILL, 0), SYSCALL_FAILURE);
}

#[test]
fn sbrk_returns_previous_size() {
    let kernel = kernel_state(TickMode::Fixed);
    let machine = Machine::new(0);
    let slot = spawn(&kernel, 1, ProcState::Running);
    let platform = machine.platform();
    let start = 3 * PGSIZE;

    assert_eq!(call(&kernel, &platform, slot, SYS_SBRK, PGSIZE), start);
    assert_eq!(kernel.procs().lock(slot).unwrap().size, start + PGSIZE);

    assert_eq!(
        call(&kernel, &platform, slot, SYS_SBRK, (-(PGSIZE as i64)) as u64),
        start + PGSIZE
    );
    assert_eq!(kernel.procs().lock(slot).unwrap().size, start);
}

#[test]
fn sbrk_beyond_limit_fails() {
    let kernel = kernel_state(TickMode::Fixed);
    let machine = Machine::new(0);
    let slot = spawn(&kernel, 1, ProcState::Running);
    machine.lifecycle.set_memory_limit(4 * PGSIZE);
    let platform = machine.platform();

    assert_eq!(call(&kernel, &platform, slot, SYS_SBRK, 2 * PGSIZE), SYSCALL_FAILURE);
    assert_eq!(kernel.procs().lock(slot).unwrap().size, 3 * PGSIZE);
    assert_eq!(
        call(&kernel, &platform, slot, SYS_SBRK, (-(4 * PGSIZE as i64)) as u64),
        SYSCALL_FAILURE
    );
}

#[test]
fn fork_and_wait_forward_to_lifecycle() {
    let kernel = kernel_state(TickMode::Fixed);
    let machine = Machine::new(0);
    let slot = spawn(&kernel, 1, ProcState::Running);
    let platform = machine.platform();

    assert_eq!(call(&kernel, &platform, slot, SYS_FORK, 0), SYSCALL_FAILURE);
    machine.lifecycle.set_fork_result(Some(2));
    assert_eq!(call(&kernel, &platform, slot, SYS_FORK, 0), 2);

    assert_eq!(call(&kernel, &platform, slot, SYS_WAIT, 0x3000), SYSCALL_FAILURE);
    machine.lifecycle.set_wait_result(Some(2));
    assert_eq!(call(&kernel, &platform, slot, SYS_WAIT, 0), 2);
    assert_eq!(machine.lifecycle.wait_addrs(), vec![0x3000, 0]);
}

#[test]
fn exit_forwards_status() {
    let kernel = kernel_state(TickMode::Fixed);
    let machine = Machine::new(0);
    let slot = spawn(&kernel, 1, ProcState::Running);
    let platform = machine.platform();

    call(&kernel, &platform, slot, SYS_EXIT, 3);
    call(&kernel, &platform, slot, SYS_EXIT, (-2i64) as u64);
    assert_eq!(machine.lifecycle.exits(), vec![3, -2]);
}

#[test]
fn getpid_and_uptime() {
    let kernel = kernel_state(TickMode::Fixed);
    let machine = Machine::new(0);
    let slot = spawn(&kernel, 31, ProcState::Running);
    let platform = machine.platform();

    assert_eq!(call(&kernel, &platform, slot, SYS_GETPID, 0), 31);
    assert_eq!(call(&kernel, &platform, slot, SYS_UPTIME, 0), 0);
    clock_interrupt(&kernel, &machine.hart, &machine.lifecycle);
    clock_interrupt(&kernel, &machine.hart, &machine.lifecycle);
    assert_eq!(call(&kernel, &platform, slot, SYS_UPTIME, 0), 2);
}

#[test]
#[serial]
fn unknown_syscall_fails_with_warning() {
    let kernel = kernel_state(TickMode::Fixed);
    let machine = Machine::new(0);
    let slot = spawn(&kernel, 4, ProcState::Running);
    console::clear_captured();

    let ret = call(&kernel, &machine.platform(), slot, 99, 0);

    assert_eq!(ret, SYSCALL_FAILURE);
    let output = console::with_captured(str::to_owned);
    assert!(output.contains("4: unknown sys call 99"), "{}", output);
}

#[test]
fn dispatch_reads_trapframe_and_writes_a0() {
    let kernel = kernel_state(TickMode::Fixed);
    let machine = Machine::new(0);
    let slot = spawn(&kernel, 1, ProcState::Running);
    {
        let mut proc = kernel.procs().lock(slot).unwrap();
        proc.trapframe.a7 = SYS_SBRK;
        proc.trapframe.a0 = PGSIZE;
    }

    dispatch(&kernel, &machine.platform(), slot);

    let proc = kernel.procs().lock(slot).unwrap();
    assert_eq!(proc.trapframe.a0, 3 * PGSIZE);
    assert_eq!(proc.size, 4 * PGSIZE);
}

#[test]
fn dispatch_truncates_arguments_to_int() {
    let kernel = kernel_state(TickMode::Fixed);
    let machine = Machine::new(0);
    let slot = spawn(&kernel, 1, ProcState::Running);
    {
        let mut proc = kernel.procs().lock(slot).unwrap();
        proc.trapframe.a7 = SYS_SLEEP;
        // Upper half garbage; the low 32 bits say -1.
        proc.trapframe.a0 = 0x1234_5678_ffff_ffff;
    }

    dispatch(&kernel, &machine.platform(), slot);

    assert_eq!(kernel.procs().lock(slot).unwrap().trapframe.a0, 0);
    assert_eq!(machine.lifecycle.sleeps(), 0);
}
