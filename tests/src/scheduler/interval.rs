//! Interval selection tests

use tickos::config::{TickConfig, NPROC};
use tickos::process::ProcState;
use tickos::scheduler::{choose_interval, tally, TickMode, WorkloadTally};

use crate::mock::{kernel_state, set_usage, spawn};

const CFG: TickConfig = TickConfig::DEFAULT;
const CAPACITY: u64 = NPROC as u64;

fn pick(active: u64, high_cpu: u64, high_io: u64) -> u64 {
    let tally = WorkloadTally {
        total: active.max(high_cpu).max(high_io),
        active,
        high_cpu,
        high_io,
    };
    choose_interval(&tally, &CFG, CAPACITY)
}

#[test]
fn single_active_process_gets_max() {
    assert_eq!(pick(1, 0, 0), CFG.max_interval);
    assert_eq!(pick(1, 1, 0), CFG.max_interval);
    assert_eq!(pick(1, 0, 1), CFG.max_interval);
}

#[test]
fn idle_system_gets_max() {
    assert_eq!(pick(0, 0, 0), CFG.max_interval);
    // Heavy sleepers alone do not count as contention.
    assert_eq!(pick(0, 5, 5), CFG.max_interval);
}

#[test]
fn cpu_heavy_mix_shrinks_interval() {
    // 3 of 4 active processes above the CPU threshold.
    let interval = pick(4, 3, 0);
    assert_eq!(interval, 1_000_000 - 750_000 * 3 / 4);
    assert!(interval > CFG.min_interval && interval < CFG.default_interval);
}

#[test]
fn all_cpu_heavy_reaches_min() {
    assert_eq!(pick(4, 4, 0), CFG.min_interval);
    // Sleeping CPU-heavy records push the ratio past one; clamped.
    assert_eq!(pick(2, 6, 0), CFG.min_interval);
}

#[test]
fn cpu_branch_wins_over_io_branch() {
    let interval = pick(4, 3, 3);
    assert!(interval < CFG.default_interval);
}

#[test]
fn io_heavy_mix_grows_interval() {
    let interval = pick(4, 0, 3);
    assert_eq!(interval, 1_000_000 + 1_000_000 * 3 / 4);
    assert!(interval > CFG.default_interval && interval < CFG.max_interval);
    assert_eq!(pick(2, 0, 9), CFG.max_interval);
}

#[test]
fn exactly_half_heavy_is_not_a_majority() {
    // 2 > 4/2 is false: falls through to the fairness branch.
    let interval = pick(4, 2, 2);
    assert_eq!(interval, 1_000_000 - 750_000 * 4 / CAPACITY);
}

#[test]
fn odd_active_counts_use_integer_half() {
    // active = 3, active/2 = 1, so two heavy processes are a majority.
    assert!(pick(3, 2, 0) < CFG.default_interval);
    assert_eq!(pick(3, 1, 0), 1_000_000 - 750_000 * 3 / CAPACITY);
}

#[test]
fn fairness_branch_shrinks_with_contention() {
    let few = pick(2, 0, 0);
    let many = pick(40, 0, 0);
    assert!(many < few);
    assert!(few < CFG.default_interval);
    assert_eq!(pick(CAPACITY, 0, 0), CFG.min_interval);
}

#[test]
fn interval_always_within_bounds() {
    for active in 0..=CAPACITY {
        for high_cpu in (0..=CAPACITY).step_by(7) {
            for high_io in (0..=CAPACITY).step_by(5) {
                let interval = pick(active, high_cpu, high_io);
                assert!(
                    (CFG.min_interval..=CFG.max_interval).contains(&interval),
                    "active={} high_cpu={} high_io={} -> {}",
                    active,
                    high_cpu,
                    high_io,
                    interval
                );
            }
        }
    }
}

#[test]
fn custom_bounds_are_respected() {
    let cfg = TickConfig {
        default_interval: 500,
        min_interval: 500,
        max_interval: 500,
        ..TickConfig::DEFAULT
    };
    for (active, high_cpu, high_io) in [(0, 0, 0), (4, 4, 0), (4, 0, 4), (10, 0, 0)] {
        let tally = WorkloadTally {
            total: 10,
            active,
            high_cpu,
            high_io,
        };
        assert_eq!(choose_interval(&tally, &cfg, CAPACITY), 500);
    }
}

#[test]
fn tally_counts_the_table() {
    let kernel = kernel_state(TickMode::Dynamic);
    let running = spawn(&kernel, 1, ProcState::Running);
    let runnable = spawn(&kernel, 2, ProcState::Runnable);
    let sleeper = spawn(&kernel, 3, ProcState::Sleeping);
    spawn(&kernel, 4, ProcState::Zombie);

    set_usage(&kernel, running, 9_000, 0);
    set_usage(&kernel, runnable, 7_000, 1_000);
    set_usage(&kernel, sleeper, 7_001, 8_000);

    let tally = tally(kernel.procs(), &CFG);
    assert_eq!(
        tally,
        WorkloadTally {
            total: 4,
            active: 2,
            // Threshold is exclusive: 7000 is not above 7000.
            high_cpu: 2,
            high_io: 1,
        }
    );
}
