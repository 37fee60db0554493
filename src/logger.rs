use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use spin::Once;

use crate::serial;

static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);
static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::INFO.priority());
static CLOCK: Once<fn() -> u64> = Once::new();

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    PANIC,
    FATAL,
    ERROR,
    WARN,
    INFO,
    DEBUG,
    TRACE,
}

impl LogLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            LogLevel::PANIC => "PANIC",
            LogLevel::FATAL => "FATAL",
            LogLevel::ERROR => "ERROR",
            LogLevel::WARN => "WARN",
            LogLevel::INFO => "INFO",
            LogLevel::DEBUG => "DEBUG",
            LogLevel::TRACE => "TRACE",
        }
    }

    fn serial_color(self) -> &'static str {
        match self {
            LogLevel::PANIC => "\x1b[1;37;41m",
            LogLevel::FATAL => "\x1b[1;37;41m",
            LogLevel::ERROR => "\x1b[1;31m",
            LogLevel::WARN => "\x1b[33m",
            LogLevel::INFO => "\x1b[32m",
            LogLevel::DEBUG => "\x1b[36m",
            LogLevel::TRACE => "\x1b[90m",
        }
    }

    const fn priority(self) -> u8 {
        self as u8
    }

    fn from_priority(value: u8) -> Self {
        match value {
            0 => LogLevel::PANIC,
            1 => LogLevel::FATAL,
            2 => LogLevel::ERROR,
            3 => LogLevel::WARN,
            4 => LogLevel::INFO,
            5 => LogLevel::DEBUG,
            _ => LogLevel::TRACE,
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        const NAMES: [(&str, LogLevel); 8] = [
            ("panic", LogLevel::PANIC),
            ("fatal", LogLevel::FATAL),
            ("error", LogLevel::ERROR),
            ("warn", LogLevel::WARN),
            ("warning", LogLevel::WARN),
            ("info", LogLevel::INFO),
            ("debug", LogLevel::DEBUG),
            ("trace", LogLevel::TRACE),
        ];
        NAMES
            .iter()
            .find(|(name, _)| value.eq_ignore_ascii_case(name))
            .map(|(_, level)| *level)
    }
}

/// Bring up the console and set the boot log level. Later calls only adjust
/// the level.
pub fn init(level: LogLevel) {
    set_max_level(level);
    if LOGGER_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_ok()
    {
        serial::init();
    }
}

pub fn is_initialized() -> bool {
    LOGGER_INITIALIZED.load(Ordering::Relaxed)
}

/// Install the time source for log timestamps, in microseconds since boot.
/// Only the first call takes effect.
pub fn set_clock(clock: fn() -> u64) {
    CLOCK.call_once(|| clock);
}

pub fn log(level: LogLevel, args: fmt::Arguments<'_>) {
    let current = LOG_LEVEL.load(Ordering::Relaxed);
    if level.priority() > current {
        return;
    }

    emit_serial_line(level, boot_time_us(), args);
}

/// Print the panic banner and stop this hart for good. The installed kernel
/// state is marked halted so the other harts stop at their next trap.
///
/// On hosted builds the banner is followed by a Rust panic carrying the same
/// message, which is what the test crate's `should_panic` cases match on.
pub fn fatal(args: fmt::Arguments<'_>) -> ! {
    emit_serial_line(
        LogLevel::PANIC,
        boot_time_us(),
        format_args!("Kernel panic - not syncing: {}", args),
    );

    if let Some(kernel) = crate::state::kernel() {
        kernel.halt_all();
    }

    #[cfg(kernel_target)]
    crate::arch::halt();

    #[cfg(not(kernel_target))]
    panic!("Kernel panic - not syncing: {}", args);
}

pub fn set_max_level(level: LogLevel) {
    LOG_LEVEL.store(level.priority(), Ordering::Relaxed);
}

pub fn max_level() -> LogLevel {
    LogLevel::from_priority(LOG_LEVEL.load(Ordering::Relaxed))
}

/// Find a `log=<level>` or `loglevel=<level>` token in a boot argument string.
pub fn parse_level_directive(cmdline: &str) -> Option<LogLevel> {
    for token in cmdline.split_whitespace() {
        if let Some((key, value)) = token.split_once('=') {
            if key.eq_ignore_ascii_case("log") || key.eq_ignore_ascii_case("loglevel") {
                if let Some(level) = LogLevel::from_str(value) {
                    return Some(level);
                }
            }
        }
    }
    None
}

pub fn boot_time_us() -> u64 {
    match CLOCK.get() {
        Some(clock) => clock(),
        None => 0,
    }
}

fn emit_serial_line(level: LogLevel, timestamp_us: u64, args: fmt::Arguments<'_>) {
    serial::_print(format_args!(
        "{color}[{timestamp}] [{level:<5}] {message}\x1b[0m\n",
        color = level.serial_color(),
        timestamp = TimestampDisplay {
            microseconds: timestamp_us
        },
        level = LevelDisplay(level),
        message = args,
    ));
}

struct TimestampDisplay {
    microseconds: u64,
}

impl fmt::Display for TimestampDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seconds = self.microseconds / 1_000_000;
        let micros = self.microseconds % 1_000_000;
        write!(f, "{:>5}.{:06}", seconds, micros)
    }
}

struct LevelDisplay(LogLevel);

impl fmt::Display for LevelDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<5}", self.0.as_str())
    }
}
