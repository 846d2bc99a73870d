//! Kernel logging subsystem.
//!
//! Records go out through the diagnostic channel installed by [`init`], so
//! logging works from the earliest boot and keeps working while consoles are
//! registered and removed. Until `init` runs every record is dropped.
#![cfg_attr(not(test), no_std)]

use core::fmt::{self, Write};
use core::sync::atomic::{AtomicU8, Ordering};

use khal::diag::{DiagnosticPort, DiagnosticWriter};
use spin::Once;

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => " INFO",
            Level::Warn => " WARN",
            Level::Error => "ERROR",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Level::Trace,
            1 => Level::Debug,
            2 => Level::Info,
            3 => Level::Warn,
            _ => Level::Error,
        }
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace => Level::Trace,
            log::Level::Debug => Level::Debug,
            log::Level::Info => Level::Info,
            log::Level::Warn => Level::Warn,
            log::Level::Error => Level::Error,
        }
    }
}

/// Where records go once the kernel has a diagnostic channel.
static PORT: Once<&'static dyn DiagnosticPort> = Once::new();

/// Records below this level are dropped.
static MAX_LEVEL: AtomicU8 = AtomicU8::new(Level::Debug as u8);

/// Bridges `log` crate records into the same channel.
struct KernelLogger;

static LOGGER: KernelLogger = KernelLogger;

impl log::Log for KernelLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        Level::from(metadata.level()) >= max_level()
    }

    fn log(&self, record: &log::Record) {
        log(Level::from(record.level()), *record.args());
    }

    fn flush(&self) {}
}

/// Initialize the kernel logger with its output port.
///
/// Only the first call installs a port; later calls are ignored.
pub fn init(port: &'static dyn DiagnosticPort) {
    PORT.call_once(|| port);
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Trace);
    }
}

/// Drop every record below `level` from now on.
pub fn set_max_level(level: Level) {
    MAX_LEVEL.store(level as u8, Ordering::Relaxed);
}

/// The current threshold.
pub fn max_level() -> Level {
    Level::from_u8(MAX_LEVEL.load(Ordering::Relaxed))
}

/// Log a message with a specific level
pub fn log(level: Level, args: fmt::Arguments) {
    if level < max_level() {
        return;
    }
    if let Some(port) = PORT.get() {
        write_record(*port, level, args);
    }
}

/// Format one record onto `port`: `[LEVEL] message\n`.
pub fn write_record(port: &dyn DiagnosticPort, level: Level, args: fmt::Arguments) {
    let mut writer = DiagnosticWriter::new(port);
    // DiagnosticWriter never fails.
    let _ = write!(writer, "[{}] {}\n", level.as_str(), args);
}

/// Print to the diagnostic channel without formatting
pub fn print(args: fmt::Arguments) {
    if let Some(port) = PORT.get() {
        let _ = DiagnosticWriter::new(*port).write_fmt(args);
    }
}

/// Log at TRACE level
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {
        $crate::log($crate::Level::Trace, format_args!($($arg)*))
    };
}

/// Log at DEBUG level
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::log($crate::Level::Debug, format_args!($($arg)*))
    };
}

/// Log at INFO level
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::log($crate::Level::Info, format_args!($($arg)*))
    };
}

/// Log at WARN level
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::log($crate::Level::Warn, format_args!($($arg)*))
    };
}

/// Log at ERROR level
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::log($crate::Level::Error, format_args!($($arg)*))
    };
}

/// Print without newline
#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => {
        $crate::print(format_args!($($arg)*))
    };
}

/// Print with newline
#[macro_export]
macro_rules! println {
    () => ($crate::print!("\n"));
    ($($arg:tt)*) => {{
        $crate::print(format_args!($($arg)*));
        $crate::print(format_args!("\n"));
    }};
}
