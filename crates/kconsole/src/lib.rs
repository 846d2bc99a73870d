//! Kernel console subsystem.
//!
//! Drivers register character devices as interchangeable [`Console`]s in a
//! [`ConsoleRegistry`], which keeps exactly one of them active. On top of
//! that sits a small printf-family engine that can write to the active
//! console ([`printf`]), to a caller buffer ([`snprintf`]), to the
//! diagnostic channel ([`dprintf`]), or nowhere at all to measure output.
//!
//! The `kprintf!`, `ksnprintf!` and `kdprintf!` macros build the typed
//! argument list:
//!
//! ```ignore
//! kconsole::kprintf!(&registry, "%s: %u pages at %p\n", name, count, base)?;
//! ```
#![cfg_attr(not(test), no_std)]

pub mod console;
pub mod format;
pub mod registry;
pub mod sink;

#[cfg(test)]
mod testing;

pub use console::{Console, ConsoleName, CONSOLE_NAME_SIZE};
pub use format::{dprintf, format, printf, snprintf, Arg, FormatError};
pub use registry::{ConsoleRegistry, RegistryError, MAX_CONSOLES};
pub use sink::{ActiveConsole, BoundedBuffer, DiagnosticChannel, Measure, Sink};

/// Format onto the active console of a registry.
#[macro_export]
macro_rules! kprintf {
    ($registry:expr, $format:expr $(, $arg:expr)* $(,)?) => {
        $crate::printf($registry, $format, &[$($crate::Arg::from($arg)),*])
    };
}

/// Format into an optional buffer; `None` only measures.
#[macro_export]
macro_rules! ksnprintf {
    ($buffer:expr, $format:expr $(, $arg:expr)* $(,)?) => {
        $crate::snprintf($buffer, $format, &[$($crate::Arg::from($arg)),*])
    };
}

/// Format onto a diagnostic port.
#[macro_export]
macro_rules! kdprintf {
    ($port:expr, $format:expr $(, $arg:expr)* $(,)?) => {
        $crate::dprintf($port, $format, &[$($crate::Arg::from($arg)),*])
    };
}
