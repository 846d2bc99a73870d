//! Low-level diagnostic output.
//!
//! The diagnostic channel is the most primitive way the kernel has to say
//! something: a single transmit primitive that never waits and never fails.
//! It is independent of the console registry so it keeps working while
//! consoles come and go.

use core::fmt;

/// An always-ready byte transmitter.
pub trait DiagnosticPort: Sync {
    /// Transmit one byte without waiting for the device.
    fn put(&self, byte: u8);

    /// Transmit every byte of `s`.
    fn put_str(&self, s: &str) {
        for byte in s.bytes() {
            self.put(byte);
        }
    }
}

/// Adapts a [`DiagnosticPort`] to `core::fmt::Write`.
pub struct DiagnosticWriter<'a> {
    port: &'a dyn DiagnosticPort,
}

impl<'a> DiagnosticWriter<'a> {
    pub fn new(port: &'a dyn DiagnosticPort) -> Self {
        Self { port }
    }
}

impl fmt::Write for DiagnosticWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.port.put_str(s);
        Ok(())
    }
}
