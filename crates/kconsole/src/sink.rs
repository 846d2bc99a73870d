//! Output destinations for the format engine.
//!
//! A sink takes one byte at a time and says whether it took it. A `false`
//! stops the formatting call that owns the sink: the engine finalizes and
//! returns the length emitted so far. Only [`ActiveConsole`] ever declines.

use khal::diag::DiagnosticPort;

use crate::registry::ConsoleRegistry;

pub trait Sink {
    /// Accept one byte, or decline it and stop the call.
    fn put(&mut self, byte: u8) -> bool;

    /// Runs exactly once at the end of a call with its logical length.
    fn finalize(&mut self, _length: usize) {}
}

/// Counts without storing anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Measure;

impl Sink for Measure {
    fn put(&mut self, _byte: u8) -> bool {
        true
    }
}

/// Fills a caller buffer, keeping the last slot for the terminator.
///
/// Bytes past the capacity are dropped but still accepted, so the logical
/// length keeps counting.
#[derive(Debug)]
pub struct BoundedBuffer<'b> {
    buffer: &'b mut [u8],
    offset: usize,
}

impl<'b> BoundedBuffer<'b> {
    pub fn new(buffer: &'b mut [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }
}

impl Sink for BoundedBuffer<'_> {
    fn put(&mut self, byte: u8) -> bool {
        if self.offset + 1 < self.buffer.len() {
            self.buffer[self.offset] = byte;
        }
        self.offset = self.offset.saturating_add(1);
        true
    }

    fn finalize(&mut self, length: usize) {
        if let Some(last) = self.buffer.len().checked_sub(1) {
            self.buffer[length.min(last)] = 0;
        }
    }
}

/// Forwards to whichever console is active in a registry.
pub struct ActiveConsole<'r, 'a> {
    registry: &'r ConsoleRegistry<'a>,
}

impl<'r, 'a> ActiveConsole<'r, 'a> {
    pub fn new(registry: &'r ConsoleRegistry<'a>) -> Self {
        Self { registry }
    }
}

impl Sink for ActiveConsole<'_, '_> {
    fn put(&mut self, byte: u8) -> bool {
        self.registry.put(byte)
    }
}

/// Forwards to the low-level diagnostic transmitter.
pub struct DiagnosticChannel<'p> {
    port: &'p dyn DiagnosticPort,
}

impl<'p> DiagnosticChannel<'p> {
    pub fn new(port: &'p dyn DiagnosticPort) -> Self {
        Self { port }
    }
}

impl Sink for DiagnosticChannel<'_> {
    fn put(&mut self, byte: u8) -> bool {
        self.port.put(byte);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockConsole;

    #[test]
    fn bounded_buffer_keeps_room_for_terminator() {
        let mut storage = [0xAAu8; 4];
        let mut sink = BoundedBuffer::new(&mut storage);
        for &byte in b"abcdef" {
            assert!(sink.put(byte));
        }
        sink.finalize(6);
        assert_eq!(&storage, b"abc\0");
    }

    #[test]
    fn bounded_buffer_terminates_short_output_in_place() {
        let mut storage = [0xAAu8; 8];
        let mut sink = BoundedBuffer::new(&mut storage);
        sink.put(b'o');
        sink.put(b'k');
        sink.finalize(2);
        assert_eq!(&storage[..3], b"ok\0");
        assert_eq!(storage[3], 0xAA);
    }

    #[test]
    fn zero_capacity_buffer_is_never_written() {
        let mut storage: [u8; 0] = [];
        let mut sink = BoundedBuffer::new(&mut storage);
        assert!(sink.put(b'x'));
        sink.finalize(1);
        assert_eq!(sink.capacity(), 0);
    }

    #[test]
    fn active_console_sink_reports_declines() {
        let console = MockConsole::new("tty");
        let mut registry = ConsoleRegistry::new();
        assert!(!ActiveConsole::new(&registry).put(b'x'));

        registry.register(&console).unwrap();
        console.limit(1);
        let mut sink = ActiveConsole::new(&registry);
        assert!(sink.put(b'a'));
        assert!(!sink.put(b'b'));
        assert_eq!(console.output(), b"a");
    }
}
