//! Console capability interface.
//!
//! A console is a character I/O endpoint over some hardware backend. A
//! driver implements [`Console`] on a value it owns and hands the registry a
//! shared reference to it; that value is the "context" every callback gets
//! back through `&self`.

use core::fmt;

/// Bytes reserved for a console name, terminator included.
pub const CONSOLE_NAME_SIZE: usize = 32;

/// A console display name of at most `CONSOLE_NAME_SIZE - 1` bytes.
///
/// Longer names are cut on a character boundary. The storage always keeps a
/// NUL after the last byte.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ConsoleName {
    bytes: [u8; CONSOLE_NAME_SIZE],
    len: u8,
}

impl ConsoleName {
    pub const fn new(name: &str) -> Self {
        let src = name.as_bytes();
        let mut len = if src.len() < CONSOLE_NAME_SIZE {
            src.len()
        } else {
            CONSOLE_NAME_SIZE - 1
        };
        // Don't split a multi-byte character.
        while len > 0 && len < src.len() && (src[len] & 0xC0) == 0x80 {
            len -= 1;
        }

        let mut bytes = [0u8; CONSOLE_NAME_SIZE];
        let mut i = 0;
        while i < len {
            bytes[i] = src[i];
            i += 1;
        }
        Self {
            bytes,
            len: len as u8,
        }
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// The name followed by its terminator.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.bytes[..self.len as usize + 1]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Display for ConsoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for ConsoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

/// A character I/O endpoint supplied by a driver.
///
/// Every transfer is a single non-blocking attempt: implementations return
/// what they managed to move right now and never wait for the hardware.
///
/// Identity is the address of the implementing value, not its name.
/// Zero-sized implementors have no distinct address and must not be used
/// as separate consoles.
pub trait Console: Sync {
    fn name(&self) -> &ConsoleName;

    /// Called when this console becomes the active one.
    fn activate(&self) {}

    /// Called when this console stops being the active one.
    fn deactivate(&self) {}

    /// Read waiting input into `data`, returning the number of bytes stored.
    fn read(&self, data: &mut [u8]) -> usize;

    /// Write as much of `data` as the device accepts right now.
    fn write(&self, data: &[u8]) -> usize;

    /// Write one byte; `false` means the device declined it.
    fn put(&self, byte: u8) -> bool;
}

/// Whether `a` and `b` are the same console.
pub fn same_console(a: &dyn Console, b: &dyn Console) -> bool {
    core::ptr::addr_eq(a as *const dyn Console, b as *const dyn Console)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockConsole;

    #[test]
    fn short_names_are_kept() {
        let name = ConsoleName::new("uart0");
        assert_eq!(name.as_str(), "uart0");
        assert_eq!(name.len(), 5);
        assert_eq!(name.as_bytes_with_nul(), b"uart0\0");
    }

    #[test]
    fn long_names_keep_31_bytes() {
        let long = "a-very-long-console-name-that-keeps-going";
        let name = ConsoleName::new(long);
        assert_eq!(name.len(), CONSOLE_NAME_SIZE - 1);
        assert_eq!(name.as_str(), &long[..31]);
        assert_eq!(name.as_bytes_with_nul().last(), Some(&0));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // 30 ASCII bytes followed by a two-byte character straddling the cut.
        let text = "012345678901234567890123456789é";
        let name = ConsoleName::new(text);
        assert_eq!(name.as_str(), &text[..30]);
    }

    #[test]
    fn identity_is_by_address_not_name() {
        let a = MockConsole::new("tty");
        let b = MockConsole::new("tty");
        assert!(same_console(&a, &a));
        assert!(!same_console(&a, &b));
    }
}
