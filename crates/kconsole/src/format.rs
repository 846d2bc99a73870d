//! printf-family formatting engine.
//!
//! Interprets a format string against a typed argument list and emits the
//! result one byte at a time through a [`Sink`]. Supported conversions:
//!
//! | Conversion | Argument        | Output                                  |
//! |------------|-----------------|-----------------------------------------|
//! | `%%`       | none            | `%`                                     |
//! | `%c`       | char or integer | one character                           |
//! | `%s`       | string          | the string, up to its first NUL         |
//! | `%d` `%i`  | integer         | signed decimal                          |
//! | `%o`       | integer         | unsigned octal                          |
//! | `%x` `%X`  | integer         | unsigned hex, lower / upper case        |
//! | `%u`       | integer         | unsigned decimal                        |
//! | `%n`       | count cell      | nothing; stores the length so far       |
//! | `%p`       | pointer         | `(nil)` or `0x` + lowercase hex         |
//!
//! The return value is the *logical length*: the number of bytes the call
//! produced, whether or not the sink kept them all.

use core::cell::Cell;
use core::ptr::NonNull;

use khal::diag::DiagnosticPort;
use thiserror::Error;

use crate::registry::ConsoleRegistry;
use crate::sink::{ActiveConsole, BoundedBuffer, DiagnosticChannel, Measure, Sink};

const DIGITS_LOWER: &[u8; 16] = b"0123456789abcdef";
const DIGITS_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// Octal digits in `u64::MAX`, the widest rendering we produce.
const SCRATCH_SIZE: usize = 22;

/// One formatting argument.
#[derive(Debug, Clone, Copy)]
pub enum Arg<'a> {
    Char(char),
    Str(&'a str),
    Int(i64),
    UInt(u64),
    /// A pointer's address; 0 is the null pointer.
    Ptr(usize),
    /// Receives the logical length at a `%n`.
    Count(&'a Cell<usize>),
}

impl From<char> for Arg<'_> {
    fn from(value: char) -> Self {
        Arg::Char(value)
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(value: &'a str) -> Self {
        Arg::Str(value)
    }
}

impl<'a> From<&'a Cell<usize>> for Arg<'a> {
    fn from(value: &'a Cell<usize>) -> Self {
        Arg::Count(value)
    }
}

macro_rules! impl_from_int {
    ($variant:ident as $wide:ty: $($ty:ty),*) => {
        $(
            impl From<$ty> for Arg<'_> {
                fn from(value: $ty) -> Self {
                    Arg::$variant(value as $wide)
                }
            }
        )*
    };
}

impl_from_int!(Int as i64: i8, i16, i32, i64, isize);
impl_from_int!(UInt as u64: u8, u16, u32, u64, usize);

impl<T: ?Sized> From<*const T> for Arg<'_> {
    fn from(value: *const T) -> Self {
        Arg::Ptr(value.cast::<()>() as usize)
    }
}

impl<T: ?Sized> From<*mut T> for Arg<'_> {
    fn from(value: *mut T) -> Self {
        Arg::Ptr(value.cast::<()>() as usize)
    }
}

impl<T: ?Sized> From<Option<NonNull<T>>> for Arg<'_> {
    fn from(value: Option<NonNull<T>>) -> Self {
        Arg::Ptr(value.map_or(0, |ptr| ptr.as_ptr().cast::<()>() as usize))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("unsupported conversion `%{0}`")]
    UnsupportedConversion(char),
    #[error("format string ends inside a conversion")]
    TruncatedConversion,
    #[error("conversion `%{conversion}` has no argument (argument {index})")]
    MissingArgument { index: usize, conversion: char },
    #[error("conversion `%{conversion}` cannot format argument {index}")]
    ArgumentMismatch { index: usize, conversion: char },
}

/// What a conversion consumes from the argument list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    None,
    Char,
    Str,
    Integer,
    Count,
    Pointer,
}

impl Class {
    fn of(conversion: u8) -> Option<Self> {
        Some(match conversion {
            b'%' => Class::None,
            b'c' => Class::Char,
            b's' => Class::Str,
            b'd' | b'i' | b'o' | b'x' | b'X' | b'u' => Class::Integer,
            b'n' => Class::Count,
            b'p' => Class::Pointer,
            _ => return None,
        })
    }

    fn accepts(self, arg: &Arg<'_>) -> bool {
        matches!(
            (self, arg),
            (Class::Char, Arg::Char(_) | Arg::Int(_) | Arg::UInt(_))
                | (Class::Str, Arg::Str(_))
                | (Class::Integer, Arg::Int(_) | Arg::UInt(_))
                | (Class::Count, Arg::Count(_))
                | (Class::Pointer, Arg::Ptr(_))
        )
    }
}

/// Why emission stopped early.
enum Halt {
    /// The sink declined a byte.
    Declined,
    Failed(FormatError),
}

impl From<FormatError> for Halt {
    fn from(error: FormatError) -> Self {
        Halt::Failed(error)
    }
}

/// Bytes of `format` that take part in formatting: everything before the
/// first NUL.
fn effective(format: &str) -> &[u8] {
    let bytes = format.as_bytes();
    let end = bytes.iter().position(|&byte| byte == 0).unwrap_or(bytes.len());
    &bytes[..end]
}

/// Check every conversion against its argument before anything is emitted.
///
/// Stops quietly at the first unsupported or truncated conversion; the
/// emitting pass reports those once it reaches them.
fn validate(format: &[u8], args: &[Arg<'_>]) -> Result<(), FormatError> {
    let mut bytes = format.iter();
    let mut next_arg = 0;
    while let Some(&byte) = bytes.next() {
        if byte != b'%' {
            continue;
        }
        let Some(&conversion) = bytes.next() else {
            return Ok(());
        };
        let Some(class) = Class::of(conversion) else {
            return Ok(());
        };
        if class == Class::None {
            continue;
        }

        let arg = args.get(next_arg).ok_or(FormatError::MissingArgument {
            index: next_arg,
            conversion: conversion as char,
        })?;
        if !class.accepts(arg) {
            return Err(FormatError::ArgumentMismatch {
                index: next_arg,
                conversion: conversion as char,
            });
        }
        next_arg += 1;
    }
    Ok(())
}

/// Per-call formatting state.
struct PrintState<'f, 's, 'a, S: Sink + ?Sized> {
    format: &'f [u8],
    cursor: usize,
    args: &'s [Arg<'a>],
    next_arg: usize,
    length: usize,
    sink: &'s mut S,

    // Per-conversion flags.
    base: u64,
    lowercase: bool,
}

impl<'f, 's, 'a, S: Sink + ?Sized> PrintState<'f, 's, 'a, S> {
    fn reset_flags(&mut self) {
        self.base = 10;
        self.lowercase = false;
    }

    fn put(&mut self, byte: u8) -> Result<(), Halt> {
        if !self.sink.put(byte) {
            return Err(Halt::Declined);
        }
        self.length += 1;
        Ok(())
    }

    fn put_bytes(&mut self, bytes: &[u8]) -> Result<(), Halt> {
        bytes.iter().try_for_each(|&byte| self.put(byte))
    }

    fn put_str(&mut self, s: &str) -> Result<(), Halt> {
        self.put_bytes(effective(s))
    }

    fn put_char(&mut self, c: char) -> Result<(), Halt> {
        let mut encoded = [0u8; 4];
        self.put_bytes(c.encode_utf8(&mut encoded).as_bytes())
    }

    fn put_unsigned(&mut self, mut value: u64) -> Result<(), Halt> {
        let digits = if self.lowercase {
            DIGITS_LOWER
        } else {
            DIGITS_UPPER
        };

        let mut scratch = [0u8; SCRATCH_SIZE];
        let mut start = SCRATCH_SIZE;
        loop {
            start -= 1;
            scratch[start] = digits[(value % self.base) as usize];
            value /= self.base;
            if value == 0 {
                break;
            }
        }
        self.put_bytes(&scratch[start..])
    }

    fn put_signed(&mut self, value: i64) -> Result<(), Halt> {
        if value < 0 {
            self.put(b'-')?;
        }
        self.put_unsigned(value.unsigned_abs())
    }

    fn put_integer(&mut self, arg: Arg<'a>, signed: bool) -> Result<(), Halt> {
        match arg {
            Arg::Int(value) if signed => self.put_signed(value),
            Arg::Int(value) => self.put_unsigned(value as u64),
            Arg::UInt(value) => self.put_unsigned(value),
            _ => unreachable_class(),
        }
    }

    fn put_pointer(&mut self, address: usize) -> Result<(), Halt> {
        // A pointer never picks up flags from an earlier conversion.
        self.reset_flags();
        if address == 0 {
            return self.put_bytes(b"(nil)");
        }
        self.put_bytes(b"0x")?;
        self.base = 16;
        self.lowercase = true;
        self.put_unsigned(address as u64)
    }

    fn next_arg(&mut self, conversion: u8) -> Result<Arg<'a>, FormatError> {
        let index = self.next_arg;
        let arg = *self.args.get(index).ok_or(FormatError::MissingArgument {
            index,
            conversion: conversion as char,
        })?;
        let accepted = Class::of(conversion).map_or(false, |class| class.accepts(&arg));
        if !accepted {
            return Err(FormatError::ArgumentMismatch {
                index,
                conversion: conversion as char,
            });
        }
        self.next_arg += 1;
        Ok(arg)
    }

    fn convert(&mut self, conversion: u8) -> Result<(), Halt> {
        match conversion {
            b'%' => self.put(b'%'),
            b'c' => match self.next_arg(conversion)? {
                Arg::Char(c) => self.put_char(c),
                Arg::Int(value) => self.put(value as u8),
                Arg::UInt(value) => self.put(value as u8),
                _ => unreachable_class(),
            },
            b's' => match self.next_arg(conversion)? {
                Arg::Str(s) => self.put_str(s),
                _ => unreachable_class(),
            },
            b'd' | b'i' => {
                let arg = self.next_arg(conversion)?;
                self.put_integer(arg, true)
            }
            b'o' => {
                let arg = self.next_arg(conversion)?;
                self.base = 8;
                self.put_integer(arg, false)
            }
            b'x' => {
                let arg = self.next_arg(conversion)?;
                self.base = 16;
                self.lowercase = true;
                self.put_integer(arg, false)
            }
            b'X' => {
                let arg = self.next_arg(conversion)?;
                self.base = 16;
                self.put_integer(arg, false)
            }
            b'u' => {
                let arg = self.next_arg(conversion)?;
                self.put_integer(arg, false)
            }
            b'n' => match self.next_arg(conversion)? {
                Arg::Count(cell) => {
                    cell.set(self.length);
                    Ok(())
                }
                _ => unreachable_class(),
            },
            b'p' => match self.next_arg(conversion)? {
                Arg::Ptr(address) => self.put_pointer(address),
                _ => unreachable_class(),
            },
            other => Err(FormatError::UnsupportedConversion(other as char).into()),
        }
    }

    fn run(&mut self) -> Result<(), Halt> {
        validate(self.format, self.args)?;

        while let Some(&byte) = self.format.get(self.cursor) {
            self.cursor += 1;
            if byte != b'%' {
                self.put(byte)?;
                continue;
            }

            self.reset_flags();
            let conversion = *self
                .format
                .get(self.cursor)
                .ok_or(FormatError::TruncatedConversion)?;
            self.cursor += 1;
            self.convert(conversion)?;
        }
        Ok(())
    }
}

/// `next_arg` already checked the class, so other variants can't reach the
/// emitters; stop the call rather than panic if that ever changes.
#[cold]
fn unreachable_class() -> Result<(), Halt> {
    Err(Halt::Declined)
}

/// Format `format` with `args` into `sink`.
///
/// Returns the logical length, or the error that stopped the call. If the
/// sink declines a byte the call stops there and returns the length emitted
/// so far. The sink is finalized exactly once in every case.
pub fn format<S: Sink + ?Sized>(
    sink: &mut S,
    format: &str,
    args: &[Arg<'_>],
) -> Result<usize, FormatError> {
    let mut state = PrintState {
        format: effective(format),
        cursor: 0,
        args,
        next_arg: 0,
        length: 0,
        sink,
        base: 10,
        lowercase: false,
    };

    let outcome = state.run();
    let length = state.length;
    state.sink.finalize(length);
    match outcome {
        Ok(()) | Err(Halt::Declined) => Ok(length),
        Err(Halt::Failed(error)) => Err(error),
    }
}

/// Format into `buffer`, or only measure when there is no buffer.
///
/// The buffer is always NUL-terminated when it has any room at all.
pub fn snprintf(
    buffer: Option<&mut [u8]>,
    format: &str,
    args: &[Arg<'_>],
) -> Result<usize, FormatError> {
    match buffer {
        Some(buffer) => self::format(&mut BoundedBuffer::new(buffer), format, args),
        None => self::format(&mut Measure, format, args),
    }
}

/// Format onto the active console of `registry`.
pub fn printf(
    registry: &ConsoleRegistry<'_>,
    format: &str,
    args: &[Arg<'_>],
) -> Result<usize, FormatError> {
    self::format(&mut ActiveConsole::new(registry), format, args)
}

/// Format onto the diagnostic channel.
pub fn dprintf(
    port: &dyn DiagnosticPort,
    format: &str,
    args: &[Arg<'_>],
) -> Result<usize, FormatError> {
    self::format(&mut DiagnosticChannel::new(port), format, args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockConsole;

    /// Render into a generous buffer and return the text.
    fn render(format: &str, args: &[Arg<'_>]) -> Result<String, FormatError> {
        let mut buffer = [0u8; 128];
        let length = snprintf(Some(&mut buffer[..]), format, args)?;
        Ok(String::from_utf8(buffer[..length].to_vec()).unwrap())
    }

    /// Sink that records everything and counts finalizations.
    #[derive(Default)]
    struct Recorder {
        bytes: Vec<u8>,
        finalized: Vec<usize>,
    }

    impl Sink for Recorder {
        fn put(&mut self, byte: u8) -> bool {
            self.bytes.push(byte);
            true
        }

        fn finalize(&mut self, length: usize) {
            self.finalized.push(length);
        }
    }

    #[test]
    fn bounded_buffer_truncates_but_counts() {
        let mut buffer = [0xFFu8; 5];
        let length = snprintf(Some(&mut buffer[..]), "%s", &[Arg::from("hello")]);
        assert_eq!(length, Ok(5));
        assert_eq!(&buffer, b"hell\0");
    }

    #[test]
    fn missing_buffer_only_measures() {
        assert_eq!(snprintf(None, "%d", &[Arg::from(1234)]), Ok(4));
    }

    #[test]
    fn empty_buffer_is_left_untouched() {
        let mut buffer: [u8; 0] = [];
        assert_eq!(snprintf(Some(&mut buffer[..]), "abc", &[]), Ok(3));
    }

    #[test]
    fn literals_and_percent() {
        assert_eq!(render("100%% done", &[]).unwrap(), "100% done");
        assert_eq!(render("", &[]).unwrap(), "");
    }

    #[test]
    fn characters_and_strings() {
        let args = [Arg::from('k'), Arg::from("ernel"), Arg::from('é')];
        assert_eq!(render("%c%s %c", &args).unwrap(), "kernel é");
        assert_eq!(render("%c", &[Arg::from(65u8)]).unwrap(), "A");
    }

    #[test]
    fn strings_stop_at_nul() {
        assert_eq!(render("[%s]", &[Arg::from("ab\0cd")]).unwrap(), "[ab]");
        assert_eq!(render("ab\0%q", &[]).unwrap(), "ab");
    }

    #[test]
    fn signed_decimal() {
        assert_eq!(render("%d", &[Arg::from(-5)]).unwrap(), "-5");
        assert_eq!(render("%i", &[Arg::from(0)]).unwrap(), "0");
        assert_eq!(
            render("%d", &[Arg::from(i64::MIN)]).unwrap(),
            "-9223372036854775808"
        );
        assert_eq!(render("%d", &[Arg::from(i32::MIN)]).unwrap(), "-2147483648");
        assert_eq!(render("%d", &[Arg::from(42u8)]).unwrap(), "42");
    }

    #[test]
    fn unsigned_bases() {
        assert_eq!(render("%x", &[Arg::from(255)]).unwrap(), "ff");
        assert_eq!(render("%X", &[Arg::from(255)]).unwrap(), "FF");
        assert_eq!(render("%o", &[Arg::from(8)]).unwrap(), "10");
        assert_eq!(render("%u", &[Arg::from(u64::MAX)]).unwrap(), "18446744073709551615");
        assert_eq!(
            render("%o", &[Arg::from(u64::MAX)]).unwrap(),
            "1777777777777777777777"
        );
        assert_eq!(render("%x", &[Arg::from(-1i64)]).unwrap(), "ffffffffffffffff");
    }

    #[test]
    fn flags_reset_between_conversions() {
        let args = [Arg::from(255), Arg::from(255), Arg::from(255)];
        assert_eq!(render("%x %d %X", &args).unwrap(), "ff 255 FF");
    }

    #[test]
    fn pointers() {
        assert_eq!(render("%p", &[Arg::from(core::ptr::null::<u8>())]).unwrap(), "(nil)");
        assert_eq!(render("%p", &[Arg::Ptr(0xDEAD_BEEF)]).unwrap(), "0xdeadbeef");
        // An uppercase conversion before it doesn't leak into the pointer.
        let args = [Arg::from(171), Arg::Ptr(0xAB)];
        assert_eq!(render("%X %p", &args).unwrap(), "AB 0xab");
    }

    #[test]
    fn count_writes_back_logical_length() {
        let seen = Cell::new(usize::MAX);
        let mut buffer = [0u8; 4];
        let length = snprintf(
            Some(&mut buffer[..]),
            "abcdef%n!",
            &[Arg::from(&seen)],
        );
        assert_eq!(length, Ok(7));
        assert_eq!(seen.get(), 6);
    }

    #[test]
    fn unsupported_conversion_stops_after_preceding_literals() {
        let mut sink = Recorder::default();
        let result = format(&mut sink, "ok %q tail %d", &[Arg::from(1)]);
        assert_eq!(result, Err(FormatError::UnsupportedConversion('q')));
        assert_eq!(sink.bytes, b"ok ");
        assert_eq!(sink.finalized, [3]);
    }

    #[test]
    fn trailing_percent_is_an_error() {
        let mut sink = Recorder::default();
        assert_eq!(
            format(&mut sink, "50%", &[]),
            Err(FormatError::TruncatedConversion)
        );
        assert_eq!(sink.bytes, b"50");
        assert_eq!(sink.finalized, [2]);
    }

    #[test]
    fn argument_errors_emit_nothing() {
        let mut sink = Recorder::default();
        assert_eq!(
            format(&mut sink, "a %d %s", &[Arg::from(1)]),
            Err(FormatError::MissingArgument {
                index: 1,
                conversion: 's'
            })
        );
        assert_eq!(
            format(&mut sink, "a %d", &[Arg::from("one")]),
            Err(FormatError::ArgumentMismatch {
                index: 0,
                conversion: 'd'
            })
        );
        assert!(sink.bytes.is_empty());
        assert_eq!(sink.finalized, [0, 0]);
    }

    #[test]
    fn extra_arguments_are_ignored() {
        assert_eq!(render("%d", &[Arg::from(1), Arg::from(2)]).unwrap(), "1");
    }

    #[test]
    fn console_output_stops_when_declined() {
        let console = MockConsole::new("tty");
        let mut registry = ConsoleRegistry::new();
        registry.register(&console).unwrap();

        assert_eq!(printf(&registry, "n=%u\n", &[Arg::from(42u32)]), Ok(5));
        assert_eq!(console.output(), b"n=42\n");

        console.limit(3);
        assert_eq!(printf(&registry, "abcdef", &[]), Ok(3));
        assert_eq!(console.output(), b"n=42\nabc");
    }

    #[test]
    fn console_output_without_active_console_is_empty() {
        let registry = ConsoleRegistry::new();
        assert_eq!(printf(&registry, "lost", &[]), Ok(0));
    }

    #[test]
    fn diagnostic_output_reaches_port() {
        struct Capture(spin::Mutex<Vec<u8>>);
        impl DiagnosticPort for Capture {
            fn put(&self, byte: u8) {
                self.0.lock().push(byte);
            }
        }

        let port = Capture(spin::Mutex::new(Vec::new()));
        let args = [Arg::from(3u32), Arg::Ptr(0x8000_1000)];
        assert_eq!(dprintf(&port, "%u pages at %p", &args), Ok(21));
        assert_eq!(port.0.lock().as_slice(), b"3 pages at 0x80001000");
    }
}
