//! NS16550A UART driver (memory-mapped).
//!
//! Every transfer is a single poll of the line status register: if the
//! device is not ready the call returns immediately with nothing done.
//! Nothing in this module spins.

use bitflags::bitflags;

use crate::diag::DiagnosticPort;
use crate::mmio::{read8, write8};

/// Register indices (scaled by the register width of the bus).
const RBR: usize = 0x00; // Receiver buffer (read)
const THR: usize = 0x00; // Transmitter holding (write)
const IER: usize = 0x01; // Interrupt enable
const FCR: usize = 0x02; // FIFO control (write)
const LCR: usize = 0x03; // Line control
const LSR: usize = 0x05; // Line status

/// Number of byte registers the device decodes.
const REGISTER_COUNT: usize = 8;

bitflags! {
    /// Line status register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LineStatus: u8 {
        /// A received byte is waiting in RBR.
        const DATA_READY = 1 << 0;
        const OVERRUN_ERROR = 1 << 1;
        const PARITY_ERROR = 1 << 2;
        const FRAMING_ERROR = 1 << 3;
        const BREAK_INTERRUPT = 1 << 4;
        /// THR can accept another byte.
        const THR_EMPTY = 1 << 5;
        const TRANSMITTER_EMPTY = 1 << 6;
        const FIFO_DATA_ERROR = 1 << 7;
    }
}

bitflags! {
    /// FIFO control register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct FifoControl: u8 {
        const ENABLE = 1 << 0;
        const CLEAR_RX = 1 << 1;
        const CLEAR_TX = 1 << 2;
        const TRIGGER_14 = 0b11 << 6;
    }
}

/// 8 data bits, no parity, one stop bit, divisor latch closed.
const LCR_8N1: u8 = 0x03;

/// A memory-mapped NS16550A UART.
///
/// Holds only the register window description, so it can live in a
/// `static` and be shared; serializing concurrent use is the caller's job.
#[derive(Debug)]
pub struct Ns16550a {
    base: usize,
    size: usize,
    register_width: usize,
}

impl Ns16550a {
    /// Describe a UART whose registers start at `base`.
    ///
    /// This doesn't touch hardware.
    ///
    /// # Safety
    ///
    /// `base..base + size` must be the mapped register window of an
    /// NS16550A-compatible device, with registers `register_width` bytes
    /// apart, for as long as this value is used.
    pub const unsafe fn new(base: usize, size: usize, register_width: usize) -> Self {
        Self {
            base,
            size,
            register_width,
        }
    }

    /// Configure 8N1 framing with FIFOs enabled and interrupts off.
    ///
    /// The baud rate divisor is left as firmware programmed it.
    pub fn init(&self) {
        self.write_register(IER, 0x00);
        self.write_register(LCR, LCR_8N1);
        self.write_register(
            FCR,
            (FifoControl::ENABLE
                | FifoControl::CLEAR_RX
                | FifoControl::CLEAR_TX
                | FifoControl::TRIGGER_14)
                .bits(),
        );
    }

    fn register_address(&self, index: usize) -> usize {
        let offset = index * self.register_width;
        debug_assert!(
            index < REGISTER_COUNT && offset < self.size,
            "UART register index out of range"
        );
        self.base + offset
    }

    fn read_register(&self, index: usize) -> u8 {
        // SAFETY: `new` guarantees the window is a mapped UART.
        unsafe { read8(self.register_address(index)) }
    }

    fn write_register(&self, index: usize, value: u8) {
        // SAFETY: `new` guarantees the window is a mapped UART.
        unsafe { write8(self.register_address(index), value) }
    }

    /// Current line status.
    pub fn line_status(&self) -> LineStatus {
        LineStatus::from_bits_retain(self.read_register(LSR))
    }

    /// Take one received byte, if one is waiting.
    pub fn try_receive(&self) -> Option<u8> {
        if self.line_status().contains(LineStatus::DATA_READY) {
            Some(self.read_register(RBR))
        } else {
            None
        }
    }

    /// Fill `data` with waiting bytes, stopping at the first empty poll.
    ///
    /// Returns the number of bytes stored.
    pub fn receive_buffer(&self, data: &mut [u8]) -> usize {
        let mut count = 0;
        for slot in data.iter_mut() {
            match self.try_receive() {
                Some(byte) => *slot = byte,
                None => break,
            }
            count += 1;
        }
        count
    }

    /// Transmit one byte if THR is empty.
    ///
    /// Returns `false` without writing anything when the transmitter is busy.
    pub fn transmit(&self, byte: u8) -> bool {
        if self.line_status().contains(LineStatus::THR_EMPTY) {
            self.write_register(THR, byte);
            true
        } else {
            false
        }
    }

    /// Transmit bytes until the transmitter reports busy.
    ///
    /// Returns the number of bytes actually handed to the device.
    pub fn transmit_buffer(&self, data: &[u8]) -> usize {
        data.iter().take_while(|&&byte| self.transmit(byte)).count()
    }

    /// Write THR without checking whether the transmitter is ready.
    pub fn transmit_unchecked(&self, byte: u8) {
        self.write_register(THR, byte);
    }
}

/// The UART doubles as the diagnostic channel: bytes go straight into THR.
impl DiagnosticPort for Ns16550a {
    fn put(&self, byte: u8) {
        self.transmit_unchecked(byte);
    }
}
