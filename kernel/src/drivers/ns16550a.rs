// =============================================================================
// NS16550A UART Console Driver
// =============================================================================
//
// Exposes UART0 as a console. The register window comes from board config;
// the line itself is already configured by SBI firmware before we boot, so
// this driver never reprograms it.
//
// Every operation is a single poll: if the transmitter holding register is
// busy, `put` declines and `write` stops short. Nothing here blocks.
// =============================================================================

use kconsole::{Console, ConsoleName, ConsoleRegistry};
use khal::{DiagnosticPort, Ns16550a};

use crate::config;
use crate::drivers::DeviceDriver;

/// A console backed by an NS16550A UART.
pub struct UartConsole {
    name: ConsoleName,
    uart: Ns16550a,
}

impl UartConsole {
    pub const fn new(name: &str, uart: Ns16550a) -> Self {
        Self {
            name: ConsoleName::new(name),
            uart,
        }
    }

    /// The same UART as an always-ready diagnostic channel.
    pub fn diagnostic(&self) -> &dyn DiagnosticPort {
        &self.uart
    }
}

impl Console for UartConsole {
    fn name(&self) -> &ConsoleName {
        &self.name
    }

    fn read(&self, data: &mut [u8]) -> usize {
        self.uart.receive_buffer(data)
    }

    fn write(&self, data: &[u8]) -> usize {
        self.uart.transmit_buffer(data)
    }

    fn put(&self, byte: u8) -> bool {
        self.uart.transmit(byte)
    }
}

/// UART0 of the board.
pub static UART0: UartConsole = UartConsole::new(
    "uart0",
    // SAFETY: the board config describes the UART0 MMIO window, which is
    // identity-mapped for the whole life of the kernel.
    unsafe {
        Ns16550a::new(
            config::UART0_BASE,
            config::UART0_SIZE,
            config::UART0_REGISTER_WIDTH,
        )
    },
);

/// Diagnostic port backed by UART0, usable before any console exists.
pub fn debug_port() -> &'static dyn DiagnosticPort {
    &UART0.uart
}

pub const DRIVER: DeviceDriver = DeviceDriver {
    name: "ns16550a",
    initialize,
    finalize,
};

fn initialize(registry: &mut ConsoleRegistry<'static>) {
    if let Err(error) = registry.register(&UART0) {
        klog::warn!("ns16550a: cannot register {}: {}", UART0.name(), error);
    }
}

fn finalize(registry: &mut ConsoleRegistry<'static>) {
    if let Err(error) = registry.deregister(&UART0) {
        klog::warn!("ns16550a: cannot deregister {}: {}", UART0.name(), error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kconsole::console::same_console;

    const LSR: usize = 5;
    const DATA_READY: u8 = 0x01;
    const THR_EMPTY: u8 = 0x20;

    /// A UART console over leaked host memory instead of MMIO.
    fn fake_console() -> (&'static UartConsole, usize) {
        let window: &'static mut [u8] = Box::leak(vec![0u8; 8].into_boxed_slice());
        let base = window.as_mut_ptr() as usize;
        // SAFETY: the window is leaked, so it outlives the console.
        let uart = unsafe { Ns16550a::new(base, 8, 1) };
        (Box::leak(Box::new(UartConsole::new("fake0", uart))), base)
    }

    fn poke(base: usize, offset: usize, value: u8) {
        unsafe { khal::mmio::write8(base + offset, value) }
    }

    fn peek(base: usize, offset: usize) -> u8 {
        unsafe { khal::mmio::read8(base + offset) }
    }

    #[test]
    fn put_declines_while_transmitter_is_busy() {
        let (console, base) = fake_console();

        assert!(!console.put(b'x'));
        assert_eq!(console.write(b"abc"), 0);
        assert_eq!(peek(base, 0), 0);

        poke(base, LSR, THR_EMPTY);
        assert!(console.put(b'x'));
        assert_eq!(peek(base, 0), b'x');
    }

    #[test]
    fn read_drains_while_data_is_ready() {
        let (console, base) = fake_console();
        let mut data = [0u8; 3];
        assert_eq!(console.read(&mut data), 0);

        poke(base, 0, b'k');
        poke(base, LSR, DATA_READY);
        assert_eq!(console.read(&mut data), 3);
        assert_eq!(&data, b"kkk");
    }

    #[test]
    fn prints_through_the_registry() {
        let (console, base) = fake_console();
        let mut registry = ConsoleRegistry::new();
        registry.register(console).unwrap();

        poke(base, LSR, THR_EMPTY);
        assert_eq!(kconsole::kprintf!(&registry, "%c", 'z'), Ok(1));
        assert_eq!(peek(base, 0), b'z');
    }

    #[test]
    fn driver_hooks_register_uart0() {
        let mut registry = ConsoleRegistry::new();

        (DRIVER.initialize)(&mut registry);
        assert_eq!(registry.count(), 1);
        assert!(registry.active().is_some_and(|active| same_console(active, &UART0)));
        assert_eq!(UART0.name().as_str(), "uart0");

        (DRIVER.finalize)(&mut registry);
        assert!(registry.is_empty());
        assert!(registry.active().is_none());
    }
}
