// =============================================================================
// Kernel Drivers
// =============================================================================
//
// Every in-kernel driver contributes one entry to DEVICE_TABLE: a name plus
// an initializer and a finalizer that receive the console registry. A driver
// that provides a console registers it from its initializer and deregisters
// it from its finalizer.
//
// ORDERING:
//   Initializers run in table order at boot. Finalizers run in REVERSE table
//   order at shutdown, so a driver is always torn down before anything it was
//   set up on top of.
//
//   ns16550a.rs: UART0 console
// =============================================================================

pub mod ns16550a;

use kconsole::ConsoleRegistry;

/// Hook run against the console registry during boot or shutdown.
pub type DeviceHook = fn(&mut ConsoleRegistry<'static>);

/// One entry of the device table.
#[derive(Clone, Copy)]
pub struct DeviceDriver {
    pub name: &'static str,
    pub initialize: DeviceHook,
    pub finalize: DeviceHook,
}

/// Drivers built into this kernel, in initialization order.
pub static DEVICE_TABLE: &[DeviceDriver] = &[ns16550a::DRIVER];

/// Run every initializer in table order.
pub fn initialize(table: &[DeviceDriver], registry: &mut ConsoleRegistry<'static>) {
    for driver in table {
        klog::debug!("Initializing device {}", driver.name);
        (driver.initialize)(registry);
    }
}

/// Run every finalizer in reverse table order.
pub fn finalize(table: &[DeviceDriver], registry: &mut ConsoleRegistry<'static>) {
    for driver in table.iter().rev() {
        klog::debug!("Finalizing device {}", driver.name);
        (driver.finalize)(registry);
    }
}
