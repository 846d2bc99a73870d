// =============================================================================
// Boot Context
// =============================================================================
//
// Everything `kmain` needs lives in one value instead of a pile of globals:
//
//   consoles: the console registry drivers register into
//   memory: the physical page allocator
//   debug: the always-ready diagnostic channel (raw UART writes)
//
// The registry and the allocator are each behind a spin::Mutex. The kernel
// is single-hart and never re-enters these paths, so the locks are never
// contended; they make `Kernel` shareable from a `static`.
//
// BOOT SEQUENCE (kmain):
//   1. Install the logger on the debug channel
//   2. Run every device initializer (drivers register their consoles)
//   3. Announce on the active console
//   4. Run every device finalizer in reverse
// =============================================================================

use kconsole::{kdprintf, kprintf, Console, ConsoleRegistry};
use khal::DiagnosticPort;
use spin::{Mutex, MutexGuard};

use crate::drivers::{self, DeviceDriver};
use crate::memory::{BumpAllocator, PhysAddr};

/// The kernel's boot-time state.
pub struct Kernel {
    consoles: Mutex<ConsoleRegistry<'static>>,
    memory: Mutex<BumpAllocator>,
    debug: &'static dyn DiagnosticPort,
}

impl Kernel {
    /// Build the boot context. Pages are handed out from `memory_start`
    /// (rounded up), which is normally the end of the kernel image.
    pub const fn new(debug: &'static dyn DiagnosticPort, memory_start: PhysAddr) -> Self {
        Self {
            consoles: Mutex::new(ConsoleRegistry::new()),
            memory: Mutex::new(BumpAllocator::new(memory_start)),
            debug,
        }
    }

    /// Lock the console registry.
    pub fn consoles(&self) -> MutexGuard<'_, ConsoleRegistry<'static>> {
        self.consoles.lock()
    }

    /// Lock the physical page allocator.
    pub fn memory(&self) -> MutexGuard<'_, BumpAllocator> {
        self.memory.lock()
    }

    pub fn debug(&self) -> &'static dyn DiagnosticPort {
        self.debug
    }

    pub fn initialize_devices(&self, table: &[DeviceDriver]) {
        drivers::initialize(table, &mut self.consoles());
    }

    pub fn finalize_devices(&self, table: &[DeviceDriver]) {
        drivers::finalize(table, &mut self.consoles());
    }
}

/// Kernel main: bring devices up, say hello, tear them down.
///
/// Returns the exit status handed back to the boot code.
pub fn kmain(kernel: &Kernel, devices: &[DeviceDriver]) -> i32 {
    klog::init(kernel.debug());

    // The diagnostic channel never fails, so neither can these.
    let _ = kdprintf!(kernel.debug(), "Booting with %u device drivers\n", devices.len());
    klog::info!("PMM starts at {}", kernel.memory().start());

    kernel.initialize_devices(devices);

    {
        let consoles = kernel.consoles();
        match consoles.active() {
            Some(console) => {
                let name = console.name().as_str();
                if let Err(error) = kprintf!(&*consoles, "Console %s is active\n", name) {
                    klog::error!("Announcement failed: {}", error);
                }
            }
            None => klog::warn!("No console registered"),
        }
    }

    kernel.finalize_devices(devices);
    0
}
