//! Memory-mapped I/O primitives.
//!
//! Provides volatile `read8` and `write8` wrappers for device registers.
//! RISC-V has no separate I/O address space, so every device register is
//! reached through an ordinary (but uncached, side-effecting) load or store.

/// Read a byte from a memory-mapped register.
///
/// # Safety
///
/// Reading a device register can have side effects on hardware (for example
/// popping a byte from a receive FIFO). The caller must ensure `addr` is a
/// valid, mapped register address.
#[inline]
pub unsafe fn read8(addr: usize) -> u8 {
    unsafe { core::ptr::read_volatile(addr as *const u8) }
}

/// Write a byte to a memory-mapped register.
///
/// # Safety
///
/// Writing to an arbitrary address can have side effects on hardware.
/// The caller must ensure `addr` is a valid, mapped register address.
#[inline]
pub unsafe fn write8(addr: usize, value: u8) {
    unsafe { core::ptr::write_volatile(addr as *mut u8, value) }
}
