// =============================================================================
// Board Configuration: QEMU `virt` (RISC-V)
// =============================================================================
//
// Hardware constants the kernel is built against. There is no device tree
// parsing yet, so these must match the machine the image boots on.
//
// MEMORY MAP (the parts we touch):
//   0x1000_0000  UART0, NS16550A-compatible, byte-wide registers
//   0x8000_0000  Start of DRAM; OpenSBI sits at the bottom, the kernel above
// =============================================================================

/// Physical base of the UART0 register window.
pub const UART0_BASE: usize = 0x1000_0000;

/// Size of the UART0 register window in bytes.
pub const UART0_SIZE: usize = 0x100;

/// Distance between consecutive UART0 registers in bytes.
pub const UART0_REGISTER_WIDTH: usize = 1;

/// Physical base of DRAM.
pub const DRAM_BASE: u64 = 0x8000_0000;

/// log2 of the page size.
pub const PAGE_BITS: u32 = 12;

/// Size of one physical page (4 KiB).
pub const PAGE_SIZE: u64 = 1 << PAGE_BITS;
