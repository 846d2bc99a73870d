// =============================================================================
// Kernel Library
// =============================================================================
//
// The board-facing half of the kernel, built as a library so the boot stub
// (assembly entry, BSS clearing, stack setup) can link it and call
// `boot::kmain` with a `boot::Kernel` it owns.
//
// MODULES:
//   config: board constants (UART0 window, DRAM base, page size)
//   memory: PhysAddr and the bump page allocator
//   drivers: device table and the NS16550A console driver
//   boot: the boot context and kmain
//
// Console multiplexing and printf-style output come from `kconsole`;
// logging comes from `klog`.
// =============================================================================

// `no_std` outside of tests: the kernel has no OS underneath it. Unit tests
// run on the host and need std for their harness.
#![cfg_attr(not(test), no_std)]

pub mod boot;
pub mod config;
pub mod drivers;
pub mod memory;

pub use boot::{kmain, Kernel};
