// =============================================================================
// Memory Management
// =============================================================================
//
// With the MMU in bare mode there is no paging and no heap yet. All the
// kernel needs is a source of physical pages:
//
//   address.rs: PhysAddr newtype and page arithmetic
//   pmm.rs: bump allocator starting above the kernel image
// =============================================================================

pub mod address;
pub mod pmm;

pub use address::PhysAddr;
pub use pmm::BumpAllocator;
