// =============================================================================
// Physical Address Type
// =============================================================================
//
// The kernel runs with the MMU off (bare mode), so every address it handles
// is physical. We still wrap them in a newtype: a page address and a byte
// count are both u64, and mixing them up is the classic allocator bug.
//
// RISC-V Sv39 physical addresses are at most 56 bits wide; the upper bits
// must be zero.
// =============================================================================

use core::fmt;

use kconsole::Arg;

use crate::config::PAGE_SIZE;

const PAGE_OFFSET_MASK: u64 = PAGE_SIZE - 1;

/// A physical memory address.
///
/// # Examples
/// ```
/// use kernel::memory::PhysAddr;
///
/// let addr = PhysAddr::new(0x8000_1234);
/// assert_eq!(addr.page_align_down(), PhysAddr::new(0x8000_1000));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PhysAddr(u64);

impl PhysAddr {
    /// Creates a new physical address.
    ///
    /// # Panics
    /// Debug-asserts that the address fits in 56 bits.
    #[inline]
    pub const fn new(addr: u64) -> Self {
        debug_assert!(
            addr & 0xFF00_0000_0000_0000 == 0,
            "Physical address exceeds 56-bit limit"
        );
        Self(addr)
    }

    /// Returns the raw u64 value of this physical address.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns true if this address is aligned to a page boundary.
    #[inline]
    pub const fn is_page_aligned(self) -> bool {
        self.0 & PAGE_OFFSET_MASK == 0
    }

    /// Aligns this address down to the nearest page boundary.
    #[inline]
    pub const fn page_align_down(self) -> Self {
        Self(self.0 & !PAGE_OFFSET_MASK)
    }

    /// Aligns this address up to the nearest page boundary.
    ///
    /// # Panics
    /// Debug-asserts that the result doesn't overflow.
    #[inline]
    pub const fn page_align_up(self) -> Self {
        let aligned = (self.0 + PAGE_OFFSET_MASK) & !PAGE_OFFSET_MASK;
        debug_assert!(aligned >= self.0, "PhysAddr::page_align_up overflow");
        Self(aligned)
    }

    /// Creates a zero physical address (used as the "no page" marker).
    #[inline]
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Returns true if this is the zero address.
    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

/// Display a physical address in the standard `0x8000_1000` format.
/// The `P:` prefix matches the allocator's log output.
impl fmt::Debug for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P:{:#010x}", self.0)
    }
}

impl fmt::Display for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P:{:#010x}", self.0)
    }
}

impl fmt::LowerHex for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Allow adding a byte offset to a physical address.
impl core::ops::Add<u64> for PhysAddr {
    type Output = Self;
    #[inline]
    fn add(self, offset: u64) -> Self {
        Self::new(self.0 + offset)
    }
}

/// Allow calculating the distance between two physical addresses.
impl core::ops::Sub<PhysAddr> for PhysAddr {
    type Output = u64;
    #[inline]
    fn sub(self, other: PhysAddr) -> u64 {
        self.0 - other.0
    }
}

/// Physical addresses print through `%p` like any other pointer.
impl From<PhysAddr> for Arg<'_> {
    fn from(addr: PhysAddr) -> Self {
        Arg::Ptr(addr.0 as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_alignment() {
        let addr = PhysAddr::new(0x8000_1234);
        assert!(!addr.is_page_aligned());
        assert_eq!(addr.page_align_down(), PhysAddr::new(0x8000_1000));
        assert_eq!(addr.page_align_up(), PhysAddr::new(0x8000_2000));

        let aligned = PhysAddr::new(0x8000_2000);
        assert!(aligned.is_page_aligned());
        assert_eq!(aligned.page_align_up(), aligned);
    }

    #[test]
    fn arithmetic_and_formatting() {
        let base = PhysAddr::new(0x8000_0000);
        let next = base + PAGE_SIZE;
        assert_eq!(next - base, PAGE_SIZE);
        assert_eq!(format!("{next}"), "P:0x80001000");
        assert_eq!(format!("{next:x}"), "80001000");
        assert!(PhysAddr::zero().is_zero());
    }

    #[test]
    fn prints_as_pointer() {
        let mut buffer = [0u8; 16];
        let length = kconsole::ksnprintf!(Some(&mut buffer[..]), "%p", PhysAddr::new(0x8000_1000));
        assert_eq!(length, Ok(10));
        assert_eq!(&buffer[..11], b"0x80001000\0");
    }
}
