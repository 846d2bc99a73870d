//! Bump Physical Memory Manager (PMM).
//!
//! Hands out consecutive 4 KiB pages starting at the first page boundary
//! above the kernel image. It does not know how much DRAM exists and never
//! reuses a page: freeing is only logged. Enough for early boot, until a
//! real allocator can be built on top of it.

use crate::config::PAGE_SIZE;
use crate::memory::PhysAddr;

/// A physical page allocator that only ever moves forward.
#[derive(Debug)]
pub struct BumpAllocator {
    /// First page this allocator handed out.
    start: PhysAddr,
    /// Next page to hand out.
    next: PhysAddr,
}

impl BumpAllocator {
    /// Create an allocator whose first page is `start` rounded up to a page.
    pub const fn new(start: PhysAddr) -> Self {
        let start = start.page_align_up();
        Self { start, next: start }
    }

    pub fn start(&self) -> PhysAddr {
        self.start
    }

    /// Number of pages handed out so far.
    pub fn allocated(&self) -> u64 {
        (self.next - self.start) / PAGE_SIZE
    }

    /// Fill `pages` with freshly allocated page addresses.
    ///
    /// Returns how many entries were filled, which is always all of them.
    pub fn allocate_pages(&mut self, pages: &mut [PhysAddr]) -> usize {
        klog::debug!("PMM: allocating {} pages at {}", pages.len(), self.next);
        for page in pages.iter_mut() {
            *page = self.next;
            self.next = self.next + PAGE_SIZE;
        }
        pages.len()
    }

    /// Allocate a single page.
    pub fn allocate_page(&mut self) -> PhysAddr {
        let mut page = [PhysAddr::zero()];
        self.allocate_pages(&mut page);
        page[0]
    }

    /// Return pages to the allocator. They are not reused.
    pub fn free_pages(&mut self, pages: &[PhysAddr]) {
        klog::debug!("PMM: freeing {} pages", pages.len());
    }

    pub fn free_page(&mut self, page: PhysAddr) {
        self.free_pages(&[page]);
    }
}
