//! Single-level page table, indexed directly by virtual page number.
//!
//! The flat table is the structural baseline for the hierarchical table: it answers the
//! same translate contract but reserves an entry for every page up front.

use alloc::boxed::Box;
use alloc::vec;

use crate::layout::NUM_PAGES;
use crate::stats::TableCounters;
use crate::{
    FrameAllocator, PageEntry, PageTable, PhysicalAddress, Translation, VirtualAddress,
};

/// A direct-indexed page table.
pub struct FlatTable {
    entries: Box<[PageEntry]>,
    allocator: FrameAllocator,
    counters: TableCounters,
}

impl FlatTable {
    /// Creates a table covering the whole 20-bit page-number range.
    pub fn new() -> Self {
        Self::with_size(NUM_PAGES)
    }

    /// Creates a table with `size` entries. Pages at or beyond `size` always fault.
    ///
    /// Behind a [`TranslationUnit`](crate::TranslationUnit) such a fault still installs
    /// frame 0 for the page in the TLB, so a repeat access to an out-of-range page hits the
    /// cache and resolves into frame 0 instead of faulting again.
    pub fn with_size(size: usize) -> Self {
        Self::with_size_and_allocator(size, FrameAllocator::default())
    }

    /// Creates a table with `size` entries that continues allocating from `allocator`.
    pub fn with_size_and_allocator(size: usize, allocator: FrameAllocator) -> Self {
        log::debug!("Simple page table initialized with {} entries", size);

        Self {
            entries: vec![PageEntry::default(); size].into_boxed_slice(),
            allocator,
            counters: TableCounters::default(),
        }
    }

    /// Translates a virtual address, populating its entry if needed.
    ///
    /// A page number outside the table is counted as a fault and resolves to physical
    /// address 0 without allocating a frame.
    pub fn translate(&mut self, addr: VirtualAddress) -> Translation {
        let index = addr.page_number().as_usize();

        let Some(entry) = self.entries.get_mut(index) else {
            log::trace!("Page {:#x} is outside the flat table", index);
            self.counters.record_fault();
            return Translation {
                physical: PhysicalAddress::new(0),
                fault: true,
            };
        };

        let fault = !entry.is_valid();
        if fault {
            let frame = self.allocator.allocate();
            log::trace!("Page fault at {} mapped to frame {}", addr, frame);
            *entry = PageEntry::populated(frame);
            self.counters.record_fault();
        } else {
            entry.touch();
            self.counters.record_hit();
        }

        Translation {
            physical: PhysicalAddress::from_frame(entry.frame(), addr.page_offset()),
            fault,
        }
    }

    /// Returns the entry for `addr`, or `None` if it lies outside the table.
    pub fn entry(&self, addr: VirtualAddress) -> Option<PageEntry> {
        self.entries.get(addr.page_number().as_usize()).copied()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the table has no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the allocator frames are drawn from.
    pub fn allocator(&self) -> &FrameAllocator {
        &self.allocator
    }

    /// Consumes the table and returns its allocator.
    pub fn into_allocator(self) -> FrameAllocator {
        self.allocator
    }

    /// Returns the access counters.
    pub fn counters(&self) -> TableCounters {
        self.counters
    }
}

impl Default for FlatTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PageTable for FlatTable {
    fn translate(&mut self, addr: VirtualAddress) -> Translation {
        FlatTable::translate(self, addr)
    }

    fn counters(&self) -> TableCounters {
        FlatTable::counters(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FrameNumber, HierarchicalTable};

    fn va(addr: u32) -> VirtualAddress {
        VirtualAddress::new(addr)
    }

    #[test]
    fn default_covers_all_pages() {
        let mut table = FlatTable::new();
        assert_eq!(table.len(), 1 << 20);

        let top = table.translate(va(0xFFFF_FFFF));
        assert!(top.fault);
        assert_eq!(top.physical.as_u32(), 0x0FFF);
    }

    #[test]
    fn fault_pattern_for_repeated_page() {
        let mut table = FlatTable::new();
        let results: Vec<Translation> = [0x1000, 0x2000, 0x1000, 0x3000]
            .iter()
            .map(|&addr| table.translate(va(addr)))
            .collect();

        let faults: Vec<bool> = results.iter().map(|r| r.fault).collect();
        assert_eq!(faults, [true, true, false, true]);
        assert_eq!(results[2].physical, results[0].physical);
        assert_eq!(results[3].physical.frame_number(), FrameNumber::new(2));
        assert_eq!(
            table.counters(),
            TableCounters {
                accesses: 4,
                hits: 1,
                faults: 3,
            }
        );
    }

    #[test]
    fn out_of_range_page_faults_to_zero() {
        let mut table = FlatTable::with_size(4);

        for _ in 0..2 {
            let result = table.translate(va(0x4000 + 0x123));
            assert!(result.fault);
            assert_eq!(result.physical, PhysicalAddress::new(0));
        }

        assert_eq!(table.counters().faults, 2);
        assert_eq!(table.allocator().allocations(), 0);
        assert_eq!(table.entry(va(0x4000)), None);
    }

    #[test]
    fn in_range_page_of_small_table() {
        let mut table = FlatTable::with_size(4);
        assert!(table.translate(va(0x3fff)).fault);
        assert!(!table.translate(va(0x3000)).fault);
        assert!(table.entry(va(0x3000)).is_some_and(|entry| entry.is_valid()));
    }

    #[test]
    fn allocator_is_independent_of_other_tables() {
        let mut flat = FlatTable::new();
        let mut hierarchical = HierarchicalTable::new();

        flat.translate(va(0x1000));
        flat.translate(va(0x2000));

        // The hierarchical table starts its own sequence, so frame 0 is handed out twice.
        let result = hierarchical.translate(va(0x5000));
        assert_eq!(result.physical.frame_number(), FrameNumber::new(0));
        assert_eq!(
            flat.translate(va(0x1000)).physical.frame_number(),
            FrameNumber::new(0)
        );
    }

    #[test]
    fn moved_allocator_continues_sequence() {
        let mut first = FlatTable::with_size(16);
        first.translate(va(0x1000));
        first.translate(va(0x2000));

        let mut second = FlatTable::with_size_and_allocator(16, first.into_allocator());
        let result = second.translate(va(0x1000));
        assert!(result.fault);
        assert_eq!(result.physical.frame_number(), FrameNumber::new(2));
        assert_eq!(second.allocator().allocations(), 3);
    }
}
