//! Two-level hierarchical page table.
//!
//! This module provides the `HierarchicalTable` type, a radix table whose level 1
//! directory points at level 2 blocks of page entries. Level 2 blocks are created the
//! first time any address in their region is translated, so regions that are never
//! touched cost nothing.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;

use crate::layout::L2_SIZE;
use crate::stats::TableCounters;
use crate::{
    FrameAllocator, PageEntry, PageTable, PhysicalAddress, Translation, VirtualAddress,
};

/// A level 2 block of page entries.
///
/// Address layout covered by one block:
/// - Bits 0-11: Page offset (4 KiB)
/// - Bits 12-21: Index into this block
pub struct PageBlock {
    /// The entries in this block.
    entries: Box<[PageEntry; L2_SIZE]>,
}

impl PageBlock {
    /// Creates a new block.
    ///
    /// All entries are initialized to zero (not valid).
    pub fn new() -> Self {
        Self {
            entries: Box::new([PageEntry::default(); L2_SIZE]),
        }
    }

    /// Returns the entry at the given index.
    ///
    /// # Panics
    /// Panics if index >= 1024.
    pub fn entry(&self, index: usize) -> PageEntry {
        assert!(index < L2_SIZE, "page block index out of bounds");
        self.entries[index]
    }

    /// Returns a mutable reference to the entry at the given index.
    ///
    /// # Panics
    /// Panics if index >= 1024.
    pub fn entry_mut(&mut self, index: usize) -> &mut PageEntry {
        assert!(index < L2_SIZE, "page block index out of bounds");
        &mut self.entries[index]
    }

    /// Returns the number of entries in this block.
    pub const fn len(&self) -> usize {
        L2_SIZE
    }

    /// Returns the number of valid entries in this block.
    pub fn valid_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_valid()).count()
    }
}

impl Default for PageBlock {
    fn default() -> Self {
        Self::new()
    }
}

/// A two-level page table with lazily allocated level 2 blocks.
///
/// The level 1 directory is a sparse map from level 1 index to the block it owns; a key
/// is present iff that region has been translated at least once. Frames for new mappings
/// come from the table's own [`FrameAllocator`].
pub struct HierarchicalTable {
    /// Level 2 blocks, keyed by level 1 index.
    directory: BTreeMap<usize, Box<PageBlock>>,
    allocator: FrameAllocator,
    counters: TableCounters,
}

impl HierarchicalTable {
    /// Creates an empty table with a fresh frame allocator.
    pub fn new() -> Self {
        Self::with_allocator(FrameAllocator::default())
    }

    /// Creates an empty table that continues allocating from `allocator`.
    pub fn with_allocator(allocator: FrameAllocator) -> Self {
        log::debug!(
            "Two-level page table initialized with L1 size: {}",
            crate::layout::L1_SIZE
        );

        Self {
            directory: BTreeMap::new(),
            allocator,
            counters: TableCounters::default(),
        }
    }

    /// Translates a virtual address, populating its entry if needed.
    ///
    /// A fault is reported when the address's level 2 block does not exist yet, or when
    /// it exists but the entry is invalid. In both cases the entry is filled with the next
    /// frame from this table's allocator.
    pub fn translate(&mut self, addr: VirtualAddress) -> Translation {
        let l1_index = addr.l1_index();
        let l2_index = addr.l2_index();

        let block = self.directory.entry(l1_index).or_insert_with(|| {
            log::debug!("Allocating L2 block for L1 index {:#x}", l1_index);
            Box::new(PageBlock::new())
        });
        let entry = block.entry_mut(l2_index);

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

    /// Returns the entry for `addr`, or `None` if its level 2 block was never created.
    pub fn entry(&self, addr: VirtualAddress) -> Option<PageEntry> {
        self.directory
            .get(&addr.l1_index())
            .map(|block| block.entry(addr.l2_index()))
    }

    /// Returns the number of level 2 blocks allocated so far.
    pub fn block_count(&self) -> usize {
        self.directory.len()
    }

    /// Returns the number of valid mappings across all blocks.
    pub fn mapped_pages(&self) -> usize {
        self.directory.values().map(|block| block.valid_count()).sum()
    }

    /// Returns the allocator frames are drawn from.
    pub fn allocator(&self) -> &FrameAllocator {
        &self.allocator
    }

    /// Consumes the table, releasing every block, and returns its allocator so another
    /// table can continue the frame sequence.
    pub fn into_allocator(self) -> FrameAllocator {
        self.allocator
    }

    /// Returns the access counters.
    pub fn counters(&self) -> TableCounters {
        self.counters
    }
}

impl Default for HierarchicalTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PageTable for HierarchicalTable {
    fn translate(&mut self, addr: VirtualAddress) -> Translation {
        HierarchicalTable::translate(self, addr)
    }

    fn counters(&self) -> TableCounters {
        HierarchicalTable::counters(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FrameNumber;

    fn va(addr: u32) -> VirtualAddress {
        VirtualAddress::new(addr)
    }

    #[test]
    fn first_access_faults_then_hits() {
        let mut table = HierarchicalTable::new();

        let first = table.translate(va(0x1234_5678));
        assert!(first.fault);
        let second = table.translate(va(0x1234_5678));
        assert!(!second.fault);
        assert_eq!(first.physical, second.physical);
        assert_eq!(second.physical.page_offset(), 0x678);
    }

    #[test]
    fn fault_pattern_for_repeated_page() {
        let mut table = HierarchicalTable::new();
        let results: Vec<Translation> = [0x1000, 0x2000, 0x1000, 0x3000]
            .iter()
            .map(|&addr| table.translate(va(addr)))
            .collect();

        let faults: Vec<bool> = results.iter().map(|r| r.fault).collect();
        assert_eq!(faults, [true, true, false, true]);
        assert_eq!(results[2].physical, results[0].physical);
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
    fn frames_are_handed_out_in_order() {
        let mut table = HierarchicalTable::new();
        assert_eq!(table.translate(va(0x1000)).physical.as_u32(), 0x0000);
        assert_eq!(table.translate(va(0x4000_2000)).physical.as_u32(), 0x1000);
        assert_eq!(table.translate(va(0x8000_3abc)).physical.as_u32(), 0x2abc);
    }

    #[test]
    fn only_touched_regions_allocate_blocks() {
        let mut table = HierarchicalTable::new();
        assert_eq!(table.block_count(), 0);

        table.translate(va(0x0000_1000));
        table.translate(va(0x0000_2000));
        assert_eq!(table.block_count(), 1);

        table.translate(va(0x4000_2000));
        table.translate(va(0x8000_3000));
        assert_eq!(table.block_count(), 3);
        assert_eq!(table.mapped_pages(), 4);
    }

    #[test]
    fn entry_lookup_does_not_allocate() {
        let mut table = HierarchicalTable::new();
        assert_eq!(table.entry(va(0x1000)), None);

        table.translate(va(0x1000));
        let entry = table.entry(va(0x1000)).expect("block should exist");
        assert!(entry.is_valid());
        assert!(entry.flags().is_referenced());
        assert!(!entry.flags().is_dirty());

        let neighbour = table.entry(va(0x2000)).expect("same block");
        assert!(!neighbour.is_valid());
        assert_eq!(table.block_count(), 1);
    }

    #[test]
    fn wraparound_aliases_frame_zero() {
        let mut table = HierarchicalTable::new();
        let frames: Vec<FrameNumber> = (0..257u32)
            .map(|page| table.translate(va(page << 12)).physical.frame_number())
            .collect();

        assert_eq!(frames[0], FrameNumber::new(0));
        assert_eq!(frames[255], FrameNumber::new(255));
        assert_eq!(frames[256], FrameNumber::new(0));
    }

    #[test]
    fn new_tables_restart_allocation() {
        let mut first = HierarchicalTable::new();
        first.translate(va(0x1000));
        first.translate(va(0x2000));

        let mut second = HierarchicalTable::new();
        assert_eq!(
            second.translate(va(0x9000)).physical.frame_number(),
            FrameNumber::new(0)
        );
    }

    #[test]
    fn moved_allocator_continues_sequence() {
        let mut first = HierarchicalTable::new();
        first.translate(va(0x1000));
        first.translate(va(0x2000));

        let mut second = HierarchicalTable::with_allocator(first.into_allocator());
        assert_eq!(
            second.translate(va(0x9000)).physical.frame_number(),
            FrameNumber::new(2)
        );
        assert_eq!(second.allocator().allocations(), 3);
    }

    #[test]
    fn page_block_bounds() {
        let block = PageBlock::new();
        assert_eq!(block.len(), 1024);
        assert_eq!(block.valid_count(), 0);
    }

    #[test]
    #[should_panic(expected = "page block index out of bounds")]
    fn page_block_index_out_of_bounds() {
        PageBlock::new().entry(1024);
    }
}
