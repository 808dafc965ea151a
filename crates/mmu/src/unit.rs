//! The translation unit: a TLB in front of a page table, with cycle accounting.

use alloc::boxed::Box;

use crate::layout::{
    NUM_PHYSICAL_FRAMES, PAGE_FAULT_TIME, PAGE_TABLE_ACCESS_TIME, TLB_HIT_TIME, TLB_SIZE,
};
use crate::stats::Snapshot;
use crate::{
    FrameAllocator, FrameNumber, HierarchicalTable, PageTable, PhysicalAddress,
    TranslationCache, VirtualAddress,
};

/// Cycle cost charged for each way a translation can be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleCosts {
    pub tlb_hit: u64,
    pub table_hit: u64,
    pub fault: u64,
}

impl Default for CycleCosts {
    fn default() -> Self {
        Self {
            tlb_hit: TLB_HIT_TIME,
            table_hit: PAGE_TABLE_ACCESS_TIME,
            fault: PAGE_FAULT_TIME,
        }
    }
}

/// Tunable parameters of a translation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MmuConfig {
    /// Number of translation cache slots.
    pub tlb_capacity: usize,
    pub costs: CycleCosts,
}

impl Default for MmuConfig {
    fn default() -> Self {
        Self {
            tlb_capacity: TLB_SIZE,
            costs: CycleCosts::default(),
        }
    }
}

/// How a single translation was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOutcome {
    /// The translation cache held the mapping.
    TlbHit,
    /// The cache missed and the page table held a valid entry.
    TableHit,
    /// The cache missed and the page table had to populate the entry.
    Fault,
}

/// The result of one translation through the unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub physical: PhysicalAddress,
    pub outcome: AccessOutcome,
    /// Cycles charged for this access.
    pub cycles: u64,
}

/// A memory-management unit: translation cache, page table and cycle counter.
///
/// Every access probes the cache first. On a miss the page table resolves the address,
/// populating it if necessary, and the resulting mapping is always written back into the
/// cache. The unit owns both structures; dropping it releases all of their storage.
///
/// The page table defaults to [`HierarchicalTable`]; any [`PageTable`] can be used to
/// compare table designs under the same cache and cost model.
pub struct TranslationUnit<T: PageTable = HierarchicalTable> {
    tlb: TranslationCache,
    table: T,
    costs: CycleCosts,
    total_cycles: u64,
    /// Allocator behind [`TranslationUnit::allocate_physical_frame`], separate from the
    /// one the page table populates entries from.
    frames: FrameAllocator,
    frame_allocated: Box<[bool; NUM_PHYSICAL_FRAMES]>,
}

impl TranslationUnit<HierarchicalTable> {
    /// Creates a unit with the default configuration and an empty hierarchical table.
    pub fn new() -> Self {
        Self::with_config(MmuConfig::default())
    }

    /// Creates a unit with an empty hierarchical table.
    pub fn with_config(config: MmuConfig) -> Self {
        Self::with_table(HierarchicalTable::new(), config)
    }
}

impl Default for TranslationUnit<HierarchicalTable> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PageTable> TranslationUnit<T> {
    /// Creates a unit over an existing page table.
    ///
    /// Every table result is cached, faults included. A table that resolves a fault to
    /// physical address 0 (such as a [`FlatTable`](crate::FlatTable) sized below the
    /// address space) therefore leaves frame 0 cached for that page, and later accesses to
    /// it are TLB hits into frame 0.
    pub fn with_table(table: T, config: MmuConfig) -> Self {
        log::debug!(
            "MMU initialized with {}-entry TLB (costs: hit {}, walk {}, fault {})",
            config.tlb_capacity,
            config.costs.tlb_hit,
            config.costs.table_hit,
            config.costs.fault
        );

        Self {
            tlb: TranslationCache::new(config.tlb_capacity),
            table,
            costs: config.costs,
            total_cycles: 0,
            frames: FrameAllocator::default(),
            frame_allocated: Box::new([false; NUM_PHYSICAL_FRAMES]),
        }
    }

    /// Translates a virtual address to a physical address.
    pub fn translate(&mut self, addr: VirtualAddress) -> PhysicalAddress {
        self.access(addr).physical
    }

    /// Translates a virtual address and reports how it was resolved and what it cost.
    pub fn access(&mut self, addr: VirtualAddress) -> Access {
        let virtual_page = addr.page_number();

        if let Some(frame) = self.tlb.lookup(virtual_page) {
            return self.charge(
                PhysicalAddress::from_frame(frame, addr.page_offset()),
                AccessOutcome::TlbHit,
            );
        }

        let translation = self.table.translate(addr);
        self.tlb
            .insert(virtual_page, translation.physical.frame_number());

        let outcome = if translation.fault {
            AccessOutcome::Fault
        } else {
            AccessOutcome::TableHit
        };
        self.charge(translation.physical, outcome)
    }

    fn charge(&mut self, physical: PhysicalAddress, outcome: AccessOutcome) -> Access {
        let cycles = match outcome {
            AccessOutcome::TlbHit => self.costs.tlb_hit,
            AccessOutcome::TableHit => self.costs.table_hit,
            AccessOutcome::Fault => self.costs.fault,
        };
        self.total_cycles += cycles;

        Access {
            physical,
            outcome,
            cycles,
        }
    }

    /// Hands out the next frame from the unit's own round-robin allocator.
    ///
    /// This is independent of the frames the page table assigns during translation; the
    /// unit never calls it itself.
    pub fn allocate_physical_frame(&mut self) -> FrameNumber {
        let frame = self.frames.allocate();
        self.frame_allocated[frame.as_usize()] = true;
        frame
    }

    /// Returns whether [`allocate_physical_frame`](Self::allocate_physical_frame) has
    /// ever handed out `frame`.
    pub fn is_frame_allocated(&self, frame: FrameNumber) -> bool {
        self.frame_allocated
            .get(frame.as_usize())
            .copied()
            .unwrap_or(false)
    }

    /// Invalidates every translation cache slot.
    pub fn invalidate_tlb(&mut self) {
        self.tlb.invalidate_all();
    }

    /// Captures the cumulative counters used to compute batch statistics.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tlb_hits: self.tlb.counters().hits,
            page_faults: self.table.counters().faults,
            cycles: self.total_cycles,
        }
    }

    /// Returns the total cycles charged so far.
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    /// Returns the translation cache.
    pub fn tlb(&self) -> &TranslationCache {
        &self.tlb
    }

    /// Returns the page table.
    pub fn table(&self) -> &T {
        &self.table
    }

    /// Returns the cycle costs in effect.
    pub fn costs(&self) -> CycleCosts {
        self.costs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FlatTable;

    fn va(addr: u32) -> VirtualAddress {
        VirtualAddress::new(addr)
    }

    #[test]
    fn repeated_address_costs_one_cycle_after_first() {
        let mut unit = TranslationUnit::new();

        let first = unit.access(va(0x1234_5678));
        assert_eq!(first.outcome, AccessOutcome::Fault);
        assert_eq!(first.cycles, 1000);

        for _ in 1..10 {
            let before = unit.total_cycles();
            let access = unit.access(va(0x1234_5678));
            assert_eq!(access.outcome, AccessOutcome::TlbHit);
            assert_eq!(access.physical, first.physical);
            assert_eq!(unit.total_cycles() - before, 1);
        }
        assert_eq!(unit.total_cycles(), 1009);
    }

    #[test]
    fn table_hit_after_invalidation_costs_ten() {
        let mut unit = TranslationUnit::new();
        let first = unit.translate(va(0x0040_1abc));
        unit.invalidate_tlb();

        let access = unit.access(va(0x0040_1abc));
        assert_eq!(access.outcome, AccessOutcome::TableHit);
        assert_eq!(access.cycles, 10);
        assert_eq!(access.physical, first);

        // The walk refreshed the cache.
        assert_eq!(unit.access(va(0x0040_1000)).outcome, AccessOutcome::TlbHit);
    }

    #[test]
    fn table_hit_after_cache_eviction() {
        let mut unit = TranslationUnit::with_config(MmuConfig {
            tlb_capacity: 2,
            ..MmuConfig::default()
        });
        unit.translate(va(0x1000));
        unit.translate(va(0x2000));
        unit.translate(va(0x3000));

        // 0x1000 was evicted from the cache but is still mapped in the table.
        let access = unit.access(va(0x1000));
        assert_eq!(access.outcome, AccessOutcome::TableHit);
        assert_eq!(access.physical.frame_number(), FrameNumber::new(0));
    }

    #[test]
    fn physical_address_keeps_offset() {
        let mut unit = TranslationUnit::new();
        unit.translate(va(0x1000));
        let physical = unit.translate(va(0x5000_0fed));
        assert_eq!(physical.as_u32(), 0x1fed);
    }

    #[test]
    fn snapshot_tracks_counters() {
        let mut unit = TranslationUnit::new();
        for addr in [0x1000, 0x1004, 0x2000, 0x1008] {
            unit.translate(va(addr));
        }

        assert_eq!(
            unit.snapshot(),
            Snapshot {
                tlb_hits: 2,
                page_faults: 2,
                cycles: 2002,
            }
        );
        assert_eq!(unit.tlb().counters().accesses, 4);
        assert_eq!(unit.table().counters().accesses, 2);
    }

    #[test]
    fn custom_costs_are_charged() {
        let mut unit = TranslationUnit::with_config(MmuConfig {
            tlb_capacity: 8,
            costs: CycleCosts {
                tlb_hit: 2,
                table_hit: 20,
                fault: 500,
            },
        });
        unit.translate(va(0x1000));
        unit.translate(va(0x1000));
        assert_eq!(unit.total_cycles(), 502);
    }

    #[test]
    fn allocate_physical_frame_is_independent() {
        let mut unit = TranslationUnit::new();
        unit.translate(va(0x1000));
        unit.translate(va(0x2000));

        assert!(!unit.is_frame_allocated(FrameNumber::new(0)));
        assert_eq!(unit.allocate_physical_frame(), FrameNumber::new(0));
        assert_eq!(unit.allocate_physical_frame(), FrameNumber::new(1));
        assert!(unit.is_frame_allocated(FrameNumber::new(1)));
        assert!(!unit.is_frame_allocated(FrameNumber::new(2)));
        assert!(!unit.is_frame_allocated(FrameNumber::new(4096)));

        // The table's own sequence is unaffected.
        assert_eq!(
            unit.translate(va(0x3000)).frame_number(),
            FrameNumber::new(2)
        );
    }

    #[test]
    fn unit_over_flat_table() {
        let mut unit = TranslationUnit::with_table(FlatTable::with_size(2), MmuConfig::default());

        assert_eq!(unit.access(va(0x1000)).outcome, AccessOutcome::Fault);
        let outside = unit.access(va(0x5000));
        assert_eq!(outside.outcome, AccessOutcome::Fault);
        assert_eq!(outside.physical, PhysicalAddress::new(0));
        assert_eq!(unit.table().counters().faults, 2);
    }

    #[test]
    fn out_of_range_flat_page_is_cached_as_frame_zero() {
        let mut unit = TranslationUnit::with_table(FlatTable::with_size(2), MmuConfig::default());

        let first = unit.access(va(0x5123));
        assert_eq!(first.outcome, AccessOutcome::Fault);
        assert_eq!(first.physical, PhysicalAddress::new(0));

        let repeat = unit.access(va(0x5123));
        assert_eq!(repeat.outcome, AccessOutcome::TlbHit);
        assert_eq!(repeat.physical, PhysicalAddress::new(0x123));
        assert_eq!(repeat.cycles, 1);
        assert_eq!(unit.table().counters().accesses, 1);
    }

    #[test]
    fn costs_reflect_config() {
        let costs = CycleCosts {
            tlb_hit: 3,
            table_hit: 30,
            fault: 300,
        };
        let unit = TranslationUnit::with_config(MmuConfig {
            tlb_capacity: 4,
            costs,
        });
        assert_eq!(unit.costs(), costs);
        assert_eq!(TranslationUnit::new().costs(), CycleCosts::default());
        assert_eq!(unit.tlb().capacity(), 4);
    }
}
