#![cfg_attr(not(test), no_std)]

//! # MMU translation engine
//!
//! A deterministic model of the address-translation path of a memory-management unit,
//! used to study hit rates, fault rates and cycle cost under different access patterns.
//! It provides:
//!
//! - Bitfield decoding of 32-bit virtual addresses.
//! - A small fully-associative translation cache (TLB) with round-robin replacement.
//! - A two-level page table with lazily allocated second-level blocks, and a flat
//!   single-level table as a baseline.
//! - A translation unit that sequences cache lookup, table walk and cycle accounting.
//! - Aggregation of counter snapshots into hit-rate and average-cost metrics.
//!
//! Faults in this model are not errors: they are the expected outcome of a miss that
//! requires on-demand population, and every operation in this crate is total.

extern crate alloc;

mod address;
mod entry;
mod flat_table;
mod frame;
mod numbers;
mod page_directory;
mod stats;
mod tlb;
mod unit;

pub mod layout;

pub use address::{DecodedAddress, PhysicalAddress, VirtualAddress, decode};
pub use entry::{PageEntry, PageFlags};
pub use flat_table::FlatTable;
pub use frame::FrameAllocator;
pub use numbers::{FrameNumber, PageNumber};
pub use page_directory::{HierarchicalTable, PageBlock};
pub use stats::{CacheCounters, MemoryStats, Snapshot, TableCounters};
pub use tlb::{CacheEntry, TranslationCache};
pub use unit::{Access, AccessOutcome, CycleCosts, MmuConfig, TranslationUnit};

/// The result of translating one address through a page table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translation {
    /// The resolved physical address.
    pub physical: PhysicalAddress,
    /// Whether the walk had to populate the entry on demand.
    pub fault: bool,
}

/// A page table that can resolve virtual addresses on its own.
///
/// Implementations populate missing entries on demand, so `translate` never fails; a
/// miss is reported through [`Translation::fault`].
pub trait PageTable {
    /// Translates a virtual address, allocating a frame for it if it is not yet mapped.
    fn translate(&mut self, addr: VirtualAddress) -> Translation;

    /// Returns the access counters accumulated by this table.
    fn counters(&self) -> TableCounters;
}
