//! Fixed parameters of the simulated machine.
//!
//! The model uses a 32-bit virtual address space with 4 KiB pages:
//! - Bits 0-11: page offset
//! - Bits 12-21: level 2 index
//! - Bits 22-31: level 1 index
//!
//! The flat table indexes directly by bits 12-31 (the page number).

/// Page size in bytes (4 KiB = 2^12).
pub const PAGE_SIZE: usize = 4096;

/// Number of bits in the page offset.
pub const PAGE_OFFSET_BITS: u32 = 12;

/// Number of bits in a virtual page number.
pub const PAGE_NUMBER_BITS: u32 = 32 - PAGE_OFFSET_BITS;

/// Mask selecting the page offset.
pub const PAGE_OFFSET_MASK: u32 = (1 << PAGE_OFFSET_BITS) - 1;

/// Number of bits in the level 1 index.
pub const L1_BITS: u32 = 10;

/// Number of bits in the level 2 index.
pub const L2_BITS: u32 = 10;

/// Number of slots in the level 1 directory.
pub const L1_SIZE: usize = 1 << L1_BITS;

/// Number of entries in each level 2 block.
pub const L2_SIZE: usize = 1 << L2_BITS;

/// Number of physical frames backing the simulated memory.
pub const NUM_PHYSICAL_FRAMES: usize = 256;

/// Number of entries in a flat table spanning the whole page-number range.
pub const NUM_PAGES: usize = 1 << PAGE_NUMBER_BITS;

/// Default translation cache capacity.
pub const TLB_SIZE: usize = 8;

/// Cycles charged for a translation resolved by the cache.
pub const TLB_HIT_TIME: u64 = 1;

/// Cycles charged for a translation resolved by a page table walk.
pub const PAGE_TABLE_ACCESS_TIME: u64 = 10;

/// Cycles charged for a translation that had to populate its entry.
pub const PAGE_FAULT_TIME: u64 = 1000;
