//! The translation cache (TLB).
//!
//! A small fully-associative cache of recent page-to-frame mappings. Lookups scan every
//! slot; with only a handful of entries this is cheaper than maintaining an index.
//! Replacement is round-robin: a cyclic cursor picks the slot to overwrite, whatever the
//! referenced or dirty state of the entry currently in it.

use alloc::vec::Vec;

use crate::stats::CacheCounters;
use crate::{FrameNumber, PageEntry, PageNumber};

/// One slot of the translation cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheEntry {
    /// The virtual page this slot maps.
    virtual_page: PageNumber,
    /// The mapping itself, with the same flags a page table entry carries.
    entry: PageEntry,
}

impl CacheEntry {
    /// Returns the tag of this slot.
    pub const fn virtual_page(&self) -> PageNumber {
        self.virtual_page
    }

    /// Returns the cached frame, whether or not the slot is valid.
    pub const fn frame(&self) -> FrameNumber {
        self.entry.frame()
    }

    /// Returns whether this slot holds a live mapping.
    pub const fn is_valid(&self) -> bool {
        self.entry.is_valid()
    }

    /// Returns whether this slot has been used since it was filled.
    pub const fn is_referenced(&self) -> bool {
        self.entry.flags().is_referenced()
    }

    /// Returns whether this slot is dirty. Nothing in the model writes through the cache,
    /// so this stays false.
    pub const fn is_dirty(&self) -> bool {
        self.entry.flags().is_dirty()
    }
}

/// A fully-associative translation cache with round-robin replacement.
pub struct TranslationCache {
    entries: Vec<CacheEntry>,
    /// Slot overwritten by the next insert.
    next_replace: usize,
    counters: CacheCounters,
}

impl TranslationCache {
    /// Creates an empty cache with `capacity` slots.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "translation cache needs at least one entry");
        log::debug!("TLB initialized with {} entries", capacity);

        Self {
            entries: alloc::vec![CacheEntry::default(); capacity],
            next_replace: 0,
            counters: CacheCounters::default(),
        }
    }

    /// Looks up the frame cached for `virtual_page`.
    ///
    /// A hit marks the slot as referenced.
    pub fn lookup(&mut self, virtual_page: PageNumber) -> Option<FrameNumber> {
        let slot = self
            .entries
            .iter_mut()
            .find(|slot| slot.is_valid() && slot.virtual_page == virtual_page);

        match slot {
            Some(slot) => {
                self.counters.record_hit();
                slot.entry.touch();
                Some(slot.frame())
            }
            None => {
                self.counters.record_miss();
                None
            }
        }
    }

    /// Caches the mapping `virtual_page -> frame` in the slot under the replacement
    /// cursor, evicting whatever was there, and advances the cursor.
    pub fn insert(&mut self, virtual_page: PageNumber, frame: FrameNumber) {
        let slot = &mut self.entries[self.next_replace];
        if slot.is_valid() {
            log::trace!(
                "TLB slot {} evicts page {:#x}",
                self.next_replace,
                slot.virtual_page.as_u32()
            );
        }

        *slot = CacheEntry {
            virtual_page,
            entry: PageEntry::populated(frame),
        };
        self.next_replace = (self.next_replace + 1) % self.entries.len();
    }

    /// Invalidates every slot. Tags, counters and the replacement cursor are kept.
    pub fn invalidate_all(&mut self) {
        for slot in &mut self.entries {
            slot.entry.invalidate();
        }
        log::debug!("TLB invalidated");
    }

    /// Returns the slots in index order.
    pub fn entries(&self) -> &[CacheEntry] {
        &self.entries
    }

    /// Returns the number of slots.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Returns the lookup counters.
    pub fn counters(&self) -> CacheCounters {
        self.counters
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(crate::layout::TLB_SIZE)
    }
}
