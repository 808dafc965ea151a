//! Access counters and the metrics derived from them.
//!
//! Each translation structure owns its counters; they only ever increase, and are reset
//! by re-creating the owner. Metrics for a batch of accesses are computed from a pair of
//! [`Snapshot`]s taken before and after the batch.

use core::fmt;

/// Counters kept by a translation cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheCounters {
    pub accesses: u64,
    pub hits: u64,
    pub misses: u64,
}

impl CacheCounters {
    pub(crate) fn record_hit(&mut self) {
        self.accesses += 1;
        self.hits += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.accesses += 1;
        self.misses += 1;
    }

    /// Returns the hit rate as a percentage, or 0 if nothing was looked up.
    pub fn hit_rate(&self) -> f64 {
        percentage(self.hits, self.accesses)
    }
}

/// Counters kept by a page table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableCounters {
    pub accesses: u64,
    pub hits: u64,
    pub faults: u64,
}

impl TableCounters {
    pub(crate) fn record_hit(&mut self) {
        self.accesses += 1;
        self.hits += 1;
    }

    pub(crate) fn record_fault(&mut self) {
        self.accesses += 1;
        self.faults += 1;
    }

    /// Returns the hit rate as a percentage, or 0 if nothing was translated.
    pub fn hit_rate(&self) -> f64 {
        percentage(self.hits, self.accesses)
    }
}

/// The cumulative counters of a translation unit at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub tlb_hits: u64,
    pub page_faults: u64,
    pub cycles: u64,
}

/// Summary metrics for a batch of accesses.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MemoryStats {
    pub total_accesses: u64,
    pub tlb_hits: u64,
    pub tlb_misses: u64,
    pub page_hits: u64,
    pub page_faults: u64,
    pub total_cycles: u64,
    pub tlb_hit_rate: f64,
    pub page_hit_rate: f64,
    pub avg_access_time: f64,
}

impl MemoryStats {
    /// Computes the metrics for `accesses` translations performed between `before` and
    /// `after`.
    ///
    /// With zero accesses every rate is 0.
    pub fn aggregate(accesses: u64, before: Snapshot, after: Snapshot) -> Self {
        let tlb_hits = after.tlb_hits.saturating_sub(before.tlb_hits);
        let page_faults = after.page_faults.saturating_sub(before.page_faults);
        let total_cycles = after.cycles.saturating_sub(before.cycles);
        let page_hits = accesses.saturating_sub(page_faults);

        let avg_access_time = if accesses == 0 {
            0.0
        } else {
            total_cycles as f64 / accesses as f64
        };

        Self {
            total_accesses: accesses,
            tlb_hits,
            tlb_misses: accesses.saturating_sub(tlb_hits),
            page_hits,
            page_faults,
            total_cycles,
            tlb_hit_rate: percentage(tlb_hits, accesses),
            page_hit_rate: percentage(page_hits, accesses),
            avg_access_time,
        }
    }
}

impl fmt::Display for MemoryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Memory Accesses: {}", self.total_accesses)?;
        writeln!(f, "TLB Hits: {} ({:.2}%)", self.tlb_hits, self.tlb_hit_rate)?;
        writeln!(
            f,
            "TLB Misses: {} ({:.2}%)",
            self.tlb_misses,
            miss_rate(self.tlb_hit_rate, self.total_accesses)
        )?;
        writeln!(f, "Page Hits: {} ({:.2}%)", self.page_hits, self.page_hit_rate)?;
        writeln!(
            f,
            "Page Faults: {} ({:.2}%)",
            self.page_faults,
            miss_rate(self.page_hit_rate, self.total_accesses)
        )?;
        writeln!(f, "Total Cycles: {}", self.total_cycles)?;
        write!(f, "Average Access Time: {:.2} cycles", self.avg_access_time)
    }
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn miss_rate(hit_rate: f64, accesses: u64) -> f64 {
    if accesses == 0 { 0.0 } else { 100.0 - hit_rate }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_accesses_yield_zero_rates() {
        let stats = MemoryStats::aggregate(0, Snapshot::default(), Snapshot::default());
        assert_eq!(stats.tlb_hit_rate, 0.0);
        assert_eq!(stats.page_hit_rate, 0.0);
        assert_eq!(stats.avg_access_time, 0.0);
        assert_eq!(stats.tlb_misses, 0);
    }

    #[test]
    fn aggregate_uses_deltas() {
        let before = Snapshot {
            tlb_hits: 10,
            page_faults: 5,
            cycles: 5_000,
        };
        let after = Snapshot {
            tlb_hits: 16,
            page_faults: 7,
            cycles: 7_026,
        };
        let stats = MemoryStats::aggregate(10, before, after);

        assert_eq!(stats.tlb_hits, 6);
        assert_eq!(stats.tlb_misses, 4);
        assert_eq!(stats.page_faults, 2);
        assert_eq!(stats.page_hits, 8);
        assert_eq!(stats.total_cycles, 2_026);
        assert_eq!(stats.tlb_hit_rate, 60.0);
        assert_eq!(stats.page_hit_rate, 80.0);
        assert!((stats.avg_access_time - 202.6).abs() < 1e-9);
    }

    #[test]
    fn counters_hit_rate() {
        let mut counters = CacheCounters::default();
        assert_eq!(counters.hit_rate(), 0.0);
        counters.record_hit();
        counters.record_miss();
        counters.record_miss();
        counters.record_hit();
        assert_eq!(counters.accesses, 4);
        assert_eq!(counters.hit_rate(), 50.0);
    }

    #[test]
    fn table_counters_track_branches() {
        let mut counters = TableCounters::default();
        counters.record_fault();
        counters.record_hit();
        assert_eq!(
            counters,
            TableCounters {
                accesses: 2,
                hits: 1,
                faults: 1,
            }
        );
    }

    #[test]
    fn display_summary() {
        let after = Snapshot {
            tlb_hits: 3,
            page_faults: 1,
            cycles: 1_003,
        };
        let text = format!("{}", MemoryStats::aggregate(4, Snapshot::default(), after));
        assert!(text.contains("Total Memory Accesses: 4"));
        assert!(text.contains("TLB Hits: 3 (75.00%)"));
        assert!(text.contains("TLB Misses: 1 (25.00%)"));
        assert!(text.contains("Page Faults: 1 (25.00%)"));
        assert!(text.ends_with("Average Access Time: 250.75 cycles"));
    }
}
