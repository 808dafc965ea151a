//! Human-readable result tables.

use std::fmt::Write;

use mmu::{MemoryStats, TableCounters, TranslationCache};

/// Renders the summary block for one run.
pub fn run_summary(name: &str, stats: &MemoryStats) -> String {
    format!(
        "\n=== {} Results ===\n{}\n==============================",
        name, stats
    )
}

/// Renders the side-by-side comparison of several runs.
pub fn comparison(rows: &[(&str, MemoryStats)]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n=== Performance Comparison ===");
    let _ = writeln!(
        out,
        "{:<22}| TLB Hit Rate | Page Hit Rate | Avg Access Time",
        "Access Pattern"
    );
    let _ = writeln!(out, "{:-<22}|--------------|---------------|----------------", "");
    for (name, stats) in rows {
        let _ = writeln!(
            out,
            "{:<22}|   {:>7.2}%   |    {:>7.2}%   |   {:>10.2}",
            name, stats.tlb_hit_rate, stats.page_hit_rate, stats.avg_access_time
        );
    }
    out
}

/// Renders every slot of a translation cache.
pub fn tlb_contents(tlb: &TranslationCache) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nTLB Contents:");
    let _ = writeln!(out, "Index | Valid | Virtual Page | Physical Frame | Referenced");
    let _ = writeln!(out, "------|-------|--------------|----------------|-----------");
    for (index, slot) in tlb.entries().iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:2}  |   {}   |   {:#08X}   |     {:#06X}     |     {}",
            index,
            yes_no(slot.is_valid()),
            slot.virtual_page().as_u32(),
            slot.frame().as_u32(),
            yes_no(slot.is_referenced())
        );
    }
    let counters = tlb.counters();
    let _ = write!(
        out,
        "Accesses: {}, Hits: {}, Misses: {}\nHit Rate: {:.2}%",
        counters.accesses,
        counters.hits,
        counters.misses,
        counters.hit_rate()
    );
    out
}

/// Renders the counters of a page table.
pub fn table_counters(name: &str, counters: TableCounters) -> String {
    format!(
        "\n{} Stats:\nAccesses: {}, Hits: {}, Faults: {}\nHit Rate: {:.2}%",
        name,
        counters.accesses,
        counters.hits,
        counters.faults,
        counters.hit_rate()
    )
}

fn yes_no(flag: bool) -> char {
    if flag { 'Y' } else { 'N' }
}
