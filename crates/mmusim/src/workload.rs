//! Synthetic access patterns.

use clap::ValueEnum;
use mmu::VirtualAddress;
use rand::Rng;

/// Size of the virtual address space in bytes.
const ADDRESS_SPACE: u64 = 1 << 32;

/// Byte stride between consecutive sequential accesses.
const SEQUENTIAL_STRIDE: u64 = 4;

/// Percentage of locality accesses that land in the hot region.
const HOT_PERCENT: u32 = 80;

/// An access pattern a workload can follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Pattern {
    /// Uniformly random addresses over the whole space.
    Random,
    /// Word-by-word accesses from a random base.
    Sequential,
    /// 80% of accesses in a hot region of 1/20th of the space, 20% anywhere.
    Locality,
}

impl Pattern {
    pub const ALL: [Pattern; 3] = [Pattern::Random, Pattern::Sequential, Pattern::Locality];

    /// Returns a human-readable name for reports.
    pub fn title(self) -> &'static str {
        match self {
            Pattern::Random => "Random Access",
            Pattern::Sequential => "Sequential Access",
            Pattern::Locality => "Locality of Reference",
        }
    }
}

/// Generates `count` addresses following `pattern`.
pub fn generate(pattern: Pattern, count: usize, rng: &mut impl Rng) -> Vec<VirtualAddress> {
    match pattern {
        Pattern::Random => (0..count)
            .map(|_| VirtualAddress::new(rng.r#gen::<u32>()))
            .collect(),

        Pattern::Sequential => {
            let span = (count as u64).saturating_mul(SEQUENTIAL_STRIDE);
            let base = rng.gen_range(0..ADDRESS_SPACE.saturating_sub(span).max(1));
            log::info!(
                "Generated {} sequential addresses starting from {:#010X}",
                count,
                base
            );
            (0..count as u64)
                .map(|i| VirtualAddress::new((base + i * SEQUENTIAL_STRIDE) as u32))
                .collect()
        }

        Pattern::Locality => {
            let hot_start = rng.gen_range(0..ADDRESS_SPACE / 4);
            let hot_size = ADDRESS_SPACE / 20;
            log::info!(
                "Generated {} addresses with locality (hot region: {:#010X}-{:#010X})",
                count,
                hot_start,
                hot_start + hot_size
            );
            (0..count)
                .map(|_| {
                    if rng.gen_range(0..100) < HOT_PERCENT {
                        VirtualAddress::new((hot_start + rng.gen_range(0..hot_size)) as u32)
                    } else {
                        VirtualAddress::new(rng.r#gen::<u32>())
                    }
                })
                .collect()
        }
    }
}
