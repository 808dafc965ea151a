mod console;
mod report;
mod trace;
mod workload;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mmu::{
    FlatTable, FrameNumber, HierarchicalTable, MemoryStats, MmuConfig, PageNumber,
    TranslationCache, TranslationUnit, VirtualAddress, decode, layout,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

use workload::Pattern;

/// Progress is logged every this many translations.
const PROGRESS_INTERVAL: usize = 10_000;

#[derive(Parser)]
#[command(name = "mmusim")]
#[command(about = "TLB and multi-level page table simulator")]
struct Args {
    /// Increase log output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Include source locations in log records
    #[arg(long, global = true)]
    detailed_logging: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show how virtual addresses split into table indices and offset
    Decode {
        /// Addresses to decode (hexadecimal with 0x prefix, or decimal)
        #[arg(required = true)]
        addresses: Vec<String>,
    },
    /// Walk the demo sequences through each table and the TLB
    Tables,
    /// Generate a workload and run it through a fresh MMU
    Run {
        #[arg(short, long, value_enum)]
        pattern: Pattern,

        #[command(flatten)]
        sim: SimOptions,

        /// Save the first addresses of the workload to a trace file
        #[arg(long)]
        save: Option<PathBuf>,

        /// Number of addresses to save
        #[arg(long, default_value_t = 1000)]
        save_count: usize,
    },
    /// Run an address trace file through a fresh MMU
    Replay {
        /// Trace file with one address per line
        trace: PathBuf,

        /// Maximum number of addresses to read
        #[arg(long, default_value_t = usize::MAX)]
        limit: usize,

        /// Number of TLB entries
        #[arg(long, default_value_t = layout::TLB_SIZE)]
        tlb_size: usize,
    },
    /// Run every access pattern on fresh MMUs and compare them
    Compare {
        #[command(flatten)]
        sim: SimOptions,
    },
}

#[derive(clap::Args)]
struct SimOptions {
    /// Number of accesses to generate
    #[arg(short, long, default_value_t = 50_000)]
    count: usize,

    /// Seed for the workload generator (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of TLB entries
    #[arg(long, default_value_t = layout::TLB_SIZE)]
    tlb_size: usize,
}

impl SimOptions {
    fn rng(&self) -> StdRng {
        let seed = self.seed.unwrap_or_else(rand::random);
        log::info!("Workload seed: {}", seed);
        StdRng::seed_from_u64(seed)
    }

    fn config(&self) -> Result<MmuConfig, Box<dyn std::error::Error>> {
        mmu_config(self.tlb_size)
    }
}

fn mmu_config(tlb_size: usize) -> Result<MmuConfig, Box<dyn std::error::Error>> {
    if tlb_size == 0 {
        return Err("TLB size must be at least 1".into());
    }
    Ok(MmuConfig {
        tlb_capacity: tlb_size,
        ..MmuConfig::default()
    })
}

/// Runs `addresses` through `unit` and computes the statistics for just this batch.
fn simulate(unit: &mut TranslationUnit, addresses: &[VirtualAddress]) -> MemoryStats {
    log::info!("Running simulation with {} memory accesses...", addresses.len());

    let before = unit.snapshot();
    for (i, &address) in addresses.iter().enumerate() {
        unit.translate(address);
        if i > 0 && i % PROGRESS_INTERVAL == 0 {
            log::debug!("Processed {} accesses...", i);
        }
    }

    MemoryStats::aggregate(addresses.len() as u64, before, unit.snapshot())
}

fn decode_addresses(addresses: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    for (i, text) in addresses.iter().enumerate() {
        let address = trace::parse_address(text)
            .map_err(|e| format!("invalid address {:?}: {}", text, e))?;
        println!("\nTest Address {}:", i + 1);
        println!("{}", decode(address));
    }
    Ok(())
}

fn tables() {
    println!("\n=== Simple Page Table Test ===");
    let mut flat = FlatTable::new();
    for raw in [0x0000_1000, 0x0000_2000, 0x0000_1000, 0x0000_3000] {
        let address = VirtualAddress::new(raw);
        let result = flat.translate(address);
        println!(
            "Virtual: {} -> Physical: {} {}",
            address,
            result.physical,
            if result.fault { "(Page Fault)" } else { "(Hit)" }
        );
    }
    println!("{}", report::table_counters("Simple Page Table", flat.counters()));

    println!("\n=== Two-Level Page Table Test ===");
    let mut hierarchical = HierarchicalTable::new();
    for raw in [0x0000_1000, 0x4000_2000, 0x0000_1000, 0x8000_3000, 0x4000_2000] {
        let address = VirtualAddress::new(raw);
        let result = hierarchical.translate(address);
        println!(
            "Virtual: {} -> Physical: {} {}",
            address,
            result.physical,
            if result.fault { "(Page Fault)" } else { "(Hit)" }
        );
    }
    println!(
        "{}",
        report::table_counters("Two-Level Page Table", hierarchical.counters())
    );
    println!("Second-level blocks allocated: {}", hierarchical.block_count());

    println!("\n=== TLB Test ===");
    let mut tlb = TranslationCache::default();
    for page in [0x123, 0x456, 0x789, 0x123, 0xABC, 0x456, 0xDEF, 0x123, 0x111] {
        let page = PageNumber::new(page);
        match tlb.lookup(page) {
            Some(frame) => println!("TLB Hit: VP {:#X} -> PF {:#X}", page.as_u32(), frame.as_u32()),
            None => {
                println!("TLB Miss: VP {:#X}", page.as_u32());
                tlb.insert(page, FrameNumber::new(0x100 + page.as_u32() % 256));
            }
        }
    }
    println!("{}", report::tlb_contents(&tlb));
}

fn run(
    pattern: Pattern,
    sim: SimOptions,
    save: Option<PathBuf>,
    save_count: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = sim.config()?;
    let addresses = workload::generate(pattern, sim.count, &mut sim.rng());

    let mut unit = TranslationUnit::with_config(config);
    let stats = simulate(&mut unit, &addresses);
    println!("{}", report::run_summary(pattern.title(), &stats));

    if let Some(path) = save {
        let count = save_count.min(addresses.len());
        trace::save(&path, &addresses[..count])?;
    }
    Ok(())
}

fn replay(path: PathBuf, limit: usize, tlb_size: usize) -> Result<(), Box<dyn std::error::Error>> {
    let config = mmu_config(tlb_size)?;
    let addresses = trace::load(&path, limit)?;

    let mut unit = TranslationUnit::with_config(config);
    let stats = simulate(&mut unit, &addresses);
    println!("{}", report::run_summary(&path.display().to_string(), &stats));
    Ok(())
}

fn compare(sim: SimOptions) -> Result<(), Box<dyn std::error::Error>> {
    let config = sim.config()?;
    let mut rng = sim.rng();

    let mut rows = Vec::new();
    for pattern in Pattern::ALL {
        let addresses = workload::generate(pattern, sim.count, &mut rng);
        let mut unit = TranslationUnit::with_config(config);
        let stats = simulate(&mut unit, &addresses);
        println!("{}", report::run_summary(pattern.title(), &stats));
        rows.push((pattern.title(), stats));
    }

    println!("{}", report::comparison(&rows));
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    console::Console::init(
        console::level_for_verbosity(args.verbose),
        args.detailed_logging,
    )?;

    match args.command {
        Command::Decode { addresses } => decode_addresses(addresses),
        Command::Tables => {
            tables();
            Ok(())
        }
        Command::Run {
            pattern,
            sim,
            save,
            save_count,
        } => run(pattern, sim, save, save_count),
        Command::Replay {
            trace,
            limit,
            tlb_size,
        } => replay(trace, limit, tlb_size),
        Command::Compare { sim } => compare(sim),
    }
}
