//! Address trace files: one hexadecimal address per line.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::num::ParseIntError;
use std::path::Path;

use mmu::VirtualAddress;

/// Errors that can occur while reading a trace.
#[derive(Debug)]
pub enum TraceError {
    /// The trace could not be read or written.
    Io(io::Error),
    /// A line did not hold a valid 32-bit address.
    Parse { line: usize, text: String },
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "trace I/O failed: {}", err),
            Self::Parse { line, text } => {
                write!(f, "line {}: {:?} is not a 32-bit address", line, text)
            }
        }
    }
}

impl std::error::Error for TraceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse { .. } => None,
        }
    }
}

impl From<io::Error> for TraceError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Parses an address given as `0x`-prefixed hexadecimal or as decimal.
pub fn parse_address(text: &str) -> Result<VirtualAddress, ParseIntError> {
    let text = text.trim();
    let raw = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16)?,
        None => text.parse::<u32>()?,
    };
    Ok(VirtualAddress::new(raw))
}

/// Writes addresses in trace format.
pub fn write_trace(mut writer: impl Write, addresses: &[VirtualAddress]) -> io::Result<()> {
    for address in addresses {
        writeln!(writer, "{:#010X}", address.as_u32())?;
    }
    writer.flush()
}

/// Reads up to `limit` addresses from a trace. Blank lines are skipped.
pub fn read_trace(reader: impl BufRead, limit: usize) -> Result<Vec<VirtualAddress>, TraceError> {
    let mut addresses = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        if addresses.len() >= limit {
            break;
        }

        let line = line?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        let address = parse_address(text).map_err(|_| TraceError::Parse {
            line: index + 1,
            text: text.to_string(),
        })?;
        addresses.push(address);
    }

    Ok(addresses)
}

/// Saves addresses to a trace file, replacing it if it exists.
pub fn save(path: &Path, addresses: &[VirtualAddress]) -> Result<(), TraceError> {
    let file = File::create(path)?;
    write_trace(BufWriter::new(file), addresses)?;
    log::info!("Saved {} addresses to {}", addresses.len(), path.display());
    Ok(())
}

/// Loads up to `limit` addresses from a trace file.
pub fn load(path: &Path, limit: usize) -> Result<Vec<VirtualAddress>, TraceError> {
    let file = File::open(path)?;
    let addresses = read_trace(BufReader::new(file), limit)?;
    log::info!("Loaded {} addresses from {}", addresses.len(), path.display());
    Ok(addresses)
}
