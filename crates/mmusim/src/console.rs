//! Defines the console logger that writes records to stderr.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use log::LevelFilter;
use spin::{Mutex, Once};

pub struct Console {
    detailed: AtomicBool,
    output: Mutex<io::Stderr>,
}

static DEFAULT: Once<Console> = Once::new();

impl Console {
    /// Installs the console as the global logger with the given maximum level.
    ///
    /// With `detailed` set, records include their source location and target.
    pub fn init(level: LevelFilter, detailed: bool) -> Result<&'static Self, log::SetLoggerError> {
        let console = Self::default();
        console.detailed.store(detailed, Ordering::SeqCst);
        console.install(level)?;
        Ok(console)
    }

    pub fn default() -> &'static Self {
        DEFAULT.call_once(|| Console {
            detailed: AtomicBool::new(false),
            output: Mutex::new(io::stderr()),
        })
    }

    fn install(&'static self, level: LevelFilter) -> Result<(), log::SetLoggerError> {
        log::set_logger(self)?;
        log::set_max_level(level);
        Ok(())
    }
}

impl log::Log for Console {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let detailed = self.detailed.load(Ordering::Relaxed);
        let mut output = self.output.lock();
        // Nowhere left to report a failed write to stderr.
        let _ = write_log_entry_to(&mut *output, record, detailed);
    }

    fn flush(&self) {
        let _ = self.output.lock().flush();
    }
}

fn write_log_entry_to(
    writer: &mut impl Write,
    record: &log::Record,
    detailed: bool,
) -> io::Result<()> {
    if detailed {
        writeln!(
            writer,
            "[{} {}:{} {}] {}",
            record.level(),
            record.file().unwrap_or("unknown"),
            record.line().unwrap_or(0),
            record.target(),
            record.args()
        )
    } else {
        writeln!(writer, "[{:5}] {}", record.level(), record.args())
    }
}

/// Maps the number of `-v` flags to a maximum log level.
pub fn level_for_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
