use std::str::FromStr;

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Environment variable selecting the maximum log level.
pub const LOG_ENV: &str = "SPACECRAFT_LOG";

// ---------------------------------------------------------------------------
// Coloured stderr backend for the `log` facade
// ---------------------------------------------------------------------------

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

fn tag(level: Level) -> &'static str {
    match level {
        Level::Error => "\x1b[31m[ERROR]",
        Level::Warn => "\x1b[35m[WARN] ",
        Level::Info => "\x1b[32m[INFO] ",
        Level::Debug => "\x1b[36m[DEBUG]",
        Level::Trace => "\x1b[34m[TRACE]",
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        eprintln!(
            "{}[{}]\x1b[0m {}",
            tag(record.level()),
            chrono::Utc::now().format("%H:%M:%S%.3f"),
            record.args()
        );
    }

    fn flush(&self) {}
}

/// Level named by `SPACECRAFT_LOG`, `info` when unset or unparseable.
pub fn level_from_env() -> LevelFilter {
    std::env::var(LOG_ENV)
        .ok()
        .and_then(|v| LevelFilter::from_str(v.trim()).ok())
        .unwrap_or(LevelFilter::Info)
}

/// Install the console logger. Fails if another logger is already set.
pub fn init() -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level_from_env());
    Ok(())
}
