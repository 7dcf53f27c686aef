//! Timestamped stderr logger for the `log` facade. Library code only emits
//! records; binaries call `init` once.

use std::io::Write;

use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record};

pub const ENV_LOG: &str = "MODCDN_LOG";

struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        // stdout is reserved for command output.
        let _ = writeln!(
            std::io::stderr().lock(),
            "[{}] {:<5} {}",
            timestamp,
            record.level(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Parse a `MODCDN_LOG` value. `quiet` silences everything.
pub fn parse_level(value: &str) -> Option<LevelFilter> {
    match value.trim().to_ascii_lowercase().as_str() {
        "quiet" | "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

/// Level from `-v` count, falling back to `MODCDN_LOG`, then `warn`.
pub fn level_for(verbosity: u8, env_value: Option<&str>) -> LevelFilter {
    match verbosity {
        0 => env_value.and_then(parse_level).unwrap_or(LevelFilter::Warn),
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install the logger. A second call keeps the first logger and only
/// updates the max level.
pub fn init(level: LevelFilter) {
    let _ = log::set_boxed_logger(Box::new(StderrLogger { level }));
    log::set_max_level(level);
}
