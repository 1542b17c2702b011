use std::env;
use std::io::Write;

use log::{self, LevelFilter, Metadata, Record};

/// Environment variable holding the log level (`error` .. `trace`).
pub const LOG_ENV: &str = "BATTLESHIP_LOG";

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let target = record.target().rsplit("::").next().unwrap_or_default();
            let _ = writeln!(
                std::io::stderr().lock(),
                "{:<5} [{}] {}",
                record.level(),
                target,
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: StderrLogger = StderrLogger;

fn level_from(value: Option<&str>, fallback: LevelFilter) -> LevelFilter {
    value.and_then(|lvl| lvl.parse().ok()).unwrap_or(fallback)
}

/// Initialize logging with a level taken from `BATTLESHIP_LOG`, falling back
/// to `fallback` when the variable is unset or not a level name. Calling it
/// twice is harmless.
pub fn init_logging(fallback: LevelFilter) {
    let level = level_from(env::var(LOG_ENV).ok().as_deref(), fallback);
    let _ = log::set_logger(&LOGGER).map(|()| log::set_max_level(level));
}
