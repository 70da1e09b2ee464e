//! Line-oriented console logger.

use std::io::{self, Write};

use chrono::Local;
use colored::Colorize;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

struct Console {
    color: bool,
}

pub fn init(level: LevelFilter, color: bool) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(Console { color }))?;
    log::set_max_level(level);
    Ok(())
}

impl Log for Console {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let timestamp = Local::now().format("%H:%M:%S%.3f");
        let label = format!("{:<5}", record.level());
        let label = if self.color {
            match record.level() {
                Level::Error => label.red().bold().to_string(),
                Level::Warn => label.yellow().to_string(),
                Level::Info => label.green().to_string(),
                Level::Debug => label.blue().to_string(),
                Level::Trace => label.dimmed().to_string(),
            }
        } else {
            label
        };

        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{timestamp} {label} {}", record.args());
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
    }
}
