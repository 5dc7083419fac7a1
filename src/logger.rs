use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use log::{LevelFilter, Log, Metadata, Record};
use once_cell::sync::OnceCell;

use crate::config::FsConfig;

static LOGGER: OnceCell<Logger> = OnceCell::new();

/// Writes every record to both a log file and the terminal.
#[derive(Clone, Debug)]
pub struct Logger {
    file: Arc<Mutex<File>>,
    terminal: Arc<Mutex<io::Stdout>>,
    level: LevelFilter,
}

impl Logger {
    pub fn new<P: AsRef<Path>>(file_path: P, level: LevelFilter) -> io::Result<Self> {
        let file = File::create(file_path)?;
        let terminal = io::stdout();
        Ok(Logger {
            file: Arc::new(Mutex::new(file)),
            terminal: Arc::new(Mutex::new(terminal)),
            level,
        })
    }

    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        let mut terminal = self.terminal.lock().unwrap_or_else(PoisonError::into_inner);

        file.write_all(line.as_bytes())?;
        terminal.write_all(line.as_bytes())?;
        Ok(())
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!("[{}][{}] {}\n", record.level(), record.target(), record.args());
        // a logger has nowhere to report its own failure
        let _ = self.write_line(&line);
    }

    fn flush(&self) {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        let mut terminal = self.terminal.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = file.flush();
        let _ = terminal.flush();
    }
}

/// Installs the tee logger as the global `log` backend. Only the first call succeeds.
pub fn init_logger(config: &FsConfig) -> Result<()> {
    if LOGGER.get().is_some() {
        anyhow::bail!("Logger already installed");
    }
    let level = config.level_filter();
    let logger = Logger::new(&config.log_path, level)
        .with_context(|| format!("Failed to create log file {:?}", config.log_path))?;

    if LOGGER.set(logger).is_err() {
        anyhow::bail!("Logger already installed");
    }
    let installed = LOGGER.get().context("Logger vanished after installation")?;
    log::set_logger(installed).map_err(|e| anyhow::anyhow!("Failed to install logger: {}", e))?;
    log::set_max_level(level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_writes_file() {
        let path = std::env::temp_dir().join(format!("userfs-logger-{}.log", std::process::id()));
        let logger = Logger::new(&path, LevelFilter::Debug).unwrap();
        logger.log(
            &Record::builder()
                .args(format_args!("hello from fd {}", 3))
                .level(log::Level::Debug)
                .target("userfs")
                .build(),
        );
        logger.log(
            &Record::builder()
                .args(format_args!("filtered"))
                .level(log::Level::Trace)
                .target("userfs")
                .build(),
        );
        logger.flush();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "[DEBUG][userfs] hello from fd 3\n");
        std::fs::remove_file(&path).unwrap();
    }
}
