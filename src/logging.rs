// src/logging.rs
//! Process-wide logging, installed once by the binary.
//!
//! The library only ever logs through the `log` facade; nothing here runs
//! unless a caller asks for it.

use crate::constants::DEFAULT_LOG_FILE;
use anyhow::Context;
use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    Config,
};
use std::path::PathBuf;

const LOG_PATTERN: &str = "{d(%y:%m:%d %H:%M:%S)} - plsdb - {l} - {m}{n}";

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub level: LevelFilter,
    pub file: PathBuf,
}

impl LoggingConfig {
    pub fn new(verbose: bool, file: Option<PathBuf>) -> Self {
        Self {
            level: if verbose {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            },
            file: file.unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new(false, None)
    }
}

/// Builds the log4rs configuration: console (stderr) plus an append-mode file.
pub fn build_config(config: &LoggingConfig) -> anyhow::Result<Config> {
    if let Some(parent) = config.file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }

    // stdout carries the TSV output, so the console echo goes to stderr
    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build();

    let file = FileAppender::builder()
        .append(true)
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build(&config.file)
        .with_context(|| format!("opening log file {}", config.file.display()))?;

    let config = Config::builder()
        .appender(Appender::builder().build("console", Box::new(console)))
        .appender(Appender::builder().build("file", Box::new(file)))
        .build(
            Root::builder()
                .appender("console")
                .appender("file")
                .build(config.level),
        )
        .context("building logging configuration")?;
    Ok(config)
}

/// Installs the process-wide logger. Call once, at start-up.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let log4rs_config = build_config(config)?;
    log4rs::init_config(log4rs_config).context("installing logger")?;
    log::debug!("logging to {}", config.file.display());
    Ok(())
}
