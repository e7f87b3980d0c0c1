use crate::config::{ensure_parent_dir, log_path};
use anyhow::{Context, Result};
use simplelog::{Config, LevelFilter, WriteLogger};
use std::fs::File;
use std::path::PathBuf;

pub(crate) fn parse_level(value: &str) -> LevelFilter {
    match value.trim().to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

pub(crate) fn init(level: &str) -> Result<PathBuf> {
    let path = log_path()?;
    ensure_parent_dir(&path)?;
    let file = File::create(&path)
        .with_context(|| format!("failed to create log file: {}", path.display()))?;
    WriteLogger::init(parse_level(level), Config::default(), file)
        .context("failed to install logger")?;
    Ok(path)
}
