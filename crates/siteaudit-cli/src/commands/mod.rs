pub mod audit;
pub mod compare;
pub mod compat;
pub mod config;
pub mod rate;
pub mod responsive;

use anyhow::{Context, Result};
use serde::Serialize;
use siteaudit_core::Report;
use std::path::Path;

/// Read a report saved by an earlier audit
pub fn read_report(path: &Path) -> Result<Report> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read report {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid report {}", path.display()))
}

pub fn write_report(path: &Path, report: &Report) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(report)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report {}", path.display()))
}

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
