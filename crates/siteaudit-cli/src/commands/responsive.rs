use anyhow::{Context, Result};
use siteaudit_config::{Config, OutputFormat};
use siteaudit_core::render::render_responsive;
use siteaudit_core::{FileSnapshotReader, SnapshotReader, responsive};
use std::path::PathBuf;

use crate::cli::{FormatArg, resolve_format};

pub async fn handle(snapshot: PathBuf, format: Option<FormatArg>, config: &Config) -> Result<()> {
    let snapshot = FileSnapshotReader::new(&snapshot)
        .read()
        .await
        .with_context(|| format!("Failed to read snapshot {}", snapshot.display()))?;

    let report = responsive::run(&snapshot);
    match resolve_format(format, config.output.format) {
        OutputFormat::Text => super::print_lines(&render_responsive(&report)),
        OutputFormat::Json => super::print_json(&report)?,
    }
    Ok(())
}
