use anyhow::Result;
use siteaudit_config::{Config, OutputFormat};
use siteaudit_core::compare;
use siteaudit_core::render::render_comparison;
use std::path::PathBuf;

use crate::cli::{FormatArg, resolve_format};

pub fn handle(
    current: PathBuf,
    previous: PathBuf,
    format: Option<FormatArg>,
    config: &Config,
) -> Result<()> {
    let current = super::read_report(&current)?;
    let previous = super::read_report(&previous)?;
    let comparison = compare(&current, &previous);

    match resolve_format(format, config.output.format) {
        OutputFormat::Text => super::print_lines(&render_comparison(&comparison)),
        OutputFormat::Json => super::print_json(&comparison)?,
    }
    Ok(())
}
