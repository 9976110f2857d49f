use anyhow::Result;
use siteaudit_config::Config;
use std::path::Path;

pub fn handle(path: &Path, config: &Config) -> Result<()> {
    println!("Config: {}", path.display());
    println!("History: {}", config.history.report_path().display());
    println!();
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
