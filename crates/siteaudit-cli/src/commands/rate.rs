use anyhow::Result;
use siteaudit_core::Metric;
use siteaudit_core::render::render_rating;

pub fn handle(metric: Metric, value: f64) -> Result<()> {
    if !value.is_finite() {
        anyhow::bail!("{} value must be a finite number", metric);
    }
    if value < 0.0 {
        anyhow::bail!("{} value cannot be negative: {}", metric, value);
    }
    println!("{}", render_rating(metric, value));
    Ok(())
}
