use anyhow::{Context, Result};
use serde::Serialize;
use siteaudit_config::{Config, OutputFormat};
use siteaudit_core::render::{render_comparison, render_report};
use siteaudit_core::{
    Auditor, Comparison, FileSnapshotReader, GatedSnapshotReader, Report, SnapshotReader,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::cli::{AuditArgs, resolve_format};

const LOAD_POLL_INTERVAL: Duration = Duration::from_millis(200);
const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct AuditOutput<'a> {
    report: &'a Report,
    #[serde(skip_serializing_if = "Option::is_none")]
    comparison: Option<&'a Comparison>,
}

pub async fn handle(args: AuditArgs, config: &Config) -> Result<()> {
    let format = resolve_format(args.format, config.output.format);
    let history = config.history.enabled.then(|| config.history.report_path());

    let baseline = match (&args.compare, &history) {
        (Some(path), _) => Some(super::read_report(path)?),
        (None, Some(path)) => load_last_report(path),
        (None, None) => None,
    };

    let reader = FileSnapshotReader::new(&args.snapshot);
    let outcome = if args.wait_for_load || config.audit.wait_for_load {
        let (gated, loaded) = GatedSnapshotReader::new(reader);
        tokio::spawn(signal_when_written(args.snapshot.clone(), loaded));
        run(Auditor::new(gated), baseline).await
    } else {
        run(Auditor::new(reader), baseline).await
    };
    let (report, comparison) =
        outcome.with_context(|| format!("Failed to audit {}", args.snapshot.display()))?;

    match format {
        OutputFormat::Text => {
            super::print_lines(&render_report(&report));
            if let Some(comparison) = &comparison {
                println!();
                super::print_lines(&render_comparison(comparison));
            }
        }
        OutputFormat::Json => super::print_json(&AuditOutput {
            report: &report,
            comparison: comparison.as_ref(),
        })?,
    }

    if let Some(path) = &args.save {
        super::write_report(path, &report)?;
        if format == OutputFormat::Text {
            println!("\n✓ Saved report: {}", path.display());
        }
    }
    if let Some(path) = &history {
        super::write_report(path, &report)?;
        debug!(path = %path.display(), "Updated last report");
    }

    Ok(())
}

async fn run<R: SnapshotReader>(
    auditor: Auditor<R>,
    baseline: Option<Report>,
) -> Result<(Report, Option<Comparison>)> {
    let mut auditor = match baseline {
        Some(report) => auditor.with_previous(report),
        None => auditor,
    };
    Ok(auditor.run_and_compare().await?)
}

/// A missing or unreadable history file just means there is nothing to compare
fn load_last_report(path: &Path) -> Option<Report> {
    if !path.exists() {
        return None;
    }
    match super::read_report(path) {
        Ok(report) => Some(report),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Ignoring unreadable last report");
            None
        }
    }
}

/// Fire the load signal once the snapshot file exists
///
/// The CLI has no page to observe, so "loaded" means the exporter has put the
/// snapshot file in place. Polling is confined to this command; the core gate
/// only ever waits on the one-shot signal.
async fn signal_when_written(path: PathBuf, loaded: oneshot::Sender<()>) {
    let wait = async {
        while !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tokio::time::sleep(LOAD_POLL_INTERVAL).await;
        }
    };

    info!(path = %path.display(), "Waiting for snapshot");
    if tokio::time::timeout(LOAD_TIMEOUT, wait).await.is_ok() {
        let _ = loaded.send(());
    }
    // on timeout the sender drops and the reader goes ahead on its own
}

#[cfg(test)]
mod tests {
    use super::*;
    use siteaudit_core::Category;

    fn write_snapshot(path: &Path, https: bool) {
        let protocol = if https { "https:" } else { "http:" };
        let json = format!(
            r#"{{
                "location": {{ "href": "{}//portfolio.example/", "protocol": "{}", "hostname": "portfolio.example" }},
                "has_viewport_meta": true,
                "headings": [1, 2]
            }}"#,
            protocol, protocol
        );
        std::fs::write(path, json).unwrap();
    }

    fn config_in(dir: &Path) -> Config {
        let mut config = Config::default();
        config.history.path = Some(dir.join("history").join("last.json"));
        config.output.format = OutputFormat::Json;
        config
    }

    fn args(snapshot: PathBuf) -> AuditArgs {
        AuditArgs {
            snapshot,
            format: None,
            compare: None,
            save: None,
            wait_for_load: false,
        }
    }

    #[tokio::test]
    async fn test_audit_saves_history_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = dir.path().join("snapshot.json");
        write_snapshot(&snapshot, false);
        let config = config_in(dir.path());

        let saved = dir.path().join("out").join("report.json");
        let mut first = args(snapshot.clone());
        first.save = Some(saved.clone());
        handle(first, &config).await.unwrap();

        let report = super::super::read_report(&saved).unwrap();
        let last = super::super::read_report(&config.history.report_path()).unwrap();
        assert_eq!(report.id, last.id);
        assert_eq!(report.score(Category::BestPractices), Some(80));
    }

    #[tokio::test]
    async fn test_audit_compares_with_last_report() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = dir.path().join("snapshot.json");
        let config = config_in(dir.path());

        write_snapshot(&snapshot, false);
        handle(args(snapshot.clone()), &config).await.unwrap();
        let before = super::super::read_report(&config.history.report_path()).unwrap();

        write_snapshot(&snapshot, true);
        let baseline = load_last_report(&config.history.report_path());
        let (after, comparison) = run(Auditor::new(FileSnapshotReader::new(&snapshot)), baseline)
            .await
            .unwrap();

        let comparison = comparison.unwrap();
        assert_eq!(comparison.previous_id, before.id);
        let delta = comparison.delta(Category::BestPractices).unwrap();
        assert_eq!(delta.delta, 20);
        assert_eq!(after.score(Category::BestPractices), Some(100));
    }

    #[tokio::test]
    async fn test_corrupt_history_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last.json");
        std::fs::write(&path, "not a report").unwrap();

        assert!(load_last_report(&path).is_none());
        assert!(load_last_report(&dir.path().join("missing.json")).is_none());
    }

    #[tokio::test]
    async fn test_wait_for_load_reads_late_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = dir.path().join("late.json");

        let (gated, loaded) = GatedSnapshotReader::new(FileSnapshotReader::new(&snapshot));
        tokio::spawn(signal_when_written(snapshot.clone(), loaded));
        let pending = tokio::spawn(run(Auditor::new(gated), None));

        tokio::time::sleep(Duration::from_millis(50)).await;
        let staging = dir.path().join("late.json.part");
        write_snapshot(&staging, true);
        std::fs::rename(&staging, &snapshot).unwrap();

        let (report, comparison) = pending.await.unwrap().unwrap();
        assert!(comparison.is_none());
        assert_eq!(report.source.url, "https://portfolio.example/");
    }
}
