//! Audit runs
//!
//! [`Auditor`] wires one reader through scoring, rating and detection into a
//! [`Report`]. It is an ordinary value owned by the caller; the only state it
//! keeps between runs is the last report, for comparison.

use tracing::info;

use crate::detect::Detector;
use crate::reader::SnapshotReader;
use crate::report::{Comparison, Report, ReportFormatter};
use crate::score::ScoreCalculator;
use crate::vitals;
use crate::{Result, Snapshot};

pub struct Auditor<R> {
    reader: R,
    calculator: ScoreCalculator,
    detector: Detector,
    previous: Option<Report>,
}

impl<R: SnapshotReader> Auditor<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            calculator: ScoreCalculator::default(),
            detector: Detector::default(),
            previous: None,
        }
    }

    pub fn with_calculator(mut self, calculator: ScoreCalculator) -> Self {
        self.calculator = calculator;
        self
    }

    pub fn with_detector(mut self, detector: Detector) -> Self {
        self.detector = detector;
        self
    }

    /// Seed the comparison baseline, e.g. with a report saved by an earlier process
    pub fn with_previous(mut self, report: Report) -> Self {
        self.previous = Some(report);
        self
    }

    pub fn previous(&self) -> Option<&Report> {
        self.previous.as_ref()
    }

    /// Read one snapshot and audit it
    pub async fn run(&mut self) -> Result<Report> {
        let snapshot = self.reader.read().await?;
        let report = audit_snapshot(&self.calculator, &self.detector, &snapshot);
        self.previous = Some(report.clone());
        Ok(report)
    }

    /// Run, then compare against the report this auditor held before
    pub async fn run_and_compare(&mut self) -> Result<(Report, Option<Comparison>)> {
        let baseline = self.previous.take();
        let report = self.run().await?;
        let comparison = baseline.as_ref().map(|prev| report.compare(prev));
        Ok((report, comparison))
    }
}

/// Audit an already collected snapshot
pub fn audit_snapshot(
    calculator: &ScoreCalculator,
    detector: &Detector,
    snapshot: &Snapshot,
) -> Report {
    let scores = calculator.score(snapshot);
    let ratings = vitals::rate_all(&snapshot.timings);
    let findings = detector.detect(snapshot);

    let report = ReportFormatter::from_snapshot(snapshot).format(scores, ratings, findings);
    info!(
        report = %report.id,
        url = %report.source.url,
        findings = report.findings.len(),
        "Audit complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::StaticSnapshotReader;
    use crate::score::Category;

    #[tokio::test]
    async fn test_run_keeps_previous_report() {
        let mut auditor = Auditor::new(StaticSnapshotReader::new(Snapshot::default()));
        assert!(auditor.previous().is_none());

        let first = auditor.run().await.unwrap();
        assert_eq!(auditor.previous().map(|r| r.id.as_str()), Some(first.id.as_str()));

        let (second, comparison) = auditor.run_and_compare().await.unwrap();
        let comparison = comparison.unwrap();
        assert_eq!(comparison.previous_id, first.id);
        assert_eq!(comparison.current_id, second.id);
        assert_eq!(
            comparison.delta(Category::Performance).unwrap().delta,
            0
        );
    }

    #[tokio::test]
    async fn test_first_comparison_is_empty() {
        let mut auditor = Auditor::new(StaticSnapshotReader::new(Snapshot::default()));
        let (_, comparison) = auditor.run_and_compare().await.unwrap();
        assert!(comparison.is_none());
    }
}
