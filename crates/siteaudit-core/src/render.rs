//! Human-readable rendering
//!
//! Renders reports as ordered text lines. The output is deterministic for a
//! given report, so callers can snapshot or diff it.

use time::format_description::well_known::Rfc3339;

use crate::compat::{CheckStatus, CompatCheck, CompatReport, DeviceCategory};
use crate::detect::Severity;
use crate::report::{Comparison, Recommendation, Report, Trend};
use crate::responsive::ResponsiveReport;
use crate::score::{Category, ScoreStatus};
use crate::snapshot::{Metric, Unit, Viewport};
use crate::vitals::{self, CORE_VITALS};

const OTHER_METRICS: [Metric; 5] = [
    Metric::Inp,
    Metric::Fcp,
    Metric::Ttfb,
    Metric::SpeedIndex,
    Metric::TimeToInteractive,
];

fn status_icon(status: ScoreStatus) -> &'static str {
    match status {
        ScoreStatus::Good => "✓",
        ScoreStatus::NeedsImprovement => "!",
        ScoreStatus::Poor => "✗",
    }
}

fn severity_icon(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "✗",
        Severity::Warning => "!",
        Severity::Info => "i",
    }
}

fn trend_icon(trend: Trend) -> &'static str {
    match trend {
        Trend::Improved => "↑",
        Trend::Declined => "↓",
        Trend::Unchanged => "→",
    }
}

/// `2100ms` for timings, `0.050` for layout shift
pub fn format_metric(metric: Metric, value: f64) -> String {
    match metric.unit() {
        Unit::Milliseconds => format!("{:.0}ms", value),
        Unit::Unitless => format!("{:.3}", value),
    }
}

fn metric_line(report: &Report, metric: Metric) -> Option<String> {
    let value = report.metrics.get(&metric)?;
    let mut line = format!("  {}: {}", metric, format_metric(metric, *value));
    if let Some(rating) = report.vitals.get(&metric) {
        line.push_str(&format!(" ({})", rating));
    }
    Some(line)
}

fn push_recommendations(lines: &mut Vec<String>, recs: &[Recommendation], numbered: bool) {
    for (i, rec) in recs.iter().enumerate() {
        if numbered {
            lines.push(format!("  {}. {}", i + 1, rec.title));
        } else {
            lines.push(format!("  • {}", rec.title));
        }
        for action in &rec.actions {
            lines.push(format!("     - {}", action));
        }
    }
}

pub fn render_report(report: &Report) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Site audit results".to_string());
    lines.push("==================".to_string());
    if !report.source.url.is_empty() {
        lines.push(format!("URL: {}", report.source.url));
    }
    lines.push(format!("Device: {}", report.source.device));
    let timestamp = report
        .timestamp
        .format(&Rfc3339)
        .unwrap_or_else(|_| report.timestamp.to_string());
    lines.push(format!("Timestamp: {}", timestamp));

    lines.push(String::new());
    lines.push("Scores:".to_string());
    for category in Category::ALL {
        if let Some(score) = report.scores.get(&category) {
            let status = score.status();
            lines.push(format!(
                "  {} {}: {}/100 ({})",
                status_icon(status),
                category.label(),
                score.score,
                status.label()
            ));
        }
    }

    lines.push(String::new());
    lines.push("Core Web Vitals:".to_string());
    let core: Vec<String> = CORE_VITALS
        .iter()
        .filter_map(|m| metric_line(report, *m))
        .collect();
    if core.is_empty() {
        lines.push("  Not observed".to_string());
    }
    lines.extend(core);

    let other: Vec<String> = OTHER_METRICS
        .iter()
        .filter_map(|m| metric_line(report, *m))
        .collect();
    if !other.is_empty() {
        lines.push(String::new());
        lines.push("Other Metrics:".to_string());
        lines.extend(other);
    }

    lines.push(String::new());
    lines.push("Opportunities:".to_string());
    let mut any = false;
    for (i, finding) in report.opportunities().enumerate() {
        any = true;
        lines.push(format!("  {}. {}", i + 1, finding.title));
        lines.push(format!("     {}", finding.description));
        if let Some(savings) = finding.savings() {
            lines.push(format!("     Potential savings: {}", savings));
        }
    }
    if !any {
        lines.push("  No major optimization opportunities found".to_string());
    }

    lines.push(String::new());
    lines.push("Diagnostics:".to_string());
    let mut any = false;
    for finding in report.diagnostics() {
        any = true;
        let icon = finding.severity().map_or("!", severity_icon);
        lines.push(format!("  {} {}", icon, finding.title));
        lines.push(format!("     {}", finding.description));
    }
    if !any {
        lines.push("  No diagnostic issues found".to_string());
    }

    lines.push(String::new());
    lines.push("Priority recommendations:".to_string());
    if report.recommendations.is_empty() {
        lines.push("  All categories meet their targets".to_string());
    }
    push_recommendations(&mut lines, &report.recommendations, true);

    if let Some(assessment) = report.assessment {
        lines.push(String::new());
        lines.push(format!("Overall assessment: {}", assessment.message()));
    }

    if !report.vitals_advice.is_empty() {
        lines.push(String::new());
        lines.push("Performance recommendations:".to_string());
        push_recommendations(&mut lines, &report.vitals_advice, false);
    }

    lines
}

pub fn render_comparison(comparison: &Comparison) -> Vec<String> {
    let mut lines = vec![
        "Score comparison".to_string(),
        "================".to_string(),
    ];
    for d in &comparison.deltas {
        let sign = if d.delta > 0 { "+" } else { "" };
        lines.push(format!(
            "  {} {}: {} ({}{}) - {}",
            trend_icon(d.trend),
            d.category,
            d.current,
            sign,
            d.delta,
            d.trend.as_str()
        ));
    }
    lines
}

/// Single timing value with its rating, if the metric has thresholds
pub fn render_rating(metric: Metric, value: f64) -> String {
    match vitals::rate_value(metric, value) {
        Some(rating) => format!("{}: {} ({})", metric, format_metric(metric, value), rating),
        None => format!("{}: {} (unrated)", metric, format_metric(metric, value)),
    }
}

fn check_status_icon(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "✓",
        CheckStatus::Warn => "!",
        CheckStatus::Fail => "✗",
        CheckStatus::Skip => "-",
        CheckStatus::Info => "i",
        CheckStatus::Error => "E",
    }
}

/// Header, one line per check, then issues and warnings
fn checklist_lines(
    lines: &mut Vec<String>,
    viewport: Option<Viewport>,
    device_category: Option<DeviceCategory>,
    checks: &[CompatCheck],
    issues: &[String],
    warnings: &[String],
) {
    if let Some(v) = viewport {
        lines.push(format!(
            "Viewport: {}x{} @{}x",
            v.width, v.height, v.device_pixel_ratio
        ));
    }
    if let Some(category) = device_category {
        lines.push(format!("Device category: {}", category.label()));
    }

    lines.push(String::new());
    for check in checks {
        lines.push(format!(
            "{} {}: {}",
            check_status_icon(check.status),
            check.name,
            check.message
        ));
    }

    if !issues.is_empty() {
        lines.push(String::new());
        lines.push("Critical issues:".to_string());
        lines.extend(issues.iter().map(|i| format!("  • {}", i)));
    }
    if !warnings.is_empty() {
        lines.push(String::new());
        lines.push("Warnings:".to_string());
        lines.extend(warnings.iter().map(|w| format!("  • {}", w)));
    }
}

pub fn render_compat(report: &CompatReport) -> Vec<String> {
    let mut lines = vec![
        "Browser compatibility results".to_string(),
        "=============================".to_string(),
        format!("Browser: {}", report.browser),
    ];
    checklist_lines(
        &mut lines,
        report.viewport,
        report.device_category,
        &report.checks,
        &report.issues,
        &report.warnings,
    );

    lines.push(String::new());
    lines.push(format!("Compatibility score: {}%", report.score));
    lines.push(report.verdict.message().to_string());
    lines
}

pub fn render_responsive(report: &ResponsiveReport) -> Vec<String> {
    let mut lines = vec![
        "Responsive design results".to_string(),
        "=========================".to_string(),
    ];
    checklist_lines(
        &mut lines,
        report.viewport,
        report.device_category,
        &report.checks,
        &report.issues,
        &report.warnings,
    );

    lines.push(String::new());
    lines.push(format!("Responsive design score: {}%", report.score));

    if let Some(category) = report.device_category {
        lines.push(String::new());
        lines.push(format!(
            "Recommendations for {}:",
            category.label().to_uppercase()
        ));
        lines.extend(
            category
                .recommendations()
                .iter()
                .map(|r| format!("  • {}", r)),
        );
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{Finding, Savings};
    use crate::report::{ReportFormatter, SourceIdentity, compare};
    use crate::score::ScoreCalculator;
    use crate::snapshot::{Snapshot, TimingSample};
    use crate::{compat, responsive};

    fn sample_report() -> Report {
        let mut snapshot = Snapshot::default();
        snapshot.location.href = "https://example.com/".to_string();
        snapshot.timings = vec![
            TimingSample::new(Metric::Lcp, 2100.0),
            TimingSample::new(Metric::Cls, 0.05),
            TimingSample::new(Metric::SpeedIndex, 1900.0),
        ];
        let scores = ScoreCalculator::default().score(&snapshot);
        let ratings = vitals::rate_all(&snapshot.timings);
        let findings = vec![Finding::opportunity(
            "unused-css",
            "Remove Unused CSS",
            "4 stylesheets loaded; consider removing unused CSS rules",
            Category::Performance,
            Savings::kilobytes(50),
        )];
        ReportFormatter::from_snapshot(&snapshot).format(scores, ratings, findings)
    }

    #[test]
    fn test_report_sections_in_order() {
        let lines = render_report(&sample_report());

        let position = |needle: &str| {
            lines
                .iter()
                .position(|l| l == needle)
                .unwrap_or_else(|| panic!("missing line {:?}", needle))
        };
        assert!(position("Scores:") < position("Core Web Vitals:"));
        assert!(position("Core Web Vitals:") < position("Opportunities:"));
        assert!(position("Opportunities:") < position("Diagnostics:"));
        assert!(position("Diagnostics:") < position("Priority recommendations:"));

        assert!(lines.contains(&"URL: https://example.com/".to_string()));
        assert!(lines.contains(&"  LCP: 2100ms (good)".to_string()));
        assert!(lines.contains(&"  CLS: 0.050 (good)".to_string()));
        assert!(lines.contains(&"  speed-index: 1900ms".to_string()));
        assert!(lines.contains(&"     Potential savings: 50KB".to_string()));
        assert!(lines.contains(&"  No diagnostic issues found".to_string()));
    }

    #[test]
    fn test_comparison_lines() {
        let current = sample_report();
        let mut previous = current.clone();
        if let Some(perf) = previous.scores.get_mut(&Category::Performance) {
            perf.score -= 10;
        }

        let lines = render_comparison(&compare(&current, &previous));
        let perf_line = lines
            .iter()
            .find(|l| l.contains("performance"))
            .unwrap();
        assert!(perf_line.contains("(+10) - improved"));
        assert!(lines.iter().any(|l| l.contains("seo") && l.contains("unchanged")));
    }

    #[test]
    fn test_render_rating() {
        assert_eq!(render_rating(Metric::Lcp, 3000.0), "LCP: 3000ms (needs-improvement)");
        assert_eq!(render_rating(Metric::Cls, 0.3), "CLS: 0.300 (poor)");
        assert_eq!(
            render_rating(Metric::TimeToInteractive, 2600.0),
            "time-to-interactive: 2600ms (unrated)"
        );
    }

    #[test]
    fn test_empty_report_placeholders() {
        let report = ReportFormatter::new(SourceIdentity::default()).format(
            Default::default(),
            Default::default(),
            Vec::new(),
        );
        let lines = render_report(&report);
        assert!(lines.contains(&"  Not observed".to_string()));
        assert!(lines.contains(&"  No major optimization opportunities found".to_string()));
        assert!(lines.contains(&"  All categories meet their targets".to_string()));
    }

    #[test]
    fn test_compat_lines_mark_errors() {
        let mut snapshot = Snapshot::default();
        snapshot.features.load_time_ms = Some(f64::INFINITY);
        let lines = render_compat(&compat::run(&snapshot));

        assert_eq!(lines[2], "Browser: Unknown");
        assert!(lines
            .iter()
            .any(|l| l.starts_with("E Loading Performance: Error testing Loading Performance")));
        assert!(lines.contains(&"✗ CSS Grid Layout: CSS Grid not supported".to_string()));
        assert!(lines.contains(&"Compatibility score: 0%".to_string()));
        assert!(!lines.iter().any(|l| l.starts_with("Recommendations")));
    }

    #[test]
    fn test_responsive_lines() {
        let mut snapshot = Snapshot::default();
        snapshot.viewport = Some(Viewport {
            width: 1280,
            height: 720,
            device_pixel_ratio: 1.0,
        });
        let lines = render_responsive(&responsive::run(&snapshot));

        assert!(lines.contains(&"Viewport: 1280x720 @1x".to_string()));
        assert!(lines.contains(&"Device category: Desktop".to_string()));
        assert!(lines.contains(
            &"- Mobile Menu Functionality: Mobile menu test skipped (desktop viewport)".to_string()
        ));
        assert!(lines.contains(&"Critical issues:".to_string()));
        assert!(lines.contains(&"Recommendations for DESKTOP:".to_string()));
        assert!(lines.contains(&"  • Implement hover states for better UX".to_string()));
    }
}
