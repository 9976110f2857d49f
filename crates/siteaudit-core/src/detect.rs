//! Opportunity and diagnostic detection
//!
//! Each [`Check`] looks at the snapshot and yields at most one [`Finding`].
//! A check that errors or panics is isolated: it turns into an
//! error-severity finding and the remaining checks still run.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

use crate::{AuditError, Category, Snapshot};

pub const STYLESHEET_LIMIT: usize = 3;
pub const BLOCKING_SCRIPT_LIMIT: usize = 2;
pub const RENDER_BLOCKING_LIMIT: usize = 2;
pub const DOM_ELEMENT_LIMIT: usize = 1500;

pub const KB_SAVED_PER_IMAGE: u32 = 200;
pub const KB_SAVED_UNUSED_CSS: u32 = 50;
pub const MS_SAVED_DEFER_SCRIPTS: u32 = 300;
pub const MS_SAVED_PRELOAD: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SavingsUnit {
    #[serde(rename = "KB")]
    Kilobytes,
    #[serde(rename = "ms")]
    Milliseconds,
}

impl fmt::Display for SavingsUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SavingsUnit::Kilobytes => f.write_str("KB"),
            SavingsUnit::Milliseconds => f.write_str("ms"),
        }
    }
}

/// Fixed heuristic estimate, not a measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Savings {
    pub amount: u32,
    pub unit: SavingsUnit,
}

impl Savings {
    pub fn kilobytes(amount: u32) -> Self {
        Self {
            amount,
            unit: SavingsUnit::Kilobytes,
        }
    }

    pub fn milliseconds(amount: u32) -> Self {
        Self {
            amount,
            unit: SavingsUnit::Milliseconds,
        }
    }
}

impl fmt::Display for Savings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FindingKind {
    Opportunity { savings: Savings },
    Diagnostic { severity: Severity },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    #[serde(flatten)]
    pub kind: FindingKind,
}

impl Finding {
    pub fn opportunity(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        category: Category,
        savings: Savings,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            category,
            kind: FindingKind::Opportunity { savings },
        }
    }

    pub fn diagnostic(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        category: Category,
        severity: Severity,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            category,
            kind: FindingKind::Diagnostic { severity },
        }
    }

    /// Degraded finding standing in for a check that could not complete
    pub fn check_failed(check: &dyn Check, message: String) -> Self {
        let error = AuditError::CheckFailure {
            check: check.id().to_string(),
            message,
        };
        Self::diagnostic(
            format!("check-failed:{}", check.id()),
            format!("Check Failed: {}", check.id()),
            error.to_string(),
            check.category(),
            Severity::Error,
        )
    }

    pub fn is_opportunity(&self) -> bool {
        matches!(self.kind, FindingKind::Opportunity { .. })
    }

    pub fn severity(&self) -> Option<Severity> {
        match self.kind {
            FindingKind::Diagnostic { severity } => Some(severity),
            FindingKind::Opportunity { .. } => None,
        }
    }

    pub fn savings(&self) -> Option<Savings> {
        match self.kind {
            FindingKind::Opportunity { savings } => Some(savings),
            FindingKind::Diagnostic { .. } => None,
        }
    }
}

/// A single detection rule
pub trait Check: Send + Sync {
    /// Stable id, also the id of the finding it emits
    fn id(&self) -> &str;

    fn category(&self) -> Category;

    fn run(&self, snapshot: &Snapshot) -> anyhow::Result<Option<Finding>>;
}

/// Check backed by a plain function
pub struct RuleCheck {
    id: &'static str,
    category: Category,
    rule: fn(&Snapshot) -> anyhow::Result<Option<Finding>>,
}

impl RuleCheck {
    pub const fn new(
        id: &'static str,
        category: Category,
        rule: fn(&Snapshot) -> anyhow::Result<Option<Finding>>,
    ) -> Self {
        Self { id, category, rule }
    }
}

impl Check for RuleCheck {
    fn id(&self) -> &str {
        self.id
    }

    fn category(&self) -> Category {
        self.category
    }

    fn run(&self, snapshot: &Snapshot) -> anyhow::Result<Option<Finding>> {
        (self.rule)(snapshot)
    }
}

/// The built-in checks, in report order
pub fn standard_checks() -> Vec<Box<dyn Check>> {
    vec![
        Box::new(RuleCheck::new("optimize-images", Category::Performance, optimize_images)),
        Box::new(RuleCheck::new("unused-css", Category::Performance, unused_css)),
        Box::new(RuleCheck::new("defer-javascript", Category::Performance, defer_javascript)),
        Box::new(RuleCheck::new("preload-resources", Category::Performance, preload_resources)),
        Box::new(RuleCheck::new(
            "render-blocking-resources",
            Category::Performance,
            render_blocking_resources,
        )),
        Box::new(RuleCheck::new("large-dom", Category::Performance, large_dom)),
        Box::new(RuleCheck::new("missing-viewport", Category::BestPractices, missing_viewport)),
        Box::new(RuleCheck::new("missing-alt-text", Category::Accessibility, missing_alt_text)),
        Box::new(RuleCheck::new("long-tasks", Category::Performance, long_tasks)),
        Box::new(RuleCheck::new("slow-resources", Category::Performance, slow_resources)),
    ]
}

fn optimize_images(snapshot: &Snapshot) -> anyhow::Result<Option<Finding>> {
    let oversized = snapshot.oversized_images();
    if oversized == 0 {
        return Ok(None);
    }
    let count = u32::try_from(oversized)?;
    Ok(Some(Finding::opportunity(
        "optimize-images",
        "Optimize Images",
        format!("{} images could be optimized", oversized),
        Category::Performance,
        Savings::kilobytes(count.saturating_mul(KB_SAVED_PER_IMAGE)),
    )))
}

fn unused_css(snapshot: &Snapshot) -> anyhow::Result<Option<Finding>> {
    let sheets = snapshot.stylesheet_count();
    Ok((sheets > STYLESHEET_LIMIT).then(|| {
        Finding::opportunity(
            "unused-css",
            "Remove Unused CSS",
            format!(
                "{} stylesheets loaded; consider removing unused CSS rules",
                sheets
            ),
            Category::Performance,
            Savings::kilobytes(KB_SAVED_UNUSED_CSS),
        )
    }))
}

fn defer_javascript(snapshot: &Snapshot) -> anyhow::Result<Option<Finding>> {
    let blocking = snapshot.blocking_external_scripts();
    Ok((blocking > BLOCKING_SCRIPT_LIMIT).then(|| {
        Finding::opportunity(
            "defer-javascript",
            "Defer Non-Critical JavaScript",
            format!("{} scripts could be deferred", blocking),
            Category::Performance,
            Savings::milliseconds(MS_SAVED_DEFER_SCRIPTS),
        )
    }))
}

fn preload_resources(snapshot: &Snapshot) -> anyhow::Result<Option<Finding>> {
    Ok((!snapshot.has_preload).then(|| {
        Finding::opportunity(
            "preload-resources",
            "Preload Critical Resources",
            "Add preload hints for critical resources",
            Category::Performance,
            Savings::milliseconds(MS_SAVED_PRELOAD),
        )
    }))
}

fn render_blocking_resources(snapshot: &Snapshot) -> anyhow::Result<Option<Finding>> {
    let blocking = snapshot.render_blocking_stylesheets();
    Ok((blocking > RENDER_BLOCKING_LIMIT).then(|| {
        Finding::diagnostic(
            "render-blocking-resources",
            "Render-Blocking Resources",
            format!("{} render-blocking stylesheets found", blocking),
            Category::Performance,
            Severity::Warning,
        )
    }))
}

fn large_dom(snapshot: &Snapshot) -> anyhow::Result<Option<Finding>> {
    let elements = snapshot.element_count;
    Ok((elements > DOM_ELEMENT_LIMIT).then(|| {
        Finding::diagnostic(
            "large-dom",
            "Large DOM Size",
            format!(
                "DOM has {} elements (recommended < {})",
                elements, DOM_ELEMENT_LIMIT
            ),
            Category::Performance,
            Severity::Warning,
        )
    }))
}

fn missing_viewport(snapshot: &Snapshot) -> anyhow::Result<Option<Finding>> {
    Ok((!snapshot.has_viewport_meta).then(|| {
        Finding::diagnostic(
            "missing-viewport",
            "Missing Viewport Meta Tag",
            "Add viewport meta tag for mobile optimization",
            Category::BestPractices,
            Severity::Error,
        )
    }))
}

fn missing_alt_text(snapshot: &Snapshot) -> anyhow::Result<Option<Finding>> {
    let missing = snapshot.images_without_alt_attribute();
    Ok((missing > 0).then(|| {
        Finding::diagnostic(
            "missing-alt-text",
            "Missing Alt Text",
            format!("{} images missing alt attributes", missing),
            Category::Accessibility,
            Severity::Error,
        )
    }))
}

fn long_tasks(snapshot: &Snapshot) -> anyhow::Result<Option<Finding>> {
    let longest = snapshot
        .long_tasks
        .iter()
        .map(|t| t.duration)
        .filter(|d| d.is_finite())
        .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.max(d))));
    let Some(longest) = longest else {
        return Ok(None);
    };
    Ok(Some(Finding::diagnostic(
        "long-tasks",
        "Long Main-Thread Tasks",
        format!(
            "{} long tasks detected (longest {:.0}ms)",
            snapshot.long_tasks.len(),
            longest
        ),
        Category::Performance,
        Severity::Warning,
    )))
}

fn slow_resources(snapshot: &Snapshot) -> anyhow::Result<Option<Finding>> {
    let slow: Vec<String> = snapshot
        .slow_resources()
        .map(|r| format!("{} {} took {:.0}ms", r.initiator_type, r.name, r.duration))
        .collect();
    if slow.is_empty() {
        return Ok(None);
    }
    Ok(Some(Finding::diagnostic(
        "slow-resources",
        "Slow Resource Loading",
        format!("{} slow resources: {}", slow.len(), slow.join(", ")),
        Category::Performance,
        Severity::Warning,
    )))
}

/// Runs checks in order and isolates their failures
pub struct Detector {
    checks: Vec<Box<dyn Check>>,
}

impl Detector {
    pub fn new() -> Self {
        Self::with_checks(standard_checks())
    }

    pub fn with_checks(checks: Vec<Box<dyn Check>>) -> Self {
        Self { checks }
    }

    /// Append a check after the existing ones
    pub fn with_check(mut self, check: Box<dyn Check>) -> Self {
        self.checks.push(check);
        self
    }

    pub fn check_ids(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.id()).collect()
    }

    pub fn detect(&self, snapshot: &Snapshot) -> Vec<Finding> {
        debug!(checks = ?self.check_ids(), "Running checks");
        let mut seen = HashSet::new();
        let mut findings = Vec::new();

        for check in &self.checks {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| check.run(snapshot)));
            let finding = match outcome {
                Ok(Ok(finding)) => finding,
                Ok(Err(err)) => {
                    warn!(check = check.id(), error = %err, "Check failed");
                    Some(Finding::check_failed(&**check, format!("{:#}", err)))
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    warn!(check = check.id(), error = %message, "Check panicked");
                    Some(Finding::check_failed(&**check, message))
                }
            };

            let Some(finding) = finding else {
                continue;
            };
            if seen.insert(finding.id.clone()) {
                findings.push(finding);
            } else {
                debug!(id = %finding.id, "Dropped duplicate finding");
            }
        }

        findings
    }
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panicked".to_string()
    }
}
