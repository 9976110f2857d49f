//! Browser compatibility checklist
//!
//! Every check is a plain rule over the snapshot. Rules run in isolation: an
//! error or a panic marks that one check `ERROR` and the rest still run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use tracing::warn;

use crate::detect::panic_message;
use crate::snapshot::{Snapshot, Viewport};

pub const SLOW_LOAD_MS: f64 = 3000.0;
pub const VERY_SLOW_LOAD_MS: f64 = 5000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
    /// Not applicable at the captured viewport
    Skip,
    Info,
    /// The check itself could not complete
    Error,
}

impl CheckStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "PASS",
            CheckStatus::Warn => "WARN",
            CheckStatus::Fail => "FAIL",
            CheckStatus::Skip => "SKIP",
            CheckStatus::Info => "INFO",
            CheckStatus::Error => "ERROR",
        }
    }

    /// PASS when nothing is wrong, WARN below `fail_at` problems, FAIL otherwise
    pub fn from_issue_count(issues: usize, fail_at: usize) -> Self {
        match issues {
            0 => CheckStatus::Pass,
            n if n < fail_at => CheckStatus::Warn,
            _ => CheckStatus::Fail,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatCheck {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
}

/// What a single rule concluded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub status: CheckStatus,
    pub message: String,
    /// Critical issue raised alongside the status
    pub issue: Option<String>,
    pub warnings: Vec<String>,
}

impl Outcome {
    pub fn new(status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            issue: None,
            warnings: Vec::new(),
        }
    }

    pub fn pass(message: impl Into<String>) -> Self {
        Self::new(CheckStatus::Pass, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(CheckStatus::Warn, message)
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::new(CheckStatus::Fail, message)
    }

    pub fn with_issue(mut self, issue: impl Into<String>) -> Self {
        self.issue = Some(issue.into());
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

/// A named check over a snapshot
pub type Rule = fn(&Snapshot) -> anyhow::Result<Outcome>;

/// Collects check results together with the issues and warnings they raise
#[derive(Debug, Default)]
pub(crate) struct Checklist {
    pub(crate) checks: Vec<CompatCheck>,
    pub(crate) issues: Vec<String>,
    pub(crate) warnings: Vec<String>,
}

impl Checklist {
    pub(crate) fn run_all(rules: &[(&str, Rule)], snapshot: &Snapshot) -> Self {
        let mut list = Self::default();
        for (name, rule) in rules {
            list.run(name, *rule, snapshot);
        }
        list
    }

    pub(crate) fn run(&mut self, name: &str, rule: Rule, snapshot: &Snapshot) {
        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| rule(snapshot))) {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => {
                warn!(check = name, error = %err, "Check failed");
                Outcome::new(
                    CheckStatus::Error,
                    format!("Error testing {}: {:#}", name, err),
                )
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(check = name, error = %message, "Check panicked");
                Outcome::new(
                    CheckStatus::Error,
                    format!("Error testing {}: {}", name, message),
                )
            }
        };

        self.issues.extend(outcome.issue);
        self.warnings.extend(outcome.warnings);
        self.checks.push(CompatCheck {
            name: name.to_string(),
            status: outcome.status,
            message: outcome.message,
        });
    }

    /// Share of checks that passed, as a rounded percentage
    pub(crate) fn score(&self) -> u8 {
        let total = self.checks.len();
        if total == 0 {
            return 0;
        }
        let passed = self
            .checks
            .iter()
            .filter(|c| c.status == CheckStatus::Pass)
            .count();
        ((passed as f64 / total as f64) * 100.0).round() as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Browser {
    Chrome,
    Firefox,
    Safari,
    Edge,
    Unknown,
}

impl Browser {
    /// Token sniffing in the same precedence browsers are usually told apart
    pub fn detect(user_agent: &str) -> Self {
        if user_agent.contains("Chrome") && !user_agent.contains("Edge") {
            Browser::Chrome
        } else if user_agent.contains("Firefox") {
            Browser::Firefox
        } else if user_agent.contains("Safari") && !user_agent.contains("Chrome") {
            Browser::Safari
        } else if user_agent.contains("Edge") {
            Browser::Edge
        } else {
            Browser::Unknown
        }
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceCategory {
    SmallMobile,
    LargeMobile,
    Tablet,
    Desktop,
    LargeDesktop,
}

impl DeviceCategory {
    pub fn from_width(width: u32) -> Self {
        match width {
            w if w < 480 => DeviceCategory::SmallMobile,
            w if w < 768 => DeviceCategory::LargeMobile,
            w if w < 1024 => DeviceCategory::Tablet,
            w if w < 1440 => DeviceCategory::Desktop,
            _ => DeviceCategory::LargeDesktop,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeviceCategory::SmallMobile => "Small Mobile",
            DeviceCategory::LargeMobile => "Large Mobile",
            DeviceCategory::Tablet => "Tablet",
            DeviceCategory::Desktop => "Desktop",
            DeviceCategory::LargeDesktop => "Large Desktop",
        }
    }

    pub fn recommendations(&self) -> &'static [&'static str] {
        match self {
            DeviceCategory::SmallMobile => &[
                "Ensure text is at least 16px for readability",
                "Use single-column layouts",
                "Make touch targets at least 44px",
                "Test with one-handed usage in mind",
            ],
            DeviceCategory::LargeMobile => &[
                "Consider 2-column layouts for some content",
                "Optimize for thumb navigation",
                "Test in both portrait and landscape",
            ],
            DeviceCategory::Tablet => &[
                "Utilize available screen space with multi-column layouts",
                "Support both touch and mouse interactions",
                "Test orientation changes",
            ],
            DeviceCategory::Desktop | DeviceCategory::LargeDesktop => &[
                "Implement hover states for better UX",
                "Use keyboard shortcuts where appropriate",
                "Ensure content doesn't become too wide",
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Verdict {
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s >= 90 => Verdict::Excellent,
            s if s >= 75 => Verdict::Good,
            s if s >= 60 => Verdict::Fair,
            _ => Verdict::Poor,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Verdict::Excellent => "Excellent compatibility!",
            Verdict::Good => "Good compatibility with minor issues",
            Verdict::Fair => "Fair compatibility - some features may not work",
            Verdict::Poor => "Poor compatibility - significant issues detected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatReport {
    pub browser: Browser,
    pub viewport: Option<Viewport>,
    pub device_category: Option<DeviceCategory>,
    pub checks: Vec<CompatCheck>,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    pub score: u8,
    pub verdict: Verdict,
}

/// The browser checks, in report order
pub const BROWSER_RULES: &[(&str, Rule)] = &[
    ("CSS Custom Properties", css_custom_properties),
    ("CSS Grid Layout", css_grid),
    ("CSS Flexbox", css_flexbox),
    ("CSS Background Clip Text", css_background_clip_text),
    ("CSS Animations", css_animations),
    ("Smooth Scrolling", smooth_scrolling),
    ("ES6+ JavaScript Features", es2015),
    ("Intersection Observer API", intersection_observer),
    ("HTML5 Form Validation", form_validation),
    ("Navigation Functionality", navigation),
    ("Responsive Design", responsive_design),
    ("Animation Elements", animation_elements),
    ("Loading Performance", loading_performance),
];

/// Run the whole checklist against a snapshot
pub fn run(snapshot: &Snapshot) -> CompatReport {
    let list = Checklist::run_all(BROWSER_RULES, snapshot);
    let score = list.score();

    CompatReport {
        browser: snapshot
            .features
            .user_agent
            .as_deref()
            .map_or(Browser::Unknown, Browser::detect),
        viewport: snapshot.viewport,
        device_category: snapshot
            .viewport
            .map(|v| DeviceCategory::from_width(v.width)),
        checks: list.checks,
        issues: list.issues,
        warnings: list.warnings,
        score,
        verdict: Verdict::from_score(score),
    }
}

/// Supported gives PASS, otherwise `missing` with `note` as issue or warning
fn feature(
    supported: bool,
    missing: CheckStatus,
    pass_message: &str,
    miss_message: &str,
    note: &str,
) -> anyhow::Result<Outcome> {
    Ok(match (supported, missing) {
        (true, _) => Outcome::pass(pass_message),
        (false, CheckStatus::Fail) => Outcome::fail(miss_message).with_issue(note),
        (false, status) => Outcome::new(status, miss_message).with_warning(note),
    })
}

fn css_custom_properties(snapshot: &Snapshot) -> anyhow::Result<Outcome> {
    feature(
        snapshot.features.css_custom_properties,
        CheckStatus::Fail,
        "CSS custom properties supported",
        "CSS custom properties not supported",
        "CSS custom properties not supported - colors may not display correctly",
    )
}

fn css_grid(snapshot: &Snapshot) -> anyhow::Result<Outcome> {
    feature(
        snapshot.features.css_grid,
        CheckStatus::Fail,
        "CSS Grid supported",
        "CSS Grid not supported",
        "CSS Grid not supported - layout may be broken",
    )
}

fn css_flexbox(snapshot: &Snapshot) -> anyhow::Result<Outcome> {
    feature(
        snapshot.features.css_flexbox,
        CheckStatus::Fail,
        "CSS Flexbox supported",
        "CSS Flexbox not supported",
        "CSS Flexbox not supported - layout may be broken",
    )
}

fn css_background_clip_text(snapshot: &Snapshot) -> anyhow::Result<Outcome> {
    feature(
        snapshot.features.css_background_clip_text,
        CheckStatus::Warn,
        "Background-clip text supported",
        "Background-clip text not supported - using fallback",
        "Background-clip text not supported - gradient text will show as solid color",
    )
}

fn css_animations(snapshot: &Snapshot) -> anyhow::Result<Outcome> {
    feature(
        snapshot.features.css_animations,
        CheckStatus::Fail,
        "CSS animations supported",
        "CSS animations not supported",
        "CSS animations not supported - visual effects may not work",
    )
}

fn smooth_scrolling(snapshot: &Snapshot) -> anyhow::Result<Outcome> {
    let f = &snapshot.features;
    Ok(match (f.css_smooth_scroll, f.js_smooth_scroll) {
        (true, _) => Outcome::pass("Smooth scrolling: CSS"),
        (false, true) => Outcome::pass("Smooth scrolling: JavaScript fallback")
            .with_warning("Using JavaScript fallback for smooth scrolling"),
        (false, false) => Outcome::fail("Smooth scrolling: Not available").with_issue(
            "Smooth scrolling not available - navigation will use instant scrolling",
        ),
    })
}

fn es2015(snapshot: &Snapshot) -> anyhow::Result<Outcome> {
    feature(
        snapshot.features.es2015,
        CheckStatus::Fail,
        "ES6+ features supported",
        "ES6+ features not fully supported",
        "ES6+ features not supported - JavaScript functionality may be limited",
    )
}

fn intersection_observer(snapshot: &Snapshot) -> anyhow::Result<Outcome> {
    feature(
        snapshot.features.intersection_observer,
        CheckStatus::Warn,
        "Intersection Observer supported",
        "Using scroll event fallback",
        "Intersection Observer not supported - using scroll event fallback for animations",
    )
}

fn form_validation(snapshot: &Snapshot) -> anyhow::Result<Outcome> {
    feature(
        snapshot.features.form_validation,
        CheckStatus::Fail,
        "HTML5 form validation supported",
        "HTML5 form validation not supported",
        "HTML5 form validation not supported - custom validation required",
    )
}

fn navigation(snapshot: &Snapshot) -> anyhow::Result<Outcome> {
    let f = &snapshot.features;
    feature(
        f.nav_toggle && f.nav_menu && f.nav_link_count > 0,
        CheckStatus::Fail,
        "Navigation elements found",
        "Navigation elements missing",
        "Navigation elements not found - menu functionality may not work",
    )
}

fn responsive_design(snapshot: &Snapshot) -> anyhow::Result<Outcome> {
    feature(
        snapshot.has_viewport_meta && snapshot.features.media_query_breakpoints,
        CheckStatus::Warn,
        "Responsive design implemented",
        "Responsive design may have issues",
        "Responsive design implementation may have issues",
    )
}

fn animation_elements(snapshot: &Snapshot) -> anyhow::Result<Outcome> {
    let animated = snapshot.features.animated_element_count;
    Ok(if animated > 0 {
        Outcome::pass(format!("Found {} animated elements", animated))
    } else {
        Outcome::warn("Found 0 animated elements")
            .with_warning("No animated elements found - animations may not be working")
    })
}

fn loading_performance(snapshot: &Snapshot) -> anyhow::Result<Outcome> {
    let Some(load_ms) = snapshot.features.load_time_ms else {
        return Ok(Outcome::warn("Performance API not available"));
    };
    anyhow::ensure!(
        load_ms.is_finite() && load_ms >= 0.0,
        "load time measurement is not a valid duration ({})",
        load_ms
    );

    let message = format!("Page loaded in {:.0}ms", load_ms);
    Ok(if load_ms > VERY_SLOW_LOAD_MS {
        Outcome::fail(format!("{} (very slow loading)", message))
            .with_issue("Page loading time is over 5 seconds")
    } else if load_ms > SLOW_LOAD_MS {
        Outcome::warn(format!("{} (slow loading)", message))
            .with_warning("Page loading time is over 3 seconds")
    } else {
        Outcome::pass(message)
    })
}
