//! Responsive layout and accessibility checklist
//!
//! Measures the captured layout against mobile-friendly thresholds. Runs
//! through the same isolated checklist as the browser checks, so one
//! unmeasurable rule degrades to `ERROR` without hiding the others.

use serde::{Deserialize, Serialize};

use crate::compat::{CheckStatus, Checklist, CompatCheck, DeviceCategory, Outcome, Rule};
use crate::snapshot::{Snapshot, Viewport};

pub const MIN_TOUCH_TARGET_PX: f64 = 44.0;
pub const MIN_INPUT_HEIGHT_PX: f64 = 44.0;
pub const MIN_BODY_FONT_PX: f64 = 14.0;
/// Viewports narrower than this get the smaller heading minimum
pub const SMALL_SCREEN_PX: u32 = 480;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsiveReport {
    pub viewport: Option<Viewport>,
    pub device_category: Option<DeviceCategory>,
    pub checks: Vec<CompatCheck>,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    /// Percentage of checks that passed; SKIP and INFO count as not passed
    pub score: u8,
}

pub const RESPONSIVE_RULES: &[(&str, Rule)] = &[
    ("Viewport Meta Tag", viewport_meta),
    ("Navigation Responsiveness", navigation),
    ("Touch Target Sizes", touch_targets),
    ("Mobile Menu Functionality", mobile_menu),
    ("Form Usability", form_usability),
    ("Typography Scaling", typography),
    ("Content Readability", readability),
    ("Animation Performance", animation_performance),
    ("Image Responsiveness", image_responsiveness),
    ("Keyboard Navigation", keyboard_navigation),
    ("Screen Reader Compatibility", screen_reader),
];

pub fn run(snapshot: &Snapshot) -> ResponsiveReport {
    let list = Checklist::run_all(RESPONSIVE_RULES, snapshot);
    let score = list.score();

    ResponsiveReport {
        viewport: snapshot.viewport,
        device_category: snapshot
            .viewport
            .map(|v| DeviceCategory::from_width(v.width)),
        checks: list.checks,
        issues: list.issues,
        warnings: list.warnings,
        score,
    }
}

/// Layout measurements are pixel values; anything else means the capture is broken
fn ensure_measured<'a>(
    what: &str,
    values: impl IntoIterator<Item = &'a f64>,
) -> anyhow::Result<()> {
    for value in values {
        anyhow::ensure!(
            value.is_finite(),
            "{} measurement is not a number",
            what
        );
    }
    Ok(())
}

/// Counted problems: PASS at zero, WARN below `fail_at`, FAIL from there
fn counted(
    issues: usize,
    fail_at: usize,
    pass_message: &str,
    detected: &str,
    warning: String,
) -> Outcome {
    if issues == 0 {
        return Outcome::pass(pass_message);
    }
    Outcome::new(
        CheckStatus::from_issue_count(issues, fail_at),
        format!("{} {}", issues, detected),
    )
    .with_warning(warning)
}

fn viewport_meta(snapshot: &Snapshot) -> anyhow::Result<Outcome> {
    Ok(if snapshot.has_viewport_meta && snapshot.has_responsive_viewport() {
        Outcome::pass("Viewport meta tag properly configured")
    } else {
        Outcome::fail("Viewport meta tag missing or misconfigured").with_issue(
            "Viewport meta tag not properly configured - responsive behavior may be broken",
        )
    })
}

fn navigation(snapshot: &Snapshot) -> anyhow::Result<Outcome> {
    let features = &snapshot.features;
    let layout = &snapshot.layout;

    Ok(if snapshot.is_mobile() {
        if !features.nav_toggle {
            Outcome::fail("Mobile navigation toggle not found")
                .with_issue("Mobile navigation toggle missing")
        } else if !layout.nav_toggle_visible {
            Outcome::warn("Mobile navigation toggle not visible")
                .with_warning("Mobile navigation toggle may not be visible")
        } else {
            Outcome::pass("Navigation responsive behavior correct")
        }
    } else if !(features.nav_menu && layout.nav_menu_visible) {
        Outcome::warn("Desktop navigation menu not visible")
            .with_warning("Desktop navigation menu may not be visible")
    } else {
        Outcome::pass("Navigation responsive behavior correct")
    })
}

fn touch_targets(snapshot: &Snapshot) -> anyhow::Result<Outcome> {
    let sizes = &snapshot.layout.touch_target_sizes;
    ensure_measured("touch target", sizes)?;

    // zero-sized targets are not rendered
    let small = sizes
        .iter()
        .filter(|size| **size > 0.0 && **size < MIN_TOUCH_TARGET_PX)
        .count();
    if small == 0 {
        return Ok(Outcome::pass(
            "All touch targets meet minimum size requirements",
        ));
    }

    Ok(Outcome::new(
        CheckStatus::from_issue_count(small, 3),
        format!(
            "{} touch targets may be too small (< {}px)",
            small, MIN_TOUCH_TARGET_PX
        ),
    )
    .with_warning(format!(
        "{} touch targets are smaller than recommended {}px",
        small, MIN_TOUCH_TARGET_PX
    )))
}

fn mobile_menu(snapshot: &Snapshot) -> anyhow::Result<Outcome> {
    if !snapshot.is_mobile() {
        return Ok(Outcome::new(
            CheckStatus::Skip,
            "Mobile menu test skipped (desktop viewport)",
        ));
    }

    let features = &snapshot.features;
    Ok(if !(features.nav_toggle && features.nav_menu) {
        Outcome::fail("Mobile menu elements not found").with_issue("Mobile menu elements missing")
    } else if snapshot.layout.nav_menu_toggles {
        Outcome::pass("Mobile menu toggles correctly")
    } else {
        Outcome::fail("Mobile menu toggle not working")
            .with_issue("Mobile menu toggle functionality not working")
    })
}

fn form_usability(snapshot: &Snapshot) -> anyhow::Result<Outcome> {
    let inputs = &snapshot.form_inputs;
    ensure_measured("input height", inputs.iter().filter_map(|i| i.rendered_height.as_ref()))?;

    let mobile = snapshot.is_mobile();
    let issues: usize = inputs
        .iter()
        .map(|input| {
            let unnamed = !input.has_label && !input.has_placeholder;
            let cramped = mobile
                && input
                    .rendered_height
                    .is_some_and(|height| height < MIN_INPUT_HEIGHT_PX);
            usize::from(unnamed) + usize::from(cramped)
        })
        .sum();

    Ok(counted(
        issues,
        3,
        "Form usability is good",
        "form usability issues detected",
        format!("Form has {} usability issues", issues),
    ))
}

fn typography(snapshot: &Snapshot) -> anyhow::Result<Outcome> {
    let sizes = &snapshot.layout.heading_font_sizes;
    ensure_measured("heading font size", sizes)?;

    let min_size = match snapshot.viewport {
        Some(v) if v.width < SMALL_SCREEN_PX => 18.0,
        _ => 20.0,
    };
    let issues = sizes.iter().filter(|size| **size < min_size).count();

    Ok(counted(
        issues,
        3,
        "Typography scales appropriately",
        "typography scaling issues detected",
        format!("Typography has {} scaling issues", issues),
    ))
}

fn readability(snapshot: &Snapshot) -> anyhow::Result<Outcome> {
    let styles = &snapshot.layout.text_styles;
    ensure_measured("font size", styles.iter().map(|s| &s.font_size))?;

    let issues: usize = styles
        .iter()
        .map(|style| {
            usize::from(style.font_size < MIN_BODY_FONT_PX) + usize::from(style.is_cramped())
        })
        .sum();

    Ok(counted(
        issues,
        5,
        "Content readability is good",
        "readability issues detected",
        format!("Content has {} readability issues", issues),
    ))
}

fn animation_performance(snapshot: &Snapshot) -> anyhow::Result<Outcome> {
    let layout = &snapshot.layout;
    let animated = snapshot.features.animated_element_count;

    Ok(if layout.animations_without_will_change > 0 {
        Outcome::warn("Some animations may not be GPU accelerated")
            .with_warning("Consider adding will-change property to animated elements")
    } else if layout.prefers_reduced_motion {
        Outcome::new(
            CheckStatus::Info,
            format!(
                "Found {} animated elements (reduced motion preferred by user)",
                animated
            ),
        )
    } else {
        Outcome::pass(format!("Found {} animated elements", animated))
    })
}

fn image_responsiveness(snapshot: &Snapshot) -> anyhow::Result<Outcome> {
    let images = &snapshot.images;
    ensure_measured(
        "image width",
        images
            .iter()
            .flat_map(|img| [&img.rendered_width, &img.container_width]),
    )?;

    let issues: usize = images
        .iter()
        .map(|img| usize::from(img.lacks_alt_text()) + usize::from(img.overflows_container()))
        .sum();

    Ok(counted(
        issues,
        3,
        "Images are properly responsive",
        "image responsiveness issues detected",
        format!("Images have {} responsiveness issues", issues),
    ))
}

fn keyboard_navigation(snapshot: &Snapshot) -> anyhow::Result<Outcome> {
    let focusables = &snapshot.focusables;
    ensure_measured("outline width", focusables.iter().map(|f| &f.outline_width_px))?;

    let issues = focusables
        .iter()
        .filter(|f| f.has_invisible_outline())
        .count();

    Ok(counted(
        issues,
        5,
        "Keyboard navigation properly supported",
        "keyboard navigation issues detected",
        format!("Keyboard navigation has {} issues", issues),
    ))
}

fn screen_reader(snapshot: &Snapshot) -> anyhow::Result<Outcome> {
    let mut last_level = 0u8;
    let mut skipped = 0;
    for &level in &snapshot.headings {
        if level > last_level.saturating_add(1) {
            skipped += 1;
        }
        last_level = level;
    }

    let unnamed_images = snapshot
        .images
        .iter()
        .filter(|img| img.lacks_alt_text() && !img.has_aria_label)
        .count();
    let unnamed_inputs = snapshot
        .form_inputs
        .iter()
        .filter(|input| input.in_form && !input.has_accessible_name())
        .count();
    let issues = skipped + unnamed_images + unnamed_inputs;

    Ok(counted(
        issues,
        5,
        "Screen reader compatibility is good",
        "accessibility issues detected",
        format!("Screen reader compatibility has {} issues", issues),
    ))
}
