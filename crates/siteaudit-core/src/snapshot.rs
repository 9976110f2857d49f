//! Snapshot domain model
//!
//! A snapshot is a single read-only capture of a document's structure and
//! timing data. Everything the auditor decides is derived from it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{AuditError, Result};

/// Width under which a viewport counts as a mobile device
pub const MOBILE_BREAKPOINT_PX: u32 = 768;

/// Immutable capture of a document at a point in time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub location: PageLocation,
    pub viewport: Option<Viewport>,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    /// Total number of elements in the document
    pub element_count: usize,
    /// Heading levels (1-6) in document order
    pub headings: Vec<u8>,
    /// `<font>`, `<center>`, `<marquee>` and friends
    pub deprecated_element_count: usize,
    pub has_viewport_meta: bool,
    /// `content` of the viewport meta tag, when present
    pub viewport_meta_content: Option<String>,
    pub has_preconnect: bool,
    pub has_preload: bool,
    /// `<script type="application/ld+json">` blocks
    pub structured_data_blocks: usize,
    /// Console errors seen during the sampling window after load
    pub console_errors: usize,
    pub images: Vec<ImageInfo>,
    /// Executable scripts; structured data blocks are counted separately
    pub scripts: Vec<ScriptInfo>,
    pub stylesheets: Vec<StylesheetInfo>,
    pub form_inputs: Vec<InputInfo>,
    pub focusables: Vec<FocusableInfo>,
    pub timings: Vec<TimingSample>,
    pub long_tasks: Vec<LongTask>,
    /// Resource timing entries observed while loading
    pub resources: Vec<ResourceTiming>,
    pub features: FeatureSupport,
    pub layout: LayoutFacts,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageLocation {
    pub href: String,
    /// Scheme as reported by the browser, e.g. `https:`
    pub protocol: String,
    pub hostname: String,
}

impl PageLocation {
    pub fn uses_https(&self) -> bool {
        self.protocol
            .trim_end_matches(':')
            .eq_ignore_ascii_case("https")
    }

    pub fn is_localhost(&self) -> bool {
        self.hostname == "localhost"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_pixel_ratio")]
    pub device_pixel_ratio: f64,
}

fn default_pixel_ratio() -> f64 {
    1.0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageInfo {
    pub src: Option<String>,
    /// `None` when the attribute is absent, `Some("")` when present but empty
    pub alt: Option<String>,
    /// `loading="lazy"`
    pub lazy: bool,
    pub natural_width: u32,
    pub natural_height: u32,
    pub has_aria_label: bool,
    /// Computed or inline `max-width: 100%`
    pub max_width_full: bool,
    /// Rendered width of the image and of its parent, in px
    pub rendered_width: f64,
    pub container_width: f64,
}

impl ImageInfo {
    /// Alt attribute missing or empty
    pub fn lacks_alt_text(&self) -> bool {
        self.alt.as_deref().is_none_or(str::is_empty)
    }

    pub fn is_oversized(&self) -> bool {
        self.natural_width > 1920 || self.natural_height > 1080
    }

    /// Wider than its container without being constrained to it
    pub fn overflows_container(&self) -> bool {
        !self.max_width_full && self.rendered_width > self.container_width
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptInfo {
    pub src: Option<String>,
    pub defer: bool,
    #[serde(rename = "async")]
    pub is_async: bool,
}

impl ScriptInfo {
    /// External script that blocks parsing
    pub fn is_blocking_external(&self) -> bool {
        self.src.is_some() && !self.defer && !self.is_async
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StylesheetInfo {
    pub href: Option<String>,
    pub media: Option<String>,
}

impl StylesheetInfo {
    pub fn is_render_blocking(&self) -> bool {
        self.media.as_deref() != Some("print")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputInfo {
    pub id: Option<String>,
    /// A `<label for=...>` points at this input
    pub has_label: bool,
    pub has_aria_label: bool,
    pub has_aria_labelledby: bool,
    pub has_placeholder: bool,
    /// Sits inside a `<form>`
    pub in_form: bool,
    /// `offsetHeight` in px
    pub rendered_height: Option<f64>,
}

impl InputInfo {
    pub fn is_labelled(&self) -> bool {
        self.has_label || self.has_aria_label
    }

    /// Something a screen reader can announce
    pub fn has_accessible_name(&self) -> bool {
        self.is_labelled() || self.has_aria_labelledby
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusableInfo {
    pub tag: String,
    /// Computed `outline` is `none`
    pub outline_none: bool,
    pub outline_width_px: f64,
    pub has_tabindex: bool,
}

impl FocusableInfo {
    pub fn lacks_focus_indicator(&self) -> bool {
        self.outline_none && !self.has_tabindex
    }

    /// Outline is `none` and has no width left to show
    pub fn has_invisible_outline(&self) -> bool {
        self.outline_none && self.outline_width_px == 0.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LongTask {
    pub start_time: f64,
    pub duration: f64,
}

/// Browser capabilities and page furniture observed by the environment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureSupport {
    pub user_agent: Option<String>,
    pub css_custom_properties: bool,
    pub css_grid: bool,
    pub css_flexbox: bool,
    pub css_background_clip_text: bool,
    pub css_animations: bool,
    pub css_smooth_scroll: bool,
    /// A scripted smooth-scroll fallback is installed
    pub js_smooth_scroll: bool,
    pub es2015: bool,
    pub intersection_observer: bool,
    pub form_validation: bool,
    pub nav_toggle: bool,
    pub nav_menu: bool,
    pub nav_link_count: usize,
    /// All layout breakpoints resolve as media queries
    pub media_query_breakpoints: bool,
    pub animated_element_count: usize,
    /// navigationStart to loadEventEnd
    pub load_time_ms: Option<f64>,
}

/// Computed layout measurements taken at the captured viewport
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutFacts {
    /// Computed font size of every heading, in px
    pub heading_font_sizes: Vec<f64>,
    /// Paragraphs, spans and list items
    pub text_styles: Vec<TextStyle>,
    /// Smallest rendered dimension of each touch target, in px
    pub touch_target_sizes: Vec<f64>,
    pub nav_toggle_visible: bool,
    pub nav_menu_visible: bool,
    /// Clicking the toggle flipped the menu's active state
    pub nav_menu_toggles: bool,
    pub prefers_reduced_motion: bool,
    /// Animated elements whose `will-change` is unset or `auto`
    pub animations_without_will_change: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub font_size: f64,
    /// `None` for `normal`
    pub line_height: Option<f64>,
}

impl TextStyle {
    pub fn is_cramped(&self) -> bool {
        self.line_height
            .is_some_and(|line| line < self.font_size * 1.2)
    }
}

/// Budget above which a resource load is reported as slow, by initiator
pub fn slow_resource_budget_ms(initiator_type: &str) -> Option<f64> {
    match initiator_type {
        "img" => Some(1000.0),
        "script" => Some(500.0),
        "css" => Some(300.0),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceTiming {
    pub name: String,
    pub initiator_type: String,
    pub duration: f64,
}

impl ResourceTiming {
    pub fn is_slow(&self) -> bool {
        slow_resource_budget_ms(&self.initiator_type).is_some_and(|budget| self.duration > budget)
    }
}

/// Timing metric names
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "LCP")]
    Lcp,
    #[serde(rename = "FID")]
    Fid,
    #[serde(rename = "INP")]
    Inp,
    #[serde(rename = "CLS")]
    Cls,
    #[serde(rename = "FCP")]
    Fcp,
    #[serde(rename = "TTFB")]
    Ttfb,
    #[serde(rename = "speed-index")]
    SpeedIndex,
    #[serde(rename = "time-to-interactive")]
    TimeToInteractive,
}

impl Metric {
    pub const ALL: [Metric; 8] = [
        Metric::Lcp,
        Metric::Fid,
        Metric::Inp,
        Metric::Cls,
        Metric::Fcp,
        Metric::Ttfb,
        Metric::SpeedIndex,
        Metric::TimeToInteractive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Lcp => "LCP",
            Metric::Fid => "FID",
            Metric::Inp => "INP",
            Metric::Cls => "CLS",
            Metric::Fcp => "FCP",
            Metric::Ttfb => "TTFB",
            Metric::SpeedIndex => "speed-index",
            Metric::TimeToInteractive => "time-to-interactive",
        }
    }

    pub fn unit(&self) -> Unit {
        match self {
            Metric::Cls => Unit::Unitless,
            _ => Unit::Milliseconds,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self> {
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AuditError::Other(anyhow::anyhow!("Unknown metric: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Milliseconds,
    Unitless,
}

/// One observed timing value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingSample {
    pub metric: Metric,
    pub value: f64,
}

impl TimingSample {
    pub fn new(metric: Metric, value: f64) -> Self {
        Self { metric, value }
    }
}

impl Snapshot {
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn script_count(&self) -> usize {
        self.scripts.len()
    }

    pub fn stylesheet_count(&self) -> usize {
        self.stylesheets.len()
    }

    pub fn heading_count(&self) -> usize {
        self.headings.len()
    }

    pub fn has_h1(&self) -> bool {
        self.headings.contains(&1)
    }

    pub fn has_lazy_images(&self) -> bool {
        self.images.iter().any(|img| img.lazy)
    }

    pub fn has_deferred_scripts(&self) -> bool {
        self.scripts.iter().any(|s| s.defer)
    }

    pub fn has_structured_data(&self) -> bool {
        self.structured_data_blocks > 0
    }

    /// Any image, script or stylesheet for the page to fetch
    pub fn has_subresources(&self) -> bool {
        !self.images.is_empty() || !self.scripts.is_empty() || !self.stylesheets.is_empty()
    }

    /// Images whose alt is absent or empty
    pub fn images_lacking_alt_text(&self) -> usize {
        self.images.iter().filter(|img| img.lacks_alt_text()).count()
    }

    /// Images with no alt attribute at all
    pub fn images_without_alt_attribute(&self) -> usize {
        self.images.iter().filter(|img| img.alt.is_none()).count()
    }

    pub fn oversized_images(&self) -> usize {
        self.images.iter().filter(|img| img.is_oversized()).count()
    }

    pub fn blocking_external_scripts(&self) -> usize {
        self.scripts
            .iter()
            .filter(|s| s.is_blocking_external())
            .count()
    }

    pub fn render_blocking_stylesheets(&self) -> usize {
        self.stylesheets
            .iter()
            .filter(|s| s.is_render_blocking())
            .count()
    }

    pub fn unlabelled_inputs(&self) -> usize {
        self.form_inputs
            .iter()
            .filter(|input| !input.is_labelled())
            .count()
    }

    pub fn slow_resources(&self) -> impl Iterator<Item = &ResourceTiming> {
        self.resources.iter().filter(|r| r.is_slow())
    }

    /// Viewport meta sets both `width=device-width` and `initial-scale=1`
    pub fn has_responsive_viewport(&self) -> bool {
        self.viewport_meta_content.as_deref().is_some_and(|content| {
            content.contains("width=device-width") && content.contains("initial-scale=1")
        })
    }

    pub fn is_mobile(&self) -> bool {
        self.viewport
            .is_some_and(|v| v.width < MOBILE_BREAKPOINT_PX)
    }

    pub fn has_focusable_without_indicator(&self) -> bool {
        self.focusables.iter().any(FocusableInfo::lacks_focus_indicator)
    }

    pub fn title_length(&self) -> usize {
        self.title.as_deref().map_or(0, |t| t.chars().count())
    }

    pub fn description_length(&self) -> usize {
        self.meta_description
            .as_deref()
            .map_or(0, |d| d.chars().count())
    }

    /// Latest finite sample for a metric, if the environment reported one
    pub fn timing(&self, metric: Metric) -> Option<f64> {
        self.timings
            .iter()
            .rev()
            .find(|s| s.metric == metric && s.value.is_finite())
            .map(|s| s.value)
    }

    /// Stable content digest used to identify the audited snapshot
    pub fn digest(&self) -> Result<String> {
        let bytes = serde_json::to_vec(self)?;
        Ok(blake3::hash(&bytes).to_hex().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_reads_as_zero_counts() {
        let snapshot: Snapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(snapshot.image_count(), 0);
        assert_eq!(snapshot.stylesheet_count(), 0);
        assert_eq!(snapshot.heading_count(), 0);
        assert!(!snapshot.has_viewport_meta);
        assert!(snapshot.viewport.is_none());
        assert!(snapshot.timing(Metric::Lcp).is_none());
    }

    #[test]
    fn test_alt_text_states() {
        let absent = ImageInfo::default();
        let empty = ImageInfo {
            alt: Some(String::new()),
            ..Default::default()
        };
        let present = ImageInfo {
            alt: Some("Logo".to_string()),
            ..Default::default()
        };
        let snapshot = Snapshot {
            images: vec![absent, empty, present],
            ..Default::default()
        };

        assert_eq!(snapshot.images_lacking_alt_text(), 2);
        assert_eq!(snapshot.images_without_alt_attribute(), 1);
    }

    #[test]
    fn test_script_flags_from_json() {
        let json = r#"{
            "scripts": [
                { "src": "app.js", "defer": true },
                { "src": "vendor.js", "async": true },
                { "src": "legacy.js" },
                { "text": "inline" }
            ],
            "structured_data_blocks": 1
        }"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();

        assert_eq!(snapshot.script_count(), 4);
        assert!(snapshot.has_deferred_scripts());
        assert!(snapshot.has_structured_data());
        assert_eq!(snapshot.blocking_external_scripts(), 1);
    }

    #[test]
    fn test_https_detection() {
        let secure = PageLocation {
            protocol: "https:".to_string(),
            ..Default::default()
        };
        let plain = PageLocation {
            protocol: "http:".to_string(),
            hostname: "localhost".to_string(),
            ..Default::default()
        };
        assert!(secure.uses_https());
        assert!(!plain.uses_https());
        assert!(plain.is_localhost());
    }

    #[test]
    fn test_timing_takes_last_finite_sample() {
        let snapshot = Snapshot {
            timings: vec![
                TimingSample::new(Metric::Lcp, 1200.0),
                TimingSample::new(Metric::Lcp, 2100.0),
                TimingSample::new(Metric::Lcp, f64::NAN),
            ],
            ..Default::default()
        };
        assert_eq!(snapshot.timing(Metric::Lcp), Some(2100.0));
        assert_eq!(snapshot.timing(Metric::Cls), None);
    }

    #[test]
    fn test_metric_parsing() {
        assert_eq!("lcp".parse::<Metric>().unwrap(), Metric::Lcp);
        assert_eq!("Speed-Index".parse::<Metric>().unwrap(), Metric::SpeedIndex);
        assert!("xyz".parse::<Metric>().is_err());
        assert_eq!(Metric::Cls.unit(), Unit::Unitless);
        assert_eq!(Metric::Ttfb.unit(), Unit::Milliseconds);
    }

    #[test]
    fn test_viewport_content_needs_both_directives() {
        let mut snapshot = Snapshot {
            has_viewport_meta: true,
            viewport_meta_content: Some("width=device-width".to_string()),
            ..Default::default()
        };
        assert!(!snapshot.has_responsive_viewport());

        snapshot.viewport_meta_content =
            Some("width=device-width, initial-scale=1.0".to_string());
        assert!(snapshot.has_responsive_viewport());
    }

    #[test]
    fn test_slow_resources_by_initiator() {
        let resource = |initiator: &str, duration| ResourceTiming {
            name: format!("/{}", initiator),
            initiator_type: initiator.to_string(),
            duration,
        };
        let snapshot = Snapshot {
            resources: vec![
                resource("img", 1000.0),
                resource("img", 1200.0),
                resource("script", 501.0),
                resource("css", 300.0),
                resource("fetch", 9000.0),
            ],
            ..Default::default()
        };
        let slow: Vec<&str> = snapshot.slow_resources().map(|r| r.name.as_str()).collect();
        assert_eq!(slow, vec!["/img", "/script"]);
        assert_eq!(snapshot.resources[1].duration, 1200.0);
    }

    #[test]
    fn test_digest_is_stable() {
        let snapshot = Snapshot {
            title: Some("Portfolio".to_string()),
            element_count: 42,
            ..Default::default()
        };
        assert_eq!(snapshot.digest().unwrap(), snapshot.clone().digest().unwrap());

        let other = Snapshot {
            element_count: 43,
            ..snapshot.clone()
        };
        assert_ne!(snapshot.digest().unwrap(), other.digest().unwrap());
    }
}
