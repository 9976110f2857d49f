//! Category score calculation
//!
//! Every category starts at 100 and loses points for each rule that fires.
//! The rule weights are heuristics carried over unchanged from the
//! checklist the audit encodes; they live in [`DeductionTable`] so they can
//! be revisited without touching the calculation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::Snapshot;

pub const MAX_SCORE: u8 = 100;

/// Audit categories, in the order reports list them
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Performance,
    Accessibility,
    BestPractices,
    Seo,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Performance,
        Category::Accessibility,
        Category::BestPractices,
        Category::Seo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Performance => "performance",
            Category::Accessibility => "accessibility",
            Category::BestPractices => "bestPractices",
            Category::Seo => "seo",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Performance => "Performance",
            Category::Accessibility => "Accessibility",
            Category::BestPractices => "Best Practices",
            Category::Seo => "SEO",
        }
    }

    /// Score a category must reach to count as good
    pub fn target(&self) -> u8 {
        match self {
            Category::Performance => 90,
            Category::Accessibility => 95,
            Category::BestPractices => 90,
            Category::Seo => 95,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One applied rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deduction {
    pub reason: String,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: Category,
    pub score: u8,
    pub deductions: Vec<Deduction>,
}

impl CategoryScore {
    pub fn meets_target(&self) -> bool {
        self.score >= self.category.target()
    }

    pub fn status(&self) -> ScoreStatus {
        ScoreStatus::for_score(self.score, self.category.target())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoreStatus {
    Good,
    NeedsImprovement,
    Poor,
}

impl ScoreStatus {
    /// Good at or above target, needs improvement within 10 points of it
    pub fn for_score(score: u8, target: u8) -> Self {
        if score >= target {
            ScoreStatus::Good
        } else if score >= target.saturating_sub(10) {
            ScoreStatus::NeedsImprovement
        } else {
            ScoreStatus::Poor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreStatus::Good => "GOOD",
            ScoreStatus::NeedsImprovement => "NEEDS IMPROVEMENT",
            ScoreStatus::Poor => "POOR",
        }
    }
}

pub type Scores = BTreeMap<Category, CategoryScore>;

/// Rule weights and limits for every category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeductionTable {
    // performance
    pub image_limit: usize,
    pub too_many_images: u32,
    pub script_limit: usize,
    pub too_many_scripts: u32,
    pub stylesheet_limit: usize,
    pub too_many_stylesheets: u32,
    pub no_lazy_images: u32,
    pub no_deferred_scripts: u32,
    pub no_preconnect: u32,

    // accessibility
    pub per_image_missing_alt: u32,
    pub no_headings: u32,
    pub per_unlabelled_input: u32,
    pub no_focus_indicator: u32,

    // best practices
    pub insecure_origin: u32,
    pub no_viewport_meta: u32,
    pub per_console_error: u32,
    pub deprecated_markup: u32,

    // seo
    pub min_title_chars: usize,
    pub short_title: u32,
    pub min_description_chars: usize,
    pub short_description: u32,
    pub no_h1: u32,
    pub no_structured_data: u32,
}

impl DeductionTable {
    pub const STANDARD: DeductionTable = DeductionTable {
        image_limit: 10,
        too_many_images: 5,
        script_limit: 6,
        too_many_scripts: 10,
        stylesheet_limit: 4,
        too_many_stylesheets: 5,
        no_lazy_images: 10,
        no_deferred_scripts: 5,
        no_preconnect: 5,

        per_image_missing_alt: 5,
        no_headings: 20,
        per_unlabelled_input: 5,
        no_focus_indicator: 10,

        insecure_origin: 20,
        no_viewport_meta: 10,
        per_console_error: 5,
        deprecated_markup: 15,

        min_title_chars: 30,
        short_title: 15,
        min_description_chars: 120,
        short_description: 15,
        no_h1: 20,
        no_structured_data: 10,
    };
}

impl Default for DeductionTable {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Running tally for one category
struct Ledger {
    category: Category,
    deductions: Vec<Deduction>,
}

impl Ledger {
    fn new(category: Category) -> Self {
        Self {
            category,
            deductions: Vec::new(),
        }
    }

    fn deduct_if(&mut self, condition: bool, points: u32, reason: impl Into<String>) {
        if condition {
            self.push(points, reason.into());
        }
    }

    /// Scaled penalty, applied once with `count * points`
    fn deduct_each(&mut self, count: usize, points: u32, reason: impl Into<String>) {
        if count > 0 {
            let total = u32::try_from(count)
                .unwrap_or(u32::MAX)
                .saturating_mul(points);
            self.push(total, reason.into());
        }
    }

    fn push(&mut self, points: u32, reason: String) {
        debug!(category = %self.category, points, reason = %reason, "Applied deduction");
        self.deductions.push(Deduction { reason, points });
    }

    fn finish(self) -> CategoryScore {
        let lost: u64 = self.deductions.iter().map(|d| u64::from(d.points)).sum();
        let score = u64::from(MAX_SCORE).saturating_sub(lost) as u8;
        CategoryScore {
            category: self.category,
            score,
            deductions: self.deductions,
        }
    }
}

/// Deterministic scorer over a snapshot
#[derive(Debug, Clone, Default)]
pub struct ScoreCalculator {
    table: DeductionTable,
}

impl ScoreCalculator {
    pub fn new(table: DeductionTable) -> Self {
        Self { table }
    }

    /// Score all four categories
    pub fn score(&self, snapshot: &Snapshot) -> Scores {
        [
            self.performance(snapshot),
            self.accessibility(snapshot),
            self.best_practices(snapshot),
            self.seo(snapshot),
        ]
        .into_iter()
        .map(|s| (s.category, s))
        .collect()
    }

    pub fn performance(&self, snapshot: &Snapshot) -> CategoryScore {
        let t = &self.table;
        let mut ledger = Ledger::new(Category::Performance);

        ledger.deduct_if(
            snapshot.image_count() > t.image_limit,
            t.too_many_images,
            format!("{} images (more than {})", snapshot.image_count(), t.image_limit),
        );
        ledger.deduct_if(
            snapshot.script_count() > t.script_limit,
            t.too_many_scripts,
            format!("{} scripts (more than {})", snapshot.script_count(), t.script_limit),
        );
        ledger.deduct_if(
            snapshot.stylesheet_count() > t.stylesheet_limit,
            t.too_many_stylesheets,
            format!(
                "{} stylesheets (more than {})",
                snapshot.stylesheet_count(),
                t.stylesheet_limit
            ),
        );
        // the optimization rules only apply when there is something to optimize
        ledger.deduct_if(
            snapshot.image_count() > 0 && !snapshot.has_lazy_images(),
            t.no_lazy_images,
            "No image uses lazy loading",
        );
        ledger.deduct_if(
            snapshot.script_count() > 0 && !snapshot.has_deferred_scripts(),
            t.no_deferred_scripts,
            "No script is deferred",
        );
        ledger.deduct_if(
            snapshot.has_subresources() && !snapshot.has_preconnect,
            t.no_preconnect,
            "No preconnect hint",
        );

        ledger.finish()
    }

    pub fn accessibility(&self, snapshot: &Snapshot) -> CategoryScore {
        let t = &self.table;
        let mut ledger = Ledger::new(Category::Accessibility);

        let missing_alt = snapshot.images_lacking_alt_text();
        ledger.deduct_each(
            missing_alt,
            t.per_image_missing_alt,
            format!("{} images missing alt text", missing_alt),
        );
        ledger.deduct_if(snapshot.heading_count() == 0, t.no_headings, "No headings");

        let unlabelled = snapshot.unlabelled_inputs();
        ledger.deduct_each(
            unlabelled,
            t.per_unlabelled_input,
            format!("{} form inputs without a label", unlabelled),
        );
        ledger.deduct_if(
            snapshot.has_focusable_without_indicator(),
            t.no_focus_indicator,
            "Focusable elements without a visible focus indicator",
        );

        ledger.finish()
    }

    pub fn best_practices(&self, snapshot: &Snapshot) -> CategoryScore {
        let t = &self.table;
        let mut ledger = Ledger::new(Category::BestPractices);

        let location = &snapshot.location;
        ledger.deduct_if(
            !location.uses_https() && !location.is_localhost(),
            t.insecure_origin,
            "Not served over HTTPS",
        );
        ledger.deduct_if(
            !snapshot.has_viewport_meta,
            t.no_viewport_meta,
            "No viewport meta tag",
        );
        ledger.deduct_each(
            snapshot.console_errors,
            t.per_console_error,
            format!("{} console errors after load", snapshot.console_errors),
        );
        ledger.deduct_if(
            snapshot.deprecated_element_count > 0,
            t.deprecated_markup,
            format!(
                "{} deprecated markup elements",
                snapshot.deprecated_element_count
            ),
        );

        ledger.finish()
    }

    pub fn seo(&self, snapshot: &Snapshot) -> CategoryScore {
        let t = &self.table;
        let mut ledger = Ledger::new(Category::Seo);

        ledger.deduct_if(
            snapshot.title_length() < t.min_title_chars,
            t.short_title,
            format!("Title missing or under {} characters", t.min_title_chars),
        );
        ledger.deduct_if(
            snapshot.description_length() < t.min_description_chars,
            t.short_description,
            format!(
                "Meta description missing or under {} characters",
                t.min_description_chars
            ),
        );
        ledger.deduct_if(!snapshot.has_h1(), t.no_h1, "No <h1> heading");
        ledger.deduct_if(
            !snapshot.has_structured_data(),
            t.no_structured_data,
            "No structured data block",
        );

        ledger.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{FocusableInfo, ImageInfo, InputInfo, ScriptInfo, StylesheetInfo};

    fn bare_images(n: usize) -> Vec<ImageInfo> {
        (0..n)
            .map(|_| ImageInfo {
                alt: Some("photo".to_string()),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_heavy_page_without_optimizations() {
        let mut snapshot = Snapshot {
            images: bare_images(15),
            scripts: vec![ScriptInfo::default(); 8],
            stylesheets: vec![StylesheetInfo::default(); 5],
            has_preconnect: true,
            ..Default::default()
        };

        let score = ScoreCalculator::default().performance(&snapshot);
        assert_eq!(score.score, 100 - 5 - 10 - 5 - 10 - 5);
        let points: Vec<u32> = score.deductions.iter().map(|d| d.points).collect();
        assert_eq!(points, vec![5, 10, 5, 10, 5]);

        // every performance rule fires once the preconnect hint goes too
        snapshot.has_preconnect = false;
        let score = ScoreCalculator::default().performance(&snapshot);
        assert_eq!(score.score, 60);
        assert_eq!(score.deductions.len(), 6);
    }

    #[test]
    fn test_limits_are_exclusive() {
        let snapshot = Snapshot {
            images: vec![ImageInfo {
                lazy: true,
                ..Default::default()
            }; 10],
            scripts: vec![
                ScriptInfo {
                    defer: true,
                    ..Default::default()
                };
                6
            ],
            stylesheets: vec![StylesheetInfo::default(); 4],
            has_preconnect: true,
            ..Default::default()
        };

        assert_eq!(ScoreCalculator::default().performance(&snapshot).score, 100);
    }

    #[test]
    fn test_accessibility_scales_per_issue() {
        let snapshot = Snapshot {
            images: vec![ImageInfo::default(); 3],
            headings: vec![2],
            form_inputs: vec![
                InputInfo::default(),
                InputInfo {
                    has_aria_label: true,
                    ..Default::default()
                },
                InputInfo::default(),
            ],
            focusables: vec![FocusableInfo {
                tag: "a".to_string(),
                outline_none: true,
                has_tabindex: false,
                ..Default::default()
            }],
            ..Default::default()
        };

        let score = ScoreCalculator::default().accessibility(&snapshot);

        // 3 * 5 + 2 * 5 + 10
        assert_eq!(score.score, 65);
        assert_eq!(score.deductions.len(), 3);
    }

    #[test]
    fn test_tabindex_counts_as_focus_indicator() {
        let snapshot = Snapshot {
            headings: vec![1],
            focusables: vec![FocusableInfo {
                tag: "button".to_string(),
                outline_none: true,
                has_tabindex: true,
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(ScoreCalculator::default().accessibility(&snapshot).score, 100);
    }

    #[test]
    fn test_empty_page_has_nothing_to_optimize() {
        let score = ScoreCalculator::default().performance(&Snapshot::default());
        assert_eq!(score.score, 100);
        assert!(score.deductions.is_empty());
    }

    #[test]
    fn test_scores_never_go_below_zero() {
        let snapshot = Snapshot {
            images: vec![ImageInfo::default(); 40],
            console_errors: 50,
            form_inputs: vec![InputInfo::default(); 30],
            ..Default::default()
        };

        for score in ScoreCalculator::default().score(&snapshot).values() {
            assert!(score.score <= MAX_SCORE);
        }
        let scores = ScoreCalculator::default().score(&snapshot);
        assert_eq!(scores[&Category::Accessibility].score, 0);
        assert_eq!(scores[&Category::BestPractices].score, 0);
    }

    #[test]
    fn test_localhost_is_not_penalized_for_http() {
        let mut snapshot = Snapshot {
            has_viewport_meta: true,
            ..Default::default()
        };
        snapshot.location.protocol = "http:".to_string();
        snapshot.location.hostname = "localhost".to_string();
        assert_eq!(ScoreCalculator::default().best_practices(&snapshot).score, 100);

        snapshot.location.hostname = "example.com".to_string();
        assert_eq!(ScoreCalculator::default().best_practices(&snapshot).score, 80);
    }

    #[test]
    fn test_best_practices_deprecated_markup_and_console_errors() {
        let mut snapshot = Snapshot {
            has_viewport_meta: true,
            deprecated_element_count: 3,
            ..Default::default()
        };
        snapshot.location.protocol = "https:".to_string();
        snapshot.location.hostname = "portfolio.example".to_string();

        // flat 15 however many deprecated elements
        let score = ScoreCalculator::default().best_practices(&snapshot);
        assert_eq!(score.score, 85);
        assert_eq!(score.deductions.len(), 1);
        assert_eq!(score.deductions[0].points, 15);

        snapshot.deprecated_element_count = 0;
        snapshot.console_errors = 2;
        let score = ScoreCalculator::default().best_practices(&snapshot);
        assert_eq!(score.score, 90);
        assert_eq!(score.deductions[0].points, 10);

        snapshot.console_errors = 1;
        snapshot.deprecated_element_count = 1;
        let score = ScoreCalculator::default().best_practices(&snapshot);
        assert_eq!(score.score, 80);
    }

    #[test]
    fn test_seo_length_boundaries() {
        let snapshot = Snapshot {
            title: Some("x".repeat(30)),
            meta_description: Some("y".repeat(119)),
            headings: vec![1],
            structured_data_blocks: 1,
            ..Default::default()
        };

        let score = ScoreCalculator::default().seo(&snapshot);
        assert_eq!(score.score, 85);
        assert_eq!(score.deductions.len(), 1);
    }

    #[test]
    fn test_custom_table_is_used() {
        let table = DeductionTable {
            no_h1: 50,
            ..DeductionTable::STANDARD
        };
        let snapshot = Snapshot {
            title: Some("t".repeat(40)),
            meta_description: Some("d".repeat(130)),
            structured_data_blocks: 1,
            ..Default::default()
        };
        assert_eq!(ScoreCalculator::new(table).seo(&snapshot).score, 50);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(ScoreStatus::for_score(90, 90), ScoreStatus::Good);
        assert_eq!(ScoreStatus::for_score(80, 90), ScoreStatus::NeedsImprovement);
        assert_eq!(ScoreStatus::for_score(79, 90), ScoreStatus::Poor);
        assert_eq!(ScoreStatus::Poor.label(), "POOR");
    }
}
