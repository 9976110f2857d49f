//! Report assembly and comparison

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use time::OffsetDateTime;
use tracing::warn;

use crate::detect::Finding;
use crate::score::{Category, Scores};
use crate::snapshot::{LongTask, MOBILE_BREAKPOINT_PX, Metric, Snapshot, Viewport};
use crate::vitals::{self, Assessment, Ratings};

/// Order in which category recommendations are listed
pub const RECOMMENDATION_ORDER: [Category; 4] = [
    Category::Performance,
    Category::Accessibility,
    Category::Seo,
    Category::BestPractices,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub actions: Vec<String>,
}

impl Recommendation {
    pub fn new(title: &str, actions: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            actions: actions.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Mobile,
    Desktop,
    Unknown,
}

impl DeviceClass {
    pub fn from_viewport(viewport: Option<&Viewport>) -> Self {
        match viewport {
            Some(v) if v.width < MOBILE_BREAKPOINT_PX => DeviceClass::Mobile,
            Some(_) => DeviceClass::Desktop,
            None => DeviceClass::Unknown,
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceClass::Mobile => f.write_str("mobile"),
            DeviceClass::Desktop => f.write_str("desktop"),
            DeviceClass::Unknown => f.write_str("unknown"),
        }
    }
}

/// Where the audited snapshot came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceIdentity {
    pub url: String,
    pub device: DeviceClass,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_digest: Option<String>,
}

impl Default for SourceIdentity {
    fn default() -> Self {
        Self {
            url: String::new(),
            device: DeviceClass::Unknown,
            snapshot_digest: None,
        }
    }
}

/// Outcome of one audit run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub source: SourceIdentity,
    pub scores: Scores,
    pub vitals: Ratings,
    /// Raw value of every observed metric, rated or not
    pub metrics: BTreeMap<Metric, f64>,
    pub findings: Vec<Finding>,
    pub recommendations: Vec<Recommendation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment: Option<Assessment>,
    #[serde(default)]
    pub vitals_advice: Vec<Recommendation>,
}

impl Report {
    pub fn score(&self, category: Category) -> Option<u8> {
        self.scores.get(&category).map(|s| s.score)
    }

    pub fn opportunities(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.is_opportunity())
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| !f.is_opportunity())
    }

    /// Compare against an earlier report
    pub fn compare(&self, previous: &Report) -> Comparison {
        compare(self, previous)
    }
}

/// Builds reports for one source
#[derive(Debug, Clone)]
pub struct ReportFormatter {
    source: SourceIdentity,
    timestamp: OffsetDateTime,
    metrics: BTreeMap<Metric, f64>,
    long_tasks: Vec<LongTask>,
}

impl ReportFormatter {
    pub fn new(source: SourceIdentity) -> Self {
        Self {
            source,
            timestamp: OffsetDateTime::now_utc(),
            metrics: BTreeMap::new(),
            long_tasks: Vec::new(),
        }
    }

    /// Source identity, raw metrics and long tasks taken from the snapshot
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let snapshot_digest = match snapshot.digest() {
            Ok(digest) => Some(digest),
            Err(err) => {
                warn!(error = %err, "Could not digest snapshot");
                None
            }
        };
        let source = SourceIdentity {
            url: snapshot.location.href.clone(),
            device: DeviceClass::from_viewport(snapshot.viewport.as_ref()),
            snapshot_digest,
        };

        let metrics = Metric::ALL
            .into_iter()
            .filter_map(|m| snapshot.timing(m).map(|v| (m, v)))
            .collect();

        Self {
            metrics,
            long_tasks: snapshot.long_tasks.clone(),
            ..Self::new(source)
        }
    }

    pub fn at(mut self, timestamp: OffsetDateTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn format(&self, scores: Scores, ratings: Ratings, findings: Vec<Finding>) -> Report {
        let recommendations = recommendations(&scores);
        let assessment = vitals::assess(&ratings);
        let vitals_advice = vitals::advice(&ratings, &self.long_tasks);

        Report {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: self.timestamp,
            source: self.source.clone(),
            scores,
            vitals: ratings,
            metrics: self.metrics.clone(),
            findings,
            recommendations,
            assessment,
            vitals_advice,
        }
    }
}

/// Recommendations for every category below its target
pub fn recommendations(scores: &Scores) -> Vec<Recommendation> {
    RECOMMENDATION_ORDER
        .iter()
        .filter(|c| scores.get(c).is_some_and(|s| !s.meets_target()))
        .map(|c| category_recommendation(*c))
        .collect()
}

fn category_recommendation(category: Category) -> Recommendation {
    match category {
        Category::Performance => Recommendation::new(
            "Improve Performance Score",
            &[
                "Optimize images and use modern formats",
                "Minimize and defer JavaScript",
                "Implement critical CSS inlining",
            ],
        ),
        Category::Accessibility => Recommendation::new(
            "Improve Accessibility Score",
            &[
                "Add alt text to all images",
                "Ensure proper heading hierarchy",
                "Improve keyboard navigation",
            ],
        ),
        Category::Seo => Recommendation::new(
            "Improve SEO Score",
            &[
                "Optimize title and meta description",
                "Add structured data markup",
                "Ensure proper heading structure",
            ],
        ),
        Category::BestPractices => Recommendation::new(
            "Improve Best Practices Score",
            &[
                "Use HTTPS for all resources",
                "Fix console errors",
                "Remove deprecated HTML elements",
            ],
        ),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improved,
    Declined,
    Unchanged,
}

impl Trend {
    pub fn from_delta(delta: i16) -> Self {
        match delta {
            d if d > 0 => Trend::Improved,
            d if d < 0 => Trend::Declined,
            _ => Trend::Unchanged,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Improved => "improved",
            Trend::Declined => "declined",
            Trend::Unchanged => "unchanged",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDelta {
    pub category: Category,
    pub current: u8,
    pub previous: u8,
    pub delta: i16,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub current_id: String,
    pub previous_id: String,
    pub deltas: Vec<CategoryDelta>,
}

impl Comparison {
    pub fn delta(&self, category: Category) -> Option<&CategoryDelta> {
        self.deltas.iter().find(|d| d.category == category)
    }
}

/// Per-category movement from `previous` to `current`
pub fn compare(current: &Report, previous: &Report) -> Comparison {
    let deltas = Category::ALL
        .into_iter()
        .filter_map(|category| {
            let now = current.score(category)?;
            let before = previous.score(category)?;
            let delta = i16::from(now) - i16::from(before);
            Some(CategoryDelta {
                category,
                current: now,
                previous: before,
                delta,
                trend: Trend::from_delta(delta),
            })
        })
        .collect();

    Comparison {
        current_id: current.id.clone(),
        previous_id: previous.id.clone(),
        deltas,
    }
}
