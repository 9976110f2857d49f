//! Core Web Vitals rating

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::report::Recommendation;
use crate::snapshot::{LongTask, Metric, TimingSample};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VitalRating {
    Good,
    NeedsImprovement,
    Poor,
}

impl VitalRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            VitalRating::Good => "good",
            VitalRating::NeedsImprovement => "needs-improvement",
            VitalRating::Poor => "poor",
        }
    }
}

impl fmt::Display for VitalRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Band edges: good at or below `good`, poor strictly above `poor`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub good: f64,
    pub poor: f64,
}

/// Published Core Web Vitals thresholds. Lab-only metrics have none.
pub fn thresholds(metric: Metric) -> Option<Thresholds> {
    let (good, poor) = match metric {
        Metric::Lcp => (2500.0, 4000.0),
        Metric::Fid => (100.0, 300.0),
        Metric::Inp => (200.0, 500.0),
        Metric::Cls => (0.1, 0.25),
        Metric::Fcp => (1800.0, 3000.0),
        Metric::Ttfb => (600.0, 1500.0),
        Metric::SpeedIndex | Metric::TimeToInteractive => return None,
    };
    Some(Thresholds { good, poor })
}

pub fn rate(sample: &TimingSample) -> Option<VitalRating> {
    rate_value(sample.metric, sample.value)
}

pub fn rate_value(metric: Metric, value: f64) -> Option<VitalRating> {
    if !value.is_finite() {
        return None;
    }
    let t = thresholds(metric)?;
    Some(if value <= t.good {
        VitalRating::Good
    } else if value <= t.poor {
        VitalRating::NeedsImprovement
    } else {
        VitalRating::Poor
    })
}

pub type Ratings = BTreeMap<Metric, VitalRating>;

/// Rate every observed sample; a later sample for the same metric wins
pub fn rate_all(samples: &[TimingSample]) -> Ratings {
    let mut ratings = Ratings::new();
    for sample in samples {
        if let Some(rating) = rate(sample) {
            ratings.insert(sample.metric, rating);
        }
    }
    ratings
}

pub const CORE_VITALS: [Metric; 3] = [Metric::Lcp, Metric::Fid, Metric::Cls];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assessment {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Assessment {
    pub fn message(&self) -> &'static str {
        match self {
            Assessment::Excellent => "Excellent! All Core Web Vitals are in the \"good\" range.",
            Assessment::Good => "Good performance with room for improvement.",
            Assessment::Fair => "Fair performance - several metrics need attention.",
            Assessment::Poor => "Poor performance - significant optimization needed.",
        }
    }
}

/// Overall verdict over LCP, FID and CLS
pub fn assess(ratings: &Ratings) -> Option<Assessment> {
    let observed: Vec<VitalRating> = CORE_VITALS
        .iter()
        .filter_map(|m| ratings.get(m).copied())
        .collect();
    if observed.is_empty() {
        return None;
    }

    let total = observed.len();
    let good = observed
        .iter()
        .filter(|r| **r == VitalRating::Good)
        .count();

    // good / total >= 3/4 and >= 1/2, kept in integers
    Some(if good == CORE_VITALS.len() {
        Assessment::Excellent
    } else if good * 4 >= total * 3 {
        Assessment::Good
    } else if good * 2 >= total {
        Assessment::Fair
    } else {
        Assessment::Poor
    })
}

/// Improvement advice for each observed vital outside the good band
pub fn advice(ratings: &Ratings, long_tasks: &[LongTask]) -> Vec<Recommendation> {
    let mut out = Vec::new();
    let needs_work = |m: Metric| ratings.get(&m).is_some_and(|r| *r != VitalRating::Good);

    if needs_work(Metric::Lcp) {
        out.push(Recommendation::new(
            "Optimize Largest Contentful Paint",
            &[
                "Optimize images and use modern formats (WebP/AVIF)",
                "Implement critical CSS inlining",
                "Use CDN for faster resource delivery",
            ],
        ));
    }
    if needs_work(Metric::Fid) {
        out.push(Recommendation::new(
            "Improve First Input Delay",
            &[
                "Reduce JavaScript execution time",
                "Use code splitting and lazy loading",
                "Defer non-critical JavaScript",
            ],
        ));
    }
    if needs_work(Metric::Cls) {
        out.push(Recommendation::new(
            "Reduce Cumulative Layout Shift",
            &[
                "Set explicit dimensions for images and videos",
                "Reserve space for dynamic content",
                "Avoid inserting content above existing content",
            ],
        ));
    }
    if needs_work(Metric::Fcp) {
        out.push(Recommendation::new(
            "Improve First Contentful Paint",
            &[
                "Optimize critical rendering path",
                "Minimize render-blocking resources",
                "Use resource hints (preload, prefetch)",
            ],
        ));
    }
    if !long_tasks.is_empty() {
        out.push(Recommendation::new(
            "Address Long Tasks",
            &[
                "Break up long-running JavaScript tasks",
                "Use requestIdleCallback for non-critical work",
                "Consider web workers for heavy computations",
            ],
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lcp_bands() {
        assert_eq!(rate_value(Metric::Lcp, 2000.0), Some(VitalRating::Good));
        assert_eq!(
            rate_value(Metric::Lcp, 3000.0),
            Some(VitalRating::NeedsImprovement)
        );
        assert_eq!(rate_value(Metric::Lcp, 5000.0), Some(VitalRating::Poor));
    }

    #[test]
    fn test_band_edges() {
        assert_eq!(rate_value(Metric::Fid, 100.0), Some(VitalRating::Good));
        assert_eq!(
            rate_value(Metric::Fid, 300.0),
            Some(VitalRating::NeedsImprovement)
        );
        assert_eq!(rate_value(Metric::Fid, 300.5), Some(VitalRating::Poor));
        assert_eq!(rate_value(Metric::Cls, 0.1), Some(VitalRating::Good));
        assert_eq!(rate_value(Metric::Cls, 0.26), Some(VitalRating::Poor));
        assert_eq!(
            rate_value(Metric::Ttfb, 601.0),
            Some(VitalRating::NeedsImprovement)
        );
        assert_eq!(rate_value(Metric::Fcp, 3001.0), Some(VitalRating::Poor));
    }

    #[test]
    fn test_unrated_metrics_and_values() {
        assert_eq!(rate_value(Metric::SpeedIndex, 1000.0), None);
        assert_eq!(rate_value(Metric::TimeToInteractive, 1000.0), None);
        assert_eq!(rate_value(Metric::Lcp, f64::NAN), None);
        assert_eq!(rate_value(Metric::Lcp, f64::INFINITY), None);
    }

    #[test]
    fn test_missing_metric_has_no_entry() {
        let ratings = rate_all(&[TimingSample::new(Metric::Lcp, 2000.0)]);
        assert_eq!(ratings.len(), 1);
        assert!(!ratings.contains_key(&Metric::Cls));
    }

    #[test]
    fn test_last_sample_wins() {
        let ratings = rate_all(&[
            TimingSample::new(Metric::Lcp, 1000.0),
            TimingSample::new(Metric::Lcp, 4500.0),
        ]);
        assert_eq!(ratings[&Metric::Lcp], VitalRating::Poor);
    }

    #[test]
    fn test_assessment() {
        let all_good = rate_all(&[
            TimingSample::new(Metric::Lcp, 1000.0),
            TimingSample::new(Metric::Fid, 50.0),
            TimingSample::new(Metric::Cls, 0.01),
        ]);
        assert_eq!(assess(&all_good), Some(Assessment::Excellent));

        let two_good = rate_all(&[
            TimingSample::new(Metric::Lcp, 1000.0),
            TimingSample::new(Metric::Fid, 50.0),
            TimingSample::new(Metric::Cls, 0.3),
        ]);
        assert_eq!(assess(&two_good), Some(Assessment::Fair));

        let partial = rate_all(&[
            TimingSample::new(Metric::Lcp, 1000.0),
            TimingSample::new(Metric::Cls, 0.01),
        ]);
        assert_eq!(assess(&partial), Some(Assessment::Good));

        let none_good = rate_all(&[TimingSample::new(Metric::Lcp, 5000.0)]);
        assert_eq!(assess(&none_good), Some(Assessment::Poor));

        assert_eq!(assess(&Ratings::new()), None);
    }

    #[test]
    fn test_advice_only_for_weak_vitals() {
        let ratings = rate_all(&[
            TimingSample::new(Metric::Lcp, 3000.0),
            TimingSample::new(Metric::Cls, 0.01),
        ]);
        let advice = advice(&ratings, &[]);
        assert_eq!(advice.len(), 1);
        assert_eq!(advice[0].title, "Optimize Largest Contentful Paint");

        let tasks = [LongTask {
            start_time: 10.0,
            duration: 120.0,
        }];
        let advice = super::advice(&Ratings::new(), &tasks);
        assert_eq!(advice.len(), 1);
        assert_eq!(advice[0].title, "Address Long Tasks");
    }
}
