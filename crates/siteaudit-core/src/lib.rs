//! Core domain models and logic for siteaudit
//!
//! This crate contains:
//! - Snapshot model and readers
//! - Score calculator, vitals rater, finding detector
//! - Report formatting, comparison and text rendering
//! - Browser compatibility and responsive layout checklists

pub mod audit;
pub mod compat;
pub mod detect;
pub mod error;
pub mod reader;
pub mod render;
pub mod report;
pub mod responsive;
pub mod score;
pub mod snapshot;
pub mod vitals;

pub use audit::{Auditor, audit_snapshot};
pub use compat::{CheckStatus, CompatCheck, CompatReport, Outcome, Rule};
pub use detect::{Check, Detector, Finding, FindingKind, Savings, SavingsUnit, Severity};
pub use error::{AuditError, Result};
pub use reader::{FileSnapshotReader, GatedSnapshotReader, SnapshotReader, StaticSnapshotReader};
pub use report::{
    CategoryDelta, Comparison, DeviceClass, Recommendation, Report, ReportFormatter,
    SourceIdentity, Trend, compare,
};
pub use responsive::ResponsiveReport;
pub use score::{Category, CategoryScore, Deduction, DeductionTable, ScoreCalculator, Scores};
pub use snapshot::{Metric, Snapshot, TimingSample, Unit};
pub use vitals::{Assessment, Ratings, VitalRating};
