//! Composite health scoring
//!
//! # Scoring Formula
//!
//! ```text
//! Health = Reliability × 0.20 + Security × 0.25 + Maintainability × 0.15
//!        + Compliance × 0.25 + Dependencies × 0.15
//! ```
//!
//! Every term is on a 0-100 scale and the weights sum to 1.0, so the
//! result is already in 0-100.
//!
//! # Ratings
//!
//! SonarQube ratings arrive as `"1.0"` (A) through `"5.0"` (E) and map to
//! 100, 75, 50, 25, 0. Anything else is treated as a neutral 50.
//!
//! # Dependencies
//!
//! Worst tier present decides: critical → 0, high → 30, moderate → 60,
//! otherwise 100.
//!
//! # Compliance
//!
//! The ratio of issue-based LGPD checks passed. Without issue data it is
//! a neutral 0.5, like an unreadable rating.

use crate::models::{MetricSnapshot, VulnerabilityCounts};
use serde::Serialize;

pub const RELIABILITY_WEIGHT: f64 = 0.20;
pub const SECURITY_WEIGHT: f64 = 0.25;
pub const MAINTAINABILITY_WEIGHT: f64 = 0.15;
pub const COMPLIANCE_WEIGHT: f64 = 0.25;
pub const DEPENDENCY_WEIGHT: f64 = 0.15;

/// Score for ratings the server did not report or that we can't read
pub const NEUTRAL_RATING_SCORE: f64 = 50.0;

/// Compliance ratio used when no issue-based check could be evaluated
pub const NEUTRAL_COMPLIANCE_RATIO: f64 = 0.5;

pub const BAND_GOOD: u32 = 80;
pub const BAND_MODERATE: u32 = 60;
pub const BAND_WARNING: u32 = 40;

/// Minutes in an hour and in an 8-hour workday
const MINUTES_PER_HOUR: f64 = 60.0;
const MINUTES_PER_DAY: f64 = 480.0;

/// Map a SonarQube rating string to 0-100.
pub fn rating_score(rating: Option<&str>) -> f64 {
    match rating.map(str::trim) {
        Some("1.0") => 100.0,
        Some("2.0") => 75.0,
        Some("3.0") => 50.0,
        Some("4.0") => 25.0,
        Some("5.0") => 0.0,
        _ => NEUTRAL_RATING_SCORE,
    }
}

/// Letter grade for a rating string (`"1.0"` → `A`), `?` when unknown.
pub fn rating_letter(rating: Option<&str>) -> &'static str {
    match rating.map(str::trim) {
        Some("1.0") => "A",
        Some("2.0") => "B",
        Some("3.0") => "C",
        Some("4.0") => "D",
        Some("5.0") => "E",
        _ => "?",
    }
}

/// Score the worst dependency vulnerability tier present.
pub fn dependency_tier_score(counts: &VulnerabilityCounts) -> f64 {
    if counts.critical > 0 {
        0.0
    } else if counts.high > 0 {
        30.0
    } else if counts.moderate > 0 {
        60.0
    } else {
        100.0
    }
}

/// Per-component breakdown behind a health score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub reliability: f64,
    pub security: f64,
    pub maintainability: f64,
    /// Compliance pass ratio scaled to 0-100
    pub compliance: f64,
    pub dependencies: f64,
    pub total: u32,
}

impl ScoreBreakdown {
    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_score(self.total)
    }
}

/// Compute the composite score with its components.
pub fn score_breakdown(
    metrics: &MetricSnapshot,
    compliance_ratio: f64,
    vulnerabilities: &VulnerabilityCounts,
) -> ScoreBreakdown {
    let reliability = rating_score(metrics.get("reliability_rating"));
    let security = rating_score(metrics.get("security_rating"));
    let maintainability = rating_score(metrics.get("sqale_rating"));
    let compliance = compliance_ratio.clamp(0.0, 1.0) * 100.0;
    let dependencies = dependency_tier_score(vulnerabilities);

    let weighted = reliability * RELIABILITY_WEIGHT
        + security * SECURITY_WEIGHT
        + maintainability * MAINTAINABILITY_WEIGHT
        + compliance * COMPLIANCE_WEIGHT
        + dependencies * DEPENDENCY_WEIGHT;

    ScoreBreakdown {
        reliability,
        security,
        maintainability,
        compliance,
        dependencies,
        total: weighted.round().clamp(0.0, 100.0) as u32,
    }
}

/// Composite 0-100 health score.
pub fn health_score(
    metrics: &MetricSnapshot,
    compliance_ratio: f64,
    vulnerabilities: &VulnerabilityCounts,
) -> u32 {
    score_breakdown(metrics, compliance_ratio, vulnerabilities).total
}

/// Colour band for a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScoreBand {
    Good,
    Moderate,
    Warning,
    Poor,
}

impl ScoreBand {
    pub fn from_score(score: u32) -> Self {
        if score >= BAND_GOOD {
            ScoreBand::Good
        } else if score >= BAND_MODERATE {
            ScoreBand::Moderate
        } else if score >= BAND_WARNING {
            ScoreBand::Warning
        } else {
            ScoreBand::Poor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreBand::Good => "Good",
            ScoreBand::Moderate => "Moderate",
            ScoreBand::Warning => "Needs attention",
            ScoreBand::Poor => "Critical",
        }
    }

    /// CSS class used by the HTML reporter
    pub fn css_class(&self) -> &'static str {
        match self {
            ScoreBand::Good => "band-good",
            ScoreBand::Moderate => "band-moderate",
            ScoreBand::Warning => "band-warning",
            ScoreBand::Poor => "band-poor",
        }
    }
}

/// Remediation effort expressed in hours and 8-hour days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DebtTime {
    pub minutes: u64,
    pub hours: f64,
    pub days: f64,
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

impl DebtTime {
    pub fn from_minutes(minutes: u64) -> Self {
        Self {
            minutes,
            hours: round1(minutes as f64 / MINUTES_PER_HOUR),
            days: round1(minutes as f64 / MINUTES_PER_DAY),
        }
    }

    /// From the `sqale_index` measure (minutes), 0 when missing.
    pub fn from_metrics(metrics: &MetricSnapshot) -> Self {
        let minutes = metrics.number("sqale_index").unwrap_or(0.0).max(0.0) as u64;
        Self::from_minutes(minutes)
    }
}
