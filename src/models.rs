//! Core data models for sonarlgpd
//!
//! These models represent everything one export run pulls together:
//! SonarQube measures, issues and hotspots, the local compliance mapping,
//! dependency audit results and repository activity. All of them are
//! created fresh per run and dropped once the report is written.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metric keys requested from `/api/measures/component`.
pub const METRIC_KEYS: &[&str] = &[
    "bugs",
    "vulnerabilities",
    "code_smells",
    "security_hotspots",
    "coverage",
    "duplicated_lines_density",
    "ncloc",
    "files",
    "functions",
    "classes",
    "complexity",
    "cognitive_complexity",
    "comment_lines_density",
    "sqale_index",
    "sqale_debt_ratio",
    "reliability_rating",
    "security_rating",
    "sqale_rating",
    "security_review_rating",
];

/// Sparse snapshot of measure values keyed by metric.
///
/// Values stay as the server sent them (numbers and ratings are both
/// strings on the wire). Fallbacks are applied by the accessors, never
/// at fetch time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    values: BTreeMap<String, String>,
}

impl MetricSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, metric: impl Into<String>, value: impl Into<String>) {
        self.values.insert(metric.into(), value.into());
    }

    /// Raw value, if the server reported one.
    pub fn get(&self, metric: &str) -> Option<&str> {
        self.values.get(metric).map(String::as_str)
    }

    /// Value or `"0"`.
    pub fn value_or_zero(&self, metric: &str) -> &str {
        self.get(metric).unwrap_or("0")
    }

    /// Value or `"N/A"`, for display.
    pub fn display(&self, metric: &str) -> &str {
        self.get(metric).unwrap_or("N/A")
    }

    /// Numeric value, `None` when missing or unparseable.
    pub fn number(&self, metric: &str) -> Option<f64> {
        self.get(metric).and_then(|v| v.trim().parse::<f64>().ok())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MetricSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut snapshot = MetricSnapshot::new();
        for (k, v) in iter {
            snapshot.insert(k, v);
        }
        snapshot
    }
}

/// SonarQube issue severity, ordered so that `Blocker` is the greatest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum IssueSeverity {
    #[default]
    Info,
    Minor,
    Major,
    Critical,
    Blocker,
}

impl IssueSeverity {
    /// Descending order, as used for distribution bars.
    pub const ALL: [IssueSeverity; 5] = [
        IssueSeverity::Blocker,
        IssueSeverity::Critical,
        IssueSeverity::Major,
        IssueSeverity::Minor,
        IssueSeverity::Info,
    ];

    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "BLOCKER" => IssueSeverity::Blocker,
            "CRITICAL" => IssueSeverity::Critical,
            "MAJOR" => IssueSeverity::Major,
            "MINOR" => IssueSeverity::Minor,
            _ => IssueSeverity::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueSeverity::Blocker => "BLOCKER",
            IssueSeverity::Critical => "CRITICAL",
            IssueSeverity::Major => "MAJOR",
            IssueSeverity::Minor => "MINOR",
            IssueSeverity::Info => "INFO",
        }
    }
}

impl std::fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SonarQube issue type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    Bug,
    Vulnerability,
    #[default]
    CodeSmell,
    SecurityHotspot,
}

impl IssueType {
    pub const ALL: [IssueType; 4] = [
        IssueType::Bug,
        IssueType::Vulnerability,
        IssueType::CodeSmell,
        IssueType::SecurityHotspot,
    ];

    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "BUG" => IssueType::Bug,
            "VULNERABILITY" => IssueType::Vulnerability,
            "SECURITY_HOTSPOT" => IssueType::SecurityHotspot,
            _ => IssueType::CodeSmell,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::Bug => "BUG",
            IssueType::Vulnerability => "VULNERABILITY",
            IssueType::CodeSmell => "CODE_SMELL",
            IssueType::SecurityHotspot => "SECURITY_HOTSPOT",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IssueType::Bug => "Bug",
            IssueType::Vulnerability => "Vulnerability",
            IssueType::CodeSmell => "Code Smell",
            IssueType::SecurityHotspot => "Security Hotspot",
        }
    }
}

/// One quality finding as reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Issue {
    /// Violated rule, usually qualified (`javascript:S2068`)
    pub rule: String,
    pub severity: IssueSeverity,
    pub issue_type: IssueType,
    pub message: String,
    /// File path relative to the project root
    pub file: String,
    pub line: Option<u32>,
    /// Remediation effort in minutes, when the server provides it
    pub effort_minutes: Option<u32>,
}

impl Issue {
    /// Rule identifier without its repository prefix.
    pub fn rule_suffix(&self) -> &str {
        rule_suffix(&self.rule)
    }

    pub fn location(&self) -> String {
        match self.line {
            Some(line) => format!("{}:{}", self.file, line),
            None => self.file.clone(),
        }
    }
}

/// Text after the last colon of a rule key (`"python:S1313"` → `"S1313"`).
pub fn rule_suffix(rule: &str) -> &str {
    rule.rsplit(':').next().unwrap_or(rule)
}

/// Hotspot vulnerability probability.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum HotspotProbability {
    #[default]
    Low,
    Medium,
    High,
}

impl HotspotProbability {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "HIGH" => HotspotProbability::High,
            "MEDIUM" => HotspotProbability::Medium,
            _ => HotspotProbability::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HotspotProbability::High => "HIGH",
            HotspotProbability::Medium => "MEDIUM",
            HotspotProbability::Low => "LOW",
        }
    }
}

/// A location flagged for manual security review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Hotspot {
    pub rule: String,
    pub message: String,
    pub file: String,
    pub line: Option<u32>,
    pub probability: HotspotProbability,
    /// Free-form security category (`weak-cryptography`, `auth`, ...)
    pub category: String,
    /// Review status (`TO_REVIEW`, `REVIEWED`)
    pub status: String,
}

impl Hotspot {
    pub fn needs_review(&self) -> bool {
        self.status.eq_ignore_ascii_case("TO_REVIEW")
    }
}

/// Quality gate verdict with its per-condition detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct QualityGate {
    /// `OK`, `WARN`, `ERROR` or `NONE`
    pub status: String,
    pub conditions: Vec<GateCondition>,
}

impl QualityGate {
    pub fn passed(&self) -> bool {
        self.status.eq_ignore_ascii_case("OK")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GateCondition {
    pub metric_key: String,
    pub comparator: String,
    pub threshold: String,
    pub actual: String,
    pub status: String,
}

/// Entry of the local rule-to-regulation mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceRule {
    /// Qualified (`repo:RULE`) or bare (`RULE`) identifier
    pub key: String,
    /// Regulation article label, e.g. `Art. 46`
    #[serde(alias = "article", alias = "gdpr_article")]
    pub lgpd_article: String,
    pub name: String,
}

/// Issue that matched the compliance mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedIssue {
    pub issue: Issue,
    pub article: String,
    pub rule_name: String,
}

/// What a compliance check is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckSource {
    Issues,
    Dependencies,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckOutcome {
    Passed,
    Failed,
    /// The data the check needs was not fetched
    NoData,
}

/// Outcome of one named compliance check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub label: String,
    pub source: CheckSource,
    pub outcome: CheckOutcome,
}

impl CheckResult {
    pub fn passed(&self) -> bool {
        self.outcome == CheckOutcome::Passed
    }

    pub fn failed(&self) -> bool {
        self.outcome == CheckOutcome::Failed
    }
}

/// Dependency vulnerability counts, summed across manifests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnerabilityCounts {
    pub critical: u64,
    pub high: u64,
    pub moderate: u64,
    pub low: u64,
    pub info: u64,
    pub total: u64,
}

impl VulnerabilityCounts {
    /// Add another manifest's counts into this one.
    pub fn accumulate(&mut self, other: &VulnerabilityCounts) {
        self.critical += other.critical;
        self.high += other.high;
        self.moderate += other.moderate;
        self.low += other.low;
        self.info += other.info;
        self.total += other.total;
    }

    pub fn is_clean(&self) -> bool {
        self.critical == 0 && self.high == 0 && self.moderate == 0 && self.low == 0 && self.info == 0
    }
}

/// Package with a newer version available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutdatedPackage {
    pub name: String,
    pub current: String,
    pub wanted: String,
    pub latest: String,
    /// Which manifest it came from (`root`, `frontend`, ...)
    pub location: String,
}

/// Aggregated dependency audit across every discovered manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DependencyAudit {
    /// Manifest labels that were found
    pub manifests: Vec<String>,
    pub dependencies: usize,
    pub dev_dependencies: usize,
    pub vulnerabilities: VulnerabilityCounts,
    pub outdated: Vec<OutdatedPackage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contributor {
    pub name: String,
    pub commits: usize,
}

/// Version-control summary. Blank defaults when unavailable.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RepoActivity {
    pub branch: String,
    pub commit_count: usize,
    pub last_commit: String,
    pub contributors: Vec<Contributor>,
}
