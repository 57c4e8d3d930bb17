//! Report renderers
//!
//! - `html` - the standalone export report
//! - `markdown` - the LGPD checklist written by `sonarlgpd report`
//!
//! Renderers are pure: they take resolved data and return text. Writing
//! the file (and opening it) is the caller's job.

pub mod html;
pub mod markdown;

use crate::compliance::ComplianceReport;
use crate::models::{DependencyAudit, MetricSnapshot, QualityGate, RepoActivity};
use crate::scoring::{DebtTime, ScoreBreakdown};
use crate::sonar::{HotspotSet, IssueSet};
use chrono::{DateTime, Local};

/// Maximum number of issues in the full listing
pub const ISSUE_LISTING_CAP: usize = 100;

/// Number of rows in the "files with most issues" table
pub const TOP_FILES: usize = 15;

/// Everything one export run gathered, ready to render.
///
/// Optional sections are `None` when their source was unavailable or
/// skipped; the renderer says so instead of dropping the section.
#[derive(Debug, Clone)]
pub struct ReportData {
    pub project_name: String,
    pub project_key: String,
    pub server_url: String,
    pub generated_at: DateTime<Local>,
    pub metrics: MetricSnapshot,
    pub quality_gate: Option<QualityGate>,
    pub issues: Option<IssueSet>,
    pub hotspots: Option<HotspotSet>,
    pub compliance: ComplianceReport,
    pub dependencies: Option<DependencyAudit>,
    pub activity: Option<RepoActivity>,
    pub score: ScoreBreakdown,
    pub debt: DebtTime,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::compliance::{cross_reference, default_rules};
    use crate::models::{
        Hotspot, HotspotProbability, Issue, IssueSeverity, IssueType, VulnerabilityCounts,
    };
    use crate::scoring::{score_breakdown, NEUTRAL_COMPLIANCE_RATIO};
    use chrono::TimeZone;

    pub(crate) fn issue(rule: &str, severity: IssueSeverity, file: &str, message: &str) -> Issue {
        Issue {
            rule: rule.to_string(),
            severity,
            issue_type: IssueType::Vulnerability,
            message: message.to_string(),
            file: file.to_string(),
            line: Some(12),
            effort_minutes: Some(15),
        }
    }

    /// A populated report with one LGPD-relevant issue and one hotspot.
    pub(crate) fn sample_report() -> ReportData {
        let metrics: MetricSnapshot = [
            ("bugs", "2"),
            ("vulnerabilities", "1"),
            ("code_smells", "14"),
            ("coverage", "61.5"),
            ("duplicated_lines_density", "4.2"),
            ("ncloc", "5400"),
            ("sqale_index", "960"),
            ("reliability_rating", "2.0"),
            ("security_rating", "3.0"),
            ("sqale_rating", "1.0"),
        ]
        .into_iter()
        .collect();

        let issues = vec![
            issue("java:S2068", IssueSeverity::Blocker, "src/Db.java", "Remove this hard-coded password."),
            issue("java:S1481", IssueSeverity::Minor, "src/Db.java", "Remove unused local variable."),
            issue("java:S1481", IssueSeverity::Minor, "src/App.java", "Remove unused local variable."),
        ];
        let vulns = VulnerabilityCounts {
            high: 2,
            total: 2,
            ..Default::default()
        };
        let compliance = cross_reference(&issues, &default_rules(), &vulns);
        let score = score_breakdown(
            &metrics,
            compliance.score_ratio().unwrap_or(NEUTRAL_COMPLIANCE_RATIO),
            &vulns,
        );

        ReportData {
            project_name: "Shop API".to_string(),
            project_key: "shop-api".to_string(),
            server_url: "http://localhost:9000".to_string(),
            generated_at: Local.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap(),
            metrics,
            quality_gate: Some(QualityGate {
                status: "ERROR".to_string(),
                conditions: vec![crate::models::GateCondition {
                    metric_key: "new_coverage".to_string(),
                    comparator: "LT".to_string(),
                    threshold: "80".to_string(),
                    actual: "61.5".to_string(),
                    status: "ERROR".to_string(),
                }],
            }),
            issues: Some(IssueSet {
                total_reported: issues.len() as u64,
                issues,
            }),
            hotspots: Some(HotspotSet {
                hotspots: vec![Hotspot {
                    rule: "java:S4790".to_string(),
                    message: "Make sure this weak hash algorithm is not used in a sensitive context."
                        .to_string(),
                    file: "src/Crypto.java".to_string(),
                    line: Some(40),
                    probability: HotspotProbability::Medium,
                    category: "weak-cryptography".to_string(),
                    status: "TO_REVIEW".to_string(),
                }],
                total_reported: 1,
            }),
            compliance,
            dependencies: Some(DependencyAudit {
                manifests: vec!["root".to_string()],
                dependencies: 12,
                dev_dependencies: 4,
                vulnerabilities: vulns,
                outdated: vec![],
            }),
            activity: Some(RepoActivity {
                branch: "main".to_string(),
                commit_count: 42,
                last_commit: "a1b2c3d Add checkout".to_string(),
                contributors: vec![],
            }),
            score,
            debt: DebtTime::from_minutes(960),
        }
    }
}
