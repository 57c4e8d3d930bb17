//! LGPD compliance cross-referencing
//!
//! Joins SonarQube issues against the local rule-to-article mapping and
//! evaluates the fixed compliance checklist.
//!
//! # Matching
//!
//! A mapping entry matches an issue when the keys are equal, or when the
//! text after the last colon is equal. So `python:S1313` in the mapping
//! also catches `javascript:S1313`, and a bare `S1313` catches both.
//!
//! # Checklist
//!
//! [`COMPLIANCE_CHECKS`] is the whole policy: each check either forbids
//! open issues from a set of rule ids, or forbids dependency
//! vulnerabilities at one severity tier.
//!
//! Only issue-based checks feed the health score ([`ComplianceReport::score_ratio`]).
//! Vulnerabilities already weigh in through the dependency tier, so the
//! dependency checks are listed but not scored twice.

use crate::error::{ExportError, ExportResult};
use crate::models::{
    rule_suffix, AnnotatedIssue, CheckOutcome, CheckResult, CheckSource, ComplianceRule, Issue,
    VulnerabilityCounts,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Mapping shipped with the binary and written by `init`.
pub const DEFAULT_RULES_JSON: &str = include_str!("../templates/lgpd-rules.json");

/// Project-relative location `init` writes the mapping to.
pub const RULES_RELATIVE_PATH: &str = ".sonarlgpd/lgpd-rules.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VulnTier {
    Critical,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckCriterion {
    /// Passes when no open issue has one of these rule suffixes
    NoIssuesWithRules(&'static [&'static str]),
    /// Passes when the dependency audit counted zero at this tier
    NoVulnerabilities(VulnTier),
}

impl CheckCriterion {
    pub fn source(&self) -> CheckSource {
        match self {
            CheckCriterion::NoIssuesWithRules(_) => CheckSource::Issues,
            CheckCriterion::NoVulnerabilities(_) => CheckSource::Dependencies,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComplianceCheck {
    pub label: &'static str,
    pub criterion: CheckCriterion,
}

pub const COMPLIANCE_CHECKS: &[ComplianceCheck] = &[
    ComplianceCheck {
        label: "No hardcoded credentials",
        criterion: CheckCriterion::NoIssuesWithRules(&["S2068", "S6418", "S6437"]),
    },
    ComplianceCheck {
        label: "No hardcoded IP addresses",
        criterion: CheckCriterion::NoIssuesWithRules(&["S1313"]),
    },
    ComplianceCheck {
        label: "No weak cryptographic algorithms",
        criterion: CheckCriterion::NoIssuesWithRules(&["S4790", "S5547", "S4426", "S5542"]),
    },
    ComplianceCheck {
        label: "Secure random number generation",
        criterion: CheckCriterion::NoIssuesWithRules(&["S2245"]),
    },
    ComplianceCheck {
        label: "No SQL injection vectors",
        criterion: CheckCriterion::NoIssuesWithRules(&["S3649", "S2077"]),
    },
    ComplianceCheck {
        label: "No sensitive data exposed through logs",
        criterion: CheckCriterion::NoIssuesWithRules(&["S5145", "S4792"]),
    },
    ComplianceCheck {
        label: "Cookies set with Secure and HttpOnly",
        criterion: CheckCriterion::NoIssuesWithRules(&["S2092", "S3330"]),
    },
    ComplianceCheck {
        label: "TLS certificates and hostnames verified",
        criterion: CheckCriterion::NoIssuesWithRules(&["S4830", "S5527"]),
    },
    ComplianceCheck {
        label: "No critical dependency vulnerabilities",
        criterion: CheckCriterion::NoVulnerabilities(VulnTier::Critical),
    },
    ComplianceCheck {
        label: "No high dependency vulnerabilities",
        criterion: CheckCriterion::NoVulnerabilities(VulnTier::High),
    },
];

/// Organisational items no scanner can verify, listed for manual review.
pub const MANUAL_REVIEW_ITEMS: &[(&str, &str)] = &[
    ("Art. 7", "Legal basis documented for every processing activity"),
    ("Art. 9", "Privacy notice published and kept current"),
    ("Art. 15-16", "Retention periods defined and data deleted when they expire"),
    ("Art. 18", "Process in place to answer data subject requests"),
    ("Art. 33", "Safeguards for international data transfers"),
    ("Art. 37", "Record of processing activities maintained"),
    ("Art. 41", "Data Protection Officer appointed and contact published"),
    ("Art. 48", "Incident response plan including ANPD notification"),
];

#[derive(Debug, Deserialize, Serialize)]
struct RulesFile {
    rules: Vec<ComplianceRule>,
}

/// Parse a mapping document (`{"rules": [...]}`).
pub fn parse_rules(json: &str) -> Result<Vec<ComplianceRule>, serde_json::Error> {
    serde_json::from_str::<RulesFile>(json).map(|f| f.rules)
}

/// The built-in mapping.
pub fn default_rules() -> Vec<ComplianceRule> {
    // The embedded file is covered by tests
    parse_rules(DEFAULT_RULES_JSON).unwrap_or_default()
}

/// Load a mapping file, failing on unreadable or malformed input.
pub fn load_rules(path: &Path) -> ExportResult<Vec<ComplianceRule>> {
    let content = std::fs::read_to_string(path).map_err(|e| ExportError::InvalidRules {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_rules(&content).map_err(|e| ExportError::InvalidRules {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Where the mapping for `root` lives: explicit path, project file, or none.
pub fn rules_path(root: &Path, explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p.to_path_buf());
    }
    let project = root.join(RULES_RELATIVE_PATH);
    project.is_file().then_some(project)
}

/// Mapping for an export run. A broken file is reported and the built-in
/// mapping used instead.
pub fn resolve_rules(root: &Path, explicit: Option<&Path>) -> Vec<ComplianceRule> {
    match rules_path(root, explicit) {
        Some(path) => match load_rules(&path) {
            Ok(rules) => {
                debug!("Loaded {} compliance rules from {}", rules.len(), path.display());
                rules
            }
            Err(e) => {
                warn!("{}; using built-in mapping", e);
                default_rules()
            }
        },
        None => default_rules(),
    }
}

/// Annotated issues plus checklist results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComplianceReport {
    pub annotated: Vec<AnnotatedIssue>,
    pub checklist: Vec<CheckResult>,
}

impl ComplianceReport {
    pub fn passed(&self) -> usize {
        self.checklist.iter().filter(|c| c.passed()).count()
    }

    pub fn total(&self) -> usize {
        self.checklist.len()
    }

    /// `passed / total`, 0.0 for an empty checklist.
    pub fn pass_ratio(&self) -> f64 {
        if self.checklist.is_empty() {
            return 0.0;
        }
        self.passed() as f64 / self.total() as f64
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = &CheckResult> {
        self.checklist.iter().filter(|c| c.failed())
    }

    /// Pass ratio over the evaluated issue-based checks, the compliance
    /// input of the health score. `None` when none of them could be
    /// evaluated.
    pub fn score_ratio(&self) -> Option<f64> {
        let scored: Vec<&CheckResult> = self
            .checklist
            .iter()
            .filter(|c| c.source == CheckSource::Issues && c.outcome != CheckOutcome::NoData)
            .collect();
        if scored.is_empty() {
            return None;
        }
        let passed = scored.iter().filter(|c| c.passed()).count();
        Some(passed as f64 / scored.len() as f64)
    }

    /// True when issue-based checks were skipped for lack of issue data.
    pub fn missing_issue_data(&self) -> bool {
        self.checklist
            .iter()
            .any(|c| c.source == CheckSource::Issues && c.outcome == CheckOutcome::NoData)
    }

    /// Mark every issue-based check as not evaluated. Used when the issue
    /// fetch failed, so an empty issue list doesn't read as a clean pass.
    pub fn without_issue_data(mut self) -> Self {
        for check in &mut self.checklist {
            if check.source == CheckSource::Issues {
                check.outcome = CheckOutcome::NoData;
            }
        }
        self
    }
}

/// Exact-key and suffix lookups over the mapping.
///
/// On collisions the smallest entry wins (by key, then article, then
/// name), so the result does not depend on the order of the mapping file.
struct RuleIndex<'a> {
    exact: BTreeMap<&'a str, &'a ComplianceRule>,
    by_suffix: BTreeMap<&'a str, &'a ComplianceRule>,
}

impl<'a> RuleIndex<'a> {
    fn new(rules: &'a [ComplianceRule]) -> Self {
        let mut exact = BTreeMap::new();
        let mut by_suffix: BTreeMap<&str, &ComplianceRule> = BTreeMap::new();
        for rule in rules {
            exact
                .entry(rule.key.as_str())
                .and_modify(|existing: &mut &ComplianceRule| {
                    if (&rule.lgpd_article, &rule.name) < (&existing.lgpd_article, &existing.name) {
                        *existing = rule;
                    }
                })
                .or_insert(rule);
            by_suffix
                .entry(rule_suffix(&rule.key))
                .and_modify(|existing| {
                    if (&rule.key, &rule.lgpd_article, &rule.name)
                        < (&existing.key, &existing.lgpd_article, &existing.name)
                    {
                        *existing = rule;
                    }
                })
                .or_insert(rule);
        }
        Self { exact, by_suffix }
    }

    fn lookup(&self, rule: &str) -> Option<&'a ComplianceRule> {
        self.exact
            .get(rule)
            .or_else(|| self.by_suffix.get(rule_suffix(rule)))
            .copied()
    }
}

/// Cross-reference issues with the mapping and evaluate the checklist.
///
/// Pure: same inputs, same output. Annotated issues keep the order of
/// `issues`; unmatched issues are left out.
pub fn cross_reference(
    issues: &[Issue],
    rules: &[ComplianceRule],
    vulnerabilities: &VulnerabilityCounts,
) -> ComplianceReport {
    let index = RuleIndex::new(rules);
    let annotated = issues
        .iter()
        .filter_map(|issue| {
            index.lookup(&issue.rule).map(|rule| AnnotatedIssue {
                issue: issue.clone(),
                article: rule.lgpd_article.clone(),
                rule_name: rule.name.clone(),
            })
        })
        .collect();

    ComplianceReport {
        annotated,
        checklist: evaluate_checks(COMPLIANCE_CHECKS, issues, vulnerabilities),
    }
}

/// Evaluate a checklist table against already-fetched data.
pub fn evaluate_checks(
    checks: &[ComplianceCheck],
    issues: &[Issue],
    vulnerabilities: &VulnerabilityCounts,
) -> Vec<CheckResult> {
    let open_suffixes: HashSet<&str> = issues.iter().map(Issue::rule_suffix).collect();
    checks
        .iter()
        .map(|check| {
            let passed = match check.criterion {
                CheckCriterion::NoIssuesWithRules(suffixes) => {
                    !suffixes.iter().any(|s| open_suffixes.contains(s))
                }
                CheckCriterion::NoVulnerabilities(VulnTier::Critical) => {
                    vulnerabilities.critical == 0
                }
                CheckCriterion::NoVulnerabilities(VulnTier::High) => vulnerabilities.high == 0,
            };
            CheckResult {
                label: check.label.to_string(),
                source: check.criterion.source(),
                outcome: if passed {
                    CheckOutcome::Passed
                } else {
                    CheckOutcome::Failed
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(key: &str, article: &str, name: &str) -> ComplianceRule {
        ComplianceRule {
            key: key.into(),
            lgpd_article: article.into(),
            name: name.into(),
        }
    }

    fn issue(rule: &str) -> Issue {
        Issue {
            rule: rule.into(),
            message: format!("violates {}", rule),
            file: "src/app.py".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_rules_parse() {
        let rules = default_rules();
        assert!(rules.len() >= 20);
        assert!(rules.iter().any(|r| r.key == "S2068"));
    }

    #[test]
    fn test_exact_and_suffix_match() {
        let rules = vec![rule("python:S1313", "Art. 46", "Hardcoded IP")];
        let issues = vec![issue("python:S1313"), issue("other-repo:S1313"), issue("python:S100")];
        let report = cross_reference(&issues, &rules, &VulnerabilityCounts::default());

        assert_eq!(report.annotated.len(), 2);
        assert_eq!(report.annotated[0].issue.rule, "python:S1313");
        assert_eq!(report.annotated[1].issue.rule, "other-repo:S1313");
        assert!(report.annotated.iter().all(|a| a.article == "Art. 46"));
        assert_eq!(report.annotated[0].rule_name, "Hardcoded IP");
    }

    #[test]
    fn test_bare_key_matches_qualified_issue() {
        let rules = vec![rule("S2068", "Art. 46", "Credentials")];
        let report = cross_reference(
            &[issue("javascript:S2068")],
            &rules,
            &VulnerabilityCounts::default(),
        );
        assert_eq!(report.annotated.len(), 1);
    }

    #[test]
    fn test_exact_match_beats_suffix() {
        let rules = vec![
            rule("java:S4790", "Art. 46", "Java hashing"),
            rule("python:S4790", "Art. 49", "Python hashing"),
        ];
        let report = cross_reference(
            &[issue("python:S4790"), issue("go:S4790")],
            &rules,
            &VulnerabilityCounts::default(),
        );
        assert_eq!(report.annotated[0].rule_name, "Python hashing");
        // Suffix collision resolves to the smallest key
        assert_eq!(report.annotated[1].rule_name, "Java hashing");
    }

    #[test]
    fn test_cross_reference_is_deterministic_and_order_independent() {
        let mut rules = vec![
            rule("java:S4790", "Art. 46", "Java hashing"),
            rule("python:S4790", "Art. 49", "Python hashing"),
            rule("S2068", "Art. 46", "Credentials"),
        ];
        let issues = vec![issue("go:S4790"), issue("js:S2068"), issue("js:S1")];
        let vulns = VulnerabilityCounts {
            high: 1,
            ..Default::default()
        };

        let first = cross_reference(&issues, &rules, &vulns);
        let second = cross_reference(&issues, &rules, &vulns);
        assert_eq!(first, second);

        rules.reverse();
        let reversed = cross_reference(&issues, &rules, &vulns);
        assert_eq!(first, reversed);
    }

    #[test]
    fn test_checklist_all_pass_when_clean() {
        let report = cross_reference(&[], &default_rules(), &VulnerabilityCounts::default());
        assert_eq!(report.total(), COMPLIANCE_CHECKS.len());
        assert_eq!(report.passed(), report.total());
        assert_eq!(report.pass_ratio(), 1.0);
        assert_eq!(report.score_ratio(), Some(1.0));
        assert!(!report.missing_issue_data());
    }

    #[test]
    fn test_checklist_failures() {
        let vulns = VulnerabilityCounts {
            critical: 1,
            total: 1,
            ..Default::default()
        };
        let report = cross_reference(&[issue("php:S2068")], &[], &vulns);
        let failed: Vec<&str> = report.failed_checks().map(|c| c.label.as_str()).collect();
        assert_eq!(
            failed,
            vec!["No hardcoded credentials", "No critical dependency vulnerabilities"]
        );
        assert!(report.annotated.is_empty());
        let expected = (COMPLIANCE_CHECKS.len() - 2) as f64 / COMPLIANCE_CHECKS.len() as f64;
        assert!((report.pass_ratio() - expected).abs() < 1e-9);
        // Only the credentials check counts toward the score: 7 of 8 issue checks pass
        assert!((report.score_ratio().unwrap() - 7.0 / 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_dependency_checks_are_not_scored() {
        let vulns = VulnerabilityCounts {
            critical: 1,
            high: 2,
            total: 3,
            ..Default::default()
        };
        let report = cross_reference(&[], &default_rules(), &vulns);
        assert_eq!(report.failed_checks().count(), 2);
        assert!(report.failed_checks().all(|c| c.source == CheckSource::Dependencies));
        assert_eq!(report.score_ratio(), Some(1.0));
    }

    #[test]
    fn test_without_issue_data() {
        let vulns = VulnerabilityCounts {
            high: 1,
            total: 1,
            ..Default::default()
        };
        let report = cross_reference(&[], &default_rules(), &vulns).without_issue_data();

        assert!(report.missing_issue_data());
        assert_eq!(report.score_ratio(), None);
        // Dependency checks are still evaluated
        let failed: Vec<&str> = report.failed_checks().map(|c| c.label.as_str()).collect();
        assert_eq!(failed, vec!["No high dependency vulnerabilities"]);
        assert_eq!(report.passed(), 1);
        assert!(report
            .checklist
            .iter()
            .filter(|c| c.source == CheckSource::Issues)
            .all(|c| c.outcome == CheckOutcome::NoData));
    }

    #[test]
    fn test_checklist_order_is_table_order() {
        let results = evaluate_checks(COMPLIANCE_CHECKS, &[], &VulnerabilityCounts::default());
        let labels: Vec<&str> = results.iter().map(|r| r.label.as_str()).collect();
        let expected: Vec<&str> = COMPLIANCE_CHECKS.iter().map(|c| c.label).collect();
        assert_eq!(labels, expected);
    }

    #[test]
    fn test_empty_checklist_ratio_is_zero() {
        assert_eq!(ComplianceReport::default().pass_ratio(), 0.0);
        assert_eq!(ComplianceReport::default().score_ratio(), None);
    }

    #[test]
    fn test_load_rules_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let bad = tmp.path().join("bad.json");
        std::fs::write(&bad, r#"{"rules": [{"key": 1}]}"#).unwrap();
        assert!(matches!(load_rules(&bad), Err(ExportError::InvalidRules { .. })));
        assert!(load_rules(&tmp.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_resolve_rules_prefers_project_file() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(resolve_rules(tmp.path(), None), default_rules());

        let path = tmp.path().join(RULES_RELATIVE_PATH);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            r#"{"rules":[{"key":"S1","lgpd_article":"Art. 1","name":"One"}]}"#,
        )
        .unwrap();
        let rules = resolve_rules(tmp.path(), None);
        assert_eq!(rules.len(), 1);

        // Broken file falls back to the built-in mapping
        std::fs::write(&path, "nope").unwrap();
        assert_eq!(resolve_rules(tmp.path(), None), default_rules());
    }
}
