//! Markdown LGPD checklist
//!
//! Groups the compliance mapping by article with a checkbox per rule,
//! followed by the automated checks and the manual review items. Suitable
//! for committing next to the code or pasting into a pull request.

use crate::compliance::{CheckCriterion, VulnTier, COMPLIANCE_CHECKS, MANUAL_REVIEW_ITEMS};
use crate::models::ComplianceRule;
use chrono::{DateTime, Local};
use std::collections::BTreeMap;

/// Render the checklist for `project`.
pub fn render_checklist(
    project: &str,
    rules: &[ComplianceRule],
    generated_at: DateTime<Local>,
) -> String {
    let mut md = String::new();

    md.push_str(&format!("# LGPD Compliance Checklist: {}\n\n", escape(project)));
    md.push_str(&format!(
        "_Generated {} by sonarlgpd {}_\n\n",
        generated_at.format("%Y-%m-%d %H:%M"),
        env!("CARGO_PKG_VERSION")
    ));
    md.push_str(
        "Run `sonarlgpd export` to verify the automated items against the latest analysis.\n\n",
    );

    md.push_str(&render_rules_by_article(rules));
    md.push_str(&render_automated_checks());
    md.push_str(&render_manual_review());
    md
}

fn render_rules_by_article(rules: &[ComplianceRule]) -> String {
    let mut by_article: BTreeMap<&str, Vec<&ComplianceRule>> = BTreeMap::new();
    for rule in rules {
        by_article.entry(rule.lgpd_article.as_str()).or_default().push(rule);
    }

    let mut md = format!("## Rules by Article ({} rules)\n\n", rules.len());
    if rules.is_empty() {
        md.push_str("_The compliance mapping is empty._\n\n");
        return md;
    }
    for (article, mut group) in by_article {
        group.sort_by(|a, b| a.key.cmp(&b.key));
        md.push_str(&format!("### {}\n\n", escape(article)));
        for rule in group {
            md.push_str(&format!("- [ ] `{}` {}\n", rule.key, escape(&rule.name)));
        }
        md.push('\n');
    }
    md
}

fn render_automated_checks() -> String {
    let mut md = String::from("## Automated Checks\n\n");
    md.push_str("| Check | Passes when |\n|-------|-------------|\n");
    for check in COMPLIANCE_CHECKS {
        let condition = match check.criterion {
            CheckCriterion::NoIssuesWithRules(suffixes) => {
                format!("no open issue for {}", suffixes.join(", "))
            }
            CheckCriterion::NoVulnerabilities(VulnTier::Critical) => {
                "no critical dependency vulnerabilities".to_string()
            }
            CheckCriterion::NoVulnerabilities(VulnTier::High) => {
                "no high dependency vulnerabilities".to_string()
            }
        };
        md.push_str(&format!("| {} | {} |\n", check.label, condition));
    }
    md.push('\n');
    md
}

fn render_manual_review() -> String {
    let mut md = String::from("## Manual Review\n\n");
    for (article, item) in MANUAL_REVIEW_ITEMS {
        md.push_str(&format!("- [ ] **{}** {}\n", article, item));
    }
    md
}

/// Escape characters that would change table or inline formatting.
fn escape(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rule(key: &str, article: &str, name: &str) -> ComplianceRule {
        ComplianceRule {
            key: key.to_string(),
            lgpd_article: article.to_string(),
            name: name.to_string(),
        }
    }

    fn when() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_groups_rules_by_article() {
        let rules = vec![
            rule("S5332", "Art. 46", "Clear-text protocols"),
            rule("S2068", "Art. 46", "Hard-coded credentials"),
            rule("S4507", "Art. 49", "Debug features enabled"),
        ];
        let md = render_checklist("shop", &rules, when());

        let art46 = md.find("### Art. 46").unwrap();
        let art49 = md.find("### Art. 49").unwrap();
        assert!(art46 < art49);
        // Sorted by key inside an article
        assert!(md.find("`S2068`").unwrap() < md.find("`S5332`").unwrap());
        assert!(md.contains("- [ ] `S4507` Debug features enabled"));
        assert!(md.contains("(3 rules)"));
    }

    #[test]
    fn test_lists_checks_and_manual_items() {
        let md = render_checklist("shop", &[], when());
        assert!(md.contains("The compliance mapping is empty."));
        for check in COMPLIANCE_CHECKS {
            assert!(md.contains(check.label));
        }
        for (_, item) in MANUAL_REVIEW_ITEMS {
            assert!(md.contains(item));
        }
        assert!(md.contains("_Generated 2026-03-01 09:30"));
    }

    #[test]
    fn test_escapes_pipes() {
        let md = render_checklist("a|b", &[rule("S1", "Art. 6", "x | y")], when());
        assert!(md.contains("a\\|b"));
        assert!(md.contains("x \\| y"));
    }
}
