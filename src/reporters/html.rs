//! HTML export report with embedded styles
//!
//! Generates a standalone HTML report that can be viewed in any browser.
//! Sections always appear in the order of [`SECTIONS`], and the table of
//! contents is generated from the same table so every link has a target.
//! Sections whose data was unavailable still render, with a notice.

use super::{ReportData, ISSUE_LISTING_CAP, TOP_FILES};
use crate::compliance::MANUAL_REVIEW_ITEMS;
use crate::models::{CheckOutcome, Hotspot, Issue, IssueSeverity, IssueType};
use crate::scoring::{
    rating_letter, ScoreBand, COMPLIANCE_WEIGHT, DEPENDENCY_WEIGHT, MAINTAINABILITY_WEIGHT,
    RELIABILITY_WEIGHT, SECURITY_WEIGHT,
};
use std::collections::{BTreeMap, HashMap};

/// Anchor id and title of every section after the header, in order.
pub const SECTIONS: &[(&str, &str)] = &[
    ("health-score", "Health Score"),
    ("quality-gate", "Quality Gate"),
    ("metrics", "Code Quality Metrics"),
    ("distribution", "Issue Distribution"),
    ("hotspots", "Security Hotspots"),
    ("compliance", "LGPD Compliance"),
    ("dependencies", "Dependencies"),
    ("architecture", "Architecture Metrics"),
    ("technical-debt", "Technical Debt"),
    ("top-files", "Files With Most Issues"),
    ("issues", "All Issues"),
    ("activity", "Repository Activity"),
    ("recommendations", "Recommendations"),
];

/// Render the export report as standalone HTML.
pub fn render(data: &ReportData) -> String {
    let mut html = String::with_capacity(64 * 1024);

    html.push_str(&render_head(data));
    html.push_str("<body>\n<div class=\"container\">\n");
    html.push_str(&render_header(data));
    html.push_str("<div class=\"content\">\n");
    html.push_str(&render_toc());

    for (id, title) in SECTIONS {
        let body = match *id {
            "health-score" => render_health_score(data),
            "quality-gate" => render_quality_gate(data),
            "metrics" => render_metrics(data),
            "distribution" => render_distribution(data),
            "hotspots" => render_hotspots(data),
            "compliance" => render_compliance(data),
            "dependencies" => render_dependencies(data),
            "architecture" => render_architecture(data),
            "technical-debt" => render_debt(data),
            "top-files" => render_top_files(data),
            "issues" => render_issue_listing(data),
            "activity" => render_activity(data),
            "recommendations" => render_recommendations(data),
            _ => String::new(),
        };
        html.push_str(&format!(
            "<div class=\"section\" id=\"{}\">\n    <h2 class=\"section-title\">{}</h2>\n{}</div>\n",
            id, title, body
        ));
    }

    html.push_str("</div>\n"); // content
    html.push_str(&render_footer(data));
    html.push_str("</div>\n</body>\n</html>\n");
    html
}

fn render_head(data: &ReportData) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - Quality &amp; LGPD Report</title>
    <style>
{CSS}
    </style>
</head>
"#,
        html_escape(&data.project_name)
    )
}

fn render_header(data: &ReportData) -> String {
    let (branch, commits) = match &data.activity {
        Some(a) if !a.branch.is_empty() => (a.branch.as_str(), a.commit_count.to_string()),
        _ => ("unknown", "unknown".to_string()),
    };
    format!(
        r#"<div class="header">
    <h1>{}</h1>
    <p class="subtitle">Quality &amp; LGPD Compliance Report</p>
    <p class="timestamp">Project <code>{}</code> &middot; Generated {} &middot; Branch {} &middot; {} commits</p>
</div>
"#,
        html_escape(&data.project_name),
        html_escape(&data.project_key),
        data.generated_at.format("%Y-%m-%d %H:%M:%S"),
        html_escape(branch),
        commits
    )
}

fn render_toc() -> String {
    let mut html = String::from("<nav class=\"toc\">\n    <h2>Contents</h2>\n    <ol>\n");
    for (id, title) in SECTIONS {
        html.push_str(&format!(
            "        <li><a href=\"#{}\">{}</a></li>\n",
            id, title
        ));
    }
    html.push_str("    </ol>\n</nav>\n");
    html
}

fn render_health_score(data: &ReportData) -> String {
    let score = &data.score;
    let band = score.band();
    let components = [
        ("Reliability", score.reliability, RELIABILITY_WEIGHT),
        ("Security", score.security, SECURITY_WEIGHT),
        ("Maintainability", score.maintainability, MAINTAINABILITY_WEIGHT),
        ("LGPD Compliance", score.compliance, COMPLIANCE_WEIGHT),
        ("Dependencies", score.dependencies, DEPENDENCY_WEIGHT),
    ];

    let mut html = format!(
        r#"    <div class="score-section">
        <div class="score-badge {}">{}</div>
        <p class="score-label">{} ({}/100)</p>
    </div>
    <div class="metrics-grid">
"#,
        band.css_class(),
        score.total,
        band.label(),
        score.total
    );
    for (label, value, weight) in components {
        html.push_str(&format!(
            r#"        <div class="metric-card">
            <h3>{} ({:.0}%)</h3>
            <div class="metric-value">{:.0}</div>
            <div class="metric-bar"><div class="metric-bar-fill {}" style="width: {:.0}%"></div></div>
        </div>
"#,
            label,
            weight * 100.0,
            value,
            bar_class(value),
            value
        ));
    }
    html.push_str("    </div>\n");
    html
}

fn render_quality_gate(data: &ReportData) -> String {
    let Some(gate) = &data.quality_gate else {
        return unavailable("Quality gate status could not be fetched.");
    };

    let (class, label) = if gate.passed() {
        ("gate-passed", "PASSED")
    } else {
        ("gate-failed", "FAILED")
    };
    let mut html = format!(
        "    <p><span class=\"gate-badge {}\">{}</span> status <code>{}</code></p>\n",
        class,
        label,
        html_escape(&gate.status)
    );

    if gate.conditions.is_empty() {
        html.push_str("    <p class=\"muted\">No conditions reported.</p>\n");
        return html;
    }

    html.push_str(
        "    <table>\n        <tr><th>Metric</th><th>Comparator</th><th>Threshold</th><th>Actual</th><th>Status</th></tr>\n",
    );
    for c in &gate.conditions {
        html.push_str(&format!(
            "        <tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class=\"{}\">{}</td></tr>\n",
            html_escape(&c.metric_key),
            html_escape(&c.comparator),
            html_escape(&c.threshold),
            html_escape(&c.actual),
            if c.status.eq_ignore_ascii_case("OK") { "ok" } else { "fail" },
            html_escape(&c.status)
        ));
    }
    html.push_str("    </table>\n");
    html
}

fn render_metrics(data: &ReportData) -> String {
    let m = &data.metrics;
    let stats = [
        ("Bugs", m.value_or_zero("bugs").to_string()),
        ("Vulnerabilities", m.value_or_zero("vulnerabilities").to_string()),
        ("Code Smells", m.value_or_zero("code_smells").to_string()),
        ("Security Hotspots", m.value_or_zero("security_hotspots").to_string()),
        ("Coverage", percent(m.get("coverage"))),
        ("Duplications", percent(m.get("duplicated_lines_density"))),
        ("Reliability", rating_letter(m.get("reliability_rating")).to_string()),
        ("Security", rating_letter(m.get("security_rating")).to_string()),
        ("Maintainability", rating_letter(m.get("sqale_rating")).to_string()),
    ];
    stat_grid(&stats)
}

fn render_distribution(data: &ReportData) -> String {
    let Some(set) = &data.issues else {
        return unavailable("Issues could not be fetched.");
    };

    let mut by_severity: HashMap<IssueSeverity, usize> = HashMap::new();
    let mut by_type: HashMap<IssueType, usize> = HashMap::new();
    for issue in &set.issues {
        *by_severity.entry(issue.severity).or_default() += 1;
        *by_type.entry(issue.issue_type).or_default() += 1;
    }

    let severities: Vec<(&str, usize, String)> = IssueSeverity::ALL
        .iter()
        .map(|s| {
            (
                s.as_str(),
                by_severity.get(s).copied().unwrap_or(0),
                format!("severity-{}", s.as_str().to_lowercase()),
            )
        })
        .collect();
    let types: Vec<(&str, usize, String)> = IssueType::ALL
        .iter()
        .map(|t| {
            (
                t.label(),
                by_type.get(t).copied().unwrap_or(0),
                "type-bar".to_string(),
            )
        })
        .collect();

    let mut html = format!(
        "    <p class=\"muted\">{} issues fetched ({} reported by the server).</p>\n",
        set.issues.len(),
        set.total_reported
    );
    html.push_str("    <h3>By Severity</h3>\n");
    html.push_str(&distribution_bars(&severities));
    html.push_str("    <h3>By Type</h3>\n");
    html.push_str(&distribution_bars(&types));
    html
}

fn distribution_bars(rows: &[(&str, usize, String)]) -> String {
    let max = rows.iter().map(|r| r.1).max().unwrap_or(0).max(1);
    let mut html = String::from("    <div class=\"bars\">\n");
    for (label, count, class) in rows {
        html.push_str(&format!(
            r#"        <div class="bar-row"><span class="bar-label">{}</span><div class="bar-track"><div class="bar-fill {}" style="width: {:.0}%"></div></div><span class="bar-count">{}</span></div>
"#,
            label,
            class,
            *count as f64 / max as f64 * 100.0,
            count
        ));
    }
    html.push_str("    </div>\n");
    html
}

fn render_hotspots(data: &ReportData) -> String {
    let Some(set) = &data.hotspots else {
        return unavailable("Security hotspots could not be fetched.");
    };
    if set.hotspots.is_empty() {
        return "    <p class=\"ok\">No security hotspots.</p>\n".to_string();
    }

    let mut by_category: BTreeMap<&str, usize> = BTreeMap::new();
    for h in &set.hotspots {
        *by_category.entry(category_label(h)).or_default() += 1;
    }

    let mut html = String::from("    <h3>By Category</h3>\n    <table>\n        <tr><th>Category</th><th>Count</th></tr>\n");
    for (category, count) in &by_category {
        html.push_str(&format!(
            "        <tr><td>{}</td><td>{}</td></tr>\n",
            html_escape(category),
            count
        ));
    }
    html.push_str("    </table>\n");

    html.push_str(&format!(
        "    <h3>All Hotspots ({})</h3>\n    <table>\n        <tr><th>Probability</th><th>Category</th><th>Status</th><th>Location</th><th>Message</th></tr>\n",
        set.hotspots.len()
    ));
    for h in &set.hotspots {
        let location = match h.line {
            Some(line) => format!("{}:{}", h.file, line),
            None => h.file.clone(),
        };
        html.push_str(&format!(
            "        <tr><td><span class=\"prob prob-{}\">{}</span></td><td>{}</td><td>{}</td><td><code>{}</code></td><td>{}</td></tr>\n",
            h.probability.as_str().to_lowercase(),
            h.probability.as_str(),
            html_escape(category_label(h)),
            html_escape(&h.status),
            html_escape(&location),
            html_escape(&h.message)
        ));
    }
    html.push_str("    </table>\n");
    html
}

fn category_label(hotspot: &Hotspot) -> &str {
    if hotspot.category.is_empty() {
        "uncategorized"
    } else {
        &hotspot.category
    }
}

fn render_compliance(data: &ReportData) -> String {
    let report = &data.compliance;
    let ratio = report.pass_ratio() * 100.0;

    let mut html = format!(
        r#"    <div class="score-section">
        <div class="metric-value">{}/{} checks passed</div>
        <div class="metric-bar"><div class="metric-bar-fill {}" style="width: {:.0}%"></div></div>
    </div>
    <h3>Automated Checks</h3>
    <ul class="checklist">
"#,
        report.passed(),
        report.total(),
        bar_class(ratio),
        ratio
    );
    for check in &report.checklist {
        let (class, mark) = match check.outcome {
            CheckOutcome::Passed => ("ok", "&#10003;"),
            CheckOutcome::Failed => ("fail", "&#10007;"),
            CheckOutcome::NoData => ("muted", "?"),
        };
        html.push_str(&format!(
            "        <li class=\"{}\">{} {}</li>\n",
            class,
            mark,
            html_escape(&check.label)
        ));
    }
    html.push_str("    </ul>\n");
    if report.missing_issue_data() {
        html.push_str("    <p class=\"muted\">Issues could not be fetched; issue-based checks were not evaluated and count as neutral in the health score.</p>\n");
    }

    html.push_str(&format!(
        "    <h3>Issues Mapped to LGPD Articles ({})</h3>\n",
        report.annotated.len()
    ));
    if report.annotated.is_empty() {
        html.push_str("    <p class=\"ok\">No open issues match the compliance mapping.</p>\n");
    } else {
        html.push_str("    <table>\n        <tr><th>Article</th><th>Rule</th><th>Severity</th><th>Location</th><th>Message</th></tr>\n");
        for a in &report.annotated {
            html.push_str(&format!(
                "        <tr><td>{}</td><td>{}<br><code>{}</code></td><td>{}</td><td><code>{}</code></td><td>{}</td></tr>\n",
                html_escape(&a.article),
                html_escape(&a.rule_name),
                html_escape(&a.issue.rule),
                severity_badge(a.issue.severity),
                html_escape(&a.issue.location()),
                html_escape(&a.issue.message)
            ));
        }
        html.push_str("    </table>\n");
    }

    html.push_str("    <h3>Manual Review</h3>\n    <ul class=\"checklist manual\">\n");
    for (article, item) in MANUAL_REVIEW_ITEMS {
        html.push_str(&format!(
            "        <li><input type=\"checkbox\"> <strong>{}</strong> {}</li>\n",
            html_escape(article),
            html_escape(item)
        ));
    }
    html.push_str("    </ul>\n");
    html
}

fn render_dependencies(data: &ReportData) -> String {
    let Some(deps) = &data.dependencies else {
        return unavailable("Dependency audit was skipped.");
    };
    if deps.manifests.is_empty() {
        return "    <p class=\"muted\">No package.json found in the project.</p>\n".to_string();
    }

    let v = &deps.vulnerabilities;
    let mut html = format!(
        "    <p class=\"muted\">Manifests audited: {}. {} dependencies, {} dev dependencies.</p>\n",
        html_escape(&deps.manifests.join(", ")),
        deps.dependencies,
        deps.dev_dependencies
    );
    html.push_str(&format!(
        r#"    <div class="severity-summary">
        <div class="severity-item"><span class="severity-badge severity-blocker">Critical</span><span class="severity-count">{}</span></div>
        <div class="severity-item"><span class="severity-badge severity-critical">High</span><span class="severity-count">{}</span></div>
        <div class="severity-item"><span class="severity-badge severity-major">Moderate</span><span class="severity-count">{}</span></div>
        <div class="severity-item"><span class="severity-badge severity-minor">Low</span><span class="severity-count">{}</span></div>
        <div class="severity-item"><span class="severity-badge severity-info">Info</span><span class="severity-count">{}</span></div>
        <div class="severity-item"><span class="severity-label">Total</span><span class="severity-count">{}</span></div>
    </div>
"#,
        v.critical, v.high, v.moderate, v.low, v.info, v.total
    ));

    html.push_str(&format!("    <h3>Outdated Packages ({})</h3>\n", deps.outdated.len()));
    if deps.outdated.is_empty() {
        html.push_str("    <p class=\"ok\">All packages are up to date.</p>\n");
        return html;
    }
    html.push_str("    <table>\n        <tr><th>Package</th><th>Current</th><th>Wanted</th><th>Latest</th><th>Location</th></tr>\n");
    for p in &deps.outdated {
        html.push_str(&format!(
            "        <tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            html_escape(&p.name),
            html_escape(&p.current),
            html_escape(&p.wanted),
            html_escape(&p.latest),
            html_escape(&p.location)
        ));
    }
    html.push_str("    </table>\n");
    html
}

fn render_architecture(data: &ReportData) -> String {
    let m = &data.metrics;
    let stats = [
        ("Lines of Code", m.display("ncloc").to_string()),
        ("Files", m.display("files").to_string()),
        ("Functions", m.display("functions").to_string()),
        ("Classes", m.display("classes").to_string()),
        ("Cyclomatic Complexity", m.display("complexity").to_string()),
        ("Cognitive Complexity", m.display("cognitive_complexity").to_string()),
        ("Comment Density", percent(m.get("comment_lines_density"))),
    ];
    stat_grid(&stats)
}

fn render_debt(data: &ReportData) -> String {
    let debt = &data.debt;
    let ratio = percent(data.metrics.get("sqale_debt_ratio"));
    let stats = [
        ("Minutes", debt.minutes.to_string()),
        ("Hours", format!("{:.1}", debt.hours)),
        ("Workdays (8h)", format!("{:.1}", debt.days)),
        ("Debt Ratio", ratio),
    ];
    stat_grid(&stats)
}

/// Files ranked by issue count, ties broken by path.
pub(crate) fn top_files(issues: &[Issue], limit: usize) -> Vec<(&str, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for issue in issues.iter().filter(|i| !i.file.is_empty()) {
        *counts.entry(issue.file.as_str()).or_default() += 1;
    }
    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(limit);
    ranked
}

fn render_top_files(data: &ReportData) -> String {
    let Some(set) = &data.issues else {
        return unavailable("Issues could not be fetched.");
    };
    let ranked = top_files(&set.issues, TOP_FILES);
    if ranked.is_empty() {
        return "    <p class=\"ok\">No files with open issues.</p>\n".to_string();
    }

    let mut html = String::from("    <table>\n        <tr><th>#</th><th>File</th><th>Issues</th></tr>\n");
    for (rank, (file, count)) in ranked.iter().enumerate() {
        html.push_str(&format!(
            "        <tr><td>{}</td><td><code>{}</code></td><td>{}</td></tr>\n",
            rank + 1,
            html_escape(file),
            count
        ));
    }
    html.push_str("    </table>\n");
    html
}

fn render_issue_listing(data: &ReportData) -> String {
    let Some(set) = &data.issues else {
        return unavailable("Issues could not be fetched.");
    };
    if set.issues.is_empty() {
        return "    <p class=\"ok\">No open issues.</p>\n".to_string();
    }

    let shown = set.issues.len().min(ISSUE_LISTING_CAP);
    let mut html = format!(
        "    <p class=\"muted\">Showing {} of {} issues, most severe first.</p>\n",
        shown,
        set.issues.len()
    );
    html.push_str("    <table>\n        <tr><th>Severity</th><th>Type</th><th>Rule</th><th>Location</th><th>Message</th><th>Effort</th></tr>\n");
    for issue in set.issues.iter().take(ISSUE_LISTING_CAP) {
        let effort = issue
            .effort_minutes
            .map(|m| format!("{}min", m))
            .unwrap_or_default();
        html.push_str(&format!(
            "        <tr><td>{}</td><td>{}</td><td><code>{}</code></td><td><code>{}</code></td><td>{}</td><td>{}</td></tr>\n",
            severity_badge(issue.severity),
            issue.issue_type.label(),
            html_escape(&issue.rule),
            html_escape(&issue.location()),
            html_escape(&issue.message),
            effort
        ));
    }
    html.push_str("    </table>\n");
    html
}

fn render_activity(data: &ReportData) -> String {
    let Some(activity) = &data.activity else {
        return unavailable("Repository activity was skipped.");
    };
    if activity.branch.is_empty() && activity.commit_count == 0 {
        return unavailable("No git history found.");
    }

    let mut html = stat_grid(&[
        ("Branch", activity.branch.clone()),
        ("Commits", activity.commit_count.to_string()),
        ("Contributors", activity.contributors.len().to_string()),
    ]);
    html.push_str(&format!(
        "    <p>Last commit: <code>{}</code></p>\n",
        html_escape(&activity.last_commit)
    ));
    if !activity.contributors.is_empty() {
        html.push_str("    <table>\n        <tr><th>Contributor</th><th>Commits</th></tr>\n");
        for c in &activity.contributors {
            html.push_str(&format!(
                "        <tr><td>{}</td><td>{}</td></tr>\n",
                html_escape(&c.name),
                c.commits
            ));
        }
        html.push_str("    </table>\n");
    }
    html
}

fn render_recommendations(data: &ReportData) -> String {
    let mut html = String::from("    <ul class=\"recommendations\">\n");
    for line in recommendations(data) {
        html.push_str(&format!("        <li>{}</li>\n", html_escape(&line)));
    }
    html.push_str("    </ul>\n");
    html
}

/// Coverage below this percentage triggers a recommendation
const COVERAGE_TARGET: f64 = 80.0;
/// Duplication above this percentage triggers a recommendation
const DUPLICATION_LIMIT: f64 = 3.0;
/// Debt above this many workdays triggers a recommendation
const DEBT_DAYS_LIMIT: f64 = 5.0;

/// Threshold rules over the gathered data, most urgent first.
pub(crate) fn recommendations(data: &ReportData) -> Vec<String> {
    let mut out = Vec::new();

    if let Some(deps) = &data.dependencies {
        let v = &deps.vulnerabilities;
        if v.critical > 0 {
            out.push(format!(
                "Fix {} critical dependency vulnerabilities now (npm audit fix).",
                v.critical
            ));
        }
        if v.high > 0 {
            out.push(format!(
                "Fix {} high severity dependency vulnerabilities.",
                v.high
            ));
        }
    }

    if let Some(gate) = &data.quality_gate {
        if !gate.passed() {
            let failing: Vec<&str> = gate
                .conditions
                .iter()
                .filter(|c| !c.status.eq_ignore_ascii_case("OK"))
                .map(|c| c.metric_key.as_str())
                .collect();
            if failing.is_empty() {
                out.push("The quality gate is failing. Review its conditions in SonarQube.".to_string());
            } else {
                out.push(format!(
                    "The quality gate is failing on: {}.",
                    failing.join(", ")
                ));
            }
        }
    }

    for check in data.compliance.failed_checks() {
        out.push(format!("LGPD: resolve \"{}\".", check.label));
    }

    if let Some(set) = &data.issues {
        let blockers = set
            .issues
            .iter()
            .filter(|i| i.severity >= IssueSeverity::Critical)
            .count();
        if blockers > 0 {
            out.push(format!(
                "Address {} blocker/critical issues before the next release.",
                blockers
            ));
        }
    }

    if let Some(set) = &data.hotspots {
        let pending = set.hotspots.iter().filter(|h| h.needs_review()).count();
        if pending > 0 {
            out.push(format!("Review {} pending security hotspots.", pending));
        }
    }

    if let Some(coverage) = data.metrics.number("coverage") {
        if coverage < COVERAGE_TARGET {
            out.push(format!(
                "Raise test coverage from {:.1}% to at least {:.0}%.",
                coverage, COVERAGE_TARGET
            ));
        }
    }

    if let Some(dup) = data.metrics.number("duplicated_lines_density") {
        if dup > DUPLICATION_LIMIT {
            out.push(format!(
                "Reduce duplicated lines ({:.1}%) below {:.0}%.",
                dup, DUPLICATION_LIMIT
            ));
        }
    }

    if data.debt.days > DEBT_DAYS_LIMIT {
        out.push(format!(
            "Plan time to pay down {:.1} days of technical debt.",
            data.debt.days
        ));
    }

    if let Some(deps) = &data.dependencies {
        if !deps.outdated.is_empty() {
            out.push(format!("Update {} outdated packages.", deps.outdated.len()));
        }
    }

    if out.is_empty() {
        out.push("No urgent actions. Keep the quality gate green.".to_string());
    }
    out
}

fn render_footer(data: &ReportData) -> String {
    format!(
        r#"<div class="footer">
    <p>Generated by sonarlgpd {} from {}</p>
</div>
"#,
        env!("CARGO_PKG_VERSION"),
        html_escape(&data.server_url)
    )
}

fn stat_grid(stats: &[(&str, String)]) -> String {
    let mut html = String::from("    <div class=\"stats-grid\">\n");
    for (label, value) in stats {
        html.push_str(&format!(
            "        <div class=\"stat-item\"><div class=\"stat-value\">{}</div><div class=\"stat-label\">{}</div></div>\n",
            html_escape(value),
            label
        ));
    }
    html.push_str("    </div>\n");
    html
}

fn unavailable(message: &str) -> String {
    format!("    <p class=\"muted\">{}</p>\n", message)
}

fn percent(value: Option<&str>) -> String {
    match value {
        Some(v) => format!("{}%", v),
        None => "N/A".to_string(),
    }
}

fn severity_badge(severity: IssueSeverity) -> String {
    format!(
        "<span class=\"severity-badge severity-{}\">{}</span>",
        severity.as_str().to_lowercase(),
        severity.as_str()
    )
}

fn bar_class(score: f64) -> &'static str {
    match ScoreBand::from_score(score.round().clamp(0.0, 100.0) as u32) {
        ScoreBand::Good => "bar-good",
        ScoreBand::Moderate => "bar-moderate",
        ScoreBand::Warning => "bar-warning",
        ScoreBand::Poor => "bar-poor",
    }
}

pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

// Embedded CSS
const CSS: &str = r#"
:root {
    --primary-color: #2563eb;
    --background-color: #f8fafc;
    --text-color: #1e293b;
    --muted-color: #64748b;
    --card-background: white;
    --border-color: #e2e8f0;
}

* { margin: 0; padding: 0; box-sizing: border-box; }

body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
    line-height: 1.6;
    color: var(--text-color);
    background: var(--background-color);
    padding: 2rem;
}

.container {
    max-width: 1200px;
    margin: 0 auto;
    background: var(--card-background);
    border-radius: 12px;
    box-shadow: 0 4px 6px -1px rgba(0,0,0,0.1);
    overflow: hidden;
}

.header {
    background: linear-gradient(135deg, #1d4ed8 0%, #0f766e 100%);
    color: white;
    padding: 2.5rem 2rem;
    text-align: center;
}

.header h1 { font-size: 2.25rem; margin-bottom: 0.25rem; }
.header .subtitle { font-size: 1.1rem; opacity: 0.95; }
.header .timestamp { opacity: 0.85; font-size: 0.9rem; }
.header code { background: rgba(255,255,255,0.15); padding: 0 0.3rem; border-radius: 4px; }

.content { padding: 2rem; }

.toc {
    background: #f1f5f9;
    border-radius: 8px;
    padding: 1rem 1.5rem;
    margin-bottom: 2rem;
}
.toc h2 { font-size: 1.1rem; margin-bottom: 0.5rem; }
.toc ol { columns: 2; padding-left: 1.25rem; }
.toc a { color: var(--primary-color); text-decoration: none; }
.toc a:hover { text-decoration: underline; }

.section { margin-bottom: 2.5rem; }
.section-title {
    font-size: 1.5rem;
    margin-bottom: 1rem;
    padding-bottom: 0.5rem;
    border-bottom: 2px solid var(--border-color);
}
.section h3 { font-size: 1.1rem; margin: 1.25rem 0 0.5rem; }

.score-section {
    text-align: center;
    padding: 1.5rem;
    background: #f1f5f9;
    border-radius: 8px;
    margin-bottom: 1.5rem;
}

.score-badge {
    display: inline-block;
    font-size: 3rem;
    font-weight: bold;
    width: 120px;
    height: 120px;
    line-height: 120px;
    border-radius: 50%;
    color: white;
}
.band-good { background: #10b981; }
.band-moderate { background: #eab308; }
.band-warning { background: #f97316; }
.band-poor { background: #ef4444; }
.score-label { color: var(--muted-color); font-size: 1.2rem; margin-top: 0.5rem; }

.metrics-grid, .stats-grid {
    display: grid;
    grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
    gap: 1rem;
}

.metric-card, .stat-item {
    border: 1px solid var(--border-color);
    border-radius: 8px;
    padding: 1.25rem;
}
.metric-card h3 {
    font-size: 0.8rem;
    color: var(--muted-color);
    margin: 0 0 0.5rem;
    text-transform: uppercase;
}
.metric-value, .stat-value { font-size: 1.75rem; font-weight: bold; margin-bottom: 0.5rem; }
.stat-item { text-align: center; }
.stat-label { font-size: 0.875rem; color: var(--muted-color); }

.metric-bar, .bar-track {
    height: 8px;
    background: #e2e8f0;
    border-radius: 4px;
    overflow: hidden;
}
.metric-bar-fill, .bar-fill { height: 100%; border-radius: 4px; }
.bar-good { background: #10b981; }
.bar-moderate { background: #eab308; }
.bar-warning { background: #f97316; }
.bar-poor { background: #ef4444; }
.type-bar { background: var(--primary-color); }

.bars { display: flex; flex-direction: column; gap: 0.4rem; }
.bar-row { display: grid; grid-template-columns: 160px 1fr 60px; align-items: center; gap: 0.75rem; }
.bar-label { font-size: 0.875rem; color: var(--muted-color); }
.bar-count { font-weight: 600; text-align: right; }

.severity-summary { display: flex; flex-wrap: wrap; gap: 1rem; }
.severity-item {
    display: flex;
    align-items: center;
    gap: 0.5rem;
    padding: 0.6rem 1.2rem;
    border-radius: 8px;
    border: 1px solid var(--border-color);
}
.severity-count { font-weight: bold; font-size: 1.2rem; }

.severity-badge {
    padding: 0.15rem 0.6rem;
    border-radius: 6px;
    font-size: 0.75rem;
    font-weight: 600;
    color: white;
    white-space: nowrap;
}
.severity-blocker { background: #7f1d1d; }
.severity-critical { background: #dc2626; }
.severity-major { background: #ea580c; }
.severity-minor { background: #ca8a04; }
.severity-info { background: #64748b; }

.prob { font-weight: 600; font-size: 0.8rem; }
.prob-high { color: #dc2626; }
.prob-medium { color: #ea580c; }
.prob-low { color: #ca8a04; }

.gate-badge { padding: 0.25rem 0.9rem; border-radius: 6px; font-weight: 700; color: white; }
.gate-passed { background: #10b981; }
.gate-failed { background: #ef4444; }

table { width: 100%; border-collapse: collapse; font-size: 0.9rem; margin-bottom: 1rem; }
th, td { text-align: left; padding: 0.5rem; border-bottom: 1px solid var(--border-color); vertical-align: top; }
th { background: #f8fafc; font-weight: 600; }
code { font-family: monospace; font-size: 0.85rem; }

.checklist { list-style: none; }
.checklist li { padding: 0.3rem 0; }
.ok { color: #059669; }
.fail { color: #dc2626; }
.muted { color: var(--muted-color); font-style: italic; }

.recommendations li { margin: 0.4rem 0 0.4rem 1.25rem; }

.footer {
    text-align: center;
    padding: 1.5rem;
    color: var(--muted-color);
    border-top: 1px solid var(--border-color);
}

@media (max-width: 768px) {
    body { padding: 1rem; }
    .header h1 { font-size: 1.6rem; }
    .toc ol { columns: 1; }
    .bar-row { grid-template-columns: 110px 1fr 40px; }
}

@media print {
    body { padding: 0; background: white; }
    .container { box-shadow: none; }
    .toc { display: none; }
    table { page-break-inside: auto; }
    tr { page-break-inside: avoid; }
}
"#;
