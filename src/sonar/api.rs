//! Typed fetchers for the SonarQube endpoints the report uses

use super::client::JsonSource;
use super::paginate::{fetch_all_pages, DEFAULT_MAX_ITEMS, DEFAULT_PAGE_SIZE};
use crate::models::{
    GateCondition, Hotspot, HotspotProbability, Issue, IssueSeverity, IssueType, MetricSnapshot,
    QualityGate, METRIC_KEYS,
};
use serde_json::Value;
use tracing::debug;

/// Open issues plus the count the server reported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueSet {
    pub issues: Vec<Issue>,
    pub total_reported: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HotspotSet {
    pub hotspots: Vec<Hotspot>,
    pub total_reported: u64,
}

fn str_field<'a>(v: &'a Value, key: &str) -> &'a str {
    v.get(key).and_then(Value::as_str).unwrap_or("")
}

fn line_field(v: &Value) -> Option<u32> {
    v.get("line")
        .and_then(Value::as_u64)
        .and_then(|l| u32::try_from(l).ok())
}

/// Strip the `projectKey:` prefix SonarQube puts on component keys.
fn component_path(component: &str) -> String {
    match component.split_once(':') {
        Some((_, path)) => path.to_string(),
        None => component.to_string(),
    }
}

/// Parse SonarQube effort strings (`5min`, `1h30min`, `2d`) into minutes.
/// A day is 8 hours, matching the server's debt model. Values that
/// overflow `u32` are rejected.
pub fn parse_effort(effort: &str) -> Option<u32> {
    let mut total: u32 = 0;
    let mut digits = String::new();
    let mut seen_unit = false;
    let mut chars = effort.trim().chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let n: u32 = digits.parse().ok()?;
        digits.clear();
        let minutes = match c {
            'd' => n.checked_mul(480)?,
            'h' => n.checked_mul(60)?,
            'm' => {
                // "min"
                if chars.next() != Some('i') || chars.next() != Some('n') {
                    return None;
                }
                n
            }
            _ => return None,
        };
        total = total.checked_add(minutes)?;
        seen_unit = true;
    }

    if !digits.is_empty() || !seen_unit {
        return None;
    }
    Some(total)
}

/// Percent-encode a query value, keeping only RFC 3986 unreserved bytes.
pub(crate) fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

/// `GET /api/qualitygates/project_status`
pub fn fetch_quality_gate(source: &dyn JsonSource, project_key: &str) -> Option<QualityGate> {
    let body = source.get_json(&format!(
        "/api/qualitygates/project_status?projectKey={}",
        encode_query_value(project_key)
    ))?;
    parse_quality_gate(&body)
}

pub(crate) fn parse_quality_gate(body: &Value) -> Option<QualityGate> {
    let status = body.get("projectStatus")?;
    let conditions = status
        .get("conditions")
        .and_then(Value::as_array)
        .map(|conds| {
            conds
                .iter()
                .map(|c| GateCondition {
                    metric_key: str_field(c, "metricKey").to_string(),
                    comparator: str_field(c, "comparator").to_string(),
                    threshold: str_field(c, "errorThreshold").to_string(),
                    actual: str_field(c, "actualValue").to_string(),
                    status: str_field(c, "status").to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    Some(QualityGate {
        status: str_field(status, "status").to_string(),
        conditions,
    })
}

/// `GET /api/measures/component`. Mandatory for export.
pub fn fetch_measures(source: &dyn JsonSource, project_key: &str) -> Option<MetricSnapshot> {
    let body = source.get_json(&format!(
        "/api/measures/component?component={}&metricKeys={}",
        encode_query_value(project_key),
        METRIC_KEYS.join(",")
    ))?;
    parse_measures(&body)
}

pub(crate) fn parse_measures(body: &Value) -> Option<MetricSnapshot> {
    let measures = body.get("component")?.get("measures")?.as_array()?;
    let snapshot: MetricSnapshot = measures
        .iter()
        .filter_map(|m| {
            let metric = m.get("metric")?.as_str()?;
            // Measures with only a `period` block carry no current value
            let value = m.get("value")?.as_str()?;
            Some((metric.to_string(), value.to_string()))
        })
        .collect();
    debug!("Parsed {} measures", snapshot.len());
    Some(snapshot)
}

/// `GET /api/issues/search`, open issues sorted by descending severity.
pub fn fetch_issues(source: &dyn JsonSource, project_key: &str) -> Option<IssueSet> {
    let path = format!(
        "/api/issues/search?componentKeys={}&statuses=OPEN,CONFIRMED,REOPENED&s=SEVERITY&asc=false",
        encode_query_value(project_key)
    );
    let page = fetch_all_pages(source, &path, "issues", DEFAULT_PAGE_SIZE, DEFAULT_MAX_ITEMS)?;
    let issues: Vec<Issue> = page.items.iter().map(parse_issue).collect();
    Some(IssueSet {
        total_reported: page.total_reported.unwrap_or(issues.len() as u64),
        issues,
    })
}

pub(crate) fn parse_issue(v: &Value) -> Issue {
    Issue {
        rule: str_field(v, "rule").to_string(),
        severity: IssueSeverity::parse(str_field(v, "severity")),
        issue_type: IssueType::parse(str_field(v, "type")),
        message: str_field(v, "message").to_string(),
        file: component_path(str_field(v, "component")),
        line: line_field(v),
        effort_minutes: v
            .get("effort")
            .or_else(|| v.get("debt"))
            .and_then(Value::as_str)
            .and_then(parse_effort),
    }
}

/// `GET /api/hotspots/search`
pub fn fetch_hotspots(source: &dyn JsonSource, project_key: &str) -> Option<HotspotSet> {
    let path = format!(
        "/api/hotspots/search?projectKey={}",
        encode_query_value(project_key)
    );
    let page = fetch_all_pages(source, &path, "hotspots", DEFAULT_PAGE_SIZE, DEFAULT_MAX_ITEMS)?;
    let hotspots: Vec<Hotspot> = page.items.iter().map(parse_hotspot).collect();
    Some(HotspotSet {
        total_reported: page.total_reported.unwrap_or(hotspots.len() as u64),
        hotspots,
    })
}

pub(crate) fn parse_hotspot(v: &Value) -> Hotspot {
    let rule = v
        .get("ruleKey")
        .or_else(|| v.get("rule"))
        .and_then(|r| r.as_str().or_else(|| r.get("key").and_then(Value::as_str)))
        .unwrap_or("");
    Hotspot {
        rule: rule.to_string(),
        message: str_field(v, "message").to_string(),
        file: component_path(str_field(v, "component")),
        line: line_field(v),
        probability: HotspotProbability::parse(str_field(v, "vulnerabilityProbability")),
        category: match str_field(v, "securityCategory") {
            "" => "others".to_string(),
            c => c.to_string(),
        },
        status: str_field(v, "status").to_string(),
    }
}

/// `GET /api/system/status`, e.g. `UP` or `STARTING`.
pub fn server_status(source: &dyn JsonSource) -> Option<String> {
    source
        .get_json("/api/system/status")?
        .get("status")?
        .as_str()
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_effort() {
        assert_eq!(parse_effort("5min"), Some(5));
        assert_eq!(parse_effort("1h30min"), Some(90));
        assert_eq!(parse_effort("2d"), Some(960));
        assert_eq!(parse_effort("1d2h"), Some(600));
        assert_eq!(parse_effort(""), None);
        assert_eq!(parse_effort("10"), None);
        assert_eq!(parse_effort("3x"), None);
        // Overflowing values are rejected instead of wrapping
        assert_eq!(parse_effort("9000000d"), None);
        assert_eq!(parse_effort("70000000h"), None);
        assert_eq!(parse_effort("4294967295min1min"), None);
        assert_eq!(parse_effort("8947848d"), Some(8947848 * 480));
    }

    #[test]
    fn test_parse_issue() {
        let issue = parse_issue(&json!({
            "rule": "javascript:S2068",
            "severity": "BLOCKER",
            "type": "VULNERABILITY",
            "message": "Review this potentially hardcoded credential.",
            "component": "my-app:src/config/db.js",
            "line": 12,
            "effort": "30min"
        }));
        assert_eq!(issue.rule_suffix(), "S2068");
        assert_eq!(issue.severity, IssueSeverity::Blocker);
        assert_eq!(issue.issue_type, IssueType::Vulnerability);
        assert_eq!(issue.file, "src/config/db.js");
        assert_eq!(issue.line, Some(12));
        assert_eq!(issue.effort_minutes, Some(30));
    }

    #[test]
    fn test_parse_issue_without_line() {
        let issue = parse_issue(&json!({ "rule": "S1", "component": "k" }));
        assert_eq!(issue.line, None);
        assert_eq!(issue.file, "k");
        assert_eq!(issue.severity, IssueSeverity::Info);
    }

    #[test]
    fn test_parse_hotspot() {
        let hotspot = parse_hotspot(&json!({
            "ruleKey": "javascript:S5332",
            "message": "Using http protocol is insecure.",
            "component": "my-app:src/api.js",
            "line": 3,
            "vulnerabilityProbability": "LOW",
            "securityCategory": "encrypt-data",
            "status": "TO_REVIEW"
        }));
        assert_eq!(hotspot.category, "encrypt-data");
        assert_eq!(hotspot.probability, HotspotProbability::Low);
        assert!(hotspot.needs_review());
        assert_eq!(hotspot.rule, "javascript:S5332");
    }

    #[test]
    fn test_parse_measures_skips_period_only() {
        let snapshot = parse_measures(&json!({
            "component": {
                "key": "k",
                "measures": [
                    { "metric": "bugs", "value": "4" },
                    { "metric": "reliability_rating", "value": "3.0" },
                    { "metric": "new_bugs", "period": { "value": "1" } }
                ]
            }
        }))
        .unwrap();
        assert_eq!(snapshot.get("bugs"), Some("4"));
        assert_eq!(snapshot.get("reliability_rating"), Some("3.0"));
        assert_eq!(snapshot.get("new_bugs"), None);
    }

    #[test]
    fn test_parse_measures_requires_component() {
        assert!(parse_measures(&json!({ "errors": [{ "msg": "not found" }] })).is_none());
    }

    #[test]
    fn test_parse_quality_gate() {
        let gate = parse_quality_gate(&json!({
            "projectStatus": {
                "status": "ERROR",
                "conditions": [{
                    "status": "ERROR",
                    "metricKey": "new_coverage",
                    "comparator": "LT",
                    "errorThreshold": "80",
                    "actualValue": "42.1"
                }]
            }
        }))
        .unwrap();
        assert!(!gate.passed());
        assert_eq!(gate.conditions.len(), 1);
        assert_eq!(gate.conditions[0].actual, "42.1");
    }

    #[test]
    fn test_fetch_issues_through_paginator() {
        use crate::sonar::paginate::tests::FakePagedServer;
        let server = FakePagedServer::new(3, "issues");
        let set = fetch_issues(&server, "k").unwrap();
        assert_eq!(set.issues.len(), 3);
        assert_eq!(set.total_reported, 3);
        let requests = server.requests.lock().unwrap();
        assert!(requests[0].starts_with("/api/issues/search?componentKeys=k&"));
        assert!(requests[0].ends_with("&p=1&ps=500"));
    }

    #[test]
    fn test_encode_query_value() {
        assert_eq!(encode_query_value("org:shop-api_v1.0~x"), "org%3Ashop-api_v1.0~x");
        assert_eq!(encode_query_value("a&b #c"), "a%26b%20%23c");
        assert_eq!(encode_query_value("ção"), "%C3%A7%C3%A3o");
    }

    #[test]
    fn test_project_key_is_encoded_in_requests() {
        use crate::sonar::paginate::tests::FakePagedServer;
        let server = FakePagedServer::new(1, "hotspots");
        fetch_hotspots(&server, "shop&ps=1#x").unwrap();
        let requests = server.requests.lock().unwrap();
        assert_eq!(
            requests[0],
            "/api/hotspots/search?projectKey=shop%26ps%3D1%23x&p=1&ps=500"
        );
    }
}
