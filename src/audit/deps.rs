//! Dependency audit across the project's package manifests
//!
//! Looks for `package.json` at a fixed set of locations (monorepo-style
//! `frontend/`, `backend/`, ...). For each one it counts declared
//! dependencies and, when a lockfile is present, runs the package
//! manager's `audit` and `outdated` commands. Counts are summed across
//! manifests. A manifest whose audit fails contributes nothing, and the
//! others are still processed.

use super::runner::{run_for_stdout, CommandRunner};
use crate::models::{DependencyAudit, OutdatedPackage, VulnerabilityCounts};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, info, warn};

/// `(label, directory relative to the project root)`
pub const MANIFEST_LOCATIONS: &[(&str, &str)] = &[
    ("root", ""),
    ("frontend", "frontend"),
    ("backend", "backend"),
    ("client", "client"),
    ("server", "server"),
    ("web", "web"),
    ("app", "app"),
    ("api", "api"),
];

#[derive(Debug, Default, Deserialize)]
struct PackageManifest {
    #[serde(default)]
    dependencies: Map<String, Value>,
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: Map<String, Value>,
}

/// Package manager inferred from the lockfile next to the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Npm,
    Pnpm,
    Yarn,
}

impl PackageManager {
    /// Detect from lockfiles, `None` when there is no lockfile at all.
    pub fn detect(dir: &Path) -> Option<Self> {
        if dir.join("package-lock.json").exists() {
            Some(PackageManager::Npm)
        } else if dir.join("pnpm-lock.yaml").exists() {
            Some(PackageManager::Pnpm)
        } else if dir.join("yarn.lock").exists() {
            Some(PackageManager::Yarn)
        } else {
            None
        }
    }

    fn audit_command(&self) -> &'static [&'static str] {
        match self {
            PackageManager::Npm => &["npm", "audit", "--json"],
            PackageManager::Pnpm => &["pnpm", "audit", "--json"],
            PackageManager::Yarn => &["yarn", "audit", "--json"],
        }
    }

    fn outdated_command(&self) -> &'static [&'static str] {
        match self {
            PackageManager::Npm => &["npm", "outdated", "--json"],
            PackageManager::Pnpm => &["pnpm", "outdated", "--format", "json"],
            PackageManager::Yarn => &["yarn", "outdated", "--json"],
        }
    }
}

/// Audit every manifest found under `root`.
pub fn audit_dependencies(root: &Path, runner: &dyn CommandRunner) -> DependencyAudit {
    let mut audit = DependencyAudit::default();

    for (label, rel) in MANIFEST_LOCATIONS {
        let dir = if rel.is_empty() {
            root.to_path_buf()
        } else {
            root.join(rel)
        };
        let manifest_path = dir.join("package.json");
        if !manifest_path.is_file() {
            continue;
        }

        audit.manifests.push(label.to_string());
        match read_manifest(&manifest_path) {
            Some(manifest) => {
                audit.dependencies += manifest.dependencies.len();
                audit.dev_dependencies += manifest.dev_dependencies.len();
            }
            None => warn!("Could not parse {}", manifest_path.display()),
        }

        let Some(manager) = PackageManager::detect(&dir) else {
            info!("No lockfile next to {}, skipping audit", manifest_path.display());
            continue;
        };

        if let Some(counts) =
            run_for_stdout(runner, manager.audit_command(), &dir).and_then(|out| parse_audit(&out))
        {
            debug!("{}: {:?}", label, counts);
            audit.vulnerabilities.accumulate(&counts);
        }

        if let Some(out) = run_for_stdout(runner, manager.outdated_command(), &dir) {
            audit.outdated.extend(parse_outdated(&out, label));
        }
    }

    info!(
        "Dependency audit: {} manifests, {} vulnerabilities, {} outdated",
        audit.manifests.len(),
        audit.vulnerabilities.total,
        audit.outdated.len()
    );
    audit
}

fn read_manifest(path: &Path) -> Option<PackageManifest> {
    let content = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

fn count(v: &Value, key: &str) -> u64 {
    v.get(key).and_then(Value::as_u64).unwrap_or(0)
}

fn counts_from_summary(summary: &Value) -> VulnerabilityCounts {
    let mut counts = VulnerabilityCounts {
        critical: count(summary, "critical"),
        high: count(summary, "high"),
        moderate: count(summary, "moderate"),
        low: count(summary, "low"),
        info: count(summary, "info"),
        total: 0,
    };
    counts.total = summary.get("total").and_then(Value::as_u64).unwrap_or(
        counts.critical + counts.high + counts.moderate + counts.low + counts.info,
    );
    counts
}

fn is_severity_summary(v: &Value) -> bool {
    ["critical", "high", "moderate", "low", "info"]
        .iter()
        .any(|k| v.get(*k).is_some_and(Value::is_u64))
}

/// Parse audit output into severity counts.
///
/// Understands npm/pnpm (`metadata.vulnerabilities`), npm v7 entries
/// without metadata (`vulnerabilities.<pkg>.severity`), yarn v1 NDJSON
/// (`auditSummary` line) and a bare `{critical, high, ...}` object.
pub fn parse_audit(output: &str) -> Option<VulnerabilityCounts> {
    if let Ok(json) = serde_json::from_str::<Value>(output) {
        if let Some(summary) = json.get("metadata").and_then(|m| m.get("vulnerabilities")) {
            return Some(counts_from_summary(summary));
        }
        if let Some(entries) = json.get("vulnerabilities").and_then(Value::as_object) {
            let mut counts = VulnerabilityCounts::default();
            for entry in entries.values() {
                match entry.get("severity").and_then(Value::as_str).unwrap_or("info") {
                    "critical" => counts.critical += 1,
                    "high" => counts.high += 1,
                    "moderate" => counts.moderate += 1,
                    "low" => counts.low += 1,
                    _ => counts.info += 1,
                }
                counts.total += 1;
            }
            return Some(counts);
        }
        if is_severity_summary(&json) {
            return Some(counts_from_summary(&json));
        }
        return None;
    }

    // yarn v1 emits one JSON object per line
    output
        .lines()
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .find(|v| v.get("type").and_then(Value::as_str) == Some("auditSummary"))
        .and_then(|v| v.get("data")?.get("vulnerabilities").map(counts_from_summary))
}

/// Parse `outdated` output. npm and pnpm emit `{name: {current, wanted,
/// latest}}`; yarn v1 emits a `table` line with positional rows.
///
/// Entries without string `wanted` and `latest` versions are skipped, which
/// drops npm's `{"error": {...}}` failure object.
pub fn parse_outdated(output: &str, location: &str) -> Vec<OutdatedPackage> {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(output) {
        return map
            .iter()
            .filter_map(|(name, info)| {
                let wanted = info.get("wanted")?.as_str()?;
                let latest = info.get("latest")?.as_str()?;
                Some(OutdatedPackage {
                    name: name.clone(),
                    current: info
                        .get("current")
                        .and_then(Value::as_str)
                        .unwrap_or("missing")
                        .to_string(),
                    wanted: wanted.to_string(),
                    latest: latest.to_string(),
                    location: location.to_string(),
                })
            })
            .collect();
    }

    let Some(table) = output
        .lines()
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .find(|v| v.get("type").and_then(Value::as_str) == Some("table"))
    else {
        return Vec::new();
    };

    table
        .get("data")
        .and_then(|d| d.get("body"))
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    let cells: Vec<&str> = row.as_array()?.iter().filter_map(Value::as_str).collect();
                    if cells.len() < 4 {
                        return None;
                    }
                    Some(OutdatedPackage {
                        name: cells[0].to_string(),
                        current: cells[1].to_string(),
                        wanted: cells[2].to_string(),
                        latest: cells[3].to_string(),
                        location: location.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}
