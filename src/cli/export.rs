//! Export command - fetch SonarQube results and write the HTML report
//!
//! Remote fetches (gate, measures, issues, hotspots) and local audits
//! (dependencies, git) run concurrently with `rayon::join`; scoring and
//! rendering wait for both sides.

use crate::audit::{audit_dependencies, CommandRunner, SystemRunner};
use crate::compliance::{cross_reference, resolve_rules};
use crate::config::{SonarSettings, TOKEN_FILE};
use crate::error::{ExportError, ExportResult};
use crate::git::repo_activity;
use crate::models::{ComplianceRule, DependencyAudit};
use crate::reporters::{html, ReportData};
use crate::scoring::{score_breakdown, DebtTime, ScoreBand, NEUTRAL_COMPLIANCE_RATIO};
use crate::sonar::{
    fetch_hotspots, fetch_issues, fetch_measures, fetch_quality_gate, JsonSource, SonarClient,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Flags accepted by `sonarlgpd export`.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub project_key: Option<String>,
    pub server: Option<String>,
    pub rules: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub open: bool,
    pub skip_deps: bool,
    pub skip_git: bool,
}

pub fn run(path: &Path, options: &ExportOptions) -> Result<()> {
    let start = Instant::now();
    let root = path
        .canonicalize()
        .with_context(|| format!("Path does not exist: {}", path.display()))?;

    let settings = SonarSettings::resolve(
        &root,
        options.server.as_deref(),
        options.project_key.as_deref(),
    );
    let credential = settings.credential.clone().ok_or_else(|| ExportError::MissingToken {
        token_file: root.join(TOKEN_FILE).display().to_string(),
    })?;
    debug!("Using token from {}", credential.source);

    println!(
        "\n{} Exporting {} from {}\n",
        style("▶").cyan().bold(),
        style(&settings.project_key).bold(),
        style(&settings.server_url).dim()
    );

    let rules = resolve_rules(&root, options.rules.as_deref());
    let client = SonarClient::new(settings.server_url.clone(), &credential.token);
    let runner = SystemRunner::default();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(spinner_style());
    spinner.set_message("Fetching analysis results and auditing dependencies...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = build_report(
        &root,
        &settings,
        &client,
        &runner,
        &rules,
        options,
        Local::now(),
    );
    spinner.finish_and_clear();
    let data = result?;

    let output = options
        .output
        .clone()
        .unwrap_or_else(|| default_report_path(&root, &data.project_key, &data.generated_at));
    write_report(&output, &html::render(&data))?;

    print_summary(&data, &output, start.elapsed());

    if options.open {
        open_in_viewer(&output);
    }
    Ok(())
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Gather everything and score it.
///
/// Fails only when the measures can't be fetched; every other source
/// degrades to `None` or empty data.
pub fn build_report(
    root: &Path,
    settings: &SonarSettings,
    source: &dyn JsonSource,
    runner: &dyn CommandRunner,
    rules: &[ComplianceRule],
    options: &ExportOptions,
    generated_at: DateTime<Local>,
) -> ExportResult<ReportData> {
    let key = settings.project_key.as_str();

    let ((remote, (gate, hotspots)), (dependencies, activity)) = rayon::join(
        || {
            rayon::join(
                || {
                    rayon::join(
                        || fetch_measures(source, key),
                        || fetch_issues(source, key),
                    )
                },
                || {
                    rayon::join(
                        || fetch_quality_gate(source, key),
                        || fetch_hotspots(source, key),
                    )
                },
            )
        },
        || {
            rayon::join(
                || audit_step(options.skip_deps, || audit_dependencies(root, runner)),
                || audit_step(options.skip_git, || repo_activity(root)),
            )
        },
    );
    let (metrics, issues) = remote;

    let metrics = metrics.ok_or_else(|| ExportError::MetricsUnavailable {
        project_key: settings.project_key.clone(),
        server: settings.server_url.clone(),
    })?;
    info!("Fetched {} measures", metrics.len());

    if gate.is_none() {
        warn!("Quality gate unavailable; section will be empty");
    }
    if issues.is_none() {
        warn!("Issues unavailable; issue sections will be empty");
    }
    if hotspots.is_none() {
        warn!("Hotspots unavailable; hotspot section will be empty");
    }

    let vulnerabilities = dependencies
        .as_ref()
        .map(|d: &DependencyAudit| d.vulnerabilities)
        .unwrap_or_default();
    let issue_list = issues.as_ref().map(|s| s.issues.as_slice()).unwrap_or(&[]);
    let mut compliance = cross_reference(issue_list, rules, &vulnerabilities);
    if issues.is_none() {
        compliance = compliance.without_issue_data();
    }
    let score = score_breakdown(
        &metrics,
        compliance.score_ratio().unwrap_or(NEUTRAL_COMPLIANCE_RATIO),
        &vulnerabilities,
    );
    let debt = DebtTime::from_metrics(&metrics);

    Ok(ReportData {
        project_name: settings.project_name.clone(),
        project_key: settings.project_key.clone(),
        server_url: settings.server_url.clone(),
        generated_at,
        metrics,
        quality_gate: gate,
        issues,
        hotspots,
        compliance,
        dependencies,
        activity,
        score,
        debt,
    })
}

fn audit_step<T>(skip: bool, step: impl FnOnce() -> T) -> Option<T> {
    if skip {
        None
    } else {
        Some(step())
    }
}

/// `reports/<key>-report-<YYYY-MM-DD>.html` under `root`.
pub fn default_report_path(root: &Path, project_key: &str, date: &DateTime<Local>) -> PathBuf {
    let safe_key: String = project_key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect();
    root.join("reports").join(format!(
        "{}-report-{}.html",
        safe_key,
        date.format("%Y-%m-%d")
    ))
}

pub fn write_report(path: &Path, content: &str) -> ExportResult<()> {
    let write = || -> std::io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
    };
    write().map_err(|source| ExportError::WriteFailed {
        path: path.to_path_buf(),
        source,
    })
}

fn print_summary(data: &ReportData, output: &Path, elapsed: Duration) {
    let band = data.score.band();
    let score = format!("{}/100 ({})", data.score.total, band.label());
    let styled = match band {
        ScoreBand::Good => style(score).green().bold(),
        ScoreBand::Moderate => style(score).yellow().bold(),
        ScoreBand::Warning | ScoreBand::Poor => style(score).red().bold(),
    };
    println!("{} Health score: {}", style("✓").green(), styled);
    println!(
        "{} LGPD checks: {}/{} passed, {} mapped issues",
        style("✓").green(),
        data.compliance.passed(),
        data.compliance.total(),
        data.compliance.annotated.len()
    );
    if data.compliance.missing_issue_data() {
        println!(
            "{} Issues unavailable: issue-based LGPD checks not evaluated",
            style("○").yellow()
        );
    }
    if let Some(gate) = &data.quality_gate {
        let status = if gate.passed() {
            style("PASSED").green()
        } else {
            style("FAILED").red()
        };
        println!("{} Quality gate: {}", style("✓").green(), status);
    }
    println!(
        "\n{} Report written to {} in {:.1}s",
        style("📄").bold(),
        style(output.display()).cyan(),
        elapsed.as_secs_f64()
    );
}

/// Launch the platform viewer. Failure only warns.
fn open_in_viewer(path: &Path) {
    let program = if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "windows") {
        "explorer"
    } else {
        "xdg-open"
    };
    match std::process::Command::new(program).arg(path).spawn() {
        Ok(_) => debug!("Opened {} with {}", path.display(), program),
        Err(e) => warn!("Could not open {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::runner::tests::ScriptedRunner;
    use crate::compliance::default_rules;
    use crate::config::UserConfig;
    use serde_json::{json, Value};
    use std::collections::HashMap;

    /// Serves canned JSON by endpoint prefix.
    struct CannedServer {
        routes: HashMap<&'static str, Value>,
    }

    impl JsonSource for CannedServer {
        fn get_json(&self, path: &str) -> Option<Value> {
            let endpoint = path.split('?').next().unwrap_or(path);
            self.routes.get(endpoint).cloned()
        }
    }

    fn clean_server() -> CannedServer {
        let mut routes = HashMap::new();
        routes.insert(
            "/api/measures/component",
            json!({"component": {"measures": [
                {"metric": "reliability_rating", "value": "1.0"},
                {"metric": "security_rating", "value": "1.0"},
                {"metric": "sqale_rating", "value": "1.0"},
                {"metric": "sqale_index", "value": "480"}
            ]}}),
        );
        routes.insert(
            "/api/qualitygates/project_status",
            json!({"projectStatus": {"status": "OK", "conditions": []}}),
        );
        routes.insert(
            "/api/issues/search",
            json!({"issues": [], "paging": {"pageIndex": 1, "pageSize": 500, "total": 0}}),
        );
        routes.insert(
            "/api/hotspots/search",
            json!({"hotspots": [], "paging": {"pageIndex": 1, "pageSize": 500, "total": 0}}),
        );
        CannedServer { routes }
    }

    fn settings(root: &Path) -> SonarSettings {
        SonarSettings::resolve_with(
            root,
            None,
            Some("demo"),
            None,
            Some("squ_test".into()),
            &UserConfig::default(),
        )
    }

    #[test]
    fn test_critical_dependency_scores_85() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        std::fs::write(
            root.join("package.json"),
            r#"{"dependencies": {"a": "1.0.0"}}"#,
        )
        .unwrap();
        std::fs::write(root.join("package-lock.json"), "{}").unwrap();

        let runner = ScriptedRunner::default()
            .respond(
                "npm audit --json",
                r#"{"metadata": {"vulnerabilities": {"critical": 1, "high": 0, "moderate": 0, "low": 0, "info": 0, "total": 1}}}"#,
            )
            .respond("npm outdated --json", "{}");

        let options = ExportOptions {
            skip_git: true,
            ..Default::default()
        };
        let data = build_report(
            root,
            &settings(root),
            &clean_server(),
            &runner,
            &default_rules(),
            &options,
            Local::now(),
        )
        .unwrap();

        let deps = data.dependencies.as_ref().unwrap();
        assert_eq!(deps.dependencies, 1);
        assert_eq!(deps.vulnerabilities.critical, 1);
        assert!(data.quality_gate.as_ref().unwrap().passed());
        assert!(data.issues.as_ref().unwrap().issues.is_empty());
        assert_eq!(data.score.dependencies, 0.0);
        assert_eq!(data.score.total, 85);
        assert_eq!(data.debt.days, 1.0);
    }

    #[test]
    fn test_missing_measures_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let mut server = clean_server();
        server.routes.remove("/api/measures/component");

        let options = ExportOptions {
            skip_deps: true,
            skip_git: true,
            ..Default::default()
        };
        let err = build_report(
            tmp.path(),
            &settings(tmp.path()),
            &server,
            &ScriptedRunner::default(),
            &default_rules(),
            &options,
            Local::now(),
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::MetricsUnavailable { .. }));
        assert!(err.to_string().contains("demo"));
    }

    #[test]
    fn test_optional_sources_degrade() {
        let tmp = tempfile::tempdir().unwrap();
        let mut server = clean_server();
        server.routes.remove("/api/qualitygates/project_status");
        server.routes.remove("/api/issues/search");
        server.routes.remove("/api/hotspots/search");

        let options = ExportOptions {
            skip_deps: true,
            skip_git: true,
            ..Default::default()
        };
        let data = build_report(
            tmp.path(),
            &settings(tmp.path()),
            &server,
            &ScriptedRunner::default(),
            &default_rules(),
            &options,
            Local::now(),
        )
        .unwrap();
        assert!(data.quality_gate.is_none());
        assert!(data.issues.is_none());
        assert!(data.hotspots.is_none());
        assert!(data.dependencies.is_none());
        assert!(data.activity.is_none());
        // Issue checks are not evaluated, so compliance scores neutral
        assert!(data.compliance.missing_issue_data());
        assert_eq!(data.compliance.score_ratio(), None);
        assert_eq!(data.compliance.failed_checks().count(), 0);
        assert_eq!(data.score.compliance, 50.0);
        assert_eq!(data.score.total, 88);
    }

    #[test]
    fn test_default_report_path() {
        use chrono::TimeZone;
        let date = Local.with_ymd_and_hms(2026, 5, 17, 12, 0, 0).unwrap();
        let path = default_report_path(Path::new("/work"), "org:shop api", &date);
        assert_eq!(
            path,
            Path::new("/work/reports/org_shop_api-report-2026-05-17.html")
        );
    }

    #[test]
    fn test_write_report_creates_parent_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("reports").join("r.html");
        write_report(&path, "<html></html>").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<html></html>");
    }

    #[test]
    fn test_write_report_failure_is_typed() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let err = write_report(&blocker.join("r.html"), "x").unwrap_err();
        assert!(matches!(err, ExportError::WriteFailed { .. }));
    }
}
