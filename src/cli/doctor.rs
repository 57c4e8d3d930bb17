//! Doctor command - check environment

use crate::audit::{is_tool_installed, CommandRunner, SystemRunner};
use crate::compliance::{load_rules, rules_path};
use crate::config::{SonarSettings, PROPERTIES_FILE, TOKEN_FILE};
use crate::sonar::{server_status, JsonSource, SonarClient};
use anyhow::Result;
use console::style;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Ok,
    Warn,
    Fail,
}

#[derive(Debug, Clone)]
pub struct DoctorCheck {
    pub status: CheckStatus,
    pub name: &'static str,
    pub detail: String,
}

impl DoctorCheck {
    fn new(status: CheckStatus, name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            status,
            name,
            detail: detail.into(),
        }
    }
}

/// Print the checklist. Problems are reported, never returned.
pub fn run(path: &Path) -> Result<()> {
    println!("\n{} sonarlgpd doctor\n", style("🩺").bold());

    let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let settings = SonarSettings::resolve(&root, None, None);
    let client = settings
        .credential
        .as_ref()
        .map(|c| SonarClient::new(settings.server_url.clone(), &c.token));

    let checks = diagnose(
        &root,
        &settings,
        client.as_ref().map(|c| c as &dyn JsonSource),
        &SystemRunner::default(),
    );

    for check in &checks {
        let mark = match check.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warn => style("○").yellow(),
            CheckStatus::Fail => style("✗").red(),
        };
        println!("{} {}: {}", mark, check.name, check.detail);
    }

    let failures = checks.iter().filter(|c| c.status == CheckStatus::Fail).count();
    if failures == 0 {
        println!("\n{} Ready to export", style("✅").bold());
    } else {
        println!(
            "\n{} {} problem(s) found; fix them before running export",
            style("⚠").yellow(),
            failures
        );
    }
    Ok(())
}

/// Run every check. `source` is `None` when there is no token to
/// authenticate with.
pub fn diagnose(
    root: &Path,
    settings: &SonarSettings,
    source: Option<&dyn JsonSource>,
    runner: &dyn CommandRunner,
) -> Vec<DoctorCheck> {
    let mut checks = Vec::new();

    checks.push(match &settings.credential {
        Some(c) => DoctorCheck::new(CheckStatus::Ok, "Token", format!("found ({})", c.source)),
        None => DoctorCheck::new(
            CheckStatus::Fail,
            "Token",
            format!("missing; set SONAR_TOKEN or write it to {}", TOKEN_FILE),
        ),
    });

    checks.push(DoctorCheck::new(
        CheckStatus::Ok,
        "Server URL",
        settings.server_url.clone(),
    ));

    checks.push(match source.map(server_status) {
        Some(Some(status)) if status == "UP" => {
            DoctorCheck::new(CheckStatus::Ok, "Server status", "UP")
        }
        Some(Some(status)) => DoctorCheck::new(
            CheckStatus::Warn,
            "Server status",
            format!("{} (not ready yet)", status),
        ),
        Some(None) => DoctorCheck::new(
            CheckStatus::Fail,
            "Server status",
            format!("unreachable at {}", settings.server_url),
        ),
        None => DoctorCheck::new(CheckStatus::Warn, "Server status", "skipped (no token)"),
    });

    checks.push(if root.join(PROPERTIES_FILE).is_file() {
        DoctorCheck::new(
            CheckStatus::Ok,
            "Project config",
            format!("{} (key {})", PROPERTIES_FILE, settings.project_key),
        )
    } else {
        DoctorCheck::new(
            CheckStatus::Warn,
            "Project config",
            format!("{} missing; run `sonarlgpd init`", PROPERTIES_FILE),
        )
    });

    checks.push(match rules_path(root, None) {
        Some(path) => match load_rules(&path) {
            Ok(rules) => DoctorCheck::new(
                CheckStatus::Ok,
                "LGPD mapping",
                format!("{} rules in {}", rules.len(), path.display()),
            ),
            Err(e) => DoctorCheck::new(CheckStatus::Fail, "LGPD mapping", e.to_string()),
        },
        None => DoctorCheck::new(
            CheckStatus::Warn,
            "LGPD mapping",
            "no project mapping; the built-in one will be used",
        ),
    });

    for tool in ["npm", "git"] {
        checks.push(if is_tool_installed(runner, tool) {
            DoctorCheck::new(CheckStatus::Ok, tool, "installed")
        } else {
            DoctorCheck::new(CheckStatus::Warn, tool, "not found on PATH")
        });
    }

    checks
}
