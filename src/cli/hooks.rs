//! Hooks command - install or remove the pre-push analysis hook

use anyhow::{bail, Context, Result};
use console::style;
use git2::Repository;
use std::path::{Path, PathBuf};

const HOOK_TEMPLATE: &str = include_str!("../templates/pre-push");

/// Identifies hooks written by us
pub const HOOK_MARKER: &str = "# sonarlgpd pre-push hook";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcome {
    Installed,
    Replaced,
    Removed,
    NotInstalled,
}

pub fn install(path: &Path, force: bool) -> Result<()> {
    let hook = hook_path(path)?;
    let outcome = install_hook(&hook, force)?;
    let verb = if outcome == HookOutcome::Replaced {
        "Replaced"
    } else {
        "Installed"
    };
    println!(
        "{} {} pre-push hook at {}",
        style("✓").green(),
        verb,
        style(hook.display()).cyan()
    );
    println!("  It runs sonar-scanner before each push and never blocks it.");
    Ok(())
}

pub fn uninstall(path: &Path) -> Result<()> {
    let hook = hook_path(path)?;
    match uninstall_hook(&hook)? {
        HookOutcome::Removed => println!(
            "{} Removed pre-push hook from {}",
            style("✓").green(),
            style(hook.display()).cyan()
        ),
        _ => println!("{} No sonarlgpd pre-push hook installed", style("○").dim()),
    }
    Ok(())
}

/// `<git dir>/hooks/pre-push` for the repository containing `path`.
pub fn hook_path(path: &Path) -> Result<PathBuf> {
    let repo = Repository::discover(path).map_err(|_| {
        anyhow::anyhow!(
            "{} is not inside a git repository. Run `git init` first.",
            path.display()
        )
    })?;
    Ok(repo.path().join("hooks").join("pre-push"))
}

pub fn install_hook(hook: &Path, force: bool) -> Result<HookOutcome> {
    let outcome = if hook.exists() {
        let current = std::fs::read_to_string(hook).unwrap_or_default();
        if !current.contains(HOOK_MARKER) && !force {
            bail!(
                "A pre-push hook already exists at {} and was not installed by sonarlgpd. \
                 Use --force to replace it.",
                hook.display()
            );
        }
        HookOutcome::Replaced
    } else {
        HookOutcome::Installed
    };

    if let Some(parent) = hook.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(hook, HOOK_TEMPLATE)
        .with_context(|| format!("Failed to write {}", hook.display()))?;
    make_executable(hook)?;
    Ok(outcome)
}

/// Remove the hook only when it carries our marker.
pub fn uninstall_hook(hook: &Path) -> Result<HookOutcome> {
    if !hook.exists() {
        return Ok(HookOutcome::NotInstalled);
    }
    let current = std::fs::read_to_string(hook).unwrap_or_default();
    if !current.contains(HOOK_MARKER) {
        return Ok(HookOutcome::NotInstalled);
    }
    std::fs::remove_file(hook).with_context(|| format!("Failed to remove {}", hook.display()))?;
    Ok(HookOutcome::Removed)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .with_context(|| format!("Failed to chmod {}", path.display()))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
