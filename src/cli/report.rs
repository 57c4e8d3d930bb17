//! Report command - write the Markdown LGPD checklist

use crate::compliance::resolve_rules;
use crate::config::resolve_project_name;
use crate::reporters::markdown;
use anyhow::{Context, Result};
use chrono::Local;
use console::style;
use std::path::{Path, PathBuf};

/// Output path relative to the project root
pub const CHECKLIST_PATH: &str = "reports/lgpd-checklist.md";

pub fn run(path: &Path, rules: Option<&Path>, to_stdout: bool) -> Result<()> {
    let root = path
        .canonicalize()
        .with_context(|| format!("Path does not exist: {}", path.display()))?;

    let rules = resolve_rules(&root, rules);
    let md = markdown::render_checklist(&resolve_project_name(&root), &rules, Local::now());

    if to_stdout {
        print!("{}", md);
        return Ok(());
    }

    let out = write_checklist(&root, &md)?;
    println!(
        "{} LGPD checklist ({} rules) written to {}",
        style("✓").green(),
        rules.len(),
        style(out.display()).cyan()
    );
    Ok(())
}

fn write_checklist(root: &Path, md: &str) -> Result<PathBuf> {
    let out = root.join(CHECKLIST_PATH);
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(&out, md).with_context(|| format!("Failed to write {}", out.display()))?;
    Ok(out)
}
