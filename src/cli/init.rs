//! Init command - scaffold SonarQube and LGPD files into a project

use crate::compliance::{DEFAULT_RULES_JSON, RULES_RELATIVE_PATH};
use crate::config::{resolve_project_name, sanitize_key, PROPERTIES_FILE, TOKEN_FILE};
use anyhow::{Context, Result};
use console::style;
use std::path::{Path, PathBuf};

const PROPERTIES_TEMPLATE: &str = include_str!("../templates/sonar-project.properties");
const WORKFLOW_TEMPLATE: &str = include_str!("../templates/sonarqube.yml");
const WORKFLOW_PATH: &str = ".github/workflows/sonarqube.yml";

/// Lines appended to `.gitignore` when missing
const GITIGNORE_ENTRIES: &[&str] = &["reports/", TOKEN_FILE];

/// What happened to each scaffolded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileAction {
    Created(PathBuf),
    Overwritten(PathBuf),
    Skipped(PathBuf),
}

/// Run the init command
pub fn run(path: &Path, force: bool) -> Result<()> {
    let root = path
        .canonicalize()
        .with_context(|| format!("Path does not exist: {}", path.display()))?;
    if !root.is_dir() {
        anyhow::bail!("Path is not a directory: {}", root.display());
    }

    println!("\n{} Initializing SonarQube + LGPD setup\n", style("▶").cyan().bold());

    for action in scaffold(&root, force)? {
        match action {
            FileAction::Created(p) => {
                println!("{} Created {}", style("✓").green(), style(rel(&root, &p)).cyan())
            }
            FileAction::Overwritten(p) => println!(
                "{} Overwrote {}",
                style("✓").yellow(),
                style(rel(&root, &p)).cyan()
            ),
            FileAction::Skipped(p) => println!(
                "{} {} already exists (use --force to overwrite)",
                style("○").dim(),
                rel(&root, &p)
            ),
        }
    }

    println!("\n{}", style("Next steps:").bold());
    println!(
        "  1. Put your SonarQube token in {} or export SONAR_TOKEN",
        style(TOKEN_FILE).cyan()
    );
    println!("  2. Run the scanner (sonar-scanner) against your server");
    println!("  3. {}", style("sonarlgpd export").cyan());
    Ok(())
}

/// Write the project files. Existing files are kept unless `force`.
pub fn scaffold(root: &Path, force: bool) -> Result<Vec<FileAction>> {
    let name = resolve_project_name(root);
    let key = sanitize_key(&name);
    let properties = PROPERTIES_TEMPLATE
        .replace("{{PROJECT_KEY}}", &key)
        .replace("{{PROJECT_NAME}}", &name);

    let mut actions = vec![
        write_file(&root.join(PROPERTIES_FILE), &properties, force)?,
        write_file(&root.join(WORKFLOW_PATH), WORKFLOW_TEMPLATE, force)?,
        write_file(&root.join(RULES_RELATIVE_PATH), DEFAULT_RULES_JSON, force)?,
    ];
    if let Some(action) = update_gitignore(root)? {
        actions.push(action);
    }
    Ok(actions)
}

fn write_file(path: &Path, content: &str, force: bool) -> Result<FileAction> {
    let existed = path.exists();
    if existed && !force {
        return Ok(FileAction::Skipped(path.to_path_buf()));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(if existed {
        FileAction::Overwritten(path.to_path_buf())
    } else {
        FileAction::Created(path.to_path_buf())
    })
}

/// Append missing ignore entries. `None` when nothing changed.
fn update_gitignore(root: &Path) -> Result<Option<FileAction>> {
    let path = root.join(".gitignore");
    let existed = path.exists();
    let current = if existed {
        std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?
    } else {
        String::new()
    };

    let present: Vec<&str> = current.lines().map(str::trim).collect();
    let missing: Vec<&str> = GITIGNORE_ENTRIES
        .iter()
        .copied()
        .filter(|e| !present.contains(e))
        .collect();
    if missing.is_empty() {
        return Ok(None);
    }

    let mut updated = current.clone();
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str("\n# sonarlgpd\n");
    for entry in missing {
        updated.push_str(entry);
        updated.push('\n');
    }
    std::fs::write(&path, updated).with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(Some(if existed {
        FileAction::Overwritten(path)
    } else {
        FileAction::Created(path)
    }))
}

fn rel(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}
