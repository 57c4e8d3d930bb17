//! Repository activity summary using libgit2
//!
//! Branch, commit count, latest commit and top contributors for the
//! report's activity section. Opening or walking the repository may fail
//! (no repo, unborn HEAD, corrupt objects); callers get blank defaults.

use crate::models::{Contributor, RepoActivity};
use anyhow::{Context, Result};
use git2::{Repository, Sort};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// How many contributors the report lists
pub const TOP_CONTRIBUTORS: usize = 10;

/// Collect activity for the repository containing `path`.
///
/// Never fails: any git error is logged and yields `RepoActivity::default()`.
pub fn repo_activity(path: &Path) -> RepoActivity {
    match collect(path) {
        Ok(activity) => activity,
        Err(e) => {
            warn!("Git activity unavailable: {:#}", e);
            RepoActivity::default()
        }
    }
}

fn collect(path: &Path) -> Result<RepoActivity> {
    let repo = Repository::discover(path)
        .with_context(|| format!("Failed to open git repository at {:?}", path))?;
    debug!("Opened git repository at {:?}", repo.path());

    let head = repo.head().context("Repository has no HEAD")?;
    let branch = head.shorthand().unwrap_or("HEAD").to_string();

    let head_commit = head.peel_to_commit().context("HEAD is not a commit")?;
    let last_commit = format!(
        "{} {}",
        short_id(&head_commit.id().to_string()),
        head_commit.summary().unwrap_or("")
    )
    .trim_end()
    .to_string();

    let mut revwalk = repo.revwalk()?;
    revwalk.set_sorting(Sort::TIME)?;
    revwalk.push_head()?;

    let mut commit_count = 0;
    let mut by_author: HashMap<String, usize> = HashMap::new();
    for oid in revwalk {
        let commit = repo.find_commit(oid?)?;
        commit_count += 1;
        let author = commit.author().name().unwrap_or("Unknown").to_string();
        *by_author.entry(author).or_default() += 1;
    }

    Ok(RepoActivity {
        branch,
        commit_count,
        last_commit,
        contributors: top_contributors(by_author, TOP_CONTRIBUTORS),
    })
}

fn short_id(full: &str) -> &str {
    &full[..full.len().min(7)]
}

/// Highest commit counts first, ties broken by name.
fn top_contributors(by_author: HashMap<String, usize>, limit: usize) -> Vec<Contributor> {
    let mut contributors: Vec<Contributor> = by_author
        .into_iter()
        .map(|(name, commits)| Contributor { name, commits })
        .collect();
    contributors.sort_by(|a, b| b.commits.cmp(&a.commits).then_with(|| a.name.cmp(&b.name)));
    contributors.truncate(limit);
    contributors
}
