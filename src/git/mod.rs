//! Git repository introspection
//!
//! Provides the activity summary (branch, commit count, latest commit,
//! top contributors) shown in the report, via the git2 crate.
//!
//! # Example
//!
//! ```no_run
//! use sonarlgpd::git::repo_activity;
//! use std::path::Path;
//!
//! let activity = repo_activity(Path::new("."));
//! println!("{} commits on {}", activity.commit_count, activity.branch);
//! ```

pub mod activity;

pub use activity::{repo_activity, TOP_CONTRIBUTORS};
