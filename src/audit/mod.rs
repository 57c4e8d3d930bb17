//! Local audits that feed the report alongside SonarQube data
//!
//! Everything here degrades instead of failing: a missing package
//! manager or a broken lockfile yields empty results for that source.

pub mod deps;
pub mod runner;

pub use deps::{audit_dependencies, parse_audit, parse_outdated, PackageManager, MANIFEST_LOCATIONS};
pub use runner::{
    is_tool_installed, run_for_stdout, CommandError, CommandOutput, CommandRunner, SystemRunner,
};
