//! sonarlgpd - SonarQube quality and LGPD compliance reports
//!
//! Fetches analysis results from a SonarQube server, cross-references
//! them with an LGPD rule mapping, audits dependencies and git history,
//! and renders everything into one scored HTML report.

pub mod audit;
pub mod cli;
pub mod compliance;
pub mod config;
pub mod error;
pub mod git;
pub mod models;
pub mod reporters;
pub mod scoring;
pub mod sonar;
