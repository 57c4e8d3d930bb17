//! Fatal export errors
//!
//! Only these surface as a non-zero exit. Everything else (optional
//! fetches, audits, git) degrades to empty data at its own boundary.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(
        "No SonarQube token found. Set SONAR_TOKEN, write it to {token_file}, \
         or add `token` under [sonar] in the user config. \
         Generate one in SonarQube under My Account > Security."
    )]
    MissingToken { token_file: String },

    #[error(
        "Could not fetch measures for project '{project_key}' from {server}. \
         Check that the server is up and the project was analyzed (run `sonarlgpd doctor`)."
    )]
    MetricsUnavailable { project_key: String, server: String },

    #[error("Failed to write report to {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid compliance mapping at {path}: {message}")]
    InvalidRules { path: PathBuf, message: String },
}

pub type ExportResult<T> = Result<T, ExportError>;
