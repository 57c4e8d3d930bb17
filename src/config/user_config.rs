//! User-level configuration for sonarlgpd
//!
//! Loaded from `~/.config/sonarlgpd/config.toml` (platform config dir).
//! Environment variables take priority; that merge happens in
//! [`super::SonarSettings::resolve`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserConfig {
    #[serde(default)]
    pub sonar: SonarSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SonarSection {
    /// SonarQube base URL (default: http://localhost:9000)
    pub host_url: Option<String>,

    /// User token generated under My Account > Security
    pub token: Option<String>,
}

impl UserConfig {
    /// Load the user config file. A missing or unreadable file yields the
    /// default config; a malformed one is logged and ignored.
    pub fn load() -> Self {
        match Self::user_config_path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                warn!("Ignoring user config: {:#}", e);
                UserConfig::default()
            }),
            _ => UserConfig::default(),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: UserConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        debug!("Loaded user config from {}", path.display());
        Ok(config.normalized())
    }

    /// Get the user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("sonarlgpd").join("config.toml"))
    }

    /// Blank strings count as unset.
    fn normalized(mut self) -> Self {
        self.sonar.host_url = non_blank(self.sonar.host_url);
        self.sonar.token = non_blank(self.sonar.token);
        self
    }

    pub fn host_url(&self) -> Option<&str> {
        self.sonar.host_url.as_deref()
    }

    pub fn token(&self) -> Option<&str> {
        self.sonar.token.as_deref()
    }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
