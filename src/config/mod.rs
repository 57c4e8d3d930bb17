//! Configuration resolution
//!
//! - Server URL: `--server` > `SONAR_HOST_URL` > user config > default
//! - Token: `SONAR_TOKEN` > `<root>/.sonar-token` > user config
//! - Project key: `--project-key` > `sonar-project.properties` > directory name
//!
//! The `resolve_*` functions take their inputs explicitly so they can be
//! tested without touching the process environment.

mod user_config;

pub use user_config::{SonarSection, UserConfig};

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use user_config::non_blank;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:9000";
pub const TOKEN_FILE: &str = ".sonar-token";
pub const PROPERTIES_FILE: &str = "sonar-project.properties";

pub const ENV_HOST_URL: &str = "SONAR_HOST_URL";
pub const ENV_TOKEN: &str = "SONAR_TOKEN";

/// Where the token came from, reported by `doctor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    Env,
    TokenFile(PathBuf),
    UserConfig,
}

impl std::fmt::Display for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenSource::Env => write!(f, "{} environment variable", ENV_TOKEN),
            TokenSource::TokenFile(path) => write!(f, "{}", path.display()),
            TokenSource::UserConfig => write!(f, "user config"),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub source: TokenSource,
}

// Keep tokens out of debug logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"***")
            .field("source", &self.source)
            .finish()
    }
}

/// Everything needed to talk to SonarQube about one project.
#[derive(Debug, Clone)]
pub struct SonarSettings {
    pub server_url: String,
    pub credential: Option<Credential>,
    pub project_key: String,
    pub project_name: String,
}

impl SonarSettings {
    /// Resolve from flags, the process environment, files under `root`
    /// and the user config.
    pub fn resolve(root: &Path, server_flag: Option<&str>, key_flag: Option<&str>) -> Self {
        let user = UserConfig::load();
        let env_host = non_blank(std::env::var(ENV_HOST_URL).ok());
        let env_token = non_blank(std::env::var(ENV_TOKEN).ok());
        Self::resolve_with(root, server_flag, key_flag, env_host, env_token, &user)
    }

    pub fn resolve_with(
        root: &Path,
        server_flag: Option<&str>,
        key_flag: Option<&str>,
        env_host: Option<String>,
        env_token: Option<String>,
        user: &UserConfig,
    ) -> Self {
        Self {
            server_url: resolve_server_url(server_flag, env_host, user),
            credential: resolve_token(root, env_token, user),
            project_key: resolve_project_key(root, key_flag),
            project_name: resolve_project_name(root),
        }
    }
}

pub fn resolve_server_url(flag: Option<&str>, env: Option<String>, user: &UserConfig) -> String {
    flag.map(str::to_string)
        .and_then(|f| non_blank(Some(f)))
        .or(env)
        .or_else(|| user.host_url().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
        .trim_end_matches('/')
        .to_string()
}

pub fn resolve_token(root: &Path, env: Option<String>, user: &UserConfig) -> Option<Credential> {
    if let Some(token) = env {
        return Some(Credential {
            token,
            source: TokenSource::Env,
        });
    }
    let path = root.join(TOKEN_FILE);
    if let Some(token) = read_token_file(&path) {
        return Some(Credential {
            token,
            source: TokenSource::TokenFile(path),
        });
    }
    user.token().map(|token| Credential {
        token: token.to_string(),
        source: TokenSource::UserConfig,
    })
}

/// First non-empty trimmed line of the token file.
pub fn read_token_file(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

pub fn resolve_project_key(root: &Path, flag: Option<&str>) -> String {
    flag.and_then(|f| non_blank(Some(f.to_string())))
        .or_else(|| properties_value(root, "sonar.projectKey"))
        .unwrap_or_else(|| sanitize_key(&dir_name(root)))
}

/// `sonar.projectName`, falling back to the directory name.
pub fn resolve_project_name(root: &Path) -> String {
    properties_value(root, "sonar.projectName").unwrap_or_else(|| dir_name(root))
}

/// Read one property from `<root>/sonar-project.properties`.
pub fn properties_value(root: &Path, key: &str) -> Option<String> {
    let content = std::fs::read_to_string(root.join(PROPERTIES_FILE)).ok()?;
    parse_property(&content, key)
}

fn property_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*([A-Za-z0-9_.\-]+)\s*[=:]\s*(.*?)\s*$").expect("valid property regex")
    })
}

/// Value of `key` in Java-properties text. Comments are skipped and the
/// last assignment wins, like `java.util.Properties`.
pub fn parse_property(content: &str, key: &str) -> Option<String> {
    content
        .lines()
        .filter(|l| {
            let t = l.trim_start();
            !t.starts_with('#') && !t.starts_with('!')
        })
        .filter_map(|l| property_regex().captures(l))
        .filter(|c| &c[1] == key)
        .map(|c| c[2].to_string())
        .filter(|v| !v.is_empty())
        .last()
}

fn dir_name(root: &Path) -> String {
    let canonical = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    canonical
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "project".to_string())
}

/// Turn a directory name into a valid SonarQube project key.
pub fn sanitize_key(name: &str) -> String {
    let mut key: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':') {
                c
            } else {
                '-'
            }
        })
        .collect();
    while key.contains("--") {
        key = key.replace("--", "-");
    }
    let key = key.trim_matches('-').to_string();
    if key.is_empty() || key.chars().all(|c| c.is_ascii_digit()) {
        format!("project-{}", key).trim_end_matches('-').to_string()
    } else {
        key
    }
}
