//! # Settings
//!
//! Runtime settings for the resolver and the repository map tools. Values
//! come from, in increasing priority:
//!
//! 1. Built-in defaults (the `oat-sa` organization on GitHub, `develop` as
//!    the default branch, the map under the user data directory).
//! 2. A YAML settings file, given with `--config` / `TAO_RESOLVER_CONFIG` or
//!    found at `<config dir>/tao-dependency-resolver/config.yaml`.
//! 3. The `GITHUB_TOKEN` environment variable.
//! 4. Command-line flags, applied by the commands themselves.
//!
//! ```yaml
//! organization: oat-sa
//! default_branch: develop
//! repository_map: /var/lib/tao/repositories.json
//! ```

use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::repository_map::TrackedFiles;
use crate::resolver::ResolverSettings;

/// Directory name used under the user config and data directories.
pub const APP_DIR: &str = "tao-dependency-resolver";

/// Environment variable holding the GitHub token.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

const KNOWN_KEYS: &str = "organization, default_branch, manifest_file, composer_file, api_url, registry_url, repository_map, github_token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Owner whose repositories are listed and analyzed.
    pub organization: String,
    pub default_branch: String,
    pub manifest_file: String,
    pub composer_file: String,
    pub api_url: String,
    pub registry_url: String,
    /// Where the repository map is persisted.
    pub repository_map: PathBuf,
    pub github_token: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            organization: "oat-sa".to_string(),
            default_branch: "develop".to_string(),
            manifest_file: "manifest.php".to_string(),
            composer_file: "composer.json".to_string(),
            api_url: "https://api.github.com".to_string(),
            registry_url: "https://packagist.org".to_string(),
            repository_map: default_repository_map(),
            github_token: None,
        }
    }
}

/// `<data dir>/tao-dependency-resolver/repositories.json`
pub fn default_repository_map() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("repositories.json")
}

/// `<config dir>/tao-dependency-resolver/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.yaml"))
}

impl Settings {
    /// Parse a YAML settings document; an empty document gives the defaults.
    pub fn parse(yaml_content: &str) -> Result<Self> {
        if yaml_content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml_content).map_err(|e| Error::Config {
            message: e.to_string(),
            hint: Some(format!("Supported keys: {}", KNOWN_KEYS)),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("Cannot read {}: {}", path.display(), e),
            hint: Some("Check the --config path or TAO_RESOLVER_CONFIG".to_string()),
        })?;
        Self::parse(&content)
    }

    /// Load settings from `explicit`, or from the default location when it
    /// exists, then apply the environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut settings = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|path| path.is_file()) {
                Some(path) => {
                    debug!("Using settings from {}", path.display());
                    Self::from_file(&path)?
                }
                None => Self::default(),
            },
        };
        settings.apply_token(std::env::var(TOKEN_ENV).ok());
        Ok(settings)
    }

    /// A non-blank `token` replaces the configured one.
    pub fn apply_token(&mut self, token: Option<String>) {
        if let Some(token) = token.filter(|token| !token.trim().is_empty()) {
            self.github_token = Some(token);
        }
    }

    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            default_branch: self.default_branch.clone(),
            manifest_file: self.manifest_file.clone(),
        }
    }

    pub fn tracked_files(&self) -> TrackedFiles {
        TrackedFiles {
            manifest: self.manifest_file.clone(),
            composer: self.composer_file.clone(),
        }
    }
}
