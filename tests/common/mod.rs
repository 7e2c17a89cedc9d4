//! Shared test utilities for E2E tests.
//!
//! Every command runs against a temporary settings file whose API URL points
//! at a closed local port, so no test ever reaches the network.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_map(fixtures::MAP);
//!     fixture.command().args(["map", "info"]).assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::fixtures;
    pub use super::TestFixture;
}

/// Fixture documents.
#[allow(dead_code)]
pub mod fixtures {
    /// A small analyzed map in persisted form.
    pub const MAP: &str = r#"{
  "oat-sa/generis": {
    "owner": "oat-sa",
    "name": "generis",
    "isPrivate": false,
    "defaultBranch": "develop",
    "extensionName": "generis",
    "composerPackageName": "oat-sa/generis",
    "onPackageRegistry": true,
    "branches": {
      "develop": {
        "name": "develop",
        "files": {
          "manifest.php": {
            "name": "manifest.php",
            "composerPackageName": "",
            "extensionName": "generis",
            "requires": []
          }
        }
      }
    }
  },
  "oat-sa/tao-core": {
    "owner": "oat-sa",
    "name": "tao-core",
    "isPrivate": false,
    "defaultBranch": "develop",
    "extensionName": "tao",
    "composerPackageName": "oat-sa/tao-core",
    "onPackageRegistry": true,
    "branches": {
      "develop": {
        "name": "develop",
        "files": {
          "manifest.php": {
            "name": "manifest.php",
            "composerPackageName": "",
            "extensionName": "tao",
            "requires": ["generis"]
          }
        }
      }
    }
  },
  "oat-sa/tao-docs": {
    "owner": "oat-sa",
    "name": "tao-docs",
    "isPrivate": true,
    "defaultBranch": "main",
    "extensionName": "__NOT_FOUND__",
    "composerPackageName": "",
    "onPackageRegistry": false,
    "branches": {}
  },
  "oat-sa/extension-tao-backoffice": {
    "owner": "oat-sa",
    "name": "extension-tao-backoffice",
    "isPrivate": false,
    "defaultBranch": "develop",
    "extensionName": "",
    "composerPackageName": "",
    "onPackageRegistry": false,
    "branches": {}
  }
}
"#;

    /// Settings pointing every remote at a closed local port.
    pub const OFFLINE_SETTINGS: &str = "api_url: http://127.0.0.1:9\nregistry_url: http://127.0.0.1:9\n";
}

/// A temporary directory holding a settings file and, optionally, a map.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a fixture with offline settings and no map.
    pub fn new() -> Self {
        let fixture = Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        };
        fixture.with_settings(fixtures::OFFLINE_SETTINGS)
    }

    /// Replace the settings file; the map path is always appended.
    pub fn with_settings(self, content: &str) -> Self {
        let settings = format!(
            "{}repository_map: {}\n",
            content,
            self.map_path().display()
        );
        self.temp_dir
            .child("settings.yaml")
            .write_str(&settings)
            .expect("Failed to write settings file");
        self
    }

    /// Write the repository map.
    pub fn with_map(self, content: &str) -> Self {
        self.temp_dir
            .child("repositories.json")
            .write_str(content)
            .expect("Failed to write map");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn map_path(&self) -> PathBuf {
        self.temp_dir.path().join("repositories.json")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.temp_dir.path().join("settings.yaml")
    }

    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// A command using this fixture's settings, without colours or token.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("tao-dependency-resolver");
        cmd.current_dir(self.path())
            .env("TAO_RESOLVER_CONFIG", self.settings_path())
            .env("NO_COLOR", "1")
            .env_remove("GITHUB_TOKEN")
            .env_remove("RUST_LOG");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_writes_settings() {
        let fixture = TestFixture::new();
        let settings = std::fs::read_to_string(fixture.settings_path()).unwrap();
        assert!(settings.contains("api_url: http://127.0.0.1:9"));
        assert!(settings.contains("repository_map:"));
    }

    #[test]
    fn test_fixture_map_is_valid_json() {
        serde_json::from_str::<serde_json::Value>(fixtures::MAP).expect("Map should be valid JSON");
    }
}
