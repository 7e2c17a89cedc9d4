//! # Error Handling
//!
//! This module defines the centralized error type for the resolver library.
//! It uses `thiserror` to build a single `Error` enum that covers every
//! anticipated failure mode, each variant carrying enough context (extension,
//! repository, branch, URL) for the CLI to explain what went wrong.
//!
//! ## Key Components
//!
//! - **`Error`**: every failure the library can report, including:
//!   - Manifest syntax errors.
//!   - Unmapped extensions during resolution.
//!   - Expected hosted-API conditions (missing branch, empty repository,
//!     missing file) that callers are free to recover from.
//!   - Authentication and transport failures.
//!   - Malformed persisted repository maps.
//!   - Aborted analysis batches.
//!   - Configuration, I/O and serialization failures.
//!
//! - **`Result<T>`**: a type alias for `std::result::Result<T, Error>`.

use thiserror::Error;

/// Main error type for dependency resolution and repository map maintenance
#[derive(Error, Debug)]
pub enum Error {
    /// The manifest text could not be parsed as a returned array literal.
    #[error("Manifest syntax error in {origin} at line {line}, column {column}: {message}")]
    ManifestSyntax {
        origin: String,
        line: usize,
        column: usize,
        message: String,
    },

    /// A declared dependency has no entry in the extension catalog.
    #[error("Extension \"{name}\" not found in map. (required by {required_by})")]
    UnmappedExtension {
        name: String,
        /// `owner/repo@branch` of the manifest that declared the dependency
        required_by: String,
    },

    /// An extension reference was built with an empty name.
    #[error("Invalid extension name for repository {repository}: name must not be empty")]
    InvalidExtensionName { repository: String },

    /// A repository identifier does not follow the `owner/repo` form.
    #[error("Invalid repository identifier \"{value}\": expected owner/repo")]
    InvalidRepositoryId { value: String },

    /// A branch override could not be parsed from `NAME=BRANCH`.
    #[error("Invalid branch override \"{value}\": expected EXTENSION=BRANCH")]
    InvalidBranchOverride { value: String },

    /// The requested branch does not exist in the repository.
    #[error("Branch {branch} not found in {repository}")]
    BranchNotFound { repository: String, branch: String },

    /// The repository has no commits, so it cannot have any branch.
    #[error("Repository {repository} is empty")]
    EmptyRepository { repository: String },

    /// The requested file does not exist on the given branch.
    #[error("File {path} not found in {repository}@{branch}")]
    FileNotFound {
        repository: String,
        branch: String,
        path: String,
    },

    /// Credentials were rejected by the hosted API.
    #[error("Error while authenticating to {api}: {message}")]
    Authentication { api: String, message: String },

    /// A request to a remote API failed.
    #[error("Network operation error: {url} - {message}")]
    Network { url: String, message: String },

    /// The persisted repository map is not valid JSON or has the wrong shape.
    #[error("Repository map {path} is unreadable: {message}")]
    RepositoryMapParse { path: String, message: String },

    /// An analysis batch failed; nothing from the batch was persisted.
    #[error("Analysis aborted at {repository} after {analyzed} repositories were analyzed (no progress saved): {source}")]
    AnalysisAborted {
        repository: String,
        analyzed: usize,
        #[source]
        source: Box<Error>,
    },

    /// An error occurred while loading the settings file.
    ///
    /// This error includes the specific parsing issue and optionally a hint
    /// about how to fix it.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Config {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_unmapped_extension() {
        let error = Error::UnmappedExtension {
            name: "Z".to_string(),
            required_by: "oat-sa/a@develop".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.starts_with("Extension \"Z\" not found in map."));
        assert!(display.contains("oat-sa/a@develop"));
    }

    #[test]
    fn test_error_display_manifest_syntax() {
        let error = Error::ManifestSyntax {
            origin: "oat-sa/generis@develop:manifest.php".to_string(),
            line: 3,
            column: 7,
            message: "unterminated string".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Manifest syntax error"));
        assert!(display.contains("line 3, column 7"));
        assert!(display.contains("unterminated string"));
    }

    #[test]
    fn test_error_display_authentication() {
        let error = Error::Authentication {
            api: "GitHub API".to_string(),
            message: "Bad credentials".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Error while authenticating to GitHub API: Bad credentials"
        );
    }

    #[test]
    fn test_error_display_config_with_hint() {
        let error = Error::Config {
            message: "Missing token".to_string(),
            hint: Some("Set GITHUB_TOKEN".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.contains("Configuration error"));
        assert!(display.contains("hint:"));
        assert!(display.contains("Set GITHUB_TOKEN"));
    }

    #[test]
    fn test_error_display_analysis_aborted() {
        let error = Error::AnalysisAborted {
            repository: "oat-sa/tao-core".to_string(),
            analyzed: 4,
            source: Box::new(Error::Network {
                url: "https://api.github.com".to_string(),
                message: "timeout".to_string(),
            }),
        };
        let display = format!("{}", error);
        assert!(display.contains("after 4 repositories"));
        assert!(display.contains("no progress saved"));
        assert!(display.contains("timeout"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        let display = format!("{}", error);
        assert!(display.contains("I/O error"));
        assert!(display.contains("File not found"));
    }

    #[test]
    fn test_error_from_yaml_error() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: [unclosed").unwrap_err();
        let error: Error = yaml_error.into();
        assert!(format!("{}", error).contains("YAML parsing error"));
    }
}
