//! Composer files: the `composer.json` read during analysis and the
//! `require` manifest written from a resolution.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::extension::{ExtensionRef, ExtensionSet};

/// Key under `extra` where TAO extensions declare their short name.
pub const EXTENSION_NAME_KEY: &str = "tao-extension-name";

/// The parts of a `composer.json` the repository map cares about.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComposerFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub extra: Option<Value>,
    #[serde(default)]
    pub require: Map<String, Value>,
}

impl ComposerFile {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn package_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// `extra.tao-extension-name`, when it is a string.
    pub fn extension_name(&self) -> &str {
        self.extra
            .as_ref()
            .and_then(|extra| extra.get(EXTENSION_NAME_KEY))
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Required packages published by `owner`, in declaration order.
    pub fn requires_from(&self, owner: &str) -> Vec<String> {
        let prefix = format!("{}/", owner);
        self.require
            .keys()
            .filter(|package| package.starts_with(&prefix))
            .cloned()
            .collect()
    }
}

/// `{"require": {"owner/repo": "dev-branch", ...}}`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequireManifest {
    pub require: Map<String, Value>,
}

impl RequireManifest {
    /// Build the manifest for a resolution, optionally led by the root.
    pub fn new(root: Option<&ExtensionRef>, extensions: &ExtensionSet) -> Self {
        let mut require = Map::new();
        for extension in root.into_iter().chain(extensions) {
            require
                .entry(extension.repository_id().to_string())
                .or_insert_with(|| Value::String(extension.branch_constraint()));
        }
        Self { require }
    }

    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
