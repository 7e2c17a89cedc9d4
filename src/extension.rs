//! Resolved extension references and the ordered set a resolution produces.

use std::collections::HashMap;
use std::fmt;

use regex::Regex;

use crate::error::{Error, Result};

const REPOSITORY_ID: &str = r"^[A-Za-z0-9][A-Za-z0-9_.-]*/[A-Za-z0-9_.-]+$";

/// Check that `value` has the `owner/repo` form.
pub fn validate_repository_id(value: &str) -> Result<()> {
    let pattern = Regex::new(REPOSITORY_ID).map_err(Error::Regex)?;
    if pattern.is_match(value) {
        Ok(())
    } else {
        Err(Error::InvalidRepositoryId {
            value: value.to_string(),
        })
    }
}

/// Split an `owner/repo` identifier into its two halves.
pub fn split_repository_id(value: &str) -> Result<(&str, &str)> {
    validate_repository_id(value)?;
    value.split_once('/').ok_or_else(|| Error::InvalidRepositoryId {
        value: value.to_string(),
    })
}

/// One node of a resolution: which extension, hosted where, on which branch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtensionRef {
    extension_name: String,
    repository_id: String,
    branch_name: String,
}

impl ExtensionRef {
    /// Build a reference, rejecting an empty name or a malformed repository
    /// identifier.
    pub fn new(
        extension_name: impl Into<String>,
        repository_id: impl Into<String>,
        branch_name: impl Into<String>,
    ) -> Result<Self> {
        let extension_name = extension_name.into();
        let repository_id = repository_id.into();
        validate_repository_id(&repository_id)?;
        if extension_name.trim().is_empty() {
            return Err(Error::InvalidExtensionName {
                repository: repository_id,
            });
        }
        Ok(Self {
            extension_name,
            repository_id,
            branch_name: branch_name.into(),
        })
    }

    pub fn extension_name(&self) -> &str {
        &self.extension_name
    }

    pub fn repository_id(&self) -> &str {
        &self.repository_id
    }

    pub fn branch_name(&self) -> &str {
        &self.branch_name
    }

    /// Repository owner (the part before the slash).
    pub fn owner(&self) -> &str {
        self.repository_id
            .split_once('/')
            .map(|(owner, _)| owner)
            .unwrap_or_default()
    }

    /// Repository name (the part after the slash).
    pub fn repository_name(&self) -> &str {
        self.repository_id
            .split_once('/')
            .map(|(_, name)| name)
            .unwrap_or_default()
    }

    /// Composer constraint pinning this reference's branch.
    pub fn branch_constraint(&self) -> String {
        format!("dev-{}", self.branch_name)
    }
}

impl fmt::Display for ExtensionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}@{})",
            self.extension_name, self.repository_id, self.branch_name
        )
    }
}

/// Extensions discovered by one resolution, in first-discovery order.
///
/// Keys are extension names; membership tests are O(1). Entries are only
/// ever inserted, never replaced or removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionSet {
    entries: Vec<ExtensionRef>,
    required_by: Vec<String>,
    index: HashMap<String, usize>,
}

impl ExtensionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `extension`, recording which extension declared it.
    ///
    /// Returns `false` and leaves the set untouched when the name is already
    /// present.
    pub fn insert(&mut self, extension: ExtensionRef, required_by: impl Into<String>) -> bool {
        if self.index.contains_key(extension.extension_name()) {
            return false;
        }
        self.index
            .insert(extension.extension_name().to_string(), self.entries.len());
        self.entries.push(extension);
        self.required_by.push(required_by.into());
        true
    }

    pub fn contains(&self, extension_name: &str) -> bool {
        self.index.contains_key(extension_name)
    }

    pub fn get(&self, extension_name: &str) -> Option<&ExtensionRef> {
        self.index
            .get(extension_name)
            .map(|&position| &self.entries[position])
    }

    /// Name of the extension whose manifest first declared `extension_name`.
    pub fn required_by(&self, extension_name: &str) -> Option<&str> {
        self.index
            .get(extension_name)
            .map(|&position| self.required_by[position].as_str())
    }

    /// Extensions first declared by `extension_name`, in discovery order.
    pub fn discovered_by<'a>(
        &'a self,
        extension_name: &'a str,
    ) -> impl Iterator<Item = &'a ExtensionRef> + 'a {
        self.entries
            .iter()
            .zip(&self.required_by)
            .filter(move |(_, parent)| parent.as_str() == extension_name)
            .map(|(extension, _)| extension)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtensionRef> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(ExtensionRef::extension_name).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a ExtensionSet {
    type Item = &'a ExtensionRef;
    type IntoIter = std::slice::Iter<'a, ExtensionRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
