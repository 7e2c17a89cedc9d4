//! File storage used for the repository map and generated reports.
//!
//! `DiskStore` reads and writes the host filesystem; `MemoryStore` keeps
//! everything in a map and is what the unit tests persist into.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::Result;

/// Whole-file text storage.
pub trait FileStore {
    /// Read the file at `path`, or `None` if it does not exist.
    fn read(&self, path: &Path) -> Result<Option<String>>;

    /// Replace the file at `path` with `content`, creating parent
    /// directories as needed.
    fn write(&self, path: &Path, content: &str) -> Result<()>;
}

/// Host filesystem storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskStore;

impl FileStore for DiskStore {
    fn read(&self, path: &Path) -> Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        debug!("Writing {} bytes to {}", content.len(), path.display());
        fs::write(path, content)?;
        Ok(())
    }
}

/// In-memory storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: RefCell<HashMap<PathBuf, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files written so far.
    pub fn len(&self) -> usize {
        self.files.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.borrow().is_empty()
    }
}

impl FileStore for MemoryStore {
    fn read(&self, path: &Path) -> Result<Option<String>> {
        Ok(self.files.borrow().get(path).cloned())
    }

    fn write(&self, path: &Path, content: &str) -> Result<()> {
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }
}
