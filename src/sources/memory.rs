// In-memory fragment source for zapcfg
// Lets callers and tests feed fragments without touching the disk

use crate::error::ConfigError;
use crate::models::FragmentSource;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// Fragments keyed by their full path.
///
/// A directory "exists" when it was registered with [`MemoryFragmentSource::with_dir`]
/// or is an ancestor of at least one file.
#[derive(Debug, Clone, Default)]
pub struct MemoryFragmentSource {
    dirs: Vec<PathBuf>,
    files: BTreeMap<PathBuf, Vec<u8>>,
    unreadable: Vec<PathBuf>,
}

impl MemoryFragmentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dirs.push(dir.into());
        self
    }

    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.with_bytes(path, contents.into().into_bytes())
    }

    /// Raw contents, for fragments that are not valid UTF-8
    pub fn with_bytes(mut self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }

    /// A file that is listed but fails with a permission error when read
    pub fn with_unreadable(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.files.insert(path.clone(), Vec::new());
        self.unreadable.push(path);
        self
    }
}

impl FragmentSource for MemoryFragmentSource {
    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.iter().any(|d| d == path)
            || self.files.keys().any(|f| f != path && f.starts_with(path))
    }

    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
        Ok(self
            .files
            .keys()
            .filter(|f| f.parent() == Some(dir))
            .cloned()
            .collect())
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, ConfigError> {
        if self.unreadable.iter().any(|p| p == path) {
            return Err(ConfigError::io(
                path,
                io::Error::new(io::ErrorKind::PermissionDenied, "fragment is not readable"),
            ));
        }
        self.files.get(path).cloned().ok_or_else(|| {
            ConfigError::io(path, io::Error::new(io::ErrorKind::NotFound, "no such fragment"))
        })
    }
}
