// Filesystem fragment source for zapcfg
// Uses walkdir to enumerate the files of a configuration directory

use crate::error::ConfigError;
use crate::models::FragmentSource;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Reads fragments from the real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFragmentSource;

impl FragmentSource for OsFragmentSource {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir)
            .follow_links(true)
            .min_depth(1)
            .max_depth(1) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(dir).to_path_buf();
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
                ConfigError::io(path, source)
            })?;
            // With follow_links the file type is the link target's
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, ConfigError> {
        std::fs::read(path).map_err(|e| ConfigError::io(path, e))
    }
}
