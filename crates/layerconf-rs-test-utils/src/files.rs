//! On-disk source helpers backed by a temporary directory.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write JSON5 contents to a path, creating parent directories if needed.
pub fn write_json5(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(path, contents).expect("write");
}

/// Temporary directory holding config sources for one test.
pub struct SourceDir {
    temp: TempDir,
}

impl SourceDir {
    pub fn new() -> Self {
        Self {
            temp: TempDir::new().expect("tmp"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Write `contents` to `name` inside the directory and return its path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp.path().join(name);
        write_json5(&path, contents);
        path
    }

    /// Path inside the directory that is never created.
    pub fn missing(&self, name: &str) -> PathBuf {
        self.temp.path().join(name)
    }
}

impl Default for SourceDir {
    fn default() -> Self {
        Self::new()
    }
}
