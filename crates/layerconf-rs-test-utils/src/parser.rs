//! In-memory source parser.

use layerconf_rs_config::{ParseError, SourceParser, Value, parse_json5_str};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Serves JSON5 sources from memory and counts parse calls.
///
/// Clones share their sources, so a test can keep a handle after passing
/// the parser to the loader.
#[derive(Debug, Clone, Default)]
pub struct MemoryParser {
    sources: Rc<RefCell<HashMap<PathBuf, String>>>,
    parses: Rc<Cell<usize>>,
}

impl MemoryParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a source.
    pub fn with_source(self, path: impl AsRef<Path>, contents: &str) -> Self {
        self.set(path, contents);
        self
    }

    pub fn set(&self, path: impl AsRef<Path>, contents: &str) {
        self.sources
            .borrow_mut()
            .insert(path.as_ref().to_path_buf(), contents.to_string());
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        self.sources.borrow_mut().remove(path.as_ref());
    }

    /// Number of `parse` calls so far.
    pub fn parse_count(&self) -> usize {
        self.parses.get()
    }
}

impl SourceParser for MemoryParser {
    fn exists(&self, source: &Path) -> bool {
        self.sources.borrow().contains_key(source)
    }

    fn parse(&self, source: &Path) -> Result<Value, ParseError> {
        self.parses.set(self.parses.get() + 1);
        let identifier = source.display().to_string();
        let sources = self.sources.borrow();
        let contents = sources
            .get(source)
            .ok_or_else(|| ParseError::new(&identifier, "source vanished"))?;
        parse_json5_str(&identifier, contents)
    }
}
