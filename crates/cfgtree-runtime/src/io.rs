//! Document I/O collaborators.
//!
//! The engine never opens files on its own. Whole documents come in through
//! a [`DocumentSource`] and go out through a [`DocumentSink`]; included files
//! come from an [`IncludeResolver`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use cfgtree_syntax::IncludeResolver;
use tracing::{debug, trace};

/// Provides the full text of one document.
pub trait DocumentSource {
    fn read_document(&mut self) -> io::Result<String>;

    /// Name reported in errors and setting origins.
    fn name(&self) -> Option<&str> {
        None
    }
}

/// Accepts the full serialized text of one document.
pub trait DocumentSink {
    fn write_document(&mut self, text: &str) -> io::Result<()>;
}

impl DocumentSource for &str {
    fn read_document(&mut self) -> io::Result<String> {
        Ok((*self).to_owned())
    }
}

/// Replaces the string's contents with the document.
impl DocumentSink for String {
    fn write_document(&mut self, text: &str) -> io::Result<()> {
        self.clear();
        self.push_str(text);
        Ok(())
    }
}

/// A document stored at a filesystem path.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    name: String,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentSource for FileStore {
    fn read_document(&mut self) -> io::Result<String> {
        debug!(path = %self.path.display(), "Reading configuration file");
        fs::read_to_string(&self.path)
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

impl DocumentSink for FileStore {
    fn write_document(&mut self, text: &str) -> io::Result<()> {
        debug!(path = %self.path.display(), bytes = text.len(), "Writing configuration file");
        fs::write(&self.path, text)
    }
}

/// Resolves `@include` names against the include directory on disk.
///
/// Absolute names are used as given.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsIncludeResolver;

impl IncludeResolver for FsIncludeResolver {
    fn resolve(&self, dir: Option<&Path>, name: &str) -> io::Result<String> {
        let path = match dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        };
        trace!(path = %path.display(), "Resolving include");
        fs::read_to_string(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_str_source_and_string_sink() {
        let mut source = "a = 1;";
        assert_eq!(source.read_document().unwrap(), "a = 1;");
        assert_eq!(source.name(), None);

        let mut sink = String::from("stale");
        sink.write_document("fresh").unwrap();
        assert_eq!(sink, "fresh");
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStore::new(dir.path().join("app.cfg"));
        assert!(store.read_document().is_err());

        store.write_document("x = 1;\n").unwrap();
        assert_eq!(store.read_document().unwrap(), "x = 1;\n");
        assert!(store.name().unwrap().ends_with("app.cfg"));
    }

    #[test]
    fn test_fs_resolver_uses_include_dir() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        fs::write(dir.join("part.cfg"), "p = 1;\n").unwrap();

        let resolver = FsIncludeResolver;
        assert_eq!(resolver.resolve(Some(dir), "part.cfg").unwrap(), "p = 1;\n");
        let absolute = dir.join("part.cfg");
        assert!(resolver.resolve(None, absolute.to_str().unwrap()).is_ok());
        assert!(resolver.resolve(Some(dir), "missing.cfg").is_err());
    }
}
