//! Input text plus the mapping from its lines back to original files.

use std::sync::Arc;

use cfgtree_core::{ConfigError, Origin};

/// Text handed to the parser.
///
/// A plain source maps line `n` to line `n` of its own file. A source
/// produced by include expansion carries one [`Origin`] per line, so errors
/// and settings point into the file the line actually came from.
#[derive(Debug, Clone)]
pub struct Source {
    text: String,
    file: Option<Arc<str>>,
    lines: Option<Vec<Origin>>,
}

impl Source {
    /// Unnamed text, e.g. a string passed in by the caller.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            file: None,
            lines: None,
        }
    }

    /// Text read from a file called `file`.
    pub fn named(text: impl Into<String>, file: impl Into<Arc<str>>) -> Self {
        Self {
            text: text.into(),
            file: Some(file.into()),
            lines: None,
        }
    }

    pub(crate) fn mapped(text: String, file: Option<Arc<str>>, lines: Vec<Origin>) -> Self {
        Self {
            text,
            file,
            lines: Some(lines),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Name of the top-level file, if any.
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub(crate) fn file_arc(&self) -> Option<Arc<str>> {
        self.file.clone()
    }

    /// Maps a 1-based line of [`Source::text`] to where it came from.
    pub fn origin(&self, line: u32) -> Origin {
        match &self.lines {
            Some(lines) => {
                let index = (line as usize).saturating_sub(1);
                lines
                    .get(index)
                    .or_else(|| lines.last())
                    .cloned()
                    .unwrap_or_else(|| Origin::new(self.file.clone(), line))
            }
            None => Origin::new(self.file.clone(), line),
        }
    }

    /// Builds a syntax error located at `line` of this source.
    pub fn error(&self, line: u32, message: impl Into<String>) -> ConfigError {
        let origin = self.origin(line);
        ConfigError::syntax(origin.file.as_deref(), origin.line, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_source_maps_identity() {
        let source = Source::named("a = 1;\n", "app.cfg");
        assert_eq!(source.origin(4), Origin::new(Some("app.cfg".into()), 4));
        assert_eq!(
            source.error(2, "boom"),
            ConfigError::syntax(Some("app.cfg"), 2, "boom")
        );
    }

    #[test]
    fn test_mapped_source_uses_line_table() {
        let lines = vec![
            Origin::new(Some("main.cfg".into()), 1),
            Origin::new(Some("inc.cfg".into()), 1),
            Origin::new(Some("main.cfg".into()), 3),
        ];
        let source = Source::mapped("a\nb\nc\n".into(), Some("main.cfg".into()), lines);
        assert_eq!(source.origin(2), Origin::new(Some("inc.cfg".into()), 1));
        // Past the end falls back to the last known line.
        assert_eq!(source.origin(9), Origin::new(Some("main.cfg".into()), 3));
    }
}
