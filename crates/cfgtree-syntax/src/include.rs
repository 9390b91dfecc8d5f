//! `@include` pre-processing.
//!
//! A line of the form
//!
//! ```text
//! @include "listeners.cfg"
//! ```
//!
//! is replaced by the text of the named file before the parser runs. The
//! file is obtained from an [`IncludeResolver`], so this module never touches
//! the filesystem itself. Directives inside `/* ... */` comments are left
//! alone for the lexer to discard.

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::Arc;

use cfgtree_core::{ConfigError, ConfigResult, Origin};
use tracing::debug;

use crate::options::ParseOptions;
use crate::source::Source;

const DIRECTIVE: &str = "@include";

/// Supplies the text of included files.
pub trait IncludeResolver {
    /// Returns the contents of `name`, looked up relative to `dir` when one
    /// is configured.
    fn resolve(&self, dir: Option<&Path>, name: &str) -> io::Result<String>;
}

/// In-memory resolver keyed by include name. The directory is ignored.
impl IncludeResolver for HashMap<String, String> {
    fn resolve(&self, _dir: Option<&Path>, name: &str) -> io::Result<String> {
        self.get(name).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no include named '{name}'"))
        })
    }
}

/// Expands every `@include` line of `source`, recursively.
///
/// The result maps each line back to the file and line it came from.
pub fn expand_includes(
    source: &Source,
    resolver: &dyn IncludeResolver,
    dir: Option<&Path>,
    options: &ParseOptions,
) -> ConfigResult<Source> {
    let mut expander = Expander {
        resolver,
        dir,
        options,
        text: String::with_capacity(source.text().len()),
        lines: Vec::new(),
    };
    expander.expand(source.text(), source.file_arc(), 0)?;
    Ok(Source::mapped(expander.text, source.file_arc(), expander.lines))
}

/// Returns `true` if any line of `text` outside a block comment looks like
/// an include directive.
pub fn has_includes(text: &str) -> bool {
    let mut comments = BlockComments::default();
    text.lines().any(|line| {
        let found = !comments.open && line.trim_start().starts_with(DIRECTIVE);
        comments.scan(line);
        found
    })
}

/// Tracks whether a `/* ... */` comment is open across lines.
#[derive(Debug, Default)]
struct BlockComments {
    open: bool,
}

impl BlockComments {
    /// Updates the state with one line, skipping strings and line comments
    /// the same way the lexer does.
    fn scan(&mut self, line: &str) {
        let mut chars = line.chars().peekable();
        while let Some(ch) = chars.next() {
            if self.open {
                if ch == '*' && chars.next_if_eq(&'/').is_some() {
                    self.open = false;
                }
                continue;
            }
            match ch {
                '#' => return,
                '/' if chars.peek() == Some(&'/') => return,
                '/' if chars.next_if_eq(&'*').is_some() => self.open = true,
                '"' => {
                    while let Some(c) = chars.next() {
                        match c {
                            '\\' => {
                                chars.next();
                            }
                            '"' => break,
                            _ => {}
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

struct Expander<'r> {
    resolver: &'r dyn IncludeResolver,
    dir: Option<&'r Path>,
    options: &'r ParseOptions,
    text: String,
    lines: Vec<Origin>,
}

impl Expander<'_> {
    fn expand(&mut self, text: &str, file: Option<Arc<str>>, depth: usize) -> ConfigResult<()> {
        let mut comments = BlockComments::default();
        for (index, line) in text.lines().enumerate() {
            let line_no = u32::try_from(index + 1).unwrap_or(u32::MAX);
            let error = |message: String| ConfigError::syntax(file.as_deref(), line_no, message);

            let directive = if comments.open {
                None
            } else {
                parse_directive(line)
            };
            comments.scan(line);

            match directive {
                None => {
                    self.text.push_str(line);
                    self.text.push('\n');
                    self.lines.push(Origin::new(file.clone(), line_no));
                }
                Some(Err(message)) => return Err(error(message.to_string())),
                Some(Ok(name)) => {
                    if depth >= self.options.max_include_depth {
                        return Err(error(format!(
                            "include depth exceeds the maximum of {}",
                            self.options.max_include_depth
                        )));
                    }
                    let included = self
                        .resolver
                        .resolve(self.dir, name)
                        .map_err(|err| error(format!("cannot open include file '{name}': {err}")))?;
                    debug!(include = name, depth = depth + 1, "Expanding include");
                    self.expand(&included, Some(Arc::from(name)), depth + 1)?;
                }
            }
        }
        Ok(())
    }
}

/// Recognises `@include "name"` with optional trailing comment.
fn parse_directive(line: &str) -> Option<Result<&str, &'static str>> {
    let rest = line.trim_start().strip_prefix(DIRECTIVE)?;
    let malformed = "malformed include directive, expected @include \"file\"";

    let rest = rest.trim_start();
    let Some(quoted) = rest.strip_prefix('"') else {
        return Some(Err(malformed));
    };
    let Some(end) = quoted.find('"') else {
        return Some(Err(malformed));
    };
    let name = &quoted[..end];
    let trailing = quoted[end + 1..].trim();
    if name.is_empty()
        || !(trailing.is_empty() || trailing.starts_with('#') || trailing.starts_with("//"))
    {
        return Some(Err(malformed));
    }
    Some(Ok(name))
}
