//! Parser and writer options.
//!
//! Both structs deserialize with defaults for every field, so the runtime
//! can embed them directly in its options file.

use serde::{Deserialize, Serialize};

/// Limits applied while reading text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Deepest allowed nesting of groups, lists and arrays.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Deepest allowed chain of `@include` directives.
    #[serde(default = "default_max_include_depth")]
    pub max_include_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_include_depth: default_max_include_depth(),
        }
    }
}

fn default_max_depth() -> usize {
    256
}

fn default_max_include_depth() -> usize {
    10
}

/// Separator written between a setting name and its value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Assignment {
    /// `name = value;`
    #[default]
    Equals,
    /// `name: value;`
    Colon,
}

impl Assignment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => " = ",
            Self::Colon => ": ",
        }
    }
}

/// Formatting used when serializing a tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOptions {
    /// Spaces per nesting level.
    #[serde(default = "default_indent_width")]
    pub indent_width: usize,

    #[serde(default)]
    pub assignment: Assignment,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            indent_width: default_indent_width(),
            assignment: Assignment::default(),
        }
    }
}

fn default_indent_width() -> usize {
    2
}
