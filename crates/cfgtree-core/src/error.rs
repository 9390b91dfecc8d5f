//! Unified error type for the configuration engine.
//!
//! Every fallible operation returns a [`ConfigError`] directly. Nothing is
//! stashed on the tree or the façade, so two failed calls never overwrite
//! each other's diagnostics.

use std::fmt;

use thiserror::Error;

use crate::value::Kind;

/// Where a type mismatch was detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A path inside an existing tree.
    Path(String),
    /// A position in source text, reported while parsing.
    Line {
        /// Source file name, if the text came from a named file.
        file: Option<String>,
        /// 1-based line number.
        line: u32,
    },
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) if path.is_empty() => write!(f, "'<root>'"),
            Self::Path(path) => write!(f, "'{path}'"),
            Self::Line { file, line } => write!(f, "{}:{line}", display_file(file)),
        }
    }
}

/// Errors produced by parsing, lookup and mutation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Malformed input. Parsing aborts entirely.
    #[error("syntax error in {}:{line}: {message}", display_file(file))]
    Syntax {
        /// Source file name, if any.
        file: Option<String>,
        /// 1-based line number.
        line: u32,
        /// Human readable description.
        message: String,
    },

    /// The kind of an existing node does not match the requested kind.
    #[error("type mismatch at {at}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Where the mismatch happened.
        at: Location,
        /// Kind the operation required.
        expected: Kind,
        /// Kind actually stored.
        found: Kind,
    },

    /// The path does not resolve to any node.
    #[error("setting '{path}' not found")]
    NotFound {
        /// The path as given by the caller.
        path: String,
    },

    /// Insertion collides with an existing sibling.
    #[error("duplicate setting name '{name}' in '{path}'")]
    DuplicateName {
        /// Path of the parent group.
        path: String,
        /// The colliding name.
        name: String,
    },

    /// The name is not a valid setting identifier.
    #[error("invalid setting name '{name}'")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// The value cannot be stored in the tree.
    #[error("invalid value for '{path}': {reason}")]
    InvalidValue {
        /// Path of the target setting.
        path: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// I/O failure reported by a source, sink or include resolver.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl ConfigError {
    /// Creates a syntax error.
    pub fn syntax(file: Option<&str>, line: u32, message: impl Into<String>) -> Self {
        Self::Syntax {
            file: file.map(str::to_owned),
            line,
            message: message.into(),
        }
    }

    /// Creates a not-found error for the given path.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Creates a type mismatch located at a tree path.
    pub fn mismatch_at_path(path: impl Into<String>, expected: Kind, found: Kind) -> Self {
        Self::TypeMismatch {
            at: Location::Path(path.into()),
            expected,
            found,
        }
    }

    /// Creates a duplicate name error.
    pub fn duplicate(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self::DuplicateName {
            path: path.into(),
            name: name.into(),
        }
    }

    /// Returns the source line attached to this error, if any.
    pub fn line(&self) -> Option<u32> {
        match self {
            Self::Syntax { line, .. } => Some(*line),
            Self::TypeMismatch {
                at: Location::Line { line, .. },
                ..
            } => Some(*line),
            _ => None,
        }
    }

    /// Returns the source file attached to this error, if any.
    pub fn file(&self) -> Option<&str> {
        match self {
            Self::Syntax { file, .. }
            | Self::TypeMismatch {
                at: Location::Line { file, .. },
                ..
            } => file.as_deref(),
            _ => None,
        }
    }
}

fn display_file(file: &Option<String>) -> &str {
    file.as_deref().unwrap_or("<string>")
}

/// Result type for engine operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
