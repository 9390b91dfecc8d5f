//! Path grammar and resolution.
//!
//! A path is a sequence of segments separated by `.`. A segment is either a
//! group member name or a bracketed, 0-based element index:
//!
//! ```text
//! server.listeners.[0].port
//! server.listeners[0].port
//! ```
//!
//! The empty path names the setting the lookup starts from.

use std::fmt;

use crate::error::{ConfigError, ConfigResult};
use crate::tree::{SettingId, Tree};
use crate::value::Value;

/// One step of a [`Path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Member of a group.
    Name(&'a str),
    /// Element of a list or array.
    Index(usize),
}

impl fmt::Display for Segment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// A parsed path borrowing from its source string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path<'a> {
    raw: &'a str,
    segments: Vec<Segment<'a>>,
}

impl<'a> Path<'a> {
    /// Parses `raw`. A malformed path resolves to nothing, so the error is
    /// [`ConfigError::NotFound`] carrying the original text.
    pub fn parse(raw: &'a str) -> ConfigResult<Self> {
        let mut segments = Vec::new();
        if raw.is_empty() {
            return Ok(Self { raw, segments });
        }

        for part in raw.split('.') {
            if part.is_empty() {
                return Err(ConfigError::not_found(raw));
            }
            // `name[1][2]` and `[1]` both split into an optional name and a
            // run of bracketed indices.
            let (name, mut rest) = match part.find('[') {
                Some(pos) => part.split_at(pos),
                None => (part, ""),
            };
            if !name.is_empty() {
                if !is_valid_name(name) {
                    return Err(ConfigError::not_found(raw));
                }
                segments.push(Segment::Name(name));
            }
            while !rest.is_empty() {
                let close = rest.find(']').ok_or_else(|| ConfigError::not_found(raw))?;
                let digits = &rest[1..close];
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(ConfigError::not_found(raw));
                }
                let index = digits.parse().map_err(|_| ConfigError::not_found(raw))?;
                segments.push(Segment::Index(index));
                rest = &rest[close + 1..];
                if !rest.is_empty() && !rest.starts_with('[') {
                    return Err(ConfigError::not_found(raw));
                }
            }
        }

        Ok(Self { raw, segments })
    }

    /// The text this path was parsed from.
    pub fn as_str(&self) -> &'a str {
        self.raw
    }

    pub fn segments(&self) -> &[Segment<'a>] {
        &self.segments
    }

    /// Walks the path from `start`, returning the id of the final setting.
    pub fn resolve(&self, tree: &Tree, start: SettingId) -> ConfigResult<SettingId> {
        let mut current = start;
        for segment in &self.segments {
            let value = tree
                .value_of(current)
                .ok_or_else(|| ConfigError::not_found(self.raw))?;
            current = match (segment, value) {
                (Segment::Name(name), Value::Group(_)) => tree.find_member(current, name),
                (Segment::Index(index), Value::List(children) | Value::Array(children)) => {
                    children.get(*index)
                }
                _ => None,
            }
            .ok_or_else(|| ConfigError::not_found(self.raw))?;
        }
        Ok(current)
    }
}

impl fmt::Display for Path<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw)
    }
}

/// Returns `true` if `name` is a valid setting identifier:
/// `[A-Za-z*][-A-Za-z0-9_*]*`.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_name_start(first) => chars.all(is_name_char),
        _ => false,
    }
}

/// First character of an identifier.
pub fn is_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '*'
}

/// Any following character of an identifier.
pub fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '*')
}
