//! Canonical text rendering of a [`Tree`].
//!
//! Output re-parses to an equal tree: floats always carry a point or an
//! exponent, and ints outside the 32-bit range carry the `L` suffix.

use std::io;

use cfgtree_core::{SettingRef, Tree, Value};

use crate::options::WriteOptions;

/// Renders `tree` with default options.
pub fn to_string(tree: &Tree) -> String {
    to_string_with(tree, &WriteOptions::default())
}

/// Renders `tree` with `options`.
pub fn to_string_with(tree: &Tree, options: &WriteOptions) -> String {
    let mut writer = Writer {
        out: String::new(),
        options,
    };
    writer.members(tree.root(), 0);
    writer.out
}

/// Renders `tree` into an `io::Write` sink.
pub fn write_to<W: io::Write>(tree: &Tree, sink: &mut W, options: &WriteOptions) -> io::Result<()> {
    sink.write_all(to_string_with(tree, options).as_bytes())
}

struct Writer<'o> {
    out: String,
    options: &'o WriteOptions,
}

impl Writer<'_> {
    fn indent(&mut self, depth: usize) {
        self.out
            .extend(std::iter::repeat_n(' ', depth * self.options.indent_width));
    }

    fn members(&mut self, group: SettingRef<'_>, depth: usize) {
        for member in group.children() {
            self.indent(depth);
            self.out.push_str(member.name().unwrap_or_default());
            self.out.push_str(self.options.assignment.as_str());
            self.value(member, depth);
            self.out.push_str(";\n");
        }
    }

    fn value(&mut self, setting: SettingRef<'_>, depth: usize) {
        match setting.value() {
            Value::Int(v) => self.out.push_str(&format_int(*v)),
            Value::Float(v) => self.out.push_str(&format_float(*v)),
            Value::Bool(v) => self.out.push_str(if *v { "true" } else { "false" }),
            Value::String(v) => quote_into(&mut self.out, v),
            Value::Group(children) if children.is_empty() => self.out.push_str("{ }"),
            Value::Group(_) => {
                self.out.push_str("{\n");
                self.members(setting, depth + 1);
                self.indent(depth);
                self.out.push('}');
            }
            Value::List(_) => self.sequence(setting, depth, '(', ')'),
            Value::Array(_) => self.sequence(setting, depth, '[', ']'),
        }
    }

    /// Lists holding non-empty groups or lists go one element per line;
    /// everything else stays on one line.
    fn sequence(&mut self, setting: SettingRef<'_>, depth: usize, open: char, close: char) {
        if setting.is_empty() {
            self.out.push(open);
            self.out.push(' ');
            self.out.push(close);
            return;
        }

        let multiline = setting
            .children()
            .any(|c| matches!(c.value(), Value::Group(_) | Value::List(_)) && !c.is_empty());

        self.out.push(open);
        if multiline {
            self.out.push('\n');
            let count = setting.len();
            for (i, element) in setting.children().enumerate() {
                self.indent(depth + 1);
                self.value(element, depth + 1);
                if i + 1 < count {
                    self.out.push(',');
                }
                self.out.push('\n');
            }
            self.indent(depth);
        } else {
            self.out.push(' ');
            for (i, element) in setting.children().enumerate() {
                if i > 0 {
                    self.out.push_str(", ");
                }
                self.value(element, depth);
            }
            self.out.push(' ');
        }
        self.out.push(close);
    }
}

/// Ints that do not fit in 32 bits need the `L` suffix to stay ints.
pub fn format_int(value: i64) -> String {
    if i32::try_from(value).is_ok() {
        value.to_string()
    } else {
        format!("{value}L")
    }
}

/// Shortest text that parses back to the same float and is never mistaken
/// for an int.
pub fn format_float(value: f64) -> String {
    // Debug output always carries a '.' or an exponent for finite values.
    format!("{value:?}")
}

/// Writes `value` as a double-quoted, escaped string literal.
pub fn quote_into(out: &mut String, value: &str) {
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{c}' => out.push_str("\\f"),
            c if c.is_ascii_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}
