//! Recursive-descent parser building a [`Tree`] from tokens.
//!
//! ```text
//! document   := setting*
//! setting    := name ('=' | ':') value (';' | ',')?
//! value      := scalar | group | list | array
//! group      := '{' setting* '}'
//! list       := '(' (value (',' value)* ','?)? ')'
//! array      := '[' (scalar (',' scalar)* ','?)? ']'
//! scalar     := int | float | bool | string+
//! ```
//!
//! Parsing is all-or-nothing: the first error aborts and no tree is
//! returned.

use cfgtree_core::{ConfigError, ConfigResult, Kind, SettingId, Tree, Value};
use tracing::debug;

use crate::lexer::{Spanned, Token, tokenize};
use crate::options::ParseOptions;
use crate::source::Source;

/// Parses unnamed text with default options.
pub fn parse(text: &str) -> ConfigResult<Tree> {
    parse_source(&Source::new(text), &ParseOptions::default())
}

/// Parses `source` into a new tree.
pub fn parse_source(source: &Source, options: &ParseOptions) -> ConfigResult<Tree> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        source,
        options,
        tokens,
        position: 0,
        depth: 0,
        tree: Tree::new(),
    };
    parser.parse_document()?;
    debug!(
        file = source.file().unwrap_or("<string>"),
        settings = parser.tree.len() - 1,
        "Parsed configuration"
    );
    Ok(parser.tree)
}

struct Parser<'s> {
    source: &'s Source,
    options: &'s ParseOptions,
    tokens: Vec<Spanned>,
    position: usize,
    depth: usize,
    tree: Tree,
}

impl Parser<'_> {
    fn current(&self) -> &Spanned {
        // `tokenize` always ends the stream with `Eof`, and `advance` never
        // moves past it.
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn line(&self) -> u32 {
        self.current().line
    }

    fn advance(&mut self) {
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
    }

    fn error(&self, message: impl Into<String>) -> ConfigError {
        self.source.error(self.line(), message)
    }

    fn unexpected(&self, expected: &str) -> ConfigError {
        self.error(format!("expected {expected}, found {}", self.current().token))
    }

    fn parse_document(&mut self) -> ConfigResult<()> {
        while self.current().token != Token::Eof {
            self.parse_setting(SettingId::ROOT)?;
        }
        Ok(())
    }

    fn parse_setting(&mut self, group: SettingId) -> ConfigResult<()> {
        let Token::Name(name) = &self.current().token else {
            return Err(self.unexpected("setting name"));
        };
        let name = name.clone();
        let name_line = self.line();
        self.advance();

        if self.current().token != Token::Assign {
            return Err(self.error(format!(
                "expected '=' or ':' after '{name}', found {}",
                self.current().token
            )));
        }
        self.advance();

        self.parse_value(group, Some(&name))
            .map_err(|err| match err {
                ConfigError::DuplicateName { name, .. } => self
                    .source
                    .error(name_line, format!("duplicate setting name '{name}'")),
                other => other,
            })?;

        if matches!(self.current().token, Token::Semicolon | Token::Comma) {
            self.advance();
        }
        Ok(())
    }

    fn parse_value(&mut self, parent: SettingId, name: Option<&str>) -> ConfigResult<()> {
        match self.current().token {
            Token::LeftBrace => self.parse_group(parent, name),
            Token::LeftParen => self.parse_list(parent, name),
            Token::LeftBracket => self.parse_array(parent, name),
            _ => {
                let line = self.line();
                let value = self.parse_scalar()?;
                self.insert(parent, name, value, line)?;
                Ok(())
            }
        }
    }

    fn parse_scalar(&mut self) -> ConfigResult<Value> {
        let value = match &self.current().token {
            Token::Int(v) => Value::Int(*v),
            Token::Float(v) => Value::Float(*v),
            Token::Name(word) if word.eq_ignore_ascii_case("true") => Value::Bool(true),
            Token::Name(word) if word.eq_ignore_ascii_case("false") => Value::Bool(false),
            Token::Str(first) => {
                // Adjacent literals concatenate: "abc" "def" -> "abcdef".
                let mut text = first.clone();
                self.advance();
                while let Token::Str(next) = &self.current().token {
                    text.push_str(next);
                    self.advance();
                }
                return Ok(Value::String(text));
            }
            _ => return Err(self.unexpected("value")),
        };
        self.advance();
        Ok(value)
    }

    fn parse_group(&mut self, parent: SettingId, name: Option<&str>) -> ConfigResult<()> {
        let line = self.line();
        let group = self.open(parent, name, Kind::Group, line)?;
        while self.current().token != Token::RightBrace {
            if self.current().token == Token::Eof {
                return Err(self.unexpected("'}'"));
            }
            self.parse_setting(group)?;
        }
        self.close();
        Ok(())
    }

    fn parse_list(&mut self, parent: SettingId, name: Option<&str>) -> ConfigResult<()> {
        let line = self.line();
        let list = self.open(parent, name, Kind::List, line)?;
        self.parse_elements(Token::RightParen, "')'", |parser| {
            parser.parse_value(list, None)
        })
    }

    fn parse_array(&mut self, parent: SettingId, name: Option<&str>) -> ConfigResult<()> {
        let line = self.line();
        let array = self.open(parent, name, Kind::Array, line)?;
        self.parse_elements(Token::RightBracket, "']'", |parser| {
            if matches!(
                parser.current().token,
                Token::LeftBrace | Token::LeftParen | Token::LeftBracket
            ) {
                return Err(parser.error("arrays may only contain scalar values"));
            }
            let line = parser.line();
            let value = parser.parse_scalar()?;
            parser.insert(array, None, value, line)?;
            Ok(())
        })
    }

    /// Parses comma separated elements up to `close`, allowing a trailing
    /// comma, then consumes `close` and leaves the nesting level.
    fn parse_elements(
        &mut self,
        close: Token,
        close_text: &str,
        mut element: impl FnMut(&mut Self) -> ConfigResult<()>,
    ) -> ConfigResult<()> {
        while self.current().token != close {
            element(self)?;
            if self.current().token == Token::Comma {
                self.advance();
            } else if self.current().token != close {
                return Err(self.unexpected(&format!("',' or {close_text}")));
            }
        }
        self.close();
        Ok(())
    }

    /// Inserts an aggregate, enters it and consumes its opening token.
    fn open(
        &mut self,
        parent: SettingId,
        name: Option<&str>,
        kind: Kind,
        line: u32,
    ) -> ConfigResult<SettingId> {
        if self.depth >= self.options.max_depth {
            return Err(self.error(format!(
                "nesting exceeds the maximum depth of {}",
                self.options.max_depth
            )));
        }
        let id = self.insert(parent, name, Value::default_for(kind), line)?;
        self.depth += 1;
        self.advance();
        Ok(id)
    }

    /// Consumes a closing token and leaves the current nesting level.
    fn close(&mut self) {
        self.depth -= 1;
        self.advance();
    }

    fn insert(
        &mut self,
        parent: SettingId,
        name: Option<&str>,
        value: Value,
        line: u32,
    ) -> ConfigResult<SettingId> {
        self.tree
            .insert(parent, name, value, self.source.origin(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgtree_core::{Location, Lookup};

    #[test]
    fn test_server_scenario() {
        let tree = parse("server = { port = 8080; host = \"localhost\"; };").unwrap();
        assert_eq!(tree.lookup_int("server.port"), Ok(8080));
        assert_eq!(tree.lookup_string("server.host"), Ok("localhost".to_string()));
        assert_eq!(
            tree.lookup_int("server.missing"),
            Err(ConfigError::not_found("server.missing"))
        );
    }

    #[test]
    fn test_array_index_scenario() {
        let tree = parse("items = [1, 2, 3];").unwrap();
        assert_eq!(tree.lookup_int("items.[1]"), Ok(2));
        assert_eq!(tree.lookup_int("items.[5]"), Err(ConfigError::not_found("items.[5]")));
    }

    #[test]
    fn test_mixed_array_reports_offending_line() {
        let err = parse("a = 1;\nitems = [1,\n 2,\n \"x\"];").unwrap_err();
        assert_eq!(
            err,
            ConfigError::TypeMismatch {
                at: Location::Line { file: None, line: 4 },
                expected: Kind::Int,
                found: Kind::String,
            }
        );
    }

    #[test]
    fn test_nested_aggregates() {
        let text = r#"
            # application settings
            app: {
                name = "demo" "-app";
                debug = TRUE;
                ratio = 0.5;
                listeners = (
                    { port = 80; tls = false; },
                    { port = 443; tls = true; },
                    "fallback",
                    [ 1.5, 2.5, ],
                );
            }
        "#;
        let tree = parse(text).unwrap();
        assert_eq!(tree.lookup_string("app.name"), Ok("demo-app".to_string()));
        assert_eq!(tree.lookup_bool("app.debug"), Ok(true));
        assert_eq!(tree.lookup_float("app.ratio"), Ok(0.5));
        assert_eq!(tree.lookup_int("app.listeners.[1].port"), Ok(443));
        assert_eq!(tree.lookup_bool("app.listeners[0].tls"), Ok(false));
        assert_eq!(tree.lookup_string("app.listeners.[2]"), Ok("fallback".to_string()));
        assert_eq!(tree.lookup_float("app.listeners.[3].[1]"), Ok(2.5));

        let listeners = tree.lookup("app.listeners").unwrap();
        assert_eq!(listeners.kind(), Kind::List);
        assert_eq!(listeners.len(), 4);
        assert_eq!(listeners.line(), 7);
    }

    #[test]
    fn test_optional_terminators() {
        let tree = parse("a = 1\nb = 2, c = { d = 3 }").unwrap();
        assert_eq!(tree.lookup_int("a"), Ok(1));
        assert_eq!(tree.lookup_int("b"), Ok(2));
        assert_eq!(tree.lookup_int("c.d"), Ok(3));
    }

    #[test]
    fn test_empty_inputs() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("  # only a comment\n").unwrap().is_empty());
        let tree = parse("g = {}; l = (); a = [];").unwrap();
        assert!(tree.lookup("g").unwrap().is_empty());
        assert_eq!(tree.lookup("l").unwrap().kind(), Kind::List);
        assert_eq!(tree.lookup("a").unwrap().kind(), Kind::Array);
    }

    #[test]
    fn test_syntax_errors_carry_lines() {
        let cases = [
            ("a = ;", 1),
            ("a = 1;\nb 2;", 2),
            ("a = {\n b = 1;\n", 3),
            ("a = (1 2);", 1),
            ("a = [1,\n{ b = 1; }];", 2),
            ("= 5;", 1),
            ("a = 1;\nb = 2;\n}", 3),
            ("a = yes;", 1),
        ];
        for (text, line) in cases {
            let err = parse(text).unwrap_err();
            assert!(
                matches!(err, ConfigError::Syntax { line: l, .. } if l == line),
                "{text:?} -> {err:?}"
            );
        }
    }

    #[test]
    fn test_duplicate_name_is_syntax_error() {
        let err = parse("a = 1;\nb = 2;\na = 3;").unwrap_err();
        assert_eq!(err, ConfigError::syntax(None, 3, "duplicate setting name 'a'"));
    }

    #[test]
    fn test_same_name_in_different_groups() {
        let tree = parse("a = { x = 1; }; b = { x = 2; };").unwrap();
        assert_eq!(tree.lookup_int("b.x"), Ok(2));
    }

    #[test]
    fn test_depth_guard() {
        let options = ParseOptions {
            max_depth: 3,
            ..ParseOptions::default()
        };
        let ok = Source::new("a = { b = { c = (1); }; };");
        assert!(parse_source(&ok, &options).is_ok());

        let deep = Source::new("a = { b = { c = { d = 1; }; }; };");
        let err = parse_source(&deep, &options).unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { .. }));
    }

    #[test]
    fn test_default_depth_guard_stops_runaway_nesting() {
        let text = format!("a = {}{};", "(".repeat(10_000), ")".repeat(10_000));
        assert!(matches!(parse(&text), Err(ConfigError::Syntax { .. })));
    }

    #[test]
    fn test_named_source_sets_origins() {
        let source = Source::named("a = 1;\n\nb = \"x\";", "app.cfg");
        let tree = parse_source(&source, &ParseOptions::default()).unwrap();
        let b = tree.lookup("b").unwrap();
        assert_eq!(b.line(), 3);
        assert_eq!(b.file(), Some("app.cfg"));
    }

    #[test]
    fn test_large_ints_and_suffixes() {
        let tree = parse("big = 5000000000; forced = 5000000000L; hex = 0xff;").unwrap();
        assert_eq!(tree.lookup_float("big"), Ok(5_000_000_000.0));
        assert_eq!(tree.lookup_int("forced"), Ok(5_000_000_000));
        assert_eq!(tree.lookup_int("hex"), Ok(255));
    }
}
