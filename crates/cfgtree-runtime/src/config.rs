//! The configuration façade.
//!
//! [`Config`] owns one [`Tree`] plus everything needed to read and write it:
//! parse limits, output formatting, and the include directory and resolver.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cfgtree_core::{
    ConfigError, ConfigResult, IntoValue, Kind, Lookup, SettingMut, SettingRef, Tree,
};
use cfgtree_syntax::{
    IncludeResolver, ParseOptions, Source, WriteOptions, expand_includes, has_includes,
    parse_source, to_string_with,
};
use tracing::{debug, info, instrument};

use crate::io::{DocumentSink, DocumentSource, FileStore, FsIncludeResolver};
use crate::options::EngineOptions;

/// A configuration document.
///
/// Reads are all-or-nothing: a failed `read_*` call leaves the current tree
/// untouched.
///
/// ```rust
/// use cfgtree_core::{Kind, Lookup};
/// use cfgtree_runtime::Config;
///
/// let mut config = Config::parse("server = { port = 8080; };")?;
/// config.set("server.port", 9090_i64)?;
/// config.add_setting("server", "host", Kind::String)?.set_string("localhost")?;
///
/// assert_eq!(config.lookup_int("server.port")?, 9090);
/// assert_eq!(
///     config.write_string(),
///     "server = {\n  port = 9090;\n  host = \"localhost\";\n};\n"
/// );
/// # Ok::<(), cfgtree_core::ConfigError>(())
/// ```
#[derive(Clone, Default)]
pub struct Config {
    tree: Tree,
    parse_options: ParseOptions,
    write_options: WriteOptions,
    include_dir: Option<PathBuf>,
    resolver: Option<Arc<dyn IncludeResolver + Send + Sync>>,
}

impl Config {
    /// An empty document with default options and includes disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty document configured from engine options. Enabled includes
    /// are resolved from the filesystem.
    pub fn with_options(options: &EngineOptions) -> Self {
        let mut config = Self {
            parse_options: options.parse.clone(),
            write_options: options.write.clone(),
            include_dir: options.include.dir.clone(),
            ..Self::default()
        };
        if options.include.enabled {
            config.set_include_resolver(FsIncludeResolver);
        }
        config
    }

    /// Wraps an existing tree.
    pub fn from_tree(tree: Tree) -> Self {
        Self {
            tree,
            ..Self::default()
        }
    }

    /// Parses `text` into a new document.
    pub fn parse(text: &str) -> ConfigResult<Self> {
        let mut config = Self::new();
        config.read_string(text)?;
        Ok(config)
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn into_tree(self) -> Tree {
        self.tree
    }

    pub fn root(&self) -> SettingRef<'_> {
        self.tree.root()
    }

    pub fn root_mut(&mut self) -> SettingMut<'_> {
        self.tree.root_mut()
    }

    pub fn parse_options(&self) -> &ParseOptions {
        &self.parse_options
    }

    pub fn set_parse_options(&mut self, options: ParseOptions) {
        self.parse_options = options;
    }

    pub fn write_options(&self) -> &WriteOptions {
        &self.write_options
    }

    pub fn set_write_options(&mut self, options: WriteOptions) {
        self.write_options = options;
    }

    /// Directory `@include` names are resolved against.
    pub fn include_dir(&self) -> Option<&Path> {
        self.include_dir.as_deref()
    }

    pub fn set_include_dir(&mut self, dir: impl Into<PathBuf>) {
        self.include_dir = Some(dir.into());
    }

    pub fn clear_include_dir(&mut self) {
        self.include_dir = None;
    }

    /// Enables `@include` using `resolver`.
    pub fn set_include_resolver(&mut self, resolver: impl IncludeResolver + Send + Sync + 'static) {
        self.resolver = Some(Arc::new(resolver));
    }

    /// Disables `@include`; directives become syntax errors.
    pub fn clear_include_resolver(&mut self) {
        self.resolver = None;
    }

    /// Replaces the tree with the parsed `text`.
    pub fn read_string(&mut self, text: &str) -> ConfigResult<()> {
        self.load(Source::new(text))
    }

    /// Replaces the tree with the document provided by `source`.
    pub fn read_source(&mut self, source: &mut dyn DocumentSource) -> ConfigResult<()> {
        let text = source.read_document()?;
        let source = match source.name() {
            Some(name) => Source::named(text, name),
            None => Source::new(text),
        };
        self.load(source)
    }

    pub fn read_file(&mut self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let mut store = FileStore::new(path.as_ref());
        self.read_source(&mut store)
    }

    #[instrument(level = "debug", skip_all, fields(file = source.file().unwrap_or("<string>")))]
    fn load(&mut self, source: Source) -> ConfigResult<()> {
        let tree = match &self.resolver {
            Some(resolver) if has_includes(source.text()) => {
                let expanded = expand_includes(
                    &source,
                    resolver.as_ref(),
                    self.include_dir.as_deref(),
                    &self.parse_options,
                )?;
                parse_source(&expanded, &self.parse_options)?
            }
            _ => parse_source(&source, &self.parse_options)?,
        };
        debug!(settings = tree.len() - 1, "Replacing configuration tree");
        self.tree = tree;
        Ok(())
    }

    /// Serializes the tree in canonical form.
    pub fn write_string(&self) -> String {
        to_string_with(&self.tree, &self.write_options)
    }

    pub fn write_sink(&self, sink: &mut dyn DocumentSink) -> ConfigResult<()> {
        sink.write_document(&self.write_string())?;
        Ok(())
    }

    pub fn write_file(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let mut store = FileStore::new(path.as_ref());
        self.write_sink(&mut store)?;
        info!(path = %path.as_ref().display(), "Configuration written");
        Ok(())
    }

    /// Write handle for the setting at `path`.
    pub fn lookup_mut(&mut self, path: &str) -> ConfigResult<SettingMut<'_>> {
        self.tree.lookup_mut(path)
    }

    /// Replaces the scalar at `path`, which must already hold `T`'s kind.
    pub fn set<T: IntoValue>(&mut self, path: &str, value: T) -> ConfigResult<()> {
        self.lookup_mut(path)?.set(value)
    }

    /// Adds a member `name` of `kind` to the group at `parent_path`.
    ///
    /// The new setting holds the kind's default payload: zero, false, the
    /// empty string or an empty aggregate.
    pub fn add_setting(
        &mut self,
        parent_path: &str,
        name: &str,
        kind: Kind,
    ) -> ConfigResult<SettingMut<'_>> {
        let mut parent = self.lookup_mut(parent_path)?;
        let found = parent.kind();
        if found != Kind::Group {
            return Err(ConfigError::mismatch_at_path(parent.path(), Kind::Group, found));
        }
        debug!(parent = parent_path, name, kind = %kind, "Adding setting");
        let id = parent.add_child(name, kind)?.id();
        self.tree
            .get_mut(id)
            .ok_or_else(|| ConfigError::not_found(join_path(parent_path, name)))
    }

    /// Appends an unnamed element of `kind` to the list or array at
    /// `parent_path`.
    pub fn append(&mut self, parent_path: &str, kind: Kind) -> ConfigResult<SettingMut<'_>> {
        let mut parent = self.lookup_mut(parent_path)?;
        let found = parent.kind();
        if !matches!(found, Kind::List | Kind::Array) {
            return Err(ConfigError::mismatch_at_path(parent.path(), Kind::List, found));
        }
        debug!(parent = parent_path, kind = %kind, "Appending element");
        let id = parent.push(kind)?.id();
        self.tree
            .get_mut(id)
            .ok_or_else(|| ConfigError::not_found(parent_path))
    }

    /// JSON rendering of the tree.
    pub fn to_json(&self) -> serde_json::Value {
        self.tree.to_json()
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

impl Lookup for Config {
    fn lookup(&self, path: &str) -> ConfigResult<SettingRef<'_>> {
        self.tree.lookup(path)
    }
}

impl From<Tree> for Config {
    fn from(tree: Tree) -> Self {
        Self::from_tree(tree)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("settings", &(self.tree.len() - 1))
            .field("parse_options", &self.parse_options)
            .field("write_options", &self.write_options)
            .field("include_dir", &self.include_dir)
            .field("includes", &self.resolver.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;

    use super::*;
    use cfgtree_core::Location;
    use cfgtree_syntax::Assignment;
    use tempfile::TempDir;

    #[test]
    fn test_parse_and_lookup() {
        let config = Config::parse(r#"server = { port = 8080; host = "localhost"; };"#).unwrap();
        assert_eq!(config.lookup_int("server.port"), Ok(8080));
        assert_eq!(config.lookup_string("server.host"), Ok("localhost".into()));
        assert_eq!(
            config.lookup_int("server.missing"),
            Err(ConfigError::not_found("server.missing"))
        );
    }

    #[test]
    fn test_array_index_lookup() {
        let config = Config::parse("items = [1, 2, 3];").unwrap();
        assert_eq!(config.lookup_int("items.[1]"), Ok(2));
        assert_eq!(
            config.lookup_int("items.[5]"),
            Err(ConfigError::not_found("items.[5]"))
        );
    }

    #[test]
    fn test_read_string_is_all_or_nothing() {
        let mut config = Config::parse("a = 1;").unwrap();
        let err = config.read_string("a = 1; b = ;").unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { line: 1, .. }));
        assert_eq!(config.lookup_int("a"), Ok(1));

        let err = config.read_string("a = 2;\nb = [1, 2, \"x\"];").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::TypeMismatch {
                at: Location::Line { line: 2, .. },
                ..
            }
        ));
        assert_eq!(config.lookup_int("a"), Ok(1));
    }

    #[test]
    fn test_set_respects_kind() {
        let mut config = Config::parse("name = \"x\"; port = 1;").unwrap();
        assert_eq!(
            config.lookup_mut("name").unwrap().set_int(5),
            Err(ConfigError::mismatch_at_path("name", Kind::Int, Kind::String))
        );
        config.set("port", 2_i64).unwrap();
        assert_eq!(config.lookup_int("port"), Ok(2));
        assert!(matches!(
            config.set("port", f64::NAN),
            Err(ConfigError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_add_setting_errors() {
        let mut config = Config::parse("root = { }; list = (); leaf = 1;").unwrap();
        config.add_setting("root", "x", Kind::Int).unwrap();
        assert_eq!(
            config.add_setting("root", "x", Kind::Int).unwrap_err(),
            ConfigError::duplicate("root", "x")
        );
        assert_eq!(
            config.add_setting("nowhere", "x", Kind::Int).unwrap_err(),
            ConfigError::not_found("nowhere")
        );
        assert_eq!(
            config.add_setting("leaf", "x", Kind::Int).unwrap_err(),
            ConfigError::mismatch_at_path("leaf", Kind::Group, Kind::Int)
        );
        assert_eq!(
            config.add_setting("list", "x", Kind::Int).unwrap_err(),
            ConfigError::mismatch_at_path("list", Kind::Group, Kind::List)
        );
        assert!(matches!(
            config.add_setting("root", "1bad", Kind::Int),
            Err(ConfigError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_add_setting_at_document_root() {
        let mut config = Config::new();
        config
            .add_setting("", "version", Kind::Int)
            .unwrap()
            .set_int(3)
            .unwrap();
        assert_eq!(config.lookup_int("version"), Ok(3));
    }

    #[test]
    fn test_append() {
        let mut config = Config::parse("ports = [80]; items = (); g = {};").unwrap();
        config.append("ports", Kind::Int).unwrap().set_int(443).unwrap();
        assert_eq!(config.lookup_int("ports.[1]"), Ok(443));

        assert!(matches!(
            config.append("ports", Kind::String),
            Err(ConfigError::TypeMismatch { .. })
        ));
        assert!(matches!(
            config.append("ports", Kind::Group),
            Err(ConfigError::TypeMismatch { .. })
        ));

        let mut group = config.append("items", Kind::Group).unwrap();
        group.add_child("k", Kind::Bool).unwrap();
        assert_eq!(config.lookup_bool("items.[0].k"), Ok(false));

        assert_eq!(
            config.append("g", Kind::Int).unwrap_err(),
            ConfigError::mismatch_at_path("g", Kind::List, Kind::Group)
        );
    }

    #[test]
    fn test_built_tree_round_trips() {
        let mut config = Config::new();
        {
            let mut server = config.add_setting("", "server", Kind::Group).unwrap();
            server.add_child("port", Kind::Int).unwrap().set_int(8080).unwrap();
            server.add_child("ratio", Kind::Float).unwrap().set_float(0.5).unwrap();
        }
        config.add_setting("", "ports", Kind::Array).unwrap();
        config.append("ports", Kind::Int).unwrap().set_int(1).unwrap();
        config.append("ports", Kind::Int).unwrap().set_int(5_000_000_000).unwrap();
        config.add_setting("", "name", Kind::String).unwrap().set_string("a \"b\"").unwrap();

        let text = config.write_string();
        let reparsed = Config::parse(&text).unwrap();
        assert_eq!(reparsed.tree(), config.tree(), "text:\n{text}");
        assert_eq!(reparsed.lookup_int("ports.[1]"), Ok(5_000_000_000));
    }

    #[test]
    fn test_include_without_resolver_is_syntax_error() {
        let mut config = Config::new();
        let err = config.read_string("a = 1;\n@include \"x.cfg\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { line: 2, .. }));
    }

    #[test]
    fn test_include_with_memory_resolver() {
        let mut files = HashMap::new();
        files.insert("inner.cfg".to_string(), "inner = { x = 1; };\n".to_string());

        let mut config = Config::new();
        config.set_include_resolver(files);
        config.read_string("outer = 0;\n@include \"inner.cfg\"\n").unwrap();
        assert_eq!(config.lookup_int("inner.x"), Ok(1));
        assert_eq!(config.lookup("inner.x").unwrap().file(), Some("inner.cfg"));
    }

    #[test]
    fn test_commented_include_with_and_without_resolver() {
        let text = "a = 1;\n/*\n@include \"old.cfg\"\n*/\n";

        let plain = Config::parse(text).unwrap();
        let mut with_includes = Config::new();
        with_includes.set_include_resolver(HashMap::<String, String>::new());
        with_includes.read_string(text).unwrap();

        assert_eq!(with_includes.lookup_int("a"), Ok(1));
        assert_eq!(with_includes.tree(), plain.tree());
    }

    #[test]
    fn test_include_dir_and_files() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        fs::write(dir.join("net.cfg"), "port = 80;\n").unwrap();
        fs::write(dir.join("main.cfg"), "net = {\n@include \"net.cfg\"\n};\n").unwrap();

        let mut config = Config::with_options(&EngineOptions::default());
        config.set_include_dir(dir);
        assert_eq!(config.include_dir(), Some(dir));
        config.read_file(dir.join("main.cfg")).unwrap();
        assert_eq!(config.lookup_int("net.port"), Ok(80));

        config.set("net.port", 81_i64).unwrap();
        config.write_file(dir.join("out.cfg")).unwrap();
        assert_eq!(
            fs::read_to_string(dir.join("out.cfg")).unwrap(),
            "net = {\n  port = 81;\n};\n"
        );

        assert!(matches!(
            config.read_file(dir.join("absent.cfg")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_source_name_flows_into_errors() {
        struct Named(&'static str);
        impl DocumentSource for Named {
            fn read_document(&mut self) -> std::io::Result<String> {
                Ok(self.0.to_string())
            }
            fn name(&self) -> Option<&str> {
                Some("named.cfg")
            }
        }

        let mut config = Config::new();
        let err = config.read_source(&mut Named("a = ;")).unwrap_err();
        assert_eq!(err.file(), Some("named.cfg"));
    }

    #[test]
    fn test_write_options_and_sink() {
        let mut config = Config::parse("g = { x = 1; };").unwrap();
        config.set_write_options(WriteOptions {
            indent_width: 4,
            assignment: Assignment::Colon,
        });
        let mut out = String::new();
        config.write_sink(&mut out).unwrap();
        assert_eq!(out, "g: {\n    x: 1;\n};\n");
    }

    #[test]
    fn test_depth_limit_from_options() {
        let mut config = Config::new();
        config.set_parse_options(ParseOptions {
            max_depth: 2,
            ..ParseOptions::default()
        });
        assert!(config.read_string("a = { b = { }; };").is_ok());
        assert!(matches!(
            config.read_string("a = { b = { c = { }; }; };"),
            Err(ConfigError::Syntax { .. })
        ));
    }

    #[test]
    fn test_json_export() {
        let config = Config::parse("a = { b = [1, 2]; c = \"x\"; };").unwrap();
        assert_eq!(
            config.to_json(),
            serde_json::json!({ "a": { "b": [1, 2], "c": "x" } })
        );
    }
}
