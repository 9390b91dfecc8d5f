//! # cfgtree
//!
//! Hierarchical configuration files for Rust: parse a document into a typed
//! tree, query it by path, change it, and write it back in canonical form.
//!
//! ## Architecture
//!
//! ```text
//!   text ──▶ cfgtree-syntax ──▶ Tree ──▶ cfgtree-syntax ──▶ text
//!            (includes, parse)   │       (writer)
//!                                ▼
//!                          cfgtree-core
//!                   (values, paths, lookups)
//!
//!   cfgtree-runtime: Config façade, file I/O, options, logging
//! ```
//!
//! - **core**: value model, arena tree, path resolution, typed lookup
//! - **syntax**: text format, `@include` expansion, canonical writer
//! - **runtime**: the [`Config`] façade, file I/O, engine options, logging
//!
//! ## Quick Start
//!
//! ```rust
//! use cfgtree::prelude::*;
//!
//! let mut config = Config::parse(r#"
//!     server = { port = 8080; host = "localhost"; };
//!     items  = [1, 2, 3];
//! "#)?;
//!
//! assert_eq!(config.lookup_int("server.port")?, 8080);
//! assert_eq!(config.lookup_int("items.[1]")?, 2);
//!
//! config.add_setting("server", "tls", Kind::Bool)?.set_bool(true)?;
//! assert!(config.write_string().contains("tls = true;"));
//! # Ok::<(), cfgtree::ConfigError>(())
//! ```
//!
//! ## Features
//!
//! - `toml-options` *(default)*: read engine options from `cfgtree.toml`
//! - `yaml-options`: read engine options from `cfgtree.yaml`
//! - `json-log`: JSON log output

pub use cfgtree_core as core;
pub use cfgtree_runtime as runtime;
pub use cfgtree_syntax as syntax;

pub use cfgtree_core::{
    ConfigError, ConfigResult, Kind, Location, Lookup, SettingMut, SettingRef, Tree, Value,
};
pub use cfgtree_runtime::{Config, SharedConfig};

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use cfgtree::prelude::*;
/// ```
pub mod prelude {
    pub use cfgtree_core::{ConfigError, ConfigResult, Kind, Lookup, SettingMut, SettingRef, Tree};
    pub use cfgtree_runtime::options::OptionsLoader;
    pub use cfgtree_runtime::{Config, FileStore, SharedConfig};
    pub use cfgtree_syntax::{ParseOptions, WriteOptions};
}
