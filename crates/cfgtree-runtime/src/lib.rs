//! cfgtree runtime: the configuration façade and everything around it.
//!
//! This crate provides:
//! - [`Config`]: parse, query, modify and write one document
//! - File and include collaborators ([`io`])
//! - [`SharedConfig`] for multi-threaded hosts
//! - Engine options loaded with figment ([`options`])
//! - Logging setup ([`logging`])
//!
//! ```rust,ignore
//! use cfgtree_core::Lookup;
//! use cfgtree_runtime::{Config, logging, options::OptionsLoader};
//!
//! let options = OptionsLoader::new().load()?;
//! logging::init_from_config(&options.logging);
//!
//! let mut config = Config::with_options(&options);
//! config.read_file("app.cfg")?;
//! let port = config.lookup_int("server.port")?;
//! ```

pub mod config;
pub mod io;
pub mod logging;
pub mod options;
pub mod shared;

pub use config::Config;
pub use io::{DocumentSink, DocumentSource, FileStore, FsIncludeResolver};
pub use logging::{LoggingBuilder, SpanEvents};
pub use options::{EngineOptions, OptionsError, OptionsLoader, OptionsResult, validate_options};
pub use shared::SharedConfig;

pub use tracing;
pub use tracing_subscriber;

/// Logging macros for hosts that do not depend on `tracing` directly.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
