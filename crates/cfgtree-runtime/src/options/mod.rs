//! Options of the engine itself.
//!
//! [`EngineOptions`] gathers parse limits, output formatting, include
//! handling and logging. [`OptionsLoader`] layers defaults, option files and
//! `CFGTREE_*` environment variables with figment, then checks the result
//! with [`validate_options`].

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{OptionsError, OptionsResult};
pub use loader::{OptionsLoader, Profile};
pub use schema::{
    EngineOptions, IncludeOptions, LogFormat, LogLevel, LogOutput, LoggingConfig, SpanEventConfig,
};
pub use validation::validate_options;
