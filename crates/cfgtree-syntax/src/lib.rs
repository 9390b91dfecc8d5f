//! # cfgtree syntax
//!
//! Reading and writing the configuration text format.
//!
//! ```text
//! # comments: '#', '//' and '/* ... */'
//! name    = "demo";
//! version = 3;
//! server  = {
//!   port      = 8080;
//!   ratio     = 0.75;
//!   big       = 9000000000L;
//!   listeners = ( { port = 80; }, { port = 443; } );
//!   ports     = [ 80, 443 ];
//! };
//! ```
//!
//! - [`parse`] / [`parse_source`]: text to [`Tree`](cfgtree_core::Tree)
//! - [`to_string`] / [`write_to`]: tree to canonical text
//! - [`expand_includes`]: splice `@include "file"` lines ahead of parsing
//!
//! ```rust
//! use cfgtree_core::Lookup;
//!
//! let tree = cfgtree_syntax::parse("server = { port = 8080; };")?;
//! assert_eq!(tree.lookup_int("server.port")?, 8080);
//! assert_eq!(
//!     cfgtree_syntax::to_string(&tree),
//!     "server = {\n  port = 8080;\n};\n"
//! );
//! # Ok::<(), cfgtree_core::ConfigError>(())
//! ```

pub mod include;
pub mod lexer;
pub mod options;
pub mod parser;
pub mod source;
pub mod writer;

pub use include::{IncludeResolver, expand_includes, has_includes};
pub use lexer::{Spanned, Token, tokenize};
pub use options::{Assignment, ParseOptions, WriteOptions};
pub use parser::{parse, parse_source};
pub use source::Source;
pub use writer::{format_float, format_int, quote_into, to_string, to_string_with, write_to};
