//! # cfgtree core
//!
//! The data side of the configuration engine: the value model, the setting
//! tree and path resolution. Text handling lives in `cfgtree-syntax`.
//!
//! ## Model
//!
//! ```text
//! Tree
//! └── root (Group, unnamed)
//!     ├── server (Group)
//!     │   ├── port (Int)
//!     │   └── listeners (List)
//!     │       └── [0] (Group)
//!     └── ports (Array of Int)
//! ```
//!
//! - **[`Value`]**: tagged payload, one of the seven [`Kind`]s
//! - **[`Tree`]**: arena owning every setting; children are referenced by
//!   [`SettingId`], parents by a non-owning id
//! - **[`SettingRef`] / [`SettingMut`]**: borrowed read and write handles
//! - **[`Lookup`]**: typed, path-based reads shared by trees, settings and
//!   the runtime façade
//!
//! ## Example
//!
//! ```rust
//! use cfgtree_core::{Kind, Lookup, Tree};
//!
//! let mut tree = Tree::new();
//! let mut root = tree.root_mut();
//! let mut server = root.add_child("server", Kind::Group)?;
//! server.add_child("port", Kind::Int)?.set_int(8080)?;
//!
//! assert_eq!(tree.lookup_int("server.port")?, 8080);
//! # Ok::<(), cfgtree_core::ConfigError>(())
//! ```

pub mod error;
pub mod path;
pub mod setting;
pub mod tree;
pub mod value;

pub use error::{ConfigError, ConfigResult, Location};
pub use path::{Path, Segment, is_valid_name};
pub use setting::{Lookup, SettingMut, SettingRef};
pub use tree::{Origin, SettingId, Tree};
pub use value::{Children, FromValue, IntoValue, Kind, UnknownKind, Value};
