//! Arena-backed configuration tree.
//!
//! Nodes live in one `Vec` owned by the [`Tree`] and refer to each other by
//! [`SettingId`]. A child's parent link is an id, never an owning pointer, so
//! it can only be used to look the parent up again.

use std::sync::Arc;

use tracing::trace;

use crate::error::{ConfigError, ConfigResult, Location};
use crate::path::{Path, is_valid_name};
use crate::setting::{SettingMut, SettingRef};
use crate::value::{Children, Kind, Value};

/// Handle to a setting inside one [`Tree`].
///
/// Ids are only meaningful for the tree that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SettingId(usize);

impl SettingId {
    /// Id of the root group of every tree.
    pub const ROOT: Self = Self(0);
}

/// Where a setting came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Origin {
    /// File name, absent for unnamed strings and synthesized settings.
    pub file: Option<Arc<str>>,
    /// 1-based line, `0` when created programmatically.
    pub line: u32,
}

impl Origin {
    /// Origin of settings created through the API.
    pub fn synthesized() -> Self {
        Self::default()
    }

    pub fn new(file: Option<Arc<str>>, line: u32) -> Self {
        Self { file, line }
    }

    fn location(&self) -> Location {
        Location::Line {
            file: self.file.as_deref().map(str::to_owned),
            line: self.line,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) name: Option<String>,
    pub(crate) value: Value,
    pub(crate) parent: Option<SettingId>,
    pub(crate) origin: Origin,
}

/// A whole configuration document: one unnamed root group and everything
/// below it.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Deepest nesting of groups, lists and arrays below the root.
    pub const MAX_DEPTH: usize = 1024;

    /// Creates a tree holding only an empty root group.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                name: None,
                value: Value::default_for(Kind::Group),
                parent: None,
                origin: Origin::synthesized(),
            }],
        }
    }

    /// Read handle to the root group.
    pub fn root(&self) -> SettingRef<'_> {
        SettingRef::new(self, SettingId::ROOT)
    }

    /// Write handle to the root group.
    pub fn root_mut(&mut self) -> SettingMut<'_> {
        SettingMut::new(self, SettingId::ROOT)
    }

    /// Read handle for `id`, if it belongs to this tree.
    pub fn get(&self, id: SettingId) -> Option<SettingRef<'_>> {
        self.node(id).map(|_| SettingRef::new(self, id))
    }

    /// Write handle for `id`, if it belongs to this tree.
    pub fn get_mut(&mut self, id: SettingId) -> Option<SettingMut<'_>> {
        self.node(id)?;
        Some(SettingMut::new(self, id))
    }

    /// Total number of settings, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the root group has no members.
    pub fn is_empty(&self) -> bool {
        self.root().is_empty()
    }

    /// Resolves `path` from the root to an id.
    pub fn resolve(&self, path: &str) -> ConfigResult<SettingId> {
        self.resolve_from(SettingId::ROOT, path)
    }

    /// Resolves `path` relative to `start`.
    pub fn resolve_from(&self, start: SettingId, path: &str) -> ConfigResult<SettingId> {
        Path::parse(path)?.resolve(self, start)
    }

    /// Write handle for the setting at `path`.
    pub fn lookup_mut(&mut self, path: &str) -> ConfigResult<SettingMut<'_>> {
        let id = self.resolve(path)?;
        Ok(SettingMut::new(self, id))
    }

    /// Inserts a new setting under `parent`.
    ///
    /// Group parents need a unique, valid `name`; list and array parents
    /// take unnamed elements, and arrays only accept scalars of the kind
    /// already present. When `origin` carries a line, type mismatches are
    /// reported at that line, otherwise at the parent's path.
    ///
    /// Aggregates must arrive empty; their members are inserted afterwards
    /// with the new id as parent. An aggregate nested deeper than
    /// [`Tree::MAX_DEPTH`] is rejected.
    pub fn insert(
        &mut self,
        parent: SettingId,
        name: Option<&str>,
        value: Value,
        origin: Origin,
    ) -> ConfigResult<SettingId> {
        let parent_node = self
            .node(parent)
            .ok_or_else(|| ConfigError::not_found(format!("#{}", parent.0)))?;
        let kind = value.kind();

        if value.children().is_some_and(|children| !children.is_empty()) {
            return Err(ConfigError::InvalidValue {
                path: self.path_of(parent),
                reason: format!("a new {kind} must be empty"),
            });
        }
        if kind.is_aggregate() && self.depth_of(parent) >= Self::MAX_DEPTH {
            return Err(ConfigError::InvalidValue {
                path: self.path_of(parent),
                reason: format!("nesting exceeds the maximum depth of {}", Self::MAX_DEPTH),
            });
        }

        let mismatch = |expected: Kind, found: Kind| ConfigError::TypeMismatch {
            at: if origin.line > 0 {
                origin.location()
            } else {
                Location::Path(self.path_of(parent))
            },
            expected,
            found,
        };

        match (&parent_node.value, name) {
            (Value::Group(_), Some(name)) => {
                if !is_valid_name(name) {
                    return Err(ConfigError::InvalidName {
                        name: name.to_string(),
                    });
                }
                if self.find_member(parent, name).is_some() {
                    return Err(ConfigError::duplicate(self.path_of(parent), name));
                }
            }
            (Value::Group(_), None) => {
                return Err(ConfigError::InvalidName {
                    name: String::new(),
                });
            }
            (Value::List(_), None) => {}
            (Value::Array(children), None) => {
                if !kind.is_scalar() {
                    return Err(mismatch(self.array_kind(children).unwrap_or(Kind::Int), kind));
                }
                match self.array_kind(children) {
                    Some(existing) if existing != kind => return Err(mismatch(existing, kind)),
                    _ => {}
                }
            }
            (Value::List(_) | Value::Array(_), Some(name)) => {
                return Err(ConfigError::InvalidName {
                    name: name.to_string(),
                });
            }
            (other, _) => return Err(mismatch(Kind::Group, other.kind())),
        }

        let id = SettingId(self.nodes.len());
        trace!(parent = parent.0, id = id.0, kind = %kind, "Inserting setting");
        self.nodes.push(Node {
            name: name.map(str::to_owned),
            value,
            parent: Some(parent),
            origin,
        });
        if let Some(children) = self.nodes[parent.0].value.children_mut() {
            children.0.push(id);
        }
        Ok(id)
    }

    /// Reconstructs the canonical path of `id` by walking parent links.
    ///
    /// Group members contribute their name, list and array elements their
    /// `[index]`. The root's path is empty.
    pub fn path_of(&self, id: SettingId) -> String {
        let mut segments = Vec::new();
        let mut current = id;
        while let Some(node) = self.node(current) {
            let Some(parent) = node.parent else { break };
            match &node.name {
                Some(name) => segments.push(name.clone()),
                None => {
                    let index = self
                        .value_of(parent)
                        .and_then(Value::children)
                        .and_then(|c| c.iter().position(|child| child == current))
                        .unwrap_or_default();
                    segments.push(format!("[{index}]"));
                }
            }
            current = parent;
        }
        segments.reverse();
        segments.join(".")
    }

    /// Number of parent links between `id` and the root.
    fn depth_of(&self, id: SettingId) -> usize {
        let mut depth = 0;
        let mut current = self.node(id).and_then(|node| node.parent);
        while let Some(parent) = current {
            depth += 1;
            current = self.node(parent).and_then(|node| node.parent);
        }
        depth
    }

    pub(crate) fn node(&self, id: SettingId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Node for an id handed out by this tree. Such ids are always in
    /// bounds because nodes are never removed.
    pub(crate) fn node_at(&self, id: SettingId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_at_mut(&mut self, id: SettingId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub(crate) fn value_of(&self, id: SettingId) -> Option<&Value> {
        self.node(id).map(|n| &n.value)
    }

    /// Finds the member called `name` of the group `group`.
    pub(crate) fn find_member(&self, group: SettingId, name: &str) -> Option<SettingId> {
        match self.value_of(group)? {
            Value::Group(children) => children
                .iter()
                .find(|child| self.node(*child).and_then(|n| n.name.as_deref()) == Some(name)),
            _ => None,
        }
    }

    fn array_kind(&self, children: &Children) -> Option<Kind> {
        children
            .get(0)
            .and_then(|first| self.value_of(first))
            .map(Value::kind)
    }

    /// Converts the tree to JSON: groups become objects, lists and arrays
    /// become arrays.
    pub fn to_json(&self) -> serde_json::Value {
        // A tree only holds finite floats and string keys, so this cannot fail.
        serde_json::to_value(self.root()).unwrap_or(serde_json::Value::Null)
    }
}

/// Structural equality: names, kinds, payloads and child order. Source
/// locations are ignored.
impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.root() == other.root()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setting::Lookup;

    fn group(tree: &mut Tree, parent: SettingId, name: &str) -> SettingId {
        tree.insert(parent, Some(name), Value::default_for(Kind::Group), Origin::synthesized())
            .unwrap()
    }

    #[test]
    fn test_new_tree_has_empty_root() {
        let tree = Tree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root().kind(), Kind::Group);
        assert!(tree.root().name().is_none());
        assert!(tree.root().parent().is_none());
    }

    #[test]
    fn test_populated_aggregate_rejected() {
        let mut tree = Tree::new();
        let a = group(&mut tree, SettingId::ROOT, "a");
        tree.insert(a, Some("b"), Value::Int(1), Origin::synthesized())
            .unwrap();

        let copy = tree.lookup("a").unwrap().value().clone();
        let err = tree
            .insert(SettingId::ROOT, Some("c"), copy, Origin::synthesized())
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let whole = tree.root().value().clone();
        let err = tree
            .insert(a, Some("cyc"), whole, Origin::synthesized())
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.lookup("a").unwrap().len(), 1);
        assert!(tree.resolve("c").is_err());
        assert!(tree.resolve("a.cyc").is_err());
    }

    #[test]
    fn test_nesting_depth_capped() {
        let mut tree = Tree::new();
        let mut parent = SettingId::ROOT;
        for _ in 0..Tree::MAX_DEPTH {
            parent = group(&mut tree, parent, "g");
        }
        let err = tree
            .insert(parent, Some("g"), Value::default_for(Kind::List), Origin::synthesized())
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        // Scalars still fit at the deepest level.
        assert!(tree.insert(parent, Some("leaf"), Value::Int(1), Origin::synthesized()).is_ok());
    }

    #[test]
    fn test_duplicate_member_rejected() {
        let mut tree = Tree::new();
        let server = group(&mut tree, SettingId::ROOT, "server");
        tree.insert(server, Some("port"), Value::Int(1), Origin::synthesized())
            .unwrap();
        let err = tree
            .insert(server, Some("port"), Value::Int(2), Origin::synthesized())
            .unwrap_err();
        assert_eq!(err, ConfigError::duplicate("server", "port"));
    }

    #[test]
    fn test_invalid_names_rejected() {
        let mut tree = Tree::new();
        for name in ["", "9lives", "a.b", "sp ace"] {
            let err = tree
                .insert(SettingId::ROOT, Some(name), Value::Int(1), Origin::synthesized())
                .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidName { .. }), "{name:?}");
        }
        let err = tree
            .insert(SettingId::ROOT, None, Value::Int(1), Origin::synthesized())
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidName { .. }));
    }

    #[test]
    fn test_array_homogeneity() {
        let mut tree = Tree::new();
        let array = tree
            .insert(SettingId::ROOT, Some("a"), Value::default_for(Kind::Array), Origin::synthesized())
            .unwrap();
        tree.insert(array, None, Value::Int(1), Origin::synthesized())
            .unwrap();
        let err = tree
            .insert(array, None, Value::from("x"), Origin::new(None, 4))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::TypeMismatch {
                at: Location::Line { file: None, line: 4 },
                expected: Kind::Int,
                found: Kind::String,
            }
        );

        let err = tree
            .insert(array, None, Value::default_for(Kind::List), Origin::synthesized())
            .unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch { found: Kind::List, .. }));
    }

    #[test]
    fn test_scalar_parent_rejected() {
        let mut tree = Tree::new();
        let port = tree
            .insert(SettingId::ROOT, Some("port"), Value::Int(1), Origin::synthesized())
            .unwrap();
        let err = tree
            .insert(port, Some("x"), Value::Int(1), Origin::synthesized())
            .unwrap_err();
        assert_eq!(err, ConfigError::mismatch_at_path("port", Kind::Group, Kind::Int));
    }

    #[test]
    fn test_list_elements_must_be_unnamed() {
        let mut tree = Tree::new();
        let list = tree
            .insert(SettingId::ROOT, Some("l"), Value::default_for(Kind::List), Origin::synthesized())
            .unwrap();
        assert!(tree
            .insert(list, Some("x"), Value::Int(1), Origin::synthesized())
            .is_err());
        assert!(tree.insert(list, None, Value::Bool(true), Origin::synthesized()).is_ok());
        assert!(tree.insert(list, None, Value::from("s"), Origin::synthesized()).is_ok());
    }

    #[test]
    fn test_path_reconstruction() {
        let mut tree = Tree::new();
        let server = group(&mut tree, SettingId::ROOT, "server");
        let listeners = tree
            .insert(server, Some("listeners"), Value::default_for(Kind::List), Origin::synthesized())
            .unwrap();
        tree.insert(listeners, None, Value::Int(0), Origin::synthesized())
            .unwrap();
        let second = tree
            .insert(listeners, None, Value::default_for(Kind::Group), Origin::synthesized())
            .unwrap();
        let port = tree
            .insert(second, Some("port"), Value::Int(80), Origin::synthesized())
            .unwrap();

        assert_eq!(tree.path_of(SettingId::ROOT), "");
        assert_eq!(tree.path_of(port), "server.listeners.[1].port");
        assert_eq!(tree.resolve("server.listeners.[1].port"), Ok(port));
    }

    #[test]
    fn test_resolve_misses() {
        let mut tree = Tree::new();
        let server = group(&mut tree, SettingId::ROOT, "server");
        tree.insert(server, Some("port"), Value::Int(1), Origin::synthesized())
            .unwrap();

        assert_eq!(
            tree.resolve("server.missing"),
            Err(ConfigError::not_found("server.missing"))
        );
        assert_eq!(
            tree.resolve("server.port.deeper"),
            Err(ConfigError::not_found("server.port.deeper"))
        );
        assert_eq!(tree.resolve("server.[0]"), Err(ConfigError::not_found("server.[0]")));
    }

    #[test]
    fn test_structural_equality_ignores_origin() {
        let mut a = Tree::new();
        a.insert(SettingId::ROOT, Some("x"), Value::Int(1), Origin::new(Some("a.cfg".into()), 3))
            .unwrap();
        let mut b = Tree::new();
        b.insert(SettingId::ROOT, Some("x"), Value::Int(1), Origin::synthesized())
            .unwrap();
        assert_eq!(a, b);

        b.lookup_mut("x").unwrap().set_int(2).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_to_json() {
        let mut tree = Tree::new();
        let server = group(&mut tree, SettingId::ROOT, "server");
        tree.insert(server, Some("port"), Value::Int(8080), Origin::synthesized())
            .unwrap();
        let ports = tree
            .insert(SettingId::ROOT, Some("ports"), Value::default_for(Kind::Array), Origin::synthesized())
            .unwrap();
        tree.insert(ports, None, Value::Int(1), Origin::synthesized())
            .unwrap();

        assert_eq!(
            tree.to_json(),
            serde_json::json!({ "server": { "port": 8080 }, "ports": [1] })
        );
    }
}
