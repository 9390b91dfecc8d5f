//! Borrowed handles onto settings of a [`Tree`].
//!
//! [`SettingRef`] is a cheap `Copy` read handle; [`SettingMut`] holds the
//! tree mutably and is the only way to change a payload or add children.

use std::fmt;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::error::{ConfigError, ConfigResult};
use crate::tree::{Node, Origin, SettingId, Tree};
use crate::value::{FromValue, IntoValue, Kind, Value};

/// Typed lookup by path.
///
/// Implemented by the tree (paths start at the root), by individual
/// settings (paths are relative), and by the runtime façade.
pub trait Lookup {
    /// Resolves `path` to a setting.
    fn lookup(&self, path: &str) -> ConfigResult<SettingRef<'_>>;

    /// Resolves `path` and reads it as `T`, failing with
    /// [`ConfigError::TypeMismatch`] if the stored kind is not `T::KIND`.
    fn lookup_as<T: FromValue>(&self, path: &str) -> ConfigResult<T> {
        self.lookup(path)?.get()
    }

    fn lookup_int(&self, path: &str) -> ConfigResult<i64> {
        self.lookup_as(path)
    }

    fn lookup_float(&self, path: &str) -> ConfigResult<f64> {
        self.lookup_as(path)
    }

    fn lookup_bool(&self, path: &str) -> ConfigResult<bool> {
        self.lookup_as(path)
    }

    fn lookup_string(&self, path: &str) -> ConfigResult<String> {
        self.lookup_as(path)
    }
}

impl Lookup for Tree {
    fn lookup(&self, path: &str) -> ConfigResult<SettingRef<'_>> {
        let id = self.resolve(path)?;
        Ok(SettingRef::new(self, id))
    }
}

/// Read handle onto one setting.
#[derive(Clone, Copy)]
pub struct SettingRef<'a> {
    tree: &'a Tree,
    id: SettingId,
}

impl<'a> SettingRef<'a> {
    pub(crate) fn new(tree: &'a Tree, id: SettingId) -> Self {
        Self { tree, id }
    }

    fn node(&self) -> &'a Node {
        self.tree.node_at(self.id)
    }

    pub fn id(&self) -> SettingId {
        self.id
    }

    /// The tree this setting belongs to.
    pub fn tree(&self) -> &'a Tree {
        self.tree
    }

    /// Member name; `None` for the root and for list/array elements.
    pub fn name(&self) -> Option<&'a str> {
        self.node().name.as_deref()
    }

    pub fn kind(&self) -> Kind {
        self.node().value.kind()
    }

    pub fn value(&self) -> &'a Value {
        &self.node().value
    }

    pub fn is_root(&self) -> bool {
        self.node().parent.is_none()
    }

    pub fn parent(&self) -> Option<SettingRef<'a>> {
        self.node().parent.map(|id| Self::new(self.tree, id))
    }

    /// Children in document order. Empty for scalars.
    pub fn children(&self) -> impl Iterator<Item = SettingRef<'a>> + use<'a> {
        let tree = self.tree;
        self.node()
            .value
            .children()
            .into_iter()
            .flat_map(|c| c.iter())
            .map(move |id| SettingRef::new(tree, id))
    }

    /// Group member called `name`.
    pub fn child(&self, name: &str) -> Option<SettingRef<'a>> {
        self.tree
            .find_member(self.id, name)
            .map(|id| Self::new(self.tree, id))
    }

    /// Element `index` of a list or array.
    pub fn child_at(&self, index: usize) -> Option<SettingRef<'a>> {
        match &self.node().value {
            Value::List(children) | Value::Array(children) => {
                children.get(index).map(|id| Self::new(self.tree, id))
            }
            _ => None,
        }
    }

    /// Number of children, `0` for scalars.
    pub fn len(&self) -> usize {
        self.node().value.children().map_or(0, |c| c.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position of this setting within its parent.
    pub fn index(&self) -> Option<usize> {
        let parent = self.parent()?;
        parent
            .value()
            .children()?
            .iter()
            .position(|id| id == self.id)
    }

    /// Source line, `0` for settings created programmatically.
    pub fn line(&self) -> u32 {
        self.node().origin.line
    }

    /// Source file, if the setting was parsed from a named file.
    pub fn file(&self) -> Option<&'a str> {
        self.node().origin.file.as_deref()
    }

    pub fn origin(&self) -> &'a Origin {
        &self.node().origin
    }

    /// Canonical path from the root, e.g. `server.listeners.[0].port`.
    pub fn path(&self) -> String {
        self.tree.path_of(self.id)
    }

    /// Reads the payload as `T`, without any numeric coercion.
    pub fn get<T: FromValue>(&self) -> ConfigResult<T> {
        T::from_value(self.value())
            .ok_or_else(|| ConfigError::mismatch_at_path(self.path(), T::KIND, self.kind()))
    }
}

impl Lookup for SettingRef<'_> {
    fn lookup(&self, path: &str) -> ConfigResult<SettingRef<'_>> {
        let id = self.tree.resolve_from(self.id, path)?;
        Ok(SettingRef::new(self.tree, id))
    }
}

impl fmt::Debug for SettingRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingRef")
            .field("path", &self.path())
            .field("kind", &self.kind())
            .field("line", &self.line())
            .finish()
    }
}

/// Structural equality of two subtrees, ignoring source locations.
impl PartialEq for SettingRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        if self.name() != other.name() || self.kind() != other.kind() {
            return false;
        }
        match (self.value(), other.value()) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            _ => self.len() == other.len() && self.children().zip(other.children()).all(|(a, b)| a == b),
        }
    }
}

impl Serialize for SettingRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.value() {
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::String(v) => serializer.serialize_str(v),
            Value::Group(children) => {
                let mut map = serializer.serialize_map(Some(children.len()))?;
                for child in self.children() {
                    map.serialize_entry(child.name().unwrap_or_default(), &child)?;
                }
                map.end()
            }
            Value::List(children) | Value::Array(children) => {
                let mut seq = serializer.serialize_seq(Some(children.len()))?;
                for child in self.children() {
                    seq.serialize_element(&child)?;
                }
                seq.end()
            }
        }
    }
}

/// Write handle onto one setting.
pub struct SettingMut<'a> {
    tree: &'a mut Tree,
    id: SettingId,
}

impl<'a> SettingMut<'a> {
    pub(crate) fn new(tree: &'a mut Tree, id: SettingId) -> Self {
        Self { tree, id }
    }

    pub fn id(&self) -> SettingId {
        self.id
    }

    /// Read view of the same setting.
    pub fn view(&self) -> SettingRef<'_> {
        SettingRef::new(self.tree, self.id)
    }

    /// Gives up write access, keeping a read handle for the full borrow.
    pub fn into_ref(self) -> SettingRef<'a> {
        SettingRef::new(self.tree, self.id)
    }

    pub fn kind(&self) -> Kind {
        self.view().kind()
    }

    pub fn path(&self) -> String {
        self.view().path()
    }

    /// Replaces the payload. The setting must already have kind `T::KIND`.
    pub fn set<T: IntoValue>(&mut self, value: T) -> ConfigResult<()> {
        let found = self.kind();
        if found != T::KIND {
            return Err(ConfigError::mismatch_at_path(self.path(), T::KIND, found));
        }
        let value = value.into_value();
        self.ensure_finite(&value)?;
        self.tree.node_at_mut(self.id).value = value;
        Ok(())
    }

    pub fn set_int(&mut self, value: i64) -> ConfigResult<()> {
        self.set(value)
    }

    pub fn set_float(&mut self, value: f64) -> ConfigResult<()> {
        self.set(value)
    }

    pub fn set_bool(&mut self, value: bool) -> ConfigResult<()> {
        self.set(value)
    }

    pub fn set_string(&mut self, value: impl Into<String>) -> ConfigResult<()> {
        self.set(value.into())
    }

    /// Adds a member called `name` with the default payload of `kind`.
    /// This setting must be a group.
    pub fn add_child(&mut self, name: &str, kind: Kind) -> ConfigResult<SettingMut<'_>> {
        let id = self.tree.insert(
            self.id,
            Some(name),
            Value::default_for(kind),
            Origin::synthesized(),
        )?;
        Ok(SettingMut::new(self.tree, id))
    }

    /// Appends an element with the default payload of `kind`. This setting
    /// must be a list, or an array whose elements already have `kind`.
    pub fn push(&mut self, kind: Kind) -> ConfigResult<SettingMut<'_>> {
        let id = self
            .tree
            .insert(self.id, None, Value::default_for(kind), Origin::synthesized())?;
        Ok(SettingMut::new(self.tree, id))
    }

    /// Appends a scalar element holding `value`.
    pub fn push_value<T: IntoValue>(&mut self, value: T) -> ConfigResult<SettingMut<'_>> {
        let value = value.into_value();
        self.ensure_finite(&value)?;
        let id = self
            .tree
            .insert(self.id, None, value, Origin::synthesized())?;
        Ok(SettingMut::new(self.tree, id))
    }

    fn ensure_finite(&self, value: &Value) -> ConfigResult<()> {
        match value {
            Value::Float(v) if !v.is_finite() => Err(ConfigError::InvalidValue {
                path: self.path(),
                reason: format!("{v} is not a finite number"),
            }),
            _ => Ok(()),
        }
    }

    /// Write handle for `path` relative to this setting.
    pub fn lookup_mut(&mut self, path: &str) -> ConfigResult<SettingMut<'_>> {
        let id = self.tree.resolve_from(self.id, path)?;
        Ok(SettingMut::new(self.tree, id))
    }
}

impl fmt::Debug for SettingMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SettingMut").field(&self.view()).finish()
    }
}
