//! Namespaces and layered scopes.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::types::Value;

/// Flat name to value table.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    entries: BTreeMap<String, Value>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(name.into(), value.into())
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Copy every entry of `other` in, overwriting collisions.
    pub fn merge(&mut self, other: &Namespace) {
        for (name, value) in &other.entries {
            self.entries.insert(name.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Namespace {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Stack of shared namespaces, searched from the top.
///
/// Layers are `Rc`s so the import namespace and the per-instantiation
/// layers are shared rather than copied into every binding.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    layers: Vec<Rc<Namespace>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer above the existing ones.
    pub fn push(mut self, layer: Rc<Namespace>) -> Self {
        self.layers.push(layer);
        self
    }

    /// Copy of this scope with one more layer on top.
    pub fn with_layer(&self, layer: Namespace) -> Self {
        self.clone().push(Rc::new(layer))
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.layers
            .iter()
            .rev()
            .find_map(|layer| layer.get(name))
            .cloned()
    }

    pub fn depth(&self) -> usize {
        self.layers.len()
    }
}
