//! Ordered name-to-declaration maps.
//!
//! Module and struct types each own a namespace. Entries preserve source
//! order, and an entry holds an ordered list of declarations: length one for
//! everything except overloaded methods, where the list is the overload set
//! in declaration order.

use indexmap::IndexMap;
use oxbow_core::Symbol;

use super::arena::NodeId;

/// Mapping from interned name to declaration node(s), in source order.
#[derive(Clone, Debug, Default)]
pub struct Namespace {
    entries: IndexMap<Symbol, Vec<NodeId>>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// All declarations sharing this name, earliest first.
    pub fn get(&self, name: Symbol) -> Option<&[NodeId]> {
        self.entries.get(&name).map(Vec::as_slice)
    }

    /// The earliest declaration for this name.
    pub fn first(&self, name: Symbol) -> Option<NodeId> {
        self.entries.get(&name).and_then(|v| v.first().copied())
    }

    pub fn contains(&self, name: Symbol) -> bool {
        self.entries.contains_key(&name)
    }

    /// Bind a fresh name. Returns `false` (without inserting) if taken.
    pub fn insert_new(&mut self, name: Symbol, node: NodeId) -> bool {
        if self.entries.contains_key(&name) {
            return false;
        }
        self.entries.insert(name, vec![node]);
        true
    }

    /// Append an overload to an existing entry (or start one).
    ///
    /// The caller is responsible for having checked overload compatibility;
    /// this only maintains declaration order.
    pub fn push_overload(&mut self, name: Symbol, node: NodeId) {
        self.entries.entry(name).or_default().push(node);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &[NodeId])> {
        self.entries.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// Drop all entries, keeping allocation. Used when a pass rebuilds the
    /// namespace from declarations (keeps re-runs idempotent).
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
