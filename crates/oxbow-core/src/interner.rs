//! Interned names.
//!
//! Every name the compiler sees is interned exactly once: its bytes go
//! into a single append-only buffer and all later occurrences resolve to
//! the same `Symbol`, so name equality is handle equality. Each name's
//! hash is computed once, at interning time, and kept with the entry;
//! namespaces probing by name never rehash the bytes.

use std::collections::HashMap;
use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;

/// Names are identifiers; anything longer than this is a front-end bug.
pub const MAX_NAME_LEN: usize = 255;

/// A lightweight handle to an interned name.
///
/// Two symbols are equal exactly when their names are byte-identical.
/// Ordering follows interning order, not the names' bytes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Symbol(u32);

/// Location of one name inside the interner's byte buffer.
#[derive(Clone, Copy, Debug)]
struct NameEntry {
    start: u32,
    /// Byte length; the [`MAX_NAME_LEN`] cap makes a byte wide enough.
    len: u8,
    hash: u64,
}

/// Name interner backed by one append-only byte buffer.
///
/// Deduplication probes a hash-keyed bucket list and falls back to byte
/// comparison, so two entries never hold the same name.
#[derive(Debug, Clone, Default)]
pub struct Interner {
    /// Concatenated bytes of every interned name.
    bytes: String,
    names: Vec<NameEntry>,
    /// Precomputed hash to the symbols sharing it; collisions are told
    /// apart by comparing bytes.
    buckets: HashMap<u64, Vec<Symbol>>,
    hasher: RandomState,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a name, returning the symbol every equal name shares.
    ///
    /// # Panics
    /// Panics if the name is longer than [`MAX_NAME_LEN`] bytes; the
    /// lexer never produces such an identifier.
    pub fn intern(&mut self, name: &str) -> Symbol {
        assert!(
            name.len() <= MAX_NAME_LEN,
            "name longer than {MAX_NAME_LEN} bytes"
        );

        let hash = self.hasher.hash_one(name);
        if let Some(bucket) = self.buckets.get(&hash)
            && let Some(&found) = bucket.iter().find(|&&sym| self.entry_str(sym) == name)
        {
            return found;
        }

        let sym = Symbol(self.names.len() as u32);
        let start = self.bytes.len() as u32;
        self.bytes.push_str(name);
        self.names.push(NameEntry {
            start,
            len: name.len() as u8,
            hash,
        });
        self.buckets.entry(hash).or_default().push(sym);
        sym
    }

    fn entry_str(&self, sym: Symbol) -> &str {
        let entry = &self.names[sym.0 as usize];
        let start = entry.start as usize;
        &self.bytes[start..start + entry.len as usize]
    }

    /// Resolve a symbol back to its name.
    ///
    /// # Panics
    /// Panics if the symbol was not created by this interner.
    #[inline]
    pub fn resolve(&self, sym: Symbol) -> &str {
        self.entry_str(sym)
    }

    /// Resolve a symbol, or None for a handle from another interner.
    #[inline]
    pub fn try_resolve(&self, sym: Symbol) -> Option<&str> {
        if (sym.0 as usize) < self.names.len() {
            Some(self.entry_str(sym))
        } else {
            None
        }
    }

    /// The hash computed when the name was interned.
    ///
    /// # Panics
    /// Panics if the symbol was not created by this interner.
    #[inline]
    pub fn hash_of(&self, sym: Symbol) -> u64 {
        self.names[sym.0 as usize].hash
    }

    /// Number of distinct names interned.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate names in interning order.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &str)> {
        (0..self.names.len() as u32)
            .map(Symbol)
            .map(|sym| (sym, self.entry_str(sym)))
    }
}
