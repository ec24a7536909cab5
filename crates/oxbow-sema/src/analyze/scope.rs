//! Lexical scope stack.
//!
//! Every name has at most one "currently bound" declaration at any point of
//! the walk. Opening a scope starts a frame; binding a name inside it saves
//! whatever the name was bound to before, and closing the frame restores
//! all shadowed bindings. Innermost lookup is a single hash probe.

use std::collections::HashMap;

use oxbow_core::Symbol;

use crate::ir::NodeId;

#[derive(Debug, Default)]
struct Frame {
    /// Previous binding of each name bound in this frame (None = unbound).
    saved: Vec<(Symbol, Option<NodeId>)>,
}

/// Stack of lexical scopes over a single current-binding map.
#[derive(Debug, Default)]
pub struct ScopeStack {
    bindings: HashMap<Symbol, NodeId>,
    frames: Vec<Frame>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new scope.
    pub fn push(&mut self) {
        self.frames.push(Frame::default());
    }

    /// Close the innermost scope, restoring shadowed bindings.
    pub fn pop(&mut self) {
        let frame = self.frames.pop().expect("scope stack underflow");
        for (name, prior) in frame.saved.into_iter().rev() {
            match prior {
                Some(node) => {
                    self.bindings.insert(name, node);
                }
                None => {
                    self.bindings.remove(&name);
                }
            }
        }
    }

    /// Bind `name` to `node` in the innermost scope.
    ///
    /// Returns the already-bound declaration if `name` was declared in this
    /// same frame (a duplicate; the new binding is not installed).
    pub fn bind(&mut self, name: Symbol, node: NodeId) -> Option<NodeId> {
        let frame = self.frames.last_mut().expect("no open scope");
        if frame.saved.iter().any(|(n, _)| *n == name) {
            return self.bindings.get(&name).copied();
        }

        let prior = self.bindings.insert(name, node);
        self.frames
            .last_mut()
            .expect("no open scope")
            .saved
            .push((name, prior));
        None
    }

    /// Innermost binding of `name`, if any.
    pub fn lookup(&self, name: Symbol) -> Option<NodeId> {
        self.bindings.get(&name).copied()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Drop every frame and binding.
    pub fn clear(&mut self) {
        self.bindings.clear();
        self.frames.clear();
    }
}
