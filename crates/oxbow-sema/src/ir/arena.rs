//! The per-compilation node arena.
//!
//! All IR nodes live in one append-only arena and are addressed by
//! `NodeId`. Inter-node references are plain ids, including back-edges
//! such as a struct's self-typed method parameter, so cycles cost nothing
//! and the whole tree is freed collectively when the arena drops.

use oxbow_core::Span;

use super::flags::NodeFlags;
use super::node::{Node, NodeKind};

/// Index of a node in the arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pre-seeded built-in type nodes.
///
/// These exist before the parser runs; every compilation references number,
/// bool, and void types by these ids, which also makes `usize`
/// distinguishable from `u64` by id identity.
#[derive(Clone, Copy, Debug)]
pub struct Builtins {
    pub void: NodeId,
    pub bool: NodeId,
    pub i8: NodeId,
    pub i16: NodeId,
    pub i32: NodeId,
    pub i64: NodeId,
    pub u8: NodeId,
    pub u16: NodeId,
    pub u32: NodeId,
    pub u64: NodeId,
    pub f32: NodeId,
    pub f64: NodeId,
    pub usize: NodeId,
}

/// Append-only arena of IR nodes.
#[derive(Clone, Debug)]
pub struct NodeArena {
    nodes: Vec<Node>,
    builtins: Builtins,
}

impl NodeArena {
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(64);

        // void must be first: it is the vtype sentinel every other node
        // starts from, including void itself.
        let void = NodeId(0);
        nodes.push(Node {
            kind: NodeKind::Void,
            flags: NodeFlags::empty(),
            span: Span::synthesized(),
            vtype: void,
        });

        let mut seed = |kind: NodeKind| {
            let id = NodeId(nodes.len() as u32);
            nodes.push(Node {
                kind,
                flags: NodeFlags::empty(),
                span: Span::synthesized(),
                vtype: void,
            });
            id
        };

        let builtins = Builtins {
            void,
            bool: seed(NodeKind::Bool),
            i8: seed(NodeKind::IntNbr { bits: 8 }),
            i16: seed(NodeKind::IntNbr { bits: 16 }),
            i32: seed(NodeKind::IntNbr { bits: 32 }),
            i64: seed(NodeKind::IntNbr { bits: 64 }),
            u8: seed(NodeKind::UintNbr { bits: 8 }),
            u16: seed(NodeKind::UintNbr { bits: 16 }),
            u32: seed(NodeKind::UintNbr { bits: 32 }),
            u64: seed(NodeKind::UintNbr { bits: 64 }),
            f32: seed(NodeKind::FloatNbr { bits: 32 }),
            f64: seed(NodeKind::FloatNbr { bits: 64 }),
            usize: seed(NodeKind::UintNbr { bits: 64 }),
        };

        Self { nodes, builtins }
    }

    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    /// The `void` sentinel used for unset value types and `else` slots.
    pub fn void(&self) -> NodeId {
        self.builtins.void
    }

    /// Allocate a node with empty flags and the void vtype sentinel.
    pub fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            flags: NodeFlags::empty(),
            span,
            vtype: self.builtins.void,
        });
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.index()].span
    }

    pub fn vtype(&self, id: NodeId) -> NodeId {
        self.nodes[id.index()].vtype
    }

    pub fn set_vtype(&mut self, id: NodeId, vtype: NodeId) {
        self.nodes[id.index()].vtype = vtype;
    }

    pub fn flags(&self, id: NodeId) -> NodeFlags {
        self.nodes[id.index()].flags
    }

    pub fn add_flags(&mut self, id: NodeId, flags: NodeFlags) {
        self.nodes[id.index()].flags |= flags;
    }

    pub fn has_flag(&self, id: NodeId, flag: NodeFlags) -> bool {
        self.nodes[id.index()].flags.contains(flag)
    }

    /// Number of nodes allocated, built-ins included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        false // the built-ins are always present
    }

    /// Iterate all node ids in allocation order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }
}

impl Default for NodeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Index<NodeId> for NodeArena {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}

impl std::ops::IndexMut<NodeId> for NodeArena {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }
}
