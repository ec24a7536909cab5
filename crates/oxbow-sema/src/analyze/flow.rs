//! Flow analysis pass.
//!
//! Runs over the type-checked IR computing the alias and move information
//! the backend needs to insert drops. Reads of owning (`uni`) references
//! move the value: the read is flagged, a second read is an error, and
//! owned values still live at a `return` land on its dealias list so the
//! backend can release them. Alias accumulation resets at branch joins so
//! borrows cannot leak across arms; a single pass over a loop body
//! suffices because borrows cannot escape an iteration.

use tracing::{debug, trace};

use oxbow_core::Interner;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::ir::{NodeArena, NodeFlags, NodeId, NodeKind};

use super::types;

/// Run flow analysis over `module`. Assumes a clean type check.
pub fn flow_module(
    arena: &mut NodeArena,
    interner: &Interner,
    diag: &mut Diagnostics,
    module: NodeId,
) {
    debug!(node = %module, "flow analysis start");
    let mut pass = FlowPass {
        arena,
        interner,
        diag,
        owned: Vec::new(),
        aliases: Vec::new(),
    };
    pass.module(module);
    debug!(errors = pass.diag.error_count(), "flow analysis done");
}

/// State of one owning variable in the enclosing function.
#[derive(Clone, Copy, Debug)]
struct OwnedVar {
    dcl: NodeId,
    moved: bool,
}

struct FlowPass<'a> {
    arena: &'a mut NodeArena,
    interner: &'a Interner,
    diag: &'a mut Diagnostics,
    /// Owning variables of the current function, declaration order.
    owned: Vec<OwnedVar>,
    /// Borrow accumulator, reset at every branch join.
    aliases: Vec<NodeId>,
}

impl FlowPass<'_> {
    fn module(&mut self, module: NodeId) {
        let items = match self.arena.kind(module) {
            NodeKind::Module { items, .. } => items.clone(),
            _ => return,
        };
        for item in items {
            match self.arena.kind(item).clone() {
                NodeKind::FnDcl { body, .. } => self.function(body),
                NodeKind::Struct { methods, .. } => {
                    for method in methods {
                        if let NodeKind::FnDcl { body, .. } = self.arena.kind(method) {
                            self.function(*body);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn function(&mut self, body: Option<NodeId>) {
        let Some(body) = body else { return };
        self.owned.clear();
        self.aliases.clear();
        self.block(body);
    }

    fn block(&mut self, block: NodeId) {
        let stmts = match self.arena.kind(block) {
            NodeKind::Block { stmts } => stmts.clone(),
            _ => return,
        };
        let owned_at_entry = self.owned.len();
        for stmt in stmts {
            self.stmt(stmt);
        }
        // Variables declared in this block fall out of scope.
        self.owned.truncate(owned_at_entry);
    }

    fn stmt(&mut self, stmt: NodeId) {
        match self.arena.kind(stmt).clone() {
            NodeKind::VarDcl { init, .. } => {
                if let Some(init) = init {
                    self.load_value(init);
                }
                if types::type_moves_on_read(self.arena, self.arena.vtype(stmt)) {
                    self.owned.push(OwnedVar {
                        dcl: stmt,
                        moved: false,
                    });
                }
            }
            NodeKind::Return { exp, .. } | NodeKind::BlockRet { exp, .. } => {
                if let Some(exp) = exp {
                    self.load_value(exp);
                }
                let dealias = self.live_owned();
                match &mut self.arena.node_mut(stmt).kind {
                    NodeKind::Return { dealias: slot, .. }
                    | NodeKind::BlockRet { dealias: slot, .. } => *slot = dealias,
                    _ => unreachable!(),
                }
            }
            NodeKind::Break { exp } => {
                if let Some(exp) = exp {
                    self.load_value(exp);
                }
            }
            NodeKind::Continue => {}
            _ => self.load_value(stmt),
        }
    }

    /// Owned variables still live (not moved) at this point, declaration
    /// order. These need releasing before leaving the function.
    fn live_owned(&self) -> Vec<NodeId> {
        self.owned
            .iter()
            .filter(|v| !v.moved)
            .map(|v| v.dcl)
            .collect()
    }

    /// Annotate a value read. A read of an owning variable moves it; the
    /// moving use is flagged and a repeated move is an error.
    fn load_value(&mut self, exp: NodeId) {
        match self.arena.kind(exp).clone() {
            NodeKind::NameUse {
                name,
                dcl: Some(dcl),
            } => {
                if !types::type_moves_on_read(self.arena, self.arena.vtype(exp)) {
                    return;
                }
                let Some(var) = self.owned.iter_mut().find(|v| v.dcl == dcl) else {
                    return;
                };
                if var.moved {
                    let msg = format!(
                        "value of {} was already moved",
                        self.interner.try_resolve(name).unwrap_or("<name>")
                    );
                    self.diag
                        .error(DiagnosticKind::General, msg, self.arena.span(exp))
                        .emit();
                    return;
                }
                var.moved = true;
                self.arena.add_flags(exp, NodeFlags::MOVED);
            }

            NodeKind::ULit { .. }
            | NodeKind::FLit { .. }
            | NodeKind::NameUse { dcl: None, .. }
            | NodeKind::Continue => {}

            NodeKind::NamedVal { val, .. } => self.load_value(val),
            NodeKind::VTuple { values } => {
                for v in values {
                    self.load_value(v);
                }
            }
            NodeKind::Assign { lval, rval } => {
                // A store is not a read of the target.
                self.load_value(rval);
                let _ = lval;
            }
            NodeKind::FnCall { args, .. } => {
                for arg in args {
                    self.load_value(arg);
                }
            }
            NodeKind::TypeLit { args, .. } => {
                for arg in args {
                    self.load_value(arg);
                }
            }
            NodeKind::Cast { exp, .. } | NodeKind::Is { exp, .. } => self.load_value(exp),
            NodeKind::Deref { exp } => {
                // Reading through a reference aliases it.
                self.aliases.push(exp);
                self.load_value(exp);
            }
            NodeKind::LogicNot { exp } => self.load_value(exp),
            NodeKind::LogicAnd { lhs, rhs } | NodeKind::LogicOr { lhs, rhs } => {
                self.load_value(lhs);
                self.load_value(rhs);
            }

            NodeKind::Block { .. } => self.block(exp),
            NodeKind::If { branches } => {
                let void = self.arena.void();
                // Arms are exclusive: each starts from the pre-arm move
                // state, and a move in any arm counts afterwards.
                let mut merged: Vec<bool> = self.owned.iter().map(|v| v.moved).collect();
                for (cond, block) in branches {
                    if cond != void {
                        self.load_value(cond);
                    }
                    let path: Vec<bool> = self.owned.iter().map(|v| v.moved).collect();
                    self.block(block);
                    for (m, v) in merged.iter_mut().zip(self.owned.iter()) {
                        *m |= v.moved;
                    }
                    for (v, &m) in self.owned.iter_mut().zip(path.iter()) {
                        v.moved = m;
                    }
                    // Divergent borrows must not leak across arms.
                    self.alias_reset();
                }
                for (v, &m) in self.owned.iter_mut().zip(merged.iter()) {
                    v.moved = m;
                }
            }
            NodeKind::Loop { body, .. } => {
                // One pass suffices: a borrow created in one iteration
                // cannot escape into the next.
                self.block(body);
                self.alias_reset();
            }

            NodeKind::Break { .. } | NodeKind::Return { .. } | NodeKind::BlockRet { .. } => {
                self.stmt(exp)
            }
            NodeKind::VarDcl { .. } => self.stmt(exp),

            // Declarations and types carry no runtime value flow.
            _ => {}
        }
    }

    fn alias_reset(&mut self) {
        if !self.aliases.is_empty() {
            trace!(aliases = self.aliases.len(), "alias accumulator reset");
        }
        self.aliases.clear();
    }
}
