//! Name resolution pass.
//!
//! Two sub-passes over the module:
//! 1. Hoist: every top-level name (functions, types, globals) is entered
//!    into the module namespace before any body is looked at, so
//!    module-scope declarations may reference each other in any order.
//! 2. Resolve: a full walk binding each `NameUse` to the innermost visible
//!    declaration. Inside function bodies, names must be declared before
//!    use.
//!
//! Unknown names are recoverable: the error is recorded and the use is left
//! unresolved. Duplicate declarations keep the first binding.

use tracing::debug;

use oxbow_core::Interner;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::ir::{Namespace, NodeArena, NodeFlags, NodeId, NodeKind};

use super::scope::ScopeStack;

/// Resolve every name use in `module`. Reported errors accumulate in
/// `diag`; the caller gates later passes on the error count.
pub fn resolve_module(
    arena: &mut NodeArena,
    interner: &Interner,
    diag: &mut Diagnostics,
    module: NodeId,
) {
    debug!(node = %module, "name resolution start");
    let mut resolver = NameResolver {
        arena,
        interner,
        diag,
        scopes: ScopeStack::new(),
    };
    resolver.module(module);
    debug!(errors = resolver.diag.error_count(), "name resolution done");
}

struct NameResolver<'a> {
    arena: &'a mut NodeArena,
    interner: &'a Interner,
    diag: &'a mut Diagnostics,
    scopes: ScopeStack,
}

impl NameResolver<'_> {
    fn name_str(&self, name: oxbow_core::Symbol) -> &str {
        self.interner.try_resolve(name).unwrap_or("<name>")
    }

    fn module(&mut self, module: NodeId) {
        let items = match self.arena.kind(module) {
            NodeKind::Module { items, .. } => items.clone(),
            _ => {
                self.diag
                    .fatal(
                        DiagnosticKind::General,
                        "name resolution requires a module root",
                        self.arena.span(module),
                    )
                    .emit();
                return;
            }
        };

        self.scopes.push();
        self.hoist(module, &items);
        for item in items {
            self.resolve(item);
        }
        self.scopes.pop();
    }

    /// Sub-pass 1: enter all top-level names before resolving any body.
    fn hoist(&mut self, module: NodeId, items: &[NodeId]) {
        let mut ns = Namespace::new();

        for &item in items {
            let Some(name) = self.arena.kind(item).dcl_name() else {
                continue;
            };

            if let Some(&existing) = ns.get(name).and_then(<[NodeId]>::first) {
                if self.overloadable(existing, item) {
                    ns.push_overload(name, item);
                } else {
                    let msg = format!(
                        "duplicate name {}: only functions can be overloaded",
                        self.name_str(name)
                    );
                    let prior_span = self.arena.span(existing);
                    self.diag
                        .error(DiagnosticKind::DuplicateName, msg, self.arena.span(item))
                        .note("first declared here", prior_span)
                        .emit();
                }
                continue;
            }

            ns.insert_new(name, item);
            self.scopes.bind(name, item);
        }

        if let NodeKind::Module { namespace, .. } = &mut self.arena.node_mut(module).kind {
            *namespace = ns;
        }
    }

    /// Whether two same-named top-level declarations form an overload set.
    fn overloadable(&self, existing: NodeId, new: NodeId) -> bool {
        matches!(self.arena.kind(existing), NodeKind::FnDcl { .. })
            && matches!(self.arena.kind(new), NodeKind::FnDcl { .. })
    }

    fn resolve(&mut self, node: NodeId) {
        match self.arena.kind(node).clone() {
            // Leaves: nothing to bind.
            NodeKind::ULit { .. }
            | NodeKind::FLit { .. }
            | NodeKind::Continue
            | NodeKind::IntNbr { .. }
            | NodeKind::UintNbr { .. }
            | NodeKind::FloatNbr { .. }
            | NodeKind::Void
            | NodeKind::Bool
            | NodeKind::Perm { .. }
            | NodeKind::Lifetime { .. } => {}

            NodeKind::NameUse { name, .. } => {
                let found = self.scopes.lookup(name);
                if found.is_none() {
                    let msg = format!("name {} is not declared", self.name_str(name));
                    self.diag
                        .error(DiagnosticKind::General, msg, self.arena.span(node))
                        .emit();
                }
                if let NodeKind::NameUse { dcl, .. } = &mut self.arena.node_mut(node).kind {
                    *dcl = found;
                }
            }

            // Field names are resolved against the struct during type check.
            NodeKind::NamedVal { val, .. } => self.resolve(val),

            NodeKind::VTuple { values } => {
                for v in values {
                    self.resolve(v);
                }
            }
            NodeKind::Assign { lval, rval } => {
                self.resolve(lval);
                self.resolve(rval);
            }
            NodeKind::FnCall { callee, args, .. } => {
                self.resolve(callee);
                for arg in args {
                    self.resolve(arg);
                }
            }
            NodeKind::TypeLit { typ, args } => {
                self.resolve(typ);
                for arg in args {
                    self.resolve(arg);
                }
            }
            NodeKind::Cast { exp, typ } | NodeKind::Is { exp, typ } => {
                self.resolve(exp);
                self.resolve(typ);
            }
            NodeKind::Deref { exp } | NodeKind::LogicNot { exp } => self.resolve(exp),
            NodeKind::LogicAnd { lhs, rhs } | NodeKind::LogicOr { lhs, rhs } => {
                self.resolve(lhs);
                self.resolve(rhs);
            }

            NodeKind::Block { stmts } => {
                self.scopes.push();
                for stmt in stmts {
                    self.resolve(stmt);
                }
                self.scopes.pop();
            }
            NodeKind::If { branches } => {
                let void = self.arena.void();
                for (cond, block) in branches {
                    if cond != void {
                        self.resolve(cond);
                    }
                    self.resolve(block);
                }
            }
            NodeKind::Loop { body, .. } => self.resolve(body),
            NodeKind::Break { exp } => {
                if let Some(exp) = exp {
                    self.resolve(exp);
                }
            }
            NodeKind::Return { exp, .. } | NodeKind::BlockRet { exp, .. } => {
                if let Some(exp) = exp {
                    self.resolve(exp);
                }
            }

            NodeKind::VarDcl {
                name, typ, init, ..
            } => {
                // Strict lexical order: the initializer cannot see the
                // variable being declared.
                self.resolve(typ);
                if let Some(init) = init {
                    self.resolve(init);
                }
                if let Some(existing) = self.scopes.bind(name, node) {
                    // Module-level variables were bound during hoisting;
                    // rebinding the same node is not a duplicate.
                    if existing != node {
                        let msg = format!("duplicate name {}", self.name_str(name));
                        let prior_span = self.arena.span(existing);
                        self.diag
                            .error(DiagnosticKind::DuplicateName, msg, self.arena.span(node))
                            .note("first declared here", prior_span)
                            .emit();
                    }
                }
            }

            NodeKind::FnDcl { sig, body, .. } => self.fn_dcl(sig, body),

            NodeKind::FieldDcl { typ, default, .. } => {
                self.resolve(typ);
                if let Some(default) = default {
                    self.resolve(default);
                }
            }

            NodeKind::Struct { .. } => self.struct_dcl(node),

            NodeKind::Module { .. } => {
                self.diag
                    .error(
                        DiagnosticKind::General,
                        "nested modules are not supported",
                        self.arena.span(node),
                    )
                    .emit();
            }

            NodeKind::Ref { pvtype, .. }
            | NodeKind::Ptr { pvtype }
            | NodeKind::ArrayRef { pvtype, .. }
            | NodeKind::VirtRef { pvtype, .. } => self.resolve(pvtype),
            NodeKind::Array { elem, .. } => self.resolve(elem),
            NodeKind::FnSig { parms, rettype } => {
                for parm in parms {
                    self.resolve(parm);
                }
                self.resolve(rettype);
            }
            NodeKind::TTuple { types } => {
                for t in types {
                    self.resolve(t);
                }
            }
        }
    }

    /// Resolve a function: signature in the enclosing scope, body in a new
    /// scope where the parameters are bound.
    fn fn_dcl(&mut self, sig: NodeId, body: Option<NodeId>) {
        self.resolve(sig);

        let Some(body) = body else { return };

        self.scopes.push();
        if let NodeKind::FnSig { parms, .. } = self.arena.kind(sig).clone() {
            for parm in parms {
                if let Some(name) = self.arena.kind(parm).dcl_name()
                    && self.scopes.bind(name, parm).is_some()
                {
                    let msg = format!("duplicate parameter name {}", self.name_str(name));
                    self.diag
                        .error(DiagnosticKind::DuplicateName, msg, self.arena.span(parm))
                        .emit();
                }
            }
        }
        self.resolve(body);
        self.scopes.pop();
    }

    /// Resolve a struct: build its member namespace, then resolve field
    /// types and method bodies inside a type scope exposing the members.
    fn struct_dcl(&mut self, node: NodeId) {
        let (fields, methods) = match self.arena.kind(node) {
            NodeKind::Struct {
                fields, methods, ..
            } => (fields.clone(), methods.clone()),
            _ => unreachable!("struct_dcl on non-struct"),
        };

        let mut ns = Namespace::new();
        let mut has_tag = false;

        for &field in &fields {
            let Some(name) = self.arena.kind(field).dcl_name() else {
                continue;
            };
            has_tag |= self.arena.has_flag(field, NodeFlags::IS_TAG_FIELD);
            if !ns.insert_new(name, field) {
                let msg = format!("duplicate name {}", self.name_str(name));
                self.diag
                    .error(DiagnosticKind::DuplicateName, msg, self.arena.span(field))
                    .emit();
            }
        }

        for &method in &methods {
            let Some(name) = self.arena.kind(method).dcl_name() else {
                continue;
            };
            match ns.get(name).and_then(<[NodeId]>::first).copied() {
                None => {
                    ns.insert_new(name, method);
                }
                Some(existing) if self.method_overloadable(existing, method) => {
                    ns.push_overload(name, method);
                }
                Some(existing) => {
                    let msg = format!(
                        "duplicate name {}: only methods can be overloaded",
                        self.name_str(name)
                    );
                    let prior_span = self.arena.span(existing);
                    self.diag
                        .error(DiagnosticKind::DuplicateName, msg, self.arena.span(method))
                        .note("first declared here", prior_span)
                        .emit();
                }
            }
        }

        if has_tag {
            self.arena.add_flags(node, NodeFlags::HAS_TAG_FIELD);
        }

        // Type scope: members are visible by bare name inside method bodies.
        self.scopes.push();
        for (name, members) in ns.iter() {
            if let Some(&first) = members.first() {
                self.scopes.bind(name, first);
            }
        }

        if let NodeKind::Struct { namespace, .. } = &mut self.arena.node_mut(node).kind {
            *namespace = ns;
        }

        for field in fields {
            self.resolve(field);
        }
        for method in methods {
            self.resolve(method);
        }
        self.scopes.pop();
    }

    /// Struct members overload only when both carry the method flag.
    fn method_overloadable(&self, existing: NodeId, new: NodeId) -> bool {
        matches!(self.arena.kind(existing), NodeKind::FnDcl { .. })
            && matches!(self.arena.kind(new), NodeKind::FnDcl { .. })
            && self.arena.has_flag(existing, NodeFlags::METH_FLD)
            && self.arena.has_flag(new, NodeFlags::METH_FLD)
    }
}
