//! Type check / inference pass.
//!
//! Walks the resolved IR assigning a value type to every expression,
//! validating operator, cast, and call rules, and materializing every
//! implicit conversion as an explicit `Cast` or `Deref` node. Check
//! functions return the (possibly rewritten) node handle and the caller
//! writes it back into its child slot, so coercion wrappers slot in
//! without back-pointers.

mod calls;
mod exprs;
mod typelit;

#[cfg(test)]
mod type_check_tests;

pub use typelit::type_lit_is_literal;

use tracing::debug;

use oxbow_core::Interner;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::ir::{NodeArena, NodeId, NodeKind, PermKind};

use super::types::{self, TypeMatch};

/// Run the type check pass over `module`.
///
/// Assumes name resolution completed without errors; the session driver
/// enforces that ordering.
pub fn check_module(
    arena: &mut NodeArena,
    interner: &Interner,
    diag: &mut Diagnostics,
    max_type_depth: u32,
    module: NodeId,
) {
    debug!(node = %module, "type check start");
    let mut pass = TypeCheck {
        arena,
        interner,
        diag,
        max_type_depth,
        module,
        fnsig: None,
        typenode: None,
        loops: Vec::new(),
    };
    pass.module();
    debug!(errors = pass.diag.error_count(), "type check done");
}

pub(crate) struct TypeCheck<'a> {
    pub(crate) arena: &'a mut NodeArena,
    pub(crate) interner: &'a Interner,
    pub(crate) diag: &'a mut Diagnostics,
    max_type_depth: u32,
    module: NodeId,
    /// Signature of the enclosing function, for return checking.
    pub(crate) fnsig: Option<NodeId>,
    /// Enclosing type, for private-field access decisions.
    pub(crate) typenode: Option<NodeId>,
    /// Stack of enclosing loops, for `break` collection.
    pub(crate) loops: Vec<NodeId>,
}

impl TypeCheck<'_> {
    pub(crate) fn name_str(&self, name: oxbow_core::Symbol) -> String {
        self.interner
            .try_resolve(name)
            .unwrap_or("<name>")
            .to_owned()
    }

    pub(crate) fn type_dcl(&self, id: NodeId) -> NodeId {
        types::type_dcl_capped(self.arena, id, self.max_type_depth)
    }

    pub(crate) fn exp_type_dcl(&self, exp: NodeId) -> NodeId {
        self.type_dcl(self.arena.vtype(exp))
    }

    /// Declared type of a parameter. Read from the declaration rather than
    /// its checked vtype so calls may precede the declaring function in
    /// module order.
    pub(crate) fn parm_type(&self, parm: NodeId) -> NodeId {
        match self.arena.kind(parm) {
            NodeKind::VarDcl { typ, .. } => *typ,
            _ => self.arena.vtype(parm),
        }
    }

    fn module(&mut self) {
        let items = match self.arena.kind(self.module) {
            NodeKind::Module { items, .. } => items.clone(),
            _ => {
                self.diag
                    .fatal(
                        DiagnosticKind::General,
                        "type check requires a module root",
                        self.arena.span(self.module),
                    )
                    .emit();
                return;
            }
        };

        for item in items {
            match self.arena.kind(item) {
                NodeKind::FnDcl { .. } => self.check_fn(item),
                NodeKind::Struct { .. } => self.check_struct(item),
                NodeKind::VarDcl { .. } => {
                    self.check_var_dcl(item);
                }
                _ => {
                    let _ = self.check_stmt(item);
                }
            }
        }
    }

    fn check_fn(&mut self, fn_id: NodeId) {
        let (sig, body) = match self.arena.kind(fn_id) {
            NodeKind::FnDcl { sig, body, .. } => (*sig, *body),
            _ => unreachable!("check_fn on non-function"),
        };

        self.check_sig(sig);

        let Some(body) = body else { return };

        let saved = self.fnsig.replace(sig);
        self.desugar_trailing_return(sig, body);
        let body = self.check_stmt(body);
        if let NodeKind::FnDcl { body: slot, .. } = &mut self.arena.node_mut(fn_id).kind {
            *slot = Some(body);
        }
        self.fnsig = saved;
    }

    fn check_sig(&mut self, sig: NodeId) {
        let (parms, rettype) = match self.arena.kind(sig) {
            NodeKind::FnSig { parms, rettype } => (parms.clone(), *rettype),
            _ => {
                self.diag
                    .error(
                        DiagnosticKind::BadTerm,
                        "malformed function signature",
                        self.arena.span(sig),
                    )
                    .emit();
                return;
            }
        };

        for parm in parms {
            self.check_var_dcl(parm);
        }
        self.check_type(rettype);
    }

    /// A function whose body ends in a bare expression returns that value:
    /// wrap the trailing expression in an implicit `Return`.
    fn desugar_trailing_return(&mut self, sig: NodeId, body: NodeId) {
        let rettype = match self.arena.kind(sig) {
            NodeKind::FnSig { rettype, .. } => *rettype,
            _ => return,
        };
        if matches!(self.arena.kind(self.type_dcl(rettype)), NodeKind::Void) {
            return;
        }

        let Some(&last) = (match self.arena.kind(body) {
            NodeKind::Block { stmts } => stmts.last(),
            _ => None,
        }) else {
            return;
        };

        let last_kind = self.arena.kind(last);
        if matches!(
            last_kind,
            NodeKind::Return { .. } | NodeKind::BlockRet { .. }
        ) || !last_kind.is_exp()
        {
            return;
        }

        let span = self.arena.span(last);
        let ret = self.arena.alloc(
            NodeKind::Return {
                exp: Some(last),
                dealias: Vec::new(),
            },
            span,
        );
        if let NodeKind::Block { stmts } = &mut self.arena.node_mut(body).kind {
            *stmts.last_mut().expect("non-empty checked above") = ret;
        }
    }

    fn check_struct(&mut self, struct_id: NodeId) {
        let (fields, methods) = match self.arena.kind(struct_id) {
            NodeKind::Struct {
                fields, methods, ..
            } => (fields.clone(), methods.clone()),
            _ => unreachable!("check_struct on non-struct"),
        };

        let saved = self.typenode.replace(struct_id);
        for field in fields {
            self.check_field_dcl(field);
        }
        for method in methods {
            self.check_fn(method);
        }
        self.typenode = saved;
    }

    fn check_field_dcl(&mut self, field: NodeId) {
        let (typ, default) = match self.arena.kind(field) {
            NodeKind::FieldDcl { typ, default, .. } => (*typ, *default),
            _ => return,
        };
        self.check_type(typ);
        if let Some(default) = default {
            let default = self.check_exp(default);
            let default = self.coerce_or_error(
                typ,
                default,
                "field default value's type does not match the field's type",
                None,
            );
            if let NodeKind::FieldDcl { default: slot, .. } = &mut self.arena.node_mut(field).kind {
                *slot = Some(default);
            }
        }
        self.arena.set_vtype(field, typ);
    }

    /// Check a variable declaration (local, global, or parameter).
    ///
    /// A void declared type means "infer from the initializer".
    pub(crate) fn check_var_dcl(&mut self, var: NodeId) -> NodeId {
        let (typ, init) = match self.arena.kind(var) {
            NodeKind::VarDcl { typ, init, .. } => (*typ, *init),
            _ => unreachable!("check_var_dcl on non-variable"),
        };

        let void = self.arena.void();
        let inferred = typ == void;
        if !inferred {
            self.check_type(typ);
        }

        let mut final_typ = typ;
        if let Some(init) = init {
            let init = if inferred {
                let init = self.check_exp(init);
                final_typ = self.arena.vtype(init);
                if final_typ == void {
                    self.diag
                        .error(
                            DiagnosticKind::NotTyped,
                            "cannot infer a type from this initializer",
                            self.arena.span(init),
                        )
                        .emit();
                }
                init
            } else {
                self.check_exp_expect(
                    init,
                    typ,
                    "initializer's type does not match the declared type",
                )
            };
            if let NodeKind::VarDcl {
                typ: typ_slot,
                init: init_slot,
                ..
            } = &mut self.arena.node_mut(var).kind
            {
                *typ_slot = final_typ;
                *init_slot = Some(init);
            }
        } else if inferred {
            self.diag
                .error(
                    DiagnosticKind::NotTyped,
                    "a variable without an initializer must declare its type",
                    self.arena.span(var),
                )
                .emit();
        }

        self.arena.set_vtype(var, final_typ);
        var
    }

    /// Verify a node used in type position denotes a type.
    pub(crate) fn check_type(&mut self, typ: NodeId) {
        // An unresolved name was already reported by name resolution.
        if matches!(self.arena.kind(typ), NodeKind::NameUse { dcl: None, .. }) {
            return;
        }
        let canonical = self.type_dcl(typ);
        if !self.arena.kind(canonical).is_type() {
            self.diag
                .error(
                    DiagnosticKind::InvalidType,
                    "expected a type here",
                    self.arena.span(typ),
                )
                .emit();
        }
    }

    /// Check an expression under an expected type, inserting the coercion.
    pub(crate) fn check_exp_expect(&mut self, exp: NodeId, target: NodeId, msg: &str) -> NodeId {
        let exp = self.check_exp(exp);
        self.coerce_or_error(target, exp, msg, None)
    }

    /// Coerce a checked expression to `target`, reporting `msg` on failure.
    ///
    /// Conditionals, loops, and blocks are coerced through their value
    /// positions (each arm's trailing expression, each `break` value);
    /// everything else gets a `Cast` or `Deref` wrapper in place.
    pub(crate) fn coerce_or_error(
        &mut self,
        target: NodeId,
        exp: NodeId,
        msg: &str,
        related: Option<(&str, NodeId)>,
    ) -> NodeId {
        if matches!(self.arena.kind(self.type_dcl(target)), NodeKind::Void) {
            return exp;
        }

        match self.arena.kind(exp) {
            NodeKind::If { .. } => {
                self.if_coerce_arms(exp, target, msg);
                return exp;
            }
            NodeKind::Loop { .. } => {
                self.loop_coerce_breaks(exp, target, msg);
                return exp;
            }
            NodeKind::Block { .. } => {
                self.block_coerce_value(exp, target, msg);
                return exp;
            }
            _ => {}
        }

        match self.try_coerce(target, exp) {
            Some(coerced) => coerced,
            None => {
                let mut builder =
                    self.diag
                        .error(DiagnosticKind::InvalidType, msg, self.arena.span(exp));
                if let Some((text, node)) = related {
                    builder = builder.note(text, self.arena.span(node));
                }
                builder.emit();
                exp
            }
        }
    }

    /// Attempt to coerce without reporting. Returns the wrapped handle, or
    /// the expression itself for an exact match.
    pub(crate) fn try_coerce(&mut self, target: NodeId, exp: NodeId) -> Option<NodeId> {
        let have = self.exp_type_dcl(exp);
        let need = self.type_dcl(target);

        match types::type_matches(self.arena, have, need) {
            TypeMatch::Exact => Some(exp),
            TypeMatch::Coerce(_) => Some(self.wrap_cast(exp, need)),
            TypeMatch::None => {
                // Auto-deref: a reference where its pointee is expected.
                let NodeKind::Ref { pvtype, .. } = self.arena.kind(have) else {
                    return None;
                };
                let pvtype = *pvtype;
                match types::type_matches(self.arena, self.type_dcl(pvtype), need) {
                    TypeMatch::Exact => Some(self.wrap_deref(exp, pvtype)),
                    TypeMatch::Coerce(_) => {
                        let deref = self.wrap_deref(exp, pvtype);
                        Some(self.wrap_cast(deref, need))
                    }
                    TypeMatch::None => None,
                }
            }
        }
    }

    pub(crate) fn wrap_cast(&mut self, exp: NodeId, typ: NodeId) -> NodeId {
        let span = self.arena.span(exp);
        let cast = self.arena.alloc(NodeKind::Cast { exp, typ }, span);
        self.arena.set_vtype(cast, typ);
        cast
    }

    fn wrap_deref(&mut self, exp: NodeId, pvtype: NodeId) -> NodeId {
        let span = self.arena.span(exp);
        let deref = self.arena.alloc(NodeKind::Deref { exp }, span);
        self.arena.set_vtype(deref, pvtype);
        deref
    }

    /// Whether an expression may be stored through.
    pub(crate) fn is_mutable_lval(&self, exp: NodeId) -> bool {
        match self.arena.kind(exp) {
            NodeKind::NameUse { dcl: Some(dcl), .. } => match self.arena.kind(*dcl) {
                NodeKind::VarDcl { perm, .. } => perm.is_mutable(),
                NodeKind::FieldDcl { .. } => true,
                _ => false,
            },
            NodeKind::Deref { exp } => match self.arena.kind(self.exp_type_dcl(*exp)) {
                NodeKind::Ref { perm, .. } => perm.is_mutable(),
                NodeKind::Ptr { .. } => true,
                _ => false,
            },
            _ => false,
        }
    }

    /// Permission of the variable an lvalue names, if it names one.
    pub(crate) fn lval_perm(&self, exp: NodeId) -> Option<PermKind> {
        match self.arena.kind(exp) {
            NodeKind::NameUse { dcl: Some(dcl), .. } => match self.arena.kind(*dcl) {
                NodeKind::VarDcl { perm, .. } => Some(*perm),
                _ => None,
            },
            _ => None,
        }
    }

    /// Overload set for a module-level name, if it resolves to functions.
    pub(crate) fn module_overloads(&self, name: oxbow_core::Symbol) -> Option<Vec<NodeId>> {
        match self.arena.kind(self.module) {
            NodeKind::Module { namespace, .. } => namespace.get(name).map(<[NodeId]>::to_vec),
            _ => None,
        }
    }
}
