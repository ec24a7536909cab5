//! Statement and expression checking rules.

use crate::diagnostics::DiagnosticKind;
use crate::ir::{NodeFlags, NodeId, NodeKind};

use super::super::types;
use super::TypeCheck;

impl TypeCheck<'_> {
    /// Check a statement, returning its (possibly rewritten) handle.
    pub(crate) fn check_stmt(&mut self, stmt: NodeId) -> NodeId {
        match self.arena.kind(stmt) {
            NodeKind::Return { .. } | NodeKind::BlockRet { .. } => self.check_return(stmt),
            NodeKind::Break { .. } => self.check_break(stmt),
            NodeKind::Continue => {
                if self.loops.is_empty() {
                    self.diag
                        .error(
                            DiagnosticKind::BadTerm,
                            "continue may only be used inside a loop",
                            self.arena.span(stmt),
                        )
                        .emit();
                }
                stmt
            }
            NodeKind::VarDcl { .. } => self.check_var_dcl(stmt),
            NodeKind::FnDcl { .. } | NodeKind::Struct { .. } => {
                self.diag
                    .error(
                        DiagnosticKind::BadTerm,
                        "declarations are not allowed inside function bodies",
                        self.arena.span(stmt),
                    )
                    .emit();
                stmt
            }
            _ => self.check_exp(stmt),
        }
    }

    /// Check an expression, assigning its value type. Returns the handle
    /// unchanged; coercion wrappers are inserted by the caller's slot.
    pub(crate) fn check_exp(&mut self, exp: NodeId) -> NodeId {
        match self.arena.kind(exp).clone() {
            // Literal vtypes are set at construction.
            NodeKind::ULit { .. } | NodeKind::FLit { .. } => exp,

            NodeKind::NameUse { dcl, .. } => {
                if let Some(dcl) = dcl {
                    match self.arena.kind(dcl) {
                        NodeKind::VarDcl { .. }
                        | NodeKind::FnDcl { .. }
                        | NodeKind::FieldDcl { .. } => {
                            let vtype = self.arena.vtype(dcl);
                            self.arena.set_vtype(exp, vtype);
                        }
                        _ => {
                            self.diag
                                .error(
                                    DiagnosticKind::BadTerm,
                                    "a type cannot be used as a value here",
                                    self.arena.span(exp),
                                )
                                .emit();
                        }
                    }
                }
                exp
            }

            NodeKind::NamedVal { val, .. } => {
                let val = self.check_exp(val);
                let vtype = self.arena.vtype(val);
                if let NodeKind::NamedVal { val: slot, .. } = &mut self.arena.node_mut(exp).kind {
                    *slot = val;
                }
                self.arena.set_vtype(exp, vtype);
                exp
            }

            NodeKind::VTuple { values } => {
                let mut checked = Vec::with_capacity(values.len());
                let mut vtypes = Vec::with_capacity(values.len());
                for v in values {
                    let v = self.check_exp(v);
                    vtypes.push(self.arena.vtype(v));
                    checked.push(v);
                }
                let span = self.arena.span(exp);
                let ttuple = self.arena.alloc(NodeKind::TTuple { types: vtypes }, span);
                if let NodeKind::VTuple { values: slot } = &mut self.arena.node_mut(exp).kind {
                    *slot = checked;
                }
                self.arena.set_vtype(exp, ttuple);
                exp
            }

            NodeKind::Assign { lval, rval } => self.check_assign(exp, lval, rval),
            NodeKind::FnCall { .. } => self.check_call(exp),
            NodeKind::TypeLit { .. } => self.check_type_lit(exp),
            NodeKind::Cast { exp: inner, typ } => self.check_cast(exp, inner, typ),
            NodeKind::Is { exp: inner, typ } => self.check_is(exp, inner, typ),
            NodeKind::Deref { exp: inner } => self.check_deref(exp, inner),

            NodeKind::LogicNot { exp: inner } => {
                let inner = self.check_bool_operand(inner);
                if let NodeKind::LogicNot { exp: slot } = &mut self.arena.node_mut(exp).kind {
                    *slot = inner;
                }
                let bool_type = self.arena.builtins().bool;
                self.arena.set_vtype(exp, bool_type);
                exp
            }
            NodeKind::LogicAnd { lhs, rhs } | NodeKind::LogicOr { lhs, rhs } => {
                let lhs = self.check_bool_operand(lhs);
                let rhs = self.check_bool_operand(rhs);
                match &mut self.arena.node_mut(exp).kind {
                    NodeKind::LogicAnd {
                        lhs: lslot,
                        rhs: rslot,
                    }
                    | NodeKind::LogicOr {
                        lhs: lslot,
                        rhs: rslot,
                    } => {
                        *lslot = lhs;
                        *rslot = rhs;
                    }
                    _ => unreachable!(),
                }
                let bool_type = self.arena.builtins().bool;
                self.arena.set_vtype(exp, bool_type);
                exp
            }

            NodeKind::Block { .. } => self.check_block(exp),
            NodeKind::If { .. } => self.check_if(exp),
            NodeKind::Loop { .. } => self.check_loop(exp),
            NodeKind::VarDcl { .. } => self.check_var_dcl(exp),

            // Statements arriving through a value slot diverge; check them
            // as statements.
            NodeKind::Return { .. }
            | NodeKind::BlockRet { .. }
            | NodeKind::Break { .. }
            | NodeKind::Continue => self.check_stmt(exp),

            // An unknown kind in a dispatch is structural breakage, never
            // silent behavior.
            _ => {
                let msg = format!(
                    "cannot type check a {} node as an expression",
                    self.arena.kind(exp).tag_name()
                );
                self.diag
                    .fatal(DiagnosticKind::General, msg, self.arena.span(exp))
                    .emit();
                exp
            }
        }
    }

    fn check_bool_operand(&mut self, operand: NodeId) -> NodeId {
        let operand = self.check_exp(operand);
        let bool_type = self.arena.builtins().bool;
        self.coerce_or_error(
            bool_type,
            operand,
            "conditional expression must be coercible to a boolean value",
            None,
        )
    }

    fn check_assign(&mut self, assign: NodeId, lval: NodeId, rval: NodeId) -> NodeId {
        let lval = self.check_exp(lval);
        if !self.is_mutable_lval(lval) {
            self.diag
                .error(
                    DiagnosticKind::BadTerm,
                    "left side of assignment is not a mutable lvalue",
                    self.arena.span(lval),
                )
                .emit();
        }
        let target = self.arena.vtype(lval);
        let rval = self.check_exp(rval);
        let rval = self.coerce_or_error(
            target,
            rval,
            "assigned value's type does not match the target's type",
            None,
        );

        if let NodeKind::Assign {
            lval: lslot,
            rval: rslot,
        } = &mut self.arena.node_mut(assign).kind
        {
            *lslot = lval;
            *rslot = rval;
        }
        self.arena.set_vtype(assign, target);
        assign
    }

    /// Block: each statement checked in order; the block's value is the
    /// value of its last statement (or void).
    pub(crate) fn check_block(&mut self, block: NodeId) -> NodeId {
        let stmts = match self.arena.kind(block) {
            NodeKind::Block { stmts } => stmts.clone(),
            _ => unreachable!("check_block on non-block"),
        };

        let mut checked = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            checked.push(self.check_stmt(stmt));
        }

        let vtype = checked
            .last()
            .filter(|&&last| self.arena.kind(last).is_exp())
            .map(|&last| self.arena.vtype(last))
            .unwrap_or_else(|| self.arena.void());

        if let NodeKind::Block { stmts: slot } = &mut self.arena.node_mut(block).kind {
            *slot = checked;
        }
        self.arena.set_vtype(block, vtype);
        block
    }

    /// Check a conditional. Every condition must be boolean; a void
    /// condition (the `else` encoding) must come last. If every branch
    /// produces a value and the types unify, the whole `if` gets that value
    /// type so it can be used in expression position.
    fn check_if(&mut self, if_id: NodeId) -> NodeId {
        let mut branches = match self.arena.kind(if_id) {
            NodeKind::If { branches } => branches.clone(),
            _ => unreachable!("check_if on non-if"),
        };
        let void = self.arena.void();
        let count = branches.len();

        for i in 0..count {
            let (cond, block) = branches[i];
            if cond != void {
                let cond = self.check_bool_operand(cond);
                branches[i].0 = cond;
            } else if i + 1 != count {
                let next_span = self.arena.span(branches[i + 1].1);
                self.diag
                    .error(
                        DiagnosticKind::InvalidType,
                        "the branch that matches everything must come last",
                        next_span,
                    )
                    .emit();
            }
            let block = self.check_exp(block);
            branches[i].1 = block;
        }

        let has_else = branches.last().is_some_and(|&(cond, _)| cond == void);
        let arm_types: Vec<NodeId> = branches
            .iter()
            .map(|&(_, block)| self.arena.vtype(block))
            .collect();

        if let NodeKind::If { branches: slot } = &mut self.arena.node_mut(if_id).kind {
            *slot = branches.clone();
        }

        // Infer a value type when the if is usable as an expression.
        if has_else
            && !arm_types
                .iter()
                .any(|&t| matches!(self.arena.kind(self.type_dcl(t)), NodeKind::Void))
            && let Some(unified) = self.unify_types(&arm_types)
        {
            for &(_, block) in &branches {
                self.block_coerce_value(
                    block,
                    unified,
                    "expression type does not match expected type",
                );
            }
            self.arena.set_vtype(if_id, unified);
        }

        if_id
    }

    fn check_loop(&mut self, loop_id: NodeId) -> NodeId {
        let body = match self.arena.kind(loop_id) {
            NodeKind::Loop { body, .. } => *body,
            _ => unreachable!("check_loop on non-loop"),
        };

        // Breaks re-collect on every check.
        if let NodeKind::Loop { breaks, .. } = &mut self.arena.node_mut(loop_id).kind {
            breaks.clear();
        }

        self.loops.push(loop_id);
        let body = self.check_exp(body);
        self.loops.pop();
        if let NodeKind::Loop { body: slot, .. } = &mut self.arena.node_mut(loop_id).kind {
            *slot = body;
        }

        // The loop's value is the least upper bound of its break values.
        let breaks = match self.arena.kind(loop_id) {
            NodeKind::Loop { breaks, .. } => breaks.clone(),
            _ => unreachable!(),
        };
        let mut break_types = Vec::with_capacity(breaks.len());
        for &brk in &breaks {
            match self.arena.kind(brk) {
                NodeKind::Break { exp: Some(exp) } => break_types.push(self.arena.vtype(*exp)),
                _ => return loop_id, // a value-less break keeps the loop void
            }
        }
        if !break_types.is_empty()
            && let Some(unified) = self.unify_types(&break_types)
        {
            for &brk in &breaks {
                let NodeKind::Break { exp: Some(exp) } = self.arena.kind(brk) else {
                    continue;
                };
                let exp = *exp;
                if let Some(coerced) = self.try_coerce(unified, exp)
                    && let NodeKind::Break { exp: slot } = &mut self.arena.node_mut(brk).kind
                {
                    *slot = Some(coerced);
                }
            }
            self.arena.set_vtype(loop_id, unified);
        }
        loop_id
    }

    fn check_break(&mut self, brk: NodeId) -> NodeId {
        let Some(&loop_id) = self.loops.last() else {
            self.diag
                .error(
                    DiagnosticKind::BadTerm,
                    "break may only be used inside a loop",
                    self.arena.span(brk),
                )
                .emit();
            return brk;
        };

        if let NodeKind::Break { exp: Some(exp) } = self.arena.kind(brk) {
            let exp = *exp;
            let exp = self.check_exp(exp);
            if let NodeKind::Break { exp: slot } = &mut self.arena.node_mut(brk).kind {
                *slot = Some(exp);
            }
        }

        if let NodeKind::Loop { breaks, .. } = &mut self.arena.node_mut(loop_id).kind {
            breaks.push(brk);
        }
        brk
    }

    /// Check `return` (and `blockret`) against the enclosing signature.
    fn check_return(&mut self, ret: NodeId) -> NodeId {
        let exp = match self.arena.kind(ret) {
            NodeKind::Return { exp, .. } | NodeKind::BlockRet { exp, .. } => *exp,
            _ => unreachable!("check_return on non-return"),
        };

        let Some(sig) = self.fnsig else {
            self.diag
                .error(
                    DiagnosticKind::BadTerm,
                    "return may only be used inside a function",
                    self.arena.span(ret),
                )
                .emit();
            return ret;
        };
        let rettype = match self.arena.kind(sig) {
            NodeKind::FnSig { rettype, .. } => *rettype,
            _ => return ret,
        };
        let ret_dcl = self.type_dcl(rettype);

        let Some(exp) = exp else {
            if !matches!(self.arena.kind(ret_dcl), NodeKind::Void) {
                self.diag
                    .error(
                        DiagnosticKind::InvalidType,
                        "this function requires a return value",
                        self.arena.span(ret),
                    )
                    .emit();
            }
            return ret;
        };

        // The outer return now owns the value of every branch: strip
        // redundant terminal returns inside a returned `if`.
        if matches!(self.arena.kind(exp), NodeKind::If { .. }) {
            self.if_remove_returns(exp);
        }

        if let NodeKind::TTuple { types } = self.arena.kind(ret_dcl).clone() {
            self.check_tuple_return(exp, rettype, &types);
            return ret;
        }

        let exp = self.check_exp(exp);
        let exp = self.coerce_or_error(
            rettype,
            exp,
            "return expression type does not match return type on function",
            Some(("this is the declared function's return type", rettype)),
        );
        match &mut self.arena.node_mut(ret).kind {
            NodeKind::Return { exp: slot, .. } | NodeKind::BlockRet { exp: slot, .. } => {
                *slot = Some(exp);
            }
            _ => unreachable!(),
        }
        ret
    }

    /// Multi-value return: the expression must be a value tuple of exactly
    /// the declared arity, checked element-wise.
    fn check_tuple_return(&mut self, exp: NodeId, rettype: NodeId, types: &[NodeId]) {
        let values = match self.arena.kind(exp) {
            NodeKind::VTuple { values } => values.clone(),
            _ => {
                self.diag
                    .error(
                        DiagnosticKind::BadTerm,
                        "not enough return values",
                        self.arena.span(exp),
                    )
                    .emit();
                return;
            }
        };

        if values.len() < types.len() {
            self.diag
                .error(
                    DiagnosticKind::BadTerm,
                    "not enough return values",
                    self.arena.span(exp),
                )
                .emit();
            return;
        }
        if values.len() > types.len() {
            self.diag
                .error(
                    DiagnosticKind::BadTerm,
                    "too many return values",
                    self.arena.span(exp),
                )
                .emit();
            return;
        }

        let mut checked = Vec::with_capacity(values.len());
        for (&typ, value) in types.iter().zip(values) {
            let value = self.check_exp(value);
            let value = self.coerce_or_error(
                typ,
                value,
                "return value's type does not match fn return type",
                None,
            );
            checked.push(value);
        }
        if let NodeKind::VTuple { values: slot } = &mut self.arena.node_mut(exp).kind {
            *slot = checked;
        }
        // The tuple takes its type from the declared return types.
        self.arena.set_vtype(exp, rettype);
    }

    /// Recursively strip terminal `return`s out of every branch of an `if`
    /// whose value is being returned by an outer `return`.
    pub(crate) fn if_remove_returns(&mut self, if_id: NodeId) {
        let branches = match self.arena.kind(if_id) {
            NodeKind::If { branches } => branches.clone(),
            _ => return,
        };

        for (_, block) in branches {
            let Some(&last) = (match self.arena.kind(block) {
                NodeKind::Block { stmts } => stmts.last(),
                _ => None,
            }) else {
                continue;
            };

            let mut new_last = last;
            if let NodeKind::Return { exp: Some(exp), .. } = self.arena.kind(last) {
                new_last = *exp;
                if let NodeKind::Block { stmts } = &mut self.arena.node_mut(block).kind {
                    *stmts.last_mut().expect("non-empty checked above") = new_last;
                }
            }
            if matches!(self.arena.kind(new_last), NodeKind::If { .. }) {
                self.if_remove_returns(new_last);
            }
        }
    }

    /// Coerce every arm of an `if` used in expression position.
    pub(crate) fn if_coerce_arms(&mut self, if_id: NodeId, target: NodeId, msg: &str) {
        let branches = match self.arena.kind(if_id) {
            NodeKind::If { branches } => branches.clone(),
            _ => return,
        };
        let void = self.arena.void();

        let has_else = branches.last().is_some_and(|&(cond, _)| cond == void);
        if !has_else {
            self.diag
                .error(
                    DiagnosticKind::InvalidType,
                    "an if used as an expression requires an else branch",
                    self.arena.span(if_id),
                )
                .emit();
        }

        for (_, block) in branches {
            self.block_coerce_value(block, target, msg);
        }
        self.arena.set_vtype(if_id, target);
    }

    /// Coerce every `break` value of a loop used in expression position.
    pub(crate) fn loop_coerce_breaks(&mut self, loop_id: NodeId, target: NodeId, msg: &str) {
        let breaks = match self.arena.kind(loop_id) {
            NodeKind::Loop { breaks, .. } => breaks.clone(),
            _ => return,
        };

        for brk in breaks {
            let NodeKind::Break { exp: Some(exp) } = self.arena.kind(brk) else {
                self.diag
                    .error(
                        DiagnosticKind::InvalidType,
                        "a loop used as an expression requires every break to carry a value",
                        self.arena.span(brk),
                    )
                    .emit();
                continue;
            };
            let exp = *exp;
            let exp = self.coerce_or_error(target, exp, msg, None);
            if let NodeKind::Break { exp: slot } = &mut self.arena.node_mut(brk).kind {
                *slot = Some(exp);
            }
        }
        self.arena.set_vtype(loop_id, target);
    }

    /// Coerce the value position (last statement) of a checked block.
    pub(crate) fn block_coerce_value(&mut self, block: NodeId, target: NodeId, msg: &str) {
        let stmts = match self.arena.kind(block) {
            NodeKind::Block { stmts } => stmts.clone(),
            _ => return,
        };

        match stmts.last() {
            None => {
                self.diag
                    .error(DiagnosticKind::InvalidType, msg, self.arena.span(block))
                    .emit();
            }
            Some(&last) => {
                // A diverging tail (return, break, continue) satisfies any
                // expected type.
                if matches!(
                    self.arena.kind(last),
                    NodeKind::Return { .. }
                        | NodeKind::BlockRet { .. }
                        | NodeKind::Break { .. }
                        | NodeKind::Continue
                ) {
                    self.arena.set_vtype(block, target);
                    return;
                }
                if !self.arena.kind(last).is_exp() {
                    self.diag
                        .error(DiagnosticKind::InvalidType, msg, self.arena.span(last))
                        .emit();
                    return;
                }
                let coerced = self.coerce_or_error(target, last, msg, None);
                if let NodeKind::Block { stmts: slot } = &mut self.arena.node_mut(block).kind {
                    *slot.last_mut().expect("non-empty checked above") = coerced;
                }
            }
        }
        self.arena.set_vtype(block, target);
    }

    /// Least upper bound: the first candidate every type coerces to.
    pub(crate) fn unify_types(&self, candidates: &[NodeId]) -> Option<NodeId> {
        for &cand in candidates {
            if candidates
                .iter()
                .all(|&t| types::type_matches(self.arena, t, cand).matched())
            {
                return Some(cand);
            }
        }
        None
    }

    fn check_deref(&mut self, deref: NodeId, inner: NodeId) -> NodeId {
        let inner = self.check_exp(inner);
        let ptype = self.exp_type_dcl(inner);
        let pvtype = match self.arena.kind(ptype) {
            NodeKind::Ref { pvtype, .. } | NodeKind::Ptr { pvtype } => *pvtype,
            _ => {
                self.diag
                    .error(
                        DiagnosticKind::NotPointer,
                        "may only de-reference a simple reference or pointer",
                        self.arena.span(deref),
                    )
                    .emit();
                self.arena.void()
            }
        };
        if let NodeKind::Deref { exp: slot } = &mut self.arena.node_mut(deref).kind {
            *slot = inner;
        }
        self.arena.set_vtype(deref, pvtype);
        deref
    }

    /// Validate a conversion cast against the permitted-conversion table.
    fn check_cast(&mut self, cast: NodeId, inner: NodeId, typ: NodeId) -> NodeId {
        self.check_type(typ);
        let inner = self.check_exp(inner);
        if let NodeKind::Cast { exp: slot, .. } = &mut self.arena.node_mut(cast).kind {
            *slot = inner;
        }
        self.arena.set_vtype(cast, typ);

        let totype = self.type_dcl(typ);
        let fromtype = self.exp_type_dcl(inner);

        // Reinterpret casts must be between same-sized categories; struct
        // targets are governed by the SAME_SIZE flag instead.
        if self.arena.has_flag(cast, NodeFlags::AS_IF) {
            if !matches!(self.arena.kind(totype), NodeKind::Struct { .. }) {
                let tosize = types::cast_bit_size(self.arena, totype);
                if tosize == 0 || tosize != types::cast_bit_size(self.arena, fromtype) {
                    self.diag
                        .error(
                            DiagnosticKind::InvalidType,
                            "may only reinterpret a value to the same sized primitive type",
                            self.arena.span(inner),
                        )
                        .emit();
                }
            }
            return cast;
        }

        if totype == self.arena.builtins().bool {
            if !matches!(
                self.arena.kind(fromtype),
                NodeKind::UintNbr { .. }
                    | NodeKind::IntNbr { .. }
                    | NodeKind::FloatNbr { .. }
                    | NodeKind::Ref { .. }
                    | NodeKind::Ptr { .. }
            ) {
                self.diag
                    .error(
                        DiagnosticKind::InvalidType,
                        "only numbers and ref/ptr may convert to bool",
                        self.arena.span(inner),
                    )
                    .emit();
            }
            return cast;
        }

        let from_kind = self.arena.kind(fromtype);
        let allowed = match self.arena.kind(totype) {
            NodeKind::UintNbr { .. } => matches!(
                from_kind,
                // An array reference converts to uint (its length).
                NodeKind::ArrayRef { .. }
                    | NodeKind::UintNbr { .. }
                    | NodeKind::IntNbr { .. }
                    | NodeKind::FloatNbr { .. }
            ),
            NodeKind::IntNbr { .. } | NodeKind::FloatNbr { .. } => matches!(
                from_kind,
                NodeKind::UintNbr { .. } | NodeKind::IntNbr { .. } | NodeKind::FloatNbr { .. }
            ),
            NodeKind::Ref { .. } => matches!(
                from_kind,
                NodeKind::VirtRef { .. } | NodeKind::Ref { .. } | NodeKind::Ptr { .. }
            ),
            NodeKind::Ptr { .. } => {
                matches!(from_kind, NodeKind::Ref { .. } | NodeKind::Ptr { .. })
            }
            NodeKind::VirtRef { pvtype, .. } => match from_kind {
                NodeKind::VirtRef { .. } => true,
                NodeKind::Ref {
                    pvtype: from_pv, ..
                } => {
                    let concrete = self.type_dcl(*from_pv);
                    let wanted = self.type_dcl(*pvtype);
                    types::struct_implements(self.arena, concrete, wanted)
                }
                _ => false,
            },
            NodeKind::Struct { .. } => {
                matches!(from_kind, NodeKind::Struct { .. })
                    && self.arena.has_flag(fromtype, NodeFlags::SAME_SIZE)
            }
            _ => false,
        };

        if !allowed {
            self.diag
                .error(
                    DiagnosticKind::InvalidType,
                    "unsupported built-in type conversion",
                    self.arena.span(typ),
                )
                .emit();
        }
        cast
    }

    /// Validate a runtime type test (`is`), which produces bool.
    fn check_is(&mut self, is_id: NodeId, inner: NodeId, typ: NodeId) -> NodeId {
        let inner = self.check_exp(inner);
        self.check_type(typ);
        if let NodeKind::Is { exp: slot, .. } = &mut self.arena.node_mut(is_id).kind {
            *slot = inner;
        }
        let bool_type = self.arena.builtins().bool;
        self.arena.set_vtype(is_id, bool_type);

        if !self.arena.kind(inner).is_exp() {
            self.diag
                .error(
                    DiagnosticKind::InvalidType,
                    "'is' requires a typed expression to the left",
                    self.arena.span(inner),
                )
                .emit();
            return is_id;
        }
        let totype = self.type_dcl(typ);
        if !self.arena.kind(totype).is_type() {
            self.diag
                .error(
                    DiagnosticKind::InvalidType,
                    "'is' requires a type to the right",
                    self.arena.span(typ),
                )
                .emit();
            return is_id;
        }
        let fromtype = self.exp_type_dcl(inner);

        // Specialization check of a virtual reference against a concrete
        // reference type.
        if let NodeKind::VirtRef {
            pvtype: from_pv, ..
        } = self.arena.kind(fromtype)
        {
            let trait_type = self.type_dcl(*from_pv);
            if let NodeKind::Ref { pvtype: to_pv, .. } = self.arena.kind(totype) {
                let target = self.type_dcl(*to_pv);
                if types::virt_ref_specializes(self.arena, trait_type, target) {
                    return is_id;
                }
            }
            self.diag
                .error(
                    DiagnosticKind::InvalidType,
                    "types are not compatible for this specialization",
                    self.arena.span(is_id),
                )
                .emit();
            return is_id;
        }

        // The tested type must be reachable from the value's type.
        if !self.is_reachable(fromtype, totype) {
            self.diag
                .error(
                    DiagnosticKind::InvalidType,
                    "types are not compatible for this specialization",
                    self.arena.span(is_id),
                )
                .emit();
            return is_id;
        }

        // There must be a runtime mechanism for the check: a tag field on a
        // non-trait base struct.
        let mut base = totype;
        if let NodeKind::Ref { pvtype, .. } = self.arena.kind(base) {
            base = self.type_dcl(*pvtype);
        }
        if !matches!(self.arena.kind(base), NodeKind::Struct { .. })
            || self.arena.has_flag(base, NodeFlags::TRAIT_TYPE)
            || !self.arena.has_flag(base, NodeFlags::HAS_TAG_FIELD)
        {
            self.diag
                .error(
                    DiagnosticKind::InvalidType,
                    "no mechanism exists to check this specialization",
                    self.arena.span(is_id),
                )
                .emit();
        }
        is_id
    }

    /// Whether a runtime test from `have` to `need` can succeed: identical
    /// types, or a concrete struct implementing the source trait (looking
    /// through one level of references on both sides).
    fn is_reachable(&self, have: NodeId, need: NodeId) -> bool {
        let (have, need) = match (self.arena.kind(have), self.arena.kind(need)) {
            (NodeKind::Ref { pvtype: ph, .. }, NodeKind::Ref { pvtype: pn, .. }) => {
                (self.type_dcl(*ph), self.type_dcl(*pn))
            }
            _ => (have, need),
        };
        if types::type_is_same(self.arena, have, need) {
            return true;
        }
        matches!(
            (self.arena.kind(have), self.arena.kind(need)),
            (NodeKind::Struct { .. }, NodeKind::Struct { .. })
        ) && types::struct_implements(self.arena, need, have)
    }
}
