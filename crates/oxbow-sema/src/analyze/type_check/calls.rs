//! Call checking and method overload resolution.
//!
//! A plain call checks its arguments against the callee's unique signature.
//! When the callee name has overloads, or the call is `obj.name(args)`,
//! resolution scores every candidate and picks the cheapest viable one:
//! a perfect match short-circuits, ties go to the earliest declaration,
//! and candidates that would auto-ref the receiver with an incompatible
//! permission are rejected.

use tracing::trace;

use crate::diagnostics::DiagnosticKind;
use crate::ir::{NodeId, NodeKind};

use super::super::types::{self, TypeMatch};
use super::TypeCheck;

/// Match score for a candidate signature: 0 rejects, 1 is perfect, higher
/// values are viable with conversions. Scores of [`AUTO_REF_COST`] or more
/// mean the receiver must be auto-referenced.
const AUTO_REF_COST: u32 = 100;

impl TypeCheck<'_> {
    pub(crate) fn check_call(&mut self, call: NodeId) -> NodeId {
        let (callee, method, args) = match self.arena.kind(call) {
            NodeKind::FnCall {
                callee,
                method,
                args,
            } => (*callee, *method, args.clone()),
            _ => unreachable!("check_call on non-call"),
        };

        match method {
            Some(name) => self.check_method_call(call, callee, name, args),
            None => self.check_plain_call(call, callee, args),
        }
    }

    /// `obj.name(args)`: prepend the receiver, search the receiver type's
    /// namespace, and rewrite the node into plain-call form.
    fn check_method_call(
        &mut self,
        call: NodeId,
        obj: NodeId,
        name: oxbow_core::Symbol,
        args: Vec<NodeId>,
    ) -> NodeId {
        let obj = self.check_exp(obj);
        let recv = self.exp_type_dcl(obj);

        // Dispatch through a virtual reference trusts the self type.
        let isvref = matches!(self.arena.kind(recv), NodeKind::VirtRef { .. });

        let strukt = match self.arena.kind(recv) {
            NodeKind::Struct { .. } => recv,
            NodeKind::Ref { pvtype, .. }
            | NodeKind::VirtRef { pvtype, .. }
            | NodeKind::ArrayRef { pvtype, .. } => self.type_dcl(*pvtype),
            _ => {
                let msg = format!(
                    "the type of this value has no method {}",
                    self.name_str(name)
                );
                self.diag
                    .error(DiagnosticKind::General, msg, self.arena.span(obj))
                    .emit();
                return call;
            }
        };

        let candidates = match self.arena.kind(strukt) {
            NodeKind::Struct { namespace, .. } => namespace
                .get(name)
                .map(<[NodeId]>::to_vec)
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        let candidates: Vec<NodeId> = candidates
            .into_iter()
            .filter(|&c| matches!(self.arena.kind(c), NodeKind::FnDcl { .. }))
            .collect();
        if candidates.is_empty() {
            let msg = format!(
                "the type of this value has no method {}",
                self.name_str(name)
            );
            self.diag
                .error(DiagnosticKind::General, msg, self.arena.span(call))
                .emit();
            return call;
        }

        let mut full_args = Vec::with_capacity(args.len() + 1);
        full_args.push(obj);
        for arg in args {
            full_args.push(self.check_exp(arg));
        }

        let Some(best) = self.find_best_method(&candidates, &full_args, isvref) else {
            let msg = format!(
                "no method {} matches the call arguments",
                self.name_str(name)
            );
            self.diag
                .error(DiagnosticKind::General, msg, self.arena.span(call))
                .emit();
            return call;
        };
        trace!(method = %best, "overload resolved");

        let sig = self.arena.vtype(best);
        let full_args = self.materialize_call_args(sig, full_args, isvref);

        // Rewrite into resolved plain-call form.
        let span = self.arena.span(call);
        let resolved = self.arena.alloc(
            NodeKind::NameUse {
                name,
                dcl: Some(best),
            },
            span,
        );
        self.arena.set_vtype(resolved, sig);
        if let NodeKind::FnCall {
            callee,
            method,
            args,
        } = &mut self.arena.node_mut(call).kind
        {
            *callee = resolved;
            *method = None;
            *args = full_args;
        }

        let rettype = self.sig_rettype(sig);
        self.arena.set_vtype(call, rettype);
        call
    }

    fn check_plain_call(&mut self, call: NodeId, callee: NodeId, args: Vec<NodeId>) -> NodeId {
        let callee = self.check_exp(callee);
        let mut args: Vec<NodeId> = args.into_iter().map(|a| self.check_exp(a)).collect();

        // A name bound to an overloaded function set resolves by argument
        // types; a unique callee is checked directly.
        let mut target = callee;
        if let NodeKind::NameUse {
            name,
            dcl: Some(dcl),
        } = self.arena.kind(callee).clone()
            && matches!(self.arena.kind(dcl), NodeKind::FnDcl { .. })
            && let Some(overloads) = self.module_overloads(name)
            && overloads.len() > 1
        {
            let Some(best) = self.find_best_method(&overloads, &args, false) else {
                let msg = format!(
                    "no overload of {} matches the call arguments",
                    self.name_str(name)
                );
                self.diag
                    .error(DiagnosticKind::General, msg, self.arena.span(call))
                    .emit();
                return call;
            };
            trace!(function = %best, "overload resolved");
            if let NodeKind::NameUse { dcl, .. } = &mut self.arena.node_mut(callee).kind {
                *dcl = Some(best);
            }
            let sig = self.arena.vtype(best);
            self.arena.set_vtype(callee, sig);
            target = callee;
        }

        let sig = self.exp_type_dcl(target);
        if !matches!(self.arena.kind(sig), NodeKind::FnSig { .. }) {
            self.diag
                .error(
                    DiagnosticKind::BadTerm,
                    "this value is not callable",
                    self.arena.span(callee),
                )
                .emit();
            return call;
        }

        let parms = self.sig_parms(sig);
        if args.len() > parms.len() {
            self.diag
                .error(
                    DiagnosticKind::BadTerm,
                    "too many arguments for this function",
                    self.arena.span(call),
                )
                .emit();
            args.truncate(parms.len());
        }
        // Missing trailing arguments fill from parameter defaults.
        while args.len() < parms.len() {
            let parm = parms[args.len()];
            match self.arena.kind(parm) {
                NodeKind::VarDcl {
                    init: Some(default),
                    ..
                } => args.push(*default),
                _ => {
                    self.diag
                        .error(
                            DiagnosticKind::BadTerm,
                            "not enough arguments for this function",
                            self.arena.span(call),
                        )
                        .emit();
                    break;
                }
            }
        }

        let count = args.len().min(parms.len());
        for i in 0..count {
            let parm_type = self.parm_type(parms[i]);
            args[i] = self.coerce_or_error(
                parm_type,
                args[i],
                "argument's type does not match the parameter's type",
                Some(("parameter declared here", parms[i])),
            );
        }

        if let NodeKind::FnCall {
            callee: cslot,
            args: aslot,
            ..
        } = &mut self.arena.node_mut(call).kind
        {
            *cslot = callee;
            *aslot = args;
        }
        let rettype = self.sig_rettype(sig);
        self.arena.set_vtype(call, rettype);
        call
    }

    /// Pick the best-matching candidate for the call arguments.
    ///
    /// A perfect match wins immediately. Otherwise the lowest conversion
    /// cost wins, and on ties the earliest declaration is kept. Candidates
    /// needing an auto-ref of the receiver are dropped when the receiver's
    /// permission cannot supply the parameter's reference permission.
    pub(crate) fn find_best_method(
        &self,
        candidates: &[NodeId],
        args: &[NodeId],
        isvref: bool,
    ) -> Option<NodeId> {
        let mut best = None;
        let mut best_cost = u32::MAX;

        for &cand in candidates {
            let sig = self.type_dcl(self.arena.vtype(cand));
            match self.fn_sig_match_meth_call(sig, args, isvref) {
                0 => continue,
                1 => return Some(cand),
                cost => {
                    if cost >= AUTO_REF_COST && !self.auto_ref_allowed(sig, args) {
                        continue;
                    }
                    if cost < best_cost {
                        best_cost = cost;
                        best = Some(cand);
                    }
                }
            }
        }
        best
    }

    /// Score one signature against the arguments: 0 reject, 1 perfect,
    /// N > 1 viable at conversion cost N. `isvref` skips the self
    /// parameter's type check for virtual-reference dispatch.
    pub(crate) fn fn_sig_match_meth_call(&self, sig: NodeId, args: &[NodeId], isvref: bool) -> u32 {
        let NodeKind::FnSig { parms, .. } = self.arena.kind(sig) else {
            return 0;
        };
        let parms = parms.clone();

        if args.len() > parms.len() {
            return 0;
        }
        // Parameters beyond the supplied arguments must have defaults.
        for &parm in &parms[args.len()..] {
            if !matches!(
                self.arena.kind(parm),
                NodeKind::VarDcl { init: Some(_), .. }
            ) {
                return 0;
            }
        }

        let mut total = 1u32;
        for (i, &arg) in args.iter().enumerate() {
            if i == 0 && isvref {
                continue;
            }
            let parm_type = self.type_dcl(self.parm_type(parms[i]));
            let arg_type = self.exp_type_dcl(arg);
            match types::type_matches(self.arena, arg_type, parm_type) {
                TypeMatch::Exact => {}
                TypeMatch::Coerce(cost) => total += cost,
                TypeMatch::None => {
                    // The self argument may auto-ref to a reference
                    // parameter over its own type.
                    if i == 0
                        && let NodeKind::Ref { pvtype, .. } = self.arena.kind(parm_type)
                        && types::type_matches(self.arena, arg_type, self.type_dcl(*pvtype))
                            .matched()
                    {
                        total += AUTO_REF_COST;
                        continue;
                    }
                    return 0;
                }
            }
        }
        total
    }

    /// Whether the receiver argument may be auto-referenced with the
    /// permission the self parameter demands.
    fn auto_ref_allowed(&self, sig: NodeId, args: &[NodeId]) -> bool {
        let NodeKind::FnSig { parms, .. } = self.arena.kind(sig) else {
            return false;
        };
        let (Some(&parm), Some(&arg)) = (parms.first(), args.first()) else {
            return false;
        };
        let NodeKind::Ref { perm: need, .. } = self.arena.kind(self.type_dcl(self.parm_type(parm)))
        else {
            return false;
        };
        match self.lval_perm(arg) {
            Some(have) => have.coerces_to(*need),
            None => false,
        }
    }

    /// Insert the conversions the selected signature requires, including
    /// the receiver auto-ref.
    fn materialize_call_args(
        &mut self,
        sig: NodeId,
        mut args: Vec<NodeId>,
        isvref: bool,
    ) -> Vec<NodeId> {
        let sig = self.type_dcl(sig);
        let parms = self.sig_parms(sig);

        // Missing trailing arguments fill from defaults.
        while args.len() < parms.len() {
            let parm = parms[args.len()];
            match self.arena.kind(parm) {
                NodeKind::VarDcl {
                    init: Some(default),
                    ..
                } => args.push(*default),
                _ => break,
            }
        }

        for (i, &parm) in parms.iter().enumerate().take(args.len()) {
            if i == 0 && isvref {
                continue;
            }
            let parm_type = self.parm_type(parm);
            if i == 0 {
                // Auto-ref the receiver when the self parameter wants a
                // reference over the receiver's own type.
                let arg_type = self.exp_type_dcl(args[0]);
                if let NodeKind::Ref { pvtype, .. } = self.arena.kind(self.type_dcl(parm_type))
                    && !matches!(self.arena.kind(arg_type), NodeKind::Ref { .. })
                    && types::type_matches(self.arena, arg_type, self.type_dcl(*pvtype)).matched()
                {
                    args[0] = self.wrap_cast(args[0], self.type_dcl(parm_type));
                    continue;
                }
            }
            args[i] = self.coerce_or_error(
                parm_type,
                args[i],
                "argument's type does not match the parameter's type",
                Some(("parameter declared here", parm)),
            );
        }
        args
    }

    fn sig_parms(&self, sig: NodeId) -> Vec<NodeId> {
        match self.arena.kind(self.type_dcl(sig)) {
            NodeKind::FnSig { parms, .. } => parms.clone(),
            _ => Vec::new(),
        }
    }

    fn sig_rettype(&self, sig: NodeId) -> NodeId {
        match self.arena.kind(self.type_dcl(sig)) {
            NodeKind::FnSig { rettype, .. } => *rettype,
            _ => self.arena.void(),
        }
    }
}
