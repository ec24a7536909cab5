//! Type literal checking: struct, array, and number construction forms.
//!
//! The struct form reorders its arguments into field declaration order,
//! injecting tag discriminants and defaults, enforcing field privacy, and
//! finally coercing each value to its field's type. The array form infers
//! its element type from the first element. The number form is stricter
//! than the numeric cast: its one argument must already be a number.

use crate::diagnostics::DiagnosticKind;
use crate::ir::{NodeArena, NodeFlags, NodeId, NodeKind};

use super::super::types;
use super::TypeCheck;

/// Whether a type literal is a compile-time literal: every argument
/// (looking through named values) is itself a literal. Backends use this to
/// decide whether a global initializer can be emitted as constant data.
pub fn type_lit_is_literal(arena: &NodeArena, lit: NodeId) -> bool {
    let NodeKind::TypeLit { args, .. } = arena.kind(lit) else {
        return false;
    };
    args.iter().all(|&arg| {
        let val = match arena.kind(arg) {
            NodeKind::NamedVal { val, .. } => *val,
            _ => arg,
        };
        match arena.kind(val) {
            NodeKind::ULit { .. } | NodeKind::FLit { .. } => true,
            NodeKind::TypeLit { .. } => type_lit_is_literal(arena, val),
            _ => false,
        }
    })
}

impl TypeCheck<'_> {
    pub(crate) fn check_type_lit(&mut self, lit: NodeId) -> NodeId {
        let (typ, args) = match self.arena.kind(lit) {
            NodeKind::TypeLit { typ, args } => (*typ, args.clone()),
            _ => unreachable!("check_type_lit on non-literal"),
        };

        self.check_type(typ);
        let args: Vec<NodeId> = args.into_iter().map(|a| self.check_exp(a)).collect();
        if let NodeKind::TypeLit { args: slot, .. } = &mut self.arena.node_mut(lit).kind {
            *slot = args;
        }
        self.arena.set_vtype(lit, typ);

        let littype = self.type_dcl(typ);
        if self.arena.has_flag(littype, NodeFlags::TRAIT_TYPE) {
            self.diag
                .error(
                    DiagnosticKind::InvalidType,
                    "type must be concrete and instantiable",
                    self.arena.span(lit),
                )
                .emit();
            return lit;
        }

        match self.arena.kind(littype) {
            NodeKind::Array { .. } => self.check_array_lit(lit, littype),
            NodeKind::Struct { .. } => self.check_struct_lit(lit, littype),
            NodeKind::IntNbr { .. } | NodeKind::UintNbr { .. } | NodeKind::FloatNbr { .. } => {
                self.check_nbr_lit(lit)
            }
            _ => {
                self.diag
                    .error(
                        DiagnosticKind::BadArray,
                        "this type has no literal form",
                        self.arena.span(lit),
                    )
                    .emit();
            }
        }
        lit
    }

    /// Number literal `T[x]`: exactly one argument, which must itself be a
    /// number. Stricter than the numeric cast form, which also accepts
    /// array references.
    fn check_nbr_lit(&mut self, lit: NodeId) {
        let args = match self.arena.kind(lit) {
            NodeKind::TypeLit { args, .. } => args.clone(),
            _ => return,
        };

        if args.len() != 1 {
            self.diag
                .error(
                    DiagnosticKind::BadArray,
                    "number literal requires one value",
                    self.arena.span(lit),
                )
                .emit();
            return;
        }

        let first = args[0];
        if !self.arena.kind(first).is_exp() {
            self.diag
                .error(
                    DiagnosticKind::BadArray,
                    "literal value must be typed",
                    self.arena.span(first),
                )
                .emit();
            return;
        }
        let first_type = self.exp_type_dcl(first);
        if !matches!(
            self.arena.kind(first_type),
            NodeKind::IntNbr { .. } | NodeKind::UintNbr { .. } | NodeKind::FloatNbr { .. }
        ) {
            self.diag
                .error(
                    DiagnosticKind::BadArray,
                    "may only create a number literal from another number",
                    self.arena.span(first),
                )
                .emit();
        }
    }

    /// Array literal: non-empty, element type set from the first element,
    /// every element strictly the same type.
    fn check_array_lit(&mut self, lit: NodeId, littype: NodeId) {
        let args = match self.arena.kind(lit) {
            NodeKind::TypeLit { args, .. } => args.clone(),
            _ => return,
        };

        if args.is_empty() {
            self.diag
                .error(
                    DiagnosticKind::BadArray,
                    "literal list may not be empty",
                    self.arena.span(lit),
                )
                .emit();
            return;
        }

        let first = args[0];
        if !self.arena.kind(first).is_exp() {
            self.diag
                .error(
                    DiagnosticKind::BadArray,
                    "array literal element must be a typed value",
                    self.arena.span(first),
                )
                .emit();
            return;
        }
        let first_type = self.arena.vtype(first);
        if let NodeKind::Array { elem, .. } = &mut self.arena.node_mut(littype).kind {
            *elem = first_type;
        }

        for &arg in &args {
            if !types::type_is_same(self.arena, self.arena.vtype(arg), first_type) {
                self.diag
                    .error(
                        DiagnosticKind::BadArray,
                        "inconsistent type of array literal value",
                        self.arena.span(arg),
                    )
                    .emit();
            }
        }
    }

    fn check_struct_lit(&mut self, lit: NodeId, strukt: NodeId) {
        let private = self.typenode == Some(strukt);
        self.struct_lit_reorder(lit, strukt, private);

        // Element-wise: each argument coerces to its field's type.
        let fields = match self.arena.kind(strukt) {
            NodeKind::Struct { fields, .. } => fields.clone(),
            _ => return,
        };
        let args = match self.arena.kind(lit) {
            NodeKind::TypeLit { args, .. } => args.clone(),
            _ => return,
        };

        for (argi, &field) in fields.iter().enumerate() {
            let Some(&arg) = args.get(argi) else { break };
            let field_type = self.arena.vtype(field);

            // Coerce through a named-value wrapper without disturbing it.
            if let NodeKind::NamedVal { val, .. } = self.arena.kind(arg) {
                let val = *val;
                let val = self.coerce_or_error(
                    field_type,
                    val,
                    "literal value's type does not match expected field's type",
                    None,
                );
                if let NodeKind::NamedVal { val: slot, .. } = &mut self.arena.node_mut(arg).kind {
                    *slot = val;
                }
                self.arena.set_vtype(arg, field_type);
            } else {
                let coerced = self.coerce_or_error(
                    field_type,
                    arg,
                    "literal value's type does not match expected field's type",
                    None,
                );
                if let NodeKind::TypeLit { args: slot, .. } = &mut self.arena.node_mut(lit).kind {
                    slot[argi] = coerced;
                }
            }
        }
    }

    /// Reorder the literal's values into field declaration order.
    ///
    /// Walks the declared fields with a cursor into the argument vector:
    /// tag fields inject the struct's discriminant, named values are swapped
    /// into their field's position, missing values fall back to field
    /// defaults, and private (`_`-prefixed) fields may only be supplied
    /// from the defining type's own methods.
    fn struct_lit_reorder(&mut self, lit: NodeId, strukt: NodeId, private: bool) {
        let (fields, tagnbr) = match self.arena.kind(strukt) {
            NodeKind::Struct { fields, tagnbr, .. } => (fields.clone(), *tagnbr),
            _ => return,
        };
        let mut args = match self.arena.kind(lit) {
            NodeKind::TypeLit { args, .. } => args.clone(),
            _ => return,
        };

        let mut argi = 0usize;
        for &field in &fields {
            let (field_name, field_type, default) = match self.arena.kind(field) {
                NodeKind::FieldDcl { name, typ, default } => (*name, *typ, *default),
                _ => continue,
            };

            // A discriminated tag field gets the struct's tag number.
            if self.arena.has_flag(field, NodeFlags::IS_TAG_FIELD) {
                let tag = self
                    .arena
                    .alloc(NodeKind::ULit { val: u64::from(tagnbr) }, self.arena.span(lit));
                self.arena.set_vtype(tag, field_type);
                args.insert(argi, tag);
                argi += 1;
                continue;
            }

            if argi < args.len() {
                // A value is present; align named values with this field.
                if let NodeKind::NamedVal { name, .. } = self.arena.kind(args[argi])
                    && *name != field_name
                {
                    if let Some(j) = self.find_named_arg(&args, argi, field_name) {
                        let moved = args.remove(j);
                        args.insert(argi, moved);
                    } else if let Some(default) = default {
                        args.insert(argi, default);
                    } else {
                        let msg = format!(
                            "cannot find a named value matching the field {}",
                            self.name_str(field_name)
                        );
                        self.diag
                            .error(DiagnosticKind::BadArray, msg, self.arena.span(lit))
                            .emit();
                        argi += 1;
                        continue;
                    }
                }

                if !private && self.name_str(field_name).starts_with('_') {
                    let msg = format!(
                        "only a method of the type may give a value to the private field {}",
                        self.name_str(field_name)
                    );
                    self.diag
                        .error(DiagnosticKind::NotTyped, msg, self.arena.span(args[argi]))
                        .emit();
                }
            } else if let Some(default) = default {
                args.push(default);
            } else {
                self.diag
                    .error(
                        DiagnosticKind::BadArray,
                        "not enough values specified on type literal",
                        self.arena.span(lit),
                    )
                    .emit();
                // Pad with typed zero values so checking can continue.
                for &rest in &fields[fields.iter().position(|&f| f == field).unwrap_or(0)..] {
                    let rest_type = self.arena.vtype(rest);
                    let pad = self
                        .arena
                        .alloc(NodeKind::ULit { val: 0 }, self.arena.span(lit));
                    self.arena.set_vtype(pad, rest_type);
                    args.push(pad);
                }
                if let NodeKind::TypeLit { args: slot, .. } = &mut self.arena.node_mut(lit).kind {
                    *slot = args;
                }
                return;
            }
            argi += 1;
        }

        if argi < args.len() {
            self.diag
                .error(
                    DiagnosticKind::BadArray,
                    "too many values specified on type literal",
                    self.arena.span(lit),
                )
                .emit();
        }

        if let NodeKind::TypeLit { args: slot, .. } = &mut self.arena.node_mut(lit).kind {
            *slot = args;
        }
    }

    /// Find a named value for `field_name` at or after `from`.
    fn find_named_arg(
        &self,
        args: &[NodeId],
        from: usize,
        field_name: oxbow_core::Symbol,
    ) -> Option<usize> {
        args[from..].iter().position(|&arg| {
            matches!(
                self.arena.kind(arg),
                NodeKind::NamedVal { name, .. } if *name == field_name
            )
        })
        .map(|offset| from + offset)
    }
}
