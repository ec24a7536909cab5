//! IR construction helpers: the parser-facing contract.
//!
//! The parser (an external collaborator) produces a `Module`-rooted tree
//! through this builder: every name use unresolved, every expression's
//! vtype at the void sentinel, every node stamped with the current span
//! cursor. Tests build their input trees the same way.

use oxbow_core::{Interner, Span, Symbol};

use super::arena::{NodeArena, NodeId};
use super::flags::NodeFlags;
use super::namespace::Namespace;
use super::node::{NodeKind, PermKind};

/// Builder over the arena with a current-span cursor.
///
/// Set the cursor with [`IrBuilder::at`] before allocating; synthesized
/// nodes (defaults, injected tags) keep the zero span.
pub struct IrBuilder<'a> {
    arena: &'a mut NodeArena,
    interner: &'a mut Interner,
    span: Span,
}

impl<'a> IrBuilder<'a> {
    pub fn new(arena: &'a mut NodeArena, interner: &'a mut Interner) -> Self {
        Self {
            arena,
            interner,
            span: Span::synthesized(),
        }
    }

    /// Set the span stamped on subsequently allocated nodes.
    pub fn at(&mut self, span: Span) -> &mut Self {
        self.span = span;
        self
    }

    pub fn name(&mut self, s: &str) -> Symbol {
        self.interner.intern(s)
    }

    pub fn arena(&mut self) -> &mut NodeArena {
        self.arena
    }

    pub fn builtin_void(&self) -> NodeId {
        self.arena.builtins().void
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        self.arena.alloc(kind, self.span)
    }

    // ---- literals and uses ----

    /// Unsigned literal of the given numeric type.
    pub fn ulit(&mut self, val: u64, typ: NodeId) -> NodeId {
        let id = self.alloc(NodeKind::ULit { val });
        self.arena.set_vtype(id, typ);
        id
    }

    /// Float literal of the given numeric type.
    pub fn flit(&mut self, val: f64, typ: NodeId) -> NodeId {
        let id = self.alloc(NodeKind::FLit { val });
        self.arena.set_vtype(id, typ);
        id
    }

    pub fn name_use(&mut self, name: Symbol) -> NodeId {
        self.alloc(NodeKind::NameUse { name, dcl: None })
    }

    /// Convenience: intern and use in one step.
    pub fn use_of(&mut self, name: &str) -> NodeId {
        let sym = self.name(name);
        self.name_use(sym)
    }

    pub fn named_val(&mut self, name: Symbol, val: NodeId) -> NodeId {
        self.alloc(NodeKind::NamedVal { name, val })
    }

    // ---- expressions ----

    pub fn vtuple(&mut self, values: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::VTuple { values })
    }

    pub fn assign(&mut self, lval: NodeId, rval: NodeId) -> NodeId {
        self.alloc(NodeKind::Assign { lval, rval })
    }

    pub fn fn_call(&mut self, callee: NodeId, args: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::FnCall {
            callee,
            method: None,
            args,
        })
    }

    /// `obj.method(args)`; resolution rewrites this into plain-call form.
    pub fn method_call(&mut self, obj: NodeId, method: Symbol, args: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::FnCall {
            callee: obj,
            method: Some(method),
            args,
        })
    }

    pub fn type_lit(&mut self, typ: NodeId, args: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::TypeLit { typ, args })
    }

    pub fn cast(&mut self, exp: NodeId, typ: NodeId) -> NodeId {
        self.alloc(NodeKind::Cast { exp, typ })
    }

    /// Bitwise reinterpretation between same-sized types.
    pub fn reinterpret_cast(&mut self, exp: NodeId, typ: NodeId) -> NodeId {
        let id = self.cast(exp, typ);
        self.arena.add_flags(id, NodeFlags::AS_IF);
        id
    }

    pub fn is_test(&mut self, exp: NodeId, typ: NodeId) -> NodeId {
        self.alloc(NodeKind::Is { exp, typ })
    }

    pub fn deref(&mut self, exp: NodeId) -> NodeId {
        self.alloc(NodeKind::Deref { exp })
    }

    pub fn logic_not(&mut self, exp: NodeId) -> NodeId {
        self.alloc(NodeKind::LogicNot { exp })
    }

    pub fn logic_and(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.alloc(NodeKind::LogicAnd { lhs, rhs })
    }

    pub fn logic_or(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.alloc(NodeKind::LogicOr { lhs, rhs })
    }

    pub fn block(&mut self, stmts: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::Block { stmts })
    }

    /// Conditional from `(condition, block)` pairs; pass the void sentinel
    /// as the condition of a trailing `else` branch.
    pub fn if_node(&mut self, branches: Vec<(NodeId, NodeId)>) -> NodeId {
        self.alloc(NodeKind::If { branches })
    }

    /// Two-armed `if cond { then } else { other }`.
    pub fn if_else(&mut self, cond: NodeId, then_blk: NodeId, else_blk: NodeId) -> NodeId {
        let void = self.builtin_void();
        self.if_node(vec![(cond, then_blk), (void, else_blk)])
    }

    pub fn loop_node(&mut self, body: NodeId) -> NodeId {
        self.alloc(NodeKind::Loop {
            body,
            breaks: Vec::new(),
        })
    }

    pub fn break_node(&mut self, exp: Option<NodeId>) -> NodeId {
        self.alloc(NodeKind::Break { exp })
    }

    pub fn continue_node(&mut self) -> NodeId {
        self.alloc(NodeKind::Continue)
    }

    pub fn return_node(&mut self, exp: Option<NodeId>) -> NodeId {
        self.alloc(NodeKind::Return {
            exp,
            dealias: Vec::new(),
        })
    }

    /// Value-producing exit of a block.
    pub fn block_ret_node(&mut self, exp: Option<NodeId>) -> NodeId {
        self.alloc(NodeKind::BlockRet {
            exp,
            dealias: Vec::new(),
        })
    }

    // ---- declarations ----

    pub fn var_dcl(
        &mut self,
        name: Symbol,
        perm: PermKind,
        typ: NodeId,
        init: Option<NodeId>,
    ) -> NodeId {
        self.alloc(NodeKind::VarDcl {
            name,
            perm,
            typ,
            init,
        })
    }

    /// Variable with inferred type (`typ` = void sentinel).
    pub fn let_dcl(&mut self, name: Symbol, perm: PermKind, init: NodeId) -> NodeId {
        let void = self.builtin_void();
        self.var_dcl(name, perm, void, Some(init))
    }

    /// Function parameter: an immutable variable without initializer.
    pub fn parm(&mut self, name: Symbol, typ: NodeId) -> NodeId {
        self.var_dcl(name, PermKind::Imm, typ, None)
    }

    /// Parameter with a default value.
    pub fn parm_default(&mut self, name: Symbol, typ: NodeId, default: NodeId) -> NodeId {
        self.var_dcl(name, PermKind::Imm, typ, Some(default))
    }

    pub fn fn_dcl(&mut self, name: Symbol, sig: NodeId, body: Option<NodeId>) -> NodeId {
        let id = self.alloc(NodeKind::FnDcl { name, sig, body });
        // A function value's type is its signature.
        self.arena.set_vtype(id, sig);
        id
    }

    /// Method declaration: a function flagged overloadable within its type.
    pub fn method_dcl(&mut self, name: Symbol, sig: NodeId, body: Option<NodeId>) -> NodeId {
        let id = self.fn_dcl(name, sig, body);
        self.arena.add_flags(id, NodeFlags::METH_FLD);
        id
    }

    pub fn field_dcl(&mut self, name: Symbol, typ: NodeId, default: Option<NodeId>) -> NodeId {
        let id = self.alloc(NodeKind::FieldDcl { name, typ, default });
        self.arena.set_vtype(id, typ);
        id
    }

    /// Hidden discriminant field for sum-type dispatch.
    pub fn tag_field_dcl(&mut self, name: Symbol, typ: NodeId) -> NodeId {
        let id = self.field_dcl(name, typ, None);
        self.arena.add_flags(id, NodeFlags::IS_TAG_FIELD);
        id
    }

    pub fn module(&mut self, items: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::Module {
            items,
            namespace: Namespace::new(),
        })
    }

    // ---- types ----

    pub fn ref_type(&mut self, pvtype: NodeId, perm: PermKind) -> NodeId {
        self.alloc(NodeKind::Ref { pvtype, perm })
    }

    pub fn ptr_type(&mut self, pvtype: NodeId) -> NodeId {
        self.alloc(NodeKind::Ptr { pvtype })
    }

    pub fn array_ref_type(&mut self, pvtype: NodeId, perm: PermKind) -> NodeId {
        self.alloc(NodeKind::ArrayRef { pvtype, perm })
    }

    pub fn virt_ref_type(&mut self, pvtype: NodeId, perm: PermKind) -> NodeId {
        self.alloc(NodeKind::VirtRef { pvtype, perm })
    }

    pub fn array_type(&mut self, elem: NodeId, size: u64) -> NodeId {
        self.alloc(NodeKind::Array { elem, size })
    }

    pub fn struct_dcl(
        &mut self,
        name: Symbol,
        fields: Vec<NodeId>,
        methods: Vec<NodeId>,
        tagnbr: u32,
        traits: Vec<NodeId>,
    ) -> NodeId {
        self.alloc(NodeKind::Struct {
            name,
            fields,
            methods,
            namespace: Namespace::new(),
            tagnbr,
            traits,
        })
    }

    /// Trait type: a struct with no concrete instances of its own.
    pub fn trait_dcl(&mut self, name: Symbol, fields: Vec<NodeId>, methods: Vec<NodeId>) -> NodeId {
        let id = self.struct_dcl(name, fields, methods, 0, Vec::new());
        self.arena.add_flags(id, NodeFlags::TRAIT_TYPE);
        id
    }

    pub fn fn_sig(&mut self, parms: Vec<NodeId>, rettype: NodeId) -> NodeId {
        self.alloc(NodeKind::FnSig { parms, rettype })
    }

    pub fn ttuple(&mut self, types: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::TTuple { types })
    }

    pub fn lifetime(&mut self, name: Symbol) -> NodeId {
        self.alloc(NodeKind::Lifetime { name })
    }
}
