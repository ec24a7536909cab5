//! The IR node model.
//!
//! Every IR element (expression, statement, declaration, or type) is a
//! `Node`: a tagged variant plus a common header (flags, source span, value
//! type). Types are themselves nodes, so an expression's `vtype` is just
//! another `NodeId` into the same arena. Passes dispatch by matching on
//! `NodeKind` exhaustively; a kind a pass cannot handle is reported through
//! diagnostics, never ignored.

use oxbow_core::{Span, Symbol};

use super::arena::NodeId;
use super::flags::NodeFlags;
use super::namespace::Namespace;

/// Reference permission.
///
/// `Uni` references own their target exclusively and move on read. `Mut`
/// coerces to `Imm` and `Const`; `Imm` coerces to `Const`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PermKind {
    Uni,
    Mut,
    Imm,
    Const,
}

impl PermKind {
    /// Whether a value held under `self` may be stored through.
    pub fn is_mutable(self) -> bool {
        matches!(self, PermKind::Uni | PermKind::Mut)
    }

    /// Whether a reference with permission `self` may be supplied where
    /// `need` is expected.
    pub fn coerces_to(self, need: PermKind) -> bool {
        use PermKind::*;
        match (self, need) {
            _ if self == need => true,
            (Uni, _) => true,
            (Mut, Imm | Const) => true,
            (Imm, Const) => true,
            _ => false,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            PermKind::Uni => "uni",
            PermKind::Mut => "mut",
            PermKind::Imm => "imm",
            PermKind::Const => "const",
        }
    }
}

/// One IR node: a discriminated variant plus the common header.
#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub flags: NodeFlags,
    pub span: Span,
    /// Value type of the node when it is an expression. Initialized to the
    /// `void` sentinel by construction; the type-check pass overwrites it.
    /// Non-expression nodes leave it at the sentinel.
    pub vtype: NodeId,
}

/// The closed set of node variants.
#[derive(Clone, Debug)]
pub enum NodeKind {
    // ---- literals and name uses ----
    /// Unsigned integer literal. Its numeric type is carried in `vtype`.
    ULit { val: u64 },
    /// Floating-point literal. Its numeric type is carried in `vtype`.
    FLit { val: f64 },
    /// Use of a declared name; `dcl` is filled in by name resolution.
    NameUse { name: Symbol, dcl: Option<NodeId> },
    /// `name: value` argument inside a struct literal.
    NamedVal { name: Symbol, val: NodeId },

    // ---- expressions ----
    /// Value tuple, e.g. a multi-value return.
    VTuple { values: Vec<NodeId> },
    Assign { lval: NodeId, rval: NodeId },
    /// Call of a function value, or a method call when `method` is set
    /// (`callee` is then the receiver object; resolution rewrites the node
    /// into plain-call form).
    FnCall {
        callee: NodeId,
        method: Option<Symbol>,
        args: Vec<NodeId>,
    },
    /// Type literal: `T[..]` constructing a struct, array, or number.
    TypeLit { typ: NodeId, args: Vec<NodeId> },
    /// Conversion to another type; `AS_IF` flag selects reinterpret
    /// semantics.
    Cast { exp: NodeId, typ: NodeId },
    /// Runtime type test, producing bool.
    Is { exp: NodeId, typ: NodeId },
    Deref { exp: NodeId },
    LogicNot { exp: NodeId },
    LogicAnd { lhs: NodeId, rhs: NodeId },
    LogicOr { lhs: NodeId, rhs: NodeId },
    /// Statement sequence; its value is the value of its last statement.
    Block { stmts: Vec<NodeId> },
    /// Conditional with `(condition, block)` pairs. A trailing `else` is
    /// encoded as the `void` sentinel in the condition slot.
    If { branches: Vec<(NodeId, NodeId)> },
    /// Loop; `breaks` collects every `break` expression node inside, filled
    /// by the type-check pass to compute the loop's value type.
    Loop { body: NodeId, breaks: Vec<NodeId> },
    Break { exp: Option<NodeId> },
    Continue,
    /// `return exp`; `dealias` lists variables the backend must release
    /// before leaving the function (computed by flow analysis).
    Return {
        exp: Option<NodeId>,
        dealias: Vec<NodeId>,
    },
    /// Value-producing exit of a block (same shape as `Return`).
    BlockRet {
        exp: Option<NodeId>,
        dealias: Vec<NodeId>,
    },

    // ---- declarations ----
    VarDcl {
        name: Symbol,
        perm: PermKind,
        /// Declared type, or the `void` sentinel when it is to be inferred
        /// from the initializer.
        typ: NodeId,
        init: Option<NodeId>,
    },
    FnDcl {
        name: Symbol,
        sig: NodeId,
        body: Option<NodeId>,
    },
    FieldDcl {
        name: Symbol,
        typ: NodeId,
        default: Option<NodeId>,
    },
    /// Root of a compilation unit. The namespace is built by name
    /// resolution from the top-level items.
    Module {
        items: Vec<NodeId>,
        namespace: Namespace,
    },

    // ---- types ----
    IntNbr { bits: u8 },
    UintNbr { bits: u8 },
    FloatNbr { bits: u8 },
    Void,
    Bool,
    Perm { kind: PermKind },
    Ref { pvtype: NodeId, perm: PermKind },
    Ptr { pvtype: NodeId },
    /// Fat reference to an array segment (pointer + length).
    ArrayRef { pvtype: NodeId, perm: PermKind },
    /// Fat reference carrying a runtime tag, enabling `is` checks against
    /// concrete types implementing a trait.
    VirtRef { pvtype: NodeId, perm: PermKind },
    Array { elem: NodeId, size: u64 },
    Struct {
        name: Symbol,
        fields: Vec<NodeId>,
        methods: Vec<NodeId>,
        /// Name-to-member map over fields and methods, built by name
        /// resolution.
        namespace: Namespace,
        /// Discriminant injected into tag fields of literals.
        tagnbr: u32,
        /// Trait types this struct implements.
        traits: Vec<NodeId>,
    },
    FnSig { parms: Vec<NodeId>, rettype: NodeId },
    /// Type tuple (multi-value return type).
    TTuple { types: Vec<NodeId> },
    Lifetime { name: Symbol },
}

impl NodeKind {
    /// Expression-category nodes: those that carry a meaningful `vtype`
    /// after type check.
    pub fn is_exp(&self) -> bool {
        use NodeKind::*;
        matches!(
            self,
            ULit { .. }
                | FLit { .. }
                | NameUse { .. }
                | NamedVal { .. }
                | VTuple { .. }
                | Assign { .. }
                | FnCall { .. }
                | TypeLit { .. }
                | Cast { .. }
                | Is { .. }
                | Deref { .. }
                | LogicNot { .. }
                | LogicAnd { .. }
                | LogicOr { .. }
                | Block { .. }
                | If { .. }
                | Loop { .. }
                | VarDcl { .. }
        )
    }

    /// Type-category nodes.
    pub fn is_type(&self) -> bool {
        use NodeKind::*;
        matches!(
            self,
            IntNbr { .. }
                | UintNbr { .. }
                | FloatNbr { .. }
                | Void
                | Bool
                | Perm { .. }
                | Ref { .. }
                | Ptr { .. }
                | ArrayRef { .. }
                | VirtRef { .. }
                | Array { .. }
                | Struct { .. }
                | FnSig { .. }
                | TTuple { .. }
                | Lifetime { .. }
        )
    }

    pub fn is_dcl(&self) -> bool {
        use NodeKind::*;
        matches!(
            self,
            VarDcl { .. } | FnDcl { .. } | FieldDcl { .. } | Struct { .. }
        )
    }

    /// Declared name, for nodes that introduce one.
    pub fn dcl_name(&self) -> Option<Symbol> {
        use NodeKind::*;
        match self {
            VarDcl { name, .. }
            | FnDcl { name, .. }
            | FieldDcl { name, .. }
            | Struct { name, .. } => Some(*name),
            _ => None,
        }
    }

    /// Short tag name for diagnostics and the printer.
    pub fn tag_name(&self) -> &'static str {
        use NodeKind::*;
        match self {
            ULit { .. } => "ulit",
            FLit { .. } => "flit",
            NameUse { .. } => "nameuse",
            NamedVal { .. } => "namedval",
            VTuple { .. } => "vtuple",
            Assign { .. } => "assign",
            FnCall { .. } => "fncall",
            TypeLit { .. } => "typelit",
            Cast { .. } => "cast",
            Is { .. } => "is",
            Deref { .. } => "deref",
            LogicNot { .. } => "not",
            LogicAnd { .. } => "and",
            LogicOr { .. } => "or",
            Block { .. } => "block",
            If { .. } => "if",
            Loop { .. } => "loop",
            Break { .. } => "break",
            Continue => "continue",
            Return { .. } => "return",
            BlockRet { .. } => "blockret",
            VarDcl { .. } => "vardcl",
            FnDcl { .. } => "fndcl",
            FieldDcl { .. } => "fielddcl",
            Module { .. } => "module",
            IntNbr { .. } => "int",
            UintNbr { .. } => "uint",
            FloatNbr { .. } => "float",
            Void => "void",
            Bool => "bool",
            Perm { .. } => "perm",
            Ref { .. } => "ref",
            Ptr { .. } => "ptr",
            ArrayRef { .. } => "arrayref",
            VirtRef { .. } => "virtref",
            Array { .. } => "array",
            Struct { .. } => "struct",
            FnSig { .. } => "fnsig",
            TTuple { .. } => "ttuple",
            Lifetime { .. } => "lifetime",
        }
    }
}
