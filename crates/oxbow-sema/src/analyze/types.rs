//! Type system primitives.
//!
//! Equality, coercion matching, canonicalization, and the reinterpret-cast
//! size oracle. These are pure helpers over the arena; the type-check pass
//! decides what to do with a failed match.

use crate::ir::{NodeArena, NodeFlags, NodeId, NodeKind};

/// Follow-depth cap when canonicalizing through name-use chains. Malformed
/// input can tie type references into a knot; we stop rather than spin.
pub const DEFAULT_TYPE_DEPTH: u32 = 256;

/// Size-category key for pointer-sized values in [`cast_bit_size`].
///
/// An internal equivalence class, not a byte count: all thin references
/// share it, fat references get twice it, and it is deliberately far above
/// any real bit width so the classes can never collide.
pub const PTR_SIZE_KEY: u32 = 10_000;

/// Result of matching an expression type against an expected type.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TypeMatch {
    /// Incompatible.
    None,
    /// Identical; no conversion needed.
    Exact,
    /// Compatible through an inserted conversion of the given cost.
    /// Lower cost wins during overload selection.
    Coerce(u32),
}

impl TypeMatch {
    pub fn matched(self) -> bool {
        !matches!(self, TypeMatch::None)
    }
}

/// Canonicalize a type handle: follow name-use bindings to the underlying
/// type declaration node.
pub fn type_dcl(arena: &NodeArena, id: NodeId) -> NodeId {
    type_dcl_capped(arena, id, DEFAULT_TYPE_DEPTH)
}

/// [`type_dcl`] with an explicit follow-depth cap.
pub fn type_dcl_capped(arena: &NodeArena, mut id: NodeId, cap: u32) -> NodeId {
    for _ in 0..cap {
        match arena.kind(id) {
            NodeKind::NameUse { dcl: Some(dcl), .. } => id = *dcl,
            NodeKind::FnDcl { sig, .. } => id = *sig,
            NodeKind::VarDcl { typ, .. } => id = *typ,
            _ => return id,
        }
    }
    id
}

/// Canonical type of an expression's value.
pub fn exp_type_dcl(arena: &NodeArena, exp: NodeId) -> NodeId {
    type_dcl(arena, arena.vtype(exp))
}

/// Strict structural type equality.
///
/// `usize` is its own type: it never equals the fixed-width unsigned type
/// that happens to share its representation.
pub fn type_is_same(arena: &NodeArena, a: NodeId, b: NodeId) -> bool {
    let a = type_dcl(arena, a);
    let b = type_dcl(arena, b);

    if a == b {
        return true;
    }
    let usize_id = arena.builtins().usize;
    if a == usize_id || b == usize_id {
        return false;
    }

    match (arena.kind(a), arena.kind(b)) {
        (NodeKind::IntNbr { bits: ba }, NodeKind::IntNbr { bits: bb })
        | (NodeKind::UintNbr { bits: ba }, NodeKind::UintNbr { bits: bb })
        | (NodeKind::FloatNbr { bits: ba }, NodeKind::FloatNbr { bits: bb }) => ba == bb,
        (NodeKind::Void, NodeKind::Void) | (NodeKind::Bool, NodeKind::Bool) => true,
        (
            NodeKind::Ref {
                pvtype: pa,
                perm: ka,
            },
            NodeKind::Ref {
                pvtype: pb,
                perm: kb,
            },
        )
        | (
            NodeKind::ArrayRef {
                pvtype: pa,
                perm: ka,
            },
            NodeKind::ArrayRef {
                pvtype: pb,
                perm: kb,
            },
        )
        | (
            NodeKind::VirtRef {
                pvtype: pa,
                perm: ka,
            },
            NodeKind::VirtRef {
                pvtype: pb,
                perm: kb,
            },
        ) => ka == kb && type_is_same(arena, *pa, *pb),
        (NodeKind::Ptr { pvtype: pa }, NodeKind::Ptr { pvtype: pb }) => {
            type_is_same(arena, *pa, *pb)
        }
        (
            NodeKind::Array {
                elem: ea,
                size: sa,
            },
            NodeKind::Array {
                elem: eb,
                size: sb,
            },
        ) => sa == sb && type_is_same(arena, *ea, *eb),
        (NodeKind::TTuple { types: ta }, NodeKind::TTuple { types: tb }) => {
            ta.len() == tb.len()
                && ta
                    .iter()
                    .zip(tb.iter())
                    .all(|(&x, &y)| type_is_same(arena, x, y))
        }
        (
            NodeKind::FnSig {
                parms: pa,
                rettype: ra,
            },
            NodeKind::FnSig {
                parms: pb,
                rettype: rb,
            },
        ) => {
            pa.len() == pb.len()
                && type_is_same(arena, *ra, *rb)
                && pa.iter().zip(pb.iter()).all(|(&x, &y)| {
                    let tx = type_dcl(arena, x);
                    let ty = type_dcl(arena, y);
                    type_is_same(arena, tx, ty)
                })
        }
        // Structs are nominal: only id identity (handled above) matches.
        _ => false,
    }
}

/// Widening cost between numeric widths: allowed when the target is at
/// least as wide, costed by the width difference.
fn widen_cost(base: u32, have: u8, need: u8) -> TypeMatch {
    if need >= have {
        TypeMatch::Coerce(base + u32::from(need - have) / 8)
    } else {
        TypeMatch::None
    }
}

/// Whether `have` may be supplied where `need` is expected, and at what
/// conversion cost. `Exact` short-circuits overload search.
pub fn type_matches(arena: &NodeArena, have: NodeId, need: NodeId) -> TypeMatch {
    let have = type_dcl(arena, have);
    let need = type_dcl(arena, need);

    if type_is_same(arena, have, need) {
        return TypeMatch::Exact;
    }

    match (arena.kind(have), arena.kind(need)) {
        (NodeKind::IntNbr { bits: bh }, NodeKind::IntNbr { bits: bn })
        | (NodeKind::UintNbr { bits: bh }, NodeKind::UintNbr { bits: bn }) => {
            widen_cost(2, *bh, *bn)
        }
        // Signedness change: equal or wider, costed above same-kind widening.
        (NodeKind::UintNbr { bits: bh }, NodeKind::IntNbr { bits: bn })
        | (NodeKind::IntNbr { bits: bh }, NodeKind::UintNbr { bits: bn }) => {
            widen_cost(3, *bh, *bn)
        }
        (NodeKind::FloatNbr { bits: bh }, NodeKind::FloatNbr { bits: bn }) => {
            widen_cost(2, *bh, *bn)
        }
        // Int/float conversions require an explicit cast.
        (
            NodeKind::Ref {
                pvtype: ph,
                perm: kh,
            },
            NodeKind::Ref {
                pvtype: pn,
                perm: kn,
            },
        ) => {
            if type_is_same(arena, *ph, *pn) && kh.coerces_to(*kn) {
                TypeMatch::Coerce(2)
            } else {
                TypeMatch::None
            }
        }
        (NodeKind::Ref { pvtype: ph, .. }, NodeKind::Ptr { pvtype: pn }) => {
            if type_is_same(arena, *ph, *pn) {
                TypeMatch::Coerce(2)
            } else {
                TypeMatch::None
            }
        }
        (
            NodeKind::Ref {
                pvtype: ph,
                perm: kh,
            },
            NodeKind::VirtRef {
                pvtype: pn,
                perm: kn,
            },
        ) => {
            let concrete = type_dcl(arena, *ph);
            let wanted = type_dcl(arena, *pn);
            if kh.coerces_to(*kn) && struct_implements(arena, concrete, wanted) {
                TypeMatch::Coerce(3)
            } else {
                TypeMatch::None
            }
        }
        (
            NodeKind::VirtRef {
                pvtype: ph,
                perm: kh,
            },
            NodeKind::VirtRef {
                pvtype: pn,
                perm: kn,
            },
        )
        | (
            NodeKind::ArrayRef {
                pvtype: ph,
                perm: kh,
            },
            NodeKind::ArrayRef {
                pvtype: pn,
                perm: kn,
            },
        ) => {
            if type_is_same(arena, *ph, *pn) && kh.coerces_to(*kn) {
                TypeMatch::Coerce(2)
            } else {
                TypeMatch::None
            }
        }
        (NodeKind::Struct { .. }, NodeKind::Struct { .. }) => {
            if arena.has_flag(need, NodeFlags::TRAIT_TYPE) && struct_implements(arena, have, need) {
                TypeMatch::Coerce(2)
            } else {
                TypeMatch::None
            }
        }
        _ => TypeMatch::None,
    }
}

/// Whether `strukt` implements the trait type `wanted` (or is it).
pub fn struct_implements(arena: &NodeArena, strukt: NodeId, wanted: NodeId) -> bool {
    if strukt == wanted {
        return true;
    }
    match arena.kind(strukt) {
        NodeKind::Struct { traits, .. } => traits
            .iter()
            .any(|&t| type_dcl(arena, t) == type_dcl(arena, wanted)),
        _ => false,
    }
}

/// Whether a virtual reference over `trait_type` may specialize to the
/// concrete struct `target` at runtime.
pub fn virt_ref_specializes(arena: &NodeArena, trait_type: NodeId, target: NodeId) -> bool {
    matches!(arena.kind(target), NodeKind::Struct { .. })
        && struct_implements(arena, target, trait_type)
}

/// Size category for reinterpret casts.
///
/// Numerics contribute their declared bits; thin references contribute the
/// pointer-size key; fat array references contribute twice it; `usize`
/// contributes the key. Zero means "not reinterpretable". Structs are
/// excluded and governed by the `SAME_SIZE` flag instead.
pub fn cast_bit_size(arena: &NodeArena, typ: NodeId) -> u32 {
    let typ = type_dcl(arena, typ);
    if typ == arena.builtins().usize {
        return PTR_SIZE_KEY;
    }
    match arena.kind(typ) {
        NodeKind::IntNbr { bits } | NodeKind::UintNbr { bits } | NodeKind::FloatNbr { bits } => {
            u32::from(*bits)
        }
        NodeKind::Ref { .. } | NodeKind::Ptr { .. } => PTR_SIZE_KEY,
        NodeKind::ArrayRef { .. } => PTR_SIZE_KEY << 1,
        _ => 0,
    }
}

/// Whether a type's values copy on read rather than move.
///
/// `uni` references own their target and therefore move; everything the
/// middle-end models today is otherwise copyable.
pub fn type_moves_on_read(arena: &NodeArena, typ: NodeId) -> bool {
    let typ = type_dcl(arena, typ);
    matches!(
        arena.kind(typ),
        NodeKind::Ref {
            perm: crate::ir::PermKind::Uni,
            ..
        } | NodeKind::ArrayRef {
            perm: crate::ir::PermKind::Uni,
            ..
        } | NodeKind::VirtRef {
            perm: crate::ir::PermKind::Uni,
            ..
        }
    )
}
