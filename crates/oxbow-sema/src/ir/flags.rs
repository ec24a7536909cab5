//! Per-node flag bits.

use bitflags::bitflags;

bitflags! {
    /// 16-bit flag set carried by every IR node.
    ///
    /// Most bits are only meaningful for one node category; they live in the
    /// common header so passes can test them without downcasting.
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct NodeFlags: u16 {
        /// Reinterpret-cast semantics on a `Cast` node.
        const AS_IF = 0x0001;
        /// Declaration is a method member of a type (overloadable).
        const METH_FLD = 0x0002;
        /// Struct is a trait: no concrete instances of its own.
        const TRAIT_TYPE = 0x0004;
        /// Struct carries a hidden discriminant field.
        const HAS_TAG_FIELD = 0x0008;
        /// All variants of this struct's family have identical size.
        const SAME_SIZE = 0x0010;
        /// Field holds the discriminant for sum-type dispatch.
        const IS_TAG_FIELD = 0x0020;
        /// Read of this name moved the value (set by flow analysis).
        const MOVED = 0x0040;
    }
}
