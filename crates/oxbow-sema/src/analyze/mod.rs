//! Semantic analysis passes.
//!
//! Three passes run in a fixed order over the IR, each resting on the
//! invariants of the one before:
//! - Name resolution (name_res): binds every name use to its declaration.
//! - Type check (type_check): assigns every expression a value type and
//!   materializes coercions.
//! - Flow analysis (flow): computes move/alias information and dealias
//!   lists for the backend.

pub mod flow;
pub mod name_res;
pub mod scope;
pub mod type_check;
pub mod types;

#[cfg(test)]
mod name_res_tests;

pub use flow::flow_module;
pub use name_res::resolve_module;
pub use scope::ScopeStack;
pub use type_check::{check_module, type_lit_is_literal};
pub use types::{
    DEFAULT_TYPE_DEPTH, TypeMatch, cast_bit_size, exp_type_dcl, type_dcl, type_is_same,
    type_matches,
};
