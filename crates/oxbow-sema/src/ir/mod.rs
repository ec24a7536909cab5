//! The IR: tagged nodes in an arena, construction, and printing.

mod arena;
mod build;
mod flags;
mod namespace;
mod node;
pub mod printer;


pub use arena::{Builtins, NodeArena, NodeId};
pub use build::IrBuilder;
pub use flags::NodeFlags;
pub use namespace::Namespace;
pub use node::{Node, NodeKind, PermKind};
