//! Core data structures shared across the Oxbow compiler.
//!
//! Two small building blocks every phase needs:
//! - **Interning** (`Interner`, `Symbol`): names deduplicated into cheap
//!   integer handles, so name equality is integer equality.
//! - **Positions** (`Span`): byte ranges into the source, attached to every
//!   IR node for diagnostics.

mod interner;
mod span;


pub use interner::{Interner, MAX_NAME_LEN, Symbol};
pub use span::Span;
