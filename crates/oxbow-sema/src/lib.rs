//! Oxbow semantic middle-end: IR, name resolution, type check, flow
//! analysis.
//!
//! The parser hands over a `Module`-rooted IR tree built through
//! [`ir::IrBuilder`]; [`Session::analyze`] runs the pass pipeline and
//! leaves a fully annotated tree for code generation.
//!
//! # Example
//!
//! ```
//! use oxbow_sema::Session;
//!
//! let mut sess = Session::new();
//! let i32_type = sess.arena.builtins().i32;
//!
//! // fn ident(x i32) i32 { return x }
//! let mut b = sess.builder();
//! let x = b.name("x");
//! let ident = b.name("ident");
//! let parm = b.parm(x, i32_type);
//! let sig = b.fn_sig(vec![parm], i32_type);
//! let ret_x = b.use_of("x");
//! let ret = b.return_node(Some(ret_x));
//! let body = b.block(vec![ret]);
//! let f = b.fn_dcl(ident, sig, Some(body));
//! let module = b.module(vec![f]);
//!
//! sess.analyze(module).expect("analysis is clean");
//! assert!(!sess.diag.has_errors());
//! ```

pub mod analyze;
pub mod diagnostics;
pub mod ir;
mod session;

pub use diagnostics::{DiagnosticKind, Diagnostics, DiagnosticsPrinter, Severity};
pub use session::{SemaConfig, Session};

/// Fatal conditions that abort the pass pipeline.
///
/// Recoverable per-node problems are diagnostics, not errors; this enum is
/// the driver-level signal that later passes did not (or must not) run.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A pass reported errors; subsequent passes were not run.
    #[error("analysis halted after {errors} error(s)")]
    Halted { errors: usize },
}

/// Result type for middle-end operations.
pub type Result<T> = std::result::Result<T, Error>;
