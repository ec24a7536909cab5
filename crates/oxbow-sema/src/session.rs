//! The compilation session: arena, interner, diagnostics, and the pass
//! driver.
//!
//! Everything the original design kept in process-wide globals lives here
//! and is passed explicitly into each pass, so the middle-end is usable as
//! a library.

use tracing::debug;

use oxbow_core::Interner;

use crate::analyze::{self, DEFAULT_TYPE_DEPTH};
use crate::diagnostics::Diagnostics;
use crate::ir::{IrBuilder, NodeArena, NodeId};
use crate::{Error, Result};

/// Tunables for the analysis passes.
#[derive(Clone, Copy, Debug)]
pub struct SemaConfig {
    /// Follow-depth cap when canonicalizing type references. Malformed
    /// input can tie the type graph into a knot; resolution stops there.
    pub max_type_depth: u32,
}

impl Default for SemaConfig {
    fn default() -> Self {
        Self {
            max_type_depth: DEFAULT_TYPE_DEPTH,
        }
    }
}

impl SemaConfig {
    pub fn with_max_type_depth(mut self, depth: u32) -> Self {
        self.max_type_depth = depth;
        self
    }
}

/// One compilation's worth of state.
pub struct Session {
    pub arena: NodeArena,
    pub interner: Interner,
    pub diag: Diagnostics,
    config: SemaConfig,
}

impl Session {
    pub fn new() -> Self {
        Self::with_config(SemaConfig::default())
    }

    pub fn with_config(config: SemaConfig) -> Self {
        Self {
            arena: NodeArena::new(),
            interner: Interner::new(),
            diag: Diagnostics::new(),
            config,
        }
    }

    /// Builder the parser (or a test) uses to construct the input tree.
    pub fn builder(&mut self) -> IrBuilder<'_> {
        IrBuilder::new(&mut self.arena, &mut self.interner)
    }

    /// Run the full pass pipeline over a module.
    ///
    /// Each pass runs only if the previous one left the error count at
    /// zero: type checking partially-bound names would only produce
    /// spurious errors on top of the real ones.
    pub fn analyze(&mut self, module: NodeId) -> Result<()> {
        analyze::resolve_module(&mut self.arena, &self.interner, &mut self.diag, module);
        if self.diag.has_errors() {
            debug!("pipeline halted after name resolution");
            return Err(Error::Halted {
                errors: self.diag.error_count(),
            });
        }

        analyze::check_module(
            &mut self.arena,
            &self.interner,
            &mut self.diag,
            self.config.max_type_depth,
            module,
        );
        if self.diag.has_errors() {
            debug!("pipeline halted after type check");
            return Err(Error::Halted {
                errors: self.diag.error_count(),
            });
        }

        analyze::flow_module(&mut self.arena, &self.interner, &mut self.diag, module);
        if self.diag.has_errors() {
            return Err(Error::Halted {
                errors: self.diag.error_count(),
            });
        }
        Ok(())
    }

    /// Serialize a node for golden tests and debugging.
    pub fn print(&self, node: NodeId) -> String {
        crate::ir::printer::print_node(&self.arena, &self.interner, node)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
