//! Compiler diagnostics: classification, collection, and the error
//! counter.
//!
//! Every diagnostic carries a kind from a closed set and is anchored at
//! the span of the node that produced it. The collection keeps running
//! tallies as diagnostics are emitted; the pass driver reads the error
//! count to decide whether the next pass may run, so the count is the
//! load-bearing piece, not an afterthought of iteration.

mod message;
mod printer;


use oxbow_core::Span;

pub use message::{Diagnostic, DiagnosticKind, Note, Severity};
pub use printer::DiagnosticsPrinter;

/// Accumulated diagnostics for one compilation, with running tallies.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
    errors: usize,
    warnings: usize,
    fatals: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    fn report(
        &mut self,
        kind: DiagnosticKind,
        severity: Severity,
        msg: impl Into<String>,
        span: Span,
    ) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder {
            sink: self,
            diag: Diagnostic::new(kind, severity, span, msg),
        }
    }

    pub fn error(
        &mut self,
        kind: DiagnosticKind,
        msg: impl Into<String>,
        span: Span,
    ) -> DiagnosticBuilder<'_> {
        self.report(kind, Severity::Error, msg, span)
    }

    pub fn warning(
        &mut self,
        kind: DiagnosticKind,
        msg: impl Into<String>,
        span: Span,
    ) -> DiagnosticBuilder<'_> {
        self.report(kind, Severity::Warning, msg, span)
    }

    /// Structural breakage; counts as an error for pipeline gating.
    pub fn fatal(
        &mut self,
        kind: DiagnosticKind,
        msg: impl Into<String>,
        span: Span,
    ) -> DiagnosticBuilder<'_> {
        self.report(kind, Severity::Fatal, msg, span)
    }

    /// The error counter the driver gates passes on. Fatal diagnostics
    /// count here too.
    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings > 0
    }

    pub fn has_fatal(&self) -> bool {
        self.fatals > 0
    }

    /// How many diagnostics of one kind were reported.
    pub fn kind_count(&self, kind: DiagnosticKind) -> usize {
        self.items.iter().filter(|d| d.kind() == kind).count()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Diagnostics in the order they were reported.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn printer(&self) -> DiagnosticsPrinter<'_, '_> {
        DiagnosticsPrinter::new(self)
    }
}

/// In-flight diagnostic; drop it on the floor and nothing is recorded.
#[must_use = "diagnostic not recorded, call .emit()"]
pub struct DiagnosticBuilder<'a> {
    sink: &'a mut Diagnostics,
    diag: Diagnostic,
}

impl DiagnosticBuilder<'_> {
    /// Attach a secondary location ("first declared here").
    pub fn note(mut self, text: impl Into<String>, span: Span) -> Self {
        self.diag.push_note(text, span);
        self
    }

    /// Record the diagnostic and update the tallies.
    pub fn emit(self) {
        match self.diag.severity() {
            Severity::Warning => self.sink.warnings += 1,
            Severity::Error => self.sink.errors += 1,
            Severity::Fatal => {
                self.sink.errors += 1;
                self.sink.fatals += 1;
            }
        }
        self.sink.items.push(self.diag);
    }
}
