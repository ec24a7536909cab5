//! Rendering diagnostics for humans.
//!
//! Two output forms: a one-line-per-diagnostic dump (the `Display` impl)
//! when no source text is at hand, and annotated source snippets through
//! `annotate-snippets` when the driver supplies the source buffer.

use annotate_snippets::{AnnotationKind, Level, Renderer, Snippet};

use oxbow_core::Span;

use super::Diagnostics;
use super::message::Severity;

/// Renders a diagnostics collection, optionally against its source text.
pub struct DiagnosticsPrinter<'d, 's> {
    diagnostics: &'d Diagnostics,
    source: Option<&'s str>,
    path: Option<&'s str>,
    colored: bool,
}

impl<'d, 's> DiagnosticsPrinter<'d, 's> {
    pub fn new(diagnostics: &'d Diagnostics) -> Self {
        Self {
            diagnostics,
            source: None,
            path: None,
            colored: false,
        }
    }

    /// Supply the source buffer the diagnostic spans index into.
    pub fn source(mut self, source: &'s str) -> Self {
        self.source = Some(source);
        self
    }

    /// File path shown in snippet headers.
    pub fn path(mut self, path: &'s str) -> Self {
        self.path = Some(path);
        self
    }

    pub fn colored(mut self, value: bool) -> Self {
        self.colored = value;
        self
    }

    pub fn render(&self) -> String {
        match self.source {
            Some(source) => self.render_snippets(source),
            None => self.render_plain(),
        }
    }

    /// One line per diagnostic, notes folded in.
    fn render_plain(&self) -> String {
        let lines: Vec<String> = self.diagnostics.iter().map(ToString::to_string).collect();
        lines.join("\n")
    }

    /// Annotated source excerpts, one block per diagnostic.
    fn render_snippets(&self, source: &str) -> String {
        let renderer = if self.colored {
            Renderer::styled()
        } else {
            Renderer::plain()
        };

        let mut blocks = Vec::with_capacity(self.diagnostics.len());
        for diag in self.diagnostics.iter() {
            let mut snippet = Snippet::source(source).line_start(1).annotation(
                AnnotationKind::Primary
                    .span(snippet_range(diag.span(), source.len()))
                    .label(diag.message()),
            );
            if let Some(path) = self.path {
                snippet = snippet.path(path);
            }
            for note in diag.notes() {
                snippet = snippet.annotation(
                    AnnotationKind::Context
                        .span(snippet_range(note.span, source.len()))
                        .label(&note.text),
                );
            }

            let group = level_for(diag.severity())
                .primary_title(diag.message())
                .element(snippet);
            blocks.push(format!("{}", renderer.render(&[group])));
        }
        blocks.join("\n")
    }
}

fn level_for(severity: Severity) -> Level<'static> {
    match severity {
        Severity::Warning => Level::WARNING,
        Severity::Error | Severity::Fatal => Level::ERROR,
    }
}

/// Clamp a span into the source and widen empty spans to one byte so the
/// annotation has something to point at.
fn snippet_range(span: Span, source_len: usize) -> std::ops::Range<usize> {
    let start = (span.start as usize).min(source_len);
    let end = (span.end as usize).clamp(start, source_len);
    if start == end {
        start..(start + 1).min(source_len)
    } else {
        start..end
    }
}
