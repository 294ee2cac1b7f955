//! Shared diagnostic collector for one validation run.
//!
//! Every stage appends to the same [`ErrorStore`]. Suppression is applied
//! when reading, so suppressed findings stay in the history and can still be
//! inspected through [`ErrorStore::all`] and [`ErrorStore::count_code`].

use crate::models::{Diagnostic, DiagnosticCode, Severity};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct ErrorStore {
    diagnostics: Vec<Diagnostic>,
    suppressed: BTreeSet<String>,
}

impl ErrorStore {
    /// Create a store that hides the given codes when reporting
    pub fn new<I, S>(ignore: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            diagnostics: Vec::new(),
            suppressed: ignore.into_iter().map(Into::into).collect(),
        }
    }

    /// Append a diagnostic, suppressed or not
    pub fn add(&mut self, diagnostic: Diagnostic) {
        tracing::trace!(code = %diagnostic.code, message = %diagnostic.message, "diagnostic");
        self.diagnostics.push(diagnostic);
    }

    /// Whether findings with `code` are surfaced
    pub fn report(&self, code: DiagnosticCode) -> bool {
        !self.is_suppressed(code)
    }

    pub fn is_suppressed(&self, code: DiagnosticCode) -> bool {
        self.suppressed.contains(code.name())
    }

    pub fn suppressed_codes(&self) -> impl Iterator<Item = &str> {
        self.suppressed.iter().map(String::as_str)
    }

    /// Full history, including suppressed findings
    pub fn all(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Findings that are not suppressed, in insertion order
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| self.report(d.code))
    }

    /// Reported findings of one severity
    pub fn by_severity(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics().filter(move |d| d.severity == severity)
    }

    /// Number of reported findings
    pub fn count(&self) -> usize {
        self.diagnostics().count()
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.by_severity(severity).count()
    }

    /// Number of findings with `code`, suppressed or not
    pub fn count_code(&self, code: DiagnosticCode) -> usize {
        self.diagnostics.iter().filter(|d| d.code == code).count()
    }

    /// Check if any reported finding is an error
    pub fn has_errors(&self) -> bool {
        self.by_severity(Severity::Error).next().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}
