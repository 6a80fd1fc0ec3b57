//! Shared error taxonomy.
//!
//! Every stage accumulates its own `Vec<Diagnostic>` instead of raising on
//! the first problem; stages are expected to continue past errors wherever
//! that is locally possible (see the per-stage modules for the exact
//! continuation points).

use std::fmt::{self, Display};

use colored::Colorize;

use crate::position::Position;

/// One reported problem, carrying the position it occurred at and a
/// rendered message. Stage-specific error enums implement `Into<Diagnostic>`
/// rather than this crate centralising every error variant in one enum,
/// mirroring how each stage in the pipeline owns its own exception types.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub position: Option<Position>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(position: Position, message: impl Into<String>) -> Self {
        Self {
            position: Some(position),
            message: message.into(),
        }
    }

    /// A diagnostic with no useful source position (e.g. a file that could
    /// not be opened at all).
    pub fn without_position(message: impl Into<String>) -> Self {
        Self {
            position: None,
            message: message.into(),
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.position {
            Some(pos) => {
                let header = format!("{pos}:").bold();
                write!(f, "{header} {msg}", msg = self.message)
            }
            None => write!(f, "{}", self.message),
        }
    }
}

/// Collects diagnostics from one or more stages and renders the run summary.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(other);
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Print every diagnostic, in accumulation order, then the error count
    /// on stderr. The order is the one guaranteed by every stage: across
    /// files in parse order and within a file in source order.
    pub fn report(&self) {
        for diagnostic in &self.diagnostics {
            eprintln!("{diagnostic}");
        }
        if !self.diagnostics.is_empty() {
            eprintln!(
                "{}",
                format!("{} error(s) found", self.diagnostics.len())
                    .red()
                    .bold()
            );
        }
    }
}

impl IntoIterator for DiagnosticBag {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

impl FromIterator<Diagnostic> for DiagnosticBag {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        let mut bag = DiagnosticBag::new();
        bag.extend(iter);
        bag
    }
}
