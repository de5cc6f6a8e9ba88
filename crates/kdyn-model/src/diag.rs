//! Non-fatal diagnostics accumulated during ingestion and queries.

use std::fmt::{Display, Formatter};

use kdyn_deck::Provenance;

/// Closed taxonomy of reader problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Too few fields on a data line or in a buffered section.
    Syntax,
    /// A field that must be numeric is not.
    Type,
    /// Redefinition of an already-defined id.
    Identity,
    /// A part's elements span more than one element kind.
    Consistency,
    /// A query for an id absent from a mapping entirely.
    Lookup,
}

impl DiagnosticKind {
    pub fn name(self) -> &'static str {
        match self {
            DiagnosticKind::Syntax => "syntax",
            DiagnosticKind::Type => "type",
            DiagnosticKind::Identity => "identity",
            DiagnosticKind::Consistency => "consistency",
            DiagnosticKind::Lookup => "lookup",
        }
    }
}

/// One reported problem. The offending record is dropped and ingestion
/// continues; nothing unwinds out of the reader.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub origin: Option<Provenance>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, origin: Provenance) -> Self {
        Self {
            kind,
            message: message.into(),
            origin: Some(origin),
        }
    }

    /// A diagnostic with no single source line, e.g. a query miss.
    pub fn unlocated(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            origin: None,
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.origin {
            Some(origin) => write!(f, "{}: {} error: {}", origin, self.kind.name(), self.message),
            None => write!(f, "{} error: {}", self.kind.name(), self.message),
        }
    }
}

impl std::error::Error for Diagnostic {}
