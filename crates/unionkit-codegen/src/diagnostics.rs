//! Diagnostics reported during a generation pass.

use crate::types::{DeclarationView, Marker, SourceLocation};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// Stable identifiers for every diagnostic the generator can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticId {
    /// The target type or one of its enclosing types is not `partial`.
    NonExtensibleType,
    /// More than one factory marker on a single type.
    MultipleFactoryMarkers,
    /// Two candidate types map to the same output key.
    OutputKeyCollision,
    /// The factory marker's key type is missing or ambiguous.
    UnresolvedKeyType,
    /// `UseForSerialization` is not a valid framework combination.
    InvalidFrameworkFlags,
    /// The target type or one of its enclosing types declares type parameters,
    /// which cannot appear in an attribute's `typeof` argument.
    GenericTarget,
}

impl DiagnosticId {
    pub fn code(self) -> &'static str {
        match self {
            DiagnosticId::NonExtensibleType => "UK0001",
            DiagnosticId::MultipleFactoryMarkers => "UK0002",
            DiagnosticId::OutputKeyCollision => "UK0003",
            DiagnosticId::UnresolvedKeyType => "UK0004",
            DiagnosticId::InvalidFrameworkFlags => "UK0005",
            DiagnosticId::GenericTarget => "UK0006",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            DiagnosticId::NonExtensibleType
            | DiagnosticId::MultipleFactoryMarkers
            | DiagnosticId::OutputKeyCollision
            | DiagnosticId::GenericTarget => Severity::Error,
            DiagnosticId::UnresolvedKeyType | DiagnosticId::InvalidFrameworkFlags => {
                Severity::Warning
            }
        }
    }
}

impl fmt::Display for DiagnosticId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A problem attributable to a declaration (or one of its markers).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub id: DiagnosticId,
    pub message: String,
    /// Qualified name of the declaration the diagnostic belongs to.
    pub type_name: String,
    pub location: Option<SourceLocation>,
}

impl Diagnostic {
    /// A diagnostic located at the declaration itself.
    pub(crate) fn for_type<V: DeclarationView + ?Sized>(
        id: DiagnosticId,
        view: &V,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id,
            message: message.into(),
            type_name: view.qualified_name(),
            location: view.location().cloned(),
        }
    }

    /// A diagnostic located at a marker, falling back to the declaration.
    pub(crate) fn for_marker<V: DeclarationView + ?Sized>(
        id: DiagnosticId,
        view: &V,
        marker: &Marker,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id,
            message: message.into(),
            type_name: view.qualified_name(),
            location: marker
                .location
                .clone()
                .or_else(|| view.location().cloned()),
        }
    }

    pub fn severity(&self) -> Severity {
        self.id.severity()
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{location}: ")?,
            None => write!(f, "{}: ", self.type_name)?,
        }
        write!(f, "{} {}: {}", self.severity(), self.id, self.message)
    }
}
