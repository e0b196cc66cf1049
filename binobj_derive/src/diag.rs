//! User-facing diagnostics collected during layout analysis.
//!
//! Analysis never bails on the first problem; every issue found in one pass
//! over a type is collected here and surfaced together. Hard failures
//! (`panic!`/`unreachable!`) are reserved for internal invariant violations
//! that indicate a bug in the planner itself.

use std::fmt;

/// How severe a diagnostic is.
///
/// A `Warning` drops the offending field and continues; an `Error` means
/// the whole type gets no generated codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Aborts codec generation for the type.
    Error,
    /// The offending field is dropped; the type is still generated.
    Warning,
}

/// Machine-readable cause of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    /// A field's type cannot be given a binary representation.
    UnsupportedType,
    /// An annotation does not apply to the field it was placed on.
    UnsupportedAnnotation,
    /// An `element_count = "name"` reference names no earlier field.
    ReferenceTargetMissing,
    /// The referenced field exists but is not an integer scalar.
    ReferenceTargetWrongType,
    /// A remainder-consuming field is followed by other fields.
    RemainderNotLast,
    /// A constructor parameter matches no field.
    ConstructorParameterUnmatched,
    /// Two fields resolve to the same constructor parameter.
    DuplicateBinding,
    /// A field can be neither constructor-supplied nor set afterwards.
    UnbindableField,
    /// The declared constant byte length disagrees with the layout.
    ConstantLengthMismatch,
}

/// One collected problem, tied to the field or parameter that caused it.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Code,
    /// Name of the offending field or constructor parameter, if any.
    pub subject: Option<String>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.subject {
            Some(subject) => write!(f, "`{}`: {}", subject, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// An ordered collection of diagnostics.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error<S>(&mut self, code: Code, subject: Option<&str>, message: S)
    where
        S: ToString,
    {
        self.items.push(Diagnostic {
            severity: Severity::Error,
            code,
            subject: subject.map(str::to_owned),
            message: message.to_string(),
        });
    }

    pub fn warning<S>(&mut self, code: Code, subject: Option<&str>, message: S)
    where
        S: ToString,
    {
        self.items.push(Diagnostic {
            severity: Severity::Warning,
            code,
            subject: subject.map(str::to_owned),
            message: message.to_string(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.items
            .iter()
            .any(|diag| diag.severity == Severity::Error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    #[cfg(test)]
    pub fn codes(&self) -> Vec<Code> {
        self.items.iter().map(|diag| diag.code).collect()
    }
}
