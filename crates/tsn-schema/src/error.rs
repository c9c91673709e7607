//! Fatal evaluation errors.
//!
//! Outcomes that are terminal but still meaningful (a circular type, an
//! unsupported spread operand) are `error` schema nodes, not these. An
//! `EvaluationError` aborts the whole request.

use thiserror::Error;
use tsn_common::SourceLocation;

pub type Result<T> = std::result::Result<T, EvaluationError>;

#[derive(Debug, Error)]
pub enum EvaluationError {
    /// A reference names a definition that was never registered.
    #[error("definition `{stable_id}` not found")]
    DefinitionNotFound { stable_id: String },

    /// A symbol or reference has no declaration the resolver knows about.
    #[error("missing declaration for {subject}")]
    MissingDeclaration { subject: String },

    #[error("expected {expected} schema, found {found}")]
    UnexpectedSchema {
        expected: &'static str,
        found: &'static str,
    },

    /// Node kind the value evaluator does not handle (strict mode only).
    #[error("unsupported node kind `{kind}`")]
    UnsupportedNode { kind: &'static str },

    #[error("{location}: while evaluating {subject}: {source}")]
    Contextual {
        location: SourceLocation,
        subject: String,
        #[source]
        source: Box<EvaluationError>,
    },
}

impl EvaluationError {
    /// Attach the location of the node being evaluated. Errors that already
    /// carry a context pass through unchanged, so the innermost location wins.
    pub fn with_context(self, location: SourceLocation, subject: impl Into<String>) -> Self {
        match self {
            Self::Contextual { .. } => self,
            other => Self::Contextual {
                location,
                subject: subject.into(),
                source: Box::new(other),
            },
        }
    }

    pub fn is_contextual(&self) -> bool {
        matches!(self, Self::Contextual { .. })
    }

    /// The error underneath any context wrapper.
    pub fn root_cause(&self) -> &EvaluationError {
        match self {
            Self::Contextual { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
#[path = "../tests/error_tests.rs"]
mod error_tests;
