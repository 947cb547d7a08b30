use serde::{Deserialize, Serialize};
use std::fmt;

/// A single invariant violation found by the validator.
///
/// `path` is a pointer into the document using the machine's own field
/// names, e.g. `states.Foo.retriers[1].maxAttempts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Violation {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// All invariant violations in a candidate machine, reported at once.
///
/// The validator never short-circuits: `violations` holds every problem
/// found, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn new(violations: Vec<Violation>) -> Self {
        ValidationError { violations }
    }

    /// True if any violation is anchored at the given pointer path.
    pub fn has_violation_at(&self, path: &str) -> bool {
        self.violations.iter().any(|v| v.path == path)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} violation(s):", self.violations.len())?;
        for v in &self.violations {
            write!(f, "\n  {}", v)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Malformed document structure: bad JSON shape, an unknown `Type`, an
/// unrecognized field, or a field of the wrong JSON type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("serialization error: {message}")]
pub struct SerializationError {
    pub message: String,
}

impl SerializationError {
    pub fn new(message: impl Into<String>) -> Self {
        SerializationError {
            message: message.into(),
        }
    }
}

/// Errors from reading a document: either the JSON does not describe a
/// machine at all, or it does but the machine breaks an invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error(transparent)]
    Serialization(#[from] SerializationError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
