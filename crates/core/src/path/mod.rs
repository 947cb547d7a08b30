//! Path expressions: JSONPath reads and Reference Path writes.
//!
//! ASL uses two path grammars. Read positions (`InputPath`, `OutputPath`,
//! choice `Variable`s) take a JSONPath that may select many values; write
//! positions (`ResultPath`, `ItemsPath`, `*Path` operands) take the
//! restricted Reference Path that addresses exactly one location.

pub mod jsonpath;
pub mod refpath;

pub use jsonpath::JsonPath;
pub use refpath::{RefPath, RefToken};

use std::fmt;

/// A path expression that failed to parse, with the offending offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathError {
    pub path: String,
    pub position: usize,
    pub message: String,
}

impl PathError {
    pub(crate) fn new(path: &str, position: usize, message: impl Into<String>) -> Self {
        PathError {
            path: path.to_string(),
            position,
            message: message.into(),
        }
    }
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid path '{}' at offset {}: {}",
            self.path, self.position, self.message
        )
    }
}

impl std::error::Error for PathError {}
