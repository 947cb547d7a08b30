//! Runtime error taxonomy for evaluation, data flow, and intrinsics.

use serde_json::Value;
use std::fmt;

use stateslang_core::error::{DocumentError, SerializationError, ValidationError};

/// What went wrong inside a condition evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionErrorKind {
    /// The variable path selected nothing where a value was required.
    NoMatch { path: String },
    /// The variable path selected more than one value.
    MultipleMatches { path: String },
    /// A numeric comparator was applied to a non-number.
    NotANumber { path: String },
    /// A string comparator was applied to a non-string.
    NotAString { path: String },
    /// BooleanEquals was applied to a non-boolean.
    NotABoolean { path: String },
    /// A timestamp comparator met a string that is not ISO-8601.
    MalformedTimestamp { value: String },
    /// The variable or operand path does not parse.
    InvalidPath { path: String },
    /// A StringMatches pattern with a bad escape sequence.
    InvalidPattern { pattern: String },
}

impl fmt::Display for ConditionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionErrorKind::NoMatch { path } => {
                write!(f, "path '{}' matched no value", path)
            }
            ConditionErrorKind::MultipleMatches { path } => {
                write!(f, "path '{}' matched more than one value", path)
            }
            ConditionErrorKind::NotANumber { path } => {
                write!(f, "value at '{}' is not a number", path)
            }
            ConditionErrorKind::NotAString { path } => {
                write!(f, "value at '{}' is not a string", path)
            }
            ConditionErrorKind::NotABoolean { path } => {
                write!(f, "value at '{}' is not a boolean", path)
            }
            ConditionErrorKind::MalformedTimestamp { value } => {
                write!(f, "'{}' is not an ISO-8601 timestamp", value)
            }
            ConditionErrorKind::InvalidPath { path } => {
                write!(f, "'{}' is not a valid path", path)
            }
            ConditionErrorKind::InvalidPattern { pattern } => {
                write!(f, "'{}' is not a valid match pattern", pattern)
            }
        }
    }
}

/// Errors raised while evaluating conditions, running the I/O pipeline,
/// or invoking intrinsic functions. Evaluation fails fast: the first
/// error wins.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// A JSONPath selected zero values where at least one was required.
    #[error("path '{path}' matched nothing in the input")]
    PathMatchFailure { path: String, input: Value },

    /// A `.$` template substitution could not be resolved.
    #[error("could not resolve '{path}' during payload template substitution")]
    ParameterPathFailure { path: String, input: Value },

    /// A result cannot be merged into the input at the reference path.
    #[error("result path '{path}' cannot be applied to the input")]
    ResultPathMatchFailure {
        path: String,
        input: Value,
        result: Value,
    },

    /// The intrinsic expression does not parse.
    #[error("intrinsic function syntax error at offset {position}: {message}")]
    IntrinsicFunctionSyntaxError { position: usize, message: String },

    /// No function registered under this name.
    #[error("intrinsic function not found: {name}")]
    IntrinsicFunctionNotFound { name: String },

    /// A function rejected one of its (eagerly resolved) arguments.
    #[error("{name} argument {arg_index}: {reason}")]
    IntrinsicFunctionArgumentError {
        name: String,
        arg_index: usize,
        reason: String,
    },

    /// A condition could not be evaluated.
    #[error("condition error: {kind}")]
    ConditionError { kind: ConditionErrorKind },

    /// No choice rule matched and the Choice state has no Default.
    #[error("States.NoChoiceMatched: no choice rule matched and no default is set")]
    NoChoiceMatched,
}

impl EvalError {
    pub(crate) fn condition(kind: ConditionErrorKind) -> EvalError {
        EvalError::ConditionError { kind }
    }

    pub(crate) fn argument(
        name: &str,
        arg_index: usize,
        reason: impl Into<String>,
    ) -> EvalError {
        EvalError::IntrinsicFunctionArgumentError {
            name: name.to_string(),
            arg_index,
            reason: reason.into(),
        }
    }
}

/// The root of the error taxonomy: anything this library can report.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatesLanguageError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Serialization(#[from] SerializationError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl From<DocumentError> for StatesLanguageError {
    fn from(e: DocumentError) -> Self {
        match e {
            DocumentError::Validation(v) => StatesLanguageError::Validation(v),
            DocumentError::Serialization(s) => StatesLanguageError::Serialization(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display_carries_context() {
        let e = EvalError::PathMatchFailure {
            path: "$.missing".to_string(),
            input: json!({}),
        };
        assert!(e.to_string().contains("$.missing"));

        let e = EvalError::argument("States.Hash", 1, "unknown algorithm");
        assert_eq!(
            e.to_string(),
            "States.Hash argument 1: unknown algorithm"
        );
    }

    #[test]
    fn root_error_wraps_every_family() {
        let v: StatesLanguageError = ValidationError::new(vec![]).into();
        assert!(matches!(v, StatesLanguageError::Validation(_)));
        let s: StatesLanguageError = SerializationError::new("x").into();
        assert!(matches!(s, StatesLanguageError::Serialization(_)));
        let e: StatesLanguageError = EvalError::NoChoiceMatched.into();
        assert!(matches!(e, StatesLanguageError::Eval(_)));
    }
}
