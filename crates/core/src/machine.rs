//! Top-level machine records.
//!
//! `states` maps preserve insertion order: ASL documents are
//! order-significant (choice evaluation order, deterministic JSON
//! emission), so the model keeps the order the document declared.

use indexmap::IndexMap;

use crate::state::State;

/// A validated top-level state machine.
///
/// Instances only come out of [`crate::builder::StateMachineBuilder::build`]
/// or [`crate::de::from_json`], both of which run the validator, so a value
/// of this type always satisfies every structural invariant. The type is
/// immutable once built and safe to share between readers.
#[derive(Debug, Clone, PartialEq)]
pub struct StateMachine {
    pub comment: Option<String>,
    pub start_at: String,
    pub timeout_seconds: Option<i64>,
    pub version: Option<String>,
    pub states: IndexMap<String, State>,
}

impl StateMachine {
    /// Serialize to the ASL JSON document form.
    pub fn to_json(&self) -> serde_json::Value {
        crate::ser::to_json(self)
    }

    /// Serialize to a compact JSON string.
    pub fn to_json_string(&self) -> String {
        crate::ser::to_json_string(self)
    }

    /// Serialize to a pretty-printed JSON string.
    pub fn to_json_string_pretty(&self) -> String {
        crate::ser::to_json_string_pretty(self)
    }
}

/// A branch of a Parallel state or the item processor of a Map state.
///
/// Same shape as [`StateMachine`] minus the top-level-only fields, and a
/// scope of its own: state names inside do not collide with, and cannot be
/// targeted from, the enclosing machine.
#[derive(Debug, Clone, PartialEq)]
pub struct SubStateMachine {
    pub comment: Option<String>,
    pub start_at: String,
    pub states: IndexMap<String, State>,
}
