//! stateslang-core: Amazon States Language document model.
//!
//! Construction, validation, and JSON round-tripping for ASL workflow
//! definitions. This crate never executes anything: it models documents,
//! enforces the structural invariants of the States Language spec, and
//! maps the model to and from the ASL JSON surface.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root:
//!
//! - [`StateMachine`] / [`SubStateMachine`] -- the validated model
//! - [`builder`] -- one factory per state variant; `StateMachineBuilder::build()`
//!   is the validation gate
//! - [`from_json`] / [`from_json_str`] -- parse + validate a document
//! - [`validate()`] -- re-check an assembled machine
//! - [`JsonPath`] / [`RefPath`] -- the two path grammars
//! - [`ValidationError`], [`SerializationError`], [`DocumentError`]

pub mod builder;
pub mod condition;
pub mod de;
pub mod error;
pub mod machine;
pub mod path;
pub mod ser;
pub mod state;
pub mod validate;

// ── Convenience re-exports: model ────────────────────────────────────

pub use condition::{Choice, ComparisonOperator, Condition, Operand, OperandKind};
pub use machine::{StateMachine, SubStateMachine};
pub use state::{
    Catcher, Common, JitterStrategy, OptionalPath, Retrier, State, Transition, WaitFor,
};

// ── Convenience re-exports: entry points ─────────────────────────────

pub use builder::{StateMachineBuilder, SubStateMachineBuilder};
pub use de::{from_json, from_json_str};
pub use error::{DocumentError, SerializationError, ValidationError, Violation};
pub use path::{JsonPath, PathError, RefPath};
pub use ser::{to_json, to_json_string, to_json_string_pretty};
pub use validate::validate;
