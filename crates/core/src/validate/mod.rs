//! Structural validation -- every invariant the ASL spec imposes on a
//! well-formed document, checked in one pass.
//!
//! Unlike a parser, the validator never stops at the first problem: it
//! walks the whole machine, including every Parallel branch and Map item
//! processor, and reports the full violation list with pointer paths like
//! `states.Foo.retriers[1].maxAttempts`. Each sub-machine is its own
//! name scope; transitions cannot cross scope boundaries.

mod choice;
mod retry;
mod state;

use indexmap::IndexMap;

use crate::error::{ValidationError, Violation};
use crate::machine::StateMachine;
use crate::state::State;

/// Validate a candidate machine, echoing it back untouched on success.
pub fn validate(machine: &StateMachine) -> Result<(), ValidationError> {
    let violations = check(machine);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(violations))
    }
}

/// Collect every violation in the machine. Empty means valid.
pub fn check(machine: &StateMachine) -> Vec<Violation> {
    let mut violations = Vec::new();
    if let Some(t) = machine.timeout_seconds {
        if t <= 0 {
            violations.push(Violation::new(
                "timeoutSeconds",
                "must be a positive integer",
            ));
        }
    }
    check_scope("", &machine.start_at, &machine.states, &mut violations);
    violations
}

/// One naming scope: the top-level machine, a Parallel branch, or a Map
/// item processor. `prefix` is empty for the top level.
pub(crate) fn check_scope(
    prefix: &str,
    start_at: &str,
    states: &IndexMap<String, State>,
    violations: &mut Vec<Violation>,
) {
    if states.is_empty() {
        violations.push(Violation::new(
            join(prefix, "states"),
            "must contain at least one state",
        ));
    }
    if start_at.is_empty() {
        violations.push(Violation::new(
            join(prefix, "startAt"),
            "is required and must be a non-empty string",
        ));
    } else if !states.contains_key(start_at) {
        violations.push(Violation::new(
            join(prefix, "startAt"),
            format!("names unknown state '{}'", start_at),
        ));
    }
    for (name, st) in states {
        let state_path = join(prefix, &format!("states.{}", name));
        state::check_state(&state_path, st, states, violations);
    }
}

pub(crate) fn join(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

/// Check that a `Next` target names a sibling state in the same scope.
pub(crate) fn check_target(
    path: &str,
    target: &str,
    states: &IndexMap<String, State>,
    violations: &mut Vec<Violation>,
) {
    if !states.contains_key(target) {
        violations.push(Violation::new(
            path,
            format!("transition targets unknown state '{}'", target),
        ));
    }
}
