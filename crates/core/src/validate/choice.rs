//! Choice-state and condition-tree checks.

use indexmap::IndexMap;

use crate::condition::{Condition, Operand};
use crate::error::Violation;
use crate::path::{JsonPath, RefPath};
use crate::state::{ChoiceState, State};

use super::check_target;

pub(super) fn check_choice_state(
    path: &str,
    s: &ChoiceState,
    siblings: &IndexMap<String, State>,
    violations: &mut Vec<Violation>,
) {
    if s.choices.is_empty() {
        violations.push(Violation::new(
            format!("{}.choices", path),
            "must contain at least one choice rule",
        ));
    }
    for (i, choice) in s.choices.iter().enumerate() {
        let choice_path = format!("{}.choices[{}]", path, i);
        check_condition(&choice_path, &choice.condition, violations);
        check_target(
            &format!("{}.next", choice_path),
            &choice.next,
            siblings,
            violations,
        );
    }
    if let Some(default) = &s.default {
        if !siblings.contains_key(default) {
            violations.push(Violation::new(
                format!("{}.default", path),
                format!("names unknown state '{}'", default),
            ));
        }
    }
}

fn check_condition(path: &str, condition: &Condition, violations: &mut Vec<Violation>) {
    match condition {
        Condition::And(children) => check_children(path, "and", children, violations),
        Condition::Or(children) => check_children(path, "or", children, violations),
        Condition::Not(child) => check_condition(&format!("{}.not", path), child, violations),
        Condition::Comparison {
            variable,
            operator,
            operand,
        } => {
            if let Err(e) = JsonPath::parse(variable) {
                violations.push(Violation::new(format!("{}.variable", path), e.to_string()));
            }
            let kind = operator.operand_kind();
            if !operand.kind_matches(kind) {
                violations.push(Violation::new(
                    format!("{}.operand", path),
                    format!("{} operand has the wrong type", operator.as_str()),
                ));
            } else if kind == crate::condition::OperandKind::Path {
                if let Operand::String(p) = operand {
                    if let Err(e) = RefPath::parse(p) {
                        violations.push(Violation::new(format!("{}.operand", path), e.to_string()));
                    }
                }
            }
        }
    }
}

fn check_children(
    path: &str,
    combinator: &str,
    children: &[Condition],
    violations: &mut Vec<Violation>,
) {
    if children.is_empty() {
        violations.push(Violation::new(
            format!("{}.{}", path, combinator),
            "must contain at least one condition",
        ));
    }
    for (i, child) in children.iter().enumerate() {
        check_condition(&format!("{}.{}[{}]", path, combinator, i), child, violations);
    }
}
