//! Serialization to the ASL JSON document form.
//!
//! Field names are the PascalCase names from the States Language spec and
//! are emitted in a fixed canonical order, so serializing the same machine
//! twice is byte-identical. `states` maps keep their insertion order.

use serde_json::{Map, Value};

use crate::condition::{Choice, Condition, Operand};
use crate::machine::{StateMachine, SubStateMachine};
use crate::state::{
    Catcher, Common, OptionalPath, Retrier, State, Transition, WaitFor,
};

/// Serialize a validated machine to its JSON document.
pub fn to_json(machine: &StateMachine) -> Value {
    let mut m = Map::new();
    if let Some(c) = &machine.comment {
        ins(&mut m, "Comment", Value::String(c.clone()));
    }
    ins(&mut m, "StartAt", Value::String(machine.start_at.clone()));
    if let Some(t) = machine.timeout_seconds {
        ins(&mut m, "TimeoutSeconds", Value::from(t));
    }
    if let Some(v) = &machine.version {
        ins(&mut m, "Version", Value::String(v.clone()));
    }
    ins(&mut m, "States", states_to_json(&machine.states));
    Value::Object(m)
}

/// Compact JSON string form.
pub fn to_json_string(machine: &StateMachine) -> String {
    // Serializing a Value tree cannot fail
    serde_json::to_string(&to_json(machine)).expect("Value serialization is infallible")
}

/// Pretty-printed JSON string form.
pub fn to_json_string_pretty(machine: &StateMachine) -> String {
    serde_json::to_string_pretty(&to_json(machine)).expect("Value serialization is infallible")
}

fn ins(m: &mut Map<String, Value>, key: &str, val: Value) {
    m.insert(key.to_owned(), val);
}

fn states_to_json(states: &indexmap::IndexMap<String, State>) -> Value {
    let mut m = Map::new();
    for (name, state) in states {
        m.insert(name.clone(), state_to_json(state));
    }
    Value::Object(m)
}

fn sub_machine_to_json(sub: &SubStateMachine) -> Value {
    let mut m = Map::new();
    if let Some(c) = &sub.comment {
        ins(&mut m, "Comment", Value::String(c.clone()));
    }
    ins(&mut m, "StartAt", Value::String(sub.start_at.clone()));
    ins(&mut m, "States", states_to_json(&sub.states));
    Value::Object(m)
}

fn ins_common(m: &mut Map<String, Value>, common: &Common) {
    if let Some(c) = &common.comment {
        ins(m, "Comment", Value::String(c.clone()));
    }
    ins_optional_path(m, "InputPath", &common.input_path);
}

fn ins_output_path(m: &mut Map<String, Value>, common: &Common) {
    ins_optional_path(m, "OutputPath", &common.output_path);
}

fn ins_optional_path(m: &mut Map<String, Value>, key: &str, path: &OptionalPath) {
    match path {
        OptionalPath::Unset => {}
        OptionalPath::Null => ins(m, key, Value::Null),
        OptionalPath::Path(p) => ins(m, key, Value::String(p.clone())),
    }
}

fn ins_transition(m: &mut Map<String, Value>, transition: &Transition) {
    match transition {
        Transition::Next(name) => ins(m, "Next", Value::String(name.clone())),
        Transition::End => ins(m, "End", Value::Bool(true)),
    }
}

fn ins_retry_catch(m: &mut Map<String, Value>, retriers: &[Retrier], catchers: &[Catcher]) {
    if !retriers.is_empty() {
        let arr = retriers.iter().map(retrier_to_json).collect();
        ins(m, "Retry", Value::Array(arr));
    }
    if !catchers.is_empty() {
        let arr = catchers.iter().map(catcher_to_json).collect();
        ins(m, "Catch", Value::Array(arr));
    }
}

fn retrier_to_json(r: &Retrier) -> Value {
    let mut m = Map::new();
    ins(
        &mut m,
        "ErrorEquals",
        Value::Array(r.error_equals.iter().cloned().map(Value::String).collect()),
    );
    if let Some(n) = r.interval_seconds {
        ins(&mut m, "IntervalSeconds", Value::from(n));
    }
    if let Some(n) = r.max_attempts {
        ins(&mut m, "MaxAttempts", Value::from(n));
    }
    if let Some(rate) = r.backoff_rate {
        ins(&mut m, "BackoffRate", Value::from(rate));
    }
    if let Some(n) = r.max_delay_seconds {
        ins(&mut m, "MaxDelaySeconds", Value::from(n));
    }
    if let Some(j) = r.jitter_strategy {
        ins(&mut m, "JitterStrategy", Value::String(j.as_str().to_owned()));
    }
    Value::Object(m)
}

fn catcher_to_json(c: &Catcher) -> Value {
    let mut m = Map::new();
    ins(
        &mut m,
        "ErrorEquals",
        Value::Array(c.error_equals.iter().cloned().map(Value::String).collect()),
    );
    ins_optional_path(&mut m, "ResultPath", &c.result_path);
    ins(&mut m, "Next", Value::String(c.next.clone()));
    Value::Object(m)
}

fn state_to_json(state: &State) -> Value {
    let mut m = Map::new();
    ins(
        &mut m,
        "Type",
        Value::String(state.state_type().to_owned()),
    );
    match state {
        State::Pass(s) => {
            ins_common(&mut m, &s.common);
            if let Some(r) = &s.result {
                ins(&mut m, "Result", r.clone());
            }
            if let Some(p) = &s.parameters {
                ins(&mut m, "Parameters", p.clone());
            }
            ins_optional_path(&mut m, "ResultPath", &s.result_path);
            ins_output_path(&mut m, &s.common);
            ins_transition(&mut m, &s.transition);
        }
        State::Task(s) => {
            ins_common(&mut m, &s.common);
            ins(&mut m, "Resource", Value::String(s.resource.clone()));
            if let Some(n) = s.timeout_seconds {
                ins(&mut m, "TimeoutSeconds", Value::from(n));
            }
            if let Some(p) = &s.timeout_seconds_path {
                ins(&mut m, "TimeoutSecondsPath", Value::String(p.clone()));
            }
            if let Some(n) = s.heartbeat_seconds {
                ins(&mut m, "HeartbeatSeconds", Value::from(n));
            }
            if let Some(p) = &s.heartbeat_seconds_path {
                ins(&mut m, "HeartbeatSecondsPath", Value::String(p.clone()));
            }
            if let Some(p) = &s.parameters {
                ins(&mut m, "Parameters", p.clone());
            }
            if let Some(sel) = &s.result_selector {
                ins(&mut m, "ResultSelector", sel.clone());
            }
            ins_optional_path(&mut m, "ResultPath", &s.result_path);
            ins_output_path(&mut m, &s.common);
            ins_retry_catch(&mut m, &s.retriers, &s.catchers);
            ins_transition(&mut m, &s.transition);
        }
        State::Choice(s) => {
            ins_common(&mut m, &s.common);
            let choices = s.choices.iter().map(choice_to_json).collect();
            ins(&mut m, "Choices", Value::Array(choices));
            if let Some(d) = &s.default {
                ins(&mut m, "Default", Value::String(d.clone()));
            }
            ins_output_path(&mut m, &s.common);
        }
        State::Wait(s) => {
            ins_common(&mut m, &s.common);
            match &s.wait_for {
                WaitFor::Seconds(n) => ins(&mut m, "Seconds", Value::from(*n)),
                WaitFor::SecondsPath(p) => {
                    ins(&mut m, "SecondsPath", Value::String(p.clone()))
                }
                WaitFor::Timestamp(t) => ins(&mut m, "Timestamp", Value::String(t.clone())),
                WaitFor::TimestampPath(p) => {
                    ins(&mut m, "TimestampPath", Value::String(p.clone()))
                }
            }
            ins_output_path(&mut m, &s.common);
            ins_transition(&mut m, &s.transition);
        }
        State::Succeed(s) => {
            if let Some(c) = &s.comment {
                ins(&mut m, "Comment", Value::String(c.clone()));
            }
        }
        State::Fail(s) => {
            if let Some(c) = &s.comment {
                ins(&mut m, "Comment", Value::String(c.clone()));
            }
            if let Some(e) = &s.error {
                ins(&mut m, "Error", Value::String(e.clone()));
            }
            if let Some(p) = &s.error_path {
                ins(&mut m, "ErrorPath", Value::String(p.clone()));
            }
            if let Some(c) = &s.cause {
                ins(&mut m, "Cause", Value::String(c.clone()));
            }
            if let Some(p) = &s.cause_path {
                ins(&mut m, "CausePath", Value::String(p.clone()));
            }
        }
        State::Parallel(s) => {
            ins_common(&mut m, &s.common);
            let branches = s.branches.iter().map(sub_machine_to_json).collect();
            ins(&mut m, "Branches", Value::Array(branches));
            if let Some(p) = &s.parameters {
                ins(&mut m, "Parameters", p.clone());
            }
            if let Some(sel) = &s.result_selector {
                ins(&mut m, "ResultSelector", sel.clone());
            }
            ins_optional_path(&mut m, "ResultPath", &s.result_path);
            ins_output_path(&mut m, &s.common);
            ins_retry_catch(&mut m, &s.retriers, &s.catchers);
            ins_transition(&mut m, &s.transition);
        }
        State::Map(s) => {
            ins_common(&mut m, &s.common);
            ins(&mut m, "ItemProcessor", sub_machine_to_json(&s.item_processor));
            if let Some(p) = &s.items_path {
                ins(&mut m, "ItemsPath", Value::String(p.clone()));
            }
            if let Some(n) = s.max_concurrency {
                ins(&mut m, "MaxConcurrency", Value::from(n));
            }
            if let Some(sel) = &s.item_selector {
                ins(&mut m, "ItemSelector", sel.clone());
            }
            if let Some(sel) = &s.result_selector {
                ins(&mut m, "ResultSelector", sel.clone());
            }
            ins_optional_path(&mut m, "ResultPath", &s.result_path);
            ins_output_path(&mut m, &s.common);
            ins_retry_catch(&mut m, &s.retriers, &s.catchers);
            ins_transition(&mut m, &s.transition);
        }
    }
    Value::Object(m)
}

fn choice_to_json(choice: &Choice) -> Value {
    let mut m = condition_fields(&choice.condition);
    ins(&mut m, "Next", Value::String(choice.next.clone()));
    Value::Object(m)
}

/// The JSON object fields of a condition, without a `Next` (nested
/// conditions have none).
fn condition_fields(condition: &Condition) -> Map<String, Value> {
    let mut m = Map::new();
    match condition {
        Condition::And(children) => {
            let arr = children
                .iter()
                .map(|c| Value::Object(condition_fields(c)))
                .collect();
            ins(&mut m, "And", Value::Array(arr));
        }
        Condition::Or(children) => {
            let arr = children
                .iter()
                .map(|c| Value::Object(condition_fields(c)))
                .collect();
            ins(&mut m, "Or", Value::Array(arr));
        }
        Condition::Not(child) => {
            ins(&mut m, "Not", Value::Object(condition_fields(child)));
        }
        Condition::Comparison {
            variable,
            operator,
            operand,
        } => {
            ins(&mut m, "Variable", Value::String(variable.clone()));
            let operand_value = match operand {
                Operand::String(s) => Value::String(s.clone()),
                Operand::Number(n) => Value::Number(n.clone()),
                Operand::Bool(b) => Value::Bool(*b),
            };
            ins(&mut m, operator.as_str(), operand_value);
        }
    }
    m
}
