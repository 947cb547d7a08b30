//! Deserialization from ASL JSON documents.
//!
//! Parsing materializes *builders*, not finished models, and finishes by
//! calling [`crate::builder::StateMachineBuilder::build`]: a document that
//! parses but breaks an invariant still fails, with the full violation
//! list. Structural problems (wrong JSON types, unknown fields, an unknown
//! `Type`) are [`SerializationError`]s instead.

use serde_json::{Map, Value};

use crate::builder::{
    ChoiceBuilder, FailBuilder, MapBuilder, ParallelBuilder, PassBuilder, StateBuilder,
    StateMachineBuilder, SubStateMachineBuilder, SucceedBuilder, TaskBuilder, WaitBuilder,
};
use crate::condition::{ComparisonOperator, Condition, Operand};
use crate::error::{DocumentError, SerializationError};
use crate::machine::StateMachine;
use crate::state::{Catcher, JitterStrategy, OptionalPath, Retrier};

/// Parse a machine from its JSON document form and validate it.
pub fn from_json(doc: &Value) -> Result<StateMachine, DocumentError> {
    let obj = as_object(doc, "state machine document")?;
    check_known(
        obj,
        &["Comment", "StartAt", "TimeoutSeconds", "Version", "States"],
        "state machine document",
    )?;

    let mut builder = StateMachineBuilder::new();
    if let Some(c) = opt_str(obj, "Comment", "state machine document")? {
        builder = builder.comment(c);
    }
    if let Some(s) = opt_str(obj, "StartAt", "state machine document")? {
        builder = builder.start_at(s);
    }
    if let Some(t) = opt_i64(obj, "TimeoutSeconds", "state machine document")? {
        builder = builder.timeout_seconds(t);
    }
    if let Some(v) = opt_str(obj, "Version", "state machine document")? {
        builder = builder.version(v);
    }
    if let Some(states) = obj.get("States") {
        let states = as_object(states, "States")?;
        for (name, state) in states {
            builder = builder.state(name.clone(), parse_state(name, state)?);
        }
    }
    builder.build().map_err(DocumentError::Validation)
}

/// Parse a machine from JSON text.
pub fn from_json_str(src: &str) -> Result<StateMachine, DocumentError> {
    let doc: Value = serde_json::from_str(src).map_err(|e| {
        DocumentError::Serialization(SerializationError::new(format!("malformed JSON: {}", e)))
    })?;
    from_json(&doc)
}

// ── Field readers ───────────────────────────────────────────────────

fn as_object<'a>(v: &'a Value, what: &str) -> Result<&'a Map<String, Value>, SerializationError> {
    v.as_object()
        .ok_or_else(|| SerializationError::new(format!("{} must be a JSON object", what)))
}

fn check_known(
    obj: &Map<String, Value>,
    allowed: &[&str],
    what: &str,
) -> Result<(), SerializationError> {
    for key in obj.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(SerializationError::new(format!(
                "unknown field '{}' in {}",
                key, what
            )));
        }
    }
    Ok(())
}

fn opt_str(
    obj: &Map<String, Value>,
    field: &str,
    what: &str,
) -> Result<Option<String>, SerializationError> {
    match obj.get(field) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(SerializationError::new(format!(
            "{} in {} must be a string",
            field, what
        ))),
    }
}

fn req_str(
    obj: &Map<String, Value>,
    field: &str,
    what: &str,
) -> Result<String, SerializationError> {
    opt_str(obj, field, what)?
        .ok_or_else(|| SerializationError::new(format!("{} is missing required field {}", what, field)))
}

fn opt_i64(
    obj: &Map<String, Value>,
    field: &str,
    what: &str,
) -> Result<Option<i64>, SerializationError> {
    match obj.get(field) {
        None => Ok(None),
        Some(v) => v.as_i64().map(Some).ok_or_else(|| {
            SerializationError::new(format!("{} in {} must be an integer", field, what))
        }),
    }
}

fn opt_f64(
    obj: &Map<String, Value>,
    field: &str,
    what: &str,
) -> Result<Option<f64>, SerializationError> {
    match obj.get(field) {
        None => Ok(None),
        Some(v) => v.as_f64().map(Some).ok_or_else(|| {
            SerializationError::new(format!("{} in {} must be a number", field, what))
        }),
    }
}

/// Tri-state read: absent, explicit null, or a path string.
fn opt_path(
    obj: &Map<String, Value>,
    field: &str,
    what: &str,
) -> Result<OptionalPath, SerializationError> {
    match obj.get(field) {
        None => Ok(OptionalPath::Unset),
        Some(Value::Null) => Ok(OptionalPath::Null),
        Some(Value::String(s)) => Ok(OptionalPath::Path(s.clone())),
        Some(_) => Err(SerializationError::new(format!(
            "{} in {} must be a path string or null",
            field, what
        ))),
    }
}

// ── States ──────────────────────────────────────────────────────────

const COMMON_KEYS: &[&str] = &["Type", "Comment", "InputPath", "OutputPath"];

fn allowed_keys<'a>(variant: &[&'a str]) -> Vec<&'a str> {
    let mut keys: Vec<&'a str> = COMMON_KEYS.to_vec();
    keys.extend_from_slice(variant);
    keys
}

fn parse_state(name: &str, v: &Value) -> Result<StateBuilder, SerializationError> {
    let what = format!("state '{}'", name);
    let obj = as_object(v, &what)?;
    let state_type = req_str(obj, "Type", &what)?;
    match state_type.as_str() {
        "Pass" => parse_pass(obj, &what).map(StateBuilder::Pass),
        "Task" => parse_task(obj, &what).map(StateBuilder::Task),
        "Choice" => parse_choice(obj, &what).map(StateBuilder::Choice),
        "Wait" => parse_wait(obj, &what).map(StateBuilder::Wait),
        "Succeed" => parse_succeed(obj, &what).map(StateBuilder::Succeed),
        "Fail" => parse_fail(obj, &what).map(StateBuilder::Fail),
        "Parallel" => parse_parallel(obj, &what).map(StateBuilder::Parallel),
        "Map" => parse_map(obj, &what).map(StateBuilder::Map),
        other => Err(SerializationError::new(format!(
            "unknown state Type '{}' in {}",
            other, what
        ))),
    }
}

macro_rules! read_common {
    ($builder:expr, $obj:expr, $what:expr) => {{
        let mut b = $builder;
        if let Some(c) = opt_str($obj, "Comment", $what)? {
            b = b.comment(c);
        }
        match opt_path($obj, "InputPath", $what)? {
            OptionalPath::Unset => {}
            OptionalPath::Null => b = b.input_path_null(),
            OptionalPath::Path(p) => b = b.input_path(p),
        }
        match opt_path($obj, "OutputPath", $what)? {
            OptionalPath::Unset => {}
            OptionalPath::Null => b = b.output_path_null(),
            OptionalPath::Path(p) => b = b.output_path(p),
        }
        b
    }};
}

macro_rules! read_result_path {
    ($builder:expr, $obj:expr, $what:expr) => {{
        let mut b = $builder;
        match opt_path($obj, "ResultPath", $what)? {
            OptionalPath::Unset => {}
            OptionalPath::Null => b = b.result_path_null(),
            OptionalPath::Path(p) => b = b.result_path(p),
        }
        b
    }};
}

macro_rules! read_transition {
    ($builder:expr, $obj:expr, $what:expr) => {{
        let mut b = $builder;
        let next = opt_str($obj, "Next", $what)?;
        let end = match $obj.get("End") {
            None => None,
            Some(Value::Bool(flag)) => Some(*flag),
            Some(_) => {
                return Err(SerializationError::new(format!(
                    "End in {} must be a boolean",
                    $what
                )))
            }
        };
        if next.is_some() && end == Some(true) {
            return Err(SerializationError::new(format!(
                "{} sets both Next and End",
                $what
            )));
        }
        if let Some(n) = next {
            b = b.next(n);
        } else if end == Some(true) {
            b = b.end();
        }
        b
    }};
}

fn parse_pass(obj: &Map<String, Value>, what: &str) -> Result<PassBuilder, SerializationError> {
    check_known(
        obj,
        &allowed_keys(&["Result", "Parameters", "ResultPath", "Next", "End"]),
        what,
    )?;
    let mut b = read_common!(crate::builder::pass(), obj, what);
    if let Some(r) = obj.get("Result") {
        b = b.result(r.clone());
    }
    if let Some(p) = obj.get("Parameters") {
        b = b.parameters(p.clone());
    }
    b = read_result_path!(b, obj, what);
    b = read_transition!(b, obj, what);
    Ok(b)
}

fn parse_task(obj: &Map<String, Value>, what: &str) -> Result<TaskBuilder, SerializationError> {
    check_known(
        obj,
        &allowed_keys(&[
            "Resource",
            "TimeoutSeconds",
            "TimeoutSecondsPath",
            "HeartbeatSeconds",
            "HeartbeatSecondsPath",
            "Parameters",
            "ResultSelector",
            "ResultPath",
            "Retry",
            "Catch",
            "Next",
            "End",
        ]),
        what,
    )?;
    let resource = req_str(obj, "Resource", what)?;
    let mut b = read_common!(crate::builder::task(resource), obj, what);
    if let Some(n) = opt_i64(obj, "TimeoutSeconds", what)? {
        b = b.timeout_seconds(n);
    }
    if let Some(p) = opt_str(obj, "TimeoutSecondsPath", what)? {
        b = b.timeout_seconds_path(p);
    }
    if let Some(n) = opt_i64(obj, "HeartbeatSeconds", what)? {
        b = b.heartbeat_seconds(n);
    }
    if let Some(p) = opt_str(obj, "HeartbeatSecondsPath", what)? {
        b = b.heartbeat_seconds_path(p);
    }
    if let Some(p) = obj.get("Parameters") {
        b = b.parameters(p.clone());
    }
    if let Some(sel) = obj.get("ResultSelector") {
        b = b.result_selector(sel.clone());
    }
    b = read_result_path!(b, obj, what);
    for r in parse_retriers(obj, what)? {
        b = b.retrier(r);
    }
    for c in parse_catchers(obj, what)? {
        b = b.catcher(c);
    }
    b = read_transition!(b, obj, what);
    Ok(b)
}

fn parse_choice(obj: &Map<String, Value>, what: &str) -> Result<ChoiceBuilder, SerializationError> {
    check_known(obj, &allowed_keys(&["Choices", "Default"]), what)?;
    let mut b = read_common!(crate::builder::choice(), obj, what);
    if let Some(choices) = obj.get("Choices") {
        let arr = choices.as_array().ok_or_else(|| {
            SerializationError::new(format!("Choices in {} must be an array", what))
        })?;
        for (i, rule) in arr.iter().enumerate() {
            let rule_what = format!("{} choice[{}]", what, i);
            let rule_obj = as_object(rule, &rule_what)?;
            let next = req_str(rule_obj, "Next", &rule_what)?;
            let mut fields = rule_obj.clone();
            fields.remove("Next");
            let condition = parse_condition(&fields, &rule_what)?;
            b = b.when(condition, next);
        }
    }
    if let Some(d) = opt_str(obj, "Default", what)? {
        b = b.default_state(d);
    }
    Ok(b)
}

fn parse_wait(obj: &Map<String, Value>, what: &str) -> Result<WaitBuilder, SerializationError> {
    check_known(
        obj,
        &allowed_keys(&["Seconds", "SecondsPath", "Timestamp", "TimestampPath", "Next", "End"]),
        what,
    )?;
    let mut b = read_common!(crate::builder::wait(), obj, what);
    if let Some(n) = opt_i64(obj, "Seconds", what)? {
        b = b.seconds(n);
    }
    if let Some(p) = opt_str(obj, "SecondsPath", what)? {
        b = b.seconds_path(p);
    }
    if let Some(t) = opt_str(obj, "Timestamp", what)? {
        b = b.timestamp(t);
    }
    if let Some(p) = opt_str(obj, "TimestampPath", what)? {
        b = b.timestamp_path(p);
    }
    b = read_transition!(b, obj, what);
    Ok(b)
}

fn parse_succeed(
    obj: &Map<String, Value>,
    what: &str,
) -> Result<SucceedBuilder, SerializationError> {
    check_known(obj, &["Type", "Comment"], what)?;
    let mut b = crate::builder::succeed();
    if let Some(c) = opt_str(obj, "Comment", what)? {
        b = b.comment(c);
    }
    Ok(b)
}

fn parse_fail(obj: &Map<String, Value>, what: &str) -> Result<FailBuilder, SerializationError> {
    check_known(
        obj,
        &["Type", "Comment", "Error", "ErrorPath", "Cause", "CausePath"],
        what,
    )?;
    let mut b = crate::builder::fail();
    if let Some(c) = opt_str(obj, "Comment", what)? {
        b = b.comment(c);
    }
    if let Some(e) = opt_str(obj, "Error", what)? {
        b = b.error(e);
    }
    if let Some(p) = opt_str(obj, "ErrorPath", what)? {
        b = b.error_path(p);
    }
    if let Some(c) = opt_str(obj, "Cause", what)? {
        b = b.cause(c);
    }
    if let Some(p) = opt_str(obj, "CausePath", what)? {
        b = b.cause_path(p);
    }
    Ok(b)
}

fn parse_parallel(
    obj: &Map<String, Value>,
    what: &str,
) -> Result<ParallelBuilder, SerializationError> {
    check_known(
        obj,
        &allowed_keys(&[
            "Branches",
            "Parameters",
            "ResultSelector",
            "ResultPath",
            "Retry",
            "Catch",
            "Next",
            "End",
        ]),
        what,
    )?;
    let mut b = read_common!(crate::builder::parallel(), obj, what);
    if let Some(branches) = obj.get("Branches") {
        let arr = branches.as_array().ok_or_else(|| {
            SerializationError::new(format!("Branches in {} must be an array", what))
        })?;
        for (i, branch) in arr.iter().enumerate() {
            b = b.branch(parse_sub_machine(branch, &format!("{} branch[{}]", what, i))?);
        }
    }
    if let Some(p) = obj.get("Parameters") {
        b = b.parameters(p.clone());
    }
    if let Some(sel) = obj.get("ResultSelector") {
        b = b.result_selector(sel.clone());
    }
    b = read_result_path!(b, obj, what);
    for r in parse_retriers(obj, what)? {
        b = b.retrier(r);
    }
    for c in parse_catchers(obj, what)? {
        b = b.catcher(c);
    }
    b = read_transition!(b, obj, what);
    Ok(b)
}

fn parse_map(obj: &Map<String, Value>, what: &str) -> Result<MapBuilder, SerializationError> {
    check_known(
        obj,
        &allowed_keys(&[
            "ItemProcessor",
            "ItemsPath",
            "MaxConcurrency",
            "ItemSelector",
            "ResultSelector",
            "ResultPath",
            "Retry",
            "Catch",
            "Next",
            "End",
        ]),
        what,
    )?;
    let mut b = read_common!(crate::builder::map(), obj, what);
    if let Some(p) = obj.get("ItemProcessor") {
        b = b.item_processor(parse_sub_machine(p, &format!("{} item processor", what))?);
    }
    if let Some(p) = opt_str(obj, "ItemsPath", what)? {
        b = b.items_path(p);
    }
    if let Some(n) = opt_i64(obj, "MaxConcurrency", what)? {
        b = b.max_concurrency(n);
    }
    if let Some(sel) = obj.get("ItemSelector") {
        b = b.item_selector(sel.clone());
    }
    if let Some(sel) = obj.get("ResultSelector") {
        b = b.result_selector(sel.clone());
    }
    b = read_result_path!(b, obj, what);
    for r in parse_retriers(obj, what)? {
        b = b.retrier(r);
    }
    for c in parse_catchers(obj, what)? {
        b = b.catcher(c);
    }
    b = read_transition!(b, obj, what);
    Ok(b)
}

fn parse_sub_machine(v: &Value, what: &str) -> Result<SubStateMachineBuilder, SerializationError> {
    let obj = as_object(v, what)?;
    check_known(obj, &["Comment", "StartAt", "States"], what)?;
    let mut b = SubStateMachineBuilder::new();
    if let Some(c) = opt_str(obj, "Comment", what)? {
        b = b.comment(c);
    }
    if let Some(s) = opt_str(obj, "StartAt", what)? {
        b = b.start_at(s);
    }
    if let Some(states) = obj.get("States") {
        let states = as_object(states, &format!("States in {}", what))?;
        for (name, state) in states {
            b = b.state(name.clone(), parse_state(name, state)?);
        }
    }
    Ok(b)
}

// ── Retry / Catch ───────────────────────────────────────────────────

fn parse_error_equals(
    obj: &Map<String, Value>,
    what: &str,
) -> Result<Vec<String>, SerializationError> {
    match obj.get("ErrorEquals") {
        // Leave the list empty; the validator reports it with a pointer path.
        None => Ok(Vec::new()),
        Some(v) => {
            let arr = v.as_array().ok_or_else(|| {
                SerializationError::new(format!("ErrorEquals in {} must be an array", what))
            })?;
            arr.iter()
                .map(|e| {
                    e.as_str().map(str::to_owned).ok_or_else(|| {
                        SerializationError::new(format!(
                            "ErrorEquals in {} must contain only strings",
                            what
                        ))
                    })
                })
                .collect()
        }
    }
}

fn parse_retriers(obj: &Map<String, Value>, what: &str) -> Result<Vec<Retrier>, SerializationError> {
    let Some(v) = obj.get("Retry") else {
        return Ok(Vec::new());
    };
    let arr = v
        .as_array()
        .ok_or_else(|| SerializationError::new(format!("Retry in {} must be an array", what)))?;
    let mut retriers = Vec::with_capacity(arr.len());
    for (i, entry) in arr.iter().enumerate() {
        let entry_what = format!("{} retrier[{}]", what, i);
        let entry = as_object(entry, &entry_what)?;
        check_known(
            entry,
            &[
                "ErrorEquals",
                "IntervalSeconds",
                "MaxAttempts",
                "BackoffRate",
                "MaxDelaySeconds",
                "JitterStrategy",
            ],
            &entry_what,
        )?;
        let mut r = Retrier::for_errors(parse_error_equals(entry, &entry_what)?);
        if let Some(n) = opt_i64(entry, "IntervalSeconds", &entry_what)? {
            r = r.interval_seconds(n);
        }
        if let Some(n) = opt_i64(entry, "MaxAttempts", &entry_what)? {
            r = r.max_attempts(n);
        }
        if let Some(rate) = opt_f64(entry, "BackoffRate", &entry_what)? {
            r = r.backoff_rate(rate);
        }
        if let Some(n) = opt_i64(entry, "MaxDelaySeconds", &entry_what)? {
            r = r.max_delay_seconds(n);
        }
        if let Some(j) = opt_str(entry, "JitterStrategy", &entry_what)? {
            let strategy = JitterStrategy::from_str(&j).ok_or_else(|| {
                SerializationError::new(format!(
                    "JitterStrategy in {} must be FULL or NONE",
                    entry_what
                ))
            })?;
            r = r.jitter_strategy(strategy);
        }
        retriers.push(r);
    }
    Ok(retriers)
}

fn parse_catchers(obj: &Map<String, Value>, what: &str) -> Result<Vec<Catcher>, SerializationError> {
    let Some(v) = obj.get("Catch") else {
        return Ok(Vec::new());
    };
    let arr = v
        .as_array()
        .ok_or_else(|| SerializationError::new(format!("Catch in {} must be an array", what)))?;
    let mut catchers = Vec::with_capacity(arr.len());
    for (i, entry) in arr.iter().enumerate() {
        let entry_what = format!("{} catcher[{}]", what, i);
        let entry = as_object(entry, &entry_what)?;
        check_known(entry, &["ErrorEquals", "ResultPath", "Next"], &entry_what)?;
        let next = req_str(entry, "Next", &entry_what)?;
        let mut c = Catcher::new(parse_error_equals(entry, &entry_what)?, next);
        c = c.result_path(opt_path(entry, "ResultPath", &entry_what)?);
        catchers.push(c);
    }
    Ok(catchers)
}

// ── Conditions ──────────────────────────────────────────────────────

fn parse_condition(
    fields: &Map<String, Value>,
    what: &str,
) -> Result<Condition, SerializationError> {
    let mut variable: Option<String> = None;
    let mut comparison: Option<(ComparisonOperator, &Value)> = None;
    let mut combinator: Option<(&str, &Value)> = None;

    for (key, value) in fields {
        match key.as_str() {
            "Variable" => {
                variable = Some(
                    value
                        .as_str()
                        .ok_or_else(|| {
                            SerializationError::new(format!(
                                "Variable in {} must be a string",
                                what
                            ))
                        })?
                        .to_owned(),
                );
            }
            "And" | "Or" | "Not" => {
                if combinator.is_some() {
                    return Err(SerializationError::new(format!(
                        "{} mixes multiple combinators",
                        what
                    )));
                }
                combinator = Some((key.as_str(), value));
            }
            other => match ComparisonOperator::from_str(other) {
                Some(op) => {
                    if comparison.is_some() {
                        return Err(SerializationError::new(format!(
                            "{} has more than one comparison operator",
                            what
                        )));
                    }
                    comparison = Some((op, value));
                }
                None => {
                    return Err(SerializationError::new(format!(
                        "unknown field '{}' in {}",
                        other, what
                    )));
                }
            },
        }
    }

    match (combinator, variable, comparison) {
        (Some((name, value)), None, None) => match name {
            "Not" => {
                let inner = as_object(value, &format!("Not in {}", what))?;
                Ok(Condition::not(parse_condition(inner, what)?))
            }
            _ => {
                let arr = value.as_array().ok_or_else(|| {
                    SerializationError::new(format!("{} in {} must be an array", name, what))
                })?;
                let children = arr
                    .iter()
                    .map(|c| {
                        let obj = as_object(c, &format!("{} child in {}", name, what))?;
                        parse_condition(obj, what)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(if name == "And" {
                    Condition::and(children)
                } else {
                    Condition::or(children)
                })
            }
        },
        (Some(_), _, _) => Err(SerializationError::new(format!(
            "{} mixes a combinator with a comparison",
            what
        ))),
        (None, Some(variable), Some((operator, value))) => {
            let operand = match value {
                Value::String(s) => Operand::String(s.clone()),
                Value::Number(n) => Operand::Number(n.clone()),
                Value::Bool(b) => Operand::Bool(*b),
                _ => {
                    return Err(SerializationError::new(format!(
                        "{} operand in {} must be a string, number, or boolean",
                        operator.as_str(),
                        what
                    )));
                }
            };
            Ok(Condition::compare(variable, operator, operand))
        }
        (None, _, _) => Err(SerializationError::new(format!(
            "{} must contain either a combinator or a Variable with one comparison operator",
            what
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_minimal_document() {
        let machine = from_json(&json!({
            "StartAt": "Done",
            "States": {"Done": {"Type": "Succeed"}}
        }))
        .unwrap();
        assert_eq!(machine.start_at, "Done");
    }

    #[test]
    fn unknown_top_level_field_rejected() {
        let err = from_json(&json!({
            "StartAt": "Done",
            "Statez": {},
            "States": {"Done": {"Type": "Succeed"}}
        }))
        .unwrap_err();
        assert!(matches!(err, DocumentError::Serialization(_)));
    }

    #[test]
    fn unknown_state_field_rejected() {
        let err = from_json(&json!({
            "StartAt": "Done",
            "States": {"Done": {"Type": "Succeed", "Next": "X"}}
        }))
        .unwrap_err();
        let DocumentError::Serialization(e) = err else {
            panic!("expected serialization error");
        };
        assert!(e.message.contains("Next"));
    }

    #[test]
    fn unknown_type_rejected() {
        let err = from_json(&json!({
            "StartAt": "S",
            "States": {"S": {"Type": "Sleep", "Seconds": 3, "End": true}}
        }))
        .unwrap_err();
        let DocumentError::Serialization(e) = err else {
            panic!("expected serialization error");
        };
        assert!(e.message.contains("Sleep"));
    }

    #[test]
    fn next_and_end_together_rejected() {
        let err = from_json(&json!({
            "StartAt": "P",
            "States": {"P": {"Type": "Pass", "Next": "P", "End": true}}
        }))
        .unwrap_err();
        assert!(matches!(err, DocumentError::Serialization(_)));
    }

    #[test]
    fn end_false_means_no_transition() {
        let err = from_json(&json!({
            "StartAt": "P",
            "States": {"P": {"Type": "Pass", "End": false}}
        }))
        .unwrap_err();
        let DocumentError::Validation(e) = err else {
            panic!("expected validation error");
        };
        assert!(e.has_violation_at("states.P"));
    }

    #[test]
    fn invalid_document_surfaces_validation_error() {
        let err = from_json(&json!({
            "StartAt": "X",
            "States": {"Y": {"Type": "Succeed"}}
        }))
        .unwrap_err();
        let DocumentError::Validation(e) = err else {
            panic!("expected validation error");
        };
        assert!(e.has_violation_at("startAt"));
    }

    #[test]
    fn parse_condition_tree() {
        let machine = from_json(&json!({
            "StartAt": "C",
            "States": {
                "A": {"Type": "Succeed"},
                "C": {
                    "Type": "Choice",
                    "Choices": [
                        {
                            "And": [
                                {"Variable": "$.a", "NumericGreaterThan": 3},
                                {"Not": {"Variable": "$.b", "IsNull": true}}
                            ],
                            "Next": "A"
                        }
                    ],
                    "Default": "A"
                }
            }
        }))
        .unwrap();
        let crate::state::State::Choice(c) = &machine.states["C"] else {
            panic!("expected choice state");
        };
        assert!(matches!(c.choices[0].condition, Condition::And(_)));
    }

    #[test]
    fn condition_with_two_operators_rejected() {
        let err = from_json(&json!({
            "StartAt": "C",
            "States": {
                "A": {"Type": "Succeed"},
                "C": {
                    "Type": "Choice",
                    "Choices": [
                        {"Variable": "$.a", "NumericEquals": 1, "StringEquals": "x", "Next": "A"}
                    ]
                }
            }
        }))
        .unwrap_err();
        assert!(matches!(err, DocumentError::Serialization(_)));
    }

    #[test]
    fn malformed_json_text_rejected() {
        let err = from_json_str("{not json").unwrap_err();
        let DocumentError::Serialization(e) = err else {
            panic!("expected serialization error");
        };
        assert!(e.message.contains("malformed JSON"));
    }
}
