//! End-to-end scenarios over parsed documents: choice dispatch, the full
//! data-flow pipeline, fail paths, and a golden table for every standard
//! intrinsic function.

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use stateslang_core::state::OptionalPath;
use stateslang_core::{from_json, State};
use stateslang_eval::{
    choose_next, parse_intrinsic, EvalError, IntrinsicRegistry, IoProcessor,
};

fn call(expr: &str, input: &Value, context: &Value) -> Result<Value, EvalError> {
    let registry = IntrinsicRegistry::standard();
    let parsed = parse_intrinsic(expr)?;
    registry.call(&parsed, input, context)
}

fn ok(expr: &str, input: &Value) -> Value {
    call(expr, input, &json!({})).unwrap()
}

fn unset() -> OptionalPath {
    OptionalPath::Unset
}

fn path(p: &str) -> OptionalPath {
    OptionalPath::Path(p.to_string())
}

// ── Choice dispatch ─────────────────────────────────────────────────

#[test]
fn choice_rules_evaluate_in_declaration_order() {
    let machine = from_json(&json!({
        "StartAt": "Route",
        "States": {
            "Route": {
                "Type": "Choice",
                "Choices": [
                    {"Variable": "$.v", "NumericLessThan": 10, "Next": "A"},
                    {"Variable": "$.v", "NumericLessThan": 100, "Next": "B"}
                ],
                "Default": "D"
            },
            "A": {"Type": "Succeed"},
            "B": {"Type": "Succeed"},
            "D": {"Type": "Succeed"}
        }
    }))
    .unwrap();
    let State::Choice(route) = &machine.states["Route"] else {
        panic!("expected choice state");
    };
    // v=5 satisfies both rules; the first declared wins.
    assert_eq!(choose_next(route, &json!({"v": 5})).unwrap(), "A");
    assert_eq!(choose_next(route, &json!({"v": 50})).unwrap(), "B");
    assert_eq!(choose_next(route, &json!({"v": 5000})).unwrap(), "D");
}

// ── Data-flow pipeline ──────────────────────────────────────────────

#[test]
fn identity_input_pipeline() {
    let io = IoProcessor::new();
    for input in [
        json!({"a": 1}),
        json!([1, 2, 3]),
        json!("scalar"),
        json!(null),
        json!({}),
    ] {
        let out = io
            .effective_input(&input, &unset(), None, &json!({}))
            .unwrap();
        assert_eq!(out, input);
    }
}

#[test]
fn null_output_path_discards_everything() {
    let io = IoProcessor::new();
    let out = io
        .effective_output(
            &json!({"a": 1}),
            &json!({"r": 2}),
            &OptionalPath::Null,
            &path("$"),
        )
        .unwrap();
    assert_eq!(out, json!({}));
}

#[test]
fn null_result_path_passes_input_through() {
    let io = IoProcessor::new();
    let out = io
        .effective_output(
            &json!({"a": 1}),
            &json!({"r": 2}),
            &unset(),
            &OptionalPath::Null,
        )
        .unwrap();
    assert_eq!(out, json!({"a": 1}));
}

#[test]
fn result_path_builds_a_nested_skeleton() {
    let io = IoProcessor::new();
    let out = io
        .effective_output(&json!({"a": 1}), &json!(42), &unset(), &path("$.b.c"))
        .unwrap();
    assert_eq!(out, json!({"a": 1, "b": {"c": 42}}));
}

#[test]
fn parameters_template_draws_from_input_context_and_intrinsics() {
    let io = IoProcessor::new();
    let out = io
        .effective_input(
            &json!({"n": [1, 2, 3]}),
            &unset(),
            Some(&json!({
                "who.$": "$.n",
                "run.$": "$$.ExecutionId",
                "len.$": "States.ArrayLength($.n)"
            })),
            &json!({"ExecutionId": "e-1"}),
        )
        .unwrap();
    assert_eq!(out, json!({"who": [1, 2, 3], "run": "e-1", "len": 3}));
}

#[test]
fn fail_path_value_must_be_a_string() {
    let io = IoProcessor::new();
    let err = io
        .fail_path_value(&json!({"msg": 42}), "$.msg", &json!({}))
        .unwrap_err();
    assert!(matches!(err, EvalError::PathMatchFailure { .. }));
}

#[test]
fn multi_token_matches_wrap_in_an_array() {
    let io = IoProcessor::new();
    let input = json!({"orders": [{"id": "a"}, {"id": "b"}]});
    let out = io
        .effective_input(&input, &path("$.orders[*].id"), None, &json!({}))
        .unwrap();
    assert_eq!(out, json!(["a", "b"]));
}

/// The whole pipeline as a parsed Task state would run it.
#[test]
fn full_pipeline_through_a_parsed_state() {
    let machine = from_json(&json!({
        "StartAt": "Ship",
        "States": {
            "Ship": {
                "Type": "Task",
                "Resource": "arn:aws:states:::lambda:invoke",
                "InputPath": "$.order",
                "Parameters": {"id.$": "$.id", "stamp.$": "$$.RunId"},
                "ResultSelector": {"code.$": "$.status"},
                "ResultPath": "$.shipment",
                "OutputPath": "$.shipment",
                "End": true
            }
        }
    }))
    .unwrap();
    let State::Task(task) = &machine.states["Ship"] else {
        panic!("expected task state");
    };

    let io = IoProcessor::new();
    let raw_input = json!({"order": {"id": "o-1"}, "noise": true});
    let context = json!({"RunId": "r-77"});

    let effective_input = io
        .effective_input(
            &raw_input,
            &task.common.input_path,
            task.parameters.as_ref(),
            &context,
        )
        .unwrap();
    assert_eq!(effective_input, json!({"id": "o-1", "stamp": "r-77"}));

    // What the external execution would have returned.
    let raw_result = json!({"status": 200, "body": "ignored"});
    let effective_result = io
        .effective_result(&raw_result, task.result_selector.as_ref(), &context)
        .unwrap();
    assert_eq!(effective_result, json!({"code": 200}));

    let output = io
        .effective_output(
            &effective_input,
            &effective_result,
            &task.common.output_path,
            &task.result_path,
        )
        .unwrap();
    assert_eq!(output, json!({"code": 200}));
}

// ── Registry behavior ───────────────────────────────────────────────

#[test]
fn registered_function_observes_eager_left_to_right_resolution() {
    let calls: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let mut registry = IntrinsicRegistry::standard();

    let log = Arc::clone(&calls);
    registry.register("Test.Record", move |args, _, _| {
        let tag = args
            .first()
            .and_then(Value::as_str)
            .unwrap_or("?")
            .to_string();
        log.lock().unwrap().push(tag);
        Ok(json!(null))
    });

    let expr = "States.Array(Test.Record('first'), Test.Record('second'))";
    let parsed = parse_intrinsic(expr).unwrap();
    registry.call(&parsed, &json!({}), &json!({})).unwrap();
    assert_eq!(*calls.lock().unwrap(), vec!["first", "second"]);
}

#[test]
fn and_stops_at_the_first_false_child() {
    use stateslang_core::{ComparisonOperator, Condition, Operand};
    // The second child references a missing path and would error if
    // evaluated; short-circuiting means it never is.
    let condition = Condition::and(vec![
        Condition::compare(
            "$.a",
            ComparisonOperator::NumericEquals,
            Operand::Number(99.into()),
        ),
        Condition::compare(
            "$.gone",
            ComparisonOperator::NumericEquals,
            Operand::Number(1.into()),
        ),
    ]);
    assert!(!stateslang_eval::evaluate(&condition, &json!({"a": 1})).unwrap());
}

// ── Intrinsic golden table ──────────────────────────────────────────

#[test]
fn golden_format() {
    let input = json!({"name": "Grace", "age": 84});
    assert_eq!(
        ok("States.Format('Hi {} you are {}', $.name, $.age)", &input),
        json!("Hi Grace you are 84")
    );
}

#[test]
fn golden_json_conversions() {
    let input = json!({"text": "{\"a\": 1}", "value": {"a": [1, 2]}});
    assert_eq!(ok("States.StringToJson($.text)", &input), json!({"a": 1}));
    assert_eq!(
        ok("States.JsonToString($.value)", &input),
        json!("{\"a\":[1,2]}")
    );
    assert!(call("States.StringToJson('not json')", &json!({}), &json!({})).is_err());
}

#[test]
fn golden_array_family() {
    let input = json!({"three": 3, "xs": [1, 2, 3, 4, 5]});
    assert_eq!(
        ok("States.Array(1, 'two', $.three)", &input),
        json!([1, "two", 3])
    );
    assert_eq!(
        ok("States.ArrayPartition($.xs, 2)", &input),
        json!([[1, 2], [3, 4], [5]])
    );
    assert_eq!(ok("States.ArrayContains($.xs, 3)", &input), json!(true));
    assert_eq!(ok("States.ArrayContains($.xs, 9)", &input), json!(false));
    assert_eq!(
        ok("States.ArrayRange(1, 9, 2)", &input),
        json!([1, 3, 5, 7, 9])
    );
    assert_eq!(ok("States.ArrayGetItem($.xs, 1)", &input), json!(2));
    assert_eq!(ok("States.ArrayLength($.xs)", &input), json!(5));
    assert_eq!(
        ok("States.ArrayUnique(States.Array(1, 2, 1, 3, 2))", &input),
        json!([1, 2, 3])
    );

    assert!(call("States.ArrayPartition($.xs, 0)", &input, &json!({})).is_err());
    assert!(call("States.ArrayRange(1, 9, 0)", &input, &json!({})).is_err());
    assert!(call("States.ArrayGetItem($.xs, 99)", &input, &json!({})).is_err());
    assert!(call("States.ArrayLength($.three)", &input, &json!({})).is_err());
}

#[test]
fn golden_encoding_and_hashing() {
    let empty = json!({});
    assert_eq!(ok("States.Base64Encode('hello')", &empty), json!("aGVsbG8="));
    assert_eq!(ok("States.Base64Decode('aGVsbG8=')", &empty), json!("hello"));
    assert!(call("States.Base64Decode('!!!')", &empty, &json!({})).is_err());

    assert_eq!(
        ok("States.Hash('input data', 'SHA-1')", &empty),
        json!("aaff4a450a104cd177d28d18d74485e8cae074b7")
    );
    assert_eq!(
        ok("States.Hash('input data', 'MD5')", &empty),
        json!("812f45842bc6d66ee14572ce20db8e86")
    );
    assert!(call("States.Hash('x', 'CRC32')", &empty, &json!({})).is_err());
}

#[test]
fn golden_math() {
    let empty = json!({});
    assert_eq!(ok("States.MathAdd(2, 3)", &empty), json!(5));
    assert_eq!(ok("States.MathAdd(-2, -3)", &empty), json!(-5));
    assert!(call("States.MathAdd('a', 1)", &empty, &json!({})).is_err());

    let seeded = ok("States.MathRandom(10, 20, 7)", &empty);
    assert_eq!(seeded, ok("States.MathRandom(10, 20, 7)", &empty));
    let n = seeded.as_i64().unwrap();
    assert!((10..20).contains(&n));

    let unseeded = ok("States.MathRandom(10, 20)", &empty)
        .as_i64()
        .unwrap();
    assert!((10..20).contains(&unseeded));
    assert!(call("States.MathRandom(5, 5)", &empty, &json!({})).is_err());
}

#[test]
fn golden_string_family() {
    let empty = json!({});
    assert_eq!(
        ok("States.StringSplit('a,b.c', ',.')", &empty),
        json!(["a", "b", "c"])
    );
    assert_eq!(ok("States.StringToUpper('Grace')", &empty), json!("GRACE"));
    assert_eq!(ok("States.StringToLower('Grace')", &empty), json!("grace"));
    assert!(call("States.StringToUpper(1)", &empty, &json!({})).is_err());
}

#[test]
fn golden_uuid_and_now() {
    let empty = json!({});
    let uuid = ok("States.UUID()", &empty);
    let uuid = uuid.as_str().unwrap();
    assert_eq!(uuid.len(), 36);
    for i in [8, 13, 18, 23] {
        assert_eq!(&uuid[i..i + 1], "-");
    }
    assert_eq!(&uuid[14..15], "4");
    assert!(call("States.UUID(1)", &empty, &json!({})).is_err());

    let now = ok("States.Now()", &empty);
    assert!(chrono::DateTime::parse_from_rfc3339(now.as_str().unwrap()).is_ok());
}

#[test]
fn golden_json_merge() {
    let input = json!({
        "a": {"k": {"x": 1, "y": 2}, "keep": true},
        "b": {"k": {"y": 9, "z": 3}}
    });
    assert_eq!(
        ok("States.JsonMerge($.a, $.b, false)", &input),
        json!({"k": {"y": 9, "z": 3}, "keep": true})
    );
    assert_eq!(
        ok("States.JsonMerge($.a, $.b, true)", &input),
        json!({"k": {"x": 1, "y": 9, "z": 3}, "keep": true})
    );
    assert!(call("States.JsonMerge($.a, 1, true)", &input, &json!({})).is_err());
}

#[test]
fn arity_violations_report_the_function_name() {
    let err = call("States.ArrayLength()", &json!({}), &json!({})).unwrap_err();
    let EvalError::IntrinsicFunctionArgumentError { name, .. } = err else {
        panic!("expected argument error");
    };
    assert_eq!(name, "States.ArrayLength");
}
