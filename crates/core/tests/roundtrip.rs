//! Round-trip laws: parse(serialize(m)) preserves the model, and
//! serialize(parse(serialize(m))) is byte-identical.

use serde_json::json;
use stateslang_core::builder::{self, StateMachineBuilder, SubStateMachineBuilder};
use stateslang_core::{
    from_json, from_json_str, Catcher, ComparisonOperator, Condition, JitterStrategy, Operand,
    OptionalPath, Retrier, StateMachine,
};

/// A machine exercising every state variant and most optional fields.
fn full_machine() -> StateMachine {
    StateMachineBuilder::new()
        .comment("order intake pipeline")
        .start_at("CheckInput")
        .timeout_seconds(300)
        .version("1.0")
        .state(
            "CheckInput",
            builder::choice()
                .input_path("$.order")
                .when(
                    Condition::and(vec![
                        Condition::compare(
                            "$.total",
                            ComparisonOperator::NumericGreaterThanEquals,
                            Operand::Number(0.into()),
                        ),
                        Condition::compare(
                            "$.id",
                            ComparisonOperator::IsPresent,
                            Operand::Bool(true),
                        ),
                    ]),
                    "Normalize",
                )
                .when(
                    Condition::not(Condition::compare(
                        "$.id",
                        ComparisonOperator::StringMatches,
                        Operand::String("ord-*".to_string()),
                    )),
                    "Reject",
                )
                .default_state("Reject"),
        )
        .state(
            "Normalize",
            builder::pass()
                .result(json!({"normalized": true}))
                .result_path("$.meta")
                .next("Persist"),
        )
        .state(
            "Persist",
            builder::task("arn:aws:states:::dynamodb:putItem")
                .timeout_seconds(30)
                .heartbeat_seconds(10)
                .parameters(json!({"TableName": "orders", "Item.$": "$.order"}))
                .result_selector(json!({"status.$": "$.SdkHttpMetadata.HttpStatusCode"}))
                .result_path("$.persist")
                .retrier(
                    Retrier::for_errors(["States.Timeout", "States.TaskFailed"])
                        .interval_seconds(2)
                        .max_attempts(2)
                        .backoff_rate(1.5),
                )
                .retrier(
                    Retrier::for_errors(["States.ALL"])
                        .max_delay_seconds(60)
                        .jitter_strategy(JitterStrategy::Full),
                )
                .catcher(
                    Catcher::new(["States.ALL"], "Reject")
                        .result_path(OptionalPath::Path("$.error".to_string())),
                )
                .next("FanOut"),
        )
        .state(
            "FanOut",
            builder::parallel()
                .branch(
                    SubStateMachineBuilder::new()
                        .comment("cooldown branch")
                        .start_at("Cooldown")
                        .state("Cooldown", builder::wait().seconds(5).next("BranchDone"))
                        .state("BranchDone", builder::succeed()),
                )
                .branch(
                    SubStateMachineBuilder::new()
                        .start_at("Stamp")
                        .state(
                            "Stamp",
                            builder::pass().result(json!({"stamped": true})).end(),
                        ),
                )
                .result_path("$.branches")
                .next("EachItem"),
        )
        .state(
            "EachItem",
            builder::map()
                .items_path("$.order.items")
                .max_concurrency(4)
                .item_selector(json!({"item.$": "$$.Map.Item.Value"}))
                .item_processor(
                    SubStateMachineBuilder::new()
                        .start_at("CheckItem")
                        .state(
                            "CheckItem",
                            builder::task("arn:aws:states:::lambda:invoke")
                                .result_path_null()
                                .end(),
                        ),
                )
                .output_path("$.result")
                .next("Done"),
        )
        .state("Done", builder::succeed().comment("all good"))
        .state(
            "Reject",
            builder::fail().error("OrderRejected").cause("invalid input"),
        )
        .build()
        .unwrap()
}

#[test]
fn model_survives_json_round_trip() {
    let machine = full_machine();
    let doc = machine.to_json();
    let parsed = from_json(&doc).unwrap();
    assert_eq!(parsed, machine);
}

#[test]
fn serialization_is_byte_exact_after_round_trip() {
    let machine = full_machine();
    let text = machine.to_json_string();
    let reparsed = from_json_str(&text).unwrap();
    assert_eq!(reparsed.to_json_string(), text);

    let pretty = machine.to_json_string_pretty();
    let reparsed = from_json_str(&pretty).unwrap();
    assert_eq!(reparsed.to_json_string_pretty(), pretty);
}

#[test]
fn golden_document_round_trips_verbatim() {
    let doc = json!({
        "Comment": "retry then give up",
        "StartAt": "DoWork",
        "States": {
            "DoWork": {
                "Type": "Task",
                "Resource": "arn:aws:states:::lambda:invoke",
                "TimeoutSeconds": 60,
                "ResultPath": "$.work",
                "Retry": [
                    {"ErrorEquals": ["States.Timeout"], "IntervalSeconds": 3, "MaxAttempts": 2, "BackoffRate": 2.5}
                ],
                "Catch": [
                    {"ErrorEquals": ["States.ALL"], "ResultPath": "$.error", "Next": "GiveUp"}
                ],
                "Next": "AllDone"
            },
            "AllDone": {"Type": "Succeed"},
            "GiveUp": {
                "Type": "Fail",
                "Error": "WorkFailed",
                "Cause": "retries exhausted"
            }
        }
    });
    let machine = from_json(&doc).unwrap();
    assert_eq!(machine.to_json(), doc);
}

#[test]
fn each_wait_strategy_serializes_exactly_one_field() {
    let strategies: [(&str, builder::WaitBuilder); 4] = [
        ("Seconds", builder::wait().seconds(10)),
        ("SecondsPath", builder::wait().seconds_path("$.delay")),
        (
            "Timestamp",
            builder::wait().timestamp("2026-03-01T08:00:00Z"),
        ),
        (
            "TimestampPath",
            builder::wait().timestamp_path("$.deadline"),
        ),
    ];
    for (field, wait_builder) in strategies {
        let machine = StateMachineBuilder::new()
            .start_at("W")
            .state("W", wait_builder.end())
            .build()
            .unwrap();
        let doc = machine.to_json();
        let state = doc["States"]["W"].as_object().unwrap();
        let wait_fields = ["Seconds", "SecondsPath", "Timestamp", "TimestampPath"];
        let present: Vec<&str> = wait_fields
            .iter()
            .copied()
            .filter(|f| state.contains_key(*f))
            .collect();
        assert_eq!(present, vec![field]);

        let parsed = from_json(&doc).unwrap();
        assert_eq!(parsed, machine);
    }
}

#[test]
fn every_comparison_operator_round_trips() {
    use stateslang_core::OperandKind;

    let mut c = builder::choice();
    for op in ComparisonOperator::all() {
        let operand = match op.operand_kind() {
            OperandKind::String => Operand::String("value".to_string()),
            OperandKind::Path => Operand::String("$.other".to_string()),
            OperandKind::Number => Operand::Number(7.into()),
            OperandKind::Bool => Operand::Bool(true),
        };
        c = c.when(Condition::compare("$.field", *op, operand), "Done");
    }
    let machine = StateMachineBuilder::new()
        .start_at("C")
        .state("C", c.default_state("Done"))
        .state("Done", builder::succeed())
        .build()
        .unwrap();
    let parsed = from_json(&machine.to_json()).unwrap();
    assert_eq!(parsed, machine);
}

#[test]
fn tri_state_paths_survive_round_trip() {
    let machine = StateMachineBuilder::new()
        .start_at("A")
        .state("A", builder::pass().input_path_null().next("B"))
        .state("B", builder::pass().output_path("$.out").next("C"))
        .state("C", builder::pass().result_path_null().end())
        .build()
        .unwrap();
    let doc = machine.to_json();
    assert!(doc["States"]["A"]["InputPath"].is_null());
    assert!(doc["States"]["A"].get("OutputPath").is_none());
    assert!(doc["States"]["C"]["ResultPath"].is_null());
    assert_eq!(from_json(&doc).unwrap(), machine);
}
