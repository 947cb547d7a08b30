//! Condition evaluation for Choice states.
//!
//! Comparison operators resolve `Variable` against the effective input
//! and require exactly one match; `*Path` operands are reference paths
//! read as a single location. Type predicates treat absence and type
//! mismatch as plain `false`. And/Or short-circuit left to right.

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use stateslang_core::condition::{ComparisonOperator, Condition, Operand, OperandKind};
use stateslang_core::path::{JsonPath, RefPath};
use stateslang_core::state::ChoiceState;

use crate::error::{ConditionErrorKind, EvalError};

/// Evaluate a condition tree against the effective input.
pub fn evaluate(condition: &Condition, input: &Value) -> Result<bool, EvalError> {
    match condition {
        Condition::And(children) => {
            for child in children {
                if !evaluate(child, input)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Condition::Or(children) => {
            for child in children {
                if evaluate(child, input)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Condition::Not(child) => Ok(!evaluate(child, input)?),
        Condition::Comparison {
            variable,
            operator,
            operand,
        } => eval_comparison(variable, *operator, operand, input),
    }
}

/// Walk a Choice state's rules in declaration order and pick the next
/// state. Falls back to `Default`; with no match and no default the
/// outcome is `States.NoChoiceMatched`.
pub fn choose_next<'a>(state: &'a ChoiceState, input: &Value) -> Result<&'a str, EvalError> {
    for choice in &state.choices {
        if evaluate(&choice.condition, input)? {
            return Ok(&choice.next);
        }
    }
    match &state.default {
        Some(default) => Ok(default),
        None => Err(EvalError::NoChoiceMatched),
    }
}

fn eval_comparison(
    variable: &str,
    operator: ComparisonOperator,
    operand: &Operand,
    input: &Value,
) -> Result<bool, EvalError> {
    let path = JsonPath::parse(variable).map_err(|_| {
        EvalError::condition(ConditionErrorKind::InvalidPath {
            path: variable.to_string(),
        })
    })?;
    let matches = path.select(input);

    if operator.is_type_predicate() {
        let expected = match operand {
            Operand::Bool(b) => *b,
            // The validator rejects non-boolean predicate operands; a
            // hand-built condition that dodged it still fails cleanly.
            _ => {
                return Err(EvalError::condition(ConditionErrorKind::NotABoolean {
                    path: variable.to_string(),
                }))
            }
        };
        if operator == ComparisonOperator::IsPresent {
            return Ok(!matches.is_empty() == expected);
        }
        // Absence or ambiguity makes the whole predicate false.
        if matches.len() != 1 {
            return Ok(false);
        }
        let value = matches[0];
        let holds = match operator {
            ComparisonOperator::IsNull => value.is_null(),
            ComparisonOperator::IsNumeric => value.is_number(),
            ComparisonOperator::IsString => value.is_string(),
            ComparisonOperator::IsBoolean => value.is_boolean(),
            ComparisonOperator::IsTimestamp => value
                .as_str()
                .map(|s| parse_timestamp(s).is_some())
                .unwrap_or(false),
            _ => unreachable!("non-predicate handled below"),
        };
        return Ok(holds == expected);
    }

    let value = single_match(&matches, variable)?;
    let operand_value = resolve_operand(operator, operand, input)?;

    use ComparisonOperator::*;
    match operator {
        StringEquals | StringEqualsPath => Ok(str_cmp(value, &operand_value, variable)?.is_eq()),
        StringLessThan | StringLessThanPath => {
            Ok(str_cmp(value, &operand_value, variable)?.is_lt())
        }
        StringGreaterThan | StringGreaterThanPath => {
            Ok(str_cmp(value, &operand_value, variable)?.is_gt())
        }
        StringLessThanEquals | StringLessThanEqualsPath => {
            Ok(str_cmp(value, &operand_value, variable)?.is_le())
        }
        StringGreaterThanEquals | StringGreaterThanEqualsPath => {
            Ok(str_cmp(value, &operand_value, variable)?.is_ge())
        }
        StringMatches => {
            let text = as_str(value, variable)?;
            let pattern = as_str(&operand_value, variable)?;
            wildcard_match(pattern, text)
        }
        NumericEquals | NumericEqualsPath => Ok(num_cmp(value, &operand_value, variable)?.is_eq()),
        NumericLessThan | NumericLessThanPath => {
            Ok(num_cmp(value, &operand_value, variable)?.is_lt())
        }
        NumericGreaterThan | NumericGreaterThanPath => {
            Ok(num_cmp(value, &operand_value, variable)?.is_gt())
        }
        NumericLessThanEquals | NumericLessThanEqualsPath => {
            Ok(num_cmp(value, &operand_value, variable)?.is_le())
        }
        NumericGreaterThanEquals | NumericGreaterThanEqualsPath => {
            Ok(num_cmp(value, &operand_value, variable)?.is_ge())
        }
        BooleanEquals | BooleanEqualsPath => {
            let left = value.as_bool().ok_or_else(|| {
                EvalError::condition(ConditionErrorKind::NotABoolean {
                    path: variable.to_string(),
                })
            })?;
            let right = operand_value.as_bool().ok_or_else(|| {
                EvalError::condition(ConditionErrorKind::NotABoolean {
                    path: variable.to_string(),
                })
            })?;
            Ok(left == right)
        }
        TimestampEquals | TimestampEqualsPath => {
            Ok(ts_cmp(value, &operand_value, variable)?.is_eq())
        }
        TimestampLessThan | TimestampLessThanPath => {
            Ok(ts_cmp(value, &operand_value, variable)?.is_lt())
        }
        TimestampGreaterThan | TimestampGreaterThanPath => {
            Ok(ts_cmp(value, &operand_value, variable)?.is_gt())
        }
        TimestampLessThanEquals | TimestampLessThanEqualsPath => {
            Ok(ts_cmp(value, &operand_value, variable)?.is_le())
        }
        TimestampGreaterThanEquals | TimestampGreaterThanEqualsPath => {
            Ok(ts_cmp(value, &operand_value, variable)?.is_ge())
        }
        IsNull | IsPresent | IsNumeric | IsString | IsBoolean | IsTimestamp => {
            unreachable!("type predicates handled above")
        }
    }
}

fn single_match<'a>(matches: &[&'a Value], path: &str) -> Result<&'a Value, EvalError> {
    match matches.len() {
        1 => Ok(matches[0]),
        0 => Err(EvalError::condition(ConditionErrorKind::NoMatch {
            path: path.to_string(),
        })),
        _ => Err(EvalError::condition(ConditionErrorKind::MultipleMatches {
            path: path.to_string(),
        })),
    }
}

fn resolve_operand(
    operator: ComparisonOperator,
    operand: &Operand,
    input: &Value,
) -> Result<Value, EvalError> {
    if operator.operand_kind() == OperandKind::Path {
        let Operand::String(p) = operand else {
            return Err(EvalError::condition(ConditionErrorKind::InvalidPath {
                path: String::new(),
            }));
        };
        // Operand paths are reference paths: one location, read directly.
        let ref_path = RefPath::parse(p).map_err(|_| {
            EvalError::condition(ConditionErrorKind::InvalidPath { path: p.clone() })
        })?;
        return ref_path.resolve(input).cloned().ok_or_else(|| {
            EvalError::condition(ConditionErrorKind::NoMatch { path: p.clone() })
        });
    }
    Ok(match operand {
        Operand::String(s) => Value::String(s.clone()),
        Operand::Number(n) => Value::Number(n.clone()),
        Operand::Bool(b) => Value::Bool(*b),
    })
}

fn as_str<'a>(value: &'a Value, path: &str) -> Result<&'a str, EvalError> {
    value.as_str().ok_or_else(|| {
        EvalError::condition(ConditionErrorKind::NotAString {
            path: path.to_string(),
        })
    })
}

/// Lexicographic comparison by Unicode code points. UTF-8 byte order and
/// code point order coincide, so `str::cmp` is exactly that.
fn str_cmp(left: &Value, right: &Value, path: &str) -> Result<Ordering, EvalError> {
    Ok(as_str(left, path)?.cmp(as_str(right, path)?))
}

/// Numeric comparison: two integers compare exactly, any float promotes
/// both sides to f64.
fn num_cmp(left: &Value, right: &Value, path: &str) -> Result<Ordering, EvalError> {
    let not_a_number = || {
        EvalError::condition(ConditionErrorKind::NotANumber {
            path: path.to_string(),
        })
    };
    let (l, r) = match (left, right) {
        (Value::Number(l), Value::Number(r)) => (l, r),
        _ => return Err(not_a_number()),
    };
    if let (Some(li), Some(ri)) = (l.as_i64(), r.as_i64()) {
        return Ok(li.cmp(&ri));
    }
    let lf = l.as_f64().ok_or_else(not_a_number)?;
    let rf = r.as_f64().ok_or_else(not_a_number)?;
    lf.partial_cmp(&rf).ok_or_else(not_a_number)
}

fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s).ok()
}

fn ts_cmp(left: &Value, right: &Value, path: &str) -> Result<Ordering, EvalError> {
    let parse = |v: &Value| -> Result<DateTime<FixedOffset>, EvalError> {
        let s = as_str(v, path)?;
        parse_timestamp(s).ok_or_else(|| {
            EvalError::condition(ConditionErrorKind::MalformedTimestamp {
                value: s.to_string(),
            })
        })
    };
    Ok(parse(left)?.cmp(&parse(right)?))
}

// ── StringMatches ───────────────────────────────────────────────────

enum MatchTok {
    Star,
    Lit(String),
}

/// `*` matches zero or more characters; `\*` and `\\` are the only
/// escapes.
fn wildcard_match(pattern: &str, text: &str) -> Result<bool, EvalError> {
    let mut toks: Vec<MatchTok> = Vec::new();
    let mut lit = String::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('*') => lit.push('*'),
                Some('\\') => lit.push('\\'),
                _ => {
                    return Err(EvalError::condition(ConditionErrorKind::InvalidPattern {
                        pattern: pattern.to_string(),
                    }))
                }
            },
            '*' => {
                if !lit.is_empty() {
                    toks.push(MatchTok::Lit(std::mem::take(&mut lit)));
                }
                if !matches!(toks.last(), Some(MatchTok::Star)) {
                    toks.push(MatchTok::Star);
                }
            }
            other => lit.push(other),
        }
    }
    if !lit.is_empty() {
        toks.push(MatchTok::Lit(lit));
    }
    Ok(match_toks(&toks, text))
}

fn match_toks(toks: &[MatchTok], text: &str) -> bool {
    match toks.split_first() {
        None => text.is_empty(),
        Some((MatchTok::Lit(lit), rest)) => match text.strip_prefix(lit.as_str()) {
            Some(remainder) => match_toks(rest, remainder),
            None => false,
        },
        Some((MatchTok::Star, rest)) => {
            if rest.is_empty() {
                return true;
            }
            for (i, _) in text.char_indices() {
                if match_toks(rest, &text[i..]) {
                    return true;
                }
            }
            match_toks(rest, "")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stateslang_core::condition::Choice;

    fn cmp(variable: &str, op: ComparisonOperator, operand: Operand) -> Condition {
        Condition::compare(variable, op, operand)
    }

    #[test]
    fn numeric_comparisons_promote_int_to_float() {
        let input = json!({"v": 5});
        let c = cmp(
            "$.v",
            ComparisonOperator::NumericLessThan,
            Operand::Number(serde_json::Number::from_f64(5.5).unwrap()),
        );
        assert!(evaluate(&c, &input).unwrap());
    }

    #[test]
    fn numeric_comparison_on_string_errors() {
        let input = json!({"v": "5"});
        let c = cmp(
            "$.v",
            ComparisonOperator::NumericEquals,
            Operand::Number(5.into()),
        );
        let err = evaluate(&c, &input).unwrap_err();
        assert!(matches!(
            err,
            EvalError::ConditionError {
                kind: ConditionErrorKind::NotANumber { .. }
            }
        ));
    }

    #[test]
    fn missing_variable_errors_for_comparators() {
        let input = json!({});
        let c = cmp(
            "$.v",
            ComparisonOperator::NumericEquals,
            Operand::Number(5.into()),
        );
        let err = evaluate(&c, &input).unwrap_err();
        assert!(matches!(
            err,
            EvalError::ConditionError {
                kind: ConditionErrorKind::NoMatch { .. }
            }
        ));
    }

    #[test]
    fn path_operand_resolves_against_input() {
        let input = json!({"a": 3, "b": 3});
        let c = cmp(
            "$.a",
            ComparisonOperator::NumericEqualsPath,
            Operand::String("$.b".to_string()),
        );
        assert!(evaluate(&c, &input).unwrap());
    }

    #[test]
    fn path_operand_must_be_reference_path_grammar() {
        let input = json!({"a": 3, "xs": [1, 2, 3]});
        // Read-grammar extras are not addressable operands.
        for bad in ["$.xs[-1]", "$.xs[*]", "$..a"] {
            let c = cmp(
                "$.a",
                ComparisonOperator::NumericEqualsPath,
                Operand::String(bad.to_string()),
            );
            let err = evaluate(&c, &input).unwrap_err();
            assert!(
                matches!(
                    err,
                    EvalError::ConditionError {
                        kind: ConditionErrorKind::InvalidPath { .. }
                    }
                ),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn missing_path_operand_errors() {
        let input = json!({"a": 3});
        let c = cmp(
            "$.a",
            ComparisonOperator::NumericEqualsPath,
            Operand::String("$.gone".to_string()),
        );
        let err = evaluate(&c, &input).unwrap_err();
        assert!(matches!(
            err,
            EvalError::ConditionError {
                kind: ConditionErrorKind::NoMatch { .. }
            }
        ));
    }

    #[test]
    fn string_order_is_code_point_lexicographic() {
        let input = json!({"s": "b"});
        assert!(evaluate(
            &cmp(
                "$.s",
                ComparisonOperator::StringGreaterThan,
                Operand::String("a".to_string()),
            ),
            &input,
        )
        .unwrap());
        // 'Z' (U+005A) sorts before 'a' (U+0061)
        let input = json!({"s": "Z"});
        assert!(evaluate(
            &cmp(
                "$.s",
                ComparisonOperator::StringLessThan,
                Operand::String("a".to_string()),
            ),
            &input,
        )
        .unwrap());
    }

    #[test]
    fn timestamps_compare_as_instants_across_offsets() {
        // Same instant, different offsets
        let input = json!({"t": "2026-03-01T12:00:00+02:00"});
        let c = cmp(
            "$.t",
            ComparisonOperator::TimestampEquals,
            Operand::String("2026-03-01T10:00:00Z".to_string()),
        );
        assert!(evaluate(&c, &input).unwrap());
    }

    #[test]
    fn malformed_timestamp_errors() {
        let input = json!({"t": "yesterday"});
        let c = cmp(
            "$.t",
            ComparisonOperator::TimestampLessThan,
            Operand::String("2026-03-01T10:00:00Z".to_string()),
        );
        let err = evaluate(&c, &input).unwrap_err();
        assert!(matches!(
            err,
            EvalError::ConditionError {
                kind: ConditionErrorKind::MalformedTimestamp { .. }
            }
        ));
    }

    #[test]
    fn is_present_tracks_operand_polarity() {
        let input = json!({"here": 1});
        let present_true = cmp("$.here", ComparisonOperator::IsPresent, Operand::Bool(true));
        let absent_false = cmp("$.gone", ComparisonOperator::IsPresent, Operand::Bool(false));
        assert!(evaluate(&present_true, &input).unwrap());
        assert!(evaluate(&absent_false, &input).unwrap());
    }

    #[test]
    fn type_predicates_treat_absence_as_false() {
        let input = json!({});
        for op in [
            ComparisonOperator::IsNull,
            ComparisonOperator::IsNumeric,
            ComparisonOperator::IsString,
            ComparisonOperator::IsBoolean,
            ComparisonOperator::IsTimestamp,
        ] {
            for expected in [true, false] {
                let c = cmp("$.gone", op, Operand::Bool(expected));
                assert!(!evaluate(&c, &input).unwrap(), "{:?}/{}", op, expected);
            }
        }
    }

    #[test]
    fn is_timestamp_checks_the_string_shape() {
        let input = json!({"t": "2026-03-01T10:00:00Z", "n": 5});
        assert!(evaluate(
            &cmp("$.t", ComparisonOperator::IsTimestamp, Operand::Bool(true)),
            &input,
        )
        .unwrap());
        assert!(evaluate(
            &cmp("$.n", ComparisonOperator::IsTimestamp, Operand::Bool(false)),
            &input,
        )
        .unwrap());
    }

    #[test]
    fn wildcard_patterns() {
        let cases = [
            ("*", "anything", true),
            ("", "", true),
            ("", "x", false),
            ("foo*", "foobar", true),
            ("*bar", "foobar", true),
            ("f*o*r", "foobar", true),
            ("f*z", "foobar", false),
            ("exact", "exact", true),
            ("exact", "exactly", false),
            ("a*a", "aa", true),
            ("a*a", "a", false),
        ];
        for (pattern, text, expected) in cases {
            assert_eq!(
                wildcard_match(pattern, text).unwrap(),
                expected,
                "pattern {:?} vs {:?}",
                pattern,
                text
            );
        }
    }

    #[test]
    fn wildcard_escapes() {
        assert!(wildcard_match(r"literal\*", "literal*").unwrap());
        assert!(!wildcard_match(r"literal\*", "literalx").unwrap());
        assert!(wildcard_match(r"back\\slash", r"back\slash").unwrap());
        assert!(wildcard_match(r"\\*", r"\anything").unwrap());
        assert!(wildcard_match(r"price: \**", "price: *15").unwrap());
        assert!(wildcard_match(r"a\qb", "aqb").is_err());
    }

    #[test]
    fn and_or_not_combinators() {
        let input = json!({"a": 1, "b": 2});
        let a_is_one = cmp("$.a", ComparisonOperator::NumericEquals, Operand::Number(1.into()));
        let b_is_one = cmp("$.b", ComparisonOperator::NumericEquals, Operand::Number(1.into()));
        assert!(!evaluate(
            &Condition::and(vec![a_is_one.clone(), b_is_one.clone()]),
            &input,
        )
        .unwrap());
        assert!(evaluate(
            &Condition::or(vec![b_is_one.clone(), a_is_one.clone()]),
            &input,
        )
        .unwrap());
        assert!(evaluate(&Condition::not(b_is_one), &input).unwrap());
    }

    #[test]
    fn and_short_circuits_on_first_false() {
        // The second child would error (missing path), but the first child
        // is already false.
        let input = json!({"a": 1});
        let c = Condition::and(vec![
            cmp("$.a", ComparisonOperator::NumericEquals, Operand::Number(2.into())),
            cmp("$.gone", ComparisonOperator::NumericEquals, Operand::Number(1.into())),
        ]);
        assert!(!evaluate(&c, &input).unwrap());
    }

    #[test]
    fn or_short_circuits_on_first_true() {
        let input = json!({"a": 1});
        let c = Condition::or(vec![
            cmp("$.a", ComparisonOperator::NumericEquals, Operand::Number(1.into())),
            cmp("$.gone", ComparisonOperator::NumericEquals, Operand::Number(1.into())),
        ]);
        assert!(evaluate(&c, &input).unwrap());
    }

    #[test]
    fn choice_dispatch_takes_first_match_then_default() {
        let state = ChoiceState {
            common: Default::default(),
            choices: vec![
                Choice::new(
                    cmp("$.v", ComparisonOperator::NumericLessThan, Operand::Number(10.into())),
                    "A",
                ),
                Choice::new(
                    cmp("$.v", ComparisonOperator::NumericLessThan, Operand::Number(100.into())),
                    "B",
                ),
            ],
            default: Some("D".to_string()),
        };
        assert_eq!(choose_next(&state, &json!({"v": 5})).unwrap(), "A");
        assert_eq!(choose_next(&state, &json!({"v": 50})).unwrap(), "B");
        assert_eq!(choose_next(&state, &json!({"v": 500})).unwrap(), "D");
    }

    #[test]
    fn no_choice_matched_without_default() {
        let state = ChoiceState {
            common: Default::default(),
            choices: vec![Choice::new(
                cmp("$.v", ComparisonOperator::NumericLessThan, Operand::Number(10.into())),
                "A",
            )],
            default: None,
        };
        let err = choose_next(&state, &json!({"v": 50})).unwrap_err();
        assert!(matches!(err, EvalError::NoChoiceMatched));
    }
}
