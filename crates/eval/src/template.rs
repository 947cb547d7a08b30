//! Payload template transformation.
//!
//! A payload template is a JSON tree in which any object key ending in
//! `.$` requests substitution: the string value is a context path
//! (`$$...`), an input path (`$...`), or an intrinsic call. The transform
//! is functional -- the caller's template is never modified.

use serde_json::{Map, Value};

use stateslang_core::path::JsonPath;

use crate::error::EvalError;
use crate::intrinsics::{parser::parse_intrinsic, IntrinsicRegistry};

/// Apply a payload template to `input`, resolving `.$` substitutions
/// against the input, the context object, and the intrinsic registry.
pub fn apply_template(
    template: &Value,
    input: &Value,
    context: &Value,
    registry: &IntrinsicRegistry,
) -> Result<Value, EvalError> {
    match template {
        Value::Object(fields) => {
            let mut out = Map::with_capacity(fields.len());
            for (key, value) in fields {
                if let Some(target_key) = key.strip_suffix(".$") {
                    let Value::String(expr) = value else {
                        return Err(EvalError::ParameterPathFailure {
                            path: key.clone(),
                            input: value.clone(),
                        });
                    };
                    out.insert(
                        target_key.to_string(),
                        resolve_expression(expr, input, context, registry)?,
                    );
                } else {
                    out.insert(key.clone(), apply_template(value, input, context, registry)?);
                }
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => {
            let transformed: Result<Vec<Value>, EvalError> = items
                .iter()
                .map(|item| apply_template(item, input, context, registry))
                .collect();
            Ok(Value::Array(transformed?))
        }
        other => Ok(other.clone()),
    }
}

/// Resolve one `.$` expression: context path, input path, or intrinsic.
fn resolve_expression(
    expr: &str,
    input: &Value,
    context: &Value,
    registry: &IntrinsicRegistry,
) -> Result<Value, EvalError> {
    if let Some(rest) = expr.strip_prefix("$$") {
        return resolve_path(&format!("${}", rest), context);
    }
    if expr.starts_with('$') {
        return resolve_path(expr, input);
    }
    let call = parse_intrinsic(expr)?;
    registry.call(&call, input, context)
}

/// Select a path for substitution. Zero matches fail; several matches
/// are wrapped in an array.
pub(crate) fn resolve_path(path_text: &str, doc: &Value) -> Result<Value, EvalError> {
    let failure = || EvalError::ParameterPathFailure {
        path: path_text.to_string(),
        input: doc.clone(),
    };
    let path = JsonPath::parse(path_text).map_err(|_| failure())?;
    let matches = path.select(doc);
    match matches.len() {
        0 => Err(failure()),
        1 => Ok(matches[0].clone()),
        _ => Ok(Value::Array(matches.into_iter().cloned().collect())),
    }
}
