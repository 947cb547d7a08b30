//! The state data-flow pipeline.
//!
//! ```text
//! raw_input  -- InputPath filter --> selected_input
//!            -- Parameters template --> effective_input   (to execution)
//! raw_result -- ResultSelector template --> effective_result
//!            -- ResultPath merge with effective_input --> combined
//!            -- OutputPath filter --> effective_output
//! ```
//!
//! `InputPath`/`OutputPath`/`ResultPath` are tri-state: unset means `$`
//! (identity), explicit null discards. A filter path that matches several
//! values wraps them in an array; zero matches is a `PathMatchFailure`.

use serde_json::{Map, Value};

use stateslang_core::path::{JsonPath, RefPath, RefToken};
use stateslang_core::state::OptionalPath;

use crate::error::EvalError;
use crate::intrinsics::{parser::parse_intrinsic, IntrinsicRegistry};
use crate::template::apply_template;

/// Runs the data-flow pipeline. Owns the intrinsic registry used by
/// payload templates; hand the processor a pre-built registry to control
/// which functions templates may call.
#[derive(Debug, Default)]
pub struct IoProcessor {
    registry: IntrinsicRegistry,
}

impl IoProcessor {
    /// A processor with the standard intrinsic functions.
    pub fn new() -> Self {
        IoProcessor {
            registry: IntrinsicRegistry::standard(),
        }
    }

    pub fn with_registry(registry: IntrinsicRegistry) -> Self {
        IoProcessor { registry }
    }

    pub fn registry(&self) -> &IntrinsicRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut IntrinsicRegistry {
        &mut self.registry
    }

    /// InputPath filter, then the Parameters template.
    pub fn effective_input(
        &self,
        raw_input: &Value,
        input_path: &OptionalPath,
        parameters: Option<&Value>,
        context: &Value,
    ) -> Result<Value, EvalError> {
        let selected = filter(raw_input, input_path)?;
        match parameters {
            Some(template) => apply_template(template, &selected, context, &self.registry),
            None => Ok(selected),
        }
    }

    /// The ResultSelector template over the raw result. Paths in the
    /// template select from the raw result itself.
    pub fn effective_result(
        &self,
        raw_result: &Value,
        result_selector: Option<&Value>,
        context: &Value,
    ) -> Result<Value, EvalError> {
        match result_selector {
            Some(template) => apply_template(template, raw_result, context, &self.registry),
            None => Ok(raw_result.clone()),
        }
    }

    /// ResultPath merge followed by the OutputPath filter.
    pub fn effective_output(
        &self,
        effective_input: &Value,
        effective_result: &Value,
        output_path: &OptionalPath,
        result_path: &OptionalPath,
    ) -> Result<Value, EvalError> {
        let combined = merge_result(effective_input, effective_result, result_path)?;
        filter(&combined, output_path)
    }

    /// Resolve a Fail state's `ErrorPath`/`CausePath`: a reference path
    /// into the input, or an intrinsic call. The result must be a string.
    pub fn fail_path_value(
        &self,
        input: &Value,
        fail_path: &str,
        context: &Value,
    ) -> Result<String, EvalError> {
        let resolved = if fail_path.starts_with('$') {
            // Reference path grammar only: one addressable location, no
            // wildcards, no multi-match wrapping.
            let failure = || EvalError::PathMatchFailure {
                path: fail_path.to_string(),
                input: input.clone(),
            };
            let ref_path = RefPath::parse(fail_path).map_err(|_| failure())?;
            ref_path.resolve(input).cloned().ok_or_else(failure)?
        } else {
            let call = parse_intrinsic(fail_path)?;
            self.registry.call(&call, input, context)?
        };
        match resolved {
            Value::String(s) => Ok(s),
            other => Err(EvalError::PathMatchFailure {
                path: fail_path.to_string(),
                input: other,
            }),
        }
    }
}

/// Apply a tri-state filter path.
fn filter(value: &Value, path: &OptionalPath) -> Result<Value, EvalError> {
    match path {
        OptionalPath::Unset => Ok(value.clone()),
        OptionalPath::Null => Ok(Value::Object(Map::new())),
        OptionalPath::Path(p) => select_required(p, value),
    }
}

/// Select with the pinned multi-match semantics: one match passes
/// through, several wrap in an array, zero is a failure.
fn select_required(path_text: &str, doc: &Value) -> Result<Value, EvalError> {
    let failure = || EvalError::PathMatchFailure {
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

/// Merge the result into the input at the reference path.
fn merge_result(
    input: &Value,
    result: &Value,
    result_path: &OptionalPath,
) -> Result<Value, EvalError> {
    let path_text = match result_path {
        // Explicit null discards the result entirely.
        OptionalPath::Null => return Ok(input.clone()),
        // Unset is identity: the result replaces the input.
        OptionalPath::Unset => return Ok(result.clone()),
        OptionalPath::Path(p) => p,
    };
    let failure = || EvalError::ResultPathMatchFailure {
        path: path_text.clone(),
        input: input.clone(),
        result: result.clone(),
    };
    let ref_path = RefPath::parse(path_text).map_err(|_| failure())?;
    if ref_path.is_root() {
        return Ok(result.clone());
    }
    let mut combined = input.clone();
    insert_at(&mut combined, &ref_path.tokens, result, &failure)?;
    Ok(combined)
}

/// Write `result` at the token path inside `target`, synthesizing missing
/// containers: objects for field tokens, null-padded arrays for index
/// tokens. An existing value of the wrong container type fails.
fn insert_at(
    target: &mut Value,
    tokens: &[RefToken],
    result: &Value,
    failure: &dyn Fn() -> EvalError,
) -> Result<(), EvalError> {
    let (head, rest) = match tokens.split_first() {
        Some(split) => split,
        None => return Err(failure()),
    };
    match head {
        RefToken::Field(name) => {
            let obj = match target {
                Value::Object(m) => m,
                _ => return Err(failure()),
            };
            if rest.is_empty() {
                obj.insert(name.clone(), result.clone());
                return Ok(());
            }
            let child = obj
                .entry(name.clone())
                .or_insert_with(|| empty_container(&rest[0]));
            if child.is_null() {
                *child = empty_container(&rest[0]);
            }
            insert_at(child, rest, result, failure)
        }
        RefToken::Index(index) => {
            let arr = match target {
                Value::Array(a) => a,
                _ => return Err(failure()),
            };
            while arr.len() <= *index {
                arr.push(Value::Null);
            }
            if rest.is_empty() {
                arr[*index] = result.clone();
                return Ok(());
            }
            let child = &mut arr[*index];
            if child.is_null() {
                *child = empty_container(&rest[0]);
            }
            insert_at(child, rest, result, failure)
        }
    }
}

fn empty_container(next: &RefToken) -> Value {
    match next {
        RefToken::Field(_) => Value::Object(Map::new()),
        RefToken::Index(_) => Value::Array(Vec::new()),
    }
}
