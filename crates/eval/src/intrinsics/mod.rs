//! Intrinsic function engine: parser, registry, and the standard
//! `States.*` library.
//!
//! The registry is a plain name-to-callable map owned by whoever
//! evaluates templates. It takes no locks: populate it at startup and
//! share it read-only, or serialize mutation externally.

pub mod parser;
pub mod stdlib;

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::error::EvalError;
use crate::template::resolve_path;
use parser::{IntrinsicArg, IntrinsicCall};

/// An intrinsic implementation: `(resolved_args, input, context) -> J`.
pub type IntrinsicFn =
    Box<dyn Fn(&[Value], &Value, &Value) -> Result<Value, EvalError> + Send + Sync>;

/// Name-to-callable mapping for intrinsic functions.
pub struct IntrinsicRegistry {
    functions: HashMap<String, IntrinsicFn>,
}

impl fmt::Debug for IntrinsicRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("IntrinsicRegistry")
            .field("functions", &names)
            .finish()
    }
}

impl Default for IntrinsicRegistry {
    fn default() -> Self {
        IntrinsicRegistry::standard()
    }
}

impl IntrinsicRegistry {
    /// An empty registry with no functions at all.
    pub fn new() -> Self {
        IntrinsicRegistry {
            functions: HashMap::new(),
        }
    }

    /// A registry pre-populated with every standard `States.*` function.
    pub fn standard() -> Self {
        let mut reg = IntrinsicRegistry::new();
        stdlib::register_standard_functions(&mut reg);
        reg
    }

    pub fn register<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[Value], &Value, &Value) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Box::new(f));
    }

    /// Remove a function; returns whether it was present.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.functions.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Invoke a parsed call. Arguments are resolved eagerly, left to
    /// right, before the callable runs; nested calls resolve through the
    /// same registry.
    pub fn call(
        &self,
        call: &IntrinsicCall,
        input: &Value,
        context: &Value,
    ) -> Result<Value, EvalError> {
        let f = self
            .functions
            .get(&call.name)
            .ok_or_else(|| EvalError::IntrinsicFunctionNotFound {
                name: call.name.clone(),
            })?;
        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.resolve_arg(arg, input, context)?);
        }
        f(&args, input, context)
    }

    fn resolve_arg(
        &self,
        arg: &IntrinsicArg,
        input: &Value,
        context: &Value,
    ) -> Result<Value, EvalError> {
        match arg {
            IntrinsicArg::Call(nested) => self.call(nested, input, context),
            IntrinsicArg::Path(p) => resolve_path(p, input),
            IntrinsicArg::ContextPath(p) => resolve_path(p, context),
            IntrinsicArg::Str(s) => Ok(Value::String(s.clone())),
            IntrinsicArg::Int(i) => Ok(Value::from(*i)),
            IntrinsicArg::Float(f) => Ok(Value::from(*f)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parser::parse_intrinsic;
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_function_reports_its_name() {
        let reg = IntrinsicRegistry::standard();
        let call = parse_intrinsic("States.NoSuchThing(1)").unwrap();
        let err = reg.call(&call, &json!({}), &json!({})).unwrap_err();
        let EvalError::IntrinsicFunctionNotFound { name } = err else {
            panic!("expected not-found error");
        };
        assert_eq!(name, "States.NoSuchThing");
    }

    #[test]
    fn register_and_unregister() {
        let mut reg = IntrinsicRegistry::new();
        assert!(!reg.contains("Custom.Double"));
        reg.register("Custom.Double", |args, _, _| {
            let n = args[0].as_i64().unwrap_or(0);
            Ok(json!(n * 2))
        });
        assert!(reg.contains("Custom.Double"));

        let call = parse_intrinsic("Custom.Double(21)").unwrap();
        assert_eq!(reg.call(&call, &json!({}), &json!({})).unwrap(), json!(42));

        assert!(reg.unregister("Custom.Double"));
        assert!(!reg.unregister("Custom.Double"));
    }

    #[test]
    fn path_arguments_resolve_before_the_call() {
        let reg = IntrinsicRegistry::standard();
        let call = parse_intrinsic("States.ArrayLength($.items)").unwrap();
        let out = reg
            .call(&call, &json!({"items": [1, 2, 3]}), &json!({}))
            .unwrap();
        assert_eq!(out, json!(3));
    }

    #[test]
    fn context_path_arguments_resolve_against_context() {
        let reg = IntrinsicRegistry::standard();
        let call = parse_intrinsic("States.Format('{}', $$.RunId)").unwrap();
        let out = reg
            .call(&call, &json!({}), &json!({"RunId": "r-9"}))
            .unwrap();
        assert_eq!(out, json!("r-9"));
    }

    #[test]
    fn unresolvable_argument_path_fails() {
        let reg = IntrinsicRegistry::standard();
        let call = parse_intrinsic("States.ArrayLength($.gone)").unwrap();
        let err = reg.call(&call, &json!({}), &json!({})).unwrap_err();
        assert!(matches!(err, EvalError::ParameterPathFailure { .. }));
    }
}
