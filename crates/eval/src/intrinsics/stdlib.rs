//! The standard `States.*` intrinsic functions.
//!
//! Every function validates its arity and argument types before doing any
//! work; violations surface as `IntrinsicFunctionArgumentError` with the
//! function name and offending argument index.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{SecondsFormat, Utc};
use md5::Md5;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::fmt::Write as _;
use uuid::Uuid;

use super::IntrinsicRegistry;
use crate::error::EvalError;

/// The longest array `States.ArrayRange` will produce.
const ARRAY_RANGE_LIMIT: i64 = 1000;

/// Install all twenty standard functions into `registry`.
pub fn register_standard_functions(registry: &mut IntrinsicRegistry) {
    registry.register("States.Format", |args, _, _| format_string(args));
    registry.register("States.StringToJson", |args, _, _| string_to_json(args));
    registry.register("States.JsonToString", |args, _, _| json_to_string(args));
    registry.register("States.Array", |args, _, _| Ok(Value::Array(args.to_vec())));
    registry.register("States.ArrayPartition", |args, _, _| array_partition(args));
    registry.register("States.ArrayContains", |args, _, _| array_contains(args));
    registry.register("States.ArrayRange", |args, _, _| array_range(args));
    registry.register("States.ArrayGetItem", |args, _, _| array_get_item(args));
    registry.register("States.ArrayLength", |args, _, _| array_length(args));
    registry.register("States.ArrayUnique", |args, _, _| array_unique(args));
    registry.register("States.Base64Encode", |args, _, _| base64_encode(args));
    registry.register("States.Base64Decode", |args, _, _| base64_decode(args));
    registry.register("States.Hash", |args, _, _| hash(args));
    registry.register("States.MathRandom", |args, _, _| math_random(args));
    registry.register("States.MathAdd", |args, _, _| math_add(args));
    registry.register("States.StringSplit", |args, _, _| string_split(args));
    registry.register("States.UUID", |args, _, _| uuid_v4(args));
    registry.register("States.JsonMerge", |args, _, _| json_merge(args));
    registry.register("States.StringToUpper", |args, _, _| {
        string_case(args, "States.StringToUpper", str::to_uppercase)
    });
    registry.register("States.StringToLower", |args, _, _| {
        string_case(args, "States.StringToLower", str::to_lowercase)
    });
    registry.register("States.Now", |args, _, _| now(args));
}

// ── Argument helpers ────────────────────────────────────────────────

fn arity(name: &str, args: &[Value], expected: usize) -> Result<(), EvalError> {
    if args.len() != expected {
        return Err(EvalError::argument(
            name,
            args.len(),
            format!("expected {} argument(s), got {}", expected, args.len()),
        ));
    }
    Ok(())
}

fn str_arg<'a>(name: &str, args: &'a [Value], i: usize) -> Result<&'a str, EvalError> {
    args[i]
        .as_str()
        .ok_or_else(|| EvalError::argument(name, i, "expected a string"))
}

fn int_arg(name: &str, args: &[Value], i: usize) -> Result<i64, EvalError> {
    args[i]
        .as_i64()
        .ok_or_else(|| EvalError::argument(name, i, "expected an integer"))
}

fn bool_arg(name: &str, args: &[Value], i: usize) -> Result<bool, EvalError> {
    args[i]
        .as_bool()
        .ok_or_else(|| EvalError::argument(name, i, "expected a boolean"))
}

fn array_arg<'a>(name: &str, args: &'a [Value], i: usize) -> Result<&'a [Value], EvalError> {
    args[i]
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| EvalError::argument(name, i, "expected an array"))
}

fn object_arg<'a>(
    name: &str,
    args: &'a [Value],
    i: usize,
) -> Result<&'a Map<String, Value>, EvalError> {
    args[i]
        .as_object()
        .ok_or_else(|| EvalError::argument(name, i, "expected an object"))
}

/// Strings interpolate bare; everything else as compact JSON.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).expect("Value serialization is infallible"),
    }
}

// ── Strings ─────────────────────────────────────────────────────────

fn format_string(args: &[Value]) -> Result<Value, EvalError> {
    const NAME: &str = "States.Format";
    if args.is_empty() {
        return Err(EvalError::argument(NAME, 0, "expected a format string"));
    }
    let template = str_arg(NAME, args, 0)?;
    let mut out = String::new();
    let mut used = 0usize;
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('{') => out.push('{'),
                Some('}') => out.push('}'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            },
            '{' if chars.peek() == Some(&'}') => {
                chars.next();
                used += 1;
                match args.get(used) {
                    Some(arg) => out.push_str(&stringify(arg)),
                    None => {
                        return Err(EvalError::argument(
                            NAME,
                            used,
                            "not enough arguments for format placeholders",
                        ));
                    }
                }
            }
            other => out.push(other),
        }
    }
    if used + 1 != args.len() {
        return Err(EvalError::argument(
            NAME,
            args.len() - 1,
            format!("{} placeholder(s) but {} value argument(s)", used, args.len() - 1),
        ));
    }
    Ok(Value::String(out))
}

fn string_to_json(args: &[Value]) -> Result<Value, EvalError> {
    const NAME: &str = "States.StringToJson";
    arity(NAME, args, 1)?;
    let text = str_arg(NAME, args, 0)?;
    serde_json::from_str(text)
        .map_err(|e| EvalError::argument(NAME, 0, format!("invalid JSON: {}", e)))
}

fn json_to_string(args: &[Value]) -> Result<Value, EvalError> {
    arity("States.JsonToString", args, 1)?;
    Ok(Value::String(
        serde_json::to_string(&args[0]).expect("Value serialization is infallible"),
    ))
}

fn string_split(args: &[Value]) -> Result<Value, EvalError> {
    const NAME: &str = "States.StringSplit";
    arity(NAME, args, 2)?;
    let text = str_arg(NAME, args, 0)?;
    let delimiters = str_arg(NAME, args, 1)?;
    if delimiters.is_empty() {
        return Err(EvalError::argument(NAME, 1, "delimiters must not be empty"));
    }
    let pieces: Vec<Value> = text
        .split(|c: char| delimiters.contains(c))
        .filter(|piece| !piece.is_empty())
        .map(|piece| Value::String(piece.to_string()))
        .collect();
    Ok(Value::Array(pieces))
}

fn string_case(
    args: &[Value],
    name: &str,
    convert: impl Fn(&str) -> String,
) -> Result<Value, EvalError> {
    arity(name, args, 1)?;
    Ok(Value::String(convert(str_arg(name, args, 0)?)))
}

// ── Arrays ──────────────────────────────────────────────────────────

fn array_partition(args: &[Value]) -> Result<Value, EvalError> {
    const NAME: &str = "States.ArrayPartition";
    arity(NAME, args, 2)?;
    let arr = array_arg(NAME, args, 0)?;
    let size = int_arg(NAME, args, 1)?;
    if size <= 0 {
        return Err(EvalError::argument(NAME, 1, "chunk size must be positive"));
    }
    let chunks: Vec<Value> = arr
        .chunks(size as usize)
        .map(|chunk| Value::Array(chunk.to_vec()))
        .collect();
    Ok(Value::Array(chunks))
}

fn array_contains(args: &[Value]) -> Result<Value, EvalError> {
    const NAME: &str = "States.ArrayContains";
    arity(NAME, args, 2)?;
    let arr = array_arg(NAME, args, 0)?;
    Ok(Value::Bool(arr.contains(&args[1])))
}

fn array_range(args: &[Value]) -> Result<Value, EvalError> {
    const NAME: &str = "States.ArrayRange";
    arity(NAME, args, 3)?;
    let first = int_arg(NAME, args, 0)?;
    let last = int_arg(NAME, args, 1)?;
    let step = int_arg(NAME, args, 2)?;
    if step == 0 {
        return Err(EvalError::argument(NAME, 2, "step must not be zero"));
    }
    let span = last
        .checked_sub(first)
        .ok_or_else(|| EvalError::argument(NAME, 1, "range bounds too far apart"))?;
    if span / step + 1 > ARRAY_RANGE_LIMIT {
        return Err(EvalError::argument(
            NAME,
            2,
            format!("range would produce more than {} elements", ARRAY_RANGE_LIMIT),
        ));
    }
    let mut out = Vec::new();
    let mut current = first;
    while (step > 0 && current <= last) || (step < 0 && current >= last) {
        out.push(Value::from(current));
        match current.checked_add(step) {
            Some(next) => current = next,
            None => break,
        }
    }
    Ok(Value::Array(out))
}

fn array_get_item(args: &[Value]) -> Result<Value, EvalError> {
    const NAME: &str = "States.ArrayGetItem";
    arity(NAME, args, 2)?;
    let arr = array_arg(NAME, args, 0)?;
    let index = int_arg(NAME, args, 1)?;
    if index < 0 || index as usize >= arr.len() {
        return Err(EvalError::argument(
            NAME,
            1,
            format!("index {} out of bounds for length {}", index, arr.len()),
        ));
    }
    Ok(arr[index as usize].clone())
}

fn array_length(args: &[Value]) -> Result<Value, EvalError> {
    const NAME: &str = "States.ArrayLength";
    arity(NAME, args, 1)?;
    Ok(Value::from(array_arg(NAME, args, 0)?.len()))
}

fn array_unique(args: &[Value]) -> Result<Value, EvalError> {
    const NAME: &str = "States.ArrayUnique";
    arity(NAME, args, 1)?;
    let arr = array_arg(NAME, args, 0)?;
    let mut out: Vec<Value> = Vec::new();
    for item in arr {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    Ok(Value::Array(out))
}

// ── Encoding and hashing ────────────────────────────────────────────

fn base64_encode(args: &[Value]) -> Result<Value, EvalError> {
    const NAME: &str = "States.Base64Encode";
    arity(NAME, args, 1)?;
    Ok(Value::String(BASE64.encode(str_arg(NAME, args, 0)?)))
}

fn base64_decode(args: &[Value]) -> Result<Value, EvalError> {
    const NAME: &str = "States.Base64Decode";
    arity(NAME, args, 1)?;
    let bytes = BASE64
        .decode(str_arg(NAME, args, 0)?)
        .map_err(|e| EvalError::argument(NAME, 0, format!("invalid base64: {}", e)))?;
    let text = String::from_utf8(bytes)
        .map_err(|_| EvalError::argument(NAME, 0, "decoded bytes are not valid UTF-8"))?;
    Ok(Value::String(text))
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{:02x}", b);
    }
    out
}

fn hash(args: &[Value]) -> Result<Value, EvalError> {
    const NAME: &str = "States.Hash";
    arity(NAME, args, 2)?;
    let data = str_arg(NAME, args, 0)?;
    let algorithm = str_arg(NAME, args, 1)?;
    let digest = match algorithm {
        "MD5" => hex(&Md5::digest(data.as_bytes())),
        "SHA-1" => hex(&Sha1::digest(data.as_bytes())),
        "SHA-256" => hex(&Sha256::digest(data.as_bytes())),
        "SHA-384" => hex(&Sha384::digest(data.as_bytes())),
        "SHA-512" => hex(&Sha512::digest(data.as_bytes())),
        other => {
            return Err(EvalError::argument(
                NAME,
                1,
                format!("unknown hash algorithm '{}'", other),
            ));
        }
    };
    Ok(Value::String(digest))
}

// ── Math ────────────────────────────────────────────────────────────

fn math_random(args: &[Value]) -> Result<Value, EvalError> {
    const NAME: &str = "States.MathRandom";
    if args.len() != 2 && args.len() != 3 {
        return Err(EvalError::argument(
            NAME,
            args.len(),
            format!("expected 2 or 3 arguments, got {}", args.len()),
        ));
    }
    let low = int_arg(NAME, args, 0)?;
    let high = int_arg(NAME, args, 1)?;
    if low >= high {
        return Err(EvalError::argument(NAME, 1, "upper bound must exceed lower bound"));
    }
    let value = if args.len() == 3 {
        let seed = int_arg(NAME, args, 2)?;
        StdRng::seed_from_u64(seed as u64).gen_range(low..high)
    } else {
        rand::thread_rng().gen_range(low..high)
    };
    Ok(Value::from(value))
}

fn math_add(args: &[Value]) -> Result<Value, EvalError> {
    const NAME: &str = "States.MathAdd";
    arity(NAME, args, 2)?;
    let a = int_arg(NAME, args, 0)?;
    let b = int_arg(NAME, args, 1)?;
    let sum = a
        .checked_add(b)
        .ok_or_else(|| EvalError::argument(NAME, 1, "integer overflow"))?;
    Ok(Value::from(sum))
}

// ── Misc ────────────────────────────────────────────────────────────

fn uuid_v4(args: &[Value]) -> Result<Value, EvalError> {
    arity("States.UUID", args, 0)?;
    Ok(Value::String(Uuid::new_v4().to_string()))
}

fn json_merge(args: &[Value]) -> Result<Value, EvalError> {
    const NAME: &str = "States.JsonMerge";
    arity(NAME, args, 3)?;
    let left = object_arg(NAME, args, 0)?;
    let right = object_arg(NAME, args, 1)?;
    let deep = bool_arg(NAME, args, 2)?;
    let mut merged = left.clone();
    for (key, value) in right {
        match merged.get_mut(key) {
            Some(existing) if deep && existing.is_object() && value.is_object() => {
                let combined = merge_deep(existing, value);
                *existing = combined;
            }
            _ => {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    Ok(Value::Object(merged))
}

/// Right wins on conflicts; nested objects merge recursively.
fn merge_deep(left: &Value, right: &Value) -> Value {
    match (left, right) {
        (Value::Object(l), Value::Object(r)) => {
            let mut merged = l.clone();
            for (key, value) in r {
                match merged.get(key) {
                    Some(existing) => {
                        let combined = merge_deep(existing, value);
                        merged.insert(key.clone(), combined);
                    }
                    None => {
                        merged.insert(key.clone(), value.clone());
                    }
                }
            }
            Value::Object(merged)
        }
        (_, other) => other.clone(),
    }
}

fn now(args: &[Value]) -> Result<Value, EvalError> {
    arity("States.Now", args, 0)?;
    Ok(Value::String(
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    ))
}
