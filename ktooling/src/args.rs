//! Argument validation helpers for tool call argument bags.
//!
//! Every helper takes the loosely-typed bag and a key, and either returns a
//! normalized typed value or an `InvalidArguments` error naming the key.
//!
//! ```rust
//! use ktooling::{optional_bool, parse_json_object, required_string};
//!
//! let args = parse_json_object(r#"{"query":"  rust  ","translate":"true"}"#)
//!     .expect("object should parse");
//! assert_eq!(required_string(&args, "query").expect("query should be present"), "rust");
//! assert_eq!(optional_bool(&args, "translate").expect("flag should parse"), Some(true));
//! assert_eq!(optional_bool(&args, "missing").expect("missing is fine"), None);
//! ```

use serde_json::{Map, Value};

use crate::ToolError;

pub type ToolArgs = Map<String, Value>;

pub fn parse_json_value(args_json: &str) -> Result<Value, ToolError> {
    serde_json::from_str(args_json)
        .map_err(|err| ToolError::invalid_arguments(format!("invalid JSON arguments: {err}")))
}

pub fn parse_json_object(args_json: &str) -> Result<ToolArgs, ToolError> {
    if args_json.trim().is_empty() {
        return Ok(ToolArgs::new());
    }

    match parse_json_value(args_json)? {
        Value::Object(map) => Ok(map),
        _ => Err(ToolError::invalid_arguments("expected JSON object arguments")),
    }
}

pub fn required_string(args: &ToolArgs, key: &str) -> Result<String, ToolError> {
    let raw = args
        .get(key)
        .ok_or_else(|| ToolError::invalid_arguments(format!("{key} is required")))?;

    raw.as_str()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| ToolError::invalid_arguments(format!("{key} must be a non-empty string")))
}

/// Blank strings are reported as absent.
pub fn optional_string(args: &ToolArgs, key: &str) -> Result<Option<String>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => {
            let value = value.trim();
            Ok((!value.is_empty()).then(|| value.to_string()))
        }
        Some(_) => Err(ToolError::invalid_arguments(format!("{key} must be a string"))),
    }
}

pub fn optional_bool(args: &ToolArgs, key: &str) -> Result<Option<bool>, ToolError> {
    let invalid = || ToolError::invalid_arguments(format!("{key} must be a boolean"));

    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(value)) => Ok(Some(*value)),
        Some(Value::String(value)) => parse_bool_literal(value.trim()).map(Some).ok_or_else(invalid),
        Some(_) => Err(invalid()),
    }
}

pub fn optional_i64(args: &ToolArgs, key: &str) -> Result<Option<i64>, ToolError> {
    let invalid = || ToolError::invalid_arguments(format!("{key} must be an integer"));

    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => {
            if let Some(value) = number.as_i64() {
                return Ok(Some(value));
            }
            // Floats truncate toward zero; the cast saturates out-of-range values.
            match number.as_f64() {
                Some(value) if value.is_finite() => Ok(Some(value.trunc() as i64)),
                _ => Err(invalid()),
            }
        }
        Some(Value::String(value)) => value.trim().parse::<i64>().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

pub fn required_array<'a>(args: &'a ToolArgs, key: &str) -> Result<&'a Vec<Value>, ToolError> {
    args.get(key)
        .ok_or_else(|| ToolError::invalid_arguments(format!("{key} is required")))?
        .as_array()
        .ok_or_else(|| ToolError::invalid_arguments(format!("{key} must be an array")))
}

/// Returns the element records of an array-of-objects argument, in order.
pub fn required_object_array<'a>(
    args: &'a ToolArgs,
    key: &str,
) -> Result<Vec<&'a ToolArgs>, ToolError> {
    required_array(args, key)?
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_object().ok_or_else(|| {
                ToolError::invalid_arguments(format!("{key}[{index}] must be an object"))
            })
        })
        .collect()
}

/// Blank elements are dropped; any non-string element fails the whole call.
pub fn optional_string_array(args: &ToolArgs, key: &str) -> Result<Vec<String>, ToolError> {
    let items = match args.get(key) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(ToolError::invalid_arguments(format!(
                "{key} must be an array of strings"
            )));
        }
    };

    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let text = item.as_str().ok_or_else(|| {
            ToolError::invalid_arguments(format!("{key}[{index}] must be a string"))
        })?;
        let text = text.trim();
        if !text.is_empty() {
            out.push(text.to_string());
        }
    }

    Ok(out)
}

/// Trims and uppercases `value`, then checks it against a closed set.
pub fn normalize_choice(value: &str, allowed: &[&str], label: &str) -> Result<String, ToolError> {
    let normalized = value.trim().to_uppercase();
    if normalized.is_empty() {
        return Err(ToolError::invalid_arguments(format!(
            "{label} must be non-empty"
        )));
    }

    if !allowed.contains(&normalized.as_str()) {
        return Err(ToolError::invalid_arguments(format!(
            "unsupported {label} {value:?}; allowed: {}",
            allowed.join(", ")
        )));
    }

    Ok(normalized)
}

/// Prefixes an element-level error with `key[index]`.
pub fn indexed(key: &str, index: usize) -> impl FnOnce(ToolError) -> ToolError {
    let label = format!("{key}[{index}]");
    move |error| error.with_context(label)
}

fn parse_bool_literal(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
