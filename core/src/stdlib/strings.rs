//! String and collection functions.

use crate::evaluator::ExecutionErrorKind;
use crate::stdlib::{Builtin, no_overload};
use crate::values::Value;

pub const BUILTINS: &[Builtin] = &[
    Builtin::new("size", 1, size),
    Builtin::new("contains", 2, string_contains),
    Builtin::new("startsWith", 2, string_starts_with),
    Builtin::new("endsWith", 2, string_ends_with),
    Builtin::new("toLower", 1, string_lower),
    Builtin::new("toUpper", 1, string_upper),
    Builtin::new("trim", 1, string_trim),
    Builtin::new("split", 2, string_split),
];

/// Length of a string (in code points), bytes, list or map.
fn size(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    let len = match &args[0] {
        Value::String(s) => s.chars().count(),
        Value::Bytes(b) => b.len(),
        Value::List(items) => items.len(),
        Value::Map(map) => map.len(),
        _ => return Err(no_overload("size", args)),
    };
    Ok(Value::Int(len as i64))
}

fn two_strings<'v>(name: &str, args: &'v [Value]) -> Result<(&'v str, &'v str), ExecutionErrorKind> {
    match (&args[0], &args[1]) {
        (Value::String(a), Value::String(b)) => Ok((a, b)),
        _ => Err(no_overload(name, args)),
    }
}

fn one_string<'v>(name: &str, args: &'v [Value]) -> Result<&'v str, ExecutionErrorKind> {
    args[0].as_str().ok_or_else(|| no_overload(name, args))
}

fn string_contains(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    let (s, needle) = two_strings("contains", args)?;
    Ok(Value::Bool(s.contains(needle)))
}

fn string_starts_with(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    let (s, prefix) = two_strings("startsWith", args)?;
    Ok(Value::Bool(s.starts_with(prefix)))
}

fn string_ends_with(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    let (s, suffix) = two_strings("endsWith", args)?;
    Ok(Value::Bool(s.ends_with(suffix)))
}

fn string_lower(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    Ok(Value::string(one_string("toLower", args)?.to_lowercase()))
}

fn string_upper(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    Ok(Value::string(one_string("toUpper", args)?.to_uppercase()))
}

fn string_trim(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    Ok(Value::string(one_string("trim", args)?.trim()))
}

/// Split by a separator. An empty separator splits into characters.
fn string_split(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    let (s, separator) = two_strings("split", args)?;
    let parts: Vec<Value> = if separator.is_empty() {
        s.chars().map(|c| Value::string(c.to_string())).collect()
    } else {
        s.split(separator).map(Value::from).collect()
    };
    Ok(Value::from(parts))
}
