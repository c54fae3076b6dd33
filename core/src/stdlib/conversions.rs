//! Type conversions and type inspection.

use crate::evaluator::ExecutionErrorKind;
use crate::stdlib::{Builtin, no_overload};
use crate::values::{Duration, Value, parse_duration, parse_timestamp};

pub const BUILTINS: &[Builtin] = &[
    Builtin::new("int", 1, to_int),
    Builtin::new("uint", 1, to_uint),
    Builtin::new("double", 1, to_double),
    Builtin::new("string", 1, to_string),
    Builtin::new("bytes", 1, to_bytes),
    Builtin::new("bool", 1, to_bool),
    Builtin::new("dyn", 1, identity),
    Builtin::new("type", 1, type_of),
    Builtin::new("timestamp", 1, to_timestamp),
    Builtin::new("duration", 1, to_duration),
];

// ============================================================================
// Numbers
// ============================================================================

const I64_RANGE: core::ops::Range<f64> = -9_223_372_036_854_775_808.0..9_223_372_036_854_775_808.0;
const U64_RANGE: core::ops::Range<f64> = 0.0..18_446_744_073_709_551_616.0;

/// Convert to int. Doubles truncate toward zero; timestamps give Unix seconds.
fn to_int(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    let out_of_range = || ExecutionErrorKind::invalid_argument("int", "value out of int range");
    match &args[0] {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Uint(u) => i64::try_from(*u).map(Value::Int).map_err(|_| out_of_range()),
        Value::Float(f) => {
            let t = f.trunc();
            if I64_RANGE.contains(&t) {
                Ok(Value::Int(t as i64))
            } else {
                Err(out_of_range())
            }
        }
        Value::String(s) => s.trim().parse().map(Value::Int).map_err(|_| {
            ExecutionErrorKind::invalid_argument("int", format!("cannot parse '{}' as int", s))
        }),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Timestamp(ts) => Ok(Value::Int(ts.timestamp())),
        Value::Duration(d) => Ok(Value::Int(d.seconds())),
        _ => Err(no_overload("int", args)),
    }
}

fn to_uint(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    let out_of_range = || ExecutionErrorKind::invalid_argument("uint", "value out of uint range");
    match &args[0] {
        Value::Uint(u) => Ok(Value::Uint(*u)),
        Value::Int(i) => u64::try_from(*i).map(Value::Uint).map_err(|_| out_of_range()),
        Value::Float(f) => {
            let t = f.trunc();
            if U64_RANGE.contains(&t) {
                Ok(Value::Uint(t as u64))
            } else {
                Err(out_of_range())
            }
        }
        Value::String(s) => s.trim().parse().map(Value::Uint).map_err(|_| {
            ExecutionErrorKind::invalid_argument("uint", format!("cannot parse '{}' as uint", s))
        }),
        Value::Bool(b) => Ok(Value::Uint(u64::from(*b))),
        _ => Err(no_overload("uint", args)),
    }
}

fn to_double(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    match &args[0] {
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Int(i) => Ok(Value::Float(*i as f64)),
        Value::Uint(u) => Ok(Value::Float(*u as f64)),
        Value::String(s) => parse_double(s.trim()).map(Value::Float).ok_or_else(|| {
            ExecutionErrorKind::invalid_argument("double", format!("cannot parse '{}' as double", s))
        }),
        _ => Err(no_overload("double", args)),
    }
}

fn parse_double(text: &str) -> Option<f64> {
    match text {
        "NaN" => Some(f64::NAN),
        "Infinity" | "+Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        _ => text.parse().ok(),
    }
}

// ============================================================================
// Strings, bytes and booleans
// ============================================================================

fn to_string(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    let text = match &args[0] {
        Value::String(s) => return Ok(Value::String(s.clone())),
        Value::Int(i) => i.to_string(),
        Value::Uint(u) => u.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Bytes(b) => core::str::from_utf8(b)
            .map_err(|_| ExecutionErrorKind::invalid_argument("string", "bytes are not valid UTF-8"))?
            .to_string(),
        Value::Timestamp(ts) => ts.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true),
        Value::Duration(d) => d.to_string(),
        Value::Null => "null".to_string(),
        _ => return Err(no_overload("string", args)),
    };
    Ok(Value::string(text))
}

fn to_bytes(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    match &args[0] {
        Value::Bytes(b) => Ok(Value::Bytes(b.clone())),
        Value::String(s) => Ok(Value::bytes(s.as_bytes())),
        _ => Err(no_overload("bytes", args)),
    }
}

fn to_bool(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    match &args[0] {
        Value::Bool(b) => Ok(Value::Bool(*b)),
        Value::String(s) => match s.as_ref() {
            "true" | "TRUE" | "True" | "t" | "1" => Ok(Value::Bool(true)),
            "false" | "FALSE" | "False" | "f" | "0" => Ok(Value::Bool(false)),
            _ => Err(ExecutionErrorKind::invalid_argument(
                "bool",
                format!("cannot parse '{}' as bool", s),
            )),
        },
        _ => Err(no_overload("bool", args)),
    }
}

fn identity(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    Ok(args[0].clone())
}

/// The type name of a value as a string, e.g. `type(1.0) == "double"`.
fn type_of(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    Ok(Value::string(args[0].type_name()))
}

// ============================================================================
// Time
// ============================================================================

fn to_timestamp(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    match &args[0] {
        Value::Timestamp(ts) => Ok(Value::Timestamp(*ts)),
        Value::String(s) => parse_timestamp(s)
            .map(Value::Timestamp)
            .map_err(|message| ExecutionErrorKind::invalid_argument("timestamp", message)),
        Value::Int(seconds) => chrono::DateTime::from_timestamp(*seconds, 0)
            .map(Value::Timestamp)
            .ok_or_else(|| ExecutionErrorKind::invalid_argument("timestamp", "seconds out of range")),
        _ => Err(no_overload("timestamp", args)),
    }
}

fn to_duration(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    match &args[0] {
        Value::Duration(d) => Ok(Value::Duration(*d)),
        Value::String(s) => parse_duration(s)
            .map(Value::Duration)
            .map_err(|message| ExecutionErrorKind::invalid_argument("duration", message)),
        Value::Int(seconds) => Ok(Value::Duration(Duration::from_seconds(*seconds))),
        _ => Err(no_overload("duration", args)),
    }
}
