//! Conversion between host values and runtime values.
//!
//! Decoding is where the host's loose number model gets resolved: a plain
//! number is an `int` when it is integral and a `double` otherwise, and the
//! single-field records `{cel_int}`, `{cel_uint}`, `{cel_float}` pin the kind
//! explicitly. `{sec, nsec}` records are durations in both directions.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{trace, warn};

use super::value::{CEL_FLOAT, CEL_INT, CEL_UINT, DURATION_NANOS, DURATION_SECONDS, HostValue};
use crate::values::{Duration, MapKey, Value};

/// Error produced when a host value has no runtime representation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A `cel_int` / `cel_uint` / `cel_float` record is malformed or its
    /// payload cannot be represented in the requested kind.
    #[error("invalid type pun: {0}")]
    InvalidTypePun(String),

    /// The host value kind cannot cross the boundary at all.
    #[error("unsupported host value: {0}")]
    Unsupported(String),

    /// An integer or duration does not fit the runtime representation.
    #[error("value out of range: {0}")]
    OutOfRange(String),
}

/// Decode a host value into a runtime value.
pub fn decode(value: &HostValue) -> Result<Value, CodecError> {
    match value {
        HostValue::Null => Ok(Value::Null),
        HostValue::Bool(b) => Ok(Value::Bool(*b)),
        HostValue::Number(n) => Ok(decode_number(*n)),
        HostValue::BigInt(i) => i64::try_from(*i)
            .map(Value::Int)
            .map_err(|_| CodecError::OutOfRange(format!("{} does not fit in int", i))),
        HostValue::String(s) => Ok(Value::string(s.as_str())),
        HostValue::Bytes(b) => Ok(Value::bytes(b.as_slice())),
        HostValue::Date(ts) => Ok(Value::Timestamp(*ts)),
        HostValue::Array(items) => {
            let items = items.iter().map(decode).collect::<Result<Vec<_>, _>>()?;
            Ok(Value::from(items))
        }
        HostValue::Record(fields) => decode_record(fields),
        HostValue::Function(_) => Err(CodecError::Unsupported(
            "functions must be bound with bind_func, not passed as values".to_string(),
        )),
    }
}

/// Encode a runtime value for the host.
///
/// Maps become records keyed by the text of each key, so this is lossy when
/// two keys share a text, as in `{1: a, "1": b}`. Only one field is kept:
/// a string key wins over a uint, which wins over an int, which wins over a
/// bool. Each dropped entry is logged at warn level.
pub fn encode(value: &Value) -> HostValue {
    match value {
        Value::Null => HostValue::Null,
        Value::Bool(b) => HostValue::Bool(*b),
        Value::Int(i) => HostValue::BigInt((*i).into()),
        Value::Uint(u) => HostValue::BigInt((*u).into()),
        Value::Float(f) => HostValue::Number(*f),
        Value::String(s) => HostValue::String(s.to_string()),
        Value::Bytes(b) => HostValue::Bytes(b.to_vec()),
        Value::List(items) => HostValue::Array(items.iter().map(encode).collect()),
        Value::Map(map) => {
            let mut fields = BTreeMap::new();
            // Keys iterate as bool, int, uint, string, so later kinds win.
            for (key, value) in map.iter() {
                if fields.insert(map_key_to_string(key), encode(value)).is_some() {
                    warn!(key = %key, "record field encoded twice, keeping the later key");
                }
            }
            HostValue::Record(fields)
        }
        Value::Timestamp(ts) => HostValue::Date(*ts),
        Value::Duration(d) => HostValue::duration(d.seconds(), d.nanos().into()),
        Value::FunctionRef { name, arity } => HostValue::record([
            ("function", HostValue::String(name.to_string())),
            (
                "arity",
                HostValue::BigInt(arity.map_or(-1, |n| n as i128)),
            ),
        ]),
    }
}

fn map_key_to_string(key: &MapKey) -> String {
    match key {
        MapKey::String(s) => s.to_string(),
        other => other.to_string(),
    }
}

// 2^63 is exactly representable; anything at or above it overflows i64.
const I64_RANGE: std::ops::Range<f64> = -9_223_372_036_854_775_808.0..9_223_372_036_854_775_808.0;

fn decode_number(n: f64) -> Value {
    if n.fract() == 0.0 && I64_RANGE.contains(&n) {
        Value::Int(n as i64)
    } else {
        Value::Float(n)
    }
}

fn decode_record(fields: &BTreeMap<String, HostValue>) -> Result<Value, CodecError> {
    if let Some(pun) = [CEL_INT, CEL_UINT, CEL_FLOAT]
        .into_iter()
        .find(|key| fields.contains_key(*key))
    {
        if fields.len() != 1 {
            return Err(CodecError::InvalidTypePun(format!(
                "a {} record must have exactly one field, found {}",
                pun,
                fields.len()
            )));
        }
        let payload = &fields[pun];
        trace!(pun, kind = payload.type_name(), "Decoding type pun");
        return match pun {
            CEL_INT => decode_pun_int(payload).map(Value::Int),
            CEL_UINT => decode_pun_uint(payload).map(Value::Uint),
            _ => decode_pun_float(payload).map(Value::Float),
        };
    }

    if let Some(duration) = decode_duration_record(fields)? {
        return Ok(Value::Duration(duration));
    }

    let entries = fields
        .iter()
        .map(|(key, value)| Ok((MapKey::String(key.as_str().into()), decode(value)?)))
        .collect::<Result<Vec<_>, CodecError>>()?;
    Ok(Value::map(entries))
}

/// A finite pun payload, truncated toward zero for the integer kinds.
enum Numeric {
    Integer(i128),
    Float(f64),
}

fn pun_payload(pun: &str, payload: &HostValue) -> Result<Numeric, CodecError> {
    match payload {
        HostValue::BigInt(i) => Ok(Numeric::Integer(*i)),
        HostValue::Number(n) if n.is_finite() => Ok(Numeric::Float(*n)),
        HostValue::Number(n) => Err(CodecError::InvalidTypePun(format!(
            "{} payload {} is not finite",
            pun, n
        ))),
        HostValue::String(s) => {
            let text = s.trim();
            if let Ok(i) = text.parse::<i128>() {
                return Ok(Numeric::Integer(i));
            }
            match text.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(Numeric::Float(n)),
                _ => Err(CodecError::InvalidTypePun(format!(
                    "{} payload '{}' is not a number",
                    pun, s
                ))),
            }
        }
        other => Err(CodecError::InvalidTypePun(format!(
            "{} payload must be a number, bigint or numeric string, found {}",
            pun,
            other.type_name()
        ))),
    }
}

fn decode_pun_int(payload: &HostValue) -> Result<i64, CodecError> {
    let out_of_range = |v: &dyn std::fmt::Display| {
        CodecError::InvalidTypePun(format!("{} payload {} does not fit in int", CEL_INT, v))
    };
    match pun_payload(CEL_INT, payload)? {
        Numeric::Integer(i) => i64::try_from(i).map_err(|_| out_of_range(&i)),
        Numeric::Float(n) => {
            let t = n.trunc();
            if I64_RANGE.contains(&t) {
                Ok(t as i64)
            } else {
                Err(out_of_range(&n))
            }
        }
    }
}

fn decode_pun_uint(payload: &HostValue) -> Result<u64, CodecError> {
    let invalid = |v: &dyn std::fmt::Display| {
        CodecError::InvalidTypePun(format!(
            "{} payload {} does not fit in uint",
            CEL_UINT, v
        ))
    };
    match pun_payload(CEL_UINT, payload)? {
        Numeric::Integer(i) => u64::try_from(i).map_err(|_| invalid(&i)),
        Numeric::Float(n) => {
            let t = n.trunc();
            if (0.0..18_446_744_073_709_551_616.0).contains(&t) {
                Ok(t as u64)
            } else {
                Err(invalid(&n))
            }
        }
    }
}

fn decode_pun_float(payload: &HostValue) -> Result<f64, CodecError> {
    match pun_payload(CEL_FLOAT, payload)? {
        Numeric::Integer(i) => Ok(i as f64),
        Numeric::Float(n) => Ok(n),
    }
}

/// Recognize `{sec, nsec}` with integral members. Anything else is left to the
/// generic map path.
fn decode_duration_record(
    fields: &BTreeMap<String, HostValue>,
) -> Result<Option<Duration>, CodecError> {
    if fields.len() != 2 {
        return Ok(None);
    }
    let (Some(sec), Some(nsec)) = (fields.get(DURATION_SECONDS), fields.get(DURATION_NANOS))
    else {
        return Ok(None);
    };
    let (Some(sec), Some(nsec)) = (integral(sec), integral(nsec)) else {
        return Ok(None);
    };

    let total = sec
        .checked_mul(1_000_000_000)
        .and_then(|s| s.checked_add(nsec));
    total
        .and_then(Duration::from_nanos)
        .map(Some)
        .ok_or_else(|| {
            CodecError::OutOfRange(format!("duration {{sec: {}, nsec: {}}}", sec, nsec))
        })
}

fn integral(value: &HostValue) -> Option<i128> {
    match value {
        HostValue::BigInt(i) => Some(*i),
        HostValue::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e30 => {
            Some(*n as i128)
        }
        _ => None,
    }
}

impl TryFrom<&HostValue> for Value {
    type Error = CodecError;

    fn try_from(value: &HostValue) -> Result<Self, Self::Error> {
        decode(value)
    }
}

impl TryFrom<HostValue> for Value {
    type Error = CodecError;

    fn try_from(value: HostValue) -> Result<Self, Self::Error> {
        decode(&value)
    }
}

impl From<&Value> for HostValue {
    fn from(value: &Value) -> Self {
        encode(value)
    }
}

impl From<Value> for HostValue {
    fn from(value: Value) -> Self {
        encode(&value)
    }
}
