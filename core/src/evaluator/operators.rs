//! Operator semantics shared by the evaluator and the standard library.
//!
//! Arithmetic never converts between numeric kinds: `1 + 1u` is a type
//! mismatch. Equality and ordering do compare `int`, `uint` and `double`
//! numerically.

use core::cmp::Ordering;

use crate::evaluator::ExecutionErrorKind;
use crate::parser::{BinaryOp, ComparisonOp, UnaryOp};
use crate::values::{
    MapKey, Value, ValueMap, add_duration, sub_duration, timestamp_difference,
};

pub fn unary(op: UnaryOp, value: &Value) -> Result<Value, ExecutionErrorKind> {
    match (op, value) {
        (UnaryOp::Neg, Value::Int(i)) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| ExecutionErrorKind::overflow("negation")),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Neg, Value::Duration(d)) => d
            .checked_neg()
            .map(Value::Duration)
            .ok_or_else(|| ExecutionErrorKind::overflow("negation")),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        _ => Err(ExecutionErrorKind::no_overload(op.to_string(), &[value])),
    }
}

pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, ExecutionErrorKind> {
    use Value::*;

    let overflow = || ExecutionErrorKind::overflow(op_name(op));

    match (op, left, right) {
        // Integers
        (BinaryOp::Add, Int(a), Int(b)) => a.checked_add(*b).map(Int).ok_or_else(overflow),
        (BinaryOp::Sub, Int(a), Int(b)) => a.checked_sub(*b).map(Int).ok_or_else(overflow),
        (BinaryOp::Mul, Int(a), Int(b)) => a.checked_mul(*b).map(Int).ok_or_else(overflow),
        (BinaryOp::Div, Int(_), Int(0)) => Err(ExecutionErrorKind::DivisionByZero),
        (BinaryOp::Div, Int(a), Int(b)) => a.checked_div(*b).map(Int).ok_or_else(overflow),
        (BinaryOp::Rem, Int(_), Int(0)) => Err(ExecutionErrorKind::ModuloByZero),
        (BinaryOp::Rem, Int(a), Int(b)) => a.checked_rem(*b).map(Int).ok_or_else(overflow),

        // Unsigned integers
        (BinaryOp::Add, Uint(a), Uint(b)) => a.checked_add(*b).map(Uint).ok_or_else(overflow),
        (BinaryOp::Sub, Uint(a), Uint(b)) => a.checked_sub(*b).map(Uint).ok_or_else(overflow),
        (BinaryOp::Mul, Uint(a), Uint(b)) => a.checked_mul(*b).map(Uint).ok_or_else(overflow),
        (BinaryOp::Div, Uint(_), Uint(0)) => Err(ExecutionErrorKind::DivisionByZero),
        (BinaryOp::Div, Uint(a), Uint(b)) => Ok(Uint(a / b)),
        (BinaryOp::Rem, Uint(_), Uint(0)) => Err(ExecutionErrorKind::ModuloByZero),
        (BinaryOp::Rem, Uint(a), Uint(b)) => Ok(Uint(a % b)),

        // Doubles follow IEEE 754, including division by zero.
        (BinaryOp::Add, Float(a), Float(b)) => Ok(Float(a + b)),
        (BinaryOp::Sub, Float(a), Float(b)) => Ok(Float(a - b)),
        (BinaryOp::Mul, Float(a), Float(b)) => Ok(Float(a * b)),
        (BinaryOp::Div, Float(a), Float(b)) => Ok(Float(a / b)),

        // Concatenation
        (BinaryOp::Add, String(a), String(b)) => {
            let mut out = a.to_string();
            out.push_str(b);
            Ok(Value::string(out))
        }
        (BinaryOp::Add, Bytes(a), Bytes(b)) => {
            Ok(Value::bytes([a.as_ref(), b.as_ref()].concat()))
        }
        (BinaryOp::Add, List(a), List(b)) => Ok(Value::list(a.iter().chain(b.iter()).cloned())),

        // Time
        (BinaryOp::Add, Timestamp(ts), Duration(d)) | (BinaryOp::Add, Duration(d), Timestamp(ts)) => {
            add_duration(*ts, *d).map(Timestamp).ok_or_else(overflow)
        }
        (BinaryOp::Sub, Timestamp(ts), Duration(d)) => {
            sub_duration(*ts, *d).map(Timestamp).ok_or_else(overflow)
        }
        (BinaryOp::Sub, Timestamp(a), Timestamp(b)) => {
            timestamp_difference(*a, *b).map(Duration).ok_or_else(overflow)
        }
        (BinaryOp::Add, Duration(a), Duration(b)) => {
            a.checked_add(*b).map(Duration).ok_or_else(overflow)
        }
        (BinaryOp::Sub, Duration(a), Duration(b)) => {
            a.checked_sub(*b).map(Duration).ok_or_else(overflow)
        }

        _ => Err(ExecutionErrorKind::no_overload(op.to_string(), &[left, right])),
    }
}

fn op_name(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "addition",
        BinaryOp::Sub => "subtraction",
        BinaryOp::Mul => "multiplication",
        BinaryOp::Div => "division",
        BinaryOp::Rem => "modulus",
    }
}

/// Relational operators other than `in`.
pub fn compare(op: ComparisonOp, left: &Value, right: &Value) -> Result<Value, ExecutionErrorKind> {
    let result = match op {
        ComparisonOp::Eq => equals(left, right),
        ComparisonOp::Neq => !equals(left, right),
        ComparisonOp::In => contains(right, left)?,
        ComparisonOp::Lt | ComparisonOp::Le | ComparisonOp::Gt | ComparisonOp::Ge => {
            match order(left, right) {
                // NaN is unordered: every relation is false.
                Some(None) => false,
                Some(Some(ordering)) => match op {
                    ComparisonOp::Lt => ordering == Ordering::Less,
                    ComparisonOp::Le => ordering != Ordering::Greater,
                    ComparisonOp::Gt => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                },
                None => {
                    return Err(ExecutionErrorKind::no_overload(
                        op.to_string(),
                        &[left, right],
                    ));
                }
            }
        }
    };
    Ok(Value::Bool(result))
}

/// Compare two numbers of any kind. `None` when either side is not numeric;
/// `Some(None)` when the comparison involves NaN.
pub fn numeric_order(left: &Value, right: &Value) -> Option<Option<Ordering>> {
    use Value::*;
    let ordering = match (left, right) {
        (Int(a), Int(b)) => Some(a.cmp(b)),
        (Uint(a), Uint(b)) => Some(a.cmp(b)),
        (Int(a), Uint(b)) => Some(i128::from(*a).cmp(&i128::from(*b))),
        (Uint(a), Int(b)) => Some(i128::from(*a).cmp(&i128::from(*b))),
        (Float(a), Float(b)) => a.partial_cmp(b),
        (Int(a), Float(b)) => (*a as f64).partial_cmp(b),
        (Uint(a), Float(b)) => (*a as f64).partial_cmp(b),
        (Float(a), Int(b)) => a.partial_cmp(&(*b as f64)),
        (Float(a), Uint(b)) => a.partial_cmp(&(*b as f64)),
        _ => return None,
    };
    Some(ordering)
}

/// Ordering for the relational operators. `None` when the kinds are not
/// comparable.
pub fn order(left: &Value, right: &Value) -> Option<Option<Ordering>> {
    use Value::*;
    if let Some(ordering) = numeric_order(left, right) {
        return Some(ordering);
    }
    let ordering = match (left, right) {
        (Bool(a), Bool(b)) => a.cmp(b),
        (String(a), String(b)) => a.cmp(b),
        (Bytes(a), Bytes(b)) => a.cmp(b),
        (Timestamp(a), Timestamp(b)) => a.cmp(b),
        (Duration(a), Duration(b)) => a.cmp(b),
        _ => return None,
    };
    Some(Some(ordering))
}

/// Language-level equality. Values of unrelated kinds are simply unequal.
pub fn equals(left: &Value, right: &Value) -> bool {
    use Value::*;
    if let Some(ordering) = numeric_order(left, right) {
        return ordering == Some(Ordering::Equal);
    }
    match (left, right) {
        (Null, Null) => true,
        (Bool(a), Bool(b)) => a == b,
        (String(a), String(b)) => a == b,
        (Bytes(a), Bytes(b)) => a == b,
        (Timestamp(a), Timestamp(b)) => a == b,
        (Duration(a), Duration(b)) => a == b,
        (List(a), List(b)) => a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| equals(x, y)),
        (Map(a), Map(b)) => {
            a.len() == b.len()
                && a.iter().all(|(key, value)| {
                    lookup(b, &key.to_value()).is_some_and(|other| equals(value, other))
                })
        }
        (FunctionRef { name: a, .. }, FunctionRef { name: b, .. }) => a == b,
        _ => false,
    }
}

/// `element in container`.
pub fn contains(container: &Value, element: &Value) -> Result<bool, ExecutionErrorKind> {
    match container {
        Value::List(items) => Ok(items.iter().any(|item| equals(item, element))),
        Value::Map(map) => Ok(lookup(map, element).is_some()),
        _ => Err(ExecutionErrorKind::no_overload("in", &[element, container])),
    }
}

/// Map lookup that lets `int`, `uint` and integral `double` keys find each
/// other.
pub fn lookup<'m>(map: &'m ValueMap, key: &Value) -> Option<&'m Value> {
    if let Some(exact) = MapKey::from_value(key).and_then(|k| map.get(&k)) {
        return Some(exact);
    }
    let alternatives: [Option<MapKey>; 2] = match key {
        Value::Int(i) => [u64::try_from(*i).ok().map(MapKey::Uint), None],
        Value::Uint(u) => [i64::try_from(*u).ok().map(MapKey::Int), None],
        Value::Float(f) if f.fract() == 0.0 => [
            (*f >= i64::MIN as f64 && *f < i64::MAX as f64).then(|| MapKey::Int(*f as i64)),
            (*f >= 0.0 && *f < u64::MAX as f64).then(|| MapKey::Uint(*f as u64)),
        ],
        _ => [None, None],
    };
    alternatives
        .into_iter()
        .flatten()
        .find_map(|alternative| map.get(&alternative))
}
