//! Math functions.
//!
//! `abs`, `min` and `max` keep the numeric kind of their arguments; the
//! rounding functions, `sqrt` and `pow` work on doubles and accept integers.

use core::cmp::Ordering;

use crate::evaluator::ExecutionErrorKind;
use crate::evaluator::operators::numeric_order;
use crate::stdlib::{Builtin, no_overload};
use crate::values::Value;

pub const BUILTINS: &[Builtin] = &[
    Builtin::new("abs", 1, math_abs),
    Builtin::new("ceil", 1, math_ceil),
    Builtin::new("floor", 1, math_floor),
    Builtin::new("round", 1, math_round),
    Builtin::new("sqrt", 1, math_sqrt),
    Builtin::new("pow", 2, math_pow),
    Builtin::ranged("min", 1, usize::MAX, math_min),
    Builtin::ranged("max", 1, usize::MAX, math_max),
];

fn as_double(value: &Value) -> Option<f64> {
    match value {
        Value::Float(f) => Some(*f),
        Value::Int(i) => Some(*i as f64),
        Value::Uint(u) => Some(*u as f64),
        _ => None,
    }
}

// ============================================================================
// Basic Operations
// ============================================================================

fn math_abs(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    match &args[0] {
        Value::Int(i) => i
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| ExecutionErrorKind::overflow("abs")),
        Value::Uint(u) => Ok(Value::Uint(*u)),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        _ => Err(no_overload("abs", args)),
    }
}

fn rounding(name: &str, args: &[Value], op: fn(f64) -> f64) -> Result<Value, ExecutionErrorKind> {
    as_double(&args[0])
        .map(|f| Value::Float(op(f)))
        .ok_or_else(|| no_overload(name, args))
}

fn math_ceil(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    rounding("ceil", args, f64::ceil)
}

fn math_floor(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    rounding("floor", args, f64::floor)
}

/// Round half away from zero.
fn math_round(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    rounding("round", args, f64::round)
}

fn math_sqrt(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    rounding("sqrt", args, f64::sqrt)
}

fn math_pow(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    match (as_double(&args[0]), as_double(&args[1])) {
        (Some(base), Some(exp)) => Ok(Value::Float(base.powf(exp))),
        _ => Err(no_overload("pow", args)),
    }
}

// ============================================================================
// Min / Max
// ============================================================================

/// Arguments are either one list or several numbers.
fn extremum(name: &str, args: &[Value], keep: Ordering) -> Result<Value, ExecutionErrorKind> {
    let candidates: &[Value] = match args {
        [Value::List(items)] => items,
        _ => args,
    };
    let mut best: Option<&Value> = None;
    for candidate in candidates {
        best = match best {
            None => {
                if numeric_order(candidate, candidate).is_none() {
                    return Err(no_overload(name, args));
                }
                Some(candidate)
            }
            Some(current) => match numeric_order(candidate, current) {
                Some(Some(ordering)) if ordering == keep => Some(candidate),
                Some(_) => Some(current),
                None => return Err(no_overload(name, args)),
            },
        };
    }
    best.cloned().ok_or_else(|| {
        ExecutionErrorKind::invalid_argument(name, "requires at least one value")
    })
}

fn math_min(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    extremum("min", args, Ordering::Less)
}

fn math_max(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    extremum("max", args, Ordering::Greater)
}
