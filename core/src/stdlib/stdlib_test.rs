//! Tests for the standard library builtins, called directly.

use pretty_assertions::assert_eq;

use super::{Library, standard_library};
use crate::evaluator::ExecutionErrorKind;
use crate::values::{Duration, Value, parse_timestamp};

fn call(library: &Library, name: &str, args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    let builtin = library
        .get(name)
        .unwrap_or_else(|| panic!("builtin '{}' should exist", name));
    assert!(
        builtin.accepts(args.len()),
        "'{}' does not accept {} argument(s)",
        name,
        args.len()
    );
    (builtin.function)(args)
}

fn ok(name: &str, args: &[Value]) -> Value {
    call(&standard_library(), name, args)
        .unwrap_or_else(|e| panic!("{}({:?}) failed: {}", name, args, e))
}

fn err(name: &str, args: &[Value]) -> ExecutionErrorKind {
    match call(&standard_library(), name, args) {
        Ok(value) => panic!("{}({:?}) should fail, got {}", name, args, value),
        Err(e) => e,
    }
}

fn ts(text: &str) -> Value {
    Value::Timestamp(parse_timestamp(text).unwrap())
}

#[test]
fn test_library_has_every_builtin() {
    let library = standard_library();
    for name in [
        "int", "uint", "double", "string", "bytes", "bool", "dyn", "type", "timestamp",
        "duration", "size", "contains", "startsWith", "endsWith", "toLower", "toUpper", "trim",
        "split", "abs", "ceil", "floor", "round", "sqrt", "pow", "min", "max", "getFullYear",
        "getMonth", "getDayOfMonth", "getDate", "getDayOfWeek", "getDayOfYear", "getHours",
        "getMinutes", "getSeconds", "getMilliseconds",
    ] {
        assert!(library.contains_key(name), "missing builtin '{}'", name);
    }
}

#[test]
fn test_arity_description() {
    let library = standard_library();
    assert_eq!(library["size"].arity_description(), "1");
    assert_eq!(library["getHours"].arity_description(), "1 to 2");
    assert_eq!(library["size"].fixed_arity(), Some(1));
    assert_eq!(library["max"].fixed_arity(), None);
}

// ============================================================================
// Conversions
// ============================================================================

#[test]
fn test_int_conversion() {
    assert_eq!(ok("int", &[Value::Float(2.9)]), Value::Int(2));
    assert_eq!(ok("int", &[Value::Float(-2.9)]), Value::Int(-2));
    assert_eq!(ok("int", &[Value::Uint(7)]), Value::Int(7));
    assert_eq!(ok("int", &[Value::from(" 42 ")]), Value::Int(42));
    assert_eq!(ok("int", &[ts("1970-01-01T00:01:00Z")]), Value::Int(60));

    assert!(matches!(
        err("int", &[Value::Uint(u64::MAX)]),
        ExecutionErrorKind::InvalidArgument { .. }
    ));
    assert!(matches!(
        err("int", &[Value::Float(f64::NAN)]),
        ExecutionErrorKind::InvalidArgument { .. }
    ));
    assert!(matches!(
        err("int", &[Value::from("forty")]),
        ExecutionErrorKind::InvalidArgument { .. }
    ));
    assert!(matches!(
        err("int", &[Value::list(vec![])]),
        ExecutionErrorKind::TypeMismatch { .. }
    ));
}

#[test]
fn test_uint_and_double_conversion() {
    assert_eq!(ok("uint", &[Value::Int(3)]), Value::Uint(3));
    assert_eq!(ok("uint", &[Value::Float(3.7)]), Value::Uint(3));
    assert!(matches!(
        err("uint", &[Value::Int(-1)]),
        ExecutionErrorKind::InvalidArgument { .. }
    ));

    assert_eq!(ok("double", &[Value::Int(2)]), Value::Float(2.0));
    assert_eq!(ok("double", &[Value::from("1.5")]), Value::Float(1.5));
    assert_eq!(
        ok("double", &[Value::from("-Infinity")]),
        Value::Float(f64::NEG_INFINITY)
    );
    assert!(ok("double", &[Value::from("NaN")]).as_float().unwrap().is_nan());
}

#[test]
fn test_string_bytes_bool_conversion() {
    assert_eq!(ok("string", &[Value::Int(-5)]), Value::from("-5"));
    assert_eq!(ok("string", &[Value::Uint(5)]), Value::from("5"));
    assert_eq!(ok("string", &[Value::Bool(true)]), Value::from("true"));
    assert_eq!(ok("string", &[Value::bytes(&b"hi"[..])]), Value::from("hi"));
    assert_eq!(
        ok("string", &[Value::Duration(Duration::from_millis(1500))]),
        Value::from("1.5s")
    );
    assert!(matches!(
        err("string", &[Value::bytes(&[0xff][..])]),
        ExecutionErrorKind::InvalidArgument { .. }
    ));

    assert_eq!(ok("bytes", &[Value::from("ab")]), Value::bytes(&b"ab"[..]));
    assert_eq!(ok("bool", &[Value::from("true")]), Value::Bool(true));
    assert_eq!(ok("bool", &[Value::from("0")]), Value::Bool(false));
    assert!(matches!(
        err("bool", &[Value::from("maybe")]),
        ExecutionErrorKind::InvalidArgument { .. }
    ));
}

#[test]
fn test_type_and_dyn() {
    assert_eq!(ok("type", &[Value::Float(1.0)]), Value::from("double"));
    assert_eq!(ok("type", &[Value::Uint(1)]), Value::from("uint"));
    assert_eq!(ok("type", &[Value::Null]), Value::from("null_type"));
    assert_eq!(ok("dyn", &[Value::Int(1)]), Value::Int(1));
}

#[test]
fn test_timestamp_and_duration_conversion() {
    assert_eq!(
        ok("timestamp", &[Value::from("2024-01-02T03:04:05Z")]),
        ts("2024-01-02T03:04:05Z")
    );
    assert_eq!(ok("timestamp", &[Value::Int(0)]), ts("1970-01-01T00:00:00Z"));
    assert!(matches!(
        err("timestamp", &[Value::from("yesterday")]),
        ExecutionErrorKind::InvalidArgument { .. }
    ));

    assert_eq!(
        ok("duration", &[Value::from("1m30s")]),
        Value::Duration(Duration::from_seconds(90))
    );
    assert_eq!(
        ok("duration", &[Value::Int(5)]),
        Value::Duration(Duration::from_seconds(5))
    );
    assert!(matches!(
        err("duration", &[Value::from("5 parsecs")]),
        ExecutionErrorKind::InvalidArgument { .. }
    ));
}

#[test]
fn test_duration_overflow_is_an_argument_error() {
    const NANOS_PER_HOUR: i128 = 3_600_000_000_000;
    let huge = [
        format!("{}.99h", i128::MAX / NANOS_PER_HOUR),
        format!("{}h", i128::MAX / NANOS_PER_HOUR + 1),
        format!("{}s{}s", i64::MAX, i64::MAX),
    ];
    for text in huge {
        assert!(
            matches!(
                err("duration", &[Value::from(text.as_str())]),
                ExecutionErrorKind::InvalidArgument { .. }
            ),
            "duration('{}') should be rejected",
            text
        );
    }
}

// ============================================================================
// Strings and collections
// ============================================================================

#[test]
fn test_size() {
    assert_eq!(ok("size", &[Value::from("héllo")]), Value::Int(5));
    assert_eq!(ok("size", &[Value::bytes(&b"h\xc3\xa9"[..])]), Value::Int(3));
    assert_eq!(
        ok("size", &[Value::from(vec![Value::Int(1), Value::Int(2)])]),
        Value::Int(2)
    );
    assert_eq!(
        ok("size", &[Value::record([("a", Value::Int(1))])]),
        Value::Int(1)
    );
    assert!(matches!(
        err("size", &[Value::Int(3)]),
        ExecutionErrorKind::TypeMismatch { .. }
    ));
}

#[test]
fn test_string_predicates() {
    let s = Value::from("hello world");
    assert_eq!(ok("contains", &[s.clone(), Value::from("lo w")]), Value::Bool(true));
    assert_eq!(ok("startsWith", &[s.clone(), Value::from("hell")]), Value::Bool(true));
    assert_eq!(ok("endsWith", &[s.clone(), Value::from("hello")]), Value::Bool(false));
    assert!(matches!(
        err("contains", &[s, Value::Int(1)]),
        ExecutionErrorKind::TypeMismatch { .. }
    ));
}

#[test]
fn test_string_transforms() {
    assert_eq!(ok("toLower", &[Value::from("AbC")]), Value::from("abc"));
    assert_eq!(ok("toUpper", &[Value::from("AbC")]), Value::from("ABC"));
    assert_eq!(ok("trim", &[Value::from("  x \n")]), Value::from("x"));
    assert_eq!(
        ok("split", &[Value::from("a,b,,c"), Value::from(",")]),
        Value::from(vec![
            Value::from("a"),
            Value::from("b"),
            Value::from(""),
            Value::from("c"),
        ])
    );
    assert_eq!(
        ok("split", &[Value::from("ab"), Value::from("")]),
        Value::from(vec![Value::from("a"), Value::from("b")])
    );
}

// ============================================================================
// Math
// ============================================================================

#[test]
fn test_abs() {
    assert_eq!(ok("abs", &[Value::Int(-3)]), Value::Int(3));
    assert_eq!(ok("abs", &[Value::Float(-1.5)]), Value::Float(1.5));
    assert_eq!(ok("abs", &[Value::Uint(3)]), Value::Uint(3));
    assert!(matches!(
        err("abs", &[Value::Int(i64::MIN)]),
        ExecutionErrorKind::Overflow { .. }
    ));
}

#[test]
fn test_rounding_and_powers() {
    assert_eq!(ok("ceil", &[Value::Float(1.2)]), Value::Float(2.0));
    assert_eq!(ok("floor", &[Value::Float(-1.2)]), Value::Float(-2.0));
    assert_eq!(ok("round", &[Value::Float(2.5)]), Value::Float(3.0));
    assert_eq!(ok("round", &[Value::Float(-2.5)]), Value::Float(-3.0));
    assert_eq!(ok("sqrt", &[Value::Int(16)]), Value::Float(4.0));
    assert_eq!(ok("pow", &[Value::Int(2), Value::Int(10)]), Value::Float(1024.0));
    assert!(matches!(
        err("pow", &[Value::from("2"), Value::Int(1)]),
        ExecutionErrorKind::TypeMismatch { .. }
    ));
}

#[test]
fn test_min_max() {
    assert_eq!(
        ok("min", &[Value::Int(3), Value::Int(1), Value::Int(2)]),
        Value::Int(1)
    );
    assert_eq!(ok("max", &[Value::Int(3), Value::Float(3.5)]), Value::Float(3.5));
    assert_eq!(
        ok("max", &[Value::from(vec![Value::Uint(4), Value::Int(-1)])]),
        Value::Uint(4)
    );
    assert_eq!(ok("min", &[Value::Int(7)]), Value::Int(7));
    assert!(matches!(
        err("min", &[Value::from(Vec::<Value>::new())]),
        ExecutionErrorKind::InvalidArgument { .. }
    ));
    assert!(matches!(
        err("max", &[Value::Int(1), Value::from("2")]),
        ExecutionErrorKind::TypeMismatch { .. }
    ));
}

// ============================================================================
// Time
// ============================================================================

#[test]
fn test_calendar_accessors() {
    // 2024-03-05 is a Tuesday, day 65 of a leap year.
    let t = ts("2024-03-05T23:30:15.250Z");
    assert_eq!(ok("getFullYear", &[t.clone()]), Value::Int(2024));
    assert_eq!(ok("getMonth", &[t.clone()]), Value::Int(2));
    assert_eq!(ok("getDayOfMonth", &[t.clone()]), Value::Int(4));
    assert_eq!(ok("getDate", &[t.clone()]), Value::Int(5));
    assert_eq!(ok("getDayOfWeek", &[t.clone()]), Value::Int(2));
    assert_eq!(ok("getDayOfYear", &[t.clone()]), Value::Int(64));
    assert_eq!(ok("getHours", &[t.clone()]), Value::Int(23));
    assert_eq!(ok("getMinutes", &[t.clone()]), Value::Int(30));
    assert_eq!(ok("getSeconds", &[t.clone()]), Value::Int(15));
    assert_eq!(ok("getMilliseconds", &[t]), Value::Int(250));
}

#[test]
fn test_time_zone_argument() {
    let t = ts("2024-03-05T23:30:00Z");
    assert_eq!(ok("getHours", &[t.clone(), Value::from("+02:00")]), Value::Int(1));
    assert_eq!(ok("getDate", &[t.clone(), Value::from("+02:00")]), Value::Int(6));
    assert_eq!(ok("getHours", &[t.clone(), Value::from("-05:30")]), Value::Int(18));
    assert_eq!(ok("getHours", &[t.clone(), Value::from("UTC")]), Value::Int(23));
    assert!(matches!(
        err("getHours", &[t, Value::from("Mars/Olympus")]),
        ExecutionErrorKind::InvalidArgument { .. }
    ));
}

#[test]
fn test_duration_accessors() {
    let d = Value::Duration(Duration::new(5_430, 250_000_000).unwrap());
    assert_eq!(ok("getHours", &[d.clone()]), Value::Int(1));
    assert_eq!(ok("getMinutes", &[d.clone()]), Value::Int(90));
    assert_eq!(ok("getSeconds", &[d.clone()]), Value::Int(5_430));
    assert_eq!(ok("getMilliseconds", &[d.clone()]), Value::Int(250));
    assert!(matches!(
        err("getFullYear", &[d]),
        ExecutionErrorKind::TypeMismatch { .. }
    ));
}
