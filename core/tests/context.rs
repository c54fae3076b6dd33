//! End-to-end tests through the public context API.

use celhost_core::api::{BindingSet, ErrorKind, EvalResult, ExecutionContext, FunctionError};
use celhost_core::host::HostValue;
use celhost_core::values::{Duration, Value};
use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn bindings(entries: &[(&str, HostValue)]) -> BindingSet {
    let mut bindings = BindingSet::new();
    for (name, value) in entries {
        bindings
            .bind_param(*name, value.clone())
            .unwrap_or_else(|e| panic!("binding {} failed: {}", name, e));
    }
    bindings
}

#[test]
fn simple_arithmetic() {
    let mut context = ExecutionContext::new();
    context.compile("p", "3+3").unwrap();
    assert_eq!(
        context.exec("p", BindingSet::new()),
        EvalResult::Success(Value::Int(6))
    );
}

#[test]
fn field_access_with_host_records() {
    let mut context = ExecutionContext::new();
    context.compile("p", "foo.bar").unwrap();

    let flat = bindings(&[("foo", HostValue::record([("bar", HostValue::Number(4.0))]))]);
    assert_eq!(context.exec("p", flat).unwrap_value(), Value::Int(4));

    let nested = bindings(&[(
        "foo",
        HostValue::record([("bar", HostValue::record([("baz", HostValue::Number(3.0))]))]),
    )]);
    assert_eq!(
        context.exec("p", nested).into_host().unwrap_value(),
        HostValue::record([("baz", HostValue::BigInt(3))])
    );
}

#[test]
fn type_puns_select_the_runtime_kind() {
    let context = ExecutionContext::new();
    let run = |value: HostValue| {
        context
            .eval("type(x)", bindings(&[("x", value)]))
            .unwrap_value()
    };
    assert_eq!(run(HostValue::Number(4.0)), Value::from("int"));
    assert_eq!(run(HostValue::Number(4.5)), Value::from("double"));
    assert_eq!(run(HostValue::cel_float(4.0)), Value::from("double"));
    assert_eq!(run(HostValue::cel_uint(4)), Value::from("uint"));
    assert_eq!(run(HostValue::cel_int(4)), Value::from("int"));
    assert_eq!(run(HostValue::duration(1, 0)), Value::from("duration"));
}

#[test]
fn uint_arithmetic_needs_uint_operands() {
    let context = ExecutionContext::new();
    let result = context.eval("x + 1u", bindings(&[("x", HostValue::cel_uint(41))]));
    assert_eq!(result.unwrap_value(), Value::Uint(42));

    let result = context.eval("x + 1u", bindings(&[("x", HostValue::Number(41.0))]));
    assert_eq!(result.unwrap_error().kind(), ErrorKind::TypeError);
}

#[test]
fn analyze_reports_params_without_bindings() {
    let context = ExecutionContext::new();
    assert_eq!(context.analyze("3 + foo").unwrap_details().params, ["foo"]);
    assert_eq!(
        context.analyze("3 +").unwrap_error().kind(),
        ErrorKind::SyntaxError
    );
}

#[test]
fn programs_do_not_interfere() {
    let mut context = ExecutionContext::new();
    context.compile("double", "x * 2").unwrap();
    context.compile("greet", "'hi ' + x").unwrap();

    assert_eq!(
        context
            .exec("double", bindings(&[("x", HostValue::Number(21.0))]))
            .unwrap_value(),
        Value::Int(42)
    );
    assert_eq!(
        context
            .exec("greet", bindings(&[("x", HostValue::from("bob"))]))
            .unwrap_value(),
        Value::from("hi bob")
    );
    // Bindings from one execution are not visible to the next.
    assert_eq!(
        context.exec("double", BindingSet::new()).unwrap_error().kind(),
        ErrorKind::UnknownIdentifier
    );
}

#[test]
fn bound_function_arity_mismatch() {
    let context = ExecutionContext::new();
    let mut set = BindingSet::new();
    set.bind_func("add", 2, |args| match (&args[0], &args[1]) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
        _ => Err(FunctionError::new("add takes two ints")),
    });
    let error = context.eval("add(1, 2, 3)", set).unwrap_error();
    assert_eq!(error.kind(), ErrorKind::ArityMismatch);
    assert!(error.message().contains("add"), "{}", error);
}

#[test]
fn host_functions_receive_host_values() {
    let context = ExecutionContext::new();
    let mut set = BindingSet::new();
    set.bind_host_func("shout", 1, |args| match &args[0] {
        HostValue::String(s) => Ok(HostValue::String(s.to_uppercase())),
        other => Err(FunctionError::new(format!(
            "expected a string, got {}",
            other.type_name()
        ))),
    });
    set.bind_param("name", HostValue::from("ada")).unwrap();

    assert_eq!(
        context.eval("name.shout()", set.clone()).unwrap_value(),
        Value::from("ADA")
    );
    let error = context.eval("shout(1)", set).unwrap_error();
    assert_eq!(error.kind(), ErrorKind::FunctionError);
    assert!(error.message().contains("got bigint"), "{}", error);
}

#[test]
fn dates_become_timestamps() {
    let context = ExecutionContext::new();
    let date = Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap();
    let result = context
        .eval("d + duration('24h')", bindings(&[("d", HostValue::Date(date))]))
        .into_host()
        .unwrap_value();
    assert_eq!(
        result,
        HostValue::Date(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
    );
}

#[test]
fn json_results() {
    let context = ExecutionContext::new();
    let mut set = BindingSet::new();
    set.bind_json("order", serde_json::json!({"items": [2, 3], "discount": 0.5}))
        .unwrap();
    let result = context
        .eval(
            "{'total': order.items.map(i, i * 10), 'cheap': order.discount > 0.25}",
            set,
        )
        .into_json()
        .unwrap_value();
    assert_eq!(
        result,
        serde_json::json!({"total": [20, 30], "cheap": true})
    );
}

fn timestamp_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    // Years 1970 to about 2100.
    (0i64..4_102_444_800, 0u32..1_000_000_000)
        .prop_map(|(secs, nanos)| DateTime::from_timestamp(secs, nanos).unwrap())
}

fn duration_strategy() -> impl Strategy<Value = Duration> {
    (-1_000_000_000i64..1_000_000_000, -999_999_999i64..1_000_000_000)
        .prop_map(|(secs, nanos)| Duration::new(secs, nanos).unwrap())
}

proptest! {
    #[test]
    fn adding_five_seconds(t in timestamp_strategy()) {
        let context = ExecutionContext::new();
        let mut set = BindingSet::new();
        set.bind_value("t", t);
        let result = context.eval("t + duration('5s')", set).unwrap_value();
        prop_assert_eq!(result, Value::Timestamp(t + chrono::Duration::seconds(5)));
    }

    #[test]
    fn duration_addition_is_associative(
        t in timestamp_strategy(),
        a in duration_strategy(),
        b in duration_strategy(),
    ) {
        let context = ExecutionContext::new();
        let mut set = BindingSet::new();
        set.bind_value("t", t).bind_value("a", a).bind_value("b", b);
        let result = context.eval("(t + a) + b == t + (a + b)", set).unwrap_value();
        prop_assert_eq!(result, Value::Bool(true));
    }
}
