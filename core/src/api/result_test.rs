use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;
use crate::host::HostValue;
use crate::values::{Duration, Value};

fn failure() -> EvalError {
    EvalError::new(ErrorKind::RuntimeError, "division by zero")
}

#[test]
fn test_eval_result_accessors() {
    let success: EvalResult = EvalResult::Success(Value::Int(1));
    assert!(success.is_success());
    assert!(!success.is_failure());
    assert_eq!(success.value(), Some(&Value::Int(1)));
    assert_eq!(success.error(), None);
    assert_eq!(success.into_result(), Ok(Value::Int(1)));

    let failed: EvalResult = EvalResult::Failure(failure());
    assert!(failed.is_failure());
    assert_eq!(failed.value(), None);
    assert_eq!(failed.error(), Some(&failure()));
    assert_eq!(failed.into_result(), Err(failure()));
}

#[test]
#[should_panic(expected = "RuntimeError: division by zero")]
fn test_unwrap_value_on_failure_panics() {
    EvalResult::<Value>::Failure(failure()).unwrap_value();
}

#[test]
#[should_panic(expected = "called `unwrap_error` on a success")]
fn test_unwrap_error_on_success_panics() {
    EvalResult::Success(Value::Null).unwrap_error();
}

#[test]
fn test_into_host() {
    let result = EvalResult::Success(Value::Duration(Duration::new(5, 10).unwrap()));
    assert_eq!(
        result.into_host().unwrap_value(),
        HostValue::record([
            ("nsec", HostValue::BigInt(10)),
            ("sec", HostValue::BigInt(5)),
        ])
    );

    let failed = EvalResult::<Value>::Failure(failure()).into_host();
    assert_eq!(failed.unwrap_error(), failure());
}

#[test]
fn test_into_json() {
    let value = Value::record([("n", Value::Int(3)), ("s", Value::from("x"))]);
    assert_eq!(
        EvalResult::Success(value).into_json().unwrap_value(),
        json!({"n": 3, "s": "x"})
    );
}

#[test]
fn test_detail_result() {
    let details = ProgramDetails {
        source: "x".to_string(),
        params: vec!["x".to_string()],
    };
    let success = DetailResult::Success(details.clone());
    assert!(success.is_success());
    assert_eq!(success.details(), Some(&details));
    assert_eq!(success.error(), None);
    assert_eq!(
        serde_json::to_value(&success).unwrap(),
        json!({"status": "success", "source": "x", "params": ["x"]})
    );
    assert_eq!(success.unwrap_details(), details);

    let failed = DetailResult::Failure(failure());
    assert_eq!(failed.details(), None);
    assert_eq!(
        serde_json::to_value(&failed).unwrap(),
        json!({"status": "failure", "kind": "RuntimeError", "message": "division by zero"})
    );
    assert_eq!(failed.into_result(), Err(failure()));
}

#[test]
#[should_panic(expected = "called `unwrap_details` on a failure")]
fn test_unwrap_details_on_failure_panics() {
    DetailResult::Failure(failure()).unwrap_details();
}
