//! Result envelopes returned by [`ExecutionContext`](crate::api::ExecutionContext).

use serde::Serialize;

use crate::api::{EvalError, ProgramDetails};
use crate::host::{HostValue, encode};
use crate::values::Value;

/// Outcome of executing a program.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalResult<T = Value> {
    Success(T),
    Failure(EvalError),
}

impl<T> EvalResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, EvalResult::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            EvalResult::Success(value) => Some(value),
            EvalResult::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&EvalError> {
        match self {
            EvalResult::Success(_) => None,
            EvalResult::Failure(error) => Some(error),
        }
    }

    pub fn into_result(self) -> Result<T, EvalError> {
        self.into()
    }

    /// The success value.
    ///
    /// # Panics
    ///
    /// Panics with the error message if this is a failure.
    pub fn unwrap_value(self) -> T {
        match self {
            EvalResult::Success(value) => value,
            EvalResult::Failure(error) => panic!("called `unwrap_value` on a failure: {}", error),
        }
    }

    /// The error.
    ///
    /// # Panics
    ///
    /// Panics if this is a success.
    pub fn unwrap_error(self) -> EvalError {
        match self {
            EvalResult::Success(_) => panic!("called `unwrap_error` on a success"),
            EvalResult::Failure(error) => error,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> EvalResult<U> {
        match self {
            EvalResult::Success(value) => EvalResult::Success(f(value)),
            EvalResult::Failure(error) => EvalResult::Failure(error),
        }
    }
}

impl EvalResult<Value> {
    /// Convert the success value to a host value.
    pub fn into_host(self) -> EvalResult<HostValue> {
        self.map(|value| encode(&value))
    }

    /// Convert the success value to JSON.
    pub fn into_json(self) -> EvalResult<serde_json::Value> {
        self.map(|value| serde_json::Value::from(encode(&value)))
    }
}

impl<T> From<Result<T, EvalError>> for EvalResult<T> {
    fn from(result: Result<T, EvalError>) -> Self {
        match result {
            Ok(value) => EvalResult::Success(value),
            Err(error) => EvalResult::Failure(error),
        }
    }
}

impl<T> From<EvalResult<T>> for Result<T, EvalError> {
    fn from(result: EvalResult<T>) -> Self {
        match result {
            EvalResult::Success(value) => Ok(value),
            EvalResult::Failure(error) => Err(error),
        }
    }
}

/// Outcome of analyzing a program.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DetailResult {
    Success(ProgramDetails),
    Failure(EvalError),
}

impl DetailResult {
    pub fn is_success(&self) -> bool {
        matches!(self, DetailResult::Success(_))
    }

    pub fn details(&self) -> Option<&ProgramDetails> {
        match self {
            DetailResult::Success(details) => Some(details),
            DetailResult::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&EvalError> {
        match self {
            DetailResult::Success(_) => None,
            DetailResult::Failure(error) => Some(error),
        }
    }

    pub fn into_result(self) -> Result<ProgramDetails, EvalError> {
        match self {
            DetailResult::Success(details) => Ok(details),
            DetailResult::Failure(error) => Err(error),
        }
    }

    /// # Panics
    ///
    /// Panics with the error message if this is a failure.
    pub fn unwrap_details(self) -> ProgramDetails {
        match self {
            DetailResult::Success(details) => details,
            DetailResult::Failure(error) => {
                panic!("called `unwrap_details` on a failure: {}", error)
            }
        }
    }

    /// # Panics
    ///
    /// Panics if this is a success.
    pub fn unwrap_error(self) -> EvalError {
        match self {
            DetailResult::Success(_) => panic!("called `unwrap_error` on a success"),
            DetailResult::Failure(error) => error,
        }
    }
}

impl From<Result<ProgramDetails, EvalError>> for DetailResult {
    fn from(result: Result<ProgramDetails, EvalError>) -> Self {
        match result {
            Ok(details) => DetailResult::Success(details),
            Err(error) => DetailResult::Failure(error),
        }
    }
}
