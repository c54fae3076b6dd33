use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::api::FunctionError;

/// Signature of a callback that speaks host values.
pub type HostCallback = dyn Fn(&[HostValue]) -> Result<HostValue, FunctionError> + Send + Sync;

/// A loosely typed value as seen by the embedding application.
///
/// The shape follows a JavaScript-like host: a single floating point number
/// type, a separate arbitrary-width integer, plain records and arrays.
/// Converting to and from [`Value`](crate::values::Value) goes through
/// [`decode`](super::decode) and [`encode`](super::encode).
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Null,
    Bool(bool),
    Number(f64),
    BigInt(i128),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<HostValue>),
    Record(BTreeMap<String, HostValue>),
    Date(DateTime<Utc>),
    Function(HostFunction),
}

pub const CEL_INT: &str = "cel_int";
pub const CEL_UINT: &str = "cel_uint";
pub const CEL_FLOAT: &str = "cel_float";
pub const DURATION_SECONDS: &str = "sec";
pub const DURATION_NANOS: &str = "nsec";

impl HostValue {
    pub fn number(value: f64) -> Self {
        HostValue::Number(value)
    }

    pub fn bigint(value: impl Into<i128>) -> Self {
        HostValue::BigInt(value.into())
    }

    pub fn string(value: impl Into<String>) -> Self {
        HostValue::String(value.into())
    }

    pub fn array(items: impl IntoIterator<Item = HostValue>) -> Self {
        HostValue::Array(items.into_iter().collect())
    }

    pub fn record<K: Into<String>>(entries: impl IntoIterator<Item = (K, HostValue)>) -> Self {
        HostValue::Record(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }

    pub fn date(value: DateTime<Utc>) -> Self {
        HostValue::Date(value)
    }

    pub fn function<F>(arity: usize, callback: F) -> Self
    where
        F: Fn(&[HostValue]) -> Result<HostValue, FunctionError> + Send + Sync + 'static,
    {
        HostValue::Function(HostFunction::new(arity, callback))
    }

    /// `{cel_int: value}`: forces a signed integer on decode.
    pub fn cel_int(value: i64) -> Self {
        Self::record([(CEL_INT, HostValue::BigInt(value.into()))])
    }

    /// `{cel_uint: value}`: forces an unsigned integer on decode.
    pub fn cel_uint(value: u64) -> Self {
        Self::record([(CEL_UINT, HostValue::BigInt(value.into()))])
    }

    /// `{cel_float: value}`: forces a double on decode, even for `4`.
    pub fn cel_float(value: f64) -> Self {
        Self::record([(CEL_FLOAT, HostValue::Number(value))])
    }

    /// `{sec, nsec}`: decodes to a duration.
    pub fn duration(seconds: i64, nanos: i64) -> Self {
        Self::record([
            (DURATION_SECONDS, HostValue::BigInt(seconds.into())),
            (DURATION_NANOS, HostValue::BigInt(nanos.into())),
        ])
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::Null => "null",
            HostValue::Bool(_) => "boolean",
            HostValue::Number(_) => "number",
            HostValue::BigInt(_) => "bigint",
            HostValue::String(_) => "string",
            HostValue::Bytes(_) => "bytes",
            HostValue::Array(_) => "array",
            HostValue::Record(_) => "record",
            HostValue::Date(_) => "date",
            HostValue::Function(_) => "function",
        }
    }

    pub fn as_record(&self) -> Option<&BTreeMap<String, HostValue>> {
        match self {
            HostValue::Record(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[HostValue]> {
        match self {
            HostValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a record field.
    pub fn get(&self, key: &str) -> Option<&HostValue> {
        self.as_record().and_then(|fields| fields.get(key))
    }
}

impl From<bool> for HostValue {
    fn from(value: bool) -> Self {
        HostValue::Bool(value)
    }
}

impl From<f64> for HostValue {
    fn from(value: f64) -> Self {
        HostValue::Number(value)
    }
}

impl From<i64> for HostValue {
    fn from(value: i64) -> Self {
        HostValue::BigInt(value.into())
    }
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        HostValue::String(value.to_string())
    }
}

impl From<String> for HostValue {
    fn from(value: String) -> Self {
        HostValue::String(value)
    }
}

impl From<DateTime<Utc>> for HostValue {
    fn from(value: DateTime<Utc>) -> Self {
        HostValue::Date(value)
    }
}

impl From<Vec<HostValue>> for HostValue {
    fn from(value: Vec<HostValue>) -> Self {
        HostValue::Array(value)
    }
}

/// A host callable with a fixed arity.
///
/// Equality is identity: two `HostFunction`s are equal only when they share
/// the same callback.
#[derive(Clone)]
pub struct HostFunction {
    arity: usize,
    callback: Arc<HostCallback>,
}

impl HostFunction {
    pub fn new<F>(arity: usize, callback: F) -> Self
    where
        F: Fn(&[HostValue]) -> Result<HostValue, FunctionError> + Send + Sync + 'static,
    {
        Self {
            arity,
            callback: Arc::new(callback),
        }
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn call(&self, args: &[HostValue]) -> Result<HostValue, FunctionError> {
        (self.callback)(args)
    }
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFunction")
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

impl PartialEq for HostFunction {
    fn eq(&self, other: &Self) -> bool {
        self.arity == other.arity && Arc::ptr_eq(&self.callback, &other.callback)
    }
}
