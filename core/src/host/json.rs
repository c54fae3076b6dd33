//! Bridge between [`HostValue`] and `serde_json::Value`.

use chrono::SecondsFormat;
use serde_json::{Map, Number, Value as Json};

use super::HostValue;

impl From<Json> for HostValue {
    fn from(json: Json) -> Self {
        match json {
            Json::Null => HostValue::Null,
            Json::Bool(b) => HostValue::Bool(b),
            Json::Number(n) => number_from_json(&n),
            Json::String(s) => HostValue::String(s),
            Json::Array(items) => HostValue::Array(items.into_iter().map(HostValue::from).collect()),
            Json::Object(fields) => HostValue::Record(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, HostValue::from(value)))
                    .collect(),
            ),
        }
    }
}

fn number_from_json(n: &Number) -> HostValue {
    if let Some(i) = n.as_i64() {
        HostValue::BigInt(i.into())
    } else if let Some(u) = n.as_u64() {
        HostValue::BigInt(u.into())
    } else {
        HostValue::Number(n.as_f64().unwrap_or(f64::NAN))
    }
}

impl From<&HostValue> for Json {
    fn from(value: &HostValue) -> Self {
        match value {
            HostValue::Null | HostValue::Function(_) => Json::Null,
            HostValue::Bool(b) => Json::Bool(*b),
            HostValue::Number(n) => Number::from_f64(*n).map_or(Json::Null, Json::Number),
            HostValue::BigInt(i) => {
                if let Ok(i) = i64::try_from(*i) {
                    Json::Number(i.into())
                } else if let Ok(u) = u64::try_from(*i) {
                    Json::Number(u.into())
                } else {
                    Json::String(i.to_string())
                }
            }
            HostValue::String(s) => Json::String(s.clone()),
            HostValue::Bytes(bytes) => Json::Array(bytes.iter().map(|b| Json::from(*b)).collect()),
            HostValue::Array(items) => Json::Array(items.iter().map(Json::from).collect()),
            HostValue::Record(fields) => Json::Object(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), Json::from(value)))
                    .collect::<Map<_, _>>(),
            ),
            HostValue::Date(ts) => Json::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

impl From<HostValue> for Json {
    fn from(value: HostValue) -> Self {
        Json::from(&value)
    }
}
