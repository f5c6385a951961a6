//! Request parameter set.
//!
//! # Design
//! Keys are unique and kept in a `BTreeMap`, so the encoded query string is
//! deterministic regardless of the order setters were called in. Values keep
//! their type until encoding time, where booleans become `yes`/`no` and
//! timestamps become the service's UTC `YYYY-MM-DDTHH:MM:SSZ` form.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use url::form_urlencoded;

/// Timestamp format the service expects in query parameters.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    Int(i64),
    /// Encoded as `yes` / `no`.
    Flag(bool),
    Time(DateTime<Utc>),
}

impl ParamValue {
    pub fn encode(&self) -> String {
        match self {
            ParamValue::Text(s) => s.clone(),
            ParamValue::Int(i) => i.to_string(),
            ParamValue::Flag(b) => yes_no(*b).to_string(),
            ParamValue::Time(t) => t.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Int(i)
    }
}

impl From<u32> for ParamValue {
    fn from(i: u32) -> Self {
        ParamValue::Int(i64::from(i))
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Flag(b)
    }
}

impl From<DateTime<Utc>> for ParamValue {
    fn from(t: DateTime<Utc>) -> Self {
        ParamValue::Time(t)
    }
}

pub fn yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: BTreeMap<String, ParamValue>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `key`.
    pub fn set(&mut self, key: &str, value: impl Into<ParamValue>) -> &mut Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    /// Insert `key` only when a value is present.
    pub fn set_opt<V: Into<ParamValue>>(&mut self, key: &str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.set(key, value);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Key/value pairs with every value in its wire form.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, String)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.encode()))
    }

    /// Percent-encoded query string, keys in lexicographic order.
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs())
            .finish()
    }
}
