//! Bound parameter values.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Parameter values after binding, keyed by symbol in template order.
///
/// Symbols without a binder keep their raw captured string. A value is
/// written once per dispatch, so repeated reads return the same value.
///
/// # Example
///
/// ```rust
/// use junction_core::BoundParams;
/// use serde_json::json;
///
/// let mut params = BoundParams::new();
/// params.insert("id", json!(42));
/// params.insert("slug", json!("hello"));
///
/// assert_eq!(params.get_as::<u32>("id"), Some(42));
/// assert_eq!(params.get_str("slug"), Some("hello"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundParams {
    values: IndexMap<String, Value>,
}

impl BoundParams {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the value for `name`, replacing any earlier value.
    ///
    /// This should only be called by the dispatcher while binding.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Returns the bound value for `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns the bound value for `name` if it is a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    /// Returns the bound value for `name` if it is an integer.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.values.get(name).and_then(Value::as_i64)
    }

    /// Deserializes the bound value for `name` into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.values
            .get(name)
            .and_then(|v| T::deserialize(v).ok())
    }

    /// Returns true if `name` has a value.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns the number of bound symbols.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over `(name, value)` pairs in template order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the values as a JSON object.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}
