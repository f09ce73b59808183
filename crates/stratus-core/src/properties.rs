//! Open configuration records attached to each component.
//!
//! A record maps camelCase field names to [`PropertyValue`]s. The shape
//! differs per component type; the catalog seeds it and the validator reads
//! it, but neither requires a field to be present.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// One configuration value.
///
/// Integers are kept apart from floats so that ports and sizes serialize the
/// way they were entered. JSON `null` has no value of its own: null fields
/// and list items read as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(#[serde(deserialize_with = "without_null_items")] Vec<PropertyValue>),
    Object(#[serde(deserialize_with = "without_null_fields")] BTreeMap<String, PropertyValue>),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Integer(n) => Some(*n as f64),
            PropertyValue::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PropertyValue]> {
        match self {
            PropertyValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, PropertyValue>> {
        match self {
            PropertyValue::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Empty text is what an untouched form field holds.
    pub fn is_blank(&self) -> bool {
        matches!(self, PropertyValue::Text(s) if s.is_empty())
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        PropertyValue::Integer(value.into())
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<u32> for PropertyValue {
    fn from(value: u32) -> Self {
        PropertyValue::Integer(value.into())
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(items: Vec<T>) -> Self {
        PropertyValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, PropertyValue>> for PropertyValue {
    fn from(map: BTreeMap<String, PropertyValue>) -> Self {
        PropertyValue::Object(map)
    }
}

impl From<Properties> for PropertyValue {
    fn from(record: Properties) -> Self {
        PropertyValue::Object(record.0)
    }
}

/// A component's configuration record.
///
/// A `null` record reads as empty, which loaders then backfill.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Properties(BTreeMap<String, PropertyValue>);

impl<'de> Deserialize<'de> for Properties {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = Option::<BTreeMap<String, Option<PropertyValue>>>::deserialize(deserializer)?;
        Ok(fields.map(present_fields).unwrap_or_default())
    }
}

fn present_fields(fields: BTreeMap<String, Option<PropertyValue>>) -> Properties {
    Properties(
        fields
            .into_iter()
            .filter_map(|(key, value)| Some((key, value?)))
            .collect(),
    )
}

fn without_null_fields<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, PropertyValue>, D::Error> {
    let fields = BTreeMap::<String, Option<PropertyValue>>::deserialize(deserializer)?;
    Ok(present_fields(fields).0)
}

fn without_null_items<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<PropertyValue>, D::Error> {
    let items = Vec::<Option<PropertyValue>>::deserialize(deserializer)?;
    Ok(items.into_iter().flatten().collect())
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// A record holding only the `name` field.
    pub fn named(name: &str) -> Self {
        Self::new().with("name", name)
    }

    pub fn with(mut self, key: &str, value: impl Into<PropertyValue>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Option<PropertyValue> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn name(&self) -> Option<&str> {
        self.get("name").and_then(PropertyValue::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, PropertyValue)> for Properties {
    fn from_iter<I: IntoIterator<Item = (String, PropertyValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
