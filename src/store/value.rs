use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;

pub type Fields = BTreeMap<String, FieldValue>;

/// A single value stored in a document field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Array(Vec<FieldValue>),
    Map(Fields),
}

impl FieldValue {
    /// Numeric view of the value; integers widen to f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Double(v) => Some(*v),
            FieldValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            FieldValue::Double(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Timestamps written by other clients sometimes arrive as RFC 3339 text.
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(ts) => Some(*ts),
            FieldValue::Text(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|ts| ts.with_timezone(&Utc)),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::Array(v) => Some(v),
            _ => None,
        }
    }

    /// Convert plain JSON (fixtures, seed files) into a field value.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => FieldValue::Double(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => FieldValue::Text(s.clone()),
            Value::Array(items) => FieldValue::Array(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => FieldValue::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Double(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(v: Vec<String>) -> Self {
        FieldValue::Array(v.into_iter().map(FieldValue::Text).collect())
    }
}

/// Build a `Fields` map from `key => value` pairs.
#[macro_export]
macro_rules! fields {
    () => { $crate::store::Fields::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::store::Fields::new();
        $( map.insert(($key).to_string(), $crate::store::FieldValue::from($value)); )+
        map
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_integer_widens_to_double() {
        assert_eq!(FieldValue::Integer(3).as_f64(), Some(3.0));
        assert_eq!(FieldValue::Text("3".into()).as_f64(), None);
    }

    #[test]
    fn test_whole_double_narrows_to_integer() {
        assert_eq!(FieldValue::Double(42.0).as_i64(), Some(42));
        assert_eq!(FieldValue::Double(42.5).as_i64(), None);
    }

    #[test]
    fn test_text_timestamp_is_parsed() {
        let value = FieldValue::Text("2025-03-03T10:15:00Z".into());
        assert_eq!(
            value.as_timestamp(),
            Some(Utc.with_ymd_and_hms(2025, 3, 3, 10, 15, 0).unwrap())
        );
    }

    #[test]
    fn test_from_json_nested() {
        let json = serde_json::json!({"name": "Fridge", "watts": 120, "tags": ["kitchen"]});
        let value = FieldValue::from_json(&json);

        let FieldValue::Map(map) = value else {
            panic!("expected map");
        };
        assert_eq!(map["name"], FieldValue::Text("Fridge".into()));
        assert_eq!(map["watts"], FieldValue::Integer(120));
        assert_eq!(
            map["tags"],
            FieldValue::Array(vec![FieldValue::Text("kitchen".into())])
        );
    }

    #[test]
    fn test_fields_macro() {
        let map = crate::fields! { "isOn" => true, "cost" => 1.5 };
        assert_eq!(map.get("isOn"), Some(&FieldValue::Bool(true)));
        assert_eq!(map.get("cost"), Some(&FieldValue::Double(1.5)));
    }
}
