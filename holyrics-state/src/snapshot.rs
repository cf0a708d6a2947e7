//! The flat state snapshot published once per tick
//!
//! Every key is always present. Fields with no upstream data hold
//! [`FieldValue::Empty`], which renders as the empty string.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;

/// A single snapshot value as it arrived from the controller
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldValue {
    /// No data for this field on the last tick
    #[default]
    Empty,
    Text(String),
    Bool(bool),
    Number(i64),
}

impl FieldValue {
    /// Text value, or `Empty` for the empty string
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            FieldValue::Empty
        } else {
            FieldValue::Text(value)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Empty)
    }

    /// Loose truthiness used by feedback predicates
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Empty => false,
            FieldValue::Text(text) => !text.is_empty(),
            FieldValue::Bool(flag) => *flag,
            FieldValue::Number(n) => *n != 0,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&Value> for FieldValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Empty,
            Value::Bool(flag) => FieldValue::Bool(*flag),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Number(i),
                None => FieldValue::Text(n.to_string()),
            },
            Value::String(s) => FieldValue::text(s.as_str()),
            // Nested payloads are kept as compact JSON text
            other => FieldValue::Text(other.to_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Empty => Ok(()),
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Bool(flag) => write!(f, "{}", flag),
            FieldValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Empty => serializer.serialize_str(""),
            FieldValue::Text(text) => serializer.serialize_str(text),
            FieldValue::Bool(flag) => serializer.serialize_bool(*flag),
            FieldValue::Number(n) => serializer.serialize_i64(*n),
        }
    }
}

/// Snapshot keys in publication order
pub const FIELD_NAMES: [&str; 12] = [
    "show_alert",
    "slide_id",
    "slide_type",
    "slide_name",
    "song_id",
    "reference_id",
    "slide_number",
    "slide_count",
    "f8_active",
    "f9_active",
    "f10_active",
    "countdown",
];

/// Total mapping of the controller's observable state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StateSnapshot {
    pub show_alert: FieldValue,
    pub slide_id: FieldValue,
    pub slide_type: FieldValue,
    pub slide_name: FieldValue,
    pub song_id: FieldValue,
    pub reference_id: FieldValue,
    pub slide_number: FieldValue,
    pub slide_count: FieldValue,
    pub f8_active: FieldValue,
    pub f9_active: FieldValue,
    pub f10_active: FieldValue,
    pub countdown: FieldValue,
}

impl StateSnapshot {
    /// All twelve `(key, value)` pairs in [`FIELD_NAMES`] order
    pub fn entries(&self) -> [(&'static str, &FieldValue); 12] {
        [
            ("show_alert", &self.show_alert),
            ("slide_id", &self.slide_id),
            ("slide_type", &self.slide_type),
            ("slide_name", &self.slide_name),
            ("song_id", &self.song_id),
            ("reference_id", &self.reference_id),
            ("slide_number", &self.slide_number),
            ("slide_count", &self.slide_count),
            ("f8_active", &self.f8_active),
            ("f9_active", &self.f9_active),
            ("f10_active", &self.f10_active),
            ("countdown", &self.countdown),
        ]
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries()
            .into_iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value)
    }

    /// Values rendered for host variables
    pub fn to_variables(&self) -> Vec<(&'static str, String)> {
        self.entries()
            .into_iter()
            .map(|(name, value)| (name, value.to_string()))
            .collect()
    }

    /// Keys whose value differs between `self` and `next`
    pub fn changed_keys(&self, next: &StateSnapshot) -> Vec<&'static str> {
        self.entries()
            .into_iter()
            .zip(next.entries())
            .filter(|((_, old), (_, new))| old != new)
            .map(|((name, _), _)| name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_snapshot_is_total_and_empty() {
        let snapshot = StateSnapshot::default();
        let entries = snapshot.entries();

        assert_eq!(entries.len(), FIELD_NAMES.len());
        for ((name, value), expected) in entries.iter().zip(FIELD_NAMES) {
            assert_eq!(*name, expected);
            assert!(value.is_empty());
        }
    }

    #[test]
    fn test_field_value_from_json() {
        assert_eq!(FieldValue::from(&json!(null)), FieldValue::Empty);
        assert_eq!(FieldValue::from(&json!(true)), FieldValue::Bool(true));
        assert_eq!(FieldValue::from(&json!(3)), FieldValue::Number(3));
        assert_eq!(FieldValue::from(&json!("")), FieldValue::Empty);
        assert_eq!(FieldValue::from(&json!("abc")), FieldValue::Text("abc".to_string()));
        assert_eq!(FieldValue::from(&json!(1.5)), FieldValue::Text("1.5".to_string()));
        assert_eq!(FieldValue::from(&json!([1, 2])), FieldValue::Text("[1,2]".to_string()));
    }

    #[test]
    fn test_truthiness() {
        assert!(!FieldValue::Empty.is_truthy());
        assert!(!FieldValue::Bool(false).is_truthy());
        assert!(!FieldValue::Number(0).is_truthy());
        assert!(FieldValue::Bool(true).is_truthy());
        assert!(FieldValue::Text("x".to_string()).is_truthy());
    }

    #[test]
    fn test_variables_render_empty_as_blank() {
        let snapshot = StateSnapshot {
            slide_number: FieldValue::Number(2),
            f8_active: FieldValue::Bool(true),
            ..Default::default()
        };

        let variables = snapshot.to_variables();
        assert_eq!(variables.len(), 12);
        assert!(variables.contains(&("slide_number", "2".to_string())));
        assert!(variables.contains(&("f8_active", "true".to_string())));
        assert!(variables.contains(&("countdown", String::new())));
    }

    #[test]
    fn test_changed_keys() {
        let before = StateSnapshot::default();
        let after = StateSnapshot {
            countdown: FieldValue::text("04:59"),
            f10_active: FieldValue::Bool(false),
            ..Default::default()
        };

        assert_eq!(before.changed_keys(&after), vec!["f10_active", "countdown"]);
        assert!(after.changed_keys(&after.clone()).is_empty());
    }

    #[test]
    fn test_get_by_key() {
        let snapshot = StateSnapshot {
            slide_name: FieldValue::text("Amazing Grace"),
            ..Default::default()
        };
        assert_eq!(snapshot.get("slide_name").and_then(FieldValue::as_str), Some("Amazing Grace"));
        assert!(snapshot.get("missing").is_none());
    }

    #[test]
    fn test_serializes_as_flat_map() {
        let snapshot = StateSnapshot {
            show_alert: FieldValue::Bool(true),
            ..Default::default()
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["show_alert"], json!(true));
        assert_eq!(value["countdown"], json!(""));
        assert_eq!(value.as_object().unwrap().len(), 12);
    }
}
