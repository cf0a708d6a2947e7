//! Declarations the host plugin renders: config fields, variables, feedbacks

use holyrics_client::DEFAULT_PORT;
use serde::Serialize;

use crate::snapshot::{StateSnapshot, FIELD_NAMES};

/// Input widget for one connection setting
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConfigFieldKind {
    TextInput {
        default: Option<&'static str>,
        /// Name of the host's built-in validation pattern
        regex: Option<&'static str>,
    },
    Number {
        min: u32,
        max: u32,
        default: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigField {
    pub id: &'static str,
    pub label: &'static str,
    pub width: u8,
    #[serde(flatten)]
    pub kind: ConfigFieldKind,
}

/// Form fields backing [`ConnectionConfig`](holyrics_client::ConnectionConfig)
pub fn config_fields() -> Vec<ConfigField> {
    vec![
        ConfigField {
            id: "host",
            label: "IP Address",
            width: 6,
            kind: ConfigFieldKind::TextInput {
                default: Some("127.0.0.1"),
                regex: Some("IP"),
            },
        },
        ConfigField {
            id: "port",
            label: "IP Port",
            width: 6,
            kind: ConfigFieldKind::Number {
                min: 1,
                max: 65535,
                default: u32::from(DEFAULT_PORT),
            },
        },
        ConfigField {
            id: "token",
            label: "Access Token",
            width: 4,
            kind: ConfigFieldKind::TextInput {
                default: None,
                regex: None,
            },
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableDefinition {
    pub variable_id: &'static str,
    pub name: &'static str,
}

fn variable_label(key: &str) -> &'static str {
    match key {
        "show_alert" => "Alert is shown",
        "slide_id" => "Current slide ID",
        "slide_type" => "Current presentation type",
        "slide_name" => "Current presentation name",
        "song_id" => "Current song ID",
        "reference_id" => "Current Bible reference ID",
        "slide_number" => "Current slide number",
        "slide_count" => "Total slides",
        "f8_active" => "F8 (wallpaper) active",
        "f9_active" => "F9 (blank screen) active",
        "f10_active" => "F10 (black screen) active",
        "countdown" => "Countdown time",
        _ => "",
    }
}

/// One variable per snapshot key, in snapshot order
pub fn variable_definitions() -> Vec<VariableDefinition> {
    FIELD_NAMES
        .iter()
        .map(|&key| VariableDefinition {
            variable_id: key,
            name: variable_label(key),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FunctionKey {
    F8,
    F9,
    F10,
}

/// Boolean predicates over the snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Feedback {
    AlertShown,
    FunctionKeyActive(FunctionKey),
    CountdownRunning,
    SlideTypeIs(String),
}

impl Feedback {
    pub fn evaluate(&self, snapshot: &StateSnapshot) -> bool {
        match self {
            Feedback::AlertShown => snapshot.show_alert.is_truthy(),
            Feedback::FunctionKeyActive(FunctionKey::F8) => snapshot.f8_active.is_truthy(),
            Feedback::FunctionKeyActive(FunctionKey::F9) => snapshot.f9_active.is_truthy(),
            Feedback::FunctionKeyActive(FunctionKey::F10) => snapshot.f10_active.is_truthy(),
            Feedback::CountdownRunning => !snapshot.countdown.is_empty(),
            Feedback::SlideTypeIs(kind) => snapshot.slide_type.as_str() == Some(kind.as_str()),
        }
    }

    /// The snapshot key this predicate reads
    pub fn source_key(&self) -> &'static str {
        match self {
            Feedback::AlertShown => "show_alert",
            Feedback::FunctionKeyActive(FunctionKey::F8) => "f8_active",
            Feedback::FunctionKeyActive(FunctionKey::F9) => "f9_active",
            Feedback::FunctionKeyActive(FunctionKey::F10) => "f10_active",
            Feedback::CountdownRunning => "countdown",
            Feedback::SlideTypeIs(_) => "slide_type",
        }
    }

    /// Whether a tick that changed `changed` can flip this predicate
    pub fn affected_by(&self, changed: &[&str]) -> bool {
        changed.contains(&self.source_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::FieldValue;

    #[test]
    fn test_variables_mirror_snapshot_keys() {
        let definitions = variable_definitions();
        let ids: Vec<&str> = definitions.iter().map(|d| d.variable_id).collect();

        assert_eq!(ids, FIELD_NAMES.to_vec());
        assert!(definitions.iter().all(|d| !d.name.is_empty()));
    }

    #[test]
    fn test_config_fields_match_connection_defaults() {
        let fields = config_fields();
        assert_eq!(fields.len(), 3);
        assert_eq!(
            fields[1].kind,
            ConfigFieldKind::Number {
                min: 1,
                max: 65535,
                default: 8091
            }
        );

        let rendered = serde_json::to_value(&fields[0]).unwrap();
        assert_eq!(rendered["type"], "textinput");
        assert_eq!(rendered["regex"], "IP");
    }

    #[test]
    fn test_feedbacks_read_snapshot() {
        let snapshot = StateSnapshot {
            show_alert: FieldValue::Bool(true),
            f9_active: FieldValue::Bool(true),
            slide_type: FieldValue::text("song"),
            ..Default::default()
        };

        assert!(Feedback::AlertShown.evaluate(&snapshot));
        assert!(Feedback::FunctionKeyActive(FunctionKey::F9).evaluate(&snapshot));
        assert!(!Feedback::FunctionKeyActive(FunctionKey::F8).evaluate(&snapshot));
        assert!(!Feedback::CountdownRunning.evaluate(&snapshot));
        assert!(Feedback::SlideTypeIs("song".to_string()).evaluate(&snapshot));
        assert!(!Feedback::SlideTypeIs("verse".to_string()).evaluate(&snapshot));
    }

    #[test]
    fn test_feedbacks_on_empty_snapshot_are_false() {
        let snapshot = StateSnapshot::default();
        assert!(!Feedback::AlertShown.evaluate(&snapshot));
        assert!(!Feedback::FunctionKeyActive(FunctionKey::F10).evaluate(&snapshot));
    }

    #[test]
    fn test_affected_by() {
        assert!(Feedback::CountdownRunning.affected_by(&["slide_id", "countdown"]));
        assert!(!Feedback::AlertShown.affected_by(&["countdown"]));
    }
}
