//! Pure extraction of snapshot fields from controller responses
//!
//! Nothing here performs I/O. Missing or malformed upstream data never
//! fails; it degrades to empty fields for the tick in question.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, StateError};
use crate::snapshot::{FieldValue, StateSnapshot};

/// Every controller response wraps its payload in `data`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Envelope {
    /// `null` and a missing key both mean "no data"
    #[serde(default)]
    pub data: Option<Value>,
}

/// Parse a raw response body
pub fn parse_envelope(body: &str) -> Result<Envelope> {
    serde_json::from_str(body).map_err(|e| StateError::Parse(e.to_string()))
}

/// One slide of the current presentation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Slide {
    pub text: String,
}

/// Presentation metadata used to derive the countdown
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresentationDescriptor {
    pub kind: Option<String>,
    pub slide_number: Option<i64>,
    pub total_slides: Option<i64>,
    pub slides: Option<Vec<Slide>>,
}

impl PresentationDescriptor {
    /// Read a descriptor out of a `GetCurrentPresentation` data object
    ///
    /// Returns `None` when `data` is not an object. Individual fields that
    /// are missing or of the wrong shape stay `None`.
    pub fn from_data(data: &Value) -> Option<Self> {
        let object = data.as_object()?;

        let slides = object.get("slides").and_then(Value::as_array).map(|slides| {
            slides
                .iter()
                .map(|slide| Slide {
                    text: slide
                        .get("text")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                })
                .collect()
        });

        Some(Self {
            kind: object.get("type").and_then(Value::as_str).map(str::to_string),
            slide_number: object.get("slide_number").and_then(loose_int),
            total_slides: object.get("total_slides").and_then(loose_int),
            slides,
        })
    }
}

/// Integers may arrive as numbers or numeric strings
fn loose_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn is_clock_like(candidate: &str) -> bool {
    candidate
        .chars()
        .all(|c| c.is_ascii_digit() || c == ':' || c == '.')
}

/// Detect a countdown clock shown on a single-slide presentation
///
/// Only `unknown`/`countdown` presentations sitting on slide 1 of 1 qualify.
/// The first slide's text must have two lines (clock on line 0) or three
/// lines (clock on line 1), and the clock line may contain only digits,
/// `:` and `.`. Anything else yields the empty string.
pub fn derive_countdown(descriptor: Option<&PresentationDescriptor>) -> String {
    let Some(presentation) = descriptor else {
        return String::new();
    };

    if !matches!(presentation.kind.as_deref(), Some("unknown" | "countdown")) {
        return String::new();
    }

    if presentation.slide_number != Some(1) || presentation.total_slides != Some(1) {
        return String::new();
    }

    let Some(first) = presentation.slides.as_ref().and_then(|slides| slides.first()) else {
        return String::new();
    };

    let rows: Vec<&str> = first.text.split('\n').collect();
    let candidate = match rows.as_slice() {
        [clock, _] => *clock,
        [_, clock, _] => *clock,
        _ => return String::new(),
    };

    if is_clock_like(candidate) {
        candidate.to_string()
    } else {
        String::new()
    }
}

/// The `data` payloads fetched during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickResponses {
    pub presentation: Option<Value>,
    pub alert: Option<Value>,
    pub f8: Option<Value>,
    pub f9: Option<Value>,
    pub f10: Option<Value>,
}

/// Result of merging a tick into the previous snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct MergedTick {
    pub snapshot: StateSnapshot,
    /// Keys whose value differs from the previous snapshot
    pub changed: Vec<&'static str>,
}

fn member(data: Option<&Value>, key: &str) -> FieldValue {
    data.and_then(|object| object.get(key))
        .map(FieldValue::from)
        .unwrap_or_default()
}

fn whole(data: Option<&Value>) -> FieldValue {
    data.map(FieldValue::from).unwrap_or_default()
}

/// Build the next snapshot from one tick's responses
///
/// Every field is recomputed; nothing carries over from `previous` except
/// for change detection.
pub fn merge_tick(previous: &StateSnapshot, responses: &TickResponses) -> MergedTick {
    let presentation = responses.presentation.as_ref();
    let descriptor = presentation.and_then(PresentationDescriptor::from_data);

    let snapshot = StateSnapshot {
        show_alert: member(responses.alert.as_ref(), "show"),
        slide_id: member(presentation, "id"),
        slide_type: member(presentation, "type"),
        slide_name: member(presentation, "name"),
        song_id: member(presentation, "song_id"),
        reference_id: member(presentation, "reference_id"),
        slide_number: member(presentation, "slide_number"),
        slide_count: member(presentation, "total_slides"),
        f8_active: whole(responses.f8.as_ref()),
        f9_active: whole(responses.f9.as_ref()),
        f10_active: whole(responses.f10.as_ref()),
        countdown: FieldValue::text(derive_countdown(descriptor.as_ref())),
    };

    let changed = previous.changed_keys(&snapshot);
    MergedTick { snapshot, changed }
}
