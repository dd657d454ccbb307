//! Funnel Core - Catalog and Selection Types
//!
//! Pure data structures shared by the HTTP layer and the filter state
//! machine. This crate contains no I/O and no mutable state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod operator;

pub use operator::{
    number_operators, operator_tabs, operators_for, string_operators, value_shape_of,
    OperatorKind, ValueShape,
};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Identifier of a filter step, unique across an orchestrator's lifetime.
pub type StepId = u64;

/// Identifier of an attribute filter row, unique within its step.
pub type AttributeId = u64;

// ============================================================================
// EVENT CATALOG
// ============================================================================

/// Declared type of an event property. Drives which operators are offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    #[default]
    String,
    Number,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::String => "string",
            PropertyType::Number => "number",
        }
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed property carried by an event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventProperty {
    pub property: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
}

impl EventProperty {
    pub fn new(property: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            property: property.into(),
            property_type,
        }
    }
}

/// A named category of tracked user action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventType {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub properties: Vec<EventProperty>,
}

impl EventType {
    pub fn new(event_type: impl Into<String>, properties: Vec<EventProperty>) -> Self {
        Self {
            event_type: event_type.into(),
            properties,
        }
    }

    /// Look up a property by name.
    pub fn property(&self, name: &str) -> Option<&EventProperty> {
        self.properties.iter().find(|p| p.property == name)
    }
}

/// Wire shape of the catalog endpoint: `{ "events": [...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventsResponse {
    #[serde(default)]
    pub events: Vec<EventType>,
}

/// Find an event type by its id within a catalog.
pub fn find_event_type<'a>(catalog: &'a [EventType], event_type: &str) -> Option<&'a EventType> {
    catalog.iter().find(|e| e.event_type == event_type)
}

// ============================================================================
// SELECTION
// ============================================================================

/// A choice offered by a select widget.
///
/// `kind` is populated for property and operator options so a selection
/// carries the property type it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption<T = String> {
    pub label: String,
    pub value: T,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<PropertyType>,
}

impl<T> SelectOption<T> {
    pub fn new(label: impl Into<String>, value: T) -> Self {
        Self {
            label: label.into(),
            value,
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: PropertyType) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// A labelled group of options shown as one tab of a select widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectTab<T = String> {
    pub label: String,
    pub value: String,
    pub items: Vec<SelectOption<T>>,
}

impl<T> SelectTab<T> {
    pub fn new(
        label: impl Into<String>,
        value: impl Into<String>,
        items: Vec<SelectOption<T>>,
    ) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            items,
        }
    }
}

// ============================================================================
// LABELS
// ============================================================================

/// Turn a snake_case identifier into space separated Title Case words.
///
/// `page_visit` becomes `Page Visit`.
pub fn format_label(raw: &str) -> String {
    raw.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Errors raised while interpreting catalog or option data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Unknown property type: {0}")]
    UnknownPropertyType(String),
}

impl std::str::FromStr for PropertyType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(PropertyType::String),
            "number" => Ok(PropertyType::Number),
            other => Err(CoreError::UnknownPropertyType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_label_title_cases_words() {
        assert_eq!(format_label("page_visit"), "Page Visit");
        assert_eq!(format_label("session_start"), "Session Start");
        assert_eq!(format_label("url"), "Url");
        assert_eq!(format_label(""), "");
    }

    #[test]
    fn test_events_response_parses_catalog_shape() {
        let raw = r#"{
            "events": [
                { "type": "page_visit", "properties": [
                    { "property": "url", "type": "string" },
                    { "property": "duration", "type": "number" }
                ] }
            ]
        }"#;
        let parsed: EventsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.events.len(), 1);
        let page_visit = &parsed.events[0];
        assert_eq!(page_visit.event_type, "page_visit");
        assert_eq!(
            page_visit.property("duration").map(|p| p.property_type),
            Some(PropertyType::Number)
        );
        assert!(page_visit.property("missing").is_none());
    }

    #[test]
    fn test_events_response_tolerates_missing_fields() {
        let parsed: EventsResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.events.is_empty());

        let parsed: EventsResponse =
            serde_json::from_str(r#"{ "events": [ { "type": "purchase" } ] }"#).unwrap();
        assert!(parsed.events[0].properties.is_empty());
    }

    #[test]
    fn test_select_option_serializes_kind_as_type() {
        let option = SelectOption::new("Duration", "duration".to_string())
            .with_kind(PropertyType::Number);
        let json = serde_json::to_value(&option).unwrap();
        assert_eq!(json["type"], "number");
        assert_eq!(json["value"], "duration");

        let plain = SelectOption::new("Page Visit", "page_visit".to_string());
        let json = serde_json::to_value(&plain).unwrap();
        assert!(json.get("type").is_none());
    }

    #[test]
    fn test_property_type_from_str() {
        assert_eq!("number".parse::<PropertyType>(), Ok(PropertyType::Number));
        assert!("boolean".parse::<PropertyType>().is_err());
    }
}
