//! A single attribute condition within a filter step.

use funnel_core::{value_shape_of, AttributeId, PropertyType, SelectOption, ValueShape};
use serde::{Deserialize, Serialize};

/// One condition: property, operator and a value or value range.
///
/// `value` and the `value_from`/`value_to` pair may both hold data, but only
/// the one dictated by the operator's [`ValueShape`] is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeFilter {
    pub id: AttributeId,
    pub property: Option<SelectOption>,
    pub operator: Option<SelectOption>,
    #[serde(rename = "type")]
    pub property_type: Option<PropertyType>,
    pub value: Option<String>,
    pub value_from: Option<String>,
    pub value_to: Option<String>,
}

impl AttributeFilter {
    pub fn blank(id: AttributeId) -> Self {
        Self {
            id,
            property: None,
            operator: None,
            property_type: None,
            value: None,
            value_from: None,
            value_to: None,
        }
    }

    /// Inputs the selected operator needs, if one is selected.
    pub fn value_shape(&self) -> Option<ValueShape> {
        self.operator.as_ref().map(|op| value_shape_of(&op.value))
    }

    /// Property and operator set, plus the value(s) the operator needs.
    pub fn is_complete(&self) -> bool {
        if self.property.is_none() {
            return false;
        }
        match self.value_shape() {
            None => false,
            Some(ValueShape::Range) => has_text(&self.value_from) && has_text(&self.value_to),
            Some(ValueShape::Single) => has_text(&self.value),
        }
    }

    pub(crate) fn clear_values(&mut self) {
        self.value = None;
        self.value_from = None;
        self.value_to = None;
    }
}

/// Empty input means "no value".
pub fn normalize_input(input: Option<&str>) -> Option<String> {
    input.filter(|s| !s.is_empty()).map(str::to_string)
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}
