//! Cascading field state of one filter step.
//!
//! Choices depend on each other: event type -> property -> operator -> value
//! shape. Changing an upstream field resets everything downstream of it on
//! the same row; other rows are never touched. Derived data (option lists,
//! property types, completeness) is recomputed from the canonical value on
//! every call.

use std::collections::BTreeMap;

use funnel_core::{
    find_event_type, format_label, operators_for, AttributeId, EventType, PropertyType,
    SelectOption, ValueShape,
};
use serde::{Deserialize, Serialize};

use crate::attribute::{normalize_input, AttributeFilter};
use crate::ids::{IdAllocator, BASELINE_ID};

/// Name given to a step until the user or an event-type choice renames it.
pub const DEFAULT_STEP_NAME: &str = "Unnamed step";

/// Editable content of one filter step. Always holds at least one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterStepValue {
    pub name: String,
    pub event_type: Option<SelectOption>,
    pub attribute_filters: Vec<AttributeFilter>,
}

impl Default for FilterStepValue {
    fn default() -> Self {
        Self::blank()
    }
}

impl FilterStepValue {
    /// Canonical blank step: default name, no event type, one blank row.
    pub fn blank() -> Self {
        Self::named(DEFAULT_STEP_NAME)
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            event_type: None,
            attribute_filters: vec![AttributeFilter::blank(BASELINE_ID)],
        }
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn attribute(&self, id: AttributeId) -> Option<&AttributeFilter> {
        self.attribute_filters.iter().find(|f| f.id == id)
    }

    fn attribute_mut(&mut self, id: AttributeId) -> Option<&mut AttributeFilter> {
        self.attribute_filters.iter_mut().find(|f| f.id == id)
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    /// Choose (or clear) the event type.
    ///
    /// The row list is replaced by a single fresh blank row. A step still
    /// carrying the default name takes the event type's label.
    pub fn select_event_type(&mut self, event_type: Option<SelectOption>, ids: &mut IdAllocator) {
        if self.name == DEFAULT_STEP_NAME {
            if let Some(option) = &event_type {
                self.name = option.label.clone();
            }
        }
        self.event_type = event_type;
        self.attribute_filters = vec![AttributeFilter::blank(ids.allocate())];
    }

    /// Choose (or clear) a row's property. Clears operator and values.
    ///
    /// The property type comes from the catalog entry of the selected event
    /// type, then from the option itself, then defaults to string.
    /// Returns `false` when no row has `id`.
    pub fn select_property(
        &mut self,
        id: AttributeId,
        property: Option<SelectOption>,
        catalog: &[EventType],
    ) -> bool {
        let property_type = property
            .as_ref()
            .map(|option| self.resolve_property_type(option, catalog));
        let Some(row) = self.attribute_mut(id) else {
            return false;
        };
        row.property = property;
        row.property_type = property_type;
        row.operator = None;
        row.clear_values();
        true
    }

    /// Choose (or clear) a row's operator. Clears values, keeps the property.
    pub fn select_operator(&mut self, id: AttributeId, operator: Option<SelectOption>) -> bool {
        let Some(row) = self.attribute_mut(id) else {
            return false;
        };
        row.operator = operator;
        row.clear_values();
        true
    }

    pub fn set_value(&mut self, id: AttributeId, input: Option<&str>) -> bool {
        self.update_row(id, |row| row.value = normalize_input(input))
    }

    pub fn set_value_from(&mut self, id: AttributeId, input: Option<&str>) -> bool {
        self.update_row(id, |row| row.value_from = normalize_input(input))
    }

    pub fn set_value_to(&mut self, id: AttributeId, input: Option<&str>) -> bool {
        self.update_row(id, |row| row.value_to = normalize_input(input))
    }

    fn update_row(&mut self, id: AttributeId, update: impl FnOnce(&mut AttributeFilter)) -> bool {
        match self.attribute_mut(id) {
            Some(row) => {
                update(row);
                true
            }
            None => false,
        }
    }

    /// Append a blank row and return its id.
    pub fn add_attribute_filter(&mut self, ids: &mut IdAllocator) -> AttributeId {
        let id = ids.allocate();
        self.attribute_filters.push(AttributeFilter::blank(id));
        id
    }

    /// Remove a row by id.
    ///
    /// Removing the last row resets the step: event type cleared, name kept,
    /// one fresh blank row. Returns `false` when no row has `id`.
    pub fn remove_attribute_filter(&mut self, id: AttributeId, ids: &mut IdAllocator) -> bool {
        let before = self.attribute_filters.len();
        self.attribute_filters.retain(|f| f.id != id);
        if self.attribute_filters.len() == before {
            return false;
        }
        if self.attribute_filters.is_empty() {
            self.event_type = None;
            self.attribute_filters.push(AttributeFilter::blank(ids.allocate()));
        }
        true
    }

    // ------------------------------------------------------------------------
    // Derived state
    // ------------------------------------------------------------------------

    /// Event type selected and at least one complete row.
    pub fn is_complete(&self) -> bool {
        self.event_type.is_some() && self.attribute_filters.iter().any(AttributeFilter::is_complete)
    }

    pub fn complete_attribute_filters(&self) -> impl Iterator<Item = &AttributeFilter> {
        self.attribute_filters.iter().filter(|f| f.is_complete())
    }

    pub fn show_attribute_filters(&self) -> bool {
        self.event_type.is_some()
    }

    fn selected_event<'a>(&self, catalog: &'a [EventType]) -> Option<&'a EventType> {
        let selected = self.event_type.as_ref()?;
        find_event_type(catalog, &selected.value)
    }

    fn resolve_property_type(&self, option: &SelectOption, catalog: &[EventType]) -> PropertyType {
        self.selected_event(catalog)
            .and_then(|event| event.property(&option.value))
            .map(|p| p.property_type)
            .or(option.kind)
            .unwrap_or_default()
    }

    /// Properties of the selected event type, typed.
    pub fn property_options(&self, catalog: &[EventType]) -> Vec<SelectOption> {
        let Some(event) = self.selected_event(catalog) else {
            return Vec::new();
        };
        event
            .properties
            .iter()
            .map(|p| {
                SelectOption::new(format_label(&p.property), p.property.clone())
                    .with_kind(p.property_type)
            })
            .collect()
    }

    /// Property type of every row. Rows without a property, or whose property
    /// is not in the catalog, count as string.
    pub fn property_type_map(&self, catalog: &[EventType]) -> BTreeMap<AttributeId, PropertyType> {
        let Some(event) = self.selected_event(catalog) else {
            return BTreeMap::new();
        };
        self.attribute_filters
            .iter()
            .map(|row| {
                let property_type = row
                    .property
                    .as_ref()
                    .and_then(|p| event.property(&p.value))
                    .map(|p| p.property_type)
                    .unwrap_or_default();
                (row.id, property_type)
            })
            .collect()
    }

    /// Operators valid for a row's property type. Empty until a property is chosen.
    pub fn operator_options(&self, id: AttributeId) -> Vec<SelectOption> {
        match self.attribute(id) {
            Some(row) if row.property.is_some() => {
                operators_for(row.property_type.unwrap_or_default())
            }
            _ => Vec::new(),
        }
    }

    pub fn value_shape(&self, id: AttributeId) -> Option<ValueShape> {
        self.attribute(id).and_then(AttributeFilter::value_shape)
    }
}

/// Event types of the catalog as select options.
pub fn event_type_options(catalog: &[EventType]) -> Vec<SelectOption> {
    catalog
        .iter()
        .map(|e| SelectOption::new(format_label(&e.event_type), e.event_type.clone()))
        .collect()
}
