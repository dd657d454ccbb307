//! Comparison operators offered for attribute filters.
//!
//! Operators are partitioned by property type. The operator value is what
//! travels inside a [`SelectOption`]; [`OperatorKind`] is the typed view of it.

use serde::{Deserialize, Serialize};

use crate::{CoreError, PropertyType, SelectOption, SelectTab};

/// Known operator values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorKind {
    Equals,
    DoesNotEqual,
    Contains,
    DoesNotContain,
    Between,
    LessThan,
    GreaterThan,
}

/// How many inputs an operator needs before a condition is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// A single `value`.
    Single,
    /// Both `value_from` and `value_to`.
    Range,
}

impl OperatorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperatorKind::Equals => "equals",
            OperatorKind::DoesNotEqual => "does_not_equal",
            OperatorKind::Contains => "contains",
            OperatorKind::DoesNotContain => "does_not_contain",
            OperatorKind::Between => "between",
            OperatorKind::LessThan => "less_than",
            OperatorKind::GreaterThan => "greater_than",
        }
    }

    pub fn value_shape(&self) -> ValueShape {
        match self {
            OperatorKind::Between => ValueShape::Range,
            _ => ValueShape::Single,
        }
    }
}

impl std::str::FromStr for OperatorKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equals" => Ok(OperatorKind::Equals),
            "does_not_equal" => Ok(OperatorKind::DoesNotEqual),
            "contains" => Ok(OperatorKind::Contains),
            "does_not_contain" => Ok(OperatorKind::DoesNotContain),
            "between" => Ok(OperatorKind::Between),
            "less_than" => Ok(OperatorKind::LessThan),
            "greater_than" => Ok(OperatorKind::GreaterThan),
            other => Err(CoreError::UnknownOperator(other.to_string())),
        }
    }
}

impl std::fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value shape for a raw operator value. Unknown operators need a single value.
pub fn value_shape_of(operator_value: &str) -> ValueShape {
    operator_value
        .parse::<OperatorKind>()
        .map(|kind| kind.value_shape())
        .unwrap_or(ValueShape::Single)
}

fn option(label: &str, kind: OperatorKind, property_type: PropertyType) -> SelectOption {
    SelectOption::new(label, kind.as_str().to_string()).with_kind(property_type)
}

pub fn string_operators() -> Vec<SelectOption> {
    vec![
        option("Equals", OperatorKind::Equals, PropertyType::String),
        option("Does not equal", OperatorKind::DoesNotEqual, PropertyType::String),
        option("Contains", OperatorKind::Contains, PropertyType::String),
        option("Does not contain", OperatorKind::DoesNotContain, PropertyType::String),
    ]
}

pub fn number_operators() -> Vec<SelectOption> {
    vec![
        option("Equals to", OperatorKind::Equals, PropertyType::Number),
        option("In between", OperatorKind::Between, PropertyType::Number),
        option("Less than", OperatorKind::LessThan, PropertyType::Number),
        option("Greater than", OperatorKind::GreaterThan, PropertyType::Number),
    ]
}

pub fn operators_for(property_type: PropertyType) -> Vec<SelectOption> {
    match property_type {
        PropertyType::String => string_operators(),
        PropertyType::Number => number_operators(),
    }
}

/// Operator choices grouped into a "String" and a "Number" tab.
pub fn operator_tabs() -> Vec<SelectTab> {
    vec![
        SelectTab::new("String", PropertyType::String.as_str(), string_operators()),
        SelectTab::new("Number", PropertyType::Number.as_str(), number_operators()),
    ]
}
