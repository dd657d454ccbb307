//! Headless widget state.

pub mod editable_label;
pub mod select;

pub use editable_label::{EditableLabel, LabelKey, FALLBACK_LABEL};
pub use select::SelectState;
