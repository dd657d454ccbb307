//! Headless state of an inline-editable label, used for step names.

/// Shown when an edit is committed empty.
pub const FALLBACK_LABEL: &str = "Unnamed";

/// Keys the label reacts to while editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKey {
    Enter,
    Escape,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditableLabel {
    value: String,
    draft: String,
    editing: bool,
}

impl EditableLabel {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            draft: value.clone(),
            value,
            editing: false,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// Replace the bound value from outside. Resets the draft.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.draft = self.value.clone();
    }

    pub fn start_editing(&mut self) {
        self.editing = true;
    }

    pub fn input(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Commit the draft and return the committed value.
    pub fn finish_editing(&mut self) -> String {
        let committed = if self.draft.is_empty() {
            FALLBACK_LABEL.to_string()
        } else {
            self.draft.clone()
        };
        self.set_value(committed.clone());
        self.editing = false;
        committed
    }

    /// Discard the draft and leave edit mode.
    pub fn cancel_editing(&mut self) {
        self.draft = self.value.clone();
        self.editing = false;
    }

    /// Enter commits, Escape restores. Returns the committed value on Enter.
    pub fn handle_key(&mut self, key: LabelKey) -> Option<String> {
        if !self.editing {
            return None;
        }
        match key {
            LabelKey::Enter => Some(self.finish_editing()),
            LabelKey::Escape => {
                self.cancel_editing();
                None
            }
            LabelKey::Other => None,
        }
    }
}
