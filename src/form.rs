//! Checkbox form model for ACL editing
//!
//! One checkbox per (candidate, permission) pair, keyed
//! `"<candidate>_<PERMISSION>"`. Disabled fields show structurally
//! inherited grants; they are informational only and submissions cannot
//! flip them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One checkbox in an ACL form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckboxField {
    pub name: String,
    pub checked: bool,
    pub disabled: bool,
}

/// A built ACL form: ordered map of field name to checkbox
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclForm {
    fields: BTreeMap<String, CheckboxField>,
}

impl AclForm {
    pub fn new() -> Self {
        AclForm::default()
    }

    pub fn add(&mut self, field: CheckboxField) {
        self.fields.insert(field.name.clone(), field);
    }

    pub fn get(&self, name: &str) -> Option<&CheckboxField> {
        self.fields.get(name)
    }

    /// The submitted value of a field; missing fields read as unchecked
    pub fn data(&self, name: &str) -> bool {
        self.fields.get(name).map(|f| f.checked).unwrap_or(false)
    }

    /// Apply a submitted value. Returns false when the field is missing or
    /// disabled (disabled fields keep their rendered state).
    pub fn set_data(&mut self, name: &str, checked: bool) -> bool {
        match self.fields.get_mut(name) {
            Some(field) if !field.disabled => {
                field.checked = checked;
                true
            }
            _ => false,
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &CheckboxField> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
