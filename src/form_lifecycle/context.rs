// Working memory of a single form instance

use serde::Serialize;
use std::collections::BTreeMap;

use crate::form_lifecycle::types::*;

/// Mutable state of one form. Only the state machine writes to it; the view
/// reads it through [`FormSnapshot`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormContext {
    pub data: FormData,
    pub pristine_data: FormData,
    pub is_touched: BTreeMap<FieldId, bool>,
    pub validation_errors: FieldErrors,
    pub save_error: Option<String>,
    pub save_errors: FieldErrors,
    pub save_error_data: FormData,
    pub load_error: Option<String>,
    pub delete_error: Option<String>,
    pub submit_attempted: bool,
    pub available_types: Vec<String>,
    #[serde(skip)]
    pub(crate) skip_validation: bool,
}

impl FormContext {
    pub fn is_pristine(&self) -> bool {
        self.data == self.pristine_data
    }

    pub fn is_touched(&self, field: &str) -> bool {
        self.is_touched.get(field).copied().unwrap_or(false)
    }

    pub fn value(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    /// Errors the view should render: only after a failed submit attempt
    pub fn should_show_errors(&self) -> bool {
        self.submit_attempted && !self.validation_errors.is_empty()
    }

    /// Whether the save error on `field` still refers to the current value.
    ///
    /// A field absent from `data` or from the snapshot counts as `null`, so
    /// errors on fields the form never held stay live.
    pub fn is_save_error_live(&self, field: &str) -> bool {
        const MISSING: &Value = &Value::Null;
        self.save_errors.contains_key(field)
            && self.data.get(field).unwrap_or(MISSING)
                == self.save_error_data.get(field).unwrap_or(MISSING)
    }

    pub fn live_save_errors(&self) -> FieldErrors {
        self.save_errors
            .iter()
            .filter(|(field, _)| self.is_save_error_live(field))
            .map(|(field, message)| (field.clone(), message.clone()))
            .collect()
    }

    /// Inline message for a control: a live save error wins over validation
    pub fn field_error(&self, field: &str) -> Option<&str> {
        if self.is_save_error_live(field) {
            return self.save_errors.get(field).map(String::as_str);
        }
        self.validation_errors.get(field).map(String::as_str)
    }

    /// Drops save errors whose field has been edited since they were raised
    pub(crate) fn prune_stale_save_errors(&mut self) -> usize {
        let stale: Vec<FieldId> = self
            .save_errors
            .keys()
            .filter(|field| !self.is_save_error_live(field))
            .cloned()
            .collect();
        for field in &stale {
            self.save_errors.remove(field);
            self.save_error_data.remove(field);
        }
        stale.len()
    }

    pub(crate) fn clear_save_errors(&mut self) {
        self.save_error = None;
        self.save_errors.clear();
        self.save_error_data.clear();
    }

    pub(crate) fn touch(&mut self, field: &str) {
        self.is_touched.insert(field.to_string(), true);
    }

    /// Stores a value in both the working copy and the baseline, keeping the
    /// two key sets aligned without affecting pristine status
    pub(crate) fn seed(&mut self, field: &str, value: Value) {
        if !self.data.contains_key(field) {
            self.data.insert(field.to_string(), value.clone());
        }
        if !self.pristine_data.contains_key(field) {
            self.pristine_data.insert(field.to_string(), value);
        }
    }
}

/// Read-only view of the machine handed to the view layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSnapshot {
    pub form_id: String,
    pub phase: FormPhase,
    pub context: FormContext,
    pub is_pristine: bool,
    pub can_save: bool,
    pub should_show_errors: bool,
    pub live_save_errors: FieldErrors,
    /// Number of view events the machine has consumed
    pub processed: u64,
}

impl FormSnapshot {
    pub fn is_settled(&self) -> bool {
        !self.phase.is_suspended()
    }
}
