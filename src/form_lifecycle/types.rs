// Core types for the form lifecycle state machine

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::form_lifecycle::errors::ServiceError;

/// Identifier of a single form field
pub type FieldId = String;

/// A field value as exchanged with the remote resource
pub type Value = serde_json::Value;

/// Field values keyed by field id
pub type FormData = BTreeMap<FieldId, Value>;

/// Error messages keyed by field id
pub type FieldErrors = BTreeMap<FieldId, String>;

/// Error code for a required field without a value
pub const FIELD_REQUIRED: &str = "FIELD_REQUIRED";
/// Error code for a number outside its declared bounds
pub const FIELD_OUT_OF_RANGE: &str = "FIELD_OUT_OF_RANGE";
/// Error code for a fractional value in an integer-only field
pub const FIELD_NOT_INTEGER: &str = "FIELD_NOT_INTEGER";
/// Error code for a value that is not a number
pub const FIELD_NOT_A_NUMBER: &str = "FIELD_NOT_A_NUMBER";
/// Error code for a malformed URL
pub const FIELD_INVALID_URL: &str = "FIELD_INVALID_URL";

/// Sentinel placed on fields implicated by an authentication failure. It flags
/// the control without repeating the form-level message inline.
pub const AUTH_FIELD_SENTINEL: &str = " ";

/// Input kinds understood by the built-in validator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    /// Write-only value such as a password or API key
    Secret,
    Url,
    Bool,
    Number {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
        #[serde(default)]
        integer: bool,
    },
}

/// Static description of one form field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub id: FieldId,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub read_only: bool,
    /// Cleared from the form after an authentication failure
    #[serde(default)]
    pub sensitive: bool,
    /// Flagged with the sentinel error after an authentication failure
    #[serde(default)]
    pub credential: bool,
    #[serde(default)]
    pub default: Option<Value>,
}

impl FieldDescriptor {
    pub fn new(id: impl Into<FieldId>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            kind,
            required: false,
            read_only: false,
            sensitive: false,
            credential: false,
            default: None,
        }
    }

    pub fn text(id: impl Into<FieldId>) -> Self {
        Self::new(id, FieldKind::Text)
    }

    pub fn secret(id: impl Into<FieldId>) -> Self {
        Self::new(id, FieldKind::Secret)
    }

    pub fn url(id: impl Into<FieldId>) -> Self {
        Self::new(id, FieldKind::Url)
    }

    pub fn number(id: impl Into<FieldId>, min: Option<f64>, max: Option<f64>, integer: bool) -> Self {
        Self::new(id, FieldKind::Number { min, max, integer })
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn credential(mut self) -> Self {
        self.credential = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Required and editable, i.e. able to block submission
    pub fn blocks_submission(&self) -> bool {
        self.required && !self.read_only
    }

    /// Value seeded into the form when the resource does not supply one
    pub fn initial_value(&self) -> Value {
        if let Some(default) = &self.default {
            return default.clone();
        }
        self.blank_value()
    }

    /// Value a field holds once it has been cleared
    pub fn blank_value(&self) -> Value {
        match self.kind {
            FieldKind::Text | FieldKind::Secret | FieldKind::Url => Value::String(String::new()),
            FieldKind::Bool => Value::Bool(false),
            FieldKind::Number { .. } => Value::Null,
        }
    }
}

/// Whether a value counts as "not filled in"
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

/// Field layout of a form, optionally split into sub-types.
///
/// The active field set is `fields` plus the variant named by the value of
/// the `selector` field, so switching sub-type swaps the variant part.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub selector: Option<FieldId>,
    #[serde(default)]
    pub variants: BTreeMap<String, Vec<FieldDescriptor>>,
}

impl FormSchema {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self {
            fields,
            ..Default::default()
        }
    }

    pub fn with_selector(mut self, selector: impl Into<FieldId>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn with_variant(mut self, name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        self.variants.insert(name.into(), fields);
        self
    }

    /// Parse a schema from its TOML representation
    pub fn from_toml(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Sub-type currently chosen in `data`, if any
    pub fn selected_variant<'a>(&self, data: &'a FormData) -> Option<&'a str> {
        let selector = self.selector.as_ref()?;
        data.get(selector).and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    /// A form without a selector always has its parent selection
    pub fn has_parent_selection(&self, data: &FormData) -> bool {
        self.selector.is_none() || self.selected_variant(data).is_some()
    }

    /// Descriptors of the fields in play for the current values
    pub fn active_fields(&self, data: &FormData) -> Vec<&FieldDescriptor> {
        let variant = self
            .selected_variant(data)
            .and_then(|name| self.variants.get(name))
            .map(|fields| fields.as_slice())
            .unwrap_or_default();
        self.fields.iter().chain(variant.iter()).collect()
    }

    /// Looks a field up across the common fields and every variant
    pub fn descriptor(&self, id: &str) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .chain(self.variants.values().flatten())
            .find(|field| field.id == id)
    }

    pub fn is_selector(&self, id: &str) -> bool {
        self.selector.as_deref() == Some(id)
    }

    pub fn knows(&self, id: &str) -> bool {
        self.is_selector(id) || self.descriptor(id).is_some()
    }

    pub fn has_variant(&self, name: &str) -> bool {
        self.variants.contains_key(name)
    }
}

/// Resolved value of the load function
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    #[serde(default)]
    pub values: FormData,
    /// Sub-types the remote side offers; empty means "whatever the schema has"
    #[serde(default)]
    pub available_types: Vec<String>,
}

impl ResourceSnapshot {
    pub fn new(values: FormData) -> Self {
        Self {
            values,
            available_types: Vec::new(),
        }
    }
}

/// Resolved value of the save function
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveOutcome {
    /// Canonical values echoed back by the remote side
    #[serde(default)]
    pub data: Option<FormData>,
}

/// Externally visible phase of the machine, exactly one at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormPhase {
    Loading,
    Loaded,
    Saving,
    LoadError,
    AwaitingDeleteConfirmation,
    ConfirmDelete,
    Ended,
}

impl FormPhase {
    /// Phases left only by the resolution of an injected call
    pub fn is_suspended(&self) -> bool {
        matches!(self, FormPhase::Loading | FormPhase::Saving | FormPhase::ConfirmDelete)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FormPhase::Ended)
    }
}

impl std::fmt::Display for FormPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FormPhase::Loading => "loading",
            FormPhase::Loaded => "loaded",
            FormPhase::Saving => "saving",
            FormPhase::LoadError => "loadError",
            FormPhase::AwaitingDeleteConfirmation => "awaitingDeleteConfirmation",
            FormPhase::ConfirmDelete => "confirmDelete",
            FormPhase::Ended => "ended",
        };
        f.write_str(name)
    }
}

/// Events the view layer may dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormEvent {
    Update { field: FieldId, value: Value },
    SetSelectedType { selected: String },
    Save,
    Retry,
    ShowDeleteModal,
    ConfirmDelete,
    CancelDelete,
    ClearSaveError,
}

impl FormEvent {
    pub fn update(field: impl Into<FieldId>, value: impl Into<Value>) -> Self {
        FormEvent::Update {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn select_type(selected: impl Into<String>) -> Self {
        FormEvent::SetSelectedType {
            selected: selected.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FormEvent::Update { .. } => "UPDATE",
            FormEvent::SetSelectedType { .. } => "SET_SELECTED_TYPE",
            FormEvent::Save => "SAVE",
            FormEvent::Retry => "RETRY",
            FormEvent::ShowDeleteModal => "SHOW_DELETE_MODAL",
            FormEvent::ConfirmDelete => "CONFIRM_DELETE",
            FormEvent::CancelDelete => "CANCEL_DELETE",
            FormEvent::ClearSaveError => "CLEAR_SAVE_ERROR",
        }
    }
}

/// Everything the machine reacts to: view events plus the re-injected
/// resolutions of the load, save and delete calls
#[derive(Debug, Clone, PartialEq)]
pub enum MachineEvent {
    View(FormEvent),
    LoadResolved {
        generation: u64,
        result: Result<ResourceSnapshot, ServiceError>,
    },
    SaveResolved {
        generation: u64,
        result: Result<SaveOutcome, ServiceError>,
    },
    DeleteResolved {
        generation: u64,
        result: Result<(), ServiceError>,
    },
}

impl MachineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MachineEvent::View(event) => event.name(),
            MachineEvent::LoadResolved { result: Ok(_), .. } => "load.done",
            MachineEvent::LoadResolved { result: Err(_), .. } => "load.error",
            MachineEvent::SaveResolved { result: Ok(_), .. } => "save.done",
            MachineEvent::SaveResolved { result: Err(_), .. } => "save.error",
            MachineEvent::DeleteResolved { result: Ok(_), .. } => "delete.done",
            MachineEvent::DeleteResolved { result: Err(_), .. } => "delete.error",
        }
    }
}

impl From<FormEvent> for MachineEvent {
    fn from(event: FormEvent) -> Self {
        MachineEvent::View(event)
    }
}

/// Asynchronous call the driver must start on behalf of the machine
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    Load { generation: u64 },
    Save { generation: u64, form: Box<crate::form_lifecycle::context::FormContext> },
    Delete { generation: u64 },
}

impl Invocation {
    pub fn generation(&self) -> u64 {
        match self {
            Invocation::Load { generation }
            | Invocation::Save { generation, .. }
            | Invocation::Delete { generation } => *generation,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Invocation::Load { .. } => "load",
            Invocation::Save { .. } => "save",
            Invocation::Delete { .. } => "delete",
        }
    }

    /// Resolution fed back when the call could not run to completion
    pub fn failed(&self, error: ServiceError) -> MachineEvent {
        let generation = self.generation();
        match self {
            Invocation::Load { .. } => MachineEvent::LoadResolved {
                generation,
                result: Err(error),
            },
            Invocation::Save { .. } => MachineEvent::SaveResolved {
                generation,
                result: Err(error),
            },
            Invocation::Delete { .. } => MachineEvent::DeleteResolved {
                generation,
                result: Err(error),
            },
        }
    }
}

/// Callbacks the driver owes the caller after a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Saved(FormData),
    Deleted,
}

/// Side effects produced while handling one event
#[derive(Debug, Default)]
pub struct Effects {
    pub invocation: Option<Invocation>,
    pub notification: Option<Notification>,
    pub ignored: bool,
}

/// One entry of the transition audit trail
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionRecord {
    pub from: FormPhase,
    pub to: FormPhase,
    pub event: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}
