// Field-level and cross-field validation

use regex::Regex;
use std::sync::{Arc, LazyLock};

use crate::form_lifecycle::types::*;

static URL_SHAPE: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://[^\s/?#@]+(@[^\s/?#]+)?(:\d{1,5})?([/?#]\S*)?$")
});

/// Loose URL shape check: scheme, authority, optional path
pub fn looks_like_url(candidate: &str) -> bool {
    match URL_SHAPE.as_ref() {
        Ok(pattern) => pattern.is_match(candidate.trim()),
        Err(e) => {
            tracing::error!(error = %e, "URL pattern failed to compile");
            false
        }
    }
}

/// A rule that inspects several fields at once
pub type CrossFieldRule = Arc<dyn Fn(&FormData) -> FieldErrors + Send + Sync>;

/// Computes every error of the current values, regardless of touched state
pub trait FormValidator: Send + Sync {
    fn validate(&self, schema: &FormSchema, data: &FormData) -> FieldErrors;
}

/// Built-in validator driven by field descriptors, extended with cross-field rules
#[derive(Clone, Default)]
pub struct SchemaValidator {
    rules: Vec<CrossFieldRule>,
}

impl SchemaValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule<F>(mut self, rule: F) -> Self
    where
        F: Fn(&FormData) -> FieldErrors + Send + Sync + 'static,
    {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Rule requiring two fields to hold the same value, reported on `confirm`
    pub fn with_matching_fields(self, field: &str, confirm: &str, message: &str) -> Self {
        let field = field.to_string();
        let confirm = confirm.to_string();
        let message = message.to_string();
        self.with_rule(move |data| {
            let mut errors = FieldErrors::new();
            if data.get(&field) != data.get(&confirm) {
                errors.insert(confirm.clone(), message.clone());
            }
            errors
        })
    }
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl FormValidator for SchemaValidator {
    fn validate(&self, schema: &FormSchema, data: &FormData) -> FieldErrors {
        let active = schema.active_fields(data);
        let mut errors = FieldErrors::new();

        for field in &active {
            if let Some(message) = check_field(field, data.get(&field.id)) {
                errors.insert(field.id.clone(), message.to_string());
            }
        }

        if let Some(selector) = &schema.selector {
            if !schema.variants.is_empty() && schema.selected_variant(data).is_none() {
                errors.insert(selector.clone(), FIELD_REQUIRED.to_string());
            }
        }

        for rule in &self.rules {
            for (field, message) in rule(data) {
                let in_play = active.iter().any(|d| d.id == field) || schema.is_selector(&field);
                // Per-field errors take precedence
                if in_play {
                    errors.entry(field).or_insert(message);
                }
            }
        }

        errors
    }
}

/// Single-field checks in priority order: required, number shape, URL shape
pub fn check_field(field: &FieldDescriptor, value: Option<&Value>) -> Option<&'static str> {
    if is_blank(value) {
        return (field.required && !field.read_only).then_some(FIELD_REQUIRED);
    }
    let value = value?;

    match &field.kind {
        FieldKind::Number { min, max, integer } => {
            let number = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            let Some(number) = number else {
                return Some(FIELD_NOT_A_NUMBER);
            };
            if *integer && number.fract() != 0.0 {
                return Some(FIELD_NOT_INTEGER);
            }
            let below = min.is_some_and(|min| number < min);
            let above = max.is_some_and(|max| number > max);
            (below || above).then_some(FIELD_OUT_OF_RANGE)
        }
        FieldKind::Url => match value.as_str() {
            Some(candidate) if looks_like_url(candidate) => None,
            _ => Some(FIELD_INVALID_URL),
        },
        FieldKind::Text | FieldKind::Secret | FieldKind::Bool => None,
    }
}
