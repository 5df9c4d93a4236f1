// Mapping of failed remote calls onto the form context

use serde::{Deserialize, Serialize};

use crate::form_lifecycle::context::FormContext;
use crate::form_lifecycle::errors::ServiceError;
use crate::form_lifecycle::types::*;

/// User-facing texts for failures that carry no message of their own
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureMessages {
    pub authentication_failed: String,
    pub operation_failed: String,
    pub connection_failed: String,
}

impl Default for FailureMessages {
    fn default() -> Self {
        Self {
            authentication_failed: "Authentication failed".to_string(),
            operation_failed: "Operation failed".to_string(),
            connection_failed: "Connection failed".to_string(),
        }
    }
}

/// How a failure was classified when it was applied to the context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Credentials or data rejected; fields are flagged
    Authentication,
    /// The remote side explained the refusal
    Reported,
    /// Refused without any explanation
    Unexplained,
    /// The remote side was not reached
    Connection,
    Unsupported,
}

/// Converts service failures into form-level and field-level messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureMapper {
    pub messages: FailureMessages,
    pub auth_statuses: Vec<u16>,
}

impl Default for FailureMapper {
    fn default() -> Self {
        Self {
            messages: FailureMessages::default(),
            auth_statuses: vec![401, 403],
        }
    }
}

impl FailureMapper {
    pub fn new(messages: FailureMessages, auth_statuses: Vec<u16>) -> Self {
        Self {
            messages,
            auth_statuses,
        }
    }

    pub fn classify(&self, error: &ServiceError) -> FailureClass {
        match error {
            ServiceError::Transport(_) => FailureClass::Connection,
            ServiceError::Unsupported => FailureClass::Unsupported,
            ServiceError::Rejected {
                status: Some(status),
                ..
            } if self.auth_statuses.contains(status) => FailureClass::Authentication,
            ServiceError::Rejected {
                message,
                field_errors,
                ..
            } if message.is_some() || !field_errors.is_empty() => FailureClass::Reported,
            ServiceError::Rejected { .. } => FailureClass::Unexplained,
        }
    }

    /// Single form-level message for a load or delete failure
    pub fn describe(&self, error: &ServiceError) -> String {
        match (self.classify(error), error) {
            (FailureClass::Connection, _) => self.messages.connection_failed.clone(),
            (_, ServiceError::Rejected { message: Some(message), .. }) => message.clone(),
            (FailureClass::Authentication, _) => self.messages.authentication_failed.clone(),
            (FailureClass::Unsupported, _) => error.to_string(),
            _ => self.messages.operation_failed.clone(),
        }
    }

    /// Applies a save failure to the context.
    ///
    /// Authentication failures clear sensitive values, flag credential fields
    /// with [`AUTH_FIELD_SENTINEL`] and suppress the next validation pass so the
    /// freshly cleared fields do not light up as "required".
    pub fn apply_save_failure(
        &self,
        schema: &FormSchema,
        context: &mut FormContext,
        error: &ServiceError,
    ) -> FailureClass {
        let class = self.classify(error);
        context.save_error = Some(self.describe(error));

        match (class, error) {
            (FailureClass::Authentication, _) => {
                let active = schema.active_fields(&context.data);
                let mut implicated: Vec<&FieldDescriptor> =
                    active.iter().copied().filter(|f| f.credential).collect();
                if implicated.is_empty() {
                    implicated = active.iter().copied().filter(|f| f.sensitive).collect();
                }

                for field in active.iter().filter(|f| f.sensitive) {
                    context.data.insert(field.id.clone(), field.blank_value());
                }
                for field in implicated {
                    context
                        .save_errors
                        .insert(field.id.clone(), AUTH_FIELD_SENTINEL.to_string());
                    snapshot_value(context, &field.id);
                }
                context.skip_validation = true;
            }
            (FailureClass::Reported, ServiceError::Rejected { field_errors, .. }) => {
                for (field, message) in field_errors {
                    context.save_errors.insert(field.clone(), message.clone());
                    snapshot_value(context, field);
                }
            }
            _ => {}
        }

        class
    }
}

fn snapshot_value(context: &mut FormContext, field: &str) {
    let value = context.data.get(field).cloned().unwrap_or(Value::Null);
    context.save_error_data.insert(field.to_string(), value);
}
