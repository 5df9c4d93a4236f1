use thiserror::Error;

use crate::form_lifecycle::types::FieldErrors;

/// Failure of an injected load, save or delete call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// The remote side answered and refused the request
    #[error("request rejected{}{}", status_suffix(.status), message_suffix(.message))]
    Rejected {
        status: Option<u16>,
        message: Option<String>,
        field_errors: FieldErrors,
    },
    /// No response at all
    #[error("connection failed: {0}")]
    Transport(String),
    #[error("operation not supported by this resource")]
    Unsupported,
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" with status {s}")).unwrap_or_default()
}

fn message_suffix(message: &Option<String>) -> String {
    message.as_ref().map(|m| format!(": {m}")).unwrap_or_default()
}

impl ServiceError {
    /// Rejection carrying only an HTTP-style status
    pub fn status(status: u16) -> Self {
        ServiceError::Rejected {
            status: Some(status),
            message: None,
            field_errors: FieldErrors::new(),
        }
    }

    /// Rejection carrying only a server message
    pub fn message(message: impl Into<String>) -> Self {
        ServiceError::Rejected {
            status: None,
            message: Some(message.into()),
            field_errors: FieldErrors::new(),
        }
    }

    /// Rejection with neither status nor message
    pub fn unexplained() -> Self {
        ServiceError::Rejected {
            status: None,
            message: None,
            field_errors: FieldErrors::new(),
        }
    }

    pub fn transport(reason: impl Into<String>) -> Self {
        ServiceError::Transport(reason.into())
    }

    pub fn with_message(self, text: impl Into<String>) -> Self {
        match self {
            ServiceError::Rejected {
                status,
                field_errors,
                ..
            } => ServiceError::Rejected {
                status,
                message: Some(text.into()),
                field_errors,
            },
            other => other,
        }
    }

    pub fn with_field_error(self, field: impl Into<String>, text: impl Into<String>) -> Self {
        match self {
            ServiceError::Rejected {
                status,
                message,
                mut field_errors,
            } => {
                field_errors.insert(field.into(), text.into());
                ServiceError::Rejected {
                    status,
                    message,
                    field_errors,
                }
            }
            other => other,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ServiceError::Rejected { status, .. } => *status,
            _ => None,
        }
    }
}

/// Errors surfaced by the runtime and its configuration
#[derive(Debug, Error)]
pub enum FormError {
    #[error("form {form_id} is no longer running")]
    Closed { form_id: String },
    #[error("form runtime task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("invalid form schema: {0}")]
    Schema(#[from] toml::de::Error),
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
