use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::cli::FormTarget;
use crate::config::FormSettings;
use crate::form_lifecycle::{
    FormContext, FormHandle, FormMachine, FormPhase, FormRuntime, FormSchema, FormSnapshot,
};
use crate::fs::{JsonFileServices, StandardFileSystem};
use crate::observability::OperationTimer;

pub mod check;
pub mod delete;
pub mod edit;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

/// A running form bound to the resource file of a [`FormTarget`]
pub struct FormSession {
    pub handle: FormHandle,
}

impl FormSession {
    /// Reads the schema, starts the runtime and waits for the initial load
    pub async fn open(target: &FormTarget, settings: &FormSettings, delete: bool) -> Result<Self> {
        let source = tokio::fs::read_to_string(&target.schema)
            .await
            .with_context(|| format!("Failed to read schema {}", target.schema.display()))?;
        let schema = FormSchema::from_toml(&source)
            .with_context(|| format!("Invalid schema {}", target.schema.display()))?;

        let resource = target.resource.to_string_lossy().to_string();
        let services = JsonFileServices::new(Arc::new(StandardFileSystem), resource.clone())
            .with_available_types(target.offered_types.clone());
        let options = settings
            .form_options()
            .with_form_id(resource)
            .with_delete(delete);
        let machine = FormMachine::new(schema, options);
        let mut handle =
            FormRuntime::spawn_with(machine, Arc::new(services), settings.runtime_options());

        let timer = OperationTimer::new("form_load");
        let loaded = handle.settled().await?;
        timer.finish();
        info!(form_id = %handle.form_id(), phase = %loaded.phase, "Form session opened");
        Ok(Self { handle })
    }

    pub async fn settle(&mut self) -> Result<FormSnapshot> {
        Ok(self.handle.settled().await?)
    }

    pub async fn close(self) -> Result<()> {
        let machine = self.handle.close().await?;
        tracing::debug!(
            transitions = machine.history().count(),
            "Form session closed"
        );
        Ok(())
    }
}

/// What a command prints on stdout
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandReport {
    pub phase: FormPhase,
    pub can_save: bool,
    pub is_pristine: bool,
    pub errors: crate::form_lifecycle::types::FieldErrors,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CommandReport {
    pub fn from_snapshot(snapshot: &FormSnapshot) -> Self {
        let context: &FormContext = &snapshot.context;
        let mut errors = context.validation_errors.clone();
        for (field, message) in &snapshot.live_save_errors {
            errors.insert(field.clone(), message.clone());
        }
        let message = context
            .load_error
            .clone()
            .or_else(|| context.save_error.clone())
            .or_else(|| context.delete_error.clone());

        Self {
            phase: snapshot.phase,
            can_save: snapshot.can_save,
            is_pristine: snapshot.is_pristine,
            errors,
            message,
        }
    }

    pub fn print(&self) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(self)?);
        Ok(())
    }
}
