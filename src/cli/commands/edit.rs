use anyhow::{bail, Result};
use serde_json::Value;
use tracing::info;

use super::{Command, CommandReport, FormSession};
use crate::cli::FormTarget;
use crate::config::FormSettings;
use crate::form_lifecycle::{FormEvent, FormPhase};

/// Applies edits to the resource and saves it
pub struct EditCommand {
    pub target: FormTarget,
    pub selected_type: Option<String>,
    pub assignments: Vec<(String, Value)>,
    pub settings: FormSettings,
}

impl EditCommand {
    pub fn new(target: FormTarget, settings: FormSettings) -> Self {
        Self {
            target,
            selected_type: None,
            assignments: Vec::new(),
            settings,
        }
    }

    pub fn with_selected_type(mut self, selected_type: Option<String>) -> Self {
        self.selected_type = selected_type;
        self
    }

    pub fn with_assignments(mut self, assignments: Vec<(String, Value)>) -> Self {
        self.assignments = assignments;
        self
    }
}

impl Command for EditCommand {
    async fn execute(&self) -> Result<()> {
        let mut session = FormSession::open(&self.target, &self.settings, false).await?;
        if session.handle.snapshot().phase == FormPhase::LoadError {
            let report = CommandReport::from_snapshot(&session.handle.snapshot());
            report.print()?;
            session.close().await?;
            bail!(
                "Failed to load {}: {}",
                self.target.resource.display(),
                report.message.unwrap_or_default()
            );
        }

        if let Some(selected) = &self.selected_type {
            session.handle.send(FormEvent::select_type(selected.as_str())).await?;
        }
        for (field, value) in &self.assignments {
            session
                .handle
                .send(FormEvent::update(field.as_str(), value.clone()))
                .await?;
        }
        session.handle.send(FormEvent::Save).await?;
        let snapshot = session.settle().await?;

        let report = CommandReport::from_snapshot(&snapshot);
        report.print()?;
        session.close().await?;

        let context = &snapshot.context;
        if context.submit_attempted {
            bail!("Form has validation errors; nothing was saved");
        }
        if let Some(message) = &context.save_error {
            bail!("Save failed: {message}");
        }
        info!(resource = %self.target.resource.display(), "Resource saved");
        Ok(())
    }
}
