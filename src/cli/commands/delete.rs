use anyhow::{bail, Result};

use super::{Command, CommandReport, FormSession};
use crate::cli::FormTarget;
use crate::config::FormSettings;
use crate::form_lifecycle::{FormEvent, FormPhase};

/// Removes the resource through the confirmation sub-flow
pub struct DeleteCommand {
    pub target: FormTarget,
    pub confirmed: bool,
    pub settings: FormSettings,
}

impl DeleteCommand {
    pub fn new(target: FormTarget, confirmed: bool, settings: FormSettings) -> Self {
        Self {
            target,
            confirmed,
            settings,
        }
    }
}

impl Command for DeleteCommand {
    async fn execute(&self) -> Result<()> {
        let mut session = FormSession::open(&self.target, &self.settings, true).await?;
        if session.handle.snapshot().phase != FormPhase::Loaded {
            let report = CommandReport::from_snapshot(&session.handle.snapshot());
            report.print()?;
            session.close().await?;
            bail!(
                "Failed to load {}: {}",
                self.target.resource.display(),
                report.message.unwrap_or_default()
            );
        }

        session.handle.send(FormEvent::ShowDeleteModal).await?;
        let event = if self.confirmed {
            FormEvent::ConfirmDelete
        } else {
            FormEvent::CancelDelete
        };
        session.handle.send(event).await?;
        let snapshot = session.settle().await?;

        let report = CommandReport::from_snapshot(&snapshot);
        report.print()?;
        session.close().await?;

        if !self.confirmed {
            bail!("Deletion not confirmed; pass --yes to delete");
        }
        if snapshot.phase != FormPhase::Ended {
            bail!(
                "Delete failed: {}",
                report.message.unwrap_or_else(|| "unknown error".to_string())
            );
        }
        Ok(())
    }
}
