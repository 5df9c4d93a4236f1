use anyhow::{bail, Result};

use super::{Command, CommandReport, FormSession};
use crate::cli::FormTarget;
use crate::config::FormSettings;
use crate::form_lifecycle::{FormEvent, FormPhase};

/// Loads the resource and reports every validation error
pub struct CheckCommand {
    pub target: FormTarget,
    pub settings: FormSettings,
}

impl CheckCommand {
    pub fn new(target: FormTarget, settings: FormSettings) -> Self {
        Self { target, settings }
    }
}

impl Command for CheckCommand {
    async fn execute(&self) -> Result<()> {
        let mut session = FormSession::open(&self.target, &self.settings, false).await?;
        let mut snapshot = session.handle.snapshot();

        // A blocked save touches every field and reveals its errors; a
        // saveable form has none to reveal, so no save is sent.
        if snapshot.phase == FormPhase::Loaded && !snapshot.can_save {
            session.handle.send(FormEvent::Save).await?;
            snapshot = session.settle().await?;
        }

        let report = CommandReport::from_snapshot(&snapshot);
        report.print()?;
        session.close().await?;

        if snapshot.phase == FormPhase::LoadError {
            bail!(
                "Failed to load {}: {}",
                self.target.resource.display(),
                report.message.unwrap_or_default()
            );
        }
        Ok(())
    }
}
