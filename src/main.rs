use anyhow::Result;
use clap::Parser;

use form_lifecycle::cli::commands::check::CheckCommand;
use form_lifecycle::cli::commands::delete::DeleteCommand;
use form_lifecycle::cli::commands::edit::EditCommand;
use form_lifecycle::cli::commands::Command;
use form_lifecycle::cli::{Cli, Commands};
use form_lifecycle::config::FormSettings;
use form_lifecycle::observability::form_metrics;
use form_lifecycle::telemetry::{init_telemetry, shutdown_telemetry};

fn main() -> Result<()> {
    let cli = Cli::parse();

    FormSettings::load_env_file()?;
    let settings = FormSettings::load_from(cli.config.as_deref())?;
    init_telemetry(&settings.observability)?;

    let result = tokio::runtime::Runtime::new()?.block_on(async {
        match cli.command {
            Commands::Check { target } => CheckCommand::new(target, settings).execute().await,
            Commands::Edit {
                target,
                selected_type,
                assignments,
            } => {
                EditCommand::new(target, settings)
                    .with_selected_type(selected_type)
                    .with_assignments(assignments)
                    .execute()
                    .await
            }
            Commands::Delete { target, yes } => {
                DeleteCommand::new(target, yes, settings).execute().await
            }
        }
    });

    form_metrics().log_stats();
    shutdown_telemetry();
    result
}
