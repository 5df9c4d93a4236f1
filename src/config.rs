use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::form_lifecycle::runtime::RuntimeOptions;
use crate::form_lifecycle::save_errors::{FailureMapper, FailureMessages};
use crate::form_lifecycle::state_machine::FormOptions;

/// Default configuration file, looked up in the working directory
pub const CONFIG_FILE: &str = "form-lifecycle.toml";

/// Main configuration structure for the form lifecycle
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FormSettings {
    /// Texts shown for failures that carry no message of their own
    pub messages: FailureMessages,
    /// Save failure statuses treated as rejected credentials
    pub auth_statuses: Vec<u16>,
    /// Transitions kept per form for diagnostics
    pub history_capacity: usize,
    /// Queued view events per form before senders wait
    pub channel_capacity: usize,
    pub observability: ObservabilitySettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilitySettings {
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}

impl Default for FormSettings {
    fn default() -> Self {
        let mapper = FailureMapper::default();
        Self {
            messages: mapper.messages,
            auth_statuses: mapper.auth_statuses,
            history_capacity: 64,
            channel_capacity: 64,
            observability: ObservabilitySettings::default(),
        }
    }
}

impl FormSettings {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. `form-lifecycle.toml` in the working directory
    /// 3. Environment variables (prefixed with FORM_LIFECYCLE_)
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Same as [`FormSettings::load`], reading `path` instead of the default file
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        match path {
            Some(path) => builder = builder.add_source(File::from(path)),
            None if Path::new(CONFIG_FILE).exists() => {
                builder = builder.add_source(File::with_name(CONFIG_FILE));
            }
            None => {}
        }

        builder = builder.add_source(
            Environment::with_prefix("FORM_LIFECYCLE")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("auth_statuses")
                .try_parsing(true),
        );

        let settings: FormSettings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }

    pub fn failure_mapper(&self) -> FailureMapper {
        FailureMapper::new(self.messages.clone(), self.auth_statuses.clone())
    }

    /// Machine options carrying these settings
    pub fn form_options(&self) -> FormOptions {
        FormOptions::default()
            .with_failures(self.failure_mapper())
            .with_history_capacity(self.history_capacity)
    }

    pub fn runtime_options(&self) -> RuntimeOptions {
        RuntimeOptions::default()
            .with_metrics(crate::observability::form_metrics())
            .with_channel_capacity(self.channel_capacity)
    }
}

/// Global configuration instance
static SETTINGS: std::sync::LazyLock<Result<FormSettings, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        let _ = FormSettings::load_env_file();
        FormSettings::load()
    });

/// Get the global configuration
pub fn settings() -> Result<&'static FormSettings> {
    SETTINGS
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_settings() -> Result<()> {
    let _settings = settings()?;
    tracing::info!("Configuration loaded successfully");
    Ok(())
}
