//! File-backed resources for forms
//!
//! A resource is a JSON object stored in a single file. Reading and writing
//! goes through [`ResourceFileSystem`] so the services can be tested against
//! `MockResourceFileSystem` without touching the disk.
//!
//! ```rust,no_run
//! use form_lifecycle::fs::{JsonFileServices, StandardFileSystem};
//! use std::sync::Arc;
//!
//! let services = JsonFileServices::new(Arc::new(StandardFileSystem), "connection.json");
//! assert!(services.path().ends_with("connection.json"));
//! ```

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::form_lifecycle::context::FormContext;
use crate::form_lifecycle::errors::ServiceError;
use crate::form_lifecycle::traits::FormServices;
use crate::form_lifecycle::types::{FormData, ResourceSnapshot, SaveOutcome};

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

/// File system operations needed by [`JsonFileServices`]
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait::async_trait]
pub trait ResourceFileSystem: Send + Sync {
    async fn read_to_string(&self, path: &str) -> Result<String>;

    /// Write data to a file, creating the file if it doesn't exist
    async fn write(&self, path: &str, contents: &[u8]) -> Result<()>;

    async fn remove_file(&self, path: &str) -> Result<()>;

    fn exists(&self, path: &str) -> bool;
}

/// Production implementation backed by `tokio::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFileSystem;

#[async_trait::async_trait]
impl ResourceFileSystem for StandardFileSystem {
    async fn read_to_string(&self, path: &str) -> Result<String> {
        tokio::fs::read_to_string(path).await.map_err(Into::into)
    }

    async fn write(&self, path: &str, contents: &[u8]) -> Result<()> {
        tokio::fs::write(path, contents).await.map_err(Into::into)
    }

    async fn remove_file(&self, path: &str) -> Result<()> {
        tokio::fs::remove_file(path).await.map_err(Into::into)
    }

    fn exists(&self, path: &str) -> bool {
        Path::new(path).exists()
    }
}

/// [`FormServices`] persisting a form as a pretty-printed JSON object
#[derive(Clone)]
pub struct JsonFileServices {
    fs: Arc<dyn ResourceFileSystem>,
    path: String,
    available_types: Vec<String>,
}

impl JsonFileServices {
    pub fn new(fs: Arc<dyn ResourceFileSystem>, path: impl Into<String>) -> Self {
        Self {
            fs,
            path: path.into(),
            available_types: Vec::new(),
        }
    }

    /// Restricts the sub-types offered after load
    pub fn with_available_types(mut self, types: Vec<String>) -> Self {
        self.available_types = types;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl std::fmt::Debug for JsonFileServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileServices")
            .field("path", &self.path)
            .field("available_types", &self.available_types)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl FormServices for JsonFileServices {
    async fn load(&self) -> Result<ResourceSnapshot, ServiceError> {
        if !self.fs.exists(&self.path) {
            return Err(ServiceError::status(404).with_message(format!("{} does not exist", self.path)));
        }
        let raw = self
            .fs
            .read_to_string(&self.path)
            .await
            .map_err(|e| ServiceError::transport(e.to_string()))?;
        let values: FormData = serde_json::from_str(&raw)
            .map_err(|e| ServiceError::message(format!("{} is not a JSON object: {e}", self.path)))?;

        debug!(path = %self.path, fields = values.len(), "Resource read");
        Ok(ResourceSnapshot {
            values,
            available_types: self.available_types.clone(),
        })
    }

    async fn save(&self, form: &FormContext) -> Result<SaveOutcome, ServiceError> {
        let contents = serde_json::to_vec_pretty(&form.data)
            .map_err(|e| ServiceError::message(e.to_string()))?;
        self.fs
            .write(&self.path, &contents)
            .await
            .map_err(|e| ServiceError::transport(e.to_string()))?;

        info!(path = %self.path, "Resource written");
        Ok(SaveOutcome::default())
    }

    async fn delete(&self) -> Result<(), ServiceError> {
        self.fs
            .remove_file(&self.path)
            .await
            .map_err(|e| ServiceError::transport(e.to_string()))?;
        info!(path = %self.path, "Resource removed");
        Ok(())
    }
}
