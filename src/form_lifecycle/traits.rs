// Injected collaborators - the machine never performs I/O itself

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::form_lifecycle::context::FormContext;
use crate::form_lifecycle::errors::ServiceError;
use crate::form_lifecycle::types::*;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

/// Remote operations a form is bound to
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait::async_trait]
pub trait FormServices: Send + Sync {
    /// Fetch the resource's current values
    async fn load(&self) -> Result<ResourceSnapshot, ServiceError>;

    /// Persist the form; must be idempotent
    async fn save(&self, form: &FormContext) -> Result<SaveOutcome, ServiceError>;

    /// Remove the resource
    async fn delete(&self) -> Result<(), ServiceError> {
        Err(ServiceError::Unsupported)
    }

    /// Called once a save resolved successfully
    fn on_save_success(&self, _data: &FormData) {}

    /// Called once a delete resolved successfully
    fn on_delete_success(&self) {}
}

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type LoadFn = Arc<dyn Fn() -> BoxFuture<Result<ResourceSnapshot, ServiceError>> + Send + Sync>;
type SaveFn = Arc<dyn Fn(FormContext) -> BoxFuture<Result<SaveOutcome, ServiceError>> + Send + Sync>;
type DeleteFn = Arc<dyn Fn() -> BoxFuture<Result<(), ServiceError>> + Send + Sync>;
type SavedHook = Arc<dyn Fn(&FormData) + Send + Sync>;
type DeletedHook = Arc<dyn Fn() + Send + Sync>;

/// [`FormServices`] assembled from closures, for screens that only need
/// two HTTP calls and no dedicated type
#[derive(Clone)]
pub struct FnServices {
    load: LoadFn,
    save: SaveFn,
    delete: Option<DeleteFn>,
    on_saved: Option<SavedHook>,
    on_deleted: Option<DeletedHook>,
}

impl FnServices {
    pub fn new<L, LF, S, SF>(load: L, save: S) -> Self
    where
        L: Fn() -> LF + Send + Sync + 'static,
        LF: Future<Output = Result<ResourceSnapshot, ServiceError>> + Send + 'static,
        S: Fn(FormContext) -> SF + Send + Sync + 'static,
        SF: Future<Output = Result<SaveOutcome, ServiceError>> + Send + 'static,
    {
        Self {
            load: Arc::new(move || Box::pin(load())),
            save: Arc::new(move |form| Box::pin(save(form))),
            delete: None,
            on_saved: None,
            on_deleted: None,
        }
    }

    pub fn with_delete<D, DF>(mut self, delete: D) -> Self
    where
        D: Fn() -> DF + Send + Sync + 'static,
        DF: Future<Output = Result<(), ServiceError>> + Send + 'static,
    {
        self.delete = Some(Arc::new(move || Box::pin(delete())));
        self
    }

    pub fn on_saved(mut self, hook: impl Fn(&FormData) + Send + Sync + 'static) -> Self {
        self.on_saved = Some(Arc::new(hook));
        self
    }

    pub fn on_deleted(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_deleted = Some(Arc::new(hook));
        self
    }
}

impl std::fmt::Debug for FnServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnServices")
            .field("delete", &self.delete.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl FormServices for FnServices {
    async fn load(&self) -> Result<ResourceSnapshot, ServiceError> {
        (self.load)().await
    }

    async fn save(&self, form: &FormContext) -> Result<SaveOutcome, ServiceError> {
        (self.save)(form.clone()).await
    }

    async fn delete(&self) -> Result<(), ServiceError> {
        match &self.delete {
            Some(delete) => delete().await,
            None => Err(ServiceError::Unsupported),
        }
    }

    fn on_save_success(&self, data: &FormData) {
        if let Some(hook) = &self.on_saved {
            hook(data);
        }
    }

    fn on_delete_success(&self) {
        if let Some(hook) = &self.on_deleted {
            hook();
        }
    }
}
