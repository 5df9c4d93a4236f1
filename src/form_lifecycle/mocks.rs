// Scripted service implementations for testing - no I/O

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use crate::form_lifecycle::context::FormContext;
use crate::form_lifecycle::errors::ServiceError;
use crate::form_lifecycle::traits::FormServices;
use crate::form_lifecycle::types::*;

/// Services answering from pre-recorded queues, recording every call
#[derive(Debug, Default)]
pub struct ScriptedServices {
    pub loads: Mutex<VecDeque<Result<ResourceSnapshot, ServiceError>>>,
    pub saves: Mutex<VecDeque<Result<SaveOutcome, ServiceError>>>,
    pub deletes: Mutex<VecDeque<Result<(), ServiceError>>>,
    pub submitted: Mutex<Vec<FormData>>,
    pub load_calls: AtomicUsize,
    pub save_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub saved_callbacks: AtomicUsize,
    pub deleted_callbacks: AtomicUsize,
    /// When set, each save waits for one permit before answering
    pub save_gate: Option<Arc<Semaphore>>,
}

impl ScriptedServices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_load(self, result: Result<ResourceSnapshot, ServiceError>) -> Self {
        self.loads.lock().unwrap().push_back(result);
        self
    }

    pub fn with_values(self, values: serde_json::Value) -> Self {
        let values: FormData = serde_json::from_value(values).unwrap();
        self.with_load(Ok(ResourceSnapshot::new(values)))
    }

    pub fn with_save(self, result: Result<SaveOutcome, ServiceError>) -> Self {
        self.saves.lock().unwrap().push_back(result);
        self
    }

    pub fn with_delete(self, result: Result<(), ServiceError>) -> Self {
        self.deletes.lock().unwrap().push_back(result);
        self
    }

    pub fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.save_gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub fn save_count(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    pub fn last_submitted(&self) -> Option<FormData> {
        self.submitted.lock().unwrap().last().cloned()
    }
}

#[async_trait::async_trait]
impl FormServices for ScriptedServices {
    async fn load(&self) -> Result<ResourceSnapshot, ServiceError> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.loads.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(ResourceSnapshot::default()))
    }

    async fn save(&self, form: &FormContext) -> Result<SaveOutcome, ServiceError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().unwrap().push(form.data.clone());
        if let Some(gate) = &self.save_gate {
            gate.acquire().await.unwrap().forget();
        }
        let next = self.saves.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(SaveOutcome::default()))
    }

    async fn delete(&self) -> Result<(), ServiceError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.deletes.lock().unwrap().pop_front();
        next.unwrap_or(Ok(()))
    }

    fn on_save_success(&self, _data: &FormData) {
        self.saved_callbacks.fetch_add(1, Ordering::SeqCst);
    }

    fn on_delete_success(&self) {
        self.deleted_callbacks.fetch_add(1, Ordering::SeqCst);
    }
}
