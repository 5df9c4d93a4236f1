// Asynchronous driver: owns a FormMachine, runs its invocations on tokio and
// re-injects their resolutions as internal events.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn, Instrument};

use crate::dirty_registry::DirtyRegistry;
use crate::form_lifecycle::context::FormSnapshot;
use crate::form_lifecycle::errors::{FormError, ServiceError};
use crate::form_lifecycle::state_machine::FormMachine;
use crate::form_lifecycle::traits::FormServices;
use crate::form_lifecycle::types::*;
use crate::observability::FormMetrics;

/// Runtime wiring shared by the forms of one view
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub registry: Option<DirtyRegistry>,
    pub metrics: Arc<FormMetrics>,
    pub channel_capacity: usize,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            registry: None,
            metrics: Arc::new(FormMetrics::new()),
            channel_capacity: 64,
        }
    }
}

impl RuntimeOptions {
    pub fn with_registry(mut self, registry: DirtyRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<FormMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }
}

struct InFlight {
    invocation: Invocation,
    handle: JoinHandle<MachineEvent>,
}

/// Event loop of one form instance
pub struct FormRuntime {
    machine: FormMachine,
    services: Arc<dyn FormServices>,
    options: RuntimeOptions,
    events: mpsc::Receiver<FormEvent>,
    snapshots: watch::Sender<FormSnapshot>,
}

impl FormRuntime {
    /// Starts the machine on the current tokio runtime
    pub fn spawn(machine: FormMachine, services: Arc<dyn FormServices>) -> FormHandle {
        Self::spawn_with(machine, services, RuntimeOptions::default())
    }

    pub fn spawn_with(
        machine: FormMachine,
        services: Arc<dyn FormServices>,
        options: RuntimeOptions,
    ) -> FormHandle {
        let form_id = machine.form_id().to_string();
        let (events_tx, events_rx) = mpsc::channel(options.channel_capacity);
        let (snapshots_tx, snapshots_rx) = watch::channel(machine.snapshot());

        let span = crate::telemetry::create_form_span("form_runtime", &form_id, None);
        let runtime = Self {
            machine,
            services,
            options,
            events: events_rx,
            snapshots: snapshots_tx,
        };
        let task = tokio::spawn(runtime.run().instrument(span));

        FormHandle {
            form_id,
            events: events_tx,
            snapshots: snapshots_rx,
            sent: AtomicU64::new(0),
            task,
        }
    }

    async fn run(mut self) -> FormMachine {
        let mut in_flight: Option<InFlight> = None;
        info!(form_id = %self.machine.form_id(), "Form runtime started");

        loop {
            self.dispatch_notifications();
            if in_flight.is_none() {
                in_flight = self.start_invocation();
            }
            self.publish();

            if self.machine.phase().is_terminal() {
                break;
            }

            tokio::select! {
                Some(joined) = resolve(&mut in_flight) => {
                    let resolution = match (in_flight.take(), joined) {
                        (_, Ok(event)) => event,
                        (Some(flight), Err(e)) => flight.invocation.failed(join_failure(e)),
                        (None, Err(e)) => {
                            warn!(error = %e, "Invocation finished without a record");
                            continue;
                        }
                    };
                    self.record_resolution(&resolution);
                    self.step(resolution);
                }
                received = self.events.recv() => match received {
                    Some(event) => self.step(MachineEvent::View(event)),
                    None => {
                        debug!(form_id = %self.machine.form_id(), "All handles dropped");
                        break;
                    }
                },
            }
        }

        if let Some(flight) = in_flight.take() {
            debug!(kind = flight.invocation.kind(), "Abandoning in-flight invocation");
            flight.handle.abort();
        }
        if let Some(registry) = &self.options.registry {
            registry.clear_dirty(self.machine.form_id());
        }
        info!(
            form_id = %self.machine.form_id(),
            phase = %self.machine.phase(),
            "Form runtime stopped"
        );
        self.machine
    }

    fn step(&mut self, event: MachineEvent) {
        let step = self.machine.handle(event);
        if step.ignored {
            self.options.metrics.record_ignored();
        }
        if step.transitioned() {
            self.options.metrics.record_transition();
        }
        self.sync_registry();
    }

    fn start_invocation(&mut self) -> Option<InFlight> {
        let invocation = self.machine.take_invocation()?;
        let services = Arc::clone(&self.services);
        let metrics = &self.options.metrics;
        debug!(
            form_id = %self.machine.form_id(),
            kind = invocation.kind(),
            generation = invocation.generation(),
            "Starting invocation"
        );

        let handle = match &invocation {
            Invocation::Load { generation } => {
                metrics.record_load();
                let generation = *generation;
                tokio::spawn(async move {
                    MachineEvent::LoadResolved {
                        generation,
                        result: services.load().await,
                    }
                })
            }
            Invocation::Save { generation, form } => {
                metrics.record_save();
                let generation = *generation;
                let form = form.as_ref().clone();
                tokio::spawn(async move {
                    MachineEvent::SaveResolved {
                        generation,
                        result: services.save(&form).await,
                    }
                })
            }
            Invocation::Delete { generation } => {
                metrics.record_delete();
                let generation = *generation;
                tokio::spawn(async move {
                    MachineEvent::DeleteResolved {
                        generation,
                        result: services.delete().await,
                    }
                })
            }
        };

        Some(InFlight { invocation, handle })
    }

    fn record_resolution(&self, event: &MachineEvent) {
        let failed = matches!(
            event,
            MachineEvent::LoadResolved { result: Err(_), .. }
                | MachineEvent::SaveResolved { result: Err(_), .. }
                | MachineEvent::DeleteResolved { result: Err(_), .. }
        );
        if failed {
            self.options.metrics.record_failure();
        }
    }

    fn dispatch_notifications(&mut self) {
        match self.machine.take_notification() {
            Some(Notification::Saved(data)) => self.services.on_save_success(&data),
            Some(Notification::Deleted) => self.services.on_delete_success(),
            None => {}
        }
    }

    fn sync_registry(&self) {
        let Some(registry) = &self.options.registry else {
            return;
        };
        let form_id = self.machine.form_id();
        let dirty = !self.machine.phase().is_terminal()
            && self.machine.phase() != FormPhase::Loading
            && !self.machine.context().is_pristine();
        if dirty {
            registry.mark_dirty(form_id);
        } else {
            registry.clear_dirty(form_id);
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.machine.snapshot());
    }
}

async fn resolve(in_flight: &mut Option<InFlight>) -> Option<Result<MachineEvent, JoinError>> {
    match in_flight {
        Some(flight) => Some((&mut flight.handle).await),
        None => std::future::pending().await,
    }
}

fn join_failure(error: JoinError) -> ServiceError {
    warn!(error = %error, "Invocation task did not complete");
    ServiceError::transport(format!("invocation aborted: {error}"))
}

/// View-side handle: the only way to reach a running form
pub struct FormHandle {
    form_id: String,
    events: mpsc::Sender<FormEvent>,
    snapshots: watch::Receiver<FormSnapshot>,
    sent: AtomicU64,
    task: JoinHandle<FormMachine>,
}

impl FormHandle {
    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    /// Queues an event; events are applied strictly in send order
    pub async fn send(&self, event: FormEvent) -> Result<(), FormError> {
        self.events.send(event).await.map_err(|_| FormError::Closed {
            form_id: self.form_id.clone(),
        })?;
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> FormSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FormSnapshot> {
        self.snapshots.clone()
    }

    /// Waits until a snapshot satisfies `predicate`
    pub async fn wait_for(
        &mut self,
        mut predicate: impl FnMut(&FormSnapshot) -> bool,
    ) -> Result<FormSnapshot, FormError> {
        let form_id = self.form_id.clone();
        self.snapshots
            .wait_for(|snapshot| predicate(snapshot))
            .await
            .map(|snapshot| snapshot.clone())
            .map_err(|_| FormError::Closed { form_id })
    }

    /// Waits until every sent event is applied and no call is in flight
    pub async fn settled(&mut self) -> Result<FormSnapshot, FormError> {
        let sent = self.sent.load(Ordering::SeqCst);
        self.wait_for(|snapshot| snapshot.processed >= sent && snapshot.is_settled())
            .await
    }

    /// Stops the runtime and returns the machine in its final state
    pub async fn close(self) -> Result<FormMachine, FormError> {
        drop(self.events);
        Ok(self.task.await?)
    }
}

impl std::fmt::Debug for FormHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormHandle")
            .field("form_id", &self.form_id)
            .field("sent", &self.sent.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
