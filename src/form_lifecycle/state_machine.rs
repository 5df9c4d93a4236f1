use statig::prelude::*;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::form_lifecycle::context::{FormContext, FormSnapshot};
use crate::form_lifecycle::guards::{DefaultGuards, FormGuards};
use crate::form_lifecycle::save_errors::FailureMapper;
use crate::form_lifecycle::types::*;
use crate::form_lifecycle::validation::{FormValidator, SchemaValidator};

/// Construction options for a [`FormMachine`]
#[derive(Clone)]
pub struct FormOptions {
    pub form_id: String,
    pub validator: Arc<dyn FormValidator>,
    pub guards: Arc<dyn FormGuards>,
    pub failures: FailureMapper,
    /// Whether the resource offers the delete sub-flow at all
    pub delete_enabled: bool,
    pub history_capacity: usize,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            form_id: crate::telemetry::generate_correlation_id(),
            validator: Arc::new(SchemaValidator::new()),
            guards: Arc::new(DefaultGuards),
            failures: FailureMapper::default(),
            delete_enabled: false,
            history_capacity: 64,
        }
    }
}

impl FormOptions {
    pub fn with_form_id(mut self, form_id: impl Into<String>) -> Self {
        self.form_id = form_id.into();
        self
    }

    pub fn with_validator(mut self, validator: impl FormValidator + 'static) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    pub fn with_guards(mut self, guards: impl FormGuards + 'static) -> Self {
        self.guards = Arc::new(guards);
        self
    }

    pub fn with_failures(mut self, failures: FailureMapper) -> Self {
        self.failures = failures;
        self
    }

    pub fn with_delete(mut self, enabled: bool) -> Self {
        self.delete_enabled = enabled;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }
}

impl std::fmt::Debug for FormOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormOptions")
            .field("form_id", &self.form_id)
            .field("failures", &self.failures)
            .field("delete_enabled", &self.delete_enabled)
            .field("history_capacity", &self.history_capacity)
            .finish_non_exhaustive()
    }
}

/// State chart of a form bound to a remote resource.
///
/// Handlers mutate the form context directly and describe the calls the
/// driver has to start through [`Effects`]; they never await anything.
pub struct FormLifecycle {
    form_id: String,
    schema: Arc<FormSchema>,
    validator: Arc<dyn FormValidator>,
    guards: Arc<dyn FormGuards>,
    failures: FailureMapper,
    delete_enabled: bool,
    generation: u64,
    form: FormContext,
}

impl FormLifecycle {
    fn new(schema: FormSchema, options: &FormOptions) -> Self {
        Self {
            form_id: options.form_id.clone(),
            schema: Arc::new(schema),
            validator: Arc::clone(&options.validator),
            guards: Arc::clone(&options.guards),
            failures: options.failures.clone(),
            delete_enabled: options.delete_enabled,
            generation: 0,
            form: FormContext::default(),
        }
    }
}

#[state_machine(initial = "State::loading()", state(derive(Debug, Clone, PartialEq, Eq)))]
impl FormLifecycle {
    #[state]
    fn loading(&mut self, context: &mut Effects, event: &MachineEvent) -> Outcome<State> {
        match event {
            MachineEvent::LoadResolved { generation, result } => {
                self.note_resolution("load", *generation);
                match result {
                    Ok(snapshot) => {
                        self.set_data(snapshot);
                        Transition(State::loaded())
                    }
                    Err(error) => {
                        warn!(form_id = %self.form_id, error = %error, "Form load failed");
                        self.form.load_error = Some(self.failures.describe(error));
                        Transition(State::load_error())
                    }
                }
            }
            _ => self.ignore(context, event),
        }
    }

    #[state]
    fn load_error(&mut self, context: &mut Effects, event: &MachineEvent) -> Outcome<State> {
        match event {
            MachineEvent::View(FormEvent::Retry) => {
                self.form.load_error = None;
                context.invocation = Some(Invocation::Load {
                    generation: self.next_generation(),
                });
                Transition(State::loading())
            }
            _ => self.ignore(context, event),
        }
    }

    #[state]
    fn loaded(&mut self, context: &mut Effects, event: &MachineEvent) -> Outcome<State> {
        match event {
            MachineEvent::View(FormEvent::Update { field, value }) => {
                if !self.update_field(field, value) {
                    context.ignored = true;
                }
                Handled
            }
            MachineEvent::View(FormEvent::SetSelectedType { selected }) => {
                if !self.select_type(selected) {
                    context.ignored = true;
                }
                Handled
            }
            MachineEvent::View(FormEvent::Save) => {
                if self.can_save() {
                    self.form.save_error = None;
                    let generation = self.next_generation();
                    info!(form_id = %self.form_id, generation, "Submitting form");
                    context.invocation = Some(Invocation::Save {
                        generation,
                        form: Box::new(self.submission()),
                    });
                    Transition(State::saving())
                } else {
                    self.touch_all();
                    self.form.submit_attempted = true;
                    self.validate();
                    debug!(
                        form_id = %self.form_id,
                        errors = ?self.form.validation_errors,
                        "Save blocked by guard"
                    );
                    Handled
                }
            }
            MachineEvent::View(FormEvent::ShowDeleteModal) if self.delete_enabled => {
                self.form.delete_error = None;
                Transition(State::awaiting_delete_confirmation())
            }
            MachineEvent::View(FormEvent::ClearSaveError) => {
                self.form.clear_save_errors();
                self.form.skip_validation = true;
                self.validate();
                Handled
            }
            _ => self.ignore(context, event),
        }
    }

    #[state]
    fn saving(&mut self, context: &mut Effects, event: &MachineEvent) -> Outcome<State> {
        match event {
            MachineEvent::SaveResolved { generation, result } => {
                self.note_resolution("save", *generation);
                match result {
                    Ok(outcome) => {
                        self.accept_save(outcome);
                        context.notification = Some(Notification::Saved(self.form.data.clone()));
                        info!(form_id = %self.form_id, "Form saved");
                    }
                    Err(error) => {
                        let schema = Arc::clone(&self.schema);
                        let class = self.failures.apply_save_failure(&schema, &mut self.form, error);
                        warn!(
                            form_id = %self.form_id,
                            error = %error,
                            class = ?class,
                            "Form save failed"
                        );
                        self.validate();
                    }
                }
                Transition(State::loaded())
            }
            _ => self.ignore(context, event),
        }
    }

    #[state]
    fn awaiting_delete_confirmation(
        &mut self,
        context: &mut Effects,
        event: &MachineEvent,
    ) -> Outcome<State> {
        match event {
            MachineEvent::View(FormEvent::ConfirmDelete) if self.guards.can_delete(&self.form) => {
                context.invocation = Some(Invocation::Delete {
                    generation: self.next_generation(),
                });
                Transition(State::confirm_delete())
            }
            MachineEvent::View(FormEvent::CancelDelete) => Transition(State::loaded()),
            _ => self.ignore(context, event),
        }
    }

    #[state]
    fn confirm_delete(&mut self, context: &mut Effects, event: &MachineEvent) -> Outcome<State> {
        match event {
            MachineEvent::DeleteResolved { generation, result } => {
                self.note_resolution("delete", *generation);
                match result {
                    Ok(()) => {
                        context.notification = Some(Notification::Deleted);
                        info!(form_id = %self.form_id, "Resource deleted");
                        Transition(State::ended())
                    }
                    Err(error) => {
                        warn!(form_id = %self.form_id, error = %error, "Delete failed");
                        self.form.delete_error = Some(self.failures.describe(error));
                        Transition(State::loaded())
                    }
                }
            }
            _ => self.ignore(context, event),
        }
    }

    #[state]
    fn ended(&mut self, context: &mut Effects, event: &MachineEvent) -> Outcome<State> {
        self.ignore(context, event)
    }
}

impl FormLifecycle {
    fn ignore(&self, effects: &mut Effects, event: &MachineEvent) -> Outcome<State> {
        effects.ignored = true;
        debug!(form_id = %self.form_id, event = event.name(), "Event not handled in current state");
        Handled
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    // Stale resolutions are applied regardless; the mismatch is only reported.
    fn note_resolution(&self, kind: &str, generation: u64) {
        if generation != self.generation {
            warn!(
                form_id = %self.form_id,
                kind,
                generation,
                current = self.generation,
                "Applying resolution from an earlier invocation"
            );
        }
    }

    fn set_data(&mut self, snapshot: &ResourceSnapshot) {
        self.form = FormContext {
            data: snapshot.values.clone(),
            pristine_data: snapshot.values.clone(),
            available_types: snapshot.available_types.clone(),
            ..Default::default()
        };
        if let Some(selector) = self.schema.selector.clone() {
            self.form.seed(&selector, Value::Null);
        }
        self.seed_active_defaults();
        self.validate();
        info!(
            form_id = %self.form_id,
            fields = self.form.data.len(),
            "Form data loaded"
        );
    }

    fn seed_active_defaults(&mut self) {
        let schema = Arc::clone(&self.schema);
        for field in schema.active_fields(&self.form.data) {
            self.form.seed(&field.id, field.initial_value());
        }
    }

    fn update_field(&mut self, field: &str, value: &Value) -> bool {
        if self.schema.is_selector(field) {
            return match value.as_str() {
                Some(selected) => self.select_type(selected),
                None => false,
            };
        }

        let schema = Arc::clone(&self.schema);
        let active = schema.active_fields(&self.form.data);
        let Some(descriptor) = active.iter().find(|d| d.id == field) else {
            warn!(form_id = %self.form_id, field, "Update for a field outside the active set");
            return false;
        };
        if descriptor.read_only {
            warn!(form_id = %self.form_id, field, "Update for a read-only field");
            return false;
        }

        self.form.seed(field, descriptor.initial_value());
        self.form.data.insert(field.to_string(), value.clone());
        self.form.touch(field);
        self.validate();
        true
    }

    fn select_type(&mut self, selected: &str) -> bool {
        let Some(selector) = self.schema.selector.clone() else {
            warn!(form_id = %self.form_id, "Form has no sub-types to select");
            return false;
        };
        let offered = self.form.available_types.is_empty()
            || self.form.available_types.iter().any(|t| t == selected);
        if !self.schema.has_variant(selected) || !offered {
            warn!(form_id = %self.form_id, selected, "Unknown sub-type selected");
            return false;
        }

        self.form.seed(&selector, Value::Null);
        self.form
            .data
            .insert(selector.clone(), Value::String(selected.to_string()));
        self.form.touch(&selector);
        self.seed_active_defaults();
        self.validate();
        true
    }

    fn touch_all(&mut self) {
        let schema = Arc::clone(&self.schema);
        for field in schema.active_fields(&self.form.data) {
            self.form.touch(&field.id);
        }
        if let Some(selector) = &schema.selector {
            self.form.touch(selector);
        }
    }

    /// Recomputes the visible validation errors.
    ///
    /// Only fields that are both active and touched can appear; a pending
    /// skip request yields an empty set once.
    fn validate(&mut self) {
        let pruned = self.form.prune_stale_save_errors();
        if pruned > 0 {
            debug!(form_id = %self.form_id, pruned, "Superseded stale save errors");
        }

        if std::mem::take(&mut self.form.skip_validation) {
            self.form.validation_errors.clear();
            return;
        }

        let errors = self.validator.validate(&self.schema, &self.form.data);
        self.form.validation_errors = errors
            .into_iter()
            .filter(|(field, _)| self.form.is_touched(field))
            .collect();
    }

    fn accept_save(&mut self, outcome: &SaveOutcome) {
        if let Some(values) = &outcome.data {
            self.form.data = values.clone();
            self.seed_active_defaults();
        }
        self.form.pristine_data = self.form.data.clone();
        self.form.clear_save_errors();
        self.form.submit_attempted = false;
        self.validate();
    }

    /// Copy of the form handed to save: fields of sub-types other than the
    /// selected one are left out, values the schema does not describe are kept
    fn submission(&self) -> FormContext {
        let mut form = self.form.clone();
        let active: Vec<&str> = self
            .schema
            .active_fields(&self.form.data)
            .iter()
            .map(|field| field.id.as_str())
            .collect();
        form.data.retain(|id, _| {
            !self.schema.knows(id) || self.schema.is_selector(id) || active.contains(&id.as_str())
        });
        form
    }

    fn can_save(&self) -> bool {
        let errors = self.validator.validate(&self.schema, &self.form.data);
        self.guards.can_save(&self.schema, &self.form, &errors)
    }
}

/// Synchronous form machine: feed it events, collect the calls it requests.
///
/// The machine starts in `loading` with a load invocation already pending.
pub struct FormMachine {
    machine: StateMachine<FormLifecycle>,
    pending: Effects,
    history: VecDeque<TransitionRecord>,
    history_capacity: usize,
    processed: u64,
}

/// Outcome of handling a single event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub from: FormPhase,
    pub to: FormPhase,
    pub ignored: bool,
}

impl Step {
    pub fn transitioned(&self) -> bool {
        self.from != self.to
    }
}

impl FormMachine {
    pub fn new(schema: FormSchema, options: FormOptions) -> Self {
        let mut lifecycle = FormLifecycle::new(schema, &options);
        let pending = Effects {
            invocation: Some(Invocation::Load {
                generation: lifecycle.next_generation(),
            }),
            ..Default::default()
        };
        info!(form_id = %lifecycle.form_id, "Form machine created");

        Self {
            machine: lifecycle.state_machine(),
            pending,
            history: VecDeque::new(),
            history_capacity: options.history_capacity,
            processed: 0,
        }
    }

    pub fn form_id(&self) -> &str {
        &self.machine.inner().form_id
    }

    pub fn schema(&self) -> &FormSchema {
        &self.machine.inner().schema
    }

    pub fn context(&self) -> &FormContext {
        &self.machine.inner().form
    }

    pub fn phase(&self) -> FormPhase {
        match self.machine.state() {
            State::Loading { .. } => FormPhase::Loading,
            State::LoadError { .. } => FormPhase::LoadError,
            State::Loaded { .. } => FormPhase::Loaded,
            State::Saving { .. } => FormPhase::Saving,
            State::AwaitingDeleteConfirmation { .. } => FormPhase::AwaitingDeleteConfirmation,
            State::ConfirmDelete { .. } => FormPhase::ConfirmDelete,
            State::Ended { .. } => FormPhase::Ended,
        }
    }

    /// Guard value for SAVE as the view should render it
    pub fn can_save(&self) -> bool {
        self.phase() == FormPhase::Loaded && self.machine.inner().can_save()
    }

    /// Dispatches a view event
    pub fn send(&mut self, event: FormEvent) -> Step {
        self.handle(MachineEvent::View(event))
    }

    /// Runs one event to completion
    pub fn handle(&mut self, event: MachineEvent) -> Step {
        let from = self.phase();
        let mut effects = Effects::default();
        self.machine.handle_with_context(&event, &mut effects);
        let to = self.phase();

        if matches!(event, MachineEvent::View(_)) {
            self.processed += 1;
        }
        if let Some(invocation) = effects.invocation {
            self.pending.invocation = Some(invocation);
        }
        if let Some(notification) = effects.notification {
            self.pending.notification = Some(notification);
        }

        if from != to {
            info!(
                form_id = %self.form_id(),
                from = %from,
                to = %to,
                event = event.name(),
                "Form state transition"
            );
            self.record(from, to, event.name());
        }

        Step {
            from,
            to,
            ignored: effects.ignored,
        }
    }

    /// Call the driver has to start next, if any
    pub fn take_invocation(&mut self) -> Option<Invocation> {
        self.pending.invocation.take()
    }

    pub fn take_notification(&mut self) -> Option<Notification> {
        self.pending.notification.take()
    }

    pub fn history(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.history.iter()
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn snapshot(&self) -> FormSnapshot {
        let context = self.context();
        FormSnapshot {
            form_id: self.form_id().to_string(),
            phase: self.phase(),
            is_pristine: context.is_pristine(),
            can_save: self.can_save(),
            should_show_errors: context.should_show_errors(),
            live_save_errors: context.live_save_errors(),
            context: context.clone(),
            processed: self.processed,
        }
    }

    fn record(&mut self, from: FormPhase, to: FormPhase, event: &str) {
        if self.history_capacity == 0 {
            return;
        }
        if self.history.len() == self.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(TransitionRecord {
            from,
            to,
            event: event.to_string(),
            timestamp: chrono::Utc::now(),
        });
    }
}

impl std::fmt::Debug for FormMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormMachine")
            .field("form_id", &self.form_id())
            .field("phase", &self.phase())
            .field("processed", &self.processed)
            .finish_non_exhaustive()
    }
}
