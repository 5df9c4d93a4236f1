// Form Lifecycle Library - declarative form state machine
// This exposes the core components for embedding and testing

pub mod form_lifecycle;
pub mod dirty_registry;
pub mod telemetry;
pub mod observability;
pub mod config;
pub mod fs;
pub mod cli;

// Re-export key types for easy access
pub use form_lifecycle::{
    DefaultGuards, FailureMapper, FieldDescriptor, FieldKind, FnServices, FormContext, FormError,
    FormEvent, FormGuards, FormHandle, FormMachine, FormOptions, FormPhase, FormRuntime,
    FormSchema, FormServices, FormSnapshot, FormValidator, ResourceSnapshot, RuntimeOptions,
    SaveOutcome, SchemaValidator, ServiceError,
};
pub use dirty_registry::DirtyRegistry;
pub use telemetry::{init_telemetry, shutdown_telemetry, generate_correlation_id, create_form_span};
pub use observability::{FormMetrics, FormStats, form_metrics, OperationTimer};
pub use config::{FormSettings, settings, init_settings};
pub use fs::{JsonFileServices, ResourceFileSystem, StandardFileSystem};
