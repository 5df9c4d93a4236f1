// Form Lifecycle Module - Declarative form state machine
//
// Drives load, edit, validate, save and delete for a form bound to a remote
// resource. The machine itself is synchronous; the runtime executes the
// injected services and feeds their results back in.

pub mod types;
pub mod errors;
pub mod context;
pub mod validation;
pub mod guards;
pub mod save_errors;
pub mod traits;
pub mod state_machine;
pub mod runtime;

#[cfg(test)]
pub mod mocks;

#[cfg(test)]
pub mod tests;

pub use types::{
    FieldDescriptor, FieldKind, FormData, FormEvent, FormPhase, FormSchema, ResourceSnapshot,
    SaveOutcome,
};
pub use errors::{FormError, ServiceError};
pub use context::{FormContext, FormSnapshot};
pub use validation::{FormValidator, SchemaValidator};
pub use guards::{DefaultGuards, FormGuards};
pub use save_errors::{FailureClass, FailureMapper, FailureMessages};
pub use traits::{FnServices, FormServices};
pub use state_machine::{FormMachine, FormOptions, Step};
pub use runtime::{FormHandle, FormRuntime, RuntimeOptions};
