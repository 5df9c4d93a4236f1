// Transition guards for SAVE and CONFIRM_DELETE

use crate::form_lifecycle::context::FormContext;
use crate::form_lifecycle::types::*;

/// Predicates gating the save and delete transitions
pub trait FormGuards: Send + Sync {
    /// `errors` is the full, unfiltered validation result for the current values
    fn can_save(&self, schema: &FormSchema, context: &FormContext, errors: &FieldErrors) -> bool;

    fn can_delete(&self, _context: &FormContext) -> bool {
        true
    }
}

/// Ordered save policy; the first matching rule decides.
///
/// 1. No active fields: allowed once a parent selection exists.
/// 2. No field can block submission: allowed when valid, even if pristine.
/// 3. Every blocking field already filled and valid: allowed, even if pristine.
/// 4. Otherwise: allowed when changed and valid.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultGuards;

impl FormGuards for DefaultGuards {
    fn can_save(&self, schema: &FormSchema, context: &FormContext, errors: &FieldErrors) -> bool {
        let active = schema.active_fields(&context.data);
        let is_valid = errors.is_empty();

        if active.is_empty() {
            return schema.has_parent_selection(&context.data);
        }

        let blocking: Vec<&FieldDescriptor> = active
            .iter()
            .copied()
            .filter(|field| field.blocks_submission())
            .collect();
        if blocking.is_empty() {
            return is_valid;
        }

        let prefilled = blocking
            .iter()
            .all(|field| !is_blank(context.data.get(&field.id)));
        if prefilled && is_valid {
            return true;
        }

        !context.is_pristine() && is_valid
    }
}
