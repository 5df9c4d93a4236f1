use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Shared record of which forms hold unsaved edits.
///
/// Navigation code asks [`DirtyRegistry::has_any_dirty`] before leaving a
/// screen; each running form marks or clears its own owner id.
#[derive(Debug, Clone, Default)]
pub struct DirtyRegistry {
    owners: Arc<Mutex<BTreeSet<String>>>,
}

impl DirtyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_dirty(&self, owner: &str) {
        if self.lock().insert(owner.to_string()) {
            debug!(owner, "Form marked dirty");
        }
    }

    pub fn clear_dirty(&self, owner: &str) {
        if self.lock().remove(owner) {
            debug!(owner, "Form no longer dirty");
        }
    }

    pub fn is_dirty(&self, owner: &str) -> bool {
        self.lock().contains(owner)
    }

    pub fn has_any_dirty(&self) -> bool {
        !self.lock().is_empty()
    }

    pub fn dirty_owners(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }

    // A panic while holding the lock cannot leave the set half-updated.
    fn lock(&self) -> MutexGuard<'_, BTreeSet<String>> {
        self.owners.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
