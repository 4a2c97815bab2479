//! Registration of elements whose identity-derived key is changing.
//!
//! While a rule relocates a persisted unit, the unit's root is registered
//! together with the location it had before the change. Later rules in the
//! same dispatch see the registration and neither relocate the unit again
//! nor lose track of its original location. The registry is flushed at the
//! end of every top-level change by a [`ModificationScope`] guard.

use std::cell::RefCell;
use std::collections::BTreeMap;

use tracing::debug;

use blocksync_model::ElementId;

use crate::location::Location;

/// Elements currently under modification, with their original locations.
#[derive(Debug, Default)]
pub struct ModificationRegistry {
    entries: RefCell<BTreeMap<ElementId, Location>>,
}

impl ModificationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `element` as under modification. Returns `false` if it was
    /// already registered in this dispatch.
    pub fn register(&self, element: ElementId, original: Location) -> bool {
        let mut entries = self.entries.borrow_mut();
        if entries.contains_key(&element) {
            return false;
        }
        entries.insert(element, original);
        true
    }

    pub fn is_registered(&self, element: ElementId) -> bool {
        self.entries.borrow().contains_key(&element)
    }

    /// Location `element` had when it was registered.
    pub fn original_location(&self, element: ElementId) -> Option<Location> {
        self.entries.borrow().get(&element).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Forget every registration.
    pub fn flush(&self) {
        let mut entries = self.entries.borrow_mut();
        if !entries.is_empty() {
            debug!(count = entries.len(), "flushing modification registrations");
            entries.clear();
        }
    }

    /// Open a scope that flushes the registry when dropped.
    pub fn scope(&self) -> ModificationScope<'_> {
        ModificationScope { registry: self }
    }
}

/// Flushes its registry on drop, whether the dispatch succeeded, failed,
/// or unwound.
#[must_use = "the registry is flushed when the scope is dropped"]
pub struct ModificationScope<'a> {
    registry: &'a ModificationRegistry,
}

impl Drop for ModificationScope<'_> {
    fn drop(&mut self) {
        self.registry.flush();
    }
}
