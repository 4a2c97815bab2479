//! The result aggregator: staged persistence intents.
//!
//! Rules never write to storage. They stage "save this root at this
//! location" and "delete this location if present" intents, which are
//! merged across rules and handed to the persistence collaborator once per
//! top-level change.
//!
//! A root is persisted at exactly one location, so staging a second save
//! for the same root replaces the first. Renaming a unit twice within one
//! change therefore saves it once, at its final location, while every
//! location it left is staged for deletion.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use blocksync_model::ElementRef;

use crate::location::Location;

/// Save the persisted unit rooted at `root` to `location`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveIntent {
    pub root: ElementRef,
    pub location: Location,
}

/// One step of a persistence plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersistStep {
    Save(SaveIntent),
    Delete(Location),
}

/// Mergeable collection of persistence intents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultAggregator {
    to_persist: BTreeMap<ElementRef, Location>,
    to_delete: BTreeSet<Location>,
}

impl ResultAggregator {
    /// The empty aggregator, identity of [`merge`](Self::merge).
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a save of the unit rooted at `root`.
    pub fn add_root_to_save(&mut self, root: ElementRef, location: Location) {
        self.to_persist.insert(root, location);
    }

    /// Stage deletion of `location`; deleting a missing location is a no-op.
    pub fn add_location_to_delete_if_present(&mut self, location: Location) {
        self.to_delete.insert(location);
    }

    /// Fold `other` into `self`. Saves staged by `other` win for roots
    /// staged by both.
    pub fn merge(&mut self, other: ResultAggregator) {
        self.to_persist.extend(other.to_persist);
        self.to_delete.extend(other.to_delete);
    }

    pub fn saves(&self) -> impl Iterator<Item = SaveIntent> + '_ {
        self.to_persist.iter().map(|(root, location)| SaveIntent {
            root: *root,
            location: location.clone(),
        })
    }

    pub fn deletions(&self) -> impl Iterator<Item = &Location> {
        self.to_delete.iter()
    }

    /// Location at which `root` is staged to be saved.
    pub fn save_location(&self, root: &ElementRef) -> Option<&Location> {
        self.to_persist.get(root)
    }

    pub fn is_saved(&self, location: &Location) -> bool {
        self.to_persist.values().any(|l| l == location)
    }

    pub fn is_deleted(&self, location: &Location) -> bool {
        self.to_delete.contains(location)
    }

    pub fn is_empty(&self) -> bool {
        self.to_persist.is_empty() && self.to_delete.is_empty()
    }

    /// Steps for the persistence collaborator: every save, then every delete.
    ///
    /// Saves of roots for which `is_live` is false (deleted later in the same
    /// change) are dropped. A location that is still saved is never deleted.
    pub fn plan(&self, is_live: impl Fn(&ElementRef) -> bool) -> Vec<PersistStep> {
        let saves: Vec<SaveIntent> = self.saves().filter(|s| is_live(&s.root)).collect();
        let deletes: Vec<Location> = self
            .to_delete
            .iter()
            .filter(|l| !saves.iter().any(|s| &s.location == *l))
            .cloned()
            .collect();

        saves
            .into_iter()
            .map(PersistStep::Save)
            .chain(deletes.into_iter().map(PersistStep::Delete))
            .collect()
    }
}
