//! File-system persistence of staged results.
//!
//! Every staged save is written before any staged delete, so a relocated
//! unit always exists at its new location before its old file goes away.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use blocksync_engine::{Location, PersistStep, ResultAggregator};
use blocksync_model::TargetModel;
use tracing::{debug, warn};

/// What a persistence pass did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PersistReport {
    pub saved: Vec<Location>,
    pub deleted: Vec<Location>,
}

/// Writes units below a project directory.
pub struct FilePersistence {
    root: PathBuf,
}

impl FilePersistence {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// File of `location` below the project root. Locations that are
    /// absolute or climb out of the root are refused.
    pub fn path_of(&self, location: &Location) -> Result<PathBuf> {
        let relative = Path::new(location.as_str());
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        {
            bail!("location '{location}' is outside the project directory");
        }
        Ok(self.root.join(relative))
    }

    /// Carry out the staged intents against the current target model.
    pub fn persist(&self, results: &ResultAggregator, target: &TargetModel) -> Result<PersistReport> {
        let mut report = PersistReport::default();
        for step in results.plan(|root| target.contains(root.id)) {
            match step {
                PersistStep::Save(intent) => {
                    let Some(subtree) = target.subtree(intent.root.id) else {
                        warn!(root = %intent.root, "staged root vanished before saving");
                        continue;
                    };
                    let path = self.path_of(&intent.location)?;
                    if let Some(parent) = path.parent() {
                        fs::create_dir_all(parent)
                            .with_context(|| format!("creating {}", parent.display()))?;
                    }
                    let json = serde_json::to_string_pretty(&subtree)
                        .with_context(|| format!("serializing {}", intent.root))?;
                    fs::write(&path, json)
                        .with_context(|| format!("writing {}", path.display()))?;
                    debug!(location = %intent.location, elements = subtree.element_count(), "saved unit");
                    report.saved.push(intent.location);
                }
                PersistStep::Delete(location) => {
                    let path = self.path_of(&location)?;
                    if path.is_file() {
                        fs::remove_file(&path)
                            .with_context(|| format!("removing {}", path.display()))?;
                        debug!(%location, "deleted unit");
                        report.deleted.push(location);
                    }
                }
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocksync_model::{ComponentKind, Subtree};

    #[test]
    fn saves_then_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = FilePersistence::new(dir.path());
        let mut target = TargetModel::new();
        let component = target.add_component("New", ComponentKind::MessageContainer);
        target
            .add_message(component.id, "m", true, false, None)
            .unwrap();

        let old = Location::new("model/ASEM-Model-Old.asem");
        let new = Location::new("model/ASEM-Model-New.asem");
        fs::create_dir_all(dir.path().join("model")).unwrap();
        fs::write(persistence.path_of(&old).unwrap(), "{}").unwrap();

        let mut results = ResultAggregator::new();
        results.add_root_to_save(component, new.clone());
        results.add_location_to_delete_if_present(old.clone());
        let report = persistence.persist(&results, &target).unwrap();

        assert_eq!(report.saved, vec![new.clone()]);
        assert_eq!(report.deleted, vec![old.clone()]);
        assert!(!persistence.path_of(&old).unwrap().exists());

        let written = fs::read_to_string(persistence.path_of(&new).unwrap()).unwrap();
        let subtree: Subtree = serde_json::from_str(&written).unwrap();
        assert_eq!(subtree.element_count(), 2);
    }

    #[test]
    fn deleting_missing_location_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = FilePersistence::new(dir.path());
        let mut results = ResultAggregator::new();
        results.add_location_to_delete_if_present(Location::new("model/none.asem"));
        let report = persistence
            .persist(&results, &TargetModel::new())
            .unwrap();
        assert_eq!(report, PersistReport::default());
    }

    #[test]
    fn removed_roots_are_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = FilePersistence::new(dir.path());
        let mut target = TargetModel::new();
        let component = target.add_component("Gone", ComponentKind::MethodContainer);
        let mut results = ResultAggregator::new();
        results.add_root_to_save(component, Location::new("model/ASEM-Model-Gone.asem"));
        target.remove(component.id).unwrap();

        let report = persistence.persist(&results, &target).unwrap();
        assert!(report.saved.is_empty());
        assert!(!dir.path().join("model").exists());
    }

    #[test]
    fn locations_outside_the_project_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = FilePersistence::new(dir.path());
        assert!(persistence.path_of(&Location::new("../escape.asem")).is_err());
        assert!(persistence.path_of(&Location::new("model/../../x.asem")).is_err());
        assert!(persistence.path_of(&Location::new("/tmp/x.asem")).is_err());

        let mut results = ResultAggregator::new();
        results.add_location_to_delete_if_present(Location::new("../victim.asem"));
        let err = persistence
            .persist(&results, &TargetModel::new())
            .unwrap_err();
        assert!(err.to_string().contains("outside the project"));
    }
}
