//! On-disk state of a project: both models and their correspondences.
//!
//! The models are stored as JSON in the state directory. Correspondences
//! use the checksummed correspondence file format.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blocksync_corr::{CorrespondenceFile, CorrespondenceStore};
use blocksync_engine::ModelPair;
use blocksync_model::{SourceModel, TargetModel};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::manifest::BlocksyncManifest;

const SOURCE_FILE: &str = "source.json";
const TARGET_FILE: &str = "target.json";

/// A loaded model pair and where it is stored.
pub struct ProjectState {
    pub pair: ModelPair,
    state_dir: PathBuf,
    correspondence_path: PathBuf,
}

impl ProjectState {
    /// A fresh, empty state for `manifest`'s project.
    pub fn new(project_dir: &Path, manifest: &BlocksyncManifest) -> Self {
        Self {
            pair: ModelPair::new(SourceModel::new(manifest.project.name.as_str())),
            state_dir: manifest.layout.state_dir(project_dir),
            correspondence_path: manifest.layout.correspondence_path(project_dir),
        }
    }

    /// Load the stored state, or a fresh one if nothing was stored yet.
    pub fn load(project_dir: &Path, manifest: &BlocksyncManifest) -> Result<Self> {
        let mut state = Self::new(project_dir, manifest);
        let source_path = state.state_dir.join(SOURCE_FILE);
        if !source_path.is_file() {
            return Ok(state);
        }

        let source: SourceModel = read_json(&source_path)?;
        let target: TargetModel = read_json(&state.state_dir.join(TARGET_FILE))?;
        let correspondences = if state.correspondence_path.is_file() {
            let data = fs::read(&state.correspondence_path)
                .with_context(|| format!("reading {}", state.correspondence_path.display()))?;
            CorrespondenceFile::from_bytes(&data)
                .with_context(|| {
                    format!("invalid correspondence file {}", state.correspondence_path.display())
                })?
                .store
        } else {
            CorrespondenceStore::new()
        };

        state.pair = ModelPair {
            source,
            target,
            correspondences,
        };
        Ok(state)
    }

    /// Write both models and the correspondences.
    pub fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.state_dir)
            .with_context(|| format!("creating {}", self.state_dir.display()))?;
        write_json(&self.state_dir.join(SOURCE_FILE), &self.pair.source)?;
        write_json(&self.state_dir.join(TARGET_FILE), &self.pair.target)?;

        if let Some(parent) = self.correspondence_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let bytes = CorrespondenceFile::new(self.pair.correspondences.clone())
            .to_bytes()
            .context("serializing correspondences")?;
        fs::write(&self.correspondence_path, bytes)
            .with_context(|| format!("writing {}", self.correspondence_path.display()))?;
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("serializing {}", path.display()))?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocksync_model::{ComponentKind, ElementKind, ElementRef, SourceEditor};

    fn manifest() -> BlocksyncManifest {
        BlocksyncManifest::from_str(&BlocksyncManifest::template("demo")).unwrap()
    }

    #[test]
    fn missing_state_loads_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let state = ProjectState::load(dir.path(), &manifest()).unwrap();
        assert_eq!(state.pair.source.name(), "demo");
        assert_eq!(state.pair.target.element_count(), 0);
    }

    #[test]
    fn save_then_load_keeps_everything() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = manifest();
        let mut state = ProjectState::new(dir.path(), &manifest);

        let mut editor = SourceEditor::new();
        let block = editor.create_block(&mut state.pair.source, "Pump");
        let component = state
            .pair
            .target
            .add_component("Pump", ComponentKind::MessageContainer);
        state
            .pair
            .correspondences
            .link_one(ElementRef::new(block, ElementKind::Block), component)
            .unwrap();
        let repo = state.pair.target.add_primitive_repository("Prims");
        state.pair.correspondences.set_primitive_repository(repo);
        state.save().unwrap();

        let loaded = ProjectState::load(dir.path(), &manifest).unwrap();
        assert_eq!(loaded.pair.source.block_by_name("Pump").unwrap().id, block);
        assert!(loaded.pair.target.contains(component.id));
        assert_eq!(
            loaded
                .pair
                .correspondences
                .first_of_kind(block, ElementKind::Component),
            Some(component)
        );
        assert_eq!(loaded.pair.correspondences.primitive_repository(), Some(repo));
    }

    #[test]
    fn corrupt_correspondence_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = manifest();
        ProjectState::new(dir.path(), &manifest).save().unwrap();
        fs::write(manifest.layout.correspondence_path(dir.path()), b"garbage").unwrap();

        let err = ProjectState::load(dir.path(), &manifest).err().unwrap();
        assert!(format!("{err:#}").contains("invalid correspondence file"));
    }
}
