//! `blocksync.toml` manifest parsing and project layout.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blocksync_engine::LocationScheme;
use serde::{Deserialize, Serialize};

/// Name of the manifest file at the project root.
pub const MANIFEST_FILE: &str = "blocksync.toml";

/// The top-level manifest structure for a blocksync project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlocksyncManifest {
    /// Project metadata (required).
    pub project: ProjectConfig,
    /// Where models, units and state live. Every field has a default.
    #[serde(default)]
    pub layout: LayoutConfig,
}

/// Project metadata section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name, also the name of the block model.
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Layout section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Directory of persisted component units, relative to the project.
    pub model_dir: String,
    /// Extension of persisted units.
    pub extension: String,
    /// Prefix of component unit names.
    pub component_prefix: String,
    /// Logical name of the primitive-type repository unit.
    pub primitive_repository: String,
    /// Correspondence file, relative to the project.
    pub correspondence_file: String,
    /// Directory holding the serialized models.
    pub state_dir: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let scheme = LocationScheme::default();
        Self {
            model_dir: scheme.model_dir,
            extension: scheme.extension,
            component_prefix: scheme.component_prefix,
            primitive_repository: scheme.primitive_repository,
            correspondence_file: "state/correspondences.bsc".into(),
            state_dir: "state".into(),
        }
    }
}

impl LayoutConfig {
    /// Location derivation for the engine.
    pub fn scheme(&self) -> LocationScheme {
        LocationScheme {
            model_dir: self.model_dir.clone(),
            extension: self.extension.clone(),
            component_prefix: self.component_prefix.clone(),
            primitive_repository: self.primitive_repository.clone(),
        }
    }

    pub fn state_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.state_dir)
    }

    pub fn correspondence_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.correspondence_file)
    }
}

impl BlocksyncManifest {
    /// Search upward from `start_dir` for a manifest, parse and return it
    /// along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let manifest: BlocksyncManifest = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Parse a manifest from a TOML string.
    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing blocksync.toml")
    }

    /// Generate the default template for `blocksync init`.
    pub fn template(name: &str) -> String {
        let layout = LayoutConfig::default();
        format!(
            r#"[project]
name = "{name}"

[layout]
model_dir = "{}"
extension = "{}"
component_prefix = "{}"
primitive_repository = "{}"
correspondence_file = "{}"
state_dir = "{}"
"#,
            layout.model_dir,
            layout.extension,
            layout.component_prefix,
            layout.primitive_repository,
            layout.correspondence_file,
            layout.state_dir,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_manifest_uses_default_layout() {
        let manifest = BlocksyncManifest::from_str("[project]\nname = \"demo\"\n").unwrap();
        assert_eq!(manifest.project.name, "demo");
        assert_eq!(manifest.layout, LayoutConfig::default());
        assert_eq!(manifest.layout.scheme(), LocationScheme::default());
    }

    #[test]
    fn partial_layout_keeps_other_defaults() {
        let manifest = BlocksyncManifest::from_str(
            r#"
[project]
name = "demo"

[layout]
model_dir = "units"
extension = "json"
"#,
        )
        .unwrap();
        let scheme = manifest.layout.scheme();
        assert_eq!(
            scheme.component_location("Pump").as_str(),
            "units/ASEM-Model-Pump.json"
        );
        assert_eq!(manifest.layout.state_dir, "state");
    }

    #[test]
    fn missing_project_is_an_error() {
        assert!(BlocksyncManifest::from_str("[layout]\nmodel_dir = \"x\"\n").is_err());
    }

    #[test]
    fn template_round_trips() {
        let manifest = BlocksyncManifest::from_str(&BlocksyncManifest::template("demo")).unwrap();
        assert_eq!(manifest.project.name, "demo");
        assert_eq!(manifest.layout, LayoutConfig::default());
    }

    #[test]
    fn find_and_load_searches_parents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(MANIFEST_FILE),
            BlocksyncManifest::template("up"),
        )
        .unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let (manifest, found) = BlocksyncManifest::find_and_load(&nested).unwrap().unwrap();
        assert_eq!(manifest.project.name, "up");
        assert_eq!(found, dir.path());
    }
}
