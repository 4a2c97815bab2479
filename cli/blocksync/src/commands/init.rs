//! `blocksync init` — project scaffolding.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::manifest::{BlocksyncManifest, LayoutConfig, ProjectConfig, MANIFEST_FILE};
use crate::state::ProjectState;

/// Create a new blocksync project in the directory `name`, relative to cwd.
pub fn run(name: &str) -> Result<()> {
    let project_dir = Path::new(name);
    create_project(project_dir, name)
}

pub(crate) fn create_project(project_dir: &Path, name: &str) -> Result<()> {
    if project_dir.exists() {
        bail!("directory '{}' already exists", project_dir.display());
    }

    let manifest = BlocksyncManifest {
        project: ProjectConfig {
            name: name.to_string(),
            description: None,
        },
        layout: LayoutConfig::default(),
    };

    fs::create_dir_all(project_dir.join(&manifest.layout.model_dir))
        .with_context(|| format!("creating {}/ directory", manifest.layout.model_dir))?;
    fs::write(
        project_dir.join(MANIFEST_FILE),
        BlocksyncManifest::template(name),
    )
    .with_context(|| format!("writing {MANIFEST_FILE}"))?;

    // Empty block model, empty component model, no correspondences.
    ProjectState::new(project_dir, &manifest)
        .save()
        .context("writing initial state")?;

    println!("Created project '{name}'");
    println!("  {name}/{MANIFEST_FILE}");
    println!("  {name}/{}/", manifest.layout.model_dir);
    println!("  {name}/{}/", manifest.layout.state_dir);

    Ok(())
}
