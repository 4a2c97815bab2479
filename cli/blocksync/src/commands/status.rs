//! `blocksync status` — overview of both models.

use std::fmt::Write;
use std::path::Path;

use anyhow::Result;
use blocksync_model::ElementKind;

use crate::manifest::BlocksyncManifest;
use crate::state::ProjectState;

pub fn run(project_dir: &Path, manifest: &BlocksyncManifest) -> Result<()> {
    let state = ProjectState::load(project_dir, manifest)?;
    print!("{}", render(manifest, &state));
    Ok(())
}

pub(crate) fn render(manifest: &BlocksyncManifest, state: &ProjectState) -> String {
    let pair = &state.pair;
    let scheme = manifest.layout.scheme();
    let mut out = String::new();

    let _ = writeln!(out, "Project: {}", manifest.project.name);
    if let Some(description) = &manifest.project.description {
        let _ = writeln!(out, "  {description}");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Blocks:");
    let mut any_block = false;
    for block in pair.source.blocks() {
        any_block = true;
        let mapping = match pair
            .correspondences
            .first_of_kind(block.id, ElementKind::Component)
            .and_then(|c| pair.target.component(c.id))
        {
            Some(component) => format!(
                "-> {} ({})",
                scheme.component_location(&component.name),
                component.kind
            ),
            None if block.encapsulated => "-> (not mapped)".to_string(),
            None => "(not encapsulated)".to_string(),
        };
        let _ = writeln!(
            out,
            "  {:<20} {} port(s), {} property(ies) {mapping}",
            block.name,
            block.ports.len(),
            block.properties.len()
        );
    }
    if !any_block {
        let _ = writeln!(out, "  (none)");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Component model:");
    let _ = writeln!(out, "  Roots:           {}", pair.target.roots().count());
    let _ = writeln!(out, "  Elements:        {}", pair.target.element_count());
    let _ = writeln!(out, "  Correspondences: {}", pair.correspondences.len());
    let primitives = match pair.correspondences.primitive_repository() {
        Some(repo) if pair.target.contains(repo.id) => {
            scheme.primitive_repository_location().to_string()
        }
        _ => "not imported".to_string(),
    };
    let _ = writeln!(out, "  Primitive types: {primitives}");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocksync_model::{ComponentKind, ElementRef, SourceEditor};

    fn manifest() -> BlocksyncManifest {
        BlocksyncManifest::from_str(
            r#"
[project]
name = "plant"
description = "Pumping station"
"#,
        )
        .unwrap()
    }

    #[test]
    fn empty_project() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = manifest();
        let state = ProjectState::new(dir.path(), &manifest);
        let text = render(&manifest, &state);
        assert!(text.contains("Project: plant"));
        assert!(text.contains("Pumping station"));
        assert!(text.contains("(none)"));
        assert!(text.contains("Primitive types: not imported"));
    }

    #[test]
    fn shows_block_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = manifest();
        let mut state = ProjectState::new(dir.path(), &manifest);
        let mut editor = SourceEditor::new();
        let pump = editor.create_block(&mut state.pair.source, "Pump");
        editor.create_block(&mut state.pair.source, "Valve");
        let component = state
            .pair
            .target
            .add_component("Pump", ComponentKind::MethodContainer);
        state
            .pair
            .correspondences
            .link_one(ElementRef::new(pump, ElementKind::Block), component)
            .unwrap();

        let text = render(&manifest, &state);
        assert!(text.contains("model/ASEM-Model-Pump.asem (Method-based component)"));
        assert!(text.contains("(not encapsulated)"));
        assert!(text.contains("Correspondences: 1"));
    }
}
