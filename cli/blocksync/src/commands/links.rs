//! `blocksync links` — list correspondences.

use std::fmt::Write;
use std::path::Path;

use anyhow::Result;
use blocksync_engine::ModelPair;
use blocksync_model::ElementRef;

use crate::manifest::BlocksyncManifest;
use crate::state::ProjectState;

pub fn run(project_dir: &Path, manifest: &BlocksyncManifest) -> Result<()> {
    let state = ProjectState::load(project_dir, manifest)?;
    print!("{}", render(&state.pair));
    Ok(())
}

pub(crate) fn render(pair: &ModelPair) -> String {
    let mut out = String::new();
    if pair.correspondences.is_empty() {
        let _ = writeln!(out, "No correspondences.");
        return out;
    }
    for correspondence in pair.correspondences.iter() {
        let source: Vec<String> = correspondence
            .source
            .iter()
            .map(|r| describe(pair, r))
            .collect();
        let target: Vec<String> = correspondence
            .target
            .iter()
            .map(|r| describe(pair, r))
            .collect();
        let _ = writeln!(
            out,
            "#{:<4} {} <-> {}",
            correspondence.id,
            source.join(", "),
            target.join(", ")
        );
    }
    out
}

/// `Kind 'name'`, or the bare reference when the element no longer exists.
fn describe(pair: &ModelPair, element: &ElementRef) -> String {
    let name = if element.kind.is_source() {
        pair.source.get(element.id).map(|e| e.name().to_string())
    } else {
        pair.target.get(element.id).map(|e| e.name().to_string())
    };
    match name {
        Some(name) => format!("{} '{name}'", element.kind),
        None => format!("{element} (missing)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocksync_model::{ComponentKind, ElementId, ElementKind, SourceEditor, SourceModel};

    #[test]
    fn empty_store() {
        let pair = ModelPair::new(SourceModel::new("plant"));
        assert_eq!(render(&pair), "No correspondences.\n");
    }

    #[test]
    fn names_both_sides() {
        let mut pair = ModelPair::new(SourceModel::new("plant"));
        let mut editor = SourceEditor::new();
        let pump = editor.create_block(&mut pair.source, "Pump");
        let component = pair
            .target
            .add_component("Pump", ComponentKind::MessageContainer);
        pair.correspondences
            .link_one(ElementRef::new(pump, ElementKind::Block), component)
            .unwrap();
        pair.correspondences
            .link_one(
                ElementRef::new(ElementId::new(), ElementKind::Port),
                component,
            )
            .unwrap();

        let text = render(&pair);
        assert!(text.contains("Block 'Pump' <-> MessageComponent 'Pump'"));
        assert!(text.contains("(missing)"));
    }
}
