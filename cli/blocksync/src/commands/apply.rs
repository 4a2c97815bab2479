//! `blocksync apply` — replay an edit script and keep the component model
//! in step.
//!
//! Each edit is dispatched as soon as it is made, so every rule sees the
//! block model as it was right after the change it reacts to. Staged results
//! are written to disk after each change. The model state is saved even
//! when an edit or a rule fails, so it matches the files already written.

use std::path::Path;

use anyhow::{Context, Result};
use blocksync_engine::{DecisionPort, Location, ScriptedDecisions, SyncEngine};
use blocksync_model::SourceEditor;
use tracing::{info, warn};

use crate::manifest::BlocksyncManifest;
use crate::persist::FilePersistence;
use crate::script::EditScript;
use crate::state::ProjectState;
use crate::terminal::TerminalDecisions;

/// What an `apply` run did.
#[derive(Debug, Default)]
pub(crate) struct ApplySummary {
    pub ops: usize,
    pub changes: usize,
    pub saved: Vec<Location>,
    pub deleted: Vec<Location>,
}

pub fn run(
    project_dir: &Path,
    manifest: &BlocksyncManifest,
    script_path: &Path,
    interactive: bool,
) -> Result<()> {
    let script = EditScript::load(script_path)?;
    let mut state = ProjectState::load(project_dir, manifest)?;

    let summary = match (&script.answers, interactive) {
        (Some(answers), false) => {
            let mut decisions = ScriptedDecisions::new(answers.iter().cloned());
            let summary = replay(project_dir, manifest, &mut state, &script, &mut decisions)?;
            if decisions.remaining() > 0 {
                warn!(unused = decisions.remaining(), "script has unused answers");
            }
            summary
        }
        _ => {
            let mut decisions = TerminalDecisions::stdio();
            replay(project_dir, manifest, &mut state, &script, &mut decisions)?
        }
    };

    println!(
        "Applied {} edit(s), {} change(s)",
        summary.ops, summary.changes
    );
    for location in &summary.saved {
        println!("  saved   {location}");
    }
    for location in &summary.deleted {
        println!("  deleted {location}");
    }
    Ok(())
}

/// Replay `script` against `state`, then save the state whatever happened.
pub(crate) fn replay(
    project_dir: &Path,
    manifest: &BlocksyncManifest,
    state: &mut ProjectState,
    script: &EditScript,
    decisions: &mut dyn DecisionPort,
) -> Result<ApplySummary> {
    let mut summary = ApplySummary::default();
    let outcome = replay_ops(project_dir, manifest, state, script, decisions, &mut summary);
    state.save().context("saving project state")?;
    outcome.map(|()| summary)
}

fn replay_ops(
    project_dir: &Path,
    manifest: &BlocksyncManifest,
    state: &mut ProjectState,
    script: &EditScript,
    decisions: &mut dyn DecisionPort,
    summary: &mut ApplySummary,
) -> Result<()> {
    let engine = SyncEngine::with_default_rules(manifest.layout.scheme());
    let persistence = FilePersistence::new(project_dir);
    let mut editor = SourceEditor::new();

    for (i, op) in script.ops.iter().enumerate() {
        op.apply(&mut editor, &mut state.pair.source)
            .with_context(|| format!("edit {}: {}", i + 1, op.describe()))?;
        summary.ops += 1;

        for change in editor.take_changes() {
            summary.changes += 1;
            match engine.apply_change(&change, &mut state.pair, decisions) {
                Ok(results) => {
                    let report = persistence.persist(&results, &state.pair.target)?;
                    summary.saved.extend(report.saved);
                    summary.deleted.extend(report.deleted);
                }
                Err(failure) => {
                    let report = persistence.persist(&failure.partial, &state.pair.target)?;
                    summary.saved.extend(report.saved);
                    summary.deleted.extend(report.deleted);
                    return Err(anyhow::Error::new(failure)
                        .context(format!("edit {}: {}", i + 1, op.describe())));
                }
            }
        }
        info!(edit = i + 1, op = %op.describe(), "edit applied");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use crate::commands::init::create_project;

    fn project(dir: &Path) -> (std::path::PathBuf, BlocksyncManifest) {
        let project_dir = dir.join("sample");
        create_project(&project_dir, "sample").unwrap();
        let (manifest, _) = BlocksyncManifest::find_and_load(&project_dir)
            .unwrap()
            .unwrap();
        (project_dir, manifest)
    }

    fn write_script(dir: &Path, json: &str) -> std::path::PathBuf {
        let path = dir.join("edits.json");
        fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn apply_writes_component_units() {
        let dir = tempfile::tempdir().unwrap();
        let (project_dir, manifest) = project(dir.path());
        let script = write_script(
            dir.path(),
            r#"{
                "ops": [
                    { "op": "import_primitives" },
                    { "op": "create_block", "name": "Pump" },
                    { "op": "set_encapsulated", "block": "Pump" },
                    { "op": "add_port", "block": "Pump", "name": "start", "direction": "In", "type": "Boolean" }
                ],
                "answers": [ { "choice": 0 } ]
            }"#,
        );

        run(&project_dir, &manifest, &script, false).unwrap();

        assert!(project_dir.join("model/ASEM-PrimitiveTypes.asem").is_file());
        let unit = fs::read_to_string(project_dir.join("model/ASEM-Model-Pump.asem")).unwrap();
        assert!(unit.contains("start"));

        let state = ProjectState::load(&project_dir, &manifest).unwrap();
        assert!(state.pair.source.block_by_name("Pump").is_some());
        assert!(state.pair.correspondences.len() >= 2);
    }

    #[test]
    fn rename_moves_the_unit_file() {
        let dir = tempfile::tempdir().unwrap();
        let (project_dir, manifest) = project(dir.path());
        let first = write_script(
            dir.path(),
            r#"{
                "ops": [
                    { "op": "create_block", "name": "Pump" },
                    { "op": "set_encapsulated", "block": "Pump" }
                ],
                "answers": [ { "choice": 1 } ]
            }"#,
        );
        run(&project_dir, &manifest, &first, false).unwrap();
        assert!(project_dir.join("model/ASEM-Model-Pump.asem").is_file());

        let second = write_script(
            dir.path(),
            r#"{ "ops": [ { "op": "rename", "element": "Pump", "name": "Valve" } ], "answers": [] }"#,
        );
        run(&project_dir, &manifest, &second, false).unwrap();

        assert!(!project_dir.join("model/ASEM-Model-Pump.asem").exists());
        assert!(project_dir.join("model/ASEM-Model-Valve.asem").is_file());
    }

    #[test]
    fn failed_edit_still_saves_state() {
        let dir = tempfile::tempdir().unwrap();
        let (project_dir, manifest) = project(dir.path());
        let script = EditScript::parse(
            r#"{
                "ops": [
                    { "op": "create_block", "name": "Pump" },
                    { "op": "delete", "element": "Missing" }
                ]
            }"#,
        )
        .unwrap();

        let mut state = ProjectState::load(&project_dir, &manifest).unwrap();
        let mut decisions = ScriptedDecisions::default();
        let err = replay(&project_dir, &manifest, &mut state, &script, &mut decisions)
            .unwrap_err();
        assert!(format!("{err:#}").contains("edit 2"));

        let reloaded = ProjectState::load(&project_dir, &manifest).unwrap();
        assert!(reloaded.pair.source.block_by_name("Pump").is_some());
    }

    #[test]
    fn missing_answer_reports_the_rule() {
        let dir = tempfile::tempdir().unwrap();
        let (project_dir, manifest) = project(dir.path());
        let script = EditScript::parse(
            r#"{
                "ops": [
                    { "op": "create_block", "name": "Pump" },
                    { "op": "set_encapsulated", "block": "Pump" }
                ]
            }"#,
        )
        .unwrap();

        let mut state = ProjectState::load(&project_dir, &manifest).unwrap();
        let mut decisions = ScriptedDecisions::default();
        let err = replay(&project_dir, &manifest, &mut state, &script, &mut decisions)
            .unwrap_err();
        assert!(format!("{err:#}").contains("create-component"));
        assert!(!project_dir.join("model/ASEM-Model-Pump.asem").exists());
    }
}
