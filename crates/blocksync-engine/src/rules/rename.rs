//! Name propagation and unit relocation.

use tracing::{debug, info};

use blocksync_model::{Change, ChangeKind, ElementRef, FeatureId, SourceModel, Value};

use crate::context::ExecutionContext;
use crate::error::SyncError;
use crate::registry::TransformationRule;

use super::attribute_replace;

/// Propagates a renamed block, port or property to its counterparts.
///
/// A counterpart that roots its own persisted unit is relocated: the unit
/// is saved at the location derived from the new name and the old location
/// is deleted. Other counterparts are renamed in place and their unit is
/// saved again. The initial name assignment (old value unset) is not a
/// rename.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rename;

impl TransformationRule for Rename {
    fn name(&self) -> &'static str {
        "rename"
    }

    fn expected_kind(&self) -> ChangeKind {
        ChangeKind::AttributeReplace
    }

    fn precondition(&self, change: &Change, _source: &SourceModel) -> bool {
        attribute_replace(change).is_some_and(|c| {
            c.feature == FeatureId::Name
                && c.target.kind.is_source()
                && c.old.is_some()
                && c.new.as_ref().and_then(Value::as_text).is_some()
        })
    }

    fn execute(&self, change: &Change, ctx: &mut ExecutionContext<'_>) -> Result<(), SyncError> {
        let Some(c) = attribute_replace(change) else {
            return Ok(());
        };
        let Some(new_name) = c.new.as_ref().and_then(Value::as_text) else {
            return Ok(());
        };

        let counterparts = ctx.counterparts(c.target.id);
        if counterparts.is_empty() {
            debug!(element = %c.target, "renamed element has no counterpart");
            return Ok(());
        }

        for counterpart in counterparts {
            if !ctx.target.contains(counterpart.id) {
                return Err(SyncError::DanglingCorrespondence(counterpart.id));
            }
            if ctx.target.is_root(counterpart.id) {
                relocate(ctx, counterpart, new_name)?;
            } else {
                ctx.target.set_name(counterpart.id, new_name)?;
                ctx.stage_unit_save(counterpart.id)?;
                debug!(element = %counterpart, name = new_name, "renamed counterpart");
            }
        }
        Ok(())
    }
}

fn relocate(
    ctx: &mut ExecutionContext<'_>,
    root: ElementRef,
    new_name: &str,
) -> Result<(), SyncError> {
    let unit_error = || SyncError::StructuralViolation(format!("{root} is not a persisted unit"));

    let old_location = ctx.unit_location(root.id).ok_or_else(unit_error)?;
    if !ctx.modifications.register(root.id, old_location.clone()) {
        debug!(%root, "unit already relocated in this change");
    }

    ctx.target.set_name(root.id, new_name)?;
    let new_location = ctx.unit_location(root.id).ok_or_else(unit_error)?;

    info!(%root, from = %old_location, to = %new_location, "relocating unit");
    let results = ctx.results_mut();
    results.add_root_to_save(root, new_location.clone());
    if old_location != new_location {
        results.add_location_to_delete_if_present(old_location);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::PersistStep;
    use crate::location::Location;
    use crate::rules::testing::Fixture;
    use blocksync_model::{ComponentKind, ElementKind, FlowDirection};

    #[test]
    fn renaming_component_relocates_unit() {
        let mut fx = Fixture::new();
        let block = fx.component("Sample", ComponentKind::MessageContainer);
        fx.editor
            .rename(&mut fx.pair.source, block, "Renamed")
            .unwrap();
        let results = fx.apply();

        let component = fx
            .pair
            .correspondences
            .first_of_kind(block, ElementKind::Component)
            .unwrap();
        assert_eq!(fx.pair.target.component(component.id).unwrap().name, "Renamed");
        assert_eq!(
            results.save_location(&component),
            Some(&Location::new("model/ASEM-Model-Renamed.asem"))
        );
        assert!(results.is_deleted(&Location::new("model/ASEM-Model-Sample.asem")));
    }

    #[test]
    fn repeated_rename_in_one_change_saves_final_location_only() {
        let mut fx = Fixture::new();
        let block = fx.component("A", ComponentKind::MessageContainer);
        let component = fx
            .pair
            .correspondences
            .first_of_kind(block, ElementKind::Component)
            .unwrap();

        fx.editor.rename(&mut fx.pair.source, block, "B").unwrap();
        fx.editor.rename(&mut fx.pair.source, block, "C").unwrap();
        let changes = fx.editor.take_changes();
        let batch = Change::compound(blocksync_model::CompoundKind::Plain, changes);
        let results = fx
            .engine
            .apply_change(&batch, &mut fx.pair, &mut fx.decisions)
            .unwrap();

        let plan = results.plan(|_| true);
        assert_eq!(
            plan,
            vec![
                PersistStep::Save(crate::aggregator::SaveIntent {
                    root: component,
                    location: Location::new("model/ASEM-Model-C.asem"),
                }),
                PersistStep::Delete(Location::new("model/ASEM-Model-A.asem")),
                PersistStep::Delete(Location::new("model/ASEM-Model-B.asem")),
            ]
        );
    }

    #[test]
    fn renaming_port_renames_message_in_place() {
        let mut fx = Fixture::new();
        let block = fx.component("Sample", ComponentKind::MessageContainer);
        let port = fx
            .editor
            .add_port(&mut fx.pair.source, block, "P1", FlowDirection::In, None)
            .unwrap();
        fx.apply();

        fx.editor.rename(&mut fx.pair.source, port, "P2").unwrap();
        let results = fx.apply();

        let message = fx
            .pair
            .correspondences
            .first_of_kind(port, ElementKind::Message)
            .unwrap();
        assert_eq!(fx.pair.target.message(message.id).unwrap().name, "P2");
        assert!(results.is_saved(&Location::new("model/ASEM-Model-Sample.asem")));
        assert_eq!(results.deletions().count(), 0);
    }

    #[test]
    fn renaming_unmapped_block_is_a_no_op() {
        let mut fx = Fixture::new();
        let block = fx.editor.create_block(&mut fx.pair.source, "Loose");
        fx.apply();
        fx.editor.rename(&mut fx.pair.source, block, "Still").unwrap();
        assert!(fx.apply().is_empty());
    }
}
