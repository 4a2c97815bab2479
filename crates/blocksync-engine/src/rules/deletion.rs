//! Deletion of blocks and their members.

use std::collections::BTreeSet;

use tracing::{debug, info};

use blocksync_model::{Change, ChangeKind, ElementId, ElementKind, SourceModel};

use crate::context::ExecutionContext;
use crate::error::SyncError;
use crate::registry::TransformationRule;

use super::deleted_element;

/// Deletes the component of a deleted block and its persisted unit.
///
/// Constants in other components that pointed at the component are
/// removed and their units saved again. Correspondences of the block and
/// everything it owned are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteBlock;

impl TransformationRule for DeleteBlock {
    fn name(&self) -> &'static str {
        "delete-block"
    }

    fn expected_kind(&self) -> ChangeKind {
        ChangeKind::RemoveAndDelete
    }

    fn precondition(&self, change: &Change, _source: &SourceModel) -> bool {
        deleted_element(change).is_some_and(|(e, _)| e.kind == ElementKind::Block)
    }

    fn execute(&self, change: &Change, ctx: &mut ExecutionContext<'_>) -> Result<(), SyncError> {
        let Some((block, contents)) = deleted_element(change) else {
            return Ok(());
        };
        let involved: Vec<ElementId> = std::iter::once(block.id)
            .chain(contents.iter().map(|e| e.id))
            .collect();

        if let Some(component) = ctx.component_of(block.id) {
            if !ctx.target.contains(component.id) {
                return Err(SyncError::DanglingCorrespondence(component.id));
            }

            let mut locations = BTreeSet::new();
            locations.extend(ctx.original_location(component.id));
            locations.extend(ctx.unit_location(component.id));

            let mut touched = BTreeSet::new();
            for constant in ctx.target.constants_referencing(component.id) {
                let owner = ctx.target.constant(constant).map(|c| c.owner);
                ctx.target.remove(constant)?;
                ctx.correspondences.remove_involving([constant]);
                touched.extend(owner.filter(|o| *o != component.id));
            }

            let removed = ctx.target.remove(component.id)?;
            for owner in touched {
                ctx.stage_unit_save(owner)?;
            }
            for location in locations {
                ctx.results_mut().add_location_to_delete_if_present(location);
            }
            info!(%block, %component, removed, "deleted component");
        } else {
            debug!(%block, "deleted block has no component");
        }

        let dropped = ctx.correspondences.remove_involving(involved);
        debug!(%block, dropped, "dropped correspondences");
        Ok(())
    }
}

/// Removes the counterparts of a deleted port or property.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteMember;

impl TransformationRule for DeleteMember {
    fn name(&self) -> &'static str {
        "delete-member"
    }

    fn expected_kind(&self) -> ChangeKind {
        ChangeKind::RemoveAndDelete
    }

    fn precondition(&self, change: &Change, _source: &SourceModel) -> bool {
        deleted_element(change)
            .is_some_and(|(e, _)| matches!(e.kind, ElementKind::Port | ElementKind::Property))
    }

    fn execute(&self, change: &Change, ctx: &mut ExecutionContext<'_>) -> Result<(), SyncError> {
        let Some((member, _)) = deleted_element(change) else {
            return Ok(());
        };

        for counterpart in ctx.counterparts(member.id) {
            let Some(root) = ctx.target.containing_root(counterpart.id) else {
                debug!(%counterpart, "counterpart already gone");
                continue;
            };
            let method = match counterpart.kind {
                ElementKind::Parameter | ElementKind::ReturnValue => {
                    ctx.target.get(counterpart.id).and_then(|e| e.owner())
                }
                _ => None,
            };
            ctx.target.remove(counterpart.id)?;
            if let Some(method) = method {
                remove_if_empty(ctx, method)?;
            }
            ctx.stage_unit_save(root)?;
            debug!(%member, %counterpart, "removed counterpart");
        }
        ctx.correspondences.remove_involving([member.id]);
        Ok(())
    }
}

/// Remove `method` once it has neither parameters nor a return value.
fn remove_if_empty(ctx: &mut ExecutionContext<'_>, method: ElementId) -> Result<(), SyncError> {
    let empty = ctx
        .target
        .method(method)
        .is_some_and(|m| m.parameters.is_empty() && m.return_value.is_none());
    if empty {
        ctx.target.remove(method)?;
        ctx.correspondences.remove_involving([method]);
        debug!(%method, "removed empty method");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Location;
    use crate::rules::testing::Fixture;
    use blocksync_model::{AggregationKind, ComponentKind, FlowDirection};

    #[test]
    fn deleting_block_deletes_unit_and_links() {
        let mut fx = Fixture::new();
        let block = fx.component("Sample", ComponentKind::MessageContainer);
        let port = fx
            .editor
            .add_port(&mut fx.pair.source, block, "P1", FlowDirection::In, None)
            .unwrap();
        fx.apply();

        fx.editor.delete(&mut fx.pair.source, block).unwrap();
        let results = fx.apply();

        assert!(results.is_deleted(&Location::new("model/ASEM-Model-Sample.asem")));
        assert_eq!(fx.pair.target.element_count(), 0);
        assert!(!fx.pair.correspondences.is_linked(block));
        assert!(!fx.pair.correspondences.is_linked(port));
        assert!(fx.pair.correspondences.is_empty());
    }

    #[test]
    fn deleting_part_block_removes_referencing_constants() {
        let mut fx = Fixture::new();
        let whole = fx.component("Whole", ComponentKind::MethodContainer);
        let part = fx.component("Part", ComponentKind::MethodContainer);
        let property = fx
            .editor
            .add_property(
                &mut fx.pair.source,
                whole,
                "p",
                AggregationKind::Composite,
                false,
                Some(part),
            )
            .unwrap();
        fx.apply();

        fx.editor.delete(&mut fx.pair.source, part).unwrap();
        let results = fx.apply();

        assert!(fx
            .pair
            .correspondences
            .first_of_kind(property, ElementKind::Constant)
            .is_none());
        assert!(results.is_saved(&Location::new("model/ASEM-Model-Whole.asem")));
        assert!(results.is_deleted(&Location::new("model/ASEM-Model-Part.asem")));
        let whole_component = fx
            .pair
            .correspondences
            .first_of_kind(whole, ElementKind::Component)
            .unwrap();
        assert!(fx
            .pair
            .target
            .component(whole_component.id)
            .unwrap()
            .constants
            .is_empty());
    }

    #[test]
    fn deleting_port_removes_message() {
        let mut fx = Fixture::new();
        let block = fx.component("Sample", ComponentKind::MessageContainer);
        let port = fx
            .editor
            .add_port(&mut fx.pair.source, block, "P1", FlowDirection::Out, None)
            .unwrap();
        fx.apply();

        fx.editor.delete(&mut fx.pair.source, port).unwrap();
        let results = fx.apply();

        let component = fx
            .pair
            .correspondences
            .first_of_kind(block, ElementKind::Component)
            .unwrap();
        assert!(fx.pair.target.component(component.id).unwrap().messages.is_empty());
        assert!(!fx.pair.correspondences.is_linked(port));
        assert_eq!(
            results.save_location(&component),
            Some(&Location::new("model/ASEM-Model-Sample.asem"))
        );
        assert_eq!(results.deletions().count(), 0);
    }

    #[test]
    fn deleting_unmapped_block_is_quiet() {
        let mut fx = Fixture::new();
        let block = fx.editor.create_block(&mut fx.pair.source, "Loose");
        fx.apply();
        fx.editor.delete(&mut fx.pair.source, block).unwrap();
        assert!(fx.apply().is_empty());
    }

    #[test]
    fn deleting_last_port_of_method_removes_method() {
        let mut fx = Fixture::new();
        let block = fx.component("Ctrl", ComponentKind::MethodContainer);
        fx.answer(|d| d.text("setSpeed"));
        let port = fx
            .editor
            .add_port(&mut fx.pair.source, block, "speed", FlowDirection::In, None)
            .unwrap();
        fx.apply();
        let component = fx
            .pair
            .correspondences
            .first_of_kind(block, ElementKind::Component)
            .unwrap();
        assert_eq!(fx.pair.target.methods_of(component.id).len(), 1);

        fx.editor.delete(&mut fx.pair.source, port).unwrap();
        let results = fx.apply();

        assert!(fx.pair.target.methods_of(component.id).is_empty());
        assert!(results.is_saved(&Location::new("model/ASEM-Model-Ctrl.asem")));
    }

    #[test]
    fn method_with_remaining_slots_is_kept() {
        let mut fx = Fixture::new();
        let block = fx.component("Ctrl", ComponentKind::MethodContainer);
        fx.answer(|d| d.text("compute"));
        let input = fx
            .editor
            .add_port(&mut fx.pair.source, block, "input", FlowDirection::In, None)
            .unwrap();
        fx.apply();
        fx.answer(|d| d.choose(1).choose(0));
        fx.editor
            .add_port(&mut fx.pair.source, block, "result", FlowDirection::Out, None)
            .unwrap();
        fx.apply();

        fx.editor.delete(&mut fx.pair.source, input).unwrap();
        fx.apply();

        let component = fx
            .pair
            .correspondences
            .first_of_kind(block, ElementKind::Component)
            .unwrap();
        let methods = fx.pair.target.methods_of(component.id);
        assert_eq!(methods.len(), 1);
        assert!(methods[0].parameters.is_empty());
        assert!(methods[0].return_value.is_some());
    }
}
