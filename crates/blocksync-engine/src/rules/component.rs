//! Block to component mapping.

use tracing::{debug, info};

use blocksync_model::{
    Change, ChangeKind, ComponentKind, ElementKind, FeatureId, SourceModel, Value,
};

use crate::context::ExecutionContext;
use crate::error::{DecisionError, SyncError};
use crate::registry::TransformationRule;

use super::attribute_replace;

/// Creates a component when a block becomes encapsulated.
///
/// The user picks the component kind. The component takes the block's name
/// and is persisted at the location derived from it.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateComponent;

impl TransformationRule for CreateComponent {
    fn name(&self) -> &'static str {
        "create-component"
    }

    fn expected_kind(&self) -> ChangeKind {
        ChangeKind::AttributeReplace
    }

    fn precondition(&self, change: &Change, source: &SourceModel) -> bool {
        attribute_replace(change).is_some_and(|c| {
            c.feature == FeatureId::IsEncapsulated
                && c.target.kind == ElementKind::Block
                && c.new == Some(Value::Bool(true))
                && source.block(c.target.id).is_some()
        })
    }

    fn execute(&self, change: &Change, ctx: &mut ExecutionContext<'_>) -> Result<(), SyncError> {
        let Some(c) = attribute_replace(change) else {
            return Ok(());
        };
        if let Some(existing) = ctx.component_of(c.target.id) {
            debug!(block = %c.target, component = %existing, "block already mapped");
            return Ok(());
        }
        let Some(block) = ctx.source.block(c.target.id) else {
            return Ok(());
        };
        let name = block.name.clone();

        let options: Vec<String> = ComponentKind::ALL
            .iter()
            .map(|k| k.label().to_string())
            .collect();
        let index = ctx.decisions.select_one(
            &format!("Select the kind of component to create for block '{name}'"),
            &options,
        )?;
        let kind = ComponentKind::ALL
            .get(index)
            .copied()
            .ok_or(DecisionError::OutOfRange {
                index,
                options: options.len(),
            })?;

        let component = ctx.target.add_component(name.as_str(), kind);
        ctx.correspondences.link_one(c.target, component)?;
        let location = ctx.locations.component_location(&name);
        info!(block = %name, %kind, %location, "created component");
        ctx.results_mut().add_root_to_save(component, location);
        Ok(())
    }
}
