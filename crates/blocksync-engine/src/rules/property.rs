//! Property mapping: plain properties become variables, part references
//! become constants.

use tracing::{debug, info};

use blocksync_model::{
    Change, ChangeKind, ComponentKind, ElementId, ElementKind, ElementRef, FeatureId, Property,
    SourceModel, Value,
};

use crate::context::ExecutionContext;
use crate::error::SyncError;
use crate::registry::TransformationRule;

use super::{attribute_replace, reference_replace};

/// Creates a variable when a plain property is first named.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyMapping;

impl TransformationRule for PropertyMapping {
    fn name(&self) -> &'static str {
        "property-mapping"
    }

    fn expected_kind(&self) -> ChangeKind {
        ChangeKind::AttributeReplace
    }

    fn precondition(&self, change: &Change, source: &SourceModel) -> bool {
        attribute_replace(change).is_some_and(|c| {
            c.feature == FeatureId::Name
                && c.old.is_none()
                && c.target.kind == ElementKind::Property
                && source
                    .property(c.target.id)
                    .is_some_and(|p| !p.is_part_reference())
        })
    }

    fn execute(&self, change: &Change, ctx: &mut ExecutionContext<'_>) -> Result<(), SyncError> {
        let Some(c) = attribute_replace(change) else {
            return Ok(());
        };
        let Some(property) = ctx.source.property(c.target.id).cloned() else {
            return Ok(());
        };
        if ctx.correspondences.is_linked(property.id) {
            debug!(property = %property.name, "property already mapped");
            return Ok(());
        }
        map_to_variable(ctx, c.target, &property)
    }
}

/// Add a variable for `property` to its block's component and link it.
fn map_to_variable(
    ctx: &mut ExecutionContext<'_>,
    source: ElementRef,
    property: &Property,
) -> Result<(), SyncError> {
    let Some(component) = ctx.component_of(property.owner) else {
        debug!(property = %property.name, "owning block has no component");
        return Ok(());
    };

    let type_ref = ctx.resolve_type(property.type_ref);
    let variable = ctx.target.add_variable(
        component.id,
        property.name.as_str(),
        true,
        !property.read_only,
        type_ref,
    )?;
    ctx.correspondences.link_one(source, variable)?;
    ctx.stage_unit_save(variable.id)?;
    info!(property = %property.name, "mapped property to variable");
    Ok(())
}

/// Remove every `kind` counterpart of `property` and its correspondence,
/// staging a save of each unit that lost an element. Returns how many
/// counterparts were found.
fn unmap(
    ctx: &mut ExecutionContext<'_>,
    property: ElementId,
    kind: ElementKind,
) -> Result<usize, SyncError> {
    let stale = ctx.correspondences.all_of_kind(property, kind);
    for element in &stale {
        if let Some(root) = ctx.target.containing_root(element.id) {
            ctx.target.remove(element.id)?;
            ctx.stage_unit_save(root)?;
        }
        ctx.correspondences.remove_involving([element.id]);
        debug!(%element, "unmapped property counterpart");
    }
    Ok(stale.len())
}

/// Mirrors a property's read-only flag on its variable.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyReadOnly;

impl TransformationRule for PropertyReadOnly {
    fn name(&self) -> &'static str {
        "property-read-only"
    }

    fn expected_kind(&self) -> ChangeKind {
        ChangeKind::AttributeReplace
    }

    fn precondition(&self, change: &Change, _source: &SourceModel) -> bool {
        attribute_replace(change).is_some_and(|c| {
            c.feature == FeatureId::IsReadOnly
                && c.target.kind == ElementKind::Property
                && c.new.as_ref().and_then(Value::as_bool).is_some()
        })
    }

    fn execute(&self, change: &Change, ctx: &mut ExecutionContext<'_>) -> Result<(), SyncError> {
        let Some(c) = attribute_replace(change) else {
            return Ok(());
        };
        let Some(read_only) = c.new.as_ref().and_then(Value::as_bool) else {
            return Ok(());
        };
        for variable in ctx
            .correspondences
            .all_of_kind(c.target.id, ElementKind::Variable)
        {
            ctx.target.set_access(variable.id, true, !read_only)?;
            ctx.stage_unit_save(variable.id)?;
        }
        Ok(())
    }
}

/// Creates a constant for a composite property typed by a mapped block.
///
/// The constant lives in the owning block's component and points at the
/// referenced block's component. Message-based components cannot be used
/// as parts, so references to them are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartReference;

impl TransformationRule for PartReference {
    fn name(&self) -> &'static str {
        "part-reference"
    }

    fn expected_kind(&self) -> ChangeKind {
        ChangeKind::ReferenceReplace
    }

    fn precondition(&self, change: &Change, source: &SourceModel) -> bool {
        reference_replace(change).is_some_and(|c| {
            c.feature == FeatureId::Type
                && c.target.kind == ElementKind::Property
                && c.new.is_some_and(|t| t.kind == ElementKind::Block)
                && source
                    .property(c.target.id)
                    .is_some_and(|p| p.is_part_reference())
        })
    }

    fn execute(&self, change: &Change, ctx: &mut ExecutionContext<'_>) -> Result<(), SyncError> {
        let Some(c) = reference_replace(change) else {
            return Ok(());
        };
        let Some(referenced_block) = c.new else {
            return Ok(());
        };
        let Some(property) = ctx.source.property(c.target.id).cloned() else {
            return Ok(());
        };

        // A part reference maps to at most one constant and never to a variable.
        unmap(ctx, property.id, ElementKind::Constant)?;
        unmap(ctx, property.id, ElementKind::Variable)?;

        let Some(owner) = ctx.component_of(property.owner) else {
            debug!(property = %property.name, "owning block has no component");
            return Ok(());
        };
        let Some(referenced) = ctx.component_of(referenced_block.id) else {
            debug!(property = %property.name, "referenced block has no component");
            return Ok(());
        };
        let referenced_kind = ctx
            .target
            .component(referenced.id)
            .ok_or(SyncError::DanglingCorrespondence(referenced.id))?
            .kind;
        if referenced_kind == ComponentKind::MessageContainer {
            info!(
                property = %property.name,
                "message-based components cannot be parts; part reference ignored"
            );
            return Ok(());
        }

        let constant =
            ctx.target
                .add_constant(owner.id, property.name.as_str(), referenced)?;
        ctx.correspondences.link_one(c.target, constant)?;
        ctx.stage_unit_save(constant.id)?;
        info!(property = %property.name, part = %referenced, "mapped part reference");
        Ok(())
    }
}

/// Turns a property back into a variable once a retype stops it being a
/// part reference.
///
/// The constant of the former part reference is removed and the property
/// is mapped the way a plain property is.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartReferenceRelease;

impl TransformationRule for PartReferenceRelease {
    fn name(&self) -> &'static str {
        "part-reference-release"
    }

    fn expected_kind(&self) -> ChangeKind {
        ChangeKind::ReferenceReplace
    }

    fn precondition(&self, change: &Change, source: &SourceModel) -> bool {
        reference_replace(change).is_some_and(|c| {
            c.feature == FeatureId::Type
                && c.target.kind == ElementKind::Property
                && source
                    .property(c.target.id)
                    .is_some_and(|p| !p.is_part_reference())
        })
    }

    fn execute(&self, change: &Change, ctx: &mut ExecutionContext<'_>) -> Result<(), SyncError> {
        let Some(c) = reference_replace(change) else {
            return Ok(());
        };
        let Some(property) = ctx.source.property(c.target.id).cloned() else {
            return Ok(());
        };
        if unmap(ctx, property.id, ElementKind::Constant)? == 0 {
            return Ok(());
        }
        info!(property = %property.name, "property is no longer a part reference");
        if ctx.correspondences.is_linked(property.id) {
            return Ok(());
        }
        map_to_variable(ctx, c.target, &property)
    }
}
