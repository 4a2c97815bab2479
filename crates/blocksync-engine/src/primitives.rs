//! The primitive-type bootstrap.
//!
//! The first time a source model attaches its primitive types, a shared
//! repository holding one representative per [`PrimitiveTag`] is created in
//! the target model and persisted at a fixed location. The marker recording
//! that it exists lives in the correspondence store of the model pair, so
//! separate pairs bootstrap independently.

use tracing::{debug, info};

use blocksync_model::{
    Change, ChangeKind, ElementRef, FeatureId, PrimitiveTag, SourceModel, SourcePrimitive,
};

use crate::context::ExecutionContext;
use crate::error::SyncError;
use crate::registry::TransformationRule;

/// Representative tag for a block-domain primitive type.
///
/// Strings have no component-domain counterpart.
pub fn tag_for(primitive: SourcePrimitive) -> Option<PrimitiveTag> {
    match primitive {
        SourcePrimitive::Boolean => Some(PrimitiveTag::Boolean),
        SourcePrimitive::Real => Some(PrimitiveTag::Continuous),
        SourcePrimitive::Integer => Some(PrimitiveTag::SignedDiscrete),
        SourcePrimitive::UnlimitedNatural => Some(PrimitiveTag::UnsignedDiscrete),
        SourcePrimitive::String => None,
    }
}

/// Create the repository unless the pair already has one. Returns the
/// repository either way.
pub fn ensure_repository(ctx: &mut ExecutionContext<'_>) -> ElementRef {
    if let Some(existing) = ctx.correspondences.primitive_repository() {
        debug!(repository = %existing, "primitive-type repository already present");
        return existing;
    }
    let repository = ctx
        .target
        .add_primitive_repository(ctx.locations.primitive_repository.as_str());
    ctx.correspondences.set_primitive_repository(repository);
    let location = ctx.locations.primitive_repository_location();
    info!(%repository, %location, "created primitive-type repository");
    ctx.results_mut().add_root_to_save(repository, location);
    repository
}

/// Bootstraps the repository when primitive types are imported.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimitiveBootstrap;

impl TransformationRule for PrimitiveBootstrap {
    fn name(&self) -> &'static str {
        "primitive-bootstrap"
    }

    fn expected_kind(&self) -> ChangeKind {
        ChangeKind::ReferenceInsert
    }

    fn precondition(&self, change: &Change, _source: &SourceModel) -> bool {
        change.feature() == Some(FeatureId::PrimitiveTypeImports)
    }

    fn execute(&self, _change: &Change, ctx: &mut ExecutionContext<'_>) -> Result<(), SyncError> {
        ensure_repository(ctx);
        Ok(())
    }
}
