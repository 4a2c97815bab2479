//! The model pair being synchronized and the per-rule execution context.

use blocksync_corr::CorrespondenceStore;
use blocksync_model::{
    ElementId, ElementKind, ElementRef, SourceModel, SourcePrimitive, TargetElement, TargetModel,
};
use tracing::warn;

use crate::aggregator::ResultAggregator;
use crate::decision::DecisionPort;
use crate::error::SyncError;
use crate::location::{Location, LocationScheme};
use crate::modification::ModificationRegistry;
use crate::primitives::tag_for;

/// A block-domain model, its component-domain counterpart, and the
/// correspondences between them.
#[derive(Debug, Clone)]
pub struct ModelPair {
    pub source: SourceModel,
    pub target: TargetModel,
    pub correspondences: CorrespondenceStore,
}

impl ModelPair {
    pub fn new(source: SourceModel) -> Self {
        Self {
            source,
            target: TargetModel::new(),
            correspondences: CorrespondenceStore::new(),
        }
    }
}

/// Everything a rule effect may read or write while handling one change.
///
/// A fresh context is created for every rule invocation; the results it
/// stages are merged into the dispatch total only if the rule succeeds.
pub struct ExecutionContext<'a> {
    pub source: &'a SourceModel,
    pub target: &'a mut TargetModel,
    pub correspondences: &'a mut CorrespondenceStore,
    pub decisions: &'a mut dyn DecisionPort,
    pub locations: &'a LocationScheme,
    pub modifications: &'a ModificationRegistry,
    results: ResultAggregator,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(
        pair: &'a mut ModelPair,
        decisions: &'a mut dyn DecisionPort,
        locations: &'a LocationScheme,
        modifications: &'a ModificationRegistry,
    ) -> Self {
        Self {
            source: &pair.source,
            target: &mut pair.target,
            correspondences: &mut pair.correspondences,
            decisions,
            locations,
            modifications,
            results: ResultAggregator::new(),
        }
    }

    /// Results staged so far.
    pub fn results(&self) -> &ResultAggregator {
        &self.results
    }

    pub fn results_mut(&mut self) -> &mut ResultAggregator {
        &mut self.results
    }

    pub fn into_results(self) -> ResultAggregator {
        self.results
    }

    /// Component a block maps to, if any.
    pub fn component_of(&self, block: ElementId) -> Option<ElementRef> {
        self.correspondences
            .first_of_kind(block, ElementKind::Component)
    }

    /// Target-side counterparts of a source element.
    pub fn counterparts(&self, element: ElementId) -> Vec<ElementRef> {
        self.correspondences
            .correspondences_of(element)
            .into_iter()
            .flat_map(|c| c.target.iter().copied())
            .collect()
    }

    /// Location of the persisted unit rooted at `root`, derived from its
    /// current name.
    pub fn unit_location(&self, root: ElementId) -> Option<Location> {
        match self.target.get(root)? {
            TargetElement::Component(c) => Some(self.locations.component_location(&c.name)),
            TargetElement::Repository(_) => Some(self.locations.primitive_repository_location()),
            _ => None,
        }
    }

    /// Location a unit had before it was relocated in this dispatch, or its
    /// current location if it was not relocated.
    pub fn original_location(&self, root: ElementId) -> Option<Location> {
        self.modifications
            .original_location(root)
            .or_else(|| self.unit_location(root))
    }

    /// Stage a save of the unit containing `element`.
    pub fn stage_unit_save(&mut self, element: ElementId) -> Result<(), SyncError> {
        let root = self
            .target
            .containing_root(element)
            .ok_or(SyncError::DanglingCorrespondence(element))?;
        let root_ref = self
            .target
            .element_ref(root)
            .ok_or(SyncError::DanglingCorrespondence(root))?;
        let location = self
            .unit_location(root)
            .ok_or_else(|| SyncError::StructuralViolation(format!("{root_ref} is not a unit root")))?;
        self.results.add_root_to_save(root_ref, location);
        Ok(())
    }

    /// Resolve a block-domain type reference to its component-domain type.
    ///
    /// Primitive types resolve through the primitive-type repository,
    /// blocks through their correspondence.
    pub fn resolve_type(&self, type_ref: Option<ElementRef>) -> Option<ElementRef> {
        let type_ref = type_ref?;
        match type_ref.kind {
            ElementKind::SourcePrimitive => {
                let primitive = self.source.primitive(type_ref.id)?;
                self.representative_for(primitive)
            }
            ElementKind::Block => self.component_of(type_ref.id),
            _ => None,
        }
    }

    fn representative_for(&self, primitive: SourcePrimitive) -> Option<ElementRef> {
        let Some(tag) = tag_for(primitive) else {
            warn!(%primitive, "primitive type has no component-domain representative");
            return None;
        };
        if self.correspondences.primitive_repository().is_none() {
            warn!(%primitive, "primitive-type repository not created yet");
            return None;
        }
        self.target.representative(tag)
    }
}
