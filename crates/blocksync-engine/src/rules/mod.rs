//! The block/component transformation rule set.
//!
//! | Rule | Reacts to |
//! |---|---|
//! | [`PrimitiveBootstrap`] | primitive types attached to a source model |
//! | [`CreateComponent`] | a block switched to encapsulated |
//! | [`Rename`] | a name replaced on a mapped element |
//! | [`PortMapping`] | a port created on a mapped block |
//! | [`PortRetype`] | a port or plain property retyped |
//! | [`PortDirection`] | a port's flow direction changed |
//! | [`PropertyMapping`] | a plain property named for the first time |
//! | [`PropertyReadOnly`] | a property's read-only flag changed |
//! | [`PartReference`] | a composite property typed by a block |
//! | [`PartReferenceRelease`] | a part reference retyped into a plain property |
//! | [`DeleteBlock`] | a block removed and deleted |
//! | [`DeleteMember`] | a port or property removed and deleted |

mod component;
mod deletion;
mod port;
mod property;
mod rename;

pub use component::CreateComponent;
pub use deletion::{DeleteBlock, DeleteMember};
pub use port::{access_for, PortDirection, PortMapping, PortRetype, UNNAMED_METHOD};
pub use property::{PartReference, PartReferenceRelease, PropertyMapping, PropertyReadOnly};
pub use rename::Rename;

pub use crate::primitives::PrimitiveBootstrap;

use blocksync_model::{AttributeReplace, Change, CompoundKind, ElementRef, ReferenceReplace};

use crate::registry::TransformationRule;

/// Every rule, in registration order.
pub fn default_rules() -> Vec<Box<dyn TransformationRule>> {
    vec![
        Box::new(PrimitiveBootstrap),
        Box::new(CreateComponent),
        Box::new(Rename),
        Box::new(PortMapping),
        Box::new(PortRetype),
        Box::new(PortDirection),
        Box::new(PropertyMapping),
        Box::new(PropertyReadOnly),
        Box::new(PartReference),
        Box::new(PartReferenceRelease),
        Box::new(DeleteBlock),
        Box::new(DeleteMember),
    ]
}

fn attribute_replace(change: &Change) -> Option<&AttributeReplace> {
    match change {
        Change::AttributeReplace(c) => Some(c),
        _ => None,
    }
}

fn reference_replace(change: &Change) -> Option<&ReferenceReplace> {
    match change {
        Change::ReferenceReplace(c) => Some(c),
        _ => None,
    }
}

/// Element created by a `CreateAndInsert` compound.
fn created_element(change: &Change) -> Option<ElementRef> {
    match change {
        Change::Compound(c) => match &c.kind {
            CompoundKind::CreateAndInsert { element } => Some(*element),
            _ => None,
        },
        _ => None,
    }
}

/// Element and contents deleted by a `RemoveAndDelete` compound.
fn deleted_element(change: &Change) -> Option<(ElementRef, &[ElementRef])> {
    match change {
        Change::Compound(c) => match &c.kind {
            CompoundKind::RemoveAndDelete { element, contents } => Some((*element, contents)),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A model pair driven through the default rules, for rule tests.

    use blocksync_model::{ComponentKind, ElementId, SourceEditor, SourceModel};

    use crate::aggregator::ResultAggregator;
    use crate::context::ModelPair;
    use crate::decision::ScriptedDecisions;
    use crate::engine::SyncEngine;
    use crate::error::DispatchFailure;
    use crate::location::LocationScheme;

    pub(crate) struct Fixture {
        pub engine: SyncEngine,
        pub pair: ModelPair,
        pub editor: SourceEditor,
        pub decisions: ScriptedDecisions,
    }

    impl Fixture {
        pub fn new() -> Self {
            Self {
                engine: SyncEngine::with_default_rules(LocationScheme::default()),
                pair: ModelPair::new(SourceModel::new("Model")),
                editor: SourceEditor::new(),
                decisions: ScriptedDecisions::default(),
            }
        }

        /// Dispatch every recorded change; returns the merged results.
        pub fn try_apply(&mut self) -> Result<ResultAggregator, DispatchFailure> {
            let mut total = ResultAggregator::new();
            for change in self.editor.take_changes() {
                let results =
                    self.engine
                        .apply_change(&change, &mut self.pair, &mut self.decisions)?;
                total.merge(results);
            }
            Ok(total)
        }

        pub fn apply(&mut self) -> ResultAggregator {
            self.try_apply().unwrap()
        }

        pub fn with_primitives(mut self) -> Self {
            self.editor.import_primitive_types(&mut self.pair.source);
            self.apply();
            self
        }

        /// Create a block and encapsulate it, answering the kind prompt.
        pub fn component(&mut self, name: &str, kind: ComponentKind) -> ElementId {
            let index = ComponentKind::ALL
                .iter()
                .position(|k| *k == kind)
                .unwrap();
            let decisions = std::mem::take(&mut self.decisions);
            self.decisions = decisions.choose(index);
            let block = self.editor.create_block(&mut self.pair.source, name);
            self.editor
                .set_encapsulated(&mut self.pair.source, block, true)
                .unwrap();
            self.apply();
            block
        }

        /// Queue extra answers for the next dispatch.
        pub fn answer(&mut self, f: impl FnOnce(ScriptedDecisions) -> ScriptedDecisions) {
            let decisions = std::mem::take(&mut self.decisions);
            self.decisions = f(decisions);
        }
    }
}
