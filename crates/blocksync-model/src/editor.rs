//! A change-recording editor for block-domain models.
//!
//! Every edit mutates the live [`SourceModel`] first and then records the
//! [`Change`] describing it, with old and new values snapshotted. Recorded
//! changes are drained with [`SourceEditor::take_changes`] and handed to the
//! engine in order.

use crate::change::{Change, CompoundKind};
use crate::element::{ElementId, ElementKind, ElementRef};
use crate::error::ModelError;
use crate::source::{Block, Port, PrimitiveType, Property, SourceElement, SourceModel};
use crate::value::{AggregationKind, FeatureId, FlowDirection, SourcePrimitive, Value};

/// Records changes while editing a source model.
#[derive(Debug, Default)]
pub struct SourceEditor {
    recorded: Vec<Change>,
}

impl SourceEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the changes recorded so far, oldest first.
    pub fn take_changes(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.recorded)
    }

    /// Number of recorded, not yet drained changes.
    pub fn pending(&self) -> usize {
        self.recorded.len()
    }

    /// Import every primitive type not yet imported into the model.
    pub fn import_primitive_types(&mut self, model: &mut SourceModel) {
        let root = model.root();
        let mut parts = Vec::new();
        for primitive in SourcePrimitive::ALL {
            if model.primitive_id(primitive).is_some() {
                continue;
            }
            let id = ElementId::new();
            model.insert_primitive(PrimitiveType { id, primitive });
            parts.push(Change::insert(
                root,
                FeatureId::PrimitiveTypeImports,
                ElementRef::new(id, ElementKind::SourcePrimitive),
            ));
        }
        if !parts.is_empty() {
            self.recorded
                .push(Change::compound(CompoundKind::Plain, parts));
        }
    }

    pub fn create_block(&mut self, model: &mut SourceModel, name: &str) -> ElementId {
        let id = ElementId::new();
        model.insert_block(Block {
            id,
            name: name.to_string(),
            encapsulated: false,
            ports: Vec::new(),
            properties: Vec::new(),
        });
        let element = ElementRef::new(id, ElementKind::Block);
        self.recorded.push(Change::compound(
            CompoundKind::CreateAndInsert { element },
            vec![
                Change::insert(model.root(), FeatureId::PackagedElements, element),
                Change::attribute(element, FeatureId::Name, None, Some(Value::Text(name.into()))),
            ],
        ));
        id
    }

    /// Switch a block's encapsulated flag. Records nothing if unchanged.
    pub fn set_encapsulated(
        &mut self,
        model: &mut SourceModel,
        block: ElementId,
        encapsulated: bool,
    ) -> Result<(), ModelError> {
        let b = model.block_mut(block)?;
        let old = std::mem::replace(&mut b.encapsulated, encapsulated);
        if old != encapsulated {
            self.recorded.push(Change::attribute(
                ElementRef::new(block, ElementKind::Block),
                FeatureId::IsEncapsulated,
                Some(Value::Bool(old)),
                Some(Value::Bool(encapsulated)),
            ));
        }
        Ok(())
    }

    /// Rename a block, port or property. Records nothing if unchanged.
    pub fn rename(
        &mut self,
        model: &mut SourceModel,
        id: ElementId,
        name: &str,
    ) -> Result<(), ModelError> {
        let target = model
            .element_ref(id)
            .ok_or(ModelError::ElementNotFound(id))?;
        let old = model.set_name(id, name.to_string())?;
        if old != name {
            self.recorded.push(Change::attribute(
                target,
                FeatureId::Name,
                Some(Value::Text(old)),
                Some(Value::Text(name.into())),
            ));
        }
        Ok(())
    }

    pub fn add_port(
        &mut self,
        model: &mut SourceModel,
        block: ElementId,
        name: &str,
        direction: FlowDirection,
        type_id: Option<ElementId>,
    ) -> Result<ElementId, ModelError> {
        let type_ref = resolve_type(model, type_id)?;
        let id = ElementId::new();
        model.insert_port(Port {
            id,
            name: name.to_string(),
            owner: block,
            direction,
            type_ref,
        })?;
        let element = ElementRef::new(id, ElementKind::Port);
        self.recorded.push(Change::compound(
            CompoundKind::CreateAndInsert { element },
            vec![
                Change::insert(
                    ElementRef::new(block, ElementKind::Block),
                    FeatureId::OwnedPorts,
                    element,
                ),
                Change::attribute(element, FeatureId::Name, None, Some(Value::Text(name.into()))),
            ],
        ));
        Ok(id)
    }

    pub fn add_property(
        &mut self,
        model: &mut SourceModel,
        block: ElementId,
        name: &str,
        aggregation: AggregationKind,
        read_only: bool,
        type_id: Option<ElementId>,
    ) -> Result<ElementId, ModelError> {
        let type_ref = resolve_type(model, type_id)?;
        let id = ElementId::new();
        model.insert_property(Property {
            id,
            name: name.to_string(),
            owner: block,
            read_only,
            aggregation,
            type_ref,
        })?;
        let element = ElementRef::new(id, ElementKind::Property);
        let mut parts = vec![
            Change::insert(
                ElementRef::new(block, ElementKind::Block),
                FeatureId::OwnedProperties,
                element,
            ),
            Change::attribute(element, FeatureId::Name, None, Some(Value::Text(name.into()))),
        ];
        if type_ref.is_some() {
            parts.push(Change::reference(element, FeatureId::Type, None, type_ref));
        }
        self.recorded.push(Change::compound(
            CompoundKind::CreateAndInsert { element },
            parts,
        ));
        Ok(id)
    }

    /// Retype a port or property.
    pub fn set_type(
        &mut self,
        model: &mut SourceModel,
        id: ElementId,
        type_id: Option<ElementId>,
    ) -> Result<(), ModelError> {
        let new = resolve_type(model, type_id)?;
        let (target, old) = match model.element_ref(id) {
            Some(r) if r.kind == ElementKind::Port => {
                let port = model.port_mut(id)?;
                (r, std::mem::replace(&mut port.type_ref, new))
            }
            Some(r) => {
                let property = model.property_mut(id)?;
                (r, std::mem::replace(&mut property.type_ref, new))
            }
            None => return Err(ModelError::ElementNotFound(id)),
        };
        if old != new {
            self.recorded
                .push(Change::reference(target, FeatureId::Type, old, new));
        }
        Ok(())
    }

    pub fn set_direction(
        &mut self,
        model: &mut SourceModel,
        port: ElementId,
        direction: FlowDirection,
    ) -> Result<(), ModelError> {
        let p = model.port_mut(port)?;
        let old = std::mem::replace(&mut p.direction, direction);
        if old != direction {
            self.recorded.push(Change::attribute(
                ElementRef::new(port, ElementKind::Port),
                FeatureId::Direction,
                Some(Value::Direction(old)),
                Some(Value::Direction(direction)),
            ));
        }
        Ok(())
    }

    pub fn set_read_only(
        &mut self,
        model: &mut SourceModel,
        property: ElementId,
        read_only: bool,
    ) -> Result<(), ModelError> {
        let p = model.property_mut(property)?;
        let old = std::mem::replace(&mut p.read_only, read_only);
        if old != read_only {
            self.recorded.push(Change::attribute(
                ElementRef::new(property, ElementKind::Property),
                FeatureId::IsReadOnly,
                Some(Value::Bool(old)),
                Some(Value::Bool(read_only)),
            ));
        }
        Ok(())
    }

    /// Remove and delete a block, port or property, with everything it owns.
    pub fn delete(&mut self, model: &mut SourceModel, id: ElementId) -> Result<(), ModelError> {
        let removed = model.remove(id)?;
        let (element, contents) = match removed.split_first() {
            Some((first, rest)) => (
                ElementRef::new(first.id(), first.kind()),
                rest.iter()
                    .map(|e| ElementRef::new(e.id(), e.kind()))
                    .collect::<Vec<_>>(),
            ),
            None => return Err(ModelError::ElementNotFound(id)),
        };

        let (owner, feature) = match &removed[0] {
            SourceElement::Block(_) => (model.root(), FeatureId::PackagedElements),
            SourceElement::Port(p) => (
                ElementRef::new(p.owner, ElementKind::Block),
                FeatureId::OwnedPorts,
            ),
            SourceElement::Property(p) => (
                ElementRef::new(p.owner, ElementKind::Block),
                FeatureId::OwnedProperties,
            ),
            SourceElement::Primitive(_) => (model.root(), FeatureId::PrimitiveTypeImports),
        };

        self.recorded.push(Change::compound(
            CompoundKind::RemoveAndDelete { element, contents },
            vec![Change::remove(owner, feature, element)],
        ));
        Ok(())
    }
}

fn resolve_type(
    model: &SourceModel,
    type_id: Option<ElementId>,
) -> Result<Option<ElementRef>, ModelError> {
    type_id
        .map(|t| model.element_ref(t).ok_or(ModelError::ElementNotFound(t)))
        .transpose()
}
