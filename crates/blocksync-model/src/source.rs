//! The block-domain (source) model.
//!
//! A [`SourceModel`] is a single root owning blocks and imported primitive
//! types. Blocks own ports and properties. Elements are stored in one map
//! keyed by identity; ownership is recorded on both sides.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::element::{ElementId, ElementKind, ElementRef};
use crate::error::ModelError;
use crate::value::{AggregationKind, FlowDirection, SourcePrimitive};

/// A structural unit that may map to a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: ElementId,
    pub name: String,
    pub encapsulated: bool,
    pub ports: Vec<ElementId>,
    pub properties: Vec<ElementId>,
}

/// A typed interaction point on a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub id: ElementId,
    pub name: String,
    pub owner: ElementId,
    pub direction: FlowDirection,
    /// A primitive type or a block.
    pub type_ref: Option<ElementRef>,
}

/// A structural property of a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: ElementId,
    pub name: String,
    pub owner: ElementId,
    pub read_only: bool,
    pub aggregation: AggregationKind,
    pub type_ref: Option<ElementRef>,
}

impl Property {
    /// Whether this property is a part reference: composite aggregation
    /// typed by another block.
    pub fn is_part_reference(&self) -> bool {
        self.aggregation == AggregationKind::Composite
            && self
                .type_ref
                .is_some_and(|t| t.kind == ElementKind::Block)
    }
}

/// An imported primitive type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveType {
    pub id: ElementId,
    pub primitive: SourcePrimitive,
}

/// Any element stored in a source model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SourceElement {
    Block(Block),
    Port(Port),
    Property(Property),
    Primitive(PrimitiveType),
}

impl SourceElement {
    pub fn id(&self) -> ElementId {
        match self {
            SourceElement::Block(b) => b.id,
            SourceElement::Port(p) => p.id,
            SourceElement::Property(p) => p.id,
            SourceElement::Primitive(p) => p.id,
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            SourceElement::Block(_) => ElementKind::Block,
            SourceElement::Port(_) => ElementKind::Port,
            SourceElement::Property(_) => ElementKind::Property,
            SourceElement::Primitive(_) => ElementKind::SourcePrimitive,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SourceElement::Block(b) => &b.name,
            SourceElement::Port(p) => &p.name,
            SourceElement::Property(p) => &p.name,
            SourceElement::Primitive(p) => p.primitive.name(),
        }
    }

    /// Owning block of a port or property.
    pub fn owner(&self) -> Option<ElementId> {
        match self {
            SourceElement::Port(p) => Some(p.owner),
            SourceElement::Property(p) => Some(p.owner),
            _ => None,
        }
    }
}

/// A block-domain model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceModel {
    root: ElementId,
    name: String,
    blocks: Vec<ElementId>,
    imports: Vec<ElementId>,
    elements: BTreeMap<ElementId, SourceElement>,
}

impl SourceModel {
    /// Create an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            root: ElementId::new(),
            name: name.into(),
            blocks: Vec::new(),
            imports: Vec::new(),
            elements: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reference to the model root.
    pub fn root(&self) -> ElementRef {
        ElementRef::new(self.root, ElementKind::SourceRoot)
    }

    // --- Lookup ---

    pub fn get(&self, id: ElementId) -> Option<&SourceElement> {
        self.elements.get(&id)
    }

    /// Reference (identity and kind) of a stored element.
    pub fn element_ref(&self, id: ElementId) -> Option<ElementRef> {
        if id == self.root {
            return Some(self.root());
        }
        self.elements.get(&id).map(|e| ElementRef::new(id, e.kind()))
    }

    pub fn block(&self, id: ElementId) -> Option<&Block> {
        match self.elements.get(&id) {
            Some(SourceElement::Block(b)) => Some(b),
            _ => None,
        }
    }

    pub fn port(&self, id: ElementId) -> Option<&Port> {
        match self.elements.get(&id) {
            Some(SourceElement::Port(p)) => Some(p),
            _ => None,
        }
    }

    pub fn property(&self, id: ElementId) -> Option<&Property> {
        match self.elements.get(&id) {
            Some(SourceElement::Property(p)) => Some(p),
            _ => None,
        }
    }

    pub fn primitive(&self, id: ElementId) -> Option<SourcePrimitive> {
        match self.elements.get(&id) {
            Some(SourceElement::Primitive(p)) => Some(p.primitive),
            _ => None,
        }
    }

    /// Blocks in packaging order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter_map(|id| self.block(*id))
    }

    pub fn block_by_name(&self, name: &str) -> Option<&Block> {
        self.blocks().find(|b| b.name == name)
    }

    /// Find a port or property of a block by name.
    pub fn member_by_name(&self, block: ElementId, name: &str) -> Option<&SourceElement> {
        let block = self.block(block)?;
        block
            .ports
            .iter()
            .chain(block.properties.iter())
            .filter_map(|id| self.elements.get(id))
            .find(|e| e.name() == name)
    }

    /// Identity of an imported primitive type.
    pub fn primitive_id(&self, primitive: SourcePrimitive) -> Option<ElementId> {
        self.imports
            .iter()
            .copied()
            .find(|id| self.primitive(*id) == Some(primitive))
    }

    /// Whether any primitive types have been imported.
    pub fn has_primitive_imports(&self) -> bool {
        !self.imports.is_empty()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    // --- Mutation (used by the editor) ---

    pub(crate) fn set_name(&mut self, id: ElementId, name: String) -> Result<String, ModelError> {
        let slot = match self.elements.get_mut(&id) {
            Some(SourceElement::Block(b)) => &mut b.name,
            Some(SourceElement::Port(p)) => &mut p.name,
            Some(SourceElement::Property(p)) => &mut p.name,
            Some(other) => {
                return Err(ModelError::WrongKind {
                    id,
                    actual: other.kind(),
                    expected: ElementKind::Block,
                })
            }
            None => return Err(ModelError::ElementNotFound(id)),
        };
        Ok(std::mem::replace(slot, name))
    }

    pub(crate) fn block_mut(&mut self, id: ElementId) -> Result<&mut Block, ModelError> {
        match self.elements.get_mut(&id) {
            Some(SourceElement::Block(b)) => Ok(b),
            Some(other) => Err(ModelError::WrongKind {
                id,
                actual: other.kind(),
                expected: ElementKind::Block,
            }),
            None => Err(ModelError::ElementNotFound(id)),
        }
    }

    pub(crate) fn port_mut(&mut self, id: ElementId) -> Result<&mut Port, ModelError> {
        match self.elements.get_mut(&id) {
            Some(SourceElement::Port(p)) => Ok(p),
            Some(other) => Err(ModelError::WrongKind {
                id,
                actual: other.kind(),
                expected: ElementKind::Port,
            }),
            None => Err(ModelError::ElementNotFound(id)),
        }
    }

    pub(crate) fn property_mut(&mut self, id: ElementId) -> Result<&mut Property, ModelError> {
        match self.elements.get_mut(&id) {
            Some(SourceElement::Property(p)) => Ok(p),
            Some(other) => Err(ModelError::WrongKind {
                id,
                actual: other.kind(),
                expected: ElementKind::Property,
            }),
            None => Err(ModelError::ElementNotFound(id)),
        }
    }

    pub(crate) fn insert_block(&mut self, block: Block) {
        self.blocks.push(block.id);
        self.elements.insert(block.id, SourceElement::Block(block));
    }

    pub(crate) fn insert_port(&mut self, port: Port) -> Result<(), ModelError> {
        self.block_mut(port.owner)?.ports.push(port.id);
        self.elements.insert(port.id, SourceElement::Port(port));
        Ok(())
    }

    pub(crate) fn insert_property(&mut self, property: Property) -> Result<(), ModelError> {
        self.block_mut(property.owner)?.properties.push(property.id);
        self.elements
            .insert(property.id, SourceElement::Property(property));
        Ok(())
    }

    pub(crate) fn insert_primitive(&mut self, primitive: PrimitiveType) {
        self.imports.push(primitive.id);
        self.elements
            .insert(primitive.id, SourceElement::Primitive(primitive));
    }

    /// Remove an element and everything it owns. Returns the removed
    /// element followed by its removed contents.
    pub(crate) fn remove(&mut self, id: ElementId) -> Result<Vec<SourceElement>, ModelError> {
        let element = self
            .elements
            .remove(&id)
            .ok_or(ModelError::ElementNotFound(id))?;

        let mut removed = Vec::new();
        match &element {
            SourceElement::Block(b) => {
                self.blocks.retain(|x| *x != id);
                for member in b.ports.iter().chain(b.properties.iter()) {
                    if let Some(m) = self.elements.remove(member) {
                        removed.push(m);
                    }
                }
            }
            SourceElement::Port(p) => {
                if let Ok(owner) = self.block_mut(p.owner) {
                    owner.ports.retain(|x| *x != id);
                }
            }
            SourceElement::Property(p) => {
                if let Ok(owner) = self.block_mut(p.owner) {
                    owner.properties.retain(|x| *x != id);
                }
            }
            SourceElement::Primitive(_) => {
                self.imports.retain(|x| *x != id);
            }
        }
        removed.insert(0, element);
        Ok(removed)
    }
}
