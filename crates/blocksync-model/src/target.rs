//! The component-domain (target) model.
//!
//! Components and primitive repositories are roots: each is persisted as its
//! own unit. Everything else is owned, directly or through a method, by a
//! root. [`TargetModel::subtree`] renders a root with its descendants for
//! the persistence collaborator.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::element::{ElementId, ElementKind, ElementRef};
use crate::error::ModelError;

/// The two kinds of component, each inducing a different port mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    /// Communicates through readable/writable messages.
    MessageContainer,
    /// Communicates through method parameters and return values.
    MethodContainer,
}

impl ComponentKind {
    /// Selectable kinds, in the order they are offered to the user.
    pub const ALL: [ComponentKind; 2] =
        [ComponentKind::MessageContainer, ComponentKind::MethodContainer];

    pub fn element_kind(&self) -> ElementKind {
        match self {
            ComponentKind::MessageContainer => ElementKind::MessageComponent,
            ComponentKind::MethodContainer => ElementKind::MethodComponent,
        }
    }

    /// Human-readable label used when asking the user to choose.
    pub fn label(&self) -> &'static str {
        match self {
            ComponentKind::MessageContainer => "Message-based component",
            ComponentKind::MethodContainer => "Method-based component",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Tags of the shared primitive representatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PrimitiveTag {
    Boolean,
    Continuous,
    SignedDiscrete,
    UnsignedDiscrete,
}

impl PrimitiveTag {
    pub const ALL: [PrimitiveTag; 4] = [
        PrimitiveTag::Boolean,
        PrimitiveTag::Continuous,
        PrimitiveTag::SignedDiscrete,
        PrimitiveTag::UnsignedDiscrete,
    ];

    pub fn element_kind(&self) -> ElementKind {
        match self {
            PrimitiveTag::Boolean => ElementKind::BooleanType,
            PrimitiveTag::Continuous => ElementKind::ContinuousType,
            PrimitiveTag::SignedDiscrete => ElementKind::SignedDiscreteType,
            PrimitiveTag::UnsignedDiscrete => ElementKind::UnsignedDiscreteType,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveTag::Boolean => "Boolean",
            PrimitiveTag::Continuous => "Continuous",
            PrimitiveTag::SignedDiscrete => "SignedDiscrete",
            PrimitiveTag::UnsignedDiscrete => "UnsignedDiscrete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: ElementId,
    pub name: String,
    pub kind: ComponentKind,
    pub messages: Vec<ElementId>,
    pub methods: Vec<ElementId>,
    pub variables: Vec<ElementId>,
    pub constants: Vec<ElementId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: ElementId,
    pub name: String,
    pub owner: ElementId,
    pub readable: bool,
    pub writable: bool,
    pub type_ref: Option<ElementRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub id: ElementId,
    pub name: String,
    pub owner: ElementId,
    pub parameters: Vec<ElementId>,
    pub return_value: Option<ElementId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub id: ElementId,
    pub name: String,
    pub owner: ElementId,
    pub type_ref: Option<ElementRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnValue {
    pub id: ElementId,
    pub name: String,
    pub owner: ElementId,
    pub type_ref: Option<ElementRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub id: ElementId,
    pub name: String,
    pub owner: ElementId,
    pub readable: bool,
    pub writable: bool,
    pub type_ref: Option<ElementRef>,
}

/// A reference-holding element pointing at another component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constant {
    pub id: ElementId,
    pub name: String,
    pub owner: ElementId,
    pub component: ElementRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveRepository {
    pub id: ElementId,
    pub name: String,
    pub representatives: Vec<ElementId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Representative {
    pub id: ElementId,
    pub tag: PrimitiveTag,
    pub owner: ElementId,
}

/// Any element stored in a target model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TargetElement {
    Component(Component),
    Message(Message),
    Method(Method),
    Parameter(Parameter),
    ReturnValue(ReturnValue),
    Variable(Variable),
    Constant(Constant),
    Repository(PrimitiveRepository),
    Representative(Representative),
}

impl TargetElement {
    pub fn id(&self) -> ElementId {
        match self {
            TargetElement::Component(e) => e.id,
            TargetElement::Message(e) => e.id,
            TargetElement::Method(e) => e.id,
            TargetElement::Parameter(e) => e.id,
            TargetElement::ReturnValue(e) => e.id,
            TargetElement::Variable(e) => e.id,
            TargetElement::Constant(e) => e.id,
            TargetElement::Repository(e) => e.id,
            TargetElement::Representative(e) => e.id,
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            TargetElement::Component(c) => c.kind.element_kind(),
            TargetElement::Message(_) => ElementKind::Message,
            TargetElement::Method(_) => ElementKind::Method,
            TargetElement::Parameter(_) => ElementKind::Parameter,
            TargetElement::ReturnValue(_) => ElementKind::ReturnValue,
            TargetElement::Variable(_) => ElementKind::Variable,
            TargetElement::Constant(_) => ElementKind::Constant,
            TargetElement::Repository(_) => ElementKind::PrimitiveRepository,
            TargetElement::Representative(r) => r.tag.element_kind(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TargetElement::Component(e) => &e.name,
            TargetElement::Message(e) => &e.name,
            TargetElement::Method(e) => &e.name,
            TargetElement::Parameter(e) => &e.name,
            TargetElement::ReturnValue(e) => &e.name,
            TargetElement::Variable(e) => &e.name,
            TargetElement::Constant(e) => &e.name,
            TargetElement::Repository(e) => &e.name,
            TargetElement::Representative(e) => e.tag.name(),
        }
    }

    /// Direct container. `None` for roots.
    pub fn owner(&self) -> Option<ElementId> {
        match self {
            TargetElement::Component(_) | TargetElement::Repository(_) => None,
            TargetElement::Message(e) => Some(e.owner),
            TargetElement::Method(e) => Some(e.owner),
            TargetElement::Parameter(e) => Some(e.owner),
            TargetElement::ReturnValue(e) => Some(e.owner),
            TargetElement::Variable(e) => Some(e.owner),
            TargetElement::Constant(e) => Some(e.owner),
            TargetElement::Representative(e) => Some(e.owner),
        }
    }

    /// Directly owned elements, in containment order.
    pub fn children(&self) -> Vec<ElementId> {
        match self {
            TargetElement::Component(c) => c
                .messages
                .iter()
                .chain(&c.methods)
                .chain(&c.variables)
                .chain(&c.constants)
                .copied()
                .collect(),
            TargetElement::Method(m) => m
                .parameters
                .iter()
                .copied()
                .chain(m.return_value)
                .collect(),
            TargetElement::Repository(r) => r.representatives.clone(),
            _ => Vec::new(),
        }
    }

    pub fn element_ref(&self) -> ElementRef {
        ElementRef::new(self.id(), self.kind())
    }
}

/// A root element with all its descendants, as handed to persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtree {
    pub element: TargetElement,
    pub children: Vec<Subtree>,
}

impl Subtree {
    /// Number of elements in this subtree.
    pub fn element_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(Subtree::element_count)
            .sum::<usize>()
    }
}

/// A component-domain model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetModel {
    roots: Vec<ElementId>,
    elements: BTreeMap<ElementId, TargetElement>,
}

impl TargetModel {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Lookup ---

    pub fn get(&self, id: ElementId) -> Option<&TargetElement> {
        self.elements.get(&id)
    }

    pub fn element_ref(&self, id: ElementId) -> Option<ElementRef> {
        self.elements.get(&id).map(TargetElement::element_ref)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    /// Root elements (persisted units), in creation order.
    pub fn roots(&self) -> impl Iterator<Item = &TargetElement> {
        self.roots.iter().filter_map(|id| self.elements.get(id))
    }

    pub fn is_root(&self, id: ElementId) -> bool {
        self.roots.contains(&id)
    }

    /// The root whose persisted unit contains `id` (possibly `id` itself).
    pub fn containing_root(&self, id: ElementId) -> Option<ElementId> {
        let mut current = self.elements.get(&id)?;
        while let Some(owner) = current.owner() {
            current = self.elements.get(&owner)?;
        }
        Some(current.id())
    }

    pub fn component(&self, id: ElementId) -> Option<&Component> {
        match self.elements.get(&id) {
            Some(TargetElement::Component(c)) => Some(c),
            _ => None,
        }
    }

    pub fn method(&self, id: ElementId) -> Option<&Method> {
        match self.elements.get(&id) {
            Some(TargetElement::Method(m)) => Some(m),
            _ => None,
        }
    }

    pub fn message(&self, id: ElementId) -> Option<&Message> {
        match self.elements.get(&id) {
            Some(TargetElement::Message(m)) => Some(m),
            _ => None,
        }
    }

    pub fn variable(&self, id: ElementId) -> Option<&Variable> {
        match self.elements.get(&id) {
            Some(TargetElement::Variable(v)) => Some(v),
            _ => None,
        }
    }

    pub fn constant(&self, id: ElementId) -> Option<&Constant> {
        match self.elements.get(&id) {
            Some(TargetElement::Constant(c)) => Some(c),
            _ => None,
        }
    }

    /// Methods of a component, in declaration order.
    pub fn methods_of(&self, component: ElementId) -> Vec<&Method> {
        self.component(component)
            .map(|c| c.methods.iter().filter_map(|m| self.method(*m)).collect())
            .unwrap_or_default()
    }

    /// Constants, in any component, that reference `component`.
    pub fn constants_referencing(&self, component: ElementId) -> Vec<ElementId> {
        self.elements
            .values()
            .filter_map(|e| match e {
                TargetElement::Constant(c) if c.component.id == component => Some(c.id),
                _ => None,
            })
            .collect()
    }

    /// The representative for a primitive tag, if a repository exists.
    pub fn representative(&self, tag: PrimitiveTag) -> Option<ElementRef> {
        self.elements.values().find_map(|e| match e {
            TargetElement::Representative(r) if r.tag == tag => Some(e.element_ref()),
            _ => None,
        })
    }

    /// Display name of a type reference.
    pub fn type_name(&self, type_ref: ElementRef) -> String {
        self.elements
            .get(&type_ref.id)
            .map(|e| e.name().to_string())
            .unwrap_or_else(|| "?".to_string())
    }

    /// Signature string of a method: `name(Type param, ...) : Return`.
    pub fn signature(&self, method: ElementId) -> Option<String> {
        let m = self.method(method)?;
        let params: Vec<String> = m
            .parameters
            .iter()
            .filter_map(|p| match self.elements.get(p) {
                Some(TargetElement::Parameter(p)) => Some(match p.type_ref {
                    Some(t) => format!("{} {}", self.type_name(t), p.name),
                    None => p.name.clone(),
                }),
                _ => None,
            })
            .collect();
        let mut sig = format!("{}({})", m.name, params.join(", "));
        if let Some(TargetElement::ReturnValue(r)) =
            m.return_value.and_then(|r| self.elements.get(&r))
        {
            let ret = r
                .type_ref
                .map(|t| self.type_name(t))
                .unwrap_or_else(|| r.name.clone());
            sig.push_str(&format!(" : {ret}"));
        }
        Some(sig)
    }

    /// Render a root (or any element) with all its descendants.
    pub fn subtree(&self, id: ElementId) -> Option<Subtree> {
        let element = self.elements.get(&id)?;
        let children = element
            .children()
            .into_iter()
            .filter_map(|c| self.subtree(c))
            .collect();
        Some(Subtree {
            element: element.clone(),
            children,
        })
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    // --- Creation ---

    pub fn add_component(&mut self, name: impl Into<String>, kind: ComponentKind) -> ElementRef {
        let component = Component {
            id: ElementId::new(),
            name: name.into(),
            kind,
            messages: Vec::new(),
            methods: Vec::new(),
            variables: Vec::new(),
            constants: Vec::new(),
        };
        self.insert_root(TargetElement::Component(component))
    }

    /// Create a primitive repository holding one representative per tag.
    pub fn add_primitive_repository(&mut self, name: impl Into<String>) -> ElementRef {
        let repo_id = ElementId::new();
        let mut representatives = Vec::new();
        for tag in PrimitiveTag::ALL {
            let rep = Representative {
                id: ElementId::new(),
                tag,
                owner: repo_id,
            };
            representatives.push(rep.id);
            self.elements
                .insert(rep.id, TargetElement::Representative(rep));
        }
        self.insert_root(TargetElement::Repository(PrimitiveRepository {
            id: repo_id,
            name: name.into(),
            representatives,
        }))
    }

    pub fn add_message(
        &mut self,
        component: ElementId,
        name: impl Into<String>,
        readable: bool,
        writable: bool,
        type_ref: Option<ElementRef>,
    ) -> Result<ElementRef, ModelError> {
        let id = ElementId::new();
        self.component_mut(component)?.messages.push(id);
        Ok(self.insert(TargetElement::Message(Message {
            id,
            name: name.into(),
            owner: component,
            readable,
            writable,
            type_ref,
        })))
    }

    pub fn add_method(
        &mut self,
        component: ElementId,
        name: impl Into<String>,
    ) -> Result<ElementRef, ModelError> {
        let id = ElementId::new();
        self.component_mut(component)?.methods.push(id);
        Ok(self.insert(TargetElement::Method(Method {
            id,
            name: name.into(),
            owner: component,
            parameters: Vec::new(),
            return_value: None,
        })))
    }

    pub fn add_parameter(
        &mut self,
        method: ElementId,
        name: impl Into<String>,
        type_ref: Option<ElementRef>,
    ) -> Result<ElementRef, ModelError> {
        let id = ElementId::new();
        self.method_mut(method)?.parameters.push(id);
        Ok(self.insert(TargetElement::Parameter(Parameter {
            id,
            name: name.into(),
            owner: method,
            type_ref,
        })))
    }

    /// Give a method a return value. Replaces any existing one.
    pub fn set_return_value(
        &mut self,
        method: ElementId,
        name: impl Into<String>,
        type_ref: Option<ElementRef>,
    ) -> Result<ElementRef, ModelError> {
        let id = ElementId::new();
        let previous = self.method_mut(method)?.return_value.replace(id);
        if let Some(previous) = previous {
            self.elements.remove(&previous);
        }
        Ok(self.insert(TargetElement::ReturnValue(ReturnValue {
            id,
            name: name.into(),
            owner: method,
            type_ref,
        })))
    }

    pub fn add_variable(
        &mut self,
        component: ElementId,
        name: impl Into<String>,
        readable: bool,
        writable: bool,
        type_ref: Option<ElementRef>,
    ) -> Result<ElementRef, ModelError> {
        let id = ElementId::new();
        self.component_mut(component)?.variables.push(id);
        Ok(self.insert(TargetElement::Variable(Variable {
            id,
            name: name.into(),
            owner: component,
            readable,
            writable,
            type_ref,
        })))
    }

    pub fn add_constant(
        &mut self,
        component: ElementId,
        name: impl Into<String>,
        referenced: ElementRef,
    ) -> Result<ElementRef, ModelError> {
        let id = ElementId::new();
        self.component_mut(component)?.constants.push(id);
        Ok(self.insert(TargetElement::Constant(Constant {
            id,
            name: name.into(),
            owner: component,
            component: referenced,
        })))
    }

    // --- Update ---

    /// Rename an element. Returns the previous name.
    pub fn set_name(&mut self, id: ElementId, name: impl Into<String>) -> Result<String, ModelError> {
        let name = name.into();
        let slot = match self.elements.get_mut(&id) {
            Some(TargetElement::Component(e)) => &mut e.name,
            Some(TargetElement::Message(e)) => &mut e.name,
            Some(TargetElement::Method(e)) => &mut e.name,
            Some(TargetElement::Parameter(e)) => &mut e.name,
            Some(TargetElement::ReturnValue(e)) => &mut e.name,
            Some(TargetElement::Variable(e)) => &mut e.name,
            Some(TargetElement::Constant(e)) => &mut e.name,
            Some(TargetElement::Repository(e)) => &mut e.name,
            Some(TargetElement::Representative(r)) => {
                return Err(ModelError::WrongKind {
                    id,
                    actual: r.tag.element_kind(),
                    expected: ElementKind::Component,
                })
            }
            None => return Err(ModelError::ElementNotFound(id)),
        };
        Ok(std::mem::replace(slot, name))
    }

    /// Set the type of a typed element (message, parameter, return value, variable).
    pub fn set_type(&mut self, id: ElementId, type_ref: Option<ElementRef>) -> Result<(), ModelError> {
        match self.elements.get_mut(&id) {
            Some(TargetElement::Message(e)) => e.type_ref = type_ref,
            Some(TargetElement::Parameter(e)) => e.type_ref = type_ref,
            Some(TargetElement::ReturnValue(e)) => e.type_ref = type_ref,
            Some(TargetElement::Variable(e)) => e.type_ref = type_ref,
            Some(other) => {
                return Err(ModelError::WrongKind {
                    id,
                    actual: other.kind(),
                    expected: ElementKind::Message,
                })
            }
            None => return Err(ModelError::ElementNotFound(id)),
        }
        Ok(())
    }

    /// Set readable/writable access of a message or variable.
    pub fn set_access(&mut self, id: ElementId, readable: bool, writable: bool) -> Result<(), ModelError> {
        match self.elements.get_mut(&id) {
            Some(TargetElement::Message(e)) => {
                e.readable = readable;
                e.writable = writable;
            }
            Some(TargetElement::Variable(e)) => {
                e.readable = readable;
                e.writable = writable;
            }
            Some(other) => {
                return Err(ModelError::WrongKind {
                    id,
                    actual: other.kind(),
                    expected: ElementKind::Message,
                })
            }
            None => return Err(ModelError::ElementNotFound(id)),
        }
        Ok(())
    }

    /// Remove an element and its descendants, detaching it from its
    /// container. Returns the number of elements removed.
    pub fn remove(&mut self, id: ElementId) -> Result<usize, ModelError> {
        let element = self
            .elements
            .get(&id)
            .ok_or(ModelError::ElementNotFound(id))?;
        let owner = element.owner();

        if let Some(owner) = owner.and_then(|o| self.elements.get_mut(&o)) {
            match owner {
                TargetElement::Component(c) => {
                    c.messages.retain(|x| *x != id);
                    c.methods.retain(|x| *x != id);
                    c.variables.retain(|x| *x != id);
                    c.constants.retain(|x| *x != id);
                }
                TargetElement::Method(m) => {
                    m.parameters.retain(|x| *x != id);
                    if m.return_value == Some(id) {
                        m.return_value = None;
                    }
                }
                TargetElement::Repository(r) => r.representatives.retain(|x| *x != id),
                _ => {}
            }
        }
        self.roots.retain(|x| *x != id);

        let mut removed = 0;
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(e) = self.elements.remove(&next) {
                stack.extend(e.children());
                removed += 1;
            }
        }
        Ok(removed)
    }

    // --- Internals ---

    fn insert(&mut self, element: TargetElement) -> ElementRef {
        let r = element.element_ref();
        self.elements.insert(r.id, element);
        r
    }

    fn insert_root(&mut self, element: TargetElement) -> ElementRef {
        self.roots.push(element.id());
        self.insert(element)
    }

    fn component_mut(&mut self, id: ElementId) -> Result<&mut Component, ModelError> {
        match self.elements.get_mut(&id) {
            Some(TargetElement::Component(c)) => Ok(c),
            Some(other) => Err(ModelError::WrongKind {
                id,
                actual: other.kind(),
                expected: ElementKind::Component,
            }),
            None => Err(ModelError::ElementNotFound(id)),
        }
    }

    fn method_mut(&mut self, id: ElementId) -> Result<&mut Method, ModelError> {
        match self.elements.get_mut(&id) {
            Some(TargetElement::Method(m)) => Ok(m),
            Some(other) => Err(ModelError::WrongKind {
                id,
                actual: other.kind(),
                expected: ElementKind::Method,
            }),
            None => Err(ModelError::ElementNotFound(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_with_members() {
        let mut model = TargetModel::new();
        let c = model.add_component("Motor", ComponentKind::MessageContainer);
        assert_eq!(c.kind, ElementKind::MessageComponent);
        assert!(model.is_root(c.id));

        let m = model.add_message(c.id, "speed", true, false, None).unwrap();
        let v = model.add_variable(c.id, "gain", true, true, None).unwrap();
        assert_eq!(model.containing_root(m.id), Some(c.id));
        assert_eq!(model.containing_root(v.id), Some(c.id));
        assert!(!model.is_root(m.id));

        let tree = model.subtree(c.id).unwrap();
        assert_eq!(tree.element_count(), 3);
    }

    #[test]
    fn method_signature() {
        let mut model = TargetModel::new();
        let repo = model.add_primitive_repository("PrimitiveTypes");
        assert!(model.is_root(repo.id));
        let boolean = model.representative(PrimitiveTag::Boolean).unwrap();
        let cont = model.representative(PrimitiveTag::Continuous).unwrap();

        let c = model.add_component("Ctrl", ComponentKind::MethodContainer);
        let m = model.add_method(c.id, "compute").unwrap();
        assert_eq!(model.signature(m.id).unwrap(), "compute()");

        model.add_parameter(m.id, "enable", Some(boolean)).unwrap();
        model.add_parameter(m.id, "setpoint", Some(cont)).unwrap();
        model.set_return_value(m.id, "out", Some(cont)).unwrap();
        assert_eq!(
            model.signature(m.id).unwrap(),
            "compute(Boolean enable, Continuous setpoint) : Continuous"
        );
        assert_eq!(model.containing_root(m.id), Some(c.id));
    }

    #[test]
    fn replace_return_value() {
        let mut model = TargetModel::new();
        let c = model.add_component("Ctrl", ComponentKind::MethodContainer);
        let m = model.add_method(c.id, "f").unwrap();
        let r1 = model.set_return_value(m.id, "a", None).unwrap();
        let r2 = model.set_return_value(m.id, "b", None).unwrap();
        assert!(!model.contains(r1.id));
        assert_eq!(model.method(m.id).unwrap().return_value, Some(r2.id));
    }

    #[test]
    fn remove_detaches_and_cascades() {
        let mut model = TargetModel::new();
        let c = model.add_component("Ctrl", ComponentKind::MethodContainer);
        let m = model.add_method(c.id, "f").unwrap();
        let p = model.add_parameter(m.id, "x", None).unwrap();

        assert_eq!(model.remove(p.id).unwrap(), 1);
        assert!(model.method(m.id).unwrap().parameters.is_empty());

        model.add_parameter(m.id, "y", None).unwrap();
        assert_eq!(model.remove(c.id).unwrap(), 3);
        assert_eq!(model.element_count(), 0);
        assert_eq!(model.roots().count(), 0);
    }

    #[test]
    fn constants_track_referenced_component() {
        let mut model = TargetModel::new();
        let a = model.add_component("A", ComponentKind::MethodContainer);
        let b = model.add_component("B", ComponentKind::MethodContainer);
        let k = model.add_constant(a.id, "b", b).unwrap();
        assert_eq!(model.constants_referencing(b.id), vec![k.id]);
        assert!(model.constants_referencing(a.id).is_empty());
    }

    #[test]
    fn rename_and_access() {
        let mut model = TargetModel::new();
        let c = model.add_component("A", ComponentKind::MessageContainer);
        assert_eq!(model.set_name(c.id, "B").unwrap(), "A");
        let msg = model.add_message(c.id, "m", true, false, None).unwrap();
        model.set_access(msg.id, false, true).unwrap();
        let m = model.message(msg.id).unwrap();
        assert!(!m.readable && m.writable);
        assert!(model.set_access(c.id, true, true).is_err());
    }

    #[test]
    fn members_require_component_owner() {
        let mut model = TargetModel::new();
        let c = model.add_component("A", ComponentKind::MessageContainer);
        let msg = model.add_message(c.id, "m", true, false, None).unwrap();
        assert!(matches!(
            model.add_method(msg.id, "f"),
            Err(ModelError::WrongKind { .. })
        ));
        assert!(matches!(
            model.add_variable(ElementId::new(), "v", true, true, None),
            Err(ModelError::ElementNotFound(_))
        ));
    }

    #[test]
    fn subtree_serializes() {
        let mut model = TargetModel::new();
        let c = model.add_component("A", ComponentKind::MessageContainer);
        model.add_message(c.id, "m", true, false, None).unwrap();
        let json = serde_json::to_string(&model.subtree(c.id).unwrap()).unwrap();
        let back: Subtree = serde_json::from_str(&json).unwrap();
        assert_eq!(back.element.name(), "A");
        assert_eq!(back.children.len(), 1);
    }
}
