//! Element identities and the closed set of element kinds.
//!
//! Both domains share one identity space. An [`ElementRef`] pairs an
//! identity with its runtime kind so that correspondences can be filtered
//! by kind without consulting the live models.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identity of a model element in either domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Create a fresh random identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The all-zero identity. Only useful in tests and placeholders.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Runtime kind of a model element.
///
/// Concrete kinds are what elements actually are; `Component` and
/// `PrimitiveRepresentative` are abstract and only used as query kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    // --- block domain ---
    /// Root of a block-domain model.
    SourceRoot,
    Block,
    Port,
    Property,
    /// An imported primitive type (Boolean, Integer, ...).
    SourcePrimitive,

    // --- component domain ---
    /// Abstract: any target component.
    Component,
    MessageComponent,
    MethodComponent,
    Message,
    Method,
    Parameter,
    ReturnValue,
    Variable,
    Constant,
    PrimitiveRepository,
    /// Abstract: any primitive representative.
    PrimitiveRepresentative,
    BooleanType,
    ContinuousType,
    SignedDiscreteType,
    UnsignedDiscreteType,
}

impl ElementKind {
    /// Direct parent kind, if any.
    pub fn parent(&self) -> Option<ElementKind> {
        use ElementKind::*;
        match self {
            MessageComponent | MethodComponent => Some(Component),
            BooleanType | ContinuousType | SignedDiscreteType | UnsignedDiscreteType => {
                Some(PrimitiveRepresentative)
            }
            _ => None,
        }
    }

    /// Whether `self` is `kind` or one of its specializations.
    pub fn is_a(&self, kind: ElementKind) -> bool {
        let mut current = Some(*self);
        while let Some(k) = current {
            if k == kind {
                return true;
            }
            current = k.parent();
        }
        false
    }

    /// Whether elements of this kind live in the block domain.
    pub fn is_source(&self) -> bool {
        use ElementKind::*;
        matches!(self, SourceRoot | Block | Port | Property | SourcePrimitive)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// An element identity together with its runtime kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementRef {
    pub id: ElementId,
    pub kind: ElementKind,
}

impl ElementRef {
    pub fn new(id: ElementId, kind: ElementKind) -> Self {
        Self { id, kind }
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}
