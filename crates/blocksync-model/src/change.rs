//! The change event model and its kind hierarchy.
//!
//! A [`Change`] is an immutable description of one edit to a block-domain
//! model. Leaf changes snapshot old and new values at recording time, so
//! they can be evaluated without re-reading the live model. Compound
//! changes group an ordered sequence of parts; each part is dispatched on
//! its own before the compound itself.
//!
//! Rules are registered against a [`ChangeKind`]. Kinds form a small,
//! explicit hierarchy of classes (single superclass) and interfaces (which
//! may extend other interfaces). [`ChangeKind::closure`] walks that table
//! to find every kind a concrete change satisfies.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::element::ElementRef;
use crate::value::{FeatureId, Value};

/// Replacement of a single-valued attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeReplace {
    pub target: ElementRef,
    pub feature: FeatureId,
    pub old: Option<Value>,
    pub new: Option<Value>,
}

/// Replacement of a single-valued reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceReplace {
    pub target: ElementRef,
    pub feature: FeatureId,
    pub old: Option<ElementRef>,
    pub new: Option<ElementRef>,
}

/// Insertion into a multi-valued reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceInsert {
    pub target: ElementRef,
    pub feature: FeatureId,
    pub inserted: ElementRef,
}

/// Removal from a multi-valued reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRemove {
    pub target: ElementRef,
    pub feature: FeatureId,
    pub removed: ElementRef,
}

/// What a compound change represents as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompoundKind {
    /// An arbitrary grouping of changes.
    Plain,
    /// An element was created and inserted into its owner.
    CreateAndInsert { element: ElementRef },
    /// An element was removed from its owner and deleted.
    RemoveAndDelete {
        element: ElementRef,
        /// Owned elements deleted along with `element`.
        contents: Vec<ElementRef>,
    },
}

/// An ordered group of changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundChange {
    pub kind: CompoundKind,
    pub parts: Vec<Change>,
}

/// A single edit to a block-domain model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Change {
    AttributeReplace(AttributeReplace),
    ReferenceReplace(ReferenceReplace),
    ReferenceInsert(ReferenceInsert),
    ReferenceRemove(ReferenceRemove),
    Compound(CompoundChange),
}

impl Change {
    /// Convenience constructor for an attribute replacement.
    pub fn attribute(
        target: ElementRef,
        feature: FeatureId,
        old: Option<Value>,
        new: Option<Value>,
    ) -> Self {
        Change::AttributeReplace(AttributeReplace {
            target,
            feature,
            old,
            new,
        })
    }

    /// Convenience constructor for a reference replacement.
    pub fn reference(
        target: ElementRef,
        feature: FeatureId,
        old: Option<ElementRef>,
        new: Option<ElementRef>,
    ) -> Self {
        Change::ReferenceReplace(ReferenceReplace {
            target,
            feature,
            old,
            new,
        })
    }

    /// Convenience constructor for a reference insertion.
    pub fn insert(target: ElementRef, feature: FeatureId, inserted: ElementRef) -> Self {
        Change::ReferenceInsert(ReferenceInsert {
            target,
            feature,
            inserted,
        })
    }

    /// Convenience constructor for a reference removal.
    pub fn remove(target: ElementRef, feature: FeatureId, removed: ElementRef) -> Self {
        Change::ReferenceRemove(ReferenceRemove {
            target,
            feature,
            removed,
        })
    }

    /// Convenience constructor for a compound change.
    pub fn compound(kind: CompoundKind, parts: Vec<Change>) -> Self {
        Change::Compound(CompoundChange { kind, parts })
    }

    /// The concrete kind of this change.
    pub fn kind(&self) -> ChangeKind {
        match self {
            Change::AttributeReplace(_) => ChangeKind::AttributeReplace,
            Change::ReferenceReplace(_) => ChangeKind::ReferenceReplace,
            Change::ReferenceInsert(_) => ChangeKind::ReferenceInsert,
            Change::ReferenceRemove(_) => ChangeKind::ReferenceRemove,
            Change::Compound(c) => match c.kind {
                CompoundKind::Plain => ChangeKind::Compound,
                CompoundKind::CreateAndInsert { .. } => ChangeKind::CreateAndInsert,
                CompoundKind::RemoveAndDelete { .. } => ChangeKind::RemoveAndDelete,
            },
        }
    }

    /// The element a leaf change edits. `None` for compounds.
    pub fn target(&self) -> Option<ElementRef> {
        match self {
            Change::AttributeReplace(c) => Some(c.target),
            Change::ReferenceReplace(c) => Some(c.target),
            Change::ReferenceInsert(c) => Some(c.target),
            Change::ReferenceRemove(c) => Some(c.target),
            Change::Compound(_) => None,
        }
    }

    /// The feature a leaf change edits. `None` for compounds.
    pub fn feature(&self) -> Option<FeatureId> {
        match self {
            Change::AttributeReplace(c) => Some(c.feature),
            Change::ReferenceReplace(c) => Some(c.feature),
            Change::ReferenceInsert(c) => Some(c.feature),
            Change::ReferenceRemove(c) => Some(c.feature),
            Change::Compound(_) => None,
        }
    }

    /// Number of leaf changes contained in this change (1 for a leaf).
    pub fn leaf_count(&self) -> usize {
        match self {
            Change::Compound(c) => c.parts.iter().map(Change::leaf_count).sum(),
            _ => 1,
        }
    }
}

/// Kinds of change, including abstract classes and interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    // --- classes ---
    Change,
    FeatureChange,
    AttributeChange,
    ReferenceChange,
    AttributeReplace,
    ReferenceReplace,
    ReferenceInsert,
    ReferenceRemove,
    Compound,
    CreateAndInsert,
    RemoveAndDelete,

    // --- interfaces ---
    /// Adds a value or element.
    Additive,
    /// Takes a value or element away.
    Subtractive,
    /// Swaps one single value for another.
    SingleValuedReplace,
    /// Not decomposable into further changes.
    Atomic,
}

impl ChangeKind {
    /// Whether this kind is an interface rather than a class.
    pub fn is_interface(&self) -> bool {
        matches!(
            self,
            ChangeKind::Additive
                | ChangeKind::Subtractive
                | ChangeKind::SingleValuedReplace
                | ChangeKind::Atomic
        )
    }

    /// Superclass of a class kind. Interfaces have none.
    pub fn superclass(&self) -> Option<ChangeKind> {
        use ChangeKind::*;
        match self {
            Change => None,
            FeatureChange | Compound => Some(Change),
            AttributeChange | ReferenceChange => Some(FeatureChange),
            AttributeReplace => Some(AttributeChange),
            ReferenceReplace | ReferenceInsert | ReferenceRemove => Some(ReferenceChange),
            CreateAndInsert | RemoveAndDelete => Some(Compound),
            Additive | Subtractive | SingleValuedReplace | Atomic => None,
        }
    }

    /// Interfaces a class implements directly, or that an interface extends.
    pub fn interfaces(&self) -> &'static [ChangeKind] {
        use ChangeKind::*;
        match self {
            FeatureChange => &[Atomic],
            AttributeReplace | ReferenceReplace => &[SingleValuedReplace],
            ReferenceInsert | CreateAndInsert => &[Additive],
            ReferenceRemove | RemoveAndDelete => &[Subtractive],
            SingleValuedReplace => &[Additive, Subtractive],
            _ => &[],
        }
    }

    /// Every kind `self` satisfies, starting with `self`.
    ///
    /// Walks the superclass chain and, for each class on it, a breadth-first
    /// expansion of its interfaces. Each kind appears once.
    pub fn closure(&self) -> Vec<ChangeKind> {
        let mut seen = BTreeSet::new();
        let mut order = Vec::new();

        let mut class = Some(*self);
        while let Some(current) = class {
            if seen.insert(current) {
                order.push(current);
            }

            let mut queue: VecDeque<ChangeKind> = current.interfaces().iter().copied().collect();
            while let Some(iface) = queue.pop_front() {
                if !seen.insert(iface) {
                    continue;
                }
                order.push(iface);
                queue.extend(iface.interfaces().iter().copied());
            }

            class = current.superclass();
        }

        order
    }

    /// Whether a change of kind `self` satisfies `kind`.
    pub fn satisfies(&self, kind: ChangeKind) -> bool {
        self.closure().contains(&kind)
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}
