//! Features and snapshot values carried by change events.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Flow direction of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowDirection {
    In,
    Out,
    InOut,
}

impl fmt::Display for FlowDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowDirection::In => write!(f, "IN"),
            FlowDirection::Out => write!(f, "OUT"),
            FlowDirection::InOut => write!(f, "INOUT"),
        }
    }
}

/// Aggregation kind of a property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregationKind {
    #[default]
    None,
    Shared,
    Composite,
}

/// The primitive types a block-domain model can import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SourcePrimitive {
    Boolean,
    Integer,
    Real,
    UnlimitedNatural,
    String,
}

impl SourcePrimitive {
    /// All primitive types, in import order.
    pub const ALL: [SourcePrimitive; 5] = [
        SourcePrimitive::Boolean,
        SourcePrimitive::Integer,
        SourcePrimitive::Real,
        SourcePrimitive::UnlimitedNatural,
        SourcePrimitive::String,
    ];

    /// Parse a primitive type name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }

    /// Canonical type name.
    pub fn name(&self) -> &'static str {
        match self {
            SourcePrimitive::Boolean => "Boolean",
            SourcePrimitive::Integer => "Integer",
            SourcePrimitive::Real => "Real",
            SourcePrimitive::UnlimitedNatural => "UnlimitedNatural",
            SourcePrimitive::String => "String",
        }
    }
}

impl fmt::Display for SourcePrimitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Structural features of block-domain elements that change events refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureId {
    Name,
    IsEncapsulated,
    /// Blocks packaged in a model root.
    PackagedElements,
    OwnedPorts,
    OwnedProperties,
    /// Type reference of a port or property.
    Type,
    Direction,
    IsReadOnly,
    Aggregation,
    /// Primitive types imported into a model root.
    PrimitiveTypeImports,
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// An attribute value snapshotted when a change was recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Text(String),
    Bool(bool),
    Direction(FlowDirection),
    Aggregation(AggregationKind),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_direction(&self) -> Option<FlowDirection> {
        match self {
            Value::Direction(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "\"{s}\""),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Direction(d) => write!(f, "{d}"),
            Value::Aggregation(a) => write!(f, "{a:?}"),
        }
    }
}
