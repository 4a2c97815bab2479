//! Error types for the domain models.

use crate::element::{ElementId, ElementKind};

/// Errors from model lookups and edits.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("element {0} not found")]
    ElementNotFound(ElementId),

    #[error("element {id} is a {actual}, expected {expected}")]
    WrongKind {
        id: ElementId,
        actual: ElementKind,
        expected: ElementKind,
    },

    #[error("no block named '{0}'")]
    UnknownBlock(String),

    #[error("no member '{member}' on block '{block}'")]
    UnknownMember { block: String, member: String },

    #[error("primitive type {0} has not been imported")]
    PrimitiveNotImported(String),
}
