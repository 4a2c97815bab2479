//! Domain models and change events for blocksync.
//!
//! Two structurally different models are kept consistent by the engine:
//! the block domain ([`SourceModel`]: blocks, ports, properties, typed flows)
//! and the component domain ([`TargetModel`]: components, methods, messages,
//! variables, parameters). Edits to the block domain are described as a
//! stream of [`Change`] events, which the [`SourceEditor`] records while it
//! mutates a live [`SourceModel`].

pub mod change;
pub mod editor;
pub mod element;
pub mod error;
pub mod source;
pub mod target;
pub mod value;

pub use change::{
    AttributeReplace, Change, ChangeKind, CompoundChange, CompoundKind, ReferenceInsert,
    ReferenceRemove, ReferenceReplace,
};
pub use editor::SourceEditor;
pub use element::{ElementId, ElementKind, ElementRef};
pub use error::ModelError;
pub use source::{Block, Port, PrimitiveType, Property, SourceElement, SourceModel};
pub use target::{
    Component, ComponentKind, Constant, Message, Method, Parameter, PrimitiveRepository,
    PrimitiveTag, Representative, ReturnValue, Subtree, TargetElement, TargetModel, Variable,
};
pub use value::{AggregationKind, FeatureId, FlowDirection, SourcePrimitive, Value};
