//! Change-driven transformation engine for blocksync.
//!
//! The engine consumes [`Change`](blocksync_model::Change) events recorded on
//! a block-domain model and keeps a component-domain model consistent with
//! it. For every top-level change the [`SyncEngine`] selects the relevant
//! [`TransformationRule`]s through the change-kind hierarchy, runs them
//! against an [`ExecutionContext`], and returns a [`ResultAggregator`] of
//! staged save and delete intents for the persistence layer.

pub mod aggregator;
pub mod context;
pub mod decision;
pub mod engine;
pub mod error;
pub mod location;
pub mod modification;
pub mod primitives;
pub mod registry;
pub mod rules;

pub use aggregator::{PersistStep, ResultAggregator, SaveIntent};
pub use context::{ExecutionContext, ModelPair};
pub use decision::{Answer, DecisionPort, ScriptedDecisions};
pub use engine::SyncEngine;
pub use error::{DecisionError, DispatchFailure, SyncError};
pub use location::{Location, LocationScheme};
pub use modification::{ModificationRegistry, ModificationScope};
pub use registry::{RuleRegistry, TransformationRule};
