//! Rule registry: which transformation rules react to which changes.
//!
//! Rules are registered against a [`ChangeKind`]. For a concrete change the
//! candidate set is every rule registered against any kind in the change's
//! kind closure (superclasses and interfaces), in registration order. The
//! relevant set keeps the candidates whose precondition holds.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use blocksync_model::{Change, ChangeKind, SourceModel};

use crate::context::ExecutionContext;
use crate::error::SyncError;

/// A (precondition, effect) pair reacting to one kind of change.
///
/// Object-safe so rules can be stored in `Box<dyn TransformationRule>`.
pub trait TransformationRule: fmt::Debug + Send + Sync {
    /// Stable name used in logs and failure reports.
    fn name(&self) -> &'static str;

    /// Kind of change this rule is registered against.
    fn expected_kind(&self) -> ChangeKind;

    /// Whether the rule applies to `change`. May read the live source model.
    fn precondition(&self, change: &Change, source: &SourceModel) -> bool;

    /// Apply the rule. Local recoveries return `Ok(())` after logging.
    fn execute(&self, change: &Change, ctx: &mut ExecutionContext<'_>) -> Result<(), SyncError>;
}

/// Rules indexed by the change kind they react to.
#[derive(Debug, Default)]
pub struct RuleRegistry {
    rules: Vec<Box<dyn TransformationRule>>,
    by_kind: BTreeMap<ChangeKind, Vec<usize>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule. Registration order fixes iteration order.
    pub fn register(&mut self, rule: impl TransformationRule + 'static) {
        self.register_boxed(Box::new(rule));
    }

    pub fn register_boxed(&mut self, rule: Box<dyn TransformationRule>) {
        let index = self.rules.len();
        self.by_kind
            .entry(rule.expected_kind())
            .or_default()
            .push(index);
        self.rules.push(rule);
    }

    /// Rules registered against any kind `kind` satisfies.
    pub fn candidates(&self, kind: ChangeKind) -> Vec<&dyn TransformationRule> {
        let indices: BTreeSet<usize> = kind
            .closure()
            .into_iter()
            .filter_map(|k| self.by_kind.get(&k))
            .flatten()
            .copied()
            .collect();
        indices.into_iter().map(|i| self.rules[i].as_ref()).collect()
    }

    /// Candidates for `change` whose precondition holds.
    pub fn relevant(&self, change: &Change, source: &SourceModel) -> Vec<&dyn TransformationRule> {
        self.candidates(change.kind())
            .into_iter()
            .filter(|rule| rule.precondition(change, source))
            .collect()
    }

    /// Names of all registered rules, in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
