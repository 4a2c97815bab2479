//! The dispatcher: applies one top-level change to a model pair.

use tracing::{debug, info, warn};

use blocksync_model::Change;

use crate::aggregator::ResultAggregator;
use crate::context::{ExecutionContext, ModelPair};
use crate::decision::DecisionPort;
use crate::error::{DispatchFailure, SyncError};
use crate::location::LocationScheme;
use crate::modification::ModificationRegistry;
use crate::registry::{RuleRegistry, TransformationRule};
use crate::rules::default_rules;

/// Applies change events to a model pair through a rule registry.
///
/// Callers must serialize calls to [`apply_change`](Self::apply_change);
/// the engine is single-threaded and not reentrant.
#[derive(Debug, Default)]
pub struct SyncEngine {
    rules: RuleRegistry,
    locations: LocationScheme,
    modifications: ModificationRegistry,
}

impl SyncEngine {
    /// An engine with no rules.
    pub fn new(locations: LocationScheme) -> Self {
        Self {
            rules: RuleRegistry::new(),
            locations,
            modifications: ModificationRegistry::new(),
        }
    }

    /// An engine with the full block/component rule set.
    pub fn with_default_rules(locations: LocationScheme) -> Self {
        let mut engine = Self::new(locations);
        for rule in default_rules() {
            engine.rules.register_boxed(rule);
        }
        engine
    }

    /// Builder: register an additional rule.
    pub fn with_rule(mut self, rule: impl TransformationRule + 'static) -> Self {
        self.rules.register(rule);
        self
    }

    pub fn register(&mut self, rule: impl TransformationRule + 'static) {
        self.rules.register(rule);
    }

    pub fn rules(&self) -> &RuleRegistry {
        &self.rules
    }

    pub fn locations(&self) -> &LocationScheme {
        &self.locations
    }

    /// Apply one top-level change.
    ///
    /// Compound parts are dispatched first, depth-first in order, then the
    /// rules matching the compound itself. The modification registry is
    /// flushed when this returns, whatever the outcome. On failure the
    /// results merged before the failing rule are returned with the error.
    pub fn apply_change(
        &self,
        change: &Change,
        pair: &mut ModelPair,
        decisions: &mut dyn DecisionPort,
    ) -> Result<ResultAggregator, DispatchFailure> {
        let _scope = self.modifications.scope();
        info!(kind = %change.kind(), leaves = change.leaf_count(), "applying change");

        let mut total = ResultAggregator::new();
        match self.dispatch(change, pair, decisions, &mut total) {
            Ok(()) => Ok(total),
            Err((rule, error)) => {
                warn!(rule, %error, "rule failed, aborting change");
                Err(DispatchFailure {
                    rule,
                    error,
                    partial: total,
                })
            }
        }
    }

    fn dispatch(
        &self,
        change: &Change,
        pair: &mut ModelPair,
        decisions: &mut dyn DecisionPort,
        total: &mut ResultAggregator,
    ) -> Result<(), (&'static str, SyncError)> {
        if let Change::Compound(compound) = change {
            for part in &compound.parts {
                self.dispatch(part, pair, decisions, total)?;
            }
        }

        let relevant = self.rules.relevant(change, &pair.source);
        if relevant.is_empty() {
            debug!(kind = %change.kind(), "no relevant rules");
            return Ok(());
        }

        for rule in relevant {
            debug!(rule = rule.name(), kind = %change.kind(), "executing rule");
            let mut ctx =
                ExecutionContext::new(pair, decisions, &self.locations, &self.modifications);
            rule.execute(change, &mut ctx)
                .map_err(|error| (rule.name(), error))?;
            total.merge(ctx.into_results());
        }
        Ok(())
    }
}
