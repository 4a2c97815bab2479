//! Port mapping, conditioned on the kind of the owning component.
//!
//! In a message-based component a port becomes a message whose access
//! mirrors the flow direction. In a method-based component an `IN` port
//! becomes a parameter and an `OUT` port a return value of a method the
//! user chooses or names; `INOUT` ports have no method-based mapping.

use tracing::{debug, info};

use blocksync_model::{
    Change, ChangeKind, ComponentKind, ElementId, ElementKind, FeatureId, FlowDirection, Port,
    SourceModel, Value,
};

use crate::context::ExecutionContext;
use crate::error::{DecisionError, SyncError};
use crate::registry::TransformationRule;

use super::{attribute_replace, created_element, reference_replace};

/// Name given to a new method when the user leaves the name empty.
pub const UNNAMED_METHOD: &str = "unnamedMethod";

const CREATE_METHOD: &str = "Create a new method";
const USE_EXISTING_METHOD: &str = "Use an existing method";

/// Readable/writable access of a message mapped from a port.
pub fn access_for(direction: FlowDirection) -> (bool, bool) {
    match direction {
        FlowDirection::In => (true, false),
        FlowDirection::Out => (false, true),
        FlowDirection::InOut => (true, true),
    }
}

/// Maps a port created on a block that already has a component.
#[derive(Debug, Clone, Copy, Default)]
pub struct PortMapping;

impl TransformationRule for PortMapping {
    fn name(&self) -> &'static str {
        "port-mapping"
    }

    fn expected_kind(&self) -> ChangeKind {
        ChangeKind::CreateAndInsert
    }

    fn precondition(&self, change: &Change, source: &SourceModel) -> bool {
        created_element(change)
            .is_some_and(|e| e.kind == ElementKind::Port && source.port(e.id).is_some())
    }

    fn execute(&self, change: &Change, ctx: &mut ExecutionContext<'_>) -> Result<(), SyncError> {
        let Some(element) = created_element(change) else {
            return Ok(());
        };
        let Some(port) = ctx.source.port(element.id).cloned() else {
            return Ok(());
        };
        if ctx.correspondences.is_linked(port.id) {
            debug!(port = %port.name, "port already mapped");
            return Ok(());
        }
        let Some(component) = ctx.component_of(port.owner) else {
            debug!(port = %port.name, "owning block has no component");
            return Ok(());
        };
        let kind = ctx
            .target
            .component(component.id)
            .ok_or(SyncError::DanglingCorrespondence(component.id))?
            .kind;
        let type_ref = ctx.resolve_type(port.type_ref);

        let mapped = match (kind, port.direction) {
            (ComponentKind::MessageContainer, direction) => {
                let (readable, writable) = access_for(direction);
                ctx.target
                    .add_message(component.id, port.name.as_str(), readable, writable, type_ref)?
            }
            (ComponentKind::MethodContainer, FlowDirection::In) => {
                let method = choose_method(ctx, component.id, &port)?;
                ctx.target
                    .add_parameter(method, port.name.as_str(), type_ref)?
            }
            (ComponentKind::MethodContainer, FlowDirection::Out) => {
                let method = choose_method(ctx, component.id, &port)?;
                ctx.target
                    .set_return_value(method, port.name.as_str(), type_ref)?
            }
            (ComponentKind::MethodContainer, FlowDirection::InOut) => {
                info!(
                    port = %port.name,
                    "INOUT ports cannot be mapped into a method-based component"
                );
                return Ok(());
            }
        };

        ctx.correspondences.link_one(element, mapped)?;
        ctx.stage_unit_save(mapped.id)?;
        info!(port = %port.name, direction = %port.direction, mapped = %mapped, "mapped port");
        Ok(())
    }
}

/// Pick the method an `IN` or `OUT` port is mapped into.
///
/// Eligible methods are every method for `IN`, and methods without a
/// return value for `OUT`. With at least one eligible method the user
/// chooses between creating a method and reusing one.
fn choose_method(
    ctx: &mut ExecutionContext<'_>,
    component: ElementId,
    port: &Port,
) -> Result<ElementId, SyncError> {
    let eligible: Vec<(ElementId, String)> = ctx
        .target
        .methods_of(component)
        .into_iter()
        .filter(|m| port.direction != FlowDirection::Out || m.return_value.is_none())
        .filter_map(|m| ctx.target.signature(m.id).map(|sig| (m.id, sig)))
        .collect();

    if !eligible.is_empty() {
        let options = vec![CREATE_METHOD.to_string(), USE_EXISTING_METHOD.to_string()];
        let choice = ctx.decisions.select_one(
            &format!("Map port '{}' into a new or an existing method?", port.name),
            &options,
        )?;
        if choice == 1 {
            let signatures: Vec<String> = eligible.iter().map(|(_, sig)| sig.clone()).collect();
            let index = ctx.decisions.select_one(
                &format!("Select the method for port '{}'", port.name),
                &signatures,
            )?;
            let (method, signature) =
                eligible
                    .get(index)
                    .ok_or(DecisionError::OutOfRange {
                        index,
                        options: eligible.len(),
                    })?;
            debug!(port = %port.name, method = %signature, "reusing method");
            return Ok(*method);
        }
    }

    let answer = ctx
        .decisions
        .request_text(&format!("Name of the new method for port '{}'", port.name))?;
    let name = match answer.trim() {
        "" => UNNAMED_METHOD,
        name => name,
    };
    let method = ctx.target.add_method(component, name)?;
    debug!(port = %port.name, method = name, "created method");
    Ok(method.id)
}

/// Re-resolves the type of whatever a retyped port or plain property maps to.
#[derive(Debug, Clone, Copy, Default)]
pub struct PortRetype;

impl TransformationRule for PortRetype {
    fn name(&self) -> &'static str {
        "retype"
    }

    fn expected_kind(&self) -> ChangeKind {
        ChangeKind::ReferenceReplace
    }

    fn precondition(&self, change: &Change, source: &SourceModel) -> bool {
        reference_replace(change).is_some_and(|c| {
            c.feature == FeatureId::Type
                && match c.target.kind {
                    ElementKind::Port => true,
                    ElementKind::Property => source
                        .property(c.target.id)
                        .is_some_and(|p| !p.is_part_reference()),
                    _ => false,
                }
        })
    }

    fn execute(&self, change: &Change, ctx: &mut ExecutionContext<'_>) -> Result<(), SyncError> {
        let Some(c) = reference_replace(change) else {
            return Ok(());
        };
        let type_ref = ctx.resolve_type(c.new);
        for counterpart in ctx.counterparts(c.target.id) {
            match counterpart.kind {
                ElementKind::Message
                | ElementKind::Parameter
                | ElementKind::ReturnValue
                | ElementKind::Variable => {
                    ctx.target.set_type(counterpart.id, type_ref)?;
                    ctx.stage_unit_save(counterpart.id)?;
                    debug!(element = %counterpart, "retyped counterpart");
                }
                _ => debug!(element = %counterpart, "counterpart is not typed"),
            }
        }
        Ok(())
    }
}

/// Recomputes message access when a port's direction changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PortDirection;

impl TransformationRule for PortDirection {
    fn name(&self) -> &'static str {
        "port-direction"
    }

    fn expected_kind(&self) -> ChangeKind {
        ChangeKind::AttributeReplace
    }

    fn precondition(&self, change: &Change, _source: &SourceModel) -> bool {
        attribute_replace(change).is_some_and(|c| {
            c.feature == FeatureId::Direction
                && c.target.kind == ElementKind::Port
                && c.new.as_ref().and_then(Value::as_direction).is_some()
        })
    }

    fn execute(&self, change: &Change, ctx: &mut ExecutionContext<'_>) -> Result<(), SyncError> {
        let Some(c) = attribute_replace(change) else {
            return Ok(());
        };
        let Some(direction) = c.new.as_ref().and_then(Value::as_direction) else {
            return Ok(());
        };

        for counterpart in ctx.counterparts(c.target.id) {
            if counterpart.kind != ElementKind::Message {
                info!(
                    element = %counterpart,
                    %direction,
                    "direction changes are not propagated into method-based components"
                );
                continue;
            }
            let message = ctx
                .target
                .message(counterpart.id)
                .ok_or(SyncError::DanglingCorrespondence(counterpart.id))?;
            let container = ctx.target.component(message.owner).map(|c| c.kind);
            if container != Some(ComponentKind::MessageContainer) {
                return Err(SyncError::StructuralViolation(format!(
                    "message '{}' is not contained in a message-based component",
                    message.name
                )));
            }
            let (readable, writable) = access_for(direction);
            ctx.target.set_access(counterpart.id, readable, writable)?;
            ctx.stage_unit_save(counterpart.id)?;
        }
        Ok(())
    }
}
