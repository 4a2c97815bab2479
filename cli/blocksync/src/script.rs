//! JSON edit scripts.
//!
//! A script is a list of edit operations on the block model, optionally
//! followed by the answers to give when a rule asks a question:
//!
//! ```json
//! {
//!   "ops": [
//!     { "op": "import_primitives" },
//!     { "op": "create_block", "name": "Sample" },
//!     { "op": "set_encapsulated", "block": "Sample" },
//!     { "op": "add_port", "block": "Sample", "name": "P1",
//!       "direction": "In", "type": "Boolean" },
//!     { "op": "rename", "element": "Sample", "name": "Renamed" }
//!   ],
//!   "answers": [ { "choice": 0 } ]
//! }
//! ```
//!
//! Elements are addressed by name: `Block` or `Block.member`. Types are a
//! primitive type name or a block name.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use blocksync_engine::Answer;
use blocksync_model::{
    AggregationKind, ElementId, FlowDirection, SourceEditor, SourceModel, SourcePrimitive,
};
use serde::{Deserialize, Serialize};

/// A parsed edit script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditScript {
    pub ops: Vec<EditOp>,
    /// Scripted answers. Without them, questions go to the terminal.
    #[serde(default)]
    pub answers: Option<Vec<Answer>>,
}

/// One edit on the block model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOp {
    ImportPrimitives,
    CreateBlock {
        name: String,
    },
    SetEncapsulated {
        block: String,
        #[serde(default = "yes")]
        value: bool,
    },
    Rename {
        element: String,
        name: String,
    },
    AddPort {
        block: String,
        name: String,
        direction: FlowDirection,
        #[serde(default, rename = "type")]
        type_name: Option<String>,
    },
    AddProperty {
        block: String,
        name: String,
        #[serde(default)]
        aggregation: AggregationKind,
        #[serde(default)]
        read_only: bool,
        #[serde(default, rename = "type")]
        type_name: Option<String>,
    },
    SetType {
        element: String,
        #[serde(default, rename = "type")]
        type_name: Option<String>,
    },
    SetDirection {
        port: String,
        direction: FlowDirection,
    },
    SetReadOnly {
        property: String,
        #[serde(default = "yes")]
        value: bool,
    },
    Delete {
        element: String,
    },
}

fn yes() -> bool {
    true
}

impl EditScript {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

impl EditOp {
    /// Short description for progress output and error context.
    pub fn describe(&self) -> String {
        match self {
            EditOp::ImportPrimitives => "import primitive types".into(),
            EditOp::CreateBlock { name } => format!("create block {name}"),
            EditOp::SetEncapsulated { block, value } => {
                format!("set {block} encapsulated={value}")
            }
            EditOp::Rename { element, name } => format!("rename {element} to {name}"),
            EditOp::AddPort {
                block,
                name,
                direction,
                ..
            } => format!("add {direction} port {block}.{name}"),
            EditOp::AddProperty { block, name, .. } => format!("add property {block}.{name}"),
            EditOp::SetType { element, type_name } => format!(
                "set type of {element} to {}",
                type_name.as_deref().unwrap_or("nothing")
            ),
            EditOp::SetDirection { port, direction } => {
                format!("set direction of {port} to {direction}")
            }
            EditOp::SetReadOnly { property, value } => {
                format!("set {property} read-only={value}")
            }
            EditOp::Delete { element } => format!("delete {element}"),
        }
    }

    /// Perform the edit, recording its changes in `editor`.
    pub fn apply(&self, editor: &mut SourceEditor, model: &mut SourceModel) -> Result<()> {
        match self {
            EditOp::ImportPrimitives => editor.import_primitive_types(model),
            EditOp::CreateBlock { name } => {
                if model.block_by_name(name).is_some() {
                    return Err(anyhow!("block '{name}' already exists"));
                }
                editor.create_block(model, name);
            }
            EditOp::SetEncapsulated { block, value } => {
                let id = find_block(model, block)?;
                editor.set_encapsulated(model, id, *value)?;
            }
            EditOp::Rename { element, name } => {
                let id = find_element(model, element)?;
                editor.rename(model, id, name)?;
            }
            EditOp::AddPort {
                block,
                name,
                direction,
                type_name,
            } => {
                let owner = find_block(model, block)?;
                let type_id = find_type(model, type_name.as_deref())?;
                editor.add_port(model, owner, name, *direction, type_id)?;
            }
            EditOp::AddProperty {
                block,
                name,
                aggregation,
                read_only,
                type_name,
            } => {
                let owner = find_block(model, block)?;
                let type_id = find_type(model, type_name.as_deref())?;
                editor.add_property(model, owner, name, *aggregation, *read_only, type_id)?;
            }
            EditOp::SetType { element, type_name } => {
                let id = find_element(model, element)?;
                let type_id = find_type(model, type_name.as_deref())?;
                editor.set_type(model, id, type_id)?;
            }
            EditOp::SetDirection { port, direction } => {
                let id = find_element(model, port)?;
                editor.set_direction(model, id, *direction)?;
            }
            EditOp::SetReadOnly { property, value } => {
                let id = find_element(model, property)?;
                editor.set_read_only(model, id, *value)?;
            }
            EditOp::Delete { element } => {
                let id = find_element(model, element)?;
                editor.delete(model, id)?;
            }
        }
        Ok(())
    }
}

fn find_block(model: &SourceModel, name: &str) -> Result<ElementId> {
    model
        .block_by_name(name)
        .map(|b| b.id)
        .ok_or_else(|| anyhow!("no block named '{name}'"))
}

/// Resolve `Block` or `Block.member`.
fn find_element(model: &SourceModel, path: &str) -> Result<ElementId> {
    match path.split_once('.') {
        None => find_block(model, path),
        Some((block, member)) => {
            let owner = find_block(model, block)?;
            model
                .member_by_name(owner, member)
                .map(|m| m.id())
                .ok_or_else(|| anyhow!("block '{block}' has no port or property '{member}'"))
        }
    }
}

/// Resolve a primitive type name or a block name.
fn find_type(model: &SourceModel, name: Option<&str>) -> Result<Option<ElementId>> {
    let Some(name) = name else {
        return Ok(None);
    };
    if let Some(primitive) = SourcePrimitive::from_name(name) {
        return model
            .primitive_id(primitive)
            .map(Some)
            .ok_or_else(|| anyhow!("primitive type '{name}' is not imported"));
    }
    find_block(model, name).map(Some)
}
