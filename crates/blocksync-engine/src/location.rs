//! Location derivation for persisted units.
//!
//! Locations are derived from names: `<model-dir>/<logical-name>.<extension>`.
//! Component units use the logical name `<prefix>-<block name>`, so renaming
//! a block relocates its component.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a persisted unit lives, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location(String);

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How locations are derived for one model pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationScheme {
    /// Directory holding persisted units.
    pub model_dir: String,
    /// File extension of persisted units, without the dot.
    pub extension: String,
    /// Prefix of component logical names.
    pub component_prefix: String,
    /// Logical name of the primitive-type repository.
    pub primitive_repository: String,
}

impl Default for LocationScheme {
    fn default() -> Self {
        Self {
            model_dir: "model".into(),
            extension: "asem".into(),
            component_prefix: "ASEM-Model".into(),
            primitive_repository: "ASEM-PrimitiveTypes".into(),
        }
    }
}

impl LocationScheme {
    /// `<model-dir>/<logical-name>.<extension>`.
    pub fn location_for(&self, logical_name: &str) -> Location {
        let dir = self.model_dir.trim_end_matches('/');
        if dir.is_empty() {
            Location(format!("{logical_name}.{}", self.extension))
        } else {
            Location(format!("{dir}/{logical_name}.{}", self.extension))
        }
    }

    /// Logical name of the component mapped from a block.
    ///
    /// Path separators in the block name are replaced by `_`, so the unit
    /// always lands directly in the model directory.
    pub fn component_name(&self, block_name: &str) -> String {
        let file_name: String = block_name
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
            .collect();
        format!("{}-{file_name}", self.component_prefix)
    }

    /// Location of the component mapped from a block.
    pub fn component_location(&self, block_name: &str) -> Location {
        self.location_for(&self.component_name(block_name))
    }

    /// Fixed location of the primitive-type repository.
    pub fn primitive_repository_location(&self) -> Location {
        self.location_for(&self.primitive_repository)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_component_location() {
        let scheme = LocationScheme::default();
        assert_eq!(
            scheme.component_location("Sample").as_str(),
            "model/ASEM-Model-Sample.asem"
        );
        assert_eq!(
            scheme.primitive_repository_location().as_str(),
            "model/ASEM-PrimitiveTypes.asem"
        );
    }

    #[test]
    fn custom_scheme() {
        let scheme = LocationScheme {
            model_dir: "out/units/".into(),
            extension: "json".into(),
            component_prefix: "C".into(),
            primitive_repository: "Prims".into(),
        };
        assert_eq!(scheme.component_location("X").as_str(), "out/units/C-X.json");

        let flat = LocationScheme {
            model_dir: String::new(),
            ..scheme
        };
        assert_eq!(flat.location_for("Prims").as_str(), "Prims.json");
    }

    #[test]
    fn block_names_cannot_leave_model_dir() {
        let scheme = LocationScheme::default();
        assert_eq!(
            scheme.component_location("../x").as_str(),
            "model/ASEM-Model-.._x.asem"
        );
        assert_eq!(
            scheme.component_location("a/b\\c").as_str(),
            "model/ASEM-Model-a_b_c.asem"
        );
    }
}
