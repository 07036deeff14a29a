use crate::graph::{Node, NodeConfig, Position};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Port kinds understood by the execution backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortType {
    Text,
    TokenIds,
    Tensor,
    AdTensor,
    Scalar,
    Int,
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PortType::Text => "TEXT",
            PortType::TokenIds => "TOKEN_IDS",
            PortType::Tensor => "TENSOR",
            PortType::AdTensor => "AD_TENSOR",
            PortType::Scalar => "SCALAR",
            PortType::Int => "INT",
        };
        f.write_str(name)
    }
}

/// A named, typed connection point on a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub name: String,
    #[serde(rename = "type")]
    pub port_type: PortType,
    #[serde(default)]
    pub optional: bool,
}

impl Port {
    pub fn required(name: &str, port_type: PortType) -> Self {
        Self {
            name: name.to_string(),
            port_type,
            optional: false,
        }
    }

    pub fn optional(name: &str, port_type: PortType) -> Self {
        Self {
            name: name.to_string(),
            port_type,
            optional: true,
        }
    }
}

/// One module the backend knows how to execute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleCatalogEntry {
    #[serde(rename = "type")]
    pub module_type: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default_config: NodeConfig,
    #[serde(default)]
    pub inputs: Vec<Port>,
    #[serde(default)]
    pub outputs: Vec<Port>,
}

/// Body of `GET /api/v1/modules`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModulesResponse {
    pub modules: Vec<ModuleCatalogEntry>,
}

/// The module catalog, indexed by module type.
#[derive(Debug, Clone, Default)]
pub struct ModuleCatalog {
    modules: Vec<ModuleCatalogEntry>,
    index: AHashMap<String, usize>,
}

impl ModuleCatalog {
    pub fn from_modules(modules: Vec<ModuleCatalogEntry>) -> Self {
        let index = modules
            .iter()
            .enumerate()
            .map(|(i, m)| (m.module_type.clone(), i))
            .collect();
        Self { modules, index }
    }

    /// Parses a catalog from the `{"modules": [...]}` JSON shape.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let response: ModulesResponse = serde_json::from_str(json)?;
        Ok(Self::from_modules(response.modules))
    }

    pub fn get(&self, module_type: &str) -> Option<&ModuleCatalogEntry> {
        self.index.get(module_type).map(|&i| &self.modules[i])
    }

    pub fn modules(&self) -> &[ModuleCatalogEntry] {
        &self.modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Builds a fresh node for a catalog module, as the palette does when a module
    /// is dropped on the canvas. Returns `None` for unknown module types.
    pub fn instantiate(&self, module_type: &str, id: &str, position: Position) -> Option<Node> {
        let entry = self.get(module_type)?;
        Some(Node {
            id: id.to_string(),
            module_type: entry.module_type.clone(),
            category: entry.category.clone(),
            label: id.to_string(),
            config: entry.default_config.clone(),
            inputs: entry.inputs.clone(),
            outputs: entry.outputs.clone(),
            position: Some(position),
        })
    }
}
