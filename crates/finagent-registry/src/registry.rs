//! Catalog loading and the read-only tool registry
//!
//! The registry is built once from a declarative JSON document and never
//! mutated afterwards. Iteration order is catalog insertion order, which keeps
//! every downstream decision deterministic.

use crate::descriptor::ToolDescriptor;
use crate::error::{RegistryError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Built-in production catalog, embedded at compile time
const BUILTIN_CATALOG: &str = include_str!("../catalog/tools.json");

/// Network binding for one tool server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerBinding {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Human-readable server description
    #[serde(default)]
    pub description: String,
}

/// Raw catalog document as it appears on disk
#[derive(Debug, Deserialize)]
struct CatalogDocument {
    servers: HashMap<String, ServerBinding>,
    tools: Vec<ToolDescriptor>,
}

/// A scored hit from a registry text search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Tool id of the matching descriptor
    pub id: String,
    /// Lexical relevance score, greater than zero
    pub score: f64,
}

/// Read-only catalog of tool descriptors
///
/// Keys are unique tool ids; a side vector preserves catalog insertion order
/// for stable iteration. The registry is freely shareable across threads
/// because nothing mutates after load.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolDescriptor>,
    order: Vec<String>,
    servers: HashMap<String, ServerBinding>,
}

impl ToolRegistry {
    /// Load the embedded production catalog
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_CATALOG)
    }

    /// Load a catalog from a file path
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| RegistryError::Io(e.to_string()))?;
        Self::from_json_str(&content)
    }

    /// Load a catalog from a JSON string
    pub fn from_json_str(content: &str) -> Result<Self> {
        let document: CatalogDocument =
            serde_json::from_str(content).map_err(|e| RegistryError::Parse(e.to_string()))?;
        Self::from_document(document)
    }

    fn from_document(document: CatalogDocument) -> Result<Self> {
        let mut tools = HashMap::new();
        let mut order = Vec::with_capacity(document.tools.len());

        for tool in document.tools {
            validate_tool(&tool, &document.servers)?;
            if tools.contains_key(&tool.id) {
                return Err(RegistryError::DuplicateTool(tool.id));
            }
            order.push(tool.id.clone());
            tools.insert(tool.id.clone(), tool);
        }

        tracing::info!(
            tools = order.len(),
            servers = document.servers.len(),
            "Loaded tool catalog"
        );

        Ok(Self {
            tools,
            order,
            servers: document.servers,
        })
    }

    /// Look up a descriptor by id
    ///
    /// A miss is a programming or configuration error, not a runtime
    /// condition, so it surfaces as [`RegistryError::ToolNotFound`].
    pub fn lookup(&self, id: &str) -> Result<&ToolDescriptor> {
        self.tools
            .get(id)
            .ok_or_else(|| RegistryError::ToolNotFound(id.to_string()))
    }

    /// Get a descriptor by id without treating a miss as an error
    pub fn get(&self, id: &str) -> Option<&ToolDescriptor> {
        self.tools.get(id)
    }

    /// Iterate descriptors in catalog insertion order
    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.order.iter().filter_map(|id| self.tools.get(id))
    }

    /// All descriptors in a category, in catalog insertion order
    pub fn list_by_category(&self, category: &str) -> Vec<&ToolDescriptor> {
        self.iter().filter(|t| t.category == category).collect()
    }

    /// Position of a tool in the catalog, used as the final selection tie-break
    pub fn insertion_index(&self, id: &str) -> Option<usize> {
        self.order.iter().position(|t| t == id)
    }

    /// Get a server binding by name
    pub fn server(&self, name: &str) -> Option<&ServerBinding> {
        self.servers.get(name)
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Rank all descriptors against a query by lexical relevance
    ///
    /// Returns only hits with a positive score, best first. Equal scores keep
    /// catalog insertion order.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let mut hits: Vec<SearchHit> = self
            .iter()
            .filter_map(|tool| {
                let score = tool.relevance(query);
                (score > 0.0).then(|| SearchHit {
                    id: tool.id.clone(),
                    score,
                })
            })
            .collect();

        // Stable sort keeps insertion order among equal scores
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits
    }

    /// Formatted tool-description block for synthesizer prompts
    pub fn prompt_summary(&self) -> String {
        let mut blocks = Vec::with_capacity(self.len());

        for tool in self.iter() {
            let required: Vec<&str> = tool.required_params().map(|p| p.name.as_str()).collect();
            let examples: Vec<&str> = tool
                .examples
                .iter()
                .take(2)
                .map(String::as_str)
                .collect();

            blocks.push(format!(
                "Tool: {}\nDescription: {}\nWhen to use: {}\nExamples: {}\nRequires: {}",
                tool.id,
                tool.description,
                tool.when_to_use,
                examples.join(", "),
                required.join(", "),
            ));
        }

        blocks.join("\n\n")
    }
}

/// Validate one descriptor against the declared servers
fn validate_tool(tool: &ToolDescriptor, servers: &HashMap<String, ServerBinding>) -> Result<()> {
    if !servers.contains_key(&tool.server) {
        return Err(RegistryError::UnknownServer {
            tool: tool.id.clone(),
            server: tool.server.clone(),
        });
    }

    if tool.cost < 0.0 {
        return Err(RegistryError::InvalidCost {
            tool: tool.id.clone(),
            cost: tool.cost,
        });
    }

    let mut seen = std::collections::HashSet::new();
    for param in &tool.params {
        if !seen.insert(param.name.as_str()) {
            return Err(RegistryError::InvalidParam {
                tool: tool.id.clone(),
                param: param.name.clone(),
                reason: "duplicate parameter name".to_string(),
            });
        }

        if let Some(default) = &param.default {
            if param.required {
                tracing::warn!(
                    tool = %tool.id,
                    param = %param.name,
                    "Required parameter carries a default; default is ignored"
                );
            } else if !param.param_type.accepts(default) {
                return Err(RegistryError::InvalidParam {
                    tool: tool.id.clone(),
                    param: param.name.clone(),
                    reason: format!(
                        "default {default} is incompatible with declared type {:?}",
                        param.param_type
                    ),
                });
            }
        }
    }

    Ok(())
}
