//! Error types for registry operations

use thiserror::Error;

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors raised while loading or querying the tool catalog
///
/// Load-time variants are fatal: a process should refuse to start on a
/// malformed catalog rather than discover the problem at call time.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Catalog file could not be read
    #[error("Failed to read catalog: {0}")]
    Io(String),

    /// Catalog document is not valid JSON or is missing fields
    #[error("Failed to parse catalog: {0}")]
    Parse(String),

    /// Two catalog entries share the same tool id
    #[error("Duplicate tool id: {0}")]
    DuplicateTool(String),

    /// A tool references a server that is not declared
    #[error("Tool {tool} references unknown server {server}")]
    UnknownServer { tool: String, server: String },

    /// A parameter spec is malformed
    #[error("Invalid parameter {param} on {tool}: {reason}")]
    InvalidParam {
        tool: String,
        param: String,
        reason: String,
    },

    /// Tool cost must be non-negative
    #[error("Invalid cost {cost} for {tool}")]
    InvalidCost { tool: String, cost: f64 },

    /// Lookup by an id the catalog does not contain
    #[error("Tool not found: {0}")]
    ToolNotFound(String),
}
