//! Tool capability registry for finagent-rs
//!
//! Tools live on remote data/analysis servers; this crate holds the static
//! catalog describing them. A catalog is a declarative JSON document with
//! `servers` (name to binding) and `tools` (descriptor entries). It is
//! validated once at load time and immutable afterwards, so a loaded
//! [`ToolRegistry`] can be shared across conversations without locking.

pub mod descriptor;
pub mod error;
pub mod registry;

pub use descriptor::{ParamSpec, ParamType, ToolDescriptor};
pub use error::{RegistryError, Result};
pub use registry::{SearchHit, ServerBinding, ToolRegistry};
