pub mod base;
pub mod registry;
pub mod transform;
pub mod xpath;

#[cfg(test)]
mod tests;

pub use base::{MCPTool, Schema, SchemaObject, SchemaString, StringFormat, ToolContent, ToolResponse};
pub use registry::{ToolRegistry, ToolRegistryBuilder};
pub use transform::TransformTool;
pub use xpath::{query_markup, select_markup, SelectTool, XPathTool, XPathWithUrlTool};
