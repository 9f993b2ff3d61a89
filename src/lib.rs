//! # XML Query MCP
//!
//! 一个基于 MCP (Model Context Protocol) 的 XML/HTML 查询与 XSLT 转换服务。
//!
//! ## 特性
//!
//! - 🔍 **XPath 查询** - 查询内联 XML/HTML 内容，结果规范化为确定的文本
//! - 🌐 **远程查询** - 通过 HTTP 或无头浏览器获取页面后查询
//! - 🔄 **XSLT 转换** - 调用 xsltproc 执行 XSLT 1.0 样式表
//! - 🚀 **MCP协议** - 基于标准MCP协议，支持stdio模式通信
//!
//! ## 快速开始
//!
//! ```no_run
//! use xml_query_mcp::config::ServerConfig;
//! use xml_query_mcp::mcp::{MCPServer, Server};
//! use xml_query_mcp::tools::ToolRegistry;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = ToolRegistry::for_profile(&ServerConfig::default())?;
//!     let name = registry.name().to_string();
//!     let mut server = Server::new(name, "0.1.0".to_string(), MCPServer::new(registry));
//!     server.run().await
//! }
//! ```

pub mod config;
pub mod errors;
pub mod fetch;
pub mod mcp;
pub mod tools;
pub mod xml;

pub use errors::{MCPError, MCPResult};

// Re-export commonly used types
pub use async_trait::async_trait;
pub use serde_json::{json, Value};
