pub mod protocol;
pub mod server;

pub use protocol::{
    error_codes, InitializeParams, InitializeResult, Request, Response, MCP_VERSION, SUPPORTED_PROTOCOL_VERSIONS,
};
pub use server::{MCPServer, Server, ToolInfo};
