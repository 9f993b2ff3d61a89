use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::MCPError;

/// JSON-RPC 版本
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP 协议版本
pub const MCP_VERSION: &str = "2025-03-26";

/// 可以协商的协议版本，客户端请求其中之一时原样返回
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-03-26", "2024-11-05"];

/// JSON-RPC 请求；没有 `id` 的是通知
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl Request {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC 响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponse>,
}

/// JSON-RPC 错误对象
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Response {
    /// 创建一个成功响应
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// 创建一个错误响应
    pub fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(ErrorResponse {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// 请求形状错误（参数校验失败、未知工具）转为协议错误
    pub fn from_mcp_error(id: Value, error: &MCPError) -> Self {
        let code = if error.is_request_error() {
            error_codes::INVALID_PARAMS
        } else {
            error_codes::INTERNAL_ERROR
        };

        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(ErrorResponse {
                code,
                message: error.to_string(),
                data: Some(json!({
                    "code": error.error_code(),
                    "suggestion": error.suggestion(),
                })),
            }),
        }
    }
}

/// 客户端信息
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// MCP 初始化参数
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    #[serde(default)]
    pub protocol_version: Option<String>,
    #[serde(default)]
    pub capabilities: Value,
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

impl InitializeParams {
    /// 客户端请求的版本受支持时沿用，否则返回服务器的最新版本
    pub fn negotiated_version(&self) -> &str {
        match self.protocol_version.as_deref() {
            Some(requested) if SUPPORTED_PROTOCOL_VERSIONS.contains(&requested) => requested,
            _ => MCP_VERSION,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

/// MCP 初始化结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: Value,
    pub server_info: ServerInfo,
}

/// 服务器能力：只提供工具
pub fn server_capabilities() -> Value {
    json!({ "tools": {} })
}

// 错误代码定义
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    // MCP 特定错误码
    pub const SERVER_NOT_INITIALIZED: i32 = -32002;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_creation() {
        let resp = Response::success(json!(1), json!({"status": "ok"}));
        assert_eq!(resp.id, json!(1));
        assert!(resp.error.is_none());

        let err_resp = Response::error(json!("req-2"), error_codes::INVALID_REQUEST, "Invalid request");
        assert_eq!(err_resp.id, json!("req-2"));
        assert!(err_resp.result.is_none());
        assert!(err_resp.error.is_some());
    }

    #[test]
    fn test_request_error_mapping() {
        let resp = Response::from_mcp_error(json!(3), &MCPError::UnknownTool("nope".into()));
        let error = resp.error.unwrap();
        assert_eq!(error.code, error_codes::INVALID_PARAMS);
        assert_eq!(error.message, "Unknown tool: nope");
        assert_eq!(error.data.unwrap()["code"], "UNKNOWN_TOOL");
    }

    #[test]
    fn test_version_negotiation() {
        let old: InitializeParams = serde_json::from_value(json!({
            "protocolVersion": "2024-11-05",
            "clientInfo": {"name": "inspector", "version": "0.1"}
        }))
        .unwrap();
        assert_eq!(old.negotiated_version(), "2024-11-05");

        let unknown: InitializeParams = serde_json::from_value(json!({"protocolVersion": "1999-01-01"})).unwrap();
        assert_eq!(unknown.negotiated_version(), MCP_VERSION);
    }

    #[test]
    fn test_notification() {
        let request: Request = serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        assert!(request.is_notification());
        assert_eq!(request.params, Value::Null);
    }
}
