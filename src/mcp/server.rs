use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use super::protocol::{
    error_codes, server_capabilities, InitializeParams, InitializeResult, Request, Response, ServerInfo,
};
use crate::errors::{MCPError, MCPResult};
use crate::tools::{ToolRegistry, ToolResponse};

/// 工具信息结构
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// 工具分发：查找工具、校验参数、执行
pub struct MCPServer {
    registry: Arc<ToolRegistry>,
}

impl MCPServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// 执行一次工具调用
    ///
    /// 未知工具和参数错误以 `Err` 返回；执行阶段的错误转为带 `isError` 的文本结果。
    pub async fn call_tool(&self, name: &str, arguments: Value) -> MCPResult<ToolResponse> {
        let tool = self
            .registry
            .get(name)
            .ok_or_else(|| MCPError::UnknownTool(name.to_string()))?;

        let params = tool.validate_params(&arguments)?;

        let started = Instant::now();
        match tool.execute(params).await {
            Ok(response) => {
                info!("✅ {} 执行成功，耗时 {:?}", name, started.elapsed());
                Ok(response)
            }
            Err(e) if e.is_request_error() => Err(e),
            Err(e) => {
                warn!(
                    "❌ {} 执行失败 [{}] 耗时 {:?}: {}",
                    name,
                    e.error_code(),
                    started.elapsed(),
                    e
                );
                Ok(ToolResponse::error(&e))
            }
        }
    }

    /// 获取所有工具列表
    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.registry
            .tools()
            .iter()
            .map(|tool| ToolInfo {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                input_schema: tool.parameters_schema().to_json_schema(),
            })
            .collect()
    }

    /// 获取指定工具的信息
    pub fn get_tool_info(&self, tool_name: &str) -> Option<ToolInfo> {
        self.list_tools().into_iter().find(|tool| tool.name == tool_name)
    }

    /// 获取工具数量
    pub fn tool_count(&self) -> usize {
        self.registry.len()
    }
}

/// 基于换行分隔 JSON-RPC 的 MCP 传输层
pub struct Server {
    /// 服务器名称
    name: String,
    /// 服务器版本
    version: String,
    /// 是否已初始化
    initialized: bool,
    /// MCP 服务器实例
    mcp_server: Arc<MCPServer>,
}

impl Server {
    /// 创建新的 MCP 服务器实例
    pub fn new(name: String, version: String, mcp_server: MCPServer) -> Self {
        Self {
            name,
            version,
            initialized: false,
            mcp_server: Arc::new(mcp_server),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// 在 stdin/stdout 上运行服务器
    pub async fn run(&mut self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// 逐行读取请求并写回响应，直到输入结束
    pub async fn serve<R, W>(&mut self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("🔧 {} 已启动，等待请求...", self.name);

        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            debug!("📥 收到 {} 字节数据", line.len());

            if let Some(response) = self.handle_line(&line).await {
                let response_json = serde_json::to_string(&response)?;
                writer.write_all(response_json.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
                debug!("📤 发送响应 {} 字节", response_json.len());
            }
        }

        info!("📡 客户端断开连接");
        Ok(())
    }

    /// 处理一行输入；通知没有响应
    pub async fn handle_line(&mut self, line: &str) -> Option<Response> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!("❌ 请求解析失败: {}", e);
                return Some(Response::error(
                    Value::Null,
                    error_codes::PARSE_ERROR,
                    format!("Parse error: {}", e),
                ));
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: Request = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Some(Response::error(
                    id,
                    error_codes::INVALID_REQUEST,
                    format!("Invalid request: {}", e),
                ));
            }
        };

        if request.jsonrpc != super::protocol::JSONRPC_VERSION {
            return Some(Response::error(
                id,
                error_codes::INVALID_REQUEST,
                format!("Unsupported jsonrpc version: {}", request.jsonrpc),
            ));
        }

        if request.is_notification() {
            self.handle_notification(&request);
            return None;
        }

        Some(self.handle_request(id, request).await)
    }

    fn handle_notification(&self, request: &Request) {
        match request.method.as_str() {
            "notifications/initialized" => info!("🤝 客户端初始化完成"),
            "notifications/cancelled" => debug!("收到取消通知: {}", request.params),
            other => debug!("忽略通知: {}", other),
        }
    }

    /// 处理 MCP 请求
    async fn handle_request(&mut self, id: Value, request: Request) -> Response {
        debug!("🔄 处理请求: {}", request.method);

        match request.method.as_str() {
            "initialize" => {
                if self.initialized {
                    return Response::error(id, error_codes::INVALID_REQUEST, "Server already initialized");
                }

                match self.handle_initialize(&request.params) {
                    Ok(result) => match serde_json::to_value(result) {
                        Ok(value) => {
                            self.initialized = true;
                            Response::success(id, value)
                        }
                        Err(e) => Response::error(id, error_codes::INTERNAL_ERROR, e.to_string()),
                    },
                    Err(e) => Response::error(id, error_codes::INVALID_PARAMS, e.to_string()),
                }
            }
            "ping" => Response::success(id, json!({})),
            _ if !self.initialized => {
                Response::error(id, error_codes::SERVER_NOT_INITIALIZED, "Server not initialized")
            }
            "shutdown" => {
                info!("🛑 收到 shutdown 请求");
                self.initialized = false;
                Response::success(id, Value::Null)
            }
            "tools/list" => self.handle_list_tools(id),
            "tools/call" => self.handle_tool_call(id, &request.params).await,
            _ => Response::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        }
    }

    /// 处理初始化请求
    fn handle_initialize(&self, params: &Value) -> Result<InitializeResult> {
        let params: InitializeParams = if params.is_null() {
            InitializeParams::default()
        } else {
            serde_json::from_value(params.clone())?
        };

        match &params.client_info {
            Some(client) => info!(
                "Client connected: {} {}",
                client.name,
                client.version.as_deref().unwrap_or("")
            ),
            None => info!("Client connected"),
        }

        Ok(InitializeResult {
            protocol_version: params.negotiated_version().to_string(),
            capabilities: server_capabilities(),
            server_info: ServerInfo {
                name: self.name.clone(),
                version: self.version.clone(),
            },
        })
    }

    /// 处理工具列表请求
    fn handle_list_tools(&self, id: Value) -> Response {
        match serde_json::to_value(self.mcp_server.list_tools()) {
            Ok(tools) => Response::success(id, json!({ "tools": tools })),
            Err(e) => Response::error(id, error_codes::INTERNAL_ERROR, format!("获取工具列表失败: {}", e)),
        }
    }

    /// 处理工具调用请求
    async fn handle_tool_call(&self, id: Value, params: &Value) -> Response {
        let tool_name = match params.get("name").and_then(|v| v.as_str()) {
            Some(name) => name,
            None => {
                return Response::error(id, error_codes::INVALID_PARAMS, "Missing tool name");
            }
        };

        let arguments = match params.get("arguments") {
            None | Some(Value::Null) => json!({}),
            Some(arguments) => arguments.clone(),
        };

        match self.mcp_server.call_tool(tool_name, arguments).await {
            Ok(result) => match serde_json::to_value(result) {
                Ok(value) => Response::success(id, value),
                Err(e) => Response::error(id, error_codes::INTERNAL_ERROR, e.to_string()),
            },
            Err(e) => {
                warn!("⚠️ 拒绝工具调用 {}: {}", tool_name, e);
                Response::from_mcp_error(id, &e)
            }
        }
    }
}
