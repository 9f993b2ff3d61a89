use thiserror::Error;

pub type Result<T> = anyhow::Result<T>;
pub type MCPResult<T> = std::result::Result<T, MCPError>;

/// 工具调用过程中的错误分类
///
/// `ValidationError` 和 `UnknownTool` 属于请求形状错误，作为 JSON-RPC 协议错误返回；
/// 其余错误发生在执行阶段，通过 [`MCPError::to_tool_text`] 转为带前缀的文本结果。
#[derive(Error, Debug)]
pub enum MCPError {
    #[error("Invalid arguments: {0}")]
    ValidationError(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("XML parsing error: {0}")]
    ParseError(String),

    #[error("Error processing XPath query: {0}")]
    EvaluationError(String),

    #[error("Error fetching URL: HTTP {status} {reason}")]
    FetchError { status: u16, reason: String },

    #[error("Error fetching URL: {0}")]
    NavigationError(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("XSLT transformation failed: {0}")]
    TransformError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MCPError {
    pub fn error_code(&self) -> &'static str {
        match self {
            MCPError::ValidationError(_) => "VALIDATION_ERROR",
            MCPError::UnknownTool(_) => "UNKNOWN_TOOL",
            MCPError::ParseError(_) => "PARSE_ERROR",
            MCPError::EvaluationError(_) => "EVALUATION_ERROR",
            MCPError::FetchError { .. } => "FETCH_ERROR",
            MCPError::NavigationError(_) => "NAVIGATION_ERROR",
            MCPError::Timeout(_) => "TIMEOUT",
            MCPError::TransformError(_) => "TRANSFORM_ERROR",
            MCPError::ServerError(_) => "SERVER_ERROR",
            MCPError::Io(_) => "IO_ERROR",
            MCPError::Json(_) => "JSON_ERROR",
        }
    }

    pub fn suggestion(&self) -> &'static str {
        match self {
            MCPError::ValidationError(_) => "Check the argument names and types against tools/list",
            MCPError::UnknownTool(_) => "Call tools/list to see the tools this server exposes",
            MCPError::ParseError(_) => "Check that the markup is well-formed or switch mimeType to text/html",
            MCPError::EvaluationError(_) => "Check the XPath 1.0 expression syntax",
            MCPError::FetchError { .. } | MCPError::NavigationError(_) => "Check that the URL is reachable",
            MCPError::Timeout(_) => "Retry later or raise the configured timeout",
            MCPError::TransformError(_) => "Check that the stylesheet is valid XSLT 1.0",
            MCPError::ServerError(_) | MCPError::Io(_) | MCPError::Json(_) => "Retry the request",
        }
    }

    /// 是否属于请求形状错误（在执行前被拒绝）
    pub fn is_request_error(&self) -> bool {
        matches!(self, MCPError::ValidationError(_) | MCPError::UnknownTool(_))
    }

    /// 检查错误是否可恢复
    pub fn is_recoverable(&self) -> bool {
        match self {
            MCPError::Timeout(_) |
            MCPError::NavigationError(_) |
            MCPError::ServerError(_) => true,
            MCPError::FetchError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// 执行阶段错误的带内文本，前缀区分错误类别
    pub fn to_tool_text(&self) -> String {
        self.to_string()
    }
}
