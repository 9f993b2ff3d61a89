use std::sync::{Arc, OnceLock};
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use super::base::{string_param, MCPTool, Schema, SchemaObject, SchemaString, StringFormat, ToolResponse};
use crate::errors::MCPResult;
use crate::fetch::Fetcher;
use crate::xml::{check_parse, evaluate, parse_markup, run_query, stringify_raw, DEFAULT_MIME_TYPE, SUPPORTED_MIME_TYPES};

/// 解析标记并执行查询，返回规范化文本
///
/// 整个文档树的生命周期都在这个同步函数内，不会跨越 `.await`。
pub fn query_markup(markup: &str, query: &str, mime_type: &str) -> MCPResult<String> {
    let parsed = parse_markup(markup, mime_type)?;
    let outcome = run_query(&parsed, query);
    debug!("查询结果: {:?}", outcome);
    outcome.into_result()
}

/// `select` 的输出：原始字符串形式再做 JSON 引号转义，空结果为 `undefined`
pub fn select_markup(markup: &str, query: &str, mime_type: &str) -> MCPResult<String> {
    let parsed = parse_markup(markup, mime_type)?;
    let document = parsed.as_document();
    check_parse(&document)?;

    let result = evaluate(&document, query)?;
    let text = match stringify_raw(&result) {
        Some(raw) => serde_json::to_string(&raw)?,
        None => "undefined".to_string(),
    };
    Ok(text)
}

fn mime_type_param(params: &Value) -> &str {
    params
        .get("mimeType")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_MIME_TYPE)
}

fn mime_type_schema() -> Schema {
    Schema::String(SchemaString {
        description: Some("The MIME type (e.g. text/xml, application/xml, text/html, application/xhtml+xml)".to_string()),
        enum_values: Some(SUPPORTED_MIME_TYPES.iter().map(|m| m.to_string()).collect()),
        default: Some(DEFAULT_MIME_TYPE.to_string()),
        format: None,
    })
}

fn query_schema() -> Schema {
    Schema::String(SchemaString::described("The XPath query to execute"))
}

/// 查询内联 XML/HTML 内容
pub struct XPathTool;

impl XPathTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for XPathTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MCPTool for XPathTool {
    fn name(&self) -> &str {
        "xpath"
    }

    fn description(&self) -> &str {
        "Query XML content using XPath"
    }

    fn parameters_schema(&self) -> &Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();

        SCHEMA.get_or_init(|| {
            Schema::Object(SchemaObject {
                required: vec!["xml".to_string(), "query".to_string()],
                properties: vec![
                    ("xml".to_string(), Schema::String(SchemaString::described("The XML content to query"))),
                    ("query".to_string(), query_schema()),
                    ("mimeType".to_string(), mime_type_schema()),
                ],
                description: None,
            })
        })
    }

    async fn execute(&self, params: Value) -> MCPResult<ToolResponse> {
        let xml = string_param(&params, "xml")?;
        let query = string_param(&params, "query")?;
        let mime_type = mime_type_param(&params);

        let started = Instant::now();
        let text = query_markup(xml, query, mime_type)?;
        info!("✅ xpath 查询完成 ({} 字节输入，耗时 {:?})", xml.len(), started.elapsed());
        Ok(ToolResponse::text(text))
    }
}

/// 获取远程页面后查询
pub struct XPathWithUrlTool {
    fetcher: Arc<dyn Fetcher>,
}

impl XPathWithUrlTool {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl MCPTool for XPathWithUrlTool {
    fn name(&self) -> &str {
        "xpathwithurl"
    }

    fn description(&self) -> &str {
        "Fetch content from a URL and query it using XPath"
    }

    fn parameters_schema(&self) -> &Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();

        SCHEMA.get_or_init(|| {
            Schema::Object(SchemaObject {
                required: vec!["url".to_string(), "query".to_string()],
                properties: vec![
                    (
                        "url".to_string(),
                        Schema::String(SchemaString {
                            format: Some(StringFormat::Uri),
                            ..SchemaString::described("The URL to fetch XML content from")
                        }),
                    ),
                    ("query".to_string(), query_schema()),
                    ("mimeType".to_string(), mime_type_schema()),
                ],
                description: None,
            })
        })
    }

    async fn execute(&self, params: Value) -> MCPResult<ToolResponse> {
        let url = string_param(&params, "url")?;
        let query = string_param(&params, "query")?;
        let mime_type = mime_type_param(&params);

        info!("🌐 获取 {} ({:?})", url, self.fetcher.strategy());
        let markup = self.fetcher.fetch(url).await?;
        let text = query_markup(&markup, query, mime_type)?;
        Ok(ToolResponse::text(text))
    }
}

/// 返回原始字符串化结果的查询工具
pub struct SelectTool;

impl SelectTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SelectTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MCPTool for SelectTool {
    fn name(&self) -> &str {
        "select"
    }

    fn description(&self) -> &str {
        "Select query XML content using XPath"
    }

    fn parameters_schema(&self) -> &Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();

        SCHEMA.get_or_init(|| {
            Schema::Object(SchemaObject {
                required: vec!["xml".to_string(), "query".to_string()],
                properties: vec![
                    ("xml".to_string(), Schema::String(SchemaString::described("The XML content to query"))),
                    ("query".to_string(), query_schema()),
                    ("mimeType".to_string(), mime_type_schema()),
                ],
                description: None,
            })
        })
    }

    async fn execute(&self, params: Value) -> MCPResult<ToolResponse> {
        let xml = string_param(&params, "xml")?;
        let query = string_param(&params, "query")?;
        let text = select_markup(xml, query, mime_type_param(&params))?;
        Ok(ToolResponse::text(text))
    }
}
