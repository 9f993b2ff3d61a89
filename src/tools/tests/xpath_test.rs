// XPath 查询工具测试
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::config::FetchStrategy;
use crate::errors::{MCPError, MCPResult};
use crate::fetch::Fetcher;
use crate::tools::base::MCPTool;
use crate::tools::xpath::{XPathTool, XPathWithUrlTool};

const PEOPLE: &str = r#"<people>
  <person age="25"><name>Alice</name></person>
  <person age="17"><name>Bob</name></person>
  <person age="32"><name>Charlie</name></person>
</people>"#;

/// 返回固定内容的获取器，记录调用次数
struct StaticFetcher {
    body: MCPResult<String>,
    calls: AtomicUsize,
}

impl StaticFetcher {
    fn ok(body: &str) -> Self {
        Self {
            body: Ok(body.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    fn status(status: u16, reason: &str) -> Self {
        Self {
            body: Err(MCPError::FetchError {
                status,
                reason: reason.to_string(),
            }),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    fn strategy(&self) -> FetchStrategy {
        FetchStrategy::Http
    }

    async fn fetch(&self, _url: &str) -> MCPResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.body {
            Ok(body) => Ok(body.clone()),
            Err(MCPError::FetchError { status, reason }) => Err(MCPError::FetchError {
                status: *status,
                reason: reason.clone(),
            }),
            Err(e) => Err(MCPError::NavigationError(e.to_string())),
        }
    }
}

#[tokio::test]
async fn test_root_text_round_trip() {
    let tool = XPathTool::new();
    let params = tool
        .validate_params(&json!({"xml": "<root>hello</root>", "query": "/root/text()", "mimeType": "text/xml"}))
        .unwrap();

    let response = tool.execute(params).await.unwrap();
    assert_eq!(response.first_text(), Some("hello"));
    assert!(!response.is_error);
}

#[tokio::test]
async fn test_predicate_filters_people() {
    let tool = XPathTool::new();
    let params = tool
        .validate_params(&json!({"xml": PEOPLE, "query": "//person[@age >= 18]/name/text()", "mimeType": "application/xml"}))
        .unwrap();

    let response = tool.execute(params).await.unwrap();
    let text = response.first_text().unwrap();
    println!("🔍 查询结果: {}", text);
    assert_eq!(text, "Alice\nCharlie");
    assert!(!text.contains("Bob"));
}

#[tokio::test]
async fn test_html_is_default_mime_type() {
    let tool = XPathTool::new();
    let params = tool
        .validate_params(&json!({"xml": "<div><p class='x'>Hi</p>", "query": "//p[@class='x']/text()"}))
        .unwrap();
    assert_eq!(params["mimeType"], "text/html");

    let response = tool.execute(params).await.unwrap();
    assert_eq!(response.first_text(), Some("Hi"));
}

#[tokio::test]
async fn test_malformed_xml_reports_parse_error() {
    let tool = XPathTool::new();
    let err = tool
        .execute(json!({"xml": "<root><unclosed></root>", "query": "//root", "mimeType": "text/xml"}))
        .await
        .unwrap_err();

    assert!(matches!(err, MCPError::ParseError(_)));
    assert!(err.to_tool_text().starts_with("XML parsing error: "));
}

#[tokio::test]
async fn test_missing_field_enumerated() {
    let tool = XPathTool::new();
    let err = tool.validate_params(&json!({"xml": "<a/>"})).unwrap_err();
    assert_eq!(err.to_string(), "Invalid arguments: query: Required");
}

#[tokio::test]
async fn test_fetch_then_query() {
    let fetcher = Arc::new(StaticFetcher::ok("<catalog><book>Dune</book></catalog>"));
    let tool = XPathWithUrlTool::new(fetcher.clone());
    let params = tool
        .validate_params(&json!({"url": "https://example.com/catalog.xml", "query": "//book/text()", "mimeType": "text/xml"}))
        .unwrap();

    let response = tool.execute(params).await.unwrap();
    assert_eq!(response.first_text(), Some("Dune"));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_fetch_failure_skips_parsing() {
    let fetcher = Arc::new(StaticFetcher::status(404, "Not Found"));
    let tool = XPathWithUrlTool::new(fetcher.clone());

    let err = tool
        .execute(json!({"url": "https://example.com/missing", "query": "//x", "mimeType": "text/xml"}))
        .await
        .unwrap_err();

    assert_eq!(err.to_tool_text(), "Error fetching URL: HTTP 404 Not Found");
    assert!(!matches!(err, MCPError::ParseError(_)));
}

#[tokio::test]
async fn test_invalid_url_rejected() {
    let tool = XPathWithUrlTool::new(Arc::new(StaticFetcher::ok("<a/>")));
    let err = tool
        .validate_params(&json!({"url": "not a url", "query": "//a"}))
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid arguments: url: Invalid url");
}
