use sxd_document::dom;
use tracing::debug;

use crate::errors::{MCPError, MCPResult};
use super::document::{ParsedDocument, PARSER_ERROR_TAG};
use super::normalize::{normalize, NO_MATCH_MESSAGE};
use super::query::{evaluate, QueryResult};

/// 一次查询的三种结果类别，各自使用不同的文本前缀，调用方依赖前缀区分失败类型
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// 查询成功并且有结果（节点或标量）
    Matched(String),
    /// 查询成功但节点集为空
    NoMatch,
    /// 文档中存在解析错误标记，内容为标记节点的序列化文本
    ParseError(String),
    /// 求值器拒绝了表达式，内容为错误原因
    EvaluationError(String),
}

impl QueryOutcome {
    /// 返回给调用方的完整文本
    pub fn message(&self) -> String {
        match self {
            QueryOutcome::Matched(text) => text.clone(),
            QueryOutcome::NoMatch => NO_MATCH_MESSAGE.to_string(),
            QueryOutcome::ParseError(markup) => MCPError::ParseError(markup.clone()).to_tool_text(),
            QueryOutcome::EvaluationError(cause) => MCPError::EvaluationError(cause.clone()).to_tool_text(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, QueryOutcome::ParseError(_) | QueryOutcome::EvaluationError(_))
    }

    pub fn into_result(self) -> MCPResult<String> {
        match self {
            QueryOutcome::Matched(text) => Ok(text),
            QueryOutcome::NoMatch => Ok(NO_MATCH_MESSAGE.to_string()),
            QueryOutcome::ParseError(markup) => Err(MCPError::ParseError(markup)),
            QueryOutcome::EvaluationError(cause) => Err(MCPError::EvaluationError(cause)),
        }
    }
}

/// 查找文档中的第一个解析错误标记（不区分命名空间）
pub fn find_parser_error(document: &dom::Document<'_>) -> Option<String> {
    let marker_query = format!("//*[local-name()='{}']", PARSER_ERROR_TAG);
    match evaluate(document, &marker_query).ok()?.first_node() {
        QueryResult::Null => None,
        marker => Some(normalize(&marker)),
    }
}

/// 解析错误标记优先于用户查询：存在标记时直接返回 `ParseError`
pub fn check_parse(document: &dom::Document<'_>) -> MCPResult<()> {
    match find_parser_error(document) {
        Some(markup) => Err(MCPError::ParseError(markup)),
        None => Ok(()),
    }
}

/// 执行查询并分类结果
pub fn run_query(parsed: &ParsedDocument, query: &str) -> QueryOutcome {
    let document = parsed.as_document();

    if let Some(markup) = find_parser_error(&document) {
        debug!("文档包含解析错误标记，跳过查询");
        return QueryOutcome::ParseError(markup);
    }

    match evaluate(&document, query) {
        Ok(result) if result.is_empty_node_list() => QueryOutcome::NoMatch,
        Ok(result) => QueryOutcome::Matched(normalize(&result)),
        Err(MCPError::EvaluationError(cause)) => QueryOutcome::EvaluationError(cause),
        Err(e) => QueryOutcome::EvaluationError(e.to_string()),
    }
}
