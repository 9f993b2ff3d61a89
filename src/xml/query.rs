use sxd_document::dom;
use sxd_xpath::nodeset::Node;
use sxd_xpath::Value;

use crate::errors::{MCPError, MCPResult};

/// XPath 求值结果
///
/// 求值器返回的形状各不相同（节点集、单个节点、标量），统一为一个带标签的枚举，
/// 再由 [`crate::xml::normalize`] 转换为文本。
#[derive(Debug)]
pub enum QueryResult<'d> {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Node(Node<'d>),
    NodeList(Vec<Node<'d>>),
}

impl<'d> From<Value<'d>> for QueryResult<'d> {
    fn from(value: Value<'d>) -> Self {
        match value {
            Value::Boolean(b) => QueryResult::Boolean(b),
            Value::Number(n) => QueryResult::Number(n),
            Value::String(s) => QueryResult::String(s),
            Value::Nodeset(nodes) => QueryResult::NodeList(nodes.document_order()),
        }
    }
}

impl<'d> QueryResult<'d> {
    /// 取节点集中的第一个节点，节点集为空时为 `Null`；标量保持不变
    pub fn first_node(self) -> Self {
        match self {
            QueryResult::NodeList(nodes) => nodes
                .into_iter()
                .next()
                .map(QueryResult::Node)
                .unwrap_or(QueryResult::Null),
            other => other,
        }
    }

    pub fn is_empty_node_list(&self) -> bool {
        matches!(self, QueryResult::NodeList(nodes) if nodes.is_empty())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, QueryResult::Null)
    }
}

/// 在文档上执行 XPath 1.0 表达式
pub fn evaluate<'d>(document: &'d dom::Document<'d>, expression: &str) -> MCPResult<QueryResult<'d>> {
    let expression = expression.trim();
    if expression.is_empty() {
        return Err(MCPError::EvaluationError("empty XPath expression".to_string()));
    }

    sxd_xpath::evaluate_xpath(document, expression)
        .map(QueryResult::from)
        .map_err(|e| MCPError::EvaluationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::document::parse_markup;

    const ITEMS: &str = r#"<root><item id="1">First</item><item id="2">Second</item><item id="3">Third</item></root>"#;

    #[test]
    fn test_node_list_in_document_order() {
        let parsed = parse_markup(ITEMS, "text/xml").unwrap();
        let document = parsed.as_document();
        match evaluate(&document, "//item").unwrap() {
            QueryResult::NodeList(nodes) => {
                let values: Vec<String> = nodes.iter().map(|n| n.string_value()).collect();
                assert_eq!(values, vec!["First", "Second", "Third"]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_scalars() {
        let parsed = parse_markup(ITEMS, "text/xml").unwrap();
        let document = parsed.as_document();

        assert!(matches!(evaluate(&document, "count(//item)").unwrap(), QueryResult::Number(n) if n == 3.0));
        assert!(matches!(evaluate(&document, "count(//item) > 2").unwrap(), QueryResult::Boolean(true)));
        assert!(matches!(
            evaluate(&document, "string(//item[@id='2'])").unwrap(),
            QueryResult::String(ref s) if s == "Second"
        ));
    }

    #[test]
    fn test_invalid_expression() {
        let parsed = parse_markup(ITEMS, "text/xml").unwrap();
        let document = parsed.as_document();

        assert!(matches!(evaluate(&document, "//item[").unwrap_err(), MCPError::EvaluationError(_)));
        assert!(matches!(evaluate(&document, "no-such-function()").unwrap_err(), MCPError::EvaluationError(_)));
        assert!(matches!(evaluate(&document, "   ").unwrap_err(), MCPError::EvaluationError(_)));
    }

    #[test]
    fn test_first_node() {
        let parsed = parse_markup(ITEMS, "text/xml").unwrap();
        let document = parsed.as_document();

        assert!(matches!(evaluate(&document, "//item").unwrap().first_node(), QueryResult::Node(_)));
        assert!(evaluate(&document, "//missing").unwrap().first_node().is_null());
        assert!(matches!(evaluate(&document, "1 + 1").unwrap().first_node(), QueryResult::Number(_)));
    }
}
