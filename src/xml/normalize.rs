use quick_xml::escape::{escape, partial_escape};
use sxd_document::dom::{self, ChildOfElement, ChildOfRoot};
use sxd_xpath::nodeset::Node;

use super::query::QueryResult;

/// 查询正常执行但没有匹配任何节点时返回的状态文本
pub const NO_MATCH_MESSAGE: &str = "No nodes matched the query.";

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// 把任意形状的查询结果转换为确定的文本
pub fn normalize(result: &QueryResult<'_>) -> String {
    match result {
        QueryResult::Null => "null".to_string(),
        QueryResult::Boolean(b) => b.to_string(),
        QueryResult::Number(n) => format_number(*n),
        QueryResult::String(s) => s.clone(),
        QueryResult::Node(node) => normalize_node(node),
        QueryResult::NodeList(nodes) if nodes.is_empty() => NO_MATCH_MESSAGE.to_string(),
        QueryResult::NodeList(nodes) => nodes
            .iter()
            .map(normalize_node)
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// `select` 工具使用的原始字符串形式：节点集以逗号连接，空节点集为空串，`Null` 没有值
pub fn stringify_raw(result: &QueryResult<'_>) -> Option<String> {
    match result {
        QueryResult::Null => None,
        QueryResult::NodeList(nodes) => Some(
            nodes
                .iter()
                .map(normalize_node)
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => Some(normalize(other)),
    }
}

pub fn normalize_node(node: &Node<'_>) -> String {
    match node {
        Node::Element(element) => serialize_element(*element),
        Node::Attribute(attribute) => {
            format!("{}=\"{}\"", attribute_name(*attribute), attribute.value())
        }
        Node::Text(text) => text.text().to_string(),
        Node::Root(root) => serialize_root(*root),
        Node::Comment(comment) => format!("<!--{}-->", comment.text()),
        Node::ProcessingInstruction(pi) => {
            let mut out = String::new();
            write_processing_instruction(*pi, &mut out);
            out
        }
        Node::Namespace(namespace) => format!("xmlns:{}=\"{}\"", namespace.prefix(), namespace.uri()),
    }
}

/// 数字格式：整数不带小数部分，特殊值与 XPath 的 string() 一致
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if value == 0.0 {
        "0".to_string()
    } else {
        value.to_string()
    }
}

/// 元素及其子树序列化为标记文本
pub fn serialize_element(element: dom::Element<'_>) -> String {
    let mut out = String::new();
    let mut scope = Vec::new();
    write_element(element, &mut scope, &mut out);
    out
}

fn serialize_root(root: dom::Root<'_>) -> String {
    let mut out = String::new();
    for child in root.children() {
        match child {
            ChildOfRoot::Element(element) => write_element(element, &mut Vec::new(), &mut out),
            ChildOfRoot::Comment(comment) => {
                out.push_str("<!--");
                out.push_str(comment.text());
                out.push_str("-->");
            }
            ChildOfRoot::ProcessingInstruction(pi) => write_processing_instruction(pi, &mut out),
        }
    }
    out
}

fn attribute_name(attribute: dom::Attribute<'_>) -> String {
    let name = attribute.name();
    match name.namespace_uri() {
        Some(XML_NAMESPACE) => format!("xml:{}", name.local_part()),
        Some(_) => match attribute.preferred_prefix() {
            Some(prefix) => format!("{}:{}", prefix, name.local_part()),
            None => name.local_part().to_string(),
        },
        None => name.local_part().to_string(),
    }
}

/// 已声明的命名空间绑定：(前缀, URI)，前缀为 None 表示默认命名空间
type Binding<'d> = (Option<&'d str>, &'d str);

fn bound_uri<'d>(scope: &[Binding<'d>], prefix: Option<&str>) -> &'d str {
    scope
        .iter()
        .rev()
        .find(|(p, _)| *p == prefix)
        .map(|(_, uri)| *uri)
        .unwrap_or("")
}

fn push_qualified(out: &mut String, prefix: Option<&str>, local: &str) {
    if let Some(prefix) = prefix {
        out.push_str(prefix);
        out.push(':');
    }
    out.push_str(local);
}

fn declare(out: &mut String, prefix: Option<&str>, uri: &str) {
    match prefix {
        Some(prefix) => {
            out.push_str(" xmlns:");
            out.push_str(prefix);
        }
        None => out.push_str(" xmlns"),
    }
    out.push_str("=\"");
    out.push_str(&escape(uri));
    out.push('"');
}

/// 序列化子树时补齐命名空间声明：子树脱离原文档后仍能独立解析
fn write_element<'d>(element: dom::Element<'d>, scope: &mut Vec<Binding<'d>>, out: &mut String) {
    let depth = scope.len();
    let name = element.name();
    let uri = name.namespace_uri().unwrap_or("");
    let prefix = if uri.is_empty() { None } else { element.preferred_prefix() };

    out.push('<');
    push_qualified(out, prefix, name.local_part());
    if bound_uri(scope, prefix) != uri {
        declare(out, prefix, uri);
        scope.push((prefix, uri));
    }

    // 未被使用的前缀声明同样属于元素的命名空间节点
    let mut in_scope = element.namespaces_in_scope();
    in_scope.sort_by_key(|namespace| namespace.prefix());
    for namespace in in_scope {
        let (ns_prefix, ns_uri) = (namespace.prefix(), namespace.uri());
        if ns_uri != XML_NAMESPACE && bound_uri(scope, Some(ns_prefix)) != ns_uri {
            declare(out, Some(ns_prefix), ns_uri);
            scope.push((Some(ns_prefix), ns_uri));
        }
    }

    for attribute in element.attributes() {
        let attr_name = attribute.name();
        if let Some(attr_uri) = attr_name.namespace_uri() {
            if attr_uri != XML_NAMESPACE {
                if let Some(attr_prefix) = attribute.preferred_prefix() {
                    if bound_uri(scope, Some(attr_prefix)) != attr_uri {
                        declare(out, Some(attr_prefix), attr_uri);
                        scope.push((Some(attr_prefix), attr_uri));
                    }
                }
            }
        }
        out.push(' ');
        out.push_str(&attribute_name(attribute));
        out.push_str("=\"");
        out.push_str(&escape(attribute.value()));
        out.push('"');
    }

    let children = element.children();
    if children.is_empty() {
        out.push_str("/>");
    } else {
        out.push('>');
        for child in children {
            match child {
                ChildOfElement::Element(child) => write_element(child, scope, out),
                ChildOfElement::Text(text) => out.push_str(&partial_escape(text.text())),
                ChildOfElement::Comment(comment) => {
                    out.push_str("<!--");
                    out.push_str(comment.text());
                    out.push_str("-->");
                }
                ChildOfElement::ProcessingInstruction(pi) => write_processing_instruction(pi, out),
            }
        }
        out.push_str("</");
        push_qualified(out, prefix, name.local_part());
        out.push('>');
    }

    scope.truncate(depth);
}

fn write_processing_instruction(pi: dom::ProcessingInstruction<'_>, out: &mut String) {
    out.push_str("<?");
    out.push_str(pi.target());
    if let Some(value) = pi.value() {
        out.push(' ');
        out.push_str(value);
    }
    out.push_str("?>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::document::parse_markup;
    use crate::xml::query::evaluate;

    fn query(markup: &str, mime_type: &str, expression: &str) -> String {
        let parsed = parse_markup(markup, mime_type).unwrap();
        let document = parsed.as_document();
        let result = evaluate(&document, expression).unwrap();
        normalize(&result)
    }

    #[test]
    fn test_empty_node_list_status() {
        let text = query("<root/>", "text/xml", "//missing");
        assert_eq!(text, NO_MATCH_MESSAGE);
        assert!(!text.is_empty());
    }

    #[test]
    fn test_attribute_form() {
        let text = query(r#"<root><product price="10.50"/></root>"#, "text/xml", "//product/@price");
        assert_eq!(text, r#"price="10.50""#);
    }

    #[test]
    fn test_element_markup() {
        let text = query(
            r#"<root><item id="1">A &amp; B</item><item id="2"/></root>"#,
            "text/xml",
            "//item",
        );
        assert_eq!(text, "<item id=\"1\">A &amp; B</item>\n<item id=\"2\"/>");
    }

    #[test]
    fn test_text_nodes() {
        let text = query("<root><a>x</a><a>y</a></root>", "text/xml", "//a/text()");
        assert_eq!(text, "x\ny");
    }

    #[test]
    fn test_scalars() {
        let items = "<r><i/><i/><i/></r>";
        assert_eq!(query(items, "text/xml", "count(//i)"), "3");
        assert_eq!(query(items, "text/xml", "count(//i) = 3"), "true");
        assert_eq!(query(items, "text/xml", "1 div 4"), "0.25");
        assert_eq!(query(items, "text/xml", "0 div 0"), "NaN");
        assert_eq!(query(items, "text/xml", "-1 div 0"), "-Infinity");
        assert_eq!(query(items, "text/xml", "concat('a', 'b')"), "ab");
    }

    #[test]
    fn test_namespaces_redeclared() {
        let markup = r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:m="urn:meta"><entry m:id="7"><title>T</title></entry></feed>"#;
        let text = query(markup, "application/xml", "/*/*");
        assert_eq!(
            text,
            r#"<entry xmlns="http://www.w3.org/2005/Atom" xmlns:m="urn:meta" m:id="7"><title>T</title></entry>"#
        );
    }

    #[test]
    fn test_unused_declarations_kept() {
        let text = query("<r xmlns:a='urn:a'/>", "text/xml", "/r");
        assert_eq!(text, r#"<r xmlns:a="urn:a"/>"#);

        let text = query("<r xmlns:a='urn:a'><c xmlns:b='urn:b'/></r>", "text/xml", "/r/c");
        assert_eq!(text, r#"<c xmlns:a="urn:a" xmlns:b="urn:b"/>"#);
    }

    #[test]
    fn test_namespace_axis_lists_declarations() {
        let text = query("<r xmlns:a='urn:a'/>", "text/xml", "/r/namespace::*");
        println!("🔍 {}", text);
        assert!(text.contains(r#"xmlns:a="urn:a""#));
        assert!(text.contains("xmlns:xml="));
    }

    #[test]
    fn test_html_elements() {
        let text = query("<ul><li class=\"a\">one</li><li>two</li></ul>", "text/html", "//li[@class='a']");
        assert_eq!(text, "<li class=\"a\">one</li>");
    }

    #[test]
    fn test_stringify_raw() {
        let parsed = parse_markup("<r><a>1</a><a>2</a></r>", "text/xml").unwrap();
        let document = parsed.as_document();

        let nodes = evaluate(&document, "//a").unwrap();
        assert_eq!(stringify_raw(&nodes).as_deref(), Some("<a>1</a>,<a>2</a>"));

        let empty = evaluate(&document, "//b").unwrap();
        assert_eq!(stringify_raw(&empty).as_deref(), Some(""));

        assert_eq!(stringify_raw(&QueryResult::Null), None);
        assert_eq!(normalize(&QueryResult::Null), "null");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(52.49), "52.49");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(1e3), "1000");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
    }
}
