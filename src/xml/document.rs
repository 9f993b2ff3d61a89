use scraper::{ElementRef, Html};
use sxd_document::dom::{self, ChildOfElement, ChildOfRoot};
use sxd_document::{Package, QName};
use tracing::debug;

use crate::errors::{MCPError, MCPResult};

/// 解析器错误标记元素名（与浏览器 DOMParser 的行为一致）
pub const PARSER_ERROR_TAG: &str = "parsererror";

/// 默认的 MIME 类型
pub const DEFAULT_MIME_TYPE: &str = "text/html";

/// 支持的 MIME 类型
pub const SUPPORTED_MIME_TYPES: &[&str] = &[
    "text/html",
    "text/xml",
    "application/xml",
    "application/xhtml+xml",
    "image/svg+xml",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupKind {
    Html,
    Xml,
}

impl MarkupKind {
    /// 根据 MIME 类型选择解析器，忽略 `; charset=...` 之类的参数
    pub fn from_mime_type(mime_type: &str) -> MCPResult<Self> {
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "text/html" => Ok(MarkupKind::Html),
            "text/xml" | "application/xml" | "application/xhtml+xml" | "image/svg+xml" => Ok(MarkupKind::Xml),
            _ => Err(MCPError::ValidationError(format!(
                "mimeType: Unsupported MIME type '{}', expected one of {}",
                mime_type,
                SUPPORTED_MIME_TYPES.join(", ")
            ))),
        }
    }
}

/// 单次工具调用内独占的文档树，调用结束即丢弃
pub struct ParsedDocument {
    package: Package,
    kind: MarkupKind,
}

impl ParsedDocument {
    pub fn as_document(&self) -> dom::Document<'_> {
        self.package.as_document()
    }

    pub fn kind(&self) -> MarkupKind {
        self.kind
    }

    /// 文档根元素
    pub fn document_element(&self) -> Option<dom::Element<'_>> {
        self.package
            .as_document()
            .root()
            .children()
            .into_iter()
            .find_map(|child| match child {
                ChildOfRoot::Element(element) => Some(element),
                _ => None,
            })
    }

    /// 根元素第一个子节点的文本内容（第一个子节点不是文本时返回 None）
    pub fn first_child_text(&self) -> Option<String> {
        let root = self.document_element()?;
        match root.children().into_iter().next()? {
            ChildOfElement::Text(text) => Some(text.text().to_string()),
            _ => None,
        }
    }

    /// 构造只包含 `<parsererror>` 标记的文档
    fn parser_error(message: &str, kind: MarkupKind) -> Self {
        let package = Package::new();
        {
            let doc = package.as_document();
            let marker = doc.create_element(PARSER_ERROR_TAG);
            marker.append_child(doc.create_text(message));
            doc.root().append_child(marker);
        }
        Self { package, kind }
    }
}

/// 将标记文本解析为文档树
///
/// XML 语法错误不会以 `Err` 返回：与 DOMParser 一样，得到的文档中会包含一个
/// `parsererror` 元素，由错误分类器在执行查询前检查。
pub fn parse_markup(markup: &str, mime_type: &str) -> MCPResult<ParsedDocument> {
    match MarkupKind::from_mime_type(mime_type)? {
        MarkupKind::Xml => Ok(parse_xml(markup)),
        MarkupKind::Html => Ok(parse_html(markup)),
    }
}

fn parse_xml(markup: &str) -> ParsedDocument {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };

    let source = match roxmltree::Document::parse_with_options(markup, options) {
        Ok(source) => source,
        Err(e) => {
            debug!("XML 解析失败: {}", e);
            return ParsedDocument::parser_error(&e.to_string(), MarkupKind::Xml);
        }
    };

    let package = Package::new();
    {
        let doc = package.as_document();
        for child in source.root().children() {
            match child.node_type() {
                roxmltree::NodeType::Element => {
                    doc.root().append_child(build_xml_element(&doc, child));
                }
                roxmltree::NodeType::Comment => {
                    doc.root().append_child(doc.create_comment(child.text().unwrap_or_default()));
                }
                roxmltree::NodeType::PI => {
                    if let Some(pi) = child.pi() {
                        doc.root().append_child(doc.create_processing_instruction(pi.target, pi.value));
                    }
                }
                _ => {}
            }
        }
    }

    ParsedDocument { package, kind: MarkupKind::Xml }
}

fn build_xml_element<'d>(doc: &dom::Document<'d>, node: roxmltree::Node<'_, '_>) -> dom::Element<'d> {
    let tag = node.tag_name();
    let element = doc.create_element(QName::with_namespace_uri(tag.namespace(), tag.name()));
    if let Some(uri) = tag.namespace() {
        element.set_preferred_prefix(declared_prefix(node, uri));
    }

    // 只在声明所在的元素上登记前缀，子元素通过作用域继承
    let parent = node.parent_element();
    for namespace in node.namespaces() {
        let Some(prefix) = namespace.name() else { continue };
        if prefix == "xml" {
            continue;
        }
        let inherited = parent.and_then(|p| p.lookup_namespace_uri(Some(prefix)));
        if inherited != Some(namespace.uri()) {
            element.register_prefix(prefix, namespace.uri());
        }
    }

    for attribute in node.attributes() {
        let name = QName::with_namespace_uri(attribute.namespace(), attribute.name());
        let attr = element.set_attribute_value(name, attribute.value());
        if let Some(uri) = attribute.namespace() {
            attr.set_preferred_prefix(declared_prefix(node, uri));
        }
    }

    for child in node.children() {
        match child.node_type() {
            roxmltree::NodeType::Element => {
                element.append_child(build_xml_element(doc, child));
            }
            roxmltree::NodeType::Text => {
                element.append_child(doc.create_text(child.text().unwrap_or_default()));
            }
            roxmltree::NodeType::Comment => {
                element.append_child(doc.create_comment(child.text().unwrap_or_default()));
            }
            roxmltree::NodeType::PI => {
                if let Some(pi) = child.pi() {
                    element.append_child(doc.create_processing_instruction(pi.target, pi.value));
                }
            }
            roxmltree::NodeType::Root => {}
        }
    }

    element
}

/// 默认命名空间没有前缀
fn declared_prefix<'a>(node: roxmltree::Node<'a, 'a>, uri: &str) -> Option<&'a str> {
    node.lookup_prefix(uri).filter(|prefix| !prefix.is_empty())
}

/// HTML 按 HTML5 规则解析，元素不带命名空间，`//div` 这样的查询可以直接匹配
fn parse_html(markup: &str) -> ParsedDocument {
    let html = Html::parse_document(markup);
    if !html.errors.is_empty() {
        debug!("HTML 解析产生 {} 条容错提示", html.errors.len());
    }

    let package = Package::new();
    {
        let doc = package.as_document();
        for child in html.tree.root().children() {
            match child.value() {
                scraper::Node::Element(_) => {
                    if let Some(element) = ElementRef::wrap(child) {
                        doc.root().append_child(build_html_element(&doc, element));
                    }
                }
                scraper::Node::Comment(comment) => {
                    doc.root().append_child(doc.create_comment(comment));
                }
                _ => {}
            }
        }
    }

    ParsedDocument { package, kind: MarkupKind::Html }
}

fn build_html_element<'d>(doc: &dom::Document<'d>, source: ElementRef<'_>) -> dom::Element<'d> {
    let value = source.value();
    let element = doc.create_element(value.name());
    for (name, attr_value) in value.attrs() {
        element.set_attribute_value(name, attr_value);
    }

    for child in source.children() {
        match child.value() {
            scraper::Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    element.append_child(build_html_element(doc, child_element));
                }
            }
            scraper::Node::Text(text) => {
                element.append_child(doc.create_text(text));
            }
            scraper::Node::Comment(comment) => {
                element.append_child(doc.create_comment(comment));
            }
            _ => {}
        }
    }

    element
}
