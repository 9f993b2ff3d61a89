//! 标记解析、XPath 查询、结果规范化与 XSLT 转换
//!
//! 解析 (roxmltree / scraper)、XPath 求值 (sxd-xpath) 与 XSLT (xsltproc) 都由外部库完成，
//! 本模块只负责把它们串起来：
//!
//! - [`document`]：按 MIME 类型解析为 [`ParsedDocument`]，XML 语法错误以 `parsererror` 元素标记
//! - [`query`]：执行表达式，得到带标签的 [`QueryResult`]
//! - [`normalize`]：把 [`QueryResult`] 转为确定的文本
//! - [`classify`]：区分解析错误、空结果和求值错误
//! - [`xslt`]：XSLT 引擎接口

pub mod classify;
pub mod document;
pub mod normalize;
pub mod query;
pub mod xslt;

pub use classify::{check_parse, run_query, QueryOutcome};
pub use document::{parse_markup, MarkupKind, ParsedDocument, DEFAULT_MIME_TYPE, SUPPORTED_MIME_TYPES};
pub use normalize::{normalize, stringify_raw, NO_MATCH_MESSAGE};
pub use query::{evaluate, QueryResult};
pub use xslt::{XsltEngine, XsltProc};
