// XSLT 转换工具测试
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::errors::{MCPError, MCPResult};
use crate::tools::base::MCPTool;
use crate::tools::transform::TransformTool;
use crate::xml::{XsltEngine, XsltProc};

const PEOPLE: &str = r#"<people><person age="25">Alice</person><person age="17">Bob</person><person age="32">Charlie</person></people>"#;

/// 记录输入并返回固定输出的引擎
struct RecordingEngine {
    output: String,
    seen: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl XsltEngine for RecordingEngine {
    fn name(&self) -> &str {
        "recording"
    }

    async fn transform(&self, xml: &str, stylesheet: &str) -> MCPResult<String> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push((xml.to_string(), stylesheet.to_string()));
        }
        Ok(self.output.clone())
    }
}

fn xsltproc() -> Option<Arc<XsltProc>> {
    let engine = XsltProc::new("xsltproc", Duration::from_secs(30));
    if engine.is_available() {
        Some(Arc::new(engine))
    } else {
        println!("⚠️ 未找到 xsltproc，跳过测试");
        None
    }
}

#[tokio::test]
async fn test_output_returned_verbatim() {
    let engine = Arc::new(RecordingEngine {
        output: "<?xml version=\"1.0\"?>\n<out>  spaced  </out>\n".to_string(),
        seen: Mutex::new(Vec::new()),
    });
    let tool = TransformTool::new(engine.clone());

    let params = tool.validate_params(&json!({"xml": "<in/>", "xslt": "<xsl/>"})).unwrap();
    let response = tool.execute(params).await.unwrap();

    assert_eq!(response.first_text(), Some("<?xml version=\"1.0\"?>\n<out>  spaced  </out>\n"));
    let seen = engine.seen.lock().unwrap();
    assert_eq!(seen.as_slice(), &[("<in/>".to_string(), "<xsl/>".to_string())]);
}

#[tokio::test]
async fn test_missing_stylesheet_rejected() {
    let tool = TransformTool::new(Arc::new(RecordingEngine {
        output: String::new(),
        seen: Mutex::new(Vec::new()),
    }));
    let err = tool.validate_params(&json!({"xml": "<in/>"})).unwrap_err();
    assert_eq!(err.to_string(), "Invalid arguments: xslt: Required");
}

#[tokio::test]
async fn test_count_value_of() {
    let Some(engine) = xsltproc() else { return };
    let tool = TransformTool::new(engine);

    let xslt = r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
  <xsl:output method="text"/>
  <xsl:template match="/"><xsl:value-of select="count(//item)"/></xsl:template>
</xsl:stylesheet>"#;
    let response = tool
        .execute(json!({"xml": "<list><item/><item/><item/></list>", "xslt": xslt}))
        .await
        .unwrap();

    assert_eq!(response.first_text().map(str::trim), Some("3"));
}

#[tokio::test]
async fn test_for_each_preserves_order() {
    let Some(engine) = xsltproc() else { return };
    let tool = TransformTool::new(engine);

    let xslt = r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
  <xsl:output method="xml" omit-xml-declaration="yes"/>
  <xsl:template match="/"><ul><xsl:for-each select="//person"><li><xsl:value-of select="."/></li></xsl:for-each></ul></xsl:template>
</xsl:stylesheet>"#;
    let response = tool.execute(json!({"xml": PEOPLE, "xslt": xslt})).await.unwrap();
    let text = response.first_text().unwrap();

    println!("📄 转换结果: {}", text);
    assert_eq!(text.matches("<li>").count(), 3);
    let alice = text.find("Alice").unwrap();
    let bob = text.find("Bob").unwrap();
    let charlie = text.find("Charlie").unwrap();
    assert!(alice < bob && bob < charlie);
}

#[tokio::test]
async fn test_predicate_filters_in_stylesheet() {
    let Some(engine) = xsltproc() else { return };
    let tool = TransformTool::new(engine);

    let xslt = r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
  <xsl:output method="text"/>
  <xsl:template match="/"><xsl:for-each select="//person[@age &gt;= 18]"><xsl:value-of select="."/>;</xsl:for-each></xsl:template>
</xsl:stylesheet>"#;
    let response = tool.execute(json!({"xml": PEOPLE, "xslt": xslt})).await.unwrap();
    assert_eq!(response.first_text(), Some("Alice;Charlie;"));
}

#[tokio::test]
async fn test_broken_xml_is_transform_error() {
    let Some(engine) = xsltproc() else { return };
    let tool = TransformTool::new(engine);

    let xslt = r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform"/>"#;
    let err = tool.execute(json!({"xml": "<people>", "xslt": xslt})).await.unwrap_err();
    assert!(matches!(err, MCPError::TransformError(_)));
}
