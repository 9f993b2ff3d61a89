use std::sync::{Arc, OnceLock};
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use super::base::{string_param, MCPTool, Schema, SchemaObject, SchemaString, ToolResponse};
use crate::errors::MCPResult;
use crate::xml::XsltEngine;

/// XSLT 转换工具，输出原样返回
pub struct TransformTool {
    engine: Arc<dyn XsltEngine>,
}

impl TransformTool {
    pub fn new(engine: Arc<dyn XsltEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl MCPTool for TransformTool {
    fn name(&self) -> &str {
        "transform"
    }

    fn description(&self) -> &str {
        "Transform XML using XSLT"
    }

    fn parameters_schema(&self) -> &Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();

        SCHEMA.get_or_init(|| {
            Schema::Object(SchemaObject {
                required: vec!["xml".to_string(), "xslt".to_string()],
                properties: vec![
                    ("xml".to_string(), Schema::String(SchemaString::described("The XML content to transform"))),
                    ("xslt".to_string(), Schema::String(SchemaString::described("The XSLT stylesheet to apply"))),
                ],
                description: None,
            })
        })
    }

    async fn execute(&self, params: Value) -> MCPResult<ToolResponse> {
        let xml = string_param(&params, "xml")?;
        let xslt = string_param(&params, "xslt")?;

        let started = Instant::now();
        let output = self.engine.transform(xml, xslt).await?;
        info!("✅ {} 转换完成，耗时 {:?}", self.engine.name(), started.elapsed());
        Ok(ToolResponse::text(output))
    }
}
