use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::errors::{MCPError, MCPResult};

/// 工具参数 Schema 定义
#[derive(Debug, Clone)]
pub enum Schema {
    Object(SchemaObject),
    String(SchemaString),
}

/// 对象 Schema，属性按声明顺序保存
#[derive(Debug, Clone, Default)]
pub struct SchemaObject {
    pub required: Vec<String>,
    pub properties: Vec<(String, Schema)>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFormat {
    Uri,
}

#[derive(Debug, Clone, Default)]
pub struct SchemaString {
    pub description: Option<String>,
    pub enum_values: Option<Vec<String>>,
    pub default: Option<String>,
    pub format: Option<StringFormat>,
}

impl SchemaString {
    pub fn described(description: &str) -> Self {
        Self {
            description: Some(description.to_string()),
            ..Default::default()
        }
    }
}

impl Schema {
    /// 校验参数并返回规范化后的值：补齐默认值，去掉未声明的字段
    ///
    /// 收集所有违规项而不是遇到第一个就返回，消息格式为 `路径: 原因`，多项以 `, ` 连接。
    pub fn prepare(&self, value: &Value) -> MCPResult<Value> {
        let mut issues = Vec::new();
        let prepared = self.check(value, "", &mut issues);
        if issues.is_empty() {
            Ok(prepared)
        } else {
            Err(MCPError::ValidationError(issues.join(", ")))
        }
    }

    fn check(&self, value: &Value, path: &str, issues: &mut Vec<String>) -> Value {
        match self {
            Schema::Object(object) => object.check(value, path, issues),
            Schema::String(string) => string.check(value, path, issues),
        }
    }

    /// 生成 tools/list 中的 JSON Schema
    pub fn to_json_schema(&self) -> Value {
        match self {
            Schema::Object(object) => object.to_json_schema(),
            Schema::String(string) => string.to_json_schema(),
        }
    }
}

impl SchemaObject {
    fn check(&self, value: &Value, path: &str, issues: &mut Vec<String>) -> Value {
        let Some(input) = value.as_object() else {
            push_issue(issues, path, format!("Expected object, received {}", json_type_name(value)));
            return Value::Null;
        };

        let mut output = Map::new();
        for (name, schema) in &self.properties {
            let field_path = if path.is_empty() {
                name.clone()
            } else {
                format!("{}.{}", path, name)
            };

            match input.get(name) {
                Some(field) if !field.is_null() || self.required.contains(name) => {
                    output.insert(name.clone(), schema.check(field, &field_path, issues));
                }
                _ => {
                    if let Some(default) = schema_default(schema) {
                        output.insert(name.clone(), default);
                    } else if self.required.contains(name) {
                        push_issue(issues, &field_path, "Required".to_string());
                    }
                }
            }
        }

        Value::Object(output)
    }

    fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .properties
            .iter()
            .map(|(name, schema)| (name.clone(), schema.to_json_schema()))
            .collect();

        let mut schema = json!({
            "type": "object",
            "properties": properties,
            "required": self.required,
            "additionalProperties": false,
        });
        if let Some(description) = &self.description {
            schema["description"] = json!(description);
        }
        schema
    }
}

impl SchemaString {
    fn check(&self, value: &Value, path: &str, issues: &mut Vec<String>) -> Value {
        let Some(text) = value.as_str() else {
            push_issue(issues, path, format!("Expected string, received {}", json_type_name(value)));
            return value.clone();
        };

        if let Some(allowed) = &self.enum_values {
            if !allowed.iter().any(|v| v == text) {
                let expected = allowed
                    .iter()
                    .map(|v| format!("'{}'", v))
                    .collect::<Vec<_>>()
                    .join(" | ");
                push_issue(
                    issues,
                    path,
                    format!("Invalid enum value. Expected {}, received '{}'", expected, text),
                );
            }
        }

        if self.format == Some(StringFormat::Uri) && url::Url::parse(text).is_err() {
            push_issue(issues, path, "Invalid url".to_string());
        }

        value.clone()
    }

    fn to_json_schema(&self) -> Value {
        let mut schema = json!({ "type": "string" });
        if let Some(description) = &self.description {
            schema["description"] = json!(description);
        }
        if let Some(values) = &self.enum_values {
            schema["enum"] = json!(values);
        }
        if let Some(default) = &self.default {
            schema["default"] = json!(default);
        }
        if self.format == Some(StringFormat::Uri) {
            schema["format"] = json!("uri");
        }
        schema
    }
}

fn schema_default(schema: &Schema) -> Option<Value> {
    match schema {
        Schema::String(string) => string.default.as_ref().map(|d| Value::String(d.clone())),
        Schema::Object(_) => None,
    }
}

fn push_issue(issues: &mut Vec<String>, path: &str, message: String) {
    if path.is_empty() {
        issues.push(message);
    } else {
        issues.push(format!("{}: {}", path, message));
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 从已校验的参数中读取字符串字段
pub fn string_param<'a>(params: &'a Value, name: &str) -> MCPResult<&'a str> {
    params
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| MCPError::ValidationError(format!("{}: Required", name)))
}

/// 工具结果中的一段内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

/// tools/call 的结果信封：成功时只有 `content`，执行失败时附带 `isError: true`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError", default, skip_serializing_if = "is_false")]
    pub is_error: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ToolResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent {
                content_type: "text".to_string(),
                text: text.into(),
            }],
            is_error: false,
        }
    }

    /// 执行阶段的错误，文本带分类前缀
    pub fn error(error: &MCPError) -> Self {
        Self {
            is_error: true,
            ..Self::text(error.to_tool_text())
        }
    }

    pub fn first_text(&self) -> Option<&str> {
        self.content.first().map(|c| c.text.as_str())
    }
}

/// 工具的基础 trait
#[async_trait]
pub trait MCPTool: Send + Sync {
    /// 获取工具名称
    fn name(&self) -> &str;

    /// 获取工具描述
    fn description(&self) -> &str;

    /// 获取工具参数Schema
    fn parameters_schema(&self) -> &Schema;

    /// 执行工具，参数已经过 [`MCPTool::validate_params`] 处理
    async fn execute(&self, params: Value) -> MCPResult<ToolResponse>;

    /// 验证输入参数，返回补齐默认值后的参数
    fn validate_params(&self, params: &Value) -> MCPResult<Value> {
        self.parameters_schema().prepare(params)
    }
}
