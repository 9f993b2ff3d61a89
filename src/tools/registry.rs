use std::sync::Arc;

use tracing::{info, warn};

use super::base::MCPTool;
use super::transform::TransformTool;
use super::xpath::{SelectTool, XPathTool, XPathWithUrlTool};
use crate::config::{ServerConfig, ServerProfile};
use crate::errors::{MCPError, MCPResult};
use crate::fetch::{create_fetcher, Fetcher};
use crate::xml::{XsltEngine, XsltProc};

/// 启动时构建的工具表，之后只读
pub struct ToolRegistry {
    name: String,
    tools: Vec<Arc<dyn MCPTool>>,
}

impl ToolRegistry {
    pub fn builder(name: impl Into<String>) -> ToolRegistryBuilder {
        ToolRegistryBuilder {
            name: name.into(),
            tools: Vec::new(),
        }
    }

    /// 按部署形态构建工具表，获取器和 XSLT 引擎由配置决定
    pub fn for_profile(config: &ServerConfig) -> MCPResult<Self> {
        let tools = config.profile.tool_names();

        let fetcher = if tools.contains(&"xpathwithurl") {
            Some(create_fetcher(&config.fetch)?)
        } else {
            None
        };

        let engine: Option<Arc<dyn XsltEngine>> = if tools.contains(&"transform") {
            let engine = XsltProc::from_config(&config.transform);
            if !engine.is_available() {
                warn!("⚠️ 未找到 {}，transform 调用将返回错误", engine.program().display());
            }
            Some(Arc::new(engine))
        } else {
            None
        };

        Self::with_components(config.profile, fetcher, engine)
    }

    /// 使用给定的获取器与引擎构建工具表
    pub fn with_components(
        profile: ServerProfile,
        fetcher: Option<Arc<dyn Fetcher>>,
        engine: Option<Arc<dyn XsltEngine>>,
    ) -> MCPResult<Self> {
        let mut builder = Self::builder(profile.server_name());

        for name in profile.tool_names() {
            builder = match *name {
                "xpath" => builder.tool(XPathTool::new()),
                "select" => builder.tool(SelectTool::new()),
                "xpathwithurl" => {
                    let fetcher = fetcher.clone().ok_or_else(|| {
                        MCPError::ServerError("xpathwithurl requires a fetcher".to_string())
                    })?;
                    builder.tool(XPathWithUrlTool::new(fetcher))
                }
                "transform" => {
                    let engine = engine.clone().ok_or_else(|| {
                        MCPError::ServerError("transform requires an XSLT engine".to_string())
                    })?;
                    builder.tool(TransformTool::new(engine))
                }
                other => return Err(MCPError::ServerError(format!("no tool named {}", other))),
            };
        }

        let registry = builder.build();
        info!("🔧 {} 注册了 {} 个工具: {:?}", registry.name, registry.len(), registry.names());
        Ok(registry)
    }

    /// 服务器名称（随部署形态变化）
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn MCPTool>> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    pub fn tools(&self) -> &[Arc<dyn MCPTool>] {
        &self.tools
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

pub struct ToolRegistryBuilder {
    name: String,
    tools: Vec<Arc<dyn MCPTool>>,
}

impl ToolRegistryBuilder {
    pub fn tool(mut self, tool: impl MCPTool + 'static) -> Self {
        self.tools.push(Arc::new(tool));
        self
    }

    pub fn build(self) -> ToolRegistry {
        ToolRegistry {
            name: self.name,
            tools: self.tools,
        }
    }
}
