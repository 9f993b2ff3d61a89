use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

/// 部署形态：每种形态注册一组固定的工具
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ServerProfile {
    /// xpath + xpathwithurl
    Xpath,
    /// transform + xpath
    Xslt,
    /// select
    Select,
    /// 全部工具
    All,
}

impl ServerProfile {
    pub fn server_name(&self) -> &'static str {
        match self {
            ServerProfile::Xpath => "xpath-mcp",
            ServerProfile::Xslt => "xslt-processor",
            ServerProfile::Select => "xpath",
            ServerProfile::All => "xml-query-mcp",
        }
    }

    pub fn tool_names(&self) -> &'static [&'static str] {
        match self {
            ServerProfile::Xpath => &["xpath", "xpathwithurl"],
            ServerProfile::Xslt => &["transform", "xpath"],
            ServerProfile::Select => &["select"],
            ServerProfile::All => &["transform", "xpath", "xpathwithurl", "select"],
        }
    }
}

/// 远程内容获取方式，同一部署内二选一
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FetchStrategy {
    /// 普通 HTTP GET
    Http,
    /// 无头浏览器渲染
    Browser,
}

#[derive(Debug, Parser)]
#[command(name = "xml-query-mcp", version, about = "MCP server for XPath queries and XSLT transforms")]
pub struct Cli {
    /// 注册哪一组工具
    #[arg(long, env = "XML_MCP_PROFILE", value_enum, default_value_t = ServerProfile::All)]
    pub profile: ServerProfile,

    /// xpathwithurl 的获取方式
    #[arg(long, env = "XML_MCP_FETCH_STRATEGY", value_enum, default_value_t = FetchStrategy::Http)]
    pub fetch_strategy: FetchStrategy,

    /// 获取超时（秒）
    #[arg(long, env = "XML_MCP_FETCH_TIMEOUT_SECS", default_value_t = 30)]
    pub fetch_timeout_secs: u64,

    /// 浏览器导航完成后等待网络空闲的时间（毫秒）
    #[arg(long, env = "XML_MCP_BROWSER_SETTLE_MS", default_value_t = 500)]
    pub browser_settle_ms: u64,

    /// Chrome/Chromium 可执行文件，不指定时自动探测
    #[arg(long, env = "XML_MCP_CHROME")]
    pub chrome_executable: Option<PathBuf>,

    /// HTTP 请求的 User-Agent
    #[arg(long, env = "XML_MCP_USER_AGENT")]
    pub user_agent: Option<String>,

    /// xsltproc 可执行文件
    #[arg(long, env = "XML_MCP_XSLTPROC", default_value = "xsltproc")]
    pub xsltproc: PathBuf,

    /// XSLT 转换超时（秒）
    #[arg(long, env = "XML_MCP_TRANSFORM_TIMEOUT_SECS", default_value_t = 30)]
    pub transform_timeout_secs: u64,

    /// 打印工具列表后退出
    #[arg(long)]
    pub list_tools: bool,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub strategy: FetchStrategy,
    pub timeout: Duration,
    pub user_agent: String,
    pub browser_settle: Duration,
    pub chrome_executable: Option<PathBuf>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            strategy: FetchStrategy::Http,
            timeout: Duration::from_secs(30),
            user_agent: default_user_agent(),
            browser_settle: Duration::from_millis(500),
            chrome_executable: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransformConfig {
    pub xsltproc: PathBuf,
    pub timeout: Duration,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            xsltproc: PathBuf::from("xsltproc"),
            timeout: Duration::from_secs(30),
        }
    }
}

/// 启动时构建一次，之后只读
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub profile: ServerProfile,
    pub fetch: FetchConfig,
    pub transform: TransformConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            profile: ServerProfile::All,
            fetch: FetchConfig::default(),
            transform: TransformConfig::default(),
        }
    }
}

impl From<&Cli> for ServerConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            profile: cli.profile,
            fetch: FetchConfig {
                strategy: cli.fetch_strategy,
                timeout: Duration::from_secs(cli.fetch_timeout_secs),
                user_agent: cli.user_agent.clone().unwrap_or_else(default_user_agent),
                browser_settle: Duration::from_millis(cli.browser_settle_ms),
                chrome_executable: cli.chrome_executable.clone(),
            },
            transform: TransformConfig {
                xsltproc: cli.xsltproc.clone(),
                timeout: Duration::from_secs(cli.transform_timeout_secs),
            },
        }
    }
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
