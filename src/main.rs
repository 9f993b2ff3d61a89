use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use xml_query_mcp::config::{Cli, ServerConfig};
use xml_query_mcp::mcp::{MCPServer, Server};
use xml_query_mcp::tools::ToolRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载环境变量
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // 初始化日志，stdout 留给协议通信
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("xml_query_mcp=info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = ServerConfig::from(&cli);
    info!("🚀 启动 XML Query MCP 服务器 (profile: {:?})", config.profile);

    let registry = ToolRegistry::for_profile(&config).map_err(|e| {
        error!("❌ 工具注册失败: {}", e);
        anyhow::anyhow!(e)
    })?;

    let mcp_server = MCPServer::new(registry);

    if cli.list_tools {
        for (index, tool) in mcp_server.list_tools().iter().enumerate() {
            println!("{}. {} - {}", index + 1, tool.name, tool.description);
            println!("{}", serde_json::to_string_pretty(&tool.input_schema)?);
        }
        return Ok(());
    }

    let name = mcp_server.registry().name().to_string();
    info!("📋 服务器工具总数: {}", mcp_server.tool_count());

    let mut server = Server::new(name, env!("CARGO_PKG_VERSION").to_string(), mcp_server);
    if let Err(e) = server.run().await {
        error!("❌ 服务器运行失败: {}", e);
        return Err(e);
    }

    info!("👋 MCP服务器关闭");
    Ok(())
}
