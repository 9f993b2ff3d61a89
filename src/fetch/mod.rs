//! 远程内容获取
//!
//! 每个部署只启用一种获取方式：普通 HTTP 请求，或者由无头浏览器渲染后读取页面内容。

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::{FetchConfig, FetchStrategy};
use crate::errors::MCPResult;

pub mod browser;
pub mod http;

pub use browser::{BrowserFetcher, BrowserSession};
pub use http::HttpFetcher;

/// 获取 URL 对应的标记文本
///
/// 失败时返回 `FetchError` / `NavigationError` / `Timeout`，调用方在获取失败时不会进入解析阶段。
#[async_trait]
pub trait Fetcher: Send + Sync {
    fn strategy(&self) -> FetchStrategy;

    async fn fetch(&self, url: &str) -> MCPResult<String>;
}

/// 按配置创建获取器
pub fn create_fetcher(config: &FetchConfig) -> MCPResult<Arc<dyn Fetcher>> {
    info!("🌐 使用 {:?} 获取远程内容", config.strategy);
    let fetcher: Arc<dyn Fetcher> = match config.strategy {
        FetchStrategy::Http => Arc::new(HttpFetcher::new(config)?),
        FetchStrategy::Browser => Arc::new(BrowserFetcher::new(config)),
    };
    Ok(fetcher)
}
