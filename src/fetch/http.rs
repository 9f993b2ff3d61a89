use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::Fetcher;
use crate::config::{FetchConfig, FetchStrategy};
use crate::errors::{MCPError, MCPResult};

const MAX_REDIRECTS: usize = 10;

/// 使用 reqwest 的 HTTP 获取器
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> MCPResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| MCPError::ServerError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout: config.timeout,
        })
    }

    fn map_error(&self, url: &str, error: reqwest::Error) -> MCPError {
        if error.is_timeout() {
            warn!("⏱️ 请求超时: {}", url);
            MCPError::Timeout(format!("{} did not respond within {:?}", url, self.timeout))
        } else {
            MCPError::NavigationError(error.to_string())
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn strategy(&self) -> FetchStrategy {
        FetchStrategy::Http
    }

    async fn fetch(&self, url: &str) -> MCPResult<String> {
        let started = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("❌ {} 返回 {}", url, status);
            return Err(MCPError::FetchError {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown Status").to_string(),
            });
        }

        let body = response.text().await.map_err(|e| self.map_error(url, e))?;
        debug!("📥 {} 获取 {} 字节，耗时 {:?}", url, body.len(), started.elapsed());
        Ok(body)
    }
}
