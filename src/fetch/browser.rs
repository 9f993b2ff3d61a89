use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::Fetcher;
use crate::config::{FetchConfig, FetchStrategy};
use crate::errors::{MCPError, MCPResult};

/// 关闭浏览器的最长等待时间，超过后交给 `Drop` 强制结束
const CLOSE_GRACE: Duration = Duration::from_secs(5);

/// 每次调用启动一个独立的无头浏览器，渲染页面后读取序列化内容
///
/// 浏览器拿不到 HTTP 状态码，非 2xx 页面会按正常内容返回。
pub struct BrowserFetcher {
    chrome_executable: Option<PathBuf>,
    timeout: Duration,
    settle: Duration,
}

impl BrowserFetcher {
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            chrome_executable: config.chrome_executable.clone(),
            timeout: config.timeout,
            settle: config.browser_settle,
        }
    }
}

#[async_trait]
impl Fetcher for BrowserFetcher {
    fn strategy(&self) -> FetchStrategy {
        FetchStrategy::Browser
    }

    async fn fetch(&self, url: &str) -> MCPResult<String> {
        // 启动和渲染共用同一个截止时间
        let deadline = Instant::now() + self.timeout;

        let launched = tokio::time::timeout_at(
            deadline,
            BrowserSession::launch(self.chrome_executable.as_deref()),
        )
        .await;
        let mut session = match launched {
            Ok(session) => session?,
            Err(_) => {
                warn!("⏱️ 浏览器启动超时: {}", url);
                return Err(self.timeout_error(url));
            }
        };

        let rendered = tokio::time::timeout_at(deadline, session.render(url, self.settle)).await;
        session.close(CLOSE_GRACE).await;

        match rendered {
            Ok(content) => content,
            Err(_) => {
                warn!("⏱️ 页面渲染超时: {}", url);
                Err(self.timeout_error(url))
            }
        }
    }
}

impl BrowserFetcher {
    fn timeout_error(&self, url: &str) -> MCPError {
        MCPError::Timeout(format!("{} did not finish loading within {:?}", url, self.timeout))
    }
}

/// 一次调用内的浏览器实例
///
/// 正常路径调用 [`BrowserSession::close`]；如果调用被取消或 panic，`Drop` 会终止事件循环，
/// `Browser` 自身的析构会结束子进程，临时 profile 目录随 `TempDir` 删除。
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    _profile: TempDir,
    closed: bool,
}

impl BrowserSession {
    pub async fn launch(chrome_executable: Option<&std::path::Path>) -> MCPResult<Self> {
        let profile = tempfile::tempdir()?;

        let mut builder = BrowserConfig::builder().user_data_dir(profile.path());
        if let Some(executable) = chrome_executable {
            builder = builder.chrome_executable(executable);
        }
        let config = builder
            .build()
            .map_err(|e| MCPError::ServerError(format!("invalid browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| MCPError::ServerError(format!("failed to launch browser: {}", e)))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("浏览器事件错误: {}", e);
                }
            }
        });

        debug!("🚀 浏览器已启动");
        Ok(Self {
            browser,
            handler,
            _profile: profile,
            closed: false,
        })
    }

    /// 导航到 URL，等待导航完成和一段网络空闲时间后返回页面标记
    pub async fn render(&self, url: &str, settle: Duration) -> MCPResult<String> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| MCPError::NavigationError(e.to_string()))?;

        page.wait_for_navigation()
            .await
            .map_err(|e| MCPError::NavigationError(e.to_string()))?;

        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }

        page.content()
            .await
            .map_err(|e| MCPError::NavigationError(e.to_string()))
    }

    /// 关闭浏览器并等待进程退出；超过 `grace` 时放弃等待，由 `Drop` 终止进程
    pub async fn close(&mut self, grace: Duration) -> bool {
        if self.closed {
            return true;
        }

        let browser = &mut self.browser;
        let shutdown = tokio::time::timeout(grace, async {
            if let Err(e) = browser.close().await {
                warn!("关闭浏览器失败: {}", e);
            }
            if let Err(e) = browser.wait().await {
                warn!("等待浏览器进程退出失败: {}", e);
            }
        })
        .await;

        self.handler.abort();
        match shutdown {
            Ok(()) => {
                self.closed = true;
                debug!("🛑 浏览器已关闭");
                true
            }
            Err(_) => {
                warn!("⏱️ 浏览器 {:?} 内未退出", grace);
                false
            }
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if !self.closed {
            warn!("浏览器会话未正常关闭，终止事件循环和浏览器进程");
        }
        self.handler.abort();
    }
}
