use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::TransformConfig;
use crate::errors::{MCPError, MCPResult};

/// XSLT 引擎接口
#[async_trait]
pub trait XsltEngine: Send + Sync {
    fn name(&self) -> &str;

    /// 使用样式表转换 XML，原样返回引擎输出
    async fn transform(&self, xml: &str, stylesheet: &str) -> MCPResult<String>;
}

/// 通过 libxslt 的 `xsltproc` 命令行执行转换
pub struct XsltProc {
    program: PathBuf,
    timeout: Duration,
}

impl XsltProc {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn from_config(config: &TransformConfig) -> Self {
        Self::new(config.xsltproc.clone(), config.timeout)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// 检测 xsltproc 是否可用
    pub fn is_available(&self) -> bool {
        match std::process::Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) => status.success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl XsltEngine for XsltProc {
    fn name(&self) -> &str {
        "xsltproc"
    }

    async fn transform(&self, xml: &str, stylesheet: &str) -> MCPResult<String> {
        let workdir = tempfile::tempdir()?;
        let xml_path = workdir.path().join("input.xml");
        let xslt_path = workdir.path().join("stylesheet.xsl");
        tokio::fs::write(&xml_path, xml).await?;
        tokio::fs::write(&xslt_path, stylesheet).await?;

        let mut command = Command::new(&self.program);
        command
            .arg("--nonet")
            .arg(&xslt_path)
            .arg(&xml_path)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!("执行 {} {}", self.program.display(), xslt_path.display());

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(result) => result.map_err(|e| {
                MCPError::TransformError(format!("failed to run {}: {}", self.program.display(), e))
            })?,
            Err(_) => {
                warn!("⏱️ XSLT 转换超时 ({:?})", self.timeout);
                return Err(MCPError::Timeout(format!(
                    "XSLT transformation exceeded {:?}",
                    self.timeout
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr
                .lines()
                .map(|line| line.replace(&*workdir.path().to_string_lossy(), ""))
                .collect::<Vec<_>>()
                .join("\n");
            return Err(MCPError::TransformError(if detail.trim().is_empty() {
                format!("xsltproc exited with {}", output.status)
            } else {
                detail.trim().to_string()
            }));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| MCPError::TransformError(format!("output is not valid UTF-8: {}", e)))
    }
}
