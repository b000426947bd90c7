//! 本地 CLI 模型后端
//!
//! 通过子进程调用本地模型（如 `ollama run <model> <prompt>`），
//! 捕获标准输出作为原始响应文本。批量生成耗时较长，
//! 子进程超时取 CLI 基础超时的 3 倍。

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult};
use crate::providers::build_prompt;

pub const PROVIDER_NAME: &str = "local-cli";

/// 本地模型运行命令
const CLI_COMMAND: &str = "ollama";

/// 本地 CLI 模型后端
#[derive(Debug)]
pub struct LocalCliProvider {
    model_name: String,
    timeout_ms: u64,
}

impl LocalCliProvider {
    pub fn new(config: &Config) -> Self {
        Self {
            model_name: config.cli_model_name.clone(),
            // 批量生成比单词条慢得多
            timeout_ms: config.cli_timeout_ms * 3,
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// 执行本地命令，返回标准输出文本
    ///
    /// 提示词作为独立参数传递，不经过 shell，无需转义。
    pub async fn fetch_batch(&self) -> AppResult<String> {
        let prompt = build_prompt();

        debug!("本地 CLI 命令准备完成，模型: {}", self.model_name);
        let started = std::time::Instant::now();

        let child = Command::new(CLI_COMMAND)
            .arg("run")
            .arg(&self.model_name)
            .arg(&prompt)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        let output = tokio::time::timeout(Duration::from_millis(self.timeout_ms), child)
            .await
            .map_err(|_| AppError::timeout(PROVIDER_NAME, self.timeout_ms))?
            .map_err(|e| AppError::request_failed(PROVIDER_NAME, e))?;

        info!(
            "本地 CLI 响应已收到，耗时: {}ms",
            started.elapsed().as_millis()
        );

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            warn!("本地 CLI stderr 输出: {}", stderr.trim());
        }

        if !output.status.success() {
            return Err(AppError::Api(ApiError::CommandFailed {
                provider: PROVIDER_NAME.to_string(),
                detail: format!(
                    "退出码 {:?}: {}",
                    output.status.code(),
                    stderr.trim()
                ),
            }));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if stdout.is_empty() {
            warn!("本地 CLI stdout 输出为空");
            return Err(AppError::Api(ApiError::EmptyResponse {
                provider: PROVIDER_NAME.to_string(),
            }));
        }

        Ok(stdout)
    }
}
