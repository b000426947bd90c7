//! 远程 LLM API 后端
//!
//! 通过 reqwest 直接 POST Chat Completions 接口，Bearer 认证；
//! 401/403 归类为认证错误（致命），其余失败按瞬时错误处理。

use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult};
use crate::providers::build_prompt;

pub const PROVIDER_NAME: &str = "remote-api";

/// 远程 API 请求超时（毫秒）
const REQUEST_TIMEOUT_MS: u64 = 60_000;

/// 多词条批量生成需要的响应长度
const MAX_TOKENS: u32 = 2000;

/// 提高温度以增加词条多样性
const TEMPERATURE: f64 = 0.9;

/// 远程 Chat Completions API 后端
#[derive(Debug)]
pub struct RemoteApiProvider {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    model_name: String,
}

impl RemoteApiProvider {
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(REQUEST_TIMEOUT_MS))
            .build()
            .map_err(|e| AppError::request_failed(PROVIDER_NAME, e))?;

        Ok(Self {
            client,
            api_key: config.llm_api_key.clone(),
            api_url: config.llm_api_url.clone(),
            model_name: config.llm_model_name.clone(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// 调用远程 API，返回原始响应文本
    pub async fn fetch_batch(&self) -> AppResult<String> {
        let body = json!({
            "model": self.model_name,
            "messages": [{ "role": "user", "content": build_prompt() }],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        });

        debug!("远程 API 请求准备完成，模型: {}", self.model_name);
        let started = std::time::Instant::now();

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::timeout(PROVIDER_NAME, REQUEST_TIMEOUT_MS)
                } else {
                    AppError::request_failed(PROVIDER_NAME, e)
                }
            })?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            warn!("远程 API 认证被拒绝: HTTP {}", status);
            return Err(AppError::auth_rejected(PROVIDER_NAME, status.as_u16()));
        }
        if !status.is_success() {
            return Err(match response.error_for_status() {
                Err(source) => AppError::request_failed(PROVIDER_NAME, source),
                Ok(_) => AppError::Other(format!("远程 API 返回异常状态: {}", status)),
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| AppError::request_failed(PROVIDER_NAME, e))?;

        info!(
            "远程 API 响应已收到，耗时: {}ms",
            started.elapsed().as_millis()
        );

        let content = payload
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.trim().to_string());

        match content {
            Some(text) if !text.is_empty() => Ok(text),
            _ => {
                warn!("远程 API 响应缺少内容字段: {}", payload);
                Err(AppError::Api(ApiError::EmptyResponse {
                    provider: PROVIDER_NAME.to_string(),
                }))
            }
        }
    }
}
