//! 候选词来源层（Candidate Source）
//!
//! 把"向 LLM 后端要一批原始响应文本"抽象成统一能力：
//! - `RemoteApiProvider` - 远程 Chat Completions API（reqwest）
//! - `LocalCliProvider` - 本地 CLI 模型子进程调用
//!
//! 后端在进程启动时根据配置一次性选定，不在每次调用时重新协商。

pub mod local_cli;
pub mod remote;

pub use local_cli::LocalCliProvider;
pub use remote::RemoteApiProvider;

use crate::config::Config;
use crate::error::{AppError, AppResult, ConfigError};

/// 每批请求的词条数量
pub const BATCH_SIZE: usize = 10;

/// 构造发给 LLM 的提示词
///
/// 要求一次返回 BATCH_SIZE 个互不相同的生僻词，并以 JSON 数组格式输出。
pub fn build_prompt() -> String {
    format!(
        r#"请生成 {} 个不常见、彼此完全不同的汉语生僻词。
每个词给出释义、例句、近义词、反义词和类别。
词条的类别要多样（文学、历史、艺术、音乐、饮食、医学、商业、自然、哲学、交际等）。
请严格按下面的 JSON 数组格式输出：

[
  {{
    "word": "...",
    "definition": "...",
    "example": "...",
    "synonyms": ["...", "..."],
    "antonyms": ["...", "..."],
    "category": "..."
  }},
  {{
    "word": "...",
    "definition": "...",
    "example": "...",
    "synonyms": ["...", "..."],
    "antonyms": ["...", "..."],
    "category": "..."
  }}
]

请只给出真实存在的汉语词，且所有词互不重复。只返回 JSON 数组，不要附加任何说明。"#,
        BATCH_SIZE
    )
}

/// 词条后端
///
/// 两种实现在构造时选定其一，统一暴露 `fetch_batch()` 能力；
/// 调用方（采集服务）只依赖本枚举，不关心具体后端。
#[derive(Debug)]
pub enum Provider {
    /// 远程 Chat Completions API
    Remote(RemoteApiProvider),
    /// 本地 CLI 模型
    LocalCli(LocalCliProvider),
}

impl Provider {
    /// 发起一次后端调用，返回原始响应文本
    pub async fn fetch_batch(&self) -> AppResult<String> {
        match self {
            Provider::Remote(p) => p.fetch_batch().await,
            Provider::LocalCli(p) => p.fetch_batch().await,
        }
    }

    /// 后端名称（用于日志与错误信息）
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Remote(_) => remote::PROVIDER_NAME,
            Provider::LocalCli(_) => local_cli::PROVIDER_NAME,
        }
    }

    /// 来源标记，格式 "<后端>/<模型>"，由解析器盖到每个词条上
    pub fn source_tag(&self) -> String {
        match self {
            Provider::Remote(p) => format!("{}/{}", remote::PROVIDER_NAME, p.model_name()),
            Provider::LocalCli(p) => format!("{}/{}", local_cli::PROVIDER_NAME, p.model_name()),
        }
    }
}

/// 根据配置构造主后端和可选的备用后端
///
/// 优先级固定：远程 API 优先，本地 CLI 作为备用；
/// 两者都未配置时直接失败（构造期错误，不留到运行期）。
pub fn build_providers(config: &Config) -> AppResult<(Provider, Option<Provider>)> {
    if config.has_remote_api() {
        let primary = Provider::Remote(RemoteApiProvider::new(config)?);
        let secondary = if config.has_local_cli() {
            Some(Provider::LocalCli(LocalCliProvider::new(config)))
        } else {
            None
        };
        Ok((primary, secondary))
    } else if config.has_local_cli() {
        Ok((Provider::LocalCli(LocalCliProvider::new(config)), None))
    } else {
        Err(AppError::Config(ConfigError::NoProviderConfigured))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_providers_prefers_remote() {
        let config = Config {
            llm_api_key: "test-key".to_string(),
            llm_api_url: "http://localhost:8080/v1/chat/completions".to_string(),
            llm_model_name: "test-model".to_string(),
            cli_model_name: "qwen3:8b".to_string(),
            ..Config::default()
        };
        let (primary, secondary) = build_providers(&config).unwrap();
        assert_eq!(primary.name(), remote::PROVIDER_NAME);
        assert_eq!(secondary.unwrap().name(), local_cli::PROVIDER_NAME);
    }

    #[test]
    fn test_build_providers_cli_only() {
        let config = Config {
            llm_api_key: String::new(),
            cli_model_name: "qwen3:8b".to_string(),
            ..Config::default()
        };
        let (primary, secondary) = build_providers(&config).unwrap();
        assert_eq!(primary.name(), local_cli::PROVIDER_NAME);
        assert!(secondary.is_none());
    }

    #[test]
    fn test_build_providers_none_configured() {
        let config = Config {
            llm_api_key: String::new(),
            cli_model_name: String::new(),
            ..Config::default()
        };
        assert!(build_providers(&config).is_err());
    }

    #[test]
    fn test_prompt_mentions_batch_size() {
        let prompt = build_prompt();
        assert!(prompt.contains(&BATCH_SIZE.to_string()));
        assert!(prompt.contains("\"word\""));
    }
}
