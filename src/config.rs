/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 目标词条数量
    pub target_word_count: usize,
    /// 请求间隔（毫秒），用于尊重后端限流
    pub request_delay_ms: u64,
    /// 单次获取的最大重试次数
    pub max_retry_attempts: usize,
    /// 本地 CLI 基础超时（毫秒），子进程调用使用 3 倍值
    pub cli_timeout_ms: u64,
    /// 词库数据库路径
    pub db_path: String,
    // --- 远程 LLM API 配置 ---
    pub llm_api_key: String,
    pub llm_api_url: String,
    pub llm_model_name: String,
    // --- 本地 CLI 模型配置（可选的备用后端） ---
    pub cli_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_word_count: 5000,
            request_delay_ms: 500,
            max_retry_attempts: 3,
            cli_timeout_ms: 20_000,
            db_path: "./word_bank.sqlite".to_string(),
            llm_api_key: String::new(),
            llm_api_url: "http://menshen.xdf.cn/v1/chat/completions".to_string(),
            llm_model_name: "gemini-3.0-pro-preview".to_string(),
            cli_model_name: String::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            target_word_count: std::env::var("TARGET_WORD_COUNT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.target_word_count),
            request_delay_ms: std::env::var("REQUEST_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_delay_ms),
            max_retry_attempts: std::env::var("MAX_RETRY_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_retry_attempts),
            cli_timeout_ms: std::env::var("CLI_TIMEOUT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.cli_timeout_ms),
            db_path: std::env::var("DB_PATH").unwrap_or(default.db_path),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_url: std::env::var("LLM_API_URL").unwrap_or(default.llm_api_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            cli_model_name: std::env::var("CLI_MODEL_NAME").unwrap_or(default.cli_model_name),
        }
    }

    /// 远程 API 是否配置完整
    pub fn has_remote_api(&self) -> bool {
        !self.llm_api_key.is_empty() && !self.llm_api_url.is_empty() && !self.llm_model_name.is_empty()
    }

    /// 本地 CLI 模型是否配置
    pub fn has_local_cli(&self) -> bool {
        !self.cli_model_name.is_empty()
    }
}
