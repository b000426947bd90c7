use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// LLM 后端调用错误
    Api(ApiError),
    /// 响应解析错误
    Parse(ParseError),
    /// 词库存储错误
    Storage(StorageError),
    /// 配置错误
    Config(ConfigError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Api(e) => write!(f, "API错误: {}", e),
            AppError::Parse(e) => write!(f, "解析错误: {}", e),
            AppError::Storage(e) => write!(f, "存储错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Api(e) => Some(e),
            AppError::Parse(e) => Some(e),
            AppError::Storage(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// LLM 后端调用错误
#[derive(Debug)]
pub enum ApiError {
    /// 认证被拒绝（401/403），重试无意义
    AuthRejected {
        provider: String,
        status: u16,
    },
    /// 网络请求失败（连接失败等瞬时错误）
    RequestFailed {
        provider: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 请求超时
    Timeout {
        provider: String,
        timeout_ms: u64,
    },
    /// 后端返回了空响应
    EmptyResponse {
        provider: String,
    },
    /// 本地命令执行失败（非零退出码）
    CommandFailed {
        provider: String,
        detail: String,
    },
}

impl ApiError {
    /// 是否是认证类错误（致命，不重试）
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::AuthRejected { .. })
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::AuthRejected { provider, status } => {
                write!(f, "认证被拒绝 ({}): HTTP {}", provider, status)
            }
            ApiError::RequestFailed { provider, source } => {
                write!(f, "请求失败 ({}): {}", provider, source)
            }
            ApiError::Timeout {
                provider,
                timeout_ms,
            } => {
                write!(f, "请求超时 ({}): 超过 {}ms", provider, timeout_ms)
            }
            ApiError::EmptyResponse { provider } => {
                write!(f, "后端返回空响应: {}", provider)
            }
            ApiError::CommandFailed { provider, detail } => {
                write!(f, "本地命令执行失败 ({}): {}", provider, detail)
            }
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::RequestFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 响应解析错误
#[derive(Debug)]
pub enum ParseError {
    /// 响应文本中找不到 JSON 数组结构
    ArrayNotFound {
        /// 原始响应文本（用于诊断）
        raw: String,
    },
    /// JSON 解码失败
    JsonInvalid {
        raw: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 解码成功但没有任何候选词条
    NoCandidates,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::ArrayNotFound { raw } => {
                write!(f, "响应中未找到 JSON 数组 (响应长度: {} 字符)", raw.len())
            }
            ParseError::JsonInvalid { raw, source } => {
                write!(
                    f,
                    "JSON 解码失败 (响应长度: {} 字符): {}",
                    raw.len(),
                    source
                )
            }
            ParseError::NoCandidates => write!(f, "后端未生成任何候选词条"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::JsonInvalid { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 词库存储错误
#[derive(Debug)]
pub enum StorageError {
    /// 数据库连接未打开
    NotOpen,
    /// 数据库初始化失败
    InitFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 单条写入失败
    InsertFailed {
        word: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 批量写入事务失败（已整体回滚）
    BulkInsertFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 查询失败
    QueryFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::NotOpen => write!(f, "数据库连接未打开"),
            StorageError::InitFailed { path, source } => {
                write!(f, "数据库初始化失败 ({}): {}", path, source)
            }
            StorageError::InsertFailed { word, source } => {
                write!(f, "词条 \"{}\" 写入失败: {}", word, source)
            }
            StorageError::BulkInsertFailed { source } => {
                write!(f, "批量写入事务失败: {}", source)
            }
            StorageError::QueryFailed { source } => {
                write!(f, "查询失败: {}", source)
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::InitFailed { source, .. }
            | StorageError::InsertFailed { source, .. }
            | StorageError::BulkInsertFailed { source }
            | StorageError::QueryFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            StorageError::NotOpen => None,
        }
    }
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 没有配置任何 LLM 后端
    NoProviderConfigured,
    /// 环境变量解析失败
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoProviderConfigured => {
                write!(f, "未配置任何 LLM 后端，至少需要配置远程 API 或本地 CLI 模型")
            }
            ConfigError::EnvVarParseFailed {
                var_name,
                value,
                expected_type,
            } => {
                write!(
                    f,
                    "环境变量 {} 解析失败: 值 '{}' 无法转换为 {}",
                    var_name, value, expected_type
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ========== 从常见错误类型转换 ==========
// 注意：不需要手动实现 From<AppError> for anyhow::Error，
// 因为 anyhow 已经为所有实现了 std::error::Error 的类型提供了自动实现

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Storage(StorageError::QueryFailed {
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建请求失败错误
    pub fn request_failed(
        provider: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Api(ApiError::RequestFailed {
            provider: provider.into(),
            source: Box::new(source),
        })
    }

    /// 创建认证拒绝错误
    pub fn auth_rejected(provider: impl Into<String>, status: u16) -> Self {
        AppError::Api(ApiError::AuthRejected {
            provider: provider.into(),
            status,
        })
    }

    /// 创建请求超时错误
    pub fn timeout(provider: impl Into<String>, timeout_ms: u64) -> Self {
        AppError::Api(ApiError::Timeout {
            provider: provider.into(),
            timeout_ms,
        })
    }

    /// 创建解析失败错误（保留原始响应文本）
    pub fn json_invalid(
        raw: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Parse(ParseError::JsonInvalid {
            raw: raw.into(),
            source: Box::new(source),
        })
    }

    /// 是否是认证类错误（致命，重试无意义）
    pub fn is_auth_error(&self) -> bool {
        matches!(self, AppError::Api(e) if e.is_auth())
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_classification() {
        let err = AppError::auth_rejected("remote-api", 401);
        assert!(err.is_auth_error());

        let err = AppError::timeout("remote-api", 60000);
        assert!(!err.is_auth_error());
    }

    #[test]
    fn test_parse_error_keeps_raw_text() {
        let raw = "抱歉，我无法生成词条。".to_string();
        let err = AppError::Parse(ParseError::ArrayNotFound { raw: raw.clone() });
        match err {
            AppError::Parse(ParseError::ArrayNotFound { raw: kept }) => {
                assert_eq!(kept, raw);
            }
            _ => panic!("应保留原始响应文本"),
        }
    }
}
