//! 词库填充会话 - 流程层
//!
//! 核心职责：把采集服务产出的词条流变成有界、可恢复的入库进度。
//!
//! 每轮迭代：取一批词条 → 逐条做类别过滤与查重 → 写入词库；
//! 失败按错误类别分别处理（认证类立即终止、瞬时类指数退避、
//! 解析类短暂跳过），连续失败达到上限时整个会话终止。

use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::error::{ApiError, AppError, StorageError};
use crate::models::word::category_allowed;
use crate::providers::BATCH_SIZE;
use crate::services::acquisition::BatchSource;
use crate::storage::WordStore;

/// 连续失败上限，达到后会话终止
pub const MAX_CONSECUTIVE_FAILURES: usize = 20;

/// 瞬时错误退避的指数上限（2^5 倍请求间隔封顶）
const BACKOFF_EXP_CAP: u32 = 5;

/// 会话终止原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 达到目标词条数量
    TargetReached,
    /// 认证被拒绝，继续重试无意义
    AuthError,
    /// 连续失败达到上限
    FailureCeiling,
    /// 总尝试次数耗尽（目标数量的 2 倍）
    AttemptsExhausted,
    /// 不可恢复错误（存储故障或未知错误类型）
    FatalError,
}

/// 会话摘要
///
/// 非致命路径上的诊断信息都落在这里，测试断言摘要而不是日志文本。
#[derive(Debug, Clone)]
pub struct SessionSummary {
    /// 总尝试次数
    pub total_attempts: usize,
    /// 本次会话新增词条数
    pub new_words_added: usize,
    /// 会话结束时词库中的词条总数
    pub final_count: usize,
    /// 终止原因
    pub stop_reason: StopReason,
}

/// 词库填充会话
///
/// 职责：
/// - 驱动一次完整的填充循环（单逻辑流，无并发批次）
/// - 应用类别白名单过滤与存在性查重
/// - 维护会话计数器并决定何时终止
/// - 不负责打开/关闭数据库连接
pub struct PopulateSession<S: BatchSource> {
    source: S,
    target: usize,
    request_delay_ms: u64,
}

impl<S: BatchSource> PopulateSession<S> {
    pub fn new(source: S, target: usize, request_delay_ms: u64) -> Self {
        Self {
            source,
            target,
            request_delay_ms,
        }
    }

    /// 运行填充会话直到终止
    ///
    /// 任何失败路径都会在尝试上限内收敛到终止状态，绝不静默挂起；
    /// 无论以何种方式结束都返回摘要。
    pub async fn run(&mut self, store: &mut WordStore) -> SessionSummary {
        info!("开始填充词库，目标: {} 个词条", self.target);

        let mut new_words_added = 0usize;
        let mut consecutive_failures = 0usize;
        let mut total_attempts = 0usize;
        let max_total_attempts = self.target * 2;

        let stop_reason = 'session: loop {
            let current_count = match store.count() {
                Ok(c) => c,
                Err(e) => {
                    error!("读取词条总数失败: {}", e);
                    break 'session StopReason::FatalError;
                }
            };

            if current_count >= self.target {
                info!("已达到目标词条数量 ({})", self.target);
                break 'session StopReason::TargetReached;
            }
            if total_attempts >= max_total_attempts {
                warn!("总尝试次数已达上限 ({})，会话终止", max_total_attempts);
                break 'session StopReason::AttemptsExhausted;
            }

            total_attempts += 1;
            info!(
                "当前词条数: {}，还差: {}",
                current_count,
                self.target - current_count
            );

            let batch = match self.source.get_unique_words(BATCH_SIZE).await {
                Ok(batch) => batch,
                Err(e) => {
                    consecutive_failures += 1;
                    error!(
                        "获取词条失败 (连续第 {} 次): {}",
                        consecutive_failures, e
                    );

                    match &e {
                        AppError::Api(ApiError::AuthRejected { provider, status }) => {
                            error!(
                                "认证错误 ({}: HTTP {})，请检查 API 配置。会话终止。",
                                provider, status
                            );
                            break 'session StopReason::AuthError;
                        }
                        AppError::Api(_) => {
                            // 瞬时网络错误，按连续失败次数指数退避
                            let wait_ms = self.request_delay_ms
                                * 2u64.pow((consecutive_failures as u32).min(BACKOFF_EXP_CAP));
                            warn!("网络类错误，{}ms 后重试...", wait_ms);
                            sleep(Duration::from_millis(wait_ms)).await;
                        }
                        AppError::Parse(_) => {
                            // 响应解析失败按空批次处理，不做长退避
                            warn!("响应解析失败，跳过本批。详情见日志。");
                        }
                        AppError::Storage(StorageError::InitFailed { .. })
                        | AppError::Storage(StorageError::BulkInsertFailed { .. }) => {
                            error!("存储初始化或批量事务失败，会话终止。");
                            break 'session StopReason::FatalError;
                        }
                        AppError::Storage(_) | AppError::Config(_) | AppError::Other(_) => {
                            error!("遇到无法分类的错误类型，防御性终止会话。");
                            break 'session StopReason::FatalError;
                        }
                    }

                    if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                        error!(
                            "连续失败 {} 次，后端可能整体不可用。会话终止。",
                            MAX_CONSECUTIVE_FAILURES
                        );
                        break 'session StopReason::FailureCeiling;
                    }
                    continue;
                }
            };

            if batch.is_empty() {
                // 全部元素被解析器跳过时会走到这里：计入连续失败但不退避
                consecutive_failures += 1;
                warn!(
                    "本批没有可用词条 (连续第 {} 次)",
                    consecutive_failures
                );
                if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                    break 'session StopReason::FailureCeiling;
                }
                continue;
            }

            consecutive_failures = 0;

            for candidate in &batch {
                if !category_allowed(&candidate.category) {
                    info!(
                        "词条 \"{}\" 的类别 (\"{}\") 不在白名单内，跳过",
                        candidate.word, candidate.category
                    );
                    continue;
                }

                let word = candidate.key();
                match store.exists(&word) {
                    Ok(true) => {
                        info!("词条 \"{}\" 已在词库中，跳过", word);
                        continue;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        error!("查询词条 \"{}\" 失败: {}", word, e);
                        break 'session StopReason::FatalError;
                    }
                }

                info!("写入新词条 \"{}\"", word);
                match store.insert(candidate) {
                    Ok(true) => new_words_added += 1,
                    Ok(false) => {
                        info!("词条 \"{}\" 已存在，未新增", word);
                        continue;
                    }
                    Err(e) => {
                        // 单条写入失败只跳过该词条，会话继续
                        error!("词条 \"{}\" 写入失败，跳过: {}", word, e);
                        continue;
                    }
                }

                // 每次写入后重新查询权威总数，避免用过期计数判断达标
                match store.count() {
                    Ok(c) if c >= self.target => {
                        info!("已达到目标词条数量 ({})，提前结束本批", self.target);
                        break 'session StopReason::TargetReached;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("读取词条总数失败: {}", e);
                        break 'session StopReason::FatalError;
                    }
                }
            }

            // 批间限速，尊重后端速率限制
            sleep(Duration::from_millis(self.request_delay_ms / 2)).await;
        };

        let final_count = store.count().unwrap_or(0);
        let summary = SessionSummary {
            total_attempts,
            new_words_added,
            final_count,
            stop_reason,
        };
        log_summary(&summary);
        summary
    }
}

fn log_summary(summary: &SessionSummary) {
    info!("{}", "=".repeat(60));
    info!("📊 填充会话结束");
    info!("尝试次数: {}", summary.total_attempts);
    info!("本次新增: {} 个词条", summary.new_words_added);
    info!("词库总数: {} 个词条", summary.final_count);
    info!("终止原因: {:?}", summary.stop_reason);
    info!("{}", "=".repeat(60));
}
