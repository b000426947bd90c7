//! 词条采集服务 - 业务能力层
//!
//! 组合后端、解析器与缓存，对外只暴露"给我 N 个不重复的词条"能力。
//!
//! 失败降级链：主后端（指数退避重试）→ 备用后端（一次）→ 内置应急词库。
//! 瞬时失败不向外抛出，宁可返回陈旧词条也保证调用方拿到东西；
//! 唯一的例外是认证被拒绝——换词条救不了坏凭证，必须让会话立即终止。

use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::models::word::WordCandidate;
use crate::providers::{build_providers, Provider, BATCH_SIZE};
use crate::services::parser::parse_candidates;
use crate::services::word_cache::WordCache;

/// 应急词条来源标记
pub const EMERGENCY_SOURCE: &str = "应急词库";

/// 重试退避的指数上限（2^5 倍基础间隔封顶）
const RETRY_BACKOFF_EXP_CAP: u32 = 5;

/// 第 attempt 次（从 1 起）重试前的退避时长
fn retry_backoff_ms(base_ms: u64, attempt: usize) -> u64 {
    let exp = (attempt as u32).saturating_sub(1).min(RETRY_BACKOFF_EXP_CAP);
    base_ms * 2u64.pow(exp)
}

/// 会话驱动器消费的批量词条来源
///
/// 生产环境由 `AcquisitionService` 实现；测试用脚本化实现驱动会话。
pub trait BatchSource {
    /// 返回至多 n 个不重复的候选词条
    fn get_unique_words(
        &mut self,
        n: usize,
    ) -> impl std::future::Future<Output = AppResult<Vec<WordCandidate>>> + Send;
}

/// 词条采集服务
///
/// 职责：
/// - 维护缓存与已发放集合（进程内状态，独占持有）
/// - 编排主/备后端调用与重试退避
/// - 全部后端失败时回落到应急词库
pub struct AcquisitionService {
    primary: Provider,
    secondary: Option<Provider>,
    cache: WordCache,
    max_retry_attempts: usize,
    retry_delay_ms: u64,
}

impl AcquisitionService {
    /// 根据配置构造采集服务
    ///
    /// 两个后端都未配置时在此处直接失败。
    pub fn new(config: &Config) -> AppResult<Self> {
        let (primary, secondary) = build_providers(config)?;
        info!(
            "采集服务已初始化，主后端: {}，备用后端: {}",
            primary.name(),
            secondary
                .as_ref()
                .map(|p| p.name())
                .unwrap_or("无")
        );
        Ok(Self {
            primary,
            secondary,
            cache: WordCache::new(),
            max_retry_attempts: config.max_retry_attempts,
            retry_delay_ms: config.request_delay_ms,
        })
    }

    /// 调用指定后端并解析响应
    async fn fetch_from(&self, provider: &Provider) -> AppResult<Vec<WordCandidate>> {
        let raw = provider.fetch_batch().await?;
        parse_candidates(&raw, &provider.source_tag())
    }

    /// 一次补货：主后端带退避重试，失败后备用后端尝试一次
    ///
    /// 认证错误立即向上传播，不重试也不降级。
    async fn fetch_live(&self) -> AppResult<Vec<WordCandidate>> {
        let mut last_error = None;

        for attempt in 1..=self.max_retry_attempts {
            match self.fetch_from(&self.primary).await {
                Ok(batch) => return Ok(batch),
                Err(e) if e.is_auth_error() => return Err(e),
                Err(e) => {
                    warn!(
                        "主后端第 {}/{} 次调用失败: {}",
                        attempt, self.max_retry_attempts, e
                    );
                    last_error = Some(e);
                    if attempt < self.max_retry_attempts {
                        let wait_ms = retry_backoff_ms(self.retry_delay_ms, attempt);
                        info!("{}ms 后重试主后端...", wait_ms);
                        sleep(Duration::from_millis(wait_ms)).await;
                    }
                }
            }
        }

        if let Some(provider) = &self.secondary {
            info!("主后端重试耗尽，改用备用后端 {} 尝试一次...", provider.name());
            match self.fetch_from(provider).await {
                Ok(batch) => return Ok(batch),
                Err(e) if e.is_auth_error() => return Err(e),
                Err(e) => {
                    error!("备用后端也失败了: {}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| crate::error::AppError::Other("后端调用未执行".to_string())))
    }

    /// 应急降级：从内置词库取未发放的词条
    ///
    /// 整个应急词库都发放过时，撤销其已发放标记循环使用——
    /// 宁可重复也不返回空。
    fn take_emergency(&mut self, n: usize) -> Vec<WordCandidate> {
        let pool = emergency_words();

        let mut unused: Vec<WordCandidate> = pool
            .iter()
            .filter(|c| !self.cache.is_used(&c.key()))
            .cloned()
            .collect();

        if unused.is_empty() {
            warn!("应急词库已全部发放过，撤销标记后循环使用");
            self.cache.unmark_all(pool.iter().map(|c| c.word.as_str()));
            unused = pool;
        }

        unused.truncate(n);
        for candidate in &unused {
            self.cache.mark_used(&candidate.key());
        }
        unused
    }

    /// 清空已发放集合，使所有词条可重新发放
    pub fn reset_used(&mut self) {
        self.cache.reset();
    }

    /// 清空缓存（测试与特殊场景使用）
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

impl BatchSource for AcquisitionService {
    /// 返回至多 n 个不重复的候选词条
    ///
    /// 缓存够用时直接发放；不够时做一次补货再发放（不无限循环）；
    /// 补货彻底失败时回落应急词库。除认证错误外不向外抛错。
    async fn get_unique_words(&mut self, n: usize) -> AppResult<Vec<WordCandidate>> {
        if self.cache.unused_len() >= n {
            info!(
                "缓存中有 {} 个未发放词条，直接返回 {} 个",
                self.cache.unused_len(),
                n
            );
            return Ok(self.cache.take_unused(n));
        }

        match self.fetch_live().await {
            Ok(batch) => {
                let admitted = self.cache.admit(batch);
                info!("补货完成，缓存新增 {} 个词条", admitted);
                Ok(self.cache.take_unused(n))
            }
            Err(e) if e.is_auth_error() => Err(e),
            Err(e) => {
                error!("所有在线后端均失败，回落应急词库: {}", e);
                Ok(self.take_emergency(n))
            }
        }
    }
}

/// 内置应急词库
///
/// 全部后端失败时的最后退路；所有词条类别都在白名单内。
pub fn emergency_words() -> Vec<WordCandidate> {
    let entries: [(&str, &str, &str, &[&str], &[&str], &str); 10] = [
        (
            "龃龉",
            "上下牙齿对不齐，比喻意见不合、互相抵触。",
            "双方在细节问题上时有龃龉。",
            &["不合", "抵触"],
            &["融洽", "契合"],
            "文学",
        ),
        (
            "饕餮",
            "传说中贪食的恶兽，比喻贪吃或贪婪的人。",
            "这一桌菜足以款待诸位饕餮之徒。",
            &["老饕"],
            &[],
            "历史",
        ),
        (
            "缱绻",
            "情意深厚、缠绵不舍。",
            "临别之际，两人缱绻难分。",
            &["缠绵", "眷恋"],
            &["决绝"],
            "文学",
        ),
        (
            "踟蹰",
            "心中犹豫、徘徊不前。",
            "他在门口踟蹰良久，终究没有进去。",
            &["踌躇", "徘徊"],
            &["果断"],
            "文学",
        ),
        (
            "斡旋",
            "居中调解，扭转僵局。",
            "经多方斡旋，争端终于平息。",
            &["调停", "调解"],
            &["挑拨"],
            "交际",
        ),
        (
            "罹患",
            "遭受疾病。",
            "他不幸罹患重病，却仍坚持工作。",
            &["患病"],
            &["痊愈"],
            "医学",
        ),
        (
            "质库",
            "旧时收取抵押品放款的店铺，即当铺。",
            "家道中落，祖传的玉器也进了质库。",
            &["当铺"],
            &[],
            "商业",
        ),
        (
            "氤氲",
            "烟气、云气浓郁弥漫的样子。",
            "清晨的山谷里雾气氤氲。",
            &["弥漫"],
            &["清朗"],
            "自然",
        ),
        (
            "肴馔",
            "丰盛的饭菜。",
            "席上肴馔罗列，宾主尽欢。",
            &["佳肴", "菜肴"],
            &[],
            "饮食",
        ),
        (
            "格物",
            "推究事物的原理，以求得知识。",
            "古人讲格物致知，重在躬行体察。",
            &["穷理"],
            &[],
            "哲学",
        ),
    ];

    entries
        .iter()
        .map(|(word, definition, example, synonyms, antonyms, category)| WordCandidate {
            word: word.to_string(),
            definition: definition.to_string(),
            example: example.to_string(),
            synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
            antonyms: antonyms.iter().map(|s| s.to_string()).collect(),
            category: category.to_string(),
            source: EMERGENCY_SOURCE.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::word::category_allowed;

    #[test]
    fn test_emergency_words_all_in_allowed_categories() {
        let pool = emergency_words();
        assert_eq!(pool.len(), 10);
        for entry in &pool {
            assert!(
                category_allowed(&entry.category),
                "应急词条 \"{}\" 的类别 \"{}\" 不在白名单内",
                entry.word,
                entry.category
            );
            assert_eq!(entry.source, EMERGENCY_SOURCE);
        }
    }

    #[test]
    fn test_emergency_words_unique() {
        let pool = emergency_words();
        let mut seen = std::collections::HashSet::new();
        for entry in &pool {
            assert!(seen.insert(entry.word.clone()), "应急词条重复: {}", entry.word);
        }
    }

    /// 构造一个只有应急路径可用的采集服务
    fn service_without_backend() -> AcquisitionService {
        AcquisitionService {
            primary: Provider::LocalCli(crate::providers::LocalCliProvider::new(
                &Config {
                    cli_model_name: "不存在的模型".to_string(),
                    ..Config::default()
                },
            )),
            secondary: None,
            cache: WordCache::new(),
            max_retry_attempts: 1,
            retry_delay_ms: 1,
        }
    }

    #[test]
    fn test_retry_backoff_is_capped() {
        assert_eq!(retry_backoff_ms(500, 1), 500);
        assert_eq!(retry_backoff_ms(500, 3), 2000);
        // 指数封顶在 2^5，再大的尝试次数也不溢出
        assert_eq!(retry_backoff_ms(500, 6), 500 * 32);
        assert_eq!(retry_backoff_ms(500, 100), 500 * 32);
    }

    #[test]
    fn test_emergency_recycles_when_exhausted() {
        let mut service = service_without_backend();

        // 把整个应急词库发放完
        let first = service.take_emergency(10);
        assert_eq!(first.len(), 10);

        // 已全部发放过，仍应循环返回而不是空
        let recycled = service.take_emergency(3);
        assert_eq!(recycled.len(), 3);
    }

    #[test]
    fn test_emergency_filters_used_words() {
        let mut service = service_without_backend();
        let first = service.take_emergency(4);
        let second = service.take_emergency(6);

        let first_words: std::collections::HashSet<String> =
            first.iter().map(|c| c.word.clone()).collect();
        for c in &second {
            assert!(!first_words.contains(&c.word), "词条 {} 被重复发放", c.word);
        }
    }
}
