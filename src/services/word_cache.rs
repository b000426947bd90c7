//! 词条缓存与去重追踪 - 业务能力层
//!
//! 只负责"暂存候选词条、保证不重复发放"能力，不关心流程。
//! 缓存按插入顺序淘汰最旧词条；已发放集合只通过 `reset()` 清空。

use std::collections::HashSet;

use rand::seq::SliceRandom;
use tracing::debug;

use crate::models::word::WordCandidate;

/// 缓存容量默认值
pub const DEFAULT_CAPACITY: usize = 50;

/// 词条缓存与去重追踪器
///
/// 职责：
/// - 暂存最近获取的候选词条（FIFO，容量受限，按词语去重）
/// - 记录已发放给会话的词语，两次 `reset()` 之间绝不重复发放
pub struct WordCache {
    /// 按插入顺序保存的缓存词条
    cached: Vec<WordCandidate>,
    /// 本进程内已发放的词语集合
    used: HashSet<String>,
    capacity: usize,
}

impl WordCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cached: Vec::new(),
            used: HashSet::new(),
            capacity,
        }
    }

    /// 收纳一批候选词条
    ///
    /// 已在缓存中的词语跳过；超出容量时按插入顺序淘汰最旧词条。
    /// 返回实际新增的数量。
    pub fn admit(&mut self, candidates: Vec<WordCandidate>) -> usize {
        let mut added = 0;
        for candidate in candidates {
            let key = candidate.key();
            if self.cached.iter().any(|c| c.key() == key) {
                continue;
            }
            self.cached.push(candidate);
            added += 1;
        }

        if self.cached.len() > self.capacity {
            let overflow = self.cached.len() - self.capacity;
            self.cached.drain(..overflow);
            debug!("缓存超出容量，淘汰 {} 个最旧词条", overflow);
        }

        debug!(
            "缓存收纳 {} 个新词条，当前缓存大小: {}",
            added,
            self.cached.len()
        );
        added
    }

    /// 取出至多 n 个未发放的词条并标记为已发放
    ///
    /// 随机选取以提高主题多样性；不足 n 个时返回全部可用词条。
    pub fn take_unused(&mut self, n: usize) -> Vec<WordCandidate> {
        let mut available: Vec<WordCandidate> = self
            .cached
            .iter()
            .filter(|c| !self.used.contains(&c.key()))
            .cloned()
            .collect();

        available.shuffle(&mut rand::thread_rng());
        available.truncate(n);

        for candidate in &available {
            self.used.insert(candidate.key());
        }
        available
    }

    /// 未发放词条的数量
    pub fn unused_len(&self) -> usize {
        self.cached
            .iter()
            .filter(|c| !self.used.contains(&c.key()))
            .count()
    }

    /// 标记一个词语为已发放（用于缓存之外的词条，如应急词条）
    pub fn mark_used(&mut self, word: &str) {
        self.used.insert(word.trim().to_string());
    }

    /// 词语是否已发放
    pub fn is_used(&self, word: &str) -> bool {
        self.used.contains(word.trim())
    }

    /// 撤销一批词语的已发放标记（应急词条回收时使用）
    pub fn unmark_all<'a>(&mut self, words: impl IntoIterator<Item = &'a str>) {
        for word in words {
            self.used.remove(word.trim());
        }
    }

    /// 清空已发放集合（不动缓存）
    pub fn reset(&mut self) {
        let previous = self.used.len();
        self.used.clear();
        debug!("已发放集合已清空，{} 个词语可重新发放", previous);
    }

    /// 清空缓存（不动已发放集合）
    pub fn clear(&mut self) {
        let previous = self.cached.len();
        self.cached.clear();
        debug!("缓存已清空，移除 {} 个词条", previous);
    }

    pub fn len(&self) -> usize {
        self.cached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cached.is_empty()
    }
}

impl Default for WordCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::word::{DEFAULT_CATEGORY, EXAMPLE_PLACEHOLDER};

    fn candidate(word: &str) -> WordCandidate {
        WordCandidate {
            word: word.to_string(),
            definition: format!("{} 的释义", word),
            example: EXAMPLE_PLACEHOLDER.to_string(),
            synonyms: vec![],
            antonyms: vec![],
            category: DEFAULT_CATEGORY.to_string(),
            source: "test".to_string(),
        }
    }

    fn batch(words: &[&str]) -> Vec<WordCandidate> {
        words.iter().map(|w| candidate(w)).collect()
    }

    #[test]
    fn test_admit_dedups_by_word() {
        let mut cache = WordCache::new();
        assert_eq!(cache.admit(batch(&["甲", "乙"])), 2);
        assert_eq!(cache.admit(batch(&["乙", "丙"])), 1);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut cache = WordCache::with_capacity(3);
        cache.admit(batch(&["一", "二", "三"]));
        cache.admit(batch(&["四", "五"]));
        assert_eq!(cache.len(), 3);
        // 最旧的"一"、"二"被淘汰
        let taken = cache.take_unused(10);
        let words: Vec<String> = taken.iter().map(|c| c.word.clone()).collect();
        assert!(!words.contains(&"一".to_string()));
        assert!(!words.contains(&"二".to_string()));
        assert!(words.contains(&"五".to_string()));
    }

    #[test]
    fn test_capacity_never_exceeded_with_many_batches() {
        let mut cache = WordCache::with_capacity(5);
        for i in 0..20 {
            cache.admit(batch(&[&format!("词{}", i)]));
            assert!(cache.len() <= 5);
        }
    }

    #[test]
    fn test_take_unused_never_repeats_between_resets() {
        let mut cache = WordCache::new();
        cache.admit(batch(&["甲", "乙", "丙", "丁"]));

        let mut seen = std::collections::HashSet::new();
        for _ in 0..4 {
            for c in cache.take_unused(1) {
                assert!(seen.insert(c.word.clone()), "词条 {} 被重复发放", c.word);
            }
        }
        // 全部发放完毕后不再有可用词条
        assert!(cache.take_unused(1).is_empty());

        // reset 后可以重新发放
        cache.reset();
        assert_eq!(cache.take_unused(4).len(), 4);
    }

    #[test]
    fn test_take_unused_returns_all_when_short() {
        let mut cache = WordCache::new();
        cache.admit(batch(&["甲", "乙"]));
        assert_eq!(cache.take_unused(10).len(), 2);
    }

    #[test]
    fn test_clear_keeps_used_set() {
        let mut cache = WordCache::new();
        cache.admit(batch(&["甲"]));
        cache.take_unused(1);
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.is_used("甲"));
    }
}
