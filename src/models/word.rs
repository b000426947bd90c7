//! 词条数据模型
//!
//! `WordCandidate` 是后端生成的候选词条，以词语本身为唯一标识。
//! 只有通过类别过滤并成功写入词库后才成为正式词条。

use serde::{Deserialize, Serialize};

/// 缺少例句时使用的占位文本
pub const EXAMPLE_PLACEHOLDER: &str = "暂无例句。";

/// 缺少类别时使用的默认类别
pub const DEFAULT_CATEGORY: &str = "文学";

/// 类别白名单，白名单之外的词条在入库前丢弃
pub const ALLOWED_CATEGORIES: [&str; 10] = [
    "文学", "历史", "艺术", "音乐", "饮食", "医学", "商业", "自然", "哲学", "交际",
];

/// 候选词条
///
/// 由一次后端调用产生，创建后不可变；标识 = 去除首尾空白后的词语。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCandidate {
    /// 词语
    pub word: String,
    /// 释义
    pub definition: String,
    /// 例句
    pub example: String,
    /// 近义词
    pub synonyms: Vec<String>,
    /// 反义词
    pub antonyms: Vec<String>,
    /// 类别
    pub category: String,
    /// 来源标记（如 "remote-api/gemini-3.0-pro-preview"）
    pub source: String,
}

impl WordCandidate {
    /// 规范化后的词语（去除首尾空白），作为去重与存储的主键
    pub fn key(&self) -> String {
        self.word.trim().to_string()
    }
}

/// 类别是否在白名单内
///
/// 中文类别标签无大小写之分，但仍按约定去除首尾空白；
/// 对混入的 ASCII 标签统一转小写后比较，保证判定稳定。
pub fn category_allowed(category: &str) -> bool {
    let normalized = category.trim().to_lowercase();
    ALLOWED_CATEGORIES
        .iter()
        .any(|c| c.to_lowercase() == normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_allowed() {
        assert!(category_allowed("文学"));
        assert!(category_allowed("  哲学 "));
        assert!(!category_allowed("spor"));
        assert!(!category_allowed("Spor"));
        assert!(!category_allowed(""));
    }

    #[test]
    fn test_key_trims_whitespace() {
        let candidate = WordCandidate {
            word: " 龃龉 ".to_string(),
            definition: "意见不合，互相抵触。".to_string(),
            example: EXAMPLE_PLACEHOLDER.to_string(),
            synonyms: vec![],
            antonyms: vec![],
            category: DEFAULT_CATEGORY.to_string(),
            source: "test".to_string(),
        };
        assert_eq!(candidate.key(), "龃龉");
    }
}
