//! 内置种子词条
//!
//! 首次建库时通过批量事务写入，保证词库从非空状态起步。

use crate::models::word::WordCandidate;

/// 种子词条来源标记
pub const SEED_SOURCE: &str = "人工整理";

/// 返回内置种子词条列表
pub fn seed_words() -> Vec<WordCandidate> {
    let entries: [(&str, &str, &str, &[&str], &[&str], &str); 8] = [
        (
            "圭臬",
            "指圭表，比喻准则或法度。",
            "他把先生的教诲奉为圭臬。",
            &["准则", "典范"],
            &[],
            "文学",
        ),
        (
            "肄业",
            "在学校学习而没有毕业，或泛指修习课业。",
            "他大学肄业后便投身商海。",
            &["修业"],
            &["毕业"],
            "商业",
        ),
        (
            "筵席",
            "铺设的坐席，引申为酒席、宴会。",
            "天下没有不散的筵席。",
            &["宴席", "酒席"],
            &[],
            "饮食",
        ),
        (
            "痊愈",
            "病好了，恢复健康。",
            "经过一个月的调养，他已完全痊愈。",
            &["康复", "病愈"],
            &["患病"],
            "医学",
        ),
        (
            "皴法",
            "中国画表现山石树皮纹理的技法。",
            "这幅山水以披麻皴法见长。",
            &[],
            &[],
            "艺术",
        ),
        (
            "徵羽",
            "古代五音中的徵音与羽音，泛指音律。",
            "宫商角徵羽，古人以五音定律。",
            &["音律"],
            &[],
            "音乐",
        ),
        (
            "黍离",
            "《诗经》篇名，后用来指对故国残破的哀思。",
            "重游旧都，顿生黍离之悲。",
            &[],
            &[],
            "历史",
        ),
        (
            "岫",
            "山洞，亦指有洞穴的山峰。",
            "云无心以出岫，鸟倦飞而知还。",
            &["峰峦"],
            &[],
            "自然",
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
            source: SEED_SOURCE.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::word::category_allowed;

    #[test]
    fn test_seed_words_all_in_allowed_categories() {
        let seeds = seed_words();
        assert!(!seeds.is_empty());
        for entry in &seeds {
            assert!(
                category_allowed(&entry.category),
                "种子词条 \"{}\" 的类别 \"{}\" 不在白名单内",
                entry.word,
                entry.category
            );
            assert!(!entry.definition.is_empty());
        }
    }
}
