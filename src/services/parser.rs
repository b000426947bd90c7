//! 响应解析服务 - 业务能力层
//!
//! 只负责"从原始响应文本提取候选词条"能力，不关心流程。
//! 后端可能在 JSON 前后附加说明文字，解析分两步：
//! 先定位嵌在文本里的 JSON 数组，再逐条宽容地规范化。

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult, ParseError};
use crate::models::word::{WordCandidate, DEFAULT_CATEGORY, EXAMPLE_PLACEHOLDER};

/// 从原始文本中定位第一个形如 `[ { ... } ]` 的 JSON 数组
///
/// 先用正则找到 `[ {` 开头，再做区分字符串内外的括号配对扫描，
/// 避免贪婪匹配误吞数组之后的文本。
fn extract_json_array(raw: &str) -> AppResult<&str> {
    let re = Regex::new(r"\[\s*\{").map_err(|e| AppError::Other(e.to_string()))?;
    let start = re
        .find(raw)
        .map(|m| m.start())
        .ok_or_else(|| {
            AppError::Parse(ParseError::ArrayNotFound {
                raw: raw.to_string(),
            })
        })?;

    let bytes = raw.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' | b'{' => depth += 1,
            b']' | b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Ok(&raw[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    // 括号始终未配平，说明数组被截断了
    Err(AppError::Parse(ParseError::ArrayNotFound {
        raw: raw.to_string(),
    }))
}

/// 取字符串字段，空白串视为缺失
fn string_field(obj: &Value, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// 取字符串列表字段，缺失或格式不对时退化为空列表
fn string_list(obj: &Value, key: &str) -> Vec<String> {
    obj.get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// 把一个 JSON 对象规范化成候选词条
///
/// 词语和释义是硬性要求，缺失则跳过该条（不致命）；
/// 其余字段按约定补默认值。
fn normalize_candidate(obj: &Value, source_tag: &str) -> Option<WordCandidate> {
    let word = string_field(obj, "word");
    let definition = string_field(obj, "definition");

    let (word, definition) = match (word, definition) {
        (Some(w), Some(d)) => (w, d),
        _ => {
            warn!("词条对象缺少必要字段，跳过: {}", obj);
            return None;
        }
    };

    Some(WordCandidate {
        word,
        definition,
        example: string_field(obj, "example")
            .unwrap_or_else(|| EXAMPLE_PLACEHOLDER.to_string()),
        synonyms: string_list(obj, "synonyms"),
        antonyms: string_list(obj, "antonyms"),
        category: string_field(obj, "category")
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        source: source_tag.to_string(),
    })
}

/// 解析一次后端响应，返回规范化后的候选词条列表
///
/// 全部元素都被跳过时返回空列表（调用方按空批次处理，不算解析失败）。
pub fn parse_candidates(raw: &str, source_tag: &str) -> AppResult<Vec<WordCandidate>> {
    let json_text = extract_json_array(raw)?;

    let value: Value =
        serde_json::from_str(json_text).map_err(|e| AppError::json_invalid(raw, e))?;

    let items = match value.as_array() {
        Some(items) if !items.is_empty() => items.clone(),
        _ => {
            warn!("解码结果为空数组或不是数组");
            return Err(AppError::Parse(ParseError::NoCandidates));
        }
    };

    let candidates: Vec<WordCandidate> = items
        .iter()
        .filter_map(|obj| normalize_candidate(obj, source_tag))
        .collect();

    debug!(
        "响应解析完成: {} 个对象中规范化出 {} 个候选词条",
        items.len(),
        candidates.len()
    );

    Ok(candidates)
}
