//! 词库存储服务
//!
//! SQLite 词库：一词一行，`word` 为主键，近义词/反义词以 JSON 字符串落盘。
//! 单条写入用 `INSERT OR IGNORE`，重复词条不报错也不覆盖；
//! 批量写入走单个事务，任一失败整体回滚。

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{AppError, AppResult, StorageError};
use crate::models::word::WordCandidate;

/// SQLite 词库存储
pub struct WordStore {
    db_path: String,
    conn: Option<Connection>,
}

impl WordStore {
    /// 创建存储实例（不立即打开连接）
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            conn: None,
        }
    }

    /// 创建内存词库（测试使用）
    pub fn open_in_memory() -> AppResult<Self> {
        let mut store = Self::new(":memory:");
        store.initialize()?;
        Ok(store)
    }

    /// 打开数据库连接并建表
    pub fn initialize(&mut self) -> AppResult<()> {
        let conn = if self.db_path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(&self.db_path)
        }
        .map_err(|e| {
            AppError::Storage(StorageError::InitFailed {
                path: self.db_path.clone(),
                source: Box::new(e),
            })
        })?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS word_bank (
                word TEXT PRIMARY KEY,
                definition TEXT NOT NULL,
                synonyms TEXT,
                antonyms TEXT,
                example TEXT,
                source TEXT,
                category TEXT
            );",
        )
        .map_err(|e| {
            AppError::Storage(StorageError::InitFailed {
                path: self.db_path.clone(),
                source: Box::new(e),
            })
        })?;

        info!("词库数据库已打开: {}", self.db_path);
        self.conn = Some(conn);
        Ok(())
    }

    /// 关闭数据库连接
    pub fn close(&mut self) -> AppResult<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| {
                AppError::Storage(StorageError::QueryFailed {
                    source: Box::new(e),
                })
            })?;
            info!("词库数据库连接已关闭");
        }
        Ok(())
    }

    fn conn(&self) -> AppResult<&Connection> {
        self.conn
            .as_ref()
            .ok_or(AppError::Storage(StorageError::NotOpen))
    }

    /// 词库中是否已有该词
    pub fn exists(&self, word: &str) -> AppResult<bool> {
        let found: Option<i64> = self
            .conn()?
            .query_row(
                "SELECT 1 FROM word_bank WHERE word = ?1",
                params![word.trim()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// 写入一个词条
    ///
    /// 重复词条被忽略（不覆盖、不报错）。返回是否实际新增了一行。
    pub fn insert(&self, candidate: &WordCandidate) -> AppResult<bool> {
        let word = candidate.key();
        let synonyms = serde_json::to_string(&candidate.synonyms)
            .map_err(|e| Self::insert_error(&word, e))?;
        let antonyms = serde_json::to_string(&candidate.antonyms)
            .map_err(|e| Self::insert_error(&word, e))?;

        let changed = self
            .conn()?
            .execute(
                "INSERT OR IGNORE INTO word_bank
                 (word, definition, synonyms, antonyms, example, source, category)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    word,
                    candidate.definition,
                    synonyms,
                    antonyms,
                    candidate.example,
                    candidate.source,
                    candidate.category.trim(),
                ],
            )
            .map_err(|e| Self::insert_error(&word, e))?;

        let inserted = changed > 0;
        if inserted {
            debug!("词条 \"{}\" 已写入词库", word);
        } else {
            debug!("词条 \"{}\" 已存在于词库", word);
        }
        Ok(inserted)
    }

    /// 批量写入词条（单个事务，全有或全无）
    ///
    /// 返回实际新增的行数；任一语句失败时整个事务回滚。
    pub fn bulk_insert(&mut self, candidates: &[WordCandidate]) -> AppResult<usize> {
        let conn = self
            .conn
            .as_mut()
            .ok_or(AppError::Storage(StorageError::NotOpen))?;

        let tx = conn.transaction().map_err(|e| Self::bulk_error(e))?;
        let mut inserted = 0usize;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR IGNORE INTO word_bank
                     (word, definition, synonyms, antonyms, example, source, category)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )
                .map_err(|e| Self::bulk_error(e))?;

            for candidate in candidates {
                let synonyms = serde_json::to_string(&candidate.synonyms)
                    .map_err(|e| Self::bulk_error(e))?;
                let antonyms = serde_json::to_string(&candidate.antonyms)
                    .map_err(|e| Self::bulk_error(e))?;
                let changed = stmt
                    .execute(params![
                        candidate.key(),
                        candidate.definition,
                        synonyms,
                        antonyms,
                        candidate.example,
                        candidate.source,
                        candidate.category.trim(),
                    ])
                    .map_err(|e| Self::bulk_error(e))?;
                if changed > 0 {
                    inserted += 1;
                }
            }
        }
        tx.commit().map_err(|e| Self::bulk_error(e))?;

        info!("批量写入完成，新增 {} 个词条", inserted);
        Ok(inserted)
    }

    /// 词库中的词条总数
    pub fn count(&self) -> AppResult<usize> {
        let count: i64 =
            self.conn()?
                .query_row("SELECT COUNT(*) FROM word_bank", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// 删除类别不在白名单内的词条（类别为 NULL 的一并删除）
    ///
    /// 返回删除的行数。
    pub fn delete_not_in(&self, allowed_categories: &[&str]) -> AppResult<usize> {
        let placeholders = allowed_categories
            .iter()
            .enumerate()
            .map(|(i, _)| format!("?{}", i + 1))
            .collect::<Vec<_>>()
            .join(",");
        let sql = format!(
            "DELETE FROM word_bank WHERE category IS NULL OR category NOT IN ({})",
            placeholders
        );

        let deleted = self
            .conn()?
            .execute(&sql, params_from_iter(allowed_categories.iter()))?;
        info!("已删除 {} 个类别不合规的词条", deleted);
        Ok(deleted)
    }

    /// 按词语顺序返回全部词条
    pub fn all_words(&self) -> AppResult<Vec<WordCandidate>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT word, definition, synonyms, antonyms, example, source, category
             FROM word_bank ORDER BY word",
        )?;

        let rows = stmt.query_map([], |row| {
            let synonyms: Option<String> = row.get(2)?;
            let antonyms: Option<String> = row.get(3)?;
            Ok(WordCandidate {
                word: row.get(0)?,
                definition: row.get(1)?,
                synonyms: synonyms
                    .and_then(|s| serde_json::from_str(&s).ok())
                    .unwrap_or_default(),
                antonyms: antonyms
                    .and_then(|s| serde_json::from_str(&s).ok())
                    .unwrap_or_default(),
                example: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                source: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                category: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
            })
        })?;

        let mut words = Vec::new();
        for row in rows {
            words.push(row?);
        }
        Ok(words)
    }

    fn insert_error(
        word: &str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> AppError {
        AppError::Storage(StorageError::InsertFailed {
            word: word.to_string(),
            source: Box::new(source),
        })
    }

    fn bulk_error(source: impl std::error::Error + Send + Sync + 'static) -> AppError {
        AppError::Storage(StorageError::BulkInsertFailed {
            source: Box::new(source),
        })
    }
}
