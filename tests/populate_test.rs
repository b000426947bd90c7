//! 填充会话端到端测试
//!
//! 用脚本化的 `BatchSource` 实现和内存 SQLite 驱动完整会话，
//! 断言会话摘要而不是日志文本。

use word_bank_builder::error::{AppError, AppResult};
use word_bank_builder::models::word::{WordCandidate, DEFAULT_CATEGORY};
use word_bank_builder::services::acquisition::BatchSource;
use word_bank_builder::storage::WordStore;
use word_bank_builder::utils::logging;
use word_bank_builder::workflow::{PopulateSession, StopReason, MAX_CONSECUTIVE_FAILURES};

fn candidate(word: &str, category: &str) -> WordCandidate {
    WordCandidate {
        word: word.to_string(),
        definition: format!("{} 的释义", word),
        example: "例句。".to_string(),
        synonyms: vec![],
        antonyms: vec![],
        category: category.to_string(),
        source: "test/model".to_string(),
    }
}

/// 每次调用返回固定数量全新的白名单词条
struct SequentialSource {
    per_batch: usize,
    counter: usize,
}

impl SequentialSource {
    fn new(per_batch: usize) -> Self {
        Self {
            per_batch,
            counter: 0,
        }
    }
}

impl BatchSource for SequentialSource {
    async fn get_unique_words(&mut self, _n: usize) -> AppResult<Vec<WordCandidate>> {
        let mut batch = Vec::new();
        for _ in 0..self.per_batch {
            self.counter += 1;
            batch.push(candidate(&format!("词{}", self.counter), DEFAULT_CATEGORY));
        }
        Ok(batch)
    }
}

/// 每次调用都返回同一类错误
enum FailureKind {
    Auth,
    Transient,
}

struct FailingSource {
    kind: FailureKind,
}

impl BatchSource for FailingSource {
    async fn get_unique_words(&mut self, _n: usize) -> AppResult<Vec<WordCandidate>> {
        match self.kind {
            FailureKind::Auth => Err(AppError::auth_rejected("remote-api", 401)),
            FailureKind::Transient => Err(AppError::timeout("remote-api", 1)),
        }
    }
}

/// 按脚本依次吐出预设批次，之后返回空批
struct ScriptedSource {
    batches: Vec<Vec<WordCandidate>>,
    calls: usize,
}

impl ScriptedSource {
    fn new(batches: Vec<Vec<WordCandidate>>) -> Self {
        Self { batches, calls: 0 }
    }
}

impl BatchSource for ScriptedSource {
    async fn get_unique_words(&mut self, _n: usize) -> AppResult<Vec<WordCandidate>> {
        let index = self.calls;
        self.calls += 1;
        Ok(self.batches.get(index).cloned().unwrap_or_default())
    }
}

#[tokio::test]
async fn test_reaches_target_within_three_batches() {
    logging::init();
    let mut store = WordStore::open_in_memory().expect("内存词库应能打开");

    // 每批 2 个全新词条，目标 5 → 3 批内达标
    let mut session = PopulateSession::new(SequentialSource::new(2), 5, 1);
    let summary = session.run(&mut store).await;

    assert_eq!(summary.stop_reason, StopReason::TargetReached);
    assert!(summary.total_attempts <= 3, "应在 3 批内达标");
    assert!(summary.final_count == 5 || summary.final_count == 6);
    assert_eq!(summary.final_count, store.count().unwrap());
}

#[tokio::test]
async fn test_auth_failure_aborts_after_first_batch() {
    logging::init();
    let mut store = WordStore::open_in_memory().unwrap();

    let mut session = PopulateSession::new(
        FailingSource {
            kind: FailureKind::Auth,
        },
        5,
        1,
    );
    let summary = session.run(&mut store).await;

    assert_eq!(summary.stop_reason, StopReason::AuthError);
    assert_eq!(summary.total_attempts, 1);
    assert_eq!(summary.new_words_added, 0);
    assert_eq!(store.count().unwrap(), 0);
}

#[tokio::test]
async fn test_consecutive_transient_failures_hit_ceiling() {
    logging::init();
    let mut store = WordStore::open_in_memory().unwrap();

    let mut session = PopulateSession::new(
        FailingSource {
            kind: FailureKind::Transient,
        },
        100,
        1,
    );
    let summary = session.run(&mut store).await;

    assert_eq!(summary.stop_reason, StopReason::FailureCeiling);
    assert_eq!(summary.total_attempts, MAX_CONSECUTIVE_FAILURES);
    // 部分进度如实上报
    assert_eq!(summary.new_words_added, 0);
    assert_eq!(summary.final_count, 0);
}

#[tokio::test]
async fn test_out_of_list_category_is_never_stored() {
    logging::init();
    let mut store = WordStore::open_in_memory().unwrap();

    let batches = vec![vec![
        candidate("足坛", "spor"),
        candidate("龃龉", "文学"),
    ]];
    let mut session = PopulateSession::new(ScriptedSource::new(batches), 2, 1);
    let summary = session.run(&mut store).await;

    // "spor" 不在白名单内，无论是否重复都不得入库
    assert!(!store.exists("足坛").unwrap());
    assert!(store.exists("龃龉").unwrap());
    assert_eq!(summary.new_words_added, 1);
}

#[tokio::test]
async fn test_duplicate_word_stored_exactly_once() {
    logging::init();
    let mut store = WordStore::open_in_memory().unwrap();

    // 同一个词出现在两个批次里
    let batches = vec![
        vec![candidate("斡旋", "交际"), candidate("氤氲", "自然")],
        vec![candidate("斡旋", "交际"), candidate("格物", "哲学")],
    ];
    let mut session = PopulateSession::new(ScriptedSource::new(batches), 3, 1);
    let summary = session.run(&mut store).await;

    assert_eq!(summary.stop_reason, StopReason::TargetReached);
    assert_eq!(store.count().unwrap(), 3);
    assert_eq!(summary.new_words_added, 3);
    // 重复词条只存一行
    let words = store.all_words().unwrap();
    assert_eq!(
        words.iter().filter(|w| w.word == "斡旋").count(),
        1
    );
}

#[tokio::test]
async fn test_empty_batches_count_toward_ceiling() {
    logging::init();
    let mut store = WordStore::open_in_memory().unwrap();

    // 脚本里没有任何批次 → 每次都是空批
    let mut session = PopulateSession::new(ScriptedSource::new(vec![]), 10, 1);
    let summary = session.run(&mut store).await;

    assert_eq!(summary.stop_reason, StopReason::FailureCeiling);
    assert_eq!(summary.total_attempts, MAX_CONSECUTIVE_FAILURES);
    assert_eq!(summary.final_count, 0);
}

#[tokio::test]
async fn test_preexisting_words_are_skipped_not_recounted() {
    logging::init();
    let mut store = WordStore::open_in_memory().unwrap();
    store.insert(&candidate("龃龉", "文学")).unwrap();

    let batches = vec![vec![
        candidate("龃龉", "文学"),
        candidate("缱绻", "文学"),
    ]];
    let mut session = PopulateSession::new(ScriptedSource::new(batches), 2, 1);
    let summary = session.run(&mut store).await;

    assert_eq!(summary.stop_reason, StopReason::TargetReached);
    assert_eq!(summary.new_words_added, 1);
    assert_eq!(summary.final_count, 2);
}

/// 真实后端端到端测试
///
/// 默认忽略，需要配置好 LLM_API_KEY 等环境变量后手动运行：
/// cargo test --test populate_test -- --ignored
#[tokio::test]
#[ignore]
async fn test_live_acquisition_roundtrip() {
    use word_bank_builder::config::Config;
    use word_bank_builder::services::acquisition::AcquisitionService;

    logging::init();
    let config = Config::from_env();
    let mut store = WordStore::open_in_memory().unwrap();

    let acquisition = AcquisitionService::new(&config).expect("应至少配置一个后端");
    let mut session = PopulateSession::new(acquisition, 10, config.request_delay_ms);
    let summary = session.run(&mut store).await;

    println!("会话摘要: {:?}", summary);
    assert!(summary.final_count > 0, "真实后端应至少入库一个词条");
}
