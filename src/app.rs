use anyhow::Result;
use tracing::info;

use crate::config::Config;
use crate::models::seeds::seed_words;
use crate::models::word::ALLOWED_CATEGORIES;
use crate::services::acquisition::AcquisitionService;
use crate::storage::WordStore;
use crate::utils::logging;
use crate::workflow::{PopulateSession, SessionSummary};

/// 应用主结构
pub struct App {
    config: Config,
    store: WordStore,
}

impl App {
    /// 初始化应用
    ///
    /// 打开词库、清理不合规类别的旧词条、必要时写入种子词条。
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::log_startup(config.target_word_count, &config.db_path);

        let mut store = WordStore::new(config.db_path.clone());
        store.initialize()?;

        // 历史数据里类别不合规的词条在填充前清掉
        let purged = store.delete_not_in(&ALLOWED_CATEGORIES)?;
        if purged > 0 {
            info!("初始化时清理了 {} 个类别不合规的词条", purged);
        }

        // 空库时先写入种子词条，保证词库从非空状态起步
        if store.count()? == 0 {
            let seeded = store.bulk_insert(&seed_words())?;
            info!("空词库已写入 {} 个种子词条", seeded);
        }

        Ok(Self { config, store })
    }

    /// 运行应用主逻辑
    pub async fn run(mut self) -> Result<SessionSummary> {
        let acquisition = AcquisitionService::new(&self.config)?;
        let mut session = PopulateSession::new(
            acquisition,
            self.config.target_word_count,
            self.config.request_delay_ms,
        );

        let summary = session.run(&mut self.store).await;

        logging::log_shutdown(summary.final_count);
        self.store.close()?;

        Ok(summary)
    }
}
