//! # Word Bank Builder
//!
//! 一个用 LLM 自动填充汉语生僻词词库的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 后端层（Providers）
//! - `providers/` - 候选词来源，统一暴露 `fetch_batch()` 能力
//! - `RemoteApiProvider` - 远程 Chat Completions API（Bearer 认证）
//! - `LocalCliProvider` - 本地 CLI 模型子进程调用
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不关心流程
//! - `parser` - 从自由文本响应提取候选词条的能力
//! - `WordCache` - 词条缓存与去重追踪能力
//! - `AcquisitionService` - "给我 N 个不重复词条"能力（重试/降级/应急）
//!
//! ### ③ 存储层（Storage）
//! - `storage/` - SQLite 词库，一词一行，重复写入不覆盖
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/populate` - 填充会话：取批 → 过滤 → 查重 → 入库 → 判停
//! - 只依赖 `BatchSource` 接口，可用脚本化来源完整测试
//!
//! ### ⑤ 编排层（App）
//! - `app` - 应用生命周期：打开词库、清理、播种、运行会话、收尾
//!
//! ## 模块结构

pub mod app;
pub mod config;
pub mod error;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::word::WordCandidate;
pub use services::acquisition::{AcquisitionService, BatchSource};
pub use services::word_cache::WordCache;
pub use storage::WordStore;
pub use workflow::{PopulateSession, SessionSummary, StopReason};
