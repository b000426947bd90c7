//! 流程层（Workflow Layer）
//!
//! ## 职责
//!
//! 定义"一次填充会话"的完整控制流程：
//! 向采集服务要一批词条 → 类别过滤 → 查重 → 入库 → 判断是否达标，
//! 循环直到达到目标数量或触发失败上限。
//!
//! 本层不持有数据库连接的生命周期（打开/关闭由编排层负责），
//! 只依赖 `BatchSource` 能力接口，因此可以用脚本化来源做完整测试。

pub mod populate;

pub use populate::{PopulateSession, SessionSummary, StopReason, MAX_CONSECUTIVE_FAILURES};
