/// 日志工具模块
///
/// 提供日志初始化和启动/收尾横幅的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 日志
///
/// 日志级别通过 RUST_LOG 控制，默认 info。
/// 重复初始化（如多个测试）静默忽略。
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `target`: 目标词条数量
/// - `db_path`: 词库路径
pub fn log_startup(target: usize, db_path: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 词库填充模式");
    info!(
        "启动时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("📊 目标词条数: {}", target);
    info!("💾 词库路径: {}", db_path);
    info!("{}", "=".repeat(60));
}

/// 记录程序收尾信息
///
/// # 参数
/// - `final_count`: 词库中的最终词条数
pub fn log_shutdown(final_count: usize) {
    info!("\n{}", "=".repeat(60));
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("✅ 词库当前共 {} 个词条", final_count);
    info!("{}", "=".repeat(60));
}
