//! 日志工具模块
//!
//! 提供订阅器初始化和日志格式化的辅助函数
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::assessment::AssessmentResult;

/// 初始化 tracing 订阅器
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info。
/// 日志写到 stderr，避免和终端问答混在一起。重复调用不会报错。
pub fn init_subscriber(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// 初始化日志文件（覆盖写入文件头）
///
/// # 参数
/// - `log_file_path`: 日志文件路径
///
/// # 返回
/// 写入失败时返回 `FileError::WriteFailed`
pub async fn init_log_file(log_file_path: &str) -> AppResult<()> {
    let log_header = format!(
        "{}\n分级测评日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    tokio::fs::write(log_file_path, log_header)
        .await
        .map_err(|e| AppError::file_write_failed(log_file_path, e))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 语言分级测评");
    info!("📚 题库文件: {}", config.question_bank_path);
    info!(
        "📊 题数上限: {} | 最少题数: {} | 每批: {}",
        config.limits.hard_cap, config.limits.min_questions, config.limits.batch_size
    );
    info!("{}", "=".repeat(60));
}

/// 打印测评结束统计
pub fn print_final_stats(name: &str, result: &AssessmentResult, report_file: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 测评完成: {}", name);
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    match result.finished_level() {
        Some(level) => info!("✅ 已完成等级: {}", level),
        None => info!("✅ 已完成等级: 无"),
    }
    info!("🎯 推荐起始等级: {}", result.recommended_level());
    info!("📝 共答题: {}", result.total_asked);
    info!("🧭 决策轨迹: {}", result.decision_strings().join(" | "));
    info!("{}", "=".repeat(60));
    info!("\n报告已保存至: {}", report_file);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
///
/// # 返回
/// 返回截断后的文本，超长时以 `...` 结尾
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
