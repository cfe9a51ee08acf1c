/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use crate::error::{AppError, AppResult};
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 日志
///
/// `RUST_LOG` 优先；否则 `verbose` 时为 debug，默认为 info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> AppResult<()> {
    let log_header = format!(
        "{}\nTISS 文档提交日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .map_err(|e| AppError::file_write_failed(log_file_path, e))
}

/// 记录程序启动信息
///
/// # 参数
/// - `endpoint_url`: 远端服务地址
/// - `max_attempts`: 每个指南的最大尝试次数
pub fn log_startup(endpoint_url: &str, max_attempts: u32) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - TISS 文档批量提交");
    info!("🌐 服务地址: {}", endpoint_url);
    info!("🔁 最大尝试次数: {}", max_attempts);
    info!("{}", "=".repeat(60));
}

/// 记录文档加载信息
pub fn log_documents_loaded(documents: usize, attachments: usize) {
    info!("✓ 找到 {} 个XML文档, {} 个PDF附件", documents, attachments);
    info!("💡 文档逐个处理，附件在所有文档间共享\n");
}

/// 记录单个文档开始处理
///
/// # 参数
/// - `index`: 文档编号（从1开始）
/// - `total`: 文档总数
/// - `name`: 文档名
pub fn log_document_start(index: usize, total: usize, name: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📄 开始处理第 {}/{} 个文档: {}", index, total, name);
    info!("{}", "=".repeat(60));
}

/// 记录单个文档处理完成
pub fn log_document_complete(name: &str, guides_found: usize, success: usize, failed: usize) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ {} 完成: 指南 {}, 成功 {}, 失败 {}",
        name, guides_found, success, failed
    );
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功数量
/// - `failed`: 失败数量（含未匹配附件和无法解析的文档）
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(success: usize, failed: usize, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}", success);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

/// 按字符数截断，不加省略号
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
