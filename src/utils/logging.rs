//! 日志工具模块
//!
//! 提供日志初始化、格式化和输出的辅助函数

use anyhow::Result;
use std::borrow::Cow;
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 订阅器
///
/// `RUST_LOG` 优先；否则 `verbose` 为 true 时使用 debug 级别。
/// 重复调用不会报错（测试中会多次初始化）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("quiz_admin={default_level},warn")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n测验任务日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
///
/// # 参数
/// - `api_base_url`: 后端地址
/// - `max_concurrent`: 最大并发数
pub fn log_startup(api_base_url: &str, max_concurrent: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 批量测验创建模式");
    info!("🌐 后端地址: {}", api_base_url);
    info!("📊 最大并发数: {}", max_concurrent);
    info!("{}", "=".repeat(60));
}

/// 记录任务加载信息
pub fn log_jobs_loaded(total: usize, max_concurrent: usize) {
    info!("✓ 找到 {} 个待处理的任务", total);
    info!("📋 将以每批 {} 个的方式处理", max_concurrent);
}

/// 一批任务开始，`start`/`end` 为从 1 开始的任务编号
pub fn log_batch_start(batch_num: usize, total_batches: usize, start: usize, end: usize, total: usize) {
    info!("{}", "─".repeat(60));
    info!(
        "▶️ 第 {}/{} 批: 任务 {}-{} (共 {} 个)",
        batch_num, total_batches, start, end, total
    );
}

/// 一批任务结束
pub fn log_batch_complete(batch_num: usize, created: usize, total: usize) {
    info!(
        "📦 第 {} 批结束: {}/{} 个测验创建成功",
        batch_num, created, total
    );
    info!("{}", "─".repeat(60));
}

/// 全部任务结束后的汇总
///
/// 失败的任务已逐条写入 `warn_file`
pub fn log_run_summary(created: usize, failed: usize, total: usize, warn_file: &str, log_file: &str) {
    info!("{}", "=".repeat(60));
    info!(
        "🏁 {} 个任务处理完毕 ({})",
        total,
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("✅ 已创建测验: {}", created);
    if failed > 0 {
        info!("❌ 失败任务: {}，原因见 {}", failed, warn_file);
    }
    info!("📝 运行日志: {}", log_file);
    info!("{}", "=".repeat(60));
}

/// 按字符数截取，超出部分以 `…` 结尾
pub fn clip_for_log(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => Cow::Owned(format!("{}…", &text[..cut])),
        None => Cow::Borrowed(text),
    }
}
