/// 日志工具模块
///
/// 初始化 tracing 订阅器，并提供日志格式化和输出的辅助函数
use crate::config::Config;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 初始化日志
///
/// 默认级别 info，可用 `RUST_LOG` 覆盖。日志写到标准错误，标准输出只留给报告。
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `config`: 已校验的配置
/// - `total`: 待审计的 URL 数量
pub fn log_startup(config: &Config, total: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 顺序审计模式");
    info!("📋 待审计 URL: {} 个", total);
    info!("📱 设备: {}", config.options.effective_device());
    info!("📝 报告格式: {}", config.reporter);
    info!("{}", "=".repeat(60));
}

/// 记录单个 URL 开始审计
///
/// # 参数
/// - `index`: 序号（从 1 开始）
/// - `total`: 总数
/// - `url`: 目标 URL
pub fn log_audit_start(index: usize, total: usize, url: &str) {
    info!("\n{}", "─".repeat(60));
    info!("🔍 [{}/{}] 开始审计: {}", index, total, truncate_text(url, 80));
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功数量
/// - `total`: 总数
pub fn print_final_stats(success: usize, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部审计完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("{}", "=".repeat(60));
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("https://a.com", 80), "https://a.com");
        assert_eq!(truncate_text("网页质量审计", 2), "网页...");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init();
        init();
    }
}
