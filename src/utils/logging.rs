/// 日志工具模块
///
/// 提供日志初始化和批次输出的辅助函数
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::orchestrator::BatchProgress;

/// 初始化日志
///
/// # 参数
/// * `verbose` - 为 true 时默认级别为 debug，否则为 info
///
/// `RUST_LOG` 设置时优先使用
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 测试中可能重复初始化
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 学生报告批量生成");
    info!("📁 数据目录: {}", config.data_folder);
    info!("📄 输出目录: {}", config.output_folder);
    info!(
        "⏱ 间隔 {} ms / 单份超时 {} s",
        config.inter_item_delay.as_millis(),
        config.item_timeout.as_secs()
    );
    info!("{}", "=".repeat(60));
}

/// 记录批次开始信息
pub fn log_batch_start(batch_id: u64, total: usize, delay: Duration) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理批次 {}", batch_id);
    info!("📄 报告数量: {} / 间隔 {} ms", total, delay.as_millis());
    info!("{}", "=".repeat(60));
}

/// 记录批次完成信息
pub fn log_batch_complete(progress: &BatchProgress) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ 批次 {} 完成: 成功 {}/{}",
        progress.batch_id, progress.completed_count, progress.total
    );
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// * `progress` - 批次结束时的进度快照
/// * `output_folder` - 报告输出目录
pub fn print_final_stats(progress: &BatchProgress, output_folder: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", progress.completed_count, progress.total);
    info!("❌ 失败: {}", progress.failed_count);
    for index in progress.failed_indices() {
        if let Some(item) = progress.items.get(index) {
            info!("   - 报告#{}: {:?}", index + 1, item.status);
        }
    }
    if progress.cancelled {
        info!("⏹ 批次已取消");
    }
    info!("{}", "=".repeat(60));
    info!("\n报告已保存至: {}", output_folder);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

/// 测试中收集当前线程的日志输出
#[cfg(test)]
pub(crate) struct LogCapture {
    buffer: std::sync::Arc<std::sync::Mutex<Vec<u8>>>,
    _guard: tracing::subscriber::DefaultGuard,
}

#[cfg(test)]
#[derive(Clone)]
struct SharedWriter(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

#[cfg(test)]
impl std::io::Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
impl LogCapture {
    pub(crate) fn start() -> Self {
        let buffer = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let writer = SharedWriter(buffer.clone());
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();
        Self {
            buffer,
            _guard: tracing::subscriber::set_default(subscriber),
        }
    }

    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }
}

#[cfg(test)]
pub(crate) fn capture_logs(f: impl FnOnce()) -> String {
    let capture = LogCapture::start();
    f();
    capture.contents()
}
