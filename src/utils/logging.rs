/// 日志工具模块
///
/// 终端留给答题界面，日志统一写入文件
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Mutex;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 未设置 RUST_LOG 时的过滤规则
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "ai_exam_pro=debug"
    } else {
        "ai_exam_pro=info"
    }
}

/// 初始化日志文件并安装 tracing 订阅者
///
/// # 参数
/// - `log_file_path`: 日志文件路径，每次启动覆盖
/// - `verbose`: 是否输出 debug 级别日志
pub fn init(log_file_path: &str, verbose: bool) -> std::io::Result<()> {
    let mut file = File::create(log_file_path)?;
    file.write_all(log_header().as_bytes())?;
    drop(file);

    let file = OpenOptions::new().append(true).open(log_file_path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    // 重复初始化（例如测试中）时保留已有的订阅者
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}

fn log_header() -> String {
    format!(
        "{}\nAI Exam Pro 日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    )
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - AI Exam Pro");
    info!("🌐 API 端点: {}", config.llm_api_base_url);
    info!("📝 出卷模型: {}", config.generation_model_name);
    info!("🧐 阅卷模型: {}", config.evaluation_model_name);
    info!("💾 快照目录: {}", config.snapshot_dir.display());
    info!("{}", "=".repeat(60));
}

/// 截断文本
///
/// 按字符截断，超出部分用 "..." 代替
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}
