use ai_exam_pro::utils::logging;
use ai_exam_pro::{Config, TerminalApp};
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(&config.output_log_file, config.verbose_logging)?;
    logging::log_startup(&config);

    // 初始化并运行应用
    TerminalApp::initialize(&config)?.run_terminal().await?;

    Ok(())
}
