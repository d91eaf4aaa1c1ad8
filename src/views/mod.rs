//! 页面渲染
//!
//! 每个页面都是会话状态的纯函数，输出终端文本

pub mod config_screen;
pub mod exam_screen;
pub mod report_screen;

pub use config_screen::{render_config, render_guidelines};
pub use exam_screen::render_exam;
pub use report_screen::render_report;

use crate::workflow::Phase;

pub const GENERATING_MESSAGE: &str = "Generating your custom exam...";
pub const EVALUATING_MESSAGE: &str =
    "AI is evaluating your answers... This may take a moment for detailed feedback.";

/// 渲染当前阶段对应的页面
pub fn render(phase: &Phase) -> String {
    match phase {
        Phase::Config { pending: Some(config), .. } => render_guidelines(config),
        Phase::Config { draft, error, .. } => render_config(draft, error.as_deref()),
        Phase::Generating { .. } => loading(GENERATING_MESSAGE),
        Phase::Exam { attempt, error, .. } => render_exam(attempt, error.as_deref()),
        Phase::Evaluating { .. } => loading(EVALUATING_MESSAGE),
        Phase::Report { attempt, report, .. } => render_report(attempt.exam(), report),
    }
}

fn loading(message: &str) -> String {
    format!("\n  ⏳ {}\n", message)
}

/// 秒数格式化为 mm:ss，分钟数超过两位时照常显示
pub fn format_time(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

pub(crate) fn rule() -> String {
    "─".repeat(60)
}

/// 逐行拼装的页面文本
#[derive(Debug, Default)]
pub(crate) struct Page {
    lines: Vec<String>,
}

impl Page {
    pub(crate) fn line(&mut self, text: impl Into<String>) -> &mut Self {
        self.lines.push(text.into());
        self
    }

    pub(crate) fn blank(&mut self) -> &mut Self {
        self.line(String::new())
    }

    /// 标题夹在两条分隔线之间
    pub(crate) fn header(&mut self, title: impl Into<String>) -> &mut Self {
        self.line(rule()).line(title).line(rule())
    }

    pub(crate) fn finish(self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}
