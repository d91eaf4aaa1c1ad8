use crate::models::catalog::ConfigField;
use crate::models::{ConfigDraft, ExamConfig};

use super::Page;

const FIELDS: [(ConfigField, &str); 5] = [
    (ConfigField::ClassLevel, "class"),
    (ConfigField::Subject, "subject"),
    (ConfigField::ExamType, "type"),
    (ConfigField::Duration, "duration"),
    (ConfigField::TotalMarks, "marks"),
];

const GUIDELINES: [&str; 5] = [
    "This exam is a conversation between you and your future self. The effort you put in today builds the path you walk tomorrow.",
    "Be Honest: The truest measure of success is integrity. Cheating might win you a mark, but it costs you character. Trust in your own preparation.",
    "Embrace the Challenge: It's okay to feel nervous, it means you care. It's okay not to know everything, that's an opportunity to learn.",
    "Focus: For these next moments, let this be your world. Quiet the noise, take a deep breath, and give it your best.",
    "This is your moment. Make it count.",
];

/// 配置表单：列出每个字段的选项，当前选中项用 `*` 标出
pub fn render_config(draft: &ConfigDraft, error: Option<&str>) -> String {
    let mut page = Page::default();
    page.header("  AI Exam Pro - Create Your Practice Exam");

    if let Some(error) = error {
        page.line(format!("  ❌ {}", error)).blank();
    }

    for (field, command) in FIELDS {
        let selected = draft.selected(field);
        page.line(format!("  {} (`{} <n>`)", field.title(), command));
        for (i, label) in field.choice_labels().iter().enumerate() {
            let marker = if i == selected { '*' } else { ' ' };
            page.line(format!("    {} {}. {}", marker, i + 1, label));
        }
    }

    page.blank()
        .line("  Type `start` to generate your exam, `help` for all commands.");
    page.finish()
}

/// 开考前的须知
pub fn render_guidelines(config: &ExamConfig) -> String {
    let mut page = Page::default();
    page.header("  A Note Before You Begin")
        .line(format!(
            "  {} · {} · {} · {} minutes · {} marks",
            config.class_level, config.subject, config.exam_type, config.duration, config.total_marks
        ))
        .blank();
    for paragraph in GUIDELINES {
        page.line(format!("  {}", paragraph)).blank();
    }
    page.line("  Type `accept` (I Understand, Begin Exam) or `no` to go back.");
    page.finish()
}
