use crate::models::{EvaluationReport, Exam, ScoreBand};

use super::{rule, Page};

fn badge(score: u32, max: u32) -> String {
    let icon = match ScoreBand::classify(score, max) {
        ScoreBand::Excellent => "🟢",
        ScoreBand::Fair => "🟡",
        ScoreBand::NeedsWork => "🔴",
        ScoreBand::Unscored => "⚪",
    };
    format!("{} {}/{}", icon, score, max)
}

fn section(page: &mut Page, title: &str, items: &[String]) {
    page.line(format!("  {}", title));
    if items.is_empty() {
        page.line("    -");
    }
    for item in items {
        page.line(format!("    • {}", item));
    }
    page.blank();
}

/// 阅卷报告：总分、优缺点、建议和逐题得分
pub fn render_report(exam: &Exam, report: &EvaluationReport) -> String {
    let mut page = Page::default();
    let band = ScoreBand::classify(report.overall_score, exam.total_marks);
    page.header(format!("  Your Exam Report - {}", exam.title))
        .line(format!(
            "  Overall Score: {} ({})",
            badge(report.overall_score, exam.total_marks),
            band.label()
        ))
        .blank();

    section(&mut page, "Strengths", &report.strengths);
    section(&mut page, "Areas for Improvement", &report.weaknesses);
    section(&mut page, "AI Recommendations", &report.recommendations);

    page.line("  Detailed Answer Breakdown");
    for (index, question) in exam.questions.iter().enumerate() {
        page.line(rule());
        match report.feedback_for(question.id) {
            Some(feedback) => {
                page.line(format!(
                    "  Q{}: {}  [{}]",
                    index + 1,
                    question.text,
                    badge(feedback.assigned_score, question.marks)
                ))
                .line(format!("    Your Answer: {}", feedback.student_answer))
                .line(format!("    AI Feedback: {}", feedback.feedback));
            }
            None => {
                page.line(format!("  Q{}: {}  [N/A / {}]", index + 1, question.text, question.marks));
            }
        }
    }
    page.line(rule()).line("  Type `restart` to take another exam.");
    page.finish()
}
