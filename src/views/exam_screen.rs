use crate::workflow::ExamAttempt;

use super::{format_time, rule, Page};

/// 最后一分钟计时高亮
const LOW_TIME_SECS: u32 = 60;

/// 作答页：标题、总分、倒计时、当前题目和作答区
pub fn render_exam(attempt: &ExamAttempt, error: Option<&str>) -> String {
    let exam = attempt.exam();
    let mut page = Page::default();

    let time = format_time(attempt.time_left());
    let time = if attempt.time_left() <= LOW_TIME_SECS {
        format!("⚠️ {}", time)
    } else {
        time
    };
    page.line(rule())
        .line(format!("  {}", exam.title))
        .line(format!("  Total Marks: {}    Time Left: {}", exam.total_marks, time))
        .line(rule());

    if let Some(error) = error {
        page.line(format!("  ❌ {}", error));
    }

    let Some(question) = attempt.current_question() else {
        return page.finish();
    };
    let index = attempt.current_index();
    page.line(format!("  Question {} of {}", index + 1, attempt.question_count()))
        .blank()
        .line(format!("  Q{}: {}  [{} Marks]", index + 1, question.text, question.marks));

    let answer = attempt.answer_for(question.id).unwrap_or_default();
    match &question.options {
        Some(options) if question.is_mcq() => {
            for option in options {
                let marker = if option.value == answer { "(•)" } else { "( )" };
                page.line(format!("    {} {}) {}", marker, option.value, option.label));
            }
        }
        _ => {
            page.blank();
            if answer.is_empty() {
                page.line("    Type your answer here...");
            } else {
                for line in answer.lines() {
                    page.line(format!("    > {}", line));
                }
            }
        }
    }

    page.blank().line(format!(
        "  Answered {}/{} (at least {} required to submit)",
        attempt.answered_count(),
        attempt.question_count(),
        attempt.required_answers()
    ));

    let mut hints = Vec::new();
    if !attempt.is_expired() {
        hints.push("`answer <text>`");
        hints.push("`clear`");
    }
    if !attempt.is_first() {
        hints.push("`prev`");
    }
    if attempt.is_last() {
        hints.push("`submit`");
    } else {
        hints.push("`next`");
    }
    hints.push("`goto <n>`");
    page.line(format!("  {}", hints.join("  ")));
    page.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exam::tests::exam_with_marks;

    #[test]
    fn test_first_mcq_question() {
        let mut attempt = ExamAttempt::new(exam_with_marks(&[1, 4]));
        attempt.set_answer(1, "b").unwrap();
        let screen = render_exam(&attempt, None);

        assert!(screen.contains("Physics Class Test"));
        assert!(screen.contains("Total Marks: 5    Time Left: 30:00"));
        assert!(screen.contains("Question 1 of 2"));
        assert!(screen.contains("[1 Marks]"));
        assert!(screen.contains("(•) b) Option B"));
        assert!(screen.contains("( ) a) Option A"));
        assert!(screen.contains("`next`"));
        assert!(!screen.contains("`prev`"));
        assert!(screen.contains("at least 1 required"));
    }

    #[test]
    fn test_last_question_offers_submit() {
        let mut attempt = ExamAttempt::new(exam_with_marks(&[1, 4]));
        attempt.next();
        attempt.set_answer(2, "Energy is conserved").unwrap();
        let screen = render_exam(&attempt, Some("Failed to evaluate the exam. Please try submitting again."));

        assert!(screen.contains("❌ Failed to evaluate"));
        assert!(screen.contains("> Energy is conserved"));
        assert!(screen.contains("`submit`"));
        assert!(!screen.contains("`next`"));
    }

    #[test]
    fn test_low_time_is_flagged() {
        let exam = exam_with_marks(&[1]);
        let attempt = ExamAttempt::resume(exam.clone(), exam.blank_answers(), 45);
        assert!(render_exam(&attempt, None).contains("⚠️ 00:45"));

        let attempt = ExamAttempt::resume(exam.clone(), exam.blank_answers(), 61);
        assert!(!render_exam(&attempt, None).contains("⚠️"));
    }
}
