//! 作答过程 - 流程层
//!
//! 倒计时、逐题导航、作答和交卷门槛

use thiserror::Error;

use crate::models::{Exam, ExamConfig, SessionSnapshot, UserAnswer};

/// 交卷被拒绝的原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitRejection {
    /// 作答数量不足 ⌈N/2⌉
    #[error("You must answer at least {required} questions to submit the exam. You have answered {answered}.")]
    NotEnoughAnswers { answered: usize, required: usize },
    /// 时间未到，需要考生再次确认
    #[error("Please confirm that you want to submit your exam.")]
    ConfirmationRequired,
}

/// 作答被拒绝的原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditRejection {
    #[error("Time is up, answers can no longer be changed.")]
    Expired,
    #[error("Question {0} is not part of this exam.")]
    UnknownQuestion(u32),
    #[error("'{answer}' is not one of the options of question {question_id}.")]
    InvalidOption { question_id: u32, answer: String },
}

/// 一次计时的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// 继续计时，携带剩余秒数
    Running(u32),
    /// 时间到
    Expired,
}

/// 一次作答
///
/// 持有试卷、答案和剩余时间，只描述"考生能做什么"，不关心存储和网络
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamAttempt {
    exam: Exam,
    answers: Vec<UserAnswer>,
    time_left: u32,
    current: usize,
    /// 曾经交过卷（阅卷失败后回到作答页）
    submitted_before: bool,
}

impl ExamAttempt {
    /// 新开一次作答：题目按分值升序排列，每题一个空答案，倒计时从 `duration × 60` 开始
    pub fn new(mut exam: Exam) -> Self {
        exam.sort_questions_by_marks();
        Self {
            answers: exam.blank_answers(),
            time_left: exam.time_limit_secs(),
            exam,
            current: 0,
            submitted_before: false,
        }
    }

    /// 从快照恢复
    pub fn resume(exam: Exam, answers: Vec<UserAnswer>, time_left: u32) -> Self {
        Self {
            exam,
            answers,
            time_left,
            current: 0,
            submitted_before: false,
        }
    }

    pub fn exam(&self) -> &Exam {
        &self.exam
    }

    pub fn answers(&self) -> &[UserAnswer] {
        &self.answers
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn is_expired(&self) -> bool {
        self.time_left == 0
    }

    pub fn submitted_before(&self) -> bool {
        self.submitted_before
    }

    /// 只有从未交过卷的作答才写快照
    pub fn autosave_enabled(&self) -> bool {
        !self.submitted_before
    }

    /// 计时器是否仍在运行
    ///
    /// 交卷失败且时间已到的作答不再计时，只能手动重新交卷
    pub fn timer_running(&self) -> bool {
        !(self.is_expired() && self.submitted_before)
    }

    pub(crate) fn mark_submitted(&mut self) {
        self.submitted_before = true;
    }

    // ========== 计时 ==========

    /// 走一秒
    pub fn tick(&mut self) -> TickOutcome {
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            TickOutcome::Expired
        } else {
            TickOutcome::Running(self.time_left)
        }
    }

    // ========== 导航 ==========

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn question_count(&self) -> usize {
        self.exam.questions.len()
    }

    pub fn current_question(&self) -> Option<&crate::models::Question> {
        self.exam.questions.get(self.current)
    }

    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    /// 最后一题时"下一题"由"交卷"替代
    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.question_count()
    }

    /// 下一题，不回绕
    pub fn next(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.current += 1;
        true
    }

    /// 上一题，不回绕
    pub fn previous(&mut self) -> bool {
        if self.is_first() {
            return false;
        }
        self.current -= 1;
        true
    }

    /// 跳到第 `index` 题（从 0 开始）
    pub fn go_to(&mut self, index: usize) -> bool {
        if index >= self.question_count() {
            return false;
        }
        self.current = index;
        true
    }

    // ========== 作答 ==========

    pub fn answer_for(&self, question_id: u32) -> Option<&str> {
        self.answers
            .iter()
            .find(|a| a.question_id == question_id)
            .map(|a| a.answer.as_str())
    }

    /// 修改某题答案；选择题只接受选项标识或空字符串
    pub fn set_answer(&mut self, question_id: u32, answer: impl Into<String>) -> Result<(), EditRejection> {
        if self.is_expired() {
            return Err(EditRejection::Expired);
        }
        let answer = answer.into();
        let question = self
            .exam
            .question(question_id)
            .ok_or(EditRejection::UnknownQuestion(question_id))?;

        if question.is_mcq() && !answer.is_empty() {
            let valid = question
                .options
                .as_ref()
                .is_some_and(|options| options.iter().any(|o| o.value == answer));
            if !valid {
                return Err(EditRejection::InvalidOption { question_id, answer });
            }
        }

        let slot = self
            .answers
            .iter_mut()
            .find(|a| a.question_id == question_id)
            .ok_or(EditRejection::UnknownQuestion(question_id))?;
        slot.answer = answer;
        Ok(())
    }

    // ========== 交卷门槛 ==========

    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_answered()).count()
    }

    /// 至少需要作答的题数：⌈N/2⌉
    pub fn required_answers(&self) -> usize {
        self.question_count().div_ceil(2)
    }

    /// 检查手动交卷门槛
    ///
    /// 时间已到时不设门槛；否则需要作答 ⌈N/2⌉ 题并确认
    pub fn check_submission(&self, confirmed: bool) -> Result<(), SubmitRejection> {
        if self.is_expired() {
            return Ok(());
        }
        let answered = self.answered_count();
        let required = self.required_answers();
        if answered < required {
            return Err(SubmitRejection::NotEnoughAnswers { answered, required });
        }
        if !confirmed {
            return Err(SubmitRejection::ConfirmationRequired);
        }
        Ok(())
    }

    pub fn snapshot(&self, config: &ExamConfig) -> SessionSnapshot {
        SessionSnapshot {
            exam: self.exam.clone(),
            user_answers: self.answers.clone(),
            time_left: self.time_left,
            exam_config: config.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exam::tests::exam_with_marks;

    fn answer_first(attempt: &mut ExamAttempt, count: usize) {
        let ids: Vec<u32> = attempt.exam().questions.iter().map(|q| q.id).take(count).collect();
        for id in ids {
            let text = if attempt.exam().question(id).is_some_and(|q| q.is_mcq()) { "a" } else { "answer" };
            attempt.set_answer(id, text).unwrap();
        }
    }

    #[test]
    fn test_new_attempt_sorts_and_starts_clock() {
        let attempt = ExamAttempt::new(exam_with_marks(&[2, 8, 5, 5]));
        let marks: Vec<u32> = attempt.exam().questions.iter().map(|q| q.marks).collect();
        assert_eq!(marks, vec![2, 5, 5, 8]);
        assert_eq!(attempt.time_left(), 1800);
        assert_eq!(attempt.answers().len(), 4);
        assert_eq!(attempt.answered_count(), 0);
    }

    #[test]
    fn test_countdown_reaches_zero_once() {
        let mut attempt = ExamAttempt::new(exam_with_marks(&[1]));
        let mut expirations = 0;
        for _ in 0..1800 {
            if attempt.tick() == TickOutcome::Expired {
                expirations += 1;
            }
        }
        assert_eq!(expirations, 1);
        assert!(attempt.is_expired());
    }

    #[test]
    fn test_navigation_does_not_wrap() {
        let mut attempt = ExamAttempt::new(exam_with_marks(&[1, 2, 3]));
        assert!(attempt.is_first());
        assert!(!attempt.previous());
        assert!(attempt.next());
        assert!(attempt.next());
        assert!(attempt.is_last());
        assert!(!attempt.next());
        assert_eq!(attempt.current_index(), 2);
        assert!(!attempt.go_to(3));
        assert!(attempt.go_to(0));
        assert!(attempt.is_first());
    }

    #[test]
    fn test_single_question_is_first_and_last() {
        let attempt = ExamAttempt::new(exam_with_marks(&[5]));
        assert!(attempt.is_first() && attempt.is_last());
    }

    #[test]
    fn test_gating_boundary_for_five_questions() {
        let mut attempt = ExamAttempt::new(exam_with_marks(&[1, 1, 1, 1, 1]));
        assert_eq!(attempt.required_answers(), 3);

        answer_first(&mut attempt, 2);
        assert_eq!(
            attempt.check_submission(true),
            Err(SubmitRejection::NotEnoughAnswers { answered: 2, required: 3 })
        );

        answer_first(&mut attempt, 3);
        assert_eq!(attempt.check_submission(false), Err(SubmitRejection::ConfirmationRequired));
        assert_eq!(attempt.check_submission(true), Ok(()));
    }

    #[test]
    fn test_whitespace_does_not_count_as_answered() {
        let mut attempt = ExamAttempt::new(exam_with_marks(&[1, 1]));
        let id = attempt.exam().questions[1].id;
        attempt.set_answer(id, "   ").unwrap();
        assert_eq!(attempt.answered_count(), 0);
    }

    #[test]
    fn test_expired_attempt_bypasses_gates_and_locks_edits() {
        let mut attempt = ExamAttempt::resume(exam_with_marks(&[1, 1, 1, 1]), exam_with_marks(&[1, 1, 1, 1]).blank_answers(), 1);
        assert_eq!(attempt.tick(), TickOutcome::Expired);
        assert_eq!(attempt.check_submission(false), Ok(()));
        assert_eq!(attempt.set_answer(2, "late"), Err(EditRejection::Expired));
    }

    #[test]
    fn test_mcq_answers_must_be_option_values() {
        let mut attempt = ExamAttempt::new(exam_with_marks(&[1, 2]));
        assert_eq!(
            attempt.set_answer(1, "z"),
            Err(EditRejection::InvalidOption { question_id: 1, answer: "z".into() })
        );
        attempt.set_answer(1, "c").unwrap();
        assert_eq!(attempt.answer_for(1), Some("c"));
        attempt.set_answer(1, "").unwrap();
        assert_eq!(attempt.answer_for(1), Some(""));
        assert_eq!(attempt.set_answer(9, "x"), Err(EditRejection::UnknownQuestion(9)));
    }

    #[test]
    fn test_timer_stops_only_after_failed_expired_submission() {
        let exam = exam_with_marks(&[1]);
        let mut attempt = ExamAttempt::resume(exam.clone(), exam.blank_answers(), 0);
        assert!(attempt.timer_running());
        attempt.mark_submitted();
        assert!(!attempt.timer_running());
        assert!(!attempt.autosave_enabled());
    }
}
