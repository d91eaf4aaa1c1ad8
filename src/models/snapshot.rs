use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::exam::{Exam, ExamConfig, UserAnswer};

/// 可恢复的考试快照
///
/// 考试进行中每次作答或计时都会覆盖写入；提交或重新开始时删除
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub exam: Exam,
    pub user_answers: Vec<UserAnswer>,
    /// 剩余秒数
    pub time_left: u32,
    pub exam_config: ExamConfig,
}

impl SessionSnapshot {
    /// 快照内容是否自洽（能被反序列化不代表可以恢复）
    pub fn is_consistent(&self) -> bool {
        if self.exam.validate().is_err() || self.exam_config.validate().is_err() {
            return false;
        }
        if self.time_left > self.exam.time_limit_secs() {
            return false;
        }
        let question_ids: HashSet<u32> = self.exam.questions.iter().map(|q| q.id).collect();
        let answer_ids: HashSet<u32> = self.user_answers.iter().map(|a| a.question_id).collect();
        self.user_answers.len() == self.exam.questions.len() && question_ids == answer_ids
    }
}
