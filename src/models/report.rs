use serde::{Deserialize, Serialize};

/// 阅卷报告，每次提交生成一次，之后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationReport {
    pub overall_score: u32,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    pub detailed_feedback: Vec<QuestionFeedback>,
}

impl EvaluationReport {
    pub fn feedback_for(&self, question_id: u32) -> Option<&QuestionFeedback> {
        self.detailed_feedback.iter().find(|f| f.question_id == question_id)
    }
}

/// 单题反馈
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionFeedback {
    pub question_id: u32,
    pub question_text: String,
    pub student_answer: String,
    pub assigned_score: u32,
    pub feedback: String,
}

/// 得分档位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    /// ≥ 80%
    Excellent,
    /// ≥ 50%
    Fair,
    NeedsWork,
    /// 满分为 0，无法评级
    Unscored,
}

impl ScoreBand {
    pub fn classify(score: u32, max: u32) -> Self {
        if max == 0 {
            return ScoreBand::Unscored;
        }
        // 整数比较，避免浮点误差: score/max >= 0.8  <=>  5*score >= 4*max
        let (score, max) = (u64::from(score), u64::from(max));
        if score * 5 >= max * 4 {
            ScoreBand::Excellent
        } else if score * 2 >= max {
            ScoreBand::Fair
        } else {
            ScoreBand::NeedsWork
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreBand::Excellent => "excellent",
            ScoreBand::Fair => "fair",
            ScoreBand::NeedsWork => "needs work",
            ScoreBand::Unscored => "n/a",
        }
    }
}
