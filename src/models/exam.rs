use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, SchemaViolation};

/// 考试配置
///
/// 生成试卷之后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamConfig {
    pub class_level: String,
    pub subject: String,
    pub exam_type: String,
    /// 考试时长（分钟）
    pub duration: u32,
    pub total_marks: u32,
}

impl ExamConfig {
    /// 校验配置：文本字段非空，时长和总分为正整数
    pub fn validate(&self) -> Result<(), ConfigError> {
        let text_fields = [
            ("classLevel", &self.class_level),
            ("subject", &self.subject),
            ("examType", &self.exam_type),
        ];
        for (field, value) in text_fields {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidExamConfig {
                    field: field.to_string(),
                    value: value.clone(),
                });
            }
        }
        for (field, value) in [("duration", self.duration), ("totalMarks", self.total_marks)] {
            if value == 0 {
                return Err(ConfigError::InvalidExamConfig {
                    field: field.to_string(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// 题型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// 选择题
    Mcq,
    /// 简答题
    Short,
    /// 中等篇幅
    Medium,
    /// 论述题
    Long,
}

impl QuestionType {
    pub const ALL: [QuestionType; 4] = [
        QuestionType::Mcq,
        QuestionType::Short,
        QuestionType::Medium,
        QuestionType::Long,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::Mcq => "mcq",
            QuestionType::Short => "short",
            QuestionType::Medium => "medium",
            QuestionType::Long => "long",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = SchemaViolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QuestionType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| SchemaViolation::UnknownQuestionType(s.to_string()))
    }
}

/// 选择题选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McqOption {
    /// 选项标识，如 "a"
    pub value: String,
    /// 选项文本
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub marks: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<McqOption>>,
}

impl Question {
    pub fn is_mcq(&self) -> bool {
        self.kind == QuestionType::Mcq
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub title: String,
    /// 考试时长（分钟）
    pub duration: u32,
    pub total_marks: u32,
    pub questions: Vec<Question>,
}

impl Exam {
    /// 按分值升序排列题目（稳定排序，同分保持原顺序）
    pub fn sort_questions_by_marks(&mut self) {
        self.questions.sort_by_key(|q| q.marks);
    }

    /// 倒计时初始秒数
    pub fn time_limit_secs(&self) -> u32 {
        self.duration.saturating_mul(60)
    }

    pub fn question(&self, id: u32) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// 所有题目分值之和，溢出时返回 None
    pub fn marks_sum(&self) -> Option<u32> {
        self.questions.iter().try_fold(0u32, |sum, q| sum.checked_add(q.marks))
    }

    /// 为每道题创建一个空答案
    pub fn blank_answers(&self) -> Vec<UserAnswer> {
        self.questions.iter().map(|q| UserAnswer::blank(q.id)).collect()
    }

    /// 结构校验
    ///
    /// - 至少一道题，标题和题干非空
    /// - 时长、总分、每题分值为正
    /// - 题目编号恰好为 1..=N
    /// - 选项仅出现在选择题上，且选择题选项非空
    pub fn validate(&self) -> Result<(), SchemaViolation> {
        if self.questions.is_empty() {
            return Err(SchemaViolation::NoQuestions);
        }
        if self.title.trim().is_empty() {
            return Err(SchemaViolation::BlankField {
                field: "title".to_string(),
            });
        }
        for (field, value) in [("duration", self.duration), ("totalMarks", self.total_marks)] {
            if value == 0 {
                return Err(SchemaViolation::NotPositive {
                    field: field.to_string(),
                    value: 0,
                });
            }
        }

        let ids: HashSet<u32> = self.questions.iter().map(|q| q.id).collect();
        let n = self.questions.len();
        let sequential = ids.len() == n && (1..=n as u32).all(|id| ids.contains(&id));
        if !sequential {
            return Err(SchemaViolation::BadQuestionIds {
                ids: self.questions.iter().map(|q| i64::from(q.id)).collect(),
                expected_max: n,
            });
        }

        for question in &self.questions {
            if question.text.trim().is_empty() {
                return Err(SchemaViolation::BlankField {
                    field: format!("questions[{}].text", question.id),
                });
            }
            if question.marks == 0 {
                return Err(SchemaViolation::NotPositive {
                    field: format!("questions[{}].marks", question.id),
                    value: 0,
                });
            }
            match (&question.options, question.is_mcq()) {
                (Some(options), true)
                    if !options.is_empty() && options.iter().all(|o| !o.value.trim().is_empty()) => {}
                (_, true) => {
                    return Err(SchemaViolation::MissingOptions {
                        question_id: question.id,
                    })
                }
                (Some(_), false) => {
                    return Err(SchemaViolation::UnexpectedOptions {
                        question_id: question.id,
                    })
                }
                (None, false) => {}
            }
        }

        if self.marks_sum().is_none() {
            return Err(SchemaViolation::MarksOverflow);
        }
        Ok(())
    }
}

/// 考生答案，空字符串表示未作答
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnswer {
    pub question_id: u32,
    pub answer: String,
}

impl UserAnswer {
    pub fn blank(question_id: u32) -> Self {
        Self {
            question_id,
            answer: String::new(),
        }
    }

    pub fn is_answered(&self) -> bool {
        !self.answer.trim().is_empty()
    }
}
