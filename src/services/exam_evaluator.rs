//! 阅卷服务 - 业务能力层
//!
//! 试卷 + 考生答案 → 提示词 + 报告 schema → 校验后的 EvaluationReport

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{EvaluationError, SchemaViolation};
use crate::models::{EvaluationReport, Exam, Question, QuestionFeedback, UserAnswer};
use crate::services::llm_service::{CompletionProvider, CompletionRequest};
use crate::services::schema::{extract_json, report_schema, REPORT_SCHEMA_NAME};

/// 未作答题目在阅卷请求中的占位文本
pub const NOT_ANSWERED: &str = "Not answered";

const SYSTEM_MESSAGE: &str = "You are a highly experienced and fair examiner. \
                              Your evaluation is detailed, constructive and encouraging. \
                              You always answer with a single JSON object and nothing else.";

/// 发给阅卷模型的单题数据
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnsweredQuestion<'a> {
    #[serde(flatten)]
    pub question: &'a Question,
    pub student_answer: String,
}

/// 阅卷服务
///
/// 职责：
/// - 把每道题和考生答案配对（未作答记为 "Not answered"）
/// - 请求模型按报告 schema 返回
/// - 校验每题得分不超过该题分值，总分取各题得分之和
pub struct ExamEvaluator {
    provider: Arc<dyn CompletionProvider>,
    model_name: String,
}

impl ExamEvaluator {
    pub fn new(provider: Arc<dyn CompletionProvider>, model_name: impl Into<String>) -> Self {
        Self {
            provider,
            model_name: model_name.into(),
        }
    }

    /// 阅卷
    pub async fn evaluate(
        &self,
        exam: &Exam,
        answers: &[UserAnswer],
    ) -> Result<EvaluationReport, EvaluationError> {
        let answered = answers.iter().filter(|a| a.is_answered()).count();
        info!(
            "🧐 请求阅卷: {} (已作答 {}/{})",
            exam.title,
            answered,
            exam.questions.len()
        );

        let request = CompletionRequest {
            model: self.model_name.clone(),
            system_message: SYSTEM_MESSAGE.to_string(),
            user_message: build_evaluation_prompt(exam, answers)?,
            schema_name: REPORT_SCHEMA_NAME.to_string(),
            schema: report_schema(),
        };

        let response = self.provider.complete(request).await?;
        let report = parse_report(&response, exam)?;
        info!("✓ 阅卷完成: {}/{}", report.overall_score, exam.total_marks);
        Ok(report)
    }
}

/// 每道题配上考生答案，缺失或空白的答案记为 "Not answered"
pub fn pair_answers<'a>(exam: &'a Exam, answers: &[UserAnswer]) -> Vec<AnsweredQuestion<'a>> {
    exam.questions
        .iter()
        .map(|question| {
            let student_answer = answers
                .iter()
                .find(|a| a.question_id == question.id)
                .filter(|a| a.is_answered())
                .map(|a| a.answer.clone())
                .unwrap_or_else(|| NOT_ANSWERED.to_string());
            AnsweredQuestion {
                question,
                student_answer,
            }
        })
        .collect()
}

/// 构建阅卷提示词
pub fn build_evaluation_prompt(
    exam: &Exam,
    answers: &[UserAnswer],
) -> Result<String, serde_json::Error> {
    let exam_data = serde_json::to_string(&pair_answers(exam, answers))?;
    Ok(format!(
        r#"Evaluate a student's answers to the exam "{title}" ({total_marks} marks).

Evaluation criteria:
- Content accuracy and factual correctness
- Depth of understanding of the topic
- Clarity, structure and coherence of the answer
- Completeness in addressing all parts of the question
- Relevance to the question asked

Instructions:
1. Evaluate each question's answer against the criteria above. A question whose studentAnswer is "{not_answered}" scores 0.
2. Assign a score to each answer ('assignedScore'). It must never exceed the 'marks' of that question.
3. Give specific feedback for EVERY answer in the 'feedback' field:
   - INCORRECT or PARTIALLY CORRECT answers: explain clearly what was wrong, which key points were missed, and give the correct information, addressing any misconception.
   - CORRECT answers: a brief encouraging confirmation such as "Excellent work!".
4. Compute 'overallScore' as the sum of all 'assignedScore' values.
5. Summarise the student's key 'strengths' and 'weaknesses' in 3-4 points each.
6. Give 3-4 actionable 'recommendations' for improvement.
7. Return a single JSON object that strictly follows the provided schema, without any text or markdown outside the JSON.

Exam data (questions with the student's answers):
{exam_data}"#,
        title = exam.title,
        total_marks = exam.total_marks,
        not_answered = NOT_ANSWERED,
        exam_data = exam_data,
    ))
}

// ========== 响应解析 ==========

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReport {
    overall_score: i64,
    strengths: Vec<String>,
    weaknesses: Vec<String>,
    recommendations: Vec<String>,
    detailed_feedback: Vec<RawFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFeedback {
    question_id: i64,
    question_text: String,
    student_answer: String,
    assigned_score: i64,
    feedback: String,
}

/// 解析并校验阅卷响应
pub fn parse_report(response: &str, exam: &Exam) -> Result<EvaluationReport, EvaluationError> {
    let raw: RawReport = serde_json::from_str(extract_json(response))?;

    let mut seen = HashSet::new();
    let mut detailed_feedback = Vec::with_capacity(raw.detailed_feedback.len());
    for item in raw.detailed_feedback {
        let question = u32::try_from(item.question_id)
            .ok()
            .and_then(|id| exam.question(id))
            .filter(|q| seen.insert(q.id))
            .ok_or(SchemaViolation::UnknownQuestion {
                question_id: item.question_id,
            })?;

        let assigned_score = u32::try_from(item.assigned_score)
            .ok()
            .filter(|score| *score <= question.marks)
            .ok_or(SchemaViolation::ScoreOutOfRange {
                question_id: question.id,
                score: item.assigned_score,
                max: question.marks,
            })?;

        detailed_feedback.push(QuestionFeedback {
            question_id: question.id,
            question_text: item.question_text,
            student_answer: item.student_answer,
            assigned_score,
            feedback: item.feedback,
        });
    }

    let overall_score = detailed_feedback
        .iter()
        .try_fold(0u32, |sum, f| sum.checked_add(f.assigned_score))
        .ok_or(SchemaViolation::MarksOverflow)?;
    if i64::from(overall_score) != raw.overall_score {
        warn!(
            "⚠️ 模型给出的总分 {} 与各题得分之和 {} 不一致，使用后者",
            raw.overall_score, overall_score
        );
    }

    Ok(EvaluationReport {
        overall_score,
        strengths: raw.strengths,
        weaknesses: raw.weaknesses,
        recommendations: raw.recommendations,
        detailed_feedback,
    })
}
