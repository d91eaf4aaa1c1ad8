//! 出卷服务 - 业务能力层
//!
//! 考试配置 → 提示词 + 试卷 schema → 校验后的 Exam

use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{GenerationError, SchemaViolation};
use crate::models::{Exam, ExamConfig, McqOption, Question, QuestionType};
use crate::services::llm_service::{CompletionProvider, CompletionRequest};
use crate::services::schema::{exam_schema, extract_json, positive, EXAM_SCHEMA_NAME};

const SYSTEM_MESSAGE: &str = "You are an expert exam creator for the Kerala State Board curriculum, \
                              but your questions are universally understandable. \
                              You always answer with a single JSON object and nothing else.";

/// 出卷服务
///
/// 职责：
/// - 根据考试配置构建出卷提示词
/// - 请求模型按试卷 schema 返回
/// - 严格校验返回内容，失败统一为 GenerationError
pub struct ExamGenerator {
    provider: Arc<dyn CompletionProvider>,
    model_name: String,
}

impl ExamGenerator {
    pub fn new(provider: Arc<dyn CompletionProvider>, model_name: impl Into<String>) -> Self {
        Self {
            provider,
            model_name: model_name.into(),
        }
    }

    /// 生成一份试卷
    ///
    /// 题目顺序保持模型返回的原样，排序由会话在开考时完成
    pub async fn generate(&self, config: &ExamConfig) -> Result<Exam, GenerationError> {
        info!(
            "📝 请求出卷: {} / {} / {} ({} 分钟, {} 分)",
            config.class_level, config.subject, config.exam_type, config.duration, config.total_marks
        );

        let request = CompletionRequest {
            model: self.model_name.clone(),
            system_message: SYSTEM_MESSAGE.to_string(),
            user_message: build_generation_prompt(config),
            schema_name: EXAM_SCHEMA_NAME.to_string(),
            schema: exam_schema(),
        };

        let response = self.provider.complete(request).await?;
        let exam = parse_exam(&response)?;

        if let Some(sum) = exam.marks_sum().filter(|sum| *sum != exam.total_marks) {
            debug!("题目分值合计 {} 与总分 {} 不一致（不做修正）", sum, exam.total_marks);
        }
        info!("✓ 试卷生成完成: {} ({} 道题)", exam.title, exam.questions.len());
        Ok(exam)
    }
}

/// 构建出卷提示词
pub fn build_generation_prompt(config: &ExamConfig) -> String {
    format!(
        r#"Generate a complete exam paper based on the following specifications.

Specifications:
- Class: {class_level}
- Subject: {subject}
- Exam Type: {exam_type}
- Total Marks: {total_marks}
- Duration (in minutes): {duration}
- Language: English

Instructions:
1. Create a balanced mix of question types: Multiple Choice (mcq), Short Answer (short), Medium Answer (medium), and Essay/Descriptive (long).
2. The difficulty and topics must align with the specified Class, Subject and Exam Type. For 'Board Exam Preparation', mimic the official pattern. For 'Quick Revision', cover a wide range of topics.
3. The marks of all questions combined must equal exactly {total_marks}.
4. Distribute the marks appropriately across the different question types.
5. Keep the number and complexity of questions reasonable for a {duration} minute exam.
6. For mcq questions, provide exactly 4 distinct options with one correct answer. The 'value' of each option is a single letter identifier ('a', 'b', 'c', 'd') and the 'label' is the option text. Other question types have no options.
7. Give each question a unique integer 'id', numbered sequentially starting from 1.
8. Sort the questions array in ascending order of 'marks'.
9. Return a single JSON object that strictly follows the provided schema, without any introductory text, explanation or markdown formatting."#,
        class_level = config.class_level,
        subject = config.subject,
        exam_type = config.exam_type,
        total_marks = config.total_marks,
        duration = config.duration,
    )
}

// ========== 响应解析 ==========

/// 原始响应结构，数值先按 i64 接收再逐项校验
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExam {
    title: String,
    duration: i64,
    total_marks: i64,
    questions: Vec<RawQuestion>,
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    id: i64,
    text: String,
    #[serde(rename = "type")]
    kind: String,
    marks: i64,
    #[serde(default)]
    options: Option<Vec<McqOption>>,
}

/// 解析并校验出卷响应
pub fn parse_exam(response: &str) -> Result<Exam, GenerationError> {
    let raw: RawExam = serde_json::from_str(extract_json(response))?;

    let ids: Vec<i64> = raw.questions.iter().map(|q| q.id).collect();
    let questions = raw
        .questions
        .into_iter()
        .map(|q| {
            let id = u32::try_from(q.id).map_err(|_| SchemaViolation::BadQuestionIds {
                ids: ids.clone(),
                expected_max: ids.len(),
            })?;
            let kind: QuestionType = q.kind.trim().parse()?;
            let marks = positive(format!("questions[{}].marks", q.id), q.marks)?;
            // 非选择题的空选项数组视为没有选项
            let options = q.options.filter(|opts| kind == QuestionType::Mcq || !opts.is_empty());
            Ok(Question {
                id,
                text: q.text,
                kind,
                marks,
                options,
            })
        })
        .collect::<Result<Vec<_>, SchemaViolation>>()?;

    let exam = Exam {
        title: raw.title,
        duration: positive("duration", raw.duration)?,
        total_marks: positive("totalMarks", raw.total_marks)?,
        questions,
    };
    exam.validate()?;
    Ok(exam)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::models::catalog::ConfigDraft;
    use crate::services::llm_service::tests::ScriptedProvider;
    use serde_json::json;
    use tokio_test::assert_err;

    fn mcq(id: i64, marks: i64) -> serde_json::Value {
        json!({
            "id": id, "text": format!("MCQ {}", id), "type": "mcq", "marks": marks,
            "options": [
                {"value": "a", "label": "One"}, {"value": "b", "label": "Two"},
                {"value": "c", "label": "Three"}, {"value": "d", "label": "Four"}
            ]
        })
    }

    fn written(id: i64, kind: &str, marks: i64) -> serde_json::Value {
        json!({"id": id, "text": format!("Explain {}", id), "type": kind, "marks": marks})
    }

    fn exam_json(questions: Vec<serde_json::Value>) -> String {
        json!({"title": "Physics Board Prep", "duration": 30, "totalMarks": 20, "questions": questions})
            .to_string()
    }

    fn generator(provider: Arc<ScriptedProvider>) -> ExamGenerator {
        ExamGenerator::new(provider, "test-model")
    }

    #[tokio::test]
    async fn test_generate_returns_validated_exam() {
        let response = exam_json(vec![
            written(1, "short", 2),
            written(2, "long", 8),
            written(3, "medium", 5),
            mcq(4, 5),
        ]);
        let provider = Arc::new(ScriptedProvider::replying(vec![Ok(response)]));
        let exam = generator(provider.clone())
            .generate(&ConfigDraft::default().to_config())
            .await
            .unwrap();

        let ids: Vec<u32> = exam.questions.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(exam.marks_sum(), Some(20));
        for q in &exam.questions {
            assert_eq!(q.options.is_some(), q.kind == QuestionType::Mcq);
        }

        let request = provider.last_request().unwrap();
        assert_eq!(request.model, "test-model");
        assert_eq!(request.schema_name, EXAM_SCHEMA_NAME);
        assert!(request.user_message.contains("Physics"));
    }

    #[test]
    fn test_prompt_encodes_config() {
        let config = ExamConfig {
            class_level: "12th Grade (+2)".into(),
            subject: "Chemistry".into(),
            exam_type: "Quick Revision".into(),
            duration: 45,
            total_marks: 25,
        };
        let prompt = build_generation_prompt(&config);
        for needle in ["12th Grade (+2)", "Chemistry", "Quick Revision", "Total Marks: 25", "45"] {
            assert!(prompt.contains(needle), "missing {}", needle);
        }
        assert!(prompt.contains("exactly 4 distinct options"));
        assert!(prompt.contains("ascending order of 'marks'"));
    }

    #[test]
    fn test_parse_accepts_fenced_response() {
        let fenced = format!("```json\n{}\n```", exam_json(vec![mcq(1, 1), written(2, "short", 2)]));
        assert_eq!(parse_exam(&fenced).unwrap().questions.len(), 2);
    }

    #[test]
    fn test_parse_drops_empty_options_on_written_questions() {
        let mut q = written(2, "short", 2);
        q["options"] = json!([]);
        let exam = parse_exam(&exam_json(vec![mcq(1, 1), q])).unwrap();
        assert!(exam.questions[1].options.is_none());
    }

    #[test]
    fn test_parse_rejects_schema_violations() {
        let cases = vec![
            exam_json(vec![]),
            exam_json(vec![written(1, "essay", 2)]),
            exam_json(vec![written(1, "short", 0)]),
            exam_json(vec![written(1, "short", -2)]),
            exam_json(vec![written(1, "short", 2), written(3, "short", 2)]),
            exam_json(vec![written(-1, "short", 2)]),
            exam_json(vec![json!({"id": 1, "text": "Pick", "type": "mcq", "marks": 1})]),
            exam_json(vec![json!({"id": 1, "text": "Pick", "type": "mcq", "marks": 1, "options": []})]),
        ];
        for case in cases {
            assert!(
                matches!(parse_exam(&case), Err(GenerationError::Schema(_))),
                "accepted: {}",
                case
            );
        }
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(matches!(
            parse_exam("Sorry, I cannot help with that."),
            Err(GenerationError::InvalidJson(_))
        ));
        // 缺少必填字段
        assert!(matches!(
            parse_exam(r#"{"title": "x", "questions": []}"#),
            Err(GenerationError::InvalidJson(_))
        ));
    }

    #[tokio::test]
    async fn test_oversized_marks_are_generation_failure() {
        let response = exam_json(vec![written(1, "short", 3_000_000_000), written(2, "long", 3_000_000_000)]);
        let provider = Arc::new(ScriptedProvider::replying(vec![Ok(response)]));
        let result = generator(provider).generate(&ConfigDraft::default().to_config()).await;
        assert!(matches!(
            assert_err!(result),
            GenerationError::Schema(SchemaViolation::MarksOverflow)
        ));
    }

    #[tokio::test]
    async fn test_provider_failure_is_generation_failure() {
        let provider = Arc::new(ScriptedProvider::replying(vec![Err(LlmError::EmptyContent {
            model: "test-model".into(),
        })]));
        let result = generator(provider).generate(&ConfigDraft::default().to_config()).await;
        assert!(matches!(assert_err!(result), GenerationError::Provider(_)));
    }
}
