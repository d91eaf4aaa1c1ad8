//! 响应结构约定
//!
//! 出卷和阅卷请求都要求模型按这里的 JSON schema 返回

use regex::Regex;
use serde_json::{json, Value};
use std::sync::OnceLock;

use crate::error::SchemaViolation;

pub const EXAM_SCHEMA_NAME: &str = "exam";
pub const REPORT_SCHEMA_NAME: &str = "evaluation_report";

/// 试卷结构
pub fn exam_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": { "type": "string" },
            "duration": { "type": "integer" },
            "totalMarks": { "type": "integer" },
            "questions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer" },
                        "text": { "type": "string" },
                        "type": { "type": "string", "enum": ["mcq", "short", "medium", "long"] },
                        "marks": { "type": "integer" },
                        "options": {
                            "type": ["array", "null"],
                            "items": {
                                "type": "object",
                                "properties": {
                                    "value": { "type": "string" },
                                    "label": { "type": "string" }
                                },
                                "required": ["value", "label"]
                            }
                        }
                    },
                    "required": ["id", "text", "type", "marks"]
                }
            }
        },
        "required": ["title", "duration", "totalMarks", "questions"]
    })
}

/// 阅卷报告结构
pub fn report_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "overallScore": { "type": "integer" },
            "strengths": { "type": "array", "items": { "type": "string" } },
            "weaknesses": { "type": "array", "items": { "type": "string" } },
            "recommendations": { "type": "array", "items": { "type": "string" } },
            "detailedFeedback": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "questionId": { "type": "integer" },
                        "questionText": { "type": "string" },
                        "studentAnswer": { "type": "string" },
                        "assignedScore": { "type": "integer" },
                        "feedback": { "type": "string" }
                    },
                    "required": ["questionId", "questionText", "studentAnswer", "assignedScore", "feedback"]
                }
            }
        },
        "required": ["overallScore", "strengths", "weaknesses", "recommendations", "detailedFeedback"]
    })
}

/// 去掉模型偶尔包在外面的 Markdown 代码块
pub fn extract_json(response: &str) -> &str {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    let fence = FENCE.get_or_init(|| Regex::new(r"(?s)^\s*```[A-Za-z]*\s*\n(.*?)\n?\s*```\s*$").ok());

    let trimmed = response.trim();
    fence
        .as_ref()
        .and_then(|re| re.captures(trimmed))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(trimmed)
}

/// 正整数字段
pub fn positive(field: impl Into<String>, value: i64) -> Result<u32, SchemaViolation> {
    match u32::try_from(value) {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(SchemaViolation::NotPositive {
            field: field.into(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_plain_json() {
        assert_eq!(extract_json("  {\"a\": 1}\n"), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_fenced_json() {
        let fenced = "```json\n{\"a\": 1}\n```";
        assert_eq!(extract_json(fenced), "{\"a\": 1}");

        let bare_fence = "```\n[1, 2]\n```\n";
        assert_eq!(extract_json(bare_fence), "[1, 2]");
    }

    #[test]
    fn test_extract_leaves_prose_alone() {
        let prose = "Here is your exam: {\"a\": 1}";
        assert_eq!(extract_json(prose), prose);
    }

    #[test]
    fn test_positive() {
        assert_eq!(positive("marks", 5), Ok(5));
        assert!(positive("marks", 0).is_err());
        assert!(positive("marks", -3).is_err());
        assert!(positive("marks", i64::MAX).is_err());
    }

    #[test]
    fn test_schemas_require_top_level_fields() {
        assert_eq!(exam_schema()["required"].as_array().map(|r| r.len()), Some(4));
        assert_eq!(report_schema()["required"].as_array().map(|r| r.len()), Some(5));
        assert_eq!(
            exam_schema()["properties"]["questions"]["items"]["properties"]["type"]["enum"][0],
            "mcq"
        );
    }
}
