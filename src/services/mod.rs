pub mod exam_evaluator;
pub mod exam_generator;
pub mod llm_service;
pub mod schema;

pub use exam_evaluator::{ExamEvaluator, NOT_ANSWERED};
pub use exam_generator::ExamGenerator;
pub use llm_service::{CompletionProvider, CompletionRequest, LlmService};
