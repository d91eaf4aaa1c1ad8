pub mod catalog;
pub mod exam;
pub mod report;
pub mod snapshot;

pub use catalog::ConfigDraft;
pub use exam::{Exam, ExamConfig, McqOption, Question, QuestionType, UserAnswer};
pub use report::{EvaluationReport, QuestionFeedback, ScoreBand};
pub use snapshot::SessionSnapshot;
