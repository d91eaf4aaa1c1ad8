//! 配置页可选项

use super::exam::ExamConfig;

pub const CLASS_LEVELS: [&str; 6] = [
    "8th Grade",
    "9th Grade",
    "10th Grade (SSLC)",
    "11th Grade (+1)",
    "12th Grade (+2)",
    "University Level",
];

pub const SUBJECTS: [&str; 9] = [
    "Physics",
    "Chemistry",
    "Biology",
    "Mathematics",
    "Computer Science",
    "History",
    "Geography",
    "English",
    "Malayalam",
];

pub const EXAM_TYPES: [&str; 5] = [
    "Board Exam Preparation",
    "Class Test",
    "Competitive Exam Practice",
    "Quick Revision",
    "Chapter Quiz",
];

/// 可选时长（分钟）
pub const DURATIONS: [u32; 7] = [15, 30, 45, 60, 90, 120, 180];

pub const TOTAL_MARKS: [u32; 6] = [10, 20, 25, 50, 75, 100];

/// 配置页的可选字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    ClassLevel,
    Subject,
    ExamType,
    Duration,
    TotalMarks,
}

impl ConfigField {
    /// 该字段的选项个数
    pub fn choice_count(self) -> usize {
        match self {
            ConfigField::ClassLevel => CLASS_LEVELS.len(),
            ConfigField::Subject => SUBJECTS.len(),
            ConfigField::ExamType => EXAM_TYPES.len(),
            ConfigField::Duration => DURATIONS.len(),
            ConfigField::TotalMarks => TOTAL_MARKS.len(),
        }
    }

    /// 选项显示文本
    pub fn choice_labels(self) -> Vec<String> {
        match self {
            ConfigField::ClassLevel => CLASS_LEVELS.iter().map(|s| s.to_string()).collect(),
            ConfigField::Subject => SUBJECTS.iter().map(|s| s.to_string()).collect(),
            ConfigField::ExamType => EXAM_TYPES.iter().map(|s| s.to_string()).collect(),
            ConfigField::Duration => DURATIONS.iter().map(|d| format!("{} minutes", d)).collect(),
            ConfigField::TotalMarks => TOTAL_MARKS.iter().map(|m| format!("{} marks", m)).collect(),
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ConfigField::ClassLevel => "Class / Grade",
            ConfigField::Subject => "Subject",
            ConfigField::ExamType => "Exam Type",
            ConfigField::Duration => "Duration",
            ConfigField::TotalMarks => "Total Marks",
        }
    }
}

/// 配置页当前选中项（各字段在常量表中的下标）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigDraft {
    pub class_level: usize,
    pub subject: usize,
    pub exam_type: usize,
    pub duration: usize,
    pub total_marks: usize,
}

impl Default for ConfigDraft {
    fn default() -> Self {
        Self {
            class_level: 2,
            subject: 0,
            exam_type: 0,
            duration: 3,
            total_marks: 3,
        }
    }
}

impl ConfigDraft {
    /// 修改某个字段的选中项，下标越界时返回 false 且不做修改
    pub fn select(&mut self, field: ConfigField, index: usize) -> bool {
        if index >= field.choice_count() {
            return false;
        }
        let slot = match field {
            ConfigField::ClassLevel => &mut self.class_level,
            ConfigField::Subject => &mut self.subject,
            ConfigField::ExamType => &mut self.exam_type,
            ConfigField::Duration => &mut self.duration,
            ConfigField::TotalMarks => &mut self.total_marks,
        };
        *slot = index;
        true
    }

    pub fn selected(&self, field: ConfigField) -> usize {
        match field {
            ConfigField::ClassLevel => self.class_level,
            ConfigField::Subject => self.subject,
            ConfigField::ExamType => self.exam_type,
            ConfigField::Duration => self.duration,
            ConfigField::TotalMarks => self.total_marks,
        }
    }

    pub fn to_config(&self) -> ExamConfig {
        ExamConfig {
            class_level: CLASS_LEVELS[self.class_level].to_string(),
            subject: SUBJECTS[self.subject].to_string(),
            exam_type: EXAM_TYPES[self.exam_type].to_string(),
            duration: DURATIONS[self.duration],
            total_marks: TOTAL_MARKS[self.total_marks],
        }
    }

    /// 从已有配置还原选中项，不在常量表中的值保持默认
    pub fn from_config(config: &ExamConfig) -> Self {
        let mut draft = Self::default();
        if let Some(i) = CLASS_LEVELS.iter().position(|c| *c == config.class_level) {
            draft.class_level = i;
        }
        if let Some(i) = SUBJECTS.iter().position(|s| *s == config.subject) {
            draft.subject = i;
        }
        if let Some(i) = EXAM_TYPES.iter().position(|t| *t == config.exam_type) {
            draft.exam_type = i;
        }
        if let Some(i) = DURATIONS.iter().position(|d| *d == config.duration) {
            draft.duration = i;
        }
        if let Some(i) = TOTAL_MARKS.iter().position(|m| *m == config.total_marks) {
            draft.total_marks = i;
        }
        draft
    }
}
