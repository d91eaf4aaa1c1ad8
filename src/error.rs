use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// LLM 服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 试卷生成失败
    #[error("试卷生成失败: {0}")]
    Generation(#[from] GenerationError),
    /// 阅卷失败
    #[error("阅卷失败: {0}")]
    Evaluation(#[from] EvaluationError),
    /// 本地存储错误
    #[error("存储错误: {0}")]
    Persistence(#[from] PersistenceError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// IO 错误（终端读写）
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 请求构建失败
    #[error("LLM 请求构建失败: {0}")]
    RequestBuildFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
}

impl LlmError {
    /// 创建LLM API调用错误
    pub fn api_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        LlmError::ApiCallFailed {
            model: model.into(),
            source: Box::new(source),
        }
    }
}

/// 响应结构不符合约定的 JSON schema
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("试卷没有任何题目")]
    NoQuestions,
    #[error("字段 {field} 不能为空")]
    BlankField { field: String },
    #[error("字段 {field} 必须为正整数, 实际为 {value}")]
    NotPositive { field: String, value: i64 },
    #[error("未知题型: {0}")]
    UnknownQuestionType(String),
    #[error("题目编号必须为 1..={expected_max} 且不重复, 实际为 {ids:?}")]
    BadQuestionIds { ids: Vec<i64>, expected_max: usize },
    #[error("选择题 {question_id} 缺少选项")]
    MissingOptions { question_id: u32 },
    #[error("非选择题 {question_id} 不应包含选项")]
    UnexpectedOptions { question_id: u32 },
    #[error("反馈引用了不存在的题目 {question_id}")]
    UnknownQuestion { question_id: i64 },
    #[error("题目 {question_id} 得分 {score} 超出范围 [0, {max}]")]
    ScoreOutOfRange { question_id: u32, score: i64, max: u32 },
    #[error("分值合计超出范围")]
    MarksOverflow,
}

/// 试卷生成错误
///
/// 调用方只关心"生成失败"本身，细分类型仅用于日志
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Provider(#[from] LlmError),
    #[error("响应不是合法的JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("响应不符合试卷结构: {0}")]
    Schema(#[from] SchemaViolation),
}

/// 阅卷错误
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Provider(#[from] LlmError),
    #[error("响应不是合法的JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("响应不符合报告结构: {0}")]
    Schema(#[from] SchemaViolation),
}

/// 本地存储错误
///
/// 存储只是尽力而为，这类错误永远不会中断考试流程
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// 存储不可用（目录不可写、磁盘已满等）
    #[error("存储不可用 ({path}): {source}")]
    Unavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 序列化失败
    #[error("快照序列化失败: {0}")]
    Serialize(#[from] serde_json::Error),
    /// 锁已中毒
    #[error("存储锁已中毒")]
    Poisoned,
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 考试配置不合法
    #[error("考试配置不合法: {field} = '{value}'")]
    InvalidExamConfig { field: String, value: String },
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
