use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// 默认配置文件路径
pub const DEFAULT_CONFIG_FILE: &str = "exam_pro.toml";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    /// 出卷模型（速度优先）
    pub generation_model_name: String,
    /// 阅卷模型（质量优先）
    pub evaluation_model_name: String,
    /// 快照存放目录
    pub snapshot_dir: PathBuf,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            generation_model_name: "gemini-flash-lite-latest".to_string(),
            evaluation_model_name: "gemini-2.5-pro".to_string(),
            snapshot_dir: PathBuf::from(".exam_pro"),
            output_log_file: "exam_pro.log".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 加载配置：默认值 → TOML 文件（可选）→ 环境变量
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("EXAM_PRO_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let base = Self::from_file(Path::new(&path))?.unwrap_or_default();
        base.with_env_overrides()
    }

    /// 从 TOML 文件读取配置，文件不存在时返回 `None`
    pub fn from_file(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content, &path.display().to_string()).map(Some)
    }

    fn from_toml_str(content: &str, path: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.to_string(),
            source,
        })
    }

    /// 用环境变量覆盖已有配置
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        Ok(Self {
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(self.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(self.llm_api_base_url),
            generation_model_name: std::env::var("GENERATION_MODEL_NAME").unwrap_or(self.generation_model_name),
            evaluation_model_name: std::env::var("EVALUATION_MODEL_NAME").unwrap_or(self.evaluation_model_name),
            snapshot_dir: std::env::var("SNAPSHOT_DIR").map(PathBuf::from).unwrap_or(self.snapshot_dir),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
            verbose_logging: match std::env::var("VERBOSE_LOGGING") {
                Ok(value) => parse_bool("VERBOSE_LOGGING", &value)?,
                Err(_) => self.verbose_logging,
            },
        })
    }
}

fn parse_bool(var_name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: value.to_string(),
            expected_type: "bool".to_string(),
        }),
    }
}
