//! LLM 服务 - 业务能力层
//!
//! 只负责"发送一次结构化补全请求"，不关心试卷或阅卷
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Gemini, Azure 等）

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
        ResponseFormatJsonSchema,
    },
    Client,
};
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::LlmError;

/// 一次结构化补全请求
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub system_message: String,
    pub user_message: String,
    /// schema 名称（只用于标识）
    pub schema_name: String,
    /// 响应必须满足的 JSON schema
    pub schema: Value,
}

/// 结构化补全能力
///
/// 出卷、阅卷客户端都通过它访问模型，测试时替换为固定响应
pub trait CompletionProvider: Send + Sync {
    /// 返回模型输出的原始文本
    fn complete(&self, request: CompletionRequest) -> BoxFuture<'_, Result<String, LlmError>>;
}

/// LLM 服务
///
/// 职责：
/// - 持有 OpenAI 兼容客户端
/// - 把 CompletionRequest 转换为带 json_schema 约束的聊天请求
/// - 不解析返回内容
pub struct LlmService {
    client: Client<OpenAIConfig>,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
        }
    }

    /// 发送结构化补全请求
    ///
    /// # 返回
    /// 返回模型响应内容（去掉首尾空白）
    pub async fn send_structured(&self, request: CompletionRequest) -> Result<String, LlmError> {
        debug!("调用 LLM API，模型: {}", request.model);
        debug!("用户消息长度: {} 字符", request.user_message.len());

        let build_err = |e: async_openai::error::OpenAIError| LlmError::RequestBuildFailed(Box::new(e));

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(request.system_message.as_str())
            .build()
            .map_err(build_err)?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(request.user_message.as_str())
            .build()
            .map_err(build_err)?;

        let messages = vec![
            ChatCompletionRequestMessage::System(system_msg),
            ChatCompletionRequestMessage::User(user_msg),
        ];

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&request.model)
            .messages(messages)
            .temperature(0.4)
            .response_format(ResponseFormat::JsonSchema {
                json_schema: ResponseFormatJsonSchema {
                    description: None,
                    name: request.schema_name.clone(),
                    schema: Some(request.schema.clone()),
                    strict: None,
                },
            })
            .build()
            .map_err(build_err)?;

        // 调用 API
        let response = self.client.chat().create(chat_request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            LlmError::api_failed(&request.model, e)
        })?;

        debug!("LLM API 调用成功");

        // 提取响应内容
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| LlmError::EmptyContent {
                model: request.model.clone(),
            })?;

        Ok(content.trim().to_string())
    }
}

impl CompletionProvider for LlmService {
    fn complete(&self, request: CompletionRequest) -> BoxFuture<'_, Result<String, LlmError>> {
        self.send_structured(request).boxed()
    }
}
