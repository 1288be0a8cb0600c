//! OpenAI 兼容 API 模型
//!
//! 通过 async_openai 调用任意 OpenAI 兼容端点（可配置 base_url）；支持 DeepSeek、OpenAI、自建代理等。
//! 动作调用与转接以嵌入回复中的 JSON 表达：
//! `{"actions": [{"name": "...", "arguments": {...}}]}` 或 `{"transfer_to": "..."}`；不含 JSON 时视为直接回复。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::llm::{CapabilityError, GenerateRequest, Judgment, ModelCapability, ModelResponse};
use crate::memory::{Item, Role};

/// 单次请求超时
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Token 使用统计（累计值）
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: Arc<AtomicU64>,
    pub completion_tokens: Arc<AtomicU64>,
}

impl TokenUsage {
    pub fn add(&self, prompt: u64, completion: u64) {
        self.prompt_tokens.fetch_add(prompt, Ordering::Relaxed);
        self.completion_tokens.fetch_add(completion, Ordering::Relaxed);
    }

    /// (prompt, completion, total)
    pub fn get(&self) -> (u64, u64, u64) {
        let p = self.prompt_tokens.load(Ordering::Relaxed);
        let c = self.completion_tokens.load(Ordering::Relaxed);
        (p, c, p + c)
    }
}

/// 回复中嵌入的动作调用
#[derive(Debug, Deserialize)]
struct WireAction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// 回复中嵌入的 JSON 指令
#[derive(Debug, Deserialize)]
struct WireDirective {
    #[serde(default)]
    actions: Vec<WireAction>,
    transfer_to: Option<String>,
    message: Option<String>,
}

const DIRECTIVE_KEYS: &[&str] = &["\"actions\"", "\"transfer_to\""];

/// 从文本中提取 JSON 块（```json ... ``` 或首个 { 到最后一个 }）
fn extract_json(text: &str) -> Option<&str> {
    if let Some(start) = text.find("```json") {
        let rest = &text[start + 7..];
        return Some(rest.find("```").map(|end| rest[..end].trim()).unwrap_or(rest.trim()));
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// 解析模型回复为条目序列
pub fn parse_reply(text: &str) -> Result<ModelResponse, CapabilityError> {
    let trimmed = text.trim();
    let Some(json_str) = extract_json(trimmed) else {
        return Ok(ModelResponse::message(trimmed));
    };
    let directive: WireDirective = match serde_json::from_str(json_str) {
        Ok(d) => d,
        // 带指令键却解析失败才算协议错误；正文里的普通花括号按回复处理
        Err(e) if DIRECTIVE_KEYS.iter().any(|k| json_str.contains(k)) => {
            return Err(CapabilityError::MalformedOutput(format!("{e}: {json_str}")));
        }
        Err(e) => {
            tracing::debug!(error = %e, "Reply braces are not a directive, treating as message");
            return Ok(ModelResponse::message(trimmed));
        }
    };

    let mut items = Vec::new();
    if let Some(message) = directive.message.filter(|m| !m.trim().is_empty()) {
        items.push(Item::assistant(message));
    }
    items.extend(
        directive
            .actions
            .into_iter()
            .filter(|a| !a.name.is_empty())
            .map(|a| Item::invoke(a.name, a.arguments)),
    );
    if let Some(target) = directive.transfer_to.filter(|t| !t.is_empty()) {
        items.push(Item::transfer(target));
    }
    if items.is_empty() {
        // JSON 里没有任何指令，当作普通回复
        return Ok(ModelResponse::message(trimmed));
    }
    Ok(ModelResponse::new(items))
}

/// 渲染系统提示：专员指令 + 可用动作 + 可用转接目标 + 输出协议
fn system_prompt(request: &GenerateRequest<'_>) -> String {
    let mut prompt = request.instructions.to_string();
    if !request.actions.is_empty() {
        prompt.push_str("\n\nAvailable actions (name, description, JSON schema of arguments):\n");
        for a in request.actions {
            prompt.push_str(&format!("- {}: {} {}\n", a.name, a.description, a.parameters));
        }
    }
    if !request.transfers.is_empty() {
        prompt.push_str("\nYou may hand the conversation to one of these agents:\n");
        for t in request.transfers {
            prompt.push_str(&format!("- {}: {}\n", t.name, t.description));
        }
    }
    prompt.push_str(
        "\nTo call actions reply with only {\"actions\": [{\"name\": \"...\", \"arguments\": {...}}]}. \
         To hand off reply with only {\"transfer_to\": \"<agent name>\"}. \
         Otherwise reply to the customer in plain text.",
    );
    prompt
}

/// OpenAI 兼容模型：持有 Client、专员模型名与判定模型名
pub struct OpenAiModel {
    client: Client<OpenAIConfig>,
    model: String,
    judge_model: String,
    timeout: Duration,
    pub usage: TokenUsage,
}

impl OpenAiModel {
    pub fn new(base_url: Option<&str>, model: &str, api_key: Option<&str>) -> Self {
        let api_key = api_key
            .map(String::from)
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_else(|| "sk-placeholder".to_string());

        let config = if let Some(url) = base_url {
            OpenAIConfig::new().with_api_base(url).with_api_key(api_key)
        } else {
            OpenAIConfig::new().with_api_key(api_key)
        };

        Self {
            client: Client::with_config(config),
            model: model.to_string(),
            judge_model: model.to_string(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            usage: TokenUsage::default(),
        }
    }

    /// 安全检查使用的模型（通常更小更快）
    pub fn with_judge_model(mut self, model: impl Into<String>) -> Self {
        self.judge_model = model.into();
        self
    }

    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.usage.get()
    }

    fn system(content: String) -> Result<ChatCompletionRequestMessage, CapabilityError> {
        ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()
            .map(ChatCompletionRequestMessage::System)
            .map_err(|e| CapabilityError::Transport(e.to_string()))
    }

    fn user(content: String) -> Result<ChatCompletionRequestMessage, CapabilityError> {
        ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()
            .map(ChatCompletionRequestMessage::User)
            .map_err(|e| CapabilityError::Transport(e.to_string()))
    }

    fn assistant(content: String) -> Result<ChatCompletionRequestMessage, CapabilityError> {
        ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()
            .map(ChatCompletionRequestMessage::Assistant)
            .map_err(|e| CapabilityError::Transport(e.to_string()))
    }

    /// 把滚动对话转换为 API 消息；动作调用与转接还原成 assistant 的 JSON，动作结果作为 user 侧观察
    fn to_openai_messages(
        &self,
        request: &GenerateRequest<'_>,
    ) -> Result<Vec<ChatCompletionRequestMessage>, CapabilityError> {
        let mut messages = vec![Self::system(system_prompt(request))?];
        for item in request.transcript {
            let msg = match item {
                Item::Message {
                    role: Role::User,
                    content,
                } => Self::user(content.clone())?,
                Item::Message {
                    role: Role::Assistant,
                    content,
                } => Self::assistant(content.clone())?,
                Item::ActionInvocation {
                    name, arguments, ..
                } => Self::assistant(
                    serde_json::json!({ "actions": [{ "name": name, "arguments": arguments }] })
                        .to_string(),
                )?,
                Item::ActionResult { name, output, .. } => {
                    Self::user(format!("Observation from {name}: {output}"))?
                }
                Item::TransferRequest { target } => {
                    Self::assistant(serde_json::json!({ "transfer_to": target }).to_string())?
                }
            };
            messages.push(msg);
        }
        Ok(messages)
    }

    async fn complete(
        &self,
        model: &str,
        messages: Vec<ChatCompletionRequestMessage>,
    ) -> Result<String, CapabilityError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .build()
            .map_err(|e| CapabilityError::Transport(e.to_string()))?;

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| CapabilityError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| CapabilityError::Transport(e.to_string()))?;

        if let Some(usage) = &response.usage {
            self.usage
                .add(usage.prompt_tokens as u64, usage.completion_tokens as u64);
        }

        Ok(response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl ModelCapability for OpenAiModel {
    async fn generate(&self, request: &GenerateRequest<'_>) -> Result<ModelResponse, CapabilityError> {
        let messages = self.to_openai_messages(request)?;
        tracing::debug!(
            specialist = request.specialist,
            transcript_items = request.transcript.len(),
            actions = request.actions.len(),
            transfers = request.transfers.len(),
            "model request"
        );
        let content = self.complete(&self.model, messages).await?;
        let response = parse_reply(&content)?;
        tracing::debug!(
            specialist = request.specialist,
            items = response.items.len(),
            "model response"
        );
        Ok(response)
    }

    async fn judge(&self, instructions: &str, input: &str) -> Result<Judgment, CapabilityError> {
        let schema = crate::tools::schema::args_schema::<Judgment>();
        let messages = vec![
            Self::system(format!(
                "{instructions}\n\nRespond with only a JSON object matching this schema: {schema}"
            ))?,
            Self::user(input.to_string())?,
        ];
        let content = self.complete(&self.judge_model, messages).await?;
        let json_str = extract_json(&content)
            .ok_or_else(|| CapabilityError::MalformedOutput(content.clone()))?;
        serde_json::from_str(json_str)
            .map_err(|e| CapabilityError::MalformedOutput(format!("{e}: {json_str}")))
    }
}
