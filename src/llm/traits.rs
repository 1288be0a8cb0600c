//! 模型能力抽象
//!
//! 所有后端（OpenAI 兼容 / DeepSeek / Scripted / RuleBased）实现 ModelCapability：
//! generate（专员一步生成：消息、动作调用或转接请求）与 judge（安全检查的结构化判定）。

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::memory::Item;
use crate::tools::ActionSpec;

/// 模型调用本身失败（超时、传输、输出格式）；属于基础设施错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CapabilityError {
    #[error("Model request timed out after {0}s")]
    Timeout(u64),

    #[error("Model transport error: {0}")]
    Transport(String),

    #[error("Malformed model output: {0}")]
    MalformedOutput(String),

    /// 脚本模型的预设回复已用完
    #[error("Model script exhausted")]
    Exhausted,
}

/// 提供给模型的转接目标
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferSpec {
    pub name: String,
    pub description: String,
}

/// 一次 generate 调用的输入
#[derive(Debug, Clone, Copy)]
pub struct GenerateRequest<'a> {
    pub specialist: &'a str,
    /// 按当前上下文渲染好的专员指令
    pub instructions: &'a str,
    pub transcript: &'a [Item],
    pub actions: &'a [ActionSpec],
    /// 本步允许的转接目标；本轮已转接过时为空
    pub transfers: &'a [TransferSpec],
}

/// 模型一步的输出：消息、动作调用、转接请求按生成顺序排列
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    pub items: Vec<Item>,
}

impl ModelResponse {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    pub fn message(text: impl Into<String>) -> Self {
        Self::new(vec![Item::assistant(text)])
    }

    /// 模型只能产出 assistant 消息、动作调用与转接请求
    pub fn validate(&self) -> Result<(), CapabilityError> {
        for item in &self.items {
            match item {
                Item::Message { role, .. } if *role != crate::memory::Role::Assistant => {
                    return Err(CapabilityError::MalformedOutput(
                        "model produced a user message".to_string(),
                    ));
                }
                Item::ActionResult { name, .. } => {
                    return Err(CapabilityError::MalformedOutput(format!(
                        "model produced an action result for '{name}'"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// 安全检查判定：verdict 为 true 表示通过
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Judgment {
    pub reasoning: String,
    pub verdict: bool,
}

impl Judgment {
    pub fn pass(reasoning: impl Into<String>) -> Self {
        Self {
            reasoning: reasoning.into(),
            verdict: true,
        }
    }

    pub fn fail(reasoning: impl Into<String>) -> Self {
        Self {
            reasoning: reasoning.into(),
            verdict: false,
        }
    }
}

/// 模型能力 trait：专员生成与结构化判定；是引擎唯一的挂起点
#[async_trait]
pub trait ModelCapability: Send + Sync {
    async fn generate(&self, request: &GenerateRequest<'_>) -> Result<ModelResponse, CapabilityError>;

    /// 按 instructions 对 input 做判定，输出 {reasoning, verdict}
    async fn judge(&self, instructions: &str, input: &str) -> Result<Judgment, CapabilityError>;
}
