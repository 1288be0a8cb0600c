//! 模型层：能力抽象与实现（OpenAI 兼容 / DeepSeek / 规则 / 脚本）

pub mod deepseek;
pub mod mock;
pub mod openai;
pub mod rule_based;
pub mod traits;

use std::sync::Arc;

pub use deepseek::{create_deepseek_model, has_api_key, DEEPSEEK_CHAT, DEEPSEEK_REASONER};
pub use mock::{RecordedRequest, ScriptedModel};
pub use openai::{OpenAiModel, TokenUsage};
pub use rule_based::RuleBasedModel;
pub use traits::{
    CapabilityError, GenerateRequest, Judgment, ModelCapability, ModelResponse, TransferSpec,
};

use crate::config::LlmSection;

/// 按 [llm] 配置创建模型；未配置 API Key 时退回离线规则模型
pub fn create_model(cfg: &LlmSection) -> Arc<dyn ModelCapability> {
    match cfg.provider.as_str() {
        "deepseek" if has_api_key() => {
            tracing::info!(model = %cfg.model, "Using DeepSeek model");
            let model = create_deepseek_model(Some(&cfg.model));
            match &cfg.guardrail_model {
                Some(g) => Arc::new(model.with_judge_model(g.clone())),
                None => Arc::new(model),
            }
        }
        "openai" if has_api_key() => {
            tracing::info!(model = %cfg.model, base_url = ?cfg.base_url, "Using OpenAI-compatible model");
            let model = OpenAiModel::new(cfg.base_url.as_deref(), &cfg.model, None);
            match &cfg.guardrail_model {
                Some(g) => Arc::new(model.with_judge_model(g.clone())),
                None => Arc::new(model),
            }
        }
        other => {
            if other != "mock" {
                tracing::warn!(provider = other, "No API key configured, falling back to rule-based model");
            }
            Arc::new(RuleBasedModel::new())
        }
    }
}
