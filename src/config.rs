//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `AIRDESK__*` 覆盖（双下划线表示嵌套，如 `AIRDESK__LLM__PROVIDER=openai`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::guardrails::SafetyPolicy;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub safety: SafetySection,
}

/// [app] 段：应用名、入口专员
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    pub name: Option<String>,
    /// 新会话的初始专员，也是所有转接路径必须能回到的节点
    #[serde(default = "default_entry_specialist")]
    pub entry_specialist: String,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            entry_specialist: default_entry_specialist(),
        }
    }
}

fn default_entry_specialist() -> String {
    crate::specialists::airline::TRIAGE.to_string()
}

/// [llm] 段：后端选择
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// 后端：openai / deepseek / mock；未配置 API Key 时一律退回 mock
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    /// 安全检查判定用的模型，未设置时与 model 相同
    pub guardrail_model: Option<String>,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            guardrail_model: None,
        }
    }
}

fn default_provider() -> String {
    "mock".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

/// [engine] 段：单轮步数、动作超时、滚动对话长度
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    /// 单轮内最多调用模型的次数
    #[serde(default = "default_max_steps_per_turn")]
    pub max_steps_per_turn: usize,
    /// 单次动作调用超时（秒）
    #[serde(default = "default_action_timeout_secs")]
    pub action_timeout_secs: u64,
    /// 滚动对话保留的条目数，0 表示不限制
    #[serde(default = "default_max_transcript_items")]
    pub max_transcript_items: usize,
    /// 新会话是否预填演示乘客（姓名、账号）；默认上下文为空
    #[serde(default)]
    pub seed_demo_context: bool,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            max_steps_per_turn: default_max_steps_per_turn(),
            action_timeout_secs: default_action_timeout_secs(),
            max_transcript_items: default_max_transcript_items(),
            seed_demo_context: false,
        }
    }
}

fn default_max_steps_per_turn() -> usize {
    10
}

fn default_action_timeout_secs() -> u64 {
    30
}

fn default_max_transcript_items() -> usize {
    200
}

/// [safety] 段：安全检查的执行策略与拒答文案
#[derive(Debug, Clone, Deserialize)]
pub struct SafetySection {
    #[serde(default)]
    pub policy: SafetyPolicy,
    #[serde(default = "default_refusal_message")]
    pub refusal_message: String,
}

impl Default for SafetySection {
    fn default() -> Self {
        Self {
            policy: SafetyPolicy::default(),
            refusal_message: default_refusal_message(),
        }
    }
}

fn default_refusal_message() -> String {
    "Sorry, I can only answer questions related to airline travel.".to_string()
}

/// 从 config 目录加载配置，环境变量 AIRDESK__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 AIRDESK__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("AIRDESK")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
