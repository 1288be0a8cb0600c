//! 动作注册表
//!
//! 所有动作实现 Action trait（name / description / parameters_schema / invoke），由 ActionRegistry 按名注册与解析，
//! ActionExecutor 在调用时加超时并把失败转换为可供模型阅读的错误载荷。

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::RegistryError;
use crate::memory::SharedContext;

/// 动作失败：可恢复，作为结果载荷交还给模型，不会中止本轮
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error("Unknown action: {0}")]
    NotFound(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// 动作自行给出的致歉说明（直接展示给用户）
    #[error("{0}")]
    Rejected(String),

    #[error("Action timed out after {0}s")]
    Timeout(u64),
}

/// 动作 trait：名称、描述（供模型理解）、参数 schema、异步执行
///
/// 动作是唯一允许修改 SharedContext 的途径。
#[async_trait]
pub trait Action: Send + Sync {
    /// 动作名称（模型调用时使用）
    fn name(&self) -> &str;

    /// 动作描述（供模型理解功能）
    fn description(&self) -> &str;

    /// 参数 JSON Schema；默认无参数
    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn invoke(&self, ctx: &mut SharedContext, args: Value) -> Result<Value, ActionError>;
}

/// 提供给模型的动作说明
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// 把 JSON 参数解析为动作自己的参数类型
pub fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ActionError> {
    // 模型偶尔给出 null 代表无参数
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args).map_err(|e| ActionError::InvalidArguments(e.to_string()))
}

/// 动作注册表：按名称存储 Arc<dyn Action>，支持 register / resolve / specs
#[derive(Default, Clone)]
pub struct ActionRegistry {
    actions: BTreeMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 同名动作只能注册一次
    pub fn register(&mut self, action: impl Action + 'static) -> Result<(), RegistryError> {
        let name = action.name().to_string();
        if self.actions.contains_key(&name) {
            return Err(RegistryError::DuplicateAction(name));
        }
        self.actions.insert(name, Arc::new(action));
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Action>, ActionError> {
        self.actions
            .get(name)
            .cloned()
            .ok_or_else(|| ActionError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn action_names(&self) -> Vec<String> {
        self.actions.keys().cloned().collect()
    }

    /// 按给定名称顺序生成动作说明；未注册的名称跳过
    pub fn specs_for(&self, names: &[String]) -> Vec<ActionSpec> {
        names
            .iter()
            .filter_map(|n| self.actions.get(n))
            .map(|a| ActionSpec {
                name: a.name().to_string(),
                description: a.description().to_string(),
                parameters: a.parameters_schema(),
            })
            .collect()
    }
}
