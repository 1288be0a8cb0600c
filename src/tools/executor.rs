//! 动作执行器
//!
//! 持有 ActionRegistry 与全局超时，execute(name, args) 在超时内调用动作，
//! 失败或超时时转为错误载荷（本轮继续）；每次调用输出结构化审计日志（JSON）。

use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::time::timeout;

use crate::memory::SharedContext;
use crate::tools::{ActionError, ActionRegistry, ActionSpec};

/// 一次动作调用的结果：成功输出或描述错误的载荷
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub output: Value,
    pub is_error: bool,
}

impl ActionOutcome {
    pub fn from_result(result: Result<Value, ActionError>) -> Self {
        match result {
            Ok(output) => Self {
                output,
                is_error: false,
            },
            Err(e) => Self {
                output: serde_json::json!({ "error": e.to_string() }),
                is_error: true,
            },
        }
    }
}

/// 动作执行器：对每次调用施加超时，并把 ActionError 收敛为结果载荷
#[derive(Clone)]
pub struct ActionExecutor {
    registry: ActionRegistry,
    timeout: Duration,
}

impl ActionExecutor {
    pub fn new(registry: ActionRegistry, timeout_secs: u64) -> Self {
        Self {
            registry,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// 执行指定动作；未知动作、参数错误、动作拒绝与超时都只会产生错误载荷
    pub async fn execute(&self, name: &str, args: Value, ctx: &mut SharedContext) -> ActionOutcome {
        let start = Instant::now();
        let args_preview = args_preview(&args);

        let result = match self.registry.resolve(name) {
            Ok(action) => match timeout(self.timeout, action.invoke(ctx, args)).await {
                Ok(r) => r,
                Err(_) => Err(ActionError::Timeout(self.timeout.as_secs())),
            },
            Err(e) => Err(e),
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(ActionError::Timeout(_)) => "timeout",
            Err(ActionError::NotFound(_)) => "not_found",
            Err(_) => "error",
        };
        let audit = serde_json::json!({
            "event": "action_audit",
            "action": name,
            "ok": result.is_ok(),
            "outcome": outcome,
            "duration_ms": start.elapsed().as_millis() as u64,
            "args_preview": args_preview,
        });
        tracing::info!(audit = %audit.to_string(), "action");

        ActionOutcome::from_result(result)
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn specs_for(&self, names: &[String]) -> Vec<ActionSpec> {
        self.registry.specs_for(names)
    }
}

fn args_preview(args: &Value) -> String {
    let s = args.to_string();
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::Action;
    use async_trait::async_trait;

    struct Slow;

    #[async_trait]
    impl Action for Slow {
        fn name(&self) -> &str {
            "slow"
        }

        fn description(&self) -> &str {
            "never finishes in time"
        }

        async fn invoke(&self, _ctx: &mut SharedContext, _args: Value) -> Result<Value, ActionError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Value::Null)
        }
    }

    struct Refuse;

    #[async_trait]
    impl Action for Refuse {
        fn name(&self) -> &str {
            "refuse"
        }

        fn description(&self) -> &str {
            "always refuses"
        }

        async fn invoke(&self, _ctx: &mut SharedContext, _args: Value) -> Result<Value, ActionError> {
            Err(ActionError::Rejected("Sorry, I can't do that.".into()))
        }
    }

    #[tokio::test]
    async fn test_unknown_action_is_error_payload() {
        let exec = ActionExecutor::new(ActionRegistry::new(), 1);
        let mut ctx = SharedContext::default();
        let out = exec.execute("ghost", Value::Null, &mut ctx).await;
        assert!(out.is_error);
        assert!(out.output["error"].as_str().unwrap().contains("ghost"));
    }

    #[tokio::test]
    async fn test_rejection_message_is_surfaced() {
        let mut reg = ActionRegistry::new();
        reg.register(Refuse).unwrap();
        let exec = ActionExecutor::new(reg, 1);
        let out = exec.execute("refuse", Value::Null, &mut SharedContext::default()).await;
        assert!(out.is_error);
        assert_eq!(out.output["error"], "Sorry, I can't do that.");
    }

    #[tokio::test]
    async fn test_timeout_becomes_error_payload() {
        let mut reg = ActionRegistry::new();
        reg.register(Slow).unwrap();
        let exec = ActionExecutor::new(reg, 1);
        let out = exec.execute("slow", Value::Null, &mut SharedContext::default()).await;
        assert!(out.is_error);
        assert!(out.output["error"].as_str().unwrap().contains("timed out"));
    }

    #[test]
    fn test_args_preview_truncates() {
        let long = Value::from("x".repeat(500));
        assert!(args_preview(&long).ends_with("..."));
    }
}
