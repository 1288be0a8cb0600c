//! 专员执行循环
//!
//! 渲染指令 -> 调用模型 -> 按顺序处理条目（消息 / 动作调用 / 转接）-> 有调用或转接则继续下一步。
//! 每轮最多一次转接：转接后不再向新专员提供转接目标，再次请求转接即为致命错误。

use std::sync::Arc;

use crate::core::EngineError;
use crate::llm::{GenerateRequest, ModelCapability, TransferSpec};
use crate::memory::{Item, SharedContext};
use crate::specialists::{Specialist, SpecialistRegistry};
use crate::tools::{ActionError, ActionExecutor, ActionOutcome};
use crate::trace::TurnArtifact;

/// 单轮内最大模型调用次数的默认值，防止死循环
pub const DEFAULT_MAX_STEPS: usize = 10;

/// 一轮专员执行的结果（尚未提交到会话）
#[derive(Debug, Clone, PartialEq)]
pub struct TurnRun {
    pub artifacts: Vec<TurnArtifact>,
    /// 本轮新增的对话条目（含用户消息）
    pub new_items: Vec<Item>,
    pub final_specialist: String,
}

/// 专员循环：持有注册表、动作执行器与模型
#[derive(Clone)]
pub struct SpecialistLoop {
    registry: Arc<SpecialistRegistry>,
    executor: ActionExecutor,
    model: Arc<dyn ModelCapability>,
    max_steps: usize,
}

impl SpecialistLoop {
    pub fn new(
        registry: Arc<SpecialistRegistry>,
        executor: ActionExecutor,
        model: Arc<dyn ModelCapability>,
    ) -> Self {
        Self {
            registry,
            executor,
            model,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    fn specialist(&self, name: &str) -> Result<&Specialist, EngineError> {
        self.registry
            .get(name)
            .ok_or_else(|| EngineError::UnknownSpecialist(name.to_string()))
    }

    fn transfer_specs(&self, specialist: &Specialist) -> Vec<TransferSpec> {
        specialist
            .transfers
            .iter()
            .filter_map(|e| self.registry.get(&e.target))
            .map(|t| TransferSpec {
                name: t.name.clone(),
                description: t.description.clone(),
            })
            .collect()
    }

    /// 以 active 为起点执行一轮；ctx 原地修改（不回滚）
    pub async fn run(
        &self,
        active: &str,
        history: &[Item],
        user_message: &str,
        ctx: &mut SharedContext,
    ) -> Result<TurnRun, EngineError> {
        let mut working = history.to_vec();
        let committed = working.len();
        working.push(Item::user(user_message));

        let mut artifacts = Vec::new();
        let mut current = active.to_string();
        let mut transferred = false;

        for step in 0..self.max_steps {
            let specialist = self.specialist(&current)?;
            let instructions = specialist.render(ctx);
            let actions = self.executor.specs_for(&specialist.actions);
            let transfers = if transferred {
                Vec::new()
            } else {
                self.transfer_specs(specialist)
            };

            let request = GenerateRequest {
                specialist: &specialist.name,
                instructions: &instructions,
                transcript: &working,
                actions: &actions,
                transfers: &transfers,
            };
            let response = self.model.generate(&request).await?;
            response.validate()?;
            tracing::debug!(specialist = %current, step, items = response.items.len(), "specialist step");

            let mut continues = false;
            for item in response.items {
                match item {
                    Item::Message { role, content } => {
                        artifacts.push(TurnArtifact::Message {
                            agent: current.clone(),
                            content: content.clone(),
                        });
                        working.push(Item::Message { role, content });
                    }
                    Item::ActionInvocation {
                        call_id,
                        name,
                        arguments,
                    } => {
                        continues = true;
                        artifacts.push(TurnArtifact::Invocation {
                            agent: current.clone(),
                            call_id: call_id.clone(),
                            name: name.clone(),
                            arguments: arguments.clone(),
                        });
                        working.push(Item::ActionInvocation {
                            call_id: call_id.clone(),
                            name: name.clone(),
                            arguments: arguments.clone(),
                        });

                        let outcome = if specialist.binds(&name) {
                            self.executor.execute(&name, arguments, ctx).await
                        } else {
                            tracing::warn!(specialist = %current, action = %name, "Action not bound to specialist");
                            ActionOutcome::from_result(Err(ActionError::NotFound(name.clone())))
                        };
                        artifacts.push(TurnArtifact::Result {
                            agent: current.clone(),
                            call_id: call_id.clone(),
                            name: name.clone(),
                            output: outcome.output.clone(),
                            is_error: outcome.is_error,
                        });
                        working.push(Item::ActionResult {
                            call_id,
                            name,
                            output: outcome.output,
                        });
                    }
                    Item::TransferRequest { target } => {
                        if transferred {
                            return Err(EngineError::TransferLimitExceeded {
                                from: current,
                                target,
                            });
                        }
                        let edge = specialist.edge(&target).ok_or_else(|| {
                            EngineError::TransferConfiguration {
                                from: current.clone(),
                                target: target.clone(),
                            }
                        })?;
                        let hook = match &edge.on_transfer {
                            Some(id) => {
                                let hook = self.registry.hook(id).ok_or_else(|| {
                                    EngineError::TransferConfiguration {
                                        from: current.clone(),
                                        target: target.clone(),
                                    }
                                })?;
                                (hook.apply)(ctx);
                                Some(hook.name.to_string())
                            }
                            None => None,
                        };
                        tracing::info!(from = %current, to = %target, hook = ?hook, "transfer");

                        artifacts.push(TurnArtifact::Transfer {
                            from: current.clone(),
                            to: target.clone(),
                            hook,
                        });
                        working.push(Item::transfer(target.clone()));
                        current = target;
                        transferred = true;
                        continues = true;
                        // 转接之后的条目属于旧专员，丢弃
                        break;
                    }
                    Item::ActionResult { name, .. } => {
                        return Err(EngineError::Capability(
                            crate::llm::CapabilityError::MalformedOutput(format!(
                                "unexpected action result for '{name}'"
                            )),
                        ));
                    }
                }
            }

            if !continues {
                return Ok(TurnRun {
                    artifacts,
                    new_items: working.split_off(committed),
                    final_specialist: current,
                });
            }
        }

        Err(EngineError::StepLimitExceeded(self.max_steps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guardrails::SafetyPipeline;
    use crate::llm::{ModelResponse, ScriptedModel};
    use crate::specialists::airline_hooks;
    use crate::specialists::airline::{airline_actions, airline_specialists, CANCELLATION, TRIAGE};
    use serde_json::json;

    fn airline_loop(model: Arc<ScriptedModel>) -> SpecialistLoop {
        // 测试里不挂安全检查
        let specialists = airline_specialists()
            .into_iter()
            .map(|mut s| {
                s.safety_checks.clear();
                s
            })
            .collect();
        let actions = airline_actions().unwrap();
        let registry = SpecialistRegistry::build(
            specialists,
            TRIAGE,
            airline_hooks(),
            &actions,
            &SafetyPipeline::default(),
        )
        .unwrap();
        SpecialistLoop::new(Arc::new(registry), ActionExecutor::new(actions, 5), model)
    }

    #[tokio::test]
    async fn test_final_message_ends_turn() {
        let model = Arc::new(ScriptedModel::new().respond(ModelResponse::message("Hello!")));
        let run = airline_loop(model.clone())
            .run(TRIAGE, &[], "hi", &mut SharedContext::default())
            .await
            .unwrap();
        assert_eq!(run.final_specialist, TRIAGE);
        assert_eq!(run.new_items, vec![Item::user("hi"), Item::assistant("Hello!")]);
        assert_eq!(model.requests()[0].transfer_targets.len(), 6);
    }

    #[tokio::test]
    async fn test_transfer_discards_rest_and_hides_targets() {
        let model = Arc::new(
            ScriptedModel::new()
                .respond_items(vec![Item::transfer(CANCELLATION), Item::assistant("ignored")])
                .respond(ModelResponse::message("Let me help you cancel.")),
        );
        let mut ctx = SharedContext::default();
        let run = airline_loop(model.clone())
            .run(TRIAGE, &[], "cancel please", &mut ctx)
            .await
            .unwrap();
        assert_eq!(run.final_specialist, CANCELLATION);
        assert!(ctx.confirmation_number.is_some());
        let requests = model.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].transfer_targets.is_empty());
        assert!(requests[1].instructions.contains(ctx.confirmation_number.as_deref().unwrap()));
        assert!(!run
            .artifacts
            .iter()
            .any(|a| matches!(a, TurnArtifact::Message { content, .. } if content == "ignored")));
    }

    #[tokio::test]
    async fn test_second_transfer_is_fatal() {
        let model = Arc::new(
            ScriptedModel::new()
                .respond_items(vec![Item::transfer(CANCELLATION)])
                .respond_items(vec![Item::transfer(TRIAGE)]),
        );
        let err = airline_loop(model)
            .run(TRIAGE, &[], "cancel", &mut SharedContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::TransferLimitExceeded { .. }));
    }

    #[tokio::test]
    async fn test_undeclared_target_is_configuration_error() {
        let model = Arc::new(ScriptedModel::new().respond_items(vec![Item::transfer(CANCELLATION)]));
        let err = airline_loop(model)
            .run(crate::specialists::airline::FAQ, &[], "cancel", &mut SharedContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::TransferConfiguration { .. }));
    }

    #[tokio::test]
    async fn test_unbound_action_is_recoverable() {
        let model = Arc::new(
            ScriptedModel::new()
                .respond_items(vec![Item::invoke("cancel_flight", json!({}))])
                .respond(ModelResponse::message("I can't do that here.")),
        );
        let run = airline_loop(model)
            .run(TRIAGE, &[], "cancel", &mut SharedContext::default())
            .await
            .unwrap();
        assert!(run.artifacts.iter().any(|a| matches!(
            a,
            TurnArtifact::Result { is_error: true, output, .. } if output["error"].as_str().unwrap().contains("cancel_flight")
        )));
    }

    #[tokio::test]
    async fn test_step_limit() {
        let mut model = ScriptedModel::new();
        for _ in 0..5 {
            model = model.respond_items(vec![Item::invoke("faq_lookup", json!({"question": "wifi"}))]);
        }
        let err = airline_loop(Arc::new(model))
            .with_max_steps(3)
            .run(crate::specialists::airline::FAQ, &[], "wifi?", &mut SharedContext::default())
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::StepLimitExceeded(3));
    }

    #[tokio::test]
    async fn test_capability_error_propagates() {
        let model = Arc::new(
            ScriptedModel::new().respond_error(crate::llm::CapabilityError::Timeout(30)),
        );
        let err = airline_loop(model)
            .run(TRIAGE, &[], "hi", &mut SharedContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Capability(_)));
    }

    #[tokio::test]
    async fn test_unknown_active_specialist() {
        let model = Arc::new(ScriptedModel::new());
        let err = airline_loop(model)
            .run("Ghost Agent", &[], "hi", &mut SharedContext::default())
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::UnknownSpecialist("Ghost Agent".into()));
    }
}
