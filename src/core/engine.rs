//! 编排引擎
//!
//! 一轮：安全检查（当前专员声明的检查，只看最新用户消息）-> 专员循环 -> 事件记录 -> 提交。
//! 对话、事件、当前专员与安全检查结果只在本轮完成（或被拦截）时提交；
//! 共享上下文由动作与钩子原地修改，致命错误时不回滚。

use std::sync::Arc;

use serde::Serialize;
use tracing::Instrument;

use crate::config::AppConfig;
use crate::core::{ConversationState, EngineError, RegistryError};
use crate::guardrails::{ModelJudgedCheck, PipelineOutcome, SafetyPipeline};
use crate::llm::ModelCapability;
use crate::memory::{Item, SharedContext};
use crate::react::SpecialistLoop;
use crate::specialists::airline::{airline_actions, airline_specialists};
use crate::specialists::{airline_hooks, SpecialistRegistry};
use crate::tools::ActionExecutor;
use crate::trace::{Event, EventKind, EventRecorder};

/// 一轮的结局
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TurnOutcome {
    Completed { final_specialist: String },
    /// 安全检查拦截：不执行专员，只返回固定拒答
    Tripped { failed_check: String, refusal: String },
}

/// submit_turn 的返回：本轮新事件与结局；更新后的状态即传入的 &mut ConversationState
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnReport {
    pub events: Vec<Event>,
    pub outcome: TurnOutcome,
}

impl TurnReport {
    /// 本轮展示给用户的文本
    pub fn replies(&self) -> Vec<&str> {
        match &self.outcome {
            TurnOutcome::Tripped { refusal, .. } => vec![refusal.as_str()],
            TurnOutcome::Completed { .. } => self
                .events
                .iter()
                .filter_map(|e| match &e.kind {
                    EventKind::Message { content } => Some(content.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }

    pub fn is_tripped(&self) -> bool {
        matches!(self.outcome, TurnOutcome::Tripped { .. })
    }
}

pub struct Engine {
    registry: Arc<SpecialistRegistry>,
    pipeline: SafetyPipeline,
    specialist_loop: SpecialistLoop,
    max_transcript_items: usize,
    refusal_message: String,
    seed_demo_context: bool,
}

impl Engine {
    pub fn new(
        registry: Arc<SpecialistRegistry>,
        pipeline: SafetyPipeline,
        executor: ActionExecutor,
        model: Arc<dyn ModelCapability>,
    ) -> Self {
        let defaults = AppConfig::default();
        Self {
            specialist_loop: SpecialistLoop::new(registry.clone(), executor, model)
                .with_max_steps(defaults.engine.max_steps_per_turn),
            registry,
            pipeline,
            max_transcript_items: defaults.engine.max_transcript_items,
            refusal_message: defaults.safety.refusal_message,
            seed_demo_context: defaults.engine.seed_demo_context,
        }
    }

    /// 按配置组装航空客服：动作、钩子、两个模型判定的安全检查与专员配置表
    pub fn airline(cfg: &AppConfig, model: Arc<dyn ModelCapability>) -> Result<Self, RegistryError> {
        let actions = airline_actions()?;
        let mut pipeline = SafetyPipeline::new(cfg.safety.policy);
        pipeline.register(ModelJudgedCheck::relevance(model.clone()));
        pipeline.register(ModelJudgedCheck::jailbreak(model.clone()));

        let registry = SpecialistRegistry::build(
            airline_specialists(),
            &cfg.app.entry_specialist,
            airline_hooks(),
            &actions,
            &pipeline,
        )?;
        let executor = ActionExecutor::new(actions, cfg.engine.action_timeout_secs);

        Ok(Self::new(Arc::new(registry), pipeline, executor, model)
            .with_max_steps(cfg.engine.max_steps_per_turn)
            .with_max_transcript_items(cfg.engine.max_transcript_items)
            .with_refusal_message(cfg.safety.refusal_message.clone())
            .with_seed_demo_context(cfg.engine.seed_demo_context))
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.specialist_loop = self.specialist_loop.with_max_steps(max_steps);
        self
    }

    pub fn with_max_transcript_items(mut self, max: usize) -> Self {
        self.max_transcript_items = max;
        self
    }

    pub fn with_refusal_message(mut self, message: impl Into<String>) -> Self {
        self.refusal_message = message.into();
        self
    }

    pub fn with_seed_demo_context(mut self, seed: bool) -> Self {
        self.seed_demo_context = seed;
        self
    }

    pub fn registry(&self) -> &SpecialistRegistry {
        &self.registry
    }

    pub fn pipeline(&self) -> &SafetyPipeline {
        &self.pipeline
    }

    /// 新会话：入口专员、空对话；上下文为空，或按配置预填演示乘客
    pub fn start_conversation(&self) -> ConversationState {
        let context = if self.seed_demo_context {
            SharedContext::initial()
        } else {
            SharedContext::default()
        };
        ConversationState::new(self.registry.entry(), self.max_transcript_items, context)
    }

    /// 执行恰好一轮
    pub async fn submit_turn(
        &self,
        state: &mut ConversationState,
        user_message: &str,
    ) -> Result<TurnReport, EngineError> {
        let span = tracing::info_span!("turn", conversation_id = %state.id);
        self.submit_turn_inner(state, user_message)
            .instrument(span)
            .await
    }

    async fn submit_turn_inner(
        &self,
        state: &mut ConversationState,
        user_message: &str,
    ) -> Result<TurnReport, EngineError> {
        let specialist = self
            .registry
            .get(&state.active_specialist)
            .ok_or_else(|| EngineError::UnknownSpecialist(state.active_specialist.clone()))?;

        let checks = self
            .pipeline
            .run(&specialist.safety_checks, user_message, &state.context)
            .await;

        let results = match checks {
            PipelineOutcome::Tripped {
                failed_check,
                results,
            } => {
                state.transcript.push(Item::user(user_message));
                state.transcript.push(Item::assistant(self.refusal_message.clone()));
                state.safety_checks = results;
                state.touch();
                return Ok(TurnReport {
                    events: Vec::new(),
                    outcome: TurnOutcome::Tripped {
                        failed_check,
                        refusal: self.refusal_message.clone(),
                    },
                });
            }
            PipelineOutcome::Passed(results) => results,
        };

        let before = state.committed_context.clone();
        let run = self
            .specialist_loop
            .run(
                &state.active_specialist,
                state.transcript.items(),
                user_message,
                &mut state.context,
            )
            .await
            .map_err(|e| {
                tracing::error!(error = %e, specialist = %state.active_specialist, "Turn aborted");
                e
            })?;

        let (events, final_specialist) =
            EventRecorder::record(&run.artifacts, &state.active_specialist, &before, &state.context);

        state.committed_context = state.context.clone();
        state.transcript.extend(run.new_items);
        state.events.extend(events.iter().cloned());
        state.active_specialist = final_specialist.clone();
        state.safety_checks = results;
        state.touch();

        Ok(TurnReport {
            events,
            outcome: TurnOutcome::Completed { final_specialist },
        })
    }
}
