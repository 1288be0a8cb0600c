//! 客服服务门面：会话的创建 / 恢复、提交一轮、快照
//!
//! 同一会话的轮次串行执行（每个会话一把异步锁），不同会话互不阻塞。

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::core::{
    ConversationState, ConversationStore, Engine, EngineError, RecoveryAction, RecoveryEngine,
    TurnOutcome, TurnReport,
};
use crate::guardrails::SafetyCheckResult;
use crate::trace::Event;

/// 专员目录（供 UI 展示）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentSummary {
    pub name: String,
    pub description: String,
    pub handoffs: Vec<String>,
    pub tools: Vec<String>,
    pub input_guardrails: Vec<String>,
}

/// 会话快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationSnapshot {
    pub conversation_id: String,
    pub current_agent: String,
    pub context: BTreeMap<String, Value>,
    pub agents: Vec<AgentSummary>,
    pub events: Vec<Event>,
    pub guardrails: Vec<SafetyCheckResult>,
}

/// 一轮的对外响应
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatResponse {
    pub conversation_id: String,
    pub current_agent: String,
    pub messages: Vec<String>,
    pub events: Vec<Event>,
    pub outcome: TurnOutcome,
    pub context: BTreeMap<String, Value>,
    pub guardrails: Vec<SafetyCheckResult>,
}

pub struct AirlineDesk {
    engine: Engine,
    store: Arc<dyn ConversationStore>,
    recovery: RecoveryEngine,
    turn_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl AirlineDesk {
    pub fn new(engine: Engine, store: Arc<dyn ConversationStore>) -> Self {
        Self {
            engine,
            store,
            recovery: RecoveryEngine::new(),
            turn_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// 未给出 id 或 id 未知时创建新会话（新 id）；否则原样返回已有会话
    pub async fn start_or_resume(&self, conversation_id: Option<&str>) -> ConversationState {
        if let Some(id) = conversation_id {
            if let Some(state) = self.store.load(id).await {
                return state;
            }
            tracing::info!(conversation_id = id, "Unknown conversation, starting a new one");
        }
        let state = self.engine.start_conversation();
        self.store.save(state.clone()).await;
        state
    }

    async fn turn_lock(&self, id: &str) -> Arc<Mutex<()>> {
        self.turn_locks
            .lock()
            .await
            .entry(id.to_string())
            .or_default()
            .clone()
    }

    /// 提交一轮；成功或被拦截时保存状态，致命错误时保存上下文之外不提交任何内容
    pub async fn submit(
        &self,
        conversation_id: Option<&str>,
        message: &str,
    ) -> Result<ChatResponse, EngineError> {
        let id = self.start_or_resume(conversation_id).await.id;
        let lock = self.turn_lock(&id).await;
        let result = {
            let _guard = lock.lock().await;
            self.run_turn(&id, message).await
        };
        self.release_turn_lock(&id, lock).await;
        result
    }

    /// 没有其他轮次在等待时移除该会话的锁，映射表不随会话数增长
    async fn release_turn_lock(&self, id: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.turn_locks.lock().await;
        let idle = locks
            .get(id)
            .is_some_and(|held| Arc::ptr_eq(held, &lock) && Arc::strong_count(&lock) == 2);
        if idle {
            locks.remove(id);
        }
    }

    /// 当前仍持有锁条目的会话数
    pub async fn turn_lock_count(&self) -> usize {
        self.turn_locks.lock().await.len()
    }

    async fn run_turn(&self, id: &str, message: &str) -> Result<ChatResponse, EngineError> {
        // 加锁后重新读取，拿到上一轮提交后的状态
        let mut state = self
            .store
            .load(id)
            .await
            .ok_or_else(|| EngineError::ConversationNotFound(id.to_string()))?;

        match self.engine.submit_turn(&mut state, message).await {
            Ok(report) => {
                let response = self.respond(&state, report);
                self.store.save(state).await;
                Ok(response)
            }
            Err(e) => {
                // 动作对上下文的修改不回滚，其余字段（含 committed_context）保持上一轮提交的值，
                // 下一次完成的轮次会把这些修改作为 context_update 补报
                if let Some(mut committed) = self.store.load(id).await {
                    committed.context = state.context;
                    self.store.save(committed).await;
                }
                Err(e)
            }
        }
    }

    /// 用户可见的失败文案
    pub fn recover(&self, err: &EngineError) -> RecoveryAction {
        self.recovery.handle(err)
    }

    fn respond(&self, state: &ConversationState, report: TurnReport) -> ChatResponse {
        ChatResponse {
            conversation_id: state.id.clone(),
            current_agent: state.active_specialist.clone(),
            messages: report.replies().into_iter().map(String::from).collect(),
            events: report.events,
            outcome: report.outcome,
            context: state.context.public_view(),
            guardrails: state.safety_checks.clone(),
        }
    }

    pub fn agents(&self) -> Vec<AgentSummary> {
        self.engine
            .registry()
            .iter()
            .map(|s| AgentSummary {
                name: s.name.clone(),
                description: s.description.clone(),
                handoffs: s.target_names(),
                tools: s.actions.clone(),
                input_guardrails: s.safety_checks.clone(),
            })
            .collect()
    }

    pub async fn snapshot(&self, conversation_id: &str) -> Result<ConversationSnapshot, EngineError> {
        let state = self
            .store
            .load(conversation_id)
            .await
            .ok_or_else(|| EngineError::ConversationNotFound(conversation_id.to_string()))?;
        Ok(self.snapshot_of(&state))
    }

    /// 新会话的快照（UI 首次加载）
    pub async fn bootstrap(&self) -> ConversationSnapshot {
        let state = self.start_or_resume(None).await;
        self.snapshot_of(&state)
    }

    fn snapshot_of(&self, state: &ConversationState) -> ConversationSnapshot {
        ConversationSnapshot {
            conversation_id: state.id.clone(),
            current_agent: state.active_specialist.clone(),
            context: state.context.public_view(),
            agents: self.agents(),
            events: state.events.clone(),
            guardrails: state.safety_checks.clone(),
        }
    }
}
