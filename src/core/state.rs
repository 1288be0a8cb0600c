//! 会话状态
//!
//! 每个会话独占：滚动对话、共享上下文（及其基线）、当前专员、完整事件日志、最近一轮的安全检查结果。

use serde::{Deserialize, Serialize};

use crate::guardrails::SafetyCheckResult;
use crate::memory::{SharedContext, Transcript};
use crate::trace::Event;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub id: String,
    pub transcript: Transcript,
    pub context: SharedContext,
    /// 会话创建时的上下文；从它回放全部 context_update 可得到当前上下文
    pub baseline_context: SharedContext,
    /// 上一次提交事件时的上下文；下一轮的 context_update 以它为基准，
    /// 致命轮次遗留的修改因此会在下一次完成的轮次中补报
    pub committed_context: SharedContext,
    pub active_specialist: String,
    pub events: Vec<Event>,
    /// 只保留最近一轮
    pub safety_checks: Vec<SafetyCheckResult>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ConversationState {
    pub fn new(entry_specialist: &str, max_transcript_items: usize, context: SharedContext) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            transcript: Transcript::new(max_transcript_items),
            baseline_context: context.clone(),
            committed_context: context.clone(),
            context,
            active_specialist: entry_specialist.to_string(),
            events: Vec::new(),
            safety_checks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp_millis();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_state() {
        let s = ConversationState::new("Triage Agent", 10, SharedContext::default());
        assert_eq!(s.active_specialist, "Triage Agent");
        assert!(s.transcript.is_empty());
        assert!(s.events.is_empty());
        assert_eq!(s.context, s.baseline_context);
        assert_eq!(s.context, s.committed_context);
        assert_eq!(s.context, SharedContext::default());
        assert_ne!(
            s.id,
            ConversationState::new("Triage Agent", 10, SharedContext::default()).id
        );
    }

    #[test]
    fn test_seeded_state_keeps_baseline() {
        let s = ConversationState::new("Triage Agent", 10, SharedContext::initial());
        assert_eq!(s.context.account_number.as_deref().map(str::len), Some(8));
        assert_eq!(s.context, s.baseline_context);
    }
}
