//! 事件：一轮执行的规范化记录，供 UI 渲染与回放
//!
//! 公共字段为 id、agent、timestamp（毫秒）；具体内容按 type 区分。

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::memory::ContextChanges;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    Message {
        content: String,
    },
    Transfer {
        from: String,
        to: String,
    },
    ActionInvocation {
        call_id: String,
        tool: String,
        args: Value,
    },
    ActionResult {
        call_id: String,
        tool: String,
        output: Value,
        is_error: bool,
    },
    ContextUpdate {
        changes: ContextChanges,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    /// 产生该事件的专员
    pub agent: String,
    pub timestamp: i64,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    pub fn new(agent: impl Into<String>, kind: EventKind) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            agent: agent.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            kind,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind {
            EventKind::Message { .. } => "message",
            EventKind::Transfer { .. } => "transfer",
            EventKind::ActionInvocation { .. } => "action_invocation",
            EventKind::ActionResult { .. } => "action_result",
            EventKind::ContextUpdate { .. } => "context_update",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape_is_flat_and_tagged() {
        let ev = Event::new(
            "Triage Agent",
            EventKind::Transfer {
                from: "Triage Agent".into(),
                to: "FAQ Agent".into(),
            },
        );
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "transfer");
        assert_eq!(json["agent"], "Triage Agent");
        assert_eq!(json["to"], "FAQ Agent");
        assert_eq!(json["id"].as_str().unwrap().len(), 32);

        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, ev);
        assert_eq!(back.type_name(), "transfer");
    }
}
