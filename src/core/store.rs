//! 会话存储抽象层
//!
//! 引擎只需要按会话 id 读写；持久化实现不在本 crate 内，默认提供内存实现。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::core::ConversationState;

/// 会话存储接口
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn load(&self, id: &str) -> Option<ConversationState>;

    async fn save(&self, state: ConversationState);
}

/// 内存会话存储
#[derive(Default)]
pub struct MemoryConversationStore {
    conversations: RwLock<HashMap<String, ConversationState>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn load(&self, id: &str) -> Option<ConversationState> {
        self.conversations.read().await.get(id).cloned()
    }

    async fn save(&self, state: ConversationState) {
        self.conversations.write().await.insert(state.id.clone(), state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_then_load() {
        let store = MemoryConversationStore::new();
        let state = ConversationState::new("Triage Agent", 0, Default::default());
        let id = state.id.clone();
        assert!(store.load(&id).await.is_none());
        store.save(state).await;
        assert_eq!(store.load(&id).await.unwrap().id, id);
        assert_eq!(store.len().await, 1);
    }
}
