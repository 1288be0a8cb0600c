//! 滚动对话：模型可消费的条目序列
//!
//! 每条 Item 是 user / assistant 消息、动作调用、动作结果或转接请求之一；
//! 超出保留上限时丢弃最旧的条目。

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 消息角色（与 LLM API 一致）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// 对话条目
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Item {
    Message {
        role: Role,
        content: String,
    },
    ActionInvocation {
        call_id: String,
        name: String,
        arguments: Value,
    },
    ActionResult {
        call_id: String,
        name: String,
        output: Value,
    },
    TransferRequest {
        target: String,
    },
}

impl Item {
    pub fn user(content: impl Into<String>) -> Self {
        Item::Message {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Item::Message {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// 由模型发起的动作调用；call_id 自动生成
    pub fn invoke(name: impl Into<String>, arguments: Value) -> Self {
        Item::ActionInvocation {
            call_id: format!("call_{}", uuid::Uuid::new_v4().simple()),
            name: name.into(),
            arguments,
        }
    }

    pub fn transfer(target: impl Into<String>) -> Self {
        Item::TransferRequest {
            target: target.into(),
        }
    }

    pub fn is_user_message(&self) -> bool {
        matches!(self, Item::Message { role: Role::User, .. })
    }
}

/// 滚动对话：保留最近 max_items 条（0 表示不限）
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Transcript {
    items: Vec<Item>,
    max_items: usize,
}

impl Transcript {
    pub fn new(max_items: usize) -> Self {
        Self {
            items: Vec::new(),
            max_items,
        }
    }

    pub fn push(&mut self, item: Item) {
        self.items.push(item);
        self.prune();
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = Item>) {
        self.items.extend(items);
        self.prune();
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// 最近一条用户消息
    pub fn latest_user_message(&self) -> Option<&str> {
        self.items.iter().rev().find_map(|i| match i {
            Item::Message {
                role: Role::User,
                content,
            } => Some(content.as_str()),
            _ => None,
        })
    }

    /// 超出上限时丢弃最旧的条目；尽量从一条用户消息开始，避免孤立的动作结果
    fn prune(&mut self) {
        if self.max_items == 0 || self.items.len() <= self.max_items {
            return;
        }
        let mut cut = self.items.len() - self.max_items;
        while cut < self.items.len() && !self.items[cut].is_user_message() {
            cut += 1;
        }
        if cut == self.items.len() {
            cut = self.items.len() - self.max_items;
        }
        self.items.drain(..cut);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
