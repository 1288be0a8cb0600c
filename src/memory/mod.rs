//! 记忆层：共享上下文（专员共用字段）与滚动对话

pub mod context;
pub mod conversation;

pub use context::{fill_if_absent, ContextChanges, SharedContext};
pub use conversation::{Item, Role, Transcript};
