//! 核心编排层：错误与恢复、会话状态、编排引擎、会话存储、服务门面

pub mod engine;
pub mod error;
pub mod recovery;
pub mod service;
pub mod state;
pub mod store;

pub use engine::{Engine, TurnOutcome, TurnReport};
pub use error::{EngineError, RecoveryAction, RegistryError};
pub use recovery::{RecoveryEngine, GENERIC_FAILURE_MESSAGE};
pub use service::{AgentSummary, AirlineDesk, ChatResponse, ConversationSnapshot};
pub use state::ConversationState;
pub use store::{ConversationStore, MemoryConversationStore};
