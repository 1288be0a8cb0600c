//! 引擎错误类型与恢复动作
//!
//! ActionError 在轮内消化，安全检查触发是正常返回路径；这里只定义会逃出 submit_turn 的致命错误，
//! 以及专员配置表加载时的校验错误。

use thiserror::Error;

use crate::llm::CapabilityError;

/// 专员配置表不合法：进程启动时即失败
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Duplicate specialist: {0}")]
    DuplicateSpecialist(String),

    #[error("Duplicate action: {0}")]
    DuplicateAction(String),

    #[error("Entry specialist not defined: {0}")]
    MissingEntry(String),

    #[error("Specialist '{from}' transfers to unknown specialist '{target}'")]
    UnknownTarget { from: String, target: String },

    #[error("Specialist '{from}' uses unknown transfer hook '{hook}'")]
    UnknownHook { from: String, hook: String },

    #[error("Specialist '{specialist}' binds unregistered action '{action}'")]
    UnknownAction { specialist: String, action: String },

    #[error("Specialist '{specialist}' uses unknown safety check '{check}'")]
    UnknownSafetyCheck { specialist: String, check: String },

    #[error("Specialist '{0}' has no transfer path back to the entry specialist")]
    EntryUnreachable(String),
}

/// 致命的单轮错误：本轮不产生任何事件，调用方可重试整轮
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Specialist '{from}' is not permitted to transfer to '{target}'")]
    TransferConfiguration { from: String, target: String },

    #[error("Unknown specialist: {0}")]
    UnknownSpecialist(String),

    #[error("Only one transfer is allowed per turn ('{from}' requested '{target}')")]
    TransferLimitExceeded { from: String, target: String },

    #[error("Specialist loop exceeded {0} steps")]
    StepLimitExceeded(usize),

    #[error("Model capability failed: {0}")]
    Capability(#[from] CapabilityError),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),
}

/// 恢复引擎根据错误类型给出的建议动作
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryAction {
    /// 基础设施错误：用户可重试整轮
    RetryTurn(String),
    /// 配置错误：重试无意义，需运维介入
    Abort(String),
}

impl RecoveryAction {
    /// 展示给用户的文案
    pub fn user_message(&self) -> &str {
        match self {
            RecoveryAction::RetryTurn(m) | RecoveryAction::Abort(m) => m,
        }
    }
}
