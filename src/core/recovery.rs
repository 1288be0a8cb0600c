//! 错误恢复引擎
//!
//! 根据 EngineError 返回 RecoveryAction：基础设施错误建议重试整轮，配置错误直接终止。
//! 两者对用户都只展示通用文案，详细原因写入运维日志。

use crate::core::{EngineError, RecoveryAction};

pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong, please retry.";

#[derive(Debug, Default, Clone, Copy)]
pub struct RecoveryEngine;

impl RecoveryEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, err: &EngineError) -> RecoveryAction {
        tracing::error!(error = %err, "Turn failed");
        match err {
            EngineError::Capability(_)
            | EngineError::StepLimitExceeded(_)
            | EngineError::TransferLimitExceeded { .. }
            | EngineError::ConversationNotFound(_) => {
                RecoveryAction::RetryTurn(GENERIC_FAILURE_MESSAGE.to_string())
            }
            EngineError::TransferConfiguration { .. } | EngineError::UnknownSpecialist(_) => {
                RecoveryAction::Abort(GENERIC_FAILURE_MESSAGE.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::CapabilityError;

    #[test]
    fn test_capability_error_is_retryable() {
        let action = RecoveryEngine::new().handle(&EngineError::Capability(CapabilityError::Timeout(30)));
        assert!(matches!(action, RecoveryAction::RetryTurn(_)));
        assert_eq!(action.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_configuration_error_aborts() {
        let err = EngineError::TransferConfiguration {
            from: "FAQ Agent".into(),
            target: "Cancellation Agent".into(),
        };
        let action = RecoveryEngine::new().handle(&err);
        assert!(matches!(action, RecoveryAction::Abort(_)));
        // 用户看不到内部细节
        assert!(!action.user_message().contains("FAQ"));
    }

    #[test]
    fn test_step_limit_is_retryable() {
        let action = RecoveryEngine::new().handle(&EngineError::StepLimitExceeded(10));
        assert!(matches!(action, RecoveryAction::RetryTurn(_)));
    }
}
