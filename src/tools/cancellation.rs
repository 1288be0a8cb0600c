//! cancel_flight 动作：取消当前订单对应的航班

use async_trait::async_trait;
use serde_json::Value;

use crate::memory::SharedContext;
use crate::tools::{Action, ActionError};

/// 取消航班：依赖上下文中的确认码与航班号（通常由转接钩子补齐）
pub struct CancelFlight;

#[async_trait]
impl Action for CancelFlight {
    fn name(&self) -> &str {
        "cancel_flight"
    }

    fn description(&self) -> &str {
        "Cancel the flight for the booking currently in context."
    }

    async fn invoke(&self, ctx: &mut SharedContext, _args: Value) -> Result<Value, ActionError> {
        let (Some(code), Some(flight)) = (&ctx.confirmation_number, &ctx.flight_number) else {
            return Err(ActionError::Rejected(
                "Sorry, I need your confirmation number before I can cancel a flight.".to_string(),
            ));
        };
        Ok(Value::from(format!(
            "Flight {flight} successfully cancelled for confirmation number {code}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancel_reads_context_without_mutation() {
        let mut ctx = SharedContext {
            confirmation_number: Some("LL0EZ6".into()),
            flight_number: Some("FLT-476".into()),
            ..Default::default()
        };
        let before = ctx.clone();
        let out = CancelFlight.invoke(&mut ctx, Value::Null).await.unwrap();
        assert!(out.as_str().unwrap().contains("FLT-476"));
        assert_eq!(ctx, before);
    }

    #[tokio::test]
    async fn test_cancel_without_booking() {
        let err = CancelFlight
            .invoke(&mut SharedContext::default(), Value::Null)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("confirmation number"));
    }
}
