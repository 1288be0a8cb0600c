//! flight_status 动作：航班状态查询（只读）

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::memory::SharedContext;
use crate::tools::schema::args_schema;
use crate::tools::{parse_args, Action, ActionError};

#[derive(Deserialize, JsonSchema)]
struct FlightStatusArgs {
    /// 航班号；缺省时使用上下文中的航班
    flight_number: Option<String>,
}

pub struct FlightStatus;

#[async_trait]
impl Action for FlightStatus {
    fn name(&self) -> &str {
        "flight_status"
    }

    fn description(&self) -> &str {
        "Lookup status for a flight."
    }

    fn parameters_schema(&self) -> Value {
        args_schema::<FlightStatusArgs>()
    }

    async fn invoke(&self, ctx: &mut SharedContext, args: Value) -> Result<Value, ActionError> {
        let args: FlightStatusArgs = parse_args(args)?;
        let flight = args
            .flight_number
            .or_else(|| ctx.flight_number.clone())
            .ok_or_else(|| {
                ActionError::Rejected("Sorry, which flight number should I check?".to_string())
            })?;

        // 场景标记为 delayed 时返回延误信息
        let delayed = ctx.scenario.as_deref() == Some("delayed");
        Ok(serde_json::json!({
            "flight_number": flight,
            "status": if delayed { "delayed" } else { "on_time" },
            "gate": "A10",
            "message": if delayed {
                format!("Flight {flight} is delayed by about 3 hours; new departure gate A10.")
            } else {
                format!("Flight {flight} is on time and scheduled to depart at gate A10.")
            },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_falls_back_to_context_flight() {
        let mut ctx = SharedContext {
            flight_number: Some("FLT-777".into()),
            ..Default::default()
        };
        let out = FlightStatus.invoke(&mut ctx, Value::Null).await.unwrap();
        assert_eq!(out["flight_number"], "FLT-777");
        assert_eq!(out["status"], "on_time");
    }

    #[tokio::test]
    async fn test_delayed_scenario() {
        let mut ctx = SharedContext {
            scenario: Some("delayed".into()),
            ..Default::default()
        };
        let out = FlightStatus
            .invoke(&mut ctx, serde_json::json!({"flight_number": "FLT-1"}))
            .await
            .unwrap();
        assert_eq!(out["status"], "delayed");
    }

    #[tokio::test]
    async fn test_no_flight_known() {
        let mut ctx = SharedContext::default();
        assert!(FlightStatus.invoke(&mut ctx, Value::Null).await.is_err());
    }
}
