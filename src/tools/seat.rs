//! 座位相关动作：update_seat（改座）与 display_seat_map（展示座位图）

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::memory::SharedContext;
use crate::tools::schema::args_schema;
use crate::tools::{parse_args, Action, ActionError};

/// 行号 1-40，列 A-F，如 12A
fn seat_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^([1-9]|[1-3][0-9]|40)[A-F]$").ok())
        .as_ref()
}

pub fn is_valid_seat(seat: &str) -> bool {
    seat_pattern().is_some_and(|p| p.is_match(seat))
}

#[derive(Deserialize, JsonSchema)]
struct UpdateSeatArgs {
    /// 订单确认码
    confirmation_number: String,
    /// 新座位号，如 14C
    new_seat: String,
}

/// 改座：写入确认码与座位号
pub struct UpdateSeat;

#[async_trait]
impl Action for UpdateSeat {
    fn name(&self) -> &str {
        "update_seat"
    }

    fn description(&self) -> &str {
        "Update the seat for a given confirmation number."
    }

    fn parameters_schema(&self) -> Value {
        args_schema::<UpdateSeatArgs>()
    }

    async fn invoke(&self, ctx: &mut SharedContext, args: Value) -> Result<Value, ActionError> {
        let args: UpdateSeatArgs = parse_args(args)?;
        let seat = args.new_seat.trim().to_uppercase();
        if !is_valid_seat(&seat) {
            return Err(ActionError::Rejected(format!(
                "Sorry, '{}' is not a valid seat. Seats look like 14C (row 1-40, letter A-F).",
                args.new_seat
            )));
        }
        let Some(flight) = ctx.flight_number.clone() else {
            return Err(ActionError::Rejected(
                "Sorry, I couldn't find a flight for this booking.".to_string(),
            ));
        };
        ctx.confirmation_number = Some(args.confirmation_number.clone());
        ctx.seat_number = Some(seat.clone());
        Ok(Value::from(format!(
            "Updated seat to {seat} for confirmation number {} on flight {flight}",
            args.confirmation_number
        )))
    }
}

/// 展示交互式座位图（由前端渲染）
pub struct DisplaySeatMap;

#[async_trait]
impl Action for DisplaySeatMap {
    fn name(&self) -> &str {
        "display_seat_map"
    }

    fn description(&self) -> &str {
        "Display an interactive seat map to the customer so they can choose a new seat."
    }

    async fn invoke(&self, _ctx: &mut SharedContext, _args: Value) -> Result<Value, ActionError> {
        Ok(Value::from("DISPLAY_SEAT_MAP"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_seat_pattern() {
        for ok in ["1A", "14C", "40F", "23B"] {
            assert!(is_valid_seat(ok), "{ok}");
        }
        for bad in ["0A", "41A", "12G", "A12", "12", "", "12a"] {
            assert!(!is_valid_seat(bad), "{bad}");
        }
    }

    #[tokio::test]
    async fn test_update_seat_sets_fields() {
        let mut ctx = SharedContext {
            flight_number: Some("FLT-123".into()),
            ..Default::default()
        };
        let out = UpdateSeat
            .invoke(&mut ctx, json!({"confirmation_number": "ABC123", "new_seat": "14c"}))
            .await
            .unwrap();
        assert!(out.as_str().unwrap().contains("14C"));
        assert_eq!(ctx.seat_number.as_deref(), Some("14C"));
        assert_eq!(ctx.confirmation_number.as_deref(), Some("ABC123"));
    }

    #[tokio::test]
    async fn test_malformed_seat_is_rejected_without_mutation() {
        let mut ctx = SharedContext {
            flight_number: Some("FLT-123".into()),
            ..Default::default()
        };
        let before = ctx.clone();
        let err = UpdateSeat
            .invoke(&mut ctx, json!({"confirmation_number": "ABC123", "new_seat": "99Z"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Rejected(m) if m.contains("99Z")));
        assert_eq!(ctx, before);
    }

    #[tokio::test]
    async fn test_missing_flight_is_rejected() {
        let mut ctx = SharedContext::default();
        let err = UpdateSeat
            .invoke(&mut ctx, json!({"confirmation_number": "ABC123", "new_seat": "2A"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Rejected(_)));
    }
}
