//! 补偿相关动作：open_compensation_case（开立补偿工单）与 issue_voucher（发放代金券）

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::memory::context::generate_digits;
use crate::memory::{fill_if_absent, SharedContext};
use crate::tools::schema::args_schema;
use crate::tools::{parse_args, Action, ActionError};

#[derive(Deserialize, JsonSchema)]
struct OpenCaseArgs {
    /// 补偿原因，如 delay / cancellation / missed connection
    reason: String,
}

pub struct OpenCompensationCase;

#[async_trait]
impl Action for OpenCompensationCase {
    fn name(&self) -> &str {
        "open_compensation_case"
    }

    fn description(&self) -> &str {
        "Open a compensation case for a disrupted trip. Returns the case id."
    }

    fn parameters_schema(&self) -> Value {
        args_schema::<OpenCaseArgs>()
    }

    async fn invoke(&self, ctx: &mut SharedContext, args: Value) -> Result<Value, ActionError> {
        let args: OpenCaseArgs = parse_args(args)?;
        if ctx.confirmation_number.is_none() {
            return Err(ActionError::Rejected(
                "Sorry, I need your confirmation number to open a compensation case.".to_string(),
            ));
        }
        fill_if_absent(&mut ctx.compensation_case_id, || format!("CMP-{}", generate_digits(4)));
        let case = ctx.compensation_case_id.clone().unwrap_or_default();
        Ok(serde_json::json!({
            "case_id": case,
            "reason": args.reason,
            "message": format!("Compensation case {case} opened."),
        }))
    }
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
enum VoucherKind {
    Meal,
    Hotel,
    Travel,
}

#[derive(Deserialize, JsonSchema)]
struct VoucherArgs {
    kind: VoucherKind,
    /// 金额（美元）
    amount: u32,
}

/// 发放代金券：需先有补偿工单，券号追加到 vouchers 列表
pub struct IssueVoucher;

/// 单张代金券上限
const MAX_VOUCHER_AMOUNT: u32 = 500;

#[async_trait]
impl Action for IssueVoucher {
    fn name(&self) -> &str {
        "issue_voucher"
    }

    fn description(&self) -> &str {
        "Issue a meal, hotel or travel voucher against the open compensation case."
    }

    fn parameters_schema(&self) -> Value {
        args_schema::<VoucherArgs>()
    }

    async fn invoke(&self, ctx: &mut SharedContext, args: Value) -> Result<Value, ActionError> {
        let args: VoucherArgs = parse_args(args)?;
        let Some(case) = ctx.compensation_case_id.clone() else {
            return Err(ActionError::Rejected(
                "Sorry, a compensation case must be opened before issuing vouchers.".to_string(),
            ));
        };
        if args.amount == 0 || args.amount > MAX_VOUCHER_AMOUNT {
            return Err(ActionError::Rejected(format!(
                "Sorry, vouchers must be between $1 and ${MAX_VOUCHER_AMOUNT}."
            )));
        }
        let prefix = match args.kind {
            VoucherKind::Meal => "MEAL",
            VoucherKind::Hotel => "HOTEL",
            VoucherKind::Travel => "TRAVEL",
        };
        let voucher = format!("{prefix}-{}", args.amount);
        ctx.vouchers.get_or_insert_with(Vec::new).push(voucher.clone());
        Ok(serde_json::json!({
            "voucher": voucher,
            "case_id": case,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_case_then_vouchers() {
        let mut ctx = SharedContext {
            confirmation_number: Some("ABC123".into()),
            ..Default::default()
        };
        OpenCompensationCase
            .invoke(&mut ctx, json!({"reason": "delay"}))
            .await
            .unwrap();
        assert!(ctx.compensation_case_id.as_deref().unwrap().starts_with("CMP-"));

        IssueVoucher
            .invoke(&mut ctx, json!({"kind": "meal", "amount": 15}))
            .await
            .unwrap();
        IssueVoucher
            .invoke(&mut ctx, json!({"kind": "hotel", "amount": 200}))
            .await
            .unwrap();
        assert_eq!(
            ctx.vouchers,
            Some(vec!["MEAL-15".to_string(), "HOTEL-200".to_string()])
        );
    }

    #[tokio::test]
    async fn test_voucher_requires_case() {
        let mut ctx = SharedContext::default();
        let err = IssueVoucher
            .invoke(&mut ctx, json!({"kind": "meal", "amount": 15}))
            .await;
        assert!(err.is_err());
        assert!(ctx.vouchers.is_none());
    }

    #[tokio::test]
    async fn test_voucher_amount_bounds() {
        let mut ctx = SharedContext {
            compensation_case_id: Some("CMP-1".into()),
            ..Default::default()
        };
        let err = IssueVoucher
            .invoke(&mut ctx, json!({"kind": "travel", "amount": 9000}))
            .await;
        assert!(matches!(err, Err(ActionError::Rejected(_))));
    }
}
