//! 行李相关动作：baggage_info（额度与费用）与 file_baggage_claim（登记行李理赔）

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::memory::context::generate_digits;
use crate::memory::{fill_if_absent, SharedContext};
use crate::tools::schema::args_schema;
use crate::tools::{parse_args, Action, ActionError};

#[derive(Deserialize, JsonSchema)]
struct BaggageInfoArgs {
    /// 问题原文，如 "overweight fee"
    query: String,
}

pub struct BaggageInfo;

#[async_trait]
impl Action for BaggageInfo {
    fn name(&self) -> &str {
        "baggage_info"
    }

    fn description(&self) -> &str {
        "Lookup baggage allowance and fees."
    }

    fn parameters_schema(&self) -> Value {
        args_schema::<BaggageInfoArgs>()
    }

    async fn invoke(&self, _ctx: &mut SharedContext, args: Value) -> Result<Value, ActionError> {
        let args: BaggageInfoArgs = parse_args(args)?;
        let q = args.query.to_lowercase();
        let text = if q.contains("fee") || q.contains("overweight") {
            "Overweight bag fee is $75 for bags between 50 and 70 pounds."
        } else if q.contains("allowance") || q.contains("carry") {
            "One carry-on and one checked bag (up to 50 lbs) are included."
        } else {
            "Please provide details about your baggage inquiry."
        };
        Ok(Value::from(text))
    }
}

#[derive(Deserialize, JsonSchema)]
struct BaggageClaimArgs {
    /// 丢失或损坏行李的描述
    description: String,
}

/// 登记行李理赔：同一会话只生成一次理赔号
pub struct FileBaggageClaim;

#[async_trait]
impl Action for FileBaggageClaim {
    fn name(&self) -> &str {
        "file_baggage_claim"
    }

    fn description(&self) -> &str {
        "File a claim for lost or damaged baggage on the current booking."
    }

    fn parameters_schema(&self) -> Value {
        args_schema::<BaggageClaimArgs>()
    }

    async fn invoke(&self, ctx: &mut SharedContext, args: Value) -> Result<Value, ActionError> {
        let args: BaggageClaimArgs = parse_args(args)?;
        if args.description.trim().is_empty() {
            return Err(ActionError::Rejected(
                "Sorry, please describe the bag so the claim can be traced.".to_string(),
            ));
        }
        fill_if_absent(&mut ctx.baggage_claim_id, || format!("BG-{}", generate_digits(6)));
        let claim = ctx.baggage_claim_id.clone().unwrap_or_default();
        Ok(serde_json::json!({
            "claim_id": claim,
            "message": format!("Baggage claim {claim} has been filed. We'll text you when the bag is located."),
        }))
    }
}
