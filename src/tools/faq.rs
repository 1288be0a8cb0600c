//! faq_lookup 动作：常见问题查询（只读）

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::memory::SharedContext;
use crate::tools::schema::args_schema;
use crate::tools::{parse_args, Action, ActionError};

#[derive(Deserialize, JsonSchema)]
struct FaqArgs {
    /// 用户的问题原文
    question: String,
}

/// 常见问题查询：按关键词返回固定答案
pub struct FaqLookup;

#[async_trait]
impl Action for FaqLookup {
    fn name(&self) -> &str {
        "faq_lookup"
    }

    fn description(&self) -> &str {
        "Lookup frequently asked questions about baggage, seats, wifi and the aircraft."
    }

    fn parameters_schema(&self) -> Value {
        args_schema::<FaqArgs>()
    }

    async fn invoke(&self, _ctx: &mut SharedContext, args: Value) -> Result<Value, ActionError> {
        let args: FaqArgs = parse_args(args)?;
        Ok(Value::from(answer(&args.question)))
    }
}

fn answer(question: &str) -> &'static str {
    let q = question.to_lowercase();
    if q.contains("bag") || q.contains("baggage") {
        "You are allowed to bring one bag on the plane. It must be under 50 pounds and 22 inches x 14 inches x 9 inches."
    } else if q.contains("seats") || q.contains("plane") {
        "There are 120 seats on the plane. There are 22 business class seats and 98 economy seats. \
         Exit rows are rows 4 and 16. Rows 5-8 are Economy Plus, with extra legroom."
    } else if q.contains("wifi") {
        "We have free wifi on the plane, join Airline-Wifi"
    } else {
        "I'm sorry, I don't know the answer to that question."
    }
}
