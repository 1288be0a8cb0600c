//! 航空客服专员配置表
//!
//! Triage 为入口；每个专员都能转回 Triage，Flight Status 可直接转到 Compensation。
//! 所有专员共用相关性与越狱两个安全检查。

use crate::core::RegistryError;
use crate::guardrails::{JAILBREAK_CHECK, RELEVANCE_CHECK};
use crate::memory::SharedContext;
use crate::specialists::hooks::{CANCELLATION_HOOK, COMPENSATION_HOOK, SEAT_BOOKING_HOOK};
use crate::specialists::Specialist;
use crate::tools::{
    ActionRegistry, BaggageInfo, CancelFlight, DisplaySeatMap, FaqLookup, FileBaggageClaim,
    FlightStatus, IssueVoucher, OpenCompensationCase, UpdateSeat,
};

pub const TRIAGE: &str = "Triage Agent";
pub const FAQ: &str = "FAQ Agent";
pub const SEAT_BOOKING: &str = "Seat Booking Agent";
pub const FLIGHT_STATUS: &str = "Flight Status Agent";
pub const CANCELLATION: &str = "Cancellation Agent";
pub const BAGGAGE: &str = "Baggage Agent";
pub const COMPENSATION: &str = "Compensation Agent";

const PREFIX: &str = "You are a helpful airline customer service agent working alongside other \
specialists. Transfer back to the triage agent if the customer asks something outside your role.";

const GUARDRAILS: &[&str] = &[RELEVANCE_CHECK, JAILBREAK_CHECK];

fn field(v: &Option<String>) -> &str {
    v.as_deref().unwrap_or("[unknown]")
}

fn triage_instructions(_ctx: &SharedContext) -> String {
    format!(
        "{PREFIX}\nYou are a triage agent. Greet the customer and delegate the request to the \
         appropriate specialist. Do not try to answer domain questions yourself."
    )
}

fn faq_instructions(_ctx: &SharedContext) -> String {
    format!(
        "{PREFIX}\nYou are an FAQ agent. Identify the last question asked by the customer and use \
         the faq_lookup action to answer it. Do not rely on your own knowledge."
    )
}

fn seat_booking_instructions(ctx: &SharedContext) -> String {
    format!(
        "{PREFIX}\nYou are a seat booking agent. The customer's confirmation number is {} on flight {}. \
         If the customer has not named a seat, use display_seat_map. Otherwise call update_seat with \
         the confirmation number and the requested seat.",
        field(&ctx.confirmation_number),
        field(&ctx.flight_number),
    )
}

fn flight_status_instructions(ctx: &SharedContext) -> String {
    format!(
        "{PREFIX}\nYou are a flight status agent. The customer's flight is {} (confirmation {}). \
         Use flight_status to report the current status. If the flight is disrupted and the customer \
         asks about compensation, transfer to the compensation agent.",
        field(&ctx.flight_number),
        field(&ctx.confirmation_number),
    )
}

fn cancellation_instructions(ctx: &SharedContext) -> String {
    format!(
        "{PREFIX}\nYou are a cancellation agent. The confirmation number is {} and the flight is {}. \
         Confirm the booking with the customer, then call cancel_flight.",
        field(&ctx.confirmation_number),
        field(&ctx.flight_number),
    )
}

fn baggage_instructions(ctx: &SharedContext) -> String {
    let claim = match &ctx.baggage_claim_id {
        Some(id) => format!(" An existing baggage claim is {id}."),
        None => String::new(),
    };
    format!(
        "{PREFIX}\nYou are a baggage agent. Answer allowance and fee questions with baggage_info. \
         For lost or damaged bags use file_baggage_claim.{claim}"
    )
}

fn compensation_instructions(ctx: &SharedContext) -> String {
    let case = match &ctx.compensation_case_id {
        Some(id) => format!("The open compensation case is {id}."),
        None => "No compensation case is open yet; open one first.".to_string(),
    };
    format!(
        "{PREFIX}\nYou are a compensation agent for confirmation number {} on flight {}. {case} \
         Issue meal, hotel or travel vouchers with issue_voucher when the disruption warrants it.",
        field(&ctx.confirmation_number),
        field(&ctx.flight_number),
    )
}

/// 航空客服用到的全部动作
pub fn airline_actions() -> Result<ActionRegistry, RegistryError> {
    let mut registry = ActionRegistry::new();
    registry.register(FaqLookup)?;
    registry.register(UpdateSeat)?;
    registry.register(DisplaySeatMap)?;
    registry.register(FlightStatus)?;
    registry.register(CancelFlight)?;
    registry.register(BaggageInfo)?;
    registry.register(FileBaggageClaim)?;
    registry.register(OpenCompensationCase)?;
    registry.register(IssueVoucher)?;
    Ok(registry)
}

/// 专员配置表（声明顺序即展示顺序）
pub fn airline_specialists() -> Vec<Specialist> {
    vec![
        Specialist::new(
            TRIAGE,
            "A triage agent that can delegate a customer's request to the appropriate agent.",
            triage_instructions,
        )
        .with_safety_checks(GUARDRAILS)
        .transfer_to(FAQ)
        .transfer_with_hook(SEAT_BOOKING, SEAT_BOOKING_HOOK)
        .transfer_to(FLIGHT_STATUS)
        .transfer_with_hook(CANCELLATION, CANCELLATION_HOOK)
        .transfer_to(BAGGAGE)
        .transfer_with_hook(COMPENSATION, COMPENSATION_HOOK),
        Specialist::new(
            FAQ,
            "A helpful agent that can answer questions about the airline.",
            faq_instructions,
        )
        .with_actions(&["faq_lookup"])
        .with_safety_checks(GUARDRAILS)
        .transfer_to(TRIAGE),
        Specialist::new(
            SEAT_BOOKING,
            "A helpful agent that can update a seat on a flight.",
            seat_booking_instructions,
        )
        .with_actions(&["update_seat", "display_seat_map"])
        .with_safety_checks(GUARDRAILS)
        .transfer_to(TRIAGE),
        Specialist::new(
            FLIGHT_STATUS,
            "An agent that provides flight status information.",
            flight_status_instructions,
        )
        .with_actions(&["flight_status"])
        .with_safety_checks(GUARDRAILS)
        .transfer_to(TRIAGE)
        .transfer_with_hook(COMPENSATION, COMPENSATION_HOOK),
        Specialist::new(
            CANCELLATION,
            "An agent that cancels flights.",
            cancellation_instructions,
        )
        .with_actions(&["cancel_flight"])
        .with_safety_checks(GUARDRAILS)
        .transfer_to(TRIAGE),
        Specialist::new(
            BAGGAGE,
            "An agent for baggage allowance, fees and lost or damaged bag claims.",
            baggage_instructions,
        )
        .with_actions(&["baggage_info", "file_baggage_claim"])
        .with_safety_checks(GUARDRAILS)
        .transfer_to(TRIAGE),
        Specialist::new(
            COMPENSATION,
            "An agent that opens compensation cases and issues vouchers for disrupted trips.",
            compensation_instructions,
        )
        .with_actions(&["open_compensation_case", "issue_voucher"])
        .with_safety_checks(GUARDRAILS)
        .transfer_to(TRIAGE),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guardrails::{SafetyPipeline, SafetyPolicy, ModelJudgedCheck};
    use crate::llm::ScriptedModel;
    use crate::specialists::{airline_hooks, SpecialistRegistry};
    use std::sync::Arc;

    #[test]
    fn test_airline_table_is_valid() {
        let model = Arc::new(ScriptedModel::new());
        let mut checks = SafetyPipeline::new(SafetyPolicy::EvaluateAll);
        checks.register(ModelJudgedCheck::relevance(model.clone()));
        checks.register(ModelJudgedCheck::jailbreak(model));
        let reg = SpecialistRegistry::build(
            airline_specialists(),
            TRIAGE,
            airline_hooks(),
            &airline_actions().unwrap(),
            &checks,
        )
        .unwrap();
        assert_eq!(reg.iter().count(), 7);
        for s in reg.iter().filter(|s| s.name != TRIAGE) {
            assert!(reg.edge(&s.name, TRIAGE).is_some(), "{} cannot return", s.name);
        }
        assert!(reg.edge(FLIGHT_STATUS, COMPENSATION).is_some());
        assert!(reg.edge(FAQ, CANCELLATION).is_none());
    }

    #[test]
    fn test_instructions_embed_current_context() {
        let ctx = SharedContext {
            confirmation_number: Some("LL0EZ6".into()),
            flight_number: Some("FLT-476".into()),
            ..Default::default()
        };
        let text = seat_booking_instructions(&ctx);
        assert!(text.contains("confirmation number is LL0EZ6"));
        assert!(text.contains("FLT-476"));
        assert!(seat_booking_instructions(&SharedContext::default()).contains("[unknown]"));
    }
}
